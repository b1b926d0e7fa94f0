//! Persistence layer for Lumina.
//!
//! All bot state lives in one JSON document (`lumina_data.json`) that is
//! rewritten atomically (write to a temp file, then rename) after every
//! mutation.
//!
//! # Example
//!
//! ```no_run
//! use lumina_persistence::{DataStore, LuminaData};
//!
//! let store = DataStore::new("/home/user/.lumina/state/lumina_data.json");
//!
//! let mut data = store.load().unwrap();
//! data.mods.insert("12345".into());
//! store.save(&data).unwrap();
//! ```

pub mod atomic;
pub mod data_store;
pub mod error;

pub use data_store::{DataStore, LuminaData, ZipRegistration};
pub use error::{PersistenceError, Result};
