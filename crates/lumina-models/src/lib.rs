//! Core data models for Lumina.
//!
//! This crate provides the plain data types shared by the notifier, the
//! persistence layer and the Telegram bot: identifiers, registered users,
//! weather alerts, sales tallies and phone inventory.

pub mod alert;
pub mod ids;
pub mod inventory;
pub mod location;
pub mod sales;
pub mod user;

// Re-export main types
pub use alert::AlertRecord;
pub use ids::{AlertId, UserId};
pub use inventory::InventoryRecord;
pub use location::{GeoPoint, LocationKey};
pub use sales::{SaleKind, SalesTally};
pub use user::RegisteredUser;
