//! The Lumina data file.
//!
//! Layout on disk (field names kept compatible with older bot data files):
//!
//! ```text
//! {
//!   "user_zips":   { "<user_id>": { "zip": "90210", "lat": 34.09, "lon": -118.41 } },
//!   "sales_data":  { "<user_id>": { "gen": 1, "aw": 0, "byod": 2 } },
//!   "mods":        [ "<user_id>" ],
//!   "inventory_data": { "<user_id>": { "company": "GEN", "imeis": ["3569..."], "date": "June 01, 2025 01:00 PM" } },
//!   "seen_alerts": { "<alert_id>": "2025-06-01T21:00:00Z" }
//! }
//! ```

use std::collections::{BTreeMap, BTreeSet};
use std::path::{Path, PathBuf};

use chrono::{DateTime, Utc};
use lumina_models::{AlertId, GeoPoint, InventoryRecord, RegisteredUser, SalesTally, UserId};
use serde::{Deserialize, Serialize};
use tracing::{debug, info};

use crate::atomic::{atomic_write_json, read_json_optional};
use crate::error::Result;

/// A registration as stored under `user_zips`.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct ZipRegistration {
    pub zip: String,
    pub lat: f64,
    pub lon: f64,
}

/// Everything the bot persists.
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
pub struct LuminaData {
    #[serde(default)]
    pub user_zips: BTreeMap<UserId, ZipRegistration>,
    #[serde(default)]
    pub sales_data: BTreeMap<UserId, SalesTally>,
    #[serde(default)]
    pub mods: BTreeSet<UserId>,
    #[serde(default)]
    pub inventory_data: BTreeMap<UserId, InventoryRecord>,
    #[serde(default)]
    pub seen_alerts: BTreeMap<AlertId, DateTime<Utc>>,
}

impl LuminaData {
    /// Returns the stored registrations as notifier users.
    pub fn registered_users(&self) -> Vec<RegisteredUser> {
        self.user_zips
            .iter()
            .map(|(id, reg)| {
                RegisteredUser::new(id.clone(), reg.zip.clone(), GeoPoint::new(reg.lat, reg.lon))
            })
            .collect()
    }

    /// Replaces the stored registrations with `users`.
    pub fn set_registered_users<'a>(&mut self, users: impl IntoIterator<Item = &'a RegisteredUser>) {
        self.user_zips = users
            .into_iter()
            .map(|u| {
                (
                    u.user_id.clone(),
                    ZipRegistration {
                        zip: u.postal_code.clone(),
                        lat: u.latitude,
                        lon: u.longitude,
                    },
                )
            })
            .collect();
    }
}

/// Loads and saves [`LuminaData`] at a fixed path.
#[derive(Debug, Clone)]
pub struct DataStore {
    path: PathBuf,
}

impl DataStore {
    pub fn new(path: impl Into<PathBuf>) -> Self {
        Self { path: path.into() }
    }

    pub fn path(&self) -> &Path {
        &self.path
    }

    /// Loads the data file; a missing file yields empty data.
    pub fn load(&self) -> Result<LuminaData> {
        match read_json_optional::<LuminaData>(&self.path)? {
            Some(data) => {
                info!(
                    path = %self.path.display(),
                    users = data.user_zips.len(),
                    mods = data.mods.len(),
                    inventories = data.inventory_data.len(),
                    seen_alerts = data.seen_alerts.len(),
                    "Loaded bot data"
                );
                Ok(data)
            }
            None => {
                info!(path = %self.path.display(), "No data file yet, starting empty");
                Ok(LuminaData::default())
            }
        }
    }

    pub fn save(&self, data: &LuminaData) -> Result<()> {
        atomic_write_json(&self.path, data)?;
        debug!(path = %self.path.display(), "Saved bot data");
        Ok(())
    }
}
