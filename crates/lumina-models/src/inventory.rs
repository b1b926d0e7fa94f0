//! Phone inventory submitted by a rep.

use serde::{Deserialize, Serialize};

/// The last inventory a rep submitted, as stored under `inventory_data`.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct InventoryRecord {
    /// Upper-cased company name, e.g. `GEN`.
    pub company: String,
    /// IMEIs still on hand, oldest first.
    #[serde(default)]
    pub imeis: Vec<String>,
    /// Submission time as shown to users.
    #[serde(default)]
    pub date: String,
}

impl InventoryRecord {
    pub fn new(company: impl Into<String>, imeis: Vec<String>, date: impl Into<String>) -> Self {
        Self {
            company: company.into(),
            imeis,
            date: date.into(),
        }
    }

    pub fn phone_count(&self) -> usize {
        self.imeis.len()
    }

    /// Removes and returns the oldest IMEI.
    pub fn take_phone(&mut self) -> Option<String> {
        if self.imeis.is_empty() {
            None
        } else {
            Some(self.imeis.remove(0))
        }
    }
}
