//! Weather alert records.

use chrono::{DateTime, FixedOffset, Utc};
use serde::{Deserialize, Serialize};
use std::collections::BTreeSet;

use crate::ids::AlertId;
use crate::location::LocationKey;

/// A weather-hazard notice as observed in the alerts feed.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct AlertRecord {
    /// Source-provided unique key.
    pub alert_id: AlertId,

    /// Event name, e.g. "Tornado Warning".
    pub event_kind: String,

    /// Free-text list of affected zones/counties.
    pub area_description: String,

    /// Start of the alert window, in the source's offset.
    pub effective: DateTime<FixedOffset>,

    /// End of the alert window, in the source's offset.
    pub expires: DateTime<FixedOffset>,

    /// Location groups whose per-coordinate query returned this alert.
    #[serde(default, skip_serializing_if = "BTreeSet::is_empty")]
    pub query_scope: BTreeSet<LocationKey>,
}

impl AlertRecord {
    /// Creates an alert with an empty query scope.
    pub fn new(
        alert_id: impl Into<AlertId>,
        event_kind: impl Into<String>,
        area_description: impl Into<String>,
        effective: DateTime<FixedOffset>,
        expires: DateTime<FixedOffset>,
    ) -> Self {
        Self {
            alert_id: alert_id.into(),
            event_kind: event_kind.into(),
            area_description: area_description.into(),
            effective,
            expires,
            query_scope: BTreeSet::new(),
        }
    }

    /// Adds a location group to the query scope.
    pub fn with_scope(mut self, key: LocationKey) -> Self {
        self.query_scope.insert(key);
        self
    }

    pub fn expires_utc(&self) -> DateTime<Utc> {
        self.expires.with_timezone(&Utc)
    }
}
