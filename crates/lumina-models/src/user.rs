//! Users registered for weather alerts.

use serde::{Deserialize, Serialize};

use crate::ids::UserId;
use crate::location::{GeoPoint, LocationKey};

/// A chat user who registered a postal code for alert targeting.
///
/// Re-registering replaces the previous record; records never expire.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct RegisteredUser {
    pub user_id: UserId,
    pub postal_code: String,
    pub latitude: f64,
    pub longitude: f64,
}

impl RegisteredUser {
    /// Creates a registration from a geocoded postal code.
    pub fn new(user_id: impl Into<UserId>, postal_code: impl Into<String>, point: GeoPoint) -> Self {
        Self {
            user_id: user_id.into(),
            postal_code: postal_code.into(),
            latitude: point.latitude,
            longitude: point.longitude,
        }
    }

    pub fn point(&self) -> GeoPoint {
        GeoPoint::new(self.latitude, self.longitude)
    }

    /// Returns the location group used for per-coordinate alert queries.
    pub fn location_key(&self) -> LocationKey {
        self.point().key()
    }
}
