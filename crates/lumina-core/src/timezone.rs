//! Rendering alert times in a user's local timezone.

use chrono::{DateTime, FixedOffset};
use chrono_tz::Tz;
use lumina_models::GeoPoint;

/// Format used for localized timestamps, e.g. `2025-06-01 03:00 PM CDT`.
pub const LOCAL_TIME_FORMAT: &str = "%Y-%m-%d %I:%M %p %Z";

/// Looks up the IANA timezone for a coordinate.
pub trait TimezoneResolver: Send + Sync {
    /// Returns `None` when the point has no known timezone.
    fn timezone_at(&self, point: GeoPoint) -> Option<Tz>;
}

/// Offline polygon lookup backed by `tzf-rs`.
///
/// Building the finder decodes the embedded boundary data, so create one
/// per process and share it.
pub struct TzfResolver {
    finder: tzf_rs::DefaultFinder,
}

impl TzfResolver {
    pub fn new() -> Self {
        Self {
            finder: tzf_rs::DefaultFinder::new(),
        }
    }
}

impl Default for TzfResolver {
    fn default() -> Self {
        Self::new()
    }
}

impl TimezoneResolver for TzfResolver {
    fn timezone_at(&self, point: GeoPoint) -> Option<Tz> {
        let name = self.finder.get_tz_name(point.longitude, point.latitude);
        if name.is_empty() {
            return None;
        }
        match name.parse::<Tz>() {
            Ok(tz) => Some(tz),
            Err(_) => {
                tracing::debug!(name = %name, "Timezone name not in tz database");
                None
            }
        }
    }
}

/// Renders `ts` in `tz`; without a timezone the source timestamp is returned
/// unchanged (RFC 3339 with its original offset).
pub fn to_local_time(ts: &DateTime<FixedOffset>, tz: Option<Tz>) -> String {
    match tz {
        Some(tz) => ts.with_timezone(&tz).format(LOCAL_TIME_FORMAT).to_string(),
        None => ts.to_rfc3339(),
    }
}

/// Renders an alert window as `start → end`.
pub fn format_window(
    effective: &DateTime<FixedOffset>,
    expires: &DateTime<FixedOffset>,
    tz: Option<Tz>,
) -> String {
    format!("{} → {}", to_local_time(effective, tz), to_local_time(expires, tz))
}
