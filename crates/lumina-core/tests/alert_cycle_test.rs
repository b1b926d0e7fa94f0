//! End-to-end poll cycles: feed → merge → reconcile → rendered text.

use std::sync::atomic::{AtomicBool, Ordering};

use async_trait::async_trait;
use chrono::{DateTime, Duration, FixedOffset, Utc};
use chrono_tz::Tz;
use lumina_core::{
    fetch_for_groups, AlertFeed, AlertNotifier, CoreError, PlainFormat, Result, SeenAlerts,
    TimezoneResolver,
};
use lumina_models::{AlertRecord, GeoPoint, LocationKey, RegisteredUser};

struct Pacific;

impl TimezoneResolver for Pacific {
    fn timezone_at(&self, _point: GeoPoint) -> Option<Tz> {
        Some(chrono_tz::America::Los_Angeles)
    }
}

/// Returns the same alerts for every location until switched off.
struct FlakyFeed {
    alerts: Vec<AlertRecord>,
    down: AtomicBool,
}

#[async_trait]
impl AlertFeed for FlakyFeed {
    async fn active_alerts(&self, _location: LocationKey) -> Result<Vec<AlertRecord>> {
        if self.down.load(Ordering::SeqCst) {
            return Err(CoreError::Http("operation timed out".into()));
        }
        Ok(self.alerts.clone())
    }
}

fn t0() -> DateTime<FixedOffset> {
    DateTime::parse_from_rfc3339("2025-06-01T20:00:00Z").unwrap()
}

fn tornado() -> AlertRecord {
    AlertRecord::new(
        "A1",
        "Tornado Warning",
        "Los Angeles, CA 90210",
        t0(),
        t0() + Duration::seconds(3600),
    )
}

fn beverly_hills() -> RegisteredUser {
    RegisteredUser::new("U1", "90210", GeoPoint::new(34.09, -118.41))
}

async fn cycle(
    notifier: &mut AlertNotifier,
    feed: &FlakyFeed,
    now: DateTime<Utc>,
) -> Result<Vec<String>> {
    let groups = notifier.location_groups().into_keys();
    let alerts = fetch_for_groups(feed, groups).await?;
    Ok(notifier
        .reconcile(&alerts, now, &Pacific)
        .iter()
        .map(|n| n.render(&PlainFormat))
        .collect())
}

#[tokio::test]
async fn test_announce_once_then_again_after_expiry() {
    let mut notifier = AlertNotifier::from_parts([beverly_hills()], SeenAlerts::new());
    let feed = FlakyFeed {
        alerts: vec![tornado()],
        down: AtomicBool::new(false),
    };
    let start = t0().with_timezone(&Utc);

    let first = cycle(&mut notifier, &feed, start).await.unwrap();
    assert_eq!(first.len(), 1);
    assert!(first[0].starts_with("⚠️ Tornado Warning\n"));
    assert!(first[0].contains("@U1"));
    assert!(first[0].contains("Take shelter immediately"));
    assert_eq!(
        notifier.seen().expiry(&"A1".into()),
        Some((t0() + Duration::seconds(3600)).with_timezone(&Utc))
    );

    let again = cycle(&mut notifier, &feed, start + Duration::seconds(60)).await.unwrap();
    assert!(again.is_empty());

    let after = cycle(&mut notifier, &feed, start + Duration::seconds(3601)).await.unwrap();
    assert_eq!(after.len(), 1);
}

#[tokio::test]
async fn test_failed_cycle_leaves_dedup_untouched() {
    let mut notifier = AlertNotifier::from_parts([beverly_hills()], SeenAlerts::new());
    let feed = FlakyFeed {
        alerts: vec![tornado()],
        down: AtomicBool::new(true),
    };
    let start = t0().with_timezone(&Utc);

    assert!(cycle(&mut notifier, &feed, start).await.is_err());
    assert!(notifier.seen().is_empty());

    feed.down.store(false, Ordering::SeqCst);
    let recovered = cycle(&mut notifier, &feed, start + Duration::seconds(120)).await.unwrap();
    assert_eq!(recovered.len(), 1);
}

#[tokio::test]
async fn test_scope_match_without_postal_code_in_area() {
    let far_zip = RegisteredUser::new("U7", "91001", GeoPoint::new(34.09, -118.41));
    let mut notifier = AlertNotifier::from_parts([far_zip], SeenAlerts::new());
    let mut alert = tornado();
    alert.area_description = "Western Los Angeles County".into();
    let feed = FlakyFeed {
        alerts: vec![alert],
        down: AtomicBool::new(false),
    };

    let out = cycle(&mut notifier, &feed, t0().with_timezone(&Utc)).await.unwrap();

    assert_eq!(out.len(), 1);
    assert!(out[0].contains("@U7"));
}
