//! Integration tests for loading existing data files into bot tables.

use chrono::{DateTime, Utc};
use chrono_tz::Tz;
use lumina_core::{MessageFormat, TimezoneResolver};
use lumina_models::{AlertRecord, GeoPoint, InventoryRecord, SaleKind, UserId};
use lumina_persistence::DataStore;
use lumina_telegram::{BotTables, HtmlFormat};
use tempfile::tempdir;

const LEGACY_FILE: &str = r#"{
    "user_zips": {
        "111": {"zip": "90210", "lat": 34.0901, "lon": -118.4065},
        "222": {"zip": "10001", "lat": 40.7506, "lon": -73.9972}
    },
    "sales_data": {"111": {"gen": 2, "aw": 1, "byod": 0}},
    "mods": ["222"],
    "inventory_data": {"111": {"company": "GEN", "imeis": ["356938035643809"], "date": "June 01, 2025 01:00 PM"}},
    "inventory": {"ignored": true}
}"#;

struct NoZones;

impl TimezoneResolver for NoZones {
    fn timezone_at(&self, _point: GeoPoint) -> Option<Tz> {
        None
    }
}

#[test]
fn test_legacy_file_loads_into_tables() {
    let dir = tempdir().unwrap();
    let path = dir.path().join("lumina_data.json");
    std::fs::write(&path, LEGACY_FILE).unwrap();

    let store = DataStore::new(&path);
    let tables = BotTables::from_data(store.load().unwrap());

    assert_eq!(tables.notifier.user_count(), 2);
    assert_eq!(
        tables.notifier.user(&"111".into()).map(|u| u.postal_code.as_str()),
        Some("90210")
    );
    assert_eq!(tables.sales.tally(&"111".into()).total(), 3);
    assert!(tables.mods.contains(&UserId::from("222")));
    assert_eq!(
        tables.inventory.get(&"111".into()).map(InventoryRecord::phone_count),
        Some(1)
    );
    assert!(tables.notifier.seen().is_empty());
}

#[test]
fn test_snapshot_survives_save_and_load() {
    let dir = tempdir().unwrap();
    let store = DataStore::new(dir.path().join("nested").join("lumina_data.json"));
    std::fs::create_dir_all(dir.path().join("nested")).unwrap();

    let mut tables = BotTables::default();
    tables.sales.record("5".into(), SaleKind::Byod);
    tables.mods.insert("5".into());
    tables.inventory.record(
        "5".into(),
        InventoryRecord::new("AW", vec!["111".into(), "222".into()], "June 01, 2025 01:00 PM"),
    );
    store.save(&tables.snapshot()).unwrap();

    let reloaded = BotTables::from_data(store.load().unwrap());
    assert_eq!(reloaded.snapshot(), tables.snapshot());
    assert_eq!(reloaded.inventory.get(&"5".into()).map(|r| r.imeis.len()), Some(2));
}

#[test]
fn test_announcement_html_without_timezone() {
    let dir = tempdir().unwrap();
    let path = dir.path().join("lumina_data.json");
    std::fs::write(&path, LEGACY_FILE).unwrap();
    let mut tables = BotTables::from_data(DataStore::new(&path).load().unwrap());

    let start = DateTime::parse_from_rfc3339("2025-06-01T13:00:00-07:00").unwrap();
    let alert = AlertRecord::new(
        "A1",
        "Flash Flood Warning",
        "Beverly Hills & Bel Air 90210",
        start,
        start + chrono::Duration::hours(2),
    );
    let now: DateTime<Utc> = start.with_timezone(&Utc);

    let notifications = tables.notifier.reconcile(&[alert], now, &NoZones);
    assert_eq!(notifications.len(), 1);

    let text = notifications[0].render(&HtmlFormat::new());
    let fmt = HtmlFormat::new();
    assert!(text.starts_with("⚠️ <b>Flash Flood Warning</b>\nArea: Beverly Hills &amp; Bel Air 90210\n"));
    assert!(text.contains(&fmt.mention(&"111".into())));
    assert!(!text.contains("tg://user?id=222"));
    assert!(text.contains("2025-06-01T13:00:00-07:00 → 2025-06-01T15:00:00-07:00"));
}
