//! Lumina Core - business logic behind the Lumina community bot.
//!
//! - **notifier**: alert deduplication and user matching (`AlertNotifier`)
//! - **alerts_feed**: per-coordinate active alerts from weather.gov
//! - **geocode**: postal code to coordinates via Zippopotam.us
//! - **timezone**: local rendering of alert windows
//! - **advice**: safety advice per event kind
//! - **quotes**: scheduled inspirational quotes
//! - **sales**: sales tallies and leaderboard
//! - **inventory**: private-chat inventory form, JotForm submission, IMEI stock
//! - **signature**: PNG signature attached to inventory forms
//! - **config**: paths and runtime settings

pub mod advice;
pub mod alerts_feed;
pub mod config;
pub mod error;
pub mod format;
pub mod geocode;
pub mod http;
pub mod inventory;
pub mod notifier;
pub mod quotes;
pub mod sales;
pub mod signature;
pub mod timezone;

// Re-export commonly used items for convenience
pub use advice::{expand_shorthand, safety_advice, GENERIC_ADVICE};
pub use alerts_feed::{fetch_for_groups, AlertFeed, NwsAlertFeed};
pub use config::BotSettings;
pub use error::{CoreError, Result};
pub use format::{MessageFormat, PlainFormat};
pub use geocode::{normalize_postal_code, Geocoder, ZippopotamGeocoder};
pub use http::build_client;
pub use inventory::{
    submission_date, submit_inventory, DraftStep, InventoryBook, InventoryDraft, InventorySink,
    InventorySubmission, JotForm,
};
pub use notifier::{reconcile, AlertNotification, AlertNotifier, Recipient, SeenAlerts};
pub use quotes::{quote_or_fallback, should_post_quote, QuoteSource, ZenQuotes};
pub use sales::{parse_sale, SalesBoard};
pub use signature::signature_base64;
pub use timezone::{format_window, to_local_time, TimezoneResolver, TzfResolver};
