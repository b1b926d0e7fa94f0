//! Shared state for the Telegram bot.
//!
//! All mutable tables live behind one mutex. Every mutation is written to
//! the data file before the lock is released, and no network call is made
//! while the lock is held.

use std::collections::{BTreeSet, HashMap};
use std::sync::Arc;

use chrono::{DateTime, Duration, Utc};
use lumina_core::inventory::QUESTIONS;
use lumina_core::{
    build_client, fetch_for_groups, normalize_postal_code, parse_sale, quote_or_fallback,
    should_post_quote, submission_date, submit_inventory, AlertFeed, AlertNotification,
    AlertNotifier, BotSettings, DraftStep, Geocoder, InventoryBook, InventoryDraft,
    InventorySink, JotForm, MessageFormat, NwsAlertFeed, QuoteSource, SalesBoard, SeenAlerts,
    TimezoneResolver, TzfResolver, ZenQuotes, ZippopotamGeocoder,
};
use lumina_models::{InventoryRecord, RegisteredUser, SalesTally, UserId};
use lumina_persistence::{DataStore, LuminaData};
use tokio::sync::{Mutex, RwLock};
use tracing::{debug, error, info, warn};

use crate::error::{BotError, Result};

/// Longest quiet period a moderator may request.
pub const MAX_QUIET_HOURS: u32 = 72;

/// External collaborators, swappable in tests.
#[derive(Clone)]
pub struct Services {
    pub geocoder: Arc<dyn Geocoder>,
    pub alerts: Arc<dyn AlertFeed>,
    pub quotes: Arc<dyn QuoteSource>,
    pub timezones: Arc<dyn TimezoneResolver>,
    pub inventory: Arc<dyn InventorySink>,
}

impl Services {
    /// Live clients sharing one HTTP client.
    pub fn live(settings: &BotSettings) -> Result<Self> {
        let client = build_client(settings.http_timeout, &settings.user_agent)?;
        Ok(Self {
            geocoder: Arc::new(ZippopotamGeocoder::new(client.clone())?),
            alerts: Arc::new(NwsAlertFeed::new(client.clone())?),
            quotes: Arc::new(ZenQuotes::new(client.clone())),
            timezones: Arc::new(TzfResolver::new()),
            inventory: Arc::new(JotForm::new(client)),
        })
    }
}

/// The in-memory tables mirrored to the data file.
#[derive(Debug, Default)]
pub struct BotTables {
    pub notifier: AlertNotifier,
    pub sales: SalesBoard,
    pub inventory: InventoryBook,
    pub mods: BTreeSet<UserId>,
}

impl BotTables {
    pub fn from_data(data: LuminaData) -> Self {
        let notifier = AlertNotifier::from_parts(
            data.registered_users(),
            SeenAlerts::from_entries(data.seen_alerts),
        );
        Self {
            notifier,
            sales: SalesBoard::from_tallies(data.sales_data),
            inventory: InventoryBook::from_records(data.inventory_data),
            mods: data.mods,
        }
    }

    pub fn snapshot(&self) -> LuminaData {
        let mut data = LuminaData {
            sales_data: self.sales.tallies().clone(),
            mods: self.mods.clone(),
            inventory_data: self.inventory.records().clone(),
            seen_alerts: self.notifier.seen().entries().clone(),
            ..LuminaData::default()
        };
        data.set_registered_users(self.notifier.users());
        data
    }
}

/// Outcome of a `/mod` attempt.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum ModGrant {
    Granted,
    AlreadyModerator,
}

/// Outcome of one private-chat message during `/inventory`.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum InventoryProgress {
    /// Ask the next question.
    Ask(&'static str),
    /// The form was accepted and the stock recorded.
    Submitted(InventoryRecord),
    /// The previous question went unanswered too long; the draft is gone.
    Expired,
}

/// Shared state for the bot, accessible across handlers and loops.
pub struct LuminaState {
    settings: BotSettings,
    store: DataStore,
    tables: Mutex<BotTables>,
    /// Inventory questionnaires in progress, keyed by rep.
    inventory_drafts: Mutex<HashMap<UserId, InventoryDraft>>,
    quiet_until: RwLock<Option<DateTime<Utc>>>,
    services: Services,
}

impl LuminaState {
    /// Loads the data file and builds the state.
    pub fn load(settings: BotSettings, store: DataStore, services: Services) -> Result<Self> {
        let data = store.load()?;
        Ok(Self {
            settings,
            store,
            tables: Mutex::new(BotTables::from_data(data)),
            inventory_drafts: Mutex::new(HashMap::new()),
            quiet_until: RwLock::new(None),
            services,
        })
    }

    pub fn settings(&self) -> &BotSettings {
        &self.settings
    }

    /// Chat id of the announcement channel.
    pub fn channel_id(&self) -> i64 {
        self.settings.channel_id
    }

    fn persist(&self, tables: &BotTables) -> Result<()> {
        self.store.save(&tables.snapshot()).map_err(|e| {
            error!(error = %e, path = %self.store.path().display(), "Failed to save bot data");
            BotError::from(e)
        })
    }

    /// Geocodes `raw_zip` and registers (or re-registers) the user.
    ///
    /// Nothing is changed when the code is invalid or the lookup fails.
    pub async fn register_weather(&self, user_id: UserId, raw_zip: &str) -> Result<RegisteredUser> {
        let zip = normalize_postal_code(raw_zip)?;
        let point = self.services.geocoder.locate(&zip).await?;
        let user = RegisteredUser::new(user_id, zip, point);

        let mut tables = self.tables.lock().await;
        let previous = tables.notifier.register(user.clone());
        self.persist(&tables)?;

        info!(
            user = %user.user_id,
            zip = %user.postal_code,
            replaced = previous.is_some(),
            "Registered for weather alerts"
        );
        Ok(user)
    }

    /// Removes a registration. Returns false if the user had none.
    pub async fn unregister_weather(&self, user_id: &UserId) -> Result<bool> {
        let mut tables = self.tables.lock().await;
        if tables.notifier.unregister(user_id).is_none() {
            return Ok(false);
        }
        self.persist(&tables)?;
        info!(user = %user_id, "Unregistered from weather alerts");
        Ok(true)
    }

    pub async fn registered_zip(&self, user_id: &UserId) -> Option<String> {
        let tables = self.tables.lock().await;
        tables.notifier.user(user_id).map(|u| u.postal_code.clone())
    }

    pub async fn registered_count(&self) -> usize {
        self.tables.lock().await.notifier.user_count()
    }

    /// Records a sale from `/repsale <company> [extra]`.
    ///
    /// A `gen` or `aw` sale also takes one phone off the rep's inventory for
    /// that company.
    pub async fn record_sale(
        &self,
        user_id: UserId,
        company: &str,
        extra: Option<&str>,
    ) -> Result<SalesTally> {
        let kind = parse_sale(company, extra)?;
        let mut tables = self.tables.lock().await;
        let tally = tables.sales.record(user_id.clone(), kind);
        if let Some(imei) = tables.inventory.deduct_sale(&user_id, kind) {
            debug!(user = %user_id, imei = %imei, "Phone taken from inventory");
        }
        self.persist(&tables)?;
        info!(user = %user_id, kind = %kind, total = tally.total(), "Sale recorded");
        Ok(tally)
    }

    /// Users on the leaderboard, highest first.
    pub async fn leaderboard_users(&self) -> Vec<UserId> {
        let tables = self.tables.lock().await;
        tables
            .sales
            .leaderboard()
            .into_iter()
            .map(|(id, _)| id.clone())
            .collect()
    }

    pub async fn render_leaderboard(&self, fmt: &dyn MessageFormat) -> String {
        let board = self.tables.lock().await.sales.clone();
        board.render_leaderboard(fmt)
    }

    /// Starts (or restarts) an inventory questionnaire and returns the first
    /// question.
    pub async fn start_inventory(
        &self,
        user_id: UserId,
        company: &str,
        now: DateTime<Utc>,
    ) -> &'static str {
        let draft = InventoryDraft::new(company, now);
        info!(user = %user_id, company = %draft.company(), "Inventory questionnaire started");
        self.inventory_drafts.lock().await.insert(user_id, draft);
        QUESTIONS[0]
    }

    /// Drops the rep's questionnaire. Returns false if there was none.
    pub async fn cancel_inventory(&self, user_id: &UserId) -> bool {
        self.inventory_drafts.lock().await.remove(user_id).is_some()
    }

    /// Feeds a private-chat message to the rep's questionnaire.
    ///
    /// Returns `None` when the rep has no questionnaire open. The last answer
    /// triggers the form submission, made without holding any lock; the
    /// stock is only recorded once the form is accepted.
    pub async fn answer_inventory(
        &self,
        user_id: &UserId,
        text: &str,
        now: DateTime<Utc>,
    ) -> Result<Option<InventoryProgress>> {
        let submission = {
            let mut drafts = self.inventory_drafts.lock().await;
            let Some(draft) = drafts.get_mut(user_id) else {
                return Ok(None);
            };
            if draft.is_expired(now) {
                drafts.remove(user_id);
                info!(user = %user_id, "Inventory questionnaire timed out");
                return Ok(Some(InventoryProgress::Expired));
            }
            match draft.answer(text, now) {
                DraftStep::Ask(question) => return Ok(Some(InventoryProgress::Ask(question))),
                DraftStep::Complete(submission) => {
                    drafts.remove(user_id);
                    submission
                }
            }
        };

        let date = submission_date(now, &chrono::Local);
        if let Err(e) = submit_inventory(self.services.inventory.as_ref(), &submission, &date).await
        {
            warn!(
                user = %user_id,
                company = %submission.company,
                error = %e,
                "Inventory submission failed"
            );
            return Err(e.into());
        }

        let record = submission.to_record(&date);
        let mut tables = self.tables.lock().await;
        tables.inventory.record(user_id.clone(), record.clone());
        self.persist(&tables)?;
        info!(
            user = %user_id,
            company = %record.company,
            phones = record.phone_count(),
            "Inventory submitted"
        );
        Ok(Some(InventoryProgress::Submitted(record)))
    }

    /// Reps with a submitted inventory, in id order.
    pub async fn inventory_users(&self) -> Vec<UserId> {
        let tables = self.tables.lock().await;
        tables.inventory.records().keys().cloned().collect()
    }

    pub async fn render_inventory_report(&self, fmt: &dyn MessageFormat) -> String {
        let book = self.tables.lock().await.inventory.clone();
        book.render_report(fmt)
    }

    /// Adds `user_id` to the moderators when `code` matches the configured one.
    pub async fn grant_mod(&self, user_id: UserId, code: &str) -> Result<ModGrant> {
        let expected = self
            .settings
            .mod_code
            .as_deref()
            .ok_or(BotError::ModCodeDisabled)?;
        if code.trim() != expected {
            return Err(BotError::InvalidModCode);
        }

        let mut tables = self.tables.lock().await;
        if !tables.mods.insert(user_id.clone()) {
            return Ok(ModGrant::AlreadyModerator);
        }
        self.persist(&tables)?;
        info!(user = %user_id, "Moderator added");
        Ok(ModGrant::Granted)
    }

    pub async fn is_mod(&self, user_id: &UserId) -> bool {
        self.tables.lock().await.mods.contains(user_id)
    }

    /// Suppresses scheduled quotes for `hours` hours. Moderators only.
    pub async fn set_quiet(
        &self,
        user_id: &UserId,
        hours: &str,
        now: DateTime<Utc>,
    ) -> Result<DateTime<Utc>> {
        if !self.is_mod(user_id).await {
            return Err(BotError::NotModerator);
        }
        let hours = match hours.trim().parse::<u32>() {
            Ok(h) if (1..=MAX_QUIET_HOURS).contains(&h) => h,
            _ => {
                return Err(BotError::InvalidQuietHours {
                    given: hours.trim().to_string(),
                    max: MAX_QUIET_HOURS,
                })
            }
        };

        let until = now + Duration::hours(i64::from(hours));
        *self.quiet_until.write().await = Some(until);
        info!(user = %user_id, until = %until, "Quiet period set");
        Ok(until)
    }

    pub async fn quiet_until(&self) -> Option<DateTime<Utc>> {
        *self.quiet_until.read().await
    }

    /// Runs one alert poll cycle.
    ///
    /// The feed is queried once per location group outside the lock; the
    /// batch is then reconciled and the dedup set persisted. A failed fetch
    /// leaves every table untouched. A failed save is logged and the
    /// notifications are still returned, since the ids are already marked
    /// as announced in memory.
    pub async fn poll_alerts(&self, now: DateTime<Utc>) -> Result<Vec<AlertNotification>> {
        let groups: Vec<_> = {
            let tables = self.tables.lock().await;
            tables.notifier.location_groups().into_keys().collect()
        };
        if groups.is_empty() {
            debug!("No registered users, skipping alert poll");
            return Ok(Vec::new());
        }

        let alerts = fetch_for_groups(self.services.alerts.as_ref(), groups).await?;

        let mut tables = self.tables.lock().await;
        let before = tables.notifier.seen().clone();
        let notifications =
            tables
                .notifier
                .reconcile(&alerts, now, self.services.timezones.as_ref());
        if *tables.notifier.seen() != before {
            // persist() already logs the failure
            let _ = self.persist(&tables);
        }
        debug!(
            fetched = alerts.len(),
            new = notifications.len(),
            "Alert poll complete"
        );
        Ok(notifications)
    }

    /// Returns the quote to post now, or `None` outside quote hours or
    /// during a quiet period.
    pub async fn scheduled_quote(&self, local_hour: u32, now: DateTime<Utc>) -> Option<String> {
        if !should_post_quote(local_hour, now, self.quiet_until().await) {
            debug!(local_hour, "Skipping scheduled quote");
            return None;
        }
        Some(quote_or_fallback(self.services.quotes.as_ref()).await)
    }
}

/// Create shared state wrapped in Arc.
pub fn create_shared_state(
    settings: BotSettings,
    store: DataStore,
    services: Services,
) -> Result<Arc<LuminaState>> {
    Ok(Arc::new(LuminaState::load(settings, store, services)?))
}

#[cfg(test)]
mod tests {
    use super::*;
    use async_trait::async_trait;
    use chrono_tz::Tz;
    use lumina_core::{CoreError, PlainFormat};
    use lumina_models::{AlertRecord, GeoPoint, LocationKey};
    use std::sync::atomic::{AtomicUsize, Ordering};
    use tempfile::tempdir;

    struct FixedGeocoder;

    #[async_trait]
    impl Geocoder for FixedGeocoder {
        async fn locate(&self, postal_code: &str) -> lumina_core::Result<GeoPoint> {
            match postal_code {
                "90210" => Ok(GeoPoint::new(34.0901, -118.4065)),
                other => Err(CoreError::PostalCodeNotFound(other.to_string())),
            }
        }
    }

    struct OneAlert {
        calls: AtomicUsize,
    }

    #[async_trait]
    impl AlertFeed for OneAlert {
        async fn active_alerts(&self, _location: LocationKey) -> lumina_core::Result<Vec<AlertRecord>> {
            self.calls.fetch_add(1, Ordering::SeqCst);
            let start = DateTime::parse_from_rfc3339("2025-06-01T20:00:00Z").unwrap();
            Ok(vec![AlertRecord::new(
                "A1",
                "Tornado Warning",
                "Los Angeles, CA 90210",
                start,
                start + Duration::hours(1),
            )])
        }
    }

    struct FixedQuote;

    #[async_trait]
    impl QuoteSource for FixedQuote {
        async fn fetch_quote(&self) -> lumina_core::Result<String> {
            Ok("Keep going. — Someone".to_string())
        }
    }

    /// Accepts every form, or rejects all with `status`.
    struct FormDesk {
        status: Option<u16>,
        posts: AtomicUsize,
    }

    impl FormDesk {
        fn accepting() -> Self {
            Self {
                status: None,
                posts: AtomicUsize::new(0),
            }
        }
    }

    #[async_trait]
    impl InventorySink for FormDesk {
        async fn submit(&self, fields: &[(&'static str, String)]) -> lumina_core::Result<()> {
            self.posts.fetch_add(1, Ordering::SeqCst);
            assert!(fields.iter().any(|(k, v)| *k == "q11_signature" && !v.is_empty()));
            match self.status {
                Some(status) => Err(CoreError::SubmissionRejected(status)),
                None => Ok(()),
            }
        }
    }

    struct Pacific;

    impl TimezoneResolver for Pacific {
        fn timezone_at(&self, _point: GeoPoint) -> Option<Tz> {
            Some(chrono_tz::America::Los_Angeles)
        }
    }

    fn settings(mod_code: Option<&str>) -> BotSettings {
        BotSettings {
            token: "test-token".into(),
            channel_id: -100123,
            mod_code: mod_code.map(str::to_string),
            alert_interval: std::time::Duration::from_secs(120),
            quote_interval: std::time::Duration::from_secs(7200),
            http_timeout: std::time::Duration::from_secs(10),
            user_agent: "test".into(),
        }
    }

    fn services() -> Services {
        services_with(FormDesk::accepting())
    }

    fn services_with(forms: FormDesk) -> Services {
        Services {
            geocoder: Arc::new(FixedGeocoder),
            alerts: Arc::new(OneAlert {
                calls: AtomicUsize::new(0),
            }),
            quotes: Arc::new(FixedQuote),
            timezones: Arc::new(Pacific),
            inventory: Arc::new(forms),
        }
    }

    fn state_in(dir: &std::path::Path, mod_code: Option<&str>) -> LuminaState {
        let store = DataStore::new(dir.join("lumina_data.json"));
        LuminaState::load(settings(mod_code), store, services()).unwrap()
    }

    async fn fill_inventory(
        state: &LuminaState,
        user: &UserId,
        imeis: &str,
    ) -> Option<InventoryProgress> {
        let mut last = None;
        for text in ["YES", "Ada", "Lovelace", "ada@example.com", imeis] {
            last = state.answer_inventory(user, text, t0()).await.unwrap();
        }
        last
    }

    fn t0() -> DateTime<Utc> {
        DateTime::parse_from_rfc3339("2025-06-01T20:00:00Z")
            .unwrap()
            .with_timezone(&Utc)
    }

    #[tokio::test]
    async fn test_register_weather_persists() {
        let dir = tempdir().unwrap();
        let state = state_in(dir.path(), None);

        let user = state.register_weather("42".into(), "90210-1234").await.unwrap();
        assert_eq!(user.postal_code, "90210");
        assert_eq!(state.registered_zip(&"42".into()).await.as_deref(), Some("90210"));

        let reloaded = state_in(dir.path(), None);
        assert_eq!(reloaded.registered_zip(&"42".into()).await.as_deref(), Some("90210"));
    }

    #[tokio::test]
    async fn test_register_weather_failure_no_mutation() {
        let dir = tempdir().unwrap();
        let state = state_in(dir.path(), None);

        assert!(matches!(
            state.register_weather("42".into(), "00000").await,
            Err(BotError::Core(CoreError::PostalCodeNotFound(_)))
        ));
        assert!(matches!(
            state.register_weather("42".into(), "zip").await,
            Err(BotError::Core(CoreError::InvalidPostalCode(_)))
        ));
        assert_eq!(state.registered_count().await, 0);
        assert!(!dir.path().join("lumina_data.json").exists());
    }

    #[tokio::test]
    async fn test_unregister() {
        let dir = tempdir().unwrap();
        let state = state_in(dir.path(), None);
        state.register_weather("42".into(), "90210").await.unwrap();

        assert!(state.unregister_weather(&"42".into()).await.unwrap());
        assert!(!state.unregister_weather(&"42".into()).await.unwrap());
        assert_eq!(state.registered_zip(&"42".into()).await, None);
    }

    #[tokio::test]
    async fn test_poll_alerts_dedups_across_restart() {
        let dir = tempdir().unwrap();
        let state = state_in(dir.path(), None);
        state.register_weather("42".into(), "90210").await.unwrap();

        let first = state.poll_alerts(t0()).await.unwrap();
        assert_eq!(first.len(), 1);
        assert_eq!(first[0].recipients[0].user_id, UserId::from("42"));
        assert!(state.poll_alerts(t0()).await.unwrap().is_empty());

        let restarted = state_in(dir.path(), None);
        assert!(restarted.poll_alerts(t0()).await.unwrap().is_empty());
        assert_eq!(
            restarted
                .poll_alerts(t0() + Duration::seconds(3601))
                .await
                .unwrap()
                .len(),
            1
        );
    }

    #[tokio::test]
    async fn test_poll_alerts_announces_when_save_fails() {
        let dir = tempdir().unwrap();
        let state = state_in(dir.path(), None);
        state.register_weather("42".into(), "90210").await.unwrap();

        let data_file = dir.path().join("lumina_data.json");
        std::fs::remove_file(&data_file).unwrap();
        std::fs::create_dir(&data_file).unwrap();

        let first = state.poll_alerts(t0()).await.unwrap();
        assert_eq!(first.len(), 1);
        assert_eq!(first[0].alert_id.as_str(), "A1");

        std::fs::remove_dir(&data_file).unwrap();
        assert!(state.poll_alerts(t0()).await.unwrap().is_empty());
    }

    #[tokio::test]
    async fn test_poll_without_users_skips_feed() {
        let dir = tempdir().unwrap();
        let state = state_in(dir.path(), None);

        assert!(state.poll_alerts(t0()).await.unwrap().is_empty());
    }

    #[tokio::test]
    async fn test_record_sale_and_leaderboard() {
        let dir = tempdir().unwrap();
        let state = state_in(dir.path(), None);

        state.record_sale("1".into(), "gen", None).await.unwrap();
        state.record_sale("2".into(), "aw", None).await.unwrap();
        let tally = state.record_sale("2".into(), "tmo", Some("byod")).await.unwrap();
        assert_eq!(tally.total(), 2);
        assert!(matches!(
            state.record_sale("2".into(), "tmo", None).await,
            Err(BotError::Core(CoreError::UnknownSaleKind(_)))
        ));

        assert_eq!(
            state.leaderboard_users().await,
            vec![UserId::from("2"), UserId::from("1")]
        );
        let text = state.render_leaderboard(&PlainFormat).await;
        assert!(text.contains("@2 - Total Sales: 2 (Gen: 0, AW: 1, BYOD: 1)"));
    }

    #[tokio::test]
    async fn test_grant_mod() {
        let dir = tempdir().unwrap();
        let state = state_in(dir.path(), Some("sesame"));

        assert!(matches!(
            state.grant_mod("9".into(), "wrong").await,
            Err(BotError::InvalidModCode)
        ));
        assert_eq!(state.grant_mod("9".into(), " sesame ").await.unwrap(), ModGrant::Granted);
        assert_eq!(
            state.grant_mod("9".into(), "sesame").await.unwrap(),
            ModGrant::AlreadyModerator
        );
        assert!(state.is_mod(&"9".into()).await);

        let disabled = state_in(tempdir().unwrap().path(), None);
        assert!(matches!(
            disabled.grant_mod("9".into(), "sesame").await,
            Err(BotError::ModCodeDisabled)
        ));
    }

    #[tokio::test]
    async fn test_quiet_period() {
        let dir = tempdir().unwrap();
        let state = state_in(dir.path(), Some("sesame"));

        assert!(matches!(
            state.set_quiet(&"9".into(), "2", t0()).await,
            Err(BotError::NotModerator)
        ));

        state.grant_mod("9".into(), "sesame").await.unwrap();
        assert!(matches!(
            state.set_quiet(&"9".into(), "0", t0()).await,
            Err(BotError::InvalidQuietHours { .. })
        ));
        assert!(state.set_quiet(&"9".into(), "73", t0()).await.is_err());

        let until = state.set_quiet(&"9".into(), "2", t0()).await.unwrap();
        assert_eq!(until, t0() + Duration::hours(2));
        assert_eq!(state.scheduled_quote(12, t0()).await, None);
        assert_eq!(
            state.scheduled_quote(12, until).await.as_deref(),
            Some("Keep going. — Someone")
        );
        assert_eq!(state.scheduled_quote(22, until).await, None);
    }

    #[tokio::test]
    async fn test_inventory_questionnaire_records_stock() {
        let dir = tempdir().unwrap();
        let state = state_in(dir.path(), None);
        let rep = UserId::from("7");

        assert_eq!(state.answer_inventory(&rep, "hello", t0()).await.unwrap(), None);
        assert_eq!(state.start_inventory(rep.clone(), "gen", t0()).await, QUESTIONS[0]);
        assert_eq!(
            state.answer_inventory(&rep, "YES", t0()).await.unwrap(),
            Some(InventoryProgress::Ask(QUESTIONS[1]))
        );

        let mut last = None;
        for text in ["Ada", "Lovelace", "ada@example.com", "111\n222\n333"] {
            last = state.answer_inventory(&rep, text, t0()).await.unwrap();
        }
        let Some(InventoryProgress::Submitted(record)) = last else {
            panic!("expected a submitted inventory, got {last:?}");
        };
        assert_eq!(record.company, "GEN");
        assert_eq!(record.imeis, vec!["111", "222", "333"]);
        assert_eq!(state.answer_inventory(&rep, "extra", t0()).await.unwrap(), None);

        let reloaded = state_in(dir.path(), None);
        assert_eq!(reloaded.inventory_users().await, vec![rep.clone()]);
        let report = reloaded.render_inventory_report(&PlainFormat).await;
        assert!(report.contains("@7 | GEN | 3 |"));
    }

    #[tokio::test]
    async fn test_sales_take_phones_from_matching_inventory() {
        let dir = tempdir().unwrap();
        let state = state_in(dir.path(), None);
        let rep = UserId::from("7");
        state.start_inventory(rep.clone(), "AW", t0()).await;
        fill_inventory(&state, &rep, "111\n222").await;

        state.record_sale(rep.clone(), "gen", None).await.unwrap();
        state.record_sale(rep.clone(), "tmo", Some("byod")).await.unwrap();
        assert!(state.render_inventory_report(&PlainFormat).await.contains("@7 | AW | 2 |"));

        state.record_sale(rep.clone(), "aw", None).await.unwrap();
        state.record_sale(rep.clone(), "aw", None).await.unwrap();
        state.record_sale(rep.clone(), "aw", None).await.unwrap();

        let reloaded = state_in(dir.path(), None);
        let report = reloaded.render_inventory_report(&PlainFormat).await;
        assert!(report.contains("⚠️ @7 | AW | 0 |"));
    }

    #[tokio::test]
    async fn test_inventory_rejected_form_records_nothing() {
        let dir = tempdir().unwrap();
        let store = DataStore::new(dir.path().join("lumina_data.json"));
        let forms = FormDesk {
            status: Some(500),
            posts: AtomicUsize::new(0),
        };
        let state = LuminaState::load(settings(None), store, services_with(forms)).unwrap();
        let rep = UserId::from("7");

        state.start_inventory(rep.clone(), "gen", t0()).await;
        let mut result = Ok(None);
        for text in ["YES", "Ada", "Lovelace", "ada@example.com", "111"] {
            result = state.answer_inventory(&rep, text, t0()).await;
        }
        assert!(matches!(
            result,
            Err(BotError::Core(CoreError::SubmissionRejected(500)))
        ));
        assert!(state.inventory_users().await.is_empty());
        assert!(!state.cancel_inventory(&rep).await);
        assert!(!dir.path().join("lumina_data.json").exists());
    }

    #[tokio::test]
    async fn test_inventory_times_out() {
        let dir = tempdir().unwrap();
        let state = state_in(dir.path(), None);
        let rep = UserId::from("7");

        state.start_inventory(rep.clone(), "gen", t0()).await;
        let late = t0() + Duration::seconds(301);
        assert_eq!(
            state.answer_inventory(&rep, "YES", late).await.unwrap(),
            Some(InventoryProgress::Expired)
        );
        assert_eq!(state.answer_inventory(&rep, "YES", late).await.unwrap(), None);

        state.start_inventory(rep.clone(), "gen", t0()).await;
        assert!(state.cancel_inventory(&rep).await);
        assert_eq!(state.answer_inventory(&rep, "YES", t0()).await.unwrap(), None);
    }
}
