//! Weather alert deduplication and user matching.
//!
//! Each poll cycle hands the freshly fetched alerts to [`reconcile`], which
//! announces every alert at most once while it is active:
//!
//! 1. purge dedup entries whose expiry has passed,
//! 2. keep alerts whose id is neither seen nor repeated earlier in the batch,
//! 3. match registered users by postal code or by query scope,
//! 4. emit one [`AlertNotification`] per new alert,
//! 5. record the announced ids with their expiry.
//!
//! # Matching
//!
//! A user matches an alert when either
//!
//! - the user's postal code appears in the area description as a whole
//!   token (not directly preceded or followed by a digit), or
//! - the user's location group is in the alert's `query_scope`, i.e. the
//!   per-coordinate query for that group returned the alert.

use std::collections::{BTreeMap, HashSet};

use chrono::{DateTime, Utc};
use lumina_models::{AlertId, AlertRecord, LocationKey, RegisteredUser, UserId};
use tracing::{debug, info};

use crate::advice::safety_advice;
use crate::format::MessageFormat;
use crate::timezone::{format_window, TimezoneResolver};

/// Alert ids already announced, with the time each stops being active.
#[derive(Debug, Clone, Default, PartialEq)]
pub struct SeenAlerts {
    entries: BTreeMap<AlertId, DateTime<Utc>>,
}

impl SeenAlerts {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn from_entries(entries: BTreeMap<AlertId, DateTime<Utc>>) -> Self {
        Self { entries }
    }

    pub fn contains(&self, id: &AlertId) -> bool {
        self.entries.contains_key(id)
    }

    pub fn expiry(&self, id: &AlertId) -> Option<DateTime<Utc>> {
        self.entries.get(id).copied()
    }

    pub fn insert(&mut self, id: AlertId, expires: DateTime<Utc>) {
        self.entries.insert(id, expires);
    }

    /// Drops every entry whose expiry lies strictly before `now`.
    /// Returns how many entries were removed.
    pub fn expire(&mut self, now: DateTime<Utc>) -> usize {
        let before = self.entries.len();
        self.entries.retain(|_, expires| *expires >= now);
        before - self.entries.len()
    }

    pub fn len(&self) -> usize {
        self.entries.len()
    }

    pub fn is_empty(&self) -> bool {
        self.entries.is_empty()
    }

    pub fn entries(&self) -> &BTreeMap<AlertId, DateTime<Utc>> {
        &self.entries
    }
}

/// A matched user and the alert window in their local time.
#[derive(Debug, Clone, PartialEq)]
pub struct Recipient {
    pub user_id: UserId,
    pub window: String,
}

/// One outbound announcement for a newly observed alert.
#[derive(Debug, Clone, PartialEq)]
pub struct AlertNotification {
    pub alert_id: AlertId,
    pub event_kind: String,
    pub area_description: String,
    pub advice: &'static str,
    /// Window with the source timestamps, used when nobody is mentioned.
    pub source_window: String,
    /// Matched users in ascending id order.
    pub recipients: Vec<Recipient>,
}

impl AlertNotification {
    pub fn mentioned_users(&self) -> impl Iterator<Item = &UserId> {
        self.recipients.iter().map(|r| &r.user_id)
    }

    /// Renders the chat message. Recipients with identical windows share a line.
    pub fn render(&self, fmt: &dyn MessageFormat) -> String {
        let mut lines = vec![
            format!("⚠️ {}", fmt.bold(&self.event_kind)),
            format!("Area: {}", fmt.escape(&self.area_description)),
        ];

        if self.recipients.is_empty() {
            lines.push(format!("🕒 {}", fmt.escape(&self.source_window)));
        } else {
            let mut groups: Vec<(&str, Vec<String>)> = Vec::new();
            for recipient in &self.recipients {
                let mention = fmt.mention(&recipient.user_id);
                match groups.iter().position(|(w, _)| *w == recipient.window) {
                    Some(i) => groups[i].1.push(mention),
                    None => groups.push((recipient.window.as_str(), vec![mention])),
                }
            }
            for (window, mentions) in groups {
                lines.push(format!("🕒 {}: {}", fmt.escape(window), mentions.join(", ")));
            }
        }

        lines.push(fmt.escape(self.advice));
        lines.join("\n")
    }
}

/// Returns true when `postal_code` occurs in `area` as a whole token.
pub fn postal_code_matches(area: &str, postal_code: &str) -> bool {
    let postal_code = postal_code.trim();
    if postal_code.is_empty() {
        return false;
    }

    area.match_indices(postal_code).any(|(start, _)| {
        let end = start + postal_code.len();
        let before = area[..start].chars().next_back();
        let after = area[end..].chars().next();
        !before.is_some_and(|c| c.is_ascii_digit()) && !after.is_some_and(|c| c.is_ascii_digit())
    })
}

/// Returns true when `user` should be mentioned for `alert`.
pub fn user_matches(alert: &AlertRecord, user: &RegisteredUser) -> bool {
    postal_code_matches(&alert.area_description, &user.postal_code)
        || alert.query_scope.contains(&user.location_key())
}

/// Computes the notifications for `current` and updates `seen`.
///
/// Calling this twice with the same batch and the same `now` yields no
/// notifications the second time.
pub fn reconcile<'a, U>(
    current: &[AlertRecord],
    seen: &mut SeenAlerts,
    users: U,
    now: DateTime<Utc>,
    tz: &dyn TimezoneResolver,
) -> Vec<AlertNotification>
where
    U: IntoIterator<Item = &'a RegisteredUser>,
    U::IntoIter: Clone,
{
    let purged = seen.expire(now);
    if purged > 0 {
        debug!(purged, "Purged expired alert ids");
    }

    let users = users.into_iter();
    let mut batch_ids: HashSet<&AlertId> = HashSet::new();
    let mut notifications = Vec::new();

    for alert in current {
        if seen.contains(&alert.alert_id) || !batch_ids.insert(&alert.alert_id) {
            continue;
        }

        let mut matched: Vec<&RegisteredUser> =
            users.clone().filter(|u| user_matches(alert, u)).collect();
        matched.sort_by(|a, b| a.user_id.cmp(&b.user_id));
        matched.dedup_by(|a, b| a.user_id == b.user_id);

        let recipients = matched
            .into_iter()
            .map(|user| {
                let zone = tz.timezone_at(user.point());
                if zone.is_none() {
                    debug!(user = %user.user_id, "No timezone for user, using source timestamps");
                }
                Recipient {
                    user_id: user.user_id.clone(),
                    window: format_window(&alert.effective, &alert.expires, zone),
                }
            })
            .collect::<Vec<_>>();

        info!(
            alert_id = %alert.alert_id,
            event = %alert.event_kind,
            recipients = recipients.len(),
            "New alert"
        );

        notifications.push(AlertNotification {
            alert_id: alert.alert_id.clone(),
            event_kind: alert.event_kind.clone(),
            area_description: alert.area_description.clone(),
            advice: safety_advice(&alert.event_kind),
            source_window: format_window(&alert.effective, &alert.expires, None),
            recipients,
        });
    }

    for alert in current {
        if batch_ids.contains(&alert.alert_id) && !seen.contains(&alert.alert_id) {
            seen.insert(alert.alert_id.clone(), alert.expires_utc());
        }
    }

    notifications
}

/// Registered users and the dedup set, owned for the process lifetime.
#[derive(Debug, Clone, Default)]
pub struct AlertNotifier {
    users: BTreeMap<UserId, RegisteredUser>,
    seen: SeenAlerts,
}

impl AlertNotifier {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn from_parts(users: impl IntoIterator<Item = RegisteredUser>, seen: SeenAlerts) -> Self {
        Self {
            users: users.into_iter().map(|u| (u.user_id.clone(), u)).collect(),
            seen,
        }
    }

    /// Adds or replaces a registration. Returns the previous one.
    pub fn register(&mut self, user: RegisteredUser) -> Option<RegisteredUser> {
        self.users.insert(user.user_id.clone(), user)
    }

    pub fn unregister(&mut self, user_id: &UserId) -> Option<RegisteredUser> {
        self.users.remove(user_id)
    }

    pub fn user(&self, user_id: &UserId) -> Option<&RegisteredUser> {
        self.users.get(user_id)
    }

    pub fn users(&self) -> impl Iterator<Item = &RegisteredUser> {
        self.users.values()
    }

    pub fn user_count(&self) -> usize {
        self.users.len()
    }

    pub fn seen(&self) -> &SeenAlerts {
        &self.seen
    }

    /// Registered users grouped by rounded coordinate; one alert query per key.
    pub fn location_groups(&self) -> BTreeMap<LocationKey, Vec<UserId>> {
        let mut groups: BTreeMap<LocationKey, Vec<UserId>> = BTreeMap::new();
        for user in self.users.values() {
            groups
                .entry(user.location_key())
                .or_default()
                .push(user.user_id.clone());
        }
        groups
    }

    /// Runs [`reconcile`] against the owned users and dedup set.
    pub fn reconcile(
        &mut self,
        current: &[AlertRecord],
        now: DateTime<Utc>,
        tz: &dyn TimezoneResolver,
    ) -> Vec<AlertNotification> {
        reconcile(current, &mut self.seen, self.users.values(), now, tz)
    }
}
