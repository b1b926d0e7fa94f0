//! Active weather alerts from the National Weather Service.
//!
//! Alerts are queried per location group
//! (`/alerts/active?point=<lat>,<lon>`), tagged with the group that returned
//! them, and merged into one batch for the notifier.

use std::collections::HashMap;

use async_trait::async_trait;
use chrono::{DateTime, Duration, FixedOffset};
use futures::future::join_all;
use lumina_models::{AlertId, AlertRecord, LocationKey};
use serde::Deserialize;
use tracing::{debug, warn};
use url::Url;

use crate::error::{CoreError, Result};

/// NWS active alerts endpoint.
pub const NWS_ALERTS_URL: &str = "https://api.weather.gov/alerts/active";

/// How long an alert without any end time is held in the dedup set.
pub const DEFAULT_ALERT_HOLD_HOURS: i64 = 1;

/// Source of currently active alerts for a location.
#[async_trait]
pub trait AlertFeed: Send + Sync {
    async fn active_alerts(&self, location: LocationKey) -> Result<Vec<AlertRecord>>;
}

#[derive(Debug, Deserialize)]
struct FeatureCollection {
    #[serde(default)]
    features: Vec<Feature>,
}

#[derive(Debug, Deserialize)]
struct Feature {
    properties: AlertProperties,
}

#[derive(Debug, Deserialize)]
#[serde(rename_all = "camelCase")]
struct AlertProperties {
    id: Option<String>,
    event: Option<String>,
    #[serde(default)]
    area_desc: String,
    effective: Option<String>,
    expires: Option<String>,
    ends: Option<String>,
}

fn parse_time(raw: Option<&str>) -> Option<DateTime<FixedOffset>> {
    raw.and_then(|s| DateTime::parse_from_rfc3339(s).ok())
}

/// Maps an NWS GeoJSON alert collection to alert records.
///
/// Features missing an id, event or parsable effective time are skipped.
/// The end of the window is `expires`, else `ends`, else effective plus
/// [`DEFAULT_ALERT_HOLD_HOURS`].
pub fn parse_nws_alerts(body: &str) -> Result<Vec<AlertRecord>> {
    let collection: FeatureCollection =
        serde_json::from_str(body).map_err(|e| CoreError::UnexpectedResponse {
            service: "weather.gov",
            detail: e.to_string(),
        })?;

    let mut alerts = Vec::with_capacity(collection.features.len());
    for feature in collection.features {
        let props = feature.properties;
        let (Some(id), Some(event), Some(effective)) = (
            props.id.filter(|s| !s.is_empty()),
            props.event.filter(|s| !s.is_empty()),
            parse_time(props.effective.as_deref()),
        ) else {
            debug!("Skipping alert feature without id/event/effective");
            continue;
        };

        let expires = parse_time(props.expires.as_deref())
            .or_else(|| parse_time(props.ends.as_deref()))
            .unwrap_or_else(|| effective + Duration::hours(DEFAULT_ALERT_HOLD_HOURS));

        alerts.push(AlertRecord::new(id, event, props.area_desc, effective, expires));
    }
    Ok(alerts)
}

/// Alert feed backed by api.weather.gov.
pub struct NwsAlertFeed {
    client: reqwest::Client,
    base_url: Url,
}

impl NwsAlertFeed {
    /// The client must carry a user agent; the service rejects anonymous requests.
    pub fn new(client: reqwest::Client) -> Result<Self> {
        Self::with_base_url(client, NWS_ALERTS_URL)
    }

    pub fn with_base_url(client: reqwest::Client, base_url: &str) -> Result<Self> {
        Ok(Self {
            client,
            base_url: Url::parse(base_url)?,
        })
    }

    fn point_url(&self, location: LocationKey) -> Url {
        let mut url = self.base_url.clone();
        url.query_pairs_mut()
            .append_pair("point", &location.to_string());
        url
    }
}

#[async_trait]
impl AlertFeed for NwsAlertFeed {
    async fn active_alerts(&self, location: LocationKey) -> Result<Vec<AlertRecord>> {
        let url = self.point_url(location);
        debug!(url = %url, "Fetching active alerts");

        let response = self
            .client
            .get(url)
            .header(reqwest::header::ACCEPT, "application/geo+json")
            .send()
            .await?;

        let status = response.status();
        if !status.is_success() {
            return Err(CoreError::UnexpectedResponse {
                service: "weather.gov",
                detail: format!("status {} for {}", status, location),
            });
        }

        let body = response.text().await?;
        parse_nws_alerts(&body)
    }
}

/// Queries every location group concurrently and merges the results.
///
/// Alerts returned for several groups are merged by id: the first record
/// seen is kept and the query scopes are unioned. Order follows `groups`,
/// then feed order. If any group fails, the whole batch fails so that no
/// alert is announced with an incomplete audience.
pub async fn fetch_for_groups(
    feed: &dyn AlertFeed,
    groups: impl IntoIterator<Item = LocationKey>,
) -> Result<Vec<AlertRecord>> {
    let groups: Vec<LocationKey> = groups.into_iter().collect();
    let results = join_all(groups.iter().map(|key| feed.active_alerts(*key))).await;

    let mut merged: Vec<AlertRecord> = Vec::new();
    let mut index: HashMap<AlertId, usize> = HashMap::new();

    for (key, result) in groups.into_iter().zip(results) {
        let alerts = match result {
            Ok(alerts) => alerts,
            Err(e) => {
                warn!(location = %key, error = %e, "Alert fetch failed");
                return Err(e);
            }
        };

        for alert in alerts {
            match index.get(&alert.alert_id) {
                Some(&i) => {
                    merged[i].query_scope.insert(key);
                }
                None => {
                    index.insert(alert.alert_id.clone(), merged.len());
                    merged.push(alert.with_scope(key));
                }
            }
        }
    }

    Ok(merged)
}
