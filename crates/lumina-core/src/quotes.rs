//! Inspirational quotes for the scheduled channel post.

use async_trait::async_trait;
use chrono::{DateTime, Timelike, Utc};
use serde::Deserialize;
use tracing::warn;

use crate::error::{CoreError, Result};

/// ZenQuotes random-quote endpoint.
pub const ZENQUOTES_URL: &str = "https://zenquotes.io/api/random";

/// Posted when the quote service cannot be reached.
pub const FALLBACK_QUOTE: &str = "Stay positive and keep going!";

/// First local hour at which quotes are posted.
pub const QUOTE_START_HOUR: u32 = 8;

/// Last local hour at which quotes are posted (inclusive).
pub const QUOTE_END_HOUR: u32 = 20;

/// Source of a single quote line.
#[async_trait]
pub trait QuoteSource: Send + Sync {
    async fn fetch_quote(&self) -> Result<String>;
}

/// Fetches a quote, degrading to [`FALLBACK_QUOTE`] on any failure.
pub async fn quote_or_fallback(source: &dyn QuoteSource) -> String {
    match source.fetch_quote().await {
        Ok(quote) => quote,
        Err(e) => {
            warn!(error = %e, "Quote fetch failed, using fallback");
            FALLBACK_QUOTE.to_string()
        }
    }
}

/// Returns true when a quote may be posted at local hour `hour`.
pub fn within_quote_hours(hour: u32) -> bool {
    (QUOTE_START_HOUR..=QUOTE_END_HOUR).contains(&hour)
}

/// Decides whether a scheduled quote should go out now.
pub fn should_post_quote(
    local_hour: u32,
    now: DateTime<Utc>,
    quiet_until: Option<DateTime<Utc>>,
) -> bool {
    if quiet_until.is_some_and(|until| now < until) {
        return false;
    }
    within_quote_hours(local_hour)
}

/// Current server-local hour.
pub fn local_hour() -> u32 {
    chrono::Local::now().hour()
}

#[derive(Debug, Deserialize)]
struct ZenQuote {
    q: String,
    a: String,
}

/// Formats the first quote of a ZenQuotes response as `quote — author`.
pub fn parse_zenquotes(body: &str) -> Result<String> {
    let quotes: Vec<ZenQuote> =
        serde_json::from_str(body).map_err(|e| CoreError::UnexpectedResponse {
            service: "zenquotes",
            detail: e.to_string(),
        })?;

    quotes
        .into_iter()
        .next()
        .filter(|q| !q.q.trim().is_empty())
        .map(|q| format!("{} — {}", q.q.trim(), q.a.trim()))
        .ok_or(CoreError::UnexpectedResponse {
            service: "zenquotes",
            detail: "empty quote list".to_string(),
        })
}

/// Quote source backed by zenquotes.io.
pub struct ZenQuotes {
    client: reqwest::Client,
    url: String,
}

impl ZenQuotes {
    pub fn new(client: reqwest::Client) -> Self {
        Self {
            client,
            url: ZENQUOTES_URL.to_string(),
        }
    }
}

#[async_trait]
impl QuoteSource for ZenQuotes {
    async fn fetch_quote(&self) -> Result<String> {
        let response = self.client.get(&self.url).send().await?;
        let status = response.status();
        if !status.is_success() {
            return Err(CoreError::UnexpectedResponse {
                service: "zenquotes",
                detail: format!("status {}", status),
            });
        }
        let body = response.text().await?;
        parse_zenquotes(&body)
    }
}
