//! Background loops: weather alert polling and scheduled quotes.

use std::sync::Arc;

use chrono::Utc;
use lumina_core::quotes::local_hour;
use teloxide::prelude::*;
use teloxide::types::ParseMode;
use tokio::time::{interval, MissedTickBehavior};
use tracing::{debug, info, warn};

use crate::format::{escape_html, HtmlFormat};
use crate::handlers::resolve_names;
use crate::state::LuminaState;

/// Polls the alert feed and announces new alerts in the channel.
///
/// A failed cycle is logged and retried on the next tick; ticks that fall
/// behind are skipped so cycles never overlap.
pub async fn alert_loop(bot: Bot, state: Arc<LuminaState>) {
    let channel = ChatId(state.channel_id());
    let mut ticker = interval(state.settings().alert_interval);
    ticker.set_missed_tick_behavior(MissedTickBehavior::Skip);

    loop {
        ticker.tick().await;

        let notifications = match state.poll_alerts(Utc::now()).await {
            Ok(n) => n,
            Err(e) => {
                warn!(error = %e, "Alert poll failed, skipping cycle");
                continue;
            }
        };

        for notification in notifications {
            let names = resolve_names(&bot, channel, notification.mentioned_users()).await;
            let text = notification.render(&HtmlFormat::with_names(names));

            match bot.send_message(channel, text).parse_mode(ParseMode::Html).await {
                Ok(_) => info!(
                    alert_id = %notification.alert_id,
                    recipients = notification.recipients.len(),
                    "Alert announced"
                ),
                Err(e) => warn!(
                    alert_id = %notification.alert_id,
                    error = %e,
                    "Failed to send alert"
                ),
            }
        }
    }
}

/// Posts a quote every quote interval during quote hours.
pub async fn quote_loop(bot: Bot, state: Arc<LuminaState>) {
    let channel = ChatId(state.channel_id());
    let mut ticker = interval(state.settings().quote_interval);
    ticker.set_missed_tick_behavior(MissedTickBehavior::Skip);
    // The first tick completes immediately; the first quote waits one interval.
    ticker.tick().await;

    loop {
        ticker.tick().await;

        let Some(quote) = state.scheduled_quote(local_hour(), Utc::now()).await else {
            continue;
        };

        let text = format!("💡 <i>{}</i>", escape_html(&quote));
        match bot.send_message(channel, text).parse_mode(ParseMode::Html).await {
            Ok(_) => debug!("Quote posted"),
            Err(e) => warn!(error = %e, "Failed to send quote"),
        }
    }
}
