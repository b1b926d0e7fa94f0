//! Command handlers for the Telegram bot.

use std::collections::HashMap;
use std::sync::Arc;

use chrono::Utc;
use lumina_core::advice::{expand_shorthand, shorthands};
use lumina_core::{safety_advice, CoreError};
use lumina_models::UserId;
use teloxide::prelude::*;
use teloxide::types::{ParseMode, UserId as TgUserId};
use teloxide::utils::command::BotCommands;
use tracing::{debug, info, warn};

use crate::error::BotError;
use crate::format::{escape_html, HtmlFormat};
use crate::state::{InventoryProgress, LuminaState, ModGrant, MAX_QUIET_HOURS};

/// Bot commands that can be invoked with /.
#[derive(BotCommands, Clone, Debug)]
#[command(rename_rule = "lowercase", description = "Available commands:")]
pub enum Command {
    #[command(description = "Start the bot and get help")]
    Start,

    #[command(description = "Show help message")]
    Help,

    #[command(description = "Get weather alerts for a ZIP code: /weather <zip>")]
    Weather(String),

    #[command(description = "Stop weather alerts")]
    Unweather,

    #[command(description = "Safety advice for an event: /advice <shorthand>")]
    Advice(String),

    #[command(description = "Report a sale: /repsale <gen|aw|company> [byod]")]
    Repsale(String),

    #[command(description = "Post the sales leaderboard")]
    Leaderboard,

    #[command(description = "Submit your phone inventory (asks in a private chat): /inventory <company>")]
    Inventory(String),

    #[command(description = "Show submitted inventory per rep")]
    Invrep,

    #[command(description = "Become a moderator (private chat): /mod <code>")]
    Mod(String),

    #[command(description = "Pause scheduled quotes (moderators): /quiet <hours>")]
    Quiet(String),
}

/// Chat-platform user id of the sender, if any.
fn sender_id(msg: &Message) -> Option<UserId> {
    msg.from.as_ref().map(|u| UserId::from(u.id.0))
}

async fn reply_html(bot: &Bot, msg: &Message, text: impl Into<String>) -> ResponseResult<()> {
    bot.send_message(msg.chat.id, text.into())
        .parse_mode(ParseMode::Html)
        .await?;
    Ok(())
}

/// Looks up display names for mentions. Users that cannot be resolved are
/// left out and rendered by id.
pub async fn resolve_names<'a>(
    bot: &Bot,
    chat_id: ChatId,
    users: impl IntoIterator<Item = &'a UserId>,
) -> HashMap<UserId, String> {
    let mut names = HashMap::new();
    for user in users {
        let Ok(raw) = user.as_str().parse::<u64>() else {
            continue;
        };
        match bot.get_chat_member(chat_id, TgUserId(raw)).await {
            Ok(member) => {
                names.insert(user.clone(), member.user.full_name());
            }
            Err(e) => debug!(user = %user, error = %e, "Could not resolve display name"),
        }
    }
    names
}

/// User-facing text for a domain error.
fn error_reply(e: &BotError) -> String {
    match e {
        BotError::Core(CoreError::InvalidPostalCode(code)) => format!(
            "<b>{}</b> is not a valid ZIP code. Use a 5-digit US ZIP, e.g. <code>/weather 90210</code>.",
            escape_html(code)
        ),
        BotError::Core(CoreError::PostalCodeNotFound(code)) => {
            format!("Could not find ZIP code <b>{}</b>.", escape_html(code))
        }
        BotError::Core(CoreError::UnknownSaleKind(kind)) => format!(
            "Unknown sale type <b>{}</b>. Use <code>gen</code>, <code>aw</code>, or <code>&lt;company&gt; byod</code>.",
            escape_html(kind)
        ),
        BotError::Core(CoreError::SubmissionRejected(status)) => {
            format!("❌ Submission failed. Status code: {}", status)
        }
        BotError::Core(_) => "An outside service is not responding. Try again later.".to_string(),
        BotError::Persistence(_) => {
            "Saved in memory, but writing the data file failed. A moderator should check the logs."
                .to_string()
        }
        other => escape_html(&other.to_string()),
    }
}

/// Handle the /start command.
pub async fn handle_start(bot: Bot, msg: Message, state: Arc<LuminaState>) -> ResponseResult<()> {
    let welcome = format!(
        "Welcome to Lumina! ✨\n\n\
        <b>Weather alerts:</b> /weather &lt;zip&gt; and I will mention you when the \
        National Weather Service issues an alert for your area.\n\
        <b>Safety tips:</b> /advice &lt;event&gt;\n\
        <b>Sales:</b> /repsale, /leaderboard, /inventory and /invrep\n\n\
        Currently watching weather for {} member(s).\n\n\
        Type /help for all commands.",
        state.registered_count().await
    );

    reply_html(&bot, &msg, welcome).await?;

    info!(chat_id = %msg.chat.id, user = ?msg.from.as_ref().map(|u| &u.username), "User started bot");
    Ok(())
}

/// Handle the /help command.
pub async fn handle_help(bot: Bot, msg: Message) -> ResponseResult<()> {
    let help_text = Command::descriptions().to_string();
    bot.send_message(msg.chat.id, help_text).await?;
    Ok(())
}

/// Handle /weather: register with a ZIP, or show the current registration.
pub async fn handle_weather(
    bot: Bot,
    msg: Message,
    state: Arc<LuminaState>,
    zip: String,
) -> ResponseResult<()> {
    let Some(user_id) = sender_id(&msg) else {
        return Ok(());
    };

    if zip.trim().is_empty() {
        let text = match state.registered_zip(&user_id).await {
            Some(zip) => format!(
                "You get weather alerts for ZIP <b>{}</b>.\nUse /unweather to stop.",
                escape_html(&zip)
            ),
            None => "You are not registered for weather alerts.\n\n\
                <b>Usage:</b> <code>/weather 90210</code>"
                .to_string(),
        };
        return reply_html(&bot, &msg, text).await;
    }

    match state.register_weather(user_id.clone(), &zip).await {
        Ok(user) => {
            reply_html(
                &bot,
                &msg,
                format!(
                    "✅ You will be mentioned for weather alerts around ZIP <b>{}</b>.",
                    escape_html(&user.postal_code)
                ),
            )
            .await
        }
        Err(e) => {
            warn!(user = %user_id, zip = %zip.trim(), error = %e, "Weather registration failed");
            reply_html(&bot, &msg, error_reply(&e)).await
        }
    }
}

/// Handle /unweather.
pub async fn handle_unweather(
    bot: Bot,
    msg: Message,
    state: Arc<LuminaState>,
) -> ResponseResult<()> {
    let Some(user_id) = sender_id(&msg) else {
        return Ok(());
    };

    let text = match state.unregister_weather(&user_id).await {
        Ok(true) => "You will no longer get weather alerts.".to_string(),
        Ok(false) => "You were not registered for weather alerts.".to_string(),
        Err(e) => error_reply(&e),
    };
    reply_html(&bot, &msg, text).await
}

/// Handle /advice <shorthand>.
pub async fn handle_advice(bot: Bot, msg: Message, shorthand: String) -> ResponseResult<()> {
    let text = match expand_shorthand(&shorthand) {
        Some(event) => format!(
            "<b>{}</b>\n{}",
            escape_html(event),
            escape_html(safety_advice(event))
        ),
        None => {
            let known: Vec<_> = shorthands()
                .map(|(short, _)| format!("<code>{}</code>", short))
                .collect();
            format!(
                "Unknown event shorthand. Try one of: {}",
                known.join(", ")
            )
        }
    };
    reply_html(&bot, &msg, text).await
}

/// Handle /repsale <company> [byod].
pub async fn handle_repsale(
    bot: Bot,
    msg: Message,
    state: Arc<LuminaState>,
    args: String,
) -> ResponseResult<()> {
    let Some(user_id) = sender_id(&msg) else {
        return Ok(());
    };

    let mut parts = args.split_whitespace();
    let Some(company) = parts.next() else {
        return reply_html(
            &bot,
            &msg,
            "<b>Usage:</b> <code>/repsale gen</code>, <code>/repsale aw</code> or <code>/repsale &lt;company&gt; byod</code>",
        )
        .await;
    };

    let text = match state.record_sale(user_id, company, parts.next()).await {
        Ok(tally) => format!(
            "Sale recorded! You now have {} (Gen: {}, AW: {}, BYOD: {}).",
            tally.total(),
            tally.gen,
            tally.aw,
            tally.byod
        ),
        Err(e) => error_reply(&e),
    };
    reply_html(&bot, &msg, text).await
}

/// Handle /leaderboard: post the standings to the announcement channel.
pub async fn handle_leaderboard(
    bot: Bot,
    msg: Message,
    state: Arc<LuminaState>,
) -> ResponseResult<()> {
    let channel = ChatId(state.channel_id());
    let users = state.leaderboard_users().await;
    let fmt = HtmlFormat::with_names(resolve_names(&bot, channel, &users).await);
    let board = state.render_leaderboard(&fmt).await;

    bot.send_message(channel, board)
        .parse_mode(ParseMode::Html)
        .await?;

    if msg.chat.id != channel {
        bot.send_message(msg.chat.id, "Leaderboard posted to the channel.")
            .await?;
    }
    info!(chat_id = %msg.chat.id, "Leaderboard posted");
    Ok(())
}

/// Handle /inventory <company>: open the questionnaire in the sender's
/// private chat.
pub async fn handle_inventory(
    bot: Bot,
    msg: Message,
    state: Arc<LuminaState>,
    company: String,
) -> ResponseResult<()> {
    let Some(user) = msg.from.as_ref() else {
        return Ok(());
    };
    let user_id = UserId::from(user.id.0);
    let Some(company) = company.split_whitespace().next() else {
        return reply_html(
            &bot,
            &msg,
            "<b>Usage:</b> <code>/inventory &lt;company&gt;</code>, e.g. <code>/inventory gen</code>",
        )
        .await;
    };

    let private = ChatId::from(user.id);
    let question = state.start_inventory(user_id.clone(), company, Utc::now()).await;

    if !msg.chat.is_private() {
        if let Err(e) = bot
            .send_message(private, "Starting inventory submission in our private chat...")
            .await
        {
            warn!(user = %user_id, error = %e, "Could not open private chat for inventory");
            state.cancel_inventory(&user_id).await;
            return reply_html(
                &bot,
                &msg,
                "I can't message you yet. Open a private chat with me, send /start, then try again.",
            )
            .await;
        }
    }

    bot.send_message(private, question).await?;
    Ok(())
}

/// Handle a plain private-chat message: the next questionnaire answer.
pub async fn handle_inventory_reply(
    bot: Bot,
    msg: Message,
    state: Arc<LuminaState>,
) -> ResponseResult<()> {
    let (Some(user_id), Some(text)) = (sender_id(&msg), msg.text()) else {
        return Ok(());
    };

    let reply = match state.answer_inventory(&user_id, text, Utc::now()).await {
        Ok(None) => {
            debug!(user = %user_id, "Private message outside a questionnaire");
            return Ok(());
        }
        Ok(Some(InventoryProgress::Ask(question))) => escape_html(question),
        Ok(Some(InventoryProgress::Submitted(record))) => format!(
            "✅ Inventory submitted successfully! {} phone(s) on hand for <b>{}</b>.",
            record.phone_count(),
            escape_html(&record.company)
        ),
        Ok(Some(InventoryProgress::Expired)) => {
            "⌛ Inventory submission timed out. Start again with <code>/inventory &lt;company&gt;</code>."
                .to_string()
        }
        Err(e) => error_reply(&e),
    };
    reply_html(&bot, &msg, reply).await
}

/// Handle /invrep: inventory per rep, flagging reps with no phones left.
pub async fn handle_invrep(
    bot: Bot,
    msg: Message,
    state: Arc<LuminaState>,
) -> ResponseResult<()> {
    let channel = ChatId(state.channel_id());
    let users = state.inventory_users().await;
    let fmt = HtmlFormat::with_names(resolve_names(&bot, channel, &users).await);
    let report = state.render_inventory_report(&fmt).await;
    reply_html(&bot, &msg, report).await
}

/// Handle /mod <code>. Only accepted in a private chat.
pub async fn handle_mod(
    bot: Bot,
    msg: Message,
    state: Arc<LuminaState>,
    code: String,
) -> ResponseResult<()> {
    if !msg.chat.is_private() {
        return reply_html(&bot, &msg, error_reply(&BotError::PrivateOnly)).await;
    }
    let Some(user_id) = sender_id(&msg) else {
        return Ok(());
    };

    let text = match state.grant_mod(user_id.clone(), &code).await {
        Ok(ModGrant::Granted) => "You are now a moderator.".to_string(),
        Ok(ModGrant::AlreadyModerator) => "You are already a moderator.".to_string(),
        Err(e) => {
            warn!(user = %user_id, error = %e, "Moderator sign-up rejected");
            error_reply(&e)
        }
    };
    reply_html(&bot, &msg, text).await
}

/// Handle /quiet <hours>.
pub async fn handle_quiet(
    bot: Bot,
    msg: Message,
    state: Arc<LuminaState>,
    hours: String,
) -> ResponseResult<()> {
    let Some(user_id) = sender_id(&msg) else {
        return Ok(());
    };

    let text = match state.set_quiet(&user_id, &hours, Utc::now()).await {
        Ok(until) => format!(
            "Scheduled quotes paused until {}.",
            until.format("%Y-%m-%d %H:%M UTC")
        ),
        Err(BotError::InvalidQuietHours { .. }) => format!(
            "<b>Usage:</b> <code>/quiet &lt;hours&gt;</code> (1-{})",
            MAX_QUIET_HOURS
        ),
        Err(e) => error_reply(&e),
    };
    reply_html(&bot, &msg, text).await
}

/// Main command dispatcher.
pub async fn handle_command(
    bot: Bot,
    msg: Message,
    cmd: Command,
    state: Arc<LuminaState>,
) -> ResponseResult<()> {
    match cmd {
        Command::Start => handle_start(bot, msg, state).await,
        Command::Help => handle_help(bot, msg).await,
        Command::Weather(zip) => handle_weather(bot, msg, state, zip).await,
        Command::Unweather => handle_unweather(bot, msg, state).await,
        Command::Advice(shorthand) => handle_advice(bot, msg, shorthand).await,
        Command::Repsale(args) => handle_repsale(bot, msg, state, args).await,
        Command::Leaderboard => handle_leaderboard(bot, msg, state).await,
        Command::Inventory(company) => handle_inventory(bot, msg, state, company).await,
        Command::Invrep => handle_invrep(bot, msg, state).await,
        Command::Mod(code) => handle_mod(bot, msg, state, code).await,
        Command::Quiet(hours) => handle_quiet(bot, msg, state, hours).await,
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_parse_commands() {
        assert!(matches!(
            Command::parse("/weather 90210", "lumina_bot"),
            Ok(Command::Weather(zip)) if zip == "90210"
        ));
        assert!(matches!(
            Command::parse("/weather", "lumina_bot"),
            Ok(Command::Weather(zip)) if zip.is_empty()
        ));
        assert!(matches!(
            Command::parse("/repsale tmo byod", "lumina_bot"),
            Ok(Command::Repsale(args)) if args == "tmo byod"
        ));
        assert!(matches!(
            Command::parse("/leaderboard", "lumina_bot"),
            Ok(Command::Leaderboard)
        ));
        assert!(matches!(
            Command::parse("/inventory gen", "lumina_bot"),
            Ok(Command::Inventory(company)) if company == "gen"
        ));
        assert!(matches!(
            Command::parse("/invrep", "lumina_bot"),
            Ok(Command::Invrep)
        ));
    }

    #[test]
    fn test_error_reply_escapes_input() {
        let text = error_reply(&BotError::Core(CoreError::InvalidPostalCode("<b>".into())));
        assert!(text.starts_with("<b>&lt;b&gt;</b> is not a valid ZIP code"));

        let text = error_reply(&BotError::InvalidQuietHours {
            given: "x".into(),
            max: 72,
        });
        assert_eq!(text, "Quiet period must be between 1 and 72 hours, got x");

        let text = error_reply(&BotError::Core(CoreError::SubmissionRejected(403)));
        assert_eq!(text, "❌ Submission failed. Status code: 403");
    }

    #[test]
    fn test_descriptions_list_commands() {
        let help = Command::descriptions().to_string();
        for cmd in [
            "/weather",
            "/unweather",
            "/advice",
            "/repsale",
            "/leaderboard",
            "/inventory",
            "/invrep",
            "/quiet",
        ] {
            assert!(help.contains(cmd), "missing {cmd}");
        }
    }
}
