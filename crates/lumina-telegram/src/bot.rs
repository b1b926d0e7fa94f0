//! Main Telegram bot implementation.

use std::sync::Arc;

use teloxide::dispatching::UpdateHandler;
use teloxide::prelude::*;
use teloxide::RequestError;
use tracing::{debug, info, warn};

use crate::error::{BotError, Result};
use crate::handlers::{handle_command, handle_inventory_reply, Command};
use crate::health;
use crate::scheduler::{alert_loop, quote_loop};
use crate::state::LuminaState;

/// Posted to the announcement channel on start-up.
pub const ONLINE_MESSAGE: &str = "Lumina is online!";

/// Update routing: known commands, unknown commands, then plain
/// private-chat text, which feeds an open inventory questionnaire.
pub fn schema(state: Arc<LuminaState>) -> UpdateHandler<RequestError> {
    let state_for_commands = Arc::clone(&state);
    let state_for_replies = state;

    dptree::entry()
        .branch(
            Update::filter_message()
                .filter_command::<Command>()
                .endpoint(move |bot: Bot, msg: Message, cmd: Command| {
                    let state = Arc::clone(&state_for_commands);
                    info!(chat_id = %msg.chat.id, "Command matched: {:?}", cmd);
                    async move { handle_command(bot, msg, cmd, state).await }
                }),
        )
        .branch(
            Update::filter_message()
                .filter(|msg: Message| msg.text().map(|t| t.starts_with('/')).unwrap_or(false))
                .endpoint(|bot: Bot, msg: Message| async move {
                    if let Some(text) = msg.text() {
                        info!(cmd = %text, "Unrecognized command");
                        bot.send_message(
                            msg.chat.id,
                            format!(
                                "Unknown command: {}\n\nUse /help to see available commands.",
                                text.split_whitespace().next().unwrap_or(text)
                            ),
                        )
                        .await?;
                    }
                    Ok(())
                }),
        )
        .branch(
            Update::filter_message()
                .filter(|msg: Message| msg.chat.is_private() && msg.text().is_some())
                .endpoint(move |bot: Bot, msg: Message| {
                    let state = Arc::clone(&state_for_replies);
                    async move { handle_inventory_reply(bot, msg, state).await }
                }),
        )
}

/// The Lumina Telegram bot.
pub struct LuminaBot {
    /// The teloxide bot instance.
    bot: Bot,
    /// Shared state across handlers and loops.
    state: Arc<LuminaState>,
    /// Port for the keep-alive endpoint, if enabled.
    health_port: Option<u16>,
}

impl LuminaBot {
    /// Create a bot for `state`, using the token from its settings.
    pub fn new(state: Arc<LuminaState>) -> Result<Self> {
        let token = state.settings().token.trim();
        if token.is_empty() {
            return Err(BotError::NoToken);
        }

        let bot = Bot::new(token);

        Ok(Self {
            bot,
            state,
            health_port: None,
        })
    }

    /// Serve `GET /health` on `port` while the bot runs.
    pub fn with_health_port(mut self, port: Option<u16>) -> Self {
        self.health_port = port;
        self
    }

    /// Get the bot's username.
    pub async fn get_me(&self) -> Result<String> {
        let me = self
            .bot
            .get_me()
            .await
            .map_err(|e| BotError::BotStartFailed(e.to_string()))?;
        Ok(me.username().to_string())
    }

    /// Start the bot in polling mode and run until Ctrl+C.
    pub async fn start_polling(&self) -> Result<()> {
        info!("Starting Lumina in polling mode...");

        let bot = self.bot.clone();
        let channel = ChatId(self.state.channel_id());

        if let Err(e) = bot.send_message(channel, ONLINE_MESSAGE).await {
            warn!(channel = %channel, error = %e, "Failed to post start-up message");
        }

        if let Some(port) = self.health_port {
            tokio::spawn(async move {
                if let Err(e) = health::serve(port).await {
                    warn!(port, error = %e, "Health endpoint stopped");
                }
            });
        }

        // Weather alert polling
        let alert_state = Arc::clone(&self.state);
        let alert_bot = bot.clone();
        tokio::spawn(async move {
            alert_loop(alert_bot, alert_state).await;
        });

        // Scheduled quotes
        let quote_state = Arc::clone(&self.state);
        let quote_bot = bot.clone();
        tokio::spawn(async move {
            quote_loop(quote_bot, quote_state).await;
        });

        let handler = schema(Arc::clone(&self.state));

        info!("Bot is running! Send /start to begin.");

        Dispatcher::builder(bot, handler)
            .default_handler(|upd| async move {
                debug!("Unhandled update: {:?}", upd);
            })
            .enable_ctrlc_handler()
            .build()
            .dispatch()
            .await;

        Ok(())
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::time::Duration;

    use lumina_core::BotSettings;
    use lumina_persistence::DataStore;
    use tempfile::tempdir;

    use crate::state::Services;

    fn test_state(dir: &std::path::Path, token: &str) -> Arc<LuminaState> {
        let settings = BotSettings {
            token: token.into(),
            channel_id: -100123,
            mod_code: None,
            alert_interval: Duration::from_secs(120),
            quote_interval: Duration::from_secs(7200),
            http_timeout: Duration::from_secs(10),
            user_agent: "test".into(),
        };
        let services = Services::live(&settings).unwrap();
        let store = DataStore::new(dir.join("lumina_data.json"));
        Arc::new(LuminaState::load(settings, store, services).unwrap())
    }

    #[test]
    fn test_schema_builds_dispatcher() {
        let dir = tempdir().unwrap();
        let state = test_state(dir.path(), "123456:test-token");

        let handler = schema(Arc::clone(&state));
        let _dispatcher = Dispatcher::builder(Bot::new("123456:test-token"), handler)
            .default_handler(|_upd| async {})
            .build();
    }

    #[test]
    fn test_new_rejects_blank_token() {
        let dir = tempdir().unwrap();
        assert!(LuminaBot::new(test_state(dir.path(), "123456:test-token")).is_ok());
        assert!(matches!(
            LuminaBot::new(test_state(dir.path(), "  ")),
            Err(BotError::NoToken)
        ));
    }
}
