//! Telegram bot for the Lumina community.
//!
//! Lumina mentions members when the National Weather Service issues an
//! alert for their area, posts scheduled inspirational quotes, keeps a
//! sales leaderboard and collects phone inventory for the company form.
//!
//! # Environment Variables
//!
//! Required:
//! - `TELEGRAM_BOT_TOKEN`: Bot token from @BotFather
//! - `LUMINA_CHANNEL_ID`: Chat id of the announcement channel
//!
//! Optional:
//! - `LUMINA_MOD_CODE`: Code for `/mod` (sign-up disabled when unset)
//! - `LUMINA_ALERT_INTERVAL_SECS`: Alert poll interval (default: 120)
//! - `LUMINA_QUOTE_INTERVAL_SECS`: Quote interval (default: 7200)
//! - `LUMINA_HTTP_TIMEOUT_SECS`: Timeout for external calls (default: 10)
//! - `LUMINA_USER_AGENT`: User agent sent to weather.gov
//!
//! # Commands
//!
//! - `/start` - Welcome message
//! - `/help` - Show available commands
//! - `/weather <zip>` - Register for weather alerts
//! - `/unweather` - Stop weather alerts
//! - `/advice <shorthand>` - Safety advice for an event
//! - `/repsale <company> [byod]` - Report a sale
//! - `/leaderboard` - Post the sales leaderboard
//! - `/inventory <company>` - Submit phone inventory (questions asked in a private chat)
//! - `/invrep` - Inventory per rep
//! - `/mod <code>` - Become a moderator (private chat)
//! - `/quiet <hours>` - Pause scheduled quotes (moderators)

pub mod bot;
pub mod error;
pub mod format;
pub mod handlers;
pub mod health;
pub mod scheduler;
pub mod state;

pub use bot::{schema, LuminaBot};
pub use error::{BotError, Result};
pub use format::HtmlFormat;
pub use state::{create_shared_state, BotTables, InventoryProgress, LuminaState, Services};
