//! Error types for the Telegram bot.

use lumina_core::CoreError;
use lumina_persistence::PersistenceError;
use thiserror::Error;

/// Errors that can occur in the Telegram bot.
#[derive(Debug, Error)]
pub enum BotError {
    /// Bot token not provided.
    #[error("Telegram bot token not set. Set TELEGRAM_BOT_TOKEN environment variable.")]
    NoToken,

    /// Failed to start the bot.
    #[error("Failed to start bot: {0}")]
    BotStartFailed(String),

    /// Command used outside a private chat.
    #[error("This command only works in a private chat")]
    PrivateOnly,

    /// Command reserved for moderators.
    #[error("Only moderators can do that")]
    NotModerator,

    /// `/mod` used while no moderator code is configured.
    #[error("Moderator sign-up is disabled")]
    ModCodeDisabled,

    /// Wrong moderator code.
    #[error("Invalid moderator code")]
    InvalidModCode,

    /// `/quiet` with an unusable duration.
    #[error("Quiet period must be between 1 and {max} hours, got {given}")]
    InvalidQuietHours { given: String, max: u32 },

    /// Core service or domain error.
    #[error(transparent)]
    Core(#[from] CoreError),

    /// Data file could not be written or read.
    #[error("Storage error: {0}")]
    Persistence(#[from] PersistenceError),
}

/// Result type for bot operations.
pub type Result<T> = std::result::Result<T, BotError>;
