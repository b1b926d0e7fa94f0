//! Platform-neutral message formatting.
//!
//! Core code builds chat text through a [`MessageFormat`] so the notifier and
//! leaderboard never need to know the chat platform's markup or mention
//! syntax.

use lumina_models::UserId;

/// Markup hooks for outbound chat text.
pub trait MessageFormat: Send + Sync {
    /// Renders a mention of `user`.
    fn mention(&self, user: &UserId) -> String;

    /// Escapes free text for the target markup.
    fn escape(&self, raw: &str) -> String {
        raw.to_string()
    }

    /// Renders emphasized text.
    fn bold(&self, raw: &str) -> String {
        self.escape(raw)
    }
}

/// Plain text with `@<user_id>` mentions.
#[derive(Debug, Clone, Copy, Default)]
pub struct PlainFormat;

impl MessageFormat for PlainFormat {
    fn mention(&self, user: &UserId) -> String {
        format!("@{}", user)
    }
}
