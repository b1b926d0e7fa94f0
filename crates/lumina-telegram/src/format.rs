//! Telegram HTML markup for outbound messages.

use std::collections::HashMap;

use lumina_core::MessageFormat;
use lumina_models::UserId;

/// Escapes the characters Telegram's HTML parse mode treats as markup.
pub fn escape_html(raw: &str) -> String {
    let mut out = String::with_capacity(raw.len());
    for c in raw.chars() {
        match c {
            '&' => out.push_str("&amp;"),
            '<' => out.push_str("&lt;"),
            '>' => out.push_str("&gt;"),
            '"' => out.push_str("&quot;"),
            _ => out.push(c),
        }
    }
    out
}

/// HTML formatting with `tg://user` mention links.
///
/// Mentions use the display name when one is known, otherwise `user <id>`.
#[derive(Debug, Clone, Default)]
pub struct HtmlFormat {
    names: HashMap<UserId, String>,
}

impl HtmlFormat {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn with_names(names: HashMap<UserId, String>) -> Self {
        Self { names }
    }
}

impl MessageFormat for HtmlFormat {
    fn mention(&self, user: &UserId) -> String {
        let label = match self.names.get(user) {
            Some(name) if !name.trim().is_empty() => escape_html(name),
            _ => format!("user {}", escape_html(user.as_str())),
        };
        format!(
            "<a href=\"tg://user?id={}\">{}</a>",
            escape_html(user.as_str()),
            label
        )
    }

    fn escape(&self, raw: &str) -> String {
        escape_html(raw)
    }

    fn bold(&self, raw: &str) -> String {
        format!("<b>{}</b>", escape_html(raw))
    }
}
