//! Resolve `https://t.me/...` links to chats the bot can address.

use teloxide::types::{ChatId, Recipient};
use url::Url;

use crate::relay::TransportError;
use crate::store::CANONICAL_URL_PREFIX;

/// A chat identified by a Telegram link.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum ChatTarget {
    /// Public chat, `https://t.me/<username>`.
    Username(String),
    /// Private chat, `https://t.me/c/<id>`; stored as the `-100`-prefixed chat id.
    Id(ChatId),
}

impl ChatTarget {
    /// Parse a chat link.
    ///
    /// # Errors
    ///
    /// Returns [`TransportError::InvalidTarget`] for anything that is not a
    /// public username link or a private `c/<id>` link.
    pub fn parse(link: &str) -> Result<Self, TransportError> {
        let invalid = || TransportError::InvalidTarget {
            url: link.to_owned(),
        };

        let url = Url::parse(link).map_err(|_| invalid())?;
        if url.host_str() != Some("t.me") {
            return Err(invalid());
        }
        let segments: Vec<&str> = url
            .path_segments()
            .map(|s| s.filter(|seg| !seg.is_empty()).collect())
            .unwrap_or_default();

        match segments.as_slice() {
            ["c", id, ..] => {
                let numeric: i64 = format!("-100{id}").parse().map_err(|_| invalid())?;
                Ok(Self::Id(ChatId(numeric)))
            }
            [name, ..] if !RESERVED_PATHS.contains(name) && is_username(name) => {
                Ok(Self::Username(name.to_lowercase()))
            }
            _ => Err(invalid()),
        }
    }

    /// Whether an update from chat `id` with `username` comes from this target.
    pub fn matches(&self, id: ChatId, username: Option<&str>) -> bool {
        match self {
            Self::Id(target) => *target == id,
            Self::Username(name) => username.is_some_and(|u| u.eq_ignore_ascii_case(name)),
        }
    }

    /// The link this target is stored under: `https://t.me/<username>` or
    /// `https://t.me/c/<id>`.
    pub fn canonical_url(&self) -> String {
        match self {
            Self::Username(name) => format!("{CANONICAL_URL_PREFIX}{name}"),
            Self::Id(id) => {
                let raw = id.0.to_string();
                let short = raw.strip_prefix("-100").unwrap_or(&raw);
                format!("{CANONICAL_URL_PREFIX}c/{short}")
            }
        }
    }

    /// Recipient for `send_message`.
    pub fn recipient(&self) -> Recipient {
        match self {
            Self::Id(id) => Recipient::Id(*id),
            Self::Username(name) => Recipient::ChannelUsername(format!("@{name}")),
        }
    }
}

/// Link paths that are not chats.
const RESERVED_PATHS: [&str; 3] = ["c", "joinchat", "addstickers"];

fn is_username(name: &str) -> bool {
    !name.is_empty()
        && name.chars().all(|c| c.is_ascii_alphanumeric() || c == '_')
        && name.chars().next().is_some_and(|c| c.is_ascii_alphabetic())
}
