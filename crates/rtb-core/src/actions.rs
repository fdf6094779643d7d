//! Typed callback-button actions.
//!
//! Button payloads encode both the action and its argument. They are parsed
//! once at the transport boundary; the rest of the core only ever sees this
//! enum.

use crate::domain::{RecordId, UserId};

#[derive(Clone, Copy, Debug, PartialEq, Eq)]
pub enum ActionToken {
    /// Block the sender of a forwarded message.
    Block(UserId),
    /// Remove a block entry.
    Unblock(UserId),
    /// Set the reply-session target.
    Reply(UserId),
    /// Show one stored message in full.
    View(RecordId),
    /// Re-render the history view with the default limit.
    Refresh,
    /// Re-render the history view with the carried limit.
    More(usize),
    /// Return from a detail view to the history view.
    Back,
}

impl ActionToken {
    /// Parse a callback payload (`block:42`, `view:7`, `refresh`, ...).
    /// Unknown prefixes and malformed arguments yield `None`.
    pub fn parse(data: &str) -> Option<Self> {
        match data.split_once(':') {
            None => match data {
                "refresh" => Some(ActionToken::Refresh),
                "back" => Some(ActionToken::Back),
                _ => None,
            },
            Some((kind, arg)) => match kind {
                "block" => arg.parse().ok().map(|id| ActionToken::Block(UserId(id))),
                "unblock" => arg.parse().ok().map(|id| ActionToken::Unblock(UserId(id))),
                "reply" => arg.parse().ok().map(|id| ActionToken::Reply(UserId(id))),
                "view" => arg.parse().ok().map(|id| ActionToken::View(RecordId(id))),
                "more" => arg.parse().ok().map(ActionToken::More),
                _ => None,
            },
        }
    }

    pub fn encode(&self) -> String {
        match self {
            ActionToken::Block(user) => format!("block:{}", user.0),
            ActionToken::Unblock(user) => format!("unblock:{}", user.0),
            ActionToken::Reply(user) => format!("reply:{}", user.0),
            ActionToken::View(record) => format!("view:{}", record.0),
            ActionToken::Refresh => "refresh".to_string(),
            ActionToken::More(limit) => format!("more:{limit}"),
            ActionToken::Back => "back".to_string(),
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn round_trips_every_variant() {
        let tokens = [
            ActionToken::Block(UserId(42)),
            ActionToken::Unblock(UserId(-100)),
            ActionToken::Reply(UserId(7)),
            ActionToken::View(RecordId(12)),
            ActionToken::Refresh,
            ActionToken::More(20),
            ActionToken::Back,
        ];
        for token in tokens {
            assert_eq!(ActionToken::parse(&token.encode()), Some(token));
        }
    }

    #[test]
    fn rejects_malformed_payloads() {
        for data in ["", "block", "block:", "block:abc", "nuke:1", "more:-1", "reply:1:2"] {
            assert_eq!(ActionToken::parse(data), None, "payload {data:?}");
        }
    }
}
