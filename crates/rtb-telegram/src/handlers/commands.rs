use std::sync::Arc;

use teloxide::prelude::*;
use tracing::{debug, error};

use rtb_core::{
    dispatch::AdminCommand,
    domain::{ChatId, UserId},
};

use crate::router::AppState;

const GREETING: &str = "👋 Hi! I'm the owner's assistant bot. \
Write your message here and I'll pass it along. \
You'll get a reply right in this chat.";

/// Split `/cmd@botname arg1 ...` into command name and argument string.
fn parse_command(text: &str) -> (String, String) {
    let mut parts = text.trim().splitn(2, char::is_whitespace);
    let first = parts.next().unwrap_or("").trim();
    let rest = parts.next().unwrap_or("").trim().to_string();

    let cmd = first
        .trim_start_matches('/')
        .split('@')
        .next()
        .unwrap_or("")
        .to_lowercase();

    (cmd, rest)
}

fn first_arg_i64(args: &str) -> Option<i64> {
    args.split_whitespace().next()?.parse().ok()
}

fn first_arg_usize(args: &str) -> Option<usize> {
    args.split_whitespace().next()?.parse().ok()
}

pub async fn handle_command(msg: Message, state: Arc<AppState>) -> ResponseResult<()> {
    let Some(user) = msg.from() else {
        return Ok(());
    };
    let from = UserId(user.id.0 as i64);
    let chat = ChatId(msg.chat.id.0);
    let (cmd, args) = parse_command(msg.text().unwrap_or(""));

    let command = match cmd.as_str() {
        "start" => {
            if let Err(e) = state.messenger.send_text(chat, GREETING, None).await {
                error!(user = from.0, "failed to send greeting: {e}");
            }
            return Ok(());
        }
        "messages" => AdminCommand::Messages {
            limit: first_arg_usize(&args),
        },
        "block" => AdminCommand::Block {
            target: first_arg_i64(&args).map(UserId),
        },
        "unblock" => AdminCommand::Unblock {
            target: first_arg_i64(&args).map(UserId),
        },
        "blocked" => AdminCommand::Blocked,
        "cancel" => AdminCommand::Cancel,
        other => {
            debug!(command = other, "ignoring unknown command");
            return Ok(());
        }
    };

    if let Err(e) = state.dispatcher.handle_command(from, command).await {
        error!(user = from.0, "command failed: {e}");
        let _ = state
            .messenger
            .send_text(chat, "❌ Something went wrong, please try again.", None)
            .await;
    }
    Ok(())
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn strips_slash_and_bot_mention() {
        assert_eq!(
            parse_command("/block@relay_bot 42"),
            ("block".to_string(), "42".to_string())
        );
        assert_eq!(parse_command("/MESSAGES"), ("messages".to_string(), String::new()));
    }

    #[test]
    fn non_numeric_arguments_are_dropped() {
        assert_eq!(first_arg_i64("abc"), None);
        assert_eq!(first_arg_i64("42 extra"), Some(42));
        assert_eq!(first_arg_usize(""), None);
    }
}
