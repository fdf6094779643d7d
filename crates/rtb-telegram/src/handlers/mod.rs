//! Telegram update handlers.
//!
//! Routing only: commands go to the command handler, everything else splits
//! on the sender — administrator messages are reply-delivery candidates,
//! user messages go through the relay engine.

use std::sync::Arc;

use teloxide::{
    prelude::*,
    types::{CallbackQuery, Message},
};

use rtb_core::domain::UserId;

use crate::router::AppState;

mod callback;
mod commands;
mod message;

pub async fn handle_callback(q: CallbackQuery, state: Arc<AppState>) -> ResponseResult<()> {
    let _guard = state.worker_lock.clone().lock_owned().await;
    callback::handle_callback(q, state).await
}

pub async fn handle_message(msg: Message, state: Arc<AppState>) -> ResponseResult<()> {
    // The relay is a private-chat bot; group noise is ignored entirely.
    if !msg.chat.is_private() {
        return Ok(());
    }
    let Some(user) = msg.from() else {
        return Ok(());
    };
    let user_id = UserId(user.id.0 as i64);

    let _guard = state.worker_lock.clone().lock_owned().await;

    if let Some(text) = msg.text() {
        if text.starts_with('/') {
            return commands::handle_command(msg, state).await;
        }
    }

    if state.dispatcher.is_admin(user_id) {
        return message::handle_admin_message(msg, state).await;
    }

    message::handle_user_message(msg, state).await
}
