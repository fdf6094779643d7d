use std::sync::Arc;

use teloxide::prelude::*;
use tracing::{debug, error};

use rtb_core::{actions::ActionToken, domain::UserId};

use crate::router::AppState;

/// Parse the callback payload into a typed action once, here at the
/// boundary, then route it through the dispatcher. The callback is always
/// answered so the client stops its spinner.
pub async fn handle_callback(q: CallbackQuery, state: Arc<AppState>) -> ResponseResult<()> {
    let from = UserId(q.from.id.0 as i64);

    let Some(action) = q.data.as_deref().and_then(ActionToken::parse) else {
        debug!(data = ?q.data, "ignoring unknown callback payload");
        let _ = state.messenger.answer_callback(&q.id, None).await;
        return Ok(());
    };

    let ack = match state.dispatcher.handle_action(from, action).await {
        Ok(ack) => ack,
        Err(e) => {
            error!(user = from.0, "callback action failed: {e}");
            Some("Something went wrong")
        }
    };

    if let Err(e) = state.messenger.answer_callback(&q.id, ack).await {
        debug!("failed to answer callback query: {e}");
    }
    Ok(())
}
