use std::sync::Arc;

use chrono::Utc;
use teloxide::prelude::*;
use tracing::{debug, error};

use rtb_core::{
    domain::{
        AttachmentProbe, FileRef, InboundMessage, MessageId, SenderProfile, UserId,
    },
    relay::{OutgoingReply, ReplyOutcome},
};

use crate::router::AppState;

/// Collect the raw attachment slots of a Telegram message. Classification
/// (including precedence between slots) happens in the core.
fn probe_attachments(msg: &Message) -> AttachmentProbe {
    AttachmentProbe {
        photo: msg
            .photo()
            .and_then(|sizes| sizes.last())
            .map(|p| FileRef(p.file.id.clone())),
        document: msg.document().map(|d| FileRef(d.file.id.clone())),
        video: msg.video().map(|v| FileRef(v.file.id.clone())),
        voice: msg.voice().map(|v| FileRef(v.file.id.clone())),
        audio: msg.audio().map(|a| FileRef(a.file.id.clone())),
        sticker: msg.sticker().map(|s| FileRef(s.file.id.clone())),
    }
}

fn sender_profile(user: &teloxide::types::User) -> SenderProfile {
    SenderProfile {
        user_id: UserId(user.id.0 as i64),
        username: user.username.clone(),
        first_name: user.first_name.clone(),
        last_name: user.last_name.clone(),
    }
}

/// A non-command message from a regular user: relay it.
pub async fn handle_user_message(msg: Message, state: Arc<AppState>) -> ResponseResult<()> {
    let Some(user) = msg.from() else {
        return Ok(());
    };

    let inbound = InboundMessage {
        sender: sender_profile(user),
        origin_message_id: MessageId(msg.id.0),
        text: msg.text().map(|s| s.to_string()),
        caption: msg.caption().map(|s| s.to_string()),
        attachment: probe_attachments(&msg).classify(),
        received_at: Utc::now(),
    };

    if let Err(e) = state.relay.handle_inbound(inbound).await {
        error!(user = user.id.0, "relay failed: {e}");
    }
    Ok(())
}

/// A non-command message from the administrator: deliver it to the current
/// reply target. With no target it is not a reply at all and is ignored.
pub async fn handle_admin_message(msg: Message, state: Arc<AppState>) -> ResponseResult<()> {
    let reply = OutgoingReply {
        text: msg.text().map(|s| s.to_string()),
        caption: msg.caption().map(|s| s.to_string()),
        attachment: probe_attachments(&msg).classify(),
    };

    if reply.text.is_none() && reply.attachment.is_none() {
        return Ok(());
    }

    match state.relay.deliver_admin_reply(reply).await {
        Ok(ReplyOutcome::NoTarget) => {
            debug!("admin message with no reply target; ignoring");
        }
        Ok(_) => {}
        Err(e) => error!("reply delivery failed: {e}"),
    }
    Ok(())
}
