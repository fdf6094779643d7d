//! The relay engine: one inbound user message in, a durable record plus an
//! administrator notification out.

use std::sync::Arc;

use tracing::{debug, error, warn};

use crate::{
    actions::ActionToken,
    blocklist,
    domain::{Attachment, AttachmentKind, ChatId, InboundMessage, RecordId, UserId},
    errors::Error,
    formatting::{escape_html, sender_header},
    messaging::{
        port::MessagingPort,
        types::{InlineButton, InlineKeyboard},
    },
    session::ReplySession,
    storage::port::StoragePort,
    Result,
};

/// Prefix on plain-text replies so the recipient can tell them apart from
/// bot chatter.
pub const ADMIN_REPLY_PREFIX: &str = "Reply from the administrator";

const USER_ACK: &str = "Thanks! Your message has been passed along.";

/// What `handle_inbound` did with a message.
#[derive(Clone, Copy, Debug, PartialEq, Eq)]
pub enum RelayOutcome {
    /// Sender is blocked: nothing stored, nothing sent.
    Dropped,
    /// Record persisted; `forwarded` tells whether the admin notification
    /// went out.
    Stored { record: RecordId, forwarded: bool },
}

/// The administrator's outgoing reply content, already classified by the
/// adapter.
#[derive(Clone, Debug, Default)]
pub struct OutgoingReply {
    pub text: Option<String>,
    pub caption: Option<String>,
    pub attachment: Option<Attachment>,
}

#[derive(Clone, Copy, Debug, PartialEq, Eq)]
pub enum ReplyOutcome {
    /// Session was idle; nothing happened.
    NoTarget,
    Delivered(UserId),
    Failed(UserId),
}

pub struct RelayService {
    admin_chat: ChatId,
    storage: Arc<dyn StoragePort>,
    messenger: Arc<dyn MessagingPort>,
    session: Arc<ReplySession>,
}

impl RelayService {
    pub fn new(
        admin_chat: ChatId,
        storage: Arc<dyn StoragePort>,
        messenger: Arc<dyn MessagingPort>,
        session: Arc<ReplySession>,
    ) -> Self {
        Self {
            admin_chat,
            storage,
            messenger,
            session,
        }
    }

    /// Gate, persist, forward, acknowledge.
    ///
    /// Persistence happens exactly once, before any network send; a forward
    /// failure never rolls it back. Blocked senders get no feedback at all.
    pub async fn handle_inbound(&self, message: InboundMessage) -> Result<RelayOutcome> {
        let sender = message.sender.user_id;

        if blocklist::is_blocked(self.storage.as_ref(), sender)? {
            debug!(user = sender.0, "dropping message from blocked user");
            return Ok(RelayOutcome::Dropped);
        }

        let record = self.storage.insert_message(&message)?;

        let forwarded = match self.forward_to_admin(&message).await {
            Ok(()) => true,
            Err(e) => {
                warn!(user = sender.0, "failed to forward message to admin: {e}");
                self.report_forward_failure(sender, &e).await;
                false
            }
        };

        if let Err(e) = self
            .messenger
            .send_text(ChatId(sender.0), USER_ACK, None)
            .await
        {
            warn!(user = sender.0, "failed to acknowledge sender: {e}");
        }

        Ok(RelayOutcome::Stored { record, forwarded })
    }

    async fn forward_to_admin(&self, message: &InboundMessage) -> Result<()> {
        let header = sender_header(&message.sender);

        match &message.attachment {
            Some(att) if att.kind == AttachmentKind::Sticker => {
                // Stickers cannot carry captions: identity notice first,
                // then the sticker itself.
                let notice = format!("{header}\n\nSent a sticker");
                self.messenger
                    .send_text(self.admin_chat, &notice, None)
                    .await?;
                self.messenger
                    .send_attachment(self.admin_chat, att, None, None)
                    .await?;
            }
            Some(att) => {
                let mut caption = format!("{header}\n\nSent a {}", att.kind.label());
                if let Some(c) = message.caption.as_deref().filter(|c| !c.is_empty()) {
                    caption.push_str(&format!(" with caption: {}", escape_html(c)));
                }
                self.messenger
                    .send_attachment(self.admin_chat, att, Some(&caption), None)
                    .await?;
            }
            None => {
                let text = message.text.as_deref().unwrap_or("");
                let body = format!("{header}\n\n📝 Message: {}", escape_html(text));
                let controls = relay_controls(message.sender.user_id);
                self.messenger
                    .send_text(self.admin_chat, &body, Some(controls))
                    .await?;
            }
        }
        Ok(())
    }

    /// Best-effort secondary notice after a forward failure. A failure here
    /// is only logged; there is no third tier.
    async fn report_forward_failure(&self, sender: UserId, err: &Error) {
        let notice = format!(
            "⚠️ Failed to relay a message from user {}: {}",
            sender.0,
            escape_html(&err.to_string())
        );
        if let Err(second) = self.messenger.send_text(self.admin_chat, &notice, None).await {
            error!("failed to report relay failure to admin: {second}");
        }
    }

    /// Deliver the admin's reply to the current target.
    ///
    /// The target is taken out of the session before delivery, so the slot
    /// is idle afterwards no matter how delivery ends. An idle session is a
    /// silent no-op.
    pub async fn deliver_admin_reply(&self, reply: OutgoingReply) -> Result<ReplyOutcome> {
        let Some(target) = self.session.take().await else {
            return Ok(ReplyOutcome::NoTarget);
        };

        match self.send_reply(ChatId(target.0), &reply).await {
            Ok(()) => {
                let confirm = format!("✅ Reply delivered to user {}.", target.0);
                if let Err(e) = self.messenger.send_text(self.admin_chat, &confirm, None).await {
                    warn!("failed to confirm reply delivery: {e}");
                }
                Ok(ReplyOutcome::Delivered(target))
            }
            Err(e) => {
                warn!(user = target.0, "reply delivery failed: {e}");
                let notice = format!(
                    "❌ Failed to deliver reply to user {}: {}",
                    target.0,
                    escape_html(&e.to_string())
                );
                if let Err(second) = self.messenger.send_text(self.admin_chat, &notice, None).await
                {
                    error!("failed to report reply failure to admin: {second}");
                }
                Ok(ReplyOutcome::Failed(target))
            }
        }
    }

    async fn send_reply(&self, chat: ChatId, reply: &OutgoingReply) -> Result<()> {
        match &reply.attachment {
            Some(att) if att.kind == AttachmentKind::Sticker => {
                self.messenger.send_attachment(chat, att, None, None).await?;
            }
            Some(att) => {
                let caption = reply
                    .caption
                    .as_deref()
                    .filter(|c| !c.is_empty())
                    .map(escape_html)
                    .unwrap_or_else(|| ADMIN_REPLY_PREFIX.to_string());
                self.messenger
                    .send_attachment(chat, att, Some(&caption), None)
                    .await?;
            }
            None => {
                let text = reply.text.as_deref().unwrap_or("");
                let body = format!("{ADMIN_REPLY_PREFIX}: {}", escape_html(text));
                self.messenger.send_text(chat, &body, None).await?;
            }
        }
        Ok(())
    }
}

/// Block/Reply controls attached to forwarded text messages.
fn relay_controls(sender: UserId) -> InlineKeyboard {
    InlineKeyboard::row(vec![
        InlineButton::new("🚫 Block", &ActionToken::Block(sender)),
        InlineButton::new("✍️ Reply", &ActionToken::Reply(sender)),
    ])
}

#[cfg(test)]
mod tests {
    use super::*;
    use chrono::Utc;

    use crate::domain::BlockEntry;
    use crate::storage::memory::MemoryStorage;
    use crate::testutil::{attachment_message, text_message, FakeMessenger};

    const ADMIN: ChatId = ChatId(99);

    struct Fixture {
        storage: Arc<MemoryStorage>,
        messenger: Arc<FakeMessenger>,
        session: Arc<ReplySession>,
        relay: RelayService,
    }

    fn fixture() -> Fixture {
        let storage = Arc::new(MemoryStorage::new());
        let messenger = Arc::new(FakeMessenger::new());
        let session = Arc::new(ReplySession::new());
        let relay = RelayService::new(
            ADMIN,
            storage.clone(),
            messenger.clone(),
            session.clone(),
        );
        Fixture {
            storage,
            messenger,
            session,
            relay,
        }
    }

    fn stored_count(storage: &MemoryStorage) -> usize {
        storage.recent_messages(usize::MAX).unwrap().len()
    }

    #[tokio::test]
    async fn blocked_sender_is_dropped_silently() {
        let f = fixture();
        f.storage
            .insert_block(&BlockEntry {
                user_id: UserId(42),
                blocked_by: UserId(99),
                blocked_at: Utc::now(),
            })
            .unwrap();

        let outcome = f
            .relay
            .handle_inbound(text_message(42, "Ana", "hello"))
            .await
            .unwrap();

        assert_eq!(outcome, RelayOutcome::Dropped);
        assert_eq!(stored_count(&f.storage), 0);
        assert!(f.messenger.all_sent().is_empty());
    }

    #[tokio::test]
    async fn forward_failure_still_persists_exactly_one_record() {
        let f = fixture();
        f.messenger.fail_chat(ADMIN);

        let outcome = f
            .relay
            .handle_inbound(text_message(42, "Ana", "hello"))
            .await
            .unwrap();

        match outcome {
            RelayOutcome::Stored { forwarded, .. } => assert!(!forwarded),
            other => panic!("unexpected outcome: {other:?}"),
        }
        assert_eq!(stored_count(&f.storage), 1);

        // The sender ack is independent of the forward outcome.
        let acks = f.messenger.sent_to(ChatId(42));
        assert_eq!(acks.len(), 1);
    }

    #[tokio::test]
    async fn text_message_is_forwarded_with_controls() {
        let f = fixture();
        f.relay
            .handle_inbound(text_message(42, "Ana", "hello"))
            .await
            .unwrap();

        let forwarded = f.messenger.sent_to(ADMIN);
        assert_eq!(forwarded.len(), 1);
        let text = forwarded[0].text.as_deref().unwrap();
        assert!(text.contains("Ana"));
        assert!(text.contains("42"));
        assert!(text.contains("hello"));

        let controls = forwarded[0].controls.as_ref().unwrap();
        let actions: Vec<&str> = controls.rows[0].iter().map(|b| b.action.as_str()).collect();
        assert_eq!(actions, vec!["block:42", "reply:42"]);
    }

    #[tokio::test]
    async fn photo_is_resent_natively_with_caption() {
        let f = fixture();
        f.relay
            .handle_inbound(attachment_message(
                42,
                "Ana",
                AttachmentKind::Photo,
                Some("look"),
            ))
            .await
            .unwrap();

        let forwarded = f.messenger.sent_to(ADMIN);
        assert_eq!(forwarded.len(), 1);
        assert_eq!(
            forwarded[0].attachment.as_ref().unwrap().kind,
            AttachmentKind::Photo
        );
        let caption = forwarded[0].text.as_deref().unwrap();
        assert!(caption.contains("Sent a photo"));
        assert!(caption.contains("look"));
        assert!(forwarded[0].controls.is_none());
    }

    #[tokio::test]
    async fn sticker_is_forwarded_as_two_sends() {
        let f = fixture();
        f.relay
            .handle_inbound(attachment_message(42, "Ana", AttachmentKind::Sticker, None))
            .await
            .unwrap();

        let forwarded = f.messenger.sent_to(ADMIN);
        assert_eq!(forwarded.len(), 2);
        assert!(forwarded[0].attachment.is_none());
        assert!(forwarded[0].text.as_deref().unwrap().contains("Sent a sticker"));
        assert_eq!(
            forwarded[1].attachment.as_ref().unwrap().kind,
            AttachmentKind::Sticker
        );
        // No caption on the sticker send itself.
        assert!(forwarded[1].text.is_none());
    }

    #[tokio::test]
    async fn ack_failure_does_not_fail_the_operation() {
        let f = fixture();
        f.messenger.fail_chat(ChatId(42));

        let outcome = f
            .relay
            .handle_inbound(text_message(42, "Ana", "hello"))
            .await
            .unwrap();

        match outcome {
            RelayOutcome::Stored { forwarded, .. } => assert!(forwarded),
            other => panic!("unexpected outcome: {other:?}"),
        }
        assert_eq!(stored_count(&f.storage), 1);
    }

    #[tokio::test]
    async fn reply_with_idle_session_is_a_no_op() {
        let f = fixture();
        let outcome = f
            .relay
            .deliver_admin_reply(OutgoingReply {
                text: Some("hi".to_string()),
                ..Default::default()
            })
            .await
            .unwrap();

        assert_eq!(outcome, ReplyOutcome::NoTarget);
        assert!(f.messenger.all_sent().is_empty());
    }

    #[tokio::test]
    async fn reply_is_delivered_with_prefix_and_clears_session() {
        let f = fixture();
        f.session.select(UserId(42)).await;

        let outcome = f
            .relay
            .deliver_admin_reply(OutgoingReply {
                text: Some("hi back".to_string()),
                ..Default::default()
            })
            .await
            .unwrap();

        assert_eq!(outcome, ReplyOutcome::Delivered(UserId(42)));
        assert_eq!(f.session.current().await, None);

        let to_user = f.messenger.sent_to(ChatId(42));
        assert_eq!(to_user.len(), 1);
        let text = to_user[0].text.as_deref().unwrap();
        assert!(text.starts_with(ADMIN_REPLY_PREFIX));
        assert!(text.contains("hi back"));

        let confirmations = f.messenger.sent_to(ADMIN);
        assert!(confirmations[0].text.as_deref().unwrap().contains("42"));
    }

    #[tokio::test]
    async fn reply_failure_still_clears_session_and_names_target() {
        let f = fixture();
        f.session.select(UserId(42)).await;
        f.messenger.fail_chat(ChatId(42));

        let outcome = f
            .relay
            .deliver_admin_reply(OutgoingReply {
                text: Some("hi back".to_string()),
                ..Default::default()
            })
            .await
            .unwrap();

        assert_eq!(outcome, ReplyOutcome::Failed(UserId(42)));
        assert_eq!(f.session.current().await, None);

        let notices = f.messenger.sent_to(ADMIN);
        assert_eq!(notices.len(), 1);
        let text = notices[0].text.as_deref().unwrap();
        assert!(text.contains("Failed to deliver"));
        assert!(text.contains("42"));
    }

    #[tokio::test]
    async fn sticker_reply_goes_out_without_caption() {
        let f = fixture();
        f.session.select(UserId(42)).await;

        f.relay
            .deliver_admin_reply(OutgoingReply {
                attachment: Some(Attachment {
                    kind: AttachmentKind::Sticker,
                    file_ref: crate::domain::FileRef("s".to_string()),
                }),
                ..Default::default()
            })
            .await
            .unwrap();

        let to_user = f.messenger.sent_to(ChatId(42));
        assert_eq!(to_user.len(), 1);
        assert!(to_user[0].text.is_none());
    }
}
