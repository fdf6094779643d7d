//! Shared test fakes: a recording messenger with scriptable failures and
//! inbound-message builders.

use std::{
    collections::HashSet,
    sync::{
        atomic::{AtomicI32, Ordering},
        Mutex,
    },
};

use async_trait::async_trait;
use chrono::Utc;

use crate::{
    domain::{
        Attachment, AttachmentKind, ChatId, FileRef, InboundMessage, MessageId, MessageRef,
        SenderProfile, UserId,
    },
    errors::Error,
    messaging::{port::MessagingPort, types::InlineKeyboard},
    Result,
};

#[derive(Clone, Debug)]
pub struct SentMessage {
    pub chat_id: ChatId,
    pub text: Option<String>,
    pub attachment: Option<Attachment>,
    pub controls: Option<InlineKeyboard>,
}

#[derive(Default)]
pub struct FakeMessenger {
    next_id: AtomicI32,
    fail_chats: Mutex<HashSet<i64>>,
    sent: Mutex<Vec<SentMessage>>,
    callbacks: Mutex<Vec<(String, Option<String>)>>,
}

impl FakeMessenger {
    pub fn new() -> Self {
        Self::default()
    }

    /// Every subsequent send to `chat` fails with a transport error.
    pub fn fail_chat(&self, chat: ChatId) {
        self.fail_chats.lock().unwrap().insert(chat.0);
    }

    pub fn all_sent(&self) -> Vec<SentMessage> {
        self.sent.lock().unwrap().clone()
    }

    pub fn sent_to(&self, chat: ChatId) -> Vec<SentMessage> {
        self.all_sent()
            .into_iter()
            .filter(|m| m.chat_id == chat)
            .collect()
    }

    pub fn answered_callbacks(&self) -> Vec<(String, Option<String>)> {
        self.callbacks.lock().unwrap().clone()
    }

    fn record(
        &self,
        chat_id: ChatId,
        text: Option<String>,
        attachment: Option<Attachment>,
        controls: Option<InlineKeyboard>,
    ) -> Result<MessageRef> {
        if self.fail_chats.lock().unwrap().contains(&chat_id.0) {
            return Err(Error::Transport("simulated delivery failure".to_string()));
        }
        self.sent.lock().unwrap().push(SentMessage {
            chat_id,
            text,
            attachment,
            controls,
        });
        let id = self.next_id.fetch_add(1, Ordering::SeqCst) + 1;
        Ok(MessageRef {
            chat_id,
            message_id: MessageId(id),
        })
    }
}

#[async_trait]
impl MessagingPort for FakeMessenger {
    async fn send_text(
        &self,
        chat_id: ChatId,
        text: &str,
        controls: Option<InlineKeyboard>,
    ) -> Result<MessageRef> {
        self.record(chat_id, Some(text.to_string()), None, controls)
    }

    async fn send_attachment(
        &self,
        chat_id: ChatId,
        attachment: &Attachment,
        caption: Option<&str>,
        controls: Option<InlineKeyboard>,
    ) -> Result<MessageRef> {
        self.record(
            chat_id,
            caption.map(|c| c.to_string()),
            Some(attachment.clone()),
            controls,
        )
    }

    async fn answer_callback(&self, callback_id: &str, text: Option<&str>) -> Result<()> {
        self.callbacks
            .lock()
            .unwrap()
            .push((callback_id.to_string(), text.map(|t| t.to_string())));
        Ok(())
    }
}

pub fn profile(user: i64, first_name: &str) -> SenderProfile {
    SenderProfile {
        user_id: UserId(user),
        username: None,
        first_name: first_name.to_string(),
        last_name: None,
    }
}

pub fn text_message(user: i64, first_name: &str, text: &str) -> InboundMessage {
    InboundMessage {
        sender: profile(user, first_name),
        origin_message_id: MessageId(1),
        text: Some(text.to_string()),
        caption: None,
        attachment: None,
        received_at: Utc::now(),
    }
}

pub fn attachment_message(
    user: i64,
    first_name: &str,
    kind: AttachmentKind,
    caption: Option<&str>,
) -> InboundMessage {
    InboundMessage {
        sender: profile(user, first_name),
        origin_message_id: MessageId(1),
        text: None,
        caption: caption.map(|c| c.to_string()),
        attachment: Some(Attachment {
            kind,
            file_ref: FileRef("file-ref".to_string()),
        }),
        received_at: Utc::now(),
    }
}
