//! Telegram adapter (teloxide).
//!
//! Implements the `rtb-core` MessagingPort over the Telegram Bot API.

use async_trait::async_trait;

use teloxide::{
    prelude::*,
    types::{InlineKeyboardButton, InlineKeyboardMarkup, InputFile, ParseMode},
};

use tokio::time::sleep;

pub mod handlers;
pub mod router;

use rtb_core::{
    domain::{Attachment, AttachmentKind, ChatId, MessageId, MessageRef},
    errors::Error,
    messaging::{port::MessagingPort, types::InlineKeyboard},
    Result,
};

#[derive(Clone)]
pub struct TelegramMessenger {
    bot: Bot,
}

impl TelegramMessenger {
    pub fn new(bot: Bot) -> Self {
        Self { bot }
    }

    fn tg_chat(chat_id: ChatId) -> teloxide::types::ChatId {
        teloxide::types::ChatId(chat_id.0)
    }

    fn tg_markup(keyboard: &InlineKeyboard) -> InlineKeyboardMarkup {
        let rows: Vec<Vec<InlineKeyboardButton>> = keyboard
            .rows
            .iter()
            .map(|row| {
                row.iter()
                    .map(|b| InlineKeyboardButton::callback(b.label.clone(), b.action.clone()))
                    .collect()
            })
            .collect();
        InlineKeyboardMarkup::new(rows)
    }

    fn map_err(e: teloxide::RequestError) -> Error {
        Error::Transport(format!("telegram error: {e}"))
    }

    async fn with_retry<T, Fut>(&self, mut op: impl FnMut() -> Fut) -> Result<T>
    where
        Fut: std::future::IntoFuture<Output = std::result::Result<T, teloxide::RequestError>>,
        Fut::IntoFuture: Send,
    {
        const MAX_RETRIES: usize = 1;
        let mut attempts = 0usize;
        loop {
            match op().await {
                Ok(v) => return Ok(v),
                Err(e) => match e {
                    teloxide::RequestError::RetryAfter(d) if attempts < MAX_RETRIES => {
                        attempts += 1;
                        sleep(d).await;
                        continue;
                    }
                    other => return Err(Self::map_err(other)),
                },
            }
        }
    }
}

fn to_ref(chat_id: ChatId, msg: &Message) -> MessageRef {
    MessageRef {
        chat_id,
        message_id: MessageId(msg.id.0),
    }
}

#[async_trait]
impl MessagingPort for TelegramMessenger {
    async fn send_text(
        &self,
        chat_id: ChatId,
        text: &str,
        controls: Option<InlineKeyboard>,
    ) -> Result<MessageRef> {
        let markup = controls.as_ref().map(Self::tg_markup);
        let msg = self
            .with_retry(|| {
                let mut req = self
                    .bot
                    .send_message(Self::tg_chat(chat_id), text.to_string())
                    .parse_mode(ParseMode::Html);
                if let Some(markup) = markup.clone() {
                    req = req.reply_markup(markup);
                }
                req
            })
            .await?;

        Ok(to_ref(chat_id, &msg))
    }

    async fn send_attachment(
        &self,
        chat_id: ChatId,
        attachment: &Attachment,
        caption: Option<&str>,
        controls: Option<InlineKeyboard>,
    ) -> Result<MessageRef> {
        let chat = Self::tg_chat(chat_id);
        let file = InputFile::file_id(attachment.file_ref.0.clone());
        let markup = controls.as_ref().map(Self::tg_markup);
        let caption = caption.map(|c| c.to_string());

        let msg = match attachment.kind {
            AttachmentKind::Photo => {
                self.with_retry(|| {
                    let mut req = self
                        .bot
                        .send_photo(chat, file.clone())
                        .parse_mode(ParseMode::Html);
                    if let Some(c) = caption.clone() {
                        req = req.caption(c);
                    }
                    if let Some(markup) = markup.clone() {
                        req = req.reply_markup(markup);
                    }
                    req
                })
                .await?
            }
            AttachmentKind::Document => {
                self.with_retry(|| {
                    let mut req = self
                        .bot
                        .send_document(chat, file.clone())
                        .parse_mode(ParseMode::Html);
                    if let Some(c) = caption.clone() {
                        req = req.caption(c);
                    }
                    if let Some(markup) = markup.clone() {
                        req = req.reply_markup(markup);
                    }
                    req
                })
                .await?
            }
            AttachmentKind::Video => {
                self.with_retry(|| {
                    let mut req = self
                        .bot
                        .send_video(chat, file.clone())
                        .parse_mode(ParseMode::Html);
                    if let Some(c) = caption.clone() {
                        req = req.caption(c);
                    }
                    if let Some(markup) = markup.clone() {
                        req = req.reply_markup(markup);
                    }
                    req
                })
                .await?
            }
            AttachmentKind::Voice => {
                self.with_retry(|| {
                    let mut req = self
                        .bot
                        .send_voice(chat, file.clone())
                        .parse_mode(ParseMode::Html);
                    if let Some(c) = caption.clone() {
                        req = req.caption(c);
                    }
                    if let Some(markup) = markup.clone() {
                        req = req.reply_markup(markup);
                    }
                    req
                })
                .await?
            }
            AttachmentKind::Audio => {
                self.with_retry(|| {
                    let mut req = self
                        .bot
                        .send_audio(chat, file.clone())
                        .parse_mode(ParseMode::Html);
                    if let Some(c) = caption.clone() {
                        req = req.caption(c);
                    }
                    if let Some(markup) = markup.clone() {
                        req = req.reply_markup(markup);
                    }
                    req
                })
                .await?
            }
            // Stickers cannot carry captions.
            AttachmentKind::Sticker => {
                self.with_retry(|| {
                    let mut req = self.bot.send_sticker(chat, file.clone());
                    if let Some(markup) = markup.clone() {
                        req = req.reply_markup(markup);
                    }
                    req
                })
                .await?
            }
        };

        Ok(to_ref(chat_id, &msg))
    }

    async fn answer_callback(&self, callback_id: &str, text: Option<&str>) -> Result<()> {
        self.with_retry(|| {
            let mut req = self.bot.answer_callback_query(callback_id.to_string());
            if let Some(t) = text {
                req = req.text(t.to_string());
            }
            req
        })
        .await?;
        Ok(())
    }
}
