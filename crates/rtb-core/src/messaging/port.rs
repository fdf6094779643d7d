use async_trait::async_trait;

use crate::{
    domain::{Attachment, ChatId, MessageRef},
    messaging::types::InlineKeyboard,
    Result,
};

/// Messaging port.
///
/// Telegram is the first implementation; the shape is narrow enough that
/// another chat platform could fit behind it. Event receipt is the
/// adapter's own dispatcher loop, not a port method. Text is Telegram HTML;
/// callers escape user content before rendering.
#[async_trait]
pub trait MessagingPort: Send + Sync {
    async fn send_text(
        &self,
        chat_id: ChatId,
        text: &str,
        controls: Option<InlineKeyboard>,
    ) -> Result<MessageRef>;

    /// Re-send a stored attachment natively by its platform file handle.
    /// Stickers cannot carry captions; adapters ignore `caption` for them.
    async fn send_attachment(
        &self,
        chat_id: ChatId,
        attachment: &Attachment,
        caption: Option<&str>,
        controls: Option<InlineKeyboard>,
    ) -> Result<MessageRef>;

    async fn answer_callback(&self, callback_id: &str, text: Option<&str>) -> Result<()>;
}
