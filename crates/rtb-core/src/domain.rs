use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};

/// Telegram user id (numeric).
#[derive(Clone, Copy, Debug, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub struct UserId(pub i64);

/// Telegram chat id (numeric).
#[derive(Clone, Copy, Debug, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub struct ChatId(pub i64);

/// Telegram message id (numeric).
#[derive(Clone, Copy, Debug, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub struct MessageId(pub i32);

/// Storage-assigned record id, monotonically increasing.
#[derive(Clone, Copy, Debug, PartialEq, Eq, Hash, PartialOrd, Ord, Serialize, Deserialize)]
pub struct RecordId(pub u64);

/// A stable reference to a sent Telegram message.
#[derive(Clone, Copy, Debug, PartialEq, Eq, Hash)]
pub struct MessageRef {
    pub chat_id: ChatId,
    pub message_id: MessageId,
}

/// Opaque platform file handle. Never fabricated; only copied from an
/// inbound message's native attachment.
#[derive(Clone, Debug, PartialEq, Eq, Serialize, Deserialize)]
pub struct FileRef(pub String);

/// The closed set of non-text content kinds the relay can classify and
/// re-send natively.
#[derive(Clone, Copy, Debug, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum AttachmentKind {
    Photo,
    Document,
    Video,
    Voice,
    Audio,
    Sticker,
}

impl AttachmentKind {
    /// Human label used in forwarded captions and history placeholders.
    pub fn label(self) -> &'static str {
        match self {
            AttachmentKind::Photo => "photo",
            AttachmentKind::Document => "document",
            AttachmentKind::Video => "video",
            AttachmentKind::Voice => "voice message",
            AttachmentKind::Audio => "audio",
            AttachmentKind::Sticker => "sticker",
        }
    }
}

#[derive(Clone, Debug, PartialEq, Eq, Serialize, Deserialize)]
pub struct Attachment {
    pub kind: AttachmentKind,
    pub file_ref: FileRef,
}

/// Raw attachment slots as seen on the wire, before classification.
///
/// A real Telegram message populates at most one slot, but the classifier
/// must not rely on that: precedence is photo > document > video > voice >
/// audio > sticker, first match wins.
#[derive(Clone, Debug, Default)]
pub struct AttachmentProbe {
    pub photo: Option<FileRef>,
    pub document: Option<FileRef>,
    pub video: Option<FileRef>,
    pub voice: Option<FileRef>,
    pub audio: Option<FileRef>,
    pub sticker: Option<FileRef>,
}

impl AttachmentProbe {
    pub fn classify(self) -> Option<Attachment> {
        let slots = [
            (AttachmentKind::Photo, self.photo),
            (AttachmentKind::Document, self.document),
            (AttachmentKind::Video, self.video),
            (AttachmentKind::Voice, self.voice),
            (AttachmentKind::Audio, self.audio),
            (AttachmentKind::Sticker, self.sticker),
        ];
        slots
            .into_iter()
            .find_map(|(kind, file_ref)| file_ref.map(|file_ref| Attachment { kind, file_ref }))
    }
}

/// Display identity of a correspondent.
#[derive(Clone, Debug, PartialEq, Eq, Serialize, Deserialize)]
pub struct SenderProfile {
    pub user_id: UserId,
    pub username: Option<String>,
    pub first_name: String,
    pub last_name: Option<String>,
}

/// One message received from a user, as persisted.
#[derive(Clone, Debug, Serialize, Deserialize)]
pub struct InboundMessage {
    pub sender: SenderProfile,
    pub origin_message_id: MessageId,
    pub text: Option<String>,
    pub caption: Option<String>,
    pub attachment: Option<Attachment>,
    pub received_at: DateTime<Utc>,
}

/// An `InboundMessage` plus its storage-assigned id.
#[derive(Clone, Debug, Serialize, Deserialize)]
pub struct StoredMessage {
    pub id: RecordId,
    #[serde(flatten)]
    pub message: InboundMessage,
}

/// A block decision. At most one active entry per user id.
#[derive(Clone, Debug, PartialEq, Eq, Serialize, Deserialize)]
pub struct BlockEntry {
    pub user_id: UserId,
    pub blocked_by: UserId,
    pub blocked_at: DateTime<Utc>,
}
