use crate::{
    domain::{BlockEntry, InboundMessage, RecordId, StoredMessage, UserId},
    Result,
};

/// Persistence port for message history and the block-list.
///
/// Implementations guarantee single-record atomicity and read-after-write
/// consistency; no cross-record transactions are required. The relay engine
/// and dispatcher hold no private copies — they read and write through this
/// trait on every operation.
pub trait StoragePort: Send + Sync {
    /// Append one inbound message and return its record id.
    fn insert_message(&self, message: &InboundMessage) -> Result<RecordId>;

    /// Up to `limit` most recent messages, newest first.
    fn recent_messages(&self, limit: usize) -> Result<Vec<StoredMessage>>;

    /// The most recent stored message from `user`, if any.
    fn latest_message_from(&self, user: UserId) -> Result<Option<StoredMessage>>;

    fn message_by_id(&self, id: RecordId) -> Result<Option<StoredMessage>>;

    fn insert_block(&self, entry: &BlockEntry) -> Result<()>;

    fn find_block(&self, user: UserId) -> Result<Option<BlockEntry>>;

    /// Remove the block entry for `user`; returns whether one was present.
    fn delete_block(&self, user: UserId) -> Result<bool>;

    fn list_blocks(&self) -> Result<Vec<BlockEntry>>;
}
