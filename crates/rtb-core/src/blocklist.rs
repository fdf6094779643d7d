//! Block-list operations.
//!
//! Blocking requires the target to have messaged in at least once, so block
//! targets are always real correspondents. Every operation is idempotent
//! and reports its outcome instead of failing.

use chrono::Utc;

use crate::{
    domain::{BlockEntry, UserId},
    storage::port::StoragePort,
    Result,
};

#[derive(Clone, Copy, Debug, PartialEq, Eq)]
pub enum BlockOutcome {
    Blocked,
    AlreadyBlocked,
    UnknownUser,
}

#[derive(Clone, Copy, Debug, PartialEq, Eq)]
pub enum UnblockOutcome {
    Unblocked,
    NotBlocked,
}

pub fn is_blocked(storage: &dyn StoragePort, user: UserId) -> Result<bool> {
    Ok(storage.find_block(user)?.is_some())
}

pub fn block(storage: &dyn StoragePort, user: UserId, by: UserId) -> Result<BlockOutcome> {
    if storage.latest_message_from(user)?.is_none() {
        return Ok(BlockOutcome::UnknownUser);
    }
    if storage.find_block(user)?.is_some() {
        return Ok(BlockOutcome::AlreadyBlocked);
    }

    storage.insert_block(&BlockEntry {
        user_id: user,
        blocked_by: by,
        blocked_at: Utc::now(),
    })?;
    Ok(BlockOutcome::Blocked)
}

pub fn unblock(storage: &dyn StoragePort, user: UserId) -> Result<UnblockOutcome> {
    if storage.delete_block(user)? {
        Ok(UnblockOutcome::Unblocked)
    } else {
        Ok(UnblockOutcome::NotBlocked)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use chrono::Utc;

    use crate::domain::{InboundMessage, MessageId, SenderProfile};
    use crate::storage::memory::MemoryStorage;

    fn seed_message(storage: &MemoryStorage, user: i64) {
        let msg = InboundMessage {
            sender: SenderProfile {
                user_id: UserId(user),
                username: None,
                first_name: "Ana".to_string(),
                last_name: None,
            },
            origin_message_id: MessageId(1),
            text: Some("hello".to_string()),
            caption: None,
            attachment: None,
            received_at: Utc::now(),
        };
        storage.insert_message(&msg).unwrap();
    }

    #[test]
    fn blocking_a_stranger_is_refused() {
        let storage = MemoryStorage::new();
        let outcome = block(&storage, UserId(42), UserId(99)).unwrap();
        assert_eq!(outcome, BlockOutcome::UnknownUser);
        assert!(storage.list_blocks().unwrap().is_empty());
    }

    #[test]
    fn double_block_keeps_the_original_entry() {
        let storage = MemoryStorage::new();
        seed_message(&storage, 42);

        assert_eq!(block(&storage, UserId(42), UserId(99)).unwrap(), BlockOutcome::Blocked);
        let first = storage.find_block(UserId(42)).unwrap().unwrap();

        assert_eq!(
            block(&storage, UserId(42), UserId(99)).unwrap(),
            BlockOutcome::AlreadyBlocked
        );
        let blocks = storage.list_blocks().unwrap();
        assert_eq!(blocks.len(), 1);
        assert_eq!(blocks[0].blocked_at, first.blocked_at);
    }

    #[test]
    fn unblock_reports_missing_entry() {
        let storage = MemoryStorage::new();
        assert_eq!(unblock(&storage, UserId(42)).unwrap(), UnblockOutcome::NotBlocked);

        seed_message(&storage, 42);
        block(&storage, UserId(42), UserId(99)).unwrap();
        assert_eq!(unblock(&storage, UserId(42)).unwrap(), UnblockOutcome::Unblocked);
        assert!(!is_blocked(&storage, UserId(42)).unwrap());
    }
}
