use std::sync::Mutex;

use crate::{
    domain::{BlockEntry, InboundMessage, RecordId, StoredMessage, UserId},
    storage::port::StoragePort,
    Result,
};

/// In-memory storage. Used by tests and useful for ephemeral runs; the
/// durable implementation is [`crate::storage::file::FileStorage`].
#[derive(Debug, Default)]
pub struct MemoryStorage {
    inner: Mutex<Inner>,
}

#[derive(Debug, Default)]
struct Inner {
    messages: Vec<StoredMessage>,
    blocks: Vec<BlockEntry>,
    next_id: u64,
}

impl MemoryStorage {
    pub fn new() -> Self {
        Self::default()
    }
}

/// Newest-first ordering by `received_at`, record id breaking ties.
pub(crate) fn sort_newest_first(messages: &mut [StoredMessage]) {
    messages.sort_by(|a, b| {
        (b.message.received_at, b.id).cmp(&(a.message.received_at, a.id))
    });
}

impl StoragePort for MemoryStorage {
    fn insert_message(&self, message: &InboundMessage) -> Result<RecordId> {
        let mut inner = self.inner.lock().expect("storage lock poisoned");
        let id = RecordId(inner.next_id);
        inner.next_id += 1;
        inner.messages.push(StoredMessage {
            id,
            message: message.clone(),
        });
        Ok(id)
    }

    fn recent_messages(&self, limit: usize) -> Result<Vec<StoredMessage>> {
        let inner = self.inner.lock().expect("storage lock poisoned");
        let mut out = inner.messages.clone();
        sort_newest_first(&mut out);
        out.truncate(limit);
        Ok(out)
    }

    fn latest_message_from(&self, user: UserId) -> Result<Option<StoredMessage>> {
        let inner = self.inner.lock().expect("storage lock poisoned");
        let mut from_user: Vec<StoredMessage> = inner
            .messages
            .iter()
            .filter(|m| m.message.sender.user_id == user)
            .cloned()
            .collect();
        sort_newest_first(&mut from_user);
        Ok(from_user.into_iter().next())
    }

    fn message_by_id(&self, id: RecordId) -> Result<Option<StoredMessage>> {
        let inner = self.inner.lock().expect("storage lock poisoned");
        Ok(inner.messages.iter().find(|m| m.id == id).cloned())
    }

    fn insert_block(&self, entry: &BlockEntry) -> Result<()> {
        let mut inner = self.inner.lock().expect("storage lock poisoned");
        inner.blocks.push(entry.clone());
        Ok(())
    }

    fn find_block(&self, user: UserId) -> Result<Option<BlockEntry>> {
        let inner = self.inner.lock().expect("storage lock poisoned");
        Ok(inner.blocks.iter().find(|b| b.user_id == user).cloned())
    }

    fn delete_block(&self, user: UserId) -> Result<bool> {
        let mut inner = self.inner.lock().expect("storage lock poisoned");
        let before = inner.blocks.len();
        inner.blocks.retain(|b| b.user_id != user);
        Ok(inner.blocks.len() != before)
    }

    fn list_blocks(&self) -> Result<Vec<BlockEntry>> {
        let inner = self.inner.lock().expect("storage lock poisoned");
        Ok(inner.blocks.clone())
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use chrono::{TimeZone, Utc};

    use crate::domain::SenderProfile;

    fn message_at(user: i64, text: &str, minute: u32) -> InboundMessage {
        InboundMessage {
            sender: SenderProfile {
                user_id: UserId(user),
                username: None,
                first_name: format!("user{user}"),
                last_name: None,
            },
            origin_message_id: crate::domain::MessageId(1),
            text: Some(text.to_string()),
            caption: None,
            attachment: None,
            received_at: Utc.with_ymd_and_hms(2025, 6, 1, 12, minute, 0).unwrap(),
        }
    }

    #[test]
    fn recent_messages_are_newest_first_and_limited() {
        let storage = MemoryStorage::new();
        for i in 0..5 {
            storage.insert_message(&message_at(1, &format!("m{i}"), i)).unwrap();
        }

        let recent = storage.recent_messages(2).unwrap();
        assert_eq!(recent.len(), 2);
        assert_eq!(recent[0].message.text.as_deref(), Some("m4"));
        assert_eq!(recent[1].message.text.as_deref(), Some("m3"));
    }

    #[test]
    fn latest_message_from_picks_most_recent_for_that_user() {
        let storage = MemoryStorage::new();
        storage.insert_message(&message_at(1, "old", 0)).unwrap();
        storage.insert_message(&message_at(2, "other", 1)).unwrap();
        storage.insert_message(&message_at(1, "new", 2)).unwrap();

        let latest = storage.latest_message_from(UserId(1)).unwrap().unwrap();
        assert_eq!(latest.message.text.as_deref(), Some("new"));
        assert!(storage.latest_message_from(UserId(9)).unwrap().is_none());
    }

    #[test]
    fn delete_block_reports_presence() {
        let storage = MemoryStorage::new();
        let entry = BlockEntry {
            user_id: UserId(1),
            blocked_by: UserId(99),
            blocked_at: Utc::now(),
        };
        storage.insert_block(&entry).unwrap();

        assert!(storage.delete_block(UserId(1)).unwrap());
        assert!(!storage.delete_block(UserId(1)).unwrap());
        assert!(storage.list_blocks().unwrap().is_empty());
    }
}
