use std::{
    fs::{self, OpenOptions},
    io::Write,
    path::{Path, PathBuf},
    sync::Mutex,
};

use crate::{
    domain::{BlockEntry, InboundMessage, RecordId, StoredMessage, UserId},
    storage::{memory::sort_newest_first, port::StoragePort},
    Result,
};

const MESSAGES_FILE: &str = "messages.jsonl";
const BLOCKS_FILE: &str = "blocks.json";

/// File-backed storage.
///
/// Messages are an append-only JSON Lines log; the block-list is a single
/// JSON document rewritten on every change. Both are loaded into memory at
/// open, so reads never touch the disk. A corrupt line in the message log
/// is skipped with a warning rather than failing startup.
#[derive(Debug)]
pub struct FileStorage {
    messages_path: PathBuf,
    blocks_path: PathBuf,
    inner: Mutex<Inner>,
}

#[derive(Debug, Default)]
struct Inner {
    messages: Vec<StoredMessage>,
    blocks: Vec<BlockEntry>,
    next_id: u64,
}

impl FileStorage {
    pub fn open(data_dir: &Path) -> Result<Self> {
        fs::create_dir_all(data_dir)?;
        let messages_path = data_dir.join(MESSAGES_FILE);
        let blocks_path = data_dir.join(BLOCKS_FILE);

        let messages = load_messages(&messages_path)?;
        let blocks = load_blocks(&blocks_path)?;
        let next_id = messages.iter().map(|m| m.id.0 + 1).max().unwrap_or(0);

        Ok(Self {
            messages_path,
            blocks_path,
            inner: Mutex::new(Inner {
                messages,
                blocks,
                next_id,
            }),
        })
    }

    fn append_message(&self, record: &StoredMessage) -> Result<()> {
        let mut file = OpenOptions::new()
            .create(true)
            .append(true)
            .open(&self.messages_path)?;
        let line = serde_json::to_string(record)?;
        writeln!(file, "{line}")?;
        Ok(())
    }

    fn write_blocks(&self, blocks: &[BlockEntry]) -> Result<()> {
        let txt = serde_json::to_string(blocks)?;
        fs::write(&self.blocks_path, txt)?;
        Ok(())
    }
}

fn load_messages(path: &Path) -> Result<Vec<StoredMessage>> {
    if !path.exists() {
        return Ok(Vec::new());
    }
    let txt = fs::read_to_string(path)?;
    let mut out = Vec::new();
    for line in txt.lines().filter(|l| !l.trim().is_empty()) {
        match serde_json::from_str::<StoredMessage>(line) {
            Ok(record) => out.push(record),
            Err(e) => tracing::warn!("skipping corrupt message record: {e}"),
        }
    }
    Ok(out)
}

fn load_blocks(path: &Path) -> Result<Vec<BlockEntry>> {
    if !path.exists() {
        return Ok(Vec::new());
    }
    let txt = fs::read_to_string(path)?;
    if txt.trim().is_empty() {
        return Ok(Vec::new());
    }
    Ok(serde_json::from_str(&txt)?)
}

impl StoragePort for FileStorage {
    fn insert_message(&self, message: &InboundMessage) -> Result<RecordId> {
        let mut inner = self.inner.lock().expect("storage lock poisoned");
        let id = RecordId(inner.next_id);
        let record = StoredMessage {
            id,
            message: message.clone(),
        };
        self.append_message(&record)?;
        inner.next_id += 1;
        inner.messages.push(record);
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
        let mut next = inner.blocks.clone();
        next.push(entry.clone());
        self.write_blocks(&next)?;
        inner.blocks = next;
        Ok(())
    }

    fn find_block(&self, user: UserId) -> Result<Option<BlockEntry>> {
        let inner = self.inner.lock().expect("storage lock poisoned");
        Ok(inner.blocks.iter().find(|b| b.user_id == user).cloned())
    }

    fn delete_block(&self, user: UserId) -> Result<bool> {
        let mut inner = self.inner.lock().expect("storage lock poisoned");
        if !inner.blocks.iter().any(|b| b.user_id == user) {
            return Ok(false);
        }
        let next: Vec<BlockEntry> = inner
            .blocks
            .iter()
            .filter(|b| b.user_id != user)
            .cloned()
            .collect();
        self.write_blocks(&next)?;
        inner.blocks = next;
        Ok(true)
    }

    fn list_blocks(&self) -> Result<Vec<BlockEntry>> {
        let inner = self.inner.lock().expect("storage lock poisoned");
        Ok(inner.blocks.clone())
    }
}
