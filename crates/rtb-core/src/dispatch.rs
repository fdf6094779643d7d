//! Administrator command dispatcher.
//!
//! Slash commands and callback buttons route through the same operations,
//! so both paths produce identical state changes. Confirmations are always
//! sent as new messages.

use std::sync::Arc;

use tracing::warn;

use crate::{
    actions::ActionToken,
    blocklist::{self, BlockOutcome, UnblockOutcome},
    domain::{BlockEntry, ChatId, RecordId, StoredMessage, UserId},
    formatting::{display_name, escape_html, render_blocked, render_detail, render_history},
    messaging::{
        port::MessagingPort,
        types::{InlineButton, InlineKeyboard},
    },
    session::{CancelOutcome, ReplySession},
    storage::port::StoragePort,
    Result,
};

const NO_ACCESS: &str = "You do not have access to this command.";

/// A parsed administrator command. Argument parsing happens at the
/// transport boundary; a missing argument arrives as `None` and yields a
/// usage hint.
#[derive(Clone, Copy, Debug, PartialEq, Eq)]
pub enum AdminCommand {
    Messages { limit: Option<usize> },
    Block { target: Option<UserId> },
    Unblock { target: Option<UserId> },
    Blocked,
    Cancel,
}

pub struct AdminDispatcher {
    admin: UserId,
    admin_chat: ChatId,
    default_limit: usize,
    storage: Arc<dyn StoragePort>,
    messenger: Arc<dyn MessagingPort>,
    session: Arc<ReplySession>,
}

impl AdminDispatcher {
    pub fn new(
        admin: UserId,
        default_limit: usize,
        storage: Arc<dyn StoragePort>,
        messenger: Arc<dyn MessagingPort>,
        session: Arc<ReplySession>,
    ) -> Self {
        Self {
            admin,
            admin_chat: ChatId(admin.0),
            default_limit,
            storage,
            messenger,
            session,
        }
    }

    pub fn is_admin(&self, user: UserId) -> bool {
        user == self.admin
    }

    /// Handle a slash command. Non-admin callers get a fixed refusal, the
    /// action is not performed, and the admin receives a security notice.
    pub async fn handle_command(&self, from: UserId, command: AdminCommand) -> Result<()> {
        if !self.is_admin(from) {
            self.refuse(from).await;
            return Ok(());
        }

        match command {
            AdminCommand::Messages { limit } => {
                self.send_history(limit.unwrap_or(self.default_limit)).await
            }
            AdminCommand::Block { target: None } => {
                self.send_admin("Please provide a user ID. Example: /block 123456789", None)
                    .await
            }
            AdminCommand::Block {
                target: Some(target),
            } => self.block(target).await,
            AdminCommand::Unblock { target: None } => {
                self.send_admin(
                    "Please provide a user ID. Example: /unblock 123456789",
                    None,
                )
                .await
            }
            AdminCommand::Unblock {
                target: Some(target),
            } => self.unblock(target).await,
            AdminCommand::Blocked => self.send_blocked_list().await,
            AdminCommand::Cancel => self.cancel_reply().await,
        }
    }

    /// Handle a callback button. Returns a short acknowledgment for the
    /// callback answer; the full confirmation is sent as a new message.
    pub async fn handle_action(
        &self,
        from: UserId,
        action: ActionToken,
    ) -> Result<Option<&'static str>> {
        if !self.is_admin(from) {
            self.refuse(from).await;
            return Ok(Some("No access"));
        }

        match action {
            ActionToken::Block(target) => {
                self.block(target).await?;
                Ok(Some("Block handled"))
            }
            ActionToken::Unblock(target) => {
                self.unblock(target).await?;
                Ok(Some("Unblock handled"))
            }
            ActionToken::Reply(target) => {
                self.select_reply_target(target).await?;
                Ok(Some("Reply target set"))
            }
            ActionToken::View(record) => {
                self.send_detail(record).await?;
                Ok(None)
            }
            ActionToken::Refresh | ActionToken::Back => {
                self.send_history(self.default_limit).await?;
                Ok(None)
            }
            ActionToken::More(limit) => {
                self.send_history(limit.max(1)).await?;
                Ok(None)
            }
        }
    }

    async fn block(&self, target: UserId) -> Result<()> {
        let outcome = blocklist::block(self.storage.as_ref(), target, self.admin)?;
        let text = match outcome {
            BlockOutcome::Blocked => format!("🚫 User {} has been blocked.", target.0),
            BlockOutcome::AlreadyBlocked => format!("User {} is already blocked.", target.0),
            BlockOutcome::UnknownUser => {
                format!("User {} was not found in the message history.", target.0)
            }
        };
        self.send_admin(&text, None).await
    }

    async fn unblock(&self, target: UserId) -> Result<()> {
        let outcome = blocklist::unblock(self.storage.as_ref(), target)?;
        let text = match outcome {
            UnblockOutcome::Unblocked => format!("✅ User {} has been unblocked.", target.0),
            UnblockOutcome::NotBlocked => format!("User {} was not blocked.", target.0),
        };
        self.send_admin(&text, None).await
    }

    /// Set the reply target. Selecting while already targeting someone else
    /// silently overwrites: last selection wins.
    pub async fn select_reply_target(&self, target: UserId) -> Result<()> {
        self.session.select(target).await;

        let identity = self
            .storage
            .latest_message_from(target)?
            .map(|m| display_name(&m.message.sender))
            .unwrap_or_else(|| "Unknown user".to_string());

        let text = format!(
            "✍️ Now replying to {} (ID: {}).\nSend your reply, or /cancel to stop.",
            escape_html(&identity),
            target.0
        );
        self.send_admin(&text, None).await
    }

    async fn cancel_reply(&self) -> Result<()> {
        let text = match self.session.cancel().await {
            CancelOutcome::Cancelled(user) => {
                format!("Reply mode cancelled (was targeting user {}).", user.0)
            }
            CancelOutcome::NothingToCancel => "No active reply mode.".to_string(),
        };
        self.send_admin(&text, None).await
    }

    async fn send_history(&self, limit: usize) -> Result<()> {
        let records = self.storage.recent_messages(limit)?;
        let text = render_history(&records);
        let controls = if records.is_empty() {
            None
        } else {
            Some(self.history_controls(&records, limit + self.default_limit))
        };
        self.send_admin(&text, controls).await
    }

    async fn send_detail(&self, record: RecordId) -> Result<()> {
        match self.storage.message_by_id(record)? {
            Some(stored) => {
                let text = render_detail(&stored);
                let controls = detail_controls(&stored);
                self.send_admin(&text, Some(controls)).await
            }
            None => {
                self.send_admin(&format!("Message #{} was not found.", record.0), None)
                    .await
            }
        }
    }

    async fn send_blocked_list(&self) -> Result<()> {
        let entries = self.storage.list_blocks()?;
        let mut resolved: Vec<(BlockEntry, Option<StoredMessage>)> = Vec::new();
        for entry in entries {
            let last = self.storage.latest_message_from(entry.user_id)?;
            resolved.push((entry, last));
        }

        let text = render_blocked(&resolved);
        let controls = if resolved.is_empty() {
            None
        } else {
            Some(blocked_controls(&resolved))
        };
        self.send_admin(&text, controls).await
    }

    fn history_controls(&self, records: &[StoredMessage], next_limit: usize) -> InlineKeyboard {
        let mut keyboard = InlineKeyboard::default();
        for record in records {
            keyboard.push_row(vec![InlineButton::new(
                format!("🔍 View #{}", record.id.0),
                &ActionToken::View(record.id),
            )]);
        }
        keyboard.push_row(vec![
            InlineButton::new("🔄 Refresh", &ActionToken::Refresh),
            InlineButton::new("⬇️ More", &ActionToken::More(next_limit)),
        ]);
        keyboard
    }

    async fn send_admin(&self, text: &str, controls: Option<InlineKeyboard>) -> Result<()> {
        self.messenger
            .send_text(self.admin_chat, text, controls)
            .await?;
        Ok(())
    }

    /// Fixed refusal to the caller plus a best-effort security notice to
    /// the administrator.
    async fn refuse(&self, from: UserId) {
        warn!(user = from.0, "non-admin attempted an admin action");

        if let Err(e) = self
            .messenger
            .send_text(ChatId(from.0), NO_ACCESS, None)
            .await
        {
            warn!(user = from.0, "failed to send refusal: {e}");
        }

        let notice = format!("⚠️ Security notice: user {} attempted an admin action.", from.0);
        if let Err(e) = self.messenger.send_text(self.admin_chat, &notice, None).await {
            warn!("failed to send security notice: {e}");
        }
    }
}

fn detail_controls(record: &StoredMessage) -> InlineKeyboard {
    let sender = record.message.sender.user_id;
    InlineKeyboard::new(vec![
        vec![
            InlineButton::new("🚫 Block", &ActionToken::Block(sender)),
            InlineButton::new("✍️ Reply", &ActionToken::Reply(sender)),
        ],
        vec![InlineButton::new("◀️ Back", &ActionToken::Back)],
    ])
}

fn blocked_controls(entries: &[(BlockEntry, Option<StoredMessage>)]) -> InlineKeyboard {
    let rows = entries
        .iter()
        .map(|(entry, _)| {
            vec![InlineButton::new(
                format!("Unblock {}", entry.user_id.0),
                &ActionToken::Unblock(entry.user_id),
            )]
        })
        .collect();
    InlineKeyboard::new(rows)
}
