//! Rendering of user-facing text (Telegram HTML parse mode).
//!
//! All user-supplied content (names, usernames, message text) is escaped
//! here; callers send the returned strings as-is.

use chrono::{DateTime, Utc};

use crate::domain::{BlockEntry, SenderProfile, StoredMessage};

/// Maximum preview length in history listings.
pub const PREVIEW_MAX_LEN: usize = 50;

/// Escape HTML special characters for Telegram HTML parse mode.
pub fn escape_html(text: &str) -> String {
    text.replace('&', "&amp;")
        .replace('<', "&lt;")
        .replace('>', "&gt;")
        .replace('"', "&quot;")
}

pub fn truncate_text(s: &str, max_len: usize) -> String {
    if s.chars().count() <= max_len {
        return s.to_string();
    }
    let mut out: String = s.chars().take(max_len).collect();
    out.push_str("...");
    out
}

fn format_timestamp(ts: DateTime<Utc>) -> String {
    ts.format("%d.%m.%Y %H:%M").to_string()
}

fn full_name(sender: &SenderProfile) -> String {
    match &sender.last_name {
        Some(last) if !last.is_empty() => format!("{} {last}", sender.first_name),
        _ => sender.first_name.clone(),
    }
}

/// Short display identity: `@username` when known, else the full name.
pub fn display_name(sender: &SenderProfile) -> String {
    if let Some(username) = &sender.username {
        if !username.is_empty() {
            return format!("@{username}");
        }
    }
    let name = full_name(sender);
    if name.trim().is_empty() {
        "Unknown user".to_string()
    } else {
        name
    }
}

/// Header identifying the sender on forwarded notifications.
pub fn sender_header(sender: &SenderProfile) -> String {
    let username = sender
        .username
        .as_deref()
        .filter(|u| !u.is_empty())
        .map(|u| format!(" (@{u})"))
        .unwrap_or_default();

    format!(
        "👤 {}{}\n🆔 ID: {}",
        escape_html(full_name(sender).trim()),
        escape_html(&username),
        sender.user_id.0
    )
}

fn message_preview(record: &StoredMessage) -> String {
    if let Some(text) = record.message.text.as_deref().filter(|t| !t.is_empty()) {
        return escape_html(&truncate_text(text, PREVIEW_MAX_LEN));
    }
    if let Some(attachment) = &record.message.attachment {
        return format!("[{}]", attachment.kind.label());
    }
    "[empty]".to_string()
}

/// History listing, newest first. The caller decides which records to show.
pub fn render_history(records: &[StoredMessage]) -> String {
    if records.is_empty() {
        return "No messages yet.".to_string();
    }

    let mut out = String::from("📬 Recent messages:\n");
    for record in records {
        out.push('\n');
        out.push_str(&format!(
            "🕒 {}\n👤 {} (ID: {})\n📝 {}\n",
            format_timestamp(record.message.received_at),
            escape_html(&display_name(&record.message.sender)),
            record.message.sender.user_id.0,
            message_preview(record),
        ));
    }
    out
}

/// One record in full, shown from a `view` control.
pub fn render_detail(record: &StoredMessage) -> String {
    let mut out = format!(
        "🗂 Message #{}\n🕒 {}\n{}\n",
        record.id.0,
        format_timestamp(record.message.received_at),
        sender_header(&record.message.sender),
    );

    if let Some(attachment) = &record.message.attachment {
        out.push_str(&format!("\n📎 Sent a {}", attachment.kind.label()));
        if let Some(caption) = record.message.caption.as_deref().filter(|c| !c.is_empty()) {
            out.push_str(&format!(" with caption: {}", escape_html(caption)));
        }
        out.push('\n');
    }
    if let Some(text) = record.message.text.as_deref().filter(|t| !t.is_empty()) {
        out.push_str(&format!("\n📝 {}\n", escape_html(text)));
    }
    out
}

/// Block-list listing with best-effort identities resolved from each user's
/// most recent stored message.
pub fn render_blocked(entries: &[(BlockEntry, Option<StoredMessage>)]) -> String {
    if entries.is_empty() {
        return "No blocked users.".to_string();
    }

    let mut out = String::from("🚫 Blocked users:\n");
    for (entry, last_message) in entries {
        let identity = last_message
            .as_ref()
            .map(|m| display_name(&m.message.sender))
            .unwrap_or_else(|| "Unknown user".to_string());

        out.push('\n');
        out.push_str(&format!(
            "👤 {}\n🆔 ID: {}\n⏱ Blocked: {}\n",
            escape_html(&identity),
            entry.user_id.0,
            format_timestamp(entry.blocked_at),
        ));
    }
    out
}
