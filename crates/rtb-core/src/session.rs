use tokio::sync::Mutex;

use crate::domain::UserId;

/// The administrator's current reply target.
///
/// A single process-wide slot: either idle or targeting one user. Selecting
/// a new target overwrites the old one without warning (last selection
/// wins), and any reply attempt clears the slot regardless of delivery
/// outcome. Never persisted; a restart always comes up idle.
#[derive(Debug, Default)]
pub struct ReplySession {
    target: Mutex<Option<UserId>>,
}

#[derive(Clone, Copy, Debug, PartialEq, Eq)]
pub enum CancelOutcome {
    Cancelled(UserId),
    NothingToCancel,
}

impl ReplySession {
    pub fn new() -> Self {
        Self::default()
    }

    /// Set the reply target, returning the target it replaced, if any.
    pub async fn select(&self, user: UserId) -> Option<UserId> {
        self.target.lock().await.replace(user)
    }

    /// Clear the slot and return the target so a reply attempt can be made.
    /// The slot is empty afterwards even if that attempt fails.
    pub async fn take(&self) -> Option<UserId> {
        self.target.lock().await.take()
    }

    pub async fn cancel(&self) -> CancelOutcome {
        match self.target.lock().await.take() {
            Some(user) => CancelOutcome::Cancelled(user),
            None => CancelOutcome::NothingToCancel,
        }
    }

    pub async fn current(&self) -> Option<UserId> {
        *self.target.lock().await
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[tokio::test]
    async fn select_overwrites_previous_target() {
        let session = ReplySession::new();
        assert_eq!(session.select(UserId(1)).await, None);
        assert_eq!(session.select(UserId(2)).await, Some(UserId(1)));
        assert_eq!(session.current().await, Some(UserId(2)));
    }

    #[tokio::test]
    async fn take_clears_the_slot() {
        let session = ReplySession::new();
        session.select(UserId(7)).await;
        assert_eq!(session.take().await, Some(UserId(7)));
        assert_eq!(session.take().await, None);
        assert_eq!(session.current().await, None);
    }

    #[tokio::test]
    async fn cancel_reports_idle_slot() {
        let session = ReplySession::new();
        assert_eq!(session.cancel().await, CancelOutcome::NothingToCancel);

        session.select(UserId(3)).await;
        assert_eq!(session.cancel().await, CancelOutcome::Cancelled(UserId(3)));
        assert_eq!(session.current().await, None);
    }
}
