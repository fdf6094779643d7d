use crate::actions::ActionToken;

/// Inline keyboard attached to an outgoing message. Each button carries an
/// encoded [`ActionToken`] consumed by the admin dispatcher.
#[derive(Clone, Debug, Default, PartialEq, Eq)]
pub struct InlineKeyboard {
    pub rows: Vec<Vec<InlineButton>>,
}

#[derive(Clone, Debug, PartialEq, Eq)]
pub struct InlineButton {
    pub label: String,
    pub action: String,
}

impl InlineButton {
    pub fn new(label: impl Into<String>, action: &ActionToken) -> Self {
        Self {
            label: label.into(),
            action: action.encode(),
        }
    }
}

impl InlineKeyboard {
    pub fn new(rows: Vec<Vec<InlineButton>>) -> Self {
        Self { rows }
    }

    /// Single row of buttons side by side.
    pub fn row(buttons: Vec<InlineButton>) -> Self {
        Self {
            rows: vec![buttons],
        }
    }

    pub fn push_row(&mut self, buttons: Vec<InlineButton>) {
        self.rows.push(buttons);
    }

    pub fn is_empty(&self) -> bool {
        self.rows.iter().all(|r| r.is_empty())
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::domain::UserId;

    #[test]
    fn buttons_carry_encoded_actions() {
        let kb = InlineKeyboard::row(vec![
            InlineButton::new("Block", &ActionToken::Block(UserId(42))),
            InlineButton::new("Reply", &ActionToken::Reply(UserId(42))),
        ]);
        assert_eq!(kb.rows[0][0].action, "block:42");
        assert_eq!(kb.rows[0][1].action, "reply:42");
    }
}
