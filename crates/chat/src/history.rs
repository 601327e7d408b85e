use askai_api::{HistoryMessage, HistoryRole};

use crate::message::{Message, Role};

/// Maximum number of prior turns forwarded to the backend for context.
pub const HISTORY_WINDOW_LIMIT: usize = 12;

/// Builds the trailing context window sent alongside a question.
///
/// Entries with blank content are dropped, the remainder is bounded to the
/// last `HISTORY_WINDOW_LIMIT` entries, and relative order is preserved with
/// the oldest entry of the window first.
pub fn history_window(messages: &[Message]) -> Vec<HistoryMessage> {
    let eligible = messages
        .iter()
        .filter(|message| !message.content.trim().is_empty())
        .map(|message| HistoryMessage::new(role_to_wire(message.role), message.content.clone()))
        .collect::<Vec<_>>();

    let start = eligible.len().saturating_sub(HISTORY_WINDOW_LIMIT);
    eligible.into_iter().skip(start).collect()
}

fn role_to_wire(role: Role) -> HistoryRole {
    match role {
        Role::User => HistoryRole::User,
        Role::Assistant => HistoryRole::Assistant,
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn window_keeps_the_trailing_entries_in_order() {
        let mut messages = Vec::new();
        for turn in 0..13 {
            messages.push(Message::user(format!("question {turn}")));
            messages.push(Message::assistant(format!("answer {turn}")));
        }

        let window = history_window(&messages);

        assert_eq!(window.len(), HISTORY_WINDOW_LIMIT);
        // 26 eligible entries means the first 14 fall out of the window.
        assert_eq!(window[0].content, "question 7");
        assert_eq!(window[0].role, HistoryRole::User);
        assert_eq!(window[11].content, "answer 12");
        assert_eq!(window[11].role, HistoryRole::Assistant);
    }

    #[test]
    fn blank_entries_are_excluded_before_windowing() {
        let messages = vec![
            Message::user("keep me"),
            Message::assistant(""),
            Message::assistant("   "),
            Message::assistant("kept answer"),
        ];

        let window = history_window(&messages);

        assert_eq!(
            window,
            vec![
                HistoryMessage::new(HistoryRole::User, "keep me"),
                HistoryMessage::new(HistoryRole::Assistant, "kept answer"),
            ]
        );
    }

    #[test]
    fn short_logs_pass_through_unchanged() {
        let messages = vec![Message::assistant("greeting"), Message::user("hi")];

        assert_eq!(history_window(&messages).len(), 2);
    }
}
