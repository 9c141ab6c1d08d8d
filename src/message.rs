use serde::{Deserialize, Serialize};
use uuid::Uuid;

/// Role of a chat message
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum Role {
    User,
    Assistant,
}

/// Single entry in a conversation. The id is the trace id of the exchange
/// that produced it; a user message and its assistant reply share one id.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct Message {
    pub id: Uuid,
    pub role: Role,
    pub content: String,
}

impl Message {
    pub fn user(id: Uuid, content: impl Into<String>) -> Self {
        Self {
            id,
            role: Role::User,
            content: content.into(),
        }
    }

    pub fn assistant(id: Uuid, content: impl Into<String>) -> Self {
        Self {
            id,
            role: Role::Assistant,
            content: content.into(),
        }
    }
}

/// Ordered conversation, oldest first. Append-only except for the in-place
/// content update of the assistant message currently being streamed.
pub type Conversation = Vec<Message>;

/// Fold the accumulated response text for one exchange into the conversation.
///
/// If the last message is the assistant reply for `trace_id`, its content is
/// replaced with the full accumulator; otherwise a new assistant message is
/// appended. Applying this after every chunk yields exactly one assistant
/// message per trace id, with monotonically growing content.
pub fn reconcile(conversation: &mut Conversation, trace_id: Uuid, accumulated: &str) {
    match conversation.last_mut() {
        Some(last) if last.role == Role::Assistant && last.id == trace_id => {
            last.content.clear();
            last.content.push_str(accumulated);
        }
        _ => conversation.push(Message::assistant(trace_id, accumulated)),
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn reconcile_appends_assistant_after_user_turn() {
        let id = Uuid::new_v4();
        let mut convo = vec![Message::user(id, "hello")];

        reconcile(&mut convo, id, "Hi");

        assert_eq!(convo.len(), 2);
        assert_eq!(convo[1].role, Role::Assistant);
        assert_eq!(convo[1].id, id);
        assert_eq!(convo[1].content, "Hi");
    }

    #[test]
    fn reconcile_grows_in_place_without_duplicating() {
        let id = Uuid::new_v4();
        let mut convo = vec![Message::user(id, "hello")];

        let chunks = ["Hi", " there", ", how", " are you?"];
        let mut acc = String::new();
        for chunk in chunks {
            acc.push_str(chunk);
            reconcile(&mut convo, id, &acc);
            let assistants = convo
                .iter()
                .filter(|m| m.role == Role::Assistant && m.id == id)
                .count();
            assert_eq!(assistants, 1);
        }

        assert_eq!(convo.len(), 2);
        assert_eq!(convo[1].content, "Hi there, how are you?");
    }

    #[test]
    fn reconcile_final_content_is_chunk_concatenation_for_any_split() {
        let full = "Xin chào! Đây là câu trả lời.";
        // Same text cut at every possible char boundary.
        for split in 0..=full.chars().count() {
            let id = Uuid::new_v4();
            let mut convo = vec![Message::user(id, "q")];
            let head: String = full.chars().take(split).collect();
            let mut acc = String::new();
            for part in [head.as_str(), &full[head.len()..]] {
                acc.push_str(part);
                reconcile(&mut convo, id, &acc);
            }
            assert_eq!(convo.last().unwrap().content, full);
        }
    }

    #[test]
    fn reconcile_does_not_touch_previous_exchange() {
        let old = Uuid::new_v4();
        let new = Uuid::new_v4();
        let mut convo = vec![
            Message::user(old, "first"),
            Message::assistant(old, "first answer"),
            Message::user(new, "second"),
        ];

        reconcile(&mut convo, new, "second answer");

        assert_eq!(convo.len(), 4);
        assert_eq!(convo[1].content, "first answer");
        assert_eq!(convo[3].id, new);
        assert_eq!(convo[3].content, "second answer");
    }
}
