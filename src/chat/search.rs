//! Chat list search

use crate::api::Chat;

fn matches(chat: &Chat, needle: &str) -> bool {
    chat.title.to_lowercase().contains(needle)
        || chat
            .messages()
            .iter()
            .any(|m| m.content.to_lowercase().contains(needle))
}

/// Chats whose title or any loaded message contains `query`, ignoring case
///
/// An empty query returns every chat in its original order. Chats whose
/// history is not loaded match on title only.
pub fn filter_chats(chats: &[Chat], query: &str) -> Vec<Chat> {
    if query.is_empty() {
        return chats.to_vec();
    }
    let needle = query.to_lowercase();
    chats
        .iter()
        .filter(|chat| matches(chat, &needle))
        .cloned()
        .collect()
}

/// First chat matching a trimmed, non-empty `query`
pub fn find_chat<'a>(chats: &'a [Chat], query: &str) -> Option<&'a Chat> {
    let query = query.trim();
    if query.is_empty() {
        return None;
    }
    let needle = query.to_lowercase();
    chats.iter().find(|chat| matches(chat, &needle))
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::api::Message;

    fn chat(id: &str, title: &str, messages: Option<Vec<&str>>) -> Chat {
        let mut chat = Chat::new(id, title);
        chat.messages = messages.map(|m| m.into_iter().map(|c| Message::user(c, None)).collect());
        chat
    }

    fn sample() -> Vec<Chat> {
        vec![
            chat("1", "Pizza in Rome", None),
            chat("2", "Weekend plans", Some(vec!["Where can I buy HIKING boots?"])),
            chat("3", "Groceries", Some(vec!["milk", "eggs"])),
        ]
    }

    #[test]
    fn test_empty_query_returns_all_in_order() {
        let chats = sample();
        let ids: Vec<_> = filter_chats(&chats, "").into_iter().map(|c| c.id).collect();
        assert_eq!(ids, vec!["1", "2", "3"]);
    }

    #[test]
    fn test_title_match_is_case_insensitive() {
        let found = filter_chats(&sample(), "PIZZA");
        assert_eq!(found.len(), 1);
        assert_eq!(found[0].id, "1");
    }

    #[test]
    fn test_message_content_match() {
        let found = filter_chats(&sample(), "hiking");
        assert_eq!(found.len(), 1);
        assert_eq!(found[0].id, "2");
    }

    #[test]
    fn test_no_match() {
        assert!(filter_chats(&sample(), "sushi").is_empty());
    }

    #[test]
    fn test_find_chat_first_match() {
        let chats = sample();
        assert_eq!(find_chat(&chats, "  EGGS ").map(|c| c.id.as_str()), Some("3"));
        assert!(find_chat(&chats, "   ").is_none());
    }
}
