//! Default chat titles

/// Characters of the first user message kept in a generated title
pub const DEFAULT_TITLE_MAX_CHARS: usize = 50;

const ELLIPSIS: &str = "...";

/// Title derived from the first user message of a chat
///
/// Keeps the first `max_chars` characters and appends `...` when the message
/// was longer. Counts characters, so multi-byte text is never split.
///
/// # Examples
///
/// ```
/// use chatai::chat::default_title;
///
/// assert_eq!(default_title("Best tacos nearby?", 50), "Best tacos nearby?");
/// assert_eq!(default_title("abcdef", 3), "abc...");
/// ```
pub fn default_title(first_message: &str, max_chars: usize) -> String {
    let mut chars = first_message.char_indices();
    match chars.nth(max_chars) {
        Some((cut, _)) => format!("{}{}", &first_message[..cut], ELLIPSIS),
        None => first_message.to_string(),
    }
}
