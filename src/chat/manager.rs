//! Chat session manager
//!
//! Owns the in-memory chat list, the active chat, the rename editor, and the
//! in-flight send flag. Every remote-backed operation follows the same
//! pattern: validate, apply (or stage) the local change under the state lock,
//! release the lock, await the backend, then reconcile under the lock again.
//! The lock is never held across an await, so the state a caller observes
//! between two events is always complete.
//!
//! Ordering: the chat list is kept most-recently-updated first by moving a
//! chat to index 0 whenever its `updated_at` changes.

use chrono::Utc;
use std::collections::HashSet;
use std::sync::atomic::{AtomicBool, Ordering};
use std::sync::{Arc, Mutex, MutexGuard, PoisonError};

use super::search::{filter_chats, find_chat};
use super::title::{default_title, DEFAULT_TITLE_MAX_CHARS};
use crate::api::{Chat, ChatApi, Location, Message};
use crate::error::{ChataiError, Result};
use crate::notify::{Confirmer, Notifier};

/// The open title editor
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct RenameDraft {
    /// Chat being renamed
    pub chat_id: String,
    /// Current editor text
    pub title: String,
}

/// Result of a send request
#[derive(Debug, Clone, PartialEq)]
pub enum SendOutcome {
    /// The backend replied; the reply was appended to `chat_id`
    Sent {
        chat_id: String,
        reply: Message,
    },
    /// Input was empty after trimming; nothing happened
    SkippedEmpty,
    /// Another send was still in flight; nothing happened
    SkippedInFlight,
}

#[derive(Debug, Default)]
struct ChatState {
    chats: Vec<Chat>,
    active: Option<String>,
    rename: Option<RenameDraft>,
    /// Chats whose title was set explicitly and must not be defaulted
    pinned_titles: HashSet<String>,
}

impl ChatState {
    fn position(&self, id: &str) -> Option<usize> {
        self.chats.iter().position(|c| c.id == id)
    }

    fn get(&self, id: &str) -> Option<&Chat> {
        self.chats.iter().find(|c| c.id == id)
    }

    fn get_mut(&mut self, id: &str) -> Option<&mut Chat> {
        self.chats.iter_mut().find(|c| c.id == id)
    }

    /// Stamp `updated_at` and move the chat to the front
    fn touch(&mut self, id: &str) {
        if let Some(idx) = self.position(id) {
            let mut chat = self.chats.remove(idx);
            chat.updated_at = Utc::now();
            self.chats.insert(0, chat);
        }
    }

    /// Insert keeping `updated_at` descending
    fn insert_ordered(&mut self, chat: Chat) {
        let idx = self
            .chats
            .iter()
            .position(|c| c.updated_at <= chat.updated_at)
            .unwrap_or(self.chats.len());
        self.chats.insert(idx, chat);
    }

    /// Replace the list with fresh summaries, keeping histories already loaded
    fn replace_all(&mut self, mut incoming: Vec<Chat>) {
        for chat in incoming.iter_mut() {
            if chat.messages.is_none() {
                if let Some(local) = self.get(&chat.id) {
                    chat.messages = local.messages.clone();
                }
            }
        }
        incoming.sort_by(|a, b| b.updated_at.cmp(&a.updated_at));
        self.chats = incoming;

        if let Some(draft) = &self.rename {
            if self.position(&draft.chat_id).is_none() {
                self.rename = None;
            }
        }
    }
}

/// Server history first, then any local message the server did not return
fn merge_history(fetched: Vec<Message>, local: Vec<Message>) -> Vec<Message> {
    let mut merged = fetched;
    for message in local {
        if !merged.contains(&message) {
            merged.push(message);
        }
    }
    merged
}

/// Clears the in-flight flag when the send finishes, however it finishes
struct InFlight<'a>(&'a AtomicBool);

impl<'a> InFlight<'a> {
    fn acquire(flag: &'a AtomicBool) -> Option<Self> {
        flag.compare_exchange(false, true, Ordering::AcqRel, Ordering::Acquire)
            .ok()
            .map(|_| Self(flag))
    }
}

impl Drop for InFlight<'_> {
    fn drop(&mut self) {
        self.0.store(false, Ordering::Release);
    }
}

/// Client-side view of the user's chats
///
/// Operations take `&self`; state lives behind a mutex held only between
/// awaits. Remote failures are logged, reported through the [`Notifier`],
/// and returned to the caller with local state untouched.
///
/// # Examples
///
/// ```no_run
/// use std::sync::Arc;
/// use chatai::api::{AuthToken, HttpApiClient};
/// use chatai::chat::{ChatSessionManager, SendOutcome};
/// use chatai::config::ApiConfig;
/// use chatai::notify::ConsoleNotifier;
///
/// # async fn example() -> chatai::error::Result<()> {
/// let api = Arc::new(HttpApiClient::new(&ApiConfig::default(), AuthToken::new())?);
/// let manager = ChatSessionManager::new(api, Arc::new(ConsoleNotifier));
/// manager.refresh_chats().await?;
/// if let SendOutcome::Sent { reply, .. } = manager.send_message("Coffee nearby?", None).await? {
///     println!("{}", reply.content);
/// }
/// # Ok(())
/// # }
/// ```
pub struct ChatSessionManager {
    api: Arc<dyn ChatApi>,
    notifier: Arc<dyn Notifier>,
    title_max_chars: usize,
    state: Mutex<ChatState>,
    sending: AtomicBool,
}

impl ChatSessionManager {
    /// Create a manager with an empty chat list
    pub fn new(api: Arc<dyn ChatApi>, notifier: Arc<dyn Notifier>) -> Self {
        Self {
            api,
            notifier,
            title_max_chars: DEFAULT_TITLE_MAX_CHARS,
            state: Mutex::new(ChatState::default()),
            sending: AtomicBool::new(false),
        }
    }

    /// Override how many characters a default title keeps
    pub fn with_title_max_chars(mut self, max_chars: usize) -> Self {
        self.title_max_chars = max_chars;
        self
    }

    fn lock(&self) -> MutexGuard<'_, ChatState> {
        self.state.lock().unwrap_or_else(PoisonError::into_inner)
    }

    /// Chats as currently known, most recently updated first
    pub fn chats(&self) -> Vec<Chat> {
        self.lock().chats.clone()
    }

    /// A single chat by id
    pub fn chat(&self, id: &str) -> Option<Chat> {
        self.lock().get(id).cloned()
    }

    /// Identifier of the active chat
    pub fn active_chat_id(&self) -> Option<String> {
        self.lock().active.clone()
    }

    /// The active chat
    pub fn active_chat(&self) -> Option<Chat> {
        let state = self.lock();
        state.active.as_deref().and_then(|id| state.get(id)).cloned()
    }

    /// Whether a send is waiting for the backend
    pub fn is_sending(&self) -> bool {
        self.sending.load(Ordering::Acquire)
    }

    /// The open title editor, if any
    pub fn rename_draft(&self) -> Option<RenameDraft> {
        self.lock().rename.clone()
    }

    /// Reload the chat list from the backend
    ///
    /// On failure the previous list is kept.
    pub async fn refresh_chats(&self) -> Result<Vec<Chat>> {
        match self.api.list_chats().await {
            Ok(chats) => {
                tracing::debug!(count = chats.len(), "Loaded chats");
                let mut state = self.lock();
                state.replace_all(chats);
                Ok(state.chats.clone())
            }
            Err(e) => {
                tracing::error!("Error loading chats: {}", e);
                self.notifier.error("Failed to load chats");
                Err(e)
            }
        }
    }

    /// Create a chat on the backend, put it first and make it active
    pub async fn create_chat(&self) -> Result<Chat> {
        let mut chat = match self.api.create_chat().await {
            Ok(chat) => chat,
            Err(e) => {
                tracing::error!("Error creating chat: {}", e);
                self.notifier.error("Failed to create chat");
                return Err(e);
            }
        };
        // A new chat has no history; mark it loaded so selection never refetches it.
        chat.messages.get_or_insert_with(Vec::new);

        let mut state = self.lock();
        state.chats.retain(|c| c.id != chat.id);
        state.chats.insert(0, chat.clone());
        state.active = Some(chat.id.clone());
        tracing::info!(chat_id = %chat.id, "Created chat");
        Ok(chat)
    }

    /// Clear the active chat so the next send starts a new one
    pub fn start_new_chat(&self) {
        self.lock().active = None;
    }

    /// Make `id` the active chat, fetching its history if needed
    ///
    /// If the fetch fails the previous selection is restored. Messages sent
    /// while the history was loading are kept after it.
    pub async fn select_chat(&self, id: &str) -> Result<()> {
        let (prior, needs_fetch) = {
            let mut state = self.lock();
            let needs_fetch = state.get(id).map_or(true, |c| !c.is_loaded());
            (state.active.replace(id.to_string()), needs_fetch)
        };

        if !needs_fetch {
            return Ok(());
        }

        match self.api.get_chat(id).await {
            Ok(mut fetched) => {
                let messages = fetched.messages.take().unwrap_or_default();
                let mut state = self.lock();
                match state.get_mut(id) {
                    Some(chat) => {
                        // A send may have landed while the fetch was outstanding.
                        let local = chat.messages.take().unwrap_or_default();
                        chat.messages = Some(merge_history(messages, local));
                    }
                    None => {
                        fetched.messages = Some(messages);
                        state.insert_ordered(fetched);
                    }
                }
                Ok(())
            }
            Err(e) => {
                tracing::error!(chat_id = %id, "Error loading chat: {}", e);
                let mut state = self.lock();
                if state.active.as_deref() == Some(id) {
                    state.active = prior;
                }
                drop(state);
                self.notifier.error("Failed to load chat");
                Err(e)
            }
        }
    }

    /// Send a user message and append the assistant's reply
    ///
    /// Empty input and sends issued while another is in flight are ignored.
    /// Without an active chat a new one is created first. The user message
    /// is appended immediately; the reply is applied to the chat the message
    /// was sent to, even if another chat became active meanwhile. If the
    /// backend fails the user message stays and the error is reported.
    pub async fn send_message(
        &self,
        text: &str,
        location: Option<Location>,
    ) -> Result<SendOutcome> {
        let text = text.trim();
        if text.is_empty() {
            return Ok(SendOutcome::SkippedEmpty);
        }

        let Some(_in_flight) = InFlight::acquire(&self.sending) else {
            tracing::debug!("Send already in flight, ignoring");
            return Ok(SendOutcome::SkippedInFlight);
        };

        let chat_id = match self.active_chat_id() {
            Some(id) => id,
            None => self.create_chat().await?.id,
        };

        let pending = Message::user(text, location.clone());
        {
            let mut state = self.lock();
            let pinned = state.pinned_titles.contains(&chat_id);
            let max_chars = self.title_max_chars;
            let Some(chat) = state.get_mut(&chat_id) else {
                return Err(ChataiError::NotFound(format!("chat {}", chat_id)).into());
            };
            if !pinned && chat.is_loaded() && !chat.has_user_message() {
                chat.title = default_title(text, max_chars);
            }
            chat.messages.get_or_insert_with(Vec::new).push(pending.clone());
            state.touch(&chat_id);
        }

        let posted = self.api.post_message(&chat_id, text, location.as_ref()).await;
        let exchange = match posted {
            Ok(exchange) => exchange,
            Err(e) => {
                tracing::error!(chat_id = %chat_id, "Error sending message: {}", e);
                self.notifier.error("Failed to send message");
                return Err(e);
            }
        };

        let reply = exchange.assistant_message.clone();
        let mut state = self.lock();
        match state.get_mut(&chat_id) {
            Some(chat) => {
                let messages = chat.messages.get_or_insert_with(Vec::new);
                match messages.iter().rposition(|m| *m == pending) {
                    Some(idx) => messages[idx] = exchange.user_message,
                    None => messages.push(exchange.user_message),
                }
                messages.push(exchange.assistant_message);
                state.touch(&chat_id);
            }
            None => {
                tracing::warn!(
                    chat_id = %chat_id,
                    "Reply arrived for a chat that no longer exists"
                );
            }
        }

        Ok(SendOutcome::Sent { chat_id, reply })
    }

    /// Open the title editor for `id`, closing any other open editor
    pub fn begin_rename(&self, id: &str) -> Result<RenameDraft> {
        let mut state = self.lock();
        let title = state
            .get(id)
            .map(|c| c.title.clone())
            .ok_or_else(|| ChataiError::NotFound(format!("chat {}", id)))?;
        let draft = RenameDraft {
            chat_id: id.to_string(),
            title,
        };
        state.rename = Some(draft.clone());
        Ok(draft)
    }

    /// Replace the editor text
    pub fn edit_rename(&self, title: &str) {
        if let Some(draft) = self.lock().rename.as_mut() {
            draft.title = title.to_string();
        }
    }

    /// Close the title editor without saving
    pub fn cancel_rename(&self) {
        self.lock().rename = None;
    }

    /// Save the open title editor
    pub async fn commit_rename(&self) -> Result<()> {
        let draft = self
            .rename_draft()
            .ok_or_else(|| ChataiError::Validation("No chat is being renamed".to_string()))?;
        self.rename_chat(&draft.chat_id, &draft.title).await
    }

    /// Set an explicit title on `id`
    ///
    /// On success the chat moves to the front and the editor closes. On
    /// failure the old title and the editor are left as they were.
    pub async fn rename_chat(&self, id: &str, title: &str) -> Result<()> {
        let title = title.trim();
        if title.is_empty() {
            return Err(ChataiError::Validation("Chat title cannot be empty".to_string()).into());
        }
        if self.lock().position(id).is_none() {
            return Err(ChataiError::NotFound(format!("chat {}", id)).into());
        }

        if let Err(e) = self.api.update_title(id, title).await {
            tracing::error!(chat_id = %id, "Error updating title: {}", e);
            self.notifier.error("Failed to update chat title");
            return Err(e);
        }

        {
            let mut state = self.lock();
            if let Some(chat) = state.get_mut(id) {
                chat.title = title.to_string();
            }
            state.touch(id);
            state.pinned_titles.insert(id.to_string());
            if state.rename.as_ref().is_some_and(|d| d.chat_id == id) {
                state.rename = None;
            }
        }
        self.notifier.success("Chat title updated");
        Ok(())
    }

    /// Delete `id` after the user confirms
    ///
    /// Returns `Ok(false)` when the user declined.
    pub async fn delete_chat(&self, id: &str, confirmer: &dyn Confirmer) -> Result<bool> {
        if !confirmer.confirm("Are you sure you want to delete this chat?") {
            tracing::debug!(chat_id = %id, "Chat deletion declined");
            return Ok(false);
        }

        if let Err(e) = self.api.delete_chat(id).await {
            tracing::error!(chat_id = %id, "Error deleting chat: {}", e);
            self.notifier.error("Failed to delete chat");
            return Err(e);
        }

        {
            let mut state = self.lock();
            state.chats.retain(|c| c.id != id);
            if state.active.as_deref() == Some(id) {
                state.active = None;
            }
            if state.rename.as_ref().is_some_and(|d| d.chat_id == id) {
                state.rename = None;
            }
            state.pinned_titles.remove(id);
        }
        self.notifier.success("Chat deleted successfully");
        Ok(true)
    }

    /// Chats matching `query` on title or loaded message content
    pub fn search(&self, query: &str) -> Vec<Chat> {
        filter_chats(&self.lock().chats, query)
    }

    /// First chat matching `query`
    pub fn find(&self, query: &str) -> Option<Chat> {
        find_chat(&self.lock().chats, query).cloned()
    }
}
