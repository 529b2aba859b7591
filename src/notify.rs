//! User-facing notices and confirmation prompts
//!
//! Remote failures are reported through a [`Notifier`] instead of bubbling
//! up as crashes, and destructive actions ask a [`Confirmer`] first. The
//! terminal front end provides console implementations; tests use
//! [`RecordingNotifier`] and [`FixedConfirmer`].

use colored::Colorize;
use std::sync::Mutex;

/// Severity of a notice
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum NoticeLevel {
    Success,
    Info,
    Error,
}

/// A transient user-visible message
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Notice {
    pub level: NoticeLevel,
    pub message: String,
}

/// Sink for transient user-visible notices
pub trait Notifier: Send + Sync {
    /// Surface a notice to the user
    fn notify(&self, notice: Notice);

    /// Convenience for a success notice
    fn success(&self, message: &str) {
        self.notify(Notice {
            level: NoticeLevel::Success,
            message: message.to_string(),
        });
    }

    /// Convenience for an informational notice
    fn info(&self, message: &str) {
        self.notify(Notice {
            level: NoticeLevel::Info,
            message: message.to_string(),
        });
    }

    /// Convenience for an error notice
    fn error(&self, message: &str) {
        self.notify(Notice {
            level: NoticeLevel::Error,
            message: message.to_string(),
        });
    }
}

/// Prints notices to stderr with color
#[derive(Debug, Default, Clone, Copy)]
pub struct ConsoleNotifier;

impl Notifier for ConsoleNotifier {
    fn notify(&self, notice: Notice) {
        let line = match notice.level {
            NoticeLevel::Success => format!("✓ {}", notice.message).green(),
            NoticeLevel::Info => notice.message.cyan(),
            NoticeLevel::Error => format!("✗ {}", notice.message).red(),
        };
        eprintln!("{}", line);
    }
}

/// Keeps every notice in memory
#[derive(Debug, Default)]
pub struct RecordingNotifier {
    notices: Mutex<Vec<Notice>>,
}

impl RecordingNotifier {
    pub fn new() -> Self {
        Self::default()
    }

    /// All notices received so far
    pub fn notices(&self) -> Vec<Notice> {
        self.notices
            .lock()
            .map(|n| n.clone())
            .unwrap_or_default()
    }

    /// Messages of the error notices received so far
    pub fn errors(&self) -> Vec<String> {
        self.notices()
            .into_iter()
            .filter(|n| n.level == NoticeLevel::Error)
            .map(|n| n.message)
            .collect()
    }
}

impl Notifier for RecordingNotifier {
    fn notify(&self, notice: Notice) {
        if let Ok(mut notices) = self.notices.lock() {
            notices.push(notice);
        }
    }
}

/// Asks the user before a destructive action
pub trait Confirmer: Send + Sync {
    /// Yes/no question; `true` means proceed
    fn confirm(&self, question: &str) -> bool;

    /// Free-text answer, `None` when the user aborts the prompt
    fn ask(&self, question: &str) -> Option<String>;
}

/// Answers every question the same way
#[derive(Debug, Clone)]
pub struct FixedConfirmer {
    pub answer: bool,
    pub text: Option<String>,
}

impl FixedConfirmer {
    /// Always agree, typing `text` when asked for input
    pub fn yes(text: Option<&str>) -> Self {
        Self {
            answer: true,
            text: text.map(str::to_string),
        }
    }

    /// Always decline
    pub fn no() -> Self {
        Self {
            answer: false,
            text: None,
        }
    }
}

impl Confirmer for FixedConfirmer {
    fn confirm(&self, _question: &str) -> bool {
        self.answer
    }

    fn ask(&self, _question: &str) -> Option<String> {
        self.text.clone()
    }
}
