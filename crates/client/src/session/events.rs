//! Session events surfaced to the UI consumer.

/// What the session manager asks its consumer to show.
///
/// The manager never renders anything itself; it pushes these onto the
/// channel handed out at construction and the consumer decides how a
/// modal or toast looks in its framework.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum SessionEvent {
    /// The session is over and credentials were cleared. Consumers
    /// should show a blocking dialog and route to the sign-in screen.
    SessionExpired,
    /// Expiry is close: offer the user a session extension.
    ExtendOffered,
    /// A transient, non-blocking notification.
    Notice(Notice),
}

/// A toast-style notification with a localization key.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Notice {
    /// Severity, for styling only.
    pub level: NoticeLevel,
    /// Localization key the consumer resolves to display text.
    pub message_key: String,
}

impl Notice {
    /// An informational notice.
    #[must_use]
    pub fn info(message_key: impl Into<String>) -> Self {
        Self {
            level: NoticeLevel::Info,
            message_key: message_key.into(),
        }
    }

    /// An error notice.
    #[must_use]
    pub fn error(message_key: impl Into<String>) -> Self {
        Self {
            level: NoticeLevel::Error,
            message_key: message_key.into(),
        }
    }
}

/// Notice severity.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum NoticeLevel {
    Info,
    Error,
}
