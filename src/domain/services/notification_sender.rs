use async_trait::async_trait;

#[derive(Debug, Clone, PartialEq)]
pub enum NotificationError {
    Transport(String),
    Rejected { status: u16, body: String },
}

impl std::fmt::Display for NotificationError {
    fn fmt(&self, f: &mut std::fmt::Formatter) -> std::fmt::Result {
        match self {
            NotificationError::Transport(msg) => write!(f, "Transport error: {}", msg),
            NotificationError::Rejected { status, body } => {
                write!(f, "Rejected by provider (status {}): {}", status, body)
            }
        }
    }
}

impl std::error::Error for NotificationError {}

/// Delivers one already-rendered reminder message.
/// Any timeout is the implementation's own; callers only see success or failure.
#[async_trait]
pub trait NotificationSender: Send + Sync {
    async fn send(&self, recipient: &str, subject: &str, body: &str) -> Result<(), NotificationError>;
}
