use thiserror::Error;

#[derive(Debug, Error)]
pub enum NotifyError {
    #[error("invalid notification URL {url}: {reason}")]
    InvalidUrl { url: String, reason: String },
    #[error("unsupported notification scheme: {0}")]
    UnsupportedScheme(String),
    #[error("HTTP error: {0}")]
    Http(#[from] reqwest::Error),
    #[error("notification queue closed")]
    QueueClosed,
}
