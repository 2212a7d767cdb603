#[derive(Debug, thiserror::Error)]
pub enum WebhookError {
    #[error("request failed: {0}")]
    RequestFailed(String),

    #[error("unexpected status {0}")]
    UnexpectedStatus(u16),
}

pub type Result<T> = std::result::Result<T, WebhookError>;
