#[derive(Debug, thiserror::Error)]
pub enum StateError {
    #[error(transparent)]
    Store(#[from] khoregos_store::StoreError),

    #[error("no session with id {0}")]
    UnknownSession(String),

    #[error("no agent with id {0}")]
    UnknownAgent(String),
}

pub type Result<T> = std::result::Result<T, StateError>;
