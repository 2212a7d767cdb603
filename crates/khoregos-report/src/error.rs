#[derive(Debug, thiserror::Error)]
pub enum ReportError {
    #[error(transparent)]
    Store(#[from] khoregos_store::StoreError),

    #[error(transparent)]
    State(#[from] khoregos_state::StateError),

    #[error(transparent)]
    Signing(#[from] khoregos_signing::SigningError),

    #[error("no session with id {0}")]
    UnknownSession(String),
}

pub type Result<T> = std::result::Result<T, ReportError>;
