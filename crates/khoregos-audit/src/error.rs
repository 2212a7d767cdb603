#[derive(Debug, thiserror::Error)]
pub enum AuditError {
    #[error(transparent)]
    Store(#[from] khoregos_store::StoreError),

    #[error(transparent)]
    Signing(#[from] khoregos_signing::SigningError),
}

pub type Result<T> = std::result::Result<T, AuditError>;
