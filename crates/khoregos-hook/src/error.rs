use khoregos_audit::AuditError;
use khoregos_boundary::BoundaryError;
use khoregos_signing::SigningError;
use khoregos_state::StateError;
use khoregos_store::StoreError;

#[derive(Debug, thiserror::Error)]
pub enum HookError {
    #[error(transparent)]
    Store(#[from] StoreError),
    #[error(transparent)]
    State(#[from] StateError),
    #[error(transparent)]
    Boundary(#[from] BoundaryError),
    #[error(transparent)]
    Audit(#[from] AuditError),
    #[error(transparent)]
    Signing(#[from] SigningError),
}

pub type Result<T> = std::result::Result<T, HookError>;
