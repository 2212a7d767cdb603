//! Fire-and-forget, signed, retrying HTTP delivery of audit events to
//! operator-configured webhook targets (`spec.md` §4.8).

pub mod clock;
pub mod config;
pub mod dispatcher;
pub mod error;
pub mod signature;
pub mod state;
pub mod transport;

pub use clock::{Clock, SystemClock};
pub use config::WebhookTarget;
pub use dispatcher::{SessionContext, WebhookDispatcher};
pub use error::{Result, WebhookError};
pub use transport::{ReqwestTransport, Transport};
