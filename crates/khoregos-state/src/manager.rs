//! `StateManager` — session, agent, and per-session context lifecycle on
//! top of [`khoregos_store::Store`] (`spec.md` §4.4).

use std::sync::Arc;

use khoregos_store::Store;

pub struct StateManager {
    pub(crate) store: Arc<Store>,
}

impl StateManager {
    pub fn new(store: Arc<Store>) -> Self {
        Self { store }
    }
}
