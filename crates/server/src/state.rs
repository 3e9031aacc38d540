use std::sync::Arc;

use service::{storage::UserStore, user_service::UserService};

/// Shared handler state. Cloned per request; clones share one store handle.
#[derive(Clone)]
pub struct AppState {
    pub users: UserService,
}

impl AppState {
    pub fn new(store: Arc<dyn UserStore>) -> Self {
        Self { users: UserService::new(store) }
    }
}
