//! Application state shared across handlers

use std::sync::Arc;

use common_db::{ConnectionManager, Repository};

use crate::http::Dispatcher;

/// Shared application state
#[derive(Clone)]
pub struct AppState {
    inner: Arc<AppStateInner>,
}

struct AppStateInner {
    repo: Repository,
    dispatcher: Dispatcher,
}

impl AppState {
    pub fn new(manager: Arc<ConnectionManager>, dispatcher: Dispatcher) -> Self {
        Self {
            inner: Arc::new(AppStateInner {
                repo: Repository::new(manager),
                dispatcher,
            }),
        }
    }

    pub fn repo(&self) -> &Repository {
        &self.inner.repo
    }

    pub fn manager(&self) -> &Arc<ConnectionManager> {
        self.inner.repo.manager()
    }

    pub fn dispatcher(&self) -> &Dispatcher {
        &self.inner.dispatcher
    }
}
