use std::{fmt, sync::Arc};

use pollcast_core::{
    application::{PollServices, unit_of_work::PollUnitOfWork},
    database::InMemoryPollStore,
};

use crate::infra::config::Config;
use crate::infra::websocket::ConnectionManager;

#[derive(Clone)]
pub struct AppState {
    pub config: Arc<Config>,
    pub services: PollServices,
    pub websocket_manager: Arc<ConnectionManager>,
}

impl fmt::Debug for AppState {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("AppState")
            .field("storage", &self.config.storage.backend)
            .field("websocket_manager", &self.websocket_manager)
            .finish_non_exhaustive()
    }
}

impl AppState {
    /// Wire the core services against `uow`, with a fresh broadcast hub as
    /// their room registry.
    pub fn new(config: Arc<Config>, uow: PollUnitOfWork) -> Self {
        let websocket_manager = Arc::new(ConnectionManager::new());
        let services = PollServices::new(uow, websocket_manager.clone());
        Self {
            config,
            services,
            websocket_manager,
        }
    }

    pub fn in_memory(config: Arc<Config>) -> Self {
        Self::new(
            config,
            PollUnitOfWork::in_memory(Arc::new(InMemoryPollStore::new())),
        )
    }
}
