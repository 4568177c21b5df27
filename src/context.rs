use anyhow::Result;

use crate::access::AccessGate;
use crate::auth::AuthManager;
use crate::config::Config;
use crate::directory::{ProjectDirectory, UserDirectory};
use crate::handlers::rooms::RoomRegistry;
use crate::service::MessageService;
use crate::store::MessageStore;
use std::sync::Arc;

/// Application context containing shared dependencies.
///
/// Built once in `run()` (or by tests) and handed to both the REST router and
/// the WebSocket accept loop; there is no process-wide registry.
#[derive(Clone)]
pub struct AppContext {
    pub config: Arc<Config>,
    pub auth_manager: Arc<AuthManager>,
    pub store: Arc<dyn MessageStore>,
    pub access: AccessGate,
    pub rooms: Arc<RoomRegistry>,
    pub messages: Arc<MessageService>,
}

impl AppContext {
    pub fn new(
        config: Arc<Config>,
        auth_manager: Arc<AuthManager>,
        store: Arc<dyn MessageStore>,
        access: AccessGate,
        rooms: Arc<RoomRegistry>,
        messages: Arc<MessageService>,
    ) -> Self {
        Self {
            config,
            auth_manager,
            store,
            access,
            rooms,
            messages,
        }
    }

    /// Wire the services together over the given store and directories
    pub fn build(
        config: Arc<Config>,
        store: Arc<dyn MessageStore>,
        users: Arc<dyn UserDirectory>,
        projects: Arc<dyn ProjectDirectory>,
    ) -> Result<Self> {
        let auth_manager = Arc::new(AuthManager::new(&config)?);
        let access = AccessGate::new(projects);
        let rooms = Arc::new(RoomRegistry::new());
        let messages = Arc::new(MessageService::new(
            store.clone(),
            users,
            access.clone(),
            rooms.clone(),
            config.logging.clone(),
        ));

        Ok(Self::new(
            config,
            auth_manager,
            store,
            access,
            rooms,
            messages,
        ))
    }
}
