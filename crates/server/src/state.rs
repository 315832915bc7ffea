//! Application state shared across handlers.

use std::sync::Arc;

use crate::config::RegistryConfig;
use crate::db::ClientStore;
use crate::services::ClientService;

/// Application state shared across all handlers.
///
/// This struct is cheaply cloneable via `Arc` and provides access to
/// the configuration and the client store.
#[derive(Clone)]
pub struct AppState {
    inner: Arc<AppStateInner>,
}

struct AppStateInner {
    config: RegistryConfig,
    clients: Arc<dyn ClientStore>,
}

impl AppState {
    /// Create a new application state.
    ///
    /// # Arguments
    ///
    /// * `config` - Server configuration
    /// * `clients` - Client store (the `PostgreSQL` repository in production)
    #[must_use]
    pub fn new(config: RegistryConfig, clients: Arc<dyn ClientStore>) -> Self {
        Self {
            inner: Arc::new(AppStateInner { config, clients }),
        }
    }

    /// Get a reference to the server configuration.
    #[must_use]
    pub fn config(&self) -> &RegistryConfig {
        &self.inner.config
    }

    /// Get a reference to the client store.
    #[must_use]
    pub fn clients(&self) -> &dyn ClientStore {
        self.inner.clients.as_ref()
    }

    /// Client service over this state's store.
    #[must_use]
    pub fn client_service(&self) -> ClientService<'_> {
        ClientService::new(self.clients())
    }
}
