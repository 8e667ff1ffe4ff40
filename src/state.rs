use std::sync::Arc;

use crate::auth::{IdentityResolver, JwtSessionResolver};
use crate::config::AppConfig;
use crate::database::DataStore;
use crate::observer::{AccessObserver, LoggingObserver};

/// Collaborators shared by every request. Cloning is cheap.
#[derive(Clone)]
pub struct AppState {
    pub config: Arc<AppConfig>,
    pub store: Arc<dyn DataStore>,
    pub identity: Arc<dyn IdentityResolver>,
    pub observer: Arc<dyn AccessObserver>,
}

impl AppState {
    pub fn new(
        config: AppConfig,
        store: Arc<dyn DataStore>,
        identity: Arc<dyn IdentityResolver>,
        observer: Arc<dyn AccessObserver>,
    ) -> Self {
        Self { config: Arc::new(config), store, identity, observer }
    }

    /// JWT session verification and tracing output driven by `config`.
    pub fn from_config(config: AppConfig, store: Arc<dyn DataStore>) -> Self {
        let identity = Arc::new(JwtSessionResolver::new(
            config.security.jwt_secret.clone(),
            config.security.session_cookie.clone(),
        ));
        let observer = Arc::new(LoggingObserver::new(config.security.enable_audit_logging));
        Self::new(config, store, identity, observer)
    }
}
