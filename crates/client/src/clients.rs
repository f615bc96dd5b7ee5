//! The pair of backend clients and the rule for choosing between them.

use crate::config::BackendConfig;
use crate::error::ClientResult;
use crate::postgrest::PostgrestClient;
use std::sync::Arc;
use supamcp_core::Backend;
use tracing::info;

/// Restricted-privilege client plus an optional elevated one.
#[derive(Debug, Clone)]
pub struct BackendClients {
    restricted: Arc<PostgrestClient>,
    elevated: Option<Arc<PostgrestClient>>,
}

impl BackendClients {
    /// Build both clients from configuration.
    pub fn connect(config: &BackendConfig) -> ClientResult<Self> {
        let restricted = Arc::new(PostgrestClient::new(&config.url, &config.anon_key)?);
        let elevated = config
            .service_role_key
            .as_deref()
            .map(|key| PostgrestClient::new(&config.url, key).map(Arc::new))
            .transpose()?;

        info!(
            url = %config.url,
            elevated = elevated.is_some(),
            "Backend clients configured"
        );

        Ok(Self {
            restricted,
            elevated,
        })
    }

    /// Whether reads go through the elevated client.
    pub fn is_elevated(&self) -> bool {
        self.elevated.is_some()
    }

    /// The client used for all reads: elevated when configured, restricted
    /// otherwise.
    pub fn reader(&self) -> Arc<dyn Backend> {
        self.elevated.as_ref().unwrap_or(&self.restricted).clone()
    }
}
