//! Current-client holder
//!
//! A refresh builds a complete new [`ApiClient`] before swapping it in, so a
//! reader holding a snapshot never sees a half-discovered backend.

use std::sync::Arc;

use parking_lot::RwLock;
use serde_json::Value;
use tracing::{info, warn};

use crate::Result;
use crate::client::{ApiClient, RequestDefaults};
use crate::document::DocumentLoader;
use crate::transport::Transport;

/// Where the description document comes from
pub enum DocumentSource {
    /// Fetched from the backend through the loader
    Remote(DocumentLoader),
    /// Supplied up front (e.g. read from a local file)
    Fixed(Value),
}

/// Holds the active client for one backend
pub struct Session {
    base_url: String,
    source: DocumentSource,
    transport: Arc<dyn Transport>,
    defaults: RequestDefaults,
    current: RwLock<Option<Arc<ApiClient>>>,
}

impl Session {
    /// Create a session; nothing is fetched until [`Session::connect`]
    pub fn new(
        base_url: impl Into<String>,
        source: DocumentSource,
        transport: Arc<dyn Transport>,
        defaults: RequestDefaults,
    ) -> Self {
        Self {
            base_url: base_url.into(),
            source,
            transport,
            defaults,
            current: RwLock::new(None),
        }
    }

    /// Load the document, discover, then swap the new client in.
    ///
    /// On failure the previous client stays active.
    pub async fn connect(&self, force: bool) -> Result<Arc<ApiClient>> {
        let document = match &self.source {
            DocumentSource::Remote(loader) => loader.load(force).await,
            DocumentSource::Fixed(document) => Ok(document.clone()),
        };

        let built = document.and_then(|document| {
            ApiClient::new(
                document,
                self.base_url.clone(),
                Arc::clone(&self.transport),
                self.defaults,
            )
        });

        match built {
            Ok(client) => {
                let client = Arc::new(client);
                *self.current.write() = Some(Arc::clone(&client));
                info!(
                    base_url = %self.base_url,
                    operations = client.operations().len(),
                    capabilities = client.capabilities().len(),
                    "Connected"
                );
                Ok(client)
            }
            Err(e) => {
                warn!(base_url = %self.base_url, error = %e, "Refresh failed; keeping previous client");
                Err(e)
            }
        }
    }

    /// Snapshot of the active client, if any
    #[must_use]
    pub fn client(&self) -> Option<Arc<ApiClient>> {
        self.current.read().clone()
    }
}
