//! Transport client cache
//!
//! Holds one client per distinct region and one per distinct endpoint so
//! that sequential transfers to the same target reuse a warm client. Entries
//! live as long as the cache and are never evicted.

use std::collections::HashMap;
use std::future::Future;
use std::sync::Arc;

use tokio::sync::Mutex;

use crate::credentials::CredentialSpec;
use crate::error::Result;
use crate::traits::Target;

struct CacheEntry<C: ?Sized> {
    client: Arc<C>,
    credentials: CredentialSpec,
}

type Slots<C> = Mutex<HashMap<Option<String>, CacheEntry<C>>>;

/// Registry of transport clients keyed by region or endpoint
pub struct ClientCache<C: ?Sized> {
    regions: Slots<C>,
    endpoints: Slots<C>,
}

impl<C: ?Sized> ClientCache<C> {
    pub fn new() -> Self {
        Self {
            regions: Mutex::new(HashMap::new()),
            endpoints: Mutex::new(HashMap::new()),
        }
    }

    /// Return the client for `target`, building it with `factory` on first use
    ///
    /// A hit returns the stored client even if `credentials` differ from the
    /// ones it was built with; the mismatch is only logged. The map stays
    /// locked while `factory` runs, so one key never gets two clients.
    pub async fn get_or_create<F, Fut>(
        &self,
        target: &Target,
        credentials: &CredentialSpec,
        factory: F,
    ) -> Result<Arc<C>>
    where
        F: FnOnce() -> Fut,
        Fut: Future<Output = Result<Arc<C>>>,
    {
        let (slots, key) = match target {
            Target::Region(region) => (&self.regions, region.clone()),
            Target::Endpoint(endpoint) => (&self.endpoints, Some(endpoint.clone())),
        };

        let mut slots = slots.lock().await;
        if let Some(entry) = slots.get(&key) {
            if entry.credentials != *credentials {
                tracing::warn!(
                    %target,
                    "Reusing cached client built with different credentials"
                );
            }
            return Ok(Arc::clone(&entry.client));
        }

        tracing::debug!(%target, "Creating transport client");
        let client = factory().await?;
        slots.insert(
            key,
            CacheEntry {
                client: Arc::clone(&client),
                credentials: credentials.clone(),
            },
        );
        Ok(client)
    }

    /// Number of cached clients across both maps
    pub async fn len(&self) -> usize {
        self.regions.lock().await.len() + self.endpoints.lock().await.len()
    }

    pub async fn is_empty(&self) -> bool {
        self.len().await == 0
    }
}

impl<C: ?Sized> Default for ClientCache<C> {
    fn default() -> Self {
        Self::new()
    }
}
