//! Shared transfer plumbing
//!
//! [`Transfers`] ties the credential resolver, the client cache and the
//! transport factory together. It is built once by the composition root and
//! shared by every upload and download in the process.

use std::sync::Arc;

use crate::cache::ClientCache;
use crate::credentials::CredentialResolver;
use crate::error::Result;
use crate::params::TransferParams;
use crate::traits::{ObjectTransport, Target, TransportFactory};

/// Cache of type-erased transport clients
pub type TransportCache = ClientCache<dyn ObjectTransport>;

/// Entry point for upload and download operations
pub struct Transfers {
    factory: Arc<dyn TransportFactory>,
    cache: Arc<TransportCache>,
    resolver: CredentialResolver,
}

impl Transfers {
    pub fn new(
        factory: Arc<dyn TransportFactory>,
        cache: Arc<TransportCache>,
        resolver: CredentialResolver,
    ) -> Self {
        Self {
            factory,
            cache,
            resolver,
        }
    }

    /// Transfers over the standard credential chain with a private cache
    pub fn with_factory(factory: Arc<dyn TransportFactory>) -> Self {
        Self::new(
            factory,
            Arc::new(ClientCache::new()),
            CredentialResolver::new(),
        )
    }

    pub fn cache(&self) -> &Arc<TransportCache> {
        &self.cache
    }

    /// Resolve credentials and fetch the cached client for `params`
    ///
    /// `fallback_region` is used when `params` names neither an endpoint nor
    /// a region.
    pub(crate) async fn client_for(
        &self,
        params: &TransferParams,
        fallback_region: Option<&str>,
    ) -> Result<Arc<dyn ObjectTransport>> {
        let credentials = self.resolver.resolve(params.credentials.as_ref())?;
        let target = Target::select(params.region().or(fallback_region), params.endpoint());
        let factory = Arc::clone(&self.factory);
        let (target_ref, credentials_ref) = (&target, &credentials);
        self.cache
            .get_or_create(&target, &credentials, move || async move {
                factory.connect(target_ref, credentials_ref).await
            })
            .await
    }
}
