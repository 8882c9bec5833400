use std::collections::HashMap;
use std::sync::Arc;
use tokio::sync::Mutex;

use crate::providers::DefinitionProvider;
use crate::types::{RangeInFile, ResolutionQuery};

/// The single chokepoint between the crawler and the external
/// definition-resolution provider.
///
/// Every query is memoized by its exact `(kind, filepath, line, column)`
/// tuple for the lifetime of this resolver, so repeat queries within one
/// aggregation pass never re-invoke the provider. Misses and provider errors
/// are cached as empty too — a failed call is "no result", not transient, and
/// one crawl must see a consistent snapshot.
///
/// The cache is only touched from a single cooperative flow; the mutex exists
/// to allow `&self` access, not for contention.
pub struct CachedResolver {
    provider: Arc<dyn DefinitionProvider>,
    cache: Mutex<HashMap<ResolutionQuery, Vec<RangeInFile>>>,
}

impl CachedResolver {
    pub fn new(provider: Arc<dyn DefinitionProvider>) -> Self {
        Self {
            provider,
            cache: Mutex::new(HashMap::new()),
        }
    }

    /// All locations for `query`, cached. Fail-open: a provider error is
    /// logged as a warning and collapsed to an empty result. The empty result
    /// is cached, so each failing query warns at most once per crawl.
    pub async fn resolve(&self, query: &ResolutionQuery) -> Vec<RangeInFile> {
        if let Some(hit) = self.cache.lock().await.get(query) {
            debug_log!("[resolver] cache hit: {:?}", query);
            return hit.clone();
        }

        let resolved = match self
            .provider
            .resolve(query.kind, &query.filepath, query.position)
            .await
        {
            Ok(locations) => locations,
            Err(e) => {
                log::warn!(
                    "resolution failed for {:?} {}:{}:{}: {e:#}",
                    query.kind,
                    query.filepath,
                    query.position.line,
                    query.position.column
                );
                Vec::new()
            }
        };

        self.cache
            .lock()
            .await
            .insert(query.clone(), resolved.clone());
        resolved
    }

    /// First location for `query`, or `None`. The providers may return many
    /// candidates; the crawl only ever follows the first.
    pub async fn resolve_first(&self, query: &ResolutionQuery) -> Option<RangeInFile> {
        self.resolve(query).await.into_iter().next()
    }
}

// ─────────────────────────────────────────────────────────────────────────────
// Tests
// ─────────────────────────────────────────────────────────────────────────────
