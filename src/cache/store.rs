use std::fmt::Display;
use std::sync::Arc;
use std::time::{Duration, Instant};

use moka::Expiry;

use crate::error::AppError;
use crate::error::AppResult;

const SEARCH_TTL: Duration = Duration::from_secs(60);
const RESOURCE_TTL: Duration = Duration::from_secs(3600);
const MAX_ENTRIES: u64 = 2048;

#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum CacheKind {
    /// A `search/*` request; results change with every keystroke and go stale fast
    Search,
    /// Any other upstream request
    Resource,
}

/// Identity of one upstream request
///
/// Parameters are kept as structured pairs, so no value can smuggle in a
/// separator and alias a different request.
#[derive(Debug, Clone, PartialEq, Eq, Hash)]
pub struct CacheKey {
    kind: CacheKind,
    endpoint: String,
    params: Vec<(String, String)>,
}

impl CacheKey {
    /// Builds the key for an upstream request. Parameters are sorted so that
    /// the same query in a different order shares an entry.
    pub fn for_request(endpoint: &str, params: &[(String, String)]) -> Self {
        let mut params = params.to_vec();
        params.sort();

        let kind = if endpoint.starts_with("search/") {
            CacheKind::Search
        } else {
            CacheKind::Resource
        };

        Self {
            kind,
            endpoint: endpoint.to_string(),
            params,
        }
    }

    pub fn kind(&self) -> CacheKind {
        self.kind
    }

    pub fn ttl(&self) -> Duration {
        match self.kind {
            CacheKind::Search => SEARCH_TTL,
            CacheKind::Resource => RESOURCE_TTL,
        }
    }
}

impl Display for CacheKey {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        let prefix = match self.kind {
            CacheKind::Search => "search",
            CacheKind::Resource => "tmdb",
        };
        write!(f, "{}:{}", prefix, self.endpoint)?;
        if !self.params.is_empty() {
            write!(f, " {:?}", self.params)?;
        }
        Ok(())
    }
}

#[derive(Debug, Clone)]
struct CacheEntry {
    json: Arc<str>,
    ttl: Duration,
}

/// Every entry lives for the ttl it was stored with
struct EntryTtl;

impl Expiry<CacheKey, CacheEntry> for EntryTtl {
    fn expire_after_create(
        &self,
        _key: &CacheKey,
        value: &CacheEntry,
        _created_at: Instant,
    ) -> Option<Duration> {
        Some(value.ttl)
    }

    fn expire_after_update(
        &self,
        _key: &CacheKey,
        value: &CacheEntry,
        _updated_at: Instant,
        _duration_until_expiry: Option<Duration>,
    ) -> Option<Duration> {
        Some(value.ttl)
    }
}

/// Process-local response cache with per-entry TTL and a bounded size.
#[derive(Clone)]
pub struct Cache {
    entries: moka::future::Cache<CacheKey, CacheEntry>,
}

impl Default for Cache {
    fn default() -> Self {
        Self::with_capacity(MAX_ENTRIES)
    }
}

impl Cache {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn with_capacity(max_entries: u64) -> Self {
        let entries = moka::future::Cache::builder()
            .max_capacity(max_entries)
            .expire_after(EntryTtl)
            .build();
        Self { entries }
    }

    /// Retrieves a value from the cache by key
    ///
    /// Returns `None` if the key is absent or its entry has expired.
    pub async fn get_from_cache<T: serde::de::DeserializeOwned>(
        &self,
        key: &CacheKey,
    ) -> AppResult<Option<T>> {
        let Some(entry) = self.entries.get(key).await else {
            return Ok(None);
        };

        let data = serde_json::from_str(&entry.json)
            .map_err(|e| AppError::Internal(format!("Cache deserialization error: {}", e)))?;
        tracing::debug!(key = %key, "Cache hit");
        Ok(Some(data))
    }

    /// Stores a value in the cache
    ///
    /// Serialization failures are logged and the value is simply not cached.
    pub async fn store<T: serde::Serialize>(&self, key: &CacheKey, value: &T, ttl: Duration) {
        let json = match serde_json::to_string(value) {
            Ok(j) => j,
            Err(e) => {
                tracing::error!(error = %e, "Cache serialization error");
                return;
            }
        };

        self.entries
            .insert(
                key.clone(),
                CacheEntry {
                    json: json.into(),
                    ttl,
                },
            )
            .await;
    }

    /// Number of live entries after pending evictions have been applied
    pub async fn len(&self) -> u64 {
        self.entries.run_pending_tasks().await;
        self.entries.entry_count()
    }

    pub async fn is_empty(&self) -> bool {
        self.len().await == 0
    }
}
