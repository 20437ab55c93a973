//! Process-wide cache of the identity provider's signing keys.
//!
//! Keys are looked up by key id (`kid`). A miss triggers a fetch of the
//! provider's key set, which replaces the cached set wholesale so keys the
//! provider has dropped stop verifying. With no TTL configured a cached key is
//! trusted until process restart; set `JWKS_CACHE_TTL_SECS` to bound that.
//!
//! Misses are the one path an unauthenticated caller controls (any made-up
//! `kid`), so fetches are single-flight and at most one per minimum refresh
//! interval. A miss inside that interval is answered from the cache alone.

use std::collections::HashMap;
use std::sync::Arc;
use std::time::{Duration, Instant};

use async_trait::async_trait;
use jsonwebtoken::jwk::{Jwk, JwkSet};
use tokio::sync::{Mutex, RwLock};

use super::AuthError;

/// HTTP timeout for a single key-set fetch.
const FETCH_TIMEOUT: Duration = Duration::from_secs(10);

/// Default shortest gap between two key-set fetches.
pub const DEFAULT_MIN_REFRESH: Duration = Duration::from_secs(60);

/// Source of the current time, injectable so tests can age cache entries.
pub trait Clock: Send + Sync {
    fn now(&self) -> Instant;
}

/// Wall-clock [`Clock`].
pub struct SystemClock;

impl Clock for SystemClock {
    fn now(&self) -> Instant {
        Instant::now()
    }
}

/// Where signing keys come from.
#[async_trait]
pub trait KeySource: Send + Sync {
    async fn fetch(&self) -> Result<JwkSet, AuthError>;
}

/// Fetches a JWKS document over HTTP.
pub struct JwksHttpSource {
    client: reqwest::Client,
    url: String,
}

impl JwksHttpSource {
    pub fn new(url: impl Into<String>) -> Result<Self, reqwest::Error> {
        let client = reqwest::Client::builder().timeout(FETCH_TIMEOUT).build()?;
        Ok(Self {
            client,
            url: url.into(),
        })
    }
}

#[async_trait]
impl KeySource for JwksHttpSource {
    async fn fetch(&self) -> Result<JwkSet, AuthError> {
        let response = self
            .client
            .get(&self.url)
            .send()
            .await
            .map_err(|e| AuthError::KeyFetch(e.to_string()))?;

        if !response.status().is_success() {
            return Err(AuthError::KeyFetch(format!(
                "key set endpoint returned HTTP {}",
                response.status().as_u16()
            )));
        }

        response
            .json::<JwkSet>()
            .await
            .map_err(|e| AuthError::KeyFetch(e.to_string()))
    }
}

struct CachedKey {
    jwk: Jwk,
    fetched_at: Instant,
}

/// Signing keys by key id, filled lazily from a [`KeySource`].
pub struct KeyCache {
    source: Arc<dyn KeySource>,
    clock: Arc<dyn Clock>,
    ttl: Option<Duration>,
    min_refresh: Duration,
    keys: RwLock<HashMap<String, CachedKey>>,
    /// Held for the whole of a fetch; holds the time of the last attempt.
    last_fetch: Mutex<Option<Instant>>,
}

impl KeyCache {
    pub fn new(source: Arc<dyn KeySource>, clock: Arc<dyn Clock>, ttl: Option<Duration>) -> Self {
        Self {
            source,
            clock,
            ttl,
            min_refresh: DEFAULT_MIN_REFRESH,
            keys: RwLock::new(HashMap::new()),
            last_fetch: Mutex::new(None),
        }
    }

    /// Set the shortest gap between fetches. Never longer than the TTL, so an
    /// expired key can always be refetched.
    pub fn with_min_refresh(mut self, min_refresh: Duration) -> Self {
        self.min_refresh = min_refresh;
        self
    }

    /// The key for `kid`, fetching the key set if it is not cached or stale
    /// and the last fetch is old enough.
    pub async fn get(&self, kid: &str) -> Result<Jwk, AuthError> {
        if let Some(jwk) = self.lookup(kid).await {
            return Ok(jwk);
        }

        let mut last_fetch = self.last_fetch.lock().await;

        // Another request may have fetched while this one waited.
        if let Some(jwk) = self.lookup(kid).await {
            return Ok(jwk);
        }

        let now = self.clock.now();
        let min_gap = self.effective_min_refresh();
        let throttled = last_fetch.is_some_and(|at| now.duration_since(at) < min_gap);
        if throttled {
            tracing::debug!(kid, "Signing key miss within refresh interval, not refetching");
        } else {
            *last_fetch = Some(now);
            self.fetch_and_replace().await?;
        }
        drop(last_fetch);

        self.lookup(kid)
            .await
            .ok_or_else(|| AuthError::TokenInvalid(format!("unknown signing key '{kid}'")))
    }

    /// Replace the cached keys with a freshly fetched set, regardless of
    /// the refresh interval.
    pub async fn refresh(&self) -> Result<(), AuthError> {
        let mut last_fetch = self.last_fetch.lock().await;
        *last_fetch = Some(self.clock.now());
        self.fetch_and_replace().await
    }

    fn effective_min_refresh(&self) -> Duration {
        match self.ttl {
            Some(ttl) => ttl.min(self.min_refresh),
            None => self.min_refresh,
        }
    }

    /// Callers hold `last_fetch`.
    async fn fetch_and_replace(&self) -> Result<(), AuthError> {
        let set = self.source.fetch().await?;
        let fetched_at = self.clock.now();

        let fresh: HashMap<String, CachedKey> = set
            .keys
            .into_iter()
            .filter_map(|jwk| {
                let kid = jwk.common.key_id.clone()?;
                Some((kid, CachedKey { jwk, fetched_at }))
            })
            .collect();
        tracing::info!(keys = fresh.len(), "Refreshed federated signing keys");

        *self.keys.write().await = fresh;
        Ok(())
    }

    /// Number of cached keys, stale or not.
    pub async fn len(&self) -> usize {
        self.keys.read().await.len()
    }

    pub async fn is_empty(&self) -> bool {
        self.len().await == 0
    }

    async fn lookup(&self, kid: &str) -> Option<Jwk> {
        let keys = self.keys.read().await;
        let cached = keys.get(kid)?;
        match self.ttl {
            Some(ttl) if self.clock.now().duration_since(cached.fetched_at) >= ttl => None,
            _ => Some(cached.jwk.clone()),
        }
    }
}

#[cfg(test)]
pub(crate) mod tests {
    use std::sync::atomic::{AtomicUsize, Ordering};
    use std::sync::Mutex;

    use super::*;

    /// A clock that only moves when told to.
    pub(crate) struct ManualClock {
        now: Mutex<Instant>,
    }

    impl ManualClock {
        pub(crate) fn new() -> Self {
            Self {
                now: Mutex::new(Instant::now()),
            }
        }

        pub(crate) fn advance(&self, by: Duration) {
            *self.now.lock().unwrap() += by;
        }
    }

    impl Clock for ManualClock {
        fn now(&self) -> Instant {
            *self.now.lock().unwrap()
        }
    }

    /// Serves a swappable key set and counts fetches.
    pub(crate) struct StaticSource {
        set: Mutex<JwkSet>,
        pub(crate) fetches: AtomicUsize,
    }

    impl StaticSource {
        pub(crate) fn new(set: JwkSet) -> Self {
            Self {
                set: Mutex::new(set),
                fetches: AtomicUsize::new(0),
            }
        }

        pub(crate) fn replace(&self, set: JwkSet) {
            *self.set.lock().unwrap() = set;
        }
    }

    #[async_trait]
    impl KeySource for StaticSource {
        async fn fetch(&self) -> Result<JwkSet, AuthError> {
            self.fetches.fetch_add(1, Ordering::SeqCst);
            Ok(self.set.lock().unwrap().clone())
        }
    }

    struct FailingSource;

    #[async_trait]
    impl KeySource for FailingSource {
        async fn fetch(&self) -> Result<JwkSet, AuthError> {
            Err(AuthError::KeyFetch("connection refused".into()))
        }
    }

    pub(crate) fn key_set(kids: &[&str]) -> JwkSet {
        let keys = kids
            .iter()
            .map(|kid| {
                serde_json::json!({
                    "kty": "oct",
                    "kid": kid,
                    "k": "c2VjcmV0",
                })
            })
            .collect::<Vec<_>>();
        serde_json::from_value(serde_json::json!({ "keys": keys })).unwrap()
    }

    #[tokio::test]
    async fn miss_fetches_once_then_hits() {
        let source = Arc::new(StaticSource::new(key_set(&["a", "b"])));
        let cache = KeyCache::new(source.clone(), Arc::new(ManualClock::new()), None);

        assert!(cache.is_empty().await);
        cache.get("a").await.unwrap();
        cache.get("b").await.unwrap();
        cache.get("a").await.unwrap();

        assert_eq!(source.fetches.load(Ordering::SeqCst), 1);
        assert_eq!(cache.len().await, 2);
    }

    #[tokio::test]
    async fn unknown_kid_is_invalid_after_refetch() {
        let source = Arc::new(StaticSource::new(key_set(&["a"])));
        let cache = KeyCache::new(source.clone(), Arc::new(ManualClock::new()), None);

        let err = cache.get("zzz").await.unwrap_err();
        assert!(matches!(err, AuthError::TokenInvalid(_)));
        assert_eq!(source.fetches.load(Ordering::SeqCst), 1);
    }

    #[tokio::test]
    async fn without_ttl_rotated_out_key_stays_trusted() {
        let source = Arc::new(StaticSource::new(key_set(&["old"])));
        let clock = Arc::new(ManualClock::new());
        let cache = KeyCache::new(source.clone(), clock.clone(), None);

        cache.get("old").await.unwrap();
        source.replace(key_set(&["new"]));
        clock.advance(Duration::from_secs(30 * 86_400));

        assert!(cache.get("old").await.is_ok());
        assert_eq!(source.fetches.load(Ordering::SeqCst), 1);
    }

    #[tokio::test]
    async fn ttl_expiry_picks_up_rotation() {
        let source = Arc::new(StaticSource::new(key_set(&["old"])));
        let clock = Arc::new(ManualClock::new());
        let cache = KeyCache::new(source.clone(), clock.clone(), Some(Duration::from_secs(3600)));

        cache.get("old").await.unwrap();
        source.replace(key_set(&["new"]));

        clock.advance(Duration::from_secs(3599));
        assert!(cache.get("old").await.is_ok());
        assert_eq!(source.fetches.load(Ordering::SeqCst), 1);

        clock.advance(Duration::from_secs(1));
        assert!(matches!(
            cache.get("old").await.unwrap_err(),
            AuthError::TokenInvalid(_)
        ));
        assert!(cache.get("new").await.is_ok());
        assert_eq!(source.fetches.load(Ordering::SeqCst), 2);
    }

    #[tokio::test]
    async fn unknown_kids_refetch_at_most_once_per_interval() {
        let source = Arc::new(StaticSource::new(key_set(&["a"])));
        let clock = Arc::new(ManualClock::new());
        let cache = KeyCache::new(source.clone(), clock.clone(), None)
            .with_min_refresh(Duration::from_secs(60));

        cache.get("a").await.unwrap();
        for i in 0..50 {
            let err = cache.get(&format!("bogus-{i}")).await.unwrap_err();
            assert!(matches!(err, AuthError::TokenInvalid(_)));
        }
        assert_eq!(source.fetches.load(Ordering::SeqCst), 1);

        // A key rotated in becomes reachable once the interval has passed.
        source.replace(key_set(&["a", "b"]));
        assert!(cache.get("b").await.is_err());
        clock.advance(Duration::from_secs(60));
        assert!(cache.get("b").await.is_ok());
        assert_eq!(source.fetches.load(Ordering::SeqCst), 2);
    }

    #[tokio::test]
    async fn concurrent_misses_share_one_fetch() {
        let source = Arc::new(StaticSource::new(key_set(&["a"])));
        let cache = Arc::new(KeyCache::new(source.clone(), Arc::new(ManualClock::new()), None));

        let lookups = (0..20).map(|i| {
            let cache = cache.clone();
            tokio::spawn(async move {
                let kid = if i % 2 == 0 { "a".to_string() } else { format!("bogus-{i}") };
                cache.get(&kid).await.is_ok()
            })
        });
        let mut found = 0;
        for lookup in lookups.collect::<Vec<_>>() {
            if lookup.await.unwrap() {
                found += 1;
            }
        }

        assert_eq!(found, 10);
        assert_eq!(source.fetches.load(Ordering::SeqCst), 1);
    }

    #[tokio::test]
    async fn explicit_refresh_ignores_interval() {
        let source = Arc::new(StaticSource::new(key_set(&["a"])));
        let cache = KeyCache::new(source.clone(), Arc::new(ManualClock::new()), None);

        cache.get("a").await.unwrap();
        source.replace(key_set(&["b"]));
        cache.refresh().await.unwrap();

        assert!(cache.get("b").await.is_ok());
        assert_eq!(source.fetches.load(Ordering::SeqCst), 2);
    }

    #[tokio::test]
    async fn fetch_failure_surfaces_as_key_fetch() {
        let cache = KeyCache::new(Arc::new(FailingSource), Arc::new(SystemClock), None);
        assert!(matches!(
            cache.get("a").await.unwrap_err(),
            AuthError::KeyFetch(_)
        ));
    }
}
