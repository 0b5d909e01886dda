//! Search session coordination: debounce, TTL cache, single-flight, and
//! cancellation of superseded requests.
//!
//! One coordinator owns one logical search session per UI surface. The
//! lifecycle per request is `Idle → Debouncing → InFlight → {Completed |
//! Failed | Cancelled} → Idle`. The ordering guarantee is that the last
//! request the caller initiated always determines observed state: a
//! superseded request's response is discarded even if it arrives later.

use std::collections::HashMap;
use std::sync::{Arc, Mutex};
use std::time::Duration;

use chrono::{DateTime, Utc};
use serde::Serialize;
use tokio::sync::{broadcast, Mutex as AsyncMutex};

use rcfinder_core::{AppConfig, Coordinate, Region, SearchFilters, SortOption};
use rcfinder_geo::{LocationQuery, RegionResolver};

use crate::cache::TtlCache;
use crate::client::SearchBackend;
use crate::error::SearchError;
use crate::query::{build_query, SearchQuery};
use crate::ranker::{rank, RankedProvider};

#[derive(Debug, Clone)]
pub struct CoordinatorConfig {
    /// Quiet period after the last request before the network is touched.
    pub debounce: Duration,
    pub cache_ttl: Duration,
    pub cache_capacity: usize,
}

impl Default for CoordinatorConfig {
    fn default() -> Self {
        Self {
            debounce: Duration::from_millis(300),
            cache_ttl: Duration::from_secs(300),
            cache_capacity: 64,
        }
    }
}

impl CoordinatorConfig {
    #[must_use]
    pub fn from_app_config(config: &AppConfig) -> Self {
        Self {
            debounce: Duration::from_millis(config.search_debounce_ms),
            cache_ttl: Duration::from_secs(config.search_cache_ttl_secs),
            cache_capacity: config.search_cache_capacity,
        }
    }
}

/// Observable phase of the coordinator's current session.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum SearchPhase {
    Idle,
    Debouncing,
    InFlight,
    Completed,
    Failed,
    Cancelled,
}

/// The outcome of one provider search: ranked providers, the region covering
/// the reference location (when one does), and the fingerprint that produced
/// it. Cached by fingerprint until the TTL elapses.
#[derive(Debug, Clone, Serialize)]
pub struct SearchResult {
    pub providers: Vec<RankedProvider>,
    pub region: Option<Region>,
    pub fingerprint: String,
    pub fetched_at: DateTime<Utc>,
}

#[derive(Debug)]
struct Session {
    active_fingerprint: Option<String>,
    phase: SearchPhase,
}

/// Shared result sent to callers attached to the same in-flight request.
/// Errors cross the channel as strings; the issuing caller keeps the typed
/// original.
type SharedOutcome = Result<SearchResult, String>;

pub struct SearchCoordinator<B: SearchBackend> {
    backend: B,
    resolver: Arc<RegionResolver>,
    cache: TtlCache<SearchResult>,
    config: CoordinatorConfig,
    session: Mutex<Session>,
    pending: AsyncMutex<HashMap<String, broadcast::Sender<SharedOutcome>>>,
}

impl<B: SearchBackend> SearchCoordinator<B> {
    #[must_use]
    pub fn new(backend: B, resolver: Arc<RegionResolver>, config: CoordinatorConfig) -> Self {
        let cache = TtlCache::new(config.cache_ttl, config.cache_capacity);
        Self {
            backend,
            resolver,
            cache,
            config,
            session: Mutex::new(Session {
                active_fingerprint: None,
                phase: SearchPhase::Idle,
            }),
            pending: AsyncMutex::new(HashMap::new()),
        }
    }

    /// Run a search for `filters` anchored at `location`.
    ///
    /// The request debounces for the configured quiet period; a newer
    /// request with a different fingerprint supersedes it. A TTL-cache hit
    /// short-circuits straight to `Completed` without a network call, and
    /// concurrent requests for the same fingerprint share a single network
    /// call.
    ///
    /// # Errors
    ///
    /// - [`SearchError::InvalidInput`] — bad radius or location; synchronous, never retried.
    /// - [`SearchError::Superseded`] — a newer request took over the session.
    /// - upstream errors from the backend; failed requests are never cached.
    pub async fn search(
        &self,
        filters: &SearchFilters,
        location: Coordinate,
        sort: SortOption,
    ) -> Result<SearchResult, SearchError> {
        let query = build_query(filters, location)?;
        let fingerprint = query.fingerprint.clone();

        {
            let mut session = self.session.lock().expect("session lock poisoned");
            if let Some(previous) = &session.active_fingerprint {
                if *previous != fingerprint {
                    tracing::debug!(fingerprint = %fingerprint, "superseding active search session");
                }
            }
            session.active_fingerprint = Some(fingerprint.clone());
            session.phase = SearchPhase::Debouncing;
        }

        if let Some(hit) = self.cache.get(&fingerprint) {
            tracing::debug!(fingerprint = %fingerprint, "search served from cache");
            self.finish(&fingerprint, SearchPhase::Completed);
            return Ok(hit);
        }

        tokio::time::sleep(self.config.debounce).await;
        if !self.is_active(&fingerprint) {
            return Err(SearchError::Superseded);
        }

        // A request that debounced behind a completed one may find its
        // result already cached.
        if let Some(hit) = self.cache.get(&fingerprint) {
            self.finish(&fingerprint, SearchPhase::Completed);
            return Ok(hit);
        }

        let waiter = self.join_or_lead(&fingerprint).await;

        {
            let mut session = self.session.lock().expect("session lock poisoned");
            if session.active_fingerprint.as_deref() == Some(fingerprint.as_str()) {
                session.phase = SearchPhase::InFlight;
            }
        }

        let outcome = match waiter {
            Some(receiver) => Self::await_shared(&fingerprint, receiver).await,
            None => self.execute(&query, location, sort).await,
        };

        // Stale-response guard: only the currently active fingerprint may
        // determine observed state. A late response for a superseded
        // request is discarded here, however far it got.
        if !self.is_active(&fingerprint) {
            return Err(SearchError::Superseded);
        }
        match &outcome {
            Ok(_) => self.finish(&fingerprint, SearchPhase::Completed),
            Err(_) => self.finish(&fingerprint, SearchPhase::Failed),
        }
        outcome
    }

    /// Run a search immediately, without debounce or session tracking.
    ///
    /// For callers serving many independent clients (the HTTP surface),
    /// where one request must never supersede another. The cache and
    /// single-flight sharing still apply.
    ///
    /// # Errors
    ///
    /// Same as [`Self::search`], minus [`SearchError::Superseded`].
    pub async fn search_now(
        &self,
        filters: &SearchFilters,
        location: Coordinate,
        sort: SortOption,
    ) -> Result<SearchResult, SearchError> {
        let query = build_query(filters, location)?;
        let fingerprint = query.fingerprint.clone();

        if let Some(hit) = self.cache.get(&fingerprint) {
            tracing::debug!(fingerprint = %fingerprint, "search served from cache");
            return Ok(hit);
        }

        match self.join_or_lead(&fingerprint).await {
            Some(receiver) => Self::await_shared(&fingerprint, receiver).await,
            None => self.execute(&query, location, sort).await,
        }
    }

    /// Resolve the region for a location without running a search.
    ///
    /// # Errors
    ///
    /// Propagates [`rcfinder_core::CoreError`] validation failures.
    pub fn resolve_region(&self, query: &LocationQuery) -> Result<Option<Region>, SearchError> {
        Ok(self.resolver.resolve(query)?.cloned())
    }

    /// Cancel whatever the session is doing. Pending debounces and
    /// in-flight responses for the cancelled fingerprint are discarded.
    pub fn cancel_active(&self) {
        let mut session = self.session.lock().expect("session lock poisoned");
        if session.active_fingerprint.take().is_some() {
            session.phase = SearchPhase::Cancelled;
        } else {
            session.phase = SearchPhase::Idle;
        }
    }

    #[must_use]
    pub fn phase(&self) -> SearchPhase {
        self.session.lock().expect("session lock poisoned").phase
    }

    #[must_use]
    pub fn resolver(&self) -> &RegionResolver {
        &self.resolver
    }

    /// Leader path: issue the network call, rank, broadcast to attached
    /// waiters, and cache on success. Failures are never cached.
    async fn execute(
        &self,
        query: &SearchQuery,
        location: Coordinate,
        sort: SortOption,
    ) -> Result<SearchResult, SearchError> {
        let outcome = self.fetch_and_rank(query, location, sort).await;

        let mut pending = self.pending.lock().await;
        if let Some(sender) = pending.remove(&query.fingerprint) {
            let shared = match &outcome {
                Ok(result) => Ok(result.clone()),
                Err(err) => Err(err.to_string()),
            };
            // Send fails only when no waiter is attached, which is fine.
            let _ = sender.send(shared);
        }
        drop(pending);

        if let Ok(result) = &outcome {
            self.cache.insert(query.fingerprint.clone(), result.clone());
        }
        outcome
    }

    async fn fetch_and_rank(
        &self,
        query: &SearchQuery,
        location: Coordinate,
        sort: SortOption,
    ) -> Result<SearchResult, SearchError> {
        let raw = self.backend.search_providers(query).await?;
        tracing::debug!(
            fingerprint = %query.fingerprint,
            count = raw.len(),
            "provider search returned"
        );

        // Region resolution runs alongside the search over the same
        // location; a no-match region is not a search failure.
        let location_query = LocationQuery {
            coordinate: Some(location),
            zip: query.zip.clone(),
        };
        let region = self
            .resolver
            .resolve(&location_query)
            .ok()
            .flatten()
            .cloned();

        let ranked = rank(raw, location, sort);
        if ranked.has_partial_data() {
            tracing::debug!(
                fingerprint = %query.fingerprint,
                "one or more providers lack usable coordinates"
            );
        }

        Ok(SearchResult {
            providers: ranked.providers,
            region,
            fingerprint: query.fingerprint.clone(),
            fetched_at: Utc::now(),
        })
    }

    /// Single-flight gate: at most one network call per fingerprint.
    /// Returns `None` when this caller should lead (issue the call) or a
    /// receiver to attach to the already in-flight call.
    async fn join_or_lead(&self, fingerprint: &str) -> Option<broadcast::Receiver<SharedOutcome>> {
        let mut pending = self.pending.lock().await;
        match pending.get(fingerprint) {
            Some(sender) => Some(sender.subscribe()),
            None => {
                let (sender, _) = broadcast::channel(1);
                pending.insert(fingerprint.to_string(), sender);
                None
            }
        }
    }

    async fn await_shared(
        fingerprint: &str,
        mut receiver: broadcast::Receiver<SharedOutcome>,
    ) -> Result<SearchResult, SearchError> {
        tracing::debug!(fingerprint = %fingerprint, "attaching to in-flight request");
        match receiver.recv().await {
            Ok(Ok(result)) => Ok(result),
            Ok(Err(message)) => Err(SearchError::Upstream { message }),
            Err(_) => Err(SearchError::Upstream {
                message: "shared in-flight request was dropped".to_string(),
            }),
        }
    }

    fn is_active(&self, fingerprint: &str) -> bool {
        self.session
            .lock()
            .expect("session lock poisoned")
            .active_fingerprint
            .as_deref()
            == Some(fingerprint)
    }

    /// Record a terminal phase, but only if this fingerprint still owns the
    /// session.
    fn finish(&self, fingerprint: &str, phase: SearchPhase) {
        let mut session = self.session.lock().expect("session lock poisoned");
        if session.active_fingerprint.as_deref() == Some(fingerprint) {
            session.phase = phase;
        }
    }
}

#[cfg(test)]
mod tests {
    use std::path::Path;
    use std::sync::atomic::{AtomicU32, Ordering};

    use super::*;
    use rcfinder_core::Provider;

    const LOCATION: Coordinate = Coordinate::new(34.05, -118.25);

    struct MockBackend {
        calls: AtomicU32,
        fail_first: AtomicU32,
        delay: Duration,
        last_fingerprint: Mutex<Option<String>>,
    }

    impl MockBackend {
        fn new() -> Arc<Self> {
            Self::with_delay(Duration::ZERO)
        }

        fn with_delay(delay: Duration) -> Arc<Self> {
            Arc::new(Self {
                calls: AtomicU32::new(0),
                fail_first: AtomicU32::new(0),
                delay,
                last_fingerprint: Mutex::new(None),
            })
        }

        fn failing_first(n: u32) -> Arc<Self> {
            let backend = Self::new();
            backend.fail_first.store(n, Ordering::SeqCst);
            backend
        }

        fn calls(&self) -> u32 {
            self.calls.load(Ordering::SeqCst)
        }

        fn last_fingerprint(&self) -> Option<String> {
            self.last_fingerprint.lock().unwrap().clone()
        }

        fn sample_provider() -> Provider {
            Provider {
                id: "p1".to_string(),
                name: "Bright Steps Therapy".to_string(),
                provider_type: "clinic".to_string(),
                latitude: Some(34.06),
                longitude: Some(-118.25),
                address: None,
                phone: None,
                website: None,
                therapy_types: vec!["ABA therapy".to_string()],
                age_groups: vec![],
                diagnoses_treated: vec![],
                insurance_accepted: vec![],
            }
        }
    }

    impl SearchBackend for Arc<MockBackend> {
        async fn search_providers(
            &self,
            query: &SearchQuery,
        ) -> Result<Vec<Provider>, SearchError> {
            self.calls.fetch_add(1, Ordering::SeqCst);
            *self.last_fingerprint.lock().unwrap() = Some(query.fingerprint.clone());
            if self.delay > Duration::ZERO {
                tokio::time::sleep(self.delay).await;
            }
            let remaining = self.fail_first.load(Ordering::SeqCst);
            if remaining > 0 {
                self.fail_first.store(remaining - 1, Ordering::SeqCst);
                return Err(SearchError::UnexpectedStatus {
                    status: 503,
                    url: "https://api.example.test/providers".to_string(),
                });
            }
            Ok(vec![MockBackend::sample_provider()])
        }
    }

    fn real_resolver() -> Arc<RegionResolver> {
        let root = Path::new(env!("CARGO_MANIFEST_DIR")).join("..").join("..");
        Arc::new(
            RegionResolver::load(
                &root.join("config").join("regions.yaml"),
                &root.join("config").join("boundaries.geojson"),
            )
            .expect("bundled dataset must load"),
        )
    }

    fn coordinator(backend: Arc<MockBackend>) -> Arc<SearchCoordinator<Arc<MockBackend>>> {
        Arc::new(SearchCoordinator::new(
            backend,
            real_resolver(),
            CoordinatorConfig::default(),
        ))
    }

    fn filters_with_text(text: &str) -> SearchFilters {
        SearchFilters {
            free_text: Some(text.to_string()),
            ..SearchFilters::default()
        }
    }

    #[tokio::test(start_paused = true)]
    async fn debounced_search_fires_one_network_call() {
        let backend = MockBackend::new();
        let coord = coordinator(Arc::clone(&backend));

        let result = coord
            .search(&SearchFilters::default(), LOCATION, SortOption::Distance)
            .await
            .unwrap();
        assert_eq!(backend.calls(), 1);
        assert_eq!(result.providers.len(), 1);
        assert_eq!(coord.phase(), SearchPhase::Completed);
    }

    #[tokio::test(start_paused = true)]
    async fn rapid_keystrokes_collapse_to_the_last_fingerprint() {
        let backend = MockBackend::new();
        let coord = coordinator(Arc::clone(&backend));

        let c1 = Arc::clone(&coord);
        let first = tokio::spawn(async move {
            c1.search(&filters_with_text("900"), LOCATION, SortOption::Distance)
                .await
        });
        tokio::time::sleep(Duration::from_millis(100)).await;
        let c2 = Arc::clone(&coord);
        let second = tokio::spawn(async move {
            c2.search(&filters_with_text("90001"), LOCATION, SortOption::Distance)
                .await
        });

        let first = first.await.unwrap();
        let second = second.await.unwrap().unwrap();

        assert!(
            matches!(first, Err(SearchError::Superseded)),
            "superseded keystroke must not produce a result"
        );
        assert_eq!(backend.calls(), 1, "exactly one network call expected");
        assert_eq!(
            backend.last_fingerprint().as_deref(),
            Some(second.fingerprint.as_str()),
            "the call must carry the last keystroke's fingerprint"
        );
    }

    #[tokio::test(start_paused = true)]
    async fn superseded_in_flight_response_is_discarded() {
        let backend = MockBackend::with_delay(Duration::from_millis(500));
        let coord = coordinator(Arc::clone(&backend));

        let c1 = Arc::clone(&coord);
        let first = tokio::spawn(async move {
            c1.search(&filters_with_text("speech"), LOCATION, SortOption::Distance)
                .await
        });
        // Let the first request pass its debounce and reach the network.
        tokio::time::sleep(Duration::from_millis(350)).await;
        assert_eq!(coord.phase(), SearchPhase::InFlight);

        let c2 = Arc::clone(&coord);
        let second = tokio::spawn(async move {
            c2.search(&filters_with_text("aba"), LOCATION, SortOption::Distance)
                .await
        });

        let first = first.await.unwrap();
        let second = second.await.unwrap().unwrap();

        assert!(
            matches!(first, Err(SearchError::Superseded)),
            "a superseded request's late response must be discarded"
        );
        assert_eq!(backend.calls(), 2);
        assert_eq!(
            backend.last_fingerprint().as_deref(),
            Some(second.fingerprint.as_str()),
            "observed state must come from the superseding request"
        );
        assert_eq!(coord.phase(), SearchPhase::Completed);
    }

    #[tokio::test(start_paused = true)]
    async fn repeat_search_within_ttl_is_served_from_cache() {
        let backend = MockBackend::new();
        let coord = coordinator(Arc::clone(&backend));
        let filters = SearchFilters::default();

        let first = coord
            .search(&filters, LOCATION, SortOption::Distance)
            .await
            .unwrap();
        let second = coord
            .search(&filters, LOCATION, SortOption::Distance)
            .await
            .unwrap();

        assert_eq!(backend.calls(), 1, "cache hit must not touch the network");
        assert_eq!(first.fingerprint, second.fingerprint);
        assert_eq!(first.fetched_at, second.fetched_at, "same cached result");
        assert_eq!(coord.phase(), SearchPhase::Completed);
    }

    #[tokio::test(start_paused = true)]
    async fn cache_expires_after_ttl() {
        let backend = MockBackend::new();
        let coord = coordinator(Arc::clone(&backend));
        let filters = SearchFilters::default();

        coord
            .search(&filters, LOCATION, SortOption::Distance)
            .await
            .unwrap();
        tokio::time::advance(Duration::from_secs(301)).await;
        coord
            .search(&filters, LOCATION, SortOption::Distance)
            .await
            .unwrap();

        assert_eq!(backend.calls(), 2, "expired entry must be refetched");
    }

    #[tokio::test(start_paused = true)]
    async fn concurrent_same_fingerprint_searches_share_one_call() {
        let backend = MockBackend::with_delay(Duration::from_millis(50));
        let coord = coordinator(Arc::clone(&backend));

        let c1 = Arc::clone(&coord);
        let first = tokio::spawn(async move {
            c1.search(&SearchFilters::default(), LOCATION, SortOption::Distance)
                .await
        });
        tokio::time::sleep(Duration::from_millis(10)).await;
        let c2 = Arc::clone(&coord);
        let second = tokio::spawn(async move {
            c2.search(&SearchFilters::default(), LOCATION, SortOption::Distance)
                .await
        });

        let first = first.await.unwrap().unwrap();
        let second = second.await.unwrap().unwrap();

        assert_eq!(backend.calls(), 1, "single-flight must share one call");
        assert_eq!(first.fingerprint, second.fingerprint);
    }

    #[tokio::test(start_paused = true)]
    async fn failed_search_is_surfaced_and_never_cached() {
        let backend = MockBackend::failing_first(1);
        let coord = coordinator(Arc::clone(&backend));
        let filters = SearchFilters::default();

        let err = coord
            .search(&filters, LOCATION, SortOption::Distance)
            .await
            .unwrap_err();
        assert!(matches!(err, SearchError::UnexpectedStatus { .. }));
        assert_eq!(coord.phase(), SearchPhase::Failed);

        let result = coord
            .search(&filters, LOCATION, SortOption::Distance)
            .await
            .unwrap();
        assert_eq!(backend.calls(), 2, "failure must not be cached");
        assert_eq!(result.providers.len(), 1);
    }

    #[tokio::test(start_paused = true)]
    async fn cancel_discards_a_debouncing_search() {
        let backend = MockBackend::new();
        let coord = coordinator(Arc::clone(&backend));

        let c1 = Arc::clone(&coord);
        let handle = tokio::spawn(async move {
            c1.search(&SearchFilters::default(), LOCATION, SortOption::Distance)
                .await
        });
        tokio::time::sleep(Duration::from_millis(100)).await;
        coord.cancel_active();

        let result = handle.await.unwrap();
        assert!(matches!(result, Err(SearchError::Superseded)));
        assert_eq!(backend.calls(), 0, "cancelled search must not hit the network");
        assert_eq!(coord.phase(), SearchPhase::Cancelled);
    }

    #[tokio::test(start_paused = true)]
    async fn search_result_carries_resolved_region() {
        let backend = MockBackend::new();
        let coord = coordinator(Arc::clone(&backend));

        // Inside the ELARC catchment.
        let result = coord
            .search(
                &SearchFilters::default(),
                Coordinate::new(34.02, -118.08),
                SortOption::Distance,
            )
            .await
            .unwrap();
        assert_eq!(
            result.region.as_ref().map(|r| r.acronym.as_str()),
            Some("ELARC")
        );
    }

    #[tokio::test(start_paused = true)]
    async fn invalid_input_fails_fast_without_network() {
        let backend = MockBackend::new();
        let coord = coordinator(Arc::clone(&backend));
        let filters = SearchFilters {
            radius_miles: -1.0,
            ..SearchFilters::default()
        };

        let err = coord
            .search(&filters, LOCATION, SortOption::Distance)
            .await
            .unwrap_err();
        assert!(matches!(err, SearchError::InvalidInput(_)));
        assert_eq!(backend.calls(), 0);
    }

    #[tokio::test(start_paused = true)]
    async fn search_now_skips_the_debounce() {
        let backend = MockBackend::new();
        let coord = coordinator(Arc::clone(&backend));

        let before = tokio::time::Instant::now();
        let result = coord
            .search_now(&SearchFilters::default(), LOCATION, SortOption::Distance)
            .await
            .unwrap();
        assert_eq!(before.elapsed(), Duration::ZERO, "no debounce delay");
        assert_eq!(backend.calls(), 1);
        assert_eq!(result.providers.len(), 1);
    }

    #[tokio::test(start_paused = true)]
    async fn search_now_shares_the_cache_with_debounced_searches() {
        let backend = MockBackend::new();
        let coord = coordinator(Arc::clone(&backend));
        let filters = SearchFilters::default();

        coord
            .search_now(&filters, LOCATION, SortOption::Distance)
            .await
            .unwrap();
        coord
            .search(&filters, LOCATION, SortOption::Distance)
            .await
            .unwrap();
        assert_eq!(backend.calls(), 1);
    }

    #[tokio::test(start_paused = true)]
    async fn concurrent_search_now_calls_are_single_flighted() {
        let backend = MockBackend::with_delay(Duration::from_millis(50));
        let coord = coordinator(Arc::clone(&backend));

        let c1 = Arc::clone(&coord);
        let first = tokio::spawn(async move {
            c1.search_now(&SearchFilters::default(), LOCATION, SortOption::Distance)
                .await
        });
        tokio::time::sleep(Duration::from_millis(10)).await;
        let c2 = Arc::clone(&coord);
        let second = tokio::spawn(async move {
            c2.search_now(&SearchFilters::default(), LOCATION, SortOption::Distance)
                .await
        });

        let first = first.await.unwrap().unwrap();
        let second = second.await.unwrap().unwrap();
        assert_eq!(backend.calls(), 1);
        assert_eq!(first.fingerprint, second.fingerprint);
    }

    #[tokio::test(start_paused = true)]
    async fn resolve_region_passthrough() {
        let backend = MockBackend::new();
        let coord = coordinator(backend);
        let region = coord
            .resolve_region(&LocationQuery::from_zip("90001"))
            .unwrap()
            .unwrap();
        assert_eq!(region.acronym, "SCLARC");
    }
}
