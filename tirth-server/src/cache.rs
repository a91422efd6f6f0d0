//! Caching layer in front of a [`DataSource`].
//!
//! Site lookups dominate traffic: the planner and near-point queries read
//! the whole collection on every call. The full snapshot and single-site
//! lookups are cached with a TTL. Every site write drops both; a read that
//! overlaps a write may return the older data but never caches it.

use std::sync::Arc;
use std::sync::atomic::{AtomicU64, Ordering};
use std::time::Duration;

use async_trait::async_trait;
use chrono::NaiveDate;
use moka::future::Cache as MokaCache;
use tracing::debug;

use crate::domain::{
    Denomination, Event, NewReview, NewRoute, NewSite, Review, Route, Site, SiteUpdate,
    UserPreferences, UserProfile,
};
use crate::gateway::{DataSource, GatewayError, Page, PageRequest};

/// Configuration for the cache.
#[derive(Debug, Clone)]
pub struct CacheConfig {
    /// TTL for cached entries.
    pub ttl: Duration,

    /// Maximum number of cached single-site entries.
    pub max_capacity: u64,
}

impl Default for CacheConfig {
    fn default() -> Self {
        Self {
            ttl: Duration::from_secs(60),
            max_capacity: 1000,
        }
    }
}

impl CacheConfig {
    pub fn with_ttl(mut self, ttl: Duration) -> Self {
        self.ttl = ttl;
        self
    }
}

/// Site caches.
struct SiteCache {
    /// Whole collection, under a single unit key.
    snapshot: MokaCache<(), Arc<Vec<Site>>>,

    /// Individual sites by id.
    sites: MokaCache<String, Site>,

    /// Bumped by every invalidation.
    generation: AtomicU64,
}

impl SiteCache {
    fn new(config: &CacheConfig) -> Self {
        Self {
            snapshot: MokaCache::builder()
                .time_to_live(config.ttl)
                .max_capacity(1)
                .build(),
            sites: MokaCache::builder()
                .time_to_live(config.ttl)
                .max_capacity(config.max_capacity)
                .build(),
            generation: AtomicU64::new(0),
        }
    }

    fn generation(&self) -> u64 {
        self.generation.load(Ordering::SeqCst)
    }

    fn invalidate_all(&self) {
        self.generation.fetch_add(1, Ordering::SeqCst);
        self.snapshot.invalidate_all();
        self.sites.invalidate_all();
    }

    /// Cache a snapshot loaded at `generation`, dropping it again if a write
    /// landed in the meantime.
    async fn put_snapshot(&self, generation: u64, sites: Arc<Vec<Site>>) {
        self.snapshot.insert((), sites).await;
        if self.generation() != generation {
            self.snapshot.invalidate(&()).await;
        }
    }

    async fn put_site(&self, generation: u64, site: Site) {
        let id = site.id.clone();
        self.sites.insert(id.clone(), site).await;
        if self.generation() != generation {
            self.sites.invalidate(&id).await;
        }
    }
}

/// Data source with site caching.
///
/// Wraps any [`DataSource`]; non-site operations pass straight through.
pub struct CachedSource<S> {
    inner: S,
    cache: SiteCache,
}

impl<S: DataSource> CachedSource<S> {
    pub fn new(inner: S, config: &CacheConfig) -> Self {
        Self {
            inner,
            cache: SiteCache::new(config),
        }
    }

    /// Access the underlying source for operations that bypass cache.
    pub fn inner(&self) -> &S {
        &self.inner
    }

    /// Number of cached single-site entries.
    pub fn cached_site_count(&self) -> u64 {
        self.cache.sites.entry_count()
    }

    /// Invalidate all cached entries.
    pub fn invalidate_cache(&self) {
        self.cache.invalidate_all();
    }
}

#[async_trait]
impl<S: DataSource> DataSource for CachedSource<S> {
    async fn fetch_sites(&self, page: PageRequest) -> Result<Page<Site>, GatewayError> {
        self.inner.fetch_sites(page).await
    }

    async fn fetch_sites_by_type(
        &self,
        denomination: Denomination,
    ) -> Result<Vec<Site>, GatewayError> {
        self.inner.fetch_sites_by_type(denomination).await
    }

    async fn fetch_site(&self, id: &str) -> Result<Site, GatewayError> {
        if let Some(site) = self.cache.sites.get(id).await {
            return Ok(site);
        }
        let generation = self.cache.generation();
        let site = self.inner.fetch_site(id).await?;
        self.cache.put_site(generation, site.clone()).await;
        Ok(site)
    }

    async fn fetch_all_sites(&self) -> Result<Vec<Site>, GatewayError> {
        if let Some(snapshot) = self.cache.snapshot.get(&()).await {
            return Ok(snapshot.as_ref().clone());
        }
        let generation = self.cache.generation();
        let sites = self.inner.fetch_all_sites().await?;
        debug!(count = sites.len(), "Cached site snapshot");
        self.cache.put_snapshot(generation, Arc::new(sites.clone())).await;
        Ok(sites)
    }

    async fn add_site(&self, site: NewSite) -> Result<String, GatewayError> {
        let id = self.inner.add_site(site).await?;
        self.cache.invalidate_all();
        Ok(id)
    }

    async fn update_site(&self, id: &str, update: SiteUpdate) -> Result<(), GatewayError> {
        let result = self.inner.update_site(id, update).await;
        self.cache.invalidate_all();
        result
    }

    async fn delete_site(&self, id: &str) -> Result<(), GatewayError> {
        let result = self.inner.delete_site(id).await;
        self.cache.invalidate_all();
        result
    }

    async fn upload_site_image(
        &self,
        site_id: &str,
        bytes: Vec<u8>,
        content_type: &str,
    ) -> Result<String, GatewayError> {
        self.inner
            .upload_site_image(site_id, bytes, content_type)
            .await
    }

    async fn save_route(&self, route: NewRoute) -> Result<String, GatewayError> {
        self.inner.save_route(route).await
    }

    async fn fetch_user_routes(&self, user_id: &str) -> Result<Vec<Route>, GatewayError> {
        self.inner.fetch_user_routes(user_id).await
    }

    async fn delete_route(&self, id: &str) -> Result<(), GatewayError> {
        self.inner.delete_route(id).await
    }

    async fn fetch_events(&self) -> Result<Vec<Event>, GatewayError> {
        self.inner.fetch_events().await
    }

    async fn fetch_upcoming_events(&self, today: NaiveDate) -> Result<Vec<Event>, GatewayError> {
        self.inner.fetch_upcoming_events(today).await
    }

    async fn fetch_past_events(&self, today: NaiveDate) -> Result<Vec<Event>, GatewayError> {
        self.inner.fetch_past_events(today).await
    }

    async fn add_review(&self, review: NewReview) -> Result<String, GatewayError> {
        // The review write may have updated the site rating even on error.
        let result = self.inner.add_review(review).await;
        self.cache.invalidate_all();
        result
    }

    async fn fetch_site_reviews(&self, site_id: &str) -> Result<Vec<Review>, GatewayError> {
        self.inner.fetch_site_reviews(site_id).await
    }

    async fn create_user_profile(&self, profile: &UserProfile) -> Result<(), GatewayError> {
        self.inner.create_user_profile(profile).await
    }

    async fn fetch_user_profile(&self, uid: &str) -> Result<UserProfile, GatewayError> {
        self.inner.fetch_user_profile(uid).await
    }

    async fn update_user_preferences(
        &self,
        uid: &str,
        preferences: &UserPreferences,
    ) -> Result<(), GatewayError> {
        self.inner.update_user_preferences(uid, preferences).await
    }

    fn set_session_token(&self, id_token: Option<String>) {
        self.inner.set_session_token(id_token);
    }
}

#[cfg(test)]
mod tests {
    use std::sync::Mutex;

    use tokio::sync::oneshot;

    use super::*;
    use crate::domain::Coordinate;
    use crate::gateway::FixtureSource;

    fn cached() -> CachedSource<FixtureSource> {
        CachedSource::new(FixtureSource::builtin(), &CacheConfig::default())
    }

    fn shikharji() -> NewSite {
        NewSite::new(
            "Shikharji",
            Denomination::Digambar,
            Coordinate::new(23.961, 86.136),
        )
    }

    /// Fixture source whose first page read signals, then waits to be resumed.
    struct PausingSource {
        inner: FixtureSource,
        pause: Mutex<Option<(oneshot::Sender<()>, oneshot::Receiver<()>)>>,
    }

    #[async_trait]
    impl DataSource for PausingSource {
        async fn fetch_sites(&self, page: PageRequest) -> Result<Page<Site>, GatewayError> {
            let result = self.inner.fetch_sites(page).await;
            let pause = self.pause.lock().unwrap().take();
            if let Some((read, resume)) = pause {
                let _ = read.send(());
                let _ = resume.await;
            }
            result
        }

        async fn fetch_sites_by_type(&self, d: Denomination) -> Result<Vec<Site>, GatewayError> {
            self.inner.fetch_sites_by_type(d).await
        }

        async fn fetch_site(&self, id: &str) -> Result<Site, GatewayError> {
            self.inner.fetch_site(id).await
        }

        async fn add_site(&self, site: NewSite) -> Result<String, GatewayError> {
            self.inner.add_site(site).await
        }

        async fn update_site(&self, id: &str, update: SiteUpdate) -> Result<(), GatewayError> {
            self.inner.update_site(id, update).await
        }

        async fn delete_site(&self, id: &str) -> Result<(), GatewayError> {
            self.inner.delete_site(id).await
        }

        async fn upload_site_image(
            &self,
            site_id: &str,
            bytes: Vec<u8>,
            content_type: &str,
        ) -> Result<String, GatewayError> {
            self.inner
                .upload_site_image(site_id, bytes, content_type)
                .await
        }

        async fn save_route(&self, route: NewRoute) -> Result<String, GatewayError> {
            self.inner.save_route(route).await
        }

        async fn fetch_user_routes(&self, user_id: &str) -> Result<Vec<Route>, GatewayError> {
            self.inner.fetch_user_routes(user_id).await
        }

        async fn delete_route(&self, id: &str) -> Result<(), GatewayError> {
            self.inner.delete_route(id).await
        }

        async fn fetch_events(&self) -> Result<Vec<Event>, GatewayError> {
            self.inner.fetch_events().await
        }

        async fn fetch_upcoming_events(
            &self,
            today: NaiveDate,
        ) -> Result<Vec<Event>, GatewayError> {
            self.inner.fetch_upcoming_events(today).await
        }

        async fn fetch_past_events(&self, today: NaiveDate) -> Result<Vec<Event>, GatewayError> {
            self.inner.fetch_past_events(today).await
        }

        async fn add_review(&self, review: NewReview) -> Result<String, GatewayError> {
            self.inner.add_review(review).await
        }

        async fn fetch_site_reviews(&self, site_id: &str) -> Result<Vec<Review>, GatewayError> {
            self.inner.fetch_site_reviews(site_id).await
        }

        async fn create_user_profile(&self, profile: &UserProfile) -> Result<(), GatewayError> {
            self.inner.create_user_profile(profile).await
        }

        async fn fetch_user_profile(&self, uid: &str) -> Result<UserProfile, GatewayError> {
            self.inner.fetch_user_profile(uid).await
        }

        async fn update_user_preferences(
            &self,
            uid: &str,
            preferences: &UserPreferences,
        ) -> Result<(), GatewayError> {
            self.inner.update_user_preferences(uid, preferences).await
        }
    }

    #[test]
    fn default_config() {
        let config = CacheConfig::default();
        assert_eq!(config.ttl, Duration::from_secs(60));
        assert_eq!(config.max_capacity, 1000);
        assert_eq!(
            config.with_ttl(Duration::from_secs(5)).ttl,
            Duration::from_secs(5)
        );
    }

    #[tokio::test]
    async fn snapshot_is_served_from_cache() {
        let source = cached();
        assert_eq!(source.fetch_all_sites().await.unwrap().len(), 3);

        // Write behind the cache's back: the snapshot stays as it was.
        source.inner().add_site(shikharji()).await.unwrap();
        assert_eq!(source.fetch_all_sites().await.unwrap().len(), 3);

        source.invalidate_cache();
        assert_eq!(source.fetch_all_sites().await.unwrap().len(), 4);
    }

    #[tokio::test]
    async fn writes_invalidate() {
        let source = cached();
        assert_eq!(source.fetch_all_sites().await.unwrap().len(), 3);

        source.add_site(shikharji()).await.unwrap();
        assert_eq!(source.fetch_all_sites().await.unwrap().len(), 4);
    }

    #[tokio::test]
    async fn read_overlapping_a_write_is_not_cached() {
        let (read_tx, read_rx) = oneshot::channel();
        let (resume_tx, resume_rx) = oneshot::channel();
        let source = Arc::new(CachedSource::new(
            PausingSource {
                inner: FixtureSource::builtin(),
                pause: Mutex::new(Some((read_tx, resume_rx))),
            },
            &CacheConfig::default(),
        ));

        let reader = tokio::spawn({
            let source = Arc::clone(&source);
            async move { source.fetch_all_sites().await }
        });

        // The reader holds the three-site collection when the write lands.
        read_rx.await.unwrap();
        source.add_site(shikharji()).await.unwrap();
        resume_tx.send(()).unwrap();

        assert_eq!(reader.await.unwrap().unwrap().len(), 3);
        assert_eq!(source.fetch_all_sites().await.unwrap().len(), 4);
    }

    #[tokio::test]
    async fn review_refreshes_cached_site() {
        let source = cached();
        let before = source.fetch_site("3").await.unwrap();

        let review = NewReview::new("u1", "Asha", "3", 5.0, None).unwrap();
        source.add_review(review).await.unwrap();

        let after = source.fetch_site("3").await.unwrap();
        assert_eq!(after.review_count, before.review_count.map(|n| n + 1));
    }

    #[tokio::test]
    async fn near_reads_snapshot() {
        let source = cached();
        let palitana = Coordinate::new(21.4859, 71.8496);
        let near = source.fetch_sites_near(palitana, 1.0).await.unwrap();
        assert_eq!(near.len(), 1);
        assert_eq!(near[0].id, "1");
    }

    #[tokio::test]
    async fn misses_are_not_cached() {
        let source = cached();
        assert!(source.fetch_site("nope").await.unwrap_err().is_not_found());
        assert_eq!(source.cached_site_count(), 0);
    }
}
