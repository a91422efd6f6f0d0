//! Client-side application state.
//!
//! [`AppStore`] holds the last-fetched snapshot of everything the app shows
//! plus the signed-in session. It is a plain value with a single writer:
//! callers own it and pass the data source and authenticator into each
//! asynchronous action. Failed actions never panic or retry; their message
//! lands in [`AppState::error`] and the previous state is kept.

mod persist;

use std::collections::{BTreeSet, VecDeque};

use chrono::NaiveDate;
use serde::{Deserialize, Serialize};
use tracing::{debug, warn};

use crate::domain::{
    DomainError, Event, Filters, FiltersPatch, NewReview, PreferenceKey, PreferenceValue,
    Route, RoutePoint, Site, UserPreferences, UserProfile,
};
use crate::gateway::{
    AuthError, AuthUser, Authenticator, Cursor, DEFAULT_PAGE_SIZE, DataSource, GatewayError,
    PageRequest,
};
use crate::planner::{RoutePlan, RoutePlanner, RouteQuery, SearchConfig, SearchError};

pub use persist::{FAVORITES_KEY, LocalStorage, StorageError, USER_KEY};

/// Number of recent searches kept.
pub const MAX_RECENT_SEARCHES: usize = 5;

/// Why a store action failed. Only its message is kept in state.
#[derive(Debug, thiserror::Error)]
pub enum StoreError {
    #[error("Not signed in")]
    NotSignedIn,

    #[error("No active route")]
    NoActiveRoute,

    #[error(transparent)]
    Gateway(#[from] GatewayError),

    #[error(transparent)]
    Auth(#[from] AuthError),

    #[error(transparent)]
    Search(#[from] SearchError),

    #[error(transparent)]
    Domain(#[from] DomainError),

    #[error(transparent)]
    Storage(#[from] StorageError),
}

/// Identity persisted across restarts under [`USER_KEY`].
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct StoredUser {
    pub uid: String,
    pub email: Option<String>,
    pub display_name: Option<String>,
}

impl From<&AuthUser> for StoredUser {
    fn from(user: &AuthUser) -> Self {
        Self {
            uid: user.uid.clone(),
            email: user.email.clone(),
            display_name: user.display_name.clone(),
        }
    }
}

/// Signed-in session fields.
#[derive(Debug, Clone, Default, PartialEq, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct Session {
    pub uid: Option<String>,
    pub email: Option<String>,
    pub display_name: Option<String>,
    pub preferences: UserPreferences,
    pub is_authenticated: bool,
}

/// A past route search, newest first in [`AppState::recent_searches`].
#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct RecentSearch {
    pub origin: RoutePoint,
    pub destination: RoutePoint,
    pub date: NaiveDate,
}

/// Everything the screens render from.
#[derive(Debug, Clone, Default, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct AppState {
    pub sites: Vec<Site>,
    /// Continuation for the next page of sites, if any.
    pub site_cursor: Option<Cursor>,
    pub active_route: Option<RoutePlan>,
    pub saved_routes: Vec<Route>,
    pub upcoming_events: Vec<Event>,
    pub past_events: Vec<Event>,
    pub favorites: BTreeSet<String>,
    pub filters: Filters,
    pub recent_searches: VecDeque<RecentSearch>,
    pub session: Session,
    pub loading: bool,
    pub error: Option<String>,
}

/// Single-writer application store.
pub struct AppStore {
    state: AppState,
    storage: Option<LocalStorage>,
    search: SearchConfig,
}

impl AppStore {
    /// Create a store, reading persisted favorites once.
    pub fn new(storage: Option<LocalStorage>, search: SearchConfig) -> Self {
        let mut store = Self {
            state: AppState::default(),
            storage,
            search,
        };
        let favorites = store
            .storage
            .as_ref()
            .map(|s| s.get::<BTreeSet<String>>(FAVORITES_KEY))
            .transpose()
            .map(Option::flatten);
        match favorites {
            Ok(Some(favorites)) => store.state.favorites = favorites,
            Ok(None) => {}
            Err(e) => store.fail(e.into()),
        }
        store
    }

    /// In-memory store with nothing persisted.
    pub fn in_memory() -> Self {
        Self::new(None, SearchConfig::default())
    }

    pub fn state(&self) -> &AppState {
        &self.state
    }

    fn fail(&mut self, err: StoreError) {
        warn!(error = %err, "Store action failed");
        self.state.error = Some(err.to_string());
    }

    fn begin(&mut self) {
        self.state.loading = true;
        self.state.error = None;
    }

    fn finish<T>(&mut self, result: Result<T, StoreError>) -> Option<T> {
        self.state.loading = false;
        match result {
            Ok(v) => Some(v),
            Err(e) => {
                self.fail(e);
                None
            }
        }
    }

    fn persist<T: Serialize>(&mut self, key: &str, value: &T) {
        let result = match &self.storage {
            Some(storage) => storage.set(key, value),
            None => Ok(()),
        };
        if let Err(e) = result {
            self.fail(e.into());
        }
    }

    fn forget(&mut self, key: &str) {
        let result = match &self.storage {
            Some(storage) => storage.remove(key),
            None => Ok(()),
        };
        if let Err(e) = result {
            self.fail(e.into());
        }
    }

    fn uid(&self) -> Result<String, StoreError> {
        self.state.session.uid.clone().ok_or(StoreError::NotSignedIn)
    }

    // Synchronous actions.

    /// Add or remove a favorite site; returns whether it is now a favorite.
    pub fn toggle_favorite(&mut self, site_id: &str) -> bool {
        let now_favorite = if self.state.favorites.remove(site_id) {
            false
        } else {
            self.state.favorites.insert(site_id.to_string());
            true
        };
        let favorites = self.state.favorites.clone();
        self.persist(FAVORITES_KEY, &favorites);
        now_favorite
    }

    pub fn is_favorite(&self, site_id: &str) -> bool {
        self.state.favorites.contains(site_id)
    }

    pub fn set_active_route(&mut self, plan: RoutePlan) {
        self.state.active_route = Some(plan);
    }

    pub fn clear_active_route(&mut self) {
        self.state.active_route = None;
    }

    /// Merge a partial filter update.
    pub fn update_filters(&mut self, patch: FiltersPatch) {
        self.state.filters.merge(patch);
    }

    /// Append sites not already in the snapshot.
    pub fn add_sites_along_route(&mut self, sites: impl IntoIterator<Item = Site>) {
        for site in sites {
            if !self.state.sites.iter().any(|s| s.id == site.id) {
                self.state.sites.push(site);
            }
        }
    }

    /// Change one preference locally.
    pub fn set_preference(&mut self, key: PreferenceKey, value: PreferenceValue) {
        if let Err(e) = self.state.session.preferences.set(key, value) {
            self.fail(e.into());
        }
    }

    pub fn clear_error(&mut self) {
        self.state.error = None;
    }

    // Asynchronous actions.

    /// Replace the site snapshot with the first page.
    pub async fn load_sites<S: DataSource + ?Sized>(&mut self, source: &S) {
        self.begin();
        let result = source
            .fetch_sites(PageRequest::first(DEFAULT_PAGE_SIZE))
            .await
            .map_err(StoreError::from);
        if let Some(page) = self.finish(result) {
            debug!(count = page.items.len(), "Loaded sites");
            self.state.sites = page.items;
            self.state.site_cursor = page.next;
        }
    }

    /// Append the next page; does nothing on the last page.
    pub async fn load_more_sites<S: DataSource + ?Sized>(&mut self, source: &S) {
        let Some(cursor) = self.state.site_cursor.clone() else {
            return;
        };
        self.begin();
        let result = source
            .fetch_sites(PageRequest::after(cursor, DEFAULT_PAGE_SIZE))
            .await
            .map_err(StoreError::from);
        if let Some(page) = self.finish(result) {
            self.add_sites_along_route(page.items);
            self.state.site_cursor = page.next;
        }
    }

    /// Load upcoming and past events relative to `today`.
    pub async fn load_events<S: DataSource + ?Sized>(&mut self, source: &S, today: NaiveDate) {
        self.begin();
        let result = futures::try_join!(
            source.fetch_upcoming_events(today),
            source.fetch_past_events(today)
        )
        .map_err(StoreError::from);
        if let Some((upcoming, past)) = self.finish(result) {
            self.state.upcoming_events = upcoming;
            self.state.past_events = past;
        }
    }

    pub async fn load_saved_routes<S: DataSource + ?Sized>(&mut self, source: &S) {
        self.begin();
        let result = match self.uid() {
            Ok(uid) => source.fetch_user_routes(&uid).await.map_err(StoreError::from),
            Err(e) => Err(e),
        };
        if let Some(routes) = self.finish(result) {
            self.state.saved_routes = routes;
        }
    }

    pub async fn delete_saved_route<S: DataSource + ?Sized>(&mut self, source: &S, route_id: &str) {
        self.begin();
        let result = source.delete_route(route_id).await.map_err(StoreError::from);
        if self.finish(result).is_some() {
            self.state.saved_routes.retain(|r| r.id != route_id);
        }
    }

    /// Submit a review as the signed-in user and fold it into the local
    /// snapshot the same way the store does remotely.
    pub async fn submit_review<S: DataSource + ?Sized>(
        &mut self,
        source: &S,
        site_id: &str,
        rating: f64,
        comment: Option<String>,
    ) -> Option<String> {
        self.begin();
        let session = &self.state.session;
        let review = match &session.uid {
            Some(uid) => NewReview::new(
                uid.clone(),
                session.display_name.clone().unwrap_or_default(),
                site_id,
                rating,
                comment,
            )
            .map_err(StoreError::from),
            None => Err(StoreError::NotSignedIn),
        };
        let result = match review {
            Ok(review) => source.add_review(review).await.map_err(StoreError::from),
            Err(e) => Err(e),
        };

        let id = self.finish(result)?;
        if let Some(site) = self.state.sites.iter_mut().find(|s| s.id == site_id) {
            site.apply_rating(site.rating_summary().with_review(rating));
        }
        Some(id)
    }

    /// Plan a route with the active filters. On success the plan becomes the
    /// active route, the search is remembered, and found sites are merged
    /// into the snapshot. Does nothing while either end is unset.
    pub async fn search_route<S: DataSource + ?Sized>(
        &mut self,
        source: &S,
        query: &RouteQuery,
        today: NaiveDate,
    ) {
        let Some((origin, destination)) = query.endpoints() else {
            return;
        };
        self.state.recent_searches.push_front(RecentSearch {
            origin: origin.clone(),
            destination: destination.clone(),
            date: today,
        });
        self.state.recent_searches.truncate(MAX_RECENT_SEARCHES);

        self.begin();
        let planner = RoutePlanner::new(source, &self.search);
        let result = planner
            .plan(query, &self.state.filters, today)
            .await
            .map_err(StoreError::from);
        if let Some(Some(plan)) = self.finish(result) {
            self.add_sites_along_route(plan.sites.iter().map(|p| p.site.clone()));
            self.state.active_route = Some(plan);
        }
    }

    /// Save the active route for the signed-in user.
    pub async fn save_active_route<S: DataSource + ?Sized>(
        &mut self,
        source: &S,
        thumbnail: &str,
        date: NaiveDate,
    ) -> Option<String> {
        self.begin();
        let result = match (self.uid(), &self.state.active_route) {
            (Err(e), _) => Err(e),
            (_, None) => Err(StoreError::NoActiveRoute),
            (Ok(uid), Some(plan)) => RoutePlanner::new(source, &self.search)
                .save(plan, &uid, thumbnail, date)
                .await
                .map_err(StoreError::from),
        };
        self.finish(result)
    }

    /// Restore the persisted user, refreshing their profile.
    pub async fn restore_session<S: DataSource + ?Sized>(&mut self, source: &S) {
        let stored = match &self.storage {
            Some(storage) => storage.get::<StoredUser>(USER_KEY),
            None => Ok(None),
        };
        let stored = match stored {
            Ok(Some(user)) => user,
            Ok(None) => return,
            Err(e) => {
                self.fail(e.into());
                return;
            }
        };

        self.begin();
        let result = source
            .fetch_user_profile(&stored.uid)
            .await
            .map_err(StoreError::from);
        if let Some(profile) = self.finish(result) {
            self.start_session(stored, profile.preferences);
        }
    }

    /// Create an account and its profile record, then sign in.
    pub async fn register<S, A>(
        &mut self,
        source: &S,
        auth: &A,
        email: &str,
        password: &str,
        display_name: &str,
    ) where
        S: DataSource + ?Sized,
        A: Authenticator + ?Sized,
    {
        self.begin();
        let result = async {
            let user = auth.register(email, password, display_name).await?;
            source.set_session_token(user.id_token.clone());
            let profile = UserProfile::new(
                user.uid.clone(),
                Some(email.to_string()),
                Some(display_name.to_string()),
            );
            source.create_user_profile(&profile).await?;
            let profile = source.fetch_user_profile(&user.uid).await?;
            Ok::<_, StoreError>((user, profile))
        }
        .await;
        match self.finish(result) {
            Some((user, profile)) => self.sign_in_as(&user, profile.preferences),
            None => source.set_session_token(None),
        }
    }

    pub async fn sign_in<S, A>(&mut self, source: &S, auth: &A, email: &str, password: &str)
    where
        S: DataSource + ?Sized,
        A: Authenticator + ?Sized,
    {
        self.begin();
        let result = async {
            let user = auth.sign_in(email, password).await?;
            source.set_session_token(user.id_token.clone());
            let profile = source.fetch_user_profile(&user.uid).await?;
            Ok::<_, StoreError>((user, profile))
        }
        .await;
        match self.finish(result) {
            Some((user, profile)) => self.sign_in_as(&user, profile.preferences),
            None => source.set_session_token(None),
        }
    }

    pub async fn sign_out<S, A>(&mut self, source: &S, auth: &A)
    where
        S: DataSource + ?Sized,
        A: Authenticator + ?Sized,
    {
        self.begin();
        let result = auth.sign_out().await.map_err(StoreError::from);
        if self.finish(result).is_some() {
            source.set_session_token(None);
            self.state.session = Session::default();
            self.state.saved_routes.clear();
            self.forget(USER_KEY);
        }
    }

    /// Store preferences remotely, then locally.
    pub async fn update_preferences<S: DataSource + ?Sized>(
        &mut self,
        source: &S,
        preferences: UserPreferences,
    ) {
        self.begin();
        let result = match self.uid() {
            Ok(uid) => source
                .update_user_preferences(&uid, &preferences)
                .await
                .map_err(StoreError::from),
            Err(e) => Err(e),
        };
        if self.finish(result).is_some() {
            self.state.session.preferences = preferences;
        }
    }

    fn sign_in_as(&mut self, user: &AuthUser, preferences: UserPreferences) {
        let stored = StoredUser::from(user);
        self.persist(USER_KEY, &stored);
        self.start_session(stored, preferences);
    }

    fn start_session(&mut self, user: StoredUser, preferences: UserPreferences) {
        debug!(uid = %user.uid, "Session started");
        self.state.session = Session {
            uid: Some(user.uid),
            email: user.email,
            display_name: user.display_name,
            preferences,
            is_authenticated: true,
        };
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::domain::{Coordinate, Denomination, NewSite};
    use crate::gateway::{FixtureAuth, FixtureSource};
    use tempfile::tempdir;

    fn today() -> NaiveDate {
        NaiveDate::from_ymd_opt(2026, 10, 18).unwrap()
    }

    fn palitana_to_dilwara() -> RouteQuery {
        RouteQuery::new(
            RoutePoint::new("Palitana", Coordinate::new(21.4859, 71.8496)),
            RoutePoint::new("Dilwara", Coordinate::new(24.6167, 72.7167)),
        )
    }

    async fn signed_in(source: &FixtureSource) -> AppStore {
        let auth = FixtureAuth::new();
        let mut store = AppStore::in_memory();
        store
            .register(source, &auth, "a@example.com", "secret1", "Asha")
            .await;
        assert!(store.state().session.is_authenticated);
        store
    }

    #[test]
    fn favorites_toggle_and_persist() {
        let dir = tempdir().unwrap();
        let storage = LocalStorage::open(dir.path()).unwrap();

        let mut store = AppStore::new(Some(storage.clone()), SearchConfig::default());
        assert!(store.toggle_favorite("1"));
        assert!(store.toggle_favorite("3"));
        assert!(!store.toggle_favorite("1"));
        assert!(store.is_favorite("3"));
        assert!(!store.is_favorite("1"));

        let reopened = AppStore::new(Some(storage), SearchConfig::default());
        assert_eq!(
            reopened.state().favorites,
            BTreeSet::from(["3".to_string()])
        );
    }

    #[test]
    fn corrupt_favorites_become_an_error() {
        let dir = tempdir().unwrap();
        std::fs::write(dir.path().join("favorites.json"), "oops").unwrap();
        let storage = LocalStorage::open(dir.path()).unwrap();

        let store = AppStore::new(Some(storage), SearchConfig::default());
        assert!(store.state().favorites.is_empty());
        assert!(store.state().error.is_some());
    }

    #[test]
    fn filters_merge() {
        let mut store = AppStore::in_memory();
        store.update_filters(FiltersPatch {
            max_distance_km: Some(25.0),
            ..FiltersPatch::default()
        });
        assert_eq!(store.state().filters.max_distance_km, 25.0);
        assert!(store.state().filters.digambar);
    }

    #[test]
    fn bad_preference_sets_error() {
        let mut store = AppStore::in_memory();
        store.set_preference(PreferenceKey::DarkMode, PreferenceValue::Text("yes".into()));
        assert!(store.state().error.is_some());
        assert!(!store.state().session.preferences.dark_mode);

        store.clear_error();
        store.set_preference(PreferenceKey::DarkMode, PreferenceValue::Flag(true));
        assert!(store.state().session.preferences.dark_mode);
        assert_eq!(store.state().error, None);
    }

    #[tokio::test]
    async fn load_sites_pages_through() {
        let source = FixtureSource::builtin();
        let mut store = AppStore::in_memory();

        store.load_sites(&source).await;
        assert_eq!(store.state().sites.len(), 3);
        assert!(store.state().site_cursor.is_none());
        assert!(!store.state().loading);

        // Last page: nothing more to fetch.
        store.load_more_sites(&source).await;
        assert_eq!(store.state().sites.len(), 3);
    }

    #[tokio::test]
    async fn events_split() {
        let source = FixtureSource::builtin();
        let mut store = AppStore::in_memory();
        store.load_events(&source, today()).await;

        assert_eq!(store.state().upcoming_events.len(), 2);
        assert_eq!(store.state().past_events.len(), 1);
    }

    #[tokio::test]
    async fn search_sets_active_route_and_recent() {
        let source = FixtureSource::builtin();
        let mut store = AppStore::in_memory();
        store.update_filters(FiltersPatch {
            max_distance_km: Some(50.0),
            ..FiltersPatch::default()
        });

        store.search_route(&source, &palitana_to_dilwara(), today()).await;

        let plan = store.state().active_route.as_ref().expect("route planned");
        let ids: BTreeSet<_> = plan.sites.iter().map(|p| p.site.id.as_str()).collect();
        assert!(ids.contains("1") && ids.contains("3"));
        assert_eq!(store.state().recent_searches.len(), 1);
        assert!(store.state().sites.iter().any(|s| s.id == "3"));
    }

    #[tokio::test]
    async fn recent_searches_keep_five() {
        let source = FixtureSource::builtin();
        let mut store = AppStore::in_memory();
        for _ in 0..7 {
            store.search_route(&source, &palitana_to_dilwara(), today()).await;
        }
        assert_eq!(store.state().recent_searches.len(), MAX_RECENT_SEARCHES);
    }

    #[tokio::test]
    async fn search_with_unset_end_does_nothing() {
        let source = FixtureSource::builtin();
        let mut store = AppStore::in_memory();
        store.search_route(&source, &RouteQuery::default(), today()).await;
        assert!(store.state().active_route.is_none());
        assert!(store.state().recent_searches.is_empty());
    }

    #[tokio::test]
    async fn saving_requires_session_and_route() {
        let source = FixtureSource::builtin();
        let mut store = AppStore::in_memory();

        assert!(store.save_active_route(&source, "", today()).await.is_none());
        assert_eq!(store.state().error.as_deref(), Some("Not signed in"));

        let mut store = signed_in(&source).await;
        assert!(store.save_active_route(&source, "", today()).await.is_none());
        assert_eq!(store.state().error.as_deref(), Some("No active route"));

        store.search_route(&source, &palitana_to_dilwara(), today()).await;
        let id = store.save_active_route(&source, "", today()).await.unwrap();

        store.load_saved_routes(&source).await;
        assert_eq!(store.state().saved_routes.len(), 1);
        assert_eq!(store.state().saved_routes[0].id, id);

        store.delete_saved_route(&source, &id).await;
        assert!(store.state().saved_routes.is_empty());
    }

    #[tokio::test]
    async fn review_updates_snapshot() {
        let source = FixtureSource::builtin();
        let mut store = signed_in(&source).await;
        store.load_sites(&source).await;

        store
            .submit_review(&source, "2", 3.0, Some("Peaceful".into()))
            .await
            .unwrap();

        let local = store.state().sites.iter().find(|s| s.id == "2").unwrap();
        let remote = source.fetch_site("2").await.unwrap();
        assert_eq!(local.review_count, Some(190));
        assert_eq!(local.rating, remote.rating);
    }

    #[tokio::test]
    async fn invalid_review_is_rejected_locally() {
        let source = FixtureSource::builtin();
        let mut store = signed_in(&source).await;

        assert!(store.submit_review(&source, "2", 7.0, None).await.is_none());
        assert_eq!(
            store.state().error.as_deref(),
            Some("invalid rating 7: must be between 0 and 5")
        );
        assert!(source.fetch_site_reviews("2").await.unwrap().is_empty());
    }

    #[tokio::test]
    async fn sign_in_failure_keeps_message() {
        let source = FixtureSource::builtin();
        let auth = FixtureAuth::new();
        let mut store = AppStore::in_memory();

        store.sign_in(&source, &auth, "nobody@example.com", "pw").await;
        assert!(!store.state().session.is_authenticated);
        assert_eq!(source.session_token(), None);
        assert_eq!(store.state().error.as_deref(), Some("invalid email or password"));
        assert!(!store.state().loading);
    }

    #[tokio::test]
    async fn source_acts_for_the_signed_in_user() {
        let source = FixtureSource::builtin();
        let auth = FixtureAuth::new();
        let mut store = AppStore::in_memory();
        store
            .register(&source, &auth, "a@example.com", "secret1", "Asha")
            .await;
        let uid = store.state().session.uid.clone().unwrap();
        let token = format!("fixture-token-{uid}");
        assert_eq!(source.session_token().as_deref(), Some(token.as_str()));

        store.sign_out(&source, &auth).await;
        assert_eq!(source.session_token(), None);

        store.sign_in(&source, &auth, "a@example.com", "secret1").await;
        assert_eq!(source.session_token().as_deref(), Some(token.as_str()));
    }

    #[tokio::test]
    async fn session_survives_restart() {
        let dir = tempdir().unwrap();
        let source = FixtureSource::builtin();
        let auth = FixtureAuth::new();

        let mut store = AppStore::new(
            Some(LocalStorage::open(dir.path()).unwrap()),
            SearchConfig::default(),
        );
        store
            .register(&source, &auth, "a@example.com", "secret1", "Asha")
            .await;
        let uid = store.state().session.uid.clone().unwrap();

        let mut restarted = AppStore::new(
            Some(LocalStorage::open(dir.path()).unwrap()),
            SearchConfig::default(),
        );
        restarted.restore_session(&source).await;
        assert_eq!(restarted.state().session.uid.as_deref(), Some(uid.as_str()));
        assert_eq!(restarted.state().session.display_name.as_deref(), Some("Asha"));

        restarted.sign_out(&source, &auth).await;
        assert!(!restarted.state().session.is_authenticated);
        assert!(!dir.path().join("user.json").exists());
    }

    #[tokio::test]
    async fn preferences_round_trip() {
        let source = FixtureSource::builtin();
        let mut store = signed_in(&source).await;
        let prefs = UserPreferences {
            language: "hi".into(),
            ..UserPreferences::default()
        };

        store.update_preferences(&source, prefs.clone()).await;
        assert_eq!(store.state().session.preferences, prefs);

        let uid = store.state().session.uid.clone().unwrap();
        assert_eq!(
            source.fetch_user_profile(&uid).await.unwrap().preferences.language,
            "hi"
        );
    }

    #[test]
    fn add_sites_dedupes_by_id() {
        let mut store = AppStore::in_memory();
        let site = |id: &str| {
            NewSite::new(id, Denomination::Digambar, Coordinate::new(0.0, 0.0))
                .into_site(id.to_string(), chrono::Utc::now())
        };
        store.add_sites_along_route([site("a"), site("b")]);
        store.add_sites_along_route([site("b"), site("c")]);
        let ids: Vec<_> = store.state().sites.iter().map(|s| s.id.as_str()).collect();
        assert_eq!(ids, ["a", "b", "c"]);
    }
}
