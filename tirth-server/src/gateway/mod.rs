//! Data-source interface for sites, routes, events, reviews and users.
//!
//! Business logic talks to a [`DataSource`] and never knows which backend
//! is behind it. Two implementations exist:
//! - [`FixtureSource`]: in-memory, seeded from built-in data or JSON files
//! - [`crate::firebase::FirestoreGateway`]: the remote document store
//!
//! The choice is made once, when the application is composed.

mod auth;
mod error;
mod fixture;

use async_trait::async_trait;
use chrono::NaiveDate;
use rand::Rng;
use rand::distributions::Alphanumeric;
use serde::{Deserialize, Serialize};

use crate::domain::{
    Coordinate, Denomination, Event, NewReview, NewRoute, NewSite, Review, Route, Site,
    SiteUpdate, UserPreferences, UserProfile, distance_km,
};

pub use auth::{AuthError, AuthUser, Authenticator};
pub use error::{GatewayError, ROUTE_NOT_FOUND, SITE_NOT_FOUND, USER_NOT_FOUND};
pub use fixture::{FixtureAuth, FixtureSource};

/// Default number of sites per page.
pub const DEFAULT_PAGE_SIZE: usize = 10;

/// Largest page a caller may ask for.
pub const MAX_PAGE_SIZE: usize = 300;

/// Length of generated document ids.
const AUTO_ID_LEN: usize = 20;

/// Opaque continuation token for paged site listings.
#[derive(Debug, Clone, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(transparent)]
pub struct Cursor(String);

impl Cursor {
    pub fn new(token: impl Into<String>) -> Self {
        Self(token.into())
    }

    pub fn as_str(&self) -> &str {
        &self.0
    }
}

/// Request for one page of sites.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct PageRequest {
    pub cursor: Option<Cursor>,
    pub page_size: usize,
}

impl PageRequest {
    /// First page. The size is clamped to `1..=MAX_PAGE_SIZE`.
    pub fn first(page_size: usize) -> Self {
        Self {
            cursor: None,
            page_size: page_size.clamp(1, MAX_PAGE_SIZE),
        }
    }

    /// Page following `cursor`.
    pub fn after(cursor: Cursor, page_size: usize) -> Self {
        Self {
            cursor: Some(cursor),
            ..Self::first(page_size)
        }
    }
}

impl Default for PageRequest {
    fn default() -> Self {
        Self::first(DEFAULT_PAGE_SIZE)
    }
}

/// One page of results. `next` is `None` on the last page.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Page<T> {
    pub items: Vec<T>,
    pub next: Option<Cursor>,
}

/// Backend for every remote read and write the app performs.
///
/// All operations surface backend failures as [`GatewayError`]; none retry.
#[async_trait]
pub trait DataSource: Send + Sync {
    /// One page of sites ordered by name.
    async fn fetch_sites(&self, page: PageRequest) -> Result<Page<Site>, GatewayError>;

    async fn fetch_sites_by_type(
        &self,
        denomination: Denomination,
    ) -> Result<Vec<Site>, GatewayError>;

    /// Fails with `NotFound("Tirth not found")` for unknown ids.
    async fn fetch_site(&self, id: &str) -> Result<Site, GatewayError>;

    /// Every site, following cursors until the last page.
    async fn fetch_all_sites(&self) -> Result<Vec<Site>, GatewayError> {
        let mut sites = Vec::new();
        let mut request = PageRequest::first(MAX_PAGE_SIZE);
        loop {
            let page = self.fetch_sites(request).await?;
            sites.extend(page.items);
            match page.next {
                Some(cursor) => request = PageRequest::after(cursor, MAX_PAGE_SIZE),
                None => return Ok(sites),
            }
        }
    }

    /// Sites within `radius_km` of `center`.
    ///
    /// Loads the whole collection and filters it here: O(N) per call, there
    /// is no spatial index behind it.
    async fn fetch_sites_near(
        &self,
        center: Coordinate,
        radius_km: f64,
    ) -> Result<Vec<Site>, GatewayError> {
        let sites = self.fetch_all_sites().await?;
        Ok(within_radius(sites, center, radius_km))
    }

    /// Store a new site, returning its id. Creation and update times are
    /// stamped by the store.
    async fn add_site(&self, site: NewSite) -> Result<String, GatewayError>;

    async fn update_site(&self, id: &str, update: SiteUpdate) -> Result<(), GatewayError>;

    async fn delete_site(&self, id: &str) -> Result<(), GatewayError>;

    /// Upload an image for a site, returning its download URL.
    async fn upload_site_image(
        &self,
        site_id: &str,
        bytes: Vec<u8>,
        content_type: &str,
    ) -> Result<String, GatewayError>;

    async fn save_route(&self, route: NewRoute) -> Result<String, GatewayError>;

    /// A user's saved routes, newest first.
    async fn fetch_user_routes(&self, user_id: &str) -> Result<Vec<Route>, GatewayError>;

    async fn delete_route(&self, id: &str) -> Result<(), GatewayError>;

    /// All events, earliest first.
    async fn fetch_events(&self) -> Result<Vec<Event>, GatewayError>;

    /// Events dated `today` or later, earliest first.
    async fn fetch_upcoming_events(&self, today: NaiveDate) -> Result<Vec<Event>, GatewayError>;

    /// Events dated before `today`, most recent first.
    async fn fetch_past_events(&self, today: NaiveDate) -> Result<Vec<Event>, GatewayError>;

    /// Store a review and fold its rating into the site's running mean.
    ///
    /// The rating update is a separate read-then-write, not a transaction:
    /// two concurrent reviews of one site can lose an update.
    async fn add_review(&self, review: NewReview) -> Result<String, GatewayError>;

    /// Reviews of a site, newest first.
    async fn fetch_site_reviews(&self, site_id: &str) -> Result<Vec<Review>, GatewayError>;

    async fn create_user_profile(&self, profile: &UserProfile) -> Result<(), GatewayError>;

    /// Fails with `NotFound("User not found")` for unknown users.
    async fn fetch_user_profile(&self, uid: &str) -> Result<UserProfile, GatewayError>;

    async fn update_user_preferences(
        &self,
        uid: &str,
        preferences: &UserPreferences,
    ) -> Result<(), GatewayError>;

    /// Make later requests on behalf of the signed-in user. `None` drops
    /// back to anonymous access.
    fn set_session_token(&self, _id_token: Option<String>) {}
}

/// Keep the sites no farther than `radius_km` from `center`.
pub fn within_radius(sites: Vec<Site>, center: Coordinate, radius_km: f64) -> Vec<Site> {
    sites
        .into_iter()
        .filter(|s| distance_km(center, s.location) <= radius_km)
        .collect()
}

/// Random alphanumeric document id, in the style of store-assigned ids.
pub fn auto_id() -> String {
    rand::thread_rng()
        .sample_iter(&Alphanumeric)
        .take(AUTO_ID_LEN)
        .map(char::from)
        .collect()
}
