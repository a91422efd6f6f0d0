//! In-memory data source for development and tests.
//!
//! Serves built-in sample data, or sites and events loaded from JSON files,
//! through the same [`DataSource`] interface as the remote store.

use std::collections::{BTreeMap, HashMap};
use std::path::Path;
use std::sync::Arc;

use async_trait::async_trait;
use chrono::{NaiveDate, Utc};
use tokio::sync::{Mutex, RwLock};
use tracing::debug;

use crate::domain::{
    Coordinate, Denomination, Event, NewReview, NewRoute, NewSite, RatingSummary, Review, Route,
    Site, SiteEvent, SiteUpdate, UserPreferences, UserProfile,
};

use super::auth::{AuthError, AuthUser, Authenticator};
use super::error::{GatewayError, ROUTE_NOT_FOUND, SITE_NOT_FOUND, USER_NOT_FOUND};
use super::{Cursor, DataSource, Page, PageRequest, auto_id};

/// Separates name and id inside a fixture cursor.
const CURSOR_SEP: char = '\u{1f}';

#[derive(Default)]
struct FixtureData {
    sites: HashMap<String, Site>,
    routes: HashMap<String, Route>,
    events: Vec<Event>,
    reviews: Vec<Review>,
    users: HashMap<String, UserProfile>,
    images: HashMap<String, Vec<u8>>,
}

/// In-memory [`DataSource`].
#[derive(Clone, Default)]
pub struct FixtureSource {
    data: Arc<RwLock<FixtureData>>,
    session: Arc<std::sync::Mutex<Option<String>>>,
}

impl FixtureSource {
    /// Empty source.
    pub fn new() -> Self {
        Self::default()
    }

    /// Source seeded with the given sites and events.
    pub fn with_data(sites: Vec<Site>, events: Vec<Event>) -> Self {
        let data = FixtureData {
            sites: sites.into_iter().map(|s| (s.id.clone(), s)).collect(),
            events,
            ..FixtureData::default()
        };
        Self {
            data: Arc::new(RwLock::new(data)),
            session: Arc::default(),
        }
    }

    /// Source seeded with the sample sites and events.
    pub fn builtin() -> Self {
        Self::with_data(sample_sites(), sample_events())
    }

    /// Load `sites.json` (required) and `events.json` (optional) from a directory.
    pub fn from_dir(dir: impl AsRef<Path>) -> Result<Self, GatewayError> {
        let dir = dir.as_ref();

        let sites: Vec<Site> = read_json(&dir.join("sites.json"))?;
        let events_path = dir.join("events.json");
        let events: Vec<Event> = if events_path.is_file() {
            read_json(&events_path)?
        } else {
            Vec::new()
        };

        debug!(
            dir = %dir.display(),
            sites = sites.len(),
            events = events.len(),
            "Loaded fixture data"
        );

        Ok(Self::with_data(sites, events))
    }

    /// Number of sites currently held.
    pub async fn site_count(&self) -> usize {
        self.data.read().await.sites.len()
    }

    /// Id token of the user the source is acting for.
    pub fn session_token(&self) -> Option<String> {
        self.session.lock().ok().and_then(|token| token.clone())
    }

    /// Bytes stored under an upload path, if any.
    pub async fn image(&self, path: &str) -> Option<Vec<u8>> {
        self.data.read().await.images.get(path).cloned()
    }
}

fn read_json<T: serde::de::DeserializeOwned>(path: &Path) -> Result<T, GatewayError> {
    let json = std::fs::read_to_string(path)
        .map_err(|e| GatewayError::provider(format!("Failed to read {:?}: {}", path, e)))?;
    serde_json::from_str(&json).map_err(|e| GatewayError::Json {
        message: format!("Failed to parse {:?}: {}", path, e),
    })
}

fn sort_key(site: &Site) -> String {
    format!("{}{}{}", site.name, CURSOR_SEP, site.id)
}

#[async_trait]
impl DataSource for FixtureSource {
    async fn fetch_sites(&self, page: PageRequest) -> Result<Page<Site>, GatewayError> {
        let data = self.data.read().await;

        let mut ordered: Vec<(String, &Site)> =
            data.sites.values().map(|s| (sort_key(s), s)).collect();
        ordered.sort_by(|a, b| a.0.cmp(&b.0));

        let start = match &page.cursor {
            Some(cursor) => ordered.partition_point(|(key, _)| key.as_str() <= cursor.as_str()),
            None => 0,
        };

        let items: Vec<Site> = ordered[start..]
            .iter()
            .take(page.page_size)
            .map(|(_, s)| (*s).clone())
            .collect();

        let consumed = start + items.len();
        let next = if consumed < ordered.len() {
            items.last().map(|s| Cursor::new(sort_key(s)))
        } else {
            None
        };

        Ok(Page { items, next })
    }

    async fn fetch_sites_by_type(
        &self,
        denomination: Denomination,
    ) -> Result<Vec<Site>, GatewayError> {
        let data = self.data.read().await;
        Ok(data
            .sites
            .values()
            .filter(|s| s.denomination == denomination)
            .cloned()
            .collect())
    }

    async fn fetch_site(&self, id: &str) -> Result<Site, GatewayError> {
        let data = self.data.read().await;
        data.sites
            .get(id)
            .cloned()
            .ok_or(GatewayError::NotFound(SITE_NOT_FOUND))
    }

    async fn add_site(&self, site: NewSite) -> Result<String, GatewayError> {
        site.validate()?;
        let id = auto_id();
        let mut data = self.data.write().await;
        data.sites
            .insert(id.clone(), site.into_site(id.clone(), Utc::now()));
        Ok(id)
    }

    async fn update_site(&self, id: &str, update: SiteUpdate) -> Result<(), GatewayError> {
        let mut data = self.data.write().await;
        let site = data
            .sites
            .get_mut(id)
            .ok_or(GatewayError::NotFound(SITE_NOT_FOUND))?;
        update.apply_to(site, Utc::now());
        Ok(())
    }

    async fn delete_site(&self, id: &str) -> Result<(), GatewayError> {
        // Deleting a missing document is not an error for the remote store either.
        self.data.write().await.sites.remove(id);
        Ok(())
    }

    async fn upload_site_image(
        &self,
        site_id: &str,
        bytes: Vec<u8>,
        _content_type: &str,
    ) -> Result<String, GatewayError> {
        let path = format!("tirths/{}/{}", site_id, Utc::now().timestamp_millis());
        self.data.write().await.images.insert(path.clone(), bytes);
        Ok(format!("fixture://{path}"))
    }

    async fn save_route(&self, route: NewRoute) -> Result<String, GatewayError> {
        route.validate()?;
        let id = auto_id();
        let mut data = self.data.write().await;
        data.routes
            .insert(id.clone(), route.into_route(id.clone(), Utc::now()));
        Ok(id)
    }

    async fn fetch_user_routes(&self, user_id: &str) -> Result<Vec<Route>, GatewayError> {
        let data = self.data.read().await;
        let mut routes: Vec<Route> = data
            .routes
            .values()
            .filter(|r| r.user_id == user_id)
            .cloned()
            .collect();
        routes.sort_by(|a, b| b.created_at.cmp(&a.created_at));
        Ok(routes)
    }

    async fn delete_route(&self, id: &str) -> Result<(), GatewayError> {
        self.data
            .write()
            .await
            .routes
            .remove(id)
            .map(|_| ())
            .ok_or(GatewayError::NotFound(ROUTE_NOT_FOUND))
    }

    async fn fetch_events(&self) -> Result<Vec<Event>, GatewayError> {
        let mut events = self.data.read().await.events.clone();
        events.sort_by_key(|e| e.date);
        Ok(events)
    }

    async fn fetch_upcoming_events(&self, today: NaiveDate) -> Result<Vec<Event>, GatewayError> {
        let (upcoming, _) = crate::domain::partition_events(self.fetch_events().await?, today);
        Ok(upcoming)
    }

    async fn fetch_past_events(&self, today: NaiveDate) -> Result<Vec<Event>, GatewayError> {
        let (_, past) = crate::domain::partition_events(self.fetch_events().await?, today);
        Ok(past)
    }

    async fn add_review(&self, review: NewReview) -> Result<String, GatewayError> {
        let id = auto_id();
        let rating = review.rating;
        let site_id = review.site_id.clone();

        self.data
            .write()
            .await
            .reviews
            .push(review.into_review(id.clone(), Utc::now()));

        // Same read-then-write as the remote store; not atomic.
        let current = match self.data.read().await.sites.get(&site_id) {
            Some(site) => site.rating_summary(),
            None => return Ok(id),
        };
        let updated = current.with_review(rating);
        self.update_site(&site_id, SiteUpdate::rating(updated))
            .await?;

        Ok(id)
    }

    async fn fetch_site_reviews(&self, site_id: &str) -> Result<Vec<Review>, GatewayError> {
        let data = self.data.read().await;
        let mut reviews: Vec<Review> = data
            .reviews
            .iter()
            .filter(|r| r.site_id == site_id)
            .cloned()
            .collect();
        reviews.sort_by(|a, b| b.date.cmp(&a.date));
        Ok(reviews)
    }

    async fn create_user_profile(&self, profile: &UserProfile) -> Result<(), GatewayError> {
        self.data
            .write()
            .await
            .users
            .insert(profile.uid.clone(), profile.clone());
        Ok(())
    }

    async fn fetch_user_profile(&self, uid: &str) -> Result<UserProfile, GatewayError> {
        self.data
            .read()
            .await
            .users
            .get(uid)
            .cloned()
            .ok_or(GatewayError::NotFound(USER_NOT_FOUND))
    }

    async fn update_user_preferences(
        &self,
        uid: &str,
        preferences: &UserPreferences,
    ) -> Result<(), GatewayError> {
        let mut data = self.data.write().await;
        let user = data
            .users
            .get_mut(uid)
            .ok_or(GatewayError::NotFound(USER_NOT_FOUND))?;
        user.preferences = preferences.clone();
        Ok(())
    }

    fn set_session_token(&self, id_token: Option<String>) {
        if let Ok(mut session) = self.session.lock() {
            *session = id_token;
        }
    }
}

/// In-memory [`Authenticator`] keyed by email.
#[derive(Default)]
pub struct FixtureAuth {
    accounts: Mutex<BTreeMap<String, (String, AuthUser)>>,
}

impl FixtureAuth {
    pub fn new() -> Self {
        Self::default()
    }
}

#[async_trait]
impl Authenticator for FixtureAuth {
    async fn register(
        &self,
        email: &str,
        password: &str,
        display_name: &str,
    ) -> Result<AuthUser, AuthError> {
        if password.len() < 6 {
            return Err(AuthError::WeakPassword);
        }
        let mut accounts = self.accounts.lock().await;
        if accounts.contains_key(email) {
            return Err(AuthError::EmailExists);
        }
        let uid = auto_id();
        let user = AuthUser {
            id_token: Some(format!("fixture-token-{uid}")),
            uid,
            email: Some(email.to_string()),
            display_name: Some(display_name.to_string()),
        };
        accounts.insert(email.to_string(), (password.to_string(), user.clone()));
        Ok(user)
    }

    async fn sign_in(&self, email: &str, password: &str) -> Result<AuthUser, AuthError> {
        let accounts = self.accounts.lock().await;
        match accounts.get(email) {
            Some((stored, user)) if stored == password => Ok(user.clone()),
            _ => Err(AuthError::InvalidCredentials),
        }
    }

    async fn sign_out(&self) -> Result<(), AuthError> {
        Ok(())
    }

    async fn reset_password(&self, email: &str) -> Result<(), AuthError> {
        if self.accounts.lock().await.contains_key(email) {
            Ok(())
        } else {
            Err(AuthError::UserNotFound)
        }
    }
}

/// Built-in site with the shared opening hours and festival.
fn sample_site(id: &str, site: NewSite, rating: RatingSummary) -> Site {
    let mut site = NewSite {
        timings: "6:00 AM - 7:00 PM".to_string(),
        events: vec![SiteEvent {
            name: "Paryushan".to_string(),
            date: "August-September".to_string(),
            description: None,
        }],
        ..site
    }
    .into_site(id.to_string(), Utc::now());
    site.apply_rating(rating);
    site
}

fn tags(facilities: &[&str]) -> Vec<String> {
    facilities.iter().map(|f| f.to_string()).collect()
}

fn sample_sites() -> Vec<Site> {
    vec![
        sample_site(
            "1",
            NewSite {
                description: "A hill with more than 900 temples.".to_string(),
                facilities: tags(&["Parking", "Restrooms", "Guides", "Dharamshala", "Bhojanshala"]),
                founded_year: Some(1100),
                ..NewSite::new(
                    "Palitana Temples",
                    Denomination::Shwetambar,
                    Coordinate::new(21.4859, 71.8496),
                )
            },
            RatingSummary { mean: 4.8, count: 245 },
        ),
        sample_site(
            "2",
            NewSite {
                description: "Dedicated to Tirthankara Rishabhanatha; 1444 carved marble pillars."
                    .to_string(),
                facilities: tags(&["Parking", "Restrooms", "Guides", "Accommodation"]),
                founded_year: Some(1437),
                ..NewSite::new(
                    "Ranakpur Temple",
                    Denomination::Digambar,
                    Coordinate::new(25.1162, 73.4872),
                )
            },
            RatingSummary { mean: 4.6, count: 189 },
        ),
        sample_site(
            "3",
            NewSite {
                description: "Marble temples on Mount Abu.".to_string(),
                facilities: tags(&["Parking", "Restrooms", "Guides", "Meditation Hall"]),
                founded_year: Some(1031),
                ..NewSite::new(
                    "Dilwara Temples",
                    Denomination::Shwetambar,
                    Coordinate::new(24.6167, 72.7167),
                )
            },
            RatingSummary { mean: 4.9, count: 320 },
        ),
    ]
}

fn sample_event(
    id: &str,
    name: &str,
    location: &str,
    date: (i32, u32, u32),
    site: &str,
) -> Option<Event> {
    Some(Event {
        id: id.to_string(),
        name: name.to_string(),
        location: location.to_string(),
        date: NaiveDate::from_ymd_opt(date.0, date.1, date.2)?,
        time: "6:00 AM - 8:00 PM".to_string(),
        description: String::new(),
        image: String::new(),
        site_id: Some(site.to_string()),
        created_at: None,
    })
}

fn sample_events() -> Vec<Event> {
    [
        sample_event("e1", "Paryushan Parva", "Palitana", (2025, 8, 20), "1"),
        sample_event("e2", "Mahavir Jayanti", "Ranakpur", (2027, 4, 19), "2"),
        sample_event("e3", "Kartik Purnima Yatra", "Palitana", (2027, 11, 14), "1"),
    ]
    .into_iter()
    .flatten()
    .collect()
}

#[cfg(test)]
mod tests {
    use std::collections::HashSet;

    use super::*;
    use crate::domain::RoutePoint;

    fn date(y: i32, m: u32, d: u32) -> NaiveDate {
        NaiveDate::from_ymd_opt(y, m, d).unwrap()
    }

    #[tokio::test]
    async fn builtin_has_samples() {
        let source = FixtureSource::builtin();
        assert_eq!(source.site_count().await, 3);
        let site = source.fetch_site("2").await.unwrap();
        assert_eq!(site.name, "Ranakpur Temple");
        assert_eq!(site.denomination, Denomination::Digambar);
        assert_eq!((site.rating, site.review_count), (Some(4.6), Some(189)));
        assert_eq!(site.founded_year, Some(1437));
        assert_eq!(site.timings, "6:00 AM - 7:00 PM");
        assert_eq!(site.events[0].name, "Paryushan");
        assert!(site.facilities.contains(&"Accommodation".to_string()));
    }

    #[tokio::test]
    async fn unknown_site_is_not_found() {
        let source = FixtureSource::builtin();
        let err = source.fetch_site("missing").await.unwrap_err();
        assert_eq!(err.to_string(), "Tirth not found");
    }

    #[tokio::test]
    async fn pages_follow_name_order() {
        let source = FixtureSource::builtin();

        let first = source.fetch_sites(PageRequest::first(2)).await.unwrap();
        let names: Vec<_> = first.items.iter().map(|s| s.name.as_str()).collect();
        assert_eq!(names, ["Dilwara Temples", "Palitana Temples"]);
        let cursor = first.next.expect("more pages");

        let second = source
            .fetch_sites(PageRequest::after(cursor, 2))
            .await
            .unwrap();
        assert_eq!(second.items.len(), 1);
        assert_eq!(second.items[0].name, "Ranakpur Temple");
        assert!(second.next.is_none());
    }

    #[tokio::test]
    async fn by_type_filters() {
        let source = FixtureSource::builtin();
        let sites = source
            .fetch_sites_by_type(Denomination::Shwetambar)
            .await
            .unwrap();
        let ids: HashSet<_> = sites.iter().map(|s| s.id.as_str()).collect();
        assert_eq!(ids, HashSet::from(["1", "3"]));
    }

    #[tokio::test]
    async fn near_uses_radius() {
        let source = FixtureSource::builtin();
        // Mount Abu town, a few km from Dilwara.
        let abu = Coordinate::new(24.5926, 72.7156);
        let near = source.fetch_sites_near(abu, 10.0).await.unwrap();
        assert_eq!(near.len(), 1);
        assert_eq!(near[0].id, "3");
    }

    #[tokio::test]
    async fn add_update_delete_site() {
        let source = FixtureSource::new();
        let id = source
            .add_site(NewSite::new(
                "Shikharji",
                Denomination::Digambar,
                Coordinate::new(23.9610, 86.1360),
            ))
            .await
            .unwrap();

        let created = source.fetch_site(&id).await.unwrap();
        assert!(created.created_at.is_some());
        assert_eq!(created.created_at, created.updated_at);

        source
            .update_site(
                &id,
                SiteUpdate {
                    timings: Some("5:00 AM - 9:00 PM".into()),
                    ..SiteUpdate::default()
                },
            )
            .await
            .unwrap();
        assert_eq!(source.fetch_site(&id).await.unwrap().timings, "5:00 AM - 9:00 PM");

        source.delete_site(&id).await.unwrap();
        assert!(source.fetch_site(&id).await.unwrap_err().is_not_found());
    }

    #[tokio::test]
    async fn add_site_validates() {
        let source = FixtureSource::new();
        let err = source
            .add_site(NewSite::new("", Denomination::Digambar, Coordinate::new(0.0, 0.0)))
            .await
            .unwrap_err();
        assert!(matches!(err, GatewayError::InvalidInput(_)));
    }

    #[tokio::test]
    async fn review_updates_running_mean() {
        let source = FixtureSource::builtin();
        let review = NewReview::new("u1", "Asha", "2", 3.0, Some("Beautiful".into())).unwrap();
        source.add_review(review).await.unwrap();

        let site = source.fetch_site("2").await.unwrap();
        assert_eq!(site.review_count, Some(190));
        let expected = (4.6 * 189.0 + 3.0) / 190.0;
        assert!((site.rating.unwrap() - expected).abs() < 1e-12);

        let reviews = source.fetch_site_reviews("2").await.unwrap();
        assert_eq!(reviews.len(), 1);
        assert_eq!(reviews[0].comment.as_deref(), Some("Beautiful"));
    }

    #[tokio::test]
    async fn review_of_unknown_site_is_still_stored() {
        let source = FixtureSource::new();
        let review = NewReview::new("u1", "Asha", "ghost", 4.0, None).unwrap();
        source.add_review(review).await.unwrap();
        assert_eq!(source.fetch_site_reviews("ghost").await.unwrap().len(), 1);
    }

    #[tokio::test]
    async fn routes_are_per_user() {
        let source = FixtureSource::new();
        let route = |user: &str| NewRoute {
            user_id: user.into(),
            origin: RoutePoint::new("Delhi", Coordinate::new(28.7041, 77.1025)),
            destination: RoutePoint::new("Jaipur", Coordinate::new(26.9124, 75.7873)),
            date: date(2026, 10, 18),
            site_count: 0,
            thumbnail: String::new(),
        };

        let id = source.save_route(route("u1")).await.unwrap();
        source.save_route(route("u2")).await.unwrap();

        let mine = source.fetch_user_routes("u1").await.unwrap();
        assert_eq!(mine.len(), 1);
        assert_eq!(mine[0].id, id);

        source.delete_route(&id).await.unwrap();
        assert!(source.fetch_user_routes("u1").await.unwrap().is_empty());
        assert!(source.delete_route(&id).await.unwrap_err().is_not_found());
    }

    #[tokio::test]
    async fn events_split_on_today() {
        let source = FixtureSource::builtin();
        let today = date(2026, 10, 18);

        let upcoming = source.fetch_upcoming_events(today).await.unwrap();
        let past = source.fetch_past_events(today).await.unwrap();

        assert_eq!(upcoming.iter().map(|e| e.id.as_str()).collect::<Vec<_>>(), ["e2", "e3"]);
        assert_eq!(past.iter().map(|e| e.id.as_str()).collect::<Vec<_>>(), ["e1"]);
    }

    #[tokio::test]
    async fn user_profiles() {
        let source = FixtureSource::new();
        assert_eq!(
            source.fetch_user_profile("u1").await.unwrap_err().to_string(),
            "User not found"
        );

        source
            .create_user_profile(&UserProfile::new("u1", None, Some("Asha".into())))
            .await
            .unwrap();
        let prefs = UserPreferences {
            dark_mode: true,
            ..UserPreferences::default()
        };
        source.update_user_preferences("u1", &prefs).await.unwrap();
        assert!(source.fetch_user_profile("u1").await.unwrap().preferences.dark_mode);
    }

    #[tokio::test]
    async fn image_upload_is_retrievable() {
        let source = FixtureSource::new();
        let url = source
            .upload_site_image("1", vec![1, 2, 3], "image/jpeg")
            .await
            .unwrap();
        let path = url.strip_prefix("fixture://").unwrap();
        assert!(path.starts_with("tirths/1/"));
        assert_eq!(source.image(path).await, Some(vec![1, 2, 3]));
    }

    #[tokio::test]
    async fn from_dir_loads_json() {
        let dir = tempfile::tempdir().unwrap();
        let sites = serde_json::json!([{
            "id": "x",
            "name": "Shravanabelagola",
            "type": "Digambar",
            "location": { "latitude": 12.8540, "longitude": 76.4843 }
        }]);
        std::fs::write(dir.path().join("sites.json"), sites.to_string()).unwrap();

        let source = FixtureSource::from_dir(dir.path()).unwrap();
        assert_eq!(source.site_count().await, 1);
        assert!(source.fetch_events().await.unwrap().is_empty());
    }

    #[test]
    fn from_dir_without_sites_fails() {
        let dir = tempfile::tempdir().unwrap();
        assert!(FixtureSource::from_dir(dir.path()).is_err());
    }

    #[tokio::test]
    async fn fixture_auth_round_trip() {
        let auth = FixtureAuth::new();
        let user = auth.register("a@example.com", "secret1", "Asha").await.unwrap();
        assert_eq!(user.display_name.as_deref(), Some("Asha"));

        assert!(matches!(
            auth.register("a@example.com", "secret1", "Asha").await,
            Err(AuthError::EmailExists)
        ));
        assert!(matches!(
            auth.sign_in("a@example.com", "wrong").await,
            Err(AuthError::InvalidCredentials)
        ));

        let signed_in = auth.sign_in("a@example.com", "secret1").await.unwrap();
        assert_eq!(signed_in.uid, user.uid);
        assert!(user.id_token.is_some());
        assert_eq!(signed_in.id_token, user.id_token);
        assert!(auth.reset_password("b@example.com").await.is_err());
    }
}
