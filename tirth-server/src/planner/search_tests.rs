//! Unit tests for the along-route search.

use std::sync::Mutex;

use async_trait::async_trait;
use chrono::{Duration, NaiveDate, Utc};

use super::search::{sites_along, waypoints};
use super::*;
use crate::domain::test_support::east_of;
use crate::domain::{
    Coordinate, Denomination, Event, Filters, NewReview, NewRoute, NewSite, Review, Route,
    RoutePoint, Site, SiteUpdate, UserPreferences, UserProfile,
};
use crate::gateway::{DataSource, GatewayError, Page, PageRequest};

fn today() -> NaiveDate {
    NaiveDate::from_ymd_opt(2026, 10, 18).unwrap()
}

fn south() -> Coordinate {
    Coordinate::new(25.0, 75.0)
}

fn north() -> Coordinate {
    Coordinate::new(27.0, 75.0)
}

fn middle() -> Coordinate {
    south().midpoint(north())
}

fn query() -> RouteQuery {
    RouteQuery::new(
        RoutePoint::new("South", south()),
        RoutePoint::new("North", north()),
    )
}

fn site(id: &str, denomination: Denomination, location: Coordinate) -> Site {
    NewSite::new(format!("Site {id}"), denomination, location).into_site(id.to_string(), Utc::now())
}

fn unexpected<T>() -> Result<T, GatewayError> {
    Err(GatewayError::provider("unexpected call"))
}

/// Mock data source for testing.
struct MockSource {
    sites: Vec<Site>,
    fetch_count: Mutex<usize>,
    saved: Mutex<Vec<NewRoute>>,
}

impl MockSource {
    fn new(sites: Vec<Site>) -> Self {
        Self {
            sites,
            fetch_count: Mutex::new(0),
            saved: Mutex::new(Vec::new()),
        }
    }

    fn fetch_count(&self) -> usize {
        *self.fetch_count.lock().unwrap()
    }
}

#[async_trait]
impl DataSource for MockSource {
    async fn fetch_sites(&self, _page: PageRequest) -> Result<Page<Site>, GatewayError> {
        *self.fetch_count.lock().unwrap() += 1;
        Ok(Page {
            items: self.sites.clone(),
            next: None,
        })
    }

    async fn fetch_sites_by_type(&self, _: Denomination) -> Result<Vec<Site>, GatewayError> {
        unexpected()
    }

    async fn fetch_site(&self, _: &str) -> Result<Site, GatewayError> {
        unexpected()
    }

    async fn add_site(&self, _: NewSite) -> Result<String, GatewayError> {
        unexpected()
    }

    async fn update_site(&self, _: &str, _: SiteUpdate) -> Result<(), GatewayError> {
        unexpected()
    }

    async fn delete_site(&self, _: &str) -> Result<(), GatewayError> {
        unexpected()
    }

    async fn upload_site_image(
        &self,
        _: &str,
        _: Vec<u8>,
        _: &str,
    ) -> Result<String, GatewayError> {
        unexpected()
    }

    async fn save_route(&self, route: NewRoute) -> Result<String, GatewayError> {
        route.validate()?;
        let mut saved = self.saved.lock().unwrap();
        saved.push(route);
        Ok(format!("route-{}", saved.len()))
    }

    async fn fetch_user_routes(&self, _: &str) -> Result<Vec<Route>, GatewayError> {
        unexpected()
    }

    async fn delete_route(&self, _: &str) -> Result<(), GatewayError> {
        unexpected()
    }

    async fn fetch_events(&self) -> Result<Vec<Event>, GatewayError> {
        unexpected()
    }

    async fn fetch_upcoming_events(&self, _: NaiveDate) -> Result<Vec<Event>, GatewayError> {
        unexpected()
    }

    async fn fetch_past_events(&self, _: NaiveDate) -> Result<Vec<Event>, GatewayError> {
        unexpected()
    }

    async fn add_review(&self, _: NewReview) -> Result<String, GatewayError> {
        unexpected()
    }

    async fn fetch_site_reviews(&self, _: &str) -> Result<Vec<Review>, GatewayError> {
        unexpected()
    }

    async fn create_user_profile(&self, _: &UserProfile) -> Result<(), GatewayError> {
        unexpected()
    }

    async fn fetch_user_profile(&self, _: &str) -> Result<UserProfile, GatewayError> {
        unexpected()
    }

    async fn update_user_preferences(
        &self,
        _: &str,
        _: &UserPreferences,
    ) -> Result<(), GatewayError> {
        unexpected()
    }
}

#[tokio::test]
async fn site_within_threshold_is_found() {
    let source = MockSource::new(vec![
        site("near", Denomination::Digambar, east_of(middle(), 4.0)),
        site("far", Denomination::Digambar, east_of(middle(), 6.0)),
    ]);
    let config = SearchConfig::default();
    let planner = RoutePlanner::new(&source, &config);

    let plan = planner
        .plan(&query(), &Filters::default(), today())
        .await
        .unwrap()
        .expect("both ends set");

    let ids: Vec<_> = plan.sites.iter().map(|s| s.site.id.as_str()).collect();
    assert_eq!(ids, ["near"]);
    assert!((plan.sites[0].distance_km - 4.0).abs() < 0.05);
}

#[tokio::test]
async fn site_near_the_ends_is_found() {
    // Close to the origin but far from the midpoint.
    let source = MockSource::new(vec![site(
        "start",
        Denomination::Shwetambar,
        east_of(south(), 2.0),
    )]);
    let config = SearchConfig::default();
    let planner = RoutePlanner::new(&source, &config);

    let plan = planner
        .plan(&query(), &Filters::default(), today())
        .await
        .unwrap()
        .unwrap();
    assert_eq!(plan.sites.len(), 1);
}

#[tokio::test]
async fn unset_end_does_no_work() {
    let source = MockSource::new(vec![site("a", Denomination::Digambar, middle())]);
    let config = SearchConfig::default();
    let planner = RoutePlanner::new(&source, &config);

    let only_origin = RouteQuery {
        origin: Some(RoutePoint::new("South", south())),
        destination: None,
    };
    assert!(
        planner
            .plan(&only_origin, &Filters::default(), today())
            .await
            .unwrap()
            .is_none()
    );
    assert!(
        planner
            .plan(&RouteQuery::default(), &Filters::default(), today())
            .await
            .unwrap()
            .is_none()
    );
    assert_eq!(source.fetch_count(), 0);
}

#[tokio::test]
async fn distance_and_duration() {
    let source = MockSource::new(Vec::new());
    let config = SearchConfig::default();
    let planner = RoutePlanner::new(&source, &config);

    let delhi = RoutePoint::new("Delhi", Coordinate::new(28.7041, 77.1025));
    let jaipur = RoutePoint::new("Jaipur", Coordinate::new(26.9124, 75.7873));
    let plan = planner
        .plan(&RouteQuery::new(delhi, jaipur), &Filters::default(), today())
        .await
        .unwrap()
        .unwrap();

    assert!((plan.distance_km - 237.5).abs() < 1.0);
    assert_eq!(
        Duration::minutes(plan.duration_minutes),
        config.travel_time(plan.distance_km)
    );
    assert_eq!(plan.waypoints.len(), 3);
    assert!(plan.sites.is_empty());
}

#[tokio::test]
async fn denomination_filter_applies() {
    let source = MockSource::new(vec![
        site("d", Denomination::Digambar, middle()),
        site("s", Denomination::Shwetambar, middle()),
    ]);
    let config = SearchConfig::default();
    let planner = RoutePlanner::new(&source, &config);
    let filters = Filters {
        digambar: false,
        ..Filters::default()
    };

    let plan = planner.plan(&query(), &filters, today()).await.unwrap().unwrap();
    let ids: Vec<_> = plan.sites.iter().map(|s| s.site.id.as_str()).collect();
    assert_eq!(ids, ["s"]);
}

#[tokio::test]
async fn invalid_coordinates_are_rejected() {
    let source = MockSource::new(Vec::new());
    let config = SearchConfig::default();
    let planner = RoutePlanner::new(&source, &config);

    let bad = RouteQuery::new(
        RoutePoint::new("Nowhere", Coordinate::new(f64::NAN, 75.0)),
        RoutePoint::new("North", north()),
    );
    let err = planner.plan(&bad, &Filters::default(), today()).await.unwrap_err();
    assert!(matches!(err, SearchError::InvalidRequest(_)));
    assert_eq!(source.fetch_count(), 0);
}

#[tokio::test]
async fn save_denormalises_site_count() {
    let source = MockSource::new(vec![
        site("a", Denomination::Digambar, east_of(middle(), 1.0)),
        site("b", Denomination::Shwetambar, east_of(middle(), 2.0)),
    ]);
    let config = SearchConfig::default();
    let planner = RoutePlanner::new(&source, &config);

    let plan = planner
        .plan(&query(), &Filters::default(), today())
        .await
        .unwrap()
        .unwrap();
    let id = planner.save(&plan, "u1", "", today()).await.unwrap();

    assert_eq!(id, "route-1");
    let saved = source.saved.lock().unwrap();
    assert_eq!(saved[0].site_count, 2);
    assert_eq!(saved[0].origin.name, "South");
    assert_eq!(saved[0].date, today());
}

#[tokio::test]
async fn save_requires_user() {
    let source = MockSource::new(Vec::new());
    let config = SearchConfig::default();
    let planner = RoutePlanner::new(&source, &config);
    let plan = planner
        .plan(&query(), &Filters::default(), today())
        .await
        .unwrap()
        .unwrap();

    let err = planner.save(&plan, "", "", today()).await.unwrap_err();
    assert!(matches!(err, SearchError::Source(GatewayError::InvalidInput(_))));
}

#[test]
fn sites_are_nearest_first_and_capped() {
    let sites = vec![
        site("c", Denomination::Digambar, east_of(middle(), 3.0)),
        site("a", Denomination::Digambar, east_of(middle(), 1.0)),
        site("b", Denomination::Digambar, east_of(middle(), 2.0)),
    ];

    let found = sites_along(sites.clone(), south(), north(), &Filters::default(), 2026, 10);
    let ids: Vec<_> = found.iter().map(|s| s.site.id.as_str()).collect();
    assert_eq!(ids, ["a", "b", "c"]);

    let capped = sites_along(sites, south(), north(), &Filters::default(), 2026, 2);
    assert_eq!(capped.len(), 2);
}

#[test]
fn era_filter_uses_founding_year() {
    let mut old = site("old", Denomination::Digambar, middle());
    old.founded_year = Some(1437);
    let mut new = site("new", Denomination::Digambar, middle());
    new.founded_year = Some(1990);
    let unknown = site("unknown", Denomination::Digambar, middle());

    let filters = Filters {
        modern: false,
        ..Filters::default()
    };
    let found = sites_along(vec![old, new, unknown], south(), north(), &filters, 2026, 10);
    let mut ids: Vec<_> = found.iter().map(|s| s.site.id.as_str()).collect();
    ids.sort();
    assert_eq!(ids, ["old", "unknown"]);
}

#[test]
fn waypoints_collapse_for_same_point() {
    assert_eq!(waypoints(south(), south()), vec![south()]);
    assert_eq!(waypoints(south(), north()), vec![south(), middle(), north()]);
}
