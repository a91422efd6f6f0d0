//! Data transfer objects for web requests and responses.

use chrono::NaiveDate;
use serde::{Deserialize, Serialize};

use crate::domain::{Coordinate, FiltersPatch, RoutePoint, Site};
use crate::gateway::Cursor;

/// Default radius for near-point queries, in kilometres.
pub const DEFAULT_NEAR_RADIUS_KM: f64 = 50.0;

/// Query for `GET /sites`.
#[derive(Debug, Default, Deserialize)]
pub struct SitesQuery {
    /// Continuation token from a previous page
    pub cursor: Option<String>,

    pub page_size: Option<usize>,

    /// Denomination filter; disables paging when set
    #[serde(rename = "type")]
    pub denomination: Option<String>,
}

#[derive(Debug, Serialize)]
pub struct SitesResponse {
    pub sites: Vec<Site>,
    pub next: Option<Cursor>,
}

/// Query for `GET /sites/near`.
#[derive(Debug, Deserialize)]
pub struct NearQuery {
    pub lat: f64,
    pub lon: f64,
    pub radius_km: Option<f64>,
}

impl NearQuery {
    pub fn center(&self) -> Coordinate {
        Coordinate::new(self.lat, self.lon)
    }
}

/// Which events `GET /events` returns.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum EventWindow {
    #[default]
    All,
    Upcoming,
    Past,
}

#[derive(Debug, Default, Deserialize)]
pub struct EventsQuery {
    #[serde(default)]
    pub when: EventWindow,
}

/// Body of `POST /routes/search`.
#[derive(Debug, Deserialize)]
pub struct SearchRouteRequest {
    pub origin: Option<RoutePoint>,
    pub destination: Option<RoutePoint>,

    /// Overrides on top of the default filters
    #[serde(default)]
    pub filters: FiltersPatch,
}

/// Body of `POST /routes`: plan and save in one step.
#[derive(Debug, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct SaveRouteRequest {
    pub user_id: String,
    pub origin: RoutePoint,
    pub destination: RoutePoint,
    #[serde(default)]
    pub filters: FiltersPatch,

    /// Travel date; defaults to today
    pub date: Option<NaiveDate>,
    #[serde(default)]
    pub thumbnail: String,
}

/// Body of `POST /reviews`.
#[derive(Debug, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct ReviewRequest {
    pub user_id: String,
    #[serde(default)]
    pub user_name: String,
    #[serde(rename = "tirthId")]
    pub site_id: String,
    pub rating: f64,
    pub comment: Option<String>,
}

#[derive(Debug, Serialize, Deserialize)]
pub struct CreatedResponse {
    pub id: String,
}

#[derive(Debug, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct SavedRouteResponse {
    pub id: String,
    pub site_count: usize,
}

#[derive(Debug, Serialize, Deserialize)]
pub struct UploadResponse {
    pub url: String,
}

/// Error response.
#[derive(Debug, Serialize)]
pub struct ErrorResponse {
    pub error: String,
}
