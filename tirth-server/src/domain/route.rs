//! Saved routes between two named places.

use chrono::{DateTime, NaiveDate, Utc};
use serde::{Deserialize, Serialize};

use super::error::DomainError;
use super::geo::Coordinate;

/// A named end of a route.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct RoutePoint {
    pub name: String,
    pub location: Coordinate,
}

impl RoutePoint {
    pub fn new(name: impl Into<String>, location: Coordinate) -> Self {
        Self {
            name: name.into(),
            location,
        }
    }
}

/// A route a user saved after searching.
///
/// Immutable once stored; `site_count` is fixed at save time and never
/// re-validated.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct Route {
    pub id: String,
    pub user_id: String,
    pub origin: RoutePoint,
    pub destination: RoutePoint,
    pub date: NaiveDate,
    #[serde(rename = "tirthCount")]
    pub site_count: u32,
    #[serde(default)]
    pub thumbnail: String,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub created_at: Option<DateTime<Utc>>,
}

/// Payload for saving a route.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct NewRoute {
    pub user_id: String,
    pub origin: RoutePoint,
    pub destination: RoutePoint,
    pub date: NaiveDate,
    #[serde(rename = "tirthCount")]
    pub site_count: u32,
    #[serde(default)]
    pub thumbnail: String,
}

impl NewRoute {
    pub fn validate(&self) -> Result<(), DomainError> {
        if self.user_id.trim().is_empty() {
            return Err(DomainError::EmptyField("userId"));
        }
        if self.origin.name.trim().is_empty() {
            return Err(DomainError::EmptyField("origin"));
        }
        if self.destination.name.trim().is_empty() {
            return Err(DomainError::EmptyField("destination"));
        }
        Ok(())
    }

    pub fn into_route(self, id: String, created_at: DateTime<Utc>) -> Route {
        Route {
            id,
            user_id: self.user_id,
            origin: self.origin,
            destination: self.destination,
            date: self.date,
            site_count: self.site_count,
            thumbnail: self.thumbnail,
            created_at: Some(created_at),
        }
    }
}
