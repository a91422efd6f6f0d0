//! Along-route site search.
//!
//! Builds display waypoints, a distance and duration estimate, and the list
//! of sites near the straight segment between origin and destination.

use chrono::{Datelike, NaiveDate};
use serde::Serialize;
use tracing::debug;

use crate::domain::{
    Coordinate, Filters, NewRoute, RoutePoint, Site, distance_km, distance_to_segment_km,
};
use crate::gateway::{DataSource, GatewayError};

use super::config::SearchConfig;

/// Error from route search.
#[derive(Debug, thiserror::Error)]
pub enum SearchError {
    /// Failed to read or write sites
    #[error("data source error: {0}")]
    Source(#[from] GatewayError),

    /// Invalid search request
    #[error("invalid search request: {0}")]
    InvalidRequest(String),
}

/// Request for a route search. Either end may still be unset while the user
/// is picking places.
#[derive(Debug, Clone, Default, PartialEq)]
pub struct RouteQuery {
    pub origin: Option<RoutePoint>,
    pub destination: Option<RoutePoint>,
}

impl RouteQuery {
    pub fn new(origin: RoutePoint, destination: RoutePoint) -> Self {
        Self {
            origin: Some(origin),
            destination: Some(destination),
        }
    }

    /// Both ends, if both are set.
    pub fn endpoints(&self) -> Option<(&RoutePoint, &RoutePoint)> {
        Some((self.origin.as_ref()?, self.destination.as_ref()?))
    }
}

fn check_coordinate(which: &str, c: Coordinate) -> Result<(), SearchError> {
    let valid = c.latitude.is_finite()
        && c.longitude.is_finite()
        && (-90.0..=90.0).contains(&c.latitude)
        && (-180.0..=180.0).contains(&c.longitude);
    if valid {
        Ok(())
    } else {
        Err(SearchError::InvalidRequest(format!(
            "{which} coordinate out of range: ({}, {})",
            c.latitude, c.longitude
        )))
    }
}

/// A site on the way, with its distance from the route segment.
#[derive(Debug, Clone, PartialEq, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct PlannedSite {
    pub site: Site,
    pub distance_km: f64,
}

/// Result of a route search.
#[derive(Debug, Clone, PartialEq, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct RoutePlan {
    pub origin: RoutePoint,
    pub destination: RoutePoint,

    /// Polyline for display: origin, midpoint, destination.
    pub waypoints: Vec<Coordinate>,

    /// Straight-line distance between the ends.
    pub distance_km: f64,

    /// Estimated driving time at the configured average speed.
    pub duration_minutes: i64,

    /// Sites near the route, nearest first.
    pub sites: Vec<PlannedSite>,
}

impl RoutePlan {
    /// Save payload for this plan. The site count is the number of sites found.
    pub fn to_new_route(&self, user_id: &str, thumbnail: &str, date: NaiveDate) -> NewRoute {
        NewRoute {
            user_id: user_id.to_string(),
            origin: self.origin.clone(),
            destination: self.destination.clone(),
            date,
            site_count: self.sites.len().try_into().unwrap_or(u32::MAX),
            thumbnail: thumbnail.to_string(),
        }
    }
}

/// Display waypoints. Collapses to one point when the ends coincide.
pub fn waypoints(origin: Coordinate, destination: Coordinate) -> Vec<Coordinate> {
    if origin == destination {
        vec![origin]
    } else {
        vec![origin, origin.midpoint(destination), destination]
    }
}

/// Keep the sites within `filters.max_distance_km` of the segment that the
/// filters admit, nearest first, at most `limit`.
pub fn sites_along(
    sites: Vec<Site>,
    origin: Coordinate,
    destination: Coordinate,
    filters: &Filters,
    current_year: i32,
    limit: usize,
) -> Vec<PlannedSite> {
    let mut found: Vec<PlannedSite> = sites
        .into_iter()
        .filter(|site| filters.admits(site, current_year))
        .filter_map(|site| {
            let distance_km = distance_to_segment_km(site.location, origin, destination);
            (distance_km <= filters.max_distance_km).then_some(PlannedSite { site, distance_km })
        })
        .collect();

    found.sort_by(|a, b| {
        a.distance_km
            .total_cmp(&b.distance_km)
            .then_with(|| a.site.name.cmp(&b.site.name))
    });
    found.truncate(limit);
    found
}

/// Route planner over a data source.
pub struct RoutePlanner<'a, S: DataSource + ?Sized> {
    source: &'a S,
    config: &'a SearchConfig,
}

impl<'a, S: DataSource + ?Sized> RoutePlanner<'a, S> {
    /// Create a new planner.
    pub fn new(source: &'a S, config: &'a SearchConfig) -> Self {
        Self { source, config }
    }

    /// Plan a route.
    ///
    /// Returns `Ok(None)` without touching the data source when either end
    /// is unset.
    pub async fn plan(
        &self,
        query: &RouteQuery,
        filters: &Filters,
        today: NaiveDate,
    ) -> Result<Option<RoutePlan>, SearchError> {
        let Some((origin, destination)) = query.endpoints() else {
            return Ok(None);
        };
        check_coordinate("origin", origin.location)?;
        check_coordinate("destination", destination.location)?;

        let (from, to) = (origin.location, destination.location);
        let distance = distance_km(from, to);
        let duration = self.config.travel_time(distance);

        let all = self.source.fetch_all_sites().await?;
        let considered = all.len();
        let sites = sites_along(all, from, to, filters, today.year(), self.config.max_sites);

        debug!(
            origin = %origin.name,
            destination = %destination.name,
            distance_km = distance,
            considered,
            found = sites.len(),
            "Planned route"
        );

        Ok(Some(RoutePlan {
            origin: origin.clone(),
            destination: destination.clone(),
            waypoints: waypoints(from, to),
            distance_km: distance,
            duration_minutes: duration.num_minutes(),
            sites,
        }))
    }

    /// Persist a plan for a user, returning the saved route's id.
    pub async fn save(
        &self,
        plan: &RoutePlan,
        user_id: &str,
        thumbnail: &str,
        date: NaiveDate,
    ) -> Result<String, SearchError> {
        let route = plan.to_new_route(user_id, thumbnail, date);
        let id = self.source.save_route(route).await?;
        debug!(route = %id, user = user_id, sites = plan.sites.len(), "Saved route");
        Ok(id)
    }
}
