//! Domain types for the tirth finder.
//!
//! Sites, routes, events, reviews and user records, plus the geo helpers
//! and filters the route search is built from. Payload types validate on
//! construction so the gateway never stores obviously bad data.

mod error;
mod event;
mod filters;
mod geo;
mod review;
mod route;
mod site;
mod user;

pub use error::DomainError;
pub use event::{Event, EventTiming, partition_events};
pub use filters::{Filters, FiltersPatch, HISTORICAL_AGE_YEARS};
pub use geo::{Coordinate, EARTH_RADIUS_KM, distance_km, distance_to_segment_km};
pub use review::{MAX_RATING, NewReview, RatingSummary, Review};
pub use route::{NewRoute, Route, RoutePoint};
pub use site::{Amenity, Denomination, NewSite, Site, SiteEvent, SiteUpdate};
pub use user::{PreferenceKey, PreferenceValue, UserPreferences, UserProfile};

#[cfg(test)]
pub(crate) use geo::test_support;
