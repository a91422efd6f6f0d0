//! Route planner.
//!
//! Answers "which sites can I visit on the way from A to B?". There is no
//! road routing: the route is the straight segment between the two ends,
//! and a site is on the way when it lies within the filter's distance of
//! that segment.

mod config;
mod search;

#[cfg(test)]
mod search_tests;

pub use config::SearchConfig;
pub use search::{PlannedSite, RoutePlan, RoutePlanner, RouteQuery, SearchError};
