//! Jain pilgrimage site finder and route planner.
//!
//! Serves the site catalogue, events, reviews and saved routes over a JSON
//! API, and plans routes that pass near sites. Data comes from Firestore or
//! from in-memory fixtures.

pub mod cache;
pub mod config;
pub mod domain;
pub mod firebase;
pub mod gateway;
pub mod planner;
pub mod store;
pub mod web;
