//! JSON API over the data source and route planner.

mod dto;
mod routes;
mod state;

pub use dto::*;
pub use routes::{ApiJson, ApiQuery, AppError, create_router};
pub use state::AppState;
