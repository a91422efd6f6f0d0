//! HTTP route handlers.

use axum::body::Bytes;
use axum::extract::rejection::{JsonRejection, QueryRejection};
use axum::{
    Json, Router,
    extract::{FromRequest, FromRequestParts, Path, Query, State},
    http::{HeaderMap, StatusCode, header},
    response::{IntoResponse, Response},
    routing::{delete, get, post},
};
use chrono::{Local, NaiveDate};
use tower_http::trace::TraceLayer;
use tracing::{debug, error};

use crate::domain::{
    Denomination, DomainError, Event, Filters, FiltersPatch, NewReview, NewSite, Review, Route,
    Site, SiteUpdate,
};
use crate::gateway::{Cursor, GatewayError, PageRequest};
use crate::planner::{RoutePlan, RoutePlanner, RouteQuery, SearchError};

use super::dto::*;
use super::state::AppState;

/// Create the application router.
pub fn create_router(state: AppState) -> Router {
    Router::new()
        .route("/health", get(health))
        .route("/sites", get(list_sites).post(add_site))
        .route("/sites/near", get(sites_near))
        .route(
            "/sites/:id",
            get(get_site).patch(update_site).delete(delete_site),
        )
        .route("/sites/:id/reviews", get(site_reviews))
        .route("/sites/:id/images", post(upload_image))
        .route("/reviews", post(add_review))
        .route("/routes", post(save_route))
        .route("/routes/search", post(search_route))
        .route("/routes/:id", delete(delete_route))
        .route("/users/:uid/routes", get(user_routes))
        .route("/events", get(events))
        .layer(TraceLayer::new_for_http())
        .with_state(state)
}

/// JSON body extractor whose rejections are [`AppError`]s.
#[derive(FromRequest)]
#[from_request(via(Json), rejection(AppError))]
pub struct ApiJson<T>(pub T);

/// Query-string extractor whose rejections are [`AppError`]s.
#[derive(FromRequestParts)]
#[from_request(via(Query), rejection(AppError))]
pub struct ApiQuery<T>(pub T);

fn today() -> NaiveDate {
    Local::now().date_naive()
}

fn filters_with(patch: FiltersPatch) -> Filters {
    let mut filters = Filters::default();
    filters.merge(patch);
    filters
}

/// Health check endpoint.
async fn health() -> &'static str {
    "ok"
}

/// One page of sites by name, or every site of one denomination.
async fn list_sites(
    State(state): State<AppState>,
    ApiQuery(req): ApiQuery<SitesQuery>,
) -> Result<Json<SitesResponse>, AppError> {
    if let Some(kind) = &req.denomination {
        let denomination: Denomination = kind.parse()?;
        let sites = state.source.fetch_sites_by_type(denomination).await?;
        return Ok(Json(SitesResponse { sites, next: None }));
    }

    let size = req.page_size.unwrap_or(crate::gateway::DEFAULT_PAGE_SIZE);
    let page = match req.cursor {
        Some(c) => PageRequest::after(Cursor::new(c), size),
        None => PageRequest::first(size),
    };
    let page = state.source.fetch_sites(page).await?;
    Ok(Json(SitesResponse {
        sites: page.items,
        next: page.next,
    }))
}

async fn sites_near(
    State(state): State<AppState>,
    ApiQuery(req): ApiQuery<NearQuery>,
) -> Result<Json<Vec<Site>>, AppError> {
    let radius = req.radius_km.unwrap_or(DEFAULT_NEAR_RADIUS_KM);
    if !radius.is_finite() || radius < 0.0 {
        return Err(AppError::BadRequest {
            message: format!("Invalid radius: {radius}"),
        });
    }
    let sites = state.source.fetch_sites_near(req.center(), radius).await?;
    Ok(Json(sites))
}

async fn get_site(
    State(state): State<AppState>,
    Path(id): Path<String>,
) -> Result<Json<Site>, AppError> {
    Ok(Json(state.source.fetch_site(&id).await?))
}

async fn add_site(
    State(state): State<AppState>,
    ApiJson(site): ApiJson<NewSite>,
) -> Result<(StatusCode, Json<CreatedResponse>), AppError> {
    let id = state.source.add_site(site).await?;
    Ok((StatusCode::CREATED, Json(CreatedResponse { id })))
}

async fn update_site(
    State(state): State<AppState>,
    Path(id): Path<String>,
    ApiJson(update): ApiJson<SiteUpdate>,
) -> Result<StatusCode, AppError> {
    state.source.update_site(&id, update).await?;
    Ok(StatusCode::NO_CONTENT)
}

async fn delete_site(
    State(state): State<AppState>,
    Path(id): Path<String>,
) -> Result<StatusCode, AppError> {
    state.source.delete_site(&id).await?;
    Ok(StatusCode::NO_CONTENT)
}

async fn site_reviews(
    State(state): State<AppState>,
    Path(id): Path<String>,
) -> Result<Json<Vec<Review>>, AppError> {
    Ok(Json(state.source.fetch_site_reviews(&id).await?))
}

/// Upload the raw request body as a site image.
async fn upload_image(
    State(state): State<AppState>,
    Path(id): Path<String>,
    headers: HeaderMap,
    body: Bytes,
) -> Result<(StatusCode, Json<UploadResponse>), AppError> {
    if body.is_empty() {
        return Err(AppError::BadRequest {
            message: "Empty image body".to_string(),
        });
    }
    let content_type = headers
        .get(header::CONTENT_TYPE)
        .and_then(|v| v.to_str().ok())
        .unwrap_or("application/octet-stream");

    let url = state
        .source
        .upload_site_image(&id, body.to_vec(), content_type)
        .await?;
    Ok((StatusCode::CREATED, Json(UploadResponse { url })))
}

async fn add_review(
    State(state): State<AppState>,
    ApiJson(req): ApiJson<ReviewRequest>,
) -> Result<(StatusCode, Json<CreatedResponse>), AppError> {
    let review = NewReview::new(req.user_id, req.user_name, req.site_id, req.rating, req.comment)?;
    let id = state.source.add_review(review).await?;
    Ok((StatusCode::CREATED, Json(CreatedResponse { id })))
}

async fn search_route(
    State(state): State<AppState>,
    ApiJson(req): ApiJson<SearchRouteRequest>,
) -> Result<Json<RoutePlan>, AppError> {
    let query = RouteQuery {
        origin: req.origin,
        destination: req.destination,
    };
    let planner = RoutePlanner::new(state.source.as_ref(), &state.config);
    let plan = planner
        .plan(&query, &filters_with(req.filters), today())
        .await?
        .ok_or_else(|| AppError::BadRequest {
            message: "Both origin and destination are required".to_string(),
        })?;
    Ok(Json(plan))
}

/// Plan a route and save it for a user.
async fn save_route(
    State(state): State<AppState>,
    ApiJson(req): ApiJson<SaveRouteRequest>,
) -> Result<(StatusCode, Json<SavedRouteResponse>), AppError> {
    let planner = RoutePlanner::new(state.source.as_ref(), &state.config);
    let today = today();
    let query = RouteQuery::new(req.origin, req.destination);

    let Some(plan) = planner
        .plan(&query, &filters_with(req.filters), today)
        .await?
    else {
        return Err(AppError::Internal {
            message: "Route planning returned no plan".to_string(),
        });
    };

    let date = req.date.unwrap_or(today);
    let id = planner.save(&plan, &req.user_id, &req.thumbnail, date).await?;
    Ok((
        StatusCode::CREATED,
        Json(SavedRouteResponse {
            id,
            site_count: plan.sites.len(),
        }),
    ))
}

async fn user_routes(
    State(state): State<AppState>,
    Path(uid): Path<String>,
) -> Result<Json<Vec<Route>>, AppError> {
    Ok(Json(state.source.fetch_user_routes(&uid).await?))
}

async fn delete_route(
    State(state): State<AppState>,
    Path(id): Path<String>,
) -> Result<StatusCode, AppError> {
    state.source.delete_route(&id).await?;
    Ok(StatusCode::NO_CONTENT)
}

async fn events(
    State(state): State<AppState>,
    ApiQuery(req): ApiQuery<EventsQuery>,
) -> Result<Json<Vec<Event>>, AppError> {
    let events = match req.when {
        EventWindow::All => state.source.fetch_events().await?,
        EventWindow::Upcoming => state.source.fetch_upcoming_events(today()).await?,
        EventWindow::Past => state.source.fetch_past_events(today()).await?,
    };
    Ok(Json(events))
}

/// Application error type.
#[derive(Debug)]
pub enum AppError {
    BadRequest { message: String },
    NotFound { message: String },
    Internal { message: String },
}

impl From<GatewayError> for AppError {
    fn from(e: GatewayError) -> Self {
        match e {
            GatewayError::NotFound(message) => AppError::NotFound {
                message: message.to_string(),
            },
            GatewayError::InvalidInput(e) => e.into(),
            e => AppError::Internal {
                message: e.to_string(),
            },
        }
    }
}

impl From<JsonRejection> for AppError {
    fn from(rejection: JsonRejection) -> Self {
        AppError::BadRequest {
            message: rejection.body_text(),
        }
    }
}

impl From<QueryRejection> for AppError {
    fn from(rejection: QueryRejection) -> Self {
        AppError::BadRequest {
            message: rejection.body_text(),
        }
    }
}

impl From<DomainError> for AppError {
    fn from(e: DomainError) -> Self {
        AppError::BadRequest {
            message: e.to_string(),
        }
    }
}

impl From<SearchError> for AppError {
    fn from(e: SearchError) -> Self {
        match e {
            SearchError::InvalidRequest(msg) => AppError::BadRequest { message: msg },
            SearchError::Source(e) => e.into(),
        }
    }
}

impl IntoResponse for AppError {
    fn into_response(self) -> Response {
        let (status, message) = match self {
            AppError::BadRequest { message } => (StatusCode::BAD_REQUEST, message),
            AppError::NotFound { message } => (StatusCode::NOT_FOUND, message),
            AppError::Internal { message } => (StatusCode::INTERNAL_SERVER_ERROR, message),
        };

        if status.is_server_error() {
            error!(%status, %message, "Request failed");
        } else {
            debug!(%status, %message, "Request rejected");
        }

        let body = Json(ErrorResponse { error: message });
        (status, body).into_response()
    }
}
