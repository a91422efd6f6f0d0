//! Firestore and Cloud Storage REST client.
//!
//! Implements [`DataSource`] over the Firestore v1 REST API. Writes go
//! through `documents:commit` so that server timestamps can be applied as
//! field transforms; reads use `documents.get`, `documents.list` and
//! `documents:runQuery`.

use std::sync::{Arc, RwLock};

use async_trait::async_trait;
use chrono::NaiveDate;
use serde::de::DeserializeOwned;
use tracing::{debug, warn};

use crate::domain::{
    Denomination, Event, NewReview, NewRoute, NewSite, Review, Route, Site, SiteUpdate,
    UserPreferences, UserProfile,
};
use crate::gateway::{
    Cursor, DataSource, GatewayError, Page, PageRequest, ROUTE_NOT_FOUND, SITE_NOT_FOUND,
    USER_NOT_FOUND, auto_id,
};

use super::config::FirebaseConfig;
use super::convert::{self, ConversionError};
use super::error::FirebaseError;
use super::types::{
    CommitRequest, Direction, Document, DocumentMask, ErrorEnvelope, FieldOp, FieldTransform,
    Fields, ListDocumentsResponse, Precondition, RunQueryRequest, RunQueryResponse,
    StorageObject, StructuredQuery, Value, Write,
};

const SITES: &str = "tirths";
const ROUTES: &str = "routes";
const EVENTS: &str = "events";
const REVIEWS: &str = "reviews";
const USERS: &str = "users";

/// Build the shared HTTP client for the Firebase APIs.
pub(super) fn http_client(config: &FirebaseConfig) -> Result<reqwest::Client, FirebaseError> {
    Ok(reqwest::Client::builder()
        .timeout(std::time::Duration::from_secs(config.timeout_secs))
        .build()?)
}

/// Send a request and return the body of a successful response.
pub(super) async fn send(request: reqwest::RequestBuilder) -> Result<String, FirebaseError> {
    let response = request.send().await?;
    let status = response.status();
    let body = response.text().await?;

    if !status.is_success() {
        // Google APIs wrap errors in `{"error": {...}}`; fall back to the raw body.
        let message = serde_json::from_str::<ErrorEnvelope>(&body)
            .map(|e| e.error.message)
            .unwrap_or(body);
        return Err(FirebaseError::Api {
            status: status.as_u16(),
            message,
        });
    }

    Ok(body)
}

pub(super) fn parse<T: DeserializeOwned>(body: &str) -> Result<T, FirebaseError> {
    serde_json::from_str(body).map_err(|e| FirebaseError::Json {
        message: e.to_string(),
        body: Some(body.chars().take(500).collect()),
    })
}

fn convert_all<T>(
    docs: &[Document],
    f: impl Fn(&Document) -> Result<T, ConversionError>,
) -> Result<Vec<T>, FirebaseError> {
    docs.iter()
        .map(|d| {
            f(d).map_err(|source| FirebaseError::Conversion {
                name: d.name.clone(),
                source,
            })
        })
        .collect()
}

fn convert_one<T>(
    doc: &Document,
    f: impl Fn(&Document) -> Result<T, ConversionError>,
) -> Result<T, FirebaseError> {
    f(doc).map_err(|source| FirebaseError::Conversion {
        name: doc.name.clone(),
        source,
    })
}

/// Map a 404 to the given not-found message, anything else through `From`.
fn not_found_as(message: &'static str) -> impl Fn(FirebaseError) -> GatewayError {
    move |e| {
        if e.is_not_found() {
            GatewayError::NotFound(message)
        } else {
            e.into()
        }
    }
}

/// Percent-encode an object name for a download URL path segment.
fn encode_object_name(name: &str) -> String {
    let mut out = String::with_capacity(name.len());
    for b in name.bytes() {
        match b {
            b'A'..=b'Z' | b'a'..=b'z' | b'0'..=b'9' | b'-' | b'.' | b'_' | b'~' => {
                out.push(b as char)
            }
            _ => out.push_str(&format!("%{b:02X}")),
        }
    }
    out
}

/// Firestore-backed [`DataSource`].
///
/// Requests carry the project API key, plus the signed-in user's id token
/// as a bearer credential once one is set.
#[derive(Debug, Clone)]
pub struct FirestoreGateway {
    http: reqwest::Client,
    config: Arc<FirebaseConfig>,
    session: Arc<RwLock<Option<String>>>,
}

impl FirestoreGateway {
    pub fn new(config: FirebaseConfig) -> Result<Self, FirebaseError> {
        Ok(Self {
            http: http_client(&config)?,
            config: Arc::new(config),
            session: Arc::default(),
        })
    }

    fn session_token(&self) -> Option<String> {
        self.session.read().ok().and_then(|token| token.clone())
    }

    fn request(&self, method: reqwest::Method, url: &str) -> reqwest::RequestBuilder {
        let request = self.http.request(method, url).query(&self.key());
        match self.session_token() {
            Some(token) => request.bearer_auth(token),
            None => request,
        }
    }

    fn documents_url(&self) -> String {
        format!(
            "{}/{}",
            self.config.firestore_url,
            self.config.documents_path()
        )
    }

    fn key(&self) -> [(&'static str, &str); 1] {
        [("key", self.config.api_key.as_str())]
    }

    async fn get_document(&self, collection: &str, id: &str) -> Result<Document, FirebaseError> {
        let url = format!("{}/{}/{}", self.documents_url(), collection, id);
        let body = send(self.request(reqwest::Method::GET, &url)).await?;
        parse(&body)
    }

    async fn list_documents(
        &self,
        collection: &str,
        page: &PageRequest,
    ) -> Result<ListDocumentsResponse, FirebaseError> {
        let url = format!("{}/{}", self.documents_url(), collection);
        let mut request = self
            .request(reqwest::Method::GET, &url)
            .query(&[("pageSize", page.page_size.to_string())])
            .query(&[("orderBy", "name")]);
        if let Some(cursor) = &page.cursor {
            request = request.query(&[("pageToken", cursor.as_str())]);
        }
        let body = send(request).await?;
        parse(&body)
    }

    async fn run_query(&self, query: StructuredQuery) -> Result<Vec<Document>, FirebaseError> {
        let url = format!("{}:runQuery", self.documents_url());
        let request = RunQueryRequest {
            structured_query: query,
        };
        let body = send(self.request(reqwest::Method::POST, &url).json(&request)).await?;
        let rows: Vec<RunQueryResponse> = parse(&body)?;
        Ok(rows.into_iter().filter_map(|r| r.document).collect())
    }

    async fn commit(&self, writes: Vec<Write>) -> Result<(), FirebaseError> {
        let url = format!("{}:commit", self.documents_url());
        send(self.request(reqwest::Method::POST, &url).json(&CommitRequest { writes })).await?;
        Ok(())
    }

    /// Write a new document under a fresh auto id, stamping `timestamps`
    /// with the request time.
    async fn create(
        &self,
        collection: &str,
        fields: Fields,
        timestamps: &[&str],
    ) -> Result<String, FirebaseError> {
        let id = auto_id();
        let write = Write {
            update: Some(Document {
                name: self.config.document_name(collection, &id),
                fields,
                ..Document::default()
            }),
            update_transforms: timestamps
                .iter()
                .map(|f| FieldTransform::request_time(f))
                .collect(),
            current_document: Some(Precondition { exists: false }),
            ..Write::default()
        };
        self.commit(vec![write]).await?;
        debug!(collection, id = %id, "Created document");
        Ok(id)
    }

    /// Update the masked fields of an existing document.
    async fn patch(
        &self,
        collection: &str,
        id: &str,
        fields: Fields,
        mask: Vec<String>,
        timestamps: &[&str],
    ) -> Result<(), FirebaseError> {
        let write = Write {
            update: Some(Document {
                name: self.config.document_name(collection, id),
                fields,
                ..Document::default()
            }),
            update_mask: Some(DocumentMask { field_paths: mask }),
            update_transforms: timestamps
                .iter()
                .map(|f| FieldTransform::request_time(f))
                .collect(),
            current_document: Some(Precondition { exists: true }),
            ..Write::default()
        };
        self.commit(vec![write]).await
    }

    async fn delete(
        &self,
        collection: &str,
        id: &str,
        must_exist: bool,
    ) -> Result<(), FirebaseError> {
        let write = Write {
            delete: Some(self.config.document_name(collection, id)),
            current_document: must_exist.then_some(Precondition { exists: true }),
            ..Write::default()
        };
        self.commit(vec![write]).await
    }

    async fn query_events(
        &self,
        filter: Option<(FieldOp, NaiveDate)>,
        direction: Direction,
    ) -> Result<Vec<Event>, GatewayError> {
        let mut query = StructuredQuery::collection(EVENTS);
        if let Some((op, today)) = filter {
            query = query.filter("date", op, Value::string(today.format("%Y-%m-%d").to_string()));
        }
        let docs = self.run_query(query.order_by("date", direction)).await?;
        Ok(convert_all(&docs, convert::event_from_document)?)
    }
}

#[async_trait]
impl DataSource for FirestoreGateway {
    async fn fetch_sites(&self, page: PageRequest) -> Result<Page<Site>, GatewayError> {
        let response = self.list_documents(SITES, &page).await?;
        let items = convert_all(&response.documents, convert::site_from_document)?;
        debug!(
            count = items.len(),
            more = response.next_page_token.is_some(),
            "Fetched site page"
        );
        Ok(Page {
            items,
            next: response
                .next_page_token
                .filter(|t| !t.is_empty())
                .map(Cursor::new),
        })
    }

    async fn fetch_sites_by_type(
        &self,
        denomination: Denomination,
    ) -> Result<Vec<Site>, GatewayError> {
        let query = StructuredQuery::collection(SITES).filter(
            "type",
            FieldOp::Equal,
            Value::string(denomination.as_str()),
        );
        let docs = self.run_query(query).await?;
        Ok(convert_all(&docs, convert::site_from_document)?)
    }

    async fn fetch_site(&self, id: &str) -> Result<Site, GatewayError> {
        let doc = self
            .get_document(SITES, id)
            .await
            .map_err(not_found_as(SITE_NOT_FOUND))?;
        Ok(convert_one(&doc, convert::site_from_document)?)
    }

    async fn add_site(&self, site: NewSite) -> Result<String, GatewayError> {
        site.validate()?;
        let fields = convert::new_site_fields(&site);
        Ok(self
            .create(SITES, fields, &["createdAt", "updatedAt"])
            .await?)
    }

    async fn update_site(&self, id: &str, update: SiteUpdate) -> Result<(), GatewayError> {
        let (fields, mask) = convert::site_update_fields(&update);
        self.patch(SITES, id, fields, mask, &["updatedAt"])
            .await
            .map_err(not_found_as(SITE_NOT_FOUND))
    }

    async fn delete_site(&self, id: &str) -> Result<(), GatewayError> {
        Ok(self.delete(SITES, id, false).await?)
    }

    async fn upload_site_image(
        &self,
        site_id: &str,
        bytes: Vec<u8>,
        content_type: &str,
    ) -> Result<String, GatewayError> {
        let path = format!("tirths/{}/{}", site_id, chrono::Utc::now().timestamp_millis());
        let bucket_url = format!("{}/b/{}/o", self.config.storage_url, self.config.storage_bucket);

        let body = send(
            self.request(reqwest::Method::POST, &bucket_url)
                .query(&[("uploadType", "media"), ("name", path.as_str())])
                .header(reqwest::header::CONTENT_TYPE, content_type)
                .body(bytes),
        )
        .await?;
        let object: StorageObject = parse(&body)?;
        debug!(object = %object.name, "Uploaded site image");

        let mut url = format!("{}/{}?alt=media", bucket_url, encode_object_name(&object.name));
        if let Some(token) = object
            .download_tokens
            .as_deref()
            .and_then(|t| t.split(',').next())
            .filter(|t| !t.is_empty())
        {
            url.push_str("&token=");
            url.push_str(token);
        }
        Ok(url)
    }

    async fn save_route(&self, route: NewRoute) -> Result<String, GatewayError> {
        route.validate()?;
        let fields = convert::new_route_fields(&route);
        Ok(self.create(ROUTES, fields, &["createdAt"]).await?)
    }

    async fn fetch_user_routes(&self, user_id: &str) -> Result<Vec<Route>, GatewayError> {
        let query = StructuredQuery::collection(ROUTES)
            .filter("userId", FieldOp::Equal, Value::string(user_id))
            .order_by("createdAt", Direction::Descending);
        let docs = self.run_query(query).await?;
        Ok(convert_all(&docs, convert::route_from_document)?)
    }

    async fn delete_route(&self, id: &str) -> Result<(), GatewayError> {
        self.delete(ROUTES, id, true)
            .await
            .map_err(not_found_as(ROUTE_NOT_FOUND))
    }

    async fn fetch_events(&self) -> Result<Vec<Event>, GatewayError> {
        self.query_events(None, Direction::Ascending).await
    }

    async fn fetch_upcoming_events(&self, today: NaiveDate) -> Result<Vec<Event>, GatewayError> {
        self.query_events(Some((FieldOp::GreaterThanOrEqual, today)), Direction::Ascending)
            .await
    }

    async fn fetch_past_events(&self, today: NaiveDate) -> Result<Vec<Event>, GatewayError> {
        self.query_events(Some((FieldOp::LessThan, today)), Direction::Descending)
            .await
    }

    async fn add_review(&self, review: NewReview) -> Result<String, GatewayError> {
        let fields = convert::new_review_fields(&review);
        let id = self.create(REVIEWS, fields, &["date"]).await?;

        // Read-then-write outside a transaction; concurrent reviews can race.
        let site = match self.get_document(SITES, &review.site_id).await {
            Ok(doc) => convert_one(&doc, convert::site_from_document)?,
            Err(e) if e.is_not_found() => {
                warn!(site = %review.site_id, "Review stored for missing site");
                return Ok(id);
            }
            Err(e) => return Err(e.into()),
        };

        let summary = site.rating_summary().with_review(review.rating);
        let (fields, mask) = convert::site_update_fields(&SiteUpdate::rating(summary));
        self.patch(SITES, &site.id, fields, mask, &[]).await?;
        debug!(
            site = %site.id,
            rating = summary.mean,
            reviews = summary.count,
            "Updated site rating"
        );

        Ok(id)
    }

    async fn fetch_site_reviews(&self, site_id: &str) -> Result<Vec<Review>, GatewayError> {
        let query = StructuredQuery::collection(REVIEWS)
            .filter("tirthId", FieldOp::Equal, Value::string(site_id))
            .order_by("date", Direction::Descending);
        let docs = self.run_query(query).await?;
        Ok(convert_all(&docs, convert::review_from_document)?)
    }

    async fn create_user_profile(&self, profile: &UserProfile) -> Result<(), GatewayError> {
        // Keyed by uid rather than an auto id; a plain overwrite.
        let write = Write {
            update: Some(Document {
                name: self.config.document_name(USERS, &profile.uid),
                fields: convert::profile_fields(profile),
                ..Document::default()
            }),
            update_transforms: vec![FieldTransform::request_time("createdAt")],
            ..Write::default()
        };
        Ok(self.commit(vec![write]).await?)
    }

    async fn fetch_user_profile(&self, uid: &str) -> Result<UserProfile, GatewayError> {
        let doc = self
            .get_document(USERS, uid)
            .await
            .map_err(not_found_as(USER_NOT_FOUND))?;
        Ok(convert_one(&doc, convert::profile_from_document)?)
    }

    async fn update_user_preferences(
        &self,
        uid: &str,
        preferences: &UserPreferences,
    ) -> Result<(), GatewayError> {
        let fields = Fields::from([(
            "preferences".to_string(),
            convert::preferences_value(preferences),
        )]);
        self.patch(USERS, uid, fields, vec!["preferences".to_string()], &[])
            .await
            .map_err(not_found_as(USER_NOT_FOUND))
    }

    fn set_session_token(&self, id_token: Option<String>) {
        if let Ok(mut session) = self.session.write() {
            *session = id_token;
        }
    }
}
