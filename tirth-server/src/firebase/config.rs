//! Firebase project configuration.

/// Default Firestore REST endpoint.
const DEFAULT_FIRESTORE_URL: &str = "https://firestore.googleapis.com/v1";

/// Default Cloud Storage for Firebase endpoint.
const DEFAULT_STORAGE_URL: &str = "https://firebasestorage.googleapis.com/v0";

/// Default Identity Toolkit endpoint.
const DEFAULT_AUTH_URL: &str = "https://identitytoolkit.googleapis.com/v1";

/// Configuration for the Firebase clients.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct FirebaseConfig {
    /// Project id, e.g. `tirth-finder`
    pub project_id: String,
    /// Web API key, sent as the `key` query parameter
    pub api_key: String,
    /// Storage bucket; defaults to `{project_id}.appspot.com`
    pub storage_bucket: String,
    /// Firestore database id
    pub database: String,
    pub firestore_url: String,
    pub storage_url: String,
    pub auth_url: String,
    /// Request timeout in seconds
    pub timeout_secs: u64,
}

impl FirebaseConfig {
    /// Create a config for the given project and API key.
    pub fn new(project_id: impl Into<String>, api_key: impl Into<String>) -> Self {
        let project_id = project_id.into();
        Self {
            storage_bucket: format!("{project_id}.appspot.com"),
            project_id,
            api_key: api_key.into(),
            database: "(default)".to_string(),
            firestore_url: DEFAULT_FIRESTORE_URL.to_string(),
            storage_url: DEFAULT_STORAGE_URL.to_string(),
            auth_url: DEFAULT_AUTH_URL.to_string(),
            timeout_secs: 30,
        }
    }

    pub fn with_storage_bucket(mut self, bucket: impl Into<String>) -> Self {
        self.storage_bucket = bucket.into();
        self
    }

    /// Point every client at one base URL (for emulators and tests).
    pub fn with_base_url(mut self, url: impl Into<String>) -> Self {
        let url = url.into();
        self.firestore_url = url.clone();
        self.storage_url = url.clone();
        self.auth_url = url;
        self
    }

    /// Set request timeout.
    pub fn with_timeout(mut self, secs: u64) -> Self {
        self.timeout_secs = secs;
        self
    }

    /// Resource name of the documents root.
    pub fn documents_path(&self) -> String {
        format!(
            "projects/{}/databases/{}/documents",
            self.project_id, self.database
        )
    }

    /// Full resource name of a document.
    pub fn document_name(&self, collection: &str, id: &str) -> String {
        format!("{}/{}/{}", self.documents_path(), collection, id)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn defaults() {
        let config = FirebaseConfig::new("tirth-finder", "key");
        assert_eq!(config.storage_bucket, "tirth-finder.appspot.com");
        assert_eq!(config.database, "(default)");
        assert_eq!(config.firestore_url, DEFAULT_FIRESTORE_URL);
        assert_eq!(config.timeout_secs, 30);
    }

    #[test]
    fn builders() {
        let config = FirebaseConfig::new("p", "k")
            .with_storage_bucket("bucket")
            .with_base_url("http://localhost:8080")
            .with_timeout(5);
        assert_eq!(config.storage_bucket, "bucket");
        assert_eq!(config.auth_url, "http://localhost:8080");
        assert_eq!(config.storage_url, "http://localhost:8080");
        assert_eq!(config.timeout_secs, 5);
    }

    #[test]
    fn resource_names() {
        let config = FirebaseConfig::new("p", "k");
        assert_eq!(
            config.document_name("tirths", "abc"),
            "projects/p/databases/(default)/documents/tirths/abc"
        );
    }
}
