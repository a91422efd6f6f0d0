//! Process configuration read from the environment.

use std::env;
use std::net::SocketAddr;
use std::path::PathBuf;
use std::time::Duration;

use tracing::{info, warn};

use crate::cache::CacheConfig;
use crate::firebase::FirebaseConfig;

/// Default listen address.
pub const DEFAULT_ADDR: &str = "127.0.0.1:3000";

#[derive(Debug, thiserror::Error)]
pub enum ConfigError {
    #[error("unknown TIRTH_SOURCE {0:?}: expected \"fixture\" or \"firebase\"")]
    UnknownSource(String),

    #[error("{0} must be set when TIRTH_SOURCE=firebase")]
    Missing(&'static str),

    #[error("invalid {key}: {message}")]
    Invalid { key: &'static str, message: String },
}

/// Where site, route and event data comes from.
#[derive(Debug, Clone, PartialEq)]
pub enum SourceConfig {
    /// In-memory data; built-in samples unless a directory is given
    Fixture { dir: Option<PathBuf> },
    Firebase(FirebaseConfig),
}

/// Everything `main` needs to compose the server.
#[derive(Debug, Clone)]
pub struct AppConfig {
    pub addr: SocketAddr,
    pub source: SourceConfig,
    pub cache: CacheConfig,
}

impl AppConfig {
    pub fn from_env() -> Result<Self, ConfigError> {
        Self::from_lookup(|key| env::var(key).ok())
    }

    /// Build from any key lookup. Empty values count as unset.
    pub fn from_lookup(lookup: impl Fn(&str) -> Option<String>) -> Result<Self, ConfigError> {
        let var = |key: &str| lookup(key).filter(|v| !v.trim().is_empty());

        let addr = match var("TIRTH_ADDR") {
            Some(v) => v.parse::<SocketAddr>().map_err(|e| ConfigError::Invalid {
                key: "TIRTH_ADDR",
                message: e.to_string(),
            })?,
            None => {
                info!("TIRTH_ADDR not set, using default: {DEFAULT_ADDR}");
                SocketAddr::from(([127, 0, 0, 1], 3000))
            }
        };

        let mut cache = CacheConfig::default();
        if let Some(v) = var("TIRTH_CACHE_TTL_SECS") {
            let secs = v.parse::<u64>().map_err(|e| ConfigError::Invalid {
                key: "TIRTH_CACHE_TTL_SECS",
                message: e.to_string(),
            })?;
            cache = cache.with_ttl(Duration::from_secs(secs));
        }

        let source = match var("TIRTH_SOURCE").map(|s| s.to_ascii_lowercase()).as_deref() {
            None | Some("fixture") => SourceConfig::Fixture {
                dir: var("TIRTH_FIXTURE_DIR").map(PathBuf::from),
            },
            Some("firebase") => {
                let project = var("FIREBASE_PROJECT_ID")
                    .ok_or(ConfigError::Missing("FIREBASE_PROJECT_ID"))?;
                let key =
                    var("FIREBASE_API_KEY").ok_or(ConfigError::Missing("FIREBASE_API_KEY"))?;
                let mut firebase = FirebaseConfig::new(project, key);
                match var("FIREBASE_STORAGE_BUCKET") {
                    Some(bucket) => firebase = firebase.with_storage_bucket(bucket),
                    None => warn!("FIREBASE_STORAGE_BUCKET not set, using the project default"),
                }
                SourceConfig::Firebase(firebase)
            }
            Some(other) => return Err(ConfigError::UnknownSource(other.to_string())),
        };

        Ok(Self { addr, source, cache })
    }
}
