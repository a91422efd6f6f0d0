use std::error::Error;
use std::sync::Arc;

use tracing::info;
use tracing_subscriber::EnvFilter;

use tirth_server::cache::CachedSource;
use tirth_server::config::{AppConfig, SourceConfig};
use tirth_server::firebase::FirestoreGateway;
use tirth_server::gateway::{DataSource, FixtureSource};
use tirth_server::planner::SearchConfig;
use tirth_server::web::{AppState, create_router};

#[tokio::main]
async fn main() -> Result<(), Box<dyn Error>> {
    tracing_subscriber::fmt()
        .with_env_filter(
            EnvFilter::try_from_default_env().unwrap_or_else(|_| EnvFilter::new("info")),
        )
        .init();

    let config = AppConfig::from_env()?;

    let source: Arc<dyn DataSource> = match config.source {
        SourceConfig::Fixture { dir: None } => {
            info!("Using built-in fixture data");
            Arc::new(CachedSource::new(FixtureSource::builtin(), &config.cache))
        }
        SourceConfig::Fixture { dir: Some(dir) } => {
            let fixture = FixtureSource::from_dir(&dir)?;
            info!(dir = %dir.display(), sites = fixture.site_count().await, "Loaded fixture data");
            Arc::new(CachedSource::new(fixture, &config.cache))
        }
        SourceConfig::Firebase(firebase) => {
            info!(project = %firebase.project_id, "Using Firestore");
            Arc::new(CachedSource::new(FirestoreGateway::new(firebase)?, &config.cache))
        }
    };

    let app = create_router(AppState::new(source, SearchConfig::default()));

    let listener = tokio::net::TcpListener::bind(config.addr).await?;
    info!("Tirth finder listening on http://{}", config.addr);
    axum::serve(listener, app).await?;
    Ok(())
}
