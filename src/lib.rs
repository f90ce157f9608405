pub mod config;
pub mod database;
pub mod error;
pub mod fairings;
pub mod models;
pub mod routes;
pub mod schema;
pub mod services;
pub mod state;

use rocket::Config;
use rocket_cors::{AllowedOrigins, CorsOptions};
use std::sync::Arc;

pub use config::AppConfig;
pub use database::DatabaseService;
pub use error::{RegistryError, RegistryResult};
pub use fairings::RequestLogger;
pub use services::{GitHubProvider, VcsProvider};
pub use state::AppState;

pub type LaunchError = Box<dyn std::error::Error + Send + Sync>;

pub fn create_rocket() -> Result<rocket::Rocket<rocket::Build>, LaunchError> {
    // Load configuration from environment
    let config = AppConfig::from_env();

    let database = Arc::new(DatabaseService::new(
        &config.database_url,
        config.db_pool_size,
    )?);

    let vcs: Arc<dyn VcsProvider> = Arc::new(GitHubProvider::new(
        reqwest::Client::new(),
        &config.vcs_api_url,
    ));

    let state = AppState {
        config,
        database,
        vcs,
    };

    build_rocket(state)
}

/// Mounts the registry routes on a rocket instance that manages `state`
pub fn build_rocket(state: AppState) -> Result<rocket::Rocket<rocket::Build>, LaunchError> {
    let cors = CorsOptions::default()
        .allowed_origins(AllowedOrigins::all())
        .to_cors()
        .map_err(|e| format!("Failed to create CORS configuration: {e}"))?;

    let rocket_config = Config {
        port: state.config.port,
        address: state.config.host.parse()?,
        ..Config::default()
    };

    Ok(rocket::custom(&rocket_config)
        .manage(state)
        .attach(cors)
        .attach(RequestLogger)
        .mount("/", routes::get_routes())
        .register("/", routes::get_catchers()))
}
