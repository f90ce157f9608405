use log::info;
use std::env;

#[derive(Debug, Clone)]
pub struct AppConfig {
    pub port: u16,
    pub host: String,
    pub data_dir: String,
    pub database_url: String,
    pub db_pool_size: u32,
    pub vcs_api_url: String,
}

impl Default for AppConfig {
    fn default() -> Self {
        Self {
            port: 8080,
            host: "127.0.0.1".to_string(),
            data_dir: "./data".to_string(),
            database_url: "./data/hangar.db".to_string(),
            db_pool_size: 16,
            vcs_api_url: "https://api.github.com".to_string(),
        }
    }
}

impl AppConfig {
    pub fn from_env() -> Self {
        let port = env::var("HANGAR_PORT")
            .unwrap_or_else(|_| "8080".to_string())
            .parse::<u16>()
            .unwrap_or(8080);

        let host = env::var("HANGAR_HOST").unwrap_or_else(|_| "127.0.0.1".to_string());

        let data_dir = env::var("HANGAR_DATA_DIR").unwrap_or_else(|_| "./data".to_string());

        let database_url =
            env::var("HANGAR_DATABASE_URL").unwrap_or_else(|_| format!("{data_dir}/hangar.db"));

        let db_pool_size = env::var("HANGAR_DB_POOL_SIZE")
            .unwrap_or_else(|_| "16".to_string())
            .parse::<u32>()
            .ok()
            .filter(|size| *size > 0)
            .unwrap_or(16);

        let vcs_api_url = env::var("HANGAR_VCS_API_URL")
            .unwrap_or_else(|_| "https://api.github.com".to_string());

        info!("Configuration loaded:");
        info!("  Host: {host}");
        info!("  Port: {port}");
        info!("  Data Directory: {data_dir}");
        info!("  Database URL: {database_url}");
        info!("  Database Pool Size: {db_pool_size}");
        info!("  VCS API: {vcs_api_url}");

        Self {
            port,
            host,
            data_dir,
            database_url,
            db_pool_size,
            vcs_api_url,
        }
    }
}
