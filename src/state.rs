use crate::config::AppConfig;
use crate::database::DatabaseService;
use crate::services::VcsProvider;
use std::sync::Arc;

pub struct AppState {
    pub config: AppConfig,
    pub database: Arc<DatabaseService>,
    pub vcs: Arc<dyn VcsProvider>,
}

impl std::fmt::Debug for AppState {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("AppState")
            .field("config", &self.config)
            .field("database", &self.database)
            .finish_non_exhaustive()
    }
}
