use crate::api::build_router_with;
use crate::api::middleware_stack::MiddlewareStack;
use crate::application::{bootstrap, AppState};
use crate::config::Settings;
use crate::infrastructure::log_messages;
use crate::infrastructure::{Database, PostgresStore, SystemClock};
use crate::Result;
use std::net::SocketAddr;
use std::sync::Arc;
use tokio::net::TcpListener;
use tracing::{info, instrument, warn};

/// Main application struct that coordinates all components
pub struct Application {
    settings: Settings,
    database: Database,
    state: AppState,
}

impl Application {
    /// Connects to Postgres, applies migrations when enabled and seeds the
    /// administrator, default settings and courses.
    #[instrument(skip(settings), fields(environment = %settings.application.environment))]
    pub async fn new(settings: Settings) -> Result<Self> {
        let database = Database::connect(&settings.database_url(), &settings.database).await?;
        if settings.database.run_migrations {
            database.migrate().await?;
        } else {
            info!("{}", log_messages::database::MIGRATIONS_SKIPPED);
        }

        let store = Arc::new(PostgresStore::new(database.pool().clone()));
        let state = AppState::new(store, Arc::new(SystemClock), &settings.auth);
        bootstrap::seed(&state, &settings.bootstrap).await?;

        Ok(Self {
            settings,
            database,
            state,
        })
    }

    #[instrument(skip(self))]
    pub async fn run(self) -> Result<()> {
        let address = self.settings.bind_address();
        info!(address = %address, "{}", log_messages::application::STARTING_SERVER);

        let listener = TcpListener::bind(&address).await?;
        let stack = MiddlewareStack::for_application(&self.settings.application);
        let app = build_router_with(self.state.clone(), stack);
        info!("{}", log_messages::application::STARTED_SUCCESSFULLY);

        axum::serve(listener, app.into_make_service_with_connect_info::<SocketAddr>())
            .with_graceful_shutdown(shutdown_signal())
            .await?;

        self.database.pool().close().await;
        Ok(())
    }

    pub fn settings(&self) -> &Settings {
        &self.settings
    }

    pub fn state(&self) -> &AppState {
        &self.state
    }
}

async fn shutdown_signal() {
    if let Err(err) = tokio::signal::ctrl_c().await {
        warn!(error = %err, "{}", log_messages::application::SIGNAL_UNAVAILABLE);
        return;
    }
    info!("{}", log_messages::application::SHUTTING_DOWN);
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::infrastructure::UniversityStore;

    #[tokio::test]
    #[ignore = "requires database connection"]
    async fn test_application_can_be_created() {
        let settings = Settings::new().expect("settings");
        let app = Application::new(settings)
            .await
            .expect("Failed to create application");
        assert!(app.settings().application.port > 0);
        assert!(app.state().store.health_check().await.is_ok());
    }
}
