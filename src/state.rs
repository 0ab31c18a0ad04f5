use std::sync::Arc;

use sqlx::{PgPool, postgres::PgPoolOptions};

use crate::{config::Config, library::reminders::ReminderCounter};

#[derive(Clone)]
pub struct AppState {
    pub pool: PgPool,
    pub config: Config,
    pub reminder_counter: Arc<ReminderCounter>,
}

pub type SharedAppState = Arc<AppState>;

impl AppState {
    pub async fn init(config: Config) -> Result<Self, sqlx::Error> {
        let pool = PgPoolOptions::new()
            .min_connections(5)
            .max_connections(30)
            .connect_lazy_with(config.database.with_db());

        if config.application.run_migration {
            tracing::warn!("Running database migrations...");
            sqlx::migrate!("./migrations").run(&pool).await?;
        }

        Ok(AppState::with_pool(pool, config))
    }

    pub fn with_pool(pool: PgPool, config: Config) -> Self {
        let reminder_counter = Arc::new(ReminderCounter::new(
            config.library.show_reminder_count,
        ));

        AppState {
            pool,
            config,
            reminder_counter,
        }
    }
}
