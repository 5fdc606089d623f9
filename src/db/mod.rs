pub(crate) mod models;

use std::time::Duration;

use sqlx::postgres::{PgConnectOptions, PgPoolOptions};
use sqlx::{ConnectOptions, PgPool};

use crate::core::config::DatabaseSettings;

/// One connection is enough: reports run strictly one after another.
pub(crate) async fn init_pool(settings: &DatabaseSettings) -> Result<PgPool, sqlx::Error> {
    let connect_options = connect_options(settings)?
        .application_name("course-report-bench")
        .options([("statement_timeout", settings.statement_timeout().as_millis().to_string())])
        .log_statements(tracing::log::LevelFilter::Off);

    PgPoolOptions::new()
        .max_connections(1)
        .min_connections(1)
        .acquire_timeout(Duration::from_secs(10))
        .test_before_acquire(true)
        .connect_with(connect_options)
        .await
}

/// `DATABASE_URL` wins; otherwise the parts are set field by field so that
/// credentials never pass through URL syntax.
fn connect_options(settings: &DatabaseSettings) -> Result<PgConnectOptions, sqlx::Error> {
    if let Some(url) = &settings.database_url {
        return url.parse();
    }

    let mut options = PgConnectOptions::new()
        .host(&settings.postgres_server)
        .port(settings.postgres_port)
        .username(&settings.postgres_user)
        .database(&settings.postgres_db);
    if !settings.postgres_password.is_empty() {
        options = options.password(&settings.postgres_password);
    }
    Ok(options)
}
