use data_model_twn::db::{ConnectionPoolError, DbPool, establish_connection_pool};

pub const DEFAULT_DATABASE_URL: &str = "news.db";

/// Opens the SQLite file named by DATABASE_URL (default `news.db`) and creates any missing tables.
pub async fn get_db_pool() -> Result<DbPool, ConnectionPoolError> {
    let database_url = get_database_url();
    tracing::info!("Opening database {}", database_url);
    establish_connection_pool(&database_url).await
}

/// Retrieves the value for the env var DATABASE_URL, falling back to `news.db`.
pub fn get_database_url() -> String {
    match std::env::var("DATABASE_URL") {
        Ok(url) if !url.trim().is_empty() => url.trim().to_string(),
        _ => DEFAULT_DATABASE_URL.to_string(),
    }
}
