use diesel::ConnectionError;
use diesel::ConnectionResult;
use diesel::sqlite::SqliteConnection;
use diesel_async::pooled_connection::deadpool::Pool;
use diesel_async::pooled_connection::{AsyncDieselConnectionManager, ManagerConfig};
use diesel_async::sync_connection_wrapper::SyncConnectionWrapper;
use diesel_async::{AsyncConnection, SimpleAsyncConnection};
use futures::future::BoxFuture;

/// SQLite has no async driver: diesel's sync connection runs on tokio's blocking pool.
pub type AsyncSqliteConnection = SyncConnectionWrapper<SqliteConnection>;

pub type PoolError = deadpool::managed::PoolError<diesel_async::pooled_connection::PoolError>;

pub type DbPool = Pool<AsyncSqliteConnection>;

#[derive(Debug, thiserror::Error)]
pub enum ConnectionPoolError {
    #[error("Failed to build connection pool: {0}")]
    BuildError(#[from] deadpool::managed::BuildError),
    #[error("Failed to establish initial database connection: {0}")]
    ConnectionError(#[from] PoolError),
    #[error("Failed to create database schema: {0}")]
    SchemaError(#[from] diesel::result::Error),
}

/// Applied to every pooled connection.
/// Several processes write to the same file, so writers wait on the lock instead of failing.
const CONNECTION_PRAGMAS: &str = "
    PRAGMA journal_mode = WAL;
    PRAGMA busy_timeout = 5000;
    PRAGMA foreign_keys = ON;
";

pub const CREATE_TABLES: &str = "
CREATE TABLE IF NOT EXISTS author (
    id INTEGER PRIMARY KEY AUTOINCREMENT,
    name TEXT NOT NULL UNIQUE
);

CREATE TABLE IF NOT EXISTS category (
    id INTEGER PRIMARY KEY AUTOINCREMENT,
    name TEXT NOT NULL UNIQUE
);

CREATE TABLE IF NOT EXISTS keyword (
    id INTEGER PRIMARY KEY AUTOINCREMENT,
    name TEXT NOT NULL UNIQUE
);

CREATE TABLE IF NOT EXISTS news (
    id INTEGER PRIMARY KEY AUTOINCREMENT,
    news_time TIMESTAMP NOT NULL,
    news_title TEXT NOT NULL,
    news_content TEXT,
    image_url TEXT,
    news_url TEXT NOT NULL,
    source_website INTEGER NOT NULL,
    author_id INTEGER REFERENCES author(id),
    query_state INTEGER NOT NULL DEFAULT 0,
    claimed_at TIMESTAMP,
    UNIQUE(news_time, news_url)
);

CREATE INDEX IF NOT EXISTS idx_news_source_state ON news(source_website, query_state);
CREATE INDEX IF NOT EXISTS idx_news_url ON news(news_url);

CREATE TABLE IF NOT EXISTS news_keyword (
    news_id INTEGER NOT NULL REFERENCES news(id) ON DELETE CASCADE,
    keyword_id INTEGER NOT NULL REFERENCES keyword(id),
    PRIMARY KEY (news_id, keyword_id)
);

CREATE TABLE IF NOT EXISTS news_category (
    news_id INTEGER NOT NULL REFERENCES news(id) ON DELETE CASCADE,
    category_id INTEGER NOT NULL REFERENCES category(id),
    PRIMARY KEY (news_id, category_id)
);

CREATE TABLE IF NOT EXISTS ai_news (
    id INTEGER PRIMARY KEY AUTOINCREMENT,
    news_id INTEGER NOT NULL REFERENCES news(id) ON DELETE CASCADE,
    ai_title TEXT NOT NULL,
    sentiment INTEGER NOT NULL,
    ai_model INTEGER NOT NULL,
    created_at TIMESTAMP NOT NULL,
    UNIQUE(news_id, ai_model)
);

CREATE TABLE IF NOT EXISTS ai_news_keyword (
    ai_news_id INTEGER NOT NULL REFERENCES ai_news(id) ON DELETE CASCADE,
    keyword_id INTEGER NOT NULL REFERENCES keyword(id),
    PRIMARY KEY (ai_news_id, keyword_id)
);

CREATE TABLE IF NOT EXISTS ai_news_category (
    ai_news_id INTEGER NOT NULL REFERENCES ai_news(id) ON DELETE CASCADE,
    category_id INTEGER NOT NULL REFERENCES category(id),
    PRIMARY KEY (ai_news_id, category_id)
);
";

fn establish_sqlite_connection(database_url: &str) -> BoxFuture<'_, ConnectionResult<AsyncSqliteConnection>> {
    Box::pin(async move {
        let mut conn = AsyncSqliteConnection::establish(database_url).await?;
        conn.batch_execute(CONNECTION_PRAGMAS)
            .await
            .map_err(ConnectionError::CouldntSetupConfiguration)?;
        Ok(conn)
    })
}

/// Builds the pool, checks that the database file is reachable, and creates any missing tables.
pub async fn establish_connection_pool(database_url: &str) -> Result<DbPool, ConnectionPoolError> {
    let mut manager_config = ManagerConfig::default();
    manager_config.custom_setup = Box::new(establish_sqlite_connection);

    let config = AsyncDieselConnectionManager::<AsyncSqliteConnection>::new_with_config(database_url, manager_config);
    let pool = Pool::builder(config).build()?;

    // Force an initial connection so we fail fast if the file can't be opened.
    let mut conn = pool.get().await?;
    conn.batch_execute(CREATE_TABLES).await?;

    Ok(pool)
}
