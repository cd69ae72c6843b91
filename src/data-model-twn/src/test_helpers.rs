//! Test utilities for database operations
//!
//! Every test gets its own SQLite file in a temporary directory, so tests can run in parallel
//! without sharing rows. The directory is removed when the `TestDb` is dropped.

use chrono::NaiveDateTime;
use diesel::prelude::*;
use diesel_async::RunQueryDsl;
use tempfile::TempDir;

use crate::db::{DbPool, establish_connection_pool};
use crate::models::{News, NewNews, QueryState, SourceWebsite, parse_news_time};
use crate::schema;

/// A throwaway database. Keep it alive for as long as the pool is used.
pub struct TestDb {
    pub pool: DbPool,
    pub database_url: String,
    _dir: TempDir,
}

impl TestDb {
    pub async fn new() -> Self {
        let dir = tempfile::tempdir().expect("Failed to create temp dir for test database");
        let path = dir.path().join("news-test.db");
        let database_url = path.to_str().expect("temp path is not UTF-8").to_string();
        let pool = establish_connection_pool(&database_url)
            .await
            .expect("Failed to create test database pool");
        Self {
            pool,
            database_url,
            _dir: dir,
        }
    }
}

/// Fixed timestamp used by the seed helpers.
pub fn test_time(value: &str) -> NaiveDateTime {
    parse_news_time(value).expect("bad test timestamp")
}

/// Insert a listed news row, the way a listing scrape would leave it.
pub async fn create_test_news(pool: &DbPool, source: SourceWebsite, url: &str, title: &str) -> News {
    let mut conn = pool.get().await.expect("Failed to get database connection");

    diesel::insert_into(schema::news::table)
        .values(&NewNews {
            news_time: test_time("2025-01-01 00:00:00"),
            news_title: title.to_string(),
            image_url: None,
            news_url: url.to_string(),
            source_website: source,
            author_id: None,
            query_state: QueryState::Listed,
        })
        .returning(News::as_returning())
        .get_result(&mut conn)
        .await
        .expect("Failed to insert test news")
}

/// Insert a news row whose content has already been fetched.
pub async fn create_fetched_news(pool: &DbPool, source: SourceWebsite, url: &str, title: &str, content: &str) -> News {
    let news = create_test_news(pool, source, url, title).await;
    let mut conn = pool.get().await.expect("Failed to get database connection");

    diesel::update(schema::news::table.find(news.id))
        .set((
            schema::news::news_content.eq(content),
            schema::news::query_state.eq(QueryState::Fetched),
        ))
        .returning(News::as_returning())
        .get_result(&mut conn)
        .await
        .expect("Failed to mark test news as fetched")
}

/// Put a row in the claimed state with the given claim time.
pub async fn set_claimed(pool: &DbPool, news_id: i32, claimed_at: NaiveDateTime) {
    let mut conn = pool.get().await.expect("Failed to get database connection");

    diesel::update(schema::news::table.find(news_id))
        .set((
            schema::news::query_state.eq(QueryState::Claimed),
            schema::news::claimed_at.eq(Some(claimed_at)),
        ))
        .execute(&mut conn)
        .await
        .expect("Failed to claim test news");
}

pub async fn get_news(pool: &DbPool, news_id: i32) -> News {
    let mut conn = pool.get().await.expect("Failed to get database connection");

    schema::news::table
        .find(news_id)
        .select(News::as_select())
        .first(&mut conn)
        .await
        .expect("Failed to load test news")
}

pub async fn count_news(pool: &DbPool) -> i64 {
    let mut conn = pool.get().await.expect("Failed to get database connection");
    schema::news::table
        .count()
        .get_result(&mut conn)
        .await
        .expect("Failed to count news")
}

/// Names linked to a news row through `news_keyword`, sorted.
pub async fn news_keywords(pool: &DbPool, news_id: i32) -> Vec<String> {
    let mut conn = pool.get().await.expect("Failed to get database connection");
    schema::news_keyword::table
        .inner_join(schema::keyword::table)
        .filter(schema::news_keyword::news_id.eq(news_id))
        .select(schema::keyword::name)
        .order(schema::keyword::name.asc())
        .load(&mut conn)
        .await
        .expect("Failed to load news keywords")
}

/// Names linked to a news row through `news_category`, sorted.
pub async fn news_categories(pool: &DbPool, news_id: i32) -> Vec<String> {
    let mut conn = pool.get().await.expect("Failed to get database connection");
    schema::news_category::table
        .inner_join(schema::category::table)
        .filter(schema::news_category::news_id.eq(news_id))
        .select(schema::category::name)
        .order(schema::category::name.asc())
        .load(&mut conn)
        .await
        .expect("Failed to load news categories")
}

pub async fn count_keywords(pool: &DbPool) -> i64 {
    let mut conn = pool.get().await.expect("Failed to get database connection");
    schema::keyword::table
        .count()
        .get_result(&mut conn)
        .await
        .expect("Failed to count keywords")
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::models::{AiModel, NewAiNews, Sentiment};

    #[tokio::test]
    async fn test_create_and_load_news() {
        let db = TestDb::new().await;
        let news = create_test_news(&db.pool, SourceWebsite::Ttv, "http://x/1", "A").await;

        assert_eq!(news.query_state, QueryState::Listed);
        assert_eq!(get_news(&db.pool, news.id).await, news);
        assert_eq!(count_news(&db.pool).await, 1);
    }

    #[tokio::test]
    async fn test_schema_rejects_duplicate_time_and_url() {
        let db = TestDb::new().await;
        create_test_news(&db.pool, SourceWebsite::Ttv, "http://x/1", "A").await;

        let mut conn = db.pool.get().await.unwrap();
        let result = diesel::insert_into(schema::news::table)
            .values(&NewNews {
                news_time: test_time("2025-01-01 00:00:00"),
                news_title: "A again".to_string(),
                image_url: None,
                news_url: "http://x/1".to_string(),
                source_website: SourceWebsite::Ttv,
                author_id: None,
                query_state: QueryState::Listed,
            })
            .execute(&mut conn)
            .await;

        assert!(matches!(
            result,
            Err(diesel::result::Error::DatabaseError(
                diesel::result::DatabaseErrorKind::UniqueViolation,
                _
            ))
        ));
    }

    #[tokio::test]
    async fn test_schema_one_annotation_per_model() {
        let db = TestDb::new().await;
        let news = create_fetched_news(&db.pool, SourceWebsite::Setn, "http://x/2", "B", "body").await;
        assert_eq!(news.query_state, QueryState::Fetched);

        let row = NewAiNews {
            news_id: news.id,
            ai_title: "t".to_string(),
            sentiment: Sentiment::Neutral,
            ai_model: AiModel::Gemma3_12b,
            created_at: test_time("2025-01-02 00:00:00"),
        };
        let mut conn = db.pool.get().await.unwrap();
        diesel::insert_into(schema::ai_news::table)
            .values(&row)
            .execute(&mut conn)
            .await
            .unwrap();
        let second = diesel::insert_into(schema::ai_news::table)
            .values(&row)
            .execute(&mut conn)
            .await;
        assert!(second.is_err());
    }

    #[tokio::test]
    async fn test_foreign_keys_are_enforced() {
        let db = TestDb::new().await;
        let mut conn = db.pool.get().await.unwrap();
        let result = diesel::insert_into(schema::news_keyword::table)
            .values((schema::news_keyword::news_id.eq(999), schema::news_keyword::keyword_id.eq(1)))
            .execute(&mut conn)
            .await;
        assert!(result.is_err());
    }
}
