use axum::{
    extract::{Json, State, rejection::JsonRejection},
    http::StatusCode,
    response::IntoResponse,
};
use chrono::{NaiveDateTime, TimeDelta, Utc};
use diesel::prelude::*;
use diesel_async::RunQueryDsl;

use data_model_twn::api::{AiHandleNews, AiHandlePayload, ClaimPayload, ClaimedNews, FieldError, QueueError, batch_count};
use data_model_twn::db::AsyncSqliteConnection;
use data_model_twn::models::{AiModel, QueryState, SourceWebsite};
use data_model_twn::schema::{ai_news, news};

use crate::AppState;

/// Claims up to `count` rows of `source` for detail fetching.
///
/// A row is claimable while listed, or while claimed with a lease that started before `now - lease`.
/// Candidates are picked first; the update then re-checks the claimable predicate, so a row that
/// another caller flipped in between is not returned here.
pub async fn claim_news(
    conn: &mut AsyncSqliteConnection,
    source: SourceWebsite,
    count: i64,
    now: NaiveDateTime,
    lease: TimeDelta,
) -> Result<Vec<ClaimedNews>, diesel::result::Error> {
    let cutoff = now - lease;

    let candidates: Vec<i32> = news::table
        .filter(news::source_website.eq(source))
        .filter(
            news::query_state
                .eq(QueryState::Listed)
                .or(news::query_state
                    .eq(QueryState::Claimed)
                    .and(news::claimed_at.assume_not_null().lt(cutoff))),
        )
        .order(news::id.asc())
        .limit(count)
        .select(news::id)
        .load(conn)
        .await?;

    if candidates.is_empty() {
        return Ok(Vec::new());
    }

    let mut claimed: Vec<ClaimedNews> = diesel::update(
        news::table.filter(news::id.eq_any(&candidates)).filter(
            news::query_state
                .eq(QueryState::Listed)
                .or(news::query_state
                    .eq(QueryState::Claimed)
                    .and(news::claimed_at.assume_not_null().lt(cutoff))),
        ),
    )
    .set((
        news::query_state.eq(QueryState::Claimed),
        news::claimed_at.eq(Some(now)),
    ))
    .returning((news::id, news::news_url))
    .get_results(conn)
    .await?;

    claimed.sort_by_key(|c| c.id);
    Ok(claimed)
}

/// POST /wait_query_list - Claim listed articles of one site for a detail-fetch worker
pub async fn wait_query_list(
    State(state): State<AppState>,
    payload: Result<Json<ClaimPayload>, JsonRejection>,
) -> Result<impl IntoResponse, QueueError> {
    let Json(payload) = payload?;
    let source =
        SourceWebsite::try_from(payload.source_website).map_err(|e| FieldError::invalid("source_website", e))?;
    let count = batch_count(payload.count, "count")?;

    let mut conn = state.pool.get().await?;
    let claimed = claim_news(&mut conn, source, count, Utc::now().naive_utc(), state.claim_lease).await?;

    tracing::info!("Claimed {} {} news for detail fetching", claimed.len(), source.slug());
    Ok((StatusCode::OK, Json(claimed)))
}

/// Fetched articles that `model` hasn't annotated yet, oldest first, skipping the ids in `exclude`.
pub async fn unannotated_news(
    conn: &mut AsyncSqliteConnection,
    model: AiModel,
    count: i64,
    exclude: &[i32],
) -> Result<Vec<AiHandleNews>, diesel::result::Error> {
    let rows: Vec<(i32, String, String)> = news::table
        .left_join(
            ai_news::table.on(ai_news::news_id
                .eq(news::id)
                .and(ai_news::ai_model.eq(model))),
        )
        .filter(ai_news::id.is_null())
        .filter(news::query_state.eq(QueryState::Fetched))
        .filter(news::news_content.is_not_null())
        .filter(news::id.ne_all(exclude))
        .order(news::id.asc())
        .limit(count)
        .select((news::id, news::news_title, news::news_content.assume_not_null()))
        .load(conn)
        .await?;

    Ok(rows
        .into_iter()
        .map(|(id, news_title, news_content)| AiHandleNews {
            id,
            news_title,
            news_content,
        })
        .collect())
}

/// POST /wait_ai_handle_list - Articles waiting for annotation by a model
pub async fn wait_ai_handle_list(
    State(state): State<AppState>,
    payload: Result<Json<AiHandlePayload>, JsonRejection>,
) -> Result<impl IntoResponse, QueueError> {
    let Json(payload) = payload?;
    let count = batch_count(payload.count, "count")?;
    let model = match payload.ai_model {
        Some(m) => AiModel::try_from(m).map_err(|e| FieldError::invalid("ai_model", e))?,
        None => AiModel::default(),
    };

    let mut conn = state.pool.get().await?;
    let pending = unannotated_news(&mut conn, model, count, &payload.exclude).await?;

    tracing::info!("{} news waiting for {}", pending.len(), model.model_name());
    Ok((StatusCode::OK, Json(pending)))
}

#[cfg(test)]
mod tests {
    use super::*;
    use data_model_twn::test_helpers::{TestDb, create_test_news, get_news, set_claimed, test_time};

    #[tokio::test]
    async fn test_claim_only_returns_claimable_rows_of_the_source() {
        let db = TestDb::new().await;
        let a = create_test_news(&db.pool, SourceWebsite::Ttv, "http://x/1", "A").await;
        let b = create_test_news(&db.pool, SourceWebsite::Ttv, "http://x/2", "B").await;
        create_test_news(&db.pool, SourceWebsite::Setn, "http://y/1", "C").await;

        let now = test_time("2025-01-02 00:00:00");
        let mut conn = db.pool.get().await.unwrap();
        let claimed = claim_news(&mut conn, SourceWebsite::Ttv, 10, now, TimeDelta::seconds(600))
            .await
            .unwrap();
        drop(conn);

        let ids: Vec<i32> = claimed.iter().map(|c| c.id).collect();
        assert_eq!(ids, vec![a.id, b.id]);
        let stored = get_news(&db.pool, a.id).await;
        assert_eq!(stored.query_state, QueryState::Claimed);
        assert_eq!(stored.claimed_at, Some(now));
    }

    #[tokio::test]
    async fn test_claim_respects_lease() {
        let db = TestDb::new().await;
        let fresh = create_test_news(&db.pool, SourceWebsite::Ttv, "http://x/1", "A").await;
        let stale = create_test_news(&db.pool, SourceWebsite::Ttv, "http://x/2", "B").await;

        let now = test_time("2025-01-02 12:00:00");
        set_claimed(&db.pool, fresh.id, now - TimeDelta::seconds(60)).await;
        set_claimed(&db.pool, stale.id, now - TimeDelta::seconds(3600)).await;

        let mut conn = db.pool.get().await.unwrap();
        let claimed = claim_news(&mut conn, SourceWebsite::Ttv, 10, now, TimeDelta::seconds(600))
            .await
            .unwrap();

        assert_eq!(claimed.len(), 1);
        assert_eq!(claimed[0].id, stale.id);
    }

    #[tokio::test(flavor = "multi_thread", worker_threads = 4)]
    async fn test_parallel_claims_never_share_a_row() {
        let db = TestDb::new().await;
        for i in 0..40 {
            create_test_news(&db.pool, SourceWebsite::Ttv, &format!("http://x/{}", i), "A").await;
        }
        let now = test_time("2025-01-02 00:00:00");

        let mut workers = Vec::new();
        for _ in 0..8 {
            let pool = db.pool.clone();
            workers.push(tokio::spawn(async move {
                let mut mine = Vec::new();
                loop {
                    let mut conn = pool.get().await.unwrap();
                    let claimed = claim_news(&mut conn, SourceWebsite::Ttv, 5, now, TimeDelta::seconds(600))
                        .await
                        .unwrap();
                    if claimed.is_empty() {
                        break;
                    }
                    mine.extend(claimed.into_iter().map(|c| c.id));
                }
                mine
            }));
        }

        let mut all = Vec::new();
        for worker in workers {
            all.extend(worker.await.unwrap());
        }
        let unique: std::collections::HashSet<i32> = all.iter().copied().collect();
        assert_eq!(all.len(), 40);
        assert_eq!(unique.len(), 40);
    }
}
