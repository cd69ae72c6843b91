use std::collections::HashSet;

use axum::{
    extract::{Json, Path, Query, State, rejection::JsonRejection, rejection::QueryRejection},
    http::StatusCode,
    response::IntoResponse,
};
use chrono::NaiveDateTime;
use diesel::prelude::*;
use diesel::result::DatabaseErrorKind;
use diesel::sqlite::Sqlite;
use diesel_async::scoped_futures::ScopedFutureExt;
use diesel_async::{AsyncConnection, RunQueryDsl};

use data_model_twn::api::{
    AiNewsDetail, DEFAULT_LIST_LIMIT, FieldError, GetNewsError, InsertNewsResponse, InsertedNews, MAX_LIST_LIMIT,
    NewsDetail, NewsDraft, NewsListQuery, NewsSummary, OneOrMany, PostNewsError, RejectedNews, UpdateNewsError,
    UpdateNewsPayload, UpdateNewsResponse, ValidNewsDraft,
};
use data_model_twn::db::{AsyncSqliteConnection, DbPool};
use data_model_twn::models::{AiNews, News, NewNews, QueryState, SourceWebsite};
use data_model_twn::schema::{ai_news, author, news};

use crate::routes::lookup;

/// Finds which of the candidate (time, url) pairs are already stored.
pub async fn existing_news_keys(
    conn: &mut AsyncSqliteConnection,
    candidates: &[(NaiveDateTime, String)],
) -> Result<HashSet<(NaiveDateTime, String)>, diesel::result::Error> {
    if candidates.is_empty() {
        return Ok(HashSet::new());
    }
    let urls: Vec<&str> = candidates.iter().map(|(_, url)| url.as_str()).collect();
    let stored: Vec<(NaiveDateTime, String)> = news::table
        .filter(news::news_url.eq_any(urls))
        .select((news::news_time, news::news_url))
        .load(conn)
        .await?;
    Ok(stored.into_iter().collect())
}

/// Inserts one listed article with its author / keyword / category links.
pub async fn insert_news(conn: &mut AsyncSqliteConnection, item: &ValidNewsDraft) -> Result<i32, diesel::result::Error> {
    conn.transaction(|conn| {
        async move {
            let author_id = match &item.author {
                Some(name) => Some(lookup::author_id(conn, name).await?),
                None => None,
            };

            let id = diesel::insert_into(news::table)
                .values(&NewNews {
                    news_time: item.news_time,
                    news_title: item.news_title.clone(),
                    image_url: item.image_url.clone(),
                    news_url: item.news_url.clone(),
                    source_website: item.source_website,
                    author_id,
                    query_state: QueryState::Listed,
                })
                .returning(news::id)
                .get_result::<i32>(conn)
                .await?;

            lookup::replace_news_keywords(conn, id, item.keywords.names()).await?;
            lookup::replace_news_categories(conn, id, item.categories.names()).await?;
            Ok(id)
        }
        .scope_boxed()
    })
    .await
}

fn duplicate_message(item: &ValidNewsDraft) -> String {
    format!(
        "Duplicate news ({}, {}) already exists",
        item.news_time.format(data_model_twn::models::NEWS_TIME_FORMAT),
        item.news_url
    )
}

/// POST /news - Store one or more listed articles
///
/// Every item is validated and inserted on its own; a bad or duplicate item lands in the `error`
/// list and the rest of the batch still goes in.
pub async fn post_news(
    State(pool): State<DbPool>,
    payload: Result<Json<OneOrMany<serde_json::Value>>, JsonRejection>,
) -> Result<impl IntoResponse, PostNewsError> {
    let Json(payload) = payload?;
    let items = payload.into_vec();
    let mut response = InsertNewsResponse::default();

    let mut valid: Vec<(usize, ValidNewsDraft)> = Vec::with_capacity(items.len());
    for (index, value) in items.into_iter().enumerate() {
        let url_hint = value.get("news_url").and_then(|u| u.as_str()).map(str::to_string);
        let checked = serde_json::from_value::<NewsDraft>(value)
            .map_err(|e| e.to_string())
            .and_then(|draft| draft.validate().map_err(|e| e.to_string()));
        match checked {
            Ok(item) => valid.push((index, item)),
            Err(error) => response.error.push(RejectedNews {
                index,
                news_url: url_hint,
                error,
            }),
        }
    }

    let mut conn = pool.get().await?;
    let keys: Vec<(NaiveDateTime, String)> = valid.iter().map(|(_, v)| (v.news_time, v.news_url.clone())).collect();
    let mut seen = existing_news_keys(&mut conn, &keys).await?;

    for (index, item) in valid {
        let key = (item.news_time, item.news_url.clone());
        if seen.contains(&key) {
            response.error.push(RejectedNews {
                index,
                news_url: Some(item.news_url.clone()),
                error: duplicate_message(&item),
            });
            continue;
        }

        match insert_news(&mut conn, &item).await {
            Ok(id) => {
                seen.insert(key);
                response.success.push(InsertedNews {
                    index,
                    id,
                    news_url: item.news_url,
                });
            }
            Err(e) => {
                tracing::warn!("Failed to insert {}: {}", item.news_url, e);
                let error = match e {
                    diesel::result::Error::DatabaseError(DatabaseErrorKind::UniqueViolation, _) => {
                        duplicate_message(&item)
                    }
                    other => other.to_string(),
                };
                response.error.push(RejectedNews {
                    index,
                    news_url: Some(item.news_url),
                    error,
                });
            }
        }
    }

    response.error.sort_by_key(|r| r.index);
    tracing::info!(
        "Stored {} news, rejected {}",
        response.success.len(),
        response.error.len()
    );
    Ok((StatusCode::OK, Json(response)))
}

async fn fetch_news(conn: &mut AsyncSqliteConnection, id: i32) -> Result<Option<News>, diesel::result::Error> {
    news::table
        .find(id)
        .select(News::as_select())
        .first(conn)
        .await
        .optional()
}

/// PUT /news/{id} - Write fetched content and metadata for an article
pub async fn put_news(
    State(pool): State<DbPool>,
    Path(id): Path<i32>,
    payload: Result<Json<UpdateNewsPayload>, JsonRejection>,
) -> Result<impl IntoResponse, UpdateNewsError> {
    let Json(payload) = payload?;
    let mut conn = pool.get().await?;

    let current = fetch_news(&mut conn, id).await?.ok_or(UpdateNewsError::NotFound(id))?;
    let update = payload.validate(&current)?;
    let query_state = update.changes.query_state.unwrap_or(current.query_state);

    conn.transaction(|conn| {
        async move {
            let mut changes = update.changes;
            if let Some(name) = &update.author {
                changes.author_id = Some(lookup::author_id(conn, name).await?);
            }
            if !changes.is_empty() {
                diesel::update(news::table.find(id)).set(&changes).execute(conn).await?;
            }
            if let Some(keywords) = &update.keywords {
                lookup::replace_news_keywords(conn, id, keywords.names()).await?;
            }
            if let Some(categories) = &update.categories {
                lookup::replace_news_categories(conn, id, categories.names()).await?;
            }
            Ok::<(), UpdateNewsError>(())
        }
        .scope_boxed()
    })
    .await?;

    tracing::debug!("Updated news {} (state {:?})", id, query_state);
    Ok((StatusCode::OK, Json(UpdateNewsResponse { id, query_state })))
}

/// GET /news - List articles, newest first
pub async fn get_news_list(
    State(pool): State<DbPool>,
    query: Result<Query<NewsListQuery>, QueryRejection>,
) -> Result<impl IntoResponse, GetNewsError> {
    let Query(query) = query?;

    let limit = match query.limit {
        None => DEFAULT_LIST_LIMIT,
        Some(n) if (1..=MAX_LIST_LIMIT).contains(&n) => n,
        Some(n) => {
            return Err(FieldError::invalid("limit", format!("{} is outside 1..={}", n, MAX_LIST_LIMIT)).into());
        }
    };

    let mut select = news::table.select(News::as_select()).into_boxed::<Sqlite>();
    if let Some(source) = query.source_website {
        let source = SourceWebsite::try_from(source).map_err(|e| FieldError::invalid("source_website", e))?;
        select = select.filter(news::source_website.eq(source));
    }
    if let Some(state) = query.query_state {
        let state = QueryState::try_from(state).map_err(|e| FieldError::invalid("query_state", e))?;
        select = select.filter(news::query_state.eq(state));
    }

    let mut conn = pool.get().await?;
    let rows: Vec<News> = select
        .order((news::news_time.desc(), news::id.desc()))
        .limit(limit)
        .load(&mut conn)
        .await?;

    let summaries: Vec<NewsSummary> = rows.into_iter().map(NewsSummary::from).collect();
    Ok((StatusCode::OK, Json(summaries)))
}

/// GET /news/{id} - One article with its author, keywords, categories and AI annotations
pub async fn get_news(State(pool): State<DbPool>, Path(id): Path<i32>) -> Result<impl IntoResponse, GetNewsError> {
    let mut conn = pool.get().await?;

    let news = fetch_news(&mut conn, id).await?.ok_or(GetNewsError::NotFound(id))?;

    let author = match news.author_id {
        Some(author_id) => author::table
            .find(author_id)
            .select(author::name)
            .first::<String>(&mut conn)
            .await
            .optional()?,
        None => None,
    };
    let keywords = lookup::news_keyword_names(&mut conn, id).await?;
    let categories = lookup::news_category_names(&mut conn, id).await?;

    let annotations: Vec<AiNews> = ai_news::table
        .filter(ai_news::news_id.eq(id))
        .order(ai_news::ai_model.asc())
        .select(AiNews::as_select())
        .load(&mut conn)
        .await?;

    let mut ai_details = Vec::with_capacity(annotations.len());
    for annotation in annotations {
        ai_details.push(AiNewsDetail {
            categories: lookup::ai_news_category_names(&mut conn, annotation.id).await?,
            keywords: lookup::ai_news_keyword_names(&mut conn, annotation.id).await?,
            id: annotation.id,
            ai_title: annotation.ai_title,
            sentiment: annotation.sentiment,
            ai_model: annotation.ai_model,
            created_at: annotation.created_at,
        });
    }

    Ok((
        StatusCode::OK,
        Json(NewsDetail {
            news,
            author,
            categories,
            keywords,
            ai_news: ai_details,
        }),
    ))
}
