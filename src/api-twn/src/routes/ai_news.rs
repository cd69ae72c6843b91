use axum::{
    extract::{Json, State, rejection::JsonRejection},
    http::StatusCode,
    response::IntoResponse,
};
use chrono::Utc;
use diesel::prelude::*;
use diesel::result::{DatabaseErrorKind, Error as DieselError};
use diesel_async::scoped_futures::ScopedFutureExt;
use diesel_async::{AsyncConnection, RunQueryDsl};

use data_model_twn::api::{AddAiNewsError, AddAiNewsPayload, AddAiNewsResponse, ValidAiAnnotation};
use data_model_twn::db::{AsyncSqliteConnection, DbPool};
use data_model_twn::models::NewAiNews;
use data_model_twn::schema::{ai_news, news};

use crate::routes::lookup;

/// Stores one annotation with its keyword / category links.
/// The insert comes first so the unique (news, model) index decides between concurrent writers.
pub async fn insert_ai_news(
    conn: &mut AsyncSqliteConnection,
    annotation: &ValidAiAnnotation,
) -> Result<i32, AddAiNewsError> {
    let news_id = annotation.news_id;
    let ai_model = annotation.ai_model;

    conn.transaction(|conn| {
        async move {
            let id = diesel::insert_into(ai_news::table)
                .values(&NewAiNews {
                    news_id,
                    ai_title: annotation.title.clone(),
                    sentiment: annotation.sentiment,
                    ai_model,
                    created_at: Utc::now().naive_utc(),
                })
                .returning(ai_news::id)
                .get_result::<i32>(conn)
                .await
                .map_err(|e| match e {
                    DieselError::DatabaseError(DatabaseErrorKind::UniqueViolation, _) => {
                        AddAiNewsError::AlreadyAnnotated { news_id, ai_model }
                    }
                    DieselError::DatabaseError(DatabaseErrorKind::ForeignKeyViolation, _) => {
                        AddAiNewsError::NotFound(news_id)
                    }
                    other => other.into(),
                })?;

            lookup::link_ai_news_keywords(conn, id, annotation.keywords.names()).await?;
            lookup::link_ai_news_categories(conn, id, annotation.categories.names()).await?;
            Ok(id)
        }
        .scope_boxed()
    })
    .await
}

/// POST /add_ai_news - Store a model's title / category / keyword / sentiment for an article
pub async fn add_ai_news(
    State(pool): State<DbPool>,
    payload: Result<Json<AddAiNewsPayload>, JsonRejection>,
) -> Result<impl IntoResponse, AddAiNewsError> {
    let Json(payload) = payload?;
    let annotation = payload.validate()?;

    let mut conn = pool.get().await?;

    let exists = news::table
        .find(annotation.news_id)
        .select(news::id)
        .first::<i32>(&mut conn)
        .await
        .optional()?
        .is_some();
    if !exists {
        return Err(AddAiNewsError::NotFound(annotation.news_id));
    }

    let id = insert_ai_news(&mut conn, &annotation).await?;

    tracing::info!(
        "Stored {} annotation {} for news {}",
        annotation.ai_model.model_name(),
        id,
        annotation.news_id
    );
    Ok((StatusCode::CREATED, Json(AddAiNewsResponse { id })))
}
