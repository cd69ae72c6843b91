use axum::Json;
use axum::extract::rejection::{JsonRejection, QueryRejection};
use axum::http::StatusCode;
use axum::response::IntoResponse;
use chrono::NaiveDateTime;
use serde::{Deserialize, Serialize};

use crate::db::PoolError;
use crate::models::{
    AiModel, News, NewsChangeset, QueryState, Sentiment, SourceWebsite, news_time_format, parse_news_time,
};

// Field validation

/// A request field that is missing or can't be used.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize, thiserror::Error)]
#[error("{field}: {reason}")]
pub struct FieldError {
    pub field: String,
    pub reason: String,
}

impl FieldError {
    pub fn missing(field: &str) -> Self {
        Self {
            field: field.to_string(),
            reason: "missing required field".to_string(),
        }
    }

    pub fn invalid(field: &str, reason: impl ToString) -> Self {
        Self {
            field: field.to_string(),
            reason: reason.to_string(),
        }
    }
}

fn required<T>(value: Option<T>, field: &str) -> Result<T, FieldError> {
    value.ok_or_else(|| FieldError::missing(field))
}

fn required_text(value: Option<String>, field: &str) -> Result<String, FieldError> {
    let value = required(value, field)?;
    let trimmed = value.trim();
    if trimmed.is_empty() {
        Err(FieldError::invalid(field, "must not be empty"))
    } else {
        Ok(trimmed.to_string())
    }
}

fn time_field(value: &str, field: &str) -> Result<NaiveDateTime, FieldError> {
    parse_news_time(value).map_err(|e| FieldError::invalid(field, format!("expected YYYY-MM-DD HH:MM:SS ({})", e)))
}

fn source_field(value: i32) -> Result<SourceWebsite, FieldError> {
    SourceWebsite::try_from(value).map_err(|e| FieldError::invalid("source_website", e))
}

/// Batch size for the queue endpoints. Absent means the default; out-of-range counts are rejected, not clamped.
pub fn batch_count(count: Option<i64>, field: &str) -> Result<i64, FieldError> {
    match count {
        None => Ok(DEFAULT_BATCH_COUNT),
        Some(n) if (1..=MAX_BATCH_COUNT).contains(&n) => Ok(n),
        Some(n) => Err(FieldError::invalid(
            field,
            format!("{} is outside 1..={}", n, MAX_BATCH_COUNT),
        )),
    }
}

pub const DEFAULT_BATCH_COUNT: i64 = 10;
pub const MAX_BATCH_COUNT: i64 = 100;

/// Lookup-table names: accepts a JSON list or a single comma-separated string
/// (models like to answer with `"a, b, c"`). Entries are trimmed, empties dropped, duplicates removed.
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(from = "NameListRepr")]
pub struct NameList(pub Vec<String>);

#[derive(Deserialize)]
#[serde(untagged)]
enum NameListRepr {
    List(Vec<String>),
    Joined(String),
}

impl From<NameListRepr> for NameList {
    fn from(repr: NameListRepr) -> Self {
        let raw: Vec<String> = match repr {
            NameListRepr::List(items) => items,
            NameListRepr::Joined(joined) => joined.split([',', '，', '、']).map(str::to_string).collect(),
        };
        NameList::new(raw)
    }
}

impl NameList {
    pub fn new<I, S>(names: I) -> Self
    where
        I: IntoIterator<Item = S>,
        S: AsRef<str>,
    {
        let mut out: Vec<String> = Vec::new();
        for name in names {
            let name = name.as_ref().trim();
            if !name.is_empty() && !out.iter().any(|n| n == name) {
                out.push(name.to_string());
            }
        }
        NameList(out)
    }

    pub fn names(&self) -> &[String] {
        &self.0
    }

    pub fn is_empty(&self) -> bool {
        self.0.is_empty()
    }
}

// API Payload Types

/// One item of a `POST /news` batch, as sent by a listing scrape.
/// Everything is optional here so that a bad item is reported on its own instead of failing the batch.
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct NewsDraft {
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub news_time: Option<String>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub news_title: Option<String>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub news_url: Option<String>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub source_website: Option<i32>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub image_url: Option<String>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub author: Option<String>,
    #[serde(default, alias = "categories", skip_serializing_if = "Option::is_none")]
    pub category: Option<NameList>,
    #[serde(default, alias = "keyword", skip_serializing_if = "Option::is_none")]
    pub keywords: Option<NameList>,
}

/// A `NewsDraft` that passed validation.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct ValidNewsDraft {
    pub news_time: NaiveDateTime,
    pub news_title: String,
    pub news_url: String,
    pub source_website: SourceWebsite,
    pub image_url: Option<String>,
    pub author: Option<String>,
    pub categories: NameList,
    pub keywords: NameList,
}

impl NewsDraft {
    pub fn validate(self) -> Result<ValidNewsDraft, FieldError> {
        let news_time = time_field(&required(self.news_time, "news_time")?, "news_time")?;
        let news_title = required_text(self.news_title, "news_title")?;
        let news_url = required_text(self.news_url, "news_url")?;
        let source_website = source_field(required(self.source_website, "source_website")?)?;
        Ok(ValidNewsDraft {
            news_time,
            news_title,
            news_url,
            source_website,
            image_url: self.image_url.filter(|u| !u.trim().is_empty()),
            author: self.author.map(|a| a.trim().to_string()).filter(|a| !a.is_empty()),
            categories: self.category.unwrap_or_default(),
            keywords: self.keywords.unwrap_or_default(),
        })
    }
}

/// `POST /news` accepts a single object as well as a list.
#[derive(Debug, Clone, Deserialize)]
#[serde(untagged)]
pub enum OneOrMany<T> {
    Many(Vec<T>),
    One(T),
}

impl<T> OneOrMany<T> {
    pub fn into_vec(self) -> Vec<T> {
        match self {
            OneOrMany::Many(items) => items,
            OneOrMany::One(item) => vec![item],
        }
    }
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct InsertedNews {
    pub index: usize,
    pub id: i32,
    pub news_url: String,
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct RejectedNews {
    pub index: usize,
    pub news_url: Option<String>,
    pub error: String,
}

/// Response payload for POST /news. Every input item lands in exactly one of the two lists.
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct InsertNewsResponse {
    pub success: Vec<InsertedNews>,
    pub error: Vec<RejectedNews>,
}

/// Input payload for PUT /news/{id}
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct UpdateNewsPayload {
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub news_time: Option<String>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub news_title: Option<String>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub news_content: Option<String>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub image_url: Option<String>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub author: Option<String>,
    #[serde(default, alias = "keyword", skip_serializing_if = "Option::is_none")]
    pub keywords: Option<NameList>,
    #[serde(default, alias = "categories", skip_serializing_if = "Option::is_none")]
    pub category: Option<NameList>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub query_state: Option<i32>,
}

/// An `UpdateNewsPayload` reduced to the allow-listed columns plus the lookups to resolve.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct ValidNewsUpdate {
    pub changes: NewsChangeset,
    pub author: Option<String>,
    pub keywords: Option<NameList>,
    pub categories: Option<NameList>,
}

impl UpdateNewsPayload {
    /// Checks field formats and the state transition against the row's current state.
    /// Supplying content implies the row is now fetched.
    pub fn validate(self, current: &News) -> Result<ValidNewsUpdate, FieldError> {
        let news_time = self
            .news_time
            .as_deref()
            .map(|t| time_field(t, "news_time"))
            .transpose()?;
        let news_title = self.news_title.map(|t| t.trim().to_string()).filter(|t| !t.is_empty());
        let news_content = self.news_content.filter(|c| !c.trim().is_empty());

        let requested_state = self
            .query_state
            .map(|s| QueryState::try_from(s).map_err(|e| FieldError::invalid("query_state", e)))
            .transpose()?;

        let query_state = match (requested_state, &news_content) {
            (Some(next), _) => {
                if !current.query_state.can_update_to(next) {
                    return Err(FieldError::invalid(
                        "query_state",
                        format!(
                            "cannot move from {} to {} through an update",
                            i32::from(current.query_state),
                            i32::from(next)
                        ),
                    ));
                }
                if news_content.is_none() && current.news_content.is_none() {
                    return Err(FieldError::invalid("query_state", "a fetched article needs news_content"));
                }
                Some(next)
            }
            (None, Some(_)) => Some(QueryState::Fetched),
            (None, None) => None,
        };

        Ok(ValidNewsUpdate {
            changes: NewsChangeset {
                news_time,
                news_title,
                news_content,
                image_url: self.image_url.filter(|u| !u.trim().is_empty()),
                author_id: None,
                query_state,
            },
            author: self.author.map(|a| a.trim().to_string()).filter(|a| !a.is_empty()),
            keywords: self.keywords,
            categories: self.category,
        })
    }
}

/// Response payload for PUT /news/{id}
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct UpdateNewsResponse {
    pub id: i32,
    pub query_state: QueryState,
}

/// Input payload for POST /wait_query_list
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct ClaimPayload {
    pub source_website: i32,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub count: Option<i64>,
}

/// A row handed to a detail-fetch worker.
#[derive(Debug, Clone, PartialEq, Eq, diesel::Queryable, Serialize, Deserialize)]
pub struct ClaimedNews {
    pub id: i32,
    pub news_url: String,
}

/// Input payload for POST /wait_ai_handle_list
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct AiHandlePayload {
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub count: Option<i64>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub ai_model: Option<i32>,
    /// Article ids to leave out, e.g. the ones a worker already failed on this run.
    #[serde(default, skip_serializing_if = "Vec::is_empty")]
    pub exclude: Vec<i32>,
}

/// An article waiting for annotation by a model.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct AiHandleNews {
    pub id: i32,
    pub news_title: String,
    pub news_content: String,
}

/// Input payload for POST /add_ai_news. Field names follow the JSON block the model is prompted to produce.
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct AddAiNewsPayload {
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub news_id: Option<i32>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub ai_model: Option<i32>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub title: Option<String>,
    #[serde(default, alias = "categories", skip_serializing_if = "Option::is_none")]
    pub category: Option<NameList>,
    #[serde(default, alias = "keywords", skip_serializing_if = "Option::is_none")]
    pub keyword: Option<NameList>,
    #[serde(default, alias = "sentiment", skip_serializing_if = "Option::is_none")]
    pub sentiment_analysis: Option<String>,
}

#[derive(Debug, Clone, PartialEq, Eq)]
pub struct ValidAiAnnotation {
    pub news_id: i32,
    pub ai_model: AiModel,
    pub title: String,
    pub categories: NameList,
    pub keywords: NameList,
    pub sentiment: Sentiment,
}

impl AddAiNewsPayload {
    pub fn validate(self) -> Result<ValidAiAnnotation, FieldError> {
        let title = required_text(self.title, "title")?;
        let categories = required(self.category, "category")?;
        let keywords = required(self.keyword, "keyword")?;
        let sentiment_label = required(self.sentiment_analysis, "sentiment_analysis")?;
        let news_id = required(self.news_id, "news_id")?;
        let sentiment = Sentiment::from_label(&sentiment_label).ok_or_else(|| {
            FieldError::invalid(
                "sentiment_analysis",
                format!("'{}' is not one of 正面 / 負面 / 中立", sentiment_label),
            )
        })?;
        let ai_model = match self.ai_model {
            Some(m) => AiModel::try_from(m).map_err(|e| FieldError::invalid("ai_model", e))?,
            None => AiModel::default(),
        };
        Ok(ValidAiAnnotation {
            news_id,
            ai_model,
            title,
            categories,
            keywords,
            sentiment,
        })
    }
}

/// Response payload for POST /add_ai_news
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct AddAiNewsResponse {
    pub id: i32,
}

/// Query string for GET /news
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct NewsListQuery {
    pub source_website: Option<i32>,
    pub query_state: Option<i32>,
    pub limit: Option<i64>,
}

pub const DEFAULT_LIST_LIMIT: i64 = 100;
pub const MAX_LIST_LIMIT: i64 = 1000;

/// Individual item in the GET /news response
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct NewsSummary {
    pub id: i32,
    #[serde(with = "news_time_format")]
    pub news_time: NaiveDateTime,
    pub news_title: String,
    pub news_url: String,
    pub source_website: SourceWebsite,
    pub query_state: QueryState,
}

impl From<News> for NewsSummary {
    fn from(news: News) -> Self {
        Self {
            id: news.id,
            news_time: news.news_time,
            news_title: news.news_title,
            news_url: news.news_url,
            source_website: news.source_website,
            query_state: news.query_state,
        }
    }
}

/// An annotation as shown in GET /news/{id}
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct AiNewsDetail {
    pub id: i32,
    pub ai_title: String,
    pub sentiment: Sentiment,
    pub ai_model: AiModel,
    #[serde(with = "news_time_format")]
    pub created_at: NaiveDateTime,
    pub categories: Vec<String>,
    pub keywords: Vec<String>,
}

/// Response payload for GET /news/{id}
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct NewsDetail {
    #[serde(flatten)]
    pub news: News,
    pub author: Option<String>,
    pub categories: Vec<String>,
    pub keywords: Vec<String>,
    pub ai_news: Vec<AiNewsDetail>,
}

// API Error Types

/// Error for POST /news. Per-item problems are not errors: they go in the response's `error` list.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(tag = "error", content = "details")]
pub enum PostNewsError {
    /// The body isn't JSON or doesn't have the shape of a news item (list)
    #[serde(rename = "malformed_body")]
    MalformedBody(String),
    /// Unknown error occurred
    #[serde(rename = "unknown")]
    Unknown(String),
}

/// Error for PUT /news/{id}
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(tag = "error", content = "details")]
pub enum UpdateNewsError {
    #[serde(rename = "malformed_body")]
    MalformedBody(String),
    #[serde(rename = "invalid_field")]
    InvalidField(FieldError),
    /// No news row has this id
    #[serde(rename = "not_found")]
    NotFound(i32),
    #[serde(rename = "unknown")]
    Unknown(String),
}

/// Error for the work-queue endpoints: POST /wait_query_list and POST /wait_ai_handle_list
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(tag = "error", content = "details")]
pub enum QueueError {
    #[serde(rename = "malformed_body")]
    MalformedBody(String),
    #[serde(rename = "invalid_field")]
    InvalidField(FieldError),
    #[serde(rename = "unknown")]
    Unknown(String),
}

/// Error for POST /add_ai_news
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(tag = "error", content = "details")]
pub enum AddAiNewsError {
    #[serde(rename = "malformed_body")]
    MalformedBody(String),
    #[serde(rename = "invalid_field")]
    InvalidField(FieldError),
    /// The annotated news id doesn't exist
    #[serde(rename = "not_found")]
    NotFound(i32),
    /// This model already annotated this article
    #[serde(rename = "already_annotated")]
    AlreadyAnnotated { news_id: i32, ai_model: AiModel },
    #[serde(rename = "unknown")]
    Unknown(String),
}

/// Error for GET /news and GET /news/{id}
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(tag = "error", content = "details")]
pub enum GetNewsError {
    #[serde(rename = "invalid_field")]
    InvalidField(FieldError),
    #[serde(rename = "not_found")]
    NotFound(i32),
    #[serde(rename = "unknown")]
    Unknown(String),
}

macro_rules! from_error {
    ($lib_err:path, $err_type:tt) => {
        /// Converts a `$lib_err` into an `$err_type::Unknown` carrying the error text.
        impl From<$lib_err> for $err_type {
            fn from(e: $lib_err) -> Self {
                $err_type::Unknown(e.to_string())
            }
        }
    };
}

macro_rules! from_field_error {
    ($err_type:tt) => {
        impl From<FieldError> for $err_type {
            fn from(e: FieldError) -> Self {
                $err_type::InvalidField(e)
            }
        }
    };
}

macro_rules! from_json_rejection {
    ($err_type:tt) => {
        /// Bodies axum can't decode are reported as a 400 with axum's description of the problem.
        impl From<JsonRejection> for $err_type {
            fn from(rejection: JsonRejection) -> Self {
                $err_type::MalformedBody(rejection.body_text())
            }
        }
    };
}

// PostNewsError

impl IntoResponse for PostNewsError {
    fn into_response(self) -> axum::response::Response {
        let status = match self {
            PostNewsError::MalformedBody(_) => StatusCode::BAD_REQUEST,
            PostNewsError::Unknown(_) => StatusCode::INTERNAL_SERVER_ERROR,
        };
        (status, Json(self)).into_response()
    }
}

from_error!(PoolError, PostNewsError);
from_error!(diesel::result::Error, PostNewsError);
from_json_rejection!(PostNewsError);

// UpdateNewsError

impl IntoResponse for UpdateNewsError {
    fn into_response(self) -> axum::response::Response {
        let status = match self {
            UpdateNewsError::MalformedBody(_) | UpdateNewsError::InvalidField(_) => StatusCode::BAD_REQUEST,
            UpdateNewsError::NotFound(_) => StatusCode::NOT_FOUND,
            UpdateNewsError::Unknown(_) => StatusCode::INTERNAL_SERVER_ERROR,
        };
        (status, Json(self)).into_response()
    }
}

from_error!(PoolError, UpdateNewsError);
from_error!(diesel::result::Error, UpdateNewsError);
from_field_error!(UpdateNewsError);
from_json_rejection!(UpdateNewsError);

// QueueError

impl IntoResponse for QueueError {
    fn into_response(self) -> axum::response::Response {
        let status = match self {
            QueueError::MalformedBody(_) | QueueError::InvalidField(_) => StatusCode::BAD_REQUEST,
            QueueError::Unknown(_) => StatusCode::INTERNAL_SERVER_ERROR,
        };
        (status, Json(self)).into_response()
    }
}

from_error!(PoolError, QueueError);
from_error!(diesel::result::Error, QueueError);
from_field_error!(QueueError);
from_json_rejection!(QueueError);

// AddAiNewsError

impl IntoResponse for AddAiNewsError {
    fn into_response(self) -> axum::response::Response {
        let status = match self {
            AddAiNewsError::MalformedBody(_) | AddAiNewsError::InvalidField(_) => StatusCode::BAD_REQUEST,
            AddAiNewsError::NotFound(_) => StatusCode::NOT_FOUND,
            AddAiNewsError::AlreadyAnnotated { .. } => StatusCode::CONFLICT,
            AddAiNewsError::Unknown(_) => StatusCode::INTERNAL_SERVER_ERROR,
        };
        (status, Json(self)).into_response()
    }
}

from_error!(PoolError, AddAiNewsError);
from_error!(diesel::result::Error, AddAiNewsError);
from_field_error!(AddAiNewsError);
from_json_rejection!(AddAiNewsError);

// GetNewsError

impl IntoResponse for GetNewsError {
    fn into_response(self) -> axum::response::Response {
        let status = match self {
            GetNewsError::InvalidField(_) => StatusCode::BAD_REQUEST,
            GetNewsError::NotFound(_) => StatusCode::NOT_FOUND,
            GetNewsError::Unknown(_) => StatusCode::INTERNAL_SERVER_ERROR,
        };
        (status, Json(self)).into_response()
    }
}

from_error!(PoolError, GetNewsError);
from_error!(diesel::result::Error, GetNewsError);
from_field_error!(GetNewsError);

impl From<QueryRejection> for GetNewsError {
    fn from(rejection: QueryRejection) -> Self {
        GetNewsError::InvalidField(FieldError::invalid("query", rejection.body_text()))
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn draft() -> NewsDraft {
        NewsDraft {
            news_time: Some("2025-01-01 00:00:00".to_string()),
            news_title: Some("A".to_string()),
            news_url: Some("http://x/1".to_string()),
            source_website: Some(1),
            ..Default::default()
        }
    }

    fn stored_news(query_state: QueryState, news_content: Option<&str>) -> News {
        News {
            id: 1,
            news_time: parse_news_time("2025-01-01 00:00:00").unwrap(),
            news_title: "A".to_string(),
            news_content: news_content.map(str::to_string),
            image_url: None,
            news_url: "http://x/1".to_string(),
            source_website: SourceWebsite::Ttv,
            author_id: None,
            query_state,
            claimed_at: None,
        }
    }

    #[test]
    fn test_name_list_accepts_list_or_joined_string() {
        let list: NameList = serde_json::from_str(r#"["政治", " 國際 ", "政治", ""]"#).unwrap();
        assert_eq!(list.names(), ["政治", "國際"]);

        let joined: NameList = serde_json::from_str(r#""賴清德(民進黨), 立法院、 預算""#).unwrap();
        assert_eq!(joined.names(), ["賴清德(民進黨)", "立法院", "預算"]);

        assert_eq!(serde_json::to_string(&list).unwrap(), r#"["政治","國際"]"#);
    }

    #[test]
    fn test_news_draft_validate_ok() {
        let valid = draft().validate().unwrap();
        assert_eq!(valid.source_website, SourceWebsite::Ttv);
        assert_eq!(valid.news_url, "http://x/1");
        assert!(valid.keywords.is_empty());
    }

    #[test]
    fn test_news_draft_validate_reports_field() {
        let missing = NewsDraft {
            news_title: None,
            ..draft()
        };
        assert_eq!(missing.validate().unwrap_err(), FieldError::missing("news_title"));

        let bad_source = NewsDraft {
            source_website: Some(99),
            ..draft()
        };
        assert_eq!(bad_source.validate().unwrap_err().field, "source_website");

        let bad_time = NewsDraft {
            news_time: Some("2025.01.01 00:00".to_string()),
            ..draft()
        };
        assert_eq!(bad_time.validate().unwrap_err().field, "news_time");
    }

    #[test]
    fn test_one_or_many() {
        let one: OneOrMany<NewsDraft> = serde_json::from_str(r#"{"news_title":"A"}"#).unwrap();
        assert_eq!(one.into_vec().len(), 1);
        let many: OneOrMany<NewsDraft> = serde_json::from_str(r#"[{"news_title":"A"},{"news_title":"B"}]"#).unwrap();
        assert_eq!(many.into_vec().len(), 2);
    }

    #[test]
    fn test_update_with_content_moves_to_fetched() {
        let payload = UpdateNewsPayload {
            news_content: Some("body".to_string()),
            ..Default::default()
        };
        let update = payload.validate(&stored_news(QueryState::Claimed, None)).unwrap();
        assert_eq!(update.changes.query_state, Some(QueryState::Fetched));
    }

    #[test]
    fn test_update_rejects_backward_or_claim_transition() {
        let back = UpdateNewsPayload {
            query_state: Some(0),
            ..Default::default()
        };
        let err = back.validate(&stored_news(QueryState::Fetched, Some("body"))).unwrap_err();
        assert_eq!(err.field, "query_state");

        let claim = UpdateNewsPayload {
            query_state: Some(1),
            ..Default::default()
        };
        assert!(claim.validate(&stored_news(QueryState::Listed, None)).is_err());
    }

    #[test]
    fn test_update_to_fetched_needs_content() {
        let payload = UpdateNewsPayload {
            query_state: Some(2),
            ..Default::default()
        };
        assert!(payload.clone().validate(&stored_news(QueryState::Claimed, None)).is_err());
        assert!(payload.validate(&stored_news(QueryState::Claimed, Some("body"))).is_ok());
    }

    #[test]
    fn test_add_ai_news_validate() {
        let payload: AddAiNewsPayload = serde_json::from_value(serde_json::json!({
            "news_id": 3,
            "title": "標題",
            "category": ["政治"],
            "keyword": "立法院, 預算",
            "sentiment_analysis": "負面"
        }))
        .unwrap();
        let valid = payload.validate().unwrap();
        assert_eq!(valid.sentiment, Sentiment::Negative);
        assert_eq!(valid.ai_model, AiModel::Gemma3_12b);
        assert_eq!(valid.keywords.names(), ["立法院", "預算"]);
    }

    #[test]
    fn test_add_ai_news_validate_missing_and_invalid() {
        let missing = AddAiNewsPayload {
            news_id: Some(1),
            title: Some("t".to_string()),
            category: Some(NameList::default()),
            sentiment_analysis: Some("中立".to_string()),
            ..Default::default()
        };
        assert_eq!(missing.validate().unwrap_err(), FieldError::missing("keyword"));

        let bad_sentiment = AddAiNewsPayload {
            news_id: Some(1),
            title: Some("t".to_string()),
            category: Some(NameList::default()),
            keyword: Some(NameList::default()),
            sentiment_analysis: Some("很好".to_string()),
            ..Default::default()
        };
        assert_eq!(bad_sentiment.validate().unwrap_err().field, "sentiment_analysis");
    }

    #[test]
    fn test_batch_count() {
        assert_eq!(batch_count(None, "count"), Ok(DEFAULT_BATCH_COUNT));
        assert_eq!(batch_count(Some(5), "count"), Ok(5));
        assert!(batch_count(Some(0), "count").is_err());
        assert!(batch_count(Some(MAX_BATCH_COUNT + 1), "count").is_err());
    }

    #[test]
    fn test_error_serialization() {
        let err = UpdateNewsError::NotFound(7);
        assert_eq!(
            serde_json::to_value(&err).unwrap(),
            serde_json::json!({"error": "not_found", "details": 7})
        );
        let err = AddAiNewsError::InvalidField(FieldError::missing("title"));
        assert_eq!(
            serde_json::to_value(&err).unwrap(),
            serde_json::json!({"error": "invalid_field", "details": {"field": "title", "reason": "missing required field"}})
        );
    }
}
