use chrono::NaiveDateTime;
use diesel::deserialize::{self, FromSql, FromSqlRow};
use diesel::expression::AsExpression;
use diesel::prelude::*;
use diesel::serialize::{self, IsNull, Output, ToSql};
use diesel::sql_types::Integer;
use diesel::sqlite::{Sqlite, SqliteValue};
use serde::{Deserialize, Serialize};

/// Wire and storage format of `news_time`.
pub const NEWS_TIME_FORMAT: &str = "%Y-%m-%d %H:%M:%S";

/// Parses a `YYYY-MM-DD HH:MM:SS` timestamp.
pub fn parse_news_time(value: &str) -> Result<NaiveDateTime, chrono::ParseError> {
    NaiveDateTime::parse_from_str(value.trim(), NEWS_TIME_FORMAT)
}

/// Serde adapter so timestamps travel as `2025-01-01 00:00:00` rather than chrono's ISO 8601 default.
pub mod news_time_format {
    use chrono::NaiveDateTime;
    use serde::{Deserialize, Deserializer, Serializer};

    use super::{NEWS_TIME_FORMAT, parse_news_time};

    pub fn serialize<S: Serializer>(value: &NaiveDateTime, serializer: S) -> Result<S::Ok, S::Error> {
        serializer.serialize_str(&value.format(NEWS_TIME_FORMAT).to_string())
    }

    pub fn deserialize<'de, D: Deserializer<'de>>(deserializer: D) -> Result<NaiveDateTime, D::Error> {
        let raw = String::deserialize(deserializer)?;
        parse_news_time(&raw).map_err(serde::de::Error::custom)
    }

    pub mod option {
        use chrono::NaiveDateTime;
        use serde::{Deserialize, Deserializer, Serializer};

        use super::super::{NEWS_TIME_FORMAT, parse_news_time};

        pub fn serialize<S: Serializer>(value: &Option<NaiveDateTime>, serializer: S) -> Result<S::Ok, S::Error> {
            match value {
                Some(v) => serializer.serialize_str(&v.format(NEWS_TIME_FORMAT).to_string()),
                None => serializer.serialize_none(),
            }
        }

        pub fn deserialize<'de, D: Deserializer<'de>>(deserializer: D) -> Result<Option<NaiveDateTime>, D::Error> {
            Option::<String>::deserialize(deserializer)?
                .map(|raw| parse_news_time(&raw).map_err(serde::de::Error::custom))
                .transpose()
        }
    }
}

/// An integer read from the database or a request that doesn't name any variant of the enum.
#[derive(Debug, Clone, PartialEq, Eq, thiserror::Error)]
#[error("{value} is not a valid {type_name}")]
pub struct UnknownVariant {
    pub type_name: &'static str,
    pub value: i32,
}

/// Declares an enum stored as an INTEGER column and sent over the wire as a plain JSON number.
macro_rules! int_enum {
    (
        $(#[$meta:meta])*
        pub enum $name:ident {
            $( $(#[$vmeta:meta])* $variant:ident = $value:literal ),+ $(,)?
        }
    ) => {
        $(#[$meta])*
        #[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize, AsExpression, FromSqlRow)]
        #[diesel(sql_type = Integer)]
        #[serde(try_from = "i32", into = "i32")]
        pub enum $name {
            $( $(#[$vmeta])* $variant = $value ),+
        }

        impl TryFrom<i32> for $name {
            type Error = UnknownVariant;

            fn try_from(value: i32) -> Result<Self, Self::Error> {
                match value {
                    $( $value => Ok($name::$variant), )+
                    _ => Err(UnknownVariant {
                        type_name: stringify!($name),
                        value,
                    }),
                }
            }
        }

        impl From<$name> for i32 {
            fn from(value: $name) -> i32 {
                value as i32
            }
        }

        impl ToSql<Integer, Sqlite> for $name {
            fn to_sql<'b>(&'b self, out: &mut Output<'b, '_, Sqlite>) -> serialize::Result {
                out.set_value(i32::from(*self));
                Ok(IsNull::No)
            }
        }

        impl FromSql<Integer, Sqlite> for $name {
            fn from_sql(bytes: SqliteValue<'_, '_, '_>) -> deserialize::Result<Self> {
                let value = <i32 as FromSql<Integer, Sqlite>>::from_sql(bytes)?;
                Ok($name::try_from(value)?)
            }
        }
    };
}

int_enum! {
    /// The news portal an article was scraped from.
    pub enum SourceWebsite {
        /// 台視新聞 (news.ttv.com.tw)
        Ttv = 1,
        /// 三立新聞網 (www.setn.com)
        Setn = 2,
    }
}

impl SourceWebsite {
    pub fn slug(&self) -> &'static str {
        match self {
            Self::Ttv => "ttv",
            Self::Setn => "setn",
        }
    }
}

int_enum! {
    /// Scrape lifecycle of a news row. Only ever moves forward.
    pub enum QueryState {
        /// Created by a listing scrape: title, time and URL only.
        Listed = 0,
        /// A detail-fetch worker claimed the row and holds its lease.
        Claimed = 1,
        /// Content and metadata have been written.
        Fetched = 2,
    }
}

impl QueryState {
    /// True when a row in `self` may be moved to `next` by a content update.
    /// Listed -> Claimed belongs to the claim endpoint and is never allowed here.
    pub fn can_update_to(&self, next: QueryState) -> bool {
        next == QueryState::Fetched
    }
}

int_enum! {
    /// Sentiment label produced by the annotation model.
    pub enum Sentiment {
        Positive = 0,
        Negative = 1,
        Neutral = 2,
    }
}

impl Sentiment {
    /// Resolves the model's free-text label (Chinese or English) to a sentiment.
    pub fn from_label(label: &str) -> Option<Sentiment> {
        let label = label.trim();
        match label {
            "正面" => Some(Self::Positive),
            "負面" | "负面" => Some(Self::Negative),
            "中立" | "中性" => Some(Self::Neutral),
            _ => match label.to_ascii_lowercase().as_str() {
                "positive" => Some(Self::Positive),
                "negative" => Some(Self::Negative),
                "neutral" => Some(Self::Neutral),
                _ => None,
            },
        }
    }

    pub fn label(&self) -> &'static str {
        match self {
            Self::Positive => "正面",
            Self::Negative => "負面",
            Self::Neutral => "中立",
        }
    }
}

int_enum! {
    /// Chat model that produced an annotation.
    pub enum AiModel {
        Gemma3_12b = 1,
        Gemma3_27b = 2,
        Llama3_1_8b = 3,
    }
}

impl AiModel {
    pub fn model_name(&self) -> &'static str {
        match self {
            Self::Gemma3_12b => "gemma3:12b-it-qat",
            Self::Gemma3_27b => "gemma3:27b-it-qat",
            Self::Llama3_1_8b => "llama3.1:8b",
        }
    }

    pub fn from_model_name(name: &str) -> Option<AiModel> {
        [Self::Gemma3_12b, Self::Gemma3_27b, Self::Llama3_1_8b]
            .into_iter()
            .find(|m| m.model_name() == name.trim())
    }
}

impl Default for AiModel {
    fn default() -> Self {
        Self::Gemma3_12b
    }
}

// news table model (database representation)
#[derive(Debug, Clone, PartialEq, Eq, Queryable, Selectable, Identifiable, Serialize, Deserialize)]
#[diesel(table_name = crate::schema::news)]
#[diesel(check_for_backend(diesel::sqlite::Sqlite))]
pub struct News {
    pub id: i32,
    #[serde(with = "news_time_format")]
    pub news_time: NaiveDateTime,
    pub news_title: String,
    pub news_content: Option<String>,
    pub image_url: Option<String>,
    pub news_url: String,
    pub source_website: SourceWebsite,
    pub author_id: Option<i32>,
    pub query_state: QueryState,
    #[serde(with = "news_time_format::option")]
    pub claimed_at: Option<NaiveDateTime>,
}

/// A stub row produced by a listing scrape.
#[derive(Debug, Clone, PartialEq, Eq, Insertable)]
#[diesel(table_name = crate::schema::news)]
pub struct NewNews {
    pub news_time: NaiveDateTime,
    pub news_title: String,
    pub image_url: Option<String>,
    pub news_url: String,
    pub source_website: SourceWebsite,
    pub author_id: Option<i32>,
    pub query_state: QueryState,
}

/// Every column a PUT may touch. `None` leaves the column as it is.
#[derive(Debug, Clone, Default, PartialEq, Eq, AsChangeset)]
#[diesel(table_name = crate::schema::news)]
pub struct NewsChangeset {
    pub news_time: Option<NaiveDateTime>,
    pub news_title: Option<String>,
    pub news_content: Option<String>,
    pub image_url: Option<String>,
    pub author_id: Option<i32>,
    pub query_state: Option<QueryState>,
}

impl NewsChangeset {
    /// Diesel refuses to run an UPDATE without any SET clause.
    pub fn is_empty(&self) -> bool {
        self == &NewsChangeset::default()
    }
}

// ai_news table model (database representation)
#[derive(Debug, Clone, PartialEq, Eq, Queryable, Selectable, Identifiable, Serialize, Deserialize)]
#[diesel(table_name = crate::schema::ai_news)]
#[diesel(check_for_backend(diesel::sqlite::Sqlite))]
pub struct AiNews {
    pub id: i32,
    pub news_id: i32,
    pub ai_title: String,
    pub sentiment: Sentiment,
    pub ai_model: AiModel,
    #[serde(with = "news_time_format")]
    pub created_at: NaiveDateTime,
}

#[derive(Debug, Clone, PartialEq, Eq, Insertable)]
#[diesel(table_name = crate::schema::ai_news)]
pub struct NewAiNews {
    pub news_id: i32,
    pub ai_title: String,
    pub sentiment: Sentiment,
    pub ai_model: AiModel,
    pub created_at: NaiveDateTime,
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_int_enum_round_trips_through_i32() {
        assert_eq!(SourceWebsite::try_from(1), Ok(SourceWebsite::Ttv));
        assert_eq!(i32::from(QueryState::Fetched), 2);
        assert_eq!(
            AiModel::try_from(42),
            Err(UnknownVariant {
                type_name: "AiModel",
                value: 42
            })
        );
    }

    #[test]
    fn test_int_enum_json_is_a_number() {
        assert_eq!(serde_json::to_string(&QueryState::Claimed).unwrap(), "1");
        let parsed: SourceWebsite = serde_json::from_str("2").unwrap();
        assert_eq!(parsed, SourceWebsite::Setn);
        assert!(serde_json::from_str::<SourceWebsite>("7").is_err());
    }

    #[test]
    fn test_sentiment_from_label() {
        assert_eq!(Sentiment::from_label("正面"), Some(Sentiment::Positive));
        assert_eq!(Sentiment::from_label(" 負面 "), Some(Sentiment::Negative));
        assert_eq!(Sentiment::from_label("中立"), Some(Sentiment::Neutral));
        assert_eq!(Sentiment::from_label("Neutral"), Some(Sentiment::Neutral));
        assert_eq!(Sentiment::from_label("開心"), None);
    }

    #[test]
    fn test_ai_model_names() {
        assert_eq!(AiModel::from_model_name("gemma3:12b-it-qat"), Some(AiModel::Gemma3_12b));
        assert_eq!(AiModel::from_model_name("gpt-4o"), None);
        assert_eq!(AiModel::default().model_name(), "gemma3:12b-it-qat");
    }

    #[test]
    fn test_query_state_only_updates_to_fetched() {
        assert!(QueryState::Claimed.can_update_to(QueryState::Fetched));
        assert!(QueryState::Listed.can_update_to(QueryState::Fetched));
        assert!(!QueryState::Listed.can_update_to(QueryState::Claimed));
        assert!(!QueryState::Fetched.can_update_to(QueryState::Listed));
    }

    #[test]
    fn test_news_time_format() {
        let t = parse_news_time("2025-01-01 08:30:00").unwrap();
        assert_eq!(t.format(NEWS_TIME_FORMAT).to_string(), "2025-01-01 08:30:00");
        assert!(parse_news_time("2025.01.01 08:30").is_err());
    }

    #[test]
    fn test_news_changeset_is_empty() {
        assert!(NewsChangeset::default().is_empty());
        let changes = NewsChangeset {
            news_title: Some("title".to_string()),
            ..Default::default()
        };
        assert!(!changes.is_empty());
    }
}
