pub mod api_client;
pub mod common;
pub mod errors;
pub mod html;
pub mod llms;
pub mod news_time;

pub use api_client::NewsApiClient;
pub use common::db_env::{get_database_url, get_db_pool};
pub use common::delay::PoliteDelay;
pub use common::health::health_check;
pub use common::hostname::{HostPortError, base_url_for, get_api_base_url, get_bind_address};
pub use common::logging::setup_logging;
pub use common::poll_interval::{TimeUnit, duration_from_env, number_from_env};
pub use errors::Error;
pub use llms::{ChatMessage, Conversation, LlmProvider};
