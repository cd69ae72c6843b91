use axum::{
    Router, middleware,
    routing::{get, post},
};
use core_twn::health_check;
use tower_http::trace::TraceLayer;

use crate::AppState;

pub mod ai_news;
pub mod logging_middleware;
pub mod lookup;
pub mod news;
pub mod queue;

//
// Router
//

pub fn router() -> Router<AppState> {
    Router::new()
        .route("/health", get(health_check))
        .route("/news", get(news::get_news_list).post(news::post_news))
        .route("/news/{id}", get(news::get_news).put(news::put_news))
        .route("/wait_query_list", post(queue::wait_query_list))
        .route("/wait_ai_handle_list", post(queue::wait_ai_handle_list))
        .route("/add_ai_news", post(ai_news::add_ai_news))
        // Custom route access logging
        .layer(middleware::from_fn(logging_middleware::log_route_access))
        // Tracing middleware
        .layer(TraceLayer::new_for_http())
}
