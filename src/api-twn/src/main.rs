use core_twn::{get_bind_address, get_db_pool, setup_logging};

use api_twn::{AppState, routes};

#[tokio::main]
async fn main() {
    // Load environment variables from .env file
    dotenvy::dotenv().ok();

    setup_logging("api_twn=debug,tower_http=debug");

    let pool = match get_db_pool().await {
        Ok(p) => p,
        Err(e) => panic!("Couldn't open the database ({}): {}", core_twn::get_database_url(), e),
    };
    let state = AppState::from_env(pool).expect("Invalid CLAIM_LEASE_S");
    tracing::info!("Claim lease is {}s", state.claim_lease.num_seconds());

    let app = routes::router().with_state(state);

    let addr = get_bind_address().expect("Invalid HOST or PORT");
    let listener = tokio::net::TcpListener::bind(addr)
        .await
        .unwrap_or_else(|e| panic!("Failed to bind to address {}: {}", addr, e));
    tracing::info!("Listening on http://{}", addr);

    axum::serve(listener, app).await.expect("Server error");
}
