pub mod routes;
pub mod state;

pub use state::AppState;
