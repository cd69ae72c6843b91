use axum::extract::FromRef;
use chrono::TimeDelta;
use core_twn::number_from_env;
use data_model_twn::db::DbPool;

pub const DEFAULT_CLAIM_LEASE_S: i64 = 600;

/// Shared by every handler.
#[derive(Clone)]
pub struct AppState {
    pub pool: DbPool,
    /// How long a claimed row belongs to its detail-fetch worker before it may be claimed again.
    pub claim_lease: TimeDelta,
}

impl AppState {
    pub fn new(pool: DbPool) -> Self {
        Self {
            pool,
            claim_lease: TimeDelta::seconds(DEFAULT_CLAIM_LEASE_S),
        }
    }

    pub fn with_claim_lease(mut self, claim_lease: TimeDelta) -> Self {
        self.claim_lease = claim_lease;
        self
    }

    /// Lease length from CLAIM_LEASE_S.
    pub fn from_env(pool: DbPool) -> Result<Self, core_twn::Error> {
        let lease_s = number_from_env("CLAIM_LEASE_S", DEFAULT_CLAIM_LEASE_S)?;
        Ok(Self::new(pool).with_claim_lease(TimeDelta::seconds(lease_s)))
    }
}

impl FromRef<AppState> for DbPool {
    fn from_ref(state: &AppState) -> Self {
        state.pool.clone()
    }
}
