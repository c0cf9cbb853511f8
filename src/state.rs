use std::sync::Arc;

use crate::auth::SessionStore;
use crate::config::AppConfig;
use crate::metrics::Metrics;
use crate::middleware::RateLimiter;

/// The shared application state.
///
/// Holds everything the pipeline stages and handlers need: the database pool,
/// configuration, the session store and the rate-limit counter table. The
/// counter table is constructed once here and injected into the pipeline by
/// reference, so tests get isolated instances and the backing store can be
/// swapped later.
#[derive(Clone)]
pub struct AppState {
    pub db: sqlx::SqlitePool,
    pub config: Arc<AppConfig>,
    pub sessions: SessionStore,
    pub rate_limiter: RateLimiter,
    pub metrics: Metrics,
}

impl AppState {
    pub fn new(db: sqlx::SqlitePool, config: AppConfig) -> Self {
        let sessions = SessionStore::new(
            db.clone(),
            config.session.expiry_days,
            config.session.single_session_per_user,
        );
        Self {
            db,
            config: Arc::new(config),
            sessions,
            rate_limiter: RateLimiter::new(),
            metrics: Metrics::new(),
        }
    }
}
