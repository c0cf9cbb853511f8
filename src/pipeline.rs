//! Explicit composition of the per-request middleware chain.
//!
//! The ordering is a contract, not an accident of call sites:
//!
//! 1. `cors` - must see and answer `OPTIONS` before anything else runs
//! 2. `error_boundary` - wraps all later stages so their failures are
//!    normalized, not propagated raw
//! 3. `rate_limit` - reject abusive traffic before spending work on it
//! 4. `sanitize` - clean inputs before any handler or auth logic reads them
//! 5. `auth_resolve` - resolve identity last, from sanitized cookie data
//!
//! Stages communicate through the evolving request (sanitized URL/body) and
//! the `AuthContext` extension populated by stage 5.

use axum::middleware::{from_fn, from_fn_with_state};
use axum::Router;

use crate::middleware;
use crate::state::AppState;

/// Attach the protection pipeline to a router.
///
/// Axum runs the last-added layer first, so the layers are attached in
/// reverse of their execution order.
pub fn apply(router: Router, state: &AppState) -> Router {
    router
        .layer(from_fn_with_state(state.clone(), middleware::auth::resolve_session_middleware))
        .layer(from_fn(middleware::sanitize::sanitize_middleware))
        .layer(from_fn_with_state(state.clone(), middleware::rate_limit::rate_limit_middleware))
        .layer(from_fn_with_state(state.clone(), middleware::error_boundary::error_boundary_middleware))
        .layer(from_fn_with_state(state.clone(), middleware::cors::cors_middleware))
}
