//! Outermost error normalization stage.
//!
//! Wraps every later stage so their failures reach the client as the typed
//! error envelope: `AppError` responses produced anywhere downstream are
//! re-presented according to route class and the production flag, and panics
//! are converted to `SERVER_ERROR` instead of tearing down the request. No
//! request terminates the process.

use axum::{
    extract::{Request, State},
    http::header::{CONTENT_LENGTH, CONTENT_TYPE},
    middleware::Next,
    response::Response,
};
use futures::FutureExt;
use std::panic::AssertUnwindSafe;

use crate::error::{self, AppError, ErrorKind};
use crate::state::AppState;

fn is_api_route(path: &str) -> bool {
    path.starts_with("/api/")
}

/// Pipeline stage: normalize all downstream failures.
pub async fn error_boundary_middleware(
    State(state): State<AppState>,
    req: Request,
    next: Next,
) -> Response {
    let api = is_api_route(req.uri().path());
    let production = state.config.security.production;

    let res = AssertUnwindSafe(next.run(req)).catch_unwind().await;
    let res = match res {
        Ok(res) => res,
        Err(panic) => {
            let msg = panic
                .downcast_ref::<&str>()
                .map(|s| s.to_string())
                .or_else(|| panic.downcast_ref::<String>().cloned())
                .unwrap_or_else(|| "unknown panic".to_string());
            tracing::error!("handler panicked: {}", msg);
            return error::present(&AppError::new(ErrorKind::ServerError), api, production);
        }
    };

    // AppError responses carry themselves as an extension; re-present them
    // for the route class, keeping headers set by inner stages (rate-limit
    // budget, CORS) intact.
    if let Some(err) = res.extensions().get::<AppError>().cloned() {
        let mut presented = error::present(&err, api, production);
        // append, not insert: multi-value headers (Set-Cookie) must survive
        for (name, value) in res.headers() {
            if name != CONTENT_TYPE && name != CONTENT_LENGTH {
                presented.headers_mut().append(name.clone(), value.clone());
            }
        }
        return presented;
    }

    res
}
