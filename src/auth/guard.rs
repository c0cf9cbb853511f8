//! Route-level authorization checks built atop the resolved identity.

use axum::{
    http::{header::LOCATION, StatusCode},
    response::{IntoResponse, Response},
};

use crate::error::{AppError, AppResult, ErrorKind};
use crate::types::{AuthContext, PublicUser};

/// 302 redirect, matching browser form-navigation semantics.
pub fn redirect_to(location: &str) -> Response {
    (StatusCode::FOUND, [(LOCATION, location.to_string())]).into_response()
}

fn encode_return_path(path_and_query: &str) -> String {
    url::form_urlencoded::byte_serialize(path_and_query.as_bytes()).collect()
}

/// Resolve a `redirect` parameter to a safe, same-site target. Absolute and
/// protocol-relative URLs fall back to home.
pub fn safe_redirect_target(param: Option<&str>) -> &str {
    match param {
        Some(t) if t.starts_with('/') && !t.starts_with("//") => t,
        _ => "/",
    }
}

/// Require a resolved identity; anonymous requests are redirected to the
/// login page carrying the original path as a `redirect` parameter.
pub fn require_authenticated(ctx: &AuthContext, path_and_query: &str) -> Result<PublicUser, Response> {
    match &ctx.user {
        Some(user) => Ok(user.clone()),
        None => Err(redirect_to(&format!("/login?redirect={}", encode_return_path(path_and_query)))),
    }
}

/// Require an anonymous request (login/register pages); authenticated users
/// are sent to the `redirect` parameter or home.
pub fn require_anonymous(ctx: &AuthContext, redirect_param: Option<&str>) -> Result<(), Response> {
    if ctx.user.is_some() {
        return Err(redirect_to(safe_redirect_target(redirect_param)));
    }
    Ok(())
}

/// Identity requirement for API routes: JSON 401 instead of a redirect. A
/// stale session (cookie presented but no longer valid) is distinguished
/// from never having authenticated.
pub fn api_user(ctx: &AuthContext) -> AppResult<PublicUser> {
    match &ctx.user {
        Some(user) => Ok(user.clone()),
        None if ctx.stale_session => Err(AppError::new(ErrorKind::SessionExpired)),
        None => Err(AppError::new(ErrorKind::Unauthorized)),
    }
}

/// True iff both ids are present and equal. Gates mutation and deletion of a
/// resource to its creator.
pub fn is_owner(user_id: Option<i64>, resource_owner_id: i64) -> bool {
    user_id == Some(resource_owner_id)
}
