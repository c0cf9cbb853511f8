//! Session-cookie resolution: the last protection stage before handlers.
//!
//! Reads the session cookie, validates it through the `SessionStore` and
//! attaches an `AuthContext` extension. Requests without a valid session
//! proceed anonymously; route guards decide what that means.

use axum::{
    extract::{Request, State},
    http::{
        header::{COOKIE, SET_COOKIE},
        HeaderMap,
    },
    middleware::Next,
    response::Response,
};

use crate::config::AppConfig;
use crate::state::AppState;
use crate::types::AuthContext;

/// Extract a cookie value from the `Cookie` header.
pub fn cookie_value(headers: &HeaderMap, name: &str) -> Option<String> {
    let raw = headers.get(COOKIE)?.to_str().ok()?;
    for pair in raw.split(';') {
        if let Some((key, value)) = pair.trim().split_once('=') {
            if key == name {
                return Some(value.to_string());
            }
        }
    }
    None
}

/// `Set-Cookie` value establishing a session.
pub fn session_cookie(token: &str, cfg: &AppConfig) -> String {
    let mut cookie = format!(
        "{}={}; Path=/; HttpOnly; SameSite=Strict; Max-Age={}",
        cfg.session.cookie_name,
        token,
        cfg.session.expiry_days * 86_400
    );
    if cfg.security.production {
        cookie.push_str("; Secure");
    }
    if let Some(domain) = &cfg.security.cookie_domain {
        cookie.push_str("; Domain=");
        cookie.push_str(domain);
    }
    cookie
}

/// `Set-Cookie` value expiring the session cookie immediately.
pub fn clear_session_cookie(cfg: &AppConfig) -> String {
    let mut cookie =
        format!("{}=; Path=/; HttpOnly; SameSite=Strict; Max-Age=0", cfg.session.cookie_name);
    if cfg.security.production {
        cookie.push_str("; Secure");
    }
    if let Some(domain) = &cfg.security.cookie_domain {
        cookie.push_str("; Domain=");
        cookie.push_str(domain);
    }
    cookie
}

/// Pipeline stage: populate the identity slot from the session cookie.
///
/// A presented token that fails validation marks the context stale and gets
/// its cookie expired on the response, so the client stops sending a dead
/// credential on every request.
pub async fn resolve_session_middleware(
    State(state): State<AppState>,
    mut req: Request,
    next: Next,
) -> Response {
    let cookie_name = &state.config.session.cookie_name;
    let ctx = match cookie_value(req.headers(), cookie_name) {
        Some(token) => {
            let user = state.sessions.validate_session(&token).await;
            AuthContext { stale_session: user.is_none(), user }
        }
        None => AuthContext::default(),
    };
    let stale = ctx.stale_session;
    req.extensions_mut().insert(ctx);

    let mut res = next.run(req).await;
    if stale && !sets_session_cookie(res.headers(), cookie_name) {
        if let Ok(cookie) = clear_session_cookie(&state.config).parse() {
            res.headers_mut().append(SET_COOKIE, cookie);
        }
    }
    res
}

// True if the handler already issued a session cookie (login sets a fresh
// one); clearing on top of it would override it.
fn sets_session_cookie(headers: &HeaderMap, cookie_name: &str) -> bool {
    headers
        .get_all(SET_COOKIE)
        .iter()
        .filter_map(|value| value.to_str().ok())
        .any(|value| value.starts_with(cookie_name) && value[cookie_name.len()..].starts_with('='))
}
