//! Origin/method/header negotiation for cross-origin requests.
//!
//! CORS is a browser-enforced contract, not an access-control mechanism:
//! requests from unlisted origins are served without CORS headers, never
//! blocked server-side. Authorization lives elsewhere.

use axum::{
    body::Body,
    extract::{Request, State},
    http::{
        header::{HeaderMap, HeaderValue, ORIGIN, VARY},
        Method, StatusCode,
    },
    middleware::Next,
    response::Response,
};

use crate::config::CorsConfig;
use crate::state::AppState;

/// True iff the origin is present and matches the allow-all flag, an exact
/// listed origin or a `*`-wildcard pattern.
pub fn is_origin_allowed(origin: Option<&str>, cfg: &CorsConfig) -> bool {
    let Some(origin) = origin else {
        return false;
    };
    if cfg.allow_any_origin {
        return true;
    }
    if cfg.origins.iter().any(|allowed| allowed == origin) {
        return true;
    }
    cfg.origin_patterns.iter().any(|pattern| wildcard_match(pattern, origin))
}

// Single-`*` wildcard, e.g. "https://*.cocktail-tracker.com".
fn wildcard_match(pattern: &str, origin: &str) -> bool {
    match pattern.split_once('*') {
        Some((prefix, suffix)) => {
            origin.len() >= prefix.len() + suffix.len()
                && origin.starts_with(prefix)
                && origin.ends_with(suffix)
        }
        None => pattern == origin,
    }
}

fn insert_list(headers: &mut HeaderMap, name: &'static str, values: &[String]) {
    if values.is_empty() {
        return;
    }
    if let Ok(value) = HeaderValue::from_str(&values.join(", ")) {
        headers.insert(name, value);
    }
}

// Headers shared by preflight and normal responses to an allowed origin.
fn apply_origin_headers(headers: &mut HeaderMap, origin: &str, cfg: &CorsConfig) {
    if let Ok(value) = HeaderValue::from_str(origin) {
        headers.insert("access-control-allow-origin", value);
    }
    if cfg.credentials {
        headers.insert("access-control-allow-credentials", HeaderValue::from_static("true"));
    }
    insert_list(headers, "access-control-expose-headers", &cfg.exposed_headers);
    headers.insert(VARY, HeaderValue::from_static("Origin"));
}

/// Pipeline stage: answer allowed-origin preflights immediately with no body,
/// and augment all other allowed-origin responses post-hoc.
pub async fn cors_middleware(State(state): State<AppState>, req: Request, next: Next) -> Response {
    let cfg = &state.config.cors;
    let origin =
        req.headers().get(ORIGIN).and_then(|v| v.to_str().ok()).map(str::to_string);
    let allowed = is_origin_allowed(origin.as_deref(), cfg);

    if req.method() == Method::OPTIONS && allowed {
        let origin = origin.unwrap_or_default();
        let status = StatusCode::from_u16(cfg.preflight_status)
            .unwrap_or(StatusCode::NO_CONTENT);
        let mut res = Response::new(Body::empty());
        *res.status_mut() = status;

        let headers = res.headers_mut();
        apply_origin_headers(headers, &origin, cfg);
        insert_list(headers, "access-control-allow-methods", &cfg.methods);
        if !cfg.allowed_headers.is_empty() {
            insert_list(headers, "access-control-allow-headers", &cfg.allowed_headers);
        } else if let Some(requested) = req.headers().get("access-control-request-headers") {
            // Echo whatever the browser asked for
            headers.insert("access-control-allow-headers", requested.clone());
        }
        if let Ok(value) = HeaderValue::from_str(&cfg.max_age_secs.to_string()) {
            headers.insert("access-control-max-age", value);
        }
        return res;
    }

    let mut res = next.run(req).await;
    if allowed {
        if let Some(origin) = origin {
            apply_origin_headers(res.headers_mut(), &origin, cfg);
        }
    }
    res
}

#[cfg(test)]
mod tests {
    use super::*;

    fn cfg(allow_any: bool, origins: &[&str], patterns: &[&str]) -> CorsConfig {
        CorsConfig {
            allow_any_origin: allow_any,
            origins: origins.iter().map(|s| s.to_string()).collect(),
            origin_patterns: patterns.iter().map(|s| s.to_string()).collect(),
            methods: vec!["GET".into(), "POST".into(), "OPTIONS".into()],
            allowed_headers: vec!["Content-Type".into()],
            exposed_headers: vec![],
            credentials: true,
            max_age_secs: 86400,
            preflight_status: 204,
        }
    }

    #[test]
    fn test_exact_origin_list() {
        let cfg = cfg(false, &["https://a.com"], &[]);
        assert!(is_origin_allowed(Some("https://a.com"), &cfg));
        assert!(!is_origin_allowed(Some("https://b.com"), &cfg));
    }

    #[test]
    fn test_absent_origin_is_never_allowed() {
        assert!(!is_origin_allowed(None, &cfg(true, &[], &[])));
        assert!(!is_origin_allowed(None, &cfg(false, &["https://a.com"], &[])));
    }

    #[test]
    fn test_allow_any_origin() {
        let cfg = cfg(true, &[], &[]);
        assert!(is_origin_allowed(Some("https://anything.example"), &cfg));
    }

    #[test]
    fn test_deny_all_when_nothing_configured() {
        let cfg = cfg(false, &[], &[]);
        assert!(!is_origin_allowed(Some("https://a.com"), &cfg));
    }

    #[test]
    fn test_wildcard_patterns() {
        let cfg = cfg(false, &[], &["https://*.cocktail-tracker.com"]);
        assert!(is_origin_allowed(Some("https://app.cocktail-tracker.com"), &cfg));
        assert!(is_origin_allowed(Some("https://staging.cocktail-tracker.com"), &cfg));
        assert!(!is_origin_allowed(Some("https://cocktail-tracker.org"), &cfg));
        assert!(!is_origin_allowed(Some("http://app.cocktail-tracker.com"), &cfg));
    }

    #[test]
    fn test_wildcard_must_cover_both_ends() {
        assert!(wildcard_match("https://*.a.com", "https://x.a.com"));
        assert!(!wildcard_match("https://*.a.com", "https://a.com"));
        assert!(wildcard_match("plain.example", "plain.example"));
        assert!(!wildcard_match("plain.example", "other.example"));
    }
}
