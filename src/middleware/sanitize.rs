//! Input sanitization against injection.
//!
//! All sanitizers are pure functions returning new values; caller-supplied
//! structures are never mutated. The middleware cleans URL query values and
//! JSON request bodies before any later stage reads them; form-encoded bodies
//! are sanitized at the point of field extraction instead, so non-string
//! content passes through untouched.

use axum::{
    body::Body,
    extract::Request,
    http::{header::CONTENT_TYPE, Method, Uri},
    middleware::Next,
    response::{IntoResponse, Response},
};
use serde_json::Value;

use crate::error::AppError;

// Matches the router's DefaultBodyLimit.
const MAX_JSON_BODY: usize = 10 * 1024 * 1024;

/// HTML-escape `& < > " '`, ampersand first to avoid double-escaping.
pub fn sanitize_string(input: &str) -> String {
    input
        .replace('&', "&amp;")
        .replace('<', "&lt;")
        .replace('>', "&gt;")
        .replace('"', "&quot;")
        .replace('\'', "&#039;")
}

/// Recursive structural copy of a JSON value with every string escaped.
pub fn sanitize_value(value: &Value) -> Value {
    match value {
        Value::String(s) => Value::String(sanitize_string(s)),
        Value::Array(items) => Value::Array(items.iter().map(sanitize_value).collect()),
        Value::Object(map) => {
            Value::Object(map.iter().map(|(k, v)| (k.clone(), sanitize_value(v))).collect())
        }
        other => other.clone(),
    }
}

/// Clean and validate an email address; an invalid shape yields `""`, which
/// callers treat as rejection.
pub fn sanitize_email(input: &str) -> String {
    let sanitized = sanitize_string(input).trim().to_lowercase();
    if is_valid_email_shape(&sanitized) {
        sanitized
    } else {
        String::new()
    }
}

// Basic local@domain.tld shape, nothing more.
fn is_valid_email_shape(s: &str) -> bool {
    if s.is_empty() || s.chars().any(|c| c.is_whitespace()) {
        return false;
    }
    let mut parts = s.split('@');
    let (local, domain) = match (parts.next(), parts.next(), parts.next()) {
        (Some(local), Some(domain), None) => (local, domain),
        _ => return false,
    };
    if local.is_empty() {
        return false;
    }
    match domain.rsplit_once('.') {
        Some((host, tld)) => !host.is_empty() && !tld.is_empty(),
        None => false,
    }
}

/// Split a comma-separated ingredient list into trimmed, non-empty entries.
/// Handlers reading JSON bodies use this directly: the middleware has
/// already escaped the string, and escaping happens exactly once.
pub fn split_ingredients(csv: &str) -> Vec<String> {
    csv.split(',')
        .map(|item| item.trim().to_string())
        .filter(|item| !item.is_empty())
        .collect()
}

/// Escape a raw comma-separated ingredient list and split it. For input that
/// has not passed the body-sanitizing stage.
pub fn sanitize_ingredients(csv: &str) -> Vec<String> {
    split_ingredients(&sanitize_string(csv))
}

fn sanitize_query(uri: &Uri) -> Option<Uri> {
    let query = uri.query()?;
    let mut serializer = url::form_urlencoded::Serializer::new(String::new());
    for (key, value) in url::form_urlencoded::parse(query.as_bytes()) {
        serializer.append_pair(&key, &sanitize_string(&value));
    }
    let sanitized = serializer.finish();
    format!("{}?{}", uri.path(), sanitized).parse::<Uri>().ok()
}

/// Pipeline stage: rewrite the request with sanitized query values and, for
/// JSON bodies, a sanitized body. Bodies that are not valid JSON pass through
/// unchanged and fail later in the handler's own extractor.
pub async fn sanitize_middleware(req: Request, next: Next) -> Response {
    let (mut parts, body) = req.into_parts();

    if let Some(uri) = sanitize_query(&parts.uri) {
        parts.uri = uri;
    }

    let is_json = parts
        .headers
        .get(CONTENT_TYPE)
        .and_then(|ct| ct.to_str().ok())
        .map(|ct| ct.starts_with("application/json"))
        .unwrap_or(false);
    let has_body =
        matches!(parts.method, Method::POST | Method::PUT | Method::PATCH);

    let body = if is_json && has_body {
        let bytes = match axum::body::to_bytes(body, MAX_JSON_BODY).await {
            Ok(bytes) => bytes,
            Err(e) => {
                return AppError::bad_request(format!("failed to read request body: {}", e))
                    .into_response();
            }
        };
        match serde_json::from_slice::<Value>(&bytes) {
            Ok(value) => match serde_json::to_vec(&sanitize_value(&value)) {
                Ok(sanitized) => Body::from(sanitized),
                Err(_) => Body::from(bytes),
            },
            Err(_) => Body::from(bytes),
        }
    } else {
        body
    };

    next.run(Request::from_parts(parts, body)).await
}

#[cfg(test)]
mod tests {
    use super::*;
    use serde_json::json;

    #[test]
    fn test_sanitize_string_escapes_script() {
        let out = sanitize_string("<script>alert('x')</script>");
        assert!(!out.contains('<'));
        assert!(!out.contains('>'));
        assert!(!out.contains('\''));
        assert_eq!(out, "&lt;script&gt;alert(&#039;x&#039;)&lt;/script&gt;");
    }

    #[test]
    fn test_single_pass_escapes_ampersand_exactly_once() {
        assert_eq!(sanitize_string("fish & chips"), "fish &amp; chips");
        // Escaping happens once per boundary; an entity in the input is
        // treated as plain text, not preserved
        assert_eq!(sanitize_string("&amp;"), "&amp;amp;");
    }

    #[test]
    fn test_sanitize_value_is_pure_and_recursive() {
        let input = json!({
            "name": "<b>Spritz</b>",
            "tags": ["a<b", 7, {"note": "it's"}],
            "count": 3,
            "flag": true,
        });
        let before = input.clone();
        let out = sanitize_value(&input);
        assert_eq!(input, before);
        assert_eq!(out["name"], "&lt;b&gt;Spritz&lt;/b&gt;");
        assert_eq!(out["tags"][0], "a&lt;b");
        assert_eq!(out["tags"][1], 7);
        assert_eq!(out["tags"][2]["note"], "it&#039;s");
        assert_eq!(out["count"], 3);
        assert_eq!(out["flag"], true);
    }

    #[test]
    fn test_sanitize_email() {
        assert_eq!(sanitize_email(" Foo@Bar.COM "), "foo@bar.com");
        assert_eq!(sanitize_email("not-an-email"), "");
        assert_eq!(sanitize_email("a@b"), "");
        assert_eq!(sanitize_email("a@b."), "");
        assert_eq!(sanitize_email("@b.com"), "");
        assert_eq!(sanitize_email("two@at@signs.com"), "");
        assert_eq!(sanitize_email(""), "");
    }

    #[test]
    fn test_sanitize_ingredients() {
        assert_eq!(
            sanitize_ingredients("gin,  tonic , , lime"),
            vec!["gin".to_string(), "tonic".into(), "lime".into()]
        );
        assert_eq!(sanitize_ingredients(""), Vec::<String>::new());
        assert_eq!(sanitize_ingredients("<rum>"), vec!["&lt;rum&gt;".to_string()]);
    }

    #[test]
    fn test_split_ingredients_does_not_escape() {
        // Pre-escaped input stays as-is; splitting adds no second pass
        assert_eq!(
            split_ingredients("&lt;rum&gt;, lime"),
            vec!["&lt;rum&gt;".to_string(), "lime".into()]
        );
    }

    #[test]
    fn test_sanitize_query_rewrites_values() {
        let uri: Uri = "/search?q=%3Cscript%3E&page=2".parse().unwrap();
        let out = sanitize_query(&uri).unwrap();
        let query = out.query().unwrap();
        assert!(query.contains("q=%26lt%3Bscript%26gt%3B"));
        assert!(query.contains("page=2"));
    }
}
