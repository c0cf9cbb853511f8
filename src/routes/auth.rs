//! Registration, login, logout and the session-guarded profile page.

use axum::{
    extract::{Extension, Query, State},
    http::{header::SET_COOKIE, HeaderMap, Uri},
    response::{IntoResponse, Response},
    Form, Json,
};
use rand::Rng;
use std::time::Duration;

use crate::auth::{guard, password};
use crate::error::{AppError, AppResult, ErrorKind};
use crate::middleware::auth::{clear_session_cookie, cookie_value, session_cookie};
use crate::middleware::sanitize::{sanitize_email, sanitize_string};
use crate::state::AppState;
use crate::types::{AuthContext, LoginForm, PublicUser, RedirectQuery, RegisterForm, User};

/// Randomized pause after a failed login so the response time does not
/// distinguish "user not found" from "wrong password".
async fn failed_login_delay() {
    let ms = rand::thread_rng().gen_range(50..=200);
    tokio::time::sleep(Duration::from_millis(ms)).await;
}

pub async fn register(
    State(state): State<AppState>,
    Extension(ctx): Extension<AuthContext>,
    Query(query): Query<RedirectQuery>,
    Form(form): Form<RegisterForm>,
) -> AppResult<Response> {
    if let Err(redirect) = guard::require_anonymous(&ctx, query.redirect.as_deref()) {
        return Ok(redirect);
    }

    // Form fields are sanitized here, at extraction
    let username = sanitize_string(form.username.trim());
    if username.is_empty() || form.password.is_empty() || form.password_confirm.is_empty() {
        return Err(AppError::validation("All fields are required"));
    }
    let email = sanitize_email(&form.email);
    if email.is_empty() {
        return Err(AppError::validation("Invalid email address"));
    }
    if form.password != form.password_confirm {
        return Err(AppError::validation("Passwords do not match"));
    }
    password::check_strength(&form.password).map_err(AppError::validation)?;

    let existing: Option<(i64,)> =
        sqlx::query_as("SELECT id FROM users WHERE email = ?1 OR username = ?2 LIMIT 1")
            .bind(&email)
            .bind(&username)
            .fetch_optional(&state.db)
            .await?;
    if existing.is_some() {
        return Err(AppError::with_message(
            ErrorKind::Conflict,
            "A user with this email or username already exists",
        ));
    }

    let password_hash = password::hash_password(&form.password);
    sqlx::query("INSERT INTO users (username, email, password_hash) VALUES (?1, ?2, ?3)")
        .bind(&username)
        .bind(&email)
        .bind(&password_hash)
        .execute(&state.db)
        .await?;

    state.metrics.inc_registrations();
    tracing::info!("registered new user {}", username);

    // No automatic login; send the user to the login page
    Ok(guard::redirect_to("/login?registered=true"))
}

pub async fn login(
    State(state): State<AppState>,
    Extension(ctx): Extension<AuthContext>,
    Query(query): Query<RedirectQuery>,
    Form(form): Form<LoginForm>,
) -> AppResult<Response> {
    if let Err(redirect) = guard::require_anonymous(&ctx, query.redirect.as_deref()) {
        return Ok(redirect);
    }

    let email = sanitize_email(&form.email);
    if email.is_empty() || form.password.is_empty() {
        return Err(AppError::validation("Email and password are required"));
    }

    let user: Option<User> = sqlx::query_as(
        "SELECT id, username, email, password_hash, created_at FROM users WHERE email = ?1",
    )
    .bind(&email)
    .fetch_optional(&state.db)
    .await?;

    // One generic failure path for unknown email and wrong password
    let user = match user {
        Some(user) if password::verify_password(&form.password, &user.password_hash) => user,
        _ => {
            state.metrics.inc_logins_failed();
            failed_login_delay().await;
            return Err(AppError::new(ErrorKind::InvalidCredentials));
        }
    };

    let token = state.sessions.create_session(user.id).await?;
    state.metrics.inc_logins_succeeded();
    tracing::info!("user {} logged in", user.username);

    let target = guard::safe_redirect_target(query.redirect.as_deref());
    let mut res = guard::redirect_to(target);
    if let Ok(cookie) = session_cookie(&token, &state.config).parse() {
        res.headers_mut().insert(SET_COOKIE, cookie);
    }
    Ok(res)
}

pub async fn logout(State(state): State<AppState>, headers: HeaderMap) -> AppResult<Response> {
    if let Some(token) = cookie_value(&headers, &state.config.session.cookie_name) {
        state.sessions.revoke_session(&token).await?;
        state.metrics.inc_sessions_revoked();
    }

    let mut res = guard::redirect_to("/");
    if let Ok(cookie) = clear_session_cookie(&state.config).parse() {
        res.headers_mut().insert(SET_COOKIE, cookie);
    }
    Ok(res)
}

/// Redirect-guarded: anonymous visitors are sent to the login page with a
/// return path.
pub async fn profile(Extension(ctx): Extension<AuthContext>, uri: Uri) -> Response {
    let path_and_query =
        uri.path_and_query().map(|pq| pq.as_str()).unwrap_or_else(|| uri.path());
    match guard::require_authenticated(&ctx, path_and_query) {
        Ok(user) => Json::<PublicUser>(user).into_response(),
        Err(redirect) => redirect,
    }
}
