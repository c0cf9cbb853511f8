pub mod auth;
pub mod cocktails;
pub mod health;

use axum::{
    extract::DefaultBodyLimit,
    routing::{get, post},
    Router,
};

use crate::pipeline;
use crate::state::AppState;

/// Build the full application router with the protection pipeline attached.
/// Used by `main` and by the end-to-end tests.
pub fn app(state: AppState) -> Router {
    let router = Router::new()
        .route("/healthz", get(health::healthz))
        .route("/readyz", get(health::readyz))
        .route("/metrics", get(health::metrics))
        .route("/version", get(health::version))
        .route("/register", post(auth::register))
        .route("/login", post(auth::login))
        .route("/logout", post(auth::logout))
        .route("/profile", get(auth::profile))
        .route(
            "/api/cocktails",
            get(cocktails::list_cocktails).post(cocktails::create_cocktail),
        )
        .route(
            "/api/cocktails/{id}",
            get(cocktails::get_cocktail)
                .put(cocktails::update_cocktail)
                .delete(cocktails::delete_cocktail),
        )
        .route("/api/cocktails/{id}/vote", post(cocktails::vote_cocktail))
        .route("/api/cocktails/{id}/comments", post(cocktails::add_comment))
        .layer(DefaultBodyLimit::max(10 * 1024 * 1024))
        .with_state(state.clone());

    pipeline::apply(router, &state)
}
