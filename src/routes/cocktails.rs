//! Cocktail CRUD, voting and comments. All mutation is gated on the resolved
//! session user; edits and deletes additionally require ownership.
//!
//! JSON bodies arrive here already HTML-escaped by the sanitize stage, so
//! handlers only trim, validate and store - escaping happens exactly once.

use axum::{
    extract::{Extension, Path, Query, State},
    http::StatusCode,
    response::IntoResponse,
    Json,
};
use serde::Deserialize;

use crate::auth::guard;
use crate::error::{AppError, AppResult, ErrorKind, OptionExt};
use crate::middleware::sanitize::split_ingredients;
use crate::state::AppState;
use crate::types::{
    AuthContext, CocktailDetailDto, CocktailDto, CocktailRow, CommentDto, CommentRequest,
    CreateCocktailRequest, UpdateCocktailRequest, VoteRequest,
};

const LIST_SQL: &str = "SELECT c.id, c.name, c.description, c.ingredients, c.instructions, \
     c.created_by, c.created_at, COALESCE(SUM(v.value), 0) AS score \
     FROM cocktails c LEFT JOIN votes v ON v.cocktail_id = c.id";

const COMMENTS_SQL: &str = "SELECT m.id, m.cocktail_id, m.user_id, u.username, m.content, \
     m.created_at FROM comments m JOIN users u ON u.id = m.user_id";

#[derive(Debug, Deserialize)]
pub struct ListQuery {
    pub limit: Option<i64>,
    pub offset: Option<i64>,
}

pub async fn list_cocktails(
    State(state): State<AppState>,
    Query(query): Query<ListQuery>,
) -> AppResult<Json<Vec<CocktailDto>>> {
    let limit = query.limit.unwrap_or(50).clamp(1, 200);
    let offset = query.offset.unwrap_or(0).max(0);

    let rows: Vec<CocktailRow> = sqlx::query_as(&format!(
        "{} GROUP BY c.id ORDER BY score DESC, c.created_at DESC LIMIT ?1 OFFSET ?2",
        LIST_SQL
    ))
    .bind(limit)
    .bind(offset)
    .fetch_all(&state.db)
    .await?;

    Ok(Json(rows.into_iter().map(CocktailDto::from).collect()))
}

async fn fetch_cocktail(state: &AppState, id: i64) -> AppResult<CocktailDto> {
    let row: Option<CocktailRow> =
        sqlx::query_as(&format!("{} WHERE c.id = ?1 GROUP BY c.id", LIST_SQL))
            .bind(id)
            .fetch_optional(&state.db)
            .await?;
    Ok(row.ok_or_not_found("Cocktail")?.into())
}

pub async fn get_cocktail(
    State(state): State<AppState>,
    Path(id): Path<i64>,
) -> AppResult<Json<CocktailDetailDto>> {
    let cocktail = fetch_cocktail(&state, id).await?;
    let comments: Vec<CommentDto> = sqlx::query_as(&format!(
        "{} WHERE m.cocktail_id = ?1 ORDER BY m.created_at, m.id",
        COMMENTS_SQL
    ))
    .bind(id)
    .fetch_all(&state.db)
    .await?;

    Ok(Json(CocktailDetailDto { cocktail, comments }))
}

pub async fn create_cocktail(
    State(state): State<AppState>,
    Extension(ctx): Extension<AuthContext>,
    Json(req): Json<CreateCocktailRequest>,
) -> AppResult<impl IntoResponse> {
    let user = guard::api_user(&ctx)?;

    let name = req.name.trim();
    if name.is_empty() {
        return Err(AppError::validation("Name is required"));
    }
    let ingredients = split_ingredients(&req.ingredients);
    if ingredients.is_empty() {
        return Err(AppError::validation("At least one ingredient is required"));
    }
    let ingredients_json = serde_json::to_string(&ingredients)
        .map_err(|e| AppError::with_message(ErrorKind::ServerError, e.to_string()))?;

    let result = sqlx::query(
        "INSERT INTO cocktails (name, description, ingredients, instructions, created_by) \
         VALUES (?1, ?2, ?3, ?4, ?5)",
    )
    .bind(name)
    .bind(&req.description)
    .bind(&ingredients_json)
    .bind(&req.instructions)
    .bind(user.id)
    .execute(&state.db)
    .await?;

    let id = result.last_insert_rowid();
    tracing::info!("user {} created cocktail {} ({})", user.id, id, name);

    Ok((StatusCode::CREATED, Json(fetch_cocktail(&state, id).await?)))
}

async fn fetch_owner(state: &AppState, id: i64) -> AppResult<i64> {
    let row: Option<(i64,)> = sqlx::query_as("SELECT created_by FROM cocktails WHERE id = ?1")
        .bind(id)
        .fetch_optional(&state.db)
        .await?;
    row.map(|(owner,)| owner).ok_or_not_found("Cocktail")
}

pub async fn update_cocktail(
    State(state): State<AppState>,
    Extension(ctx): Extension<AuthContext>,
    Path(id): Path<i64>,
    Json(req): Json<UpdateCocktailRequest>,
) -> AppResult<Json<CocktailDto>> {
    let user = guard::api_user(&ctx)?;
    let owner = fetch_owner(&state, id).await?;
    if !guard::is_owner(Some(user.id), owner) {
        return Err(AppError::with_message(
            ErrorKind::Forbidden,
            "Only the creator can modify this cocktail",
        ));
    }

    if let Some(name) = &req.name {
        let name = name.trim();
        if name.is_empty() {
            return Err(AppError::validation("Name must not be empty"));
        }
        sqlx::query("UPDATE cocktails SET name = ?1 WHERE id = ?2")
            .bind(name)
            .bind(id)
            .execute(&state.db)
            .await?;
    }
    if let Some(description) = &req.description {
        sqlx::query("UPDATE cocktails SET description = ?1 WHERE id = ?2")
            .bind(description)
            .bind(id)
            .execute(&state.db)
            .await?;
    }
    if let Some(ingredients) = &req.ingredients {
        let ingredients = split_ingredients(ingredients);
        if ingredients.is_empty() {
            return Err(AppError::validation("At least one ingredient is required"));
        }
        let ingredients_json = serde_json::to_string(&ingredients)
            .map_err(|e| AppError::with_message(ErrorKind::ServerError, e.to_string()))?;
        sqlx::query("UPDATE cocktails SET ingredients = ?1 WHERE id = ?2")
            .bind(&ingredients_json)
            .bind(id)
            .execute(&state.db)
            .await?;
    }
    if let Some(instructions) = &req.instructions {
        sqlx::query("UPDATE cocktails SET instructions = ?1 WHERE id = ?2")
            .bind(instructions)
            .bind(id)
            .execute(&state.db)
            .await?;
    }

    Ok(Json(fetch_cocktail(&state, id).await?))
}

pub async fn delete_cocktail(
    State(state): State<AppState>,
    Extension(ctx): Extension<AuthContext>,
    Path(id): Path<i64>,
) -> AppResult<StatusCode> {
    let user = guard::api_user(&ctx)?;
    let owner = fetch_owner(&state, id).await?;
    if !guard::is_owner(Some(user.id), owner) {
        return Err(AppError::with_message(
            ErrorKind::Forbidden,
            "Only the creator can delete this cocktail",
        ));
    }

    // Votes and comments go with the cocktail via ON DELETE CASCADE
    sqlx::query("DELETE FROM cocktails WHERE id = ?1")
        .bind(id)
        .execute(&state.db)
        .await?;
    tracing::info!("user {} deleted cocktail {}", user.id, id);
    Ok(StatusCode::NO_CONTENT)
}

pub async fn vote_cocktail(
    State(state): State<AppState>,
    Extension(ctx): Extension<AuthContext>,
    Path(id): Path<i64>,
    Json(req): Json<VoteRequest>,
) -> AppResult<Json<serde_json::Value>> {
    let user = guard::api_user(&ctx)?;
    if req.value != 1 && req.value != -1 {
        return Err(AppError::validation("Vote value must be +1 or -1"));
    }
    // Ensure the target exists before touching the votes table
    fetch_owner(&state, id).await?;

    // One vote per user per cocktail; repeat votes overwrite
    sqlx::query(
        "INSERT INTO votes (cocktail_id, user_id, value) VALUES (?1, ?2, ?3) \
         ON CONFLICT(cocktail_id, user_id) DO UPDATE SET value = excluded.value",
    )
    .bind(id)
    .bind(user.id)
    .bind(req.value)
    .execute(&state.db)
    .await?;

    let (score,): (i64,) =
        sqlx::query_as("SELECT COALESCE(SUM(value), 0) FROM votes WHERE cocktail_id = ?1")
            .bind(id)
            .fetch_one(&state.db)
            .await?;
    Ok(Json(serde_json::json!({ "cocktail_id": id, "score": score })))
}

pub async fn add_comment(
    State(state): State<AppState>,
    Extension(ctx): Extension<AuthContext>,
    Path(id): Path<i64>,
    Json(req): Json<CommentRequest>,
) -> AppResult<impl IntoResponse> {
    let user = guard::api_user(&ctx)?;
    let content = req.content.trim();
    if content.is_empty() {
        return Err(AppError::validation("Comment must not be empty"));
    }
    // Ensure the target exists before inserting
    fetch_owner(&state, id).await?;

    let result = sqlx::query(
        "INSERT INTO comments (cocktail_id, user_id, content) VALUES (?1, ?2, ?3)",
    )
    .bind(id)
    .bind(user.id)
    .bind(content)
    .execute(&state.db)
    .await?;

    let comment: CommentDto =
        sqlx::query_as(&format!("{} WHERE m.id = ?1", COMMENTS_SQL))
            .bind(result.last_insert_rowid())
            .fetch_one(&state.db)
            .await?;
    Ok((StatusCode::CREATED, Json(comment)))
}
