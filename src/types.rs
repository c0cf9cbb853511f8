use serde::{Deserialize, Serialize};
use sqlx::FromRow;

/// Full user row, including the credential. Never serialized to clients.
#[derive(Debug, Clone, FromRow)]
pub struct User {
    pub id: i64,
    pub username: String,
    pub email: String,
    pub password_hash: String,
    pub created_at: String,
}

/// Client-facing view of a user, without the credential.
#[derive(Debug, Clone, Serialize, Deserialize, FromRow)]
pub struct PublicUser {
    pub id: i64,
    pub username: String,
    pub email: String,
    pub created_at: String,
}

impl From<User> for PublicUser {
    fn from(u: User) -> Self {
        Self { id: u.id, username: u.username, email: u.email, created_at: u.created_at }
    }
}

/// Per-request identity resolved from the session cookie. Attached to the
/// request as an extension by the auth-resolution stage; never persisted.
#[derive(Debug, Clone, Default)]
pub struct AuthContext {
    pub user: Option<PublicUser>,
    /// A session cookie was presented but failed validation (expired,
    /// revoked or unknown). Lets API guards answer SESSION_EXPIRED instead
    /// of a generic 401.
    pub stale_session: bool,
}

#[derive(Debug, Clone, Deserialize)]
pub struct RegisterForm {
    pub username: String,
    pub email: String,
    pub password: String,
    pub password_confirm: String,
}

#[derive(Debug, Clone, Deserialize)]
pub struct LoginForm {
    pub email: String,
    pub password: String,
}

#[derive(Debug, Clone, Deserialize)]
pub struct RedirectQuery {
    pub redirect: Option<String>,
}

#[derive(Debug, Clone, Deserialize)]
pub struct CreateCocktailRequest {
    pub name: String,
    pub description: Option<String>,
    /// Comma-separated list, e.g. "gin, tonic, lime".
    pub ingredients: String,
    pub instructions: Option<String>,
}

#[derive(Debug, Clone, Deserialize)]
pub struct UpdateCocktailRequest {
    pub name: Option<String>,
    pub description: Option<String>,
    pub ingredients: Option<String>,
    pub instructions: Option<String>,
}

#[derive(Debug, Clone, Deserialize)]
pub struct VoteRequest {
    /// +1 or -1.
    pub value: i64,
}

#[derive(Debug, Clone, Deserialize)]
pub struct CommentRequest {
    pub content: String,
}

#[derive(Debug, Clone, Serialize, FromRow)]
pub struct CommentDto {
    pub id: i64,
    pub cocktail_id: i64,
    pub user_id: i64,
    pub username: String,
    pub content: String,
    pub created_at: String,
}

#[derive(Debug, Clone, Serialize)]
pub struct CocktailDto {
    pub id: i64,
    pub name: String,
    pub description: Option<String>,
    pub ingredients: Vec<String>,
    pub instructions: Option<String>,
    pub created_by: i64,
    pub created_at: String,
    pub score: i64,
}

/// Detail view: the cocktail plus its comment thread.
#[derive(Debug, Clone, Serialize)]
pub struct CocktailDetailDto {
    #[serde(flatten)]
    pub cocktail: CocktailDto,
    pub comments: Vec<CommentDto>,
}

#[derive(Debug, Clone, FromRow)]
pub struct CocktailRow {
    pub id: i64,
    pub name: String,
    pub description: Option<String>,
    pub ingredients: String,
    pub instructions: Option<String>,
    pub created_by: i64,
    pub created_at: String,
    pub score: i64,
}

impl From<CocktailRow> for CocktailDto {
    fn from(row: CocktailRow) -> Self {
        let ingredients: Vec<String> =
            serde_json::from_str(&row.ingredients).unwrap_or_default();
        Self {
            id: row.id,
            name: row.name,
            description: row.description,
            ingredients,
            instructions: row.instructions,
            created_by: row.created_by,
            created_at: row.created_at,
            score: row.score,
        }
    }
}
