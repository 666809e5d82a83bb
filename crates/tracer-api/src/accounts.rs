//! Handlers for session and account endpoints.
//!
//! | Method | Path | Notes |
//! |--------|------|-------|
//! | `POST` | `/login` | Body: `{"login":"…","password":"…"}`; username or email |
//! | `GET`  | `/profile` | The caller's own account |
//! | `POST` | `/accounts` | Admin only |

use axum::{
  Json,
  extract::State,
  http::StatusCode,
  response::IntoResponse,
};
use serde::{Deserialize, Serialize};
use tracer_core::{
  account::{Account, NewAccount},
  actor::Role,
  store::RecordStore,
};

use crate::{
  ApiState,
  auth::{AuthUser, hash_password, verify_password},
  error::ApiError,
};

// ─── Login ───────────────────────────────────────────────────────────────────

#[derive(Debug, Deserialize)]
pub struct LoginBody {
  #[serde(alias = "username", alias = "email")]
  pub login:    String,
  pub password: String,
}

#[derive(Debug, Serialize)]
pub struct LoginResponse {
  pub token:   String,
  pub account: Account,
}

/// `POST /login`
///
/// Unknown logins, inactive accounts, and wrong passwords all answer 401.
pub async fn login<S: RecordStore + 'static>(
  State(state): State<ApiState<S>>,
  Json(body): Json<LoginBody>,
) -> Result<Json<LoginResponse>, ApiError> {
  let account = state
    .registry
    .account_for_login(&body.login)
    .await?
    .filter(|a| verify_password(&body.password, &a.password_hash))
    .ok_or_else(|| {
      tracing::info!(login = %body.login.trim(), "login rejected");
      ApiError::Unauthorized
    })?;

  let token = state.jwt.issue(&account)?;
  tracing::info!(account = %account.account_id, "login succeeded");
  Ok(Json(LoginResponse { token, account }))
}

// ─── Profile ─────────────────────────────────────────────────────────────────

/// `GET /profile`
pub async fn profile<S: RecordStore + 'static>(
  State(state): State<ApiState<S>>,
  AuthUser(actor): AuthUser,
) -> Result<Json<Account>, ApiError> {
  Ok(Json(state.registry.get_account(actor.account_id).await?))
}

// ─── Create ──────────────────────────────────────────────────────────────────

#[derive(Debug, Deserialize)]
pub struct CreateBody {
  pub username: String,
  pub email:    String,
  pub password: String,
  #[serde(default = "default_role")]
  pub role:     Role,
}

fn default_role() -> Role { Role::Alumni }

/// `POST /accounts`
pub async fn create<S: RecordStore + 'static>(
  State(state): State<ApiState<S>>,
  AuthUser(actor): AuthUser,
  Json(body): Json<CreateBody>,
) -> Result<impl IntoResponse, ApiError> {
  if body.password.is_empty() {
    return Err(ApiError::BadRequest("password is required".into()));
  }
  let password_hash = hash_password(&body.password)
    .map_err(|e| ApiError::BadRequest(format!("cannot hash password: {e}")))?;

  let account = state
    .registry
    .create_account(&actor, NewAccount {
      username: body.username,
      email: body.email,
      password_hash,
      role: body.role,
    })
    .await?;
  Ok((StatusCode::CREATED, Json(account)))
}
