//! Bearer-token authentication: JWT issuing and verification, the [`AuthUser`]
//! extractor, and argon2 password helpers.

use argon2::{
  Argon2, PasswordHash, PasswordHasher, PasswordVerifier, password_hash::SaltString,
};
use axum::{
  extract::FromRequestParts,
  http::{HeaderMap, header, request::Parts},
};
use chrono::{Duration, Utc};
use jsonwebtoken::{
  Algorithm, DecodingKey, EncodingKey, Header, Validation, decode, encode,
  errors::ErrorKind,
};
use rand_core::OsRng;
use serde::{Deserialize, Serialize};
use tracer_core::{
  Error as CoreError,
  account::Account,
  actor::{Actor, Role},
  store::RecordStore,
};
use uuid::Uuid;

use crate::{ApiState, error::ApiError};

// ─── Claims ──────────────────────────────────────────────────────────────────

/// JWT claims carried by every access token.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct Claims {
  /// Account id.
  pub sub:       Uuid,
  pub username:  String,
  /// Kept as a raw string so an unknown value is rejected at the policy
  /// boundary rather than at decode time.
  pub role:      String,
  #[serde(default)]
  pub person_id: Option<Uuid>,
  pub iat:       i64,
  pub exp:       i64,
}

impl Claims {
  /// The actor these claims speak for. Roles outside the closed set are
  /// refused.
  pub fn actor(&self) -> Result<Actor, ApiError> {
    Ok(Actor {
      account_id: self.sub,
      role:       Role::parse_claim(&self.role)?,
      person_id:  self.person_id,
    })
  }
}

// ─── Token manager ───────────────────────────────────────────────────────────

/// Issues and validates HS256 access tokens.
#[derive(Clone)]
pub struct JwtManager {
  ttl:          Duration,
  encoding_key: EncodingKey,
  decoding_key: DecodingKey,
}

impl JwtManager {
  pub fn new(secret: &str, ttl: Duration) -> Self {
    Self {
      ttl,
      encoding_key: EncodingKey::from_secret(secret.as_bytes()),
      decoding_key: DecodingKey::from_secret(secret.as_bytes()),
    }
  }

  pub fn issue(&self, account: &Account) -> Result<String, ApiError> {
    let now = Utc::now();
    let claims = Claims {
      sub:       account.account_id,
      username:  account.username.clone(),
      role:      account.role.to_string(),
      person_id: account.person_id,
      iat:       now.timestamp(),
      exp:       (now + self.ttl).timestamp(),
    };
    encode(&Header::new(Algorithm::HS256), &claims, &self.encoding_key).map_err(|e| {
      tracing::error!(error = %e, "token signing failed");
      ApiError::Unauthorized
    })
  }

  pub fn validate(&self, token: &str) -> Result<Claims, ApiError> {
    let validation = Validation::new(Algorithm::HS256);
    decode::<Claims>(token, &self.decoding_key, &validation)
      .map(|data| data.claims)
      .map_err(|e| {
        match e.kind() {
          ErrorKind::ExpiredSignature => tracing::debug!("expired token"),
          kind => tracing::debug!(?kind, "rejected token"),
        }
        ApiError::Unauthorized
      })
  }
}

// ─── Extractor ───────────────────────────────────────────────────────────────

/// Present in a handler's arguments means the request carried a valid
/// bearer token.
pub struct AuthUser(pub Actor);

/// Pull the token out of an `Authorization: Bearer …` header.
pub fn bearer_token(headers: &HeaderMap) -> Result<&str, ApiError> {
  headers
    .get(header::AUTHORIZATION)
    .and_then(|v| v.to_str().ok())
    .and_then(|v| v.strip_prefix("Bearer "))
    .map(str::trim)
    .filter(|t| !t.is_empty())
    .ok_or(ApiError::Unauthorized)
}

impl<S> FromRequestParts<ApiState<S>> for AuthUser
where
  S: RecordStore + 'static,
{
  type Rejection = ApiError;

  async fn from_request_parts(
    parts: &mut Parts,
    state: &ApiState<S>,
  ) -> Result<Self, Self::Rejection> {
    let claims = state.jwt.validate(bearer_token(&parts.headers)?)?;
    let mut actor = claims.actor()?;

    // The person link can change after login; ownership follows the
    // current link, not the one frozen into the token.
    actor.person_id = match state.registry.get_account(actor.account_id).await {
      Ok(account) => account.person_id,
      Err(CoreError::NotFound(_)) => return Err(ApiError::Unauthorized),
      Err(e) => return Err(e.into()),
    };
    Ok(AuthUser(actor))
  }
}

// ─── Passwords ───────────────────────────────────────────────────────────────

/// Hash `password` into an argon2 PHC string with a fresh random salt.
pub fn hash_password(password: &str) -> Result<String, argon2::password_hash::Error> {
  let salt = SaltString::generate(&mut OsRng);
  Ok(Argon2::default().hash_password(password.as_bytes(), &salt)?.to_string())
}

/// Check `password` against a stored PHC string. Malformed hashes never
/// verify.
pub fn verify_password(password: &str, phc: &str) -> bool {
  PasswordHash::new(phc)
    .map(|parsed| {
      Argon2::default()
        .verify_password(password.as_bytes(), &parsed)
        .is_ok()
    })
    .unwrap_or(false)
}
