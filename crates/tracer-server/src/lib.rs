//! Wiring for the tracer HTTP server: configuration, store opening, admin
//! bootstrap, and the top-level router.

use std::{
  path::{Path, PathBuf},
  sync::Arc,
  time::Duration,
};

use anyhow::{Context as _, bail};
use axum::{Router, routing::get};
use serde::Deserialize;
use tower_http::trace::TraceLayer;
use tracer_api::{ApiState, JwtManager};
use tracer_core::{
  account::NewAccount,
  actor::Role,
  lifecycle::{DEFAULT_STORE_TIMEOUT, Registry},
};
use tracer_store_sqlite::SqliteStore;

// ─── Configuration ────────────────────────────────────────────────────────────

/// Runtime server configuration, deserialised from `config.toml` layered with
/// `TRACER_*` environment variables.
#[derive(Deserialize, Clone)]
pub struct ServerConfig {
  #[serde(default = "default_host")]
  pub host:                String,
  #[serde(default = "default_port")]
  pub port:                u16,
  pub store_path:          PathBuf,
  pub upload_dir:          PathBuf,
  pub jwt_secret:          String,
  #[serde(default = "default_token_ttl")]
  pub token_ttl_minutes:   i64,
  #[serde(default = "default_store_timeout")]
  pub store_timeout_ms:    u64,
  /// The three `admin_*` keys together create the first administrator at
  /// startup, unless that username already exists.
  #[serde(default)]
  pub admin_username:      Option<String>,
  #[serde(default)]
  pub admin_email:         Option<String>,
  #[serde(default)]
  pub admin_password_hash: Option<String>,
}

fn default_host() -> String { "127.0.0.1".into() }
fn default_port() -> u16 { 8080 }
fn default_token_ttl() -> i64 { 60 }
fn default_store_timeout() -> u64 { DEFAULT_STORE_TIMEOUT.as_millis() as u64 }

impl ServerConfig {
  pub fn validate(&self) -> anyhow::Result<()> {
    if self.jwt_secret.trim().is_empty() {
      bail!("jwt_secret must not be empty");
    }
    if self.token_ttl_minutes <= 0 {
      bail!("token_ttl_minutes must be positive");
    }
    if self.store_timeout_ms == 0 {
      bail!("store_timeout_ms must be positive");
    }
    Ok(())
  }

  /// The configured bootstrap administrator, if all three keys are present.
  pub fn bootstrap_admin(&self) -> Option<NewAccount> {
    Some(NewAccount {
      username:      self.admin_username.clone()?,
      email:         self.admin_email.clone()?,
      password_hash: self.admin_password_hash.clone()?,
      role:          Role::Admin,
    })
  }
}

// ─── Startup ──────────────────────────────────────────────────────────────────

/// Open the store, bootstrap the administrator, and build the API state.
pub async fn build_state(cfg: &ServerConfig) -> anyhow::Result<ApiState<SqliteStore>> {
  cfg.validate()?;

  let store_path = expand_tilde(&cfg.store_path);
  let store = SqliteStore::open(&store_path)
    .await
    .with_context(|| format!("failed to open store at {store_path:?}"))?;
  tracing::info!(path = %store_path.display(), "store opened");

  let registry = Registry::new(Arc::new(store))
    .with_timeout(Duration::from_millis(cfg.store_timeout_ms));

  match cfg.bootstrap_admin() {
    Some(admin) => {
      let created = registry
        .bootstrap_admin(admin)
        .await
        .context("failed to bootstrap administrator")?;
      if created.is_none() {
        tracing::debug!("bootstrap administrator already present");
      }
    }
    None => tracing::debug!("no bootstrap administrator configured"),
  }

  let upload_dir = expand_tilde(&cfg.upload_dir);
  tokio::fs::create_dir_all(&upload_dir)
    .await
    .with_context(|| format!("failed to create upload dir {upload_dir:?}"))?;

  Ok(ApiState {
    registry,
    jwt: JwtManager::new(&cfg.jwt_secret, chrono::Duration::minutes(cfg.token_ttl_minutes)),
    upload_dir: Arc::new(upload_dir),
  })
}

// ─── Router ───────────────────────────────────────────────────────────────────

/// The full application: `/api` routes, a liveness probe, and request
/// tracing.
pub fn router(state: ApiState<SqliteStore>) -> Router {
  Router::new()
    .route("/health", get(|| async { "ok" }))
    .nest("/api", tracer_api::api_router(state))
    .layer(TraceLayer::new_for_http())
}

/// Expand a leading `~` to the user's home directory.
pub fn expand_tilde(path: &Path) -> PathBuf {
  let s = path.to_string_lossy();
  if let Some(rest) = s.strip_prefix("~/")
    && let Ok(home) = std::env::var("HOME")
  {
    return PathBuf::from(home).join(rest);
  }
  path.to_path_buf()
}

#[cfg(test)]
mod tests;
