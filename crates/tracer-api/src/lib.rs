//! JSON REST API for the tracer registry.
//!
//! Exposes an axum [`Router`] backed by a [`Registry`] over any
//! [`RecordStore`]. TLS and transport concerns are the caller's
//! responsibility.
//!
//! # Mounting
//!
//! ```rust,ignore
//! .nest("/api", tracer_api::api_router(state))
//! ```

pub mod accounts;
pub mod auth;
pub mod engagements;
pub mod error;
pub mod files;
pub mod persons;
pub mod trash;

use std::{path::PathBuf, sync::Arc};

use axum::{
  Router,
  extract::DefaultBodyLimit,
  routing::{delete, get, post},
};
use serde::Serialize;
use tracer_core::{lifecycle::Registry, store::RecordStore};

pub use auth::{AuthUser, JwtManager};
pub use error::ApiError;

/// Multipart overhead allowed on top of the largest accepted upload.
const UPLOAD_BODY_LIMIT: usize = 3 * 1024 * 1024;

/// Shared state threaded through all handlers.
pub struct ApiState<S> {
  pub registry:   Registry<S>,
  pub jwt:        JwtManager,
  /// Directory uploaded files are written into.
  pub upload_dir: Arc<PathBuf>,
}

impl<S> Clone for ApiState<S> {
  fn clone(&self) -> Self {
    Self {
      registry:   self.registry.clone(),
      jwt:        self.jwt.clone(),
      upload_dir: Arc::clone(&self.upload_dir),
    }
  }
}

/// An unpaginated result set.
#[derive(Debug, Serialize)]
pub struct Listing<T> {
  pub data:  Vec<T>,
  pub total: usize,
}

impl<T> From<Vec<T>> for Listing<T> {
  fn from(data: Vec<T>) -> Self {
    Self { total: data.len(), data }
  }
}

/// Build a fully-materialised API router.
///
/// The returned `Router<()>` can be nested into any parent router regardless
/// of its own state type.
pub fn api_router<S>(state: ApiState<S>) -> Router<()>
where
  S: RecordStore + 'static,
{
  let uploads: Router<ApiState<S>> = Router::new()
    .route("/files/photo", post(files::upload_photo::<S>))
    .route("/files/certificate", post(files::upload_certificate::<S>))
    .layer(DefaultBodyLimit::max(UPLOAD_BODY_LIMIT));

  Router::new()
    // Session & accounts
    .route("/login", post(accounts::login::<S>))
    .route("/profile", get(accounts::profile::<S>))
    .route("/accounts", post(accounts::create::<S>))
    // Persons
    .route("/persons", get(persons::list::<S>).post(persons::create::<S>))
    .route("/persons/without-engagements", get(persons::without_engagements::<S>))
    .route(
      "/persons/{id}",
      get(persons::get_one::<S>)
        .put(persons::update::<S>)
        .delete(persons::soft_delete::<S>),
    )
    .route("/persons/{id}/restore", post(persons::restore::<S>))
    .route("/persons/{id}/engagements", get(engagements::for_person::<S>))
    // Engagements
    .route("/engagements", get(engagements::list::<S>).post(engagements::create::<S>))
    .route("/engagements/long-tenure", get(engagements::long_tenure::<S>))
    .route(
      "/engagements/{id}",
      get(engagements::get_one::<S>)
        .put(engagements::update::<S>)
        .delete(engagements::soft_delete::<S>),
    )
    // Trash
    .route("/trash", get(trash::list::<S>))
    .route("/trash/{id}", delete(trash::purge::<S>))
    .route("/trash/{id}/restore", post(trash::restore::<S>))
    // Files
    .merge(uploads)
    .route("/files", get(files::list::<S>))
    .route("/files/{id}", get(files::get_one::<S>).delete(files::delete_one::<S>))
    .with_state(state)
}

#[cfg(test)]
mod tests;
