//! Handlers for the engagement trash.
//!
//! | Method   | Path | Notes |
//! |----------|------|-------|
//! | `GET`    | `/trash` | Admins see everything, alumni their own entries |
//! | `POST`   | `/trash/{id}/restore` | Back to the active table |
//! | `DELETE` | `/trash/{id}` | Permanent |

use axum::{
  Json,
  extract::{Path, State},
  http::StatusCode,
};
use tracer_core::{
  engagement::{Engagement, TrashEntry},
  store::RecordStore,
};
use uuid::Uuid;

use crate::{ApiState, Listing, auth::AuthUser, error::ApiError};

/// `GET /trash`
pub async fn list<S: RecordStore + 'static>(
  State(state): State<ApiState<S>>,
  AuthUser(actor): AuthUser,
) -> Result<Json<Listing<TrashEntry>>, ApiError> {
  Ok(Json(state.registry.list_trash(&actor).await?.into()))
}

/// `POST /trash/{id}/restore`
pub async fn restore<S: RecordStore + 'static>(
  State(state): State<ApiState<S>>,
  AuthUser(actor): AuthUser,
  Path(id): Path<Uuid>,
) -> Result<Json<Engagement>, ApiError> {
  Ok(Json(state.registry.restore_engagement(&actor, id).await?))
}

/// `DELETE /trash/{id}`
pub async fn purge<S: RecordStore + 'static>(
  State(state): State<ApiState<S>>,
  AuthUser(actor): AuthUser,
  Path(id): Path<Uuid>,
) -> Result<StatusCode, ApiError> {
  state.registry.hard_delete_engagement(&actor, id).await?;
  Ok(StatusCode::NO_CONTENT)
}
