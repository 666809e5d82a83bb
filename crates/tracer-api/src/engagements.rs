//! Handlers for `/engagements` endpoints.
//!
//! | Method   | Path | Notes |
//! |----------|------|-------|
//! | `GET`    | `/engagements` | `?search=&sortBy=&order=&page=&limit=` |
//! | `GET`    | `/engagements/long-tenure` | `?min_days=` (default 365) |
//! | `GET`    | `/engagements/{id}` | |
//! | `GET`    | `/persons/{id}/engagements` | Admin, or the person themself |
//! | `POST`   | `/engagements` | Admin only |
//! | `PUT`    | `/engagements/{id}` | Admin only |
//! | `DELETE` | `/engagements/{id}` | Moves the engagement to the trash |

use axum::{
  Json,
  extract::{Path, Query, State},
  http::StatusCode,
  response::IntoResponse,
};
use serde::Deserialize;
use tracer_core::{
  engagement::{Engagement, EngagementFields, NewEngagement, TrashEntry},
  query::{ListParams, Page},
  store::RecordStore,
};
use uuid::Uuid;

use crate::{ApiState, Listing, auth::AuthUser, error::ApiError};

/// `GET /engagements`
pub async fn list<S: RecordStore + 'static>(
  State(state): State<ApiState<S>>,
  Query(params): Query<ListParams>,
) -> Result<Json<Page<Engagement>>, ApiError> {
  Ok(Json(state.registry.list_engagements(&params).await?))
}

#[derive(Debug, Deserialize)]
pub struct TenureParams {
  pub min_days: Option<u32>,
}

/// `GET /engagements/long-tenure`
pub async fn long_tenure<S: RecordStore + 'static>(
  State(state): State<ApiState<S>>,
  Query(params): Query<TenureParams>,
) -> Result<Json<Listing<Engagement>>, ApiError> {
  let found = state
    .registry
    .list_long_tenure_engagements(params.min_days)
    .await?;
  Ok(Json(found.into()))
}

/// `GET /engagements/{id}`
pub async fn get_one<S: RecordStore + 'static>(
  State(state): State<ApiState<S>>,
  AuthUser(_): AuthUser,
  Path(id): Path<Uuid>,
) -> Result<Json<Engagement>, ApiError> {
  Ok(Json(state.registry.get_engagement(id).await?))
}

/// `GET /persons/{id}/engagements`
pub async fn for_person<S: RecordStore + 'static>(
  State(state): State<ApiState<S>>,
  AuthUser(actor): AuthUser,
  Path(person_id): Path<Uuid>,
) -> Result<Json<Listing<Engagement>>, ApiError> {
  let found = state
    .registry
    .list_engagements_for_person(&actor, person_id)
    .await?;
  Ok(Json(found.into()))
}

/// `POST /engagements` — body: `{"person_id":"…", "employer":"…", …}`
pub async fn create<S: RecordStore + 'static>(
  State(state): State<ApiState<S>>,
  AuthUser(actor): AuthUser,
  Json(input): Json<NewEngagement>,
) -> Result<impl IntoResponse, ApiError> {
  let engagement = state.registry.create_engagement(&actor, input).await?;
  Ok((StatusCode::CREATED, Json(engagement)))
}

/// `PUT /engagements/{id}`
pub async fn update<S: RecordStore + 'static>(
  State(state): State<ApiState<S>>,
  AuthUser(actor): AuthUser,
  Path(id): Path<Uuid>,
  Json(fields): Json<EngagementFields>,
) -> Result<Json<Engagement>, ApiError> {
  Ok(Json(state.registry.update_engagement(&actor, id, fields).await?))
}

/// `DELETE /engagements/{id}` — returns the new trash entry.
pub async fn soft_delete<S: RecordStore + 'static>(
  State(state): State<ApiState<S>>,
  AuthUser(actor): AuthUser,
  Path(id): Path<Uuid>,
) -> Result<Json<TrashEntry>, ApiError> {
  Ok(Json(state.registry.soft_delete_engagement(&actor, id).await?))
}
