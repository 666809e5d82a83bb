//! Handlers for `/persons` endpoints.
//!
//! | Method   | Path | Notes |
//! |----------|------|-------|
//! | `GET`    | `/persons` | `?search=&sortBy=&order=&page=&limit=` |
//! | `GET`    | `/persons/without-engagements` | |
//! | `GET`    | `/persons/{id}` | 404 if missing or soft-deleted |
//! | `POST`   | `/persons` | Admin only |
//! | `PUT`    | `/persons/{id}` | Admin only |
//! | `DELETE` | `/persons/{id}` | Soft delete; deactivates the linked account |
//! | `POST`   | `/persons/{id}/restore` | |

use axum::{
  Json,
  extract::{Path, Query, State},
  http::StatusCode,
  response::IntoResponse,
};
use tracer_core::{
  person::{Person, PersonFields},
  query::{ListParams, Page},
  store::RecordStore,
};
use uuid::Uuid;

use crate::{ApiState, Listing, auth::AuthUser, error::ApiError};

/// `GET /persons`
pub async fn list<S: RecordStore + 'static>(
  State(state): State<ApiState<S>>,
  Query(params): Query<ListParams>,
) -> Result<Json<Page<Person>>, ApiError> {
  Ok(Json(state.registry.list_persons(&params).await?))
}

/// `GET /persons/without-engagements`
pub async fn without_engagements<S: RecordStore + 'static>(
  State(state): State<ApiState<S>>,
) -> Result<Json<Listing<Person>>, ApiError> {
  let persons = state.registry.list_persons_without_engagements().await?;
  Ok(Json(persons.into()))
}

/// `GET /persons/{id}`
pub async fn get_one<S: RecordStore + 'static>(
  State(state): State<ApiState<S>>,
  Path(id): Path<Uuid>,
) -> Result<Json<Person>, ApiError> {
  Ok(Json(state.registry.get_person(id).await?))
}

/// `POST /persons`
pub async fn create<S: RecordStore + 'static>(
  State(state): State<ApiState<S>>,
  AuthUser(actor): AuthUser,
  Json(fields): Json<PersonFields>,
) -> Result<impl IntoResponse, ApiError> {
  let person = state.registry.create_person(&actor, fields).await?;
  Ok((StatusCode::CREATED, Json(person)))
}

/// `PUT /persons/{id}`
pub async fn update<S: RecordStore + 'static>(
  State(state): State<ApiState<S>>,
  AuthUser(actor): AuthUser,
  Path(id): Path<Uuid>,
  Json(fields): Json<PersonFields>,
) -> Result<Json<Person>, ApiError> {
  Ok(Json(state.registry.update_person(&actor, id, fields).await?))
}

/// `DELETE /persons/{id}`
pub async fn soft_delete<S: RecordStore + 'static>(
  State(state): State<ApiState<S>>,
  AuthUser(actor): AuthUser,
  Path(id): Path<Uuid>,
) -> Result<StatusCode, ApiError> {
  state.registry.soft_delete_person(&actor, id).await?;
  Ok(StatusCode::NO_CONTENT)
}

/// `POST /persons/{id}/restore`
pub async fn restore<S: RecordStore + 'static>(
  State(state): State<ApiState<S>>,
  AuthUser(actor): AuthUser,
  Path(id): Path<Uuid>,
) -> Result<Json<Person>, ApiError> {
  state.registry.restore_person(&actor, id).await?;
  Ok(Json(state.registry.get_person(id).await?))
}
