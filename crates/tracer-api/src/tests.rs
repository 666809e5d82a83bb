//! Router-level tests: requests go through the full axum stack into a
//! registry over an in-memory SQLite store.

use std::sync::Arc;

use axum::{
  Router,
  body::Body,
  http::{Method, Request, StatusCode, header},
};
use chrono::Duration;
use serde_json::{Value, json};
use sha2::{Digest, Sha256};
use tower::ServiceExt as _;
use tracer_core::{account::NewAccount, actor::Role, lifecycle::Registry};
use tracer_store_sqlite::SqliteStore;

use crate::{ApiState, api_router, auth::hash_password};

const SECRET: &str = "router-test-secret";

struct Harness {
  app:     Router,
  uploads: tempfile::TempDir,
}

async fn harness() -> Harness {
  let store = SqliteStore::open_in_memory().await.expect("in-memory store");
  let registry = Registry::new(Arc::new(store));
  registry
    .bootstrap_admin(NewAccount {
      username:      "admin".into(),
      email:         "admin@tracer.test".into(),
      password_hash: hash_password("admin-pass").unwrap(),
      role:          Role::Admin,
    })
    .await
    .unwrap();

  let uploads = tempfile::tempdir().unwrap();
  let state = ApiState {
    registry,
    jwt: crate::JwtManager::new(SECRET, Duration::minutes(10)),
    upload_dir: Arc::new(uploads.path().to_path_buf()),
  };
  Harness { app: Router::new().nest("/api", api_router(state)), uploads }
}

async fn send(
  app: &Router,
  method: Method,
  uri: &str,
  token: Option<&str>,
  body: Option<Value>,
) -> (StatusCode, Value) {
  let mut req = Request::builder().method(method).uri(uri);
  if let Some(token) = token {
    req = req.header(header::AUTHORIZATION, format!("Bearer {token}"));
  }
  let req = match body {
    Some(json) => req
      .header(header::CONTENT_TYPE, "application/json")
      .body(Body::from(json.to_string())),
    None => req.body(Body::empty()),
  }
  .unwrap();

  let res = app.clone().oneshot(req).await.unwrap();
  let status = res.status();
  let bytes = axum::body::to_bytes(res.into_body(), usize::MAX).await.unwrap();
  let value = if bytes.is_empty() {
    Value::Null
  } else {
    serde_json::from_slice(&bytes).unwrap_or(Value::Null)
  };
  (status, value)
}

async fn login(app: &Router, login: &str, password: &str) -> String {
  let (status, body) = send(
    app,
    Method::POST,
    "/api/login",
    None,
    Some(json!({ "login": login, "password": password })),
  )
  .await;
  assert_eq!(status, StatusCode::OK, "{body}");
  body["token"].as_str().unwrap().to_owned()
}

/// Create an alumni account plus linked person and return
/// `(person_id, alumni token)`.
async fn enrol(app: &Router, admin: &str, username: &str) -> (String, String) {
  let (status, account) = send(
    app,
    Method::POST,
    "/api/accounts",
    Some(admin),
    Some(json!({
      "username": username,
      "email": format!("{username}@alumni.test"),
      "password": "alumni-pass",
      "role": "alumni",
    })),
  )
  .await;
  assert_eq!(status, StatusCode::CREATED, "{account}");

  let (status, person) = send(
    app,
    Method::POST,
    "/api/persons",
    Some(admin),
    Some(json!({
      "account_id": account["account_id"],
      "institution_id": format!("NIM-{username}"),
      "name": username,
      "program": "Informatika",
      "cohort_year": 2020,
      "graduation_year": 2024,
    })),
  )
  .await;
  assert_eq!(status, StatusCode::CREATED, "{person}");

  let token = login(app, username, "alumni-pass").await;
  (person["person_id"].as_str().unwrap().to_owned(), token)
}

async fn add_engagement(app: &Router, admin: &str, person_id: &str) -> String {
  let (status, body) = send(
    app,
    Method::POST,
    "/api/engagements",
    Some(admin),
    Some(json!({
      "person_id": person_id,
      "employer": "Acme",
      "position": "Engineer",
      "industry": "Software",
      "location": "Bandung",
      "salary_range": "10-15 juta",
      "start_date": "2021-01-01",
      "status": "active",
      "description": "platform",
    })),
  )
  .await;
  assert_eq!(status, StatusCode::CREATED, "{body}");
  body["engagement_id"].as_str().unwrap().to_owned()
}

// ─── Auth ────────────────────────────────────────────────────────────────────

#[tokio::test]
async fn login_by_username_or_email() {
  let h = harness().await;
  login(&h.app, "admin", "admin-pass").await;
  login(&h.app, "admin@tracer.test", "admin-pass").await;

  let (status, body) = send(
    &h.app,
    Method::POST,
    "/api/login",
    None,
    Some(json!({ "login": "admin", "password": "wrong" })),
  )
  .await;
  assert_eq!(status, StatusCode::UNAUTHORIZED);
  assert_eq!(body["error"], "unauthorized");
}

#[tokio::test]
async fn profile_needs_a_token() {
  let h = harness().await;
  let (status, _) = send(&h.app, Method::GET, "/api/profile", None, None).await;
  assert_eq!(status, StatusCode::UNAUTHORIZED);

  let token = login(&h.app, "admin", "admin-pass").await;
  let (status, body) = send(&h.app, Method::GET, "/api/profile", Some(&token), None).await;
  assert_eq!(status, StatusCode::OK);
  assert_eq!(body["username"], "admin");
  assert_eq!(body["role"], "admin");
  assert!(body.get("password_hash").is_none());
}

#[tokio::test]
async fn forged_role_claim_is_forbidden() {
  let h = harness().await;
  let claims = crate::auth::Claims {
    sub:       uuid::Uuid::new_v4(),
    username:  "mallory".into(),
    role:      "superuser".into(),
    person_id: None,
    iat:       chrono::Utc::now().timestamp(),
    exp:       (chrono::Utc::now() + Duration::minutes(5)).timestamp(),
  };
  let token = jsonwebtoken::encode(
    &jsonwebtoken::Header::default(),
    &claims,
    &jsonwebtoken::EncodingKey::from_secret(SECRET.as_bytes()),
  )
  .unwrap();

  let (status, _) = send(&h.app, Method::GET, "/api/trash", Some(&token), None).await;
  assert_eq!(status, StatusCode::FORBIDDEN);
}

// ─── Persons ─────────────────────────────────────────────────────────────────

#[tokio::test]
async fn alumni_cannot_create_persons() {
  let h = harness().await;
  let admin = login(&h.app, "admin", "admin-pass").await;
  let (_, alumni) = enrol(&h.app, &admin, "putri").await;

  let (status, _) = send(
    &h.app,
    Method::POST,
    "/api/persons",
    Some(&alumni),
    Some(json!({
      "institution_id": "NIM-x",
      "name": "X",
      "cohort_year": 2020,
      "graduation_year": 2024,
    })),
  )
  .await;
  assert_eq!(status, StatusCode::FORBIDDEN);
}

#[tokio::test]
async fn garbage_list_params_are_normalised() {
  let h = harness().await;
  let admin = login(&h.app, "admin", "admin-pass").await;
  enrol(&h.app, &admin, "putri").await;

  let (status, body) = send(
    &h.app,
    Method::GET,
    "/api/persons?search=eng&sortBy=doesnotexist&order=sideways&page=0&limit=-5",
    None,
    None,
  )
  .await;
  assert_eq!(status, StatusCode::OK, "{body}");
  assert_eq!(body["meta"]["sort_by"], "name");
  assert_eq!(body["meta"]["order"], "asc");
  assert_eq!(body["meta"]["page"], 1);
  assert_eq!(body["meta"]["limit"], 1);
}

#[tokio::test]
async fn deleting_a_person_locks_their_account() {
  let h = harness().await;
  let admin = login(&h.app, "admin", "admin-pass").await;
  let (person_id, _) = enrol(&h.app, &admin, "putri").await;

  let uri = format!("/api/persons/{person_id}");
  let (status, _) = send(&h.app, Method::DELETE, &uri, Some(&admin), None).await;
  assert_eq!(status, StatusCode::NO_CONTENT);

  let (status, _) = send(&h.app, Method::GET, &uri, None, None).await;
  assert_eq!(status, StatusCode::NOT_FOUND);

  let (status, _) = send(
    &h.app,
    Method::POST,
    "/api/login",
    None,
    Some(json!({ "login": "putri", "password": "alumni-pass" })),
  )
  .await;
  assert_eq!(status, StatusCode::UNAUTHORIZED);

  let (status, body) =
    send(&h.app, Method::POST, &format!("{uri}/restore"), Some(&admin), None).await;
  assert_eq!(status, StatusCode::OK);
  assert_eq!(body["deleted"], false);
  login(&h.app, "putri", "alumni-pass").await;
}

#[tokio::test]
async fn unlinked_account_loses_ownership_before_token_expiry() {
  let h = harness().await;
  let admin = login(&h.app, "admin", "admin-pass").await;
  let (person_id, owner) = enrol(&h.app, &admin, "putri").await;
  let id = add_engagement(&h.app, &admin, &person_id).await;

  let (status, body) = send(
    &h.app,
    Method::PUT,
    &format!("/api/persons/{person_id}"),
    Some(&admin),
    Some(json!({
      "account_id": null,
      "institution_id": "NIM-putri",
      "name": "putri",
      "program": "Informatika",
      "cohort_year": 2020,
      "graduation_year": 2024,
    })),
  )
  .await;
  assert_eq!(status, StatusCode::OK, "{body}");

  let (status, _) =
    send(&h.app, Method::DELETE, &format!("/api/engagements/{id}"), Some(&owner), None).await;
  assert_eq!(status, StatusCode::FORBIDDEN);

  let (_, listed) = send(&h.app, Method::GET, "/api/engagements", None, None).await;
  assert_eq!(listed["meta"]["total"], 1);
}

// ─── Engagements & trash ─────────────────────────────────────────────────────

#[tokio::test]
async fn trash_round_trip_through_http() {
  let h = harness().await;
  let admin = login(&h.app, "admin", "admin-pass").await;
  let (person_id, owner) = enrol(&h.app, &admin, "putri").await;
  let (_, stranger) = enrol(&h.app, &admin, "joko").await;
  let id = add_engagement(&h.app, &admin, &person_id).await;

  let (status, entry) =
    send(&h.app, Method::DELETE, &format!("/api/engagements/{id}"), Some(&admin), None).await;
  assert_eq!(status, StatusCode::OK);
  assert_eq!(entry["engagement_id"], id.as_str());
  assert!(entry["deleted_at"].is_string());

  let (_, listed) = send(&h.app, Method::GET, "/api/engagements", None, None).await;
  assert_eq!(listed["meta"]["total"], 0);

  let (_, trash) = send(&h.app, Method::GET, "/api/trash", Some(&stranger), None).await;
  assert_eq!(trash["total"], 0);

  let restore = format!("/api/trash/{id}/restore");
  let (status, _) = send(&h.app, Method::POST, &restore, Some(&stranger), None).await;
  assert_eq!(status, StatusCode::FORBIDDEN);

  let (status, restored) = send(&h.app, Method::POST, &restore, Some(&owner), None).await;
  assert_eq!(status, StatusCode::OK);
  assert_eq!(restored["employer"], "Acme");

  let (_, listed) = send(&h.app, Method::GET, "/api/engagements", None, None).await;
  assert_eq!(listed["meta"]["total"], 1);
}

#[tokio::test]
async fn hard_delete_requires_trash_first() {
  let h = harness().await;
  let admin = login(&h.app, "admin", "admin-pass").await;
  let (person_id, _) = enrol(&h.app, &admin, "putri").await;
  let id = add_engagement(&h.app, &admin, &person_id).await;

  let purge = format!("/api/trash/{id}");
  let (status, _) = send(&h.app, Method::DELETE, &purge, Some(&admin), None).await;
  assert_eq!(status, StatusCode::CONFLICT);

  send(&h.app, Method::DELETE, &format!("/api/engagements/{id}"), Some(&admin), None).await;
  let (status, _) = send(&h.app, Method::DELETE, &purge, Some(&admin), None).await;
  assert_eq!(status, StatusCode::NO_CONTENT);

  let (status, _) = send(&h.app, Method::DELETE, &purge, Some(&admin), None).await;
  assert_eq!(status, StatusCode::NOT_FOUND);
}

// ─── Files ───────────────────────────────────────────────────────────────────

fn multipart(file_name: &str, media_type: &str, bytes: &[u8]) -> (String, Vec<u8>) {
  let boundary = "tracer-test-boundary";
  let mut body = Vec::new();
  body.extend_from_slice(
    format!(
      "--{boundary}\r\nContent-Disposition: form-data; name=\"file\"; \
       filename=\"{file_name}\"\r\nContent-Type: {media_type}\r\n\r\n"
    )
    .as_bytes(),
  );
  body.extend_from_slice(bytes);
  body.extend_from_slice(format!("\r\n--{boundary}--\r\n").as_bytes());
  (format!("multipart/form-data; boundary={boundary}"), body)
}

async fn upload(
  app: &Router,
  token: &str,
  kind: &str,
  file_name: &str,
  media_type: &str,
  bytes: &[u8],
) -> (StatusCode, Value) {
  let (content_type, body) = multipart(file_name, media_type, bytes);
  let req = Request::builder()
    .method(Method::POST)
    .uri(format!("/api/files/{kind}"))
    .header(header::AUTHORIZATION, format!("Bearer {token}"))
    .header(header::CONTENT_TYPE, content_type)
    .body(Body::from(body))
    .unwrap();
  let res = app.clone().oneshot(req).await.unwrap();
  let status = res.status();
  let bytes = axum::body::to_bytes(res.into_body(), usize::MAX).await.unwrap();
  (status, serde_json::from_slice(&bytes).unwrap_or(Value::Null))
}

#[tokio::test]
async fn alumni_photo_upload_is_stored_and_hashed() {
  let h = harness().await;
  let admin = login(&h.app, "admin", "admin-pass").await;
  let (_, alumni) = enrol(&h.app, &admin, "putri").await;

  let png = b"\x89PNG\r\n\x1a\nnot-really-a-png";
  let (status, file) = upload(&h.app, &alumni, "photo", "me.png", "image/png", png).await;
  assert_eq!(status, StatusCode::CREATED, "{file}");
  assert_eq!(file["kind"], "photo");
  assert_eq!(file["original_name"], "me.png");
  assert_eq!(file["content_hash"], hex::encode(Sha256::digest(png)));

  let on_disk = h.uploads.path().join(file["file_name"].as_str().unwrap());
  assert_eq!(std::fs::read(&on_disk).unwrap(), png);

  let (_, mine) = send(&h.app, Method::GET, "/api/files", Some(&alumni), None).await;
  assert_eq!(mine["total"], 1);

  let uri = format!("/api/files/{}", file["file_id"].as_str().unwrap());
  let (status, _) = send(&h.app, Method::DELETE, &uri, Some(&alumni), None).await;
  assert_eq!(status, StatusCode::NO_CONTENT);
  assert!(!on_disk.exists());
}

#[tokio::test]
async fn rejected_upload_leaves_no_bytes_behind() {
  let h = harness().await;
  let admin = login(&h.app, "admin", "admin-pass").await;
  let (_, alumni) = enrol(&h.app, &admin, "putri").await;

  let (status, _) =
    upload(&h.app, &alumni, "certificate", "ijazah.png", "image/png", b"png").await;
  assert_eq!(status, StatusCode::BAD_REQUEST);

  let (status, _) = upload(&h.app, &admin, "photo", "me.png", "image/png", b"png").await;
  assert_eq!(status, StatusCode::BAD_REQUEST, "admins must name an account");

  assert_eq!(std::fs::read_dir(h.uploads.path()).unwrap().count(), 0);
}
