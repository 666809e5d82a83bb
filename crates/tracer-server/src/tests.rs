//! Startup wiring tests: configuration parsing, bootstrap, and the composed
//! router.

use axum::{
  body::Body,
  http::{Method, Request, StatusCode, header},
};
use config::{Config, File, FileFormat};
use tower::ServiceExt as _;

use crate::{ServerConfig, build_state, router};

fn parse(toml: &str) -> ServerConfig {
  Config::builder()
    .add_source(File::from_str(toml, FileFormat::Toml))
    .build()
    .unwrap()
    .try_deserialize()
    .unwrap()
}

fn config_in(dir: &tempfile::TempDir, admin_hash: Option<&str>) -> ServerConfig {
  let mut cfg = parse(&format!(
    r#"
      store_path = "{}"
      upload_dir = "{}"
      jwt_secret = "server-test"
    "#,
    dir.path().join("tracer.db").display(),
    dir.path().join("uploads").display(),
  ));
  if let Some(hash) = admin_hash {
    cfg.admin_username = Some("root".into());
    cfg.admin_email = Some("root@tracer.test".into());
    cfg.admin_password_hash = Some(hash.into());
  }
  cfg
}

#[test]
fn defaults_fill_optional_keys() {
  let cfg = parse(
    r#"
      store_path = "/tmp/t.db"
      upload_dir = "/tmp/uploads"
      jwt_secret = "s"
    "#,
  );
  assert_eq!(cfg.host, "127.0.0.1");
  assert_eq!(cfg.port, 8080);
  assert_eq!(cfg.token_ttl_minutes, 60);
  assert_eq!(cfg.store_timeout_ms, 5000);
  assert!(cfg.bootstrap_admin().is_none());
  cfg.validate().unwrap();
}

#[test]
fn empty_secret_is_rejected() {
  let cfg = parse(
    r#"
      store_path = "/tmp/t.db"
      upload_dir = "/tmp/uploads"
      jwt_secret = "  "
    "#,
  );
  assert!(cfg.validate().is_err());
}

#[tokio::test]
async fn bootstrap_survives_restart_and_admin_can_log_in() {
  let dir = tempfile::tempdir().unwrap();
  let hash = tracer_api::auth::hash_password("root-pass").unwrap();
  let cfg = config_in(&dir, Some(&hash));

  build_state(&cfg).await.unwrap();
  let app = router(build_state(&cfg).await.unwrap());
  assert!(dir.path().join("uploads").is_dir());

  let req = Request::builder()
    .method(Method::POST)
    .uri("/api/login")
    .header(header::CONTENT_TYPE, "application/json")
    .body(Body::from(r#"{"login":"root","password":"root-pass"}"#))
    .unwrap();
  let res = app.clone().oneshot(req).await.unwrap();
  assert_eq!(res.status(), StatusCode::OK);

  let bytes = axum::body::to_bytes(res.into_body(), usize::MAX).await.unwrap();
  let body: serde_json::Value = serde_json::from_slice(&bytes).unwrap();
  assert_eq!(body["account"]["role"], "admin");
}

#[tokio::test]
async fn health_probe_answers() {
  let dir = tempfile::tempdir().unwrap();
  let app = router(build_state(&config_in(&dir, None)).await.unwrap());

  let req = Request::builder().uri("/health").body(Body::empty()).unwrap();
  let res = app.oneshot(req).await.unwrap();
  assert_eq!(res.status(), StatusCode::OK);
}
