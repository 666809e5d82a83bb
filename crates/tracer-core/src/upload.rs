//! Uploaded documents attached to an account: profile photos and
//! certificates. The bytes live on disk; only metadata is stored.

use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use strum::{AsRefStr, EnumString};
use uuid::Uuid;

use crate::{Error, Result, actor::Actor};

#[derive(
  Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize, AsRefStr, EnumString,
)]
#[serde(rename_all = "lowercase")]
#[strum(serialize_all = "lowercase")]
pub enum UploadKind {
  Photo,
  Certificate,
}

impl UploadKind {
  pub fn allowed_media_types(self) -> &'static [&'static str] {
    match self {
      Self::Photo => &["image/jpeg", "image/jpg", "image/png"],
      Self::Certificate => &["application/pdf"],
    }
  }

  pub fn max_bytes(self) -> u64 {
    match self {
      Self::Photo => 1024 * 1024,
      Self::Certificate => 2 * 1024 * 1024,
    }
  }

  /// Reject content of the wrong type or size before anything is written.
  pub fn check(self, media_type: &str, size: u64) -> Result<()> {
    if !self.allowed_media_types().contains(&media_type) {
      return Err(Error::validation(format!(
        "media type {media_type:?} not accepted for {}; allowed: {:?}",
        self.as_ref(),
        self.allowed_media_types()
      )));
    }
    if size == 0 {
      return Err(Error::validation("file is empty"));
    }
    if size > self.max_bytes() {
      return Err(Error::validation(format!(
        "file too large: {size} bytes (max {} MiB)",
        self.max_bytes() / (1024 * 1024)
      )));
    }
    Ok(())
  }
}

/// Decide whose account an upload is filed under.
///
/// Alumni may only upload for themselves; naming somebody else is a denial.
/// Admins upload on behalf of others and must say for whom.
pub fn resolve_upload_owner(actor: &Actor, requested: Option<Uuid>) -> Result<Uuid> {
  if actor.is_admin() {
    return requested
      .ok_or_else(|| Error::validation("account_id is required for admin uploads"));
  }
  match requested {
    Some(other) if other != actor.account_id => Err(Error::Forbidden(
      "cannot upload files for another account".into(),
    )),
    _ => Ok(actor.account_id),
  }
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct StoredFile {
  pub file_id:       Uuid,
  pub account_id:    Uuid,
  pub kind:          UploadKind,
  /// Name on disk, `<uuid><ext>`.
  pub file_name:     String,
  pub original_name: String,
  pub path:          String,
  pub size:          u64,
  pub media_type:    String,
  /// SHA-256 hex digest of the content.
  pub content_hash:  String,
  pub uploaded_at:   DateTime<Utc>,
}
