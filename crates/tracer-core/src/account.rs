//! Account: an authentication identity, optionally linked to one Person.

use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use uuid::Uuid;

use crate::{Error, Result, actor::Role};

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct Account {
  pub account_id:    Uuid,
  pub username:      String,
  pub email:         String,
  /// argon2 PHC string. Never serialised back to clients.
  #[serde(skip_serializing, default)]
  pub password_hash: String,
  pub role:          Role,
  pub active:        bool,
  /// The Person whose `account_id` points here. Derived from the Person
  /// side, so the link can never disagree with itself.
  pub person_id:     Option<Uuid>,
  pub created_at:    DateTime<Utc>,
}

/// Input to [`crate::lifecycle::Registry::create_account`]. The password is
/// hashed by the caller; the registry never sees plaintext.
#[derive(Debug, Clone)]
pub struct NewAccount {
  pub username:      String,
  pub email:         String,
  pub password_hash: String,
  pub role:          Role,
}

impl NewAccount {
  pub fn validate(mut self) -> Result<Self> {
    self.username = self.username.trim().to_owned();
    self.email = self.email.trim().to_owned();
    if self.username.is_empty() {
      return Err(Error::validation("username is required"));
    }
    if self.username.contains('@') {
      return Err(Error::validation("username must not contain '@'"));
    }
    if !self.email.contains('@') {
      return Err(Error::validation(format!("invalid email {:?}", self.email)));
    }
    if self.password_hash.is_empty() {
      return Err(Error::validation("password is required"));
    }
    Ok(self)
  }
}
