//! The authenticated identity performing an operation.

use serde::{Deserialize, Serialize};
use strum::{AsRefStr, Display, EnumString};
use uuid::Uuid;

use crate::{Error, Result};

/// The closed set of roles an account may hold.
#[derive(
  Debug,
  Clone,
  Copy,
  PartialEq,
  Eq,
  Serialize,
  Deserialize,
  AsRefStr,
  Display,
  EnumString,
)]
#[serde(rename_all = "lowercase")]
#[strum(serialize_all = "lowercase")]
pub enum Role {
  Admin,
  Alumni,
}

impl Role {
  /// Parse a role string coming from outside the process (e.g. a token
  /// claim). Anything outside the closed set is a denial, never a default.
  pub fn parse_claim(raw: &str) -> Result<Self> {
    raw
      .parse()
      .map_err(|_| Error::Forbidden(format!("unrecognised role {raw:?}")))
  }

  pub fn is_admin(self) -> bool { matches!(self, Self::Admin) }
}

/// Who is asking. Built by the HTTP layer from a verified session token.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct Actor {
  pub account_id: Uuid,
  pub role:       Role,
  /// The Person linked to the actor's account, if any.
  pub person_id:  Option<Uuid>,
}

impl Actor {
  pub fn admin(account_id: Uuid) -> Self {
    Self { account_id, role: Role::Admin, person_id: None }
  }

  pub fn alumni(account_id: Uuid, person_id: Option<Uuid>) -> Self {
    Self { account_id, role: Role::Alumni, person_id }
  }

  pub fn is_admin(&self) -> bool { self.role.is_admin() }

  /// Which Person-owned rows this actor may see in owner-scoped listings.
  pub fn person_scope(&self) -> Scope {
    match (self.role, self.person_id) {
      (Role::Admin, _) => Scope::Everything,
      (Role::Alumni, Some(id)) => Scope::Owner(id),
      (Role::Alumni, None) => Scope::Nothing,
    }
  }
}

/// A row filter derived from an actor's ownership.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Scope {
  Everything,
  Owner(Uuid),
  /// An alumni account with no linked Person owns nothing.
  Nothing,
}

#[cfg(test)]
mod tests {
  use super::*;

  #[test]
  fn role_claims_are_closed() {
    assert_eq!(Role::parse_claim("admin").unwrap(), Role::Admin);
    assert_eq!(Role::parse_claim("alumni").unwrap(), Role::Alumni);
    assert!(matches!(Role::parse_claim("user"), Err(Error::Forbidden(_))));
    assert!(matches!(Role::parse_claim("Admin "), Err(Error::Forbidden(_))));
  }

  #[test]
  fn unlinked_alumni_scope_is_empty() {
    let id = Uuid::new_v4();
    assert_eq!(Actor::admin(id).person_scope(), Scope::Everything);
    assert_eq!(Actor::alumni(id, None).person_scope(), Scope::Nothing);
    let p = Uuid::new_v4();
    assert_eq!(Actor::alumni(id, Some(p)).person_scope(), Scope::Owner(p));
  }

  #[test]
  fn role_display_matches_serde() {
    assert_eq!(Role::Alumni.to_string(), "alumni");
    assert_eq!(
      serde_json::to_string(&Role::Admin).unwrap(),
      "\"admin\""
    );
  }
}
