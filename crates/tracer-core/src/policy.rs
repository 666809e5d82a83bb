//! The authorization policy: a pure function of who is asking, who owns the
//! target, and what they want to do with it.
//!
//! The registry consults this before every mutation, so a denial always
//! happens before any store write.

use serde::Serialize;
use uuid::Uuid;

use crate::{
  Error, Result,
  actor::{Actor, Role},
};

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize)]
#[serde(rename_all = "snake_case")]
pub enum Operation {
  Read,
  Create,
  Update,
  SoftDelete,
  Restore,
  HardDelete,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Decision {
  Allow,
  Deny,
}

/// Decide whether an actor may perform `op` on a target.
///
/// `actor_owner` and `target_owner` must be identifiers of the same kind:
/// the actor's Person id against an Engagement's Person, or the actor's
/// Account id against a Person's linked Account. A missing owner on either
/// side never matches.
pub fn authorize(
  role: Role,
  actor_owner: Option<Uuid>,
  target_owner: Option<Uuid>,
  op: Operation,
) -> Decision {
  match (role, op) {
    (_, Operation::Read) => Decision::Allow,
    (Role::Admin, _) => Decision::Allow,
    (Role::Alumni, Operation::Create | Operation::Update) => Decision::Deny,
    (
      Role::Alumni,
      Operation::SoftDelete | Operation::Restore | Operation::HardDelete,
    ) => match (actor_owner, target_owner) {
      (Some(a), Some(t)) if a == t => Decision::Allow,
      _ => Decision::Deny,
    },
  }
}

/// [`authorize`] lifted into a `Result`, logging denials.
pub fn ensure(
  actor: &Actor,
  actor_owner: Option<Uuid>,
  target_owner: Option<Uuid>,
  op: Operation,
  what: &str,
) -> Result<()> {
  match authorize(actor.role, actor_owner, target_owner, op) {
    Decision::Allow => Ok(()),
    Decision::Deny => {
      tracing::warn!(
        account = %actor.account_id,
        role = %actor.role,
        ?op,
        target = what,
        "authorization denied"
      );
      Err(Error::Forbidden(format!("{op:?} on {what} is not permitted")))
    }
  }
}
