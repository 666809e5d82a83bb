//! Person: a managed alumni record.
//!
//! Persons are never physically removed. Soft deletion flips `deleted` and,
//! in the same transaction, deactivates the linked account.

use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use uuid::Uuid;

use crate::{Error, Result};

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct Person {
  pub person_id:       Uuid,
  /// The login identity for this alumnus, if one has been issued.
  pub account_id:      Option<Uuid>,
  /// Student number assigned by the institution.
  pub institution_id:  String,
  pub name:            String,
  pub program:         String,
  pub cohort_year:     i32,
  pub graduation_year: i32,
  pub email:           String,
  pub phone:           String,
  pub address:         String,
  pub deleted:         bool,
  pub created_at:      DateTime<Utc>,
  pub updated_at:      DateTime<Utc>,
}

/// Editable fields, accepted by both create and full update.
#[derive(Debug, Clone, PartialEq, Eq, Deserialize)]
pub struct PersonFields {
  #[serde(default)]
  pub account_id:      Option<Uuid>,
  pub institution_id:  String,
  pub name:            String,
  #[serde(default)]
  pub program:         String,
  pub cohort_year:     i32,
  pub graduation_year: i32,
  #[serde(default)]
  pub email:           String,
  #[serde(default)]
  pub phone:           String,
  #[serde(default)]
  pub address:         String,
}

impl PersonFields {
  /// Trim whitespace and reject malformed input.
  pub fn validate(mut self) -> Result<Self> {
    for s in [
      &mut self.institution_id,
      &mut self.name,
      &mut self.program,
      &mut self.email,
      &mut self.phone,
      &mut self.address,
    ] {
      *s = s.trim().to_owned();
    }

    if self.institution_id.is_empty() {
      return Err(Error::validation("institution_id is required"));
    }
    if self.name.is_empty() {
      return Err(Error::validation("name is required"));
    }
    if !self.email.is_empty() && !self.email.contains('@') {
      return Err(Error::validation(format!("invalid email {:?}", self.email)));
    }
    if !(1900..=2200).contains(&self.cohort_year) {
      return Err(Error::validation(format!(
        "cohort_year {} out of range",
        self.cohort_year
      )));
    }
    if self.graduation_year < self.cohort_year {
      return Err(Error::validation(
        "graduation_year must not precede cohort_year",
      ));
    }
    Ok(self)
  }

  pub(crate) fn into_person(self, person_id: Uuid, now: DateTime<Utc>) -> Person {
    Person {
      person_id,
      account_id: self.account_id,
      institution_id: self.institution_id,
      name: self.name,
      program: self.program,
      cohort_year: self.cohort_year,
      graduation_year: self.graduation_year,
      email: self.email,
      phone: self.phone,
      address: self.address,
      deleted: false,
      created_at: now,
      updated_at: now,
    }
  }
}

#[cfg(test)]
mod tests {
  use super::*;

  fn fields() -> PersonFields {
    PersonFields {
      account_id:      None,
      institution_id:  " 187221001 ".into(),
      name:            "Ayu Lestari".into(),
      program:         "Informatics".into(),
      cohort_year:     2020,
      graduation_year: 2024,
      email:           "ayu@example.com".into(),
      phone:           String::new(),
      address:         String::new(),
    }
  }

  #[test]
  fn validate_trims() {
    let f = fields().validate().unwrap();
    assert_eq!(f.institution_id, "187221001");
  }

  #[test]
  fn graduation_before_cohort_rejected() {
    let mut f = fields();
    f.graduation_year = 2019;
    assert!(matches!(f.validate(), Err(Error::Validation(_))));
  }

  #[test]
  fn blank_name_rejected() {
    let mut f = fields();
    f.name = "   ".into();
    assert!(matches!(f.validate(), Err(Error::Validation(_))));
  }

  #[test]
  fn bad_email_rejected() {
    let mut f = fields();
    f.email = "not-an-address".into();
    assert!(matches!(f.validate(), Err(Error::Validation(_))));
  }
}
