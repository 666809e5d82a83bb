//! Engagement: one employment record, owned by exactly one Person.
//!
//! An engagement lives in exactly one of two tiers at a time: the active
//! table or the trash. Soft deletion moves the whole row into the trash;
//! restoration moves it back. There is no per-row `deleted` flag because tier
//! membership already says it.

use chrono::{DateTime, NaiveDate, Utc};
use serde::{Deserialize, Serialize};
use uuid::Uuid;

use crate::{Error, Result};

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct Engagement {
  pub engagement_id: Uuid,
  /// Owning Person. Fixed at creation.
  pub person_id:     Uuid,
  pub employer:      String,
  pub position:      String,
  pub industry:      String,
  pub location:      String,
  /// Free-text band, e.g. "10-15 juta".
  pub salary_range:  String,
  pub start_date:    NaiveDate,
  /// `None` while the engagement is ongoing.
  pub end_date:      Option<NaiveDate>,
  pub status:        String,
  pub description:   String,
  pub created_at:    DateTime<Utc>,
  pub updated_at:    DateTime<Utc>,
}

impl Engagement {
  /// Days between start and end, or `today` when still ongoing.
  pub fn tenure_days(&self, today: NaiveDate) -> i64 {
    (self.end_date.unwrap_or(today) - self.start_date).num_days()
  }
}

/// A soft-deleted engagement, displaced from the active table.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct TrashEntry {
  #[serde(flatten)]
  pub engagement: Engagement,
  pub deleted_at: DateTime<Utc>,
}

/// Editable fields; the owner is not among them.
#[derive(Debug, Clone, PartialEq, Eq, Deserialize)]
pub struct EngagementFields {
  pub employer:     String,
  pub position:     String,
  pub industry:     String,
  pub location:     String,
  pub salary_range: String,
  pub start_date:   NaiveDate,
  #[serde(default)]
  pub end_date:     Option<NaiveDate>,
  pub status:       String,
  pub description:  String,
}

/// Input to [`crate::lifecycle::Registry::create_engagement`].
#[derive(Debug, Clone, PartialEq, Eq, Deserialize)]
pub struct NewEngagement {
  pub person_id: Uuid,
  #[serde(flatten)]
  pub fields:    EngagementFields,
}

impl EngagementFields {
  pub fn validate(mut self) -> Result<Self> {
    for (name, value) in [
      ("employer", &mut self.employer),
      ("position", &mut self.position),
      ("industry", &mut self.industry),
      ("location", &mut self.location),
      ("salary_range", &mut self.salary_range),
      ("status", &mut self.status),
      ("description", &mut self.description),
    ] {
      *value = value.trim().to_owned();
      if value.is_empty() {
        return Err(Error::validation(format!("{name} is required")));
      }
    }

    if let Some(end) = self.end_date
      && end < self.start_date
    {
      return Err(Error::validation(format!(
        "end_date {end} precedes start_date {}",
        self.start_date
      )));
    }
    Ok(self)
  }

  pub(crate) fn into_engagement(
    self,
    engagement_id: Uuid,
    person_id: Uuid,
    now: DateTime<Utc>,
  ) -> Engagement {
    Engagement {
      engagement_id,
      person_id,
      employer: self.employer,
      position: self.position,
      industry: self.industry,
      location: self.location,
      salary_range: self.salary_range,
      start_date: self.start_date,
      end_date: self.end_date,
      status: self.status,
      description: self.description,
      created_at: now,
      updated_at: now,
    }
  }

  /// Overwrite the editable fields of `existing`, keeping identity, owner
  /// and creation time.
  pub(crate) fn apply_to(self, existing: Engagement, now: DateTime<Utc>) -> Engagement {
    let created_at = existing.created_at;
    let mut updated =
      self.into_engagement(existing.engagement_id, existing.person_id, now);
    updated.created_at = created_at;
    updated
  }
}

#[cfg(test)]
mod tests {
  use super::*;

  fn fields() -> EngagementFields {
    EngagementFields {
      employer:     "PT Nusantara Data".into(),
      position:     "Backend Engineer".into(),
      industry:     "Technology".into(),
      location:     "Surabaya".into(),
      salary_range: "10-15 juta".into(),
      start_date:   NaiveDate::from_ymd_opt(2021, 1, 1).unwrap(),
      end_date:     None,
      status:       "active".into(),
      description:  "Payments platform".into(),
    }
  }

  #[test]
  fn open_ended_is_valid() {
    assert!(fields().validate().is_ok());
  }

  #[test]
  fn end_before_start_rejected() {
    let mut f = fields();
    f.end_date = NaiveDate::from_ymd_opt(2020, 12, 31);
    assert!(matches!(f.validate(), Err(Error::Validation(_))));
  }

  #[test]
  fn same_day_end_is_valid() {
    let mut f = fields();
    f.end_date = Some(f.start_date);
    assert!(f.validate().is_ok());
  }

  #[test]
  fn missing_required_field_named_in_error() {
    let mut f = fields();
    f.salary_range = " ".into();
    match f.validate() {
      Err(Error::Validation(msg)) => assert!(msg.contains("salary_range")),
      other => panic!("expected validation error, got {other:?}"),
    }
  }

  #[test]
  fn tenure_uses_today_when_open_ended() {
    let e = fields().into_engagement(Uuid::new_v4(), Uuid::new_v4(), Utc::now());
    let today = NaiveDate::from_ymd_opt(2022, 1, 1).unwrap();
    assert_eq!(e.tenure_days(today), 365);
  }

  #[test]
  fn new_engagement_body_flattens_fields() {
    let body = serde_json::json!({
      "person_id": Uuid::nil(),
      "employer": "A", "position": "B", "industry": "C", "location": "D",
      "salary_range": "E", "start_date": "2021-01-01",
      "status": "active", "description": "F"
    });
    let parsed: NewEngagement = serde_json::from_value(body).unwrap();
    assert_eq!(parsed.fields.end_date, None);
    assert_eq!(parsed.person_id, Uuid::nil());
  }
}
