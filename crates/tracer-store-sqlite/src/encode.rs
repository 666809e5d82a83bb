//! Encoding and decoding helpers between domain types and the plain-text
//! representations stored in SQLite columns.
//!
//! Timestamps are RFC 3339 with fixed nanosecond precision so they sort
//! lexically and round-trip exactly. Calendar dates are `YYYY-MM-DD`. UUIDs
//! are hyphenated lowercase strings. Booleans are 0/1 integers.

use chrono::{DateTime, NaiveDate, SecondsFormat, Utc};
use tracer_core::{
  account::Account,
  actor::Role,
  engagement::{Engagement, TrashEntry},
  person::Person,
  upload::{StoredFile, UploadKind},
};
use uuid::Uuid;

use crate::{Error, Result};

// ─── Scalars ─────────────────────────────────────────────────────────────────

pub fn encode_uuid(id: Uuid) -> String { id.hyphenated().to_string() }

pub fn decode_uuid(s: &str) -> Result<Uuid> { Ok(Uuid::parse_str(s)?) }

pub fn encode_dt(dt: DateTime<Utc>) -> String {
  dt.to_rfc3339_opts(SecondsFormat::Nanos, true)
}

pub fn decode_dt(s: &str) -> Result<DateTime<Utc>> {
  DateTime::parse_from_rfc3339(s)
    .map(|dt| dt.with_timezone(&Utc))
    .map_err(|e| Error::DateParse(e.to_string()))
}

pub fn encode_date(d: NaiveDate) -> String { d.format("%Y-%m-%d").to_string() }

pub fn decode_date(s: &str) -> Result<NaiveDate> {
  NaiveDate::parse_from_str(s, "%Y-%m-%d").map_err(|e| Error::DateParse(e.to_string()))
}

pub fn decode_role(s: &str) -> Result<Role> {
  s.parse().map_err(|_| Error::Corrupt { column: "role", value: s.to_owned() })
}

pub fn decode_kind(s: &str) -> Result<UploadKind> {
  s.parse().map_err(|_| Error::Corrupt { column: "kind", value: s.to_owned() })
}

/// Lowercased `%term%` for a `fold(col) LIKE … ESCAPE '\'` substring
/// match, or `None` to match everything.
pub fn like_pattern(term: &str) -> Option<String> {
  if term.is_empty() {
    return None;
  }
  let mut out = String::with_capacity(term.len() + 2);
  out.push('%');
  for c in term.to_lowercase().chars() {
    if matches!(c, '%' | '_' | '\\') {
      out.push('\\');
    }
    out.push(c);
  }
  out.push('%');
  Some(out)
}

// ─── Accounts ────────────────────────────────────────────────────────────────

/// Columns selected for an account, joined with its linked person.
pub const ACCOUNT_COLUMNS: &str = "a.account_id, a.username, a.email, a.password_hash, \
   a.role, a.active, a.created_at, p.person_id";

pub struct RawAccount {
  pub account_id:    String,
  pub username:      String,
  pub email:         String,
  pub password_hash: String,
  pub role:          String,
  pub active:        bool,
  pub created_at:    String,
  pub person_id:     Option<String>,
}

impl RawAccount {
  pub fn from_row(row: &rusqlite::Row<'_>) -> rusqlite::Result<Self> {
    Ok(Self {
      account_id:    row.get(0)?,
      username:      row.get(1)?,
      email:         row.get(2)?,
      password_hash: row.get(3)?,
      role:          row.get(4)?,
      active:        row.get(5)?,
      created_at:    row.get(6)?,
      person_id:     row.get(7)?,
    })
  }

  pub fn into_account(self) -> Result<Account> {
    Ok(Account {
      account_id:    decode_uuid(&self.account_id)?,
      username:      self.username,
      email:         self.email,
      password_hash: self.password_hash,
      role:          decode_role(&self.role)?,
      active:        self.active,
      person_id:     self.person_id.as_deref().map(decode_uuid).transpose()?,
      created_at:    decode_dt(&self.created_at)?,
    })
  }
}

// ─── Persons ─────────────────────────────────────────────────────────────────

pub const PERSON_COLUMNS: &str = "person_id, account_id, institution_id, name, program, \
   cohort_year, graduation_year, email, phone, address, deleted, created_at, updated_at";

pub struct RawPerson {
  pub person_id:       String,
  pub account_id:      Option<String>,
  pub institution_id:  String,
  pub name:            String,
  pub program:         String,
  pub cohort_year:     i32,
  pub graduation_year: i32,
  pub email:           String,
  pub phone:           String,
  pub address:         String,
  pub deleted:         bool,
  pub created_at:      String,
  pub updated_at:      String,
}

impl RawPerson {
  pub fn from_row(row: &rusqlite::Row<'_>) -> rusqlite::Result<Self> {
    Ok(Self {
      person_id:       row.get(0)?,
      account_id:      row.get(1)?,
      institution_id:  row.get(2)?,
      name:            row.get(3)?,
      program:         row.get(4)?,
      cohort_year:     row.get(5)?,
      graduation_year: row.get(6)?,
      email:           row.get(7)?,
      phone:           row.get(8)?,
      address:         row.get(9)?,
      deleted:         row.get(10)?,
      created_at:      row.get(11)?,
      updated_at:      row.get(12)?,
    })
  }

  pub fn into_person(self) -> Result<Person> {
    Ok(Person {
      person_id:       decode_uuid(&self.person_id)?,
      account_id:      self.account_id.as_deref().map(decode_uuid).transpose()?,
      institution_id:  self.institution_id,
      name:            self.name,
      program:         self.program,
      cohort_year:     self.cohort_year,
      graduation_year: self.graduation_year,
      email:           self.email,
      phone:           self.phone,
      address:         self.address,
      deleted:         self.deleted,
      created_at:      decode_dt(&self.created_at)?,
      updated_at:      decode_dt(&self.updated_at)?,
    })
  }
}

// ─── Engagements ─────────────────────────────────────────────────────────────

/// Shared by both tiers; the trash table appends `deleted_at`.
pub const ENGAGEMENT_COLUMNS: &str = "engagement_id, person_id, employer, position, \
   industry, location, salary_range, start_date, end_date, status, description, \
   created_at, updated_at";

pub struct RawEngagement {
  pub engagement_id: String,
  pub person_id:     String,
  pub employer:      String,
  pub position:      String,
  pub industry:      String,
  pub location:      String,
  pub salary_range:  String,
  pub start_date:    String,
  pub end_date:      Option<String>,
  pub status:        String,
  pub description:   String,
  pub created_at:    String,
  pub updated_at:    String,
}

impl RawEngagement {
  pub fn from_row(row: &rusqlite::Row<'_>) -> rusqlite::Result<Self> {
    Ok(Self {
      engagement_id: row.get(0)?,
      person_id:     row.get(1)?,
      employer:      row.get(2)?,
      position:      row.get(3)?,
      industry:      row.get(4)?,
      location:      row.get(5)?,
      salary_range:  row.get(6)?,
      start_date:    row.get(7)?,
      end_date:      row.get(8)?,
      status:        row.get(9)?,
      description:   row.get(10)?,
      created_at:    row.get(11)?,
      updated_at:    row.get(12)?,
    })
  }

  pub fn into_engagement(self) -> Result<Engagement> {
    Ok(Engagement {
      engagement_id: decode_uuid(&self.engagement_id)?,
      person_id:     decode_uuid(&self.person_id)?,
      employer:      self.employer,
      position:      self.position,
      industry:      self.industry,
      location:      self.location,
      salary_range:  self.salary_range,
      start_date:    decode_date(&self.start_date)?,
      end_date:      self.end_date.as_deref().map(decode_date).transpose()?,
      status:        self.status,
      description:   self.description,
      created_at:    decode_dt(&self.created_at)?,
      updated_at:    decode_dt(&self.updated_at)?,
    })
  }
}

/// A `trash_engagements` row: engagement columns followed by `deleted_at`.
pub struct RawTrashEntry {
  pub engagement: RawEngagement,
  pub deleted_at: String,
}

impl RawTrashEntry {
  pub fn from_row(row: &rusqlite::Row<'_>) -> rusqlite::Result<Self> {
    Ok(Self {
      engagement: RawEngagement::from_row(row)?,
      deleted_at: row.get(13)?,
    })
  }

  pub fn into_entry(self) -> Result<TrashEntry> {
    Ok(TrashEntry {
      engagement: self.engagement.into_engagement()?,
      deleted_at: decode_dt(&self.deleted_at)?,
    })
  }
}

// ─── Files ───────────────────────────────────────────────────────────────────

pub const FILE_COLUMNS: &str = "file_id, account_id, kind, file_name, original_name, \
   path, size, media_type, content_hash, uploaded_at";

pub struct RawFile {
  pub file_id:       String,
  pub account_id:    String,
  pub kind:          String,
  pub file_name:     String,
  pub original_name: String,
  pub path:          String,
  pub size:          i64,
  pub media_type:    String,
  pub content_hash:  String,
  pub uploaded_at:   String,
}

impl RawFile {
  pub fn from_row(row: &rusqlite::Row<'_>) -> rusqlite::Result<Self> {
    Ok(Self {
      file_id:       row.get(0)?,
      account_id:    row.get(1)?,
      kind:          row.get(2)?,
      file_name:     row.get(3)?,
      original_name: row.get(4)?,
      path:          row.get(5)?,
      size:          row.get(6)?,
      media_type:    row.get(7)?,
      content_hash:  row.get(8)?,
      uploaded_at:   row.get(9)?,
    })
  }

  pub fn into_file(self) -> Result<StoredFile> {
    Ok(StoredFile {
      file_id:       decode_uuid(&self.file_id)?,
      account_id:    decode_uuid(&self.account_id)?,
      kind:          decode_kind(&self.kind)?,
      file_name:     self.file_name,
      original_name: self.original_name,
      path:          self.path,
      size:          u64::try_from(self.size).map_err(|_| Error::Corrupt {
        column: "size",
        value:  self.size.to_string(),
      })?,
      media_type:    self.media_type,
      content_hash:  self.content_hash,
      uploaded_at:   decode_dt(&self.uploaded_at)?,
    })
  }
}
