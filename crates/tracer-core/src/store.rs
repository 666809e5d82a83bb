//! The `RecordStore` trait.
//!
//! Implemented by storage backends (e.g. `tracer-store-sqlite`). The trait is
//! deliberately dumb: it persists and retrieves rows and performs the
//! multi-row moves as single atomic units. Every authorization and state
//! decision is made by [`crate::lifecycle::Registry`] before it calls in, so a
//! second backend only has to honour the same atomicity contract.

use std::future::Future;

use chrono::{DateTime, NaiveDate, Utc};
use uuid::Uuid;

use crate::{
  account::Account,
  actor::Scope,
  engagement::{Engagement, TrashEntry},
  person::Person,
  query::{EngagementSort, PageRequest, PersonSort},
  upload::StoredFile,
};

/// Abstraction over a tracer storage backend.
///
/// Backend errors convert into [`crate::Error`]. A backend must report a
/// conditional write that matched nothing (the row left the expected state
/// between the registry's check and the write) as [`crate::Error::Conflict`],
/// and a uniqueness violation as [`crate::Error::Validation`].
pub trait RecordStore: Send + Sync {
  type Error: std::error::Error + Send + Sync + 'static + Into<crate::Error>;

  // ── Accounts ──────────────────────────────────────────────────────────

  fn insert_account(
    &self,
    account: Account,
  ) -> impl Future<Output = Result<(), Self::Error>> + Send + '_;

  fn get_account(
    &self,
    id: Uuid,
  ) -> impl Future<Output = Result<Option<Account>, Self::Error>> + Send + '_;

  /// Look up an account whose username OR email equals `login`, regardless
  /// of whether it is active.
  fn find_account_by_login<'a>(
    &'a self,
    login: &'a str,
  ) -> impl Future<Output = Result<Option<Account>, Self::Error>> + Send + 'a;

  // ── Persons ───────────────────────────────────────────────────────────

  fn insert_person(
    &self,
    person: Person,
  ) -> impl Future<Output = Result<(), Self::Error>> + Send + '_;

  /// Retrieve a person. Soft-deleted rows are only returned when
  /// `include_deleted` is set.
  fn get_person(
    &self,
    id: Uuid,
    include_deleted: bool,
  ) -> impl Future<Output = Result<Option<Person>, Self::Error>> + Send + '_;

  /// Overwrite a non-deleted person's editable fields.
  fn update_person(
    &self,
    person: Person,
  ) -> impl Future<Output = Result<(), Self::Error>> + Send + '_;

  /// The person (deleted or not) linked to `account_id`, if any.
  fn person_for_account(
    &self,
    account_id: Uuid,
  ) -> impl Future<Output = Result<Option<Uuid>, Self::Error>> + Send + '_;

  /// In one transaction: mark the person deleted and deactivate the
  /// account. Neither write is visible unless both succeed.
  fn soft_delete_person(
    &self,
    person_id: Uuid,
    account_id: Uuid,
    at: DateTime<Utc>,
  ) -> impl Future<Output = Result<(), Self::Error>> + Send + '_;

  /// In one transaction: clear the deleted flag and reactivate the account.
  fn restore_person(
    &self,
    person_id: Uuid,
    account_id: Uuid,
    at: DateTime<Utc>,
  ) -> impl Future<Output = Result<(), Self::Error>> + Send + '_;

  /// A page of non-deleted persons plus the pre-pagination match count.
  fn list_persons<'a>(
    &'a self,
    req: &'a PageRequest<PersonSort>,
  ) -> impl Future<Output = Result<(Vec<Person>, u64), Self::Error>> + Send + 'a;

  /// Non-deleted persons with no active engagement.
  fn list_persons_without_engagements(
    &self,
  ) -> impl Future<Output = Result<Vec<Person>, Self::Error>> + Send + '_;

  // ── Engagements (active tier) ─────────────────────────────────────────

  fn insert_engagement(
    &self,
    engagement: Engagement,
  ) -> impl Future<Output = Result<(), Self::Error>> + Send + '_;

  fn get_engagement(
    &self,
    id: Uuid,
  ) -> impl Future<Output = Result<Option<Engagement>, Self::Error>> + Send + '_;

  /// Overwrite an active engagement's editable fields.
  fn update_engagement(
    &self,
    engagement: Engagement,
  ) -> impl Future<Output = Result<(), Self::Error>> + Send + '_;

  fn list_engagements<'a>(
    &'a self,
    req: &'a PageRequest<EngagementSort>,
  ) -> impl Future<Output = Result<(Vec<Engagement>, u64), Self::Error>> + Send + 'a;

  fn list_engagements_for_person(
    &self,
    person_id: Uuid,
  ) -> impl Future<Output = Result<Vec<Engagement>, Self::Error>> + Send + '_;

  /// Active engagements lasting more than `min_days`, counting open-ended
  /// ones up to `today`.
  fn list_long_tenure_engagements(
    &self,
    min_days: u32,
    today: NaiveDate,
  ) -> impl Future<Output = Result<Vec<Engagement>, Self::Error>> + Send + '_;

  // ── Trash tier ────────────────────────────────────────────────────────

  /// Atomically move an active engagement into the trash.
  fn trash_engagement(
    &self,
    id: Uuid,
    deleted_at: DateTime<Utc>,
  ) -> impl Future<Output = Result<TrashEntry, Self::Error>> + Send + '_;

  fn get_trash_entry(
    &self,
    id: Uuid,
  ) -> impl Future<Output = Result<Option<TrashEntry>, Self::Error>> + Send + '_;

  fn list_trash(
    &self,
    scope: Scope,
  ) -> impl Future<Output = Result<Vec<TrashEntry>, Self::Error>> + Send + '_;

  /// Atomically move a trash entry back into the active table, stamping
  /// `updated_at` with `restored_at`.
  fn restore_engagement(
    &self,
    id: Uuid,
    restored_at: DateTime<Utc>,
  ) -> impl Future<Output = Result<Engagement, Self::Error>> + Send + '_;

  /// Physically remove a trash entry.
  fn purge_trash_entry(
    &self,
    id: Uuid,
  ) -> impl Future<Output = Result<(), Self::Error>> + Send + '_;

  // ── Files ─────────────────────────────────────────────────────────────

  fn insert_file(
    &self,
    file: StoredFile,
  ) -> impl Future<Output = Result<(), Self::Error>> + Send + '_;

  fn get_file(
    &self,
    id: Uuid,
  ) -> impl Future<Output = Result<Option<StoredFile>, Self::Error>> + Send + '_;

  /// All files, or only those owned by `owner`.
  fn list_files(
    &self,
    owner: Option<Uuid>,
  ) -> impl Future<Output = Result<Vec<StoredFile>, Self::Error>> + Send + '_;

  fn delete_file(
    &self,
    id: Uuid,
  ) -> impl Future<Output = Result<(), Self::Error>> + Send + '_;
}
