//! The lifecycle orchestrator.
//!
//! [`Registry`] is the only entry point the HTTP layer uses. Each operation
//! follows the same order: look the target up, run the authorization policy,
//! check the state machine, then hand a single atomic write to the store.
//! A denial or state error therefore never leaves a partial write behind.
//!
//! Engagement tiers:
//!
//! ```text
//! Active ──soft delete──▶ Trashed ──hard delete──▶ Gone
//!    ▲                       │
//!    └────────restore────────┘
//! ```

use std::{future::Future, sync::Arc, time::Duration};

use chrono::Utc;
use uuid::Uuid;

use crate::{
  Error, Result,
  account::{Account, NewAccount},
  actor::{Actor, Role, Scope},
  engagement::{Engagement, EngagementFields, NewEngagement, TrashEntry},
  person::{Person, PersonFields},
  policy::{Operation, ensure},
  query::{EngagementSort, ListParams, Page, PageRequest, PersonSort},
  store::RecordStore,
  upload::{StoredFile, UploadKind, resolve_upload_owner},
};

/// Upper bound on any single store call.
pub const DEFAULT_STORE_TIMEOUT: Duration = Duration::from_secs(5);

/// Tenure threshold used by the long-tenure listing when none is given.
pub const DEFAULT_LONG_TENURE_DAYS: u32 = 365;

pub struct Registry<S> {
  store:   Arc<S>,
  timeout: Duration,
}

impl<S> Clone for Registry<S> {
  fn clone(&self) -> Self {
    Self { store: Arc::clone(&self.store), timeout: self.timeout }
  }
}

impl<S: RecordStore> Registry<S> {
  pub fn new(store: Arc<S>) -> Self {
    Self { store, timeout: DEFAULT_STORE_TIMEOUT }
  }

  pub fn with_timeout(mut self, timeout: Duration) -> Self {
    self.timeout = timeout;
    self
  }

  pub fn store(&self) -> &S { &self.store }

  /// Run a store call under the configured timeout and lift its error into
  /// the core taxonomy.
  async fn call<T>(
    &self,
    fut: impl Future<Output = Result<T, S::Error>>,
  ) -> Result<T> {
    match tokio::time::timeout(self.timeout, fut).await {
      Ok(res) => res.map_err(Into::into),
      Err(_) => {
        tracing::error!(timeout = ?self.timeout, "store call timed out");
        Err(Error::Timeout)
      }
    }
  }

  // ─── Accounts ────────────────────────────────────────────────────────────

  pub async fn create_account(&self, actor: &Actor, input: NewAccount) -> Result<Account> {
    ensure(actor, None, None, Operation::Create, "account")?;
    let account = self.insert_account(input).await?;
    tracing::info!(
      account = %account.account_id,
      username = %account.username,
      role = %account.role,
      by = %actor.account_id,
      "account created"
    );
    Ok(account)
  }

  /// Create the first administrator at startup. Returns `None` when an
  /// account with that username already exists.
  pub async fn bootstrap_admin(&self, mut input: NewAccount) -> Result<Option<Account>> {
    input.role = Role::Admin;
    if self.call(self.store.find_account_by_login(input.username.trim())).await?.is_some() {
      return Ok(None);
    }
    let account = self.insert_account(input).await?;
    tracing::info!(account = %account.account_id, username = %account.username, "bootstrap admin created");
    Ok(Some(account))
  }

  async fn insert_account(&self, input: NewAccount) -> Result<Account> {
    let input = input.validate()?;
    for login in [&input.username, &input.email] {
      if self.call(self.store.find_account_by_login(login)).await?.is_some() {
        return Err(Error::validation(format!("{login:?} is already taken")));
      }
    }

    let account = Account {
      account_id:    Uuid::new_v4(),
      username:      input.username,
      email:         input.email,
      password_hash: input.password_hash,
      role:          input.role,
      active:        true,
      person_id:     None,
      created_at:    Utc::now(),
    };
    self.call(self.store.insert_account(account.clone())).await?;
    Ok(account)
  }

  pub async fn get_account(&self, id: Uuid) -> Result<Account> {
    self
      .call(self.store.get_account(id))
      .await?
      .ok_or_else(|| Error::not_found("account", id))
  }

  /// The active account matching a username or email, for credential
  /// checks. Inactive accounts are indistinguishable from missing ones.
  pub async fn account_for_login(&self, login: &str) -> Result<Option<Account>> {
    let login = login.trim();
    if login.is_empty() {
      return Ok(None);
    }
    Ok(
      self
        .call(self.store.find_account_by_login(login))
        .await?
        .filter(|a| a.active),
    )
  }

  // ─── Persons ─────────────────────────────────────────────────────────────

  pub async fn create_person(&self, actor: &Actor, fields: PersonFields) -> Result<Person> {
    ensure(actor, None, None, Operation::Create, "person")?;
    let fields = fields.validate()?;
    self.check_account_link(fields.account_id, None).await?;

    let person = fields.into_person(Uuid::new_v4(), Utc::now());
    self.call(self.store.insert_person(person.clone())).await?;
    tracing::info!(person = %person.person_id, by = %actor.account_id, "person created");
    Ok(person)
  }

  pub async fn get_person(&self, id: Uuid) -> Result<Person> {
    self
      .call(self.store.get_person(id, false))
      .await?
      .ok_or_else(|| Error::not_found("person", id))
  }

  pub async fn update_person(
    &self,
    actor: &Actor,
    id: Uuid,
    fields: PersonFields,
  ) -> Result<Person> {
    ensure(actor, None, None, Operation::Update, "person")?;
    let existing = self.get_person(id).await?;
    let fields = fields.validate()?;
    self.check_account_link(fields.account_id, Some(id)).await?;

    let mut person = fields.into_person(id, Utc::now());
    person.created_at = existing.created_at;
    self.call(self.store.update_person(person.clone())).await?;
    tracing::info!(person = %id, by = %actor.account_id, "person updated");
    Ok(person)
  }

  /// Soft-delete a person and deactivate the linked account, atomically.
  pub async fn soft_delete_person(&self, actor: &Actor, id: Uuid) -> Result<()> {
    let person = self.get_person(id).await?;
    ensure(
      actor,
      Some(actor.account_id),
      person.account_id,
      Operation::SoftDelete,
      "person",
    )?;
    let account_id = person.account_id.ok_or_else(|| {
      Error::InvalidState(format!("person {id} has no linked account to deactivate"))
    })?;

    self
      .call(self.store.soft_delete_person(id, account_id, Utc::now()))
      .await?;
    tracing::info!(person = %id, account = %account_id, by = %actor.account_id, "person soft-deleted");
    Ok(())
  }

  /// Undo [`Self::soft_delete_person`], reactivating the linked account.
  pub async fn restore_person(&self, actor: &Actor, id: Uuid) -> Result<()> {
    let person = self
      .call(self.store.get_person(id, true))
      .await?
      .ok_or_else(|| Error::not_found("person", id))?;
    ensure(
      actor,
      Some(actor.account_id),
      person.account_id,
      Operation::Restore,
      "person",
    )?;
    if !person.deleted {
      return Err(Error::InvalidState(format!("person {id} is not deleted")));
    }
    let account_id = person.account_id.ok_or_else(|| {
      Error::InvalidState(format!("person {id} has no linked account to reactivate"))
    })?;

    self
      .call(self.store.restore_person(id, account_id, Utc::now()))
      .await?;
    tracing::info!(person = %id, account = %account_id, by = %actor.account_id, "person restored");
    Ok(())
  }

  pub async fn list_persons(&self, params: &ListParams) -> Result<Page<Person>> {
    let req: PageRequest<PersonSort> = params.normalize();
    tracing::debug!(?req, "listing persons");
    let (data, total) = self.call(self.store.list_persons(&req)).await?;
    Ok(Page { data, meta: req.meta(total) })
  }

  pub async fn list_persons_without_engagements(&self) -> Result<Vec<Person>> {
    self.call(self.store.list_persons_without_engagements()).await
  }

  /// Enforce that an account exists, is an alumni account, and is linked to
  /// at most one person (`person_id` being the one allowed to hold it).
  async fn check_account_link(
    &self,
    account_id: Option<Uuid>,
    person_id: Option<Uuid>,
  ) -> Result<()> {
    let Some(account_id) = account_id else {
      return Ok(());
    };
    let account = self
      .call(self.store.get_account(account_id))
      .await?
      .ok_or_else(|| Error::validation(format!("account {account_id} does not exist")))?;
    if account.role != Role::Alumni {
      return Err(Error::validation(format!(
        "account {account_id} is not an alumni account"
      )));
    }
    match self.call(self.store.person_for_account(account_id)).await? {
      Some(holder) if Some(holder) != person_id => Err(Error::validation(format!(
        "account {account_id} is already linked to person {holder}"
      ))),
      _ => Ok(()),
    }
  }

  // ─── Engagements ─────────────────────────────────────────────────────────

  pub async fn create_engagement(
    &self,
    actor: &Actor,
    input: NewEngagement,
  ) -> Result<Engagement> {
    ensure(actor, None, None, Operation::Create, "engagement")?;
    let fields = input.fields.validate()?;
    if self.call(self.store.get_person(input.person_id, false)).await?.is_none() {
      return Err(Error::validation(format!(
        "person {} does not exist",
        input.person_id
      )));
    }

    let engagement = fields.into_engagement(Uuid::new_v4(), input.person_id, Utc::now());
    self.call(self.store.insert_engagement(engagement.clone())).await?;
    tracing::info!(
      engagement = %engagement.engagement_id,
      person = %engagement.person_id,
      by = %actor.account_id,
      "engagement created"
    );
    Ok(engagement)
  }

  pub async fn get_engagement(&self, id: Uuid) -> Result<Engagement> {
    self
      .call(self.store.get_engagement(id))
      .await?
      .ok_or_else(|| Error::not_found("engagement", id))
  }

  pub async fn update_engagement(
    &self,
    actor: &Actor,
    id: Uuid,
    fields: EngagementFields,
  ) -> Result<Engagement> {
    ensure(actor, None, None, Operation::Update, "engagement")?;
    let existing = self.get_engagement(id).await?;
    let updated = fields.validate()?.apply_to(existing, Utc::now());
    self.call(self.store.update_engagement(updated.clone())).await?;
    tracing::info!(engagement = %id, by = %actor.account_id, "engagement updated");
    Ok(updated)
  }

  /// Move an active engagement into the trash.
  pub async fn soft_delete_engagement(&self, actor: &Actor, id: Uuid) -> Result<TrashEntry> {
    let engagement = self.get_engagement(id).await?;
    ensure(
      actor,
      actor.person_id,
      Some(engagement.person_id),
      Operation::SoftDelete,
      "engagement",
    )?;

    let entry = self.call(self.store.trash_engagement(id, Utc::now())).await?;
    tracing::info!(engagement = %id, by = %actor.account_id, "engagement moved to trash");
    Ok(entry)
  }

  /// Move a trashed engagement back into the active table.
  pub async fn restore_engagement(&self, actor: &Actor, id: Uuid) -> Result<Engagement> {
    let entry = self.get_trash_entry(id).await?;
    ensure(
      actor,
      actor.person_id,
      Some(entry.engagement.person_id),
      Operation::Restore,
      "engagement",
    )?;

    let engagement = self.call(self.store.restore_engagement(id, Utc::now())).await?;
    tracing::info!(engagement = %id, by = %actor.account_id, "engagement restored from trash");
    Ok(engagement)
  }

  /// Permanently remove a trashed engagement. Active engagements must be
  /// soft-deleted first.
  pub async fn hard_delete_engagement(&self, actor: &Actor, id: Uuid) -> Result<()> {
    let entry = match self.call(self.store.get_trash_entry(id)).await? {
      Some(entry) => entry,
      None if self.call(self.store.get_engagement(id)).await?.is_some() => {
        return Err(Error::InvalidState(format!(
          "engagement {id} is active; move it to the trash first"
        )));
      }
      None => return Err(Error::not_found("trash entry", id)),
    };
    ensure(
      actor,
      actor.person_id,
      Some(entry.engagement.person_id),
      Operation::HardDelete,
      "engagement",
    )?;

    self.call(self.store.purge_trash_entry(id)).await?;
    tracing::info!(engagement = %id, by = %actor.account_id, "trash entry purged");
    Ok(())
  }

  async fn get_trash_entry(&self, id: Uuid) -> Result<TrashEntry> {
    self
      .call(self.store.get_trash_entry(id))
      .await?
      .ok_or_else(|| Error::not_found("trash entry", id))
  }

  /// Trash entries visible to `actor`: everything for admins, their own
  /// engagements otherwise.
  pub async fn list_trash(&self, actor: &Actor) -> Result<Vec<TrashEntry>> {
    match actor.person_scope() {
      Scope::Nothing => Ok(Vec::new()),
      scope => self.call(self.store.list_trash(scope)).await,
    }
  }

  pub async fn list_engagements(&self, params: &ListParams) -> Result<Page<Engagement>> {
    let req: PageRequest<EngagementSort> = params.normalize();
    tracing::debug!(?req, "listing engagements");
    let (data, total) = self.call(self.store.list_engagements(&req)).await?;
    Ok(Page { data, meta: req.meta(total) })
  }

  /// Engagements of one person. Admins may look at anyone; alumni only at
  /// themselves.
  pub async fn list_engagements_for_person(
    &self,
    actor: &Actor,
    person_id: Uuid,
  ) -> Result<Vec<Engagement>> {
    if !actor.is_admin() && actor.person_id != Some(person_id) {
      return Err(Error::Forbidden(
        "only administrators may list another person's engagements".into(),
      ));
    }
    self.get_person(person_id).await?;
    self.call(self.store.list_engagements_for_person(person_id)).await
  }

  pub async fn list_long_tenure_engagements(&self, min_days: Option<u32>) -> Result<Vec<Engagement>> {
    let min_days = min_days.unwrap_or(DEFAULT_LONG_TENURE_DAYS);
    let today = Utc::now().date_naive();
    self
      .call(self.store.list_long_tenure_engagements(min_days, today))
      .await
  }

  // ─── Files ───────────────────────────────────────────────────────────────

  /// Check an upload before any bytes are written. Returns the account the
  /// file will be filed under.
  pub async fn authorize_upload(
    &self,
    actor: &Actor,
    requested_owner: Option<Uuid>,
    kind: UploadKind,
    media_type: &str,
    size: u64,
  ) -> Result<Uuid> {
    let owner = resolve_upload_owner(actor, requested_owner)?;
    kind.check(media_type, size)?;
    if self.call(self.store.get_account(owner)).await?.is_none() {
      return Err(Error::validation(format!("account {owner} does not exist")));
    }
    Ok(owner)
  }

  pub async fn record_file(&self, file: StoredFile) -> Result<StoredFile> {
    self.call(self.store.insert_file(file.clone())).await?;
    tracing::info!(file = %file.file_id, account = %file.account_id, kind = file.kind.as_ref(), "file recorded");
    Ok(file)
  }

  pub async fn list_files(&self, actor: &Actor) -> Result<Vec<StoredFile>> {
    let owner = (!actor.is_admin()).then_some(actor.account_id);
    self.call(self.store.list_files(owner)).await
  }

  /// A file visible to `actor`; other accounts' files read as missing.
  pub async fn get_file(&self, actor: &Actor, id: Uuid) -> Result<StoredFile> {
    self
      .call(self.store.get_file(id))
      .await?
      .filter(|f| actor.is_admin() || f.account_id == actor.account_id)
      .ok_or_else(|| Error::not_found("file", id))
  }

  /// Remove a file's metadata and return it so the caller can remove the
  /// bytes.
  pub async fn delete_file(&self, actor: &Actor, id: Uuid) -> Result<StoredFile> {
    let file = self
      .call(self.store.get_file(id))
      .await?
      .ok_or_else(|| Error::not_found("file", id))?;
    ensure(
      actor,
      Some(actor.account_id),
      Some(file.account_id),
      Operation::HardDelete,
      "file",
    )?;
    self.call(self.store.delete_file(id)).await?;
    tracing::info!(file = %id, by = %actor.account_id, "file deleted");
    Ok(file)
  }
}
