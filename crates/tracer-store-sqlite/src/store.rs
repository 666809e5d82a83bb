//! [`SqliteStore`] — the SQLite implementation of [`RecordStore`].

use std::path::Path;

use chrono::{DateTime, NaiveDate, Utc};
use rusqlite::{OptionalExtension as _, TransactionBehavior, functions::FunctionFlags};
use uuid::Uuid;

use tracer_core::{
  account::Account,
  actor::Scope,
  engagement::{Engagement, TrashEntry},
  person::Person,
  query::{EngagementSort, PageRequest, PersonSort, SortKey},
  store::RecordStore,
  upload::StoredFile,
};

use crate::{
  Error, Result,
  encode::{
    ACCOUNT_COLUMNS, ENGAGEMENT_COLUMNS, FILE_COLUMNS, PERSON_COLUMNS, RawAccount,
    RawEngagement, RawFile, RawPerson, RawTrashEntry, encode_date, encode_dt, encode_uuid,
    like_pattern,
  },
  error::is_unique_violation,
  schema::SCHEMA,
};

// ─── Store ───────────────────────────────────────────────────────────────────

/// A tracer record store backed by a single SQLite file.
///
/// Cloning is cheap — the inner connection is reference-counted. All calls
/// are serialised through one connection thread, and multi-row transitions
/// additionally take an `IMMEDIATE` write lock so concurrent processes on the
/// same file cannot interleave.
#[derive(Clone)]
pub struct SqliteStore {
  conn: tokio_rusqlite::Connection,
}

/// Outcome of a conditional multi-row write, decided inside the transaction.
enum Moved<T> {
  Done(T),
  /// Nothing matched; the transaction was rolled back.
  Missed,
}

impl SqliteStore {
  /// Open (or create) a store at `path` and run schema initialisation.
  pub async fn open(path: impl AsRef<Path>) -> Result<Self> {
    let conn = tokio_rusqlite::Connection::open(path).await?;
    let store = Self { conn };
    store.init_schema().await?;
    Ok(store)
  }

  /// Open an in-memory store — useful for testing.
  pub async fn open_in_memory() -> Result<Self> {
    let conn = tokio_rusqlite::Connection::open_in_memory().await?;
    let store = Self { conn };
    store.init_schema().await?;
    Ok(store)
  }

  async fn init_schema(&self) -> Result<()> {
    self
      .conn
      .call(|conn| {
        register_functions(conn)?;
        conn.execute_batch(SCHEMA)?;
        Ok(())
      })
      .await?;
    Ok(())
  }

  /// Run arbitrary SQL. Tests use it to install failure-injection triggers.
  #[cfg(test)]
  pub(crate) async fn execute_raw(&self, sql: &'static str) -> Result<()> {
    self
      .conn
      .call(move |conn| {
        conn.execute_batch(sql)?;
        Ok(())
      })
      .await?;
    Ok(())
  }

  /// Occupy the connection thread for `dur`, simulating a stalled database.
  #[cfg(test)]
  pub(crate) async fn stall(&self, dur: std::time::Duration) -> Result<()> {
    self
      .conn
      .call(move |_| {
        std::thread::sleep(dur);
        Ok(())
      })
      .await?;
    Ok(())
  }

  async fn query_persons(
    &self,
    sql: String,
    params: Vec<rusqlite::types::Value>,
  ) -> Result<Vec<Person>> {
    let raws: Vec<RawPerson> = self
      .conn
      .call(move |conn| {
        let mut stmt = conn.prepare(&sql)?;
        let rows = stmt
          .query_map(rusqlite::params_from_iter(params), RawPerson::from_row)?
          .collect::<rusqlite::Result<Vec<_>>>()?;
        Ok(rows)
      })
      .await?;
    raws.into_iter().map(RawPerson::into_person).collect()
  }

  async fn query_engagements(
    &self,
    sql: String,
    params: Vec<rusqlite::types::Value>,
  ) -> Result<Vec<Engagement>> {
    let raws: Vec<RawEngagement> = self
      .conn
      .call(move |conn| {
        let mut stmt = conn.prepare(&sql)?;
        let rows = stmt
          .query_map(rusqlite::params_from_iter(params), RawEngagement::from_row)?
          .collect::<rusqlite::Result<Vec<_>>>()?;
        Ok(rows)
      })
      .await?;
    raws.into_iter().map(RawEngagement::into_engagement).collect()
  }

  /// Shared body of the two paginated listings.
  ///
  /// `base_filter` is a fixed SQL fragment; the search term is bound as a
  /// parameter and the sort column comes from a closed allow-list.
  async fn paginate<K, R>(
    &self,
    table: &'static str,
    columns: &'static str,
    base_filter: &'static str,
    tiebreak: &'static str,
    req: &PageRequest<K>,
    map: fn(&rusqlite::Row<'_>) -> rusqlite::Result<R>,
  ) -> Result<(Vec<R>, u64)>
  where
    K: SortKey,
    R: Send + 'static,
  {
    let search_clause = K::SEARCH_COLUMNS
      .iter()
      .map(|c| format!("fold({c}) LIKE ?1 ESCAPE '\\'"))
      .collect::<Vec<_>>()
      .join(" OR ");
    let where_clause = format!("{base_filter} AND (?1 IS NULL OR {search_clause})");

    let list_sql = format!(
      "SELECT {columns} FROM {table}
       WHERE {where_clause}
       ORDER BY {sort} COLLATE NOCASE {dir}, {tiebreak} ASC
       LIMIT ?2 OFFSET ?3",
      sort = req.sort.column(),
      dir = req.order.as_sql(),
    );
    let count_sql = format!("SELECT COUNT(*) FROM {table} WHERE {where_clause}");

    let pattern = like_pattern(&req.search);
    let limit = i64::from(req.limit);
    let offset = i64::try_from(req.offset()).unwrap_or(i64::MAX);

    let (rows, total): (Vec<R>, i64) = self
      .conn
      .call(move |conn| {
        let rows = conn
          .prepare(&list_sql)?
          .query_map(rusqlite::params![pattern, limit, offset], map)?
          .collect::<rusqlite::Result<Vec<_>>>()?;
        let total = conn.query_row(&count_sql, rusqlite::params![pattern], |r| r.get(0))?;
        Ok((rows, total))
      })
      .await?;

    Ok((rows, u64::try_from(total).unwrap_or_default()))
  }
}

/// Install `fold(text)`, a Unicode lowercase used for case-insensitive
/// search. SQLite's own `LIKE` and `lower()` only fold ASCII.
fn register_functions(conn: &rusqlite::Connection) -> rusqlite::Result<()> {
  conn.create_scalar_function(
    "fold",
    1,
    FunctionFlags::SQLITE_UTF8 | FunctionFlags::SQLITE_DETERMINISTIC,
    |ctx| {
      let text: Option<String> = ctx.get(0)?;
      Ok(text.map(|t| t.to_lowercase()))
    },
  )
}

// ─── RecordStore impl ────────────────────────────────────────────────────────

impl RecordStore for SqliteStore {
  type Error = Error;

  // ── Accounts ──────────────────────────────────────────────────────────────

  async fn insert_account(&self, account: Account) -> Result<()> {
    let id_str = encode_uuid(account.account_id);
    let at_str = encode_dt(account.created_at);
    let role_str = account.role.as_ref().to_owned();

    self
      .conn
      .call(move |conn| {
        conn.execute(
          "INSERT INTO accounts
             (account_id, username, email, password_hash, role, active, created_at)
           VALUES (?1, ?2, ?3, ?4, ?5, ?6, ?7)",
          rusqlite::params![
            id_str,
            account.username,
            account.email,
            account.password_hash,
            role_str,
            account.active,
            at_str,
          ],
        )?;
        Ok(())
      })
      .await?;
    Ok(())
  }

  async fn get_account(&self, id: Uuid) -> Result<Option<Account>> {
    let id_str = encode_uuid(id);

    let raw: Option<RawAccount> = self
      .conn
      .call(move |conn| {
        Ok(
          conn
            .query_row(
              &format!(
                "SELECT {ACCOUNT_COLUMNS} FROM accounts a
                 LEFT JOIN persons p ON p.account_id = a.account_id
                 WHERE a.account_id = ?1"
              ),
              rusqlite::params![id_str],
              RawAccount::from_row,
            )
            .optional()?,
        )
      })
      .await?;

    raw.map(RawAccount::into_account).transpose()
  }

  async fn find_account_by_login(&self, login: &str) -> Result<Option<Account>> {
    let login = login.to_owned();

    let raw: Option<RawAccount> = self
      .conn
      .call(move |conn| {
        Ok(
          conn
            .query_row(
              &format!(
                "SELECT {ACCOUNT_COLUMNS} FROM accounts a
                 LEFT JOIN persons p ON p.account_id = a.account_id
                 WHERE a.username = ?1 OR a.email = ?1
                 LIMIT 1"
              ),
              rusqlite::params![login],
              RawAccount::from_row,
            )
            .optional()?,
        )
      })
      .await?;

    raw.map(RawAccount::into_account).transpose()
  }

  // ── Persons ───────────────────────────────────────────────────────────────

  async fn insert_person(&self, person: Person) -> Result<()> {
    let id_str = encode_uuid(person.person_id);
    let account_str = person.account_id.map(encode_uuid);
    let created_str = encode_dt(person.created_at);
    let updated_str = encode_dt(person.updated_at);

    self
      .conn
      .call(move |conn| {
        conn.execute(
          &format!(
            "INSERT INTO persons ({PERSON_COLUMNS})
             VALUES (?1, ?2, ?3, ?4, ?5, ?6, ?7, ?8, ?9, ?10, ?11, ?12, ?13)"
          ),
          rusqlite::params![
            id_str,
            account_str,
            person.institution_id,
            person.name,
            person.program,
            person.cohort_year,
            person.graduation_year,
            person.email,
            person.phone,
            person.address,
            person.deleted,
            created_str,
            updated_str,
          ],
        )?;
        Ok(())
      })
      .await?;
    Ok(())
  }

  async fn get_person(&self, id: Uuid, include_deleted: bool) -> Result<Option<Person>> {
    let id_str = encode_uuid(id);

    let raw: Option<RawPerson> = self
      .conn
      .call(move |conn| {
        Ok(
          conn
            .query_row(
              &format!(
                "SELECT {PERSON_COLUMNS} FROM persons
                 WHERE person_id = ?1 AND (?2 OR deleted = 0)"
              ),
              rusqlite::params![id_str, include_deleted],
              RawPerson::from_row,
            )
            .optional()?,
        )
      })
      .await?;

    raw.map(RawPerson::into_person).transpose()
  }

  async fn update_person(&self, person: Person) -> Result<()> {
    let person_id = person.person_id;
    let id_str = encode_uuid(person.person_id);
    let account_str = person.account_id.map(encode_uuid);
    let updated_str = encode_dt(person.updated_at);

    let changed = self
      .conn
      .call(move |conn| {
        Ok(conn.execute(
          "UPDATE persons SET
             account_id = ?2, institution_id = ?3, name = ?4, program = ?5,
             cohort_year = ?6, graduation_year = ?7, email = ?8, phone = ?9,
             address = ?10, updated_at = ?11
           WHERE person_id = ?1 AND deleted = 0",
          rusqlite::params![
            id_str,
            account_str,
            person.institution_id,
            person.name,
            person.program,
            person.cohort_year,
            person.graduation_year,
            person.email,
            person.phone,
            person.address,
            updated_str,
          ],
        )?)
      })
      .await?;

    if changed == 0 {
      return Err(Error::Conflict(format!("person {person_id} was deleted concurrently")));
    }
    Ok(())
  }

  async fn person_for_account(&self, account_id: Uuid) -> Result<Option<Uuid>> {
    let id_str = encode_uuid(account_id);

    let raw: Option<String> = self
      .conn
      .call(move |conn| {
        Ok(
          conn
            .query_row(
              "SELECT person_id FROM persons WHERE account_id = ?1",
              rusqlite::params![id_str],
              |r| r.get(0),
            )
            .optional()?,
        )
      })
      .await?;

    raw.map(|s| Uuid::parse_str(&s)).transpose().map_err(Error::Uuid)
  }

  async fn soft_delete_person(
    &self,
    person_id: Uuid,
    account_id: Uuid,
    at: DateTime<Utc>,
  ) -> Result<()> {
    self
      .flip_person(person_id, account_id, at, true)
      .await?
      .ok_or_else(|| {
        Error::Conflict(format!("person {person_id} is no longer active"))
      })
  }

  async fn restore_person(
    &self,
    person_id: Uuid,
    account_id: Uuid,
    at: DateTime<Utc>,
  ) -> Result<()> {
    self
      .flip_person(person_id, account_id, at, false)
      .await?
      .ok_or_else(|| {
        Error::Conflict(format!("person {person_id} is no longer deleted"))
      })
  }

  async fn list_persons(&self, req: &PageRequest<PersonSort>) -> Result<(Vec<Person>, u64)> {
    let (rows, total) = self
      .paginate("persons", PERSON_COLUMNS, "deleted = 0", "person_id", req, RawPerson::from_row)
      .await?;
    let persons = rows.into_iter().map(RawPerson::into_person).collect::<Result<_>>()?;
    Ok((persons, total))
  }

  async fn list_persons_without_engagements(&self) -> Result<Vec<Person>> {
    self
      .query_persons(
        format!(
          "SELECT {PERSON_COLUMNS} FROM persons p
           WHERE p.deleted = 0
             AND NOT EXISTS (SELECT 1 FROM engagements e WHERE e.person_id = p.person_id)
           ORDER BY p.name COLLATE NOCASE, p.person_id"
        ),
        Vec::new(),
      )
      .await
  }

  // ── Engagements ───────────────────────────────────────────────────────────

  async fn insert_engagement(&self, engagement: Engagement) -> Result<()> {
    let id_str = encode_uuid(engagement.engagement_id);
    let person_str = encode_uuid(engagement.person_id);
    let start_str = encode_date(engagement.start_date);
    let end_str = engagement.end_date.map(encode_date);
    let created_str = encode_dt(engagement.created_at);
    let updated_str = encode_dt(engagement.updated_at);

    self
      .conn
      .call(move |conn| {
        conn.execute(
          &format!(
            "INSERT INTO engagements ({ENGAGEMENT_COLUMNS})
             VALUES (?1, ?2, ?3, ?4, ?5, ?6, ?7, ?8, ?9, ?10, ?11, ?12, ?13)"
          ),
          rusqlite::params![
            id_str,
            person_str,
            engagement.employer,
            engagement.position,
            engagement.industry,
            engagement.location,
            engagement.salary_range,
            start_str,
            end_str,
            engagement.status,
            engagement.description,
            created_str,
            updated_str,
          ],
        )?;
        Ok(())
      })
      .await?;
    Ok(())
  }

  async fn get_engagement(&self, id: Uuid) -> Result<Option<Engagement>> {
    let id_str = encode_uuid(id);

    let raw: Option<RawEngagement> = self
      .conn
      .call(move |conn| {
        Ok(
          conn
            .query_row(
              &format!("SELECT {ENGAGEMENT_COLUMNS} FROM engagements WHERE engagement_id = ?1"),
              rusqlite::params![id_str],
              RawEngagement::from_row,
            )
            .optional()?,
        )
      })
      .await?;

    raw.map(RawEngagement::into_engagement).transpose()
  }

  async fn update_engagement(&self, engagement: Engagement) -> Result<()> {
    let engagement_id = engagement.engagement_id;
    let id_str = encode_uuid(engagement.engagement_id);
    let start_str = encode_date(engagement.start_date);
    let end_str = engagement.end_date.map(encode_date);
    let updated_str = encode_dt(engagement.updated_at);

    let changed = self
      .conn
      .call(move |conn| {
        Ok(conn.execute(
          "UPDATE engagements SET
             employer = ?2, position = ?3, industry = ?4, location = ?5,
             salary_range = ?6, start_date = ?7, end_date = ?8, status = ?9,
             description = ?10, updated_at = ?11
           WHERE engagement_id = ?1",
          rusqlite::params![
            id_str,
            engagement.employer,
            engagement.position,
            engagement.industry,
            engagement.location,
            engagement.salary_range,
            start_str,
            end_str,
            engagement.status,
            engagement.description,
            updated_str,
          ],
        )?)
      })
      .await?;

    if changed == 0 {
      return Err(Error::Conflict(format!(
        "engagement {engagement_id} was moved to the trash concurrently"
      )));
    }
    Ok(())
  }

  async fn list_engagements(
    &self,
    req: &PageRequest<EngagementSort>,
  ) -> Result<(Vec<Engagement>, u64)> {
    let (rows, total) = self
      .paginate(
        "engagements",
        ENGAGEMENT_COLUMNS,
        "1 = 1",
        "engagement_id",
        req,
        RawEngagement::from_row,
      )
      .await?;
    let engagements = rows
      .into_iter()
      .map(RawEngagement::into_engagement)
      .collect::<Result<_>>()?;
    Ok((engagements, total))
  }

  async fn list_engagements_for_person(&self, person_id: Uuid) -> Result<Vec<Engagement>> {
    self
      .query_engagements(
        format!(
          "SELECT {ENGAGEMENT_COLUMNS} FROM engagements
           WHERE person_id = ?1
           ORDER BY start_date, engagement_id"
        ),
        vec![encode_uuid(person_id).into()],
      )
      .await
  }

  async fn list_long_tenure_engagements(
    &self,
    min_days: u32,
    today: NaiveDate,
  ) -> Result<Vec<Engagement>> {
    self
      .query_engagements(
        format!(
          "SELECT {ENGAGEMENT_COLUMNS} FROM engagements
           WHERE julianday(COALESCE(end_date, ?2)) - julianday(start_date) > ?1
           ORDER BY start_date, engagement_id"
        ),
        vec![i64::from(min_days).into(), encode_date(today).into()],
      )
      .await
  }

  // ── Trash tier ────────────────────────────────────────────────────────────

  async fn trash_engagement(&self, id: Uuid, deleted_at: DateTime<Utc>) -> Result<TrashEntry> {
    let id_str = encode_uuid(id);
    let at_str = encode_dt(deleted_at);

    let moved = self
      .conn
      .call(move |conn| {
        let tx = conn.transaction_with_behavior(TransactionBehavior::Immediate)?;

        let copied = match tx.execute(
          &format!(
            "INSERT INTO trash_engagements ({ENGAGEMENT_COLUMNS}, deleted_at)
             SELECT {ENGAGEMENT_COLUMNS}, ?2 FROM engagements WHERE engagement_id = ?1"
          ),
          rusqlite::params![id_str, at_str],
        ) {
          Ok(n) => n,
          Err(e) if is_unique_violation(&e) => return Ok(Moved::Missed),
          Err(e) => return Err(e.into()),
        };
        if copied == 0 {
          return Ok(Moved::Missed);
        }

        let removed = tx.execute(
          "DELETE FROM engagements WHERE engagement_id = ?1",
          rusqlite::params![id_str],
        )?;
        if removed != 1 {
          return Ok(Moved::Missed);
        }

        let raw = tx.query_row(
          &format!(
            "SELECT {ENGAGEMENT_COLUMNS}, deleted_at FROM trash_engagements
             WHERE engagement_id = ?1"
          ),
          rusqlite::params![id_str],
          RawTrashEntry::from_row,
        )?;
        tx.commit()?;
        Ok(Moved::Done(raw))
      })
      .await?;

    match moved {
      Moved::Done(raw) => raw.into_entry(),
      Moved::Missed => {
        tracing::debug!(engagement = %id, "trash move matched no active row");
        Err(Error::Conflict(format!("engagement {id} is no longer active")))
      }
    }
  }

  async fn get_trash_entry(&self, id: Uuid) -> Result<Option<TrashEntry>> {
    let id_str = encode_uuid(id);

    let raw: Option<RawTrashEntry> = self
      .conn
      .call(move |conn| {
        Ok(
          conn
            .query_row(
              &format!(
                "SELECT {ENGAGEMENT_COLUMNS}, deleted_at FROM trash_engagements
                 WHERE engagement_id = ?1"
              ),
              rusqlite::params![id_str],
              RawTrashEntry::from_row,
            )
            .optional()?,
        )
      })
      .await?;

    raw.map(RawTrashEntry::into_entry).transpose()
  }

  async fn list_trash(&self, scope: Scope) -> Result<Vec<TrashEntry>> {
    let owner = match scope {
      Scope::Everything => None,
      Scope::Owner(id) => Some(encode_uuid(id)),
      Scope::Nothing => return Ok(Vec::new()),
    };

    let raws: Vec<RawTrashEntry> = self
      .conn
      .call(move |conn| {
        let mut stmt = conn.prepare(&format!(
          "SELECT {ENGAGEMENT_COLUMNS}, deleted_at FROM trash_engagements
           WHERE ?1 IS NULL OR person_id = ?1
           ORDER BY deleted_at DESC, engagement_id"
        ))?;
        let rows = stmt
          .query_map(rusqlite::params![owner], RawTrashEntry::from_row)?
          .collect::<rusqlite::Result<Vec<_>>>()?;
        Ok(rows)
      })
      .await?;

    raws.into_iter().map(RawTrashEntry::into_entry).collect()
  }

  async fn restore_engagement(&self, id: Uuid, restored_at: DateTime<Utc>) -> Result<Engagement> {
    let id_str = encode_uuid(id);
    let at_str = encode_dt(restored_at);

    let moved = self
      .conn
      .call(move |conn| {
        let tx = conn.transaction_with_behavior(TransactionBehavior::Immediate)?;

        // Same columns, except updated_at takes the restore time.
        let copied = match tx.execute(
          &format!(
            "INSERT INTO engagements ({ENGAGEMENT_COLUMNS})
             SELECT engagement_id, person_id, employer, position, industry, location,
                    salary_range, start_date, end_date, status, description,
                    created_at, ?2
             FROM trash_engagements WHERE engagement_id = ?1"
          ),
          rusqlite::params![id_str, at_str],
        ) {
          Ok(n) => n,
          Err(e) if is_unique_violation(&e) => return Ok(Moved::Missed),
          Err(e) => return Err(e.into()),
        };
        if copied == 0 {
          return Ok(Moved::Missed);
        }

        let removed = tx.execute(
          "DELETE FROM trash_engagements WHERE engagement_id = ?1",
          rusqlite::params![id_str],
        )?;
        if removed != 1 {
          return Ok(Moved::Missed);
        }

        let raw = tx.query_row(
          &format!("SELECT {ENGAGEMENT_COLUMNS} FROM engagements WHERE engagement_id = ?1"),
          rusqlite::params![id_str],
          RawEngagement::from_row,
        )?;
        tx.commit()?;
        Ok(Moved::Done(raw))
      })
      .await?;

    match moved {
      Moved::Done(raw) => raw.into_engagement(),
      Moved::Missed => {
        tracing::debug!(engagement = %id, "restore matched no trash row");
        Err(Error::Conflict(format!("engagement {id} is no longer in the trash")))
      }
    }
  }

  async fn purge_trash_entry(&self, id: Uuid) -> Result<()> {
    let id_str = encode_uuid(id);

    let removed = self
      .conn
      .call(move |conn| {
        Ok(conn.execute(
          "DELETE FROM trash_engagements WHERE engagement_id = ?1",
          rusqlite::params![id_str],
        )?)
      })
      .await?;

    if removed == 0 {
      return Err(Error::Conflict(format!("engagement {id} is no longer in the trash")));
    }
    Ok(())
  }

  // ── Files ─────────────────────────────────────────────────────────────────

  async fn insert_file(&self, file: StoredFile) -> Result<()> {
    let id_str = encode_uuid(file.file_id);
    let account_str = encode_uuid(file.account_id);
    let kind_str = file.kind.as_ref().to_owned();
    let size = i64::try_from(file.size).map_err(|_| Error::Corrupt {
      column: "size",
      value:  file.size.to_string(),
    })?;
    let at_str = encode_dt(file.uploaded_at);

    self
      .conn
      .call(move |conn| {
        conn.execute(
          &format!(
            "INSERT INTO files ({FILE_COLUMNS})
             VALUES (?1, ?2, ?3, ?4, ?5, ?6, ?7, ?8, ?9, ?10)"
          ),
          rusqlite::params![
            id_str,
            account_str,
            kind_str,
            file.file_name,
            file.original_name,
            file.path,
            size,
            file.media_type,
            file.content_hash,
            at_str,
          ],
        )?;
        Ok(())
      })
      .await?;
    Ok(())
  }

  async fn get_file(&self, id: Uuid) -> Result<Option<StoredFile>> {
    let id_str = encode_uuid(id);

    let raw: Option<RawFile> = self
      .conn
      .call(move |conn| {
        Ok(
          conn
            .query_row(
              &format!("SELECT {FILE_COLUMNS} FROM files WHERE file_id = ?1"),
              rusqlite::params![id_str],
              RawFile::from_row,
            )
            .optional()?,
        )
      })
      .await?;

    raw.map(RawFile::into_file).transpose()
  }

  async fn list_files(&self, owner: Option<Uuid>) -> Result<Vec<StoredFile>> {
    let owner_str = owner.map(encode_uuid);

    let raws: Vec<RawFile> = self
      .conn
      .call(move |conn| {
        let mut stmt = conn.prepare(&format!(
          "SELECT {FILE_COLUMNS} FROM files
           WHERE ?1 IS NULL OR account_id = ?1
           ORDER BY uploaded_at DESC, file_id"
        ))?;
        let rows = stmt
          .query_map(rusqlite::params![owner_str], RawFile::from_row)?
          .collect::<rusqlite::Result<Vec<_>>>()?;
        Ok(rows)
      })
      .await?;

    raws.into_iter().map(RawFile::into_file).collect()
  }

  async fn delete_file(&self, id: Uuid) -> Result<()> {
    let id_str = encode_uuid(id);

    let removed = self
      .conn
      .call(move |conn| {
        Ok(conn.execute("DELETE FROM files WHERE file_id = ?1", rusqlite::params![id_str])?)
      })
      .await?;

    if removed == 0 {
      return Err(Error::Conflict(format!("file {id} was already deleted")));
    }
    Ok(())
  }
}

impl SqliteStore {
  /// Set a person's deleted flag and the linked account's active flag to
  /// opposite values in one transaction. Returns `None` when the person was
  /// not in the expected state or the account is gone; nothing is written
  /// in that case.
  async fn flip_person(
    &self,
    person_id: Uuid,
    account_id: Uuid,
    at: DateTime<Utc>,
    delete: bool,
  ) -> Result<Option<()>> {
    let person_str = encode_uuid(person_id);
    let account_str = encode_uuid(account_id);
    let at_str = encode_dt(at);

    let moved = self
      .conn
      .call(move |conn| {
        let tx = conn.transaction_with_behavior(TransactionBehavior::Immediate)?;

        let persons = tx.execute(
          "UPDATE persons SET deleted = ?3, updated_at = ?4
           WHERE person_id = ?1 AND account_id = ?2 AND deleted = ?5",
          rusqlite::params![person_str, account_str, delete, at_str, !delete],
        )?;
        if persons != 1 {
          return Ok(Moved::Missed);
        }

        let accounts = tx.execute(
          "UPDATE accounts SET active = ?2 WHERE account_id = ?1",
          rusqlite::params![account_str, !delete],
        )?;
        if accounts != 1 {
          return Ok(Moved::Missed);
        }

        tx.commit()?;
        Ok(Moved::Done(()))
      })
      .await?;

    Ok(match moved {
      Moved::Done(()) => Some(()),
      Moved::Missed => {
        tracing::debug!(person = %person_id, delete, "person flip matched no row");
        None
      }
    })
  }
}
