//! SQL schema for the tracer SQLite store.
//!
//! Executed once at connection startup. Future migrations will be gated on
//! `PRAGMA user_version`.

/// Full schema DDL; idempotent thanks to `CREATE TABLE IF NOT EXISTS`.
pub const SCHEMA: &str = "
PRAGMA journal_mode = WAL;
PRAGMA foreign_keys = ON;

CREATE TABLE IF NOT EXISTS accounts (
    account_id    TEXT PRIMARY KEY,
    username      TEXT NOT NULL UNIQUE COLLATE NOCASE,
    email         TEXT NOT NULL UNIQUE COLLATE NOCASE,
    password_hash TEXT NOT NULL,
    role          TEXT NOT NULL CHECK (role IN ('admin', 'alumni')),
    active        INTEGER NOT NULL DEFAULT 1,
    created_at    TEXT NOT NULL
);

-- Persons are never deleted; `deleted` is a soft flag.
-- UNIQUE(account_id) backs the one-person-per-account rule.
CREATE TABLE IF NOT EXISTS persons (
    person_id       TEXT PRIMARY KEY,
    account_id      TEXT UNIQUE REFERENCES accounts(account_id),
    institution_id  TEXT NOT NULL,
    name            TEXT NOT NULL,
    program         TEXT NOT NULL DEFAULT '',
    cohort_year     INTEGER NOT NULL,
    graduation_year INTEGER NOT NULL,
    email           TEXT NOT NULL DEFAULT '',
    phone           TEXT NOT NULL DEFAULT '',
    address         TEXT NOT NULL DEFAULT '',
    deleted         INTEGER NOT NULL DEFAULT 0,
    created_at      TEXT NOT NULL,
    updated_at      TEXT NOT NULL,
    CHECK (graduation_year >= cohort_year)
);

-- Active tier. A row here has no counterpart in trash_engagements.
CREATE TABLE IF NOT EXISTS engagements (
    engagement_id TEXT PRIMARY KEY,
    person_id     TEXT NOT NULL REFERENCES persons(person_id),
    employer      TEXT NOT NULL,
    position      TEXT NOT NULL,
    industry      TEXT NOT NULL,
    location      TEXT NOT NULL,
    salary_range  TEXT NOT NULL,
    start_date    TEXT NOT NULL,   -- YYYY-MM-DD
    end_date      TEXT,            -- YYYY-MM-DD or NULL while ongoing
    status        TEXT NOT NULL,
    description   TEXT NOT NULL,
    created_at    TEXT NOT NULL,
    updated_at    TEXT NOT NULL,
    CHECK (end_date IS NULL OR end_date >= start_date)
);

-- Trash tier: displaced engagements, same columns plus deleted_at.
CREATE TABLE IF NOT EXISTS trash_engagements (
    engagement_id TEXT PRIMARY KEY,
    person_id     TEXT NOT NULL REFERENCES persons(person_id),
    employer      TEXT NOT NULL,
    position      TEXT NOT NULL,
    industry      TEXT NOT NULL,
    location      TEXT NOT NULL,
    salary_range  TEXT NOT NULL,
    start_date    TEXT NOT NULL,
    end_date      TEXT,
    status        TEXT NOT NULL,
    description   TEXT NOT NULL,
    created_at    TEXT NOT NULL,
    updated_at    TEXT NOT NULL,
    deleted_at    TEXT NOT NULL
);

CREATE TABLE IF NOT EXISTS files (
    file_id       TEXT PRIMARY KEY,
    account_id    TEXT NOT NULL REFERENCES accounts(account_id),
    kind          TEXT NOT NULL,   -- 'photo' | 'certificate'
    file_name     TEXT NOT NULL,
    original_name TEXT NOT NULL,
    path          TEXT NOT NULL,
    size          INTEGER NOT NULL,
    media_type    TEXT NOT NULL,
    content_hash  TEXT NOT NULL,
    uploaded_at   TEXT NOT NULL
);

CREATE INDEX IF NOT EXISTS persons_deleted_idx      ON persons(deleted);
CREATE INDEX IF NOT EXISTS engagements_person_idx   ON engagements(person_id);
CREATE INDEX IF NOT EXISTS trash_person_idx         ON trash_engagements(person_id);
CREATE INDEX IF NOT EXISTS files_account_idx        ON files(account_id);

PRAGMA user_version = 1;
";
