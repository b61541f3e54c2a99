//! SQL schema for the Grocer SQLite store.
//!
//! Executed once at connection startup. Future migrations will be gated on
//! `PRAGMA user_version`.

/// Full schema DDL; idempotent thanks to `CREATE TABLE IF NOT EXISTS`.
pub const SCHEMA: &str = "
PRAGMA journal_mode = WAL;

-- One row per persisted document; the body is the whole collection as JSON.
CREATE TABLE IF NOT EXISTS documents (
    key         TEXT PRIMARY KEY,  -- 'categories' | 'items' | 'sets' | 'logs' | 'preferences'
    body        TEXT NOT NULL,
    updated_at  TEXT NOT NULL      -- ISO 8601 UTC
);

PRAGMA user_version = 1;
";
