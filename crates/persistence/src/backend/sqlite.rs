// Copyright (C) 2026 Fred Clausen
// Use of this source code is governed by an MIT-style
// license that can be found in the LICENSE file or at
// https://opensource.org/licenses/MIT.

//! `SQLite` connection setup and storage encodings.
//!
//! Every connection runs with foreign keys on and a busy timeout, so an
//! `IMMEDIATE` transaction waits for a competing writer instead of failing
//! at once. Timestamps are stored as fixed-width UTC RFC 3339 text
//! (`YYYY-MM-DDTHH:MM:SSZ`); text comparison in SQL then orders the same
//! way as time, which the deadline and session-expiry filters rely on.

use diesel::dsl::sql;
use diesel::prelude::*;
use diesel::sql_types::{BigInt, Integer};
use diesel::{Connection, RunQueryDsl, SqliteConnection};
use diesel_migrations::{EmbeddedMigrations, MigrationHarness, embed_migrations};
use give_pulse_domain::{format_timestamp, parse_timestamp};
use time::{OffsetDateTime, UtcOffset};
use tracing::{debug, info};

use crate::error::PersistenceError;

/// Embedded schema migrations.
pub const MIGRATIONS: EmbeddedMigrations = embed_migrations!("migrations");

/// How long a writer waits for the database lock, in milliseconds.
pub const BUSY_TIMEOUT_MS: u32 = 5_000;

#[derive(QueryableByName)]
struct ForeignKeysPragma {
    #[diesel(sql_type = Integer)]
    foreign_keys: i32,
}

/// Returns the rowid assigned by the last `INSERT` on this connection.
///
/// # Errors
///
/// Returns an error if the query fails.
pub fn get_last_insert_rowid(conn: &mut SqliteConnection) -> Result<i64, PersistenceError> {
    Ok(diesel::select(sql::<BigInt>("last_insert_rowid()")).get_result(conn)?)
}

/// Fails unless `SQLite` enforces foreign keys on this connection.
///
/// Donations, appointments and sessions all hang off rows that must exist;
/// the engine refuses to run without the constraint.
///
/// # Errors
///
/// Returns `PersistenceError::ForeignKeyEnforcementNotEnabled` when the
/// pragma reads 0.
pub fn verify_foreign_key_enforcement(conn: &mut SqliteConnection) -> Result<(), PersistenceError> {
    let pragma: ForeignKeysPragma = diesel::sql_query("PRAGMA foreign_keys").get_result(conn)?;
    if pragma.foreign_keys == 0 {
        return Err(PersistenceError::ForeignKeyEnforcementNotEnabled);
    }

    debug!("SQLite foreign key enforcement is enabled");
    Ok(())
}

/// Applies the per-connection pragmas.
fn configure_connection(conn: &mut SqliteConnection) -> Result<(), PersistenceError> {
    for pragma in [
        String::from("PRAGMA foreign_keys = ON"),
        format!("PRAGMA busy_timeout = {BUSY_TIMEOUT_MS}"),
    ] {
        diesel::sql_query(&pragma)
            .execute(conn)
            .map_err(|e| PersistenceError::QueryFailed(format!("{pragma}: {e}")))?;
    }
    Ok(())
}

/// Opens `database_url`, configures the connection and applies pending
/// migrations.
///
/// # Errors
///
/// Returns an error if the connection, a pragma or a migration fails.
pub fn initialize_database(database_url: &str) -> Result<SqliteConnection, PersistenceError> {
    info!(database_url, "Opening SQLite database");

    let mut conn: SqliteConnection = SqliteConnection::establish(database_url)?;
    configure_connection(&mut conn)?;

    let applied = conn
        .run_pending_migrations(MIGRATIONS)
        .map_err(|e| PersistenceError::MigrationFailed(e.to_string()))?;
    info!(applied = applied.len(), "Migrations up to date");

    Ok(conn)
}

/// Switches a file database to write-ahead logging.
///
/// # Errors
///
/// Returns an error if the pragma fails.
pub fn enable_wal_mode(conn: &mut SqliteConnection) -> Result<(), PersistenceError> {
    diesel::sql_query("PRAGMA journal_mode = WAL")
        .execute(conn)
        .map_err(|e| PersistenceError::QueryFailed(e.to_string()))?;
    Ok(())
}

/// Encodes a timestamp for storage.
///
/// The value is shifted to UTC and truncated to whole seconds.
///
/// # Errors
///
/// Returns an error if the timestamp cannot be formatted.
pub fn timestamp_text(value: OffsetDateTime) -> Result<String, PersistenceError> {
    let utc: OffsetDateTime = value.to_offset(UtcOffset::UTC);
    let truncated: OffsetDateTime = utc
        .replace_nanosecond(0)
        .map_err(|e| PersistenceError::SerializationError(e.to_string()))?;
    format_timestamp(truncated).map_err(|e| PersistenceError::SerializationError(e.to_string()))
}

/// Decodes a stored timestamp.
///
/// # Errors
///
/// Returns an error if the stored text is not RFC 3339.
pub fn stored_timestamp(text: &str) -> Result<OffsetDateTime, PersistenceError> {
    parse_timestamp(text).map_err(|e| PersistenceError::ReconstructionError(e.to_string()))
}

/// Decodes an optional stored timestamp.
///
/// # Errors
///
/// Returns an error if the stored text is not RFC 3339.
pub fn optional_stored_timestamp(
    text: Option<&str>,
) -> Result<Option<OffsetDateTime>, PersistenceError> {
    text.map(stored_timestamp).transpose()
}
