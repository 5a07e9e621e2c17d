use std::collections::BTreeMap;
use std::time::Duration;

use chrono::{DateTime, Utc};
use docstash_types::{DigestAlgorithm, MetadataRecord, ObjectId};
use rusqlite::types::Type;
use rusqlite::{params, Connection, OpenFlags, OptionalExtension, TransactionBehavior};
use tracing::{debug, info};

use crate::connection::ConnectionString;
use crate::error::{IndexError, IndexResult};
use crate::traits::MetadataIndex;

/// Table holding one row per stored object.
pub const TABLE_NAME: &str = "stored_files_metadata";

const BUSY_TIMEOUT: Duration = Duration::from_secs(5);

/// Provision the index schema. Safe to run repeatedly.
pub fn create_schema(connection: &ConnectionString) -> IndexResult<()> {
    let conn = Connection::open(connection.path())?;
    conn.execute_batch(
        "CREATE TABLE IF NOT EXISTS stored_files_metadata (
            primary_digest TEXT PRIMARY KEY NOT NULL,
            primary_algorithm TEXT NOT NULL,
            digests TEXT NOT NULL,
            stored_at TEXT NOT NULL
        );",
    )?;
    info!(database = %connection.path().display(), "metadata schema ready");
    Ok(())
}

/// SQLite-backed metadata index.
///
/// Every call opens its own connection and closes it before returning.
/// Writes run in an immediate transaction that is committed explicitly;
/// any early return drops the transaction, which rolls it back.
///
/// Secondary digests are kept as a JSON object in the `digests` column so
/// the set of algorithms can change without a schema migration.
#[derive(Clone, Debug)]
pub struct SqliteIndex {
    connection: ConnectionString,
}

impl SqliteIndex {
    /// Connect to an already-provisioned database.
    ///
    /// Fails with [`IndexError::SchemaMissing`] if [`create_schema`] has not
    /// been run against it.
    pub fn connect(connection: ConnectionString) -> IndexResult<Self> {
        let missing = || IndexError::SchemaMissing(connection.path().display().to_string());
        if !connection.path().exists() {
            return Err(missing());
        }
        let index = Self { connection };
        let conn = index.session()?;
        let table: Option<String> = conn
            .query_row(
                "SELECT name FROM sqlite_master WHERE type = 'table' AND name = ?1",
                [TABLE_NAME],
                |row| row.get(0),
            )
            .optional()?;
        if table.is_none() {
            return Err(IndexError::SchemaMissing(
                index.connection.path().display().to_string(),
            ));
        }
        Ok(index)
    }

    pub fn connection(&self) -> &ConnectionString {
        &self.connection
    }

    /// Open a fresh connection for one call. Never creates the database.
    fn session(&self) -> IndexResult<Connection> {
        let conn = Connection::open_with_flags(
            self.connection.path(),
            OpenFlags::SQLITE_OPEN_READ_WRITE | OpenFlags::SQLITE_OPEN_NO_MUTEX,
        )?;
        conn.busy_timeout(BUSY_TIMEOUT)?;
        Ok(conn)
    }

    fn fetch(conn: &Connection, id: &ObjectId) -> IndexResult<Option<MetadataRecord>> {
        let record = conn
            .query_row(
                "SELECT primary_digest, primary_algorithm, digests, stored_at
                 FROM stored_files_metadata WHERE primary_digest = ?1",
                [id.as_str()],
                row_to_record,
            )
            .optional()?;
        Ok(record)
    }
}

fn conversion_error<E>(column: usize, e: E) -> rusqlite::Error
where
    E: std::error::Error + Send + Sync + 'static,
{
    rusqlite::Error::FromSqlConversionFailure(column, Type::Text, Box::new(e))
}

fn row_to_record(row: &rusqlite::Row<'_>) -> rusqlite::Result<MetadataRecord> {
    let digest: String = row.get(0)?;
    let algorithm: String = row.get(1)?;
    let digests_json: String = row.get(2)?;
    let stored_at: String = row.get(3)?;

    let id = ObjectId::from_hex(&digest).map_err(|e| conversion_error(0, e))?;
    let primary_algorithm = algorithm
        .parse::<DigestAlgorithm>()
        .map_err(|e| conversion_error(1, e))?;
    let secondary: BTreeMap<DigestAlgorithm, String> =
        serde_json::from_str(&digests_json).map_err(|e| conversion_error(2, e))?;
    let stored_at = DateTime::parse_from_rfc3339(&stored_at)
        .map_err(|e| conversion_error(3, e))?
        .with_timezone(&Utc);

    Ok(MetadataRecord {
        id,
        primary_algorithm,
        secondary,
        stored_at,
    })
}

impl MetadataIndex for SqliteIndex {
    fn upsert(&self, record: &MetadataRecord) -> IndexResult<MetadataRecord> {
        let mut conn = self.session()?;
        let tx = conn.transaction_with_behavior(TransactionBehavior::Immediate)?;

        let merged = match Self::fetch(&tx, &record.id)? {
            Some(mut existing) => {
                if existing.primary_algorithm != record.primary_algorithm {
                    return Err(IndexError::AlgorithmMismatch {
                        id: record.id.clone(),
                        stored: existing.primary_algorithm,
                        given: record.primary_algorithm,
                    });
                }
                existing.merge(record);
                existing
            }
            None => record.clone(),
        };

        let digests_json = serde_json::to_string(&merged.secondary)
            .map_err(|e| IndexError::Serialization(e.to_string()))?;

        tx.execute(
            "INSERT INTO stored_files_metadata (
                primary_digest, primary_algorithm, digests, stored_at
            ) VALUES (?1, ?2, ?3, ?4)
            ON CONFLICT(primary_digest) DO UPDATE SET digests = excluded.digests",
            params![
                merged.id.as_str(),
                merged.primary_algorithm.as_str(),
                digests_json,
                merged.stored_at.to_rfc3339(),
            ],
        )?;
        tx.commit()?;

        debug!(id = %merged.id, "upserted metadata record");
        Ok(merged)
    }

    fn get(&self, id: &ObjectId) -> IndexResult<MetadataRecord> {
        let conn = self.session()?;
        Self::fetch(&conn, id)?.ok_or_else(|| IndexError::NotFound(id.clone()))
    }

    fn delete(&self, id: &ObjectId) -> IndexResult<()> {
        let mut conn = self.session()?;
        let tx = conn.transaction_with_behavior(TransactionBehavior::Immediate)?;
        let affected = tx.execute(
            "DELETE FROM stored_files_metadata WHERE primary_digest = ?1",
            [id.as_str()],
        )?;
        if affected == 0 {
            return Err(IndexError::NotFound(id.clone()));
        }
        tx.commit()?;
        debug!(id = %id, "deleted metadata record");
        Ok(())
    }

    fn count(&self) -> IndexResult<u64> {
        let conn = self.session()?;
        let count: i64 =
            conn.query_row("SELECT COUNT(*) FROM stored_files_metadata", [], |row| row.get(0))?;
        Ok(count.max(0) as u64)
    }

    fn ids(&self) -> IndexResult<Vec<ObjectId>> {
        let conn = self.session()?;
        let mut stmt = conn
            .prepare("SELECT primary_digest FROM stored_files_metadata ORDER BY primary_digest")?;
        let rows = stmt.query_map([], |row| {
            let digest: String = row.get(0)?;
            ObjectId::from_hex(&digest).map_err(|e| conversion_error(0, e))
        })?;

        let mut ids = Vec::new();
        for row in rows {
            ids.push(row?);
        }
        Ok(ids)
    }
}
