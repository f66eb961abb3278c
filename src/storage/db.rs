use chrono::{DateTime, Utc};
use rusqlite::{params, Connection, OptionalExtension};
use std::path::Path;
use std::sync::Mutex;
use std::time::Duration;
use tracing::{debug, info};

use crate::{
    error::Result,
    storage::{
        models::{ClaimOutcome, ClaimRecord},
        ClaimStore,
    },
};

/// SQLite-backed claim store.
///
/// Exclusivity is enforced by the database itself: a claim is a single
/// conditional upsert that only lands when the item has no claimant, so
/// several server processes can share one database file.
pub struct SqliteStore {
    conn: Mutex<Connection>,
}

impl SqliteStore {
    pub fn open(path: impl AsRef<Path>) -> Result<Self> {
        let path = path.as_ref();
        let conn = Connection::open(path)?;
        conn.busy_timeout(Duration::from_secs(5))?;
        let mode: String = conn.query_row("PRAGMA journal_mode=WAL", [], |row| row.get(0))?;
        debug!("SQLite journal mode: {}", mode);

        let store = Self::from_connection(conn)?;
        info!("Claim database ready at {}", path.display());
        Ok(store)
    }

    pub fn open_in_memory() -> Result<Self> {
        Self::from_connection(Connection::open_in_memory()?)
    }

    fn from_connection(conn: Connection) -> Result<Self> {
        let store = Self {
            conn: Mutex::new(conn),
        };
        store.init_schema()?;
        Ok(store)
    }

    fn init_schema(&self) -> Result<()> {
        let conn = self.conn.lock()?;
        conn.execute(
            "CREATE TABLE IF NOT EXISTS claims (
                item TEXT PRIMARY KEY,
                claimant TEXT,
                claimed_at TEXT
            )",
            [],
        )?;
        Ok(())
    }

    fn claimant_of(conn: &Connection, item: &str) -> Result<Option<String>> {
        let claimant = conn
            .query_row(
                "SELECT claimant FROM claims WHERE item = ?1",
                params![item],
                |row| row.get::<_, Option<String>>(0),
            )
            .optional()?;
        Ok(claimant.flatten())
    }
}

impl ClaimStore for SqliteStore {
    fn backend(&self) -> &'static str {
        "sqlite"
    }

    fn records(&self) -> Result<Vec<ClaimRecord>> {
        let conn = self.conn.lock()?;
        let mut stmt = conn.prepare(
            "SELECT item, claimant, claimed_at
             FROM claims
             ORDER BY item",
        )?;

        let records = stmt
            .query_map([], |row| {
                let claimed_at: Option<String> = row.get(2)?;
                Ok(ClaimRecord {
                    item: row.get(0)?,
                    claimant: row.get(1)?,
                    claimed_at: claimed_at
                        .and_then(|s| DateTime::parse_from_rfc3339(&s).ok())
                        .map(|dt| dt.with_timezone(&Utc)),
                })
            })?
            .collect::<std::result::Result<Vec<_>, _>>()?;

        Ok(records)
    }

    fn try_claim(&self, item: &str, name: &str) -> Result<ClaimOutcome> {
        let conn = self.conn.lock()?;
        let changed = conn.execute(
            "INSERT INTO claims (item, claimant, claimed_at) VALUES (?1, ?2, ?3)
             ON CONFLICT(item) DO UPDATE
                SET claimant = excluded.claimant, claimed_at = excluded.claimed_at
                WHERE claims.claimant IS NULL",
            params![item, name, Utc::now().to_rfc3339()],
        )?;

        if changed == 1 {
            return Ok(ClaimOutcome::Accepted);
        }

        let existing = Self::claimant_of(&conn, item)?.unwrap_or_default();
        Ok(ClaimOutcome::AlreadyClaimed(existing))
    }

    fn register_item(&self, item: &str) -> Result<()> {
        let conn = self.conn.lock()?;
        conn.execute(
            "INSERT OR IGNORE INTO claims (item, claimant, claimed_at) VALUES (?1, NULL, NULL)",
            params![item],
        )?;
        Ok(())
    }
}
