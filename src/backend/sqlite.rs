//! SQLite-backed node.
//!
//! Queries run on the blocking pool so a caller's deadline can drop the wait
//! without stalling a runtime worker. Region filters compare against
//! `RegionKey`, the normalized region written alongside every row.

use std::path::Path;
use std::sync::{Arc, Mutex};

use async_trait::async_trait;
use chrono::{DateTime, Utc};
use rusqlite::types::{Type, Value};
use rusqlite::{params, params_from_iter, Connection, OptionalExtension, Row};

use crate::backend::{
    normalize_region, AppointmentRecord, BackendError, NodeBackend, RegionFilter,
};

const SCHEMA: &str = r#"
    CREATE TABLE IF NOT EXISTS appointments (
        apptid      TEXT PRIMARY KEY,
        status      TEXT NOT NULL,
        TimeQueued  TEXT NOT NULL,
        QueueDate   TEXT,
        StartTime   TEXT,
        EndTime     TEXT,
        isVirtual   TEXT NOT NULL,
        RegionName  TEXT NOT NULL,
        RegionKey   TEXT NOT NULL
    );
    CREATE INDEX IF NOT EXISTS idx_appointments_region ON appointments (RegionKey);
"#;

const COLUMNS: &str =
    "apptid, status, TimeQueued, QueueDate, StartTime, EndTime, isVirtual, RegionName";

/// A relational node stored in a single SQLite database.
#[derive(Debug, Clone)]
pub struct SqliteBackend {
    conn: Arc<Mutex<Connection>>,
}

impl SqliteBackend {
    /// Open (or create) the database at `path`.
    pub fn open(path: impl AsRef<Path>) -> Result<Self, BackendError> {
        if let Some(parent) = path.as_ref().parent() {
            if !parent.as_os_str().is_empty() {
                std::fs::create_dir_all(parent)
                    .map_err(|e| BackendError::Unavailable(e.to_string()))?;
            }
        }

        let conn = Connection::open(path)?;
        conn.execute_batch(SCHEMA)?;
        conn.execute_batch(
            "PRAGMA journal_mode=WAL;
             PRAGMA synchronous=NORMAL;",
        )?;

        Ok(Self {
            conn: Arc::new(Mutex::new(conn)),
        })
    }

    /// Create an in-memory database (for testing).
    pub fn in_memory() -> Result<Self, BackendError> {
        let conn = Connection::open_in_memory()?;
        conn.execute_batch(SCHEMA)?;
        Ok(Self {
            conn: Arc::new(Mutex::new(conn)),
        })
    }

    /// Run `op` against the connection on the blocking pool.
    async fn call<T, F>(&self, op: F) -> Result<T, BackendError>
    where
        T: Send + 'static,
        F: FnOnce(&Connection) -> Result<T, BackendError> + Send + 'static,
    {
        let conn = self.conn.clone();
        tokio::task::spawn_blocking(move || {
            let conn = conn
                .lock()
                .map_err(|_| BackendError::Unavailable("connection lock poisoned".to_string()))?;
            op(&conn)
        })
        .await
        .map_err(|e| BackendError::Unavailable(format!("query task failed: {e}")))?
    }
}

#[async_trait]
impl NodeBackend for SqliteBackend {
    async fn ping(&self) -> Result<(), BackendError> {
        self.call(|conn| {
            conn.query_row("SELECT 1", [], |row| row.get::<_, i64>(0))?;
            Ok(())
        })
        .await
    }

    async fn list(
        &self,
        filter: &RegionFilter,
        offset: usize,
        limit: usize,
    ) -> Result<Vec<AppointmentRecord>, BackendError> {
        let (clause, mut args) = filter_clause(filter);
        args.push(Value::Integer(sql_int(limit)));
        args.push(Value::Integer(sql_int(offset)));

        self.call(move |conn| {
            let mut stmt = conn.prepare(&format!(
                "SELECT {COLUMNS} FROM appointments WHERE {clause} ORDER BY apptid LIMIT ? OFFSET ?"
            ))?;
            let rows = stmt
                .query_map(params_from_iter(args.iter()), map_row)?
                .collect::<Result<Vec<_>, _>>()?;
            Ok(rows)
        })
        .await
    }

    async fn count(&self, filter: &RegionFilter) -> Result<u64, BackendError> {
        let (clause, args) = filter_clause(filter);
        self.call(move |conn| {
            let count: i64 = conn.query_row(
                &format!("SELECT COUNT(*) FROM appointments WHERE {clause}"),
                params_from_iter(args.iter()),
                |row| row.get(0),
            )?;
            Ok(count as u64)
        })
        .await
    }

    async fn find(
        &self,
        filter: &RegionFilter,
        apptid: &str,
    ) -> Result<Option<AppointmentRecord>, BackendError> {
        let (clause, mut args) = filter_clause(filter);
        args.push(Value::Text(apptid.to_string()));

        self.call(move |conn| {
            let record = conn
                .query_row(
                    &format!("SELECT {COLUMNS} FROM appointments WHERE {clause} AND apptid = ?"),
                    params_from_iter(args.iter()),
                    map_row,
                )
                .optional()?;
            Ok(record)
        })
        .await
    }

    async fn insert(&self, record: &AppointmentRecord) -> Result<(), BackendError> {
        let record = record.clone();
        self.call(move |conn| {
            conn.execute(
                &format!(
                    "INSERT INTO appointments ({COLUMNS}, RegionKey)
                     VALUES (?, ?, ?, ?, ?, ?, ?, ?, ?)"
                ),
                params![
                    record.apptid,
                    record.status,
                    record.time_queued.to_rfc3339(),
                    record.queue_date.map(|t| t.to_rfc3339()),
                    record.start_time.map(|t| t.to_rfc3339()),
                    record.end_time.map(|t| t.to_rfc3339()),
                    virtual_flag(record.is_virtual),
                    record.region_name,
                    normalize_region(&record.region_name),
                ],
            )?;
            Ok(())
        })
        .await
    }

    async fn update(&self, record: &AppointmentRecord) -> Result<bool, BackendError> {
        let record = record.clone();
        self.call(move |conn| {
            let changed = conn.execute(
                "UPDATE appointments
                 SET status = ?, TimeQueued = ?, QueueDate = ?, StartTime = ?, EndTime = ?,
                     isVirtual = ?, RegionName = ?, RegionKey = ?
                 WHERE apptid = ?",
                params![
                    record.status,
                    record.time_queued.to_rfc3339(),
                    record.queue_date.map(|t| t.to_rfc3339()),
                    record.start_time.map(|t| t.to_rfc3339()),
                    record.end_time.map(|t| t.to_rfc3339()),
                    virtual_flag(record.is_virtual),
                    record.region_name,
                    normalize_region(&record.region_name),
                    record.apptid,
                ],
            )?;
            Ok(changed > 0)
        })
        .await
    }

    async fn delete(&self, filter: &RegionFilter, apptid: &str) -> Result<bool, BackendError> {
        let (clause, mut args) = filter_clause(filter);
        args.push(Value::Text(apptid.to_string()));

        self.call(move |conn| {
            let changed = conn.execute(
                &format!("DELETE FROM appointments WHERE {clause} AND apptid = ?"),
                params_from_iter(args.iter()),
            )?;
            Ok(changed > 0)
        })
        .await
    }
}

/// Modality is stored title-cased, the way the appointment tables expect it.
fn virtual_flag(is_virtual: bool) -> &'static str {
    if is_virtual {
        "True"
    } else {
        "False"
    }
}

/// SQLite integers are signed; anything past `i64::MAX` means "no bound".
fn sql_int(n: usize) -> i64 {
    i64::try_from(n).unwrap_or(i64::MAX)
}

/// Regions are compared through `normalize_region`, the same folding the
/// shard map and `RegionFilter::matches` use.
fn filter_clause(filter: &RegionFilter) -> (String, Vec<Value>) {
    let (negate, regions) = match filter {
        RegionFilter::All => return ("1 = 1".to_string(), Vec::new()),
        RegionFilter::In(regions) => (false, regions),
        RegionFilter::NotIn(regions) => (true, regions),
    };

    if regions.is_empty() {
        let clause = if negate { "1 = 1" } else { "1 = 0" };
        return (clause.to_string(), Vec::new());
    }

    let placeholders = vec!["?"; regions.len()].join(", ");
    let op = if negate { "NOT IN" } else { "IN" };
    let args = regions
        .iter()
        .map(|r| Value::Text(normalize_region(r)))
        .collect();
    (format!("RegionKey {op} ({placeholders})"), args)
}

fn map_row(row: &Row<'_>) -> rusqlite::Result<AppointmentRecord> {
    let is_virtual: String = row.get(6)?;
    Ok(AppointmentRecord {
        apptid: row.get(0)?,
        status: row.get(1)?,
        time_queued: parse_ts(2, row.get(2)?)?,
        queue_date: row.get::<_, Option<String>>(3)?.map(|s| parse_ts(3, s)).transpose()?,
        start_time: row.get::<_, Option<String>>(4)?.map(|s| parse_ts(4, s)).transpose()?,
        end_time: row.get::<_, Option<String>>(5)?.map(|s| parse_ts(5, s)).transpose()?,
        is_virtual: is_virtual.eq_ignore_ascii_case("true"),
        region_name: row.get(7)?,
    })
}

fn parse_ts(idx: usize, raw: String) -> rusqlite::Result<DateTime<Utc>> {
    DateTime::parse_from_rfc3339(&raw)
        .map(|t| t.with_timezone(&Utc))
        .map_err(|e| rusqlite::Error::FromSqlConversionFailure(idx, Type::Text, Box::new(e)))
}

#[cfg(test)]
mod tests {
    use std::time::Duration;

    use super::*;

    fn record(id: &str, region: &str, is_virtual: bool) -> AppointmentRecord {
        AppointmentRecord {
            apptid: id.to_string(),
            status: "Queued".into(),
            time_queued: "2024-03-01T08:00:00Z".parse().unwrap(),
            queue_date: Some("2024-03-02T00:00:00Z".parse().unwrap()),
            start_time: None,
            end_time: None,
            is_virtual,
            region_name: region.to_string(),
        }
    }

    #[tokio::test]
    async fn test_crud_cycle() {
        let node = SqliteBackend::in_memory().unwrap();
        node.ping().await.unwrap();

        let rec = record("B", "Central Luzon (III)", true);
        node.insert(&rec).await.unwrap();
        let found = node.find(&RegionFilter::All, "B").await.unwrap().unwrap();
        assert_eq!(found, rec);

        let dup = node.insert(&rec).await.unwrap_err();
        assert!(matches!(dup, BackendError::Conflict(_)));

        let mut changed = rec.clone();
        changed.status = "Complete".into();
        assert!(node.update(&changed).await.unwrap());
        assert!(!node.update(&record("Z", "x", false)).await.unwrap());

        assert!(node.delete(&RegionFilter::All, "B").await.unwrap());
        assert!(node.find(&RegionFilter::All, "B").await.unwrap().is_none());
    }

    #[tokio::test]
    async fn test_region_filtered_listing() {
        let node = SqliteBackend::in_memory().unwrap();
        node.insert(&record("C", "Central Luzon (III)", false)).await.unwrap();
        node.insert(&record("A", "central luzon (iii)", false)).await.unwrap();
        node.insert(&record("B", "Davao Region (XI)", false)).await.unwrap();

        let luzon = vec!["central luzon (iii)".to_string()];
        let rows = node.list(&RegionFilter::In(luzon.clone()), 0, 10).await.unwrap();
        let ids: Vec<_> = rows.iter().map(|r| r.apptid.as_str()).collect();
        assert_eq!(ids, vec!["A", "C"]);

        assert_eq!(node.count(&RegionFilter::NotIn(luzon.clone())).await.unwrap(), 1);
        assert_eq!(node.list(&RegionFilter::All, 2, 5).await.unwrap().len(), 1);

        // A filtered delete must not touch the other shard's rows.
        assert!(!node.delete(&RegionFilter::In(luzon), "B").await.unwrap());
    }

    #[tokio::test]
    async fn test_region_filter_folds_like_shard_map() {
        let node = SqliteBackend::in_memory().unwrap();
        node.insert(&record("A", "Central Luzon (III)\t", false)).await.unwrap();
        node.insert(&record("B", "\u{00C9}cija\n", false)).await.unwrap();
        node.insert(&record("C", "Davao Region (XI)", false)).await.unwrap();

        let shard = vec!["central luzon (iii)".to_string(), "\u{00E9}cija".to_string()];
        let rows = node.list(&RegionFilter::In(shard.clone()), 0, 10).await.unwrap();
        let ids: Vec<_> = rows.iter().map(|r| r.apptid.as_str()).collect();
        assert_eq!(ids, vec!["A", "B"]);
        assert_eq!(node.count(&RegionFilter::NotIn(shard.clone())).await.unwrap(), 1);

        // Stored text is untouched; only the key is folded.
        let found = node.find(&RegionFilter::In(shard), "B").await.unwrap().unwrap();
        assert_eq!(found.region_name, "\u{00C9}cija\n");

        let mut moved = found.clone();
        moved.region_name = "Davao Region (XI)".into();
        assert!(node.update(&moved).await.unwrap());
        let vismin = RegionFilter::In(vec!["davao region (xi)".to_string()]);
        assert_eq!(node.count(&vismin).await.unwrap(), 2);
    }

    #[tokio::test]
    async fn test_offset_beyond_i64_is_empty() {
        let node = SqliteBackend::in_memory().unwrap();
        node.insert(&record("A", "Ilocos Region (I)", false)).await.unwrap();

        assert!(node.list(&RegionFilter::All, usize::MAX, 10).await.unwrap().is_empty());
        assert_eq!(node.list(&RegionFilter::All, 0, usize::MAX).await.unwrap().len(), 1);
    }

    #[tokio::test]
    async fn test_deadline_fires_while_connection_busy() {
        let node = SqliteBackend::in_memory().unwrap();
        let held = node.conn.lock().unwrap();

        let waited = tokio::time::timeout(Duration::from_millis(50), node.ping()).await;
        assert!(waited.is_err(), "ping should give up while the connection is held");

        drop(held);
        node.ping().await.unwrap();
    }

    #[tokio::test]
    async fn test_file_backed_node_persists() {
        let dir = tempfile::tempdir().unwrap();
        let path = dir.path().join("nodes/node1.db");
        {
            let node = SqliteBackend::open(&path).unwrap();
            node.insert(&record("A", "Ilocos Region (I)", false)).await.unwrap();
        }
        let reopened = SqliteBackend::open(&path).unwrap();
        assert_eq!(reopened.count(&RegionFilter::All).await.unwrap(), 1);
    }
}
