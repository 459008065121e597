use crate::constants::{COMPANY_TABLE, NO_DATA};
use crate::error::{DashboardError, Result};
use crate::types::{CompanyRecord, SearchFilter};
use rusqlite::{params, Connection, OpenFlags, Row};
use std::path::{Path, PathBuf};
use std::sync::{Mutex, PoisonError};
use tracing::{debug, info};

/// Storage for raw ranking rows.
///
/// Reads used by the dashboard go through [`CompanyStore::fetch_companies`],
/// which already drops rows whose company is the no-data sentinel.
pub trait CompanyStore: Send + Sync {
    /// Rows with a real company name, optionally narrowed by `filter`, in
    /// insertion order.
    fn fetch_companies(&self, filter: Option<&SearchFilter>) -> Result<Vec<CompanyRecord>>;

    /// Every stored row, sentinel rows included, in insertion order.
    fn fetch_all(&self) -> Result<Vec<CompanyRecord>>;

    /// Appends rows and returns how many were written.
    fn insert_companies(&self, rows: &[CompanyRecord]) -> Result<usize>;

    /// Atomically swaps the table contents for `rows`.
    fn replace_all(&self, rows: &[CompanyRecord]) -> Result<usize>;

    fn count(&self) -> Result<usize>;

    /// Where the rows live, for error messages.
    fn location(&self) -> &Path;
}

const SCHEMA: &str = r#"
    CREATE TABLE IF NOT EXISTS company_info (
        id          INTEGER PRIMARY KEY AUTOINCREMENT,
        rank        TEXT,
        company     TEXT,
        company_url TEXT,
        revenue     TEXT,
        profit      TEXT,
        country     TEXT
    );
"#;

const SELECT_COLUMNS: &str = "SELECT rank, company, company_url, revenue, profit, country FROM company_info";

const INSERT_ROW: &str = "INSERT INTO company_info (rank, company, company_url, revenue, profit, country)
     VALUES (?1, ?2, ?3, ?4, ?5, ?6)";

/// SQLite-backed store holding the `company_info` table.
///
/// Each call opens its own connection; the handle itself is just a path and
/// can be shared freely across requests.
#[derive(Debug, Clone)]
pub struct SqliteStore {
    path: PathBuf,
}

impl SqliteStore {
    /// Handle for an existing database. Nothing is created; reads against
    /// a missing file fail with `DataUnavailable`.
    pub fn open<P: AsRef<Path>>(path: P) -> Self {
        Self {
            path: path.as_ref().to_path_buf(),
        }
    }

    /// Handle for an ingestion run: creates the file and table if needed.
    pub fn create<P: AsRef<Path>>(path: P) -> Result<Self> {
        let store = Self::open(path);
        store.connect_for_write()?;
        info!(path = %store.path.display(), "ranking database ready");
        Ok(store)
    }

    pub fn path(&self) -> &Path {
        &self.path
    }

    fn unavailable(&self, reason: impl Into<String>) -> DashboardError {
        DashboardError::data_unavailable(&self.path, reason)
    }

    fn connect_for_read(&self) -> Result<Connection> {
        if !self.path.is_file() {
            return Err(self.unavailable("database file not found"));
        }
        Connection::open_with_flags(&self.path, OpenFlags::SQLITE_OPEN_READ_ONLY)
            .map_err(|e| self.unavailable(e.to_string()))
    }

    fn connect_for_write(&self) -> Result<Connection> {
        if let Some(parent) = self.path.parent() {
            if !parent.as_os_str().is_empty() {
                std::fs::create_dir_all(parent)?;
            }
        }
        let conn = Connection::open(&self.path)?;
        conn.execute_batch(SCHEMA)?;
        Ok(conn)
    }

    fn query_rows(&self, sql: &str, args: &[&dyn rusqlite::ToSql]) -> Result<Vec<CompanyRecord>> {
        let conn = self.connect_for_read()?;
        let read = || -> rusqlite::Result<Vec<CompanyRecord>> {
            let mut stmt = conn.prepare(sql)?;
            let rows = stmt
                .query_map(args, map_row)?
                .collect::<rusqlite::Result<Vec<_>>>()?;
            Ok(rows)
        };
        read().map_err(|e| self.unavailable(e.to_string()))
    }

    fn write_rows(&self, rows: &[CompanyRecord], truncate: bool) -> Result<usize> {
        let mut conn = self.connect_for_write()?;
        let tx = conn.transaction()?;
        if truncate {
            let removed = tx.execute("DELETE FROM company_info", [])?;
            debug!(removed, "cleared {}", COMPANY_TABLE);
        }
        {
            let mut stmt = tx.prepare(INSERT_ROW)?;
            for row in rows {
                stmt.execute(params![
                    row.rank,
                    row.company,
                    row.company_url,
                    row.revenue,
                    row.profit,
                    row.country
                ])?;
            }
        }
        tx.commit()?;
        Ok(rows.len())
    }
}

fn map_row(row: &Row<'_>) -> rusqlite::Result<CompanyRecord> {
    let text = |idx: usize| -> rusqlite::Result<String> {
        Ok(row.get::<_, Option<String>>(idx)?.unwrap_or_default())
    };
    Ok(CompanyRecord {
        rank: text(0)?,
        company: text(1)?,
        company_url: text(2)?,
        revenue: text(3)?,
        profit: text(4)?,
        country: text(5)?,
    })
}

impl CompanyStore for SqliteStore {
    fn fetch_companies(&self, filter: Option<&SearchFilter>) -> Result<Vec<CompanyRecord>> {
        let rows = match filter {
            Some(filter) => {
                let sql = format!(
                    "{SELECT_COLUMNS} WHERE company != ?1 \
                     AND (company LIKE ?2 ESCAPE '\\' OR country LIKE ?2 ESCAPE '\\') ORDER BY id"
                );
                let pattern = filter.like_pattern();
                self.query_rows(&sql, &[&NO_DATA, &pattern])?
            }
            None => {
                let sql = format!("{SELECT_COLUMNS} WHERE company != ?1 ORDER BY id");
                self.query_rows(&sql, &[&NO_DATA])?
            }
        };
        debug!(rows = rows.len(), "fetched companies");
        Ok(rows)
    }

    fn fetch_all(&self) -> Result<Vec<CompanyRecord>> {
        self.query_rows(&format!("{SELECT_COLUMNS} ORDER BY id"), &[])
    }

    fn insert_companies(&self, rows: &[CompanyRecord]) -> Result<usize> {
        self.write_rows(rows, false)
    }

    fn replace_all(&self, rows: &[CompanyRecord]) -> Result<usize> {
        self.write_rows(rows, true)
    }

    fn count(&self) -> Result<usize> {
        let conn = self.connect_for_read()?;
        let n: i64 = conn
            .query_row("SELECT COUNT(*) FROM company_info", [], |row| row.get(0))
            .map_err(|e| self.unavailable(e.to_string()))?;
        Ok(n as usize)
    }

    fn location(&self) -> &Path {
        &self.path
    }
}

/// In-memory store with the same read semantics as [`SqliteStore`].
#[derive(Debug, Default)]
pub struct InMemoryStore {
    rows: Mutex<Vec<CompanyRecord>>,
}

impl InMemoryStore {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn with_rows(rows: Vec<CompanyRecord>) -> Self {
        Self {
            rows: Mutex::new(rows),
        }
    }

    fn rows(&self) -> std::sync::MutexGuard<'_, Vec<CompanyRecord>> {
        self.rows.lock().unwrap_or_else(PoisonError::into_inner)
    }
}

impl CompanyStore for InMemoryStore {
    fn fetch_companies(&self, filter: Option<&SearchFilter>) -> Result<Vec<CompanyRecord>> {
        Ok(self
            .rows()
            .iter()
            .filter(|r| r.company != NO_DATA)
            .filter(|r| filter.map_or(true, |f| f.matches(r)))
            .cloned()
            .collect())
    }

    fn fetch_all(&self) -> Result<Vec<CompanyRecord>> {
        Ok(self.rows().clone())
    }

    fn insert_companies(&self, rows: &[CompanyRecord]) -> Result<usize> {
        self.rows().extend_from_slice(rows);
        Ok(rows.len())
    }

    fn replace_all(&self, rows: &[CompanyRecord]) -> Result<usize> {
        *self.rows() = rows.to_vec();
        Ok(rows.len())
    }

    fn count(&self) -> Result<usize> {
        Ok(self.rows().len())
    }

    fn location(&self) -> &Path {
        Path::new(":memory:")
    }
}
