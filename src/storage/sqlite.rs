//! SQLite-backed posting store.

use std::collections::HashSet;
use std::path::Path;
use std::sync::Mutex;

use async_trait::async_trait;
use rusqlite::Connection;

use crate::error::Result;
use crate::models::JobPosting;
use crate::storage::PostingStore;

/// SQLite storage backend.
///
/// The connection sits behind a mutex: the crawl loop is strictly
/// sequential, so there is no contention, but the store must stay usable
/// if the surrounding process is ever parallelized.
pub struct SqliteStore {
    conn: Mutex<Connection>,
}

impl SqliteStore {
    /// Open (or create) the database at the given path.
    pub fn open(path: impl AsRef<Path>) -> Result<Self> {
        if let Some(parent) = path.as_ref().parent() {
            if !parent.as_os_str().is_empty() {
                std::fs::create_dir_all(parent)?;
            }
        }
        let conn = Connection::open(path)?;
        conn.execute_batch("PRAGMA journal_mode=WAL; PRAGMA foreign_keys=ON;")?;
        Self::init_schema(&conn)?;
        Ok(Self {
            conn: Mutex::new(conn),
        })
    }

    /// Open an in-memory database. Used by tests.
    pub fn open_in_memory() -> Result<Self> {
        let conn = Connection::open_in_memory()?;
        Self::init_schema(&conn)?;
        Ok(Self {
            conn: Mutex::new(conn),
        })
    }

    /// Number of stored postings.
    pub fn count(&self) -> Result<i64> {
        let conn = self.conn.lock().expect("store mutex poisoned");
        let count = conn.query_row("SELECT COUNT(*) FROM postings", [], |row| row.get(0))?;
        Ok(count)
    }

    fn init_schema(conn: &Connection) -> Result<()> {
        conn.execute_batch(
            "
            CREATE TABLE IF NOT EXISTS postings (
                id                 INTEGER PRIMARY KEY,
                company_name       TEXT NOT NULL DEFAULT '',
                job_title          TEXT NOT NULL DEFAULT '',
                job_location       TEXT NOT NULL DEFAULT '',
                experience         TEXT NOT NULL DEFAULT '',
                salary             TEXT NOT NULL DEFAULT '',
                deadline           TEXT NOT NULL DEFAULT '',
                employment_type    TEXT NOT NULL DEFAULT '',
                company_type       TEXT NOT NULL DEFAULT '',
                job_url            TEXT UNIQUE NOT NULL,
                description        TEXT NOT NULL DEFAULT '',
                description_source TEXT NOT NULL DEFAULT 'none',
                scraped_at         TEXT NOT NULL
            );
            CREATE INDEX IF NOT EXISTS idx_postings_company ON postings(company_name);
            ",
        )?;
        Ok(())
    }
}

#[async_trait]
impl PostingStore for SqliteStore {
    async fn insert(&self, posting: &JobPosting) -> Result<i64> {
        let conn = self.conn.lock().expect("store mutex poisoned");
        conn.execute(
            "INSERT INTO postings
             (company_name, job_title, job_location, experience, salary,
              deadline, employment_type, company_type, job_url, description,
              description_source, scraped_at)
             VALUES (?1, ?2, ?3, ?4, ?5, ?6, ?7, ?8, ?9, ?10, ?11, ?12)",
            rusqlite::params![
                posting.company_name,
                posting.job_title,
                posting.job_location,
                posting.experience,
                posting.salary,
                posting.deadline,
                posting.employment_type,
                posting.company_type,
                posting.source_url,
                posting.description,
                posting.description_source.as_str(),
                posting.scraped_at.to_rfc3339(),
            ],
        )?;
        Ok(conn.last_insert_rowid())
    }

    async fn find_existing_urls(&self, urls: &[String]) -> Result<HashSet<String>> {
        if urls.is_empty() {
            return Ok(HashSet::new());
        }

        let conn = self.conn.lock().expect("store mutex poisoned");
        let placeholders = vec!["?"; urls.len()].join(", ");
        let sql = format!(
            "SELECT job_url FROM postings WHERE job_url IN ({})",
            placeholders
        );
        let mut stmt = conn.prepare(&sql)?;
        let rows = stmt
            .query_map(rusqlite::params_from_iter(urls.iter()), |row| {
                row.get::<_, String>(0)
            })?
            .collect::<std::result::Result<HashSet<_>, _>>()?;
        Ok(rows)
    }
}
