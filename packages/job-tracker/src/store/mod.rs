//! SQLite record store.
//!
//! One table, one pooled connection. Access is strictly sequential so the
//! pool never grows past a single connection, which also keeps `:memory:`
//! databases alive for the store's lifetime.

use std::str::FromStr;

use futures::stream::{self, BoxStream, StreamExt};
use sqlx::sqlite::{SqliteConnectOptions, SqlitePool, SqlitePoolOptions};
use sqlx::FromRow;
use tracing::{debug, info};

use crate::error::{StoreError, StoreResult};
use crate::models::{Job, JobStatus, NewJob};

const CREATE_JOBS_TABLE: &str = r#"
    CREATE TABLE IF NOT EXISTS jobs (
        id INTEGER PRIMARY KEY AUTOINCREMENT,
        title TEXT,
        company TEXT,
        location TEXT,
        url TEXT,
        date_posted TEXT,
        status TEXT NOT NULL DEFAULT 'Applied'
    )
"#;

const SELECT_ALL_JOBS: &str =
    "SELECT id, title, company, location, url, date_posted, status FROM jobs ORDER BY id ASC";

const SELECT_JOB_BY_ID: &str =
    "SELECT id, title, company, location, url, date_posted, status FROM jobs WHERE id = ?";

/// Persistent job table.
pub struct JobStore {
    pool: SqlitePool,
}

impl JobStore {
    /// Open (creating if absent) the database at `database_url` and ensure
    /// the schema exists.
    ///
    /// # Example URLs
    /// - `sqlite::memory:` - In-memory database (ephemeral)
    /// - `sqlite://jobSearchTracker.db` - File next to the working directory
    pub async fn connect(database_url: &str) -> StoreResult<Self> {
        let options = SqliteConnectOptions::from_str(database_url)?.create_if_missing(true);

        let pool = SqlitePoolOptions::new()
            .max_connections(1)
            .min_connections(1)
            .idle_timeout(None)
            .max_lifetime(None)
            .connect_with(options)
            .await?;

        let store = Self { pool };
        store.initialize().await?;

        info!(database_url = %database_url, "Connected to the job tracker database");
        Ok(store)
    }

    /// Create an in-memory store (for testing).
    pub async fn in_memory() -> StoreResult<Self> {
        Self::connect("sqlite::memory:").await
    }

    /// Create the jobs table if it does not exist. Safe to call repeatedly.
    pub async fn initialize(&self) -> StoreResult<()> {
        self.ensure_open()?;
        sqlx::query(CREATE_JOBS_TABLE).execute(&self.pool).await?;
        Ok(())
    }

    /// Insert a job and return its new id. Status defaults to Applied.
    pub async fn insert(&self, job: &NewJob) -> StoreResult<i64> {
        self.ensure_open()?;
        let status = job.status.unwrap_or_default();

        let result = sqlx::query(
            r#"
            INSERT INTO jobs (title, company, location, url, date_posted, status)
            VALUES (?, ?, ?, ?, ?, ?)
            "#,
        )
        .bind(&job.title)
        .bind(&job.company)
        .bind(&job.location)
        .bind(&job.url)
        .bind(&job.date_posted)
        .bind(status.as_str())
        .execute(&self.pool)
        .await?;

        let id = result.last_insert_rowid();
        debug!(id, title = %job.title, "Inserted job");
        Ok(id)
    }

    /// Stream every job in insertion order. Each call runs a fresh query.
    pub fn list_all(&self) -> BoxStream<'_, StoreResult<Job>> {
        if self.pool.is_closed() {
            return stream::once(async { Err(StoreError::Closed) }).boxed();
        }

        sqlx::query_as::<_, JobRow>(SELECT_ALL_JOBS)
            .fetch(&self.pool)
            .map(|row| row.map_err(StoreError::from).and_then(JobRow::into_job))
            .boxed()
    }

    /// Look up a single job.
    pub async fn get(&self, id: i64) -> StoreResult<Option<Job>> {
        self.ensure_open()?;
        let row = sqlx::query_as::<_, JobRow>(SELECT_JOB_BY_ID)
            .bind(id)
            .fetch_optional(&self.pool)
            .await?;

        row.map(JobRow::into_job).transpose()
    }

    /// Set a job's status. Returns rows affected (0 when `id` is unknown).
    pub async fn update_status(&self, id: i64, status: JobStatus) -> StoreResult<u64> {
        self.ensure_open()?;
        let result = sqlx::query("UPDATE jobs SET status = ? WHERE id = ?")
            .bind(status.as_str())
            .bind(id)
            .execute(&self.pool)
            .await?;

        Ok(result.rows_affected())
    }

    /// Delete a job. Returns rows affected (0 when `id` is unknown).
    pub async fn delete(&self, id: i64) -> StoreResult<u64> {
        self.ensure_open()?;
        let result = sqlx::query("DELETE FROM jobs WHERE id = ?")
            .bind(id)
            .execute(&self.pool)
            .await?;

        Ok(result.rows_affected())
    }

    /// Release the connection. A second call, or any later operation, fails
    /// with [`StoreError::Closed`].
    pub async fn close(&self) -> StoreResult<()> {
        self.ensure_open()?;
        self.pool.close().await;
        info!("Closed the database connection");
        Ok(())
    }

    pub fn is_closed(&self) -> bool {
        self.pool.is_closed()
    }

    fn ensure_open(&self) -> StoreResult<()> {
        if self.pool.is_closed() {
            return Err(StoreError::Closed);
        }
        Ok(())
    }
}

#[derive(Debug, FromRow)]
struct JobRow {
    id: i64,
    title: Option<String>,
    company: Option<String>,
    location: Option<String>,
    url: Option<String>,
    date_posted: Option<String>,
    status: String,
}

impl JobRow {
    fn into_job(self) -> StoreResult<Job> {
        let status = self
            .status
            .parse::<JobStatus>()
            .map_err(|e| StoreError::CorruptRow {
                id: self.id,
                reason: e.to_string(),
            })?;

        Ok(Job {
            id: self.id,
            title: self.title.unwrap_or_default(),
            company: self.company.unwrap_or_default(),
            location: self.location,
            url: self.url.unwrap_or_default(),
            date_posted: self.date_posted,
            status,
        })
    }
}
