//! # campus-db
//!
//! libSQL persistence for Campus.
//!
//! Holds all relational state: users, courses, batches, enrollments, class
//! sessions, payments, blog posts, homepage ads, materials, progress,
//! attendance, and the audit trail. `CampusService` layers the repositories,
//! the batch planner, and the connection gate on top of the raw `CampusDb` handle.
//!
//! Uses the `libsql` crate (C `SQLite` fork, v0.9.29) as a local embedded
//! database.

pub mod error;
pub mod helpers;
mod migrations;
pub mod planner;
pub mod repos;
pub mod service;
pub mod signature;
pub mod updates;

#[cfg(test)]
mod test_support;

use error::DatabaseError;
use libsql::Builder;

/// Central database handle for all Campus state.
///
/// Wraps a libSQL database and connection. Provides ID generation; the
/// repositories live on [`service::CampusService`].
pub struct CampusDb {
    #[allow(dead_code)]
    db: libsql::Database,
    conn: libsql::Connection,
}

impl CampusDb {
    /// Open a local database at the given path, or `":memory:"`.
    ///
    /// Runs migrations automatically on first open.
    ///
    /// # Errors
    ///
    /// Returns `DatabaseError` if the database cannot be opened or
    /// migrations fail.
    pub async fn open_local(path: &str) -> Result<Self, DatabaseError> {
        let db = Builder::new_local(path).build().await?;
        let conn = db.connect()?;

        // Enable foreign keys (must be per-connection in SQLite)
        conn.execute("PRAGMA foreign_keys = ON", ())
            .await
            .map_err(|e| DatabaseError::Migration(format!("PRAGMA foreign_keys: {e}")))?;

        let campus_db = Self { db, conn };
        campus_db.run_migrations().await?;
        tracing::debug!(path, "database opened");
        Ok(campus_db)
    }

    /// Access the underlying libSQL connection for direct queries.
    #[must_use]
    pub const fn conn(&self) -> &libsql::Connection {
        &self.conn
    }

    /// Generate a prefixed ID via libSQL. Returns e.g., `"crs-a3f8b2c1"`.
    ///
    /// Uses `randomblob(4)` in SQL to produce 8-char hex, then prepends the prefix.
    ///
    /// # Errors
    ///
    /// Returns `DatabaseError` if the query fails or returns no rows.
    pub async fn generate_id(&self, prefix: &str) -> Result<String, DatabaseError> {
        let mut rows = self
            .conn
            .query(
                &format!("SELECT '{prefix}-' || lower(hex(randomblob(4)))"),
                (),
            )
            .await?;
        let row = rows.next().await?.ok_or(DatabaseError::NoResult)?;
        Ok(row.get::<String>(0)?)
    }
}
