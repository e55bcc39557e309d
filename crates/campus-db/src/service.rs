//! Service layer orchestrating database mutations with audit.
//!
//! `CampusService` wraps `CampusDb` (raw database access) and the connection gate.
//! All repo methods are implemented as `impl CampusService` blocks under
//! `repos/`, and the batch planner lives in `planner`.

use std::sync::{Mutex as StdMutex, PoisonError};

use campus_config::DatabaseConfig;
use campus_core::enums::EntityType;
use tokio::sync::{Mutex, MutexGuard};
use tokio::task;

use crate::CampusDb;
use crate::error::DatabaseError;
use crate::helpers::entity_type_to_table;

/// Task that holds the gate. `None` is the future driven by `block_on`.
type Holder = Option<task::Id>;

/// Orchestrates database mutations with an audit trail.
///
/// Every mutation method follows this protocol:
/// 1. Acquire the gate
/// 2. Begin a transaction (multi-statement mutations)
/// 3. Execute SQL; seat counters move only through conditional UPDATEs
/// 4. Append audit entry (inside transaction)
/// 5. Commit, or roll back on any error
///
/// Public reads take the same gate, so they never observe a transaction
/// that is still open on the shared connection. The gate is reentrant per
/// tokio task: a mutation may call the reads it is built from. Service
/// futures that must exclude each other belong in separate tasks, not in
/// one `join!`.
pub struct CampusService {
    db: CampusDb,
    gate: Mutex<()>,
    holder: StdMutex<Option<Holder>>,
}

/// The gate as held by the current task. Released on drop.
pub(crate) struct GateGuard<'a> {
    _lock: MutexGuard<'a, ()>,
    holder: &'a StdMutex<Option<Holder>>,
}

impl Drop for GateGuard<'_> {
    fn drop(&mut self) {
        // Runs before `_lock` is released.
        *self.holder.lock().unwrap_or_else(PoisonError::into_inner) = None;
    }
}

impl CampusService {
    /// Create a new service wrapping a local database.
    ///
    /// # Arguments
    ///
    /// * `db_path` - Path to the libSQL database file, or `":memory:"` for tests.
    ///
    /// # Errors
    ///
    /// Returns `DatabaseError` if the database cannot be opened.
    pub async fn new_local(db_path: &str) -> Result<Self, DatabaseError> {
        let db = CampusDb::open_local(db_path).await?;
        Ok(Self::from_db(db))
    }

    /// Open the database named by the `[database]` config section.
    ///
    /// # Errors
    ///
    /// Returns `DatabaseError` if the parent directory cannot be created or
    /// the database cannot be opened.
    pub async fn from_config(config: &DatabaseConfig) -> Result<Self, DatabaseError> {
        let parent = std::path::Path::new(&config.path)
            .parent()
            .filter(|p| !p.as_os_str().is_empty());
        if let (false, Some(parent)) = (config.is_in_memory(), parent) {
            std::fs::create_dir_all(parent).map_err(|e| {
                DatabaseError::Other(anyhow::anyhow!(
                    "creating database directory {}: {e}",
                    parent.display()
                ))
            })?;
        }
        Self::new_local(&config.path).await
    }

    /// Create from an existing `CampusDb` (for testing).
    #[must_use]
    pub fn from_db(db: CampusDb) -> Self {
        Self {
            db,
            gate: Mutex::new(()),
            holder: StdMutex::new(None),
        }
    }

    /// Access the underlying database handle.
    #[must_use]
    pub const fn db(&self) -> &CampusDb {
        &self.db
    }

    /// Hold the gate for the rest of the caller's scope. Returns `None` when
    /// the current task already holds it.
    pub(crate) async fn gate(&self) -> Option<GateGuard<'_>> {
        let me = task::try_id();
        let held_here =
            *self.holder.lock().unwrap_or_else(PoisonError::into_inner) == Some(me);
        if held_here {
            return None;
        }
        let lock = self.gate.lock().await;
        *self.holder.lock().unwrap_or_else(PoisonError::into_inner) = Some(me);
        Some(GateGuard {
            _lock: lock,
            holder: &self.holder,
        })
    }

    /// Open a transaction on the shared connection. Must be called with the
    /// gate held.
    pub(crate) async fn begin(&self) -> Result<libsql::Transaction, DatabaseError> {
        Ok(self.db.conn().transaction().await?)
    }

    /// Fail with `NotFound` unless a row with `id` exists in `entity`'s table.
    pub(crate) async fn ensure_exists(
        &self,
        entity: EntityType,
        label: &str,
        id: &str,
    ) -> Result<(), DatabaseError> {
        let _gate = self.gate().await;
        let sql = format!(
            "SELECT 1 FROM {} WHERE id = ?1",
            entity_type_to_table(entity)
        );
        let mut rows = self.db.conn().query(&sql, [id]).await?;
        if rows.next().await?.is_some() {
            Ok(())
        } else {
            Err(DatabaseError::not_found(label, id))
        }
    }
}

/// Commit `tx` if `result` is `Ok`, otherwise roll it back and return the
/// original error.
pub(crate) async fn finish<T>(
    tx: libsql::Transaction,
    result: Result<T, DatabaseError>,
) -> Result<T, DatabaseError> {
    match result {
        Ok(value) => {
            tx.commit().await?;
            Ok(value)
        }
        Err(e) => {
            if let Err(rollback) = tx.rollback().await {
                tracing::warn!(error = %rollback, "transaction rollback failed");
            }
            Err(e)
        }
    }
}

#[cfg(test)]
mod tests {
    use std::sync::Arc;

    use crate::test_support::helpers::{batch, published_course, test_service, trainer};
    use pretty_assertions::assert_eq;

    #[tokio::test]
    async fn gate_is_reentrant_within_a_task() {
        let svc = test_service().await;
        let outer = svc.gate().await;
        assert!(outer.is_some());
        assert!(svc.gate().await.is_none());
        drop(outer);
        assert!(svc.gate().await.is_some());
    }

    #[tokio::test]
    async fn reads_never_see_an_open_transaction() {
        let svc = Arc::new(test_service().await);
        let tutor = trainer(&svc).await;
        let course = published_course(&svc, 40, 10).await;
        let b = batch(&svc, &course.id, &tutor.id, 5).await;

        let gate = svc.gate().await;
        let tx = svc.begin().await.unwrap();
        svc.reserve_batch_seats(&b.id, 3).await.unwrap();
        assert_eq!(svc.get_batch(&b.id).await.unwrap().current_students, 3);

        let reader = tokio::spawn({
            let svc = Arc::clone(&svc);
            let id = b.id.clone();
            async move { svc.get_batch(&id).await.unwrap().current_students }
        });
        for _ in 0..10 {
            tokio::task::yield_now().await;
        }
        assert!(!reader.is_finished());

        tx.rollback().await.unwrap();
        drop(gate);
        assert_eq!(reader.await.unwrap(), 0);
    }
}
