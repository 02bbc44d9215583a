use std::path::{Path, PathBuf};
use std::sync::{Mutex, MutexGuard};
use std::time::Duration;

use rusqlite::{Connection, ErrorCode, Transaction, TransactionBehavior};

use crate::errors::{Result, VaultError};

pub mod bucket;
pub mod prompts;
pub mod schema;

pub use bucket::Bucket;

/// Options applied when opening a file-backed store
#[derive(Debug, Clone)]
pub struct StoreOptions {
    /// How long to wait for a competing lock before giving up
    pub lock_timeout: Duration,
}

impl Default for StoreOptions {
    fn default() -> Self {
        Self {
            lock_timeout: Duration::from_secs(1),
        }
    }
}

/// Embedded transactional store
///
/// Wraps a single SQLite connection. All transactions are serialized through
/// the connection mutex, and a file-backed store holds an exclusive lock on
/// its file for as long as the `Db` is alive.
///
/// [`Db::view`] takes the same mutex as [`Db::update`], so reads do not run
/// alongside writes: a read issued while a write is in flight waits for it to
/// commit or roll back, then sees the result.
pub struct Db {
    conn: Mutex<Connection>,
    path: Option<PathBuf>,
}

impl Db {
    /// Open (or create) the store at `path` and claim it for this process
    pub fn open(path: &Path, options: &StoreOptions) -> Result<Self> {
        if let Some(parent) = path.parent() {
            if !parent.as_os_str().is_empty() {
                std::fs::create_dir_all(parent)?;
            }
        }

        let conn = Connection::open(path)?;
        conn.busy_timeout(options.lock_timeout)?;

        Self::prepare_file(&conn).map_err(|err| locked_or(err, path))?;

        tracing::debug!(path = %path.display(), "opened prompt store");

        Ok(Self {
            conn: Mutex::new(conn),
            path: Some(path.to_path_buf()),
        })
    }

    /// Open a private in-memory store (used by tests and dry runs)
    pub fn open_in_memory() -> Result<Self> {
        let conn = Connection::open_in_memory()?;
        conn.execute_batch("PRAGMA foreign_keys = ON;")?;
        conn.execute_batch(schema::SCHEMA)?;

        Ok(Self {
            conn: Mutex::new(conn),
            path: None,
        })
    }

    /// Backing file, or `None` for in-memory stores
    pub fn path(&self) -> Option<&Path> {
        self.path.as_deref()
    }

    fn prepare_file(conn: &Connection) -> rusqlite::Result<()> {
        // Exclusive locking mode keeps the file lock after the first write
        // transaction, so the claim below lasts for the connection's lifetime.
        conn.execute_batch(
            "PRAGMA locking_mode = EXCLUSIVE;
             PRAGMA journal_mode = DELETE;
             PRAGMA synchronous = FULL;
             PRAGMA foreign_keys = ON;",
        )?;
        conn.execute_batch(schema::SCHEMA)?;
        conn.execute_batch("BEGIN EXCLUSIVE; COMMIT;")?;
        Ok(())
    }

    /// Run `f` inside a read-write transaction
    ///
    /// Commits when `f` returns `Ok`. Any error rolls the whole transaction
    /// back, so callers never observe partial writes.
    pub fn update<T, F>(&self, f: F) -> Result<T>
    where
        F: FnOnce(&Transaction<'_>) -> Result<T>,
    {
        let mut conn = self.lock()?;
        let tx = conn.transaction_with_behavior(TransactionBehavior::Immediate)?;
        let value = f(&tx)?;
        tx.commit()?;
        Ok(value)
    }

    /// Run `f` inside a read-only transaction over a consistent snapshot
    pub fn view<T, F>(&self, f: F) -> Result<T>
    where
        F: FnOnce(&Transaction<'_>) -> Result<T>,
    {
        let mut conn = self.lock()?;
        let tx = conn.transaction_with_behavior(TransactionBehavior::Deferred)?;
        let value = f(&tx)?;
        tx.rollback()?;
        Ok(value)
    }

    fn lock(&self) -> Result<MutexGuard<'_, Connection>> {
        self.conn
            .lock()
            .map_err(|_| VaultError::Other("Database connection mutex poisoned".into()))
    }
}

fn locked_or(err: rusqlite::Error, path: &Path) -> VaultError {
    match err.sqlite_error_code() {
        Some(ErrorCode::DatabaseBusy) | Some(ErrorCode::DatabaseLocked) => {
            VaultError::StoreLocked(path.to_path_buf())
        },
        _ => VaultError::Database(err),
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use tempfile::tempdir;

    fn fast_fail() -> StoreOptions {
        StoreOptions {
            lock_timeout: Duration::from_millis(50),
        }
    }

    #[test]
    fn test_open_creates_parent_directories() {
        let dir = tempdir().unwrap();
        let path = dir.path().join("nested").join("vault").join("prompts.db");

        let db = Db::open(&path, &StoreOptions::default()).unwrap();
        assert!(path.exists());
        assert_eq!(db.path(), Some(path.as_path()));
    }

    #[test]
    fn test_in_memory_has_no_path() {
        let db = Db::open_in_memory().unwrap();
        assert!(db.path().is_none());
    }

    #[test]
    fn test_update_commits_on_ok() {
        let db = Db::open_in_memory().unwrap();
        db.update(|tx| {
            Bucket::create_if_not_exists(tx, "prompts")?.put(b"k", b"v")?;
            Ok(())
        })
        .unwrap();

        let value = db
            .view(|tx| Bucket::open(tx, "prompts")?.unwrap().get(b"k"))
            .unwrap();
        assert_eq!(value, Some(b"v".to_vec()));
    }

    #[test]
    fn test_update_rolls_back_on_error() {
        let db = Db::open_in_memory().unwrap();
        let result: Result<()> = db.update(|tx| {
            let bucket = Bucket::create_if_not_exists(tx, "prompts")?;
            bucket.next_sequence()?;
            bucket.put(b"k", b"v")?;
            Err(VaultError::Other("abort".into()))
        });
        assert!(result.is_err());

        // Neither the bucket, the entry nor the sequence bump survived
        let exists = db.view(|tx| Ok(Bucket::open(tx, "prompts")?.is_some())).unwrap();
        assert!(!exists);
    }

    #[test]
    fn test_view_does_not_persist_writes() {
        let db = Db::open_in_memory().unwrap();
        db.view(|tx| {
            Bucket::create_if_not_exists(tx, "prompts")?;
            Ok(())
        })
        .unwrap();

        let exists = db.view(|tx| Ok(Bucket::open(tx, "prompts")?.is_some())).unwrap();
        assert!(!exists);
    }

    #[test]
    fn test_view_waits_for_inflight_update() {
        use std::sync::{mpsc, Arc};
        use std::thread;

        let db = Arc::new(Db::open_in_memory().unwrap());
        let (started, wait_started) = mpsc::channel();

        let writer = {
            let db = db.clone();
            thread::spawn(move || {
                db.update(|tx| {
                    started.send(()).unwrap();
                    thread::sleep(Duration::from_millis(50));
                    Bucket::create_if_not_exists(tx, "prompts")?.put(b"k", b"v")?;
                    Ok(())
                })
                .unwrap();
            })
        };

        wait_started.recv().unwrap();
        let value = db
            .view(|tx| match Bucket::open(tx, "prompts")? {
                Some(bucket) => bucket.get(b"k"),
                None => Ok(None),
            })
            .unwrap();
        writer.join().unwrap();

        assert_eq!(value, Some(b"v".to_vec()));
    }

    #[test]
    fn test_reopen_keeps_data() {
        let dir = tempdir().unwrap();
        let path = dir.path().join("prompts.db");

        {
            let db = Db::open(&path, &StoreOptions::default()).unwrap();
            db.update(|tx| {
                let bucket = Bucket::create_if_not_exists(tx, "prompts")?;
                bucket.next_sequence()?;
                bucket.put(b"k", b"v")
            })
            .unwrap();
        }

        let db = Db::open(&path, &StoreOptions::default()).unwrap();
        let (value, seq) = db
            .view(|tx| {
                let bucket = Bucket::open(tx, "prompts")?.unwrap();
                Ok((bucket.get(b"k")?, bucket.sequence()?))
            })
            .unwrap();
        assert_eq!(value, Some(b"v".to_vec()));
        assert_eq!(seq, 1);
    }

    #[test]
    fn test_second_open_is_rejected_while_locked() {
        let dir = tempdir().unwrap();
        let path = dir.path().join("prompts.db");

        let _first = Db::open(&path, &fast_fail()).unwrap();
        match Db::open(&path, &fast_fail()) {
            Err(VaultError::StoreLocked(locked)) => assert_eq!(locked, path),
            Err(other) => panic!("Expected StoreLocked, got {other:?}"),
            Ok(_) => panic!("Second open should fail while the store is held"),
        }
    }

    #[test]
    fn test_lock_released_on_drop() {
        let dir = tempdir().unwrap();
        let path = dir.path().join("prompts.db");

        drop(Db::open(&path, &fast_fail()).unwrap());
        assert!(Db::open(&path, &fast_fail()).is_ok());
    }
}
