//! Transaction and table-lock guards with automatic release on drop
//!
//! [`TransactionGuard`] wraps a connector's begin/commit/rollback so a
//! transaction left open when the guard goes out of scope is rolled back
//! instead of leaking. [`TableLockGuard`] does the same for write locks
//! taken with `lock_table`.

use std::sync::atomic::{AtomicBool, Ordering};
use std::sync::Arc;

use log::{debug, warn};

use crate::core::connector::Connector;
use crate::core::cursor::ResultSet;
use crate::core::error::{DatabaseError, Result};
use crate::core::statement::Statement;

/// Transaction guard that rolls back on drop unless committed
///
/// If the guard is dropped without calling `commit()`, the transaction is
/// rolled back so an early `?` return cannot leave one open.
///
/// ```ignore
/// let tx = TransactionGuard::begin(Arc::clone(&db))?;
/// tx.execute(&Statement::new("UPDATE accounts SET balance = balance - 100 WHERE id = 1"))?;
/// tx.execute(&Statement::new("UPDATE accounts SET balance = balance + 100 WHERE id = 2"))?;
/// tx.commit()?;
/// ```
pub struct TransactionGuard<D: Connector + ?Sized = dyn Connector> {
    db: Arc<D>,
    committed: AtomicBool,
    rolled_back: AtomicBool,
}

impl<D: Connector + ?Sized> TransactionGuard<D> {
    /// Open a transaction on the connector
    pub fn begin(db: Arc<D>) -> Result<Self> {
        db.begin()?;
        Ok(TransactionGuard {
            db,
            committed: AtomicBool::new(false),
            rolled_back: AtomicBool::new(false),
        })
    }

    /// Run a statement inside the transaction
    pub fn execute(&self, statement: &Statement) -> Result<ResultSet> {
        if self.committed.load(Ordering::Acquire) {
            return Err(DatabaseError::transaction(
                "cannot execute on a committed transaction",
            ));
        }
        if self.rolled_back.load(Ordering::Acquire) {
            return Err(DatabaseError::transaction(
                "cannot execute on a rolled back transaction",
            ));
        }
        self.db.execute(statement)
    }

    /// Commit the transaction; the guard performs no rollback afterwards
    pub fn commit(self) -> Result<()> {
        if self.rolled_back.load(Ordering::Acquire) {
            return Err(DatabaseError::transaction(
                "cannot commit a rolled back transaction",
            ));
        }
        self.db.commit()?;
        self.committed.store(true, Ordering::Release);
        Ok(())
    }

    /// Roll the transaction back now instead of waiting for drop
    pub fn rollback(self) -> Result<()> {
        if self.committed.load(Ordering::Acquire) {
            return Err(DatabaseError::transaction(
                "cannot rollback a committed transaction",
            ));
        }
        self.db.rollback()?;
        self.rolled_back.store(true, Ordering::Release);
        Ok(())
    }

    /// Whether the transaction has been committed
    pub fn is_committed(&self) -> bool {
        self.committed.load(Ordering::Acquire)
    }

    /// Whether the transaction has been rolled back
    pub fn is_rolled_back(&self) -> bool {
        self.rolled_back.load(Ordering::Acquire)
    }
}

impl<D: Connector + ?Sized> Drop for TransactionGuard<D> {
    fn drop(&mut self) {
        if self.committed.load(Ordering::Acquire) || self.rolled_back.load(Ordering::Acquire) {
            return;
        }
        self.rolled_back.store(true, Ordering::Release);
        match self.db.rollback() {
            Ok(()) => debug!("open transaction rolled back on drop"),
            Err(e) => warn!("auto-rollback of dropped transaction failed: {e}"),
        }
    }
}

/// Write-lock guard that releases the connection's table locks on drop
pub struct TableLockGuard<D: Connector + ?Sized = dyn Connector> {
    db: Arc<D>,
    released: AtomicBool,
}

impl<D: Connector + ?Sized> TableLockGuard<D> {
    /// Take an exclusive write lock on the table
    pub fn acquire(db: Arc<D>, table: &str) -> Result<Self> {
        db.lock_table(table)?;
        Ok(TableLockGuard {
            db,
            released: AtomicBool::new(false),
        })
    }

    /// Release the lock now instead of waiting for drop
    pub fn unlock(self) -> Result<()> {
        self.released.store(true, Ordering::Release);
        self.db.unlock_tables()
    }
}

impl<D: Connector + ?Sized> Drop for TableLockGuard<D> {
    fn drop(&mut self) {
        if self.released.load(Ordering::Acquire) {
            return;
        }
        if let Err(e) = self.db.unlock_tables() {
            warn!("releasing table locks on drop failed: {e}");
        }
    }
}
