// ============================================================================
// Driver Seam
// ============================================================================
//
// The callback pipeline never talks to a database directly. Everything it
// needs from one (statement execution and transaction control) goes through
// `Connection`. `MemoryDriver` is a journaling implementation that validates
// and records statements instead of storing rows.
//
// ============================================================================

pub mod memory;
pub mod transaction;

pub use memory::{MemoryDriver, MemoryDriverError, TransactionEvent};
pub use transaction::{Transaction, TransactionId, TransactionState};

use crate::core::{Result, Value};

/// What the driver reports back for one executed statement.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
pub struct ExecResult {
    pub rows_affected: u64,
    pub last_insert_id: Option<i64>,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum StatementKind {
    Insert,
    Update,
    Delete,
    Other,
}

/// A statement as the driver received it.
#[derive(Debug, Clone, PartialEq)]
pub struct ExecutedStatement {
    pub sql: String,
    pub vars: Vec<Value>,
    pub kind: StatementKind,
    pub transaction: Option<TransactionId>,
}

/// Statement execution and transaction control for one session.
///
/// Implementations report their own failures through `DbError::Driver` so the
/// original error stays reachable through `source()`.
pub trait Connection: Send {
    fn exec(&mut self, sql: &str, vars: &[Value]) -> Result<ExecResult>;

    fn begin(&mut self) -> Result<()>;

    fn commit(&mut self) -> Result<()>;

    fn rollback(&mut self) -> Result<()>;

    fn in_transaction(&self) -> bool;
}

impl<C: Connection + ?Sized> Connection for Box<C> {
    fn exec(&mut self, sql: &str, vars: &[Value]) -> Result<ExecResult> {
        (**self).exec(sql, vars)
    }

    fn begin(&mut self) -> Result<()> {
        (**self).begin()
    }

    fn commit(&mut self) -> Result<()> {
        (**self).commit()
    }

    fn rollback(&mut self) -> Result<()> {
        (**self).rollback()
    }

    fn in_transaction(&self) -> bool {
        (**self).in_transaction()
    }
}
