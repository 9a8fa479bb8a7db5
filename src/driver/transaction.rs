// ============================================================================
// Driver Transaction State
// ============================================================================
//
// Lifecycle of one driver-level transaction. Statements executed while the
// transaction is open are buffered and only reach the committed journal on
// commit:
//
// ```text
// Open ──commit──> Committed
//   │
//   └──rollback──> RolledBack
// ```
//
// Ids are handed out by the journal that owns the transaction, so two
// drivers never share a sequence and a fresh driver always starts at 1.
//
// ============================================================================

use std::fmt;

use super::ExecutedStatement;
use crate::core::{DbError, Result};

/// Journal-local transaction number, stamped on every statement it buffers.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord)]
pub struct TransactionId(pub u64);

impl fmt::Display for TransactionId {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "tx#{}", self.0)
    }
}

/// Where a transaction sits in its lifecycle. Only `Open` accepts statements.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum TransactionState {
    Open,
    Committed,
    RolledBack,
}

impl TransactionState {
    fn verb(self) -> &'static str {
        match self {
            TransactionState::Open => "open",
            TransactionState::Committed => "committed",
            TransactionState::RolledBack => "rolled back",
        }
    }
}

impl fmt::Display for TransactionState {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.verb())
    }
}

/// Statements buffered by one open transaction.
#[derive(Debug)]
pub struct Transaction {
    id: TransactionId,
    state: TransactionState,
    pending: Vec<ExecutedStatement>,
}

impl Transaction {
    pub fn open(id: TransactionId) -> Self {
        Self {
            id,
            state: TransactionState::Open,
            pending: Vec::new(),
        }
    }

    pub fn id(&self) -> TransactionId {
        self.id
    }

    pub fn state(&self) -> TransactionState {
        self.state
    }

    pub fn pending(&self) -> &[ExecutedStatement] {
        &self.pending
    }

    /// Buffer a statement, stamping it with this transaction's id.
    pub fn buffer(&mut self, mut statement: ExecutedStatement) -> Result<ExecutedStatement> {
        self.ensure_open("execute")?;
        statement.transaction = Some(self.id);
        self.pending.push(statement.clone());
        Ok(statement)
    }

    /// Close as committed and hand back the buffered statements.
    pub fn commit(&mut self) -> Result<Vec<ExecutedStatement>> {
        self.close("commit", TransactionState::Committed)
    }

    /// Close as rolled back and hand back the discarded statements.
    pub fn rollback(&mut self) -> Result<Vec<ExecutedStatement>> {
        self.close("roll back", TransactionState::RolledBack)
    }

    fn close(&mut self, action: &str, to: TransactionState) -> Result<Vec<ExecutedStatement>> {
        self.ensure_open(action)?;
        self.state = to;
        Ok(std::mem::take(&mut self.pending))
    }

    fn ensure_open(&self, action: &str) -> Result<()> {
        if self.state == TransactionState::Open {
            return Ok(());
        }
        Err(DbError::TransactionError(format!(
            "Cannot {}: transaction {} is already {}",
            action, self.id, self.state
        )))
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::driver::StatementKind;

    fn statement(sql: &str) -> ExecutedStatement {
        ExecutedStatement {
            sql: sql.to_string(),
            vars: Vec::new(),
            kind: StatementKind::Update,
            transaction: None,
        }
    }

    #[test]
    fn test_buffer_stamps_transaction_id() {
        let mut txn = Transaction::open(TransactionId(3));

        let stamped = txn.buffer(statement("UPDATE t SET a = 1")).unwrap();
        assert_eq!(stamped.transaction, Some(TransactionId(3)));
        assert_eq!(txn.pending().len(), 1);

        let flushed = txn.commit().unwrap();
        assert_eq!(flushed.len(), 1);
        assert_eq!(txn.state(), TransactionState::Committed);
    }

    #[test]
    fn test_closed_transaction_rejects_everything() {
        let mut txn = Transaction::open(TransactionId(1));
        txn.commit().unwrap();

        assert!(txn.commit().is_err());
        assert!(txn.rollback().is_err());
        let err = txn.buffer(statement("DELETE FROM t")).unwrap_err();
        assert!(err.to_string().contains("tx#1 is already committed"));
    }

    #[test]
    fn test_rollback_hands_back_statements() {
        let mut txn = Transaction::open(TransactionId(2));
        txn.buffer(statement("DELETE FROM t")).unwrap();

        let discarded = txn.rollback().unwrap();
        assert_eq!(discarded.len(), 1);
        assert!(txn.pending().is_empty());
        assert_eq!(txn.state(), TransactionState::RolledBack);
    }
}
