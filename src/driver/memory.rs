use std::collections::HashMap;
use std::sync::{Arc, Mutex, MutexGuard};

use log::debug;
use sqlparser::dialect::GenericDialect;
use sqlparser::parser::Parser;
use sqlparser::tokenizer::{Token, Tokenizer};
use thiserror::Error;

use super::{Connection, ExecResult, ExecutedStatement, StatementKind, Transaction, TransactionId};
use crate::core::{DbError, Result, Value};

/// Failures the memory driver reports, wrapped in `DbError::Driver`.
#[derive(Error, Debug, Clone, PartialEq, Eq)]
pub enum MemoryDriverError {
    #[error("Invalid SQL: {0}")]
    InvalidSql(String),

    #[error("Statement has {placeholders} placeholders but {bound} bound values")]
    PlaceholderMismatch { placeholders: usize, bound: usize },

    #[error("{0}")]
    Injected(String),
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum TransactionEvent {
    Begin(TransactionId),
    Commit(TransactionId),
    Rollback(TransactionId),
}

#[derive(Debug, Default)]
struct JournalState {
    current: Option<Transaction>,
    executed: Vec<ExecutedStatement>,
    committed: Vec<ExecutedStatement>,
    rolled_back: Vec<ExecutedStatement>,
    events: Vec<TransactionEvent>,
    failures: Vec<(String, String)>,
    insert_ids: HashMap<String, i64>,
    rows_affected: Option<u64>,
    last_txn: u64,
}

/// Journaling driver: validates every statement with `sqlparser`, checks that
/// the placeholder count matches the bound values, and records what ran.
///
/// Clones share the same journal, so a test can keep one handle while the
/// session owns the other.
#[derive(Debug, Clone, Default)]
pub struct MemoryDriver {
    state: Arc<Mutex<JournalState>>,
}

impl MemoryDriver {
    pub fn new() -> Self {
        Self::default()
    }

    /// Make every statement containing `pattern` fail with `message`.
    pub fn fail_on(&self, pattern: impl Into<String>, message: impl Into<String>) {
        self.lock_state()
            .failures
            .push((pattern.into(), message.into()));
    }

    /// Rows-affected reported for updates and deletes (default 1).
    pub fn set_rows_affected(&self, rows: u64) {
        self.lock_state().rows_affected = Some(rows);
    }

    /// Every statement that executed, in order, regardless of its transaction's fate.
    pub fn executed(&self) -> Vec<ExecutedStatement> {
        self.lock_state().executed.clone()
    }

    pub fn committed(&self) -> Vec<ExecutedStatement> {
        self.lock_state().committed.clone()
    }

    pub fn rolled_back(&self) -> Vec<ExecutedStatement> {
        self.lock_state().rolled_back.clone()
    }

    pub fn events(&self) -> Vec<TransactionEvent> {
        self.lock_state().events.clone()
    }

    pub fn exec_count(&self) -> usize {
        self.lock_state().executed.len()
    }

    pub fn last_sql(&self) -> Option<String> {
        self.lock_state().executed.last().map(|s| s.sql.clone())
    }

    // Inspection must keep working after a panicking test thread.
    fn lock_state(&self) -> MutexGuard<'_, JournalState> {
        self.state.lock().unwrap_or_else(|poisoned| poisoned.into_inner())
    }
}

impl Connection for MemoryDriver {
    fn exec(&mut self, sql: &str, vars: &[Value]) -> Result<ExecResult> {
        let tokens = Tokenizer::new(&GenericDialect {}, sql)
            .tokenize()
            .map_err(|e| DbError::driver(MemoryDriverError::InvalidSql(e.to_string())))?;

        let placeholders = tokens
            .iter()
            .filter(|t| matches!(t, Token::Placeholder(_)))
            .count();
        if placeholders != vars.len() {
            return Err(DbError::driver(MemoryDriverError::PlaceholderMismatch {
                placeholders,
                bound: vars.len(),
            }));
        }

        Parser::parse_sql(&GenericDialect {}, sql)
            .map_err(|e| DbError::driver(MemoryDriverError::InvalidSql(e.to_string())))?;

        let mut guard = self.state.lock()?;
        let state = &mut *guard;

        if let Some((_, message)) = state
            .failures
            .iter()
            .find(|(pattern, _)| sql.contains(pattern.as_str()))
        {
            return Err(DbError::driver(MemoryDriverError::Injected(message.clone())));
        }

        let kind = statement_kind(&tokens);
        let rows_affected = match kind {
            StatementKind::Insert => 1,
            _ => state.rows_affected.unwrap_or(1),
        };
        let last_insert_id = match kind {
            StatementKind::Insert => {
                let table = insert_target(&tokens).unwrap_or_default();
                let next = state.insert_ids.entry(table).or_insert(0);
                *next += 1;
                Some(*next)
            }
            _ => None,
        };

        let statement = ExecutedStatement {
            sql: sql.to_string(),
            vars: vars.to_vec(),
            kind,
            transaction: None,
        };

        debug!("MemoryDriver exec: {} with vars: {:?}", sql, vars);

        match state.current.as_mut() {
            Some(txn) => {
                let statement = txn.buffer(statement)?;
                state.executed.push(statement);
            }
            None => {
                state.executed.push(statement.clone());
                state.committed.push(statement);
            }
        }

        Ok(ExecResult {
            rows_affected,
            last_insert_id,
        })
    }

    fn begin(&mut self) -> Result<()> {
        let mut state = self.state.lock()?;
        if let Some(txn) = &state.current {
            return Err(DbError::TransactionError(format!(
                "Transaction {} already active",
                txn.id()
            )));
        }

        state.last_txn += 1;
        let txn = Transaction::open(TransactionId(state.last_txn));
        debug!("MemoryDriver begin {}", txn.id());
        state.events.push(TransactionEvent::Begin(txn.id()));
        state.current = Some(txn);
        Ok(())
    }

    fn commit(&mut self) -> Result<()> {
        let mut state = self.state.lock()?;
        let mut txn = state
            .current
            .take()
            .ok_or_else(|| DbError::TransactionError("No active transaction to commit".into()))?;

        let statements = txn.commit()?;
        debug!("MemoryDriver commit {} ({} statements)", txn.id(), statements.len());
        state.committed.extend(statements);
        state.events.push(TransactionEvent::Commit(txn.id()));
        Ok(())
    }

    fn rollback(&mut self) -> Result<()> {
        let mut state = self.state.lock()?;
        let mut txn = state
            .current
            .take()
            .ok_or_else(|| DbError::TransactionError("No active transaction to roll back".into()))?;

        let statements = txn.rollback()?;
        debug!("MemoryDriver rollback {} ({} statements)", txn.id(), statements.len());
        state.rolled_back.extend(statements);
        state.events.push(TransactionEvent::Rollback(txn.id()));
        Ok(())
    }

    fn in_transaction(&self) -> bool {
        self.lock_state().current.is_some()
    }
}

fn words(tokens: &[Token]) -> impl Iterator<Item = &sqlparser::tokenizer::Word> {
    tokens.iter().filter_map(|t| match t {
        Token::Word(w) => Some(w),
        _ => None,
    })
}

fn statement_kind(tokens: &[Token]) -> StatementKind {
    let first = words(tokens).next().map(|w| w.value.to_ascii_uppercase());
    match first.as_deref() {
        Some("INSERT") => StatementKind::Insert,
        Some("UPDATE") => StatementKind::Update,
        Some("DELETE") => StatementKind::Delete,
        _ => StatementKind::Other,
    }
}

fn insert_target(tokens: &[Token]) -> Option<String> {
    let mut iter = words(tokens);
    iter.find(|w| w.value.eq_ignore_ascii_case("INTO"))?;
    iter.next().map(|w| w.value.clone())
}
