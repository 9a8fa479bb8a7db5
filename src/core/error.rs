use thiserror::Error;

use crate::callback::OperationKind;
use crate::model::HookKind;

/// Boxed cause carried by hook and driver failures.
///
/// Kept as a trait object so callers can `downcast_ref` back to the concrete
/// error their hook or driver produced.
pub type BoxError = Box<dyn std::error::Error + Send + Sync + 'static>;

#[derive(Error, Debug)]
pub enum DbError {
    #[error("{hook} hook failed: {source}")]
    Hook {
        hook: HookKind,
        #[source]
        source: BoxError,
    },

    #[error("Driver error: {0}")]
    Driver(#[source] BoxError),

    #[error("Parse error: {0}")]
    ParseError(String),

    #[error("Execution error: {0}")]
    ExecutionError(String),

    #[error("Transaction error: {0}")]
    TransactionError(String),

    #[error("Callback '{0}' already registered for {1}")]
    DuplicateCallback(String, OperationKind),

    #[error("Callback '{0}' not found for {1}")]
    CallbackNotFound(String, OperationKind),

    #[error("Field '{0}' not found on '{1}'")]
    FieldNotFound(String, String),

    #[error("Type mismatch: {0}")]
    TypeMismatch(String),

    #[error("Invalid condition: {0}")]
    InvalidCondition(String),

    #[error("Lock error: {0}")]
    LockError(String),
}

impl DbError {
    /// Wrap a hook failure, keeping the original error as `source()`.
    pub fn hook(hook: HookKind, source: impl Into<BoxError>) -> Self {
        Self::Hook {
            hook,
            source: source.into(),
        }
    }

    /// Wrap an error raised by a database driver.
    pub fn driver(source: impl Into<BoxError>) -> Self {
        Self::Driver(source.into())
    }

    pub fn is_hook(&self) -> bool {
        matches!(self, Self::Hook { .. })
    }

    pub fn is_driver(&self) -> bool {
        matches!(self, Self::Driver(_))
    }
}

pub type Result<T> = std::result::Result<T, DbError>;

impl<T> From<std::sync::PoisonError<T>> for DbError {
    fn from(err: std::sync::PoisonError<T>) -> Self {
        Self::LockError(err.to_string())
    }
}
