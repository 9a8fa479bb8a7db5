// ============================================================================
// rowhook Library
// ============================================================================
//
// Callback-driven row persistence. Every create, update and delete runs an
// ordered chain of named stages (attribute assignment, hooks, timestamps,
// associations, SQL generation, transaction control) against one `Scope`.
// Chains live in a `Callback` registry and can be extended or rearranged at
// start-up.
//
// ============================================================================

pub mod callback;
pub mod callbacks;
pub mod config;
pub mod core;
pub mod dialect;
pub mod driver;
pub mod model;
pub mod scope;
pub mod session;

pub use crate::callback::{Callback, Chain, OperationKind, Processor, Stage};
pub use crate::callbacks::DEFAULT_CALLBACK;
pub use crate::config::{DialectKind, SessionConfig};
pub use crate::core::{BoxError, DbError, Result, Value};
pub use crate::dialect::{Dialect, GenericDialect, MysqlDialect, PostgresDialect};
pub use crate::driver::{Connection, ExecResult, MemoryDriver};
pub use crate::model::{Association, Field, HookKind, HookResult, Record, Relationship, UpdateAttrs};
pub use crate::scope::{Condition, Scope, Search};
pub use crate::session::Session;
