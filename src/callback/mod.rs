// ============================================================================
// Callback Registry
// ============================================================================
//
// Named, ordered stages per operation kind (create, update, delete, query,
// row_query). Stages are registered at start-up, compiled into immutable
// `Chain` snapshots and run one after another against a single `Scope`.
//
// ============================================================================

pub mod chain;
pub mod kind;
pub mod registry;

pub use chain::{CallbackFn, Chain, Stage};
pub use kind::OperationKind;
pub use registry::{Callback, Placement, Processor};
