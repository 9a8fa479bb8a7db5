// ============================================================================
// Scope
// ============================================================================
//
// Per-call state shared by the stages of one callback chain. Two lifetimes of
// data live here:
// - Settings: operation-global, one top-level call
// - InstanceData: instance-local, the record being persisted in this run
//
// ============================================================================

pub mod data;
pub mod scope;
pub mod search;

pub use data::{InstanceData, Settings};
pub use scope::{
    AssociationSaver, NowFn, Scope, ScopeEnv, primary_field, run_operation, set_record_column,
};
pub use search::{Condition, Search};
