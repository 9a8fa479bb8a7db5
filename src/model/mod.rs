// ============================================================================
// Record Model
// ============================================================================
//
// The read/write surface the callback pipeline sees of a user type: its
// ordered fields, optional lifecycle hooks, related records and the attribute
// maps used for partial updates.
//
// ============================================================================

pub mod association;
pub mod attrs;
pub mod field;
pub mod hooks;
pub mod record;

pub use association::{Association, Relationship};
pub use attrs::UpdateAttrs;
pub use field::Field;
pub use hooks::{
    AfterCreate, AfterDelete, AfterSave, AfterUpdate, BeforeCreate, BeforeDelete, BeforeSave,
    BeforeUpdate, HookKind, HookResult,
};
pub use record::Record;
