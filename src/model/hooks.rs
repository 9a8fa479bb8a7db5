use std::fmt;

use crate::core::BoxError;
use crate::model::Record;

/// Outcome of a user lifecycle hook. Any error type converts into the boxed
/// cause and is reported as `DbError::Hook`.
pub type HookResult = std::result::Result<(), BoxError>;

/// Lifecycle points a record can opt into.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum HookKind {
    BeforeSave,
    BeforeCreate,
    BeforeUpdate,
    BeforeDelete,
    AfterCreate,
    AfterUpdate,
    AfterDelete,
    AfterSave,
}

impl HookKind {
    pub fn as_str(&self) -> &'static str {
        match self {
            Self::BeforeSave => "BeforeSave",
            Self::BeforeCreate => "BeforeCreate",
            Self::BeforeUpdate => "BeforeUpdate",
            Self::BeforeDelete => "BeforeDelete",
            Self::AfterCreate => "AfterCreate",
            Self::AfterUpdate => "AfterUpdate",
            Self::AfterDelete => "AfterDelete",
            Self::AfterSave => "AfterSave",
        }
    }
}

impl fmt::Display for HookKind {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

macro_rules! hook_traits {
    ($($(#[$doc:meta])* $trait_name:ident :: $method:ident;)*) => {
        $(
            $(#[$doc])*
            pub trait $trait_name {
                fn $method(&mut self) -> HookResult;
            }
        )*
    };
}

hook_traits! {
    /// Runs before both create and update.
    BeforeSave::before_save;
    BeforeCreate::before_create;
    BeforeUpdate::before_update;
    BeforeDelete::before_delete;
    AfterCreate::after_create;
    AfterUpdate::after_update;
    AfterDelete::after_delete;
    /// Runs after both create and update.
    AfterSave::after_save;
}

/// Invoke `hook` on `record` if the record exposes that capability.
///
/// Returns `Ok(false)` when the record does not implement the hook.
pub fn invoke(record: &mut dyn Record, hook: HookKind) -> std::result::Result<bool, BoxError> {
    let outcome = match hook {
        HookKind::BeforeSave => record.as_before_save().map(|h| h.before_save()),
        HookKind::BeforeCreate => record.as_before_create().map(|h| h.before_create()),
        HookKind::BeforeUpdate => record.as_before_update().map(|h| h.before_update()),
        HookKind::BeforeDelete => record.as_before_delete().map(|h| h.before_delete()),
        HookKind::AfterCreate => record.as_after_create().map(|h| h.after_create()),
        HookKind::AfterUpdate => record.as_after_update().map(|h| h.after_update()),
        HookKind::AfterDelete => record.as_after_delete().map(|h| h.after_delete()),
        HookKind::AfterSave => record.as_after_save().map(|h| h.after_save()),
    };

    match outcome {
        Some(result) => result.map(|_| true),
        None => Ok(false),
    }
}
