use std::collections::BTreeMap;

use crate::core::Value;
use crate::model::UpdateAttrs;

/// Operation-global settings: live for one top-level call and are shared by
/// every stage of its chain.
#[derive(Debug, Clone)]
pub struct Settings {
    /// Restrict the update to the supplied columns: no hooks, no timestamp,
    /// no protection filtering.
    pub update_column: bool,
    /// Allow protected fields to be mass-assigned.
    pub ignore_protected_attrs: bool,
    pub save_associations: bool,
    /// Ignore soft-delete scoping; deletes become hard deletes.
    pub unscoped: bool,
    pub(crate) extras: BTreeMap<String, Value>,
}

impl Default for Settings {
    fn default() -> Self {
        Self {
            update_column: false,
            ignore_protected_attrs: false,
            save_associations: true,
            unscoped: false,
            extras: BTreeMap::new(),
        }
    }
}

impl Settings {
    /// Free-form value set by user stages.
    pub fn get(&self, key: &str) -> Option<&Value> {
        self.extras.get(key)
    }

    pub fn set(&mut self, key: impl Into<String>, value: impl Into<Value>) {
        self.extras.insert(key.into(), value.into());
    }
}

/// Instance-local data: belongs to the record being persisted and is handed
/// from early stages to later ones of the same run.
#[derive(Debug, Clone, Default)]
pub struct InstanceData {
    /// Attributes the caller asked to update, before filtering.
    pub update_interface: Option<UpdateAttrs>,
    /// Attributes the update statement will write.
    pub update_attrs: Option<UpdateAttrs>,
    /// This run opened the transaction and is responsible for closing it.
    pub started_transaction: bool,
    pub(crate) extras: BTreeMap<String, Value>,
}

impl InstanceData {
    pub fn with_update_interface(attrs: UpdateAttrs) -> Self {
        Self {
            update_interface: Some(attrs),
            ..Self::default()
        }
    }

    pub fn get(&self, key: &str) -> Option<&Value> {
        self.extras.get(key)
    }

    pub fn set(&mut self, key: impl Into<String>, value: impl Into<Value>) {
        self.extras.insert(key.into(), value.into());
    }
}
