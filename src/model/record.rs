use crate::core::{Result, Value};
use crate::model::{
    AfterCreate, AfterDelete, AfterSave, AfterUpdate, Association, BeforeCreate, BeforeDelete,
    BeforeSave, BeforeUpdate, Field,
};

/// Accessor the callback pipeline uses to read and write a mapped record.
///
/// `fields` must report columns in declaration order; generated SET clauses
/// follow that order. Hooks are opt-in: override the matching `as_*` method to
/// return `Some(self)` for every lifecycle trait the type implements.
pub trait Record {
    fn table_name(&self) -> String;

    fn fields(&self) -> Vec<Field>;

    /// Assign a field by its Rust name.
    fn set_field(&mut self, name: &str, value: Value) -> Result<()>;

    fn associations(&mut self) -> Vec<Association<'_>> {
        Vec::new()
    }

    fn as_before_save(&mut self) -> Option<&mut dyn BeforeSave> {
        None
    }

    fn as_before_create(&mut self) -> Option<&mut dyn BeforeCreate> {
        None
    }

    fn as_before_update(&mut self) -> Option<&mut dyn BeforeUpdate> {
        None
    }

    fn as_before_delete(&mut self) -> Option<&mut dyn BeforeDelete> {
        None
    }

    fn as_after_create(&mut self) -> Option<&mut dyn AfterCreate> {
        None
    }

    fn as_after_update(&mut self) -> Option<&mut dyn AfterUpdate> {
        None
    }

    fn as_after_delete(&mut self) -> Option<&mut dyn AfterDelete> {
        None
    }

    fn as_after_save(&mut self) -> Option<&mut dyn AfterSave> {
        None
    }
}
