// ============================================================================
// Built-in Stages
// ============================================================================
//
// The default create, update and delete chains. Transaction and association
// stages are shared between create and update; delete reuses the transaction
// pair. Query and row_query chains start empty.
//
// ============================================================================

pub mod associations;
pub mod create;
pub mod delete;
pub mod transaction;
pub mod update;

use std::sync::Arc;

use lazy_static::lazy_static;

use crate::callback::{Callback, OperationKind, Stage};

pub const BEGIN_TRANSACTION: &str = "rowhook:begin_transaction";
pub const COMMIT_OR_ROLLBACK_TRANSACTION: &str = "rowhook:commit_or_rollback_transaction";
pub const SAVE_BEFORE_ASSOCIATIONS: &str = "rowhook:save_before_associations";
pub const SAVE_AFTER_ASSOCIATIONS: &str = "rowhook:save_after_associations";

pub const ASSIGN_UPDATE_ATTRIBUTES: &str = "rowhook:assign_update_attributes";
pub const BEFORE_UPDATE: &str = "rowhook:before_update";
pub const UPDATE_TIME_STAMP_WHEN_UPDATE: &str = "rowhook:update_time_stamp_when_update";
pub const UPDATE: &str = "rowhook:update";
pub const AFTER_UPDATE: &str = "rowhook:after_update";

pub const BEFORE_CREATE: &str = "rowhook:before_create";
pub const UPDATE_TIME_STAMP_WHEN_CREATE: &str = "rowhook:update_time_stamp_when_create";
pub const CREATE: &str = "rowhook:create";
pub const AFTER_CREATE: &str = "rowhook:after_create";

pub const BEFORE_DELETE: &str = "rowhook:before_delete";
pub const DELETE: &str = "rowhook:delete";
pub const AFTER_DELETE: &str = "rowhook:after_delete";

lazy_static! {
    /// Process-wide registry used by sessions that were not given their own.
    ///
    /// Register custom stages during start-up, before sessions run.
    pub static ref DEFAULT_CALLBACK: Arc<Callback> = Arc::new(Callback::with_defaults());
}

impl Callback {
    /// A fresh registry holding the built-in chains.
    pub fn with_defaults() -> Self {
        Callback::from_stages([
            (OperationKind::Create, default_create_stages()),
            (OperationKind::Update, default_update_stages()),
            (OperationKind::Delete, default_delete_stages()),
        ])
    }
}

pub fn default_update_stages() -> Vec<Stage> {
    vec![
        Stage::new(ASSIGN_UPDATE_ATTRIBUTES, update::assign_update_attributes),
        Stage::new(BEGIN_TRANSACTION, transaction::begin_transaction),
        Stage::new(BEFORE_UPDATE, update::before_update),
        Stage::new(SAVE_BEFORE_ASSOCIATIONS, associations::save_before_associations),
        Stage::new(UPDATE_TIME_STAMP_WHEN_UPDATE, update::update_time_stamp_when_update),
        Stage::new(UPDATE, update::update),
        Stage::new(SAVE_AFTER_ASSOCIATIONS, associations::save_after_associations),
        Stage::new(AFTER_UPDATE, update::after_update),
        Stage::new(COMMIT_OR_ROLLBACK_TRANSACTION, transaction::commit_or_rollback_transaction),
    ]
}

pub fn default_create_stages() -> Vec<Stage> {
    vec![
        Stage::new(BEGIN_TRANSACTION, transaction::begin_transaction),
        Stage::new(BEFORE_CREATE, create::before_create),
        Stage::new(SAVE_BEFORE_ASSOCIATIONS, associations::save_before_associations),
        Stage::new(UPDATE_TIME_STAMP_WHEN_CREATE, create::update_time_stamp_when_create),
        Stage::new(CREATE, create::create),
        Stage::new(SAVE_AFTER_ASSOCIATIONS, associations::save_after_associations),
        Stage::new(AFTER_CREATE, create::after_create),
        Stage::new(COMMIT_OR_ROLLBACK_TRANSACTION, transaction::commit_or_rollback_transaction),
    ]
}

pub fn default_delete_stages() -> Vec<Stage> {
    vec![
        Stage::new(BEGIN_TRANSACTION, transaction::begin_transaction),
        Stage::new(BEFORE_DELETE, delete::before_delete),
        Stage::new(DELETE, delete::delete),
        Stage::new(AFTER_DELETE, delete::after_delete),
        Stage::new(COMMIT_OR_ROLLBACK_TRANSACTION, transaction::commit_or_rollback_transaction),
    ]
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_default_update_order() {
        let chain = Callback::with_defaults().update().compile().unwrap();
        assert_eq!(
            chain.names(),
            vec![
                ASSIGN_UPDATE_ATTRIBUTES,
                BEGIN_TRANSACTION,
                BEFORE_UPDATE,
                SAVE_BEFORE_ASSOCIATIONS,
                UPDATE_TIME_STAMP_WHEN_UPDATE,
                UPDATE,
                SAVE_AFTER_ASSOCIATIONS,
                AFTER_UPDATE,
                COMMIT_OR_ROLLBACK_TRANSACTION,
            ]
        );
    }

    #[test]
    fn test_transaction_stages_bracket_every_default_chain() {
        let callback = Callback::with_defaults();
        for kind in [OperationKind::Create, OperationKind::Update, OperationKind::Delete] {
            let chain = callback.compile(kind).unwrap();
            let names = chain.names();
            assert_eq!(names.last(), Some(&COMMIT_OR_ROLLBACK_TRANSACTION), "{kind}");
            assert!(names.contains(&BEGIN_TRANSACTION), "{kind}");
        }
        assert!(callback.query().compile().unwrap().is_empty());
        assert!(callback.row_query().compile().unwrap().is_empty());
    }

    #[test]
    fn test_default_callback_is_shared() {
        let names = DEFAULT_CALLBACK.names(OperationKind::Delete).unwrap();
        assert_eq!(names.first().map(String::as_str), Some(BEGIN_TRANSACTION));
    }
}
