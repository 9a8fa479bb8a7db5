use crate::model::HookKind;
use crate::scope::Scope;

pub fn before_delete(scope: &mut Scope<'_>) {
    scope.call_method(HookKind::BeforeDelete);
}

/// Soft delete (stamp `DeletedAt`) when the record has the column and the call
/// is scoped, hard delete otherwise.
pub fn delete(scope: &mut Scope<'_>) {
    if scope.has_error() {
        return;
    }

    let soft_delete = if scope.settings().unscoped {
        None
    } else {
        scope.field_by_name("DeletedAt")
    };

    let sql = match soft_delete {
        Some(field) => {
            let now = scope.now();
            let column = scope.quote(&field.db_name);
            let placeholder = scope.add_to_vars(now);
            format!("UPDATE {} SET {} = {}", scope.quoted_table_name(), column, placeholder)
        }
        None => format!("DELETE FROM {}", scope.quoted_table_name()),
    };

    let conditions = match scope.combined_condition_sql() {
        Ok(conditions) => conditions,
        Err(e) => return scope.err(e),
    };

    if conditions.is_empty() {
        scope.raw(sql);
    } else {
        scope.raw(format!("{} {}", sql, conditions));
    }
    scope.exec();
}

pub fn after_delete(scope: &mut Scope<'_>) {
    scope.call_method(HookKind::AfterDelete);
}
