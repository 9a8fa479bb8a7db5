use crate::core::Value;
use crate::model::HookKind;
use crate::scope::Scope;

use super::update::stamp;

pub fn before_create(scope: &mut Scope<'_>) {
    scope.call_method(HookKind::BeforeSave);
    scope.call_method(HookKind::BeforeCreate);
}

pub fn update_time_stamp_when_create(scope: &mut Scope<'_>) {
    if scope.has_error() {
        return;
    }

    stamp(scope, "CreatedAt");
    stamp(scope, "UpdatedAt");
}

/// INSERT every normal column. A blank primary key is left to the database
/// and filled from the driver's last insert id afterwards.
pub fn create(scope: &mut Scope<'_>) {
    if scope.has_error() {
        return;
    }

    let mut columns = Vec::new();
    let mut placeholders = Vec::new();

    for field in scope.fields() {
        if !field.is_normal || field.is_ignored {
            continue;
        }
        if field.is_primary_key && field.is_blank() {
            continue;
        }

        columns.push(scope.quote(&field.db_name));
        placeholders.push(scope.add_to_vars(field.value));
    }

    let sql = if columns.is_empty() {
        format!("INSERT INTO {} DEFAULT VALUES", scope.quoted_table_name())
    } else {
        format!(
            "INSERT INTO {} ({}) VALUES ({})",
            scope.quoted_table_name(),
            columns.join(", "),
            placeholders.join(", ")
        )
    };

    scope.raw(sql);
    scope.exec();

    if scope.has_error() || !scope.primary_key_zero() {
        return;
    }

    if let (Some(pk), Some(id)) = (scope.primary_field(), scope.last_insert_id()) {
        if let Err(e) = scope.set_column(&pk.name, Value::Integer(id)) {
            scope.err(e);
        }
    }
}

pub fn after_create(scope: &mut Scope<'_>) {
    scope.call_method(HookKind::AfterCreate);
    scope.call_method(HookKind::AfterSave);
}
