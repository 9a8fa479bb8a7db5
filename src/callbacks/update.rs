use crate::core::Result;
use crate::model::{HookKind, UpdateAttrs};
use crate::scope::Scope;

/// Fields a full-record update never writes, whatever their flags say.
pub const UPDATE_EXCLUDED_FIELDS: [&str; 2] = ["CreatedAt", "DeletedAt"];

/// Resolve caller-supplied attributes into the set the update will write.
///
/// With `update_column` every attribute is written: known fields are assigned
/// into the record and keyed by their column, unknown keys go to SQL as
/// given. Otherwise unknown, protected (unless protection is ignored) and
/// unchanged columns are dropped and the survivors are assigned into the
/// record. If nothing survives the rest of the chain is skipped.
pub fn assign_update_attributes(scope: &mut Scope<'_>) {
    let Some(attrs) = scope.instance().update_interface.clone() else {
        return;
    };
    if attrs.is_empty() {
        return;
    }

    if scope.settings().update_column {
        match verbatim_attrs(scope, &attrs) {
            Ok(resolved) => scope.instance_mut().update_attrs = Some(resolved),
            Err(e) => scope.err(e),
        }
        return;
    }

    let ignore_protected = scope.settings().ignore_protected_attrs;
    match updated_attrs_with_values(scope, &attrs, ignore_protected) {
        Ok(resolved) if resolved.is_empty() => scope.skip_left(),
        Ok(resolved) => scope.instance_mut().update_attrs = Some(resolved),
        Err(e) => scope.err(e),
    }
}

/// Every attribute, keyed by column name where the record knows the field.
fn verbatim_attrs(scope: &mut Scope<'_>, attrs: &UpdateAttrs) -> Result<UpdateAttrs> {
    let mut resolved = UpdateAttrs::new();

    for (key, value) in attrs.iter() {
        match scope.field_by_name(key) {
            Some(field) => {
                scope.set_column(&field.name, value.clone())?;
                resolved.insert(&field.db_name, value.clone());
            }
            None => {
                resolved.insert(key, value.clone());
            }
        }
    }

    Ok(resolved)
}

/// Changed, assignable attributes keyed by column name.
fn updated_attrs_with_values(
    scope: &mut Scope<'_>,
    attrs: &UpdateAttrs,
    ignore_protected: bool,
) -> Result<UpdateAttrs> {
    let mut resolved = UpdateAttrs::new();

    for (key, value) in attrs.iter() {
        let Some(field) = scope.field_by_name(key) else {
            continue;
        };
        if !field.is_normal || field.is_ignored {
            continue;
        }
        if field.is_protected && !ignore_protected {
            continue;
        }
        if field.value == *value {
            continue;
        }

        scope.set_column(&field.name, value.clone())?;
        resolved.insert(&field.db_name, value.clone());
    }

    Ok(resolved)
}

pub fn before_update(scope: &mut Scope<'_>) {
    if !scope.settings().update_column {
        scope.call_method(HookKind::BeforeSave);
        scope.call_method(HookKind::BeforeUpdate);
    }
}

pub fn update_time_stamp_when_update(scope: &mut Scope<'_>) {
    if !scope.settings().update_column {
        stamp(scope, "UpdatedAt");
    }
}

/// Set a timestamp column to the scope's clock. Records without the column
/// are left alone; any other failure becomes the scope error.
pub(super) fn stamp(scope: &mut Scope<'_>, column: &str) {
    if scope.has_error() || !scope.has_field(column) {
        return;
    }
    let now = scope.now();
    if let Err(e) = scope.set_column(column, now) {
        scope.err(e);
    }
}

/// Build and execute the single UPDATE statement of this call.
pub fn update(scope: &mut Scope<'_>) {
    if scope.has_error() {
        return;
    }

    let mut sqls = Vec::new();

    if let Some(attrs) = scope.instance().update_attrs.clone() {
        for (column, value) in attrs.iter() {
            let column = scope.quote(column);
            let placeholder = scope.add_to_vars(value.clone());
            sqls.push(format!("{} = {}", column, placeholder));
        }
    } else {
        for field in scope.fields() {
            if UPDATE_EXCLUDED_FIELDS.contains(&field.name.as_str()) {
                continue;
            }

            if !field.is_primary_key && field.is_normal && !field.is_ignored {
                let column = scope.quote(&field.db_name);
                let placeholder = scope.add_to_vars(field.value);
                sqls.push(format!("{} = {}", column, placeholder));
            }
        }
    }

    if sqls.is_empty() {
        return;
    }

    let conditions = match scope.combined_condition_sql() {
        Ok(conditions) => conditions,
        Err(e) => return scope.err(e),
    };

    let mut sql = format!("UPDATE {} SET {}", scope.quoted_table_name(), sqls.join(", "));
    if !conditions.is_empty() {
        sql.push(' ');
        sql.push_str(&conditions);
    }

    scope.raw(sql);
    scope.exec();
}

pub fn after_update(scope: &mut Scope<'_>) {
    if !scope.settings().update_column {
        scope.call_method(HookKind::AfterUpdate);
        scope.call_method(HookKind::AfterSave);
    }
}
