use crate::core::{Result, Value};
use crate::model::Relationship;
use crate::scope::{Scope, primary_field, set_record_column};

/// Save belongs-to records first so the owner can store their keys.
pub fn save_before_associations(scope: &mut Scope<'_>) {
    if scope.has_error() || !scope.settings().save_associations {
        return;
    }

    let foreign_keys = match save_belongs_to(scope) {
        Ok(keys) => keys,
        Err(e) => return scope.err(e),
    };

    for (foreign_key, value) in foreign_keys {
        if let Err(e) = scope.set_column(&foreign_key, value) {
            return scope.err(e);
        }
    }
}

fn save_belongs_to(scope: &mut Scope<'_>) -> Result<Vec<(String, Value)>> {
    let mut foreign_keys = Vec::new();
    let (associations, mut saver) = scope.split_associations();

    for association in associations {
        let Relationship::BelongsTo { foreign_key } = &association.relationship else {
            continue;
        };

        for related in association.records {
            saver.save(&mut *related)?;
            if let Some(pk) = primary_field(&*related) {
                foreign_keys.push((foreign_key.clone(), pk.value));
            }
        }
    }

    Ok(foreign_keys)
}

/// Point has-one/has-many records at the owner, then save them.
pub fn save_after_associations(scope: &mut Scope<'_>) {
    if scope.has_error() || !scope.settings().save_associations {
        return;
    }

    let owner_key = scope.primary_field().map(|f| f.value);
    if let Err(e) = save_children(scope, owner_key) {
        scope.err(e);
    }
}

fn save_children(scope: &mut Scope<'_>, owner_key: Option<Value>) -> Result<()> {
    let (associations, mut saver) = scope.split_associations();

    for association in associations {
        if association.relationship.is_belongs_to() {
            continue;
        }
        let foreign_key = association.relationship.foreign_key().to_string();

        for related in association.records {
            if let Some(key) = owner_key.clone().filter(|k| !k.is_blank()) {
                set_record_column(&mut *related, &foreign_key, key)?;
            }
            saver.save(&mut *related)?;
        }
    }

    Ok(())
}
