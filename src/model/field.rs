use crate::core::{Value, to_db_name};

/// One mapped column of a record, as reported by `Record::fields`.
#[derive(Debug, Clone, PartialEq)]
pub struct Field {
    /// Rust-side field name, e.g. `UpdatedAt`.
    pub name: String,
    /// Column name, e.g. `updated_at`.
    pub db_name: String,
    pub is_primary_key: bool,
    /// `false` for virtual and association fields that have no column.
    pub is_normal: bool,
    pub is_ignored: bool,
    /// Protected fields are dropped from mass assignment unless the call
    /// explicitly ignores protection.
    pub is_protected: bool,
    pub value: Value,
}

impl Field {
    pub fn new(name: impl Into<String>, value: impl Into<Value>) -> Self {
        let name = name.into();
        Self {
            db_name: to_db_name(&name),
            name,
            is_primary_key: false,
            is_normal: true,
            is_ignored: false,
            is_protected: false,
            value: value.into(),
        }
    }

    pub fn primary_key(mut self) -> Self {
        self.is_primary_key = true;
        self
    }

    /// Override the column name derived from the field name.
    pub fn column(mut self, db_name: impl Into<String>) -> Self {
        self.db_name = db_name.into();
        self
    }

    pub fn ignored(mut self) -> Self {
        self.is_ignored = true;
        self
    }

    pub fn protected(mut self) -> Self {
        self.is_protected = true;
        self
    }

    pub fn virtual_field(mut self) -> Self {
        self.is_normal = false;
        self
    }

    pub fn is_blank(&self) -> bool {
        self.value.is_blank()
    }

    /// Matches either the Rust name or the column name.
    pub fn matches(&self, name: &str) -> bool {
        self.name == name || self.db_name == name
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_field_defaults() {
        let field = Field::new("UpdatedAt", Value::Null);
        assert_eq!(field.db_name, "updated_at");
        assert!(field.is_normal);
        assert!(!field.is_primary_key);
        assert!(!field.is_ignored);
        assert!(!field.is_protected);
        assert!(field.matches("UpdatedAt"));
        assert!(field.matches("updated_at"));
        assert!(!field.matches("updatedAt"));
    }

    #[test]
    fn test_field_builders() {
        let field = Field::new("ID", 7).primary_key().column("user_id").protected();
        assert!(field.is_primary_key);
        assert!(field.is_protected);
        assert_eq!(field.db_name, "user_id");
        assert!(!field.is_blank());
    }
}
