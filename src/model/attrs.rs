use std::collections::{BTreeMap, HashMap};

use serde::Serialize;

use crate::core::{DbError, Result, Value, to_db_name};

/// Column/value pairs supplied for a partial update.
///
/// Keys are kept exactly as the caller wrote them: a field name (`Email`), a
/// column name (`email_address`) or a column the record does not know about.
/// Resolving them against the record's fields is the update chain's job.
/// Iteration order is sorted by key, which keeps generated SET clauses
/// deterministic.
#[derive(Debug, Clone, Default, PartialEq)]
pub struct UpdateAttrs(BTreeMap<String, Value>);

impl UpdateAttrs {
    pub fn new() -> Self {
        Self::default()
    }

    /// Builder form of [`UpdateAttrs::insert`].
    pub fn set(mut self, column: impl AsRef<str>, value: impl Into<Value>) -> Self {
        self.insert(column, value);
        self
    }

    pub fn insert(&mut self, column: impl AsRef<str>, value: impl Into<Value>) -> Option<Value> {
        self.0.insert(column.as_ref().to_string(), value.into())
    }

    /// Look up by exact key, then by snake-cased key, so `get("UpdatedAt")`
    /// also finds a value stored under `updated_at`.
    pub fn get(&self, column: &str) -> Option<&Value> {
        if let Some(value) = self.0.get(column) {
            return Some(value);
        }
        let wanted = to_db_name(column);
        self.0
            .iter()
            .find(|(key, _)| to_db_name(key) == wanted)
            .map(|(_, value)| value)
    }

    pub fn contains(&self, column: &str) -> bool {
        self.get(column).is_some()
    }

    pub fn len(&self) -> usize {
        self.0.len()
    }

    pub fn is_empty(&self) -> bool {
        self.0.is_empty()
    }

    pub fn iter(&self) -> impl Iterator<Item = (&str, &Value)> {
        self.0.iter().map(|(k, v)| (k.as_str(), v))
    }

    pub fn columns(&self) -> Vec<&str> {
        self.0.keys().map(String::as_str).collect()
    }

    /// Build attributes from any serializable struct or map.
    ///
    /// Blank members (zero numbers, empty strings, `false`, `None`) are left
    /// out, so a struct with only some fields filled updates only those.
    pub fn from_serialize<T: Serialize + ?Sized>(value: &T) -> Result<Self> {
        let json = serde_json::to_value(value)
            .map_err(|e| DbError::TypeMismatch(format!("Cannot convert attributes: {}", e)))?;

        let serde_json::Value::Object(map) = json else {
            return Err(DbError::TypeMismatch(
                "Update attributes must serialize to an object".into(),
            ));
        };

        let mut attrs = Self::new();
        for (key, raw) in map {
            let value = Value::from_json(raw)?;
            if value.is_blank() {
                continue;
            }
            attrs.insert(key, value);
        }
        Ok(attrs)
    }
}

impl<K: AsRef<str>, V: Into<Value>> FromIterator<(K, V)> for UpdateAttrs {
    fn from_iter<I: IntoIterator<Item = (K, V)>>(iter: I) -> Self {
        let mut attrs = Self::new();
        for (key, value) in iter {
            attrs.insert(key, value);
        }
        attrs
    }
}

impl From<BTreeMap<String, Value>> for UpdateAttrs {
    fn from(map: BTreeMap<String, Value>) -> Self {
        map.into_iter().collect()
    }
}

impl From<HashMap<String, Value>> for UpdateAttrs {
    fn from(map: HashMap<String, Value>) -> Self {
        map.into_iter().collect()
    }
}

impl<K: AsRef<str>, V: Into<Value>, const N: usize> From<[(K, V); N]> for UpdateAttrs {
    fn from(pairs: [(K, V); N]) -> Self {
        pairs.into_iter().collect()
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use serde::Serialize;

    #[derive(Serialize)]
    struct Patch {
        name: String,
        age: i64,
        nickname: Option<String>,
    }

    #[test]
    fn test_keys_are_kept_verbatim() {
        let attrs = UpdateAttrs::new().set("Name", "y").set("email_address", "a@x");
        assert_eq!(attrs.columns(), vec!["Name", "email_address"]);
        assert_eq!(attrs.get("Name"), Some(&Value::Text("y".into())));
        assert!(!attrs.contains("Email"));
    }

    #[test]
    fn test_get_falls_back_to_column_name() {
        let attrs = UpdateAttrs::new().set("updated_at", Value::Null);
        assert!(attrs.contains("UpdatedAt"));
        assert!(attrs.contains("updated_at"));
    }

    #[test]
    fn test_from_serialize_skips_blank_members() {
        let attrs = UpdateAttrs::from_serialize(&Patch {
            name: "kate".into(),
            age: 0,
            nickname: None,
        })
        .unwrap();

        assert_eq!(attrs.len(), 1);
        assert_eq!(attrs.get("name"), Some(&Value::Text("kate".into())));
    }

    #[test]
    fn test_from_serialize_rejects_scalars() {
        assert!(UpdateAttrs::from_serialize(&5).is_err());
    }

    #[test]
    fn test_from_array_pairs() {
        let attrs = UpdateAttrs::from([("Name", "z")]);
        assert_eq!(attrs.iter().collect::<Vec<_>>(), vec![("Name", &Value::Text("z".into()))]);
    }
}
