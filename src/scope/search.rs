use crate::core::Value;

/// A caller-supplied restriction appended to the generated statement.
#[derive(Debug, Clone, PartialEq)]
pub enum Condition {
    /// `<column> = <value>`
    Eq(String, Value),
    /// Raw SQL with `?` marking each bound value, e.g. `age > ?`.
    Raw(String, Vec<Value>),
}

#[derive(Debug, Clone, Default, PartialEq)]
pub struct Search {
    conditions: Vec<Condition>,
}

impl Search {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn push(&mut self, condition: Condition) {
        self.conditions.push(condition);
    }

    pub fn where_eq(mut self, column: impl Into<String>, value: impl Into<Value>) -> Self {
        self.push(Condition::Eq(column.into(), value.into()));
        self
    }

    pub fn where_raw(mut self, sql: impl Into<String>, values: Vec<Value>) -> Self {
        self.push(Condition::Raw(sql.into(), values));
        self
    }

    pub fn conditions(&self) -> &[Condition] {
        &self.conditions
    }

    pub fn is_empty(&self) -> bool {
        self.conditions.is_empty()
    }
}
