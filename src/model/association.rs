use crate::model::Record;

/// How a related record is linked to its owner.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum Relationship {
    /// The owner holds `foreign_key`, pointing at the related record's primary key.
    BelongsTo { foreign_key: String },
    /// The related record holds `foreign_key`, pointing at the owner's primary key.
    HasOne { foreign_key: String },
    HasMany { foreign_key: String },
}

impl Relationship {
    pub fn foreign_key(&self) -> &str {
        match self {
            Self::BelongsTo { foreign_key }
            | Self::HasOne { foreign_key }
            | Self::HasMany { foreign_key } => foreign_key,
        }
    }

    pub fn is_belongs_to(&self) -> bool {
        matches!(self, Self::BelongsTo { .. })
    }
}

/// Related records borrowed out of an owner for the duration of one save.
pub struct Association<'a> {
    pub name: String,
    pub relationship: Relationship,
    pub records: Vec<&'a mut dyn Record>,
}

impl<'a> Association<'a> {
    pub fn belongs_to(
        name: impl Into<String>,
        foreign_key: impl Into<String>,
        record: Option<&'a mut dyn Record>,
    ) -> Self {
        Self {
            name: name.into(),
            relationship: Relationship::BelongsTo {
                foreign_key: foreign_key.into(),
            },
            records: record.into_iter().collect(),
        }
    }

    pub fn has_one(
        name: impl Into<String>,
        foreign_key: impl Into<String>,
        record: Option<&'a mut dyn Record>,
    ) -> Self {
        Self {
            name: name.into(),
            relationship: Relationship::HasOne {
                foreign_key: foreign_key.into(),
            },
            records: record.into_iter().collect(),
        }
    }

    pub fn has_many(
        name: impl Into<String>,
        foreign_key: impl Into<String>,
        records: impl IntoIterator<Item = &'a mut dyn Record>,
    ) -> Self {
        Self {
            name: name.into(),
            relationship: Relationship::HasMany {
                foreign_key: foreign_key.into(),
            },
            records: records.into_iter().collect(),
        }
    }
}
