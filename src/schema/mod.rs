//! Host-ORM capability surface.
//!
//! The bridge never talks to a database or an object model directly; it only
//! needs four facts about each record type (table name, primary key, column
//! types, declared associations) plus a way to batch-load records by primary
//! key. Those facts arrive through [`SchemaProvider`] and [`RecordLoader`],
//! which the host application implements over whatever ORM it uses.
//! [`SchemaSet`] is the plain in-memory implementation used in tests and by
//! hosts without a reflective model layer.

mod association;
mod column;

pub use association::{resolve, MultiAssociation, ResolvedAssociation, SingleAssociation};
pub use column::{classify, ColumnBucket, ColumnClass};

use std::collections::BTreeMap;

use serde::{Deserialize, Serialize};

use crate::error::Result;

/// Column types the extraction layer understands.
///
/// Anything a host schema declares outside this set still round-trips
/// through `Other`, but requesting such a column in an index is a fatal
/// configuration error.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum ColumnType {
    Date,
    DateTime,
    Time,
    Timestamp,
    Boolean,
    Integer,
    String,
    Text,
    /// A type the bridge cannot extract (blob, float, decimal, ...).
    Other(std::string::String),
}

impl ColumnType {
    /// Lowercase name used in error messages and settings files.
    pub fn name(&self) -> &str {
        match self {
            ColumnType::Date => "date",
            ColumnType::DateTime => "datetime",
            ColumnType::Time => "time",
            ColumnType::Timestamp => "timestamp",
            ColumnType::Boolean => "boolean",
            ColumnType::Integer => "integer",
            ColumnType::String => "string",
            ColumnType::Text => "text",
            ColumnType::Other(name) => name,
        }
    }
}

/// How one model relates to another.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum AssociationKind {
    /// Single-valued: this model holds the foreign key.
    BelongsTo,
    /// Multi-valued: the target table holds the foreign key back to us.
    HasMany {
        /// Intermediate join model, if any. Cannot be flattened.
        through: Option<String>,
        /// Polymorphic interface name; the target table carries
        /// `{name}_id` / `{name}_type` instead of a plain foreign key.
        polymorphic_as: Option<String>,
        /// Whether the association carries extra scoping conditions.
        conditions: bool,
    },
}

/// One declared association on a model.
#[derive(Debug, Clone)]
pub struct Association {
    pub name: String,
    pub kind: AssociationKind,
    pub target_model: String,
    /// Foreign-key column: on this table for `BelongsTo`, on the target
    /// table for `HasMany`.
    pub foreign_key: String,
}

/// Schema facts for one record type.
#[derive(Debug, Clone)]
pub struct ModelSchema {
    name: String,
    table: String,
    primary_key: String,
    columns: BTreeMap<String, ColumnType>,
    associations: Vec<Association>,
}

impl ModelSchema {
    pub fn new(name: impl Into<String>, table: impl Into<String>) -> Self {
        Self {
            name: name.into(),
            table: table.into(),
            primary_key: "id".into(),
            columns: BTreeMap::new(),
            associations: Vec::new(),
        }
    }

    pub fn primary_key(mut self, column: impl Into<String>) -> Self {
        self.primary_key = column.into();
        self
    }

    pub fn column(mut self, name: impl Into<String>, ty: ColumnType) -> Self {
        self.columns.insert(name.into(), ty);
        self
    }

    /// Declare a single-valued association; `foreign_key` lives on this
    /// model's table.
    pub fn belongs_to(
        mut self,
        name: impl Into<String>,
        target_model: impl Into<String>,
        foreign_key: impl Into<String>,
    ) -> Self {
        self.associations.push(Association {
            name: name.into(),
            kind: AssociationKind::BelongsTo,
            target_model: target_model.into(),
            foreign_key: foreign_key.into(),
        });
        self
    }

    /// Declare a multi-valued association; `foreign_key` lives on the
    /// target model's table.
    pub fn has_many(
        mut self,
        name: impl Into<String>,
        target_model: impl Into<String>,
        foreign_key: impl Into<String>,
    ) -> Self {
        self.associations.push(Association {
            name: name.into(),
            kind: AssociationKind::HasMany {
                through: None,
                polymorphic_as: None,
                conditions: false,
            },
            target_model: target_model.into(),
            foreign_key: foreign_key.into(),
        });
        self
    }

    /// Declare an arbitrary association, for the has-many variants the
    /// simple builders cannot express.
    pub fn association(mut self, association: Association) -> Self {
        self.associations.push(association);
        self
    }

    pub fn model_name(&self) -> &str {
        &self.name
    }

    pub fn table_name(&self) -> &str {
        &self.table
    }

    pub fn primary_key_column(&self) -> &str {
        &self.primary_key
    }

    pub fn column_type(&self, column: &str) -> Option<&ColumnType> {
        self.columns.get(column)
    }

    pub fn associations(&self) -> &[Association] {
        &self.associations
    }
}

/// Source of schema facts, keyed by model name.
pub trait SchemaProvider {
    fn model(&self, name: &str) -> Option<&ModelSchema>;
}

/// Plain in-memory [`SchemaProvider`].
#[derive(Debug, Default)]
pub struct SchemaSet {
    models: BTreeMap<String, ModelSchema>,
}

impl SchemaSet {
    #[must_use]
    pub fn new() -> Self {
        Self::default()
    }

    pub fn add(&mut self, schema: ModelSchema) {
        self.models.insert(schema.model_name().to_string(), schema);
    }

    pub fn with(mut self, schema: ModelSchema) -> Self {
        self.add(schema);
        self
    }
}

impl SchemaProvider for SchemaSet {
    fn model(&self, name: &str) -> Option<&ModelSchema> {
        self.models.get(name)
    }
}

/// Batch record loading by primary key.
///
/// The returned order is not guaranteed by this contract; the searcher
/// restores relevance order itself using [`RecordLoader::record_id`].
pub trait RecordLoader {
    type Record;

    fn find_by_ids(&self, model: &str, ids: &[u64]) -> Result<Vec<Self::Record>>;

    /// Primary key of a loaded record, used to restore result order.
    fn record_id(&self, record: &Self::Record) -> u64;
}
