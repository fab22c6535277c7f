//! Association resolution.
//!
//! Turns a declared association name into the facts the query builder needs
//! to flatten it: which table to join, on which columns, whether the result
//! is single- or multi-valued, and whether the join goes through a
//! polymorphic discriminator column.
//!
//! Unknown names and unflattenable kinds (has-many-through) are rejected
//! here, at configuration-build time, so a bad index definition can never
//! be silently mis-indexed.

use crate::error::{BridgeError, Result};
use crate::schema::{AssociationKind, ModelSchema, SchemaProvider};

/// A single-valued (belongs-to) association, flattened to one `LEFT JOIN`
/// on this table's foreign key.
#[derive(Debug, Clone)]
pub struct SingleAssociation {
    pub target_model: String,
    pub table: String,
    pub primary_key: String,
    /// Column on the owning table holding the reference.
    pub foreign_key: String,
}

/// A multi-valued (has-many) association, flattened to an aggregated join
/// on the target table's foreign key.
#[derive(Debug, Clone)]
pub struct MultiAssociation {
    pub target_model: String,
    pub table: String,
    pub primary_key: String,
    /// Column on the target table pointing back at the owner.
    pub foreign_key: String,
    /// Polymorphic interface name; joins additionally match
    /// `{name}_type` against the owner's model name.
    pub polymorphic_as: Option<String>,
    /// Extra scoping conditions declared on the association.
    pub scoped: bool,
}

/// Resolved association descriptor.
#[derive(Debug, Clone)]
pub enum ResolvedAssociation {
    Single(SingleAssociation),
    Multi(MultiAssociation),
}

/// Resolve association `name` declared on `model`.
pub fn resolve(
    schemas: &dyn SchemaProvider,
    model: &ModelSchema,
    name: &str,
) -> Result<ResolvedAssociation> {
    let association = model
        .associations()
        .iter()
        .find(|a| a.name == name)
        .ok_or_else(|| BridgeError::UnknownAssociation {
            model: model.model_name().to_string(),
            association: name.to_string(),
        })?;

    let target = schemas
        .model(&association.target_model)
        .ok_or_else(|| BridgeError::UnknownModel(association.target_model.clone()))?;

    match &association.kind {
        AssociationKind::BelongsTo => Ok(ResolvedAssociation::Single(SingleAssociation {
            target_model: target.model_name().to_string(),
            table: target.table_name().to_string(),
            primary_key: target.primary_key_column().to_string(),
            foreign_key: association.foreign_key.clone(),
        })),
        AssociationKind::HasMany {
            through: Some(_), ..
        } => Err(BridgeError::UnsupportedAssociationKind {
            model: model.model_name().to_string(),
            association: name.to_string(),
            kind: "has_many :through".to_string(),
        }),
        AssociationKind::HasMany {
            through: None,
            polymorphic_as,
            conditions,
        } => Ok(ResolvedAssociation::Multi(MultiAssociation {
            target_model: target.model_name().to_string(),
            table: target.table_name().to_string(),
            primary_key: target.primary_key_column().to_string(),
            foreign_key: association.foreign_key.clone(),
            polymorphic_as: polymorphic_as.clone(),
            scoped: *conditions,
        })),
    }
}
