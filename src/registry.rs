// Copyright (c) 2025-2026 Adrian Robinson. Licensed under the AGPL-3.0.
// See LICENSE file in the project root for full license text.

//! Index registry and packed document-ID arithmetic.
//!
//! Every indexed definition across every model shares one numeric document-ID
//! space on the engine side. The packing scheme multiplexes a model-local
//! primary key and a registry-wide index-id into a single integer:
//!
//! ```text
//! doc_id = primary_key * index_count + index_id      (index_id < index_count)
//! ```
//!
//! For a fixed `index_count` this is a bijection, so a returned document ID
//! always decodes back to exactly one (definition, primary key) pair:
//!
//! ```text
//! primary_key = (doc_id - index_id) / index_count
//! ```
//!
//! The decode is only correct against the *same* `index_count` that was in
//! effect when the configuration was built. That hazard is closed by
//! construction here: [`IndexRegistry::finalize`] consumes the registry,
//! assigns ids and freezes the count into an immutable
//! [`RegistrySnapshot`] consumed by both the configuration assembler and
//! the searcher. Register everything, finalize once, share the snapshot.

use tracing::info;

use crate::error::{BridgeError, Result};
use crate::schema::{AssociationKind, SchemaProvider};

/// Attribute column carrying the definition's index-id in every indexed row.
pub const ATTR_INDEX_ID: &str = "bridge_index_id";

/// Attribute column carrying the owning model's name in every indexed row.
pub const ATTR_MODEL: &str = "bridge_model";

/// Pack a model-local primary key and an index-id into one document ID.
#[must_use]
pub fn pack_doc_id(primary_key: u64, index_id: u32, index_count: u64) -> u64 {
    primary_key * index_count + u64::from(index_id)
}

/// Recover the model-local primary key from a packed document ID.
///
/// Integer division; exact when `doc_id` was packed with the same
/// `index_count` and this `index_id`.
#[must_use]
pub fn unpack_doc_id(doc_id: u64, index_id: u32, index_count: u64) -> u64 {
    (doc_id - u64::from(index_id)) / index_count
}

/// One index declaration for a model.
///
/// Field specifiers are either plain column names (`"title"`) or
/// association-qualified (`"user.name"`). Conditions are raw SQL fragments
/// ANDed into the extraction query verbatim; supplying valid, already
/// escaped SQL is the caller's responsibility.
#[derive(Debug, Clone, Default)]
pub struct IndexDefinition {
    pub(crate) fields: Vec<String>,
    pub(crate) conditions: Vec<String>,
    pub(crate) name: Option<String>,
    pub(crate) strip_markup: bool,
}

impl IndexDefinition {
    #[must_use]
    pub fn new() -> Self {
        Self::default()
    }

    pub fn field(mut self, field: impl Into<String>) -> Self {
        self.fields.push(field.into());
        self
    }

    pub fn fields<I, S>(mut self, fields: I) -> Self
    where
        I: IntoIterator<Item = S>,
        S: Into<String>,
    {
        self.fields.extend(fields.into_iter().map(Into::into));
        self
    }

    pub fn condition(mut self, sql: impl Into<String>) -> Self {
        self.conditions.push(sql.into());
        self
    }

    /// Index name override; defaults to the model's table name.
    pub fn named(mut self, name: impl Into<String>) -> Self {
        self.name = Some(name.into());
        self
    }

    /// Strip markup from text fields at indexing time.
    pub fn strip_markup(mut self, strip: bool) -> Self {
        self.strip_markup = strip;
        self
    }
}

/// A scoped-search obligation: searching `owner_model`'s `association`
/// collection must restrict `target_model` results to rows whose
/// `foreign_key` equals the owning record's primary key.
#[derive(Debug, Clone)]
pub struct ScopedSearch {
    pub owner_model: String,
    pub association: String,
    pub foreign_key: String,
    pub target_model: String,
}

/// Ordered collection of index definitions, open for registration.
///
/// Call [`register`](Self::register) for every definition at startup, then
/// [`finalize`](Self::finalize) exactly once.
#[derive(Debug, Default)]
pub struct IndexRegistry {
    entries: Vec<(String, IndexDefinition)>,
    scopes: Vec<ScopedSearch>,
}

impl IndexRegistry {
    #[must_use]
    pub fn new() -> Self {
        Self::default()
    }

    /// Register `definition` for `model`.
    ///
    /// The field list is augmented with the model's belongs-to foreign-key
    /// columns so single-valued references are always filterable, then
    /// de-duplicated in first-seen order. Registration also records a
    /// scoped-search obligation for every condition-free has-many on an
    /// associated model that points back at `model`.
    pub fn register(
        &mut self,
        schemas: &dyn SchemaProvider,
        model: &str,
        mut definition: IndexDefinition,
    ) -> Result<()> {
        let schema = schemas
            .model(model)
            .ok_or_else(|| BridgeError::UnknownModel(model.to_string()))?;

        for association in schema.associations() {
            if association.kind != AssociationKind::BelongsTo {
                continue;
            }
            definition.fields.push(association.foreign_key.clone());

            let Some(target) = schemas.model(&association.target_model) else {
                continue;
            };
            for reverse in target.associations() {
                let AssociationKind::HasMany {
                    through: None,
                    conditions: false,
                    ..
                } = &reverse.kind
                else {
                    continue;
                };
                if reverse.target_model != model {
                    continue;
                }
                self.scopes.push(ScopedSearch {
                    owner_model: target.model_name().to_string(),
                    association: reverse.name.clone(),
                    foreign_key: reverse.foreign_key.clone(),
                    target_model: model.to_string(),
                });
            }
        }

        let mut seen = std::collections::HashSet::new();
        definition.fields.retain(|f| seen.insert(f.clone()));

        self.entries.push((model.to_string(), definition));
        Ok(())
    }

    /// Freeze registration: assign each definition its index-id in
    /// registration order and produce the immutable snapshot.
    #[must_use]
    pub fn finalize(self) -> RegistrySnapshot {
        let entries: Vec<IndexEntry> = self
            .entries
            .into_iter()
            .enumerate()
            .map(|(index_id, (model, definition))| IndexEntry {
                model,
                definition,
                index_id: index_id as u32,
            })
            .collect();

        info!(definitions = entries.len(), "index registry finalized");

        RegistrySnapshot {
            entries,
            scopes: self.scopes,
        }
    }
}

/// One finalized definition with its assigned index-id.
#[derive(Debug, Clone)]
pub struct IndexEntry {
    pub model: String,
    pub definition: IndexDefinition,
    pub index_id: u32,
}

/// Immutable view of the finalized registry.
///
/// Both configuration assembly and query decoding read the same snapshot,
/// so the `index_count` used on either side can never drift.
#[derive(Debug)]
pub struct RegistrySnapshot {
    entries: Vec<IndexEntry>,
    scopes: Vec<ScopedSearch>,
}

impl RegistrySnapshot {
    /// Definitions in registration order; index-ids are their positions.
    pub fn entries(&self) -> &[IndexEntry] {
        &self.entries
    }

    /// Total number of registered definitions — the packing modulus.
    #[must_use]
    pub fn index_count(&self) -> u64 {
        self.entries.len() as u64
    }

    /// Look up the scoped-search obligation for an owner's association.
    pub fn scope(&self, owner_model: &str, association: &str) -> Option<&ScopedSearch> {
        self.scopes
            .iter()
            .find(|s| s.owner_model == owner_model && s.association == association)
    }
}
