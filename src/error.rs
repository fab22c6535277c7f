// Copyright (c) 2025-2026 Adrian Robinson. Licensed under the AGPL-3.0.
// See LICENSE file in the project root for full license text.

//! Crate-wide error type.
//!
//! Configuration-time errors (unknown columns, bad associations, alias
//! collisions) are fatal on purpose: a definition that cannot be extracted
//! exactly as requested must never be silently narrowed.

use std::path::PathBuf;

use thiserror::Error;

pub type Result<T> = std::result::Result<T, BridgeError>;

#[derive(Debug, Error)]
pub enum BridgeError {
    /// A requested field has a type the extraction layer cannot index.
    #[error("cannot index column {model}.{column} of type {column_type}")]
    UnsupportedColumnType {
        model: String,
        column: String,
        column_type: String,
    },

    /// A requested field names no column on the model.
    #[error("unknown column {column} in {model}")]
    UnknownColumn { model: String, column: String },

    #[error("could not find association \"{association}\" in {model}")]
    UnknownAssociation { model: String, association: String },

    /// The association exists but cannot be flattened into a join.
    #[error("cannot index association {model}.{association}: {kind} is not supported")]
    UnsupportedAssociationKind {
        model: String,
        association: String,
        kind: String,
    },

    #[error("unknown model {0}")]
    UnknownModel(String),

    /// Two field specifiers flatten to the same select alias.
    #[error("duplicate field alias {alias} in index {index}")]
    DuplicateFieldAlias { index: String, alias: String },

    /// No scoped search was registered for this owner/association pair.
    #[error("no searchable collection {association} registered for {model}")]
    UnknownScope { model: String, association: String },

    /// The search client reported a failure, or returned a response the
    /// searcher cannot decode.
    #[error("search client error: {0}")]
    Client(String),

    /// A stub client was queried before any response was configured.
    #[error("stub client queried with no responses configured")]
    StubUnconfigured,

    /// A stub client ran out of configured responses.
    #[error("stub client ran out of configured responses")]
    StubExhausted,

    #[error("failed to parse settings file {path}")]
    Settings {
        path: PathBuf,
        #[source]
        source: serde_yaml::Error,
    },

    #[error(transparent)]
    Io(#[from] std::io::Error),
}
