//! # search-bridge
//!
//! Indexes relational record types into a Sphinx-style full-text search
//! daemon and translates searches back into relevance-ordered record sets.
//!
//! ## Architecture
//!
//! ```text
//! ┌─────────────────────────────────────────────────────────────┐
//! │                     Registration (startup)                  │
//! │  • IndexRegistry::register per model/definition             │
//! │  • finalize() assigns index-ids, freezes index_count        │
//! └─────────────────────────────────────────────────────────────┘
//!                              │ RegistrySnapshot
//!              ┌───────────────┴────────────────┐
//!              ▼                                ▼
//! ┌─────────────────────────────┐ ┌─────────────────────────────┐
//! │   Configuration (offline)   │ │     Searching (runtime)     │
//! │  • layered settings merge   │ │  • filters/ranges/limits    │
//! │  • SQL extraction synthesis │ │  • rank-descending decode   │
//! │  • sphinx.conf rendering    │ │  • batched record lookup    │
//! └─────────────────────────────┘ └─────────────────────────────┘
//! ```
//!
//! Every definition across every model shares one document-ID space:
//! `doc_id = primary_key * index_count + index_id`. Both halves above read
//! the same immutable snapshot, so the modulus used to decode results is
//! always the one the extraction queries were generated with.
//!
//! ## Quick start
//!
//! ```rust,no_run
//! use search_bridge::{
//!     ColumnType, DatabaseSettings, IndexDefinition, IndexRegistry, ModelSchema,
//!     SchemaSet, SettingsLoader,
//! };
//! use std::path::Path;
//!
//! # fn main() -> search_bridge::Result<()> {
//! let schemas = SchemaSet::new().with(
//!     ModelSchema::new("Post", "posts")
//!         .column("title", ColumnType::String)
//!         .column("published_at", ColumnType::DateTime),
//! );
//!
//! let mut registry = IndexRegistry::new();
//! registry.register(
//!     &schemas,
//!     "Post",
//!     IndexDefinition::new().fields(["title", "published_at"]),
//! )?;
//! let snapshot = registry.finalize();
//!
//! let settings = SettingsLoader::new("/srv/app", "production").get()?;
//! let database = DatabaseSettings {
//!     adapter: "mysql".into(),
//!     host: Some("localhost".into()),
//!     username: None,
//!     password: None,
//!     database: Some("app".into()),
//!     socket: None,
//! };
//! search_bridge::write_configuration(
//!     &schemas, &snapshot, &settings, &database, Path::new("/srv/app"),
//! )?;
//! # Ok(())
//! # }
//! ```
//!
//! Searching goes through [`Searcher`] with any [`SearchClient`]
//! implementation — the real daemon client in production, [`StubClient`]
//! in tests.
//!
//! ## Modules
//!
//! - [`schema`]: host-ORM capability traits, column classification,
//!   association resolution
//! - [`registry`]: index registration, finalization, packed document IDs
//! - [`config`]: layered settings, extraction-SQL synthesis, rendering
//! - [`search`]: query issuance, result decoding, the client seam

pub mod config;
pub mod error;
pub mod registry;
pub mod schema;
pub mod search;

pub use config::{
    assemble, build_source, ensure_configuration, write_configuration, DatabaseSettings,
    Section, SettingValue, Settings, SettingsLoader, SourceConfig,
};
pub use error::{BridgeError, Result};
pub use registry::{
    pack_doc_id, unpack_doc_id, IndexDefinition, IndexEntry, IndexRegistry, RegistrySnapshot,
    ScopedSearch, ATTR_INDEX_ID, ATTR_MODEL,
};
pub use schema::{
    Association, AssociationKind, ColumnType, ModelSchema, RecordLoader, SchemaProvider,
    SchemaSet,
};
pub use search::{
    AssociationScope, EngineMatch, EngineResponse, EngineValue, FilterValue, RecordedCall,
    SearchClient, SearchOptions, SearchResults, Searcher, StubClient,
};
