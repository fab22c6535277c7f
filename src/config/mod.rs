// Copyright (c) 2025-2026 Adrian Robinson. Licensed under the AGPL-3.0.
// See LICENSE file in the project root for full license text.

//! Configuration pipeline: layered settings, per-index SQL extraction
//! synthesis, and rendering of the engine's textual configuration file.
//!
//! ```text
//! defaults ← global yml ← environment yml        RegistrySnapshot
//!        │                                             │
//!        ▼                                             ▼
//!   Settings ──────────────┬──────────────▶ SourceConfig per definition
//!                          │                           │
//!    database settings ────┘                           ▼
//!                                        indexer / searchd / source+index
//!                                              sections → sphinx.conf
//! ```

mod render;
mod settings;
mod source;

pub use render::{assemble, ensure_configuration, write_configuration};
pub use settings::{DatabaseSettings, Section, Settings, SettingsLoader, SettingValue};
pub use source::{build_source, SourceConfig};
