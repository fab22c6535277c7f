// Copyright (c) 2025-2026 Adrian Robinson. Licensed under the AGPL-3.0.
// See LICENSE file in the project root for full license text.

//! Textual rendering of the engine configuration.
//!
//! Section order is fixed: `indexer`, `searchd`, then one `source`/`index`
//! pair per registered definition in registry order. Keys inside a section
//! render sorted; list values repeat the key once per element and empty
//! lists are omitted.

use std::path::{Path, PathBuf};

use tracing::info;

use crate::config::settings::{DatabaseSettings, Section, Settings, SettingValue};
use crate::config::source::build_source;
use crate::error::Result;
use crate::registry::RegistrySnapshot;
use crate::schema::SchemaProvider;

/// Render one `key = value` section.
#[must_use]
pub fn section(heading: &str, data: &Section) -> String {
    let mut out = vec![heading.to_string(), "{".to_string()];
    for (key, value) in data {
        match value {
            SettingValue::List(items) => {
                for item in items {
                    out.push(format!("  {key} = {item}"));
                }
            }
            other => out.push(format!("  {key} = {other}")),
        }
    }
    out.push("}".to_string());
    out.join("\n")
}

fn merged(base: Option<&Section>, overlays: &[&Section]) -> Section {
    let mut section = base.cloned().unwrap_or_default();
    for overlay in overlays {
        for (key, value) in overlay.iter() {
            section.insert(key.clone(), value.clone());
        }
    }
    section
}

/// Assemble the complete configuration text for a finalized registry.
///
/// Per-source sections layer, lowest priority first: the `source` defaults,
/// the section named after the database adapter, the connection settings,
/// then the synthesized extraction queries. Index sections layer the
/// `index` defaults under the source name and on-disk path.
pub fn assemble(
    schemas: &dyn SchemaProvider,
    snapshot: &RegistrySnapshot,
    settings: &Settings,
    database: &DatabaseSettings,
    root: &Path,
) -> Result<String> {
    let index_dir = settings.index_dir(root);
    let db_section = merged(
        settings.section(&database.adapter),
        &[&database.to_section()],
    );

    let empty = Section::new();
    let mut out = Vec::new();
    out.push(section(
        "indexer",
        settings.section("indexer").unwrap_or(&empty),
    ));
    out.push(section(
        "searchd",
        settings.section("searchd").unwrap_or(&empty),
    ));

    for entry in snapshot.entries() {
        let source = build_source(schemas, entry, snapshot.index_count())?;

        let source_section = merged(
            settings.section("source"),
            &[&db_section, &source.to_section()],
        );
        out.push(section(&format!("source {}", source.name), &source_section));

        let index_section = merged(
            settings.section("index"),
            &[&Section::from([
                ("source".to_string(), source.name.clone().into()),
                (
                    "path".to_string(),
                    index_dir.join(&source.name).display().to_string().into(),
                ),
            ])],
        );
        out.push(section(&format!("index {}", source.name), &index_section));
    }

    let mut text = out.join("\n\n");
    text.push('\n');
    Ok(text)
}

/// Assemble and write the configuration file, creating the index directory.
/// Returns the path written.
pub fn write_configuration(
    schemas: &dyn SchemaProvider,
    snapshot: &RegistrySnapshot,
    settings: &Settings,
    database: &DatabaseSettings,
    root: &Path,
) -> Result<PathBuf> {
    let text = assemble(schemas, snapshot, settings, database, root)?;

    let dir = settings.index_dir(root);
    std::fs::create_dir_all(&dir)?;
    let path = settings.conf_path(root);
    std::fs::write(&path, &text)?;

    info!(
        path = %path.display(),
        bytes = text.len(),
        sources = snapshot.entries().len(),
        "wrote engine configuration"
    );
    Ok(path)
}

/// Like [`write_configuration`], but leaves an already-existing file
/// untouched. Returns the configuration path either way.
pub fn ensure_configuration(
    schemas: &dyn SchemaProvider,
    snapshot: &RegistrySnapshot,
    settings: &Settings,
    database: &DatabaseSettings,
    root: &Path,
) -> Result<PathBuf> {
    let path = settings.conf_path(root);
    if path.exists() {
        info!(path = %path.display(), "engine configuration already present");
        return Ok(path);
    }
    write_configuration(schemas, snapshot, settings, database, root)
}
