// Copyright (c) 2025-2026 Adrian Robinson. Licensed under the AGPL-3.0.
// See LICENSE file in the project root for full license text.

//! Layered settings.
//!
//! Three layers, lowest priority first: built-in defaults, an optional
//! global `config/bridge.yml`, and an optional per-environment
//! `config/environments/bridge.<env>.yml`. Layers merge two levels deep:
//! sections union, keys inside a section are replaced wholesale by the
//! overriding layer (arrays included — they are never concatenated).
//!
//! The merged result is computed once per [`SettingsLoader`] and shared;
//! the cache is mutex-guarded so concurrent first readers race safely.

use std::collections::BTreeMap;
use std::fmt;
use std::path::{Path, PathBuf};
use std::sync::Arc;

use parking_lot::Mutex;
use serde::Deserialize;
use tracing::debug;

use crate::error::{BridgeError, Result};

/// A single setting value as it appears in the engine configuration.
#[derive(Debug, Clone, PartialEq, Deserialize)]
#[serde(untagged)]
pub enum SettingValue {
    Int(i64),
    Str(String),
    /// Rendered as the key repeated once per element; empty lists are
    /// omitted entirely.
    List(Vec<String>),
}

impl fmt::Display for SettingValue {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            SettingValue::Int(n) => write!(f, "{n}"),
            SettingValue::Str(s) => write!(f, "{s}"),
            // Lists never render through Display; the section renderer
            // expands them per element.
            SettingValue::List(items) => write!(f, "{}", items.join(", ")),
        }
    }
}

impl From<&str> for SettingValue {
    fn from(s: &str) -> Self {
        SettingValue::Str(s.to_string())
    }
}

impl From<String> for SettingValue {
    fn from(s: String) -> Self {
        SettingValue::Str(s)
    }
}

impl From<i64> for SettingValue {
    fn from(n: i64) -> Self {
        SettingValue::Int(n)
    }
}

/// One configuration section: key → value, kept sorted for rendering.
pub type Section = BTreeMap<String, SettingValue>;

/// Name of the bridge's own section in the settings files.
const BRIDGE_SECTION: &str = "bridge";

/// Merged settings document: section name → section.
#[derive(Debug, Clone, Default, PartialEq, Deserialize)]
#[serde(transparent)]
pub struct Settings {
    sections: BTreeMap<String, Section>,
}

impl Settings {
    /// Built-in defaults, parameterized by environment name.
    #[must_use]
    pub fn defaults(env: &str) -> Self {
        let mut sections: BTreeMap<String, Section> = BTreeMap::new();

        sections.insert(
            BRIDGE_SECTION.into(),
            Section::from([
                ("address".into(), "127.0.0.1".into()),
                ("path".into(), format!("sphinx/{env}").into()),
                ("per_page".into(), 10.into()),
                ("port".into(), 3312.into()),
            ]),
        );
        sections.insert(
            "index".into(),
            Section::from([
                ("charset_type".into(), "utf-8".into()),
                ("docinfo".into(), "extern".into()),
                ("min_word_len".into(), 1.into()),
                ("morphology".into(), "stem_en".into()),
                ("stopwords".into(), "".into()),
            ]),
        );
        sections.insert(
            "indexer".into(),
            Section::from([("mem_limit".into(), "32M".into())]),
        );
        sections.insert(
            "mysql".into(),
            Section::from([(
                "sql_query_pre".into(),
                SettingValue::List(vec!["SET NAMES utf8".into()]),
            )]),
        );
        sections.insert(
            "searchd".into(),
            Section::from([
                ("log".into(), format!("log/sphinx/searchd.{env}.log").into()),
                ("max_children".into(), 30.into()),
                ("max_matches".into(), 1000.into()),
                ("query_log".into(), format!("log/sphinx/query.{env}.log").into()),
                ("read_timeout".into(), 5.into()),
            ]),
        );
        sections.insert(
            "source".into(),
            Section::from([
                ("index_html_attrs".into(), "".into()),
                ("sql_query_post".into(), "".into()),
                ("sql_range_step".into(), 20000.into()),
                ("strip_html".into(), 0.into()),
            ]),
        );

        Self { sections }
    }

    /// Two-level deep merge: sections union, section keys replaced by
    /// `overlay` where present.
    pub fn deep_merge(&mut self, overlay: Settings) {
        for (name, section) in overlay.sections {
            let target = self.sections.entry(name).or_default();
            for (key, value) in section {
                target.insert(key, value);
            }
        }
    }

    pub fn section(&self, name: &str) -> Option<&Section> {
        self.sections.get(name)
    }

    pub fn section_mut(&mut self, name: &str) -> &mut Section {
        self.sections.entry(name.to_string()).or_default()
    }

    fn bridge_value(&self, key: &str) -> Option<&SettingValue> {
        self.sections.get(BRIDGE_SECTION)?.get(key)
    }

    /// Host the search daemon listens on.
    #[must_use]
    pub fn address(&self) -> String {
        match self.bridge_value("address") {
            Some(value) => value.to_string(),
            None => "127.0.0.1".to_string(),
        }
    }

    /// Port the search daemon listens on.
    #[must_use]
    pub fn port(&self) -> u16 {
        match self.bridge_value("port") {
            Some(SettingValue::Int(n)) => *n as u16,
            _ => 3312,
        }
    }

    /// Default page size for searches.
    #[must_use]
    pub fn per_page(&self) -> u64 {
        match self.bridge_value("per_page") {
            Some(SettingValue::Int(n)) => *n as u64,
            _ => 10,
        }
    }

    /// Directory holding engine files, relative to the host root.
    #[must_use]
    pub fn index_dir(&self, root: &Path) -> PathBuf {
        let path = match self.bridge_value("path") {
            Some(value) => value.to_string(),
            None => "sphinx".to_string(),
        };
        root.join(path)
    }

    /// Path of the generated configuration file.
    #[must_use]
    pub fn conf_path(&self, root: &Path) -> PathBuf {
        self.index_dir(root).join("sphinx.conf")
    }

    /// Copy daemon endpoint settings from the bridge section into the
    /// `searchd` section and derive the pid-file path.
    fn derive_searchd(&mut self) {
        let address = self.address();
        let port = self.port();
        let pid_file = match self.bridge_value("path") {
            Some(value) => format!("{value}/searchd.pid"),
            None => "searchd.pid".to_string(),
        };

        let searchd = self.section_mut("searchd");
        searchd.insert("address".into(), address.into());
        searchd.insert("port".into(), i64::from(port).into());
        searchd.insert("pid_file".into(), pid_file.into());
    }
}

/// Database-connection settings, as the host's database configuration
/// declares them (for instance deserialized from its `database.yml`).
#[derive(Debug, Clone, Deserialize)]
pub struct DatabaseSettings {
    pub adapter: String,
    #[serde(default)]
    pub host: Option<String>,
    #[serde(default)]
    pub username: Option<String>,
    #[serde(default)]
    pub password: Option<String>,
    #[serde(default)]
    pub database: Option<String>,
    #[serde(default)]
    pub socket: Option<String>,
}

impl DatabaseSettings {
    /// Adapt to the key names the engine's source sections use.
    #[must_use]
    pub fn to_section(&self) -> Section {
        let mut section = Section::new();
        section.insert("type".into(), self.adapter.clone().into());
        let pairs = [
            ("sql_host", &self.host),
            ("sql_user", &self.username),
            ("sql_pass", &self.password),
            ("sql_db", &self.database),
            ("sql_sock", &self.socket),
        ];
        for (key, value) in pairs {
            if let Some(value) = value {
                section.insert(key.into(), value.clone().into());
            }
        }
        section
    }
}

/// Load-once settings cache.
///
/// `get` computes the merged settings on first call and hands out the same
/// `Arc` afterwards. The mutex closes the concurrent-first-initialization
/// race; later calls are a lock-and-clone.
pub struct SettingsLoader {
    root: PathBuf,
    env: String,
    cache: Mutex<Option<Arc<Settings>>>,
}

impl SettingsLoader {
    pub fn new(root: impl Into<PathBuf>, env: impl Into<String>) -> Self {
        Self {
            root: root.into(),
            env: env.into(),
            cache: Mutex::new(None),
        }
    }

    pub fn root(&self) -> &Path {
        &self.root
    }

    /// Merged settings: defaults ← global file ← environment file, with
    /// derived searchd endpoint settings.
    pub fn get(&self) -> Result<Arc<Settings>> {
        let mut cache = self.cache.lock();
        if let Some(settings) = cache.as_ref() {
            return Ok(Arc::clone(settings));
        }

        let mut settings = Settings::defaults(&self.env);
        settings.deep_merge(load_file(&self.root.join("config").join("bridge.yml"))?);
        settings.deep_merge(load_file(
            &self
                .root
                .join("config")
                .join("environments")
                .join(format!("bridge.{}.yml", self.env)),
        )?);
        settings.derive_searchd();

        let settings = Arc::new(settings);
        *cache = Some(Arc::clone(&settings));
        Ok(settings)
    }
}

/// Read one settings file; a missing file is an empty layer.
fn load_file(path: &Path) -> Result<Settings> {
    if !path.exists() {
        debug!(path = %path.display(), "settings file absent, skipping layer");
        return Ok(Settings::default());
    }
    let text = std::fs::read_to_string(path)?;
    serde_yaml::from_str(&text).map_err(|source| BridgeError::Settings {
        path: path.to_path_buf(),
        source,
    })
}
