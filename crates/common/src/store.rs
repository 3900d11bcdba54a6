//! The rc file and its store.
//!
//! Settings are split into three sections:
//! ```toml
//! [core]
//! source = "https://petstore.swagger.io/v2/swagger.json"
//! lang = "ts"
//!
//! [api]
//! root = "src/api"
//! cookie = "session=MY_SESSION"
//! substitutions = [{ from = "axios", to = "http" }]
//! api_choices = ["pet", "store"]
//!
//! [mock]
//! root = "mock"
//! ```
//! Saving edits the existing file in place, so user comments survive.

use serde::{Deserialize, Serialize};
use std::fs;
use std::path::{Path, PathBuf};
use toml_edit::{Array, DocumentMut, InlineTable, Item, Table, Value, value};
use tracing::{debug, warn};

use crate::error::ConfigError;

/// Config filename
const CONFIG_FILENAME: &str = "config.toml";
/// swaggen directory name in home
const SWAGGEN_HOME_DIR: &str = ".swaggen";

/// Source used until the user picks one.
pub const DEFAULT_SOURCE: &str = "https://petstore.swagger.io/v2/swagger.json";
/// Placeholder cookie written to a fresh rc file.
pub const DEFAULT_COOKIE: &str = "session=MY_SESSION";

/// What to compile and how.
#[derive(Debug, Clone, Serialize, Deserialize, PartialEq, Eq)]
#[serde(default)]
pub struct CoreSettings {
    /// URL or file path of the schema document.
    pub source: String,
    /// `ts` or `js`.
    pub lang: String,
    /// Request template strategy.
    pub template: String,
    /// Function naming policy.
    pub naming: String,
    /// Emit declarations only.
    pub type_only: bool,
}

impl Default for CoreSettings {
    fn default() -> Self {
        Self {
            source: DEFAULT_SOURCE.to_string(),
            lang: "ts".to_string(),
            template: "axios".to_string(),
            naming: "camel".to_string(),
            type_only: false,
        }
    }
}

/// Literal text replacement applied to each rendered request function.
#[derive(Debug, Clone, Serialize, Deserialize, PartialEq, Eq)]
pub struct SubstitutionRule {
    /// Text to find.
    pub from: String,
    /// Replacement.
    pub to: String,
}

/// Output of the request module.
#[derive(Debug, Clone, Serialize, Deserialize, PartialEq, Eq)]
#[serde(default)]
pub struct ApiSettings {
    /// Directory the generated modules are written to.
    pub root: String,
    /// Sent as the `Cookie` header when fetching a URL source.
    pub cookie: String,
    /// Source of the previous run.
    pub previous_source: String,
    /// Header code replacing the template's default for TypeScript.
    pub header_ts: Option<String>,
    /// Header code replacing the template's default for JavaScript.
    pub header_js: Option<String>,
    /// Module the request file imports its types from.
    pub interface_import_path: String,
    /// `builtin` or `prettier`.
    pub formatter: String,
    /// Replacements applied to each request function.
    pub substitutions: Vec<SubstitutionRule>,
    /// Tags chosen for generation. Empty means every operation.
    pub api_choices: Vec<String>,
}

impl Default for ApiSettings {
    fn default() -> Self {
        Self {
            root: "src/api".to_string(),
            cookie: DEFAULT_COOKIE.to_string(),
            previous_source: String::new(),
            header_ts: None,
            header_js: None,
            interface_import_path: "./interface".to_string(),
            formatter: "builtin".to_string(),
            substitutions: Vec::new(),
            api_choices: Vec::new(),
        }
    }
}

impl ApiSettings {
    /// Custom header code for `lang`, if one is stored.
    pub fn header_for(&self, lang: &str) -> Option<&str> {
        match lang {
            "js" => self.header_js.as_deref(),
            _ => self.header_ts.as_deref(),
        }
    }
}

/// Output of the mock command.
#[derive(Debug, Clone, Serialize, Deserialize, PartialEq, Eq)]
#[serde(default)]
pub struct MockSettings {
    /// Directory mock bodies are written to.
    pub root: String,
    /// Wrap each body as `{ code, msg, data }`.
    pub wrap: bool,
}

impl Default for MockSettings {
    fn default() -> Self {
        Self {
            root: "mock".to_string(),
            wrap: false,
        }
    }
}

/// Rc file structure
#[derive(Debug, Clone, Serialize, Deserialize, Default, PartialEq, Eq)]
#[serde(default)]
pub struct RcConfig {
    /// `[core]`
    pub core: CoreSettings,
    /// `[api]`
    pub api: ApiSettings,
    /// `[mock]`
    pub mock: MockSettings,
}

/// Partial update of [`CoreSettings`]. `None` keeps the stored value.
#[derive(Debug, Clone, Default)]
pub struct CoreUpdate {
    /// Replaces [`CoreSettings::source`].
    pub source: Option<String>,
    /// Replaces [`CoreSettings::lang`].
    pub lang: Option<String>,
    /// Replaces [`CoreSettings::template`].
    pub template: Option<String>,
    /// Replaces [`CoreSettings::naming`].
    pub naming: Option<String>,
    /// Replaces [`CoreSettings::type_only`].
    pub type_only: Option<bool>,
}

/// Partial update of [`ApiSettings`]. `None` keeps the stored value.
#[derive(Debug, Clone, Default)]
pub struct ApiUpdate {
    /// Replaces [`ApiSettings::root`].
    pub root: Option<String>,
    /// Replaces [`ApiSettings::cookie`].
    pub cookie: Option<String>,
    /// Replaces [`ApiSettings::header_ts`].
    pub header_ts: Option<String>,
    /// Replaces [`ApiSettings::header_js`].
    pub header_js: Option<String>,
    /// Replaces [`ApiSettings::interface_import_path`].
    pub interface_import_path: Option<String>,
    /// Replaces [`ApiSettings::formatter`].
    pub formatter: Option<String>,
    /// Replaces [`ApiSettings::substitutions`].
    pub substitutions: Option<Vec<SubstitutionRule>>,
    /// Replaces [`ApiSettings::api_choices`].
    pub api_choices: Option<Vec<String>>,
}

/// Partial update of [`MockSettings`]. `None` keeps the stored value.
#[derive(Debug, Clone, Default)]
pub struct MockUpdate {
    /// Replaces [`MockSettings::root`].
    pub root: Option<String>,
    /// Replaces [`MockSettings::wrap`].
    pub wrap: Option<bool>,
}

fn assign<T>(slot: &mut T, update: Option<T>) {
    if let Some(new) = update {
        *slot = new;
    }
}

/// Loads, updates and persists the rc file.
#[derive(Debug)]
pub struct ConfigStore {
    path: PathBuf,
    data: RcConfig,
}

impl ConfigStore {
    /// Get the path to the rc file (~/.swaggen/config.toml)
    pub fn config_path() -> Result<PathBuf, ConfigError> {
        let home = dirs::home_dir().ok_or(ConfigError::NoHomeDir)?;
        Ok(home.join(SWAGGEN_HOME_DIR).join(CONFIG_FILENAME))
    }

    /// Load the rc file from the home directory, or defaults if it doesn't exist
    pub fn load() -> Result<Self, ConfigError> {
        Self::load_from(Self::config_path()?)
    }

    /// Load the rc file at `path`, or defaults if it doesn't exist
    pub fn load_from(path: impl Into<PathBuf>) -> Result<Self, ConfigError> {
        let path = path.into();
        let data = if path.exists() {
            let contents = fs::read_to_string(&path).map_err(|source| ConfigError::Read {
                path: path.clone(),
                source,
            })?;
            toml::from_str(&contents).map_err(|source| ConfigError::Parse {
                path: path.clone(),
                source,
            })?
        } else {
            debug!(path = %path.display(), "no rc file, using defaults");
            RcConfig::default()
        };
        Ok(Self { path, data })
    }

    /// Where the rc file is saved.
    pub fn path(&self) -> &Path {
        &self.path
    }

    /// Current settings, including unsaved merges.
    pub const fn data(&self) -> &RcConfig {
        &self.data
    }

    /// Overwrite the core settings that `update` carries.
    pub fn merge_core(&mut self, update: CoreUpdate) {
        let core = &mut self.data.core;
        assign(&mut core.source, update.source);
        assign(&mut core.lang, update.lang);
        assign(&mut core.template, update.template);
        assign(&mut core.naming, update.naming);
        assign(&mut core.type_only, update.type_only);
    }

    /// Overwrite the api settings that `update` carries.
    pub fn merge_api(&mut self, update: ApiUpdate) {
        let api = &mut self.data.api;
        assign(&mut api.root, update.root);
        assign(&mut api.cookie, update.cookie);
        assign(&mut api.interface_import_path, update.interface_import_path);
        assign(&mut api.formatter, update.formatter);
        assign(&mut api.substitutions, update.substitutions);
        assign(&mut api.api_choices, update.api_choices);
        if update.header_ts.is_some() {
            api.header_ts = update.header_ts;
        }
        if update.header_js.is_some() {
            api.header_js = update.header_js;
        }
    }

    /// Overwrite the mock settings that `update` carries.
    pub fn merge_mock(&mut self, update: MockUpdate) {
        let mock = &mut self.data.mock;
        assign(&mut mock.root, update.root);
        assign(&mut mock.wrap, update.wrap);
    }

    /// Make `source` current, remembering the one it replaces. Tag choices
    /// belong to a document, so they are dropped when the source changes.
    pub fn record_source(&mut self, source: &str) {
        self.data.api.previous_source =
            std::mem::replace(&mut self.data.core.source, source.to_string());
        if self.should_refresh_cache() && !self.data.api.api_choices.is_empty() {
            debug!(previous = %self.data.api.previous_source, "source changed, clearing api choices");
            self.data.api.api_choices.clear();
        }
    }

    /// Whether the source changed since the previous run.
    pub fn should_refresh_cache(&self) -> bool {
        self.data.api.previous_source != self.data.core.source
    }

    /// Restore defaults and persist them.
    pub fn reset(&mut self) -> Result<(), ConfigError> {
        self.data = RcConfig::default();
        self.save()
    }

    /// Save the rc file, editing the existing document so comments and
    /// unknown keys are kept.
    pub fn save(&self) -> Result<(), ConfigError> {
        // Ensure parent directory exists
        if let Some(parent) = self.path.parent() {
            fs::create_dir_all(parent).map_err(|source| ConfigError::Write {
                path: parent.to_path_buf(),
                source,
            })?;
        }

        let mut doc = self.existing_document();
        write_settings(&mut doc, &self.data);

        fs::write(&self.path, doc.to_string()).map_err(|source| ConfigError::Write {
            path: self.path.clone(),
            source,
        })?;
        debug!(path = %self.path.display(), "saved rc file");
        Ok(())
    }

    fn existing_document(&self) -> DocumentMut {
        let Ok(contents) = fs::read_to_string(&self.path) else {
            return DocumentMut::new();
        };
        contents.parse::<DocumentMut>().unwrap_or_else(|err| {
            warn!(path = %self.path.display(), error = %err, "rc file is not valid TOML, rewriting it");
            DocumentMut::new()
        })
    }
}

fn section<'d>(doc: &'d mut DocumentMut, key: &str) -> &'d mut Item {
    if !doc.get(key).is_some_and(Item::is_table_like) {
        doc.insert(key, Item::Table(Table::new()));
    }
    &mut doc[key]
}

fn set_optional(table: &mut Item, key: &str, text: Option<&str>) {
    match text {
        Some(text) => table[key] = value(text),
        None => {
            if let Some(table) = table.as_table_like_mut() {
                table.remove(key);
            }
        }
    }
}

fn write_settings(doc: &mut DocumentMut, data: &RcConfig) {
    let core = section(doc, "core");
    core["source"] = value(data.core.source.as_str());
    core["lang"] = value(data.core.lang.as_str());
    core["template"] = value(data.core.template.as_str());
    core["naming"] = value(data.core.naming.as_str());
    core["type_only"] = value(data.core.type_only);

    let api = section(doc, "api");
    api["root"] = value(data.api.root.as_str());
    api["cookie"] = value(data.api.cookie.as_str());
    api["previous_source"] = value(data.api.previous_source.as_str());
    set_optional(api, "header_ts", data.api.header_ts.as_deref());
    set_optional(api, "header_js", data.api.header_js.as_deref());
    api["interface_import_path"] = value(data.api.interface_import_path.as_str());
    api["formatter"] = value(data.api.formatter.as_str());

    // Inline tables keep each rule on one line
    let mut rules = Array::new();
    for rule in &data.api.substitutions {
        let mut inline = InlineTable::new();
        inline.insert("from", Value::from(rule.from.as_str()));
        inline.insert("to", Value::from(rule.to.as_str()));
        rules.push(inline);
    }
    api["substitutions"] = value(rules);
    api["api_choices"] = value(data.api.api_choices.iter().map(String::as_str).collect::<Array>());

    let mock = section(doc, "mock");
    mock["root"] = value(data.mock.root.as_str());
    mock["wrap"] = value(data.mock.wrap);
}

#[cfg(test)]
#[allow(clippy::unwrap_used, clippy::expect_used)]
mod tests {
    use super::*;
    use tempfile::TempDir;

    fn create_test_store(temp_dir: &TempDir) -> ConfigStore {
        ConfigStore::load_from(temp_dir.path().join("nested").join(CONFIG_FILENAME)).unwrap()
    }

    #[test]
    fn test_missing_file_uses_defaults() {
        let temp_dir = TempDir::new().unwrap();
        let store = create_test_store(&temp_dir);
        assert_eq!(store.data(), &RcConfig::default());
        assert_eq!(store.data().core.source, DEFAULT_SOURCE);
        assert_eq!(store.data().api.cookie, DEFAULT_COOKIE);
        assert!(!store.path().exists());
    }

    #[test]
    fn test_save_and_reload() {
        let temp_dir = TempDir::new().unwrap();
        let mut store = create_test_store(&temp_dir);
        store.merge_core(CoreUpdate {
            lang: Some("js".to_string()),
            type_only: Some(true),
            ..CoreUpdate::default()
        });
        store.merge_api(ApiUpdate {
            header_js: Some("import http from \"./http\";".to_string()),
            substitutions: Some(vec![SubstitutionRule {
                from: "axios.request".to_string(),
                to: "http.request".to_string(),
            }]),
            ..ApiUpdate::default()
        });
        store.merge_mock(MockUpdate {
            wrap: Some(true),
            ..MockUpdate::default()
        });
        store.save().unwrap();

        let contents = fs::read_to_string(store.path()).unwrap();
        assert!(contents.contains("[core]"));
        assert!(contents.contains("lang = \"js\""));
        assert!(contents.contains("from = \"axios.request\""));
        assert!(contents.contains("to = \"http.request\""));
        assert!(!contents.contains("header_ts"));

        let reloaded = ConfigStore::load_from(store.path()).unwrap();
        assert_eq!(reloaded.data(), store.data());
        assert_eq!(
            reloaded.data().api.header_for("js"),
            Some("import http from \"./http\";")
        );
        assert_eq!(reloaded.data().api.header_for("ts"), None);
    }

    #[test]
    fn test_merge_keeps_values_for_none() {
        let temp_dir = TempDir::new().unwrap();
        let mut store = create_test_store(&temp_dir);
        store.merge_core(CoreUpdate {
            naming: Some("snake".to_string()),
            ..CoreUpdate::default()
        });
        store.merge_core(CoreUpdate::default());
        store.merge_api(ApiUpdate::default());
        assert_eq!(store.data().core.naming, "snake");
        assert_eq!(store.data().core.lang, "ts");
        assert_eq!(store.data().api, ApiSettings::default());
    }

    #[test]
    fn test_record_source_and_refresh() {
        let temp_dir = TempDir::new().unwrap();
        let mut store = create_test_store(&temp_dir);
        assert!(store.should_refresh_cache());

        store.record_source("./swagger.json");
        assert_eq!(store.data().api.previous_source, DEFAULT_SOURCE);
        assert_eq!(store.data().core.source, "./swagger.json");
        assert!(store.should_refresh_cache());

        store.record_source("./swagger.json");
        assert!(!store.should_refresh_cache());
    }

    #[test]
    fn test_api_choices_follow_the_source() {
        let temp_dir = TempDir::new().unwrap();
        let mut store = create_test_store(&temp_dir);
        store.record_source("./swagger.json");
        store.merge_api(ApiUpdate {
            api_choices: Some(vec!["pet".to_string(), "store".to_string()]),
            ..ApiUpdate::default()
        });
        store.save().unwrap();

        let contents = fs::read_to_string(store.path()).unwrap();
        assert!(contents.contains("api_choices = [\"pet\", \"store\"]"));
        let mut reloaded = ConfigStore::load_from(store.path()).unwrap();
        assert_eq!(reloaded.data().api.api_choices, vec!["pet", "store"]);

        reloaded.record_source("./swagger.json");
        assert_eq!(reloaded.data().api.api_choices, vec!["pet", "store"]);

        reloaded.record_source("https://example.com/other.json");
        assert!(reloaded.data().api.api_choices.is_empty());
    }

    #[test]
    fn test_save_preserves_comments() {
        let temp_dir = TempDir::new().unwrap();
        let path = temp_dir.path().join(CONFIG_FILENAME);
        fs::write(
            &path,
            "# team settings\n[core]\n# where the document lives\nsource = \"./api.yaml\"\n\n[extra]\nkeep = 1\n",
        )
        .unwrap();

        let mut store = ConfigStore::load_from(&path).unwrap();
        assert_eq!(store.data().core.source, "./api.yaml");
        assert_eq!(store.data().core.lang, "ts");

        store.merge_core(CoreUpdate {
            lang: Some("js".to_string()),
            ..CoreUpdate::default()
        });
        store.save().unwrap();

        let contents = fs::read_to_string(&path).unwrap();
        assert!(contents.contains("# team settings"));
        assert!(contents.contains("# where the document lives"));
        assert!(contents.contains("source = \"./api.yaml\""));
        assert!(contents.contains("[extra]\nkeep = 1"));
        assert!(contents.contains("lang = \"js\""));
    }

    #[test]
    fn test_reset_restores_defaults() {
        let temp_dir = TempDir::new().unwrap();
        let mut store = create_test_store(&temp_dir);
        store.record_source("./local.json");
        store.reset().unwrap();
        assert_eq!(store.data(), &RcConfig::default());

        let reloaded = ConfigStore::load_from(store.path()).unwrap();
        assert_eq!(reloaded.data(), &RcConfig::default());
    }

    #[test]
    fn test_invalid_file_is_a_parse_error() {
        let temp_dir = TempDir::new().unwrap();
        let path = temp_dir.path().join(CONFIG_FILENAME);
        fs::write(&path, "[core]\ntype_only = \"maybe\"\n").unwrap();
        let err = ConfigStore::load_from(&path).unwrap_err();
        assert!(matches!(err, ConfigError::Parse { .. }));
        assert!(err.to_string().starts_with("Failed to parse"));
    }
}
