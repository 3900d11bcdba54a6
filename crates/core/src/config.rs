//! Explicit compilation configuration.
//!
//! The compiler never reads configuration from disk or the environment; the
//! caller builds a [`CompileConfig`] and passes it in.

use std::fmt;
use std::str::FromStr;

use serde::{Deserialize, Serialize};

use crate::format::FormatStyle;

/// Target language of the generated client.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum Lang {
    /// TypeScript: interfaces and annotated signatures.
    #[default]
    Ts,
    /// JavaScript with JSDoc type annotations.
    Js,
}

impl Lang {
    /// File extension of generated modules.
    pub fn extension(self) -> &'static str {
        match self {
            Lang::Ts => "ts",
            Lang::Js => "js",
        }
    }

    /// Parser name understood by prettier-compatible formatters.
    pub fn parser(self) -> &'static str {
        match self {
            Lang::Ts => "typescript",
            Lang::Js => "babel",
        }
    }
}

impl FromStr for Lang {
    type Err = String;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s.to_ascii_lowercase().as_str() {
            "ts" | "typescript" => Ok(Lang::Ts),
            "js" | "javascript" => Ok(Lang::Js),
            other => Err(format!("unknown language '{other}' (expected ts or js)")),
        }
    }
}

impl fmt::Display for Lang {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.extension())
    }
}

/// Case convention applied to generated function names.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum NamingPolicy {
    /// `getPetById`
    #[default]
    Camel,
    /// `GetPetById`
    Pascal,
    /// `get_pet_by_id`
    Snake,
    /// Source name with forbidden characters replaced.
    Preserve,
}

impl NamingPolicy {
    /// Canonical name, accepted back by [`FromStr`].
    pub fn as_str(self) -> &'static str {
        match self {
            NamingPolicy::Camel => "camel",
            NamingPolicy::Pascal => "pascal",
            NamingPolicy::Snake => "snake",
            NamingPolicy::Preserve => "preserve",
        }
    }
}

impl fmt::Display for NamingPolicy {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

impl FromStr for NamingPolicy {
    type Err = String;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s.to_ascii_lowercase().as_str() {
            "camel" | "camelcase" => Ok(NamingPolicy::Camel),
            "pascal" | "pascalcase" => Ok(NamingPolicy::Pascal),
            "snake" | "snake_case" => Ok(NamingPolicy::Snake),
            "preserve" | "none" => Ok(NamingPolicy::Preserve),
            other => Err(format!(
                "unknown naming policy '{other}' (expected camel, pascal, snake or preserve)"
            )),
        }
    }
}

/// A literal text replacement applied to every rendered request function.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct Substitution {
    /// Text to look for.
    pub from: String,
    /// Replacement text.
    pub to: String,
}

/// Selection and customization of the request template strategy.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(default)]
pub struct TemplateOptions {
    /// Name of a registered [`crate::template::RequestTemplate`].
    pub strategy: String,
    /// Import code placed at the top of the request module. `None` uses the
    /// strategy's default header.
    pub header: Option<String>,
    /// Declarative rewrites applied to each rendered function, in order.
    pub substitutions: Vec<Substitution>,
}

impl Default for TemplateOptions {
    fn default() -> Self {
        Self {
            strategy: "axios".to_string(),
            header: None,
            substitutions: Vec::new(),
        }
    }
}

/// Everything the compiler needs to know about the output it should produce.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(default)]
pub struct CompileConfig {
    /// Output language.
    pub lang: Lang,
    /// Case convention for request function names.
    pub naming: NamingPolicy,
    /// Request template strategy and its customization.
    pub template: TemplateOptions,
    /// Only emit the type-declarations module.
    pub type_only: bool,
    /// Also produce mock response data.
    pub mock: bool,
    /// Module specifier the request module imports definitions from.
    pub interface_import_path: String,
    /// Operation tags to generate; empty selects every operation.
    pub tags: Vec<String>,
    /// Style handed to the formatter.
    pub style: FormatStyle,
}

impl Default for CompileConfig {
    fn default() -> Self {
        Self {
            lang: Lang::Ts,
            naming: NamingPolicy::Camel,
            template: TemplateOptions::default(),
            type_only: false,
            mock: false,
            interface_import_path: "./interface".to_string(),
            tags: Vec::new(),
            style: FormatStyle::default(),
        }
    }
}

impl CompileConfig {
    /// File name of the type-declarations module.
    pub fn types_file_name(&self) -> String {
        format!("interface.{}", self.lang.extension())
    }

    /// File name of the request-functions module.
    pub fn requests_file_name(&self) -> String {
        format!("api.{}", self.lang.extension())
    }
}

#[cfg(test)]
#[allow(clippy::unwrap_used, clippy::expect_used)]
mod tests {
    use super::*;

    #[test]
    fn test_lang_from_str() {
        assert_eq!("ts".parse::<Lang>().unwrap(), Lang::Ts);
        assert_eq!("JavaScript".parse::<Lang>().unwrap(), Lang::Js);
        assert!("python".parse::<Lang>().is_err());
    }

    #[test]
    fn test_naming_policy_from_str() {
        assert_eq!("snake".parse::<NamingPolicy>().unwrap(), NamingPolicy::Snake);
        assert_eq!("PascalCase".parse::<NamingPolicy>().unwrap(), NamingPolicy::Pascal);
        assert!("kebab".parse::<NamingPolicy>().is_err());
        for policy in [
            NamingPolicy::Camel,
            NamingPolicy::Pascal,
            NamingPolicy::Snake,
            NamingPolicy::Preserve,
        ] {
            assert_eq!(policy.to_string().parse::<NamingPolicy>().unwrap(), policy);
        }
    }

    #[test]
    fn test_default_config() {
        let config = CompileConfig::default();
        assert_eq!(config.template.strategy, "axios");
        assert_eq!(config.types_file_name(), "interface.ts");
        assert_eq!(config.requests_file_name(), "api.ts");
        assert_eq!(config.style.print_width, 120);
    }

    #[test]
    fn test_config_deserializes_with_defaults() {
        let config: CompileConfig =
            serde_json::from_str(r#"{ "lang": "js", "template": { "strategy": "fetch" } }"#)
                .unwrap();
        assert_eq!(config.lang, Lang::Js);
        assert_eq!(config.template.strategy, "fetch");
        assert!(config.template.substitutions.is_empty());
        assert_eq!(config.interface_import_path, "./interface");
        assert!(config.tags.is_empty());
    }
}
