//! Turns the rc file plus command-line flags into a [`CompileConfig`].

use clap::ValueEnum;
use std::path::Path;
use swaggen_common::{ApiUpdate, CoreUpdate, RcConfig};
use swaggen_core::{
    CompileConfig, FormatStyle, Formatter, Lang, LayoutFormatter, NamingPolicy, PrettierFormatter,
    Substitution, TemplateOptions,
};

/// Which formatter runs over the generated modules.
#[derive(ValueEnum, Clone, Debug, Copy, PartialEq, Eq)]
#[value(rename_all = "lower")]
pub enum FormatterChoice {
    /// Built-in re-indenting formatter
    Builtin,
    /// An installed prettier
    Prettier,
}

impl FormatterChoice {
    /// Name stored in the rc file.
    pub const fn as_str(self) -> &'static str {
        match self {
            Self::Builtin => "builtin",
            Self::Prettier => "prettier",
        }
    }
}

/// Flags that take precedence over the stored settings.
#[derive(Debug, Clone, Default)]
pub struct Overrides {
    /// `--lang`
    pub lang: Option<Lang>,
    /// `--naming`
    pub naming: Option<NamingPolicy>,
    /// `--template`
    pub template: Option<String>,
    /// `--interface-path`
    pub interface_import_path: Option<String>,
    /// `--tags`, or the tags picked interactively.
    pub tags: Option<Vec<String>>,
    /// `--type-only`
    pub type_only: bool,
    /// `--mock`
    pub mock: bool,
}

/// rc file changes that make the given flags the new defaults.
///
/// `--type-only` is a switch, so only its presence is remembered; `--mock`
/// applies to one run and is never stored.
pub fn rc_updates(
    overrides: &Overrides,
    formatter: Option<FormatterChoice>,
    out: Option<&Path>,
) -> (CoreUpdate, ApiUpdate) {
    let core = CoreUpdate {
        source: None,
        lang: overrides.lang.map(|lang| lang.to_string()),
        template: overrides.template.clone(),
        naming: overrides.naming.map(|naming| naming.as_str().to_string()),
        type_only: overrides.type_only.then_some(true),
    };
    let api = ApiUpdate {
        root: out.map(|out| out.display().to_string()),
        interface_import_path: overrides.interface_import_path.clone(),
        formatter: formatter.map(|choice| choice.as_str().to_string()),
        api_choices: overrides.tags.clone(),
        ..ApiUpdate::default()
    };
    (core, api)
}

/// Compiler configuration from the stored settings, with `overrides` on top.
pub fn to_compile_config(rc: &RcConfig, overrides: &Overrides) -> Result<CompileConfig, String> {
    let lang = match overrides.lang {
        Some(lang) => lang,
        None => rc.core.lang.parse::<Lang>()?,
    };
    let naming = match overrides.naming {
        Some(naming) => naming,
        None => rc.core.naming.parse::<NamingPolicy>()?,
    };

    Ok(CompileConfig {
        lang,
        naming,
        template: TemplateOptions {
            strategy: overrides
                .template
                .clone()
                .unwrap_or_else(|| rc.core.template.clone()),
            header: rc
                .api
                .header_for(lang.extension())
                .map(str::to_string),
            substitutions: rc
                .api
                .substitutions
                .iter()
                .map(|rule| Substitution {
                    from: rule.from.clone(),
                    to: rule.to.clone(),
                })
                .collect(),
        },
        type_only: overrides.type_only || rc.core.type_only,
        mock: overrides.mock,
        interface_import_path: overrides
            .interface_import_path
            .clone()
            .unwrap_or_else(|| rc.api.interface_import_path.clone()),
        tags: overrides
            .tags
            .clone()
            .unwrap_or_else(|| rc.api.api_choices.clone()),
        style: FormatStyle::default(),
    })
}

/// Formatter named by the flag, falling back to the rc file.
pub fn formatter_choice(rc: &RcConfig, flag: Option<FormatterChoice>) -> Result<FormatterChoice, String> {
    match flag {
        Some(choice) => Ok(choice),
        None => FormatterChoice::from_str(&rc.api.formatter, true)
            .map_err(|err| format!("Invalid formatter '{}' in rc file: {err}", rc.api.formatter)),
    }
}

/// Instantiate the chosen formatter.
pub fn build_formatter(choice: FormatterChoice) -> Result<Box<dyn Formatter>, String> {
    match choice {
        FormatterChoice::Builtin => Ok(Box::new(LayoutFormatter)),
        FormatterChoice::Prettier => PrettierFormatter::detect()
            .map(|prettier| -> Box<dyn Formatter> { Box::new(prettier) })
            .ok_or_else(|| "prettier was not found on PATH (install it or use --formatter builtin)".to_string()),
    }
}

#[cfg(test)]
#[allow(clippy::unwrap_used, clippy::expect_used)]
mod tests {
    use super::*;
    use swaggen_common::SubstitutionRule;

    #[test]
    fn test_defaults() {
        let config = to_compile_config(&RcConfig::default(), &Overrides::default()).unwrap();
        assert_eq!(config, CompileConfig::default());
    }

    #[test]
    fn test_rc_values_and_header_per_lang() {
        let mut rc = RcConfig::default();
        rc.core.lang = "js".to_string();
        rc.core.naming = "snake".to_string();
        rc.api.header_ts = Some("import ts".to_string());
        rc.api.header_js = Some("import js".to_string());
        rc.api.substitutions.push(SubstitutionRule {
            from: "a".to_string(),
            to: "b".to_string(),
        });

        let config = to_compile_config(&rc, &Overrides::default()).unwrap();
        assert_eq!(config.lang, Lang::Js);
        assert_eq!(config.naming, NamingPolicy::Snake);
        assert_eq!(config.template.header.as_deref(), Some("import js"));
        assert_eq!(config.template.substitutions.len(), 1);

        let overrides = Overrides {
            lang: Some(Lang::Ts),
            template: Some("fetch".to_string()),
            mock: true,
            ..Overrides::default()
        };
        let config = to_compile_config(&rc, &overrides).unwrap();
        assert_eq!(config.template.header.as_deref(), Some("import ts"));
        assert_eq!(config.template.strategy, "fetch");
        assert!(config.mock);
    }

    #[test]
    fn test_flags_become_rc_updates() {
        let temp_dir = tempfile::TempDir::new().unwrap();
        let mut store = swaggen_common::ConfigStore::load_from(temp_dir.path().join("config.toml")).unwrap();

        let overrides = Overrides {
            naming: Some(NamingPolicy::Snake),
            interface_import_path: Some("@/types".to_string()),
            tags: Some(vec!["pet".to_string()]),
            type_only: true,
            mock: true,
            ..Overrides::default()
        };
        let (core, api) = rc_updates(&overrides, Some(FormatterChoice::Prettier), Some(Path::new("out")));
        store.merge_core(core);
        store.merge_api(api);
        store.save().unwrap();

        let reloaded = swaggen_common::ConfigStore::load_from(store.path()).unwrap();
        let rc = reloaded.data();
        assert_eq!(rc.core.naming, "snake");
        assert!(rc.core.type_only);
        assert_eq!(rc.core.lang, "ts");
        assert_eq!(rc.api.root, "out");
        assert_eq!(rc.api.interface_import_path, "@/types");
        assert_eq!(rc.api.formatter, "prettier");
        assert_eq!(rc.api.api_choices, vec!["pet"]);

        // A later run without flags keeps what was stored.
        let config = to_compile_config(rc, &Overrides::default()).unwrap();
        assert_eq!(config.naming, NamingPolicy::Snake);
        assert!(config.type_only);
        assert!(!config.mock);
        assert_eq!(config.interface_import_path, "@/types");
        assert_eq!(config.tags, vec!["pet"]);
        assert_eq!(formatter_choice(rc, None).unwrap(), FormatterChoice::Prettier);

        let (core, api) = rc_updates(&Overrides::default(), None, None);
        assert!(core.type_only.is_none() && core.naming.is_none());
        assert!(api.formatter.is_none() && api.api_choices.is_none());
    }

    #[test]
    fn test_invalid_rc_lang() {
        let mut rc = RcConfig::default();
        rc.core.lang = "rust".to_string();
        let err = to_compile_config(&rc, &Overrides::default()).unwrap_err();
        assert!(err.contains("unknown language 'rust'"));
    }

    #[test]
    fn test_formatter_choice() {
        let mut rc = RcConfig::default();
        assert_eq!(formatter_choice(&rc, None).unwrap(), FormatterChoice::Builtin);
        assert_eq!(
            formatter_choice(&rc, Some(FormatterChoice::Prettier)).unwrap(),
            FormatterChoice::Prettier
        );
        rc.api.formatter = "Prettier".to_string();
        assert_eq!(formatter_choice(&rc, None).unwrap(), FormatterChoice::Prettier);
        rc.api.formatter = "dprint".to_string();
        assert!(formatter_choice(&rc, None).is_err());
    }
}
