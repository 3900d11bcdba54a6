//! Command implementations and the steps they share.

pub mod config;
pub mod generate;
pub mod mock;

use std::path::Path;
use std::time::Instant;

use swaggen_common::ConfigStore;
use swaggen_core::{
    CompileConfig, CompileError, CompileOutput, Compiler, Document, Formatter, TemplateRegistry,
};
use tracing::{debug, info};

use crate::common::{format_elapsed_ms, spinner};
use crate::prompt::{prompt_api_choices, prompt_source};
use crate::source::{load_source, validate_source};

pub(crate) fn open_store(path: Option<&Path>) -> Result<ConfigStore, String> {
    let store = match path {
        Some(path) => ConfigStore::load_from(path),
        None => ConfigStore::load(),
    };
    store.map_err(|err| err.to_string())
}

/// Flag value, else an interactive answer, else the stored source.
pub(crate) fn choose_source(
    flag: Option<String>,
    store: &ConfigStore,
    interactive: bool,
) -> Result<String, String> {
    let source = match flag {
        Some(source) => source,
        None if interactive => prompt_source(&store.data().core.source)?,
        None => store.data().core.source.clone(),
    };
    validate_source(&source)?;
    Ok(source)
}

/// Remember `source` as the current one.
pub(crate) fn record_source(store: &mut ConfigStore, source: &str) {
    store.record_source(source);
    if store.should_refresh_cache() {
        info!(
            previous = %store.data().api.previous_source,
            current = %source,
            "Schema source changed since the previous run."
        );
    }
}

pub(crate) async fn fetch_document(source: &str, cookie: &str) -> Result<String, String> {
    let start = Instant::now();
    let sp = spinner(&format!("Loading {source}..."));
    let text = load_source(source, Some(cookie)).await;
    sp.finish_and_clear();
    let text = text?;
    debug!(bytes = text.len(), elapsed = %format_elapsed_ms(start), "Loaded schema document.");
    Ok(text)
}

pub(crate) fn parse_document(text: &str) -> Result<Document, String> {
    Document::parse(text).map_err(|err| describe_compile_error(&err))
}

/// Tags to generate: the flag, else an interactive pick, else the stored
/// choices. `None` keeps the stored choices untouched.
pub(crate) fn choose_tags(
    flag: Option<Vec<String>>,
    choose: bool,
    doc: &Document,
    store: &ConfigStore,
) -> Result<Option<Vec<String>>, String> {
    if flag.is_some() {
        return Ok(flag);
    }
    if !choose {
        return Ok(None);
    }
    let tags = doc.tag_names();
    if tags.is_empty() {
        info!("The document declares no tags; generating every operation.");
        return Ok(Some(Vec::new()));
    }
    prompt_api_choices(&tags, &store.data().api.api_choices).map(Some)
}

pub(crate) fn compile_document(
    doc: &Document,
    config: &CompileConfig,
    formatter: &dyn Formatter,
) -> Result<CompileOutput, String> {
    let templates = TemplateRegistry::builtin();
    let sp = spinner("Compiling...");
    let result = Compiler::new(config, formatter, &templates).compile(doc);
    sp.finish_and_clear();
    result.map_err(|err| describe_compile_error(&err))
}

fn describe_compile_error(err: &CompileError) -> String {
    match err.emitted_text() {
        Some(emitted) => format!("{err}\n\nEmitted code:\n{emitted}"),
        None => err.to_string(),
    }
}
