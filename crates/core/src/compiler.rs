//! The compilation pass.
//!
//! Definitions are normalized and resolved to completion before any
//! operation is looked at; operations then refer to definitions by name only,
//! so no dependency ordering is needed. Every module is formatted before the
//! pass returns, and any fatal error discards all output.

use std::collections::{BTreeSet, HashMap};

use crate::config::CompileConfig;
use crate::document::{Document, Operation, RawDefinition};
use crate::emit::{GeneratedModule, build_request_function, emit_declarations, emit_requests};
use crate::error::CompileError;
use crate::format::Formatter;
use crate::mock::{MockArtifact, MockGenerator};
use crate::naming::{definition_name, import_aliases, operation_function_name};
use crate::resolve::{ResolvedType, TypeResolver};
use crate::schema::SchemaNode;
use crate::template::TemplateRegistry;

/// A top-level schema under its normalized, collision-free name.
#[derive(Debug, Clone, PartialEq)]
pub struct Definition {
    /// Declared identifier.
    pub name: String,
    /// Name as declared in the document.
    pub source_name: String,
    /// The definition's schema.
    pub schema: SchemaNode,
    /// The schema resolved against the other definitions.
    pub resolved: ResolvedType,
}

/// Everything one pass produces.
#[derive(Debug, Clone)]
pub struct CompileOutput {
    /// The type-declarations module.
    pub types: GeneratedModule,
    /// Absent in type-only mode.
    pub requests: Option<GeneratedModule>,
    /// Present when mock data was requested.
    pub mocks: Option<MockArtifact>,
}

/// Normalize definition names, rejecting two sources that end up as one name.
///
/// Names are flattened and then made legal identifiers, so the collision
/// check sees the name that is actually declared. Definitions whose name
/// normalizes to nothing are skipped.
pub fn normalize_definitions(raw: &[RawDefinition]) -> Result<Vec<(String, &RawDefinition)>, CompileError> {
    let mut seen: HashMap<String, &str> = HashMap::new();
    let mut out = Vec::with_capacity(raw.len());
    for def in raw {
        let Some(name) = definition_name(&def.name) else {
            tracing::warn!(definition = %def.name, "definition name normalizes to nothing, skipping");
            continue;
        };
        if let Some(first) = seen.get(&name) {
            return Err(CompileError::NamingCollision {
                identifier: name,
                first: (*first).to_string(),
                second: def.name.clone(),
            });
        }
        seen.insert(name.clone(), &def.name);
        out.push((name, def));
    }
    Ok(out)
}

/// Operations carrying one of `tags`, or all of them when `tags` is empty.
fn select_operations<'d>(doc: &'d Document, tags: &[String]) -> Vec<&'d Operation> {
    if !tags.is_empty() {
        let known = doc.tag_names();
        for tag in tags.iter().filter(|tag| !known.contains(tag)) {
            tracing::warn!(tag = %tag, "selected tag is not used by any operation");
        }
    }
    let selected: Vec<&Operation> = doc.operations.iter().filter(|op| op.has_any_tag(tags)).collect();
    if selected.len() < doc.operations.len() {
        tracing::debug!(
            selected = selected.len(),
            total = doc.operations.len(),
            "filtered operations by tag"
        );
    }
    selected
}

/// Drives one compilation pass with an explicit configuration.
#[derive(Debug, Clone, Copy)]
pub struct Compiler<'a> {
    config: &'a CompileConfig,
    formatter: &'a dyn Formatter,
    templates: &'a TemplateRegistry,
}

impl<'a> Compiler<'a> {
    /// A compiler using `formatter` and the strategies in `templates`.
    pub fn new(
        config: &'a CompileConfig,
        formatter: &'a dyn Formatter,
        templates: &'a TemplateRegistry,
    ) -> Self {
        Self {
            config,
            formatter,
            templates,
        }
    }

    /// Parse `text` as JSON or YAML and compile it.
    pub fn compile_str(&self, text: &str) -> Result<CompileOutput, CompileError> {
        let doc = Document::parse(text)?;
        self.compile(&doc)
    }

    /// Compile a parsed document.
    pub fn compile(&self, doc: &Document) -> Result<CompileOutput, CompileError> {
        let config = self.config;
        let lang = config.lang;
        let operations = select_operations(doc, &config.tags);

        let normalized = normalize_definitions(&doc.definitions)?;
        let known: BTreeSet<String> = normalized.iter().map(|(name, _)| name.clone()).collect();
        let resolver = TypeResolver::with_definitions(&known);

        let definitions: Vec<Definition> = normalized
            .into_iter()
            .map(|(name, raw)| Definition {
                resolved: resolver.resolve(&raw.schema),
                name,
                source_name: raw.name.clone(),
                schema: raw.schema.clone(),
            })
            .collect();
        tracing::debug!(count = definitions.len(), "resolved definitions");

        let aliases = import_aliases(&known);
        let request_resolver = resolver.with_aliases(&aliases);

        let types = emit_declarations(&config.types_file_name(), &definitions, lang);
        let types = self.format_module(types)?;

        let requests = if config.type_only {
            None
        } else {
            let template = self
                .templates
                .get(&config.template.strategy)
                .ok_or_else(|| CompileError::UnknownTemplate {
                    name: config.template.strategy.clone(),
                    available: self.templates.names().join(", "),
                })?;

            let mut locations: HashMap<String, String> = HashMap::new();
            let mut functions = Vec::with_capacity(operations.len());
            for op in &operations {
                let function = build_request_function(op, &request_resolver, config, template);
                if let Some(first) = locations.get(&function.name) {
                    return Err(CompileError::DuplicateOperation {
                        name: function.name,
                        first: first.clone(),
                        second: function.location,
                    });
                }
                locations.insert(function.name.clone(), function.location.clone());
                functions.push(function);
            }
            tracing::debug!(count = functions.len(), template = %template.name(), "rendered request functions");

            let header = config
                .template
                .header
                .clone()
                .unwrap_or_else(|| template.default_header(lang));
            let module = emit_requests(
                &config.requests_file_name(),
                &functions,
                lang,
                &header,
                &config.interface_import_path,
                &aliases,
            );
            Some(self.format_module(module)?)
        };

        let mocks = config.mock.then(|| {
            let generator = MockGenerator::new(&definitions);
            MockArtifact {
                entries: operations
                    .iter()
                    .map(|op| {
                        let name = operation_function_name(
                            op.operation_id.as_deref(),
                            op.method.as_str(),
                            &op.path,
                            config.naming,
                        );
                        generator.entry(&name, op)
                    })
                    .collect(),
            }
        });

        Ok(CompileOutput {
            types,
            requests,
            mocks,
        })
    }

    /// Run the formatter over a module. Unit spans keep referring to the
    /// emitted, unformatted text.
    fn format_module(&self, module: GeneratedModule) -> Result<GeneratedModule, CompileError> {
        match self
            .formatter
            .format(&module.text, self.config.lang, &self.config.style)
        {
            Ok(text) => Ok(GeneratedModule { text, ..module }),
            Err(diagnostic) => {
                let unit = diagnostic
                    .line
                    .and_then(|line| module.unit_at(line))
                    .unwrap_or("<module>")
                    .to_string();
                tracing::error!(module = %module.name, unit = %unit, "formatter rejected generated code");
                Err(CompileError::FormatterFailure {
                    module: module.name.clone(),
                    unit,
                    diagnostic: diagnostic.to_string(),
                    emitted: module.text,
                })
            }
        }
    }
}
