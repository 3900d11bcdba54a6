//! OpenAPI / Swagger to TypeScript and JavaScript API client compiler.
//!
//! The pass is pure and synchronous: a [`Document`] goes in together with an
//! explicit [`CompileConfig`], and formatted module text comes out. Fetching
//! the document and writing files are left to the caller.

pub mod compiler;
pub mod config;
pub mod document;
pub mod emit;
pub mod error;
pub mod format;
pub mod mock;
pub mod naming;
pub mod resolve;
pub mod schema;
pub mod template;
pub mod types;

pub use compiler::{CompileOutput, Compiler, Definition};
pub use config::{CompileConfig, Lang, NamingPolicy, Substitution, TemplateOptions};
pub use document::Document;
pub use emit::{GeneratedModule, ModuleKind};
pub use error::CompileError;
pub use format::{FormatDiagnostic, FormatStyle, Formatter, LayoutFormatter, PrettierFormatter};
pub use mock::{MockArtifact, MockEntry};
pub use resolve::{ResolvedType, TypeResolver};
pub use template::{RequestTemplate, TemplateRegistry};

/// Compile `source` (JSON or YAML) with the built-in formatter and templates.
pub fn generate(source: &str, config: &CompileConfig) -> Result<CompileOutput, CompileError> {
    let templates = TemplateRegistry::builtin();
    Compiler::new(config, &LayoutFormatter, &templates).compile_str(source)
}
