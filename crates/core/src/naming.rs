//! Identifier normalization.
//!
//! Turns raw schema names, `$ref` pointers and path templates into names and
//! expressions that are valid in the generated source.

use std::collections::{BTreeMap, BTreeSet, HashSet};
use std::fmt::Write as _;
use std::sync::LazyLock;

use serde_json::{Map, Value};

use crate::config::NamingPolicy;

/// Reserved words that cannot be used as generated identifiers.
pub static TS_RESERVED_WORDS: LazyLock<HashSet<&'static str>> = LazyLock::new(|| {
    [
        "break",
        "case",
        "catch",
        "class",
        "const",
        "continue",
        "debugger",
        "default",
        "delete",
        "do",
        "else",
        "enum",
        "export",
        "extends",
        "false",
        "finally",
        "for",
        "function",
        "if",
        "import",
        "in",
        "instanceof",
        "new",
        "null",
        "return",
        "super",
        "switch",
        "this",
        "throw",
        "true",
        "try",
        "typeof",
        "var",
        "void",
        "while",
        "with",
        "yield",
        "let",
        "static",
        "implements",
        "interface",
        "package",
        "private",
        "protected",
        "public",
        "await",
        "async",
    ]
    .into_iter()
    .collect()
});

/// Predefined type names a declaration may not take.
const TS_PREDEFINED_TYPES: [&str; 10] = [
    "any", "unknown", "never", "number", "bigint", "boolean", "string", "symbol", "object", "undefined",
];

/// Global names a definition import would shadow inside the request module.
pub static TS_GLOBAL_NAMES: LazyLock<HashSet<&'static str>> = LazyLock::new(|| {
    [
        "Array",
        "Blob",
        "Boolean",
        "Date",
        "Error",
        "File",
        "FormData",
        "Headers",
        "JSON",
        "Map",
        "Number",
        "Object",
        "Partial",
        "Promise",
        "Record",
        "RegExp",
        "Request",
        "Response",
        "Set",
        "String",
        "Symbol",
        "URL",
        "URLSearchParams",
        "AxiosResponse",
        "axios",
        "fetch",
    ]
    .into_iter()
    .collect()
});

fn is_forbidden(c: char) -> bool {
    !(c.is_alphanumeric() || c == '_')
}

/// Flatten a generic-parameterized type name into a plain identifier.
///
/// Every forbidden character becomes `_`, then trailing `_` are stripped:
/// `Animal<Dog>` -> `Animal_Dog`, `Map<string,string>` -> `Map_string_string`.
/// Applying it twice yields the same result as applying it once.
pub fn format_generic_interface(name: &str) -> String {
    let replaced: String = name
        .chars()
        .map(|c| if is_forbidden(c) { '_' } else { c })
        .collect();
    replaced.trim_end_matches('_').to_string()
}

/// Declared name of a definition: flattened, then made a legal type name.
///
/// Returns `None` when nothing is left after flattening.
pub fn definition_name(raw: &str) -> Option<String> {
    let name = format_generic_interface(raw);
    if name.is_empty() {
        return None;
    }
    let name = sanitize_identifier(&name);
    if TS_PREDEFINED_TYPES.contains(&name.as_str()) {
        Some(format!("_{name}"))
    } else {
        Some(name)
    }
}

/// Definition name a `$ref` pointer targets, normalized the same way as the
/// definition itself.
///
/// Returns `None` when the pointer has no usable final segment.
pub fn get_ref(pointer: &str) -> Option<String> {
    let tail = pointer.rsplit('/').next().unwrap_or(pointer);
    definition_name(tail)
}

/// Local names for definitions that would shadow a global inside the request
/// module: `Error` is imported as `ApiError`, with `_` appended until the
/// alias clashes with nothing.
pub fn import_aliases(known: &BTreeSet<String>) -> BTreeMap<String, String> {
    let mut aliases = BTreeMap::new();
    let mut chosen = BTreeSet::new();
    for name in known.iter().filter(|n| TS_GLOBAL_NAMES.contains(n.as_str())) {
        let mut alias = format!("Api{name}");
        while known.contains(&alias) || chosen.contains(&alias) || TS_GLOBAL_NAMES.contains(alias.as_str()) {
            alias.push('_');
        }
        chosen.insert(alias.clone());
        aliases.insert(name.clone(), alias);
    }
    aliases
}

/// Whether `name` can be declared as-is: identifier characters only, not
/// starting with a digit, and not a reserved word.
pub fn is_valid_identifier(name: &str) -> bool {
    let mut chars = name.chars();
    let Some(first) = chars.next() else {
        return false;
    };
    (first.is_alphabetic() || first == '_' || first == '$')
        && chars.all(|c| c.is_alphanumeric() || c == '_' || c == '$')
        && !TS_RESERVED_WORDS.contains(name)
}

/// Check if a key needs bracket notation (or quoting) for property access.
pub fn needs_bracket_notation(name: &str) -> bool {
    name.is_empty()
        || !name
            .chars()
            .next()
            .is_some_and(|c| c.is_ascii_alphabetic() || c == '_' || c == '$')
        || !name
            .chars()
            .all(|c| c.is_ascii_alphanumeric() || c == '_' || c == '$')
}

/// Escape a string for a double-quoted JavaScript string literal.
///
/// Line terminators and other control characters are written as escapes so
/// the literal always stays on one line.
pub fn escape_js_string(s: &str) -> String {
    let mut out = String::with_capacity(s.len());
    for c in s.chars() {
        match c {
            '\\' => out.push_str("\\\\"),
            '"' => out.push_str("\\\""),
            '\n' => out.push_str("\\n"),
            '\r' => out.push_str("\\r"),
            '\t' => out.push_str("\\t"),
            c if c.is_control() || c == '\u{2028}' || c == '\u{2029}' => {
                let _ = write!(out, "\\u{:04x}", u32::from(c));
            }
            c => out.push(c),
        }
    }
    out
}

/// Quote a property key if it is not a plain identifier.
pub fn quote_if_needed(name: &str) -> String {
    if needs_bracket_notation(name) {
        format!("\"{}\"", escape_js_string(name))
    } else {
        name.to_string()
    }
}

/// Property access expression: `params.foo` or `params["foo-bar"]`.
pub fn format_param_access(obj: &str, prop: &str) -> String {
    if needs_bracket_notation(prop) {
        format!("{obj}[\"{}\"]", escape_js_string(prop))
    } else {
        format!("{obj}.{prop}")
    }
}

/// One piece of a parsed path template.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum UrlPart {
    /// Literal text between placeholders.
    Static(String),
    /// Name inside a `{name}` placeholder.
    Param(String),
}

/// A path template such as `/pet/{petId}` split into static and parameter parts.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct UrlTemplate {
    /// Parts in path order.
    pub parts: Vec<UrlPart>,
}

impl UrlTemplate {
    /// Parse `{name}` placeholders. An unterminated `{` is kept as static text.
    pub fn parse(path: &str) -> Self {
        let mut parts = Vec::new();
        let mut rest = path;
        while let Some(open) = rest.find('{') {
            let Some(close) = rest[open..].find('}').map(|i| open + i) else {
                break;
            };
            if open > 0 {
                parts.push(UrlPart::Static(rest[..open].to_string()));
            }
            parts.push(UrlPart::Param(rest[open + 1..close].to_string()));
            rest = &rest[close + 1..];
        }
        if !rest.is_empty() {
            parts.push(UrlPart::Static(rest.to_string()));
        }
        Self { parts }
    }

    /// Placeholder names in order of appearance, without duplicates.
    pub fn param_names(&self) -> Vec<&str> {
        let mut seen = HashSet::new();
        self.parts
            .iter()
            .filter_map(|p| match p {
                UrlPart::Param(name) if seen.insert(name.as_str()) => Some(name.as_str()),
                _ => None,
            })
            .collect()
    }

    /// Whether the path has at least one placeholder.
    pub fn has_params(&self) -> bool {
        self.parts.iter().any(|p| matches!(p, UrlPart::Param(_)))
    }

    /// Render as a template literal reading each placeholder off `obj`.
    pub fn to_template_literal(&self, obj: &str) -> String {
        let mut out = String::from("`");
        for part in &self.parts {
            match part {
                UrlPart::Static(s) => out.push_str(
                    &s.replace('\\', "\\\\")
                        .replace('`', "\\`")
                        .replace("${", "\\${"),
                ),
                UrlPart::Param(name) => {
                    out.push_str("${");
                    out.push_str(&format_param_access(obj, name));
                    out.push('}');
                }
            }
        }
        out.push('`');
        out
    }

    /// Substitute placeholders with values from `args`, the way the rendered
    /// template literal would at runtime. Missing keys stay as `{name}`.
    pub fn expand(&self, args: &Map<String, Value>) -> String {
        let mut out = String::new();
        for part in &self.parts {
            match part {
                UrlPart::Static(s) => out.push_str(s),
                UrlPart::Param(name) => match args.get(name) {
                    Some(Value::String(s)) => out.push_str(s),
                    Some(Value::Null) => out.push_str("null"),
                    Some(other) => out.push_str(&other.to_string()),
                    None => {
                        out.push('{');
                        out.push_str(name);
                        out.push('}');
                    }
                },
            }
        }
        out
    }
}

/// Rewrite every `{param}` placeholder of `path` into an interpolation that
/// reads the parameter off `obj`.
///
/// `/pet/{petId}` -> `` `/pet/${pathParams.petId}` ``,
/// `/pet/{map.id}` -> `` `/pet/${pathParams["map.id"]}` ``.
pub fn format_url(path: &str, obj: &str) -> String {
    UrlTemplate::parse(path).to_template_literal(obj)
}

/// Split a name into words on separators and case boundaries.
fn split_words(name: &str) -> Vec<String> {
    let mut words = Vec::new();
    for chunk in name
        .split(|c: char| is_forbidden(c) || c == '_')
        .filter(|c| !c.is_empty())
    {
        let chars: Vec<char> = chunk.chars().collect();
        let mut current = String::new();
        for (i, &c) in chars.iter().enumerate() {
            if i > 0 && c.is_uppercase() {
                let prev = chars[i - 1];
                let next_lower = chars.get(i + 1).is_some_and(|n| n.is_lowercase());
                if prev.is_lowercase() || prev.is_ascii_digit() || (prev.is_uppercase() && next_lower)
                {
                    words.push(std::mem::take(&mut current));
                }
            }
            current.push(c);
        }
        if !current.is_empty() {
            words.push(current);
        }
    }
    words
}

fn capitalize(word: &str) -> String {
    let mut chars = word.chars();
    match chars.next() {
        None => String::new(),
        Some(first) => first
            .to_uppercase()
            .chain(chars.flat_map(char::to_lowercase))
            .collect(),
    }
}

/// Make `name` a legal identifier: `_` prefix for leading digits and reserved words.
pub fn sanitize_identifier(name: &str) -> String {
    if name.is_empty() {
        return "_empty".to_string();
    }
    let mut result = name.to_string();
    if result
        .chars()
        .next()
        .is_some_and(|c| !(c.is_alphabetic() || c == '_' || c == '$'))
    {
        result = format!("_{result}");
    }
    if TS_RESERVED_WORDS.contains(result.as_str()) {
        result = format!("_{result}");
    }
    result
}

/// Apply a naming policy to a raw operation name.
pub fn apply_naming(name: &str, policy: NamingPolicy) -> String {
    let words = split_words(name);
    let joined = match policy {
        NamingPolicy::Preserve => format_generic_interface(name),
        NamingPolicy::Snake => words
            .iter()
            .map(|w| w.to_lowercase())
            .collect::<Vec<_>>()
            .join("_"),
        NamingPolicy::Pascal => words.iter().map(|w| capitalize(w)).collect(),
        NamingPolicy::Camel => words
            .iter()
            .enumerate()
            .map(|(i, w)| if i == 0 { w.to_lowercase() } else { capitalize(w) })
            .collect(),
    };
    sanitize_identifier(&joined)
}

/// Raw name for an operation without an `operationId`: method plus path
/// segments, with `By<Param>` for each placeholder.
pub fn fallback_operation_name(method: &str, path: &str) -> String {
    let mut name = method.to_lowercase();
    for part in UrlTemplate::parse(path).parts {
        match part {
            UrlPart::Static(s) => {
                for segment in s.split('/').filter(|s| !s.is_empty()) {
                    name.push('_');
                    name.push_str(segment);
                }
            }
            UrlPart::Param(p) => {
                name.push_str("_by_");
                name.push_str(&p);
            }
        }
    }
    name
}

/// Generated function name for an operation: its `operationId`, or a name
/// derived from method and path, with `policy` applied.
pub fn operation_function_name(
    operation_id: Option<&str>,
    method: &str,
    path: &str,
    policy: NamingPolicy,
) -> String {
    match operation_id {
        Some(id) => apply_naming(id, policy),
        None => apply_naming(&fallback_operation_name(method, path), policy),
    }
}
