//! Target-language type expressions.
//!
//! The resolver produces a [`TypeExpr`] tree; rendering to text happens once
//! per language so TypeScript and JSDoc spellings share one structure.

use crate::config::Lang;
use crate::naming::{escape_js_string, quote_if_needed};

/// A semantic type expression.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum TypeExpr {
    /// The universal fallback type.
    Any,
    /// An object with no declared shape.
    Object,
    /// A built-in scalar type.
    Primitive(Primitive),
    /// A definition referenced by its normalized name.
    Named(String),
    /// `T[]`
    Array(Box<TypeExpr>),
    /// Structural record: `{ a: T; b?: U }`.
    Record(Vec<Field>),
    /// String-keyed map: `Record<string, V>`.
    Map(Box<TypeExpr>),
    /// Union of string literals.
    LiteralUnion(Vec<String>),
    /// `A | B`
    Union(Vec<TypeExpr>),
    /// `A & B`
    Intersection(Vec<TypeExpr>),
    /// Pre-rendered text, emitted verbatim.
    Raw(String),
}

/// Mapped primitive types.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Primitive {
    /// `boolean`
    Boolean,
    /// `number`
    Number,
    /// `string`
    String,
    /// Binary payloads.
    Blob,
    /// Multipart form bodies.
    FormData,
}

/// One field of a structural record.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Field {
    /// Property key, unquoted.
    pub name: String,
    /// Type of the value.
    pub ty: TypeExpr,
    /// Rendered with `?`.
    pub optional: bool,
    /// Carried into the doc comment of the field.
    pub description: Option<String>,
}

impl Primitive {
    /// Type name in both languages.
    pub const fn render(self) -> &'static str {
        match self {
            Primitive::Boolean => "boolean",
            Primitive::Number => "number",
            Primitive::String => "string",
            Primitive::Blob => "Blob",
            Primitive::FormData => "FormData",
        }
    }
}

impl TypeExpr {
    /// Whether this renders as a bare union and needs parentheses inside
    /// array or intersection syntax.
    fn is_union_like(&self) -> bool {
        match self {
            TypeExpr::Union(members) => members.len() > 1,
            TypeExpr::LiteralUnion(values) => values.len() > 1,
            TypeExpr::Intersection(members) => members.len() > 1,
            _ => false,
        }
    }

    /// Whether this is the fallback type.
    pub const fn is_any(&self) -> bool {
        matches!(self, TypeExpr::Any)
    }

    /// Render for the given target language.
    pub fn render(&self, lang: Lang) -> String {
        match self {
            TypeExpr::Any => match lang {
                Lang::Ts => "any".to_string(),
                Lang::Js => "*".to_string(),
            },
            TypeExpr::Object => match lang {
                Lang::Ts => "object".to_string(),
                Lang::Js => "Object".to_string(),
            },
            TypeExpr::Primitive(p) => p.render().to_string(),
            TypeExpr::Named(name) => name.clone(),
            TypeExpr::Raw(text) => text.clone(),
            TypeExpr::Array(inner) => {
                let inner_str = inner.render(lang);
                match lang {
                    Lang::Ts if inner.is_union_like() => format!("({inner_str})[]"),
                    Lang::Ts => format!("{inner_str}[]"),
                    Lang::Js => format!("Array<{inner_str}>"),
                }
            }
            TypeExpr::Record(fields) => {
                if fields.is_empty() {
                    return "{}".to_string();
                }
                let sep = match lang {
                    Lang::Ts => "; ",
                    Lang::Js => ", ",
                };
                let parts: Vec<_> = fields.iter().map(|f| f.render(lang)).collect();
                format!("{{ {} }}", parts.join(sep))
            }
            TypeExpr::Map(value) => match lang {
                Lang::Ts => format!("Record<string, {}>", value.render(lang)),
                Lang::Js => format!("Object<string, {}>", value.render(lang)),
            },
            TypeExpr::LiteralUnion(values) => values
                .iter()
                .map(|v| format!("\"{}\"", escape_js_string(v)))
                .collect::<Vec<_>>()
                .join(" | "),
            TypeExpr::Union(members) => join_members(members, " | ", lang),
            TypeExpr::Intersection(members) => join_members(members, " & ", lang),
        }
    }
}

fn join_members(members: &[TypeExpr], sep: &str, lang: Lang) -> String {
    if members.is_empty() {
        return TypeExpr::Any.render(lang);
    }
    members
        .iter()
        .map(|m| {
            let s = m.render(lang);
            if m.is_union_like() && members.len() > 1 {
                format!("({s})")
            } else {
                s
            }
        })
        .collect::<Vec<_>>()
        .join(sep)
}

impl Field {
    /// `key?: Type`, quoting keys that are not identifiers.
    pub fn render(&self, lang: Lang) -> String {
        let key = quote_if_needed(&self.name);
        let opt = if self.optional { "?" } else { "" };
        format!("{key}{opt}: {}", self.ty.render(lang))
    }
}
