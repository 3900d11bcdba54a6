//! Schema node to type expression resolution.
//!
//! Resolution is a depth-first walk with no cycle guard: a `$ref` always
//! stops at the definition's name and is never inlined, so circular schemas
//! terminate at the name boundary.

use std::collections::{BTreeMap, BTreeSet};

use serde_json::Value;

use crate::config::Lang;
use crate::naming::get_ref;
use crate::schema::{NodeKind, SchemaNode};
use crate::types::{Field, Primitive, TypeExpr};

/// Result of resolving one schema node.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct ResolvedType {
    /// The resolved type expression.
    pub ty: TypeExpr,
    /// Normalized definition names the type refers to.
    pub imports: BTreeSet<String>,
    /// True iff the node's primitive tag is the file-upload tag.
    pub is_binary: bool,
    /// Whether the value must be present.
    pub required: bool,
    /// Description carried over from the schema or parameter.
    pub description: Option<String>,
}

impl ResolvedType {
    /// The `any` fallback with no imports.
    pub fn any() -> Self {
        Self {
            ty: TypeExpr::Any,
            imports: BTreeSet::new(),
            is_binary: false,
            required: false,
            description: None,
        }
    }

    /// Render the type for `lang`.
    pub fn render(&self, lang: Lang) -> String {
        self.ty.render(lang)
    }

    /// Set the required flag.
    pub fn with_required(mut self, required: bool) -> Self {
        self.required = required;
        self
    }

    /// Replace the description when `description` is present.
    pub fn with_description(mut self, description: Option<String>) -> Self {
        if description.is_some() {
            self.description = description;
        }
        self
    }
}

/// Look up a primitive tag in the fixed primitive table.
pub fn primitive_type(tag: &str) -> Option<Primitive> {
    match tag {
        "boolean" | "bool" | "Boolean" => Some(Primitive::Boolean),
        "Int64" | "integer" | "number" => Some(Primitive::Number),
        "string" => Some(Primitive::String),
        "file" => Some(Primitive::Blob),
        "formData" => Some(Primitive::FormData),
        _ => None,
    }
}

/// Maps schema nodes to type expressions.
///
/// When built with [`TypeResolver::with_definitions`], refs to names outside
/// the known set degrade to `any` instead of producing a dangling import.
/// With [`TypeResolver::with_aliases`], a ref renders under its local alias
/// while `imports` keeps the definition's own name.
#[derive(Debug, Clone, Copy, Default)]
pub struct TypeResolver<'a> {
    known: Option<&'a BTreeSet<String>>,
    aliases: Option<&'a BTreeMap<String, String>>,
}

impl<'a> TypeResolver<'a> {
    /// A resolver that accepts every ref.
    pub fn new() -> Self {
        Self::default()
    }

    /// A resolver that only accepts refs to `known` definition names.
    pub fn with_definitions(known: &'a BTreeSet<String>) -> Self {
        Self {
            known: Some(known),
            aliases: None,
        }
    }

    /// Render refs to the keys of `aliases` under the mapped local name.
    pub fn with_aliases(self, aliases: &'a BTreeMap<String, String>) -> Self {
        Self {
            aliases: Some(aliases),
            ..self
        }
    }

    /// Resolve `node`. Never fails; malformed nodes fall back to `any`.
    pub fn resolve(&self, node: &SchemaNode) -> ResolvedType {
        let mut imports = BTreeSet::new();
        let ty = self.walk(node, &mut imports);
        ResolvedType {
            ty,
            imports,
            is_binary: matches!(&node.kind, NodeKind::Primitive(tag) if tag == "file"),
            required: false,
            description: node.description.clone(),
        }
    }

    fn walk(&self, node: &SchemaNode, imports: &mut BTreeSet<String>) -> TypeExpr {
        match &node.kind {
            NodeKind::Ref(pointer) => self.resolve_ref(pointer, imports),
            NodeKind::Untyped => TypeExpr::Any,
            NodeKind::Array(Some(items)) => TypeExpr::Array(Box::new(self.walk(items, imports))),
            NodeKind::Array(None) => {
                tracing::debug!("array schema without items, using any[]");
                TypeExpr::Array(Box::new(TypeExpr::Any))
            }
            NodeKind::Object {
                properties,
                additional,
            } => {
                if properties.is_empty() {
                    return match additional {
                        Some(value) => TypeExpr::Map(Box::new(self.walk(value, imports))),
                        None => TypeExpr::Object,
                    };
                }
                let fields = properties
                    .iter()
                    .map(|prop| Field {
                        name: prop.name.clone(),
                        ty: self.walk(&prop.node, imports),
                        optional: !prop.required,
                        description: prop.node.description.clone(),
                    })
                    .collect();
                TypeExpr::Record(fields)
            }
            NodeKind::Enum(values) => {
                TypeExpr::LiteralUnion(values.iter().map(enum_literal).collect())
            }
            NodeKind::AllOf(members) => self.compose(members, imports, TypeExpr::Intersection),
            NodeKind::OneOf(members) => self.compose(members, imports, TypeExpr::Union),
            NodeKind::MultiType(tags) => {
                TypeExpr::Raw(Value::Array(tags.clone()).to_string())
            }
            NodeKind::Primitive(tag) => match primitive_type(tag) {
                Some(p) => TypeExpr::Primitive(p),
                None => {
                    tracing::debug!(tag = %tag, "unknown primitive tag, using any");
                    TypeExpr::Any
                }
            },
        }
    }

    fn compose(
        &self,
        members: &[SchemaNode],
        imports: &mut BTreeSet<String>,
        wrap: fn(Vec<TypeExpr>) -> TypeExpr,
    ) -> TypeExpr {
        let mut resolved: Vec<TypeExpr> = members.iter().map(|m| self.walk(m, imports)).collect();
        match resolved.len() {
            0 => TypeExpr::Any,
            1 => resolved.remove(0),
            _ => wrap(resolved),
        }
    }

    fn resolve_ref(&self, pointer: &str, imports: &mut BTreeSet<String>) -> TypeExpr {
        let Some(name) = get_ref(pointer) else {
            tracing::warn!(pointer = %pointer, "unresolvable $ref, using any");
            return TypeExpr::Any;
        };
        if let Some(known) = self.known
            && !known.contains(&name)
        {
            tracing::warn!(pointer = %pointer, name = %name, "$ref targets unknown definition, using any");
            return TypeExpr::Any;
        }
        let local = self.aliases.and_then(|aliases| aliases.get(&name)).cloned();
        imports.insert(name.clone());
        TypeExpr::Named(local.unwrap_or(name))
    }
}

fn enum_literal(value: &Value) -> String {
    match value {
        Value::String(s) => s.clone(),
        other => other.to_string(),
    }
}

#[cfg(test)]
#[allow(clippy::unwrap_used, clippy::expect_used)]
mod tests {
    use super::*;
    use serde_json::json;

    fn resolve(value: Value) -> ResolvedType {
        TypeResolver::new().resolve(&SchemaNode::from_value(&value))
    }

    #[test]
    fn test_primitive_table_is_total() {
        let table = [
            ("boolean", "boolean"),
            ("bool", "boolean"),
            ("Boolean", "boolean"),
            ("Int64", "number"),
            ("integer", "number"),
            ("number", "number"),
            ("string", "string"),
            ("file", "Blob"),
            ("formData", "FormData"),
        ];
        for (tag, expected) in table {
            let r = resolve(json!({ "type": tag }));
            assert_eq!(r.render(Lang::Ts), expected, "tag: {tag}");
            assert!(r.imports.is_empty(), "tag: {tag}");
            assert_eq!(r.is_binary, tag == "file", "tag: {tag}");
        }
    }

    #[test]
    fn test_self_reference_terminates_at_name() {
        let r = resolve(json!({ "$ref": "#/definitions/A" }));
        assert_eq!(r.ty, TypeExpr::Named("A".into()));
        assert!(r.imports.contains("A"));

        let node = json!({
            "type": "object",
            "properties": {
                "children": { "type": "array", "items": { "$ref": "#/definitions/A" } }
            }
        });
        let r = resolve(node);
        assert_eq!(r.render(Lang::Ts), "{ children?: A[] }");
        assert_eq!(r.imports.into_iter().collect::<Vec<_>>(), vec!["A".to_string()]);
    }

    #[test]
    fn test_enum_resolves_to_literal_union() {
        let r = resolve(json!({ "type": "enum", "enum": ["a", "b"] }));
        assert_eq!(r.render(Lang::Ts), "\"a\" | \"b\"");
        assert!(r.imports.is_empty());

        let r = resolve(json!({ "type": "integer", "enum": [1, 2] }));
        assert_eq!(r.render(Lang::Ts), "\"1\" | \"2\"");
    }

    #[test]
    fn test_object_resolves_to_record_with_required_flags() {
        let r = resolve(json!({
            "type": "object",
            "required": ["id"],
            "properties": {
                "id": { "type": "integer" },
                "name": { "type": "string" }
            }
        }));
        assert_eq!(r.render(Lang::Ts), "{ id: number; name?: string }");
    }

    #[test]
    fn test_fallbacks() {
        assert_eq!(resolve(json!({})).render(Lang::Ts), "any");
        assert_eq!(resolve(json!({ "type": "object" })).render(Lang::Ts), "object");
        assert_eq!(resolve(json!({ "type": "array" })).render(Lang::Ts), "any[]");
        assert_eq!(resolve(json!({ "type": "uuid" })).render(Lang::Ts), "any");
        assert_eq!(
            resolve(json!({ "type": ["string", "null"] })).render(Lang::Ts),
            "[\"string\",\"null\"]"
        );
    }

    #[test]
    fn test_unknown_ref_degrades_with_known_set() {
        let known: BTreeSet<String> = ["Pet".to_string()].into_iter().collect();
        let resolver = TypeResolver::with_definitions(&known);

        let r = resolver.resolve(&SchemaNode::reference("#/definitions/Pet"));
        assert_eq!(r.render(Lang::Ts), "Pet");

        let r = resolver.resolve(&SchemaNode::reference("#/definitions/Ghost"));
        assert_eq!(r.render(Lang::Ts), "any");
        assert!(r.imports.is_empty());

        let r = resolver.resolve(&SchemaNode::reference("#/definitions/"));
        assert!(r.ty.is_any());
    }

    #[test]
    fn test_aliased_ref_keeps_import_name() {
        let known: BTreeSet<String> = ["Error".to_string()].into_iter().collect();
        let aliases: BTreeMap<String, String> =
            [("Error".to_string(), "ApiError".to_string())].into_iter().collect();
        let resolver = TypeResolver::with_definitions(&known).with_aliases(&aliases);

        let r = resolver.resolve(&SchemaNode::from_value(&json!({
            "type": "array",
            "items": { "$ref": "#/definitions/Error" }
        })));
        assert_eq!(r.render(Lang::Ts), "ApiError[]");
        assert_eq!(r.imports.into_iter().collect::<Vec<_>>(), vec!["Error".to_string()]);

        let plain = TypeResolver::with_definitions(&known).resolve(&SchemaNode::reference("#/definitions/Error"));
        assert_eq!(plain.render(Lang::Ts), "Error");
    }

    #[test]
    fn test_generic_ref_is_flattened() {
        let r = resolve(json!({ "$ref": "#/definitions/Result«List«Pet»»" }));
        assert_eq!(r.render(Lang::Ts), "Result_List_Pet");
        assert!(r.imports.contains("Result_List_Pet"));
    }

    #[test]
    fn test_composition_and_maps() {
        let r = resolve(json!({
            "allOf": [
                { "$ref": "#/definitions/Base" },
                { "type": "object", "properties": { "extra": { "type": "boolean" } } }
            ]
        }));
        assert_eq!(r.render(Lang::Ts), "Base & { extra?: boolean }");

        let r = resolve(json!({ "oneOf": [{ "type": "string" }, { "type": "integer" }] }));
        assert_eq!(r.render(Lang::Ts), "string | number");

        let r = resolve(json!({ "type": "object", "additionalProperties": { "$ref": "#/definitions/Pet" } }));
        assert_eq!(r.render(Lang::Ts), "Record<string, Pet>");
        assert!(r.imports.contains("Pet"));
    }
}
