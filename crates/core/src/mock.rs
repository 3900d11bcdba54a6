//! Deterministic mock responses.
//!
//! One entry per operation: a sample URL with mocked path parameters and a
//! JSON body shaped like the response schema. Refs are followed through the
//! definitions; a ref already being expanded yields `null`, so circular
//! schemas terminate.

use std::collections::HashMap;

use serde::Serialize;
use serde_json::{Map, Value, json};

use crate::compiler::Definition;
use crate::document::{Operation, ParamLocation};
use crate::naming::{UrlTemplate, get_ref};
use crate::schema::{NodeKind, SchemaNode};

const MAX_DEPTH: usize = 8;

/// Mock data for one operation.
#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct MockEntry {
    /// Name of the request function the entry belongs to.
    pub name: String,
    /// Upper-case HTTP method.
    pub method: String,
    /// Path template as declared.
    pub path: String,
    /// `path` with placeholders replaced by mocked values.
    pub sample_url: String,
    /// Sample response body.
    pub body: Value,
}

/// Mock data for a whole document.
#[derive(Debug, Clone, Default, PartialEq, Serialize)]
pub struct MockArtifact {
    /// One entry per operation, in document order.
    pub entries: Vec<MockEntry>,
}

impl MockArtifact {
    /// Route table: method, path and the file holding each body.
    pub fn routes(&self) -> Value {
        Value::Array(
            self.entries
                .iter()
                .map(|e| {
                    json!({
                        "method": e.method,
                        "path": e.path,
                        "url": e.sample_url,
                        "file": format!("{}.json", e.name),
                    })
                })
                .collect(),
        )
    }
}

/// Builds sample values for schema nodes.
#[derive(Debug)]
pub struct MockGenerator<'a> {
    definitions: HashMap<&'a str, &'a SchemaNode>,
}

impl<'a> MockGenerator<'a> {
    /// A generator that expands references into `definitions`.
    pub fn new(definitions: &'a [Definition]) -> Self {
        Self {
            definitions: definitions
                .iter()
                .map(|d| (d.name.as_str(), &d.schema))
                .collect(),
        }
    }

    /// Sample value for `node`.
    pub fn sample(&self, node: &SchemaNode) -> Value {
        let mut expanding = Vec::new();
        self.walk(node, &mut expanding)
    }

    fn walk(&self, node: &SchemaNode, expanding: &mut Vec<String>) -> Value {
        if expanding.len() > MAX_DEPTH {
            return Value::Null;
        }
        match &node.kind {
            NodeKind::Ref(pointer) => {
                let Some(name) = get_ref(pointer) else {
                    return Value::Null;
                };
                if expanding.contains(&name) {
                    return Value::Null;
                }
                let Some(target) = self.definitions.get(name.as_str()).copied() else {
                    return Value::Null;
                };
                expanding.push(name);
                let value = self.walk(target, expanding);
                expanding.pop();
                value
            }
            NodeKind::AllOf(members) => {
                let mut merged = Map::new();
                for member in members {
                    match self.walk(member, expanding) {
                        Value::Object(obj) => merged.extend(obj),
                        Value::Null => {}
                        other if merged.is_empty() => return other,
                        _ => {}
                    }
                }
                Value::Object(merged)
            }
            NodeKind::OneOf(members) => members
                .first()
                .map_or(Value::Null, |m| self.walk(m, expanding)),
            NodeKind::Untyped => Value::Null,
            NodeKind::Array(items) => match items {
                Some(items) => match self.walk(items, expanding) {
                    Value::Null => json!([]),
                    sample => json!([sample]),
                },
                None => json!([]),
            },
            NodeKind::Object {
                properties,
                additional,
            } => {
                let mut obj = Map::new();
                for prop in properties {
                    obj.insert(prop.name.clone(), self.walk(&prop.node, expanding));
                }
                if properties.is_empty()
                    && let Some(value) = additional
                {
                    obj.insert("key".to_string(), self.walk(value, expanding));
                }
                Value::Object(obj)
            }
            NodeKind::Enum(values) => values.first().cloned().unwrap_or(Value::Null),
            NodeKind::MultiType(tags) => tags
                .iter()
                .filter_map(Value::as_str)
                .find(|t| *t != "null")
                .map_or(Value::Null, |t| primitive_sample(t, node.format.as_deref())),
            NodeKind::Primitive(tag) => primitive_sample(tag, node.format.as_deref()),
        }
    }

    /// Mock entry for one operation.
    pub fn entry(&self, name: &str, op: &Operation) -> MockEntry {
        let mut args = Map::new();
        for param in op.params_in(ParamLocation::Path) {
            args.insert(param.name.clone(), self.sample(&param.schema));
        }
        let url = UrlTemplate::parse(&op.path);
        for placeholder in url.param_names() {
            args.entry(placeholder.to_string())
                .or_insert_with(|| json!(1));
        }
        MockEntry {
            name: name.to_string(),
            method: op.method.as_str().to_string(),
            path: op.path.clone(),
            sample_url: url.expand(&args),
            body: op.response.as_ref().map_or(Value::Null, |r| self.sample(r)),
        }
    }
}

fn primitive_sample(tag: &str, format: Option<&str>) -> Value {
    match tag {
        "integer" | "Int64" => json!(1),
        "number" => json!(1.5),
        "boolean" | "bool" | "Boolean" => json!(true),
        "string" => json!(match format {
            Some("date-time") => "2024-01-01T00:00:00Z",
            Some("date") => "2024-01-01",
            Some("uuid") => "00000000-0000-4000-8000-000000000000",
            Some("email") => "user@example.com",
            Some("uri" | "url") => "https://example.com",
            _ => "string",
        }),
        _ => Value::Null,
    }
}

#[cfg(test)]
#[allow(clippy::unwrap_used, clippy::expect_used)]
mod tests {
    use super::*;
    use crate::resolve::TypeResolver;

    fn definition(name: &str, schema: Value) -> Definition {
        let schema = SchemaNode::from_value(&schema);
        Definition {
            name: name.to_string(),
            source_name: name.to_string(),
            resolved: TypeResolver::new().resolve(&schema),
            schema,
        }
    }

    #[test]
    fn test_samples_follow_refs() {
        let defs = vec![
            definition(
                "Pet",
                json!({
                    "type": "object",
                    "properties": {
                        "id": { "type": "integer" },
                        "name": { "type": "string" },
                        "born": { "type": "string", "format": "date" },
                        "status": { "type": "string", "enum": ["available", "sold"] },
                        "tags": { "type": "array", "items": { "$ref": "#/definitions/Tag" } }
                    }
                }),
            ),
            definition("Tag", json!({ "type": "object", "properties": { "label": { "type": "string" } } })),
        ];
        let mocks = MockGenerator::new(&defs);
        let value = mocks.sample(&SchemaNode::reference("#/definitions/Pet"));
        assert_eq!(
            value,
            json!({
                "id": 1,
                "name": "string",
                "born": "2024-01-01",
                "status": "available",
                "tags": [{ "label": "string" }]
            })
        );
    }

    #[test]
    fn test_circular_refs_terminate() {
        let defs = vec![definition(
            "Node",
            json!({
                "type": "object",
                "properties": {
                    "value": { "type": "number" },
                    "next": { "$ref": "#/definitions/Node" },
                    "children": { "type": "array", "items": { "$ref": "#/definitions/Node" } }
                }
            }),
        )];
        let mocks = MockGenerator::new(&defs);
        let value = mocks.sample(&SchemaNode::reference("#/definitions/Node"));
        assert_eq!(value, json!({ "value": 1.5, "next": null, "children": [] }));
    }

    #[test]
    fn test_entry_sample_url() {
        let doc = crate::document::Document::parse(
            r#"{
                "paths": {
                    "/pet/{petId}/owner/{ownerId}": {
                        "get": {
                            "parameters": [{ "name": "petId", "in": "path", "type": "integer" }],
                            "responses": { "200": { "schema": { "type": "boolean" } } }
                        }
                    }
                }
            }"#,
        )
        .unwrap();
        let mocks = MockGenerator::new(&[]);
        let entry = mocks.entry("getOwner", &doc.operations[0]);
        assert_eq!(entry.sample_url, "/pet/1/owner/1");
        assert_eq!(entry.method, "GET");
        assert_eq!(entry.body, json!(true));

        let artifact = MockArtifact { entries: vec![entry] };
        assert_eq!(artifact.routes()[0]["file"], "getOwner.json");
    }
}
