//! Schema nodes read from a generic JSON tree.
//!
//! Real-world documents rarely follow the tagged-union discipline strictly,
//! so classification is lenient: a missing `type` is inferred from the
//! keywords present, and anything unrecognizable becomes [`NodeKind::Untyped`].

use serde_json::Value;

/// One schema fragment.
#[derive(Debug, Clone, PartialEq)]
pub struct SchemaNode {
    /// What the fragment describes.
    pub kind: NodeKind,
    /// `description`, if any.
    pub description: Option<String>,
    /// `format`, if any.
    pub format: Option<String>,
}

/// The active variant of a schema fragment.
#[derive(Debug, Clone, PartialEq)]
pub enum NodeKind {
    /// `$ref` pointer, kept as written.
    Ref(String),
    /// `allOf` members.
    AllOf(Vec<SchemaNode>),
    /// `anyOf` / `oneOf` members.
    OneOf(Vec<SchemaNode>),
    /// No type information at all.
    Untyped,
    /// `type: array`; `None` when `items` is missing.
    Array(Option<Box<SchemaNode>>),
    /// `type: object`. Empty `properties` means a free-form object.
    Object {
        /// Declared properties, in document order.
        properties: Vec<Property>,
        /// Schema of `additionalProperties`.
        additional: Option<Box<SchemaNode>>,
    },
    /// Literal values of an `enum`.
    Enum(Vec<Value>),
    /// `type` given as a sequence of tags.
    MultiType(Vec<Value>),
    /// Any other `type` tag, including unknown ones.
    Primitive(String),
}

/// A named property of an object node.
#[derive(Debug, Clone, PartialEq)]
pub struct Property {
    /// Key as written.
    pub name: String,
    /// Schema of the value.
    pub node: SchemaNode,
    /// Listed in the parent's `required`.
    pub required: bool,
}

impl SchemaNode {
    /// A node with no type information.
    pub const fn untyped() -> Self {
        Self {
            kind: NodeKind::Untyped,
            description: None,
            format: None,
        }
    }

    /// A `$ref` node.
    pub fn reference(pointer: impl Into<String>) -> Self {
        Self {
            kind: NodeKind::Ref(pointer.into()),
            description: None,
            format: None,
        }
    }

    /// A node with the given `type` tag.
    pub fn primitive(tag: impl Into<String>) -> Self {
        Self {
            kind: NodeKind::Primitive(tag.into()),
            description: None,
            format: None,
        }
    }

    /// Classify a raw JSON value. Non-object values yield an untyped node.
    pub fn from_value(value: &Value) -> Self {
        let Some(obj) = value.as_object() else {
            return Self::untyped();
        };
        let description = obj
            .get("description")
            .and_then(Value::as_str)
            .map(str::to_string);
        let format = obj.get("format").and_then(Value::as_str).map(str::to_string);

        let kind = if let Some(pointer) = obj.get("$ref").and_then(Value::as_str) {
            NodeKind::Ref(pointer.to_string())
        } else if let Some(members) = obj.get("allOf").and_then(Value::as_array) {
            NodeKind::AllOf(members.iter().map(Self::from_value).collect())
        } else if let Some(members) = obj
            .get("oneOf")
            .or_else(|| obj.get("anyOf"))
            .and_then(Value::as_array)
        {
            NodeKind::OneOf(members.iter().map(Self::from_value).collect())
        } else if let Some(values) = obj.get("enum").and_then(Value::as_array) {
            NodeKind::Enum(values.clone())
        } else {
            match obj.get("type") {
                Some(Value::String(tag)) => classify_tag(tag, obj, format.as_deref()),
                Some(Value::Array(tags)) => NodeKind::MultiType(tags.clone()),
                Some(_) | None => infer_untagged(obj),
            }
        };

        Self {
            kind,
            description,
            format,
        }
    }

    /// Whether this node is an object with at least one declared property.
    pub fn has_properties(&self) -> bool {
        matches!(&self.kind, NodeKind::Object { properties, .. } if !properties.is_empty())
    }
}

fn classify_tag(tag: &str, obj: &serde_json::Map<String, Value>, format: Option<&str>) -> NodeKind {
    match tag {
        "array" => NodeKind::Array(
            obj.get("items")
                .filter(|v| v.is_object())
                .map(|v| Box::new(SchemaNode::from_value(v))),
        ),
        "object" => object_kind(obj),
        "string" if format == Some("binary") => NodeKind::Primitive("file".to_string()),
        other => NodeKind::Primitive(other.to_string()),
    }
}

fn infer_untagged(obj: &serde_json::Map<String, Value>) -> NodeKind {
    if obj.contains_key("properties") || obj.contains_key("additionalProperties") {
        object_kind(obj)
    } else if let Some(items) = obj.get("items").filter(|v| v.is_object()) {
        NodeKind::Array(Some(Box::new(SchemaNode::from_value(items))))
    } else {
        NodeKind::Untyped
    }
}

fn object_kind(obj: &serde_json::Map<String, Value>) -> NodeKind {
    let required_list: Vec<&str> = obj
        .get("required")
        .and_then(Value::as_array)
        .map(|r| r.iter().filter_map(Value::as_str).collect())
        .unwrap_or_default();

    let properties = obj
        .get("properties")
        .and_then(Value::as_object)
        .map(|props| {
            props
                .iter()
                .map(|(name, raw)| {
                    let own_flag = raw.get("required").and_then(Value::as_bool) == Some(true);
                    Property {
                        name: name.clone(),
                        node: SchemaNode::from_value(raw),
                        required: own_flag || required_list.contains(&name.as_str()),
                    }
                })
                .collect()
        })
        .unwrap_or_default();

    let additional = match obj.get("additionalProperties") {
        Some(v @ Value::Object(_)) => Some(Box::new(SchemaNode::from_value(v))),
        Some(Value::Bool(true)) => Some(Box::new(SchemaNode::untyped())),
        _ => None,
    };

    NodeKind::Object {
        properties,
        additional,
    }
}
