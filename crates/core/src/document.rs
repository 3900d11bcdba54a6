//! Reading an OpenAPI 3 or Swagger 2 document.
//!
//! The document is consumed as a generic JSON tree rather than deserialized
//! into strict structs, so partially specified schemas still compile. Only the
//! top-level shape (a mapping) is validated.

use serde_json::{Map, Value};

use crate::error::CompileError;
use crate::schema::{NodeKind, SchemaNode};

/// HTTP methods an operation can be declared under, in emission order.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum HttpMethod {
    /// `GET`
    Get,
    /// `POST`
    Post,
    /// `PUT`
    Put,
    /// `PATCH`
    Patch,
    /// `DELETE`
    Delete,
    /// `HEAD`
    Head,
    /// `OPTIONS`
    Options,
}

impl HttpMethod {
    /// Every method, in emission order.
    pub const ALL: [HttpMethod; 7] = [
        HttpMethod::Get,
        HttpMethod::Post,
        HttpMethod::Put,
        HttpMethod::Patch,
        HttpMethod::Delete,
        HttpMethod::Head,
        HttpMethod::Options,
    ];

    /// Upper-case method name.
    pub fn as_str(self) -> &'static str {
        match self {
            HttpMethod::Get => "GET",
            HttpMethod::Post => "POST",
            HttpMethod::Put => "PUT",
            HttpMethod::Patch => "PATCH",
            HttpMethod::Delete => "DELETE",
            HttpMethod::Head => "HEAD",
            HttpMethod::Options => "OPTIONS",
        }
    }

    /// Key used for this method in a path item.
    pub fn lower(self) -> &'static str {
        match self {
            HttpMethod::Get => "get",
            HttpMethod::Post => "post",
            HttpMethod::Put => "put",
            HttpMethod::Patch => "patch",
            HttpMethod::Delete => "delete",
            HttpMethod::Head => "head",
            HttpMethod::Options => "options",
        }
    }
}

/// Where a parameter is sent.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum ParamLocation {
    /// A `{placeholder}` in the path.
    Path,
    /// Query string.
    Query,
    /// Request header.
    Header,
    /// JSON request body.
    Body,
    /// Multipart form field.
    FormData,
    /// Cookie; never forwarded.
    Cookie,
}

impl ParamLocation {
    fn parse(s: &str) -> Option<Self> {
        match s {
            "path" => Some(ParamLocation::Path),
            "query" => Some(ParamLocation::Query),
            "header" => Some(ParamLocation::Header),
            "body" => Some(ParamLocation::Body),
            "formData" => Some(ParamLocation::FormData),
            "cookie" => Some(ParamLocation::Cookie),
            _ => None,
        }
    }
}

/// One operation parameter with its own schema.
#[derive(Debug, Clone, PartialEq)]
pub struct Parameter {
    /// Parameter name as declared.
    pub name: String,
    /// Where the value is sent.
    pub location: ParamLocation,
    /// Whether callers must supply it. Always true for path parameters.
    pub required: bool,
    /// Declared description.
    pub description: Option<String>,
    /// Value schema.
    pub schema: SchemaNode,
}

/// One path + method pair.
#[derive(Debug, Clone, PartialEq)]
pub struct Operation {
    /// Path template, e.g. `/pet/{id}`.
    pub path: String,
    /// HTTP method.
    pub method: HttpMethod,
    /// Declared `operationId`.
    pub operation_id: Option<String>,
    /// One-line summary.
    pub summary: Option<String>,
    /// Longer description.
    pub description: Option<String>,
    /// Whether the operation is marked deprecated.
    pub deprecated: bool,
    /// Tags grouping the operation.
    pub tags: Vec<String>,
    /// Parameters, path-level ones merged in.
    pub parameters: Vec<Parameter>,
    /// Success response schema; `None` when the operation declares none.
    pub response: Option<SchemaNode>,
}

impl Operation {
    /// `GET /pet/{id}`, used in diagnostics.
    pub fn location(&self) -> String {
        format!("{} {}", self.method.as_str(), self.path)
    }

    /// Parameters sent in `location`.
    pub fn params_in(&self, location: ParamLocation) -> impl Iterator<Item = &Parameter> {
        self.parameters
            .iter()
            .filter(move |p| p.location == location)
    }

    /// Whether the operation carries one of `selected` tags. An empty
    /// selection matches every operation.
    pub fn has_any_tag(&self, selected: &[String]) -> bool {
        selected.is_empty() || self.tags.iter().any(|tag| selected.contains(tag))
    }
}

/// A named top-level schema as declared in the document.
#[derive(Debug, Clone, PartialEq)]
pub struct RawDefinition {
    /// Name as declared, before normalization.
    pub name: String,
    /// The definition's schema.
    pub schema: SchemaNode,
}

/// A parsed schema document.
#[derive(Debug, Clone)]
pub struct Document {
    /// `info.title`.
    pub title: Option<String>,
    /// `info.version`.
    pub version: Option<String>,
    /// Tags declared at the top level, in order.
    pub tags: Vec<String>,
    /// Definitions from `definitions` and `components.schemas`.
    pub definitions: Vec<RawDefinition>,
    /// Operations in path order, then method order.
    pub operations: Vec<Operation>,
}

impl Document {
    /// Parse JSON, falling back to YAML.
    pub fn parse(text: &str) -> Result<Self, CompileError> {
        let value = match serde_json::from_str::<Value>(text) {
            Ok(v) => v,
            Err(json_err) => serde_yaml::from_str::<Value>(text).map_err(|yaml_err| {
                CompileError::InvalidDocument(format!(
                    "not JSON ({json_err}) and not YAML ({yaml_err})"
                ))
            })?,
        };
        Self::from_value(&value)
    }

    /// Read an already parsed JSON tree.
    pub fn from_value(root: &Value) -> Result<Self, CompileError> {
        let Some(obj) = root.as_object() else {
            return Err(CompileError::InvalidDocument(
                "top-level value is not a mapping".to_string(),
            ));
        };

        let info = obj.get("info");
        let title = info
            .and_then(|i| i.get("title"))
            .and_then(Value::as_str)
            .map(str::to_string);
        let version = info
            .and_then(|i| i.get("version"))
            .and_then(Value::as_str)
            .map(str::to_string);

        let tags = obj
            .get("tags")
            .and_then(Value::as_array)
            .map(|tags| {
                tags.iter()
                    .filter_map(|tag| tag.get("name").and_then(Value::as_str))
                    .map(str::to_string)
                    .collect()
            })
            .unwrap_or_default();

        let mut definitions = Vec::new();
        let sections = [
            obj.get("definitions"),
            obj.get("components").and_then(|c| c.get("schemas")),
        ];
        for section in sections.into_iter().flatten() {
            if let Some(map) = section.as_object() {
                definitions.extend(map.iter().map(|(name, raw)| RawDefinition {
                    name: name.clone(),
                    schema: SchemaNode::from_value(raw),
                }));
            }
        }

        let mut operations = Vec::new();
        if let Some(paths) = obj.get("paths").and_then(Value::as_object) {
            for (path, item) in paths {
                let item = deref(root, item);
                let Some(item) = item.as_object() else {
                    tracing::debug!(path = %path, "path item is not a mapping, skipping");
                    continue;
                };
                let shared = item.get("parameters");
                for method in HttpMethod::ALL {
                    if let Some(op) = item.get(method.lower()).and_then(Value::as_object) {
                        operations.push(read_operation(root, path, method, op, shared));
                    }
                }
            }
        }

        tracing::debug!(
            definitions = definitions.len(),
            operations = operations.len(),
            "parsed schema document"
        );

        Ok(Self {
            title,
            version,
            tags,
            definitions,
            operations,
        })
    }

    /// Every tag in use: declared tags first, then tags only operations
    /// mention, each once.
    pub fn tag_names(&self) -> Vec<String> {
        let mut names: Vec<String> = Vec::new();
        let used = self.operations.iter().flat_map(|op| op.tags.iter());
        for tag in self.tags.iter().chain(used) {
            if !names.contains(tag) {
                names.push(tag.clone());
            }
        }
        names
    }
}

/// Follow a local `$ref` on a parameter, body or response object.
fn deref<'a>(root: &'a Value, value: &'a Value) -> &'a Value {
    let mut current = value;
    for _ in 0..8 {
        let Some(pointer) = current.get("$ref").and_then(Value::as_str) else {
            break;
        };
        match pointer.strip_prefix('#').and_then(|p| root.pointer(p)) {
            Some(target) => current = target,
            None => break,
        }
    }
    current
}

fn read_operation(
    root: &Value,
    path: &str,
    method: HttpMethod,
    op: &Map<String, Value>,
    shared: Option<&Value>,
) -> Operation {
    let text = |key: &str| op.get(key).and_then(Value::as_str).map(str::to_string);

    let mut parameters: Vec<Parameter> = Vec::new();
    let declared = shared
        .and_then(Value::as_array)
        .into_iter()
        .flatten()
        .chain(op.get("parameters").and_then(Value::as_array).into_iter().flatten());
    for raw in declared {
        let Some(param) = read_parameter(deref(root, raw)) else {
            continue;
        };
        // Operation-level declarations override path-level ones.
        if let Some(existing) = parameters
            .iter_mut()
            .find(|p| p.name == param.name && p.location == param.location)
        {
            *existing = param;
        } else {
            parameters.push(param);
        }
    }

    if let Some(body) = op.get("requestBody") {
        parameters.extend(read_request_body(root, deref(root, body)));
    }

    Operation {
        path: path.to_string(),
        method,
        operation_id: text("operationId"),
        summary: text("summary"),
        description: text("description"),
        deprecated: op.get("deprecated").and_then(Value::as_bool).unwrap_or(false),
        tags: op
            .get("tags")
            .and_then(Value::as_array)
            .map(|t| t.iter().filter_map(Value::as_str).map(str::to_string).collect())
            .unwrap_or_default(),
        parameters,
        response: read_response(root, op.get("responses")),
    }
}

fn read_parameter(raw: &Value) -> Option<Parameter> {
    let name = raw.get("name").and_then(Value::as_str)?;
    let location = raw
        .get("in")
        .and_then(Value::as_str)
        .and_then(ParamLocation::parse)?;
    if location == ParamLocation::Cookie {
        tracing::debug!(param = %name, "cookie parameters are not forwarded, skipping");
        return None;
    }
    // Swagger 2 declares non-body parameter types inline.
    let schema = match raw.get("schema") {
        Some(s) => SchemaNode::from_value(s),
        None => SchemaNode::from_value(raw),
    };
    Some(Parameter {
        name: name.to_string(),
        location,
        required: location == ParamLocation::Path
            || raw.get("required").and_then(Value::as_bool).unwrap_or(false),
        description: raw
            .get("description")
            .and_then(Value::as_str)
            .map(str::to_string),
        schema,
    })
}

fn read_request_body(root: &Value, body: &Value) -> Vec<Parameter> {
    let required = body.get("required").and_then(Value::as_bool).unwrap_or(false);
    let description = body
        .get("description")
        .and_then(Value::as_str)
        .map(str::to_string);
    let Some(content) = body.get("content").and_then(Value::as_object) else {
        return Vec::new();
    };

    let form = content
        .iter()
        .find(|(mime, _)| mime.starts_with("multipart/") || *mime == "application/x-www-form-urlencoded");
    if let Some((_, media)) = form
        && let Some(schema) = media.get("schema")
    {
        let node = SchemaNode::from_value(deref(root, schema));
        if let NodeKind::Object { properties, .. } = node.kind
            && !properties.is_empty()
        {
            return properties
                .into_iter()
                .map(|prop| Parameter {
                    description: prop.node.description.clone(),
                    name: prop.name,
                    location: ParamLocation::FormData,
                    required: prop.required,
                    schema: prop.node,
                })
                .collect();
        }
    }

    let Some(schema) = pick_media(content).and_then(|m| m.get("schema")) else {
        return Vec::new();
    };
    vec![Parameter {
        name: "body".to_string(),
        location: ParamLocation::Body,
        required,
        description,
        schema: SchemaNode::from_value(schema),
    }]
}

fn pick_media(content: &Map<String, Value>) -> Option<&Value> {
    content
        .get("application/json")
        .or_else(|| {
            content
                .iter()
                .find(|(mime, _)| mime.contains("json"))
                .map(|(_, v)| v)
        })
        .or_else(|| content.get("*/*"))
        .or_else(|| content.values().next())
}

/// The response whose schema a request resolves to: `200`, then any other
/// `2XX` in ascending order, then `default`.
fn success_response(responses: &Map<String, Value>) -> Option<&Value> {
    responses
        .iter()
        .filter(|(code, _)| code.len() == 3 && code.starts_with('2'))
        .min_by_key(|(code, _)| code.as_str())
        .map(|(_, response)| response)
        .or_else(|| responses.get("default"))
}

fn read_response(root: &Value, responses: Option<&Value>) -> Option<SchemaNode> {
    let responses = responses?.as_object()?;
    let chosen = success_response(responses)?;
    let chosen = deref(root, chosen);

    if let Some(schema) = chosen.get("schema") {
        return Some(SchemaNode::from_value(schema));
    }
    let content = chosen.get("content")?.as_object()?;
    let schema = pick_media(content)?.get("schema")?;
    Some(SchemaNode::from_value(schema))
}
