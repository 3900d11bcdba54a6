//! Request function assembly and the request module.

use std::collections::{BTreeMap, BTreeSet};

use crate::config::{CompileConfig, Lang};
use crate::document::{Operation, ParamLocation, Parameter};
use crate::naming::{UrlTemplate, format_param_access, operation_function_name, quote_if_needed};
use crate::resolve::{ResolvedType, TypeResolver};
use crate::template::{FormField, RequestBody, RequestContext, RequestTemplate};
use crate::types::{Field, TypeExpr};

use super::{GeneratedModule, ModuleBuilder, ModuleKind, PREAMBLE};

const PARAMS: &str = "params";
const PATH_PARAMS: &str = "pathParams";

/// One rendered request function.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct RequestFunction {
    /// Exported function name.
    pub name: String,
    /// `METHOD /path` of the source operation.
    pub location: String,
    /// Rendered source of the function.
    pub text: String,
    /// Definitions the function's signature refers to.
    pub imports: BTreeSet<String>,
}

/// The first argument of a generated function.
#[derive(Debug)]
struct ParamsArg {
    ty: TypeExpr,
    /// All fields optional and the type is a record: defaults to `{}`.
    default_empty: bool,
    /// The whole argument may be omitted.
    optional: bool,
}

#[derive(Debug)]
struct ResolvedParam<'a> {
    param: &'a Parameter,
    resolved: ResolvedType,
}

fn field_of(p: &ResolvedParam<'_>) -> Field {
    Field {
        name: p.param.name.clone(),
        ty: p.resolved.ty.clone(),
        optional: !p.param.required,
        description: p.param.description.clone(),
    }
}

/// Lower one operation to a rendered request function.
pub fn build_request_function(
    op: &Operation,
    resolver: &TypeResolver<'_>,
    config: &CompileConfig,
    template: &dyn RequestTemplate,
) -> RequestFunction {
    let lang = config.lang;
    let name = operation_function_name(
        op.operation_id.as_deref(),
        op.method.as_str(),
        &op.path,
        config.naming,
    );

    let mut imports = BTreeSet::new();
    let mut seen = BTreeSet::new();
    let mut resolved_params = Vec::new();
    for param in &op.parameters {
        if !seen.insert((param.name.as_str(), param.location == ParamLocation::Path)) {
            tracing::debug!(operation = %op.location(), param = %param.name, "duplicate parameter name, keeping first");
            continue;
        }
        let resolved = resolver
            .resolve(&param.schema)
            .with_required(param.required)
            .with_description(param.description.clone());
        resolved_params.push(ResolvedParam { param, resolved });
    }

    let url = UrlTemplate::parse(&op.path);
    let path_fields: Vec<Field> = url
        .param_names()
        .into_iter()
        .map(|placeholder| {
            let declared = resolved_params.iter().find(|p| {
                p.param.location == ParamLocation::Path && p.param.name == placeholder
            });
            Field {
                name: placeholder.to_string(),
                ty: declared.map_or(TypeExpr::Any, |p| p.resolved.ty.clone()),
                optional: false,
                description: declared.and_then(|p| p.param.description.clone()),
            }
        })
        .collect();
    for p in &resolved_params {
        if p.param.location == ParamLocation::Path {
            imports.extend(p.resolved.imports.iter().cloned());
        }
    }

    let in_location = |loc: ParamLocation| resolved_params.iter().filter(move |p| p.param.location == loc);
    let query: Vec<_> = in_location(ParamLocation::Query).collect();
    let headers: Vec<_> = in_location(ParamLocation::Header).collect();
    let form: Vec<_> = in_location(ParamLocation::FormData).collect();
    let mut bodies = in_location(ParamLocation::Body);
    let body = bodies.next();
    if bodies.next().is_some() {
        tracing::debug!(operation = %op.location(), "more than one body parameter, using the first");
    }

    let grouped: Vec<&ResolvedParam<'_>> = query
        .iter()
        .chain(headers.iter())
        .chain(form.iter())
        .copied()
        .collect();
    for p in grouped.iter().chain(body.iter()) {
        imports.extend(p.resolved.imports.iter().cloned());
    }

    let (params_arg, query_expr, request_body) = match body {
        Some(body) if grouped.is_empty() => {
            let arg = ParamsArg {
                ty: body.resolved.ty.clone(),
                default_empty: false,
                optional: !body.param.required,
            };
            (Some(arg), None, RequestBody::Json(PARAMS.to_string()))
        }
        _ => {
            let mut fields: Vec<Field> = grouped.iter().map(|p| field_of(p)).collect();
            if let Some(body) = body {
                fields.push(field_of(body));
            }
            let query_expr = if query.is_empty() {
                None
            } else if query.len() == fields.len() {
                Some(PARAMS.to_string())
            } else {
                let entries: Vec<String> = query
                    .iter()
                    .map(|p| {
                        format!(
                            "{}: {}",
                            quote_if_needed(&p.param.name),
                            format_param_access(PARAMS, &p.param.name)
                        )
                    })
                    .collect();
                Some(format!("{{ {} }}", entries.join(", ")))
            };
            let request_body = if !form.is_empty() {
                RequestBody::Form(
                    form.iter()
                        .map(|p| FormField {
                            key: p.param.name.clone(),
                            access: format_param_access(PARAMS, &p.param.name),
                            binary: p.resolved.is_binary,
                        })
                        .collect(),
                )
            } else if let Some(body) = body {
                RequestBody::Json(format_param_access(PARAMS, &body.param.name))
            } else {
                RequestBody::None
            };
            let arg = (!fields.is_empty()).then(|| ParamsArg {
                default_empty: fields.iter().all(|f| f.optional),
                optional: false,
                ty: TypeExpr::Record(fields),
            });
            (arg, query_expr, request_body)
        }
    };

    let header_pairs: Vec<(String, String)> = headers
        .iter()
        .map(|p| (p.param.name.clone(), format_param_access(PARAMS, &p.param.name)))
        .collect();

    let response = op
        .response
        .as_ref()
        .map_or_else(ResolvedType::any, |node| resolver.resolve(node));
    imports.extend(response.imports.iter().cloned());
    let response_type = response.render(lang);

    let path_type = (!path_fields.is_empty()).then(|| TypeExpr::Record(path_fields));
    let signature = render_signature(lang, params_arg.as_ref(), path_type.as_ref());
    let url_literal = url.to_template_literal(PATH_PARAMS);

    let ctx = RequestContext {
        lang,
        name: &name,
        method: op.method,
        path: &op.path,
        signature: &signature,
        url: &url_literal,
        response_type: &response_type,
        binary_response: response.is_binary,
        query: query_expr.as_deref(),
        body: &request_body,
        headers: &header_pairs,
    };

    let return_type = template.return_type(&response.render(Lang::Js));
    let mut text = render_doc(op, lang, params_arg.as_ref(), path_type.as_ref(), &return_type);
    text.push_str(&template.render(&ctx));
    for sub in &config.template.substitutions {
        if !sub.from.is_empty() {
            text = text.replace(&sub.from, &sub.to);
        }
    }

    RequestFunction {
        name,
        location: op.location(),
        text,
        imports,
    }
}

fn render_signature(lang: Lang, params: Option<&ParamsArg>, path: Option<&TypeExpr>) -> String {
    let mut args = Vec::new();
    match (params, lang) {
        (Some(arg), Lang::Ts) => {
            let ty = arg.ty.render(Lang::Ts);
            args.push(if arg.default_empty {
                format!("{PARAMS}: {ty} = {{}}")
            } else if arg.optional && path.is_some() {
                format!("{PARAMS}: {ty} | undefined")
            } else if arg.optional {
                format!("{PARAMS}?: {ty}")
            } else {
                format!("{PARAMS}: {ty}")
            });
        }
        (Some(arg), Lang::Js) => {
            args.push(if arg.default_empty {
                format!("{PARAMS} = {{}}")
            } else {
                PARAMS.to_string()
            });
        }
        (None, Lang::Ts) if path.is_some() => args.push(format!("{PARAMS}: {{}} = {{}}")),
        (None, Lang::Js) if path.is_some() => args.push(format!("{PARAMS} = {{}}")),
        (None, _) => {}
    }
    if let Some(path) = path {
        args.push(match lang {
            Lang::Ts => format!("{PATH_PARAMS}: {}", path.render(Lang::Ts)),
            Lang::Js => PATH_PARAMS.to_string(),
        });
    }
    format!("({})", args.join(", "))
}

fn sanitize_doc(text: &str) -> String {
    text.trim().replace("*/", "*\\/")
}

fn render_doc(
    op: &Operation,
    lang: Lang,
    params: Option<&ParamsArg>,
    path: Option<&TypeExpr>,
    return_type: &str,
) -> String {
    let mut lines: Vec<String> = Vec::new();
    if let Some(summary) = op.summary.as_deref().filter(|s| !s.trim().is_empty()) {
        lines.extend(sanitize_doc(summary).lines().map(str::to_string));
    }
    if let Some(desc) = op.description.as_deref().filter(|d| !d.trim().is_empty())
        && op.summary.as_deref() != Some(desc)
    {
        lines.extend(sanitize_doc(desc).lines().map(str::to_string));
    }
    if op.deprecated {
        lines.push("@deprecated".to_string());
    }
    if lang == Lang::Js {
        if let Some(arg) = params {
            let ty = arg.ty.render(Lang::Js);
            let name = if arg.default_empty || arg.optional {
                format!("[{PARAMS}]")
            } else {
                PARAMS.to_string()
            };
            lines.push(format!("@param {{{ty}}} {name}"));
        }
        if let Some(path) = path {
            lines.push(format!("@param {{{}}} {PATH_PARAMS}", path.render(Lang::Js)));
        }
        lines.push(format!("@returns {{{return_type}}}"));
    }

    match lines.len() {
        0 => String::new(),
        1 if lang == Lang::Ts => format!("/** {} */\n", lines[0]),
        _ => {
            let mut out = String::from("/**\n");
            for line in &lines {
                if line.trim().is_empty() {
                    out.push_str(" *\n");
                } else {
                    out.push_str(&format!(" * {}\n", line.trim_end()));
                }
            }
            out.push_str(" */\n");
            out
        }
    }
}

/// Assemble the request module from rendered functions.
///
/// Definitions listed in `aliases` are imported under their local alias.
pub fn emit_requests(
    module_name: &str,
    functions: &[RequestFunction],
    lang: Lang,
    header: &str,
    interface_import_path: &str,
    aliases: &BTreeMap<String, String>,
) -> GeneratedModule {
    let mut builder = ModuleBuilder::new(module_name, ModuleKind::Requests);
    builder.push_raw(PREAMBLE);
    builder.push_raw(header);

    let imports: BTreeSet<&str> = functions
        .iter()
        .flat_map(|f| f.imports.iter().map(String::as_str))
        .collect();
    if !imports.is_empty() {
        let block = match lang {
            Lang::Ts => {
                let names: Vec<String> = imports
                    .iter()
                    .map(|name| match aliases.get(*name) {
                        Some(alias) => format!("{name} as {alias}"),
                        None => (*name).to_string(),
                    })
                    .collect();
                format!(
                    "import type {{ {} }} from \"{interface_import_path}\";",
                    names.join(", ")
                )
            }
            Lang::Js => imports
                .iter()
                .map(|name| {
                    let local = aliases.get(*name).map_or(*name, String::as_str);
                    format!("/** @typedef {{import(\"{interface_import_path}\").{name}}} {local} */")
                })
                .collect::<Vec<_>>()
                .join("\n"),
        };
        builder.push_raw(&block);
    }

    for function in functions {
        builder.push_unit(&function.name, &function.text);
    }
    builder.finish()
}

#[cfg(test)]
#[allow(clippy::unwrap_used, clippy::expect_used)]
mod tests {
    use super::*;
    use crate::config::{NamingPolicy, Substitution};
    use crate::document::Document;
    use crate::template::{AxiosTemplate, FetchTemplate};

    fn operations(doc: &str) -> Vec<Operation> {
        Document::parse(doc).unwrap().operations
    }

    const PETSTORE: &str = r##"{
        "swagger": "2.0",
        "paths": {
            "/pet/{petId}": {
                "get": {
                    "operationId": "getPetById",
                    "summary": "Find pet by ID",
                    "parameters": [
                        { "name": "petId", "in": "path", "type": "integer" },
                        { "name": "verbose", "in": "query", "type": "boolean" }
                    ],
                    "responses": { "200": { "schema": { "$ref": "#/definitions/Pet" } } }
                }
            },
            "/pet": {
                "post": {
                    "operationId": "addPet",
                    "deprecated": true,
                    "parameters": [
                        { "name": "pet", "in": "body", "required": true, "schema": { "$ref": "#/definitions/Pet" } }
                    ]
                }
            },
            "/pet/{petId}/uploadImage": {
                "post": {
                    "operationId": "upload-file",
                    "parameters": [
                        { "name": "petId", "in": "path", "type": "integer", "required": true },
                        { "name": "X-Trace", "in": "header", "type": "string" },
                        { "name": "file", "in": "formData", "type": "file", "required": true }
                    ],
                    "responses": { "200": { "schema": { "type": "file" } } }
                }
            },
            "/store/{storeId}/inventory": {
                "get": {
                    "parameters": [
                        { "name": "limit", "in": "query", "type": "integer" },
                        { "name": "X-Trace", "in": "header", "type": "string", "required": true }
                    ]
                }
            }
        }
    }"##;

    fn build(op: &Operation, config: &CompileConfig) -> RequestFunction {
        build_request_function(op, &TypeResolver::new(), config, &AxiosTemplate)
    }

    #[test]
    fn test_path_and_query_params() {
        let ops = operations(PETSTORE);
        let f = build(&ops[0], &CompileConfig::default());
        assert_eq!(f.name, "getPetById");
        assert_eq!(f.location, "GET /pet/{petId}");
        assert!(f.text.starts_with("/** Find pet by ID */\n"));
        assert!(f.text.contains(
            "export const getPetById = (params: { verbose?: boolean } = {}, pathParams: { petId: number }) =>"
        ));
        assert!(f.text.contains("axios.request<Pet, AxiosResponse<Pet>>"));
        assert!(f.text.contains("url: `/pet/${pathParams.petId}`"));
        assert!(f.text.contains("params: params,"));
        assert_eq!(f.imports.iter().collect::<Vec<_>>(), vec!["Pet"]);
    }

    #[test]
    fn test_body_only_operation() {
        let ops = operations(PETSTORE);
        let f = build(&ops[1], &CompileConfig::default());
        assert!(f.text.starts_with("/** @deprecated */\n"));
        assert!(f.text.contains("export const addPet = (params: Pet) =>"));
        assert!(f.text.contains("axios.request<any, AxiosResponse<any>>"));
        assert!(f.text.contains("params: {},"));
        assert!(f.text.contains("data: params\n"));
    }

    #[test]
    fn test_form_header_and_binary_response() {
        let ops = operations(PETSTORE);
        let f = build(&ops[2], &CompileConfig::default());
        assert_eq!(f.name, "uploadFile");
        assert!(f.text.contains(
            "(params: { \"X-Trace\"?: string; file: Blob }, pathParams: { petId: number }) => {"
        ));
        assert!(f.text.contains("formData.append(\"file\", params.file);"));
        assert!(f.text.contains("headers: { \"X-Trace\": params[\"X-Trace\"] }"));
        assert!(f.text.contains("responseType: \"blob\""));
        assert!(f.text.contains("axios.request<Blob, AxiosResponse<Blob>>"));
    }

    #[test]
    fn test_fallback_name_undeclared_path_param_and_mixed_query() {
        let ops = operations(PETSTORE);
        let f = build(&ops[3], &CompileConfig::default());
        assert_eq!(f.name, "getStoreByStoreIdInventory");
        assert!(f.text.contains(
            "(params: { limit?: number; \"X-Trace\": string }, pathParams: { storeId: any }) =>"
        ));
        assert!(f.text.contains("params: { limit: params.limit },"));
    }

    #[test]
    fn test_js_jsdoc_signature() {
        let ops = operations(PETSTORE);
        let config = CompileConfig {
            lang: Lang::Js,
            naming: NamingPolicy::Snake,
            ..CompileConfig::default()
        };
        let f = build(&ops[0], &config);
        assert_eq!(f.name, "get_pet_by_id");
        assert!(f.text.contains(" * @param {{ verbose?: boolean }} [params]\n"));
        assert!(f.text.contains(" * @param {{ petId: number }} pathParams\n"));
        assert!(f.text.contains(" * @returns {Promise<import(\"axios\").AxiosResponse<Pet>>}\n"));
        assert!(f.text.contains("export const get_pet_by_id = (params = {}, pathParams) =>"));
    }

    #[test]
    fn test_substitutions_and_fetch_template() {
        let ops = operations(PETSTORE);
        let mut config = CompileConfig::default();
        config.template.substitutions.push(Substitution {
            from: "throw new Error(".into(),
            to: "throw new ApiError(".into(),
        });
        let f = build_request_function(&ops[0], &TypeResolver::new(), &config, &FetchTemplate);
        assert!(f.text.contains("const url = `/pet/${pathParams.petId}`;"));
        assert!(f.text.contains("throw new ApiError(\"GET /pet/{petId} failed"));
        assert!(f.text.contains("): Promise<Pet> => {"));
    }

    #[test]
    fn test_emit_requests_module() {
        let ops = operations(PETSTORE);
        let config = CompileConfig::default();
        let functions: Vec<_> = ops.iter().map(|op| build(op, &config)).collect();
        let header = AxiosTemplate.default_header(Lang::Ts);
        let module = emit_requests("api.ts", &functions, Lang::Ts, &header, "./interface", &BTreeMap::new());

        assert!(module.text.contains("import axios, { AxiosResponse } from \"axios\";\n\nimport type { Pet } from \"./interface\";\n"));
        assert_eq!(module.units.len(), 4);
        let line = module.units[1].start_line;
        assert_eq!(module.unit_at(line), Some("addPet"));

        let js = emit_requests("api.js", &functions, Lang::Js, "", "./interface", &BTreeMap::new());
        assert!(js.text.contains("/** @typedef {import(\"./interface\").Pet} Pet */"));
    }

    #[test]
    fn test_emit_requests_aliases_shadowing_imports() {
        let ops = operations(PETSTORE);
        let known: BTreeSet<String> = ["Pet".to_string()].into_iter().collect();
        let aliases: BTreeMap<String, String> =
            [("Pet".to_string(), "ApiPet".to_string())].into_iter().collect();
        let resolver = TypeResolver::with_definitions(&known).with_aliases(&aliases);
        let config = CompileConfig::default();
        let functions = vec![build_request_function(&ops[0], &resolver, &config, &FetchTemplate)];

        let module = emit_requests("api.ts", &functions, Lang::Ts, "", "./interface", &aliases);
        assert!(module.text.contains("import type { Pet as ApiPet } from \"./interface\";"));
        assert!(module.text.contains("): Promise<ApiPet> => {"));

        let js = emit_requests("api.js", &functions, Lang::Js, "", "./interface", &aliases);
        assert!(js.text.contains("/** @typedef {import(\"./interface\").Pet} ApiPet */"));
    }
}
