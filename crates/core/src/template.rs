//! Request template strategies.
//!
//! A template renders one request function from a fully resolved
//! [`RequestContext`]. Strategies are registered ahead of time in a
//! [`TemplateRegistry`] and selected by name; user customization is data
//! (a strategy name, header code and substitutions), never executable text.

use std::fmt;

use crate::config::Lang;
use crate::document::HttpMethod;
use crate::emit::ast::{ArrowFunction, BinOp, Emit, Expr, FunctionBody, Stmt};
use crate::naming::escape_js_string;

/// A multipart form field sent by a request function.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct FormField {
    /// Form key.
    pub key: String,
    /// Expression reading the value off the function arguments.
    pub access: String,
    /// Blob values are appended as-is, everything else is stringified.
    pub binary: bool,
}

/// How the request payload is built.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum RequestBody {
    /// No payload.
    None,
    /// Expression producing the JSON payload.
    Json(String),
    /// Multipart form built from the listed fields.
    Form(Vec<FormField>),
}

/// Everything a template needs to render one request function.
#[derive(Debug, Clone, Copy)]
pub struct RequestContext<'a> {
    /// Output language.
    pub lang: Lang,
    /// Generated function name.
    pub name: &'a str,
    /// HTTP method of the operation.
    pub method: HttpMethod,
    /// Path as declared in the document, for diagnostics.
    pub path: &'a str,
    /// Parenthesized parameter list, typed for TypeScript.
    pub signature: &'a str,
    /// Template literal building the request URL.
    pub url: &'a str,
    /// Rendered response type.
    pub response_type: &'a str,
    /// The response is a file download.
    pub binary_response: bool,
    /// Expression for the query string object.
    pub query: Option<&'a str>,
    /// Request payload.
    pub body: &'a RequestBody,
    /// `(header name, value expression)` pairs.
    pub headers: &'a [(String, String)],
}

/// A named strategy for rendering request functions.
pub trait RequestTemplate: fmt::Debug + Send + Sync {
    /// Name used to select this strategy.
    fn name(&self) -> &str;

    /// Import code placed at the top of the request module.
    fn default_header(&self, lang: Lang) -> String;

    /// Type of the value a generated function returns, given the response type.
    fn return_type(&self, response: &str) -> String;

    /// Build the function declaration for one request.
    fn function(&self, ctx: &RequestContext<'_>) -> ArrowFunction;

    /// Render one complete function declaration.
    fn render(&self, ctx: &RequestContext<'_>) -> String {
        self.function(ctx).emit()
    }
}

fn header_key(name: &str) -> String {
    format!("\"{}\"", escape_js_string(name))
}

fn headers_object(headers: &[(String, String)], extra: Option<(&str, Expr)>) -> Option<Expr> {
    let mut entries: Vec<(String, Expr)> = extra
        .into_iter()
        .map(|(name, value)| (header_key(name), value))
        .collect();
    entries.extend(
        headers
            .iter()
            .map(|(name, access)| (header_key(name), Expr::raw(access.clone()))),
    );
    (!entries.is_empty()).then_some(Expr::Object(entries))
}

fn form_data_prelude(fields: &[FormField], lang: Lang) -> Vec<Stmt> {
    let mut stmts = vec![Stmt::constant(
        "formData",
        Expr::New {
            class: "FormData".to_string(),
            args: Vec::new(),
        },
    )];
    for field in fields {
        let access = Expr::raw(field.access.clone());
        let value = if field.binary || lang == Lang::Js {
            access.clone()
        } else {
            Expr::call("String", vec![access.clone()])
        };
        stmts.push(Stmt::Guard {
            cond: Expr::is_present(&access),
            then: Expr::call("formData.append", vec![Expr::str(field.key.clone()), value]),
        });
    }
    stmts
}

/// Calls `axios.request`, resolving to an `AxiosResponse`.
#[derive(Debug, Clone, Copy, Default)]
pub struct AxiosTemplate;

impl RequestTemplate for AxiosTemplate {
    fn name(&self) -> &str {
        "axios"
    }

    fn default_header(&self, lang: Lang) -> String {
        match lang {
            Lang::Ts => "import axios, { AxiosResponse } from \"axios\";".to_string(),
            Lang::Js => "import axios from \"axios\";".to_string(),
        }
    }

    fn return_type(&self, response: &str) -> String {
        format!("Promise<import(\"axios\").AxiosResponse<{response}>>")
    }

    fn function(&self, ctx: &RequestContext<'_>) -> ArrowFunction {
        let type_args = match ctx.lang {
            Lang::Ts => vec![
                ctx.response_type.to_string(),
                format!("AxiosResponse<{}>", ctx.response_type),
            ],
            Lang::Js => Vec::new(),
        };

        let data = match ctx.body {
            RequestBody::None => Expr::raw("{}"),
            RequestBody::Json(expr) => Expr::raw(expr.clone()),
            RequestBody::Form(_) => Expr::ident("formData"),
        };
        let mut options = vec![
            ("url".to_string(), Expr::raw(ctx.url)),
            ("method".to_string(), Expr::str(ctx.method.lower())),
            ("params".to_string(), Expr::raw(ctx.query.unwrap_or("{}"))),
            ("data".to_string(), data),
        ];
        if let Some(headers) = headers_object(ctx.headers, None) {
            options.push(("headers".to_string(), headers));
        }
        if ctx.binary_response {
            options.push(("responseType".to_string(), Expr::str("blob")));
        }
        let request = Expr::Call {
            callee: "axios.request".to_string(),
            type_args,
            args: vec![Expr::Multiline(options)],
        };

        let body = match ctx.body {
            RequestBody::Form(form) => {
                let mut stmts = form_data_prelude(form, ctx.lang);
                stmts.push(Stmt::Return(request));
                FunctionBody::Block(stmts)
            }
            _ => FunctionBody::Expr(request),
        };
        ArrowFunction {
            name: ctx.name.to_string(),
            is_async: false,
            params: ctx.signature.to_string(),
            return_type: None,
            body,
        }
    }
}

/// Uses the global `fetch`, resolving to the parsed response body.
#[derive(Debug, Clone, Copy, Default)]
pub struct FetchTemplate;

impl FetchTemplate {
    /// Statements building `query` from the query object; returns the fetch target.
    fn query_string(query: &str, stmts: &mut Vec<Stmt>) -> Expr {
        stmts.push(Stmt::constant(
            "query",
            Expr::New {
                class: "URLSearchParams".to_string(),
                args: Vec::new(),
            },
        ));
        let value = Expr::ident("value");
        stmts.push(Stmt::ForOf {
            binding: "[key, value]".to_string(),
            iter: Expr::call("Object.entries", vec![Expr::raw(query)]),
            body: vec![Stmt::Guard {
                cond: Expr::is_present(&value),
                then: Expr::call(
                    "query.append",
                    vec![Expr::ident("key"), Expr::call("String", vec![value])],
                ),
            }],
        });
        stmts.push(Stmt::constant("search", Expr::call("query.toString", Vec::new())));
        Expr::Ternary {
            cond: Box::new(Expr::ident("search")),
            then_expr: Box::new(Expr::raw("`${url}?${search}`")),
            else_expr: Box::new(Expr::ident("url")),
        }
    }
}

impl RequestTemplate for FetchTemplate {
    fn name(&self) -> &str {
        "fetch"
    }

    fn default_header(&self, _lang: Lang) -> String {
        String::new()
    }

    fn return_type(&self, response: &str) -> String {
        format!("Promise<{response}>")
    }

    fn function(&self, ctx: &RequestContext<'_>) -> ArrowFunction {
        let mut stmts = vec![Stmt::constant("url", Expr::raw(ctx.url))];
        let target = match ctx.query {
            Some(query) => Self::query_string(query, &mut stmts),
            None => Expr::ident("url"),
        };

        let mut init = vec![("method".to_string(), Expr::str(ctx.method.as_str()))];
        let payload = match ctx.body {
            RequestBody::None => None,
            RequestBody::Json(expr) => Some(Expr::call("JSON.stringify", vec![Expr::raw(expr.clone())])),
            RequestBody::Form(form) => {
                stmts.extend(form_data_prelude(form, ctx.lang));
                Some(Expr::ident("formData"))
            }
        };
        let content_type = matches!(ctx.body, RequestBody::Json(_))
            .then(|| ("Content-Type", Expr::str("application/json")));
        if let Some(headers) = headers_object(ctx.headers, content_type) {
            init.push(("headers".to_string(), headers));
        }
        if let Some(payload) = payload {
            init.push(("body".to_string(), payload));
        }

        stmts.push(Stmt::constant(
            "res",
            Expr::Await(Box::new(Expr::call("fetch", vec![target, Expr::Multiline(init)]))),
        ));
        stmts.push(Stmt::If {
            cond: Expr::Not(Box::new(Expr::ident("res.ok"))),
            body: vec![Stmt::Throw(Expr::New {
                class: "Error".to_string(),
                args: vec![Expr::binary(
                    Expr::str(format!("{} {} failed with status ", ctx.method.as_str(), ctx.path)),
                    BinOp::Add,
                    Expr::ident("res.status"),
                )],
            })],
        });

        let result = if ctx.binary_response {
            Expr::Paren(Box::new(Expr::Await(Box::new(Expr::call("res.blob", Vec::new())))))
        } else {
            stmts.push(Stmt::constant(
                "text",
                Expr::Await(Box::new(Expr::call("res.text", Vec::new()))),
            ));
            Expr::Paren(Box::new(Expr::Ternary {
                cond: Box::new(Expr::ident("text")),
                then_expr: Box::new(Expr::call("JSON.parse", vec![Expr::ident("text")])),
                else_expr: Box::new(Expr::ident("undefined")),
            }))
        };
        let (result, return_type) = match ctx.lang {
            Lang::Ts => (
                Expr::Cast {
                    expr: Box::new(result),
                    ty: ctx.response_type.to_string(),
                },
                Some(self.return_type(ctx.response_type)),
            ),
            Lang::Js => (result, None),
        };
        stmts.push(Stmt::Return(result));

        ArrowFunction {
            name: ctx.name.to_string(),
            is_async: true,
            params: ctx.signature.to_string(),
            return_type,
            body: FunctionBody::Block(stmts),
        }
    }
}

/// Request templates available by name.
#[derive(Debug, Default)]
pub struct TemplateRegistry {
    templates: Vec<Box<dyn RequestTemplate>>,
}

impl TemplateRegistry {
    /// An empty registry.
    pub fn new() -> Self {
        Self::default()
    }

    /// Registry with the built-in `axios` and `fetch` strategies.
    pub fn builtin() -> Self {
        let mut registry = Self::new();
        registry.register(Box::new(AxiosTemplate));
        registry.register(Box::new(FetchTemplate));
        registry
    }

    /// Add a strategy. A later registration replaces one with the same name.
    pub fn register(&mut self, template: Box<dyn RequestTemplate>) {
        self.templates.retain(|t| t.name() != template.name());
        self.templates.push(template);
    }

    /// Strategy registered under `name`.
    pub fn get(&self, name: &str) -> Option<&dyn RequestTemplate> {
        self.templates
            .iter()
            .find(|t| t.name() == name)
            .map(|t| t.as_ref())
    }

    /// Registered strategy names, in registration order.
    pub fn names(&self) -> Vec<&str> {
        self.templates.iter().map(|t| t.name()).collect()
    }
}
