//! Statement-level syntax for generated request functions.
//!
//! Templates build an [`ArrowFunction`] out of [`Stmt`] and [`Expr`] nodes;
//! emission is mechanical string building through the [`Emit`] trait, with
//! two spaces per nesting level. Type annotations and parameter lists arrive
//! pre-rendered from the type layer and are carried as text.

use crate::naming::escape_js_string;

/// Converts a syntax node into source text.
pub trait Emit {
    /// Source text of the node.
    fn emit(&self) -> String;
}

fn pad(indent: usize) -> String {
    "  ".repeat(indent)
}

/// Binary operators used by request bodies.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum BinOp {
    /// `!==`
    StrictNotEqual,
    /// `&&`
    And,
    /// `+`
    Add,
}

impl Emit for BinOp {
    fn emit(&self) -> String {
        match self {
            BinOp::StrictNotEqual => "!==",
            BinOp::And => "&&",
            BinOp::Add => "+",
        }
        .to_string()
    }
}

/// An expression.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum Expr {
    /// Identifier or dotted path: `url`, `res.ok`.
    Ident(String),
    /// Double-quoted string literal, escaped on emission.
    Str(String),
    /// Pre-rendered code emitted verbatim.
    Raw(String),
    /// `callee<T, U>(args)`.
    Call {
        /// Function path, e.g. `formData.append`.
        callee: String,
        /// Explicit type arguments; empty for none.
        type_args: Vec<String>,
        /// Call arguments.
        args: Vec<Expr>,
    },
    /// `new Class(args)`.
    New {
        /// Constructor name.
        class: String,
        /// Constructor arguments.
        args: Vec<Expr>,
    },
    /// Single-line object literal. Keys are emitted as given.
    Object(Vec<(String, Expr)>),
    /// Object literal with one entry per line.
    Multiline(Vec<(String, Expr)>),
    /// `object.prop`.
    Member {
        /// Receiver.
        object: Box<Expr>,
        /// Property name.
        prop: String,
    },
    /// `await expr`.
    Await(Box<Expr>),
    /// `!expr`.
    Not(Box<Expr>),
    /// `left op right`.
    Binary {
        /// Left operand.
        left: Box<Expr>,
        /// Operator.
        op: BinOp,
        /// Right operand.
        right: Box<Expr>,
    },
    /// `cond ? then_expr : else_expr`.
    Ternary {
        /// Condition.
        cond: Box<Expr>,
        /// Value when the condition holds.
        then_expr: Box<Expr>,
        /// Value otherwise.
        else_expr: Box<Expr>,
    },
    /// `(expr)`.
    Paren(Box<Expr>),
    /// `expr as Type`.
    Cast {
        /// Expression being cast.
        expr: Box<Expr>,
        /// Rendered target type.
        ty: String,
    },
}

impl Expr {
    /// Identifier or dotted path.
    pub fn ident(name: impl Into<String>) -> Self {
        Expr::Ident(name.into())
    }

    /// Pre-rendered code.
    pub fn raw(code: impl Into<String>) -> Self {
        Expr::Raw(code.into())
    }

    /// String literal.
    pub fn str(value: impl Into<String>) -> Self {
        Expr::Str(value.into())
    }

    /// Call without type arguments.
    pub fn call(callee: impl Into<String>, args: Vec<Expr>) -> Self {
        Expr::Call {
            callee: callee.into(),
            type_args: Vec::new(),
            args,
        }
    }

    /// `left op right`.
    pub fn binary(left: Expr, op: BinOp, right: Expr) -> Self {
        Expr::Binary {
            left: Box::new(left),
            op,
            right: Box::new(right),
        }
    }

    /// `value !== undefined && value !== null`.
    pub fn is_present(value: &Expr) -> Self {
        Expr::binary(
            Expr::binary(value.clone(), BinOp::StrictNotEqual, Expr::ident("undefined")),
            BinOp::And,
            Expr::binary(value.clone(), BinOp::StrictNotEqual, Expr::ident("null")),
        )
    }

    /// Emit with multi-line literals closing at `indent`.
    pub fn emit_at(&self, indent: usize) -> String {
        match self {
            Expr::Ident(name) | Expr::Raw(name) => name.clone(),
            Expr::Str(value) => format!("\"{}\"", escape_js_string(value)),
            Expr::Call {
                callee,
                type_args,
                args,
            } => {
                let generics = if type_args.is_empty() {
                    String::new()
                } else {
                    format!("<{}>", type_args.join(", "))
                };
                format!("{callee}{generics}({})", emit_args(args, indent))
            }
            Expr::New { class, args } => format!("new {class}({})", emit_args(args, indent)),
            Expr::Object(entries) => {
                if entries.is_empty() {
                    return "{}".to_string();
                }
                let parts: Vec<String> = entries
                    .iter()
                    .map(|(key, value)| format!("{key}: {}", value.emit_at(indent)))
                    .collect();
                format!("{{ {} }}", parts.join(", "))
            }
            Expr::Multiline(entries) => {
                if entries.is_empty() {
                    return "{}".to_string();
                }
                let inner = pad(indent + 1);
                let parts: Vec<String> = entries
                    .iter()
                    .map(|(key, value)| format!("{inner}{key}: {}", value.emit_at(indent + 1)))
                    .collect();
                format!("{{\n{}\n{}}}", parts.join(",\n"), pad(indent))
            }
            Expr::Member { object, prop } => format!("{}.{prop}", object.emit_at(indent)),
            Expr::Await(expr) => format!("await {}", expr.emit_at(indent)),
            Expr::Not(expr) => format!("!{}", expr.emit_at(indent)),
            Expr::Binary { left, op, right } => {
                format!("{} {} {}", left.emit_at(indent), op.emit(), right.emit_at(indent))
            }
            Expr::Ternary {
                cond,
                then_expr,
                else_expr,
            } => format!(
                "{} ? {} : {}",
                cond.emit_at(indent),
                then_expr.emit_at(indent),
                else_expr.emit_at(indent)
            ),
            Expr::Paren(expr) => format!("({})", expr.emit_at(indent)),
            Expr::Cast { expr, ty } => format!("{} as {ty}", expr.emit_at(indent)),
        }
    }
}

fn emit_args(args: &[Expr], indent: usize) -> String {
    args.iter()
        .map(|arg| arg.emit_at(indent))
        .collect::<Vec<_>>()
        .join(", ")
}

impl Emit for Expr {
    fn emit(&self) -> String {
        self.emit_at(0)
    }
}

/// A statement in a function body.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum Stmt {
    /// `const name = init;`
    Const {
        /// Binding name.
        name: String,
        /// Initializer.
        init: Expr,
    },
    /// Expression statement.
    Expr(Expr),
    /// `return expr;`
    Return(Expr),
    /// `throw expr;`
    Throw(Expr),
    /// `if (cond) expr;` on one line.
    Guard {
        /// Condition.
        cond: Expr,
        /// Statement expression run when the condition holds.
        then: Expr,
    },
    /// `if (cond) { ... }`
    If {
        /// Condition.
        cond: Expr,
        /// Block body.
        body: Vec<Stmt>,
    },
    /// `for (const binding of iter) { ... }`
    ForOf {
        /// Binding pattern, e.g. `[key, value]`.
        binding: String,
        /// Iterated expression.
        iter: Expr,
        /// Loop body.
        body: Vec<Stmt>,
    },
}

impl Stmt {
    /// `const name = init;`
    pub fn constant(name: impl Into<String>, init: Expr) -> Self {
        Stmt::Const {
            name: name.into(),
            init,
        }
    }

    /// Emit at `indent` levels, one trailing newline per line.
    pub fn emit_indented(&self, indent: usize) -> String {
        let prefix = pad(indent);
        match self {
            Stmt::Const { name, init } => format!("{prefix}const {name} = {};\n", init.emit_at(indent)),
            Stmt::Expr(expr) => format!("{prefix}{};\n", expr.emit_at(indent)),
            Stmt::Return(expr) => format!("{prefix}return {};\n", expr.emit_at(indent)),
            Stmt::Throw(expr) => format!("{prefix}throw {};\n", expr.emit_at(indent)),
            Stmt::Guard { cond, then } => format!(
                "{prefix}if ({}) {};\n",
                cond.emit_at(indent),
                then.emit_at(indent)
            ),
            Stmt::If { cond, body } => {
                let head = format!("{prefix}if ({}) {{\n", cond.emit_at(indent));
                block(head, body, indent)
            }
            Stmt::ForOf {
                binding,
                iter,
                body,
            } => {
                let head = format!("{prefix}for (const {binding} of {}) {{\n", iter.emit_at(indent));
                block(head, body, indent)
            }
        }
    }
}

fn block(mut out: String, body: &[Stmt], indent: usize) -> String {
    for stmt in body {
        out.push_str(&stmt.emit_indented(indent + 1));
    }
    out.push_str(&pad(indent));
    out.push_str("}\n");
    out
}

impl Emit for Stmt {
    fn emit(&self) -> String {
        self.emit_indented(0)
    }
}

/// Body of an arrow function.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum FunctionBody {
    /// Concise body, printed on the line after the arrow.
    Expr(Expr),
    /// Braced block.
    Block(Vec<Stmt>),
}

/// `export const name = async (params): Ret => body;`
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct ArrowFunction {
    /// Exported binding name.
    pub name: String,
    /// Whether the function is `async`.
    pub is_async: bool,
    /// Parenthesized parameter list, already rendered.
    pub params: String,
    /// Return type annotation, already rendered.
    pub return_type: Option<String>,
    /// Function body.
    pub body: FunctionBody,
}

impl Emit for ArrowFunction {
    fn emit(&self) -> String {
        let async_kw = if self.is_async { "async " } else { "" };
        let ret = self
            .return_type
            .as_ref()
            .map(|ty| format!(": {ty}"))
            .unwrap_or_default();
        let head = format!("export const {} = {async_kw}{}{ret} =>", self.name, self.params);
        match &self.body {
            FunctionBody::Expr(expr) => format!("{head}\n  {};\n", expr.emit_at(1)),
            FunctionBody::Block(stmts) => {
                let mut out = format!("{head} {{\n");
                for stmt in stmts {
                    out.push_str(&stmt.emit_indented(1));
                }
                out.push_str("};\n");
                out
            }
        }
    }
}

#[cfg(test)]
#[allow(clippy::unwrap_used, clippy::expect_used)]
mod tests {
    use super::*;

    #[test]
    fn test_expressions() {
        let access = Expr::raw("params[\"X-Trace\"]");
        assert_eq!(
            Expr::is_present(&access).emit(),
            "params[\"X-Trace\"] !== undefined && params[\"X-Trace\"] !== null"
        );
        let cast = Expr::Cast {
            expr: Box::new(Expr::Paren(Box::new(Expr::Ternary {
                cond: Box::new(Expr::ident("text")),
                then_expr: Box::new(Expr::call("JSON.parse", vec![Expr::ident("text")])),
                else_expr: Box::new(Expr::ident("undefined")),
            }))),
            ty: "Pet[]".into(),
        };
        assert_eq!(cast.emit(), "(text ? JSON.parse(text) : undefined) as Pet[]");
        assert_eq!(Expr::str("a\"b\nc").emit(), "\"a\\\"b\\nc\"");
        assert_eq!(Expr::Object(Vec::new()).emit(), "{}");
        assert_eq!(
            Expr::Object(vec![("\"Accept\"".into(), Expr::str("*/*"))]).emit(),
            "{ \"Accept\": \"*/*\" }"
        );
    }

    #[test]
    fn test_multiline_object_follows_nesting() {
        let call = Expr::Call {
            callee: "axios.request".into(),
            type_args: vec!["Pet".into(), "AxiosResponse<Pet>".into()],
            args: vec![Expr::Multiline(vec![
                ("url".into(), Expr::raw("`/pet`")),
                ("method".into(), Expr::str("get")),
            ])],
        };
        assert_eq!(
            Stmt::Return(call).emit_indented(1),
            "  return axios.request<Pet, AxiosResponse<Pet>>({\n    url: `/pet`,\n    method: \"get\"\n  });\n"
        );
    }

    #[test]
    fn test_blocks() {
        let stmt = Stmt::ForOf {
            binding: "[key, value]".into(),
            iter: Expr::call("Object.entries", vec![Expr::ident("params")]),
            body: vec![Stmt::Guard {
                cond: Expr::is_present(&Expr::ident("value")),
                then: Expr::call("query.append", vec![Expr::ident("key"), Expr::ident("value")]),
            }],
        };
        assert_eq!(
            stmt.emit_indented(1),
            "  for (const [key, value] of Object.entries(params)) {\n    if (value !== undefined && value !== null) query.append(key, value);\n  }\n"
        );

        let stmt = Stmt::If {
            cond: Expr::Not(Box::new(Expr::ident("res.ok"))),
            body: vec![Stmt::Throw(Expr::New {
                class: "Error".into(),
                args: vec![Expr::binary(Expr::str("failed "), BinOp::Add, Expr::ident("res.status"))],
            })],
        };
        assert_eq!(
            stmt.emit(),
            "if (!res.ok) {\n  throw new Error(\"failed \" + res.status);\n}\n"
        );
    }

    #[test]
    fn test_arrow_functions() {
        let concise = ArrowFunction {
            name: "ping".into(),
            is_async: false,
            params: "()".into(),
            return_type: None,
            body: FunctionBody::Expr(Expr::call("fetch", vec![Expr::str("/ping")])),
        };
        assert_eq!(concise.emit(), "export const ping = () =>\n  fetch(\"/ping\");\n");

        let block = ArrowFunction {
            name: "ping".into(),
            is_async: true,
            params: "(id: number)".into(),
            return_type: Some("Promise<void>".into()),
            body: FunctionBody::Block(vec![Stmt::constant(
                "res",
                Expr::Await(Box::new(Expr::call("fetch", vec![Expr::ident("url")]))),
            )]),
        };
        assert_eq!(
            block.emit(),
            "export const ping = async (id: number): Promise<void> => {\n  const res = await fetch(url);\n};\n"
        );
    }
}
