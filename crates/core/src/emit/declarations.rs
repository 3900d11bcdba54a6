//! The declarations module: one interface or alias per definition.

use crate::compiler::Definition;
use crate::config::Lang;
use crate::naming::quote_if_needed;
use crate::types::{Field, TypeExpr};

use super::{GeneratedModule, ModuleBuilder, ModuleKind, PREAMBLE};

/// Render one declaration per definition, in the order given.
pub fn emit_declarations(module_name: &str, definitions: &[Definition], lang: Lang) -> GeneratedModule {
    let mut builder = ModuleBuilder::new(module_name, ModuleKind::Declarations);
    builder.push_raw(PREAMBLE);

    for def in definitions {
        let block = match lang {
            Lang::Ts => ts_declaration(def),
            Lang::Js => jsdoc_typedef(def),
        };
        builder.push_unit(&def.name, &block);
    }

    // Keeps the file an ES module even with nothing to declare.
    if lang == Lang::Js || definitions.is_empty() {
        builder.push_raw("export {};");
    }

    builder.finish()
}

fn doc_lines(text: &str) -> impl Iterator<Item = &str> {
    text.lines().map(str::trim_end)
}

fn ts_doc(out: &mut String, indent: &str, description: Option<&str>) {
    let Some(desc) = description.map(str::trim).filter(|d| !d.is_empty()) else {
        return;
    };
    let desc = desc.replace("*/", "*\\/");
    if desc.contains('\n') {
        out.push_str(&format!("{indent}/**\n"));
        for line in doc_lines(&desc) {
            out.push_str(&format!("{indent} * {line}\n"));
        }
        out.push_str(&format!("{indent} */\n"));
    } else {
        out.push_str(&format!("{indent}/** {desc} */\n"));
    }
}

fn ts_declaration(def: &Definition) -> String {
    let mut out = String::new();
    ts_doc(&mut out, "", def.resolved.description.as_deref());
    match &def.resolved.ty {
        TypeExpr::Record(fields) => {
            out.push_str(&format!("export interface {} {{\n", def.name));
            for field in fields {
                ts_doc(&mut out, "  ", field.description.as_deref());
                out.push_str(&format!("  {};\n", field.render(Lang::Ts)));
            }
            out.push_str("}\n");
        }
        other => {
            out.push_str(&format!("export type {} = {};\n", def.name, other.render(Lang::Ts)));
        }
    }
    out
}

fn jsdoc_property(field: &Field) -> String {
    let key = quote_if_needed(&field.name);
    let name = if field.optional { format!("[{key}]") } else { key };
    match field.description.as_deref().map(str::trim).filter(|d| !d.is_empty()) {
        Some(desc) => format!(
            " * @property {{{}}} {name} {}\n",
            field.ty.render(Lang::Js),
            desc.replace('\n', " ").replace("*/", "*\\/")
        ),
        None => format!(" * @property {{{}}} {name}\n", field.ty.render(Lang::Js)),
    }
}

fn jsdoc_typedef(def: &Definition) -> String {
    let mut out = String::from("/**\n");
    if let Some(desc) = def.resolved.description.as_deref().map(str::trim).filter(|d| !d.is_empty()) {
        for line in doc_lines(&desc.replace("*/", "*\\/")) {
            out.push_str(&format!(" * {line}\n"));
        }
    }
    match &def.resolved.ty {
        TypeExpr::Record(fields) => {
            out.push_str(&format!(" * @typedef {{Object}} {}\n", def.name));
            for field in fields {
                out.push_str(&jsdoc_property(field));
            }
        }
        other => {
            out.push_str(&format!(" * @typedef {{{}}} {}\n", other.render(Lang::Js), def.name));
        }
    }
    out.push_str(" */\n");
    out
}

#[cfg(test)]
#[allow(clippy::unwrap_used, clippy::expect_used)]
mod tests {
    use super::*;
    use crate::resolve::TypeResolver;
    use crate::schema::SchemaNode;
    use serde_json::json;

    fn definition(name: &str, schema: serde_json::Value) -> Definition {
        let schema = SchemaNode::from_value(&schema);
        let resolved = TypeResolver::new().resolve(&schema);
        Definition {
            name: name.to_string(),
            source_name: name.to_string(),
            schema,
            resolved,
        }
    }

    fn pet() -> Definition {
        definition(
            "Pet",
            json!({
                "type": "object",
                "description": "A pet in the store",
                "required": ["name"],
                "properties": {
                    "id": { "type": "integer", "description": "Unique id" },
                    "name": { "type": "string" },
                    "tags": { "type": "array", "items": { "$ref": "#/definitions/Tag" } }
                }
            }),
        )
    }

    #[test]
    fn test_ts_interface_and_alias() {
        let defs = vec![
            pet(),
            definition("Status", json!({ "type": "string", "enum": ["available", "sold"] })),
        ];
        let module = emit_declarations("interface.ts", &defs, Lang::Ts);

        assert!(module.text.starts_with("/* eslint-disable */"));
        assert!(module.text.contains(
            "/** A pet in the store */\nexport interface Pet {\n  /** Unique id */\n  id?: number;\n  name: string;\n  tags?: Tag[];\n}\n"
        ));
        assert!(module.text.contains("export type Status = \"available\" | \"sold\";\n"));
        assert!(!module.text.contains("export {};"));
        assert_eq!(module.unit_names().collect::<Vec<_>>(), vec!["Pet", "Status"]);
    }

    #[test]
    fn test_js_typedefs() {
        let defs = vec![pet(), definition("Ids", json!({ "type": "array", "items": { "type": "integer" } }))];
        let module = emit_declarations("interface.js", &defs, Lang::Js);

        assert!(module.text.contains(" * @typedef {Object} Pet\n"));
        assert!(module.text.contains(" * @property {number} [id] Unique id\n"));
        assert!(module.text.contains(" * @property {string} name\n"));
        assert!(module.text.contains(" * @property {Array<Tag>} [tags]\n"));
        assert!(module.text.contains(" * @typedef {Array<number>} Ids\n"));
        assert!(module.text.trim_end().ends_with("export {};"));
    }

    #[test]
    fn test_empty_definitions_still_a_module() {
        let module = emit_declarations("interface.ts", &[], Lang::Ts);
        assert!(module.text.contains("export {};"));
        assert!(module.units.is_empty());
    }

    #[test]
    fn test_multiline_description() {
        let def = definition("Note", json!({ "type": "string", "description": "first\nsecond */ end" }));
        let module = emit_declarations("interface.ts", &[def], Lang::Ts);
        assert!(module.text.contains("/**\n * first\n * second *\\/ end\n */\nexport type Note = string;"));
    }
}
