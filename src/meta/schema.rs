//! Per-kind schema synthesis.
//!
//! Each compiled node carries one JSON-Schema-style object describing the
//! canonical (named, unwrapped) value shape. The schemas are produced for an
//! external validation engine; this crate never executes them itself. Numeric
//! and principal leaves accept strings as well as native values because form
//! layers hand both in.

use indexmap::IndexMap;
use serde_json::{Map, Value, json};
use std::sync::Arc;

use super::{MetaKind, MetaNode};
use crate::types::NumTy;

pub fn null_schema() -> Value {
    json!({ "type": "null" })
}

pub fn bool_schema() -> Value {
    json!({ "type": "boolean" })
}

pub fn text_schema() -> Value {
    json!({ "type": "string" })
}

pub fn principal_schema() -> Value {
    // empty string is the untouched-form placeholder and stays acceptable
    json!({ "type": "string" })
}

pub fn num_schema(_num: NumTy) -> Value {
    // range checking is the validator's job; the schema only fixes the shape
    json!({ "type": ["number", "string"] })
}

pub fn blob_schema() -> Value {
    json!({
        "anyOf": [
            { "type": "string" },
            { "type": "array", "items": { "type": "integer", "minimum": 0, "maximum": 255 } },
        ]
    })
}

/// Accept anything: recursive bodies (which would otherwise unroll forever),
/// function/service references, and the explicit unknown leaf.
pub fn any_schema() -> Value {
    json!(true)
}

/// Exact field-set membership: every declared property, nothing else,
/// non-optional fields required.
pub fn record_schema(fields: &IndexMap<String, Arc<MetaNode>>) -> Value {
    let mut properties = Map::with_capacity(fields.len());
    let mut required = Vec::new();
    for (name, field) in fields {
        properties.insert(name.clone(), field.schema.clone());
        if !matches!(field.kind, MetaKind::Opt(_)) {
            required.push(Value::String(name.clone()));
        }
    }
    json!({
        "type": "object",
        "properties": properties,
        "required": required,
        "additionalProperties": false,
    })
}

/// One `oneOf` arm per option, each a single-key object optionally carrying
/// the `_type` tag; nullary options get an extra tag-only arm.
pub fn variant_schema(options: &IndexMap<String, Arc<MetaNode>>) -> Value {
    let mut arms = Vec::with_capacity(options.len());
    for (name, option) in options {
        let mut properties = Map::new();
        properties.insert("_type".to_string(), json!({ "const": name }));
        properties.insert(name.clone(), option.schema.clone());
        arms.push(json!({
            "type": "object",
            "properties": properties,
            "required": [name],
            "additionalProperties": false,
        }));
        if matches!(option.kind, MetaKind::Null) {
            // `{_type: K}` without the payload key
            arms.push(json!({
                "type": "object",
                "properties": { "_type": { "const": name } },
                "required": ["_type"],
                "additionalProperties": false,
            }));
        }
    }
    json!({ "oneOf": arms })
}

pub fn tuple_schema(fields: &[Arc<MetaNode>]) -> Value {
    let items: Vec<Value> = fields.iter().map(|f| f.schema.clone()).collect();
    json!({
        "type": "array",
        "prefixItems": items,
        "minItems": fields.len(),
        "maxItems": fields.len(),
    })
}

pub fn opt_schema(inner: &Arc<MetaNode>) -> Value {
    json!({ "anyOf": [{ "type": "null" }, inner.schema.clone()] })
}

pub fn vector_schema(item: &Arc<MetaNode>) -> Value {
    json!({ "type": "array", "items": item.schema.clone() })
}

// ------------------------------- Tests ------------------------------------ //

#[cfg(test)]
mod tests {
    use crate::meta::compile;
    use crate::types::{NumTy, NumWidth, RecTy, Ty};
    use serde_json::json;

    fn assert_default_validates(ty: &Ty, label: &str) {
        let meta = compile(ty, label).unwrap();
        assert!(
            jsonschema::is_valid(&meta.schema, &meta.default),
            "default {} does not satisfy schema {}",
            meta.default,
            meta.schema
        );
    }

    #[test]
    fn defaults_satisfy_their_own_schemas() {
        assert_default_validates(&Ty::Null, "n");
        assert_default_validates(&Ty::Bool, "b");
        assert_default_validates(&Ty::Text, "t");
        assert_default_validates(&Ty::Principal, "p");
        assert_default_validates(&Ty::Num(NumTy::NAT), "amount");
        assert_default_validates(&Ty::blob(), "payload");
        assert_default_validates(
            &Ty::Record(vec![
                ("id".into(), Ty::Text),
                ("amount".into(), Ty::Num(NumTy::nat(NumWidth::W64))),
                ("memo".into(), Ty::Opt(Box::new(Ty::blob()))),
                ("status".into(), Ty::Variant(vec![
                    ("Active".into(), Ty::Null),
                    ("Frozen".into(), Ty::Text),
                ])),
                ("history".into(), Ty::Vec(Box::new(Ty::Tuple(vec![
                    Ty::Num(NumTy::nat(NumWidth::W64)),
                    Ty::Text,
                ])))),
            ]),
            "account",
        );
    }

    #[test]
    fn recursive_defaults_validate_against_the_open_schema() {
        let list = RecTy::new("List");
        list.fill(Ty::Opt(Box::new(Ty::Record(vec![
            ("head".into(), Ty::Num(NumTy::NAT)),
            ("tail".into(), Ty::Rec(list.clone())),
        ]))));
        assert_default_validates(&Ty::Rec(list), "list");
    }

    #[test]
    fn record_schema_rejects_extra_and_missing_fields() {
        let ty = Ty::Record(vec![
            ("id".into(), Ty::Text),
            ("memo".into(), Ty::Opt(Box::new(Ty::Text))),
        ]);
        let meta = compile(&ty, "row").unwrap();

        assert!(jsonschema::is_valid(&meta.schema, &json!({ "id": "x", "memo": null })));
        // optional fields may be omitted, required ones may not
        assert!(jsonschema::is_valid(&meta.schema, &json!({ "id": "x" })));
        assert!(!jsonschema::is_valid(&meta.schema, &json!({ "memo": "y" })));
        assert!(!jsonschema::is_valid(
            &meta.schema,
            &json!({ "id": "x", "extra": 1 })
        ));
    }

    #[test]
    fn variant_schema_accepts_tagged_and_untagged_forms() {
        let ty = Ty::Variant(vec![("A".into(), Ty::Null), ("B".into(), Ty::Text)]);
        let meta = compile(&ty, "v").unwrap();

        assert!(jsonschema::is_valid(&meta.schema, &json!({ "A": null })));
        assert!(jsonschema::is_valid(&meta.schema, &json!({ "_type": "A" })));
        assert!(jsonschema::is_valid(&meta.schema, &json!({ "_type": "B", "B": "x" })));
        assert!(!jsonschema::is_valid(&meta.schema, &json!({ "C": null })));
        assert!(!jsonschema::is_valid(
            &meta.schema,
            &json!({ "A": null, "B": "x" })
        ));
    }

    #[test]
    fn tuple_schema_pins_the_arity() {
        let ty = Ty::Tuple(vec![Ty::Text, Ty::Num(NumTy::NAT)]);
        let meta = compile(&ty, "pair").unwrap();
        assert!(jsonschema::is_valid(&meta.schema, &json!(["x", 3])));
        assert!(!jsonschema::is_valid(&meta.schema, &json!(["x"])));
        assert!(!jsonschema::is_valid(&meta.schema, &json!(["x", 3, true])));
        assert_eq!(meta.schema["prefixItems"].as_array().unwrap().len(), 2);
    }
}
