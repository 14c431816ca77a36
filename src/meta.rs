//! Metadata compiler: one recursive descent over the type algebra.
//!
//! `compile` turns a [`Ty`] into an immutable [`MetaNode`] tree that
//! structurally mirrors it (same arity, same names, same order) and carries
//! everything a form or display layer needs: labels, structural paths,
//! default values, and JSON-Schema-style schema objects. Compiled trees are
//! `Arc`-shared and never mutated; they can back any number of concurrent
//! `resolve` calls.
//!
//! Self-referential definitions terminate through a compilation-scoped
//! recursion cache keyed by [`RecId`]: the recursive node is inserted as a
//! placeholder *before* its body is visited, so any inner reference to the
//! same identity resolves to the placeholder instead of descending again.
//! The one-level expansion is memoized in the node and exposed via
//! [`RecMeta::extract`].

pub mod schema;
pub mod service;

use std::collections::HashMap;
use std::fmt;
use std::sync::{Arc, OnceLock};

use indexmap::IndexMap;
use serde_json::{Value, json};
use tracing::debug;

use crate::error::CompileError;
use crate::format;
use crate::path::Path;
use crate::types::{NumTy, RecId, Ty};

/// Compiled metadata for one type node.
#[derive(Debug)]
pub struct MetaNode {
    /// Raw field label as declared (`to`, `__arg0`, `_1_`).
    pub label: String,
    /// Human form of the label (`To`, `Arg 0`, `Item 1`).
    pub display_label: String,
    /// Structural address of this node.
    pub path: Path,
    /// Candid-style type name, for diagnostics.
    pub candid_type: String,
    /// Initial form value for this node.
    pub default: Value,
    /// JSON-Schema-style description of the accepted value shape.
    pub schema: Value,
    pub kind: MetaKind,
}

#[derive(Debug)]
pub enum MetaKind {
    Null,
    Bool,
    Text,
    Principal,
    Num(NumTy),
    Record(RecordMeta),
    Variant(VariantMeta),
    Tuple(TupleMeta),
    Opt(OptMeta),
    Vector(VectorMeta),
    Blob,
    Rec(RecMeta),
    Func(Box<service::MethodMeta>),
    Service(Box<service::ServiceMeta>),
    Unknown,
}

#[derive(Debug)]
pub struct RecordMeta {
    /// Declared fields, in declaration order.
    pub fields: IndexMap<String, Arc<MetaNode>>,
}

impl RecordMeta {
    pub fn field(&self, name: &str) -> Option<&Arc<MetaNode>> {
        self.fields.get(name)
    }
}

#[derive(Debug)]
pub struct VariantMeta {
    /// Declared options, in declaration order.
    pub options: IndexMap<String, Arc<MetaNode>>,
    /// First declared option: the structural default.
    pub default_option: String,
}

impl VariantMeta {
    pub fn option(&self, name: &str) -> Option<&Arc<MetaNode>> {
        self.options.get(name)
    }

    pub fn option_names(&self) -> impl Iterator<Item = &str> {
        self.options.keys().map(String::as_str)
    }

    /// Tagged default value for an arbitrary option: `{_type: K}` for null
    /// payloads, `{_type: K, K: default}` otherwise.
    pub fn option_default(&self, name: &str) -> Option<Value> {
        let field = self.options.get(name)?;
        let mut obj = serde_json::Map::new();
        obj.insert("_type".to_string(), Value::String(name.to_string()));
        if !matches!(field.kind, MetaKind::Null) {
            obj.insert(name.to_string(), field.default.clone());
        }
        Some(Value::Object(obj))
    }

    /// Lenient tag lookup for form state: explicit `_type` wins, then the
    /// first key naming a declared option, then the default option. The
    /// resolver itself is strict; this helper is not.
    pub fn selected_key(&self, value: &Value) -> String {
        if let Value::Object(obj) = value {
            if let Some(Value::String(tag)) = obj.get("_type") {
                if self.options.contains_key(tag) {
                    return tag.clone();
                }
            }
            if let Some(key) = obj.keys().find(|k| self.options.contains_key(*k)) {
                return key.clone();
            }
        }
        self.default_option.clone()
    }
}

#[derive(Debug)]
pub struct TupleMeta {
    pub fields: Vec<Arc<MetaNode>>,
}

#[derive(Debug)]
pub struct OptMeta {
    pub inner: Arc<MetaNode>,
}

impl OptMeta {
    /// Whether a form value has the optional switched on.
    pub fn is_enabled(&self, value: &Value) -> bool {
        match value {
            Value::Null => false,
            Value::Array(items) => !items.is_empty(),
            _ => true,
        }
    }

    pub fn inner_default(&self) -> Value {
        self.inner.default.clone()
    }
}

#[derive(Debug)]
pub struct VectorMeta {
    /// Template node compiled at index 0.
    pub item: Arc<MetaNode>,
    elem: Ty,
    base_path: Path,
}

impl VectorMeta {
    pub fn item_default(&self) -> Value {
        self.item.default.clone()
    }

    /// Materialize an item node for a concrete runtime index, without
    /// re-running the whole compiler on the enclosing tree.
    pub fn item_at(&self, index: usize) -> Result<Arc<MetaNode>, CompileError> {
        let mut cache = RecCache::default();
        compile_in(
            &mut cache,
            &self.elem,
            &index.to_string(),
            &self.base_path.index(index),
        )
    }
}

pub struct RecMeta {
    pub type_name: String,
    slot: OnceLock<Arc<MetaNode>>,
}

impl RecMeta {
    /// The memoized one-level expansion of the recursive body.
    pub fn extract(&self) -> Arc<MetaNode> {
        // Filled before `compile` returns; the placeholder is only bare
        // while its own body is being compiled.
        self.slot
            .get()
            .cloned()
            .expect("recursive expansion is filled during compilation")
    }
}

impl fmt::Debug for RecMeta {
    // The expansion refers back to this node; printing it would not terminate.
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("RecMeta")
            .field("type_name", &self.type_name)
            .field("expanded", &self.slot.get().is_some())
            .finish()
    }
}

impl MetaNode {
    /// Short kind tag used in error messages.
    pub fn kind_name(&self) -> &'static str {
        match &self.kind {
            MetaKind::Null => "null",
            MetaKind::Bool => "bool",
            MetaKind::Text => "text",
            MetaKind::Principal => "principal",
            MetaKind::Num(_) => "number",
            MetaKind::Record(_) => "record",
            MetaKind::Variant(_) => "variant",
            MetaKind::Tuple(_) => "tuple",
            MetaKind::Opt(_) => "optional",
            MetaKind::Vector(_) => "vector",
            MetaKind::Blob => "blob",
            MetaKind::Rec(_) => "recursive",
            MetaKind::Func(_) => "function",
            MetaKind::Service(_) => "service",
            MetaKind::Unknown => "unknown",
        }
    }
}

// ------------------------------ Compilation ------------------------------- //

/// Compilation-scoped memo of recursive nodes, keyed by type identity.
/// Fresh per top-level compile; shared across one whole pass.
#[derive(Default)]
pub(crate) struct RecCache {
    nodes: HashMap<RecId, Arc<MetaNode>>,
}

/// Compile a type node into its metadata tree.
///
/// Total over the algebra: every kind has a case, including the explicit
/// `Unknown` leaf. Fails only on malformed input (empty variants, unfilled
/// recursive bodies), never on well-formed shapes.
pub fn compile(ty: &Ty, label: &str) -> Result<Arc<MetaNode>, CompileError> {
    debug!(label, kind = ty.kind_name(), "compiling type node");
    let mut cache = RecCache::default();
    compile_in(&mut cache, ty, label, &Path::root())
}

pub(crate) fn compile_in(
    cache: &mut RecCache,
    ty: &Ty,
    label: &str,
    path: &Path,
) -> Result<Arc<MetaNode>, CompileError> {
    let node = match ty {
        Ty::Null => leaf(label, path, ty, json!(null), schema::null_schema(), MetaKind::Null),
        Ty::Bool => leaf(label, path, ty, json!(false), schema::bool_schema(), MetaKind::Bool),
        Ty::Text => leaf(label, path, ty, json!(""), schema::text_schema(), MetaKind::Text),
        Ty::Principal => leaf(
            label,
            path,
            ty,
            json!(""),
            schema::principal_schema(),
            MetaKind::Principal,
        ),
        Ty::Num(num) => leaf(
            label,
            path,
            ty,
            json!(""),
            schema::num_schema(*num),
            MetaKind::Num(*num),
        ),

        Ty::Record(decl) => {
            let mut fields = IndexMap::with_capacity(decl.len());
            for (name, field_ty) in decl {
                let child = compile_in(cache, field_ty, name, &path.key(name))?;
                fields.insert(name.clone(), child);
            }
            let default = Value::Object(
                fields
                    .iter()
                    .map(|(name, f)| (name.clone(), f.default.clone()))
                    .collect(),
            );
            let schema = schema::record_schema(&fields);
            MetaNode {
                label: label.to_string(),
                display_label: format::format_label(label),
                path: path.clone(),
                candid_type: ty.to_string(),
                default,
                schema,
                kind: MetaKind::Record(RecordMeta { fields }),
            }
        }

        Ty::Variant(decl) => {
            if decl.is_empty() {
                return Err(CompileError::EmptyVariant {
                    path: path.render(),
                    label: label.to_string(),
                });
            }
            let mut options = IndexMap::with_capacity(decl.len());
            for (name, option_ty) in decl {
                let child = compile_in(cache, option_ty, name, &path.key(name))?;
                options.insert(name.clone(), child);
            }
            let default_option = decl[0].0.clone();
            let schema = schema::variant_schema(&options);
            let meta = VariantMeta { options, default_option };
            let default = meta
                .option_default(&meta.default_option)
                .unwrap_or(Value::Null);
            MetaNode {
                label: label.to_string(),
                display_label: format::format_label(label),
                path: path.clone(),
                candid_type: ty.to_string(),
                default,
                schema,
                kind: MetaKind::Variant(meta),
            }
        }

        Ty::Tuple(decl) => {
            let mut fields = Vec::with_capacity(decl.len());
            for (index, item_ty) in decl.iter().enumerate() {
                let child =
                    compile_in(cache, item_ty, &format!("_{index}_"), &path.index(index))?;
                fields.push(child);
            }
            let default = Value::Array(fields.iter().map(|f| f.default.clone()).collect());
            let schema = schema::tuple_schema(&fields);
            MetaNode {
                label: label.to_string(),
                display_label: format::format_label(label),
                path: path.clone(),
                candid_type: ty.to_string(),
                default,
                schema,
                kind: MetaKind::Tuple(TupleMeta { fields }),
            }
        }

        Ty::Opt(inner_ty) => {
            // transparent wrapper: same label, same path depth
            let inner = compile_in(cache, inner_ty, label, path)?;
            let schema = schema::opt_schema(&inner);
            MetaNode {
                label: label.to_string(),
                display_label: format::format_label(label),
                path: path.clone(),
                candid_type: ty.to_string(),
                default: Value::Null,
                schema,
                kind: MetaKind::Opt(OptMeta { inner }),
            }
        }

        Ty::Vec(elem) if elem.is_blob_element() => {
            leaf(label, path, ty, json!(""), schema::blob_schema(), MetaKind::Blob)
        }

        Ty::Vec(elem) => {
            let item = compile_in(cache, elem, &format!("{label}_item"), &path.index(0))?;
            let schema = schema::vector_schema(&item);
            MetaNode {
                label: label.to_string(),
                display_label: format::format_label(label),
                path: path.clone(),
                candid_type: ty.to_string(),
                default: json!([]),
                schema,
                kind: MetaKind::Vector(VectorMeta {
                    item,
                    elem: (**elem).clone(),
                    base_path: path.clone(),
                }),
            }
        }

        Ty::Rec(rec) => {
            if let Some(hit) = cache.nodes.get(&rec.id()) {
                return Ok(hit.clone());
            }
            let body = rec.body().ok_or_else(|| CompileError::UnfilledRecursive {
                path: path.render(),
                type_name: rec.name().to_string(),
            })?;

            let node = Arc::new(MetaNode {
                label: label.to_string(),
                display_label: format::format_label(label),
                path: path.clone(),
                candid_type: rec.name().to_string(),
                default: Value::Null,
                schema: schema::any_schema(),
                kind: MetaKind::Rec(RecMeta {
                    type_name: rec.name().to_string(),
                    slot: OnceLock::new(),
                }),
            });
            // placeholder goes in before the body is visited; this is the
            // cycle breaker
            cache.nodes.insert(rec.id(), node.clone());

            let expansion = compile_in(cache, body, label, path)?;
            if let MetaKind::Rec(rec_meta) = &node.kind {
                let _ = rec_meta.slot.set(expansion);
            }
            return Ok(node);
        }

        Ty::Func(func) => {
            let method = service::MethodMeta::compile_in(cache, label, func)?;
            leaf(
                label,
                path,
                ty,
                Value::Null,
                schema::any_schema(),
                MetaKind::Func(Box::new(method)),
            )
        }

        Ty::Service(methods) => {
            let svc = service::ServiceMeta::compile_methods(cache, methods)?;
            leaf(
                label,
                path,
                ty,
                Value::Null,
                schema::any_schema(),
                MetaKind::Service(Box::new(svc)),
            )
        }

        Ty::Unknown => leaf(
            label,
            path,
            ty,
            Value::Null,
            schema::any_schema(),
            MetaKind::Unknown,
        ),
    };

    Ok(Arc::new(node))
}

fn leaf(label: &str, path: &Path, ty: &Ty, default: Value, schema: Value, kind: MetaKind) -> MetaNode {
    MetaNode {
        label: label.to_string(),
        display_label: format::format_label(label),
        path: path.clone(),
        candid_type: ty.to_string(),
        default,
        schema,
        kind,
    }
}

// ------------------------------- Tests ------------------------------------ //
