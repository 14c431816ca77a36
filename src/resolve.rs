//! Value resolver: zip compiled metadata with one concrete decoded value.
//!
//! `MetaNode::resolve` walks the metadata tree and the value together,
//! producing a fresh [`ResolvedNode`] tree that mirrors the metadata shape
//! and carries, per node, the value exactly as handed in (`raw`) and its
//! display form (`display`). Resolution never touches sibling variant
//! options, never mutates the metadata, and fails with a path-carrying
//! error instead of guessing at mismatched shapes.

pub mod blob;
pub mod num;
pub mod shape;

pub use blob::{BLOB_HEX_MAX_BYTES, BlobRepr, DIGEST_HEX_LEN};
pub use shape::runtime_kind;

use serde_json::{Map, Value};
use tracing::trace;

use crate::error::ResolveError;
use crate::format::{self, NumberFormat, TextFormat};
use crate::meta::{MetaKind, MetaNode};
use crate::path::Path;
use crate::principal;
use shape::FieldsView;

/// One node of the per-call result tree. Structurally congruent with the
/// metadata node it came from.
#[derive(Debug, Clone, PartialEq, serde::Serialize)]
pub struct ResolvedNode {
    pub label: String,
    pub display_label: String,
    pub path: String,
    pub candid_type: String,
    /// The value exactly as handed in.
    pub raw: Value,
    /// The display-transformed value.
    pub display: Value,
    pub kind: ResolvedKind,
}

#[derive(Debug, Clone, PartialEq, serde::Serialize)]
#[serde(tag = "type", rename_all = "snake_case")]
pub enum ResolvedKind {
    Null,
    Bool,
    Text {
        format: TextFormat,
    },
    Principal,
    Number {
        format: NumberFormat,
        /// True when the display channel had to fall back to a decimal
        /// string to stay lossless.
        wide: bool,
        /// Cosmetic rendering for timestamp/cycle hints.
        pretty: Option<String>,
    },
    Record {
        fields: Vec<ResolvedNode>,
    },
    Variant {
        selected: String,
        value: Box<ResolvedNode>,
    },
    Tuple {
        fields: Vec<ResolvedNode>,
    },
    Optional {
        value: Option<Box<ResolvedNode>>,
    },
    Vector {
        items: Vec<ResolvedNode>,
    },
    Blob {
        digest: String,
        repr: BlobRepr,
    },
    Func,
    Service,
    Unknown,
}

impl MetaNode {
    /// Resolve a concrete decoded value against this node.
    pub fn resolve(&self, value: &Value) -> Result<ResolvedNode, ResolveError> {
        trace!(path = %self.path, kind = self.kind_name(), "resolving value");
        self.resolve_at(value, &self.path, &self.label)
    }

    /// Inner resolution with an address override, used when a template node
    /// (vector item, recursive expansion) stands in at a runtime position.
    fn resolve_at(
        &self,
        value: &Value,
        path: &Path,
        label: &str,
    ) -> Result<ResolvedNode, ResolveError> {
        // null/undefined where a value is structurally required
        let tolerates_null = matches!(
            self.kind,
            MetaKind::Null
                | MetaKind::Opt(_)
                | MetaKind::Rec(_)
                | MetaKind::Func(_)
                | MetaKind::Service(_)
                | MetaKind::Unknown
        );
        if value.is_null() && !tolerates_null {
            return Err(ResolveError::MissingRequiredValue {
                path: path.render(),
                expected: self.kind_name(),
            });
        }

        let mismatch = |actual: &'static str| ResolveError::ExpectedKindMismatch {
            path: path.render(),
            expected: self.kind_name(),
            actual,
        };

        match &self.kind {
            MetaKind::Null => match value {
                Value::Null => Ok(self.node(path, label, value, Value::Null, ResolvedKind::Null)),
                other => Err(mismatch(runtime_kind(other))),
            },

            MetaKind::Bool => match value {
                Value::Bool(_) => {
                    Ok(self.node(path, label, value, value.clone(), ResolvedKind::Bool))
                }
                other => Err(mismatch(runtime_kind(other))),
            },

            MetaKind::Text => match value {
                Value::String(s) => {
                    let fmt = format::text_format_for(label, Some(s));
                    Ok(self.node(
                        path,
                        label,
                        value,
                        value.clone(),
                        ResolvedKind::Text { format: fmt },
                    ))
                }
                other => Err(mismatch(runtime_kind(other))),
            },

            MetaKind::Principal => {
                let display = match value {
                    Value::String(text) => Value::String(text.clone()),
                    Value::Array(_) => match shape::bytes_view(value) {
                        Some(bytes) => Value::String(principal::to_text(&bytes)),
                        None => return Err(mismatch("array")),
                    },
                    other => return Err(mismatch(runtime_kind(other))),
                };
                Ok(self.node(path, label, value, display, ResolvedKind::Principal))
            }

            MetaKind::Num(numty) => {
                let display = num::display_number(*numty, value).map_err(mismatch)?;
                let fmt = format::number_format_for(label);
                let pretty = match fmt {
                    NumberFormat::Timestamp => {
                        num::as_i128(&display).and_then(format::nanos_to_datetime)
                    }
                    NumberFormat::Cycle => num::as_i128(&display)
                        .and_then(|n| u128::try_from(n).ok())
                        .map(format::cycles_display),
                    NumberFormat::Normal => None,
                };
                Ok(self.node(
                    path,
                    label,
                    value,
                    display,
                    ResolvedKind::Number { format: fmt, wide: numty.is_wide(), pretty },
                ))
            }

            MetaKind::Record(record) => {
                let view = shape::fields_view(value)
                    .ok_or_else(|| mismatch(runtime_kind(value)))?;
                let mut fields = Vec::with_capacity(record.fields.len());
                for (index, (name, field)) in record.fields.iter().enumerate() {
                    let slot = match &view {
                        FieldsView::Named(map) => map.get(name),
                        FieldsView::Positional(items) => items.get(index),
                    };
                    let resolved = match slot {
                        Some(v) => field.resolve_at(v, &field.path, &field.label)?,
                        None if matches!(field.kind, MetaKind::Opt(_)) => {
                            field.resolve_at(&Value::Null, &field.path, &field.label)?
                        }
                        None => {
                            return Err(ResolveError::MissingRequiredValue {
                                path: field.path.render(),
                                expected: field.kind_name(),
                            });
                        }
                    };
                    fields.push(resolved);
                }
                let display = Value::Object(
                    record
                        .fields
                        .keys()
                        .zip(&fields)
                        .map(|(name, f)| (name.clone(), f.display.clone()))
                        .collect(),
                );
                Ok(self.node(path, label, value, display, ResolvedKind::Record { fields }))
            }

            MetaKind::Variant(variant) => {
                let map = match value {
                    Value::Object(map) => map,
                    other => return Err(mismatch(runtime_kind(other))),
                };
                let (selected, payload) =
                    shape::variant_tag(map, |k| variant.options.contains_key(k)).map_err(
                        |found| ResolveError::UnknownVariantOption {
                            path: path.render(),
                            found,
                            valid: variant.options.keys().cloned().collect(),
                        },
                    )?;
                // only the selected option is ever resolved
                let option = &variant.options[&selected];
                let resolved =
                    option.resolve_at(payload.unwrap_or(&Value::Null), &option.path, &option.label)?;

                let mut display = Map::new();
                display.insert("_type".to_string(), Value::String(selected.clone()));
                if !matches!(option.kind, MetaKind::Null) {
                    display.insert(selected.clone(), resolved.display.clone());
                }
                Ok(self.node(
                    path,
                    label,
                    value,
                    Value::Object(display),
                    ResolvedKind::Variant { selected, value: Box::new(resolved) },
                ))
            }

            MetaKind::Tuple(tuple) => {
                let items = match value {
                    Value::Array(items) => items,
                    other => return Err(mismatch(runtime_kind(other))),
                };
                if items.len() > tuple.fields.len() {
                    return Err(mismatch("array"));
                }
                let mut fields = Vec::with_capacity(tuple.fields.len());
                for (index, field) in tuple.fields.iter().enumerate() {
                    let resolved = match items.get(index) {
                        Some(v) => field.resolve_at(v, &field.path, &field.label)?,
                        None if matches!(field.kind, MetaKind::Opt(_)) => {
                            field.resolve_at(&Value::Null, &field.path, &field.label)?
                        }
                        None => {
                            return Err(ResolveError::MissingRequiredValue {
                                path: field.path.render(),
                                expected: field.kind_name(),
                            });
                        }
                    };
                    fields.push(resolved);
                }
                let display = Value::Array(fields.iter().map(|f| f.display.clone()).collect());
                Ok(self.node(path, label, value, display, ResolvedKind::Tuple { fields }))
            }

            MetaKind::Opt(opt) => match shape::optional_view(value) {
                None => Ok(self.node(
                    path,
                    label,
                    value,
                    Value::Null,
                    ResolvedKind::Optional { value: None },
                )),
                Some(inner_value) => {
                    let inner = opt.inner.resolve_at(inner_value, path, label)?;
                    let display = inner.display.clone();
                    Ok(self.node(
                        path,
                        label,
                        value,
                        display,
                        ResolvedKind::Optional { value: Some(Box::new(inner)) },
                    ))
                }
            },

            MetaKind::Vector(vec_meta) => {
                let elems = match value {
                    Value::Array(items) => items,
                    other => return Err(mismatch(runtime_kind(other))),
                };
                let mut items = Vec::with_capacity(elems.len());
                for (index, elem) in elems.iter().enumerate() {
                    items.push(vec_meta.item.resolve_at(
                        elem,
                        &path.index(index),
                        &index.to_string(),
                    )?);
                }
                let display = Value::Array(items.iter().map(|i| i.display.clone()).collect());
                Ok(self.node(path, label, value, display, ResolvedKind::Vector { items }))
            }

            MetaKind::Blob => {
                let bytes = shape::bytes_view(value)
                    .ok_or_else(|| mismatch(runtime_kind(value)))?;
                let (digest, repr, display) = blob::blob_display(&bytes);
                Ok(self.node(
                    path,
                    label,
                    value,
                    display,
                    ResolvedKind::Blob { digest, repr },
                ))
            }

            // delegation: the resolved tree sees through the knot
            MetaKind::Rec(rec) => rec.extract().resolve_at(value, path, label),

            MetaKind::Func(_) => {
                Ok(self.node(path, label, value, value.clone(), ResolvedKind::Func))
            }
            MetaKind::Service(_) => {
                Ok(self.node(path, label, value, value.clone(), ResolvedKind::Service))
            }
            MetaKind::Unknown => {
                Ok(self.node(path, label, value, value.clone(), ResolvedKind::Unknown))
            }
        }
    }

    fn node(
        &self,
        path: &Path,
        label: &str,
        raw: &Value,
        display: Value,
        kind: ResolvedKind,
    ) -> ResolvedNode {
        ResolvedNode {
            label: label.to_string(),
            display_label: format::format_label(label),
            path: path.render(),
            candid_type: self.candid_type.clone(),
            raw: raw.clone(),
            display,
            kind,
        }
    }

    /// Structural predicate over form-shaped input. Checks shapes, exact
    /// record membership, declared variant tags, and numeric ranges without
    /// building a resolved tree. Empty strings are accepted for the leaf
    /// kinds whose form default is an empty string.
    pub fn validate(&self, value: &Value) -> Result<(), ResolveError> {
        let mismatch = |actual: &'static str| ResolveError::ExpectedKindMismatch {
            path: self.path.render(),
            expected: self.kind_name(),
            actual,
        };

        match &self.kind {
            MetaKind::Null => match value {
                Value::Null => Ok(()),
                other => Err(mismatch(runtime_kind(other))),
            },
            MetaKind::Bool => match value {
                Value::Bool(_) => Ok(()),
                other => Err(mismatch(runtime_kind(other))),
            },
            MetaKind::Text => match value {
                Value::String(_) => Ok(()),
                other => Err(mismatch(runtime_kind(other))),
            },
            MetaKind::Principal => match value {
                Value::String(s) if s.is_empty() || principal::is_valid_text(s) => Ok(()),
                Value::String(_) => Err(mismatch("string")),
                Value::Array(_) if shape::bytes_view(value).is_some() => Ok(()),
                other => Err(mismatch(runtime_kind(other))),
            },
            MetaKind::Num(numty) => validate_number(self, *numty, value),
            MetaKind::Record(record) => {
                let view = shape::fields_view(value)
                    .ok_or_else(|| mismatch(runtime_kind(value)))?;
                if let FieldsView::Named(map) = &view {
                    // exact field-set membership
                    if map.keys().any(|k| !record.fields.contains_key(k)) {
                        return Err(mismatch("object"));
                    }
                }
                for (index, (name, field)) in record.fields.iter().enumerate() {
                    let slot = match &view {
                        FieldsView::Named(map) => map.get(name),
                        FieldsView::Positional(items) => items.get(index),
                    };
                    match slot {
                        Some(v) => field.validate(v)?,
                        None if matches!(field.kind, MetaKind::Opt(_)) => {}
                        None => {
                            return Err(ResolveError::MissingRequiredValue {
                                path: field.path.render(),
                                expected: field.kind_name(),
                            });
                        }
                    }
                }
                Ok(())
            }
            MetaKind::Variant(variant) => {
                let map = match value {
                    Value::Object(map) => map,
                    other => return Err(mismatch(runtime_kind(other))),
                };
                let (selected, payload) =
                    shape::variant_tag(map, |k| variant.options.contains_key(k)).map_err(
                        |found| ResolveError::UnknownVariantOption {
                            path: self.path.render(),
                            found,
                            valid: variant.options.keys().cloned().collect(),
                        },
                    )?;
                let option = &variant.options[&selected];
                option.validate(payload.unwrap_or(&Value::Null))
            }
            MetaKind::Tuple(tuple) => {
                let items = match value {
                    Value::Array(items) => items,
                    other => return Err(mismatch(runtime_kind(other))),
                };
                if items.len() != tuple.fields.len() {
                    return Err(mismatch("array"));
                }
                for (field, item) in tuple.fields.iter().zip(items) {
                    field.validate(item)?;
                }
                Ok(())
            }
            MetaKind::Opt(opt) => match shape::optional_view(value) {
                None => Ok(()),
                Some(inner) => opt.inner.validate(inner),
            },
            MetaKind::Vector(vec_meta) => {
                let items = match value {
                    Value::Array(items) => items,
                    other => return Err(mismatch(runtime_kind(other))),
                };
                for item in items {
                    vec_meta.item.validate(item)?;
                }
                Ok(())
            }
            MetaKind::Blob => {
                shape::bytes_view(value).map(|_| ()).ok_or_else(|| mismatch(runtime_kind(value)))
            }
            MetaKind::Rec(rec) => rec.extract().validate(value),
            MetaKind::Func(_) | MetaKind::Service(_) | MetaKind::Unknown => Ok(()),
        }
    }
}

/// Number validation: shape, sign, and fixed-width range. The empty string
/// (an untouched form field) passes; range violations surface as
/// `out-of-range number`.
fn validate_number(node: &MetaNode, numty: crate::types::NumTy, value: &Value) -> Result<(), ResolveError> {
    let mismatch = |actual: &'static str| ResolveError::ExpectedKindMismatch {
        path: node.path.render(),
        expected: node.kind_name(),
        actual,
    };

    let actual = runtime_kind(value);
    let text = match value {
        Value::String(s) if s.is_empty() => return Ok(()),
        Value::String(s) => s.trim().to_string(),
        Value::Number(n) => n.to_string(),
        other => return Err(mismatch(runtime_kind(other))),
    };

    if numty.float {
        return match text.parse::<f64>() {
            Ok(_) => Ok(()),
            Err(_) => Err(mismatch(actual)),
        };
    }

    let digits = text.strip_prefix('-').unwrap_or(&text);
    if digits.is_empty() || !digits.bytes().all(|b| b.is_ascii_digit()) {
        return Err(mismatch(actual));
    }
    if !numty.signed && text.starts_with('-') {
        return Err(mismatch("out-of-range number"));
    }
    if let Some((lo, hi)) = numty.bounds() {
        match text.parse::<i128>() {
            Ok(n) if n >= lo && n <= hi => {}
            _ => return Err(mismatch("out-of-range number")),
        }
    }
    Ok(())
}

// ------------------------------- Tests ------------------------------------ //
