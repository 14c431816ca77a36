//! Service- and method-level metadata: the top-level entry point most
//! callers use.
//!
//! A [`ServiceMeta`] is a name-keyed, declaration-ordered map of
//! [`MethodMeta`]. Each method carries argument metadata (form defaults and
//! schemas) and result metadata (display resolution), compiled through the
//! same traversal as every other node. Zero-argument and zero-return methods
//! are first-class: they compile to valid empty-tuple shapes, not errors.

use std::sync::Arc;

use indexmap::IndexMap;
use serde_json::Value;
use tracing::debug;

use super::{MetaKind, MetaNode, RecCache, compile_in, schema};
use crate::error::{CompileError, ResolveError};
use crate::path::Path;
use crate::resolve::{ResolvedNode, runtime_kind};
use crate::types::{FuncMode, FuncTy, Ty};

#[derive(Debug)]
pub struct ServiceMeta {
    /// Methods in declaration order.
    pub methods: IndexMap<String, MethodMeta>,
}

impl ServiceMeta {
    /// Compile a service type node. One recursion cache spans the whole
    /// service, so a recursive type shared by several methods compiles once.
    pub fn compile(ty: &Ty) -> Result<Self, CompileError> {
        match ty {
            Ty::Service(methods) => {
                debug!(methods = methods.len(), "compiling service metadata");
                let mut cache = RecCache::default();
                Self::compile_methods(&mut cache, methods)
            }
            other => Err(CompileError::WrongTypeNode {
                path: String::new(),
                expected: "service",
                found: other.kind_name(),
            }),
        }
    }

    pub(crate) fn compile_methods(
        cache: &mut RecCache,
        methods: &[(String, FuncTy)],
    ) -> Result<Self, CompileError> {
        let mut out = IndexMap::with_capacity(methods.len());
        for (name, func) in methods {
            out.insert(name.clone(), MethodMeta::compile_in(cache, name, func)?);
        }
        Ok(ServiceMeta { methods: out })
    }

    pub fn method(&self, name: &str) -> Result<&MethodMeta, CompileError> {
        self.methods.get(name).ok_or_else(|| CompileError::UnknownMethod {
            name: name.to_string(),
            available: self.methods.keys().cloned().collect(),
        })
    }

    pub fn method_names(&self) -> impl Iterator<Item = &str> {
        self.methods.keys().map(String::as_str)
    }
}

pub struct MethodMeta {
    pub name: String,
    pub mode: FuncMode,
    /// Argument metadata, labelled `__arg0…`, addressed `[0]…`.
    pub args: Vec<Arc<MetaNode>>,
    /// Result metadata, labelled `__ret0…`, addressed `[0]…`.
    pub rets: Vec<Arc<MetaNode>>,
    /// Positional list of argument defaults, for form initialization.
    pub default_args: Value,
    /// Tuple schema over all arguments; empty tuple for no-arg methods.
    pub args_schema: Value,
}

impl std::fmt::Debug for MethodMeta {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("MethodMeta")
            .field("name", &self.name)
            .field("mode", &self.mode)
            .field("args", &self.args.len())
            .field("rets", &self.rets.len())
            .finish_non_exhaustive()
    }
}

impl MethodMeta {
    pub(crate) fn compile_in(
        cache: &mut RecCache,
        name: &str,
        func: &FuncTy,
    ) -> Result<Self, CompileError> {
        let mut args = Vec::with_capacity(func.args.len());
        for (index, arg_ty) in func.args.iter().enumerate() {
            args.push(compile_in(
                cache,
                arg_ty,
                &format!("__arg{index}"),
                &Path::root().index(index),
            )?);
        }
        let mut rets = Vec::with_capacity(func.rets.len());
        for (index, ret_ty) in func.rets.iter().enumerate() {
            rets.push(compile_in(
                cache,
                ret_ty,
                &format!("__ret{index}"),
                &Path::root().index(index),
            )?);
        }
        let default_args = Value::Array(args.iter().map(|a| a.default.clone()).collect());
        let args_schema = schema::tuple_schema(&args);
        Ok(MethodMeta {
            name: name.to_string(),
            mode: func.mode,
            args,
            rets,
            default_args,
            args_schema,
        })
    }

    pub fn arg_count(&self) -> usize {
        self.args.len()
    }

    pub fn ret_count(&self) -> usize {
        self.rets.len()
    }

    pub fn is_no_args(&self) -> bool {
        self.args.is_empty()
    }

    pub fn is_query(&self) -> bool {
        self.mode == FuncMode::Query
    }

    /// Resolve a method's return value(s) into display trees.
    ///
    /// Single-return methods take the bare value; multi-return methods take
    /// the positional sequence; zero-return methods accept `null` or an
    /// empty sequence and resolve to an empty list.
    pub fn resolve_results(&self, value: &Value) -> Result<Vec<ResolvedNode>, ResolveError> {
        match self.rets.len() {
            0 => match value {
                Value::Null => Ok(Vec::new()),
                Value::Array(items) if items.is_empty() => Ok(Vec::new()),
                other => Err(ResolveError::ExpectedKindMismatch {
                    path: String::new(),
                    expected: "empty result",
                    actual: runtime_kind(other),
                }),
            },
            1 => Ok(vec![self.rets[0].resolve(value)?]),
            n => {
                let items = match value {
                    Value::Array(items) if items.len() == n => items,
                    Value::Array(_) => {
                        return Err(ResolveError::ExpectedKindMismatch {
                            path: String::new(),
                            expected: "result tuple",
                            actual: "array",
                        });
                    }
                    other => {
                        return Err(ResolveError::ExpectedKindMismatch {
                            path: String::new(),
                            expected: "result tuple",
                            actual: runtime_kind(other),
                        });
                    }
                };
                self.rets
                    .iter()
                    .zip(items)
                    .map(|(ret, item)| ret.resolve(item))
                    .collect()
            }
        }
    }

    /// Resolve a positional argument list, or a keyed `{arg0: …}` map as
    /// form layers produce. Declared-but-missing arguments are an error
    /// unless the argument type is optional.
    pub fn resolve_args(&self, value: &Value) -> Result<Vec<ResolvedNode>, ResolveError> {
        let keyed;
        let items: &[Value] = match value {
            Value::Array(items) => items,
            Value::Object(_) => {
                keyed = args_from_keyed(value);
                &keyed
            }
            other => {
                return Err(ResolveError::ExpectedKindMismatch {
                    path: String::new(),
                    expected: "argument sequence",
                    actual: runtime_kind(other),
                });
            }
        };

        self.args
            .iter()
            .enumerate()
            .map(|(index, arg)| match items.get(index) {
                Some(item) => arg.resolve(item),
                None if matches!(arg.kind, MetaKind::Opt(_)) => arg.resolve(&Value::Null),
                None => Err(ResolveError::MissingRequiredValue {
                    path: arg.path.render(),
                    expected: arg.kind_name(),
                }),
            })
            .collect()
    }
}

/// Flatten a `{arg0: v0, arg1: v1, …}` map into the positional argument
/// list. Stops at the first missing index.
pub fn args_from_keyed(value: &Value) -> Vec<Value> {
    let Value::Object(obj) = value else {
        return Vec::new();
    };
    let mut out = Vec::new();
    let mut index = 0;
    while let Some(v) = obj.get(&format!("arg{index}")) {
        out.push(v.clone());
        index += 1;
    }
    out
}

// ------------------------------- Tests ------------------------------------ //

#[cfg(test)]
mod tests {
    use super::*;
    use crate::types::{NumTy, NumWidth};
    use serde_json::json;

    fn ledger_service() -> Ty {
        Ty::Service(vec![
            (
                "balance_of".to_string(),
                FuncTy {
                    args: vec![Ty::Principal],
                    rets: vec![Ty::Num(NumTy::NAT)],
                    mode: FuncMode::Query,
                },
            ),
            (
                "transfer".to_string(),
                FuncTy {
                    args: vec![
                        Ty::Record(vec![
                            ("to".into(), Ty::Principal),
                            ("amount".into(), Ty::Num(NumTy::nat(NumWidth::W64))),
                            ("memo".into(), Ty::Opt(Box::new(Ty::Text))),
                        ]),
                    ],
                    rets: vec![
                        Ty::Variant(vec![
                            ("Ok".into(), Ty::Num(NumTy::nat(NumWidth::W64))),
                            ("Err".into(), Ty::Text),
                        ]),
                    ],
                    mode: FuncMode::Update,
                },
            ),
            (
                "ping".to_string(),
                FuncTy { args: vec![], rets: vec![], mode: FuncMode::Update },
            ),
        ])
    }

    #[test]
    fn methods_keep_declaration_order_and_modes() {
        let svc = ServiceMeta::compile(&ledger_service()).unwrap();
        assert_eq!(
            svc.method_names().collect::<Vec<_>>(),
            ["balance_of", "transfer", "ping"]
        );
        assert!(svc.method("balance_of").unwrap().is_query());
        assert!(!svc.method("transfer").unwrap().is_query());
    }

    #[test]
    fn unknown_method_error_lists_what_exists() {
        let svc = ServiceMeta::compile(&ledger_service()).unwrap();
        let err = svc.method("mint").unwrap_err();
        assert_eq!(
            err,
            CompileError::UnknownMethod {
                name: "mint".into(),
                available: vec!["balance_of".into(), "transfer".into(), "ping".into()],
            }
        );
    }

    #[test]
    fn compiling_a_non_service_node_is_rejected() {
        assert!(matches!(
            ServiceMeta::compile(&Ty::Text),
            Err(CompileError::WrongTypeNode { expected: "service", found: "text", .. })
        ));
    }

    #[test]
    fn argument_metadata_paths_and_defaults() {
        let svc = ServiceMeta::compile(&ledger_service()).unwrap();
        let transfer = svc.method("transfer").unwrap();
        assert_eq!(transfer.arg_count(), 1);
        assert_eq!(transfer.args[0].label, "__arg0");
        assert_eq!(transfer.args[0].display_label, "Arg 0");
        assert_eq!(transfer.args[0].path.render(), "[0]");
        assert_eq!(
            transfer.default_args,
            json!([{ "to": "", "amount": "", "memo": null }])
        );

        let MetaKind::Record(record) = &transfer.args[0].kind else {
            panic!("expected record argument");
        };
        assert_eq!(record.field("to").unwrap().path.render(), "[0].to");
    }

    #[test]
    fn zero_arg_methods_still_compile_to_an_empty_tuple_shape() {
        let svc = ServiceMeta::compile(&ledger_service()).unwrap();
        let ping = svc.method("ping").unwrap();
        assert!(ping.is_no_args());
        assert_eq!(ping.default_args, json!([]));
        assert_eq!(ping.args_schema["maxItems"], json!(0));
        assert_eq!(ping.resolve_results(&Value::Null).unwrap(), Vec::new());
        assert_eq!(ping.resolve_results(&json!([])).unwrap(), Vec::new());
    }

    #[test]
    fn single_return_takes_the_bare_value() {
        let svc = ServiceMeta::compile(&ledger_service()).unwrap();
        let balance = svc.method("balance_of").unwrap();
        let results = balance.resolve_results(&json!("4000000")).unwrap();
        assert_eq!(results.len(), 1);
        assert_eq!(results[0].display, json!("4000000"));
    }

    #[test]
    fn keyed_args_are_extracted_positionally() {
        let svc = ServiceMeta::compile(&ledger_service()).unwrap();
        let balance = svc.method("balance_of").unwrap();

        let owner = crate::principal::to_text(&[1, 2, 3]);
        let keyed = json!({ "arg0": owner.clone() });
        let resolved = balance.resolve_args(&keyed).unwrap();
        assert_eq!(resolved.len(), 1);
        assert_eq!(resolved[0].display, json!(owner));

        assert_eq!(
            args_from_keyed(&json!({ "arg0": 1, "arg1": 2, "arg3": 4 })),
            vec![json!(1), json!(2)]
        );
    }

    #[test]
    fn missing_required_argument_is_an_error() {
        let svc = ServiceMeta::compile(&ledger_service()).unwrap();
        let transfer = svc.method("transfer").unwrap();
        let err = transfer.resolve_args(&json!([])).unwrap_err();
        assert_eq!(
            err,
            ResolveError::MissingRequiredValue {
                path: "[0]".into(),
                expected: "record",
            }
        );
    }
}
