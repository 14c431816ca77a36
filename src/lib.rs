//! Interface-metadata compiler and value resolver (single-crate).
//!
//! Take a parsed interface type tree (the Candid-style algebra: primitives,
//! records, variants, tuples, optionals, vectors/blobs, recursive
//! definitions, functions, services), compile it once into an immutable
//! metadata tree (labels, structural paths, form defaults, schema objects),
//! then resolve any number of decoded values against it into per-field
//! display trees.
//!
//! Design goals:
//! - One recursive descent, total over the closed algebra; no default arm.
//! - Self-reference terminates through an identity-keyed recursion cache,
//!   never through depth limits.
//! - Dual-shape tolerance lives in one shared helper, not per kind.
//! - Display never loses precision: wide integers become decimal strings.
//! - Compiled trees are immutable and shareable; resolution is per-call.
//!
//! Parsing interface source text, wire encoding/decoding, and transport are
//! collaborator concerns and stay outside this crate.

pub mod error;
pub mod format;
pub mod meta;
pub mod path;
pub mod principal;
pub mod resolve;
pub mod types;

pub use error::{CompileError, ResolveError};
pub use meta::service::{MethodMeta, ServiceMeta, args_from_keyed};
pub use meta::{
    MetaKind, MetaNode, OptMeta, RecMeta, RecordMeta, TupleMeta, VariantMeta, VectorMeta, compile,
};
pub use path::Path;
pub use resolve::{BLOB_HEX_MAX_BYTES, BlobRepr, DIGEST_HEX_LEN, ResolvedKind, ResolvedNode};
pub use types::{FuncMode, FuncTy, NumTy, NumWidth, RecId, RecTy, Ty};
