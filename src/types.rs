// Closed type algebra for remote-call interfaces. No metadata here.

use std::fmt;
use std::sync::atomic::{AtomicU64, Ordering};
use std::sync::{Arc, OnceLock};

use serde::Serialize;

/// Storage width of a numeric type. `Unbounded` covers the
/// arbitrary-precision `nat`/`int` kinds.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize)]
#[serde(rename_all = "lowercase")]
pub enum NumWidth {
    W8,
    W16,
    W32,
    W64,
    Unbounded,
}

impl NumWidth {
    pub fn bits(self) -> Option<u32> {
        match self {
            NumWidth::W8 => Some(8),
            NumWidth::W16 => Some(16),
            NumWidth::W32 => Some(32),
            NumWidth::W64 => Some(64),
            NumWidth::Unbounded => None,
        }
    }
}

/// Width, signedness, and floatness of a number node; recorded at compile
/// time and consulted for precision decisions at resolve time.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize)]
pub struct NumTy {
    pub width: NumWidth,
    pub signed: bool,
    pub float: bool,
}

impl NumTy {
    /// Arbitrary-precision unsigned integer.
    pub const NAT: NumTy = NumTy { width: NumWidth::Unbounded, signed: false, float: false };
    /// Arbitrary-precision signed integer.
    pub const INT: NumTy = NumTy { width: NumWidth::Unbounded, signed: true, float: false };
    pub const FLOAT32: NumTy = NumTy { width: NumWidth::W32, signed: true, float: true };
    pub const FLOAT64: NumTy = NumTy { width: NumWidth::W64, signed: true, float: true };

    pub const fn nat(width: NumWidth) -> Self {
        NumTy { width, signed: false, float: false }
    }

    pub const fn int(width: NumWidth) -> Self {
        NumTy { width, signed: true, float: false }
    }

    /// True when native display narrows: anything wider than 32 bits cannot
    /// be represented losslessly in common display number types.
    pub fn is_wide(self) -> bool {
        !self.float && matches!(self.width, NumWidth::W64 | NumWidth::Unbounded)
    }

    /// Inclusive integer bounds for fixed widths; `None` for unbounded or
    /// float kinds.
    pub fn bounds(self) -> Option<(i128, i128)> {
        if self.float {
            return None;
        }
        let bits = self.width.bits()? as i128;
        Some(if self.signed {
            (-(1i128 << (bits - 1)), (1i128 << (bits - 1)) - 1)
        } else {
            (0, (1i128 << bits) - 1)
        })
    }

    pub fn name(self) -> String {
        if self.float {
            return format!("float{}", self.width.bits().unwrap_or(64));
        }
        let base = if self.signed { "int" } else { "nat" };
        match self.width.bits() {
            Some(b) => format!("{base}{b}"),
            None => base.to_string(),
        }
    }
}

/// Opaque identity token for a recursive definition, assigned once at
/// construction. Two clones of the same handle share the token; two
/// independently constructed handles never do.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord)]
pub struct RecId(u64);

static NEXT_REC_ID: AtomicU64 = AtomicU64::new(1);

struct RecInner {
    id: RecId,
    name: String,
    body: OnceLock<Ty>,
}

/// Self-reference knot: created empty, filled exactly once, forced on
/// demand. Cycle detection keys on [`RecId`], not on pointer identity.
#[derive(Clone)]
pub struct RecTy(Arc<RecInner>);

impl RecTy {
    pub fn new(name: impl Into<String>) -> Self {
        RecTy(Arc::new(RecInner {
            id: RecId(NEXT_REC_ID.fetch_add(1, Ordering::Relaxed)),
            name: name.into(),
            body: OnceLock::new(),
        }))
    }

    pub fn id(&self) -> RecId {
        self.0.id
    }

    pub fn name(&self) -> &str {
        &self.0.name
    }

    /// Fill the body. Returns false if the knot was already filled; the
    /// first fill wins.
    pub fn fill(&self, body: Ty) -> bool {
        self.0.body.set(body).is_ok()
    }

    /// The filled body, if any.
    pub fn body(&self) -> Option<&Ty> {
        self.0.body.get()
    }
}

impl PartialEq for RecTy {
    fn eq(&self, other: &Self) -> bool {
        self.0.id == other.0.id
    }
}

impl Eq for RecTy {}

impl fmt::Debug for RecTy {
    // Body deliberately omitted: printing it would not terminate on cycles.
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("RecTy")
            .field("id", &self.0.id)
            .field("name", &self.0.name)
            .finish_non_exhaustive()
    }
}

/// Query methods have no state-changing effects; composite queries classify
/// as queries.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize)]
#[serde(rename_all = "lowercase")]
pub enum FuncMode {
    Query,
    Update,
}

#[derive(Debug, Clone, PartialEq)]
pub struct FuncTy {
    pub args: Vec<Ty>,
    pub rets: Vec<Ty>,
    pub mode: FuncMode,
}

/// One node of the closed interface type algebra. Every consumer matches
/// exhaustively; there is no fallback arm anywhere.
#[derive(Debug, Clone, PartialEq)]
pub enum Ty {
    Null,
    Bool,
    Text,
    Principal,
    Num(NumTy),
    Record(Vec<(String, Ty)>),  // declaration order is semantic
    Variant(Vec<(String, Ty)>), // first option is the structural default
    Tuple(Vec<Ty>),
    Opt(Box<Ty>),
    Vec(Box<Ty>), // element nat8 classifies as blob downstream
    Rec(RecTy),
    Func(Box<FuncTy>),
    Service(Vec<(String, FuncTy)>),
    /// Explicit unsupported leaf; not a silent fallback.
    Unknown,
}

impl Ty {
    pub const fn nat8() -> Self {
        Ty::Num(NumTy::nat(NumWidth::W8))
    }

    pub fn blob() -> Self {
        Ty::Vec(Box::new(Ty::nat8()))
    }

    /// True for the element type that makes a vector a blob.
    pub fn is_blob_element(&self) -> bool {
        matches!(
            self,
            Ty::Num(NumTy { width: NumWidth::W8, signed: false, float: false })
        )
    }

    /// Short runtime kind tag, used in diagnostics.
    pub fn kind_name(&self) -> &'static str {
        match self {
            Ty::Null => "null",
            Ty::Bool => "bool",
            Ty::Text => "text",
            Ty::Principal => "principal",
            Ty::Num(_) => "number",
            Ty::Record(_) => "record",
            Ty::Variant(_) => "variant",
            Ty::Tuple(_) => "tuple",
            Ty::Opt(_) => "optional",
            Ty::Vec(el) if el.is_blob_element() => "blob",
            Ty::Vec(_) => "vector",
            Ty::Rec(_) => "recursive",
            Ty::Func(_) => "function",
            Ty::Service(_) => "service",
            Ty::Unknown => "unknown",
        }
    }
}

impl fmt::Display for Ty {
    /// Candid-style notation. Recursive nodes print by name so cyclic
    /// definitions render in bounded space.
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Ty::Null => f.write_str("null"),
            Ty::Bool => f.write_str("bool"),
            Ty::Text => f.write_str("text"),
            Ty::Principal => f.write_str("principal"),
            Ty::Num(n) => f.write_str(&n.name()),
            Ty::Record(fields) => {
                f.write_str("record { ")?;
                for (i, (name, ty)) in fields.iter().enumerate() {
                    if i > 0 {
                        f.write_str("; ")?;
                    }
                    write!(f, "{name} : {ty}")?;
                }
                f.write_str(" }")
            }
            Ty::Variant(options) => {
                f.write_str("variant { ")?;
                for (i, (name, ty)) in options.iter().enumerate() {
                    if i > 0 {
                        f.write_str("; ")?;
                    }
                    match ty {
                        Ty::Null => f.write_str(name)?,
                        other => write!(f, "{name} : {other}")?,
                    }
                }
                f.write_str(" }")
            }
            Ty::Tuple(items) => {
                f.write_str("record { ")?;
                for (i, ty) in items.iter().enumerate() {
                    if i > 0 {
                        f.write_str("; ")?;
                    }
                    write!(f, "{ty}")?;
                }
                f.write_str(" }")
            }
            Ty::Opt(inner) => write!(f, "opt {inner}"),
            Ty::Vec(el) if el.is_blob_element() => f.write_str("blob"),
            Ty::Vec(el) => write!(f, "vec {el}"),
            Ty::Rec(rec) => f.write_str(rec.name()),
            Ty::Func(func) => {
                f.write_str("func (")?;
                for (i, ty) in func.args.iter().enumerate() {
                    if i > 0 {
                        f.write_str(", ")?;
                    }
                    write!(f, "{ty}")?;
                }
                f.write_str(") -> (")?;
                for (i, ty) in func.rets.iter().enumerate() {
                    if i > 0 {
                        f.write_str(", ")?;
                    }
                    write!(f, "{ty}")?;
                }
                f.write_str(")")?;
                if func.mode == FuncMode::Query {
                    f.write_str(" query")?;
                }
                Ok(())
            }
            Ty::Service(_) => f.write_str("service"),
            Ty::Unknown => f.write_str("unknown"),
        }
    }
}

// ------------------------------- Tests ------------------------------------ //

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn rec_identity_is_stable_across_clones() {
        let a = RecTy::new("List");
        let b = a.clone();
        let c = RecTy::new("List");
        assert_eq!(a.id(), b.id());
        assert_ne!(a.id(), c.id());
        assert_eq!(a, b);
        assert_ne!(a, c);
    }

    #[test]
    fn rec_fill_is_first_wins() {
        let rec = RecTy::new("Tree");
        assert!(rec.body().is_none());
        assert!(rec.fill(Ty::Null));
        assert!(!rec.fill(Ty::Bool));
        assert_eq!(rec.body(), Some(&Ty::Null));
    }

    #[test]
    fn blob_classification_requires_exact_nat8() {
        assert!(Ty::nat8().is_blob_element());
        assert!(!Ty::Num(NumTy::int(NumWidth::W8)).is_blob_element());
        assert!(!Ty::Num(NumTy::nat(NumWidth::W16)).is_blob_element());
        assert_eq!(Ty::blob().kind_name(), "blob");
        assert_eq!(Ty::Vec(Box::new(Ty::Text)).kind_name(), "vector");
    }

    #[test]
    fn fixed_width_bounds() {
        assert_eq!(NumTy::nat(NumWidth::W8).bounds(), Some((0, 255)));
        assert_eq!(NumTy::int(NumWidth::W8).bounds(), Some((-128, 127)));
        assert_eq!(
            NumTy::nat(NumWidth::W64).bounds(),
            Some((0, u64::MAX as i128))
        );
        assert_eq!(NumTy::NAT.bounds(), None);
        assert_eq!(NumTy::FLOAT64.bounds(), None);
    }

    #[test]
    fn display_renders_candid_notation() {
        let ty = Ty::Record(vec![
            ("to".into(), Ty::Principal),
            ("amount".into(), Ty::Num(NumTy::NAT)),
            ("memo".into(), Ty::Opt(Box::new(Ty::blob()))),
        ]);
        assert_eq!(
            ty.to_string(),
            "record { to : principal; amount : nat; memo : opt blob }"
        );

        let var = Ty::Variant(vec![("Ok".into(), Ty::Null), ("Err".into(), Ty::Text)]);
        assert_eq!(var.to_string(), "variant { Ok; Err : text }");
    }
}
