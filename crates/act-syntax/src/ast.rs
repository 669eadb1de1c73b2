//! Untyped AST produced by the parser (component C3).
//!
//! Every node carries a [`Span`]. Names are not yet resolved against the
//! store or calldata (that is the typechecker's job, component C5); this
//! tree is a direct, position-tagged rendering of the surface syntax.

use act_base::Span;
use num_bigint::BigInt;

/// A builtin or user-declared type name as written in source.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum TypeName {
    Uint(u16),
    Int(u16),
    Bytes(u16),
    Bool,
    Address,
    /// Any other identifier in type position: the name of a contract,
    /// denoting the `AContract` act-type.
    Custom(String),
}

/// A (possibly empty for non-mapping) key list plus value type, as written
/// after `mapping(...)` or inferred from the create-assignment shape.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum RawSlotType {
    Value(TypeName),
    Mapping { keys: Vec<TypeName>, value: TypeName },
}

/// A single typed argument in an `interface` declaration.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct ArgDecl {
    pub ty: TypeName,
    pub name: String,
    pub span: Span,
}

/// `interface transfer(uint value, address to)`.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Interface {
    pub name: String,
    pub args: Vec<ArgDecl>,
    pub span: Span,
}

/// A storage reference as written in source: a name, an optional chain of
/// mapping indices, an optional dotted field, and an optional `at Contract`
/// clause for (unsupported-downstream) cross-contract access.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct RawEntry {
    pub base: String,
    pub indices: Vec<Expr>,
    pub field: Option<String>,
    pub at_contract: Option<String>,
    pub span: Span,
}

/// Unary and binary operators recognized at the untyped-AST level. Which
/// operand/result types are legal is a typechecker concern (C5), not a
/// parser concern.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum BinOp {
    Add,
    Sub,
    Mul,
    Div,
    Mod,
    Exp,
    Lt,
    Le,
    Gt,
    Ge,
    Eq,
    Neq,
    And,
    Or,
    Concat, // ++  (bytestring concatenation)
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum UnOp {
    Not,
    Neg,
}

/// Which side of an elaboration-time rewrite a `pre`/`post` wrapper
/// requests. `Direct` entries have no wrapper and take the ambient timing
/// from context (see `act-core`'s `setTime`).
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum TimeWrap {
    Pre,
    Post,
}

/// The untyped expression tree.
#[derive(Debug, Clone, PartialEq)]
pub enum Expr {
    IntLit(BigInt, Span),
    BoolLit(bool, Span),
    ByteStrLit(String, Span),
    EnvVar(crate::token::EnvVar, Span),
    /// A bare identifier: resolved later to a calldata argument or, wrapped
    /// in `Entry`, to a storage slot.
    Var(String, Span),
    /// `name[idx]...` / `name.field` / `name at Contract`, optionally
    /// wrapped in `pre(...)`/`post(...)`.
    Entry {
        entry: RawEntry,
        time: Option<TimeWrap>,
    },
    Unary {
        op: UnOp,
        expr: Box<Expr>,
        span: Span,
    },
    Binary {
        op: BinOp,
        lhs: Box<Expr>,
        rhs: Box<Expr>,
        span: Span,
    },
    /// `if c then a else b`.
    Ite {
        cond: Box<Expr>,
        then_branch: Box<Expr>,
        else_branch: Box<Expr>,
        span: Span,
    },
    /// `e in range <typename>`: an explicit in-bounds predicate over the
    /// mathematical-integer model (spec's bitvector-free integer
    /// semantics), spelled with the two-keyword phrase `in range`.
    InRange {
        expr: Box<Expr>,
        ty: TypeName,
        span: Span,
    },
}

impl Expr {
    pub fn span(&self) -> Span {
        match self {
            Expr::IntLit(_, s)
            | Expr::BoolLit(_, s)
            | Expr::ByteStrLit(_, s)
            | Expr::EnvVar(_, s)
            | Expr::Var(_, s) => *s,
            Expr::Entry { entry, .. } => entry.span,
            Expr::Unary { span, .. }
            | Expr::Binary { span, .. }
            | Expr::Ite { span, .. }
            | Expr::InRange { span, .. } => *span,
        }
    }
}

/// A single element of a `storage` block: either a bare location
/// (read-only constraint, rhs is `None`) or a full update `loc => rhs`.
#[derive(Debug, Clone, PartialEq)]
pub struct RawRewrite {
    pub entry: RawEntry,
    pub rhs: Option<Expr>,
    pub span: Span,
}

/// The body of one case leaf (or of a direct, case-less behaviour).
#[derive(Debug, Clone, PartialEq)]
pub struct CaseLeaf {
    pub storage: Vec<RawRewrite>,
    pub returns: Option<Expr>,
    pub span: Span,
}

#[derive(Debug, Clone, PartialEq)]
pub enum RawCaseGuard {
    Wildcard,
    Cond(Expr),
}

#[derive(Debug, Clone, PartialEq)]
pub enum RawCaseBody {
    Leaf(CaseLeaf),
    /// Nested case branches (spec 4.2: "branches may nest").
    Nested(Vec<RawCase>),
}

#[derive(Debug, Clone, PartialEq)]
pub struct RawCase {
    pub guard: RawCaseGuard,
    pub body: RawCaseBody,
    pub span: Span,
}

/// A transition's case structure: either a single direct body (no `case`
/// keyword used at all — normalized at typecheck time into one wildcard
/// case) or an explicit list of cases.
#[derive(Debug, Clone, PartialEq)]
pub enum RawCases {
    Direct(CaseLeaf),
    Cases(Vec<RawCase>),
}

/// A source-level `behaviour ... of ...` block, before claim splitting.
#[derive(Debug, Clone, PartialEq)]
pub struct RawTransition {
    pub name: String,
    pub contract: String,
    pub interface: Interface,
    pub iff: Vec<Expr>,
    pub cases: RawCases,
    pub ensures: Vec<Expr>,
    pub span: Span,
}

/// One entry of a `creates` block.
#[derive(Debug, Clone, PartialEq)]
pub enum RawCreateAssign {
    Value {
        ty: TypeName,
        name: String,
        rhs: Expr,
        span: Span,
    },
    Mapping {
        ty_keys: Vec<TypeName>,
        ty_val: TypeName,
        name: String,
        entries: Vec<(Vec<Expr>, Expr)>,
        span: Span,
    },
    /// Struct-valued creates assignment. The grammar accepts it; every
    /// later stage rejects it with an internal error (spec §9: stubbed,
    /// half-implemented extension).
    Struct { name: String, span: Span },
}

/// A source-level `constructor of ...` block (the `Definition` alternative
/// of `RawBehaviour`).
#[derive(Debug, Clone, PartialEq)]
pub struct RawConstructor {
    pub contract: String,
    pub interface: Interface,
    pub iff: Vec<Expr>,
    pub ensures: Vec<Expr>,
    pub invariants: Vec<Expr>,
    pub creates: Vec<RawCreateAssign>,
    pub span: Span,
}

/// One top-level declaration: a behaviour transition or a constructor
/// definition (spec §4.2: `RawBehaviour` = `Transition | Definition`).
#[derive(Debug, Clone, PartialEq)]
pub enum RawBehaviour {
    Transition(RawTransition),
    Definition(RawConstructor),
}

/// A fully parsed source file: an ordered list of top-level declarations.
pub type RawProgram = Vec<RawBehaviour>;
