//! Abstract syntax tree for the Go subset
//!
//! The tree is owned by exactly one pipeline stage at a time and handed
//! over by value; the rewrite passes consume a tree and return a new one.
//! Every node carries a span into the original buffer. The classifier
//! preserves buffer length, so these spans double as indices into the
//! untouched dialect source.

use crate::lexer::Comment;
use crate::span::Span;

/// A parsed source file (one compilation unit)
#[derive(Debug, Clone)]
pub struct SourceFile {
    pub package: Ident,
    pub decls: Vec<Decl>,
    /// Comments in source order; empty unless comment retention was on
    pub comments: Vec<Comment>,
    pub span: Span,
}

/// An identifier with its source span
#[derive(Debug, Clone, PartialEq)]
pub struct Ident {
    pub name: String,
    pub span: Span,
}

impl Ident {
    pub fn new(name: impl Into<String>, span: Span) -> Self {
        Self {
            name: name.into(),
            span,
        }
    }
}

// ============ Declarations ============

#[derive(Debug, Clone)]
pub enum Decl {
    Import(ImportDecl),
    Func(FuncDecl),
    Type(TypeDecl),
    Const(ValueDecl),
    Var(ValueDecl),
}

impl Decl {
    pub fn span(&self) -> Span {
        match self {
            Decl::Import(d) => d.span,
            Decl::Func(d) => d.span,
            Decl::Type(d) => d.span,
            Decl::Const(d) | Decl::Var(d) => d.span,
        }
    }
}

/// `import "fmt"` or an `import ( ... )` group
#[derive(Debug, Clone)]
pub struct ImportDecl {
    pub specs: Vec<ImportSpec>,
    pub grouped: bool,
    pub span: Span,
}

#[derive(Debug, Clone)]
pub struct ImportSpec {
    pub alias: Option<Ident>,
    /// Quoted path text, e.g. `"fmt"`
    pub path: String,
    pub span: Span,
}

/// Function or method declaration
#[derive(Debug, Clone)]
pub struct FuncDecl {
    pub recv: Option<Receiver>,
    pub name: Ident,
    pub sig: FuncSig,
    pub body: Block,
    pub span: Span,
}

/// Method receiver: `(a Vec)` or `(a *Vec)`
#[derive(Debug, Clone)]
pub struct Receiver {
    pub name: Ident,
    pub ty: TypeExpr,
    pub span: Span,
}

/// Parameters and results, shared by declarations and function literals
#[derive(Debug, Clone)]
pub struct FuncSig {
    pub params: Vec<ParamGroup>,
    pub results: Vec<TypeExpr>,
    pub span: Span,
}

/// One parameter group: `a, b, c Vec`
#[derive(Debug, Clone)]
pub struct ParamGroup {
    pub names: Vec<Ident>,
    pub ty: TypeExpr,
    pub span: Span,
}

/// `type Vec []float64`
#[derive(Debug, Clone)]
pub struct TypeDecl {
    pub name: Ident,
    pub ty: TypeExpr,
    pub span: Span,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum ValueKind {
    Const,
    Var,
}

/// `const x = 0` / `var x, y T = a, b`
#[derive(Debug, Clone)]
pub struct ValueDecl {
    pub kind: ValueKind,
    pub names: Vec<Ident>,
    pub ty: Option<TypeExpr>,
    pub values: Vec<Expr>,
    pub span: Span,
}

// ============ Types ============

#[derive(Debug, Clone)]
pub struct TypeExpr {
    pub kind: TypeKind,
    pub span: Span,
}

#[derive(Debug, Clone)]
pub enum TypeKind {
    /// `Vec`, `float64`
    Name(Ident),
    /// `os.Error`
    Qualified { pkg: Ident, name: Ident },
    /// `[]T`
    Slice(Box<TypeExpr>),
    /// `[N]T`
    Array { len: Box<Expr>, elem: Box<TypeExpr> },
    /// `*T`
    Pointer(Box<TypeExpr>),
    /// `map[K]V`
    Map {
        key: Box<TypeExpr>,
        value: Box<TypeExpr>,
    },
    /// `struct { ... }`
    Struct(Vec<ParamGroup>),
    /// `func(...) ...`
    Func(Box<FuncSig>),
}

// ============ Statements ============

#[derive(Debug, Clone)]
pub struct Block {
    pub stmts: Vec<Stmt>,
    pub span: Span,
}

#[derive(Debug, Clone)]
pub enum Stmt {
    Expr(Expr),
    Assign(AssignStmt),
    /// `x++` / `x--`
    IncDec { target: Expr, inc: bool, span: Span },
    Return { results: Vec<Expr>, span: Span },
    If(IfStmt),
    For(ForStmt),
    Block(Block),
    Branch { kind: BranchKind, span: Span },
    Go { call: Expr, span: Span },
    Defer { call: Expr, span: Span },
    /// `var`/`const`/`type` declaration in statement position
    Decl(Box<Decl>),
}

impl Stmt {
    pub fn span(&self) -> Span {
        match self {
            Stmt::Expr(e) => e.span,
            Stmt::Assign(a) => a.span,
            Stmt::IncDec { span, .. }
            | Stmt::Return { span, .. }
            | Stmt::Branch { span, .. }
            | Stmt::Go { span, .. }
            | Stmt::Defer { span, .. } => *span,
            Stmt::If(s) => s.span,
            Stmt::For(s) => s.span,
            Stmt::Block(b) => b.span,
            Stmt::Decl(d) => d.span(),
        }
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum BranchKind {
    Break,
    Continue,
}

/// Assignment, short variable declaration, or compound assignment.
/// `op_span` records where the operator token sits; for compound
/// assignments the rewriter inspects the original byte just before it.
#[derive(Debug, Clone)]
pub struct AssignStmt {
    pub lhs: Vec<Expr>,
    pub op: AssignOp,
    pub op_span: Span,
    pub rhs: Vec<Expr>,
    pub span: Span,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum AssignOp {
    /// `=`
    Assign,
    /// `:=`
    Define,
    Add,
    Sub,
    Mul,
    Div,
    Rem,
    And,
    Or,
    Xor,
    Shl,
    Shr,
    AndNot,
}

impl AssignOp {
    pub fn symbol(&self) -> &'static str {
        match self {
            AssignOp::Assign => "=",
            AssignOp::Define => ":=",
            AssignOp::Add => "+=",
            AssignOp::Sub => "-=",
            AssignOp::Mul => "*=",
            AssignOp::Div => "/=",
            AssignOp::Rem => "%=",
            AssignOp::And => "&=",
            AssignOp::Or => "|=",
            AssignOp::Xor => "^=",
            AssignOp::Shl => "<<=",
            AssignOp::Shr => ">>=",
            AssignOp::AndNot => "&^=",
        }
    }
}

#[derive(Debug, Clone)]
pub struct IfStmt {
    pub init: Option<Box<Stmt>>,
    pub cond: Expr,
    pub then: Block,
    /// Either a `Block` or another `If`
    pub els: Option<Box<Stmt>>,
    pub span: Span,
}

/// All three `for` forms: `for {}`, `for cond {}`, `for init; cond; post {}`
#[derive(Debug, Clone)]
pub struct ForStmt {
    pub init: Option<Box<Stmt>>,
    pub cond: Option<Expr>,
    pub post: Option<Box<Stmt>>,
    pub body: Block,
    pub span: Span,
}

// ============ Expressions ============

#[derive(Debug, Clone)]
pub struct Expr {
    pub kind: ExprKind,
    pub span: Span,
}

#[derive(Debug, Clone)]
pub enum ExprKind {
    Ident(Ident),
    /// Literal kept as source text; the preprocessor never evaluates it
    Lit { kind: LitKind, text: String },
    /// `Vec{1, 2, 3}`, `[]float64{...}`
    Composite {
        ty: Option<Box<TypeExpr>>,
        elems: Vec<Expr>,
    },
    /// `key: value` inside a composite literal
    KeyValue { key: Box<Expr>, value: Box<Expr> },
    Paren(Box<Expr>),
    /// `x.sel`
    Selector { x: Box<Expr>, sel: Ident },
    /// `x[i]`
    Index { x: Box<Expr>, index: Box<Expr> },
    /// `f(a, b)`; `spread` records a trailing `...`
    Call {
        fun: Box<Expr>,
        args: Vec<Expr>,
        spread: bool,
    },
    /// Binary expression; `op_span` is the oracle key for dialect detection
    Binary {
        op: BinOp,
        op_span: Span,
        x: Box<Expr>,
        y: Box<Expr>,
    },
    Unary { op: UnOp, x: Box<Expr> },
    /// `func(a int) int { ... }`
    FuncLit { sig: FuncSig, body: Block },
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum LitKind {
    Int,
    Float,
    String,
    Char,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum BinOp {
    Add,
    Sub,
    Mul,
    Div,
    Rem,
    And,
    Or,
    Xor,
    Shl,
    Shr,
    AndNot,
    LAnd,
    LOr,
    Eq,
    Ne,
    Lt,
    Le,
    Gt,
    Ge,
}

impl BinOp {
    pub fn symbol(&self) -> &'static str {
        match self {
            BinOp::Add => "+",
            BinOp::Sub => "-",
            BinOp::Mul => "*",
            BinOp::Div => "/",
            BinOp::Rem => "%",
            BinOp::And => "&",
            BinOp::Or => "|",
            BinOp::Xor => "^",
            BinOp::Shl => "<<",
            BinOp::Shr => ">>",
            BinOp::AndNot => "&^",
            BinOp::LAnd => "&&",
            BinOp::LOr => "||",
            BinOp::Eq => "==",
            BinOp::Ne => "!=",
            BinOp::Lt => "<",
            BinOp::Le => "<=",
            BinOp::Gt => ">",
            BinOp::Ge => ">=",
        }
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum UnOp {
    /// `-x`
    Neg,
    /// `+x`
    Pos,
    /// `!x`
    Not,
    /// `*x`
    Deref,
    /// `&x`
    Addr,
    /// `^x`
    BitNot,
}

impl UnOp {
    pub fn symbol(&self) -> &'static str {
        match self {
            UnOp::Neg => "-",
            UnOp::Pos => "+",
            UnOp::Not => "!",
            UnOp::Deref => "*",
            UnOp::Addr => "&",
            UnOp::BitNot => "^",
        }
    }
}
