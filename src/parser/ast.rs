// AST (Abstract Syntax Tree) definitions for the Lemon front end
//
// Every node owns its children. The only cross-tree links are the
// `File::dependencies` module ids filled in by the resolver, which index into
// a `resolver::Program` and never own the module they name.

use super::lexer::TokenKind;
use crate::parser::parse::ParseError;
use crate::resolver::ModuleId;
use serde::Serialize;

/// Array-literal index recorded for entries without an explicit `[N] =` tag.
pub const UNTAGGED: i64 = -1;

/// Source location information for error reporting
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default, Serialize)]
pub struct SourceLocation {
    pub line: usize,
    pub column: usize,
}

impl SourceLocation {
    pub fn new(line: usize, column: usize) -> Self {
        Self { line, column }
    }
}

/// Type chain: pointers and arrays wrap an inner type, the tail is a `Base`.
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub enum Type {
    Base(String),
    Pointer(Box<Type>),
    /// `len` may be zero here; rejecting it is left to semantic analysis.
    Array { len: u64, element: Box<Type> },
}

impl Type {
    pub fn base(name: impl Into<String>) -> Self {
        Type::Base(name.into())
    }

    pub fn pointer(inner: Type) -> Self {
        Type::Pointer(Box::new(inner))
    }

    pub fn array(len: u64, element: Type) -> Self {
        Type::Array {
            len,
            element: Box::new(element),
        }
    }
}

/// Struct member
#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct Member {
    pub name: String,
    pub typ: Type,
    pub public: bool,
    pub location: SourceLocation,
}

/// Function parameter
#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct Param {
    pub name: String,
    pub typ: Type,
    pub mutable: bool,
    pub location: SourceLocation,
}

/// Declarations. Structs are user-defined types (UDTs).
#[derive(Debug, Clone, PartialEq, Serialize)]
pub enum Decl {
    Struct {
        name: String,
        members: Vec<Member>,
        public: bool,
        location: SourceLocation,
    },
    Function {
        name: String,
        params: Vec<Param>,
        ret: Option<Type>, // None for `return void`
        receiver: Option<Type>,
        body: Block,
        public: bool,
        location: SourceLocation,
    },
    Variable {
        name: String,
        vartype: Type,
        value: Expr,
        mutable: bool,
        public: bool,
        location: SourceLocation,
    },
}

impl Decl {
    pub fn name(&self) -> &str {
        match self {
            Decl::Struct { name, .. } | Decl::Function { name, .. } | Decl::Variable { name, .. } => {
                name
            }
        }
    }

    pub fn is_public(&self) -> bool {
        match self {
            Decl::Struct { public, .. }
            | Decl::Function { public, .. }
            | Decl::Variable { public, .. } => *public,
        }
    }

    pub fn set_public(&mut self, value: bool) {
        match self {
            Decl::Struct { public, .. }
            | Decl::Function { public, .. }
            | Decl::Variable { public, .. } => *public = value,
        }
    }

    pub fn location(&self) -> &SourceLocation {
        match self {
            Decl::Struct { location, .. }
            | Decl::Function { location, .. }
            | Decl::Variable { location, .. } => location,
        }
    }
}

/// `{ ... }` statement; also the body of functions, loops, branches and cases
#[derive(Debug, Clone, PartialEq, Default, Serialize)]
pub struct Block {
    pub fiats: Vec<Fiat>,
    pub location: SourceLocation,
}

/// Initializer clause of a for-loop
#[derive(Debug, Clone, PartialEq, Serialize)]
pub enum ForInit {
    Decl(Box<Decl>),
    Expr(Expr),
}

/// One `case`/`default` arm of a switch
#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct Test {
    pub cond: Option<Expr>, // None for the default case
    pub pass: Block,
    pub location: SourceLocation,
}

/// Statements
#[derive(Debug, Clone, PartialEq, Serialize)]
pub enum Stmt {
    Expr {
        expr: Expr,
        location: SourceLocation,
    },
    Block(Block),
    For {
        init: ForInit,
        cond: Expr,
        post: Expr,
        body: Block,
        location: SourceLocation,
    },
    While {
        cond: Expr,
        body: Block,
        location: SourceLocation,
    },
    Switch {
        controller: Expr,
        tests: Vec<Test>,
        location: SourceLocation,
    },
    /// `if`; `fail` is either another `Branch` or a `Block`
    Branch {
        shortvar: Option<Box<Decl>>,
        cond: Expr,
        pass: Block,
        fail: Option<Box<Stmt>>,
        location: SourceLocation,
    },
    Return {
        value: Option<Expr>,
        location: SourceLocation,
    },
    Break {
        location: SourceLocation,
    },
    Continue {
        location: SourceLocation,
    },
    Goto {
        label: String,
        location: SourceLocation,
    },
    Label {
        name: String,
        location: SourceLocation,
    },
    Fallthrough {
        location: SourceLocation,
    },
    Import {
        alias: String,
        location: SourceLocation,
    },
}

impl Stmt {
    pub fn location(&self) -> &SourceLocation {
        match self {
            Stmt::Block(block) => &block.location,
            Stmt::Expr { location, .. }
            | Stmt::For { location, .. }
            | Stmt::While { location, .. }
            | Stmt::Switch { location, .. }
            | Stmt::Branch { location, .. }
            | Stmt::Return { location, .. }
            | Stmt::Break { location }
            | Stmt::Continue { location }
            | Stmt::Goto { location, .. }
            | Stmt::Label { location, .. }
            | Stmt::Fallthrough { location }
            | Stmt::Import { location, .. } => location,
        }
    }
}

/// Expressions. Binary and unary nodes keep the operator token kind verbatim.
#[derive(Debug, Clone, PartialEq, Serialize)]
pub enum Expr {
    Assignment {
        lvalue: Box<Expr>,
        rvalue: Box<Expr>,
        location: SourceLocation,
    },
    Binary {
        op: TokenKind,
        left: Box<Expr>,
        right: Box<Expr>,
        location: SourceLocation,
    },
    Unary {
        op: TokenKind,
        operand: Box<Expr>,
        location: SourceLocation,
    },
    Cast {
        target: Type,
        operand: Box<Expr>,
        location: SourceLocation,
    },
    Call {
        callee: Box<Expr>,
        args: Vec<Expr>,
        location: SourceLocation,
    },
    Selector {
        name: Box<Expr>,
        attr: String,
        location: SourceLocation,
    },
    Index {
        name: Box<Expr>,
        key: Box<Expr>,
        location: SourceLocation,
    },
    /// `indices` and `values` are parallel; untagged entries hold [`UNTAGGED`]
    ArrayLit {
        indices: Vec<i64>,
        values: Vec<Expr>,
        location: SourceLocation,
    },
    /// Random-variable literal `dist ~ (args)`
    RvarLit {
        dist: String,
        args: Vec<Expr>,
        location: SourceLocation,
    },
    Lit {
        rep: String,
        kind: TokenKind,
        location: SourceLocation,
    },
    Ident {
        name: String,
        location: SourceLocation,
    },
}

impl Expr {
    /// Get the source location of this node
    pub fn location(&self) -> &SourceLocation {
        match self {
            Expr::Assignment { location, .. }
            | Expr::Binary { location, .. }
            | Expr::Unary { location, .. }
            | Expr::Cast { location, .. }
            | Expr::Call { location, .. }
            | Expr::Selector { location, .. }
            | Expr::Index { location, .. }
            | Expr::ArrayLit { location, .. }
            | Expr::RvarLit { location, .. }
            | Expr::Lit { location, .. }
            | Expr::Ident { location, .. } => location,
        }
    }
}

/// Unit stored in blocks and at file scope.
///
/// `Invalid` stands in for a fiat the parser could not build; it marks where
/// error recovery resynchronized.
#[derive(Debug, Clone, PartialEq, Serialize)]
pub enum Fiat {
    Decl(Decl),
    Stmt(Stmt),
    Invalid { location: SourceLocation },
}

impl Fiat {
    /// Number of `Invalid` fiats at or below this one.
    pub fn invalid_count(&self) -> usize {
        match self {
            Fiat::Invalid { .. } => 1,
            Fiat::Decl(decl) => decl_invalid_count(decl),
            Fiat::Stmt(stmt) => stmt_invalid_count(stmt),
        }
    }
}

impl Block {
    pub fn invalid_count(&self) -> usize {
        self.fiats.iter().map(Fiat::invalid_count).sum()
    }
}

fn decl_invalid_count(decl: &Decl) -> usize {
    match decl {
        Decl::Function { body, .. } => body.invalid_count(),
        Decl::Struct { .. } | Decl::Variable { .. } => 0,
    }
}

fn stmt_invalid_count(stmt: &Stmt) -> usize {
    match stmt {
        Stmt::Block(block) => block.invalid_count(),
        Stmt::For { body, .. } | Stmt::While { body, .. } => body.invalid_count(),
        Stmt::Switch { tests, .. } => tests.iter().map(|t| t.pass.invalid_count()).sum(),
        Stmt::Branch { pass, fail, .. } => {
            pass.invalid_count() + fail.as_deref().map_or(0, stmt_invalid_count)
        }
        _ => 0,
    }
}

/// Raw import recorded by the parser
#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct Import {
    pub alias: String,
    pub location: SourceLocation,
}

/// Root node of every AST: one per source file.
#[derive(Debug, Clone, PartialEq, Default, Serialize)]
pub struct File {
    pub name: String,
    pub fiats: Vec<Fiat>,
    pub imports: Vec<Import>,
    /// Filled by the resolver, parallel to `imports`; never owning.
    pub dependencies: Vec<ModuleId>,
    #[serde(skip)]
    pub diagnostics: Vec<ParseError>,
}

impl File {
    pub fn new(name: impl Into<String>) -> Self {
        File {
            name: name.into(),
            ..Default::default()
        }
    }

    pub fn error_count(&self) -> usize {
        self.diagnostics.len()
    }

    /// Top-level declarations, in source order.
    pub fn declarations(&self) -> impl Iterator<Item = &Decl> + '_ {
        self.fiats.iter().filter_map(|fiat| match fiat {
            Fiat::Decl(decl) => Some(decl),
            _ => None,
        })
    }

    /// Number of `Invalid` fiats anywhere in the tree.
    pub fn invalid_count(&self) -> usize {
        self.fiats.iter().map(Fiat::invalid_count).sum()
    }
}
