use crate::Span;

use super::{expressions::Expr, types::TypeTag};

/// Statement node. Equality is structural and ignores the span.
#[derive(Debug, Clone)]
pub struct Stmt {
    pub kind: StmtKind,
    pub span: Span,
}

impl Stmt {
    pub fn new(kind: StmtKind, span: Span) -> Self {
        Stmt { kind, span }
    }
}

impl PartialEq for Stmt {
    fn eq(&self, other: &Self) -> bool {
        self.kind == other.kind
    }
}

#[derive(Debug, Clone, PartialEq)]
pub enum StmtKind {
    VarDecl(VarDeclStmt),
    /// `x = v;` or, with an index, `xs[i] = v;`. Never introduces a binding.
    Assignment {
        identifier: String,
        index: Option<Expr>,
        value: Expr,
    },
    Block(BlockStmt),
    /// The else slot holds either a `Block` or a nested `If` (elif chains).
    If {
        condition: Expr,
        then_body: BlockStmt,
        else_body: Option<Box<Stmt>>,
    },
    While {
        condition: Expr,
        body: BlockStmt,
    },
    For {
        init: Option<Box<Stmt>>,
        condition: Option<Expr>,
        increment: Option<Box<Stmt>>,
        body: BlockStmt,
    },
    FnDecl(FnDeclStmt),
    Return(Option<Expr>),
    /// `print value;` writes the value and a newline to stdout.
    Print(Expr),
    Break,
    Continue,
    Expression(Expr),
}

/// A braced statement list. Opens exactly one lexical scope.
#[derive(Debug, Clone, PartialEq)]
pub struct BlockStmt {
    pub body: Vec<Stmt>,
}

#[derive(Debug, Clone, PartialEq)]
pub struct VarDeclStmt {
    pub identifier: String,
    pub var_type: TypeTag,
    /// Element count for `let xs: T[N]`.
    pub array_size: Option<u32>,
    pub assigned_value: Option<Expr>,
}

#[derive(Debug, Clone, PartialEq)]
pub struct FnDeclStmt {
    pub identifier: String,
    pub parameters: Vec<(String, TypeTag)>,
    pub return_type: TypeTag,
    pub body: BlockStmt,
}
