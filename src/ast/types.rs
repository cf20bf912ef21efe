//! AST type definitions.
//!
//! The analyzed language is deliberately tiny: integer constants,
//! variables, six binary operators, assignment, `if`, and `while`. Every
//! node carries a byte span into the original source for diagnostics.
//!
//! All node kinds are closed enums. Walkers are exhaustive `match`es, so
//! adding a node kind is a compile-time-checked change at every use site
//! rather than a silently inherited no-op.

use std::fmt;

use serde::{Deserialize, Serialize};

/// A byte range into the original source text.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub struct Span {
    /// Offset of the first byte.
    pub start: usize,
    /// Offset one past the last byte.
    pub end: usize,
}

impl Span {
    #[inline]
    pub fn new(start: usize, end: usize) -> Self {
        Self { start, end }
    }

    /// The slice of `source` this span covers.
    pub fn slice<'s>(&self, source: &'s str) -> &'s str {
        &source[self.start..self.end]
    }
}

impl fmt::Display for Span {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}..{}", self.start, self.end)
    }
}

/// A variable reference or assignment target.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct Name {
    pub text: String,
    pub span: Span,
}

/// An integer literal.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct Constant {
    pub value: i64,
    pub span: Span,
}

/// Binary operator.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum BinaryOp {
    Add,
    Sub,
    Mul,
    Div,
    Lt,
    Gt,
}

impl BinaryOp {
    /// Operator as written in source.
    pub fn symbol(&self) -> &'static str {
        match self {
            BinaryOp::Add => "+",
            BinaryOp::Sub => "-",
            BinaryOp::Mul => "*",
            BinaryOp::Div => "/",
            BinaryOp::Lt => "<",
            BinaryOp::Gt => ">",
        }
    }
}

/// A parenthesized subexpression.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct ParenExpr {
    pub expr: Box<Expr>,
    pub span: Span,
}

/// A binary operation. The span starts at the operator and ends after the
/// right-hand operand.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct BinaryExpr {
    pub lhs: Box<Expr>,
    pub rhs: Box<Expr>,
    pub op: BinaryOp,
    pub span: Span,
}

/// Expression forms.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub enum Expr {
    Name(Name),
    Constant(Constant),
    Paren(ParenExpr),
    Binary(BinaryExpr),
}

impl Expr {
    pub fn span(&self) -> Span {
        match self {
            Expr::Name(n) => n.span,
            Expr::Constant(c) => c.span,
            Expr::Paren(p) => p.span,
            Expr::Binary(b) => b.span,
        }
    }

    /// Invoke `f` for every name read by this expression, left to right.
    pub fn for_each_name<F: FnMut(&Name)>(&self, f: &mut F) {
        match self {
            Expr::Name(n) => f(n),
            Expr::Constant(_) => {}
            Expr::Paren(p) => p.expr.for_each_name(f),
            Expr::Binary(b) => {
                b.lhs.for_each_name(f);
                b.rhs.for_each_name(f);
            }
        }
    }
}

impl fmt::Display for Expr {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Expr::Name(n) => f.write_str(&n.text),
            Expr::Constant(c) => write!(f, "{}", c.value),
            Expr::Paren(p) => write!(f, "({})", p.expr),
            Expr::Binary(b) => write!(f, "{} {} {}", b.lhs, b.op.symbol(), b.rhs),
        }
    }
}

/// `lhs = rhs`. The span runs from the first byte of the target name to
/// the last non-whitespace byte of the right-hand side.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct AssignmentStmt {
    pub lhs: Name,
    pub rhs: Box<Expr>,
    pub span: Span,
}

/// `if condition ... end`. There is no `else`.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct IfStmt {
    pub condition: Box<Expr>,
    pub then_block: StmtList,
}

/// `while condition ... end`.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct WhileStmt {
    pub condition: Box<Expr>,
    pub body: StmtList,
}

/// Statement forms.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub enum Stmt {
    Assignment(AssignmentStmt),
    If(IfStmt),
    While(WhileStmt),
}

impl Stmt {
    /// Invoke `f` for every name in this statement, assignment targets
    /// included.
    pub fn for_each_name<F: FnMut(&Name)>(&self, f: &mut F) {
        match self {
            Stmt::Assignment(a) => {
                f(&a.lhs);
                a.rhs.for_each_name(f);
            }
            Stmt::If(s) => {
                s.condition.for_each_name(f);
                s.then_block.for_each_name(f);
            }
            Stmt::While(s) => {
                s.condition.for_each_name(f);
                s.body.for_each_name(f);
            }
        }
    }
}

/// Ordered statement sequence.
#[derive(Debug, Clone, PartialEq, Eq, Default, Serialize, Deserialize)]
pub struct StmtList {
    pub statements: Vec<Stmt>,
}

impl StmtList {
    pub fn for_each_name<F: FnMut(&Name)>(&self, f: &mut F) {
        for stmt in &self.statements {
            stmt.for_each_name(f);
        }
    }
}

/// A whole parsed program.
#[derive(Debug, Clone, PartialEq, Eq, Default, Serialize, Deserialize)]
pub struct Program {
    pub statements: StmtList,
}

impl Program {
    /// Invoke `f` for every name anywhere in the program, assignment
    /// targets included.
    pub fn for_each_name<F: FnMut(&Name)>(&self, f: &mut F) {
        self.statements.for_each_name(f);
    }
}
