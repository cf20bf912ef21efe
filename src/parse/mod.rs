//! Lexer and recursive-descent parser.
//!
//! Grammar (whitespace-insensitive):
//!
//! ```text
//! program := stmt*
//! stmt    := name '=' expr
//!          | 'if' expr stmt* 'end'
//!          | 'while' expr stmt* 'end'
//! expr    := cmp
//! cmp     := sum (('<' | '>') sum)*
//! sum     := term (('+' | '-') term)*
//! term    := atom (('*' | '/') atom)*
//! atom    := '(' expr ')' | constant | name
//! ```
//!
//! Names are runs of ASCII alphanumerics; the single-character restriction
//! is a domain constraint enforced by the analyzer, not the parser.
//! Constants are decimal integers. All operators are left-associative.

use tracing::trace;

use crate::ast::{
    AssignmentStmt, BinaryExpr, BinaryOp, Constant, Expr, IfStmt, Name, ParenExpr, Program, Span,
    Stmt, StmtList, WhileStmt,
};
use crate::error::SyntaxError;

/// Byte-level cursor over source text.
///
/// `pre_ws_pos` remembers the position preceding the most recent run of
/// skipped whitespace; assignment spans end there, so they exclude the
/// whitespace trailing the right-hand side.
struct Lexer<'s> {
    input: &'s str,
    pos: usize,
    pre_ws_pos: usize,
}

impl<'s> Lexer<'s> {
    fn new(input: &'s str) -> Self {
        Self {
            input,
            pos: 0,
            pre_ws_pos: 0,
        }
    }

    fn peek(&self) -> Option<char> {
        self.input[self.pos..].chars().next()
    }

    fn bump(&mut self) -> Option<char> {
        let ch = self.peek()?;
        self.pos += ch.len_utf8();
        Some(ch)
    }

    fn eof(&self) -> bool {
        self.pos >= self.input.len()
    }

    fn skip_whitespace(&mut self) {
        if !self.peek().is_some_and(|c| c.is_whitespace()) {
            return;
        }
        self.pre_ws_pos = self.pos;
        while self.peek().is_some_and(|c| c.is_whitespace()) {
            self.bump();
        }
    }

    /// Read a (possibly empty) run of ASCII alphanumerics.
    fn read_name(&mut self) -> Name {
        self.skip_whitespace();
        let start = self.pos;
        while self.peek().is_some_and(|c| c.is_ascii_alphanumeric()) {
            self.bump();
        }
        Name {
            text: self.input[start..self.pos].to_string(),
            span: Span::new(start, self.pos),
        }
    }

    fn read_number(&mut self) -> Result<Constant, SyntaxError> {
        self.skip_whitespace();
        let start = self.pos;
        while self.peek().is_some_and(|c| c.is_ascii_digit()) {
            self.bump();
        }
        let value = self.input[start..self.pos]
            .parse::<i64>()
            .map_err(|_| SyntaxError::IntegerOutOfRange {
                start,
                end: self.pos,
            })?;
        Ok(Constant {
            value,
            span: Span::new(start, self.pos),
        })
    }
}

/// Parse a complete program. A stray `end` at top level is an error.
pub fn parse_program(source: &str) -> Result<Program, SyntaxError> {
    let mut lexer = Lexer::new(source);
    let statements = parse_stmt_list(&mut lexer, true)?;
    trace!(statements = statements.statements.len(), "parsed program");
    Ok(Program { statements })
}

/// Parse statements until EOF or a closing `end`.
///
/// The `end` token is consumed here; `error_on_end` rejects it at top
/// level where no construct is open.
fn parse_stmt_list(lx: &mut Lexer<'_>, error_on_end: bool) -> Result<StmtList, SyntaxError> {
    let mut list = StmtList::default();
    lx.skip_whitespace();
    while !lx.eof() {
        let name = lx.read_name();
        if name.text == "end" {
            if error_on_end {
                return Err(SyntaxError::UnexpectedEnd {
                    pos: name.span.start,
                });
            }
            break;
        }
        list.statements.push(parse_stmt(lx, name)?);
        lx.skip_whitespace();
    }
    Ok(list)
}

/// Parse the statement introduced by an already-read leading name.
fn parse_stmt(lx: &mut Lexer<'_>, name: Name) -> Result<Stmt, SyntaxError> {
    if name.text == "if" {
        let condition = parse_expr(lx)?;
        let then_block = parse_stmt_list(lx, false)?;
        return Ok(Stmt::If(IfStmt {
            condition: Box::new(condition),
            then_block,
        }));
    }
    if name.text == "while" {
        let condition = parse_expr(lx)?;
        let body = parse_stmt_list(lx, false)?;
        return Ok(Stmt::While(WhileStmt {
            condition: Box::new(condition),
            body,
        }));
    }

    lx.skip_whitespace();
    let at = lx.pos;
    match lx.bump() {
        None => Err(SyntaxError::UnexpectedEof),
        Some('=') => {
            let rhs = parse_expr(lx)?;
            let span = Span::new(name.span.start, lx.pre_ws_pos);
            Ok(Stmt::Assignment(AssignmentStmt {
                lhs: name,
                rhs: Box::new(rhs),
                span,
            }))
        }
        Some(_) => Err(SyntaxError::ExpectedToken {
            expected: '=',
            pos: at,
        }),
    }
}

fn parse_expr(lx: &mut Lexer<'_>) -> Result<Expr, SyntaxError> {
    lx.skip_whitespace();
    if lx.eof() {
        return Err(SyntaxError::UnexpectedEof);
    }
    parse_comparison(lx)
}

type Level = fn(&mut Lexer<'_>) -> Result<Expr, SyntaxError>;

/// One left-associative precedence level over single-character operators.
fn parse_binary_level(
    lx: &mut Lexer<'_>,
    ops: &[(char, BinaryOp)],
    next: Level,
) -> Result<Expr, SyntaxError> {
    let mut lhs = next(lx)?;
    lx.skip_whitespace();
    loop {
        let Some(ch) = lx.peek() else { break };
        let Some(&(_, op)) = ops.iter().find(|(c, _)| *c == ch) else {
            break;
        };
        let start = lx.pos;
        lx.bump();
        let rhs = next(lx)?;
        let span = Span::new(start, lx.pos);
        lhs = Expr::Binary(BinaryExpr {
            lhs: Box::new(lhs),
            rhs: Box::new(rhs),
            op,
            span,
        });
        lx.skip_whitespace();
    }
    Ok(lhs)
}

fn parse_comparison(lx: &mut Lexer<'_>) -> Result<Expr, SyntaxError> {
    parse_binary_level(lx, &[('<', BinaryOp::Lt), ('>', BinaryOp::Gt)], parse_sum)
}

fn parse_sum(lx: &mut Lexer<'_>) -> Result<Expr, SyntaxError> {
    parse_binary_level(lx, &[('+', BinaryOp::Add), ('-', BinaryOp::Sub)], parse_term)
}

fn parse_term(lx: &mut Lexer<'_>) -> Result<Expr, SyntaxError> {
    parse_binary_level(lx, &[('*', BinaryOp::Mul), ('/', BinaryOp::Div)], parse_atom)
}

fn parse_atom(lx: &mut Lexer<'_>) -> Result<Expr, SyntaxError> {
    lx.skip_whitespace();
    let Some(ch) = lx.peek() else {
        return Err(SyntaxError::UnexpectedEof);
    };
    if ch == '(' {
        let start = lx.pos;
        lx.bump();
        let expr = parse_expr(lx)?;
        lx.skip_whitespace();
        let at = lx.pos;
        return match lx.bump() {
            None => Err(SyntaxError::UnexpectedEof),
            Some(')') => Ok(Expr::Paren(ParenExpr {
                expr: Box::new(expr),
                span: Span::new(start, lx.pos),
            })),
            Some(_) => Err(SyntaxError::ExpectedToken {
                expected: ')',
                pos: at,
            }),
        };
    }
    if ch.is_ascii_digit() {
        return Ok(Expr::Constant(lx.read_number()?));
    }
    if ch.is_ascii_alphabetic() {
        return Ok(Expr::Name(lx.read_name()));
    }
    Err(SyntaxError::UnexpectedChar { ch, pos: lx.pos })
}
