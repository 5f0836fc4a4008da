//! The abstract syntax tree produced by the expression parser.
//!
//! Every node stores two source spans: `inner` covers the token naming the
//! node itself (e.g. the operator character), `outer` the full extent of the
//! node including children and enclosing brackets. Diagnostics and program
//! comments are derived from the outer span.

pub mod visit;

pub use visit::*;

use crate::common::{Real, Span};
use crate::scanner::{Token, TokenType};
use crate::symbols::Symbol;

use std::rc::Rc;

/// An AST node.
#[derive(Debug)]
pub struct Node {
    pub kind: NodeKind,
    /// The token range naming the node itself.
    pub inner: Span,
    /// The full span of the node, including children and brackets.
    pub outer: Span,
}

impl Node {
    pub fn new(kind: NodeKind, inner: Span, outer: Span) -> Self {
        Self { kind, inner, outer }
    }
}

/// The variants of an AST node.
#[derive(Debug)]
pub enum NodeKind {
    /// A direct value.
    Literal(Real),

    /// A named value (constant, parameter, variable or sub-expression).
    Value(Rc<Symbol>),

    /// A call to a unary named function.
    UnaryFunction(Rc<Symbol>, Rc<Node>),

    /// A unary `+` or `-`.
    UnaryOperator(UnaryOp, Rc<Node>),

    /// A binary arithmetic operator.
    BinaryOperator(BinaryOp, Rc<Node>, Rc<Node>),
}

#[derive(PartialEq, Eq, Clone, Copy, Hash, Debug)]
pub enum UnaryOp {
    /// The plus operator `+X` (the identity).
    Plus,
    /// The minus operator `-X` (the negation).
    Minus,
}

impl TryFrom<&Token<'_>> for UnaryOp {
    type Error = ();

    fn try_from(token: &Token<'_>) -> Result<Self, Self::Error> {
        match token.ty {
            TokenType::Plus => Ok(UnaryOp::Plus),
            TokenType::Minus => Ok(UnaryOp::Minus),
            _ => Err(()),
        }
    }
}

#[derive(PartialEq, Eq, Clone, Copy, Hash, Debug)]
pub enum BinaryOp {
    /// `X+Y`
    Plus,
    /// `X-Y`
    Minus,
    /// `X*Y`
    Asterisk,
    /// `X/Y`
    Slash,
    /// `X^Y`
    Caret,
}

impl TryFrom<&Token<'_>> for BinaryOp {
    type Error = ();

    fn try_from(token: &Token<'_>) -> Result<Self, Self::Error> {
        match token.ty {
            TokenType::Plus => Ok(BinaryOp::Plus),
            TokenType::Minus => Ok(BinaryOp::Minus),
            TokenType::Asterisk => Ok(BinaryOp::Asterisk),
            TokenType::Slash => Ok(BinaryOp::Slash),
            TokenType::Caret => Ok(BinaryOp::Caret),
            _ => Err(()),
        }
    }
}
