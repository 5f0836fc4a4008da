//! Parsers turning source text into syntax trees and declarations.

mod expression;
mod script;

pub use expression::parse_expression;
pub(crate) use script::ScriptParser;

use crate::ast::{Node, NodeVisitor};
use crate::diagnostics::ParseError;
use crate::emit::{stringify, Notation};
use crate::scanner::{Token, TokenType, Tokenizer};

use std::rc::Rc;

/// A one-token-lookahead cursor shared by the parsers.
pub(crate) struct TokenCursor<'a> {
    tokenizer: Tokenizer<'a>,
    next: Token<'a>,
    last: Token<'a>,
}

impl<'a> TokenCursor<'a> {
    pub fn new(input: &'a str) -> Self {
        let mut tokenizer = Tokenizer::new(input);
        let next = tokenizer.next_token();
        Self {
            tokenizer,
            next,
            last: Token::new(TokenType::End, "", 0),
        }
    }

    /// The token about to be consumed.
    pub fn next(&self) -> &Token<'a> {
        &self.next
    }

    /// The most recently consumed token.
    pub fn last(&self) -> &Token<'a> {
        &self.last
    }

    /// Consumes the next token if it has the given type.
    pub fn accept(&mut self, ty: TokenType) -> bool {
        if self.next.ty == ty {
            self.last = std::mem::replace(&mut self.next, self.tokenizer.next_token());
            true
        } else {
            false
        }
    }

    /// Consumes the next token of the given type, or fails at its position.
    pub fn expect(&mut self, ty: TokenType, message: Option<&str>) -> Result<(), ParseError> {
        if self.accept(ty) {
            Ok(())
        } else {
            match message {
                Some(message) => self.fail(message.to_owned(), None),
                None => self.fail(format!("Unexpected '{}'", self.next.text), None),
            }
        }
    }

    /// Reports a parse failure, by default at the next token's position.
    pub fn fail<T>(&self, message: String, position: Option<usize>) -> Result<T, ParseError> {
        Err(ParseError::new(
            message,
            position.unwrap_or(self.next.pos),
        ))
    }
}

/// A parsed expression, or the parse failure it ended in.
///
/// An errored expression can still be passed around and queried; feeding it
/// into compilation raises a compile failure.
#[derive(Clone, Debug)]
pub struct Expression {
    data: Rc<ExpressionData>,
}

#[derive(Debug)]
struct ExpressionData {
    input: Rc<str>,
    root: Option<Rc<Node>>,
    error: Option<ParseError>,
}

impl Expression {
    pub(crate) fn ok(input: Rc<str>, root: Rc<Node>) -> Self {
        Self {
            data: Rc::new(ExpressionData {
                input,
                root: Some(root),
                error: None,
            }),
        }
    }

    pub(crate) fn errored(input: Rc<str>, error: ParseError) -> Self {
        Self {
            data: Rc::new(ExpressionData {
                input,
                root: None,
                error: Some(error),
            }),
        }
    }

    /// The text the expression was parsed from.
    pub fn input(&self) -> &str {
        &self.data.input
    }

    /// A shared handle on the source text, e.g. for provenance records.
    pub(crate) fn source(&self) -> Rc<str> {
        Rc::clone(&self.data.input)
    }

    pub fn is_ok(&self) -> bool {
        self.data.root.is_some()
    }

    pub fn root(&self) -> Option<&Rc<Node>> {
        self.data.root.as_ref()
    }

    pub fn error(&self) -> Option<&ParseError> {
        self.data.error.as_ref()
    }

    pub fn error_position(&self) -> Option<usize> {
        self.data.error.as_ref().map(|error| error.position)
    }

    /// Walks the syntax tree with `visitor`; returns whether a tree existed.
    pub fn visit<V: NodeVisitor>(&self, visitor: &mut V) -> bool {
        match self.root() {
            Some(root) => {
                visitor.visit_node(root);
                true
            }
            None => false,
        }
    }

    /// Stringifies the expression in the given notation, or `None` when the
    /// expression did not parse.
    pub fn stringify(&self, notation: Notation) -> Option<String> {
        self.root()
            .map(|root| stringify(root, self.input(), notation))
    }
}
