//! Stringification of parsed expressions.

use crate::ast::{BinaryOp, Node, NodeKind, NodeVisitor, UnaryOp};
use crate::common::Real;
use crate::symbols::Symbol;

use std::rc::Rc;

/// The notation an expression is stringified in.
#[derive(PartialEq, Eq, Copy, Clone, Debug)]
pub enum Notation {
    /// The infix (algebraic) notation.
    Infix,
    /// The prefix (Polish) notation; parenthesis-free.
    Prefix,
    /// The postfix (reverse Polish) notation; parenthesis-free.
    Postfix,
}

/// Stringifies `root` in the given notation.
///
/// `source` must be the text the node was parsed from; literals and operators
/// are reproduced from their source spans.
pub fn stringify(root: &Rc<Node>, source: &str, notation: Notation) -> String {
    let mut stringifier = Stringifier {
        source,
        notation,
        out: String::new(),
    };
    stringifier.visit_node(root);
    stringifier.out
}

// The operator priority table used for parenthesization.
// The sign encodes associativity: positive operators reassociate freely,
// negative ones do not.
fn priority(node: &Node) -> i32 {
    match node.kind {
        NodeKind::BinaryOperator(op, ..) => match op {
            BinaryOp::Caret => -1,
            BinaryOp::Slash => -2,
            BinaryOp::Asterisk => 2,
            BinaryOp::Minus => -3,
            BinaryOp::Plus => 3,
        },
        _ => 0,
    }
}

struct Stringifier<'a> {
    source: &'a str,
    notation: Notation,
    out: String,
}

impl Stringifier<'_> {
    fn push(&mut self, text: &str) {
        if self.notation != Notation::Infix && !self.out.is_empty() {
            self.out.push(' ');
        }
        self.out.push_str(text);
    }

    fn inner_text(&self, node: &Node) -> String {
        node.inner.over(self.source).to_owned()
    }
}

impl NodeVisitor for Stringifier<'_> {
    fn visit_literal(&mut self, node: &Rc<Node>, _value: Real) {
        let text = self.inner_text(node);
        self.push(&text);
    }

    fn visit_value(&mut self, _node: &Rc<Node>, symbol: &Rc<Symbol>) {
        self.push(symbol.name());
    }

    fn visit_unary_function(&mut self, _node: &Rc<Node>, symbol: &Rc<Symbol>, argument: &Rc<Node>) {
        match self.notation {
            Notation::Infix => {
                self.push(&format!("{}(", symbol.name()));
                self.visit_node(argument);
                self.push(")");
            }
            Notation::Prefix => {
                self.push(symbol.name());
                self.visit_node(argument);
            }
            Notation::Postfix => {
                self.visit_node(argument);
                self.push(symbol.name());
            }
        }
    }

    fn visit_unary_operator(&mut self, node: &Rc<Node>, _op: UnaryOp, operand: &Rc<Node>) {
        match self.notation {
            Notation::Infix => {
                let text = self.inner_text(node);
                self.push(&text);
                let needs_parens = priority(operand).abs() >= 3;
                if needs_parens {
                    self.push("(");
                }
                self.visit_node(operand);
                if needs_parens {
                    self.push(")");
                }
            }
            Notation::Prefix => {
                let text = format!("u{}", self.inner_text(node));
                self.push(&text);
                self.visit_node(operand);
            }
            Notation::Postfix => {
                self.visit_node(operand);
                let text = format!("u{}", self.inner_text(node));
                self.push(&text);
            }
        }
    }

    fn visit_binary_operator(
        &mut self,
        node: &Rc<Node>,
        _op: BinaryOp,
        lhs: &Rc<Node>,
        rhs: &Rc<Node>,
    ) {
        if self.notation == Notation::Infix {
            let prio = priority(node);
            let left_prio = priority(lhs);
            let right_prio = priority(rhs);
            let parens_left = left_prio.abs() > prio.abs();
            let parens_right =
                right_prio.abs() > prio.abs() || (right_prio.abs() == prio.abs() && prio < 0);
            if parens_left {
                self.push("(");
            }
            self.visit_node(lhs);
            if parens_left {
                self.push(")");
            }
            let text = format!(" {} ", self.inner_text(node));
            self.push(&text);
            if parens_right {
                self.push("(");
            }
            self.visit_node(rhs);
            if parens_right {
                self.push(")");
            }
        } else {
            if self.notation == Notation::Prefix {
                let text = self.inner_text(node);
                self.push(&text);
            }
            self.visit_node(lhs);
            self.visit_node(rhs);
            if self.notation == Notation::Postfix {
                let text = self.inner_text(node);
                self.push(&text);
            }
        }
    }
}
