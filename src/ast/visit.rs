//! Traits for visiting the syntax tree.

use super::{BinaryOp, Node, NodeKind, UnaryOp};
use crate::common::Real;
use crate::symbols::Symbol;

use std::rc::Rc;

/// Dispatches `node` to the matching visitor method.
pub fn descend_node<V: NodeVisitor + ?Sized>(visitor: &mut V, node: &Rc<Node>) {
    match &node.kind {
        NodeKind::Literal(value) => visitor.visit_literal(node, *value),
        NodeKind::Value(symbol) => visitor.visit_value(node, symbol),
        NodeKind::UnaryFunction(symbol, argument) => {
            visitor.visit_unary_function(node, symbol, argument)
        }
        NodeKind::UnaryOperator(op, operand) => visitor.visit_unary_operator(node, *op, operand),
        NodeKind::BinaryOperator(op, lhs, rhs) => visitor.visit_binary_operator(node, *op, lhs, rhs),
    }
}

/// Describes a syntax tree visitor.
///
/// Every method has a default implementation descending into children, so an
/// implementor only overrides the variants it cares about. `visit_node` is
/// the catch-all dispatch point.
pub trait NodeVisitor {
    /// Visits any node, dispatching on its variant.
    fn visit_node(&mut self, node: &Rc<Node>) {
        descend_node(self, node);
    }

    /// Visits a literal.
    fn visit_literal(&mut self, _node: &Rc<Node>, _value: Real) {}

    /// Visits a named value.
    fn visit_value(&mut self, _node: &Rc<Node>, _symbol: &Rc<Symbol>) {}

    /// Visits a unary function call.
    fn visit_unary_function(&mut self, _node: &Rc<Node>, _symbol: &Rc<Symbol>, argument: &Rc<Node>) {
        self.visit_node(argument);
    }

    /// Visits a unary operator.
    fn visit_unary_operator(&mut self, _node: &Rc<Node>, _op: UnaryOp, operand: &Rc<Node>) {
        self.visit_node(operand);
    }

    /// Visits a binary operator.
    fn visit_binary_operator(
        &mut self,
        _node: &Rc<Node>,
        _op: BinaryOp,
        lhs: &Rc<Node>,
        rhs: &Rc<Node>,
    ) {
        self.visit_node(lhs);
        self.visit_node(rhs);
    }
}
