//! Traits for visiting the semantic graph.

use super::{Group, RcTerm, TermKind};
use crate::common::{Real, RealFn};

/// Dispatches `term` to the matching visitor method.
pub fn descend_term<V: TermVisitor + ?Sized>(visitor: &mut V, term: &RcTerm) {
    match term.kind() {
        TermKind::Constant(value) => visitor.visit_constant(term, *value),
        TermKind::Input(name) => visitor.visit_input(term, name),
        TermKind::Output(name, child) => visitor.visit_output(term, name, child),
        TermKind::Sequence(terms) => visitor.visit_sequence(term, terms),
        TermKind::UnaryFunction(fun, argument) => visitor.visit_unary_function(term, *fun, argument),
        TermKind::Addition(group) => visitor.visit_addition(term, group),
        TermKind::Multiplication(group) => visitor.visit_multiplication(term, group),
        TermKind::Exponentiation(base, exponent) => {
            visitor.visit_exponentiation(term, base, exponent)
        }
        TermKind::Squaring(base) => visitor.visit_squaring(term, base),
    }
}

/// Descends into the children of a group, positives first.
pub fn descend_group<V: TermVisitor + ?Sized>(visitor: &mut V, group: &Group) {
    for term in group.positive().iter().chain(group.negative()) {
        visitor.visit_term(term);
    }
}

/// Describes a semantic graph visitor with one method per term variant.
pub trait TermVisitor {
    /// Visits any term, dispatching on its variant.
    fn visit_term(&mut self, term: &RcTerm) {
        descend_term(self, term);
    }

    fn visit_constant(&mut self, _term: &RcTerm, _value: Real) {}

    fn visit_input(&mut self, _term: &RcTerm, _name: &str) {}

    fn visit_output(&mut self, _term: &RcTerm, _name: &str, child: &RcTerm) {
        self.visit_term(child);
    }

    fn visit_sequence(&mut self, _term: &RcTerm, terms: &[RcTerm]) {
        for term in terms {
            self.visit_term(term);
        }
    }

    fn visit_unary_function(&mut self, _term: &RcTerm, _fun: RealFn, argument: &RcTerm) {
        self.visit_term(argument);
    }

    fn visit_addition(&mut self, _term: &RcTerm, group: &Group) {
        descend_group(self, group);
    }

    fn visit_multiplication(&mut self, _term: &RcTerm, group: &Group) {
        descend_group(self, group);
    }

    fn visit_exponentiation(&mut self, _term: &RcTerm, base: &RcTerm, exponent: &RcTerm) {
        self.visit_term(base);
        self.visit_term(exponent);
    }

    fn visit_squaring(&mut self, _term: &RcTerm, base: &RcTerm) {
        self.visit_term(base);
    }
}
