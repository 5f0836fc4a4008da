//! The Abstract Semantic Graph (ASG): a maximally-shared DAG of algebraic
//! terms.
//!
//! Terms are immutable once built and shared through `Rc`; rewriting passes
//! allocate new terms instead of mutating old ones. Every term lazily caches
//! its depth (longest path to a leaf) and its canonical structural key;
//! equal keys mean semantically identical sub-expressions modulo the
//! implemented rewrites.

pub mod transform;
pub mod transforms;
pub mod visit;

pub use visit::*;

use crate::ast;
use crate::common::{Real, RealFn};

use std::cell::OnceCell;
use std::fmt::Write;
use std::rc::Rc;

/// A shared term of the graph.
pub type RcTerm = Rc<Term>;

/// Where a term came from: a node of the syntax tree it was lowered from,
/// together with the source text the node's spans index into.
#[derive(Clone, Debug)]
pub struct Provenance {
    pub node: Rc<ast::Node>,
    pub source: Rc<str>,
}

impl Provenance {
    /// The full source text of the originating node.
    pub fn outer_text(&self) -> &str {
        self.node.outer.over(&self.source)
    }
}

/// A term of the Abstract Semantic Graph.
#[derive(Debug)]
pub struct Term {
    kind: TermKind,
    depth: OnceCell<usize>,
    key: OnceCell<String>,
    provenance: OnceCell<Provenance>,
}

/// The variants of a term.
#[derive(Debug)]
pub enum TermKind {
    /// A literal value; `-0` is normalized to `+0`.
    Constant(Real),

    /// A run-time variable, read from program memory.
    Input(String),

    /// A named root producing one result value.
    Output(String, RcTerm),

    /// An unordered bag of roots: the program's output set.
    Sequence(Vec<RcTerm>),

    /// A call to a unary real function.
    UnaryFunction(RealFn, RcTerm),

    /// An n-ary additive group.
    Addition(Group),

    /// An n-ary multiplicative group.
    Multiplication(Group),

    /// `base ^ exponent`.
    Exponentiation(RcTerm, RcTerm),

    /// `base * base`, produced by exponent expansion.
    Squaring(RcTerm),
}

/// The two group operation flavors.
#[derive(Copy, Clone, PartialEq, Eq, Debug)]
pub enum GroupOp {
    Addition,
    Multiplication,
}

impl GroupOp {
    /// The neutral element of the operation.
    pub fn identity(self) -> Real {
        match self {
            GroupOp::Addition => 0.0,
            GroupOp::Multiplication => 1.0,
        }
    }

    /// The absorbing element, if the operation has one.
    pub fn null_element(self) -> Option<Real> {
        match self {
            GroupOp::Addition => None,
            GroupOp::Multiplication => Some(0.0),
        }
    }

    pub fn apply(self, left: Real, right: Real) -> Real {
        match self {
            GroupOp::Addition => left + right,
            GroupOp::Multiplication => left * right,
        }
    }

    pub fn apply_inverse(self, left: Real, right: Real) -> Real {
        match self {
            GroupOp::Addition => left - right,
            GroupOp::Multiplication => left / right,
        }
    }

    /// The signs used in canonical keys and dumps.
    pub fn signs(self) -> (char, char) {
        match self {
            GroupOp::Addition => ('+', '-'),
            GroupOp::Multiplication => ('*', '/'),
        }
    }
}

/// The shared shape of an n-ary group operation: a constant term, a list of
/// positive-sign children and a list of negative-sign children.
#[derive(Debug)]
pub struct Group {
    constant: RcTerm,
    positive: Vec<RcTerm>,
    negative: Vec<RcTerm>,
}

impl Group {
    /// Builds a group; a missing or non-constant `constant` is replaced by
    /// the operation's identity.
    pub fn new(
        op: GroupOp,
        constant: Option<RcTerm>,
        positive: Vec<RcTerm>,
        negative: Vec<RcTerm>,
    ) -> Self {
        let constant = match constant {
            Some(term) if matches!(term.kind(), TermKind::Constant(_)) => term,
            _ => Term::constant(op.identity()),
        };
        Self {
            constant,
            positive,
            negative,
        }
    }

    pub fn constant(&self) -> &RcTerm {
        &self.constant
    }

    /// The value of the constant term.
    pub fn constant_value(&self) -> Real {
        match self.constant.kind() {
            TermKind::Constant(value) => *value,
            _ => unreachable!("group constants are Constant terms by construction"),
        }
    }

    pub fn positive(&self) -> &[RcTerm] {
        &self.positive
    }

    pub fn negative(&self) -> &[RcTerm] {
        &self.negative
    }
}

impl Term {
    fn make(kind: TermKind) -> RcTerm {
        Rc::new(Term {
            kind,
            depth: OnceCell::new(),
            key: OnceCell::new(),
            provenance: OnceCell::new(),
        })
    }

    pub fn constant(value: Real) -> RcTerm {
        // convert -0 to +0
        Self::make(TermKind::Constant(if value == 0.0 { 0.0 } else { value }))
    }

    pub fn input<N: Into<String>>(name: N) -> RcTerm {
        Self::make(TermKind::Input(name.into()))
    }

    pub fn output<N: Into<String>>(name: N, term: RcTerm) -> RcTerm {
        Self::make(TermKind::Output(name.into(), term))
    }

    pub fn sequence(terms: Vec<RcTerm>) -> RcTerm {
        Self::make(TermKind::Sequence(terms))
    }

    pub fn unary_function(fun: RealFn, argument: RcTerm) -> RcTerm {
        Self::make(TermKind::UnaryFunction(fun, argument))
    }

    pub fn addition(group: Group) -> RcTerm {
        Self::make(TermKind::Addition(group))
    }

    pub fn multiplication(group: Group) -> RcTerm {
        Self::make(TermKind::Multiplication(group))
    }

    pub fn group(op: GroupOp, group: Group) -> RcTerm {
        match op {
            GroupOp::Addition => Self::addition(group),
            GroupOp::Multiplication => Self::multiplication(group),
        }
    }

    pub fn exponentiation(base: RcTerm, exponent: RcTerm) -> RcTerm {
        Self::make(TermKind::Exponentiation(base, exponent))
    }

    pub fn squaring(base: RcTerm) -> RcTerm {
        Self::make(TermKind::Squaring(base))
    }

    pub fn kind(&self) -> &TermKind {
        &self.kind
    }

    /// The group payload of an additive or multiplicative term.
    pub fn as_group(&self) -> Option<(GroupOp, &Group)> {
        match &self.kind {
            TermKind::Addition(group) => Some((GroupOp::Addition, group)),
            TermKind::Multiplication(group) => Some((GroupOp::Multiplication, group)),
            _ => None,
        }
    }

    pub(crate) fn as_addition(&self) -> Option<&Group> {
        match &self.kind {
            TermKind::Addition(group) => Some(group),
            _ => None,
        }
    }

    pub fn provenance(&self) -> Option<&Provenance> {
        self.provenance.get()
    }

    /// Records the term's provenance; at most the first record sticks.
    pub fn set_provenance(&self, provenance: Provenance) {
        let _ = self.provenance.set(provenance);
    }

    /// The longest path from this term to any leaf; leaves have depth 0.
    pub fn depth(&self) -> usize {
        *self.depth.get_or_init(|| match &self.kind {
            TermKind::Constant(_) | TermKind::Input(_) => 0,
            TermKind::Output(_, term) => 1 + term.depth(),
            TermKind::Sequence(terms) => terms
                .iter()
                .map(|term| term.depth())
                .max()
                .map_or(0, |depth| 1 + depth),
            TermKind::UnaryFunction(_, argument) => 1 + argument.depth(),
            TermKind::Addition(group) | TermKind::Multiplication(group) => {
                let mut depth = group.constant().depth();
                for term in group.positive().iter().chain(group.negative()) {
                    depth = depth.max(term.depth());
                }
                1 + depth
            }
            TermKind::Exponentiation(base, exponent) => 1 + base.depth().max(exponent.depth()),
            TermKind::Squaring(base) => 1 + base.depth(),
        })
    }

    /// The canonical structural key; deterministic, and order-insensitive
    /// where the operation is commutative.
    pub fn key(&self) -> &str {
        self.key.get_or_init(|| self.make_key())
    }

    fn make_key(&self) -> String {
        match &self.kind {
            TermKind::Constant(value) => format!("{}", value),
            TermKind::Input(name) => name.clone(),
            TermKind::Output(name, term) => format!("{}[{}]", name, term.key()),
            TermKind::Sequence(terms) => {
                let mut keys: Vec<&str> = terms.iter().map(|term| term.key()).collect();
                keys.sort_unstable();
                keys.join("|")
            }
            TermKind::UnaryFunction(fun, argument) => {
                format!("{:#x}({})", *fun as usize, argument.key())
            }
            TermKind::Addition(group) => Self::group_key(GroupOp::Addition, group),
            TermKind::Multiplication(group) => Self::group_key(GroupOp::Multiplication, group),
            TermKind::Exponentiation(base, exponent) => {
                format!("({})^({})", base.key(), exponent.key())
            }
            TermKind::Squaring(base) => format!("({})^2", base.key()),
        }
    }

    fn group_key(op: GroupOp, group: &Group) -> String {
        fn sorted_keys(terms: &[RcTerm]) -> Vec<&str> {
            let mut keys: Vec<&str> = terms.iter().map(|term| term.key()).collect();
            keys.sort_unstable();
            keys
        }

        let (positive_sign, negative_sign) = op.signs();
        let mut result = group.constant().key().to_owned();
        for key in sorted_keys(group.positive()) {
            let _ = write!(result, "{}({})", positive_sign, key);
        }
        for key in sorted_keys(group.negative()) {
            let _ = write!(result, "{}({})", negative_sign, key);
        }
        result
    }

    /// Evaluates the term to a constant, if it is one.
    pub fn evaluate_constant(&self) -> Option<Real> {
        match &self.kind {
            TermKind::Constant(value) => Some(*value),
            TermKind::Input(_) | TermKind::Output(..) | TermKind::Sequence(_) => None,
            TermKind::UnaryFunction(fun, argument) => argument.evaluate_constant().map(fun),
            TermKind::Addition(group) => Self::evaluate_group(GroupOp::Addition, group),
            TermKind::Multiplication(group) => Self::evaluate_group(GroupOp::Multiplication, group),
            TermKind::Exponentiation(base, exponent) => {
                let base = base.evaluate_constant()?;
                if base == 0.0 {
                    // by convention
                    return Some(1.0);
                }
                exponent.evaluate_constant().map(|exp| base.powf(exp))
            }
            TermKind::Squaring(base) => base.evaluate_constant().map(|base| base * base),
        }
    }

    fn evaluate_group(op: GroupOp, group: &Group) -> Option<Real> {
        if group.positive().is_empty() && group.negative().is_empty() {
            Some(group.constant_value())
        } else if op.null_element() == Some(group.constant_value()) {
            op.null_element()
        } else {
            None
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use pretty_assertions::assert_eq;

    fn sum(positive: Vec<RcTerm>, negative: Vec<RcTerm>) -> RcTerm {
        Term::addition(Group::new(GroupOp::Addition, None, positive, negative))
    }

    #[test]
    fn negative_zero_is_normalized() {
        assert_eq!(Term::constant(-0.0).key(), "0");
    }

    #[test]
    fn keys_are_order_insensitive() {
        let a = sum(vec![Term::input("a"), Term::input("b")], vec![]);
        let b = sum(vec![Term::input("b"), Term::input("a")], vec![]);
        assert_eq!(a.key(), b.key());
        assert_eq!(a.key(), "0+(a)+(b)");
    }

    #[test]
    fn keys_distinguish_signs() {
        let a = sum(vec![Term::input("a")], vec![Term::input("b")]);
        let b = sum(vec![Term::input("b")], vec![Term::input("a")]);
        assert_ne!(a.key(), b.key());
    }

    #[test]
    fn power_keys() {
        let x = Term::input("x");
        assert_eq!(
            Term::exponentiation(x.clone(), Term::constant(2.5)).key(),
            "(x)^(2.5)"
        );
        assert_eq!(Term::squaring(x).key(), "(x)^2");
    }

    #[test]
    fn output_and_sequence_keys() {
        let out_b = Term::output("b", Term::input("x"));
        let out_a = Term::output("a", Term::input("y"));
        let seq = Term::sequence(vec![out_b.clone(), out_a.clone()]);
        assert_eq!(out_b.key(), "b[x]");
        assert_eq!(seq.key(), "a[y]|b[x]");
    }

    #[test]
    fn depth_levels() {
        let x = Term::input("x");
        let square = Term::squaring(x.clone());
        let product = Term::multiplication(Group::new(
            GroupOp::Multiplication,
            None,
            vec![x.clone(), square.clone()],
            vec![],
        ));
        assert_eq!(x.depth(), 0);
        assert_eq!(square.depth(), 1);
        assert_eq!(product.depth(), 2);
        assert_eq!(Term::output("y", product).depth(), 3);
    }

    #[test]
    fn constant_evaluation() {
        let two = Term::constant(2.0);
        let three = Term::constant(3.0);
        assert_eq!(
            sum(vec![], vec![]).evaluate_constant(),
            Some(0.0),
            "empty groups evaluate to their constant"
        );
        assert_eq!(
            Term::multiplication(Group::new(
                GroupOp::Multiplication,
                Some(Term::constant(0.0)),
                vec![Term::input("x")],
                vec![],
            ))
            .evaluate_constant(),
            Some(0.0),
            "a zero constant absorbs a multiplication"
        );
        assert_eq!(
            Term::exponentiation(two.clone(), three.clone()).evaluate_constant(),
            Some(8.0)
        );
        assert_eq!(
            Term::exponentiation(Term::constant(0.0), Term::input("x")).evaluate_constant(),
            Some(1.0),
            "zero base evaluates to one regardless of the exponent"
        );
        assert_eq!(Term::squaring(three).evaluate_constant(), Some(9.0));
        assert_eq!(Term::input("x").evaluate_constant(), None);
        assert_eq!(
            Term::unary_function(f64::sqrt, Term::constant(9.0)).evaluate_constant(),
            Some(3.0)
        );
    }
}
