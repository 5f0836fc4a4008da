//! Cancellation, fusion and exponent expansion.

use crate::asg::transform::{Cursor, TermPass, TermPtr};
use crate::asg::{Group, GroupOp, RcTerm, Term, TermKind};
use crate::common::Real;

use indexmap::IndexMap;
use std::collections::HashSet;
use std::rc::Rc;

/// Reduces group operations and expands integer exponents.
///
/// For additions: `0+a -> a`, `a+b-a -> b`, and n repetitions of `a` fuse
/// into `n*a`. For multiplications: `1*a -> a`, `0*a -> 0`, `a*b/a -> b`,
/// and n repetitions fuse into `a^n` (negative repetitions end up on the
/// division side). Constant integer exponents expand into multiplication
/// chains by repeated squaring. Cancellation reorders children, which may
/// alter low-order bits of the evaluated result.
#[derive(Default)]
pub struct Reduced;

impl Reduced {
    pub fn new() -> Self {
        Self
    }
}

impl TermPass for Reduced {
    fn name(&self) -> &'static str {
        "reduced"
    }

    fn transform_term(&self, cx: Cursor<'_>, term: &RcTerm) -> Option<RcTerm> {
        match term.kind() {
            TermKind::Sequence(terms) => Some(reduce_sequence(cx, terms)),
            TermKind::Addition(group) => Some(reduce_group(cx, GroupOp::Addition, group, fuse_sum)),
            TermKind::Multiplication(group) => Some(reduce_multiplication(cx, group)),
            TermKind::Exponentiation(base, exponent) => {
                Some(expand_exponent(cx, base, exponent, term))
            }
            _ => None,
        }
    }
}

// n-times +a -> n*a (the sign lands on the group level).
fn fuse_sum(term: &RcTerm, count: i64) -> RcTerm {
    Term::multiplication(Group::new(
        GroupOp::Multiplication,
        Some(Term::constant(count as Real)),
        vec![term.clone()],
        vec![],
    ))
}

// n-times *a -> a^n; negative exponents emerge from the division side.
fn fuse_product(term: &RcTerm, count: i64) -> RcTerm {
    Term::exponentiation(term.clone(), Term::constant(count as Real))
}

/// Removes duplicate roots from a sequence.
fn reduce_sequence(cx: Cursor<'_>, terms: &[RcTerm]) -> RcTerm {
    let mut unique = Vec::with_capacity(terms.len());
    let mut seen = HashSet::new();
    for term in terms {
        let transformed = cx.transform(term);
        if seen.insert(Rc::as_ptr(&transformed)) {
            unique.push(transformed);
        }
    }
    cx.transform_next(&Term::sequence(unique))
}

fn reduce_group(
    cx: Cursor<'_>,
    op: GroupOp,
    group: &Group,
    fuse: fn(&RcTerm, i64) -> RcTerm,
) -> RcTerm {
    // Null element constant -> null element.
    if op.null_element() == Some(group.constant_value()) {
        return cx.transform(group.constant());
    }

    // Weigh the children by sign and cancel the zero-weight ones.
    let mut weights: IndexMap<TermPtr, i64> = IndexMap::new();
    for term in group.positive() {
        *weights.entry(TermPtr(cx.transform(term))).or_insert(0) += 1;
    }
    for term in group.negative() {
        *weights.entry(TermPtr(cx.transform(term))).or_insert(0) -= 1;
    }
    weights.retain(|_, weight| *weight != 0);

    // Single positive term and identity constant -> the term itself.
    if weights.len() == 1 && group.constant_value() == op.identity() {
        if let Some((term, &1)) = weights.first() {
            return term.0.clone();
        }
    }

    let mut positive: Vec<RcTerm> = Vec::new();
    let mut negative: Vec<RcTerm> = Vec::new();
    for (term, weight) in &weights {
        let count = weight.abs();
        let output = if *weight > 0 {
            &mut positive
        } else {
            &mut negative
        };
        if count > 1 {
            output.push(cx.transform(&fuse(&term.0, count)));
        } else {
            output.push(term.0.clone());
        }
    }

    // Sort by key, shorter terms first; this stabilizes emission order.
    let by_key_length = |t1: &RcTerm, t2: &RcTerm| {
        (t1.key().len(), t1.key()).cmp(&(t2.key().len(), t2.key()))
    };
    positive.sort_by(by_key_length);
    negative.sort_by(by_key_length);

    let constant = cx.transform(group.constant());
    cx.transform_next(&Term::group(op, Group::new(op, Some(constant), positive, negative)))
}

/// Builds the sign-inverted copy of an addition: constant negated, positive
/// and negative lists swapped.
fn invert_addition(cx: Cursor<'_>, term: &RcTerm) -> Option<RcTerm> {
    let sum = term.as_addition()?;
    let constant = cx.transform(&Term::constant(-sum.constant_value()));
    Some(cx.transform(&Term::addition(Group::new(
        GroupOp::Addition,
        Some(constant),
        sum.negative().to_vec(),
        sum.positive().to_vec(),
    ))))
}

fn reduce_multiplication(cx: Cursor<'_>, group: &Group) -> RcTerm {
    // Transform a negative constant to an additive inverse:
    // -K*x*(a-b)*(c+d) -> K*x*(b-a)*(c+d)
    if group.constant_value() < 0.0 {
        let mut positive = group.positive().to_vec();
        let mut negative = group.negative().to_vec();
        // one reference for our vector and one for the actual owner
        const UNIQUE_COUNT: usize = 2;
        let locate = |terms: &[RcTerm]| {
            terms
                .iter()
                .position(|t| t.as_addition().is_some() && Rc::strong_count(t) == UNIQUE_COUNT)
        };
        let candidate = locate(&positive)
            .map(|index| (true, index))
            .or_else(|| locate(&negative).map(|index| (false, index)));
        if let Some((in_positive, index)) = candidate {
            let list = if in_positive {
                &mut positive
            } else {
                &mut negative
            };
            if let Some(inverse) = invert_addition(cx, &list[index]) {
                list[index] = inverse;
                let constant = cx.transform(&Term::constant(-group.constant_value()));
                let flipped = Group::new(
                    GroupOp::Multiplication,
                    Some(constant),
                    positive,
                    negative,
                );
                return reduce_multiplication(cx, &flipped);
            }
        }
    }

    reduce_group(cx, GroupOp::Multiplication, group, fuse_product)
}

/// Exponent expansion by recursive squaring: `x^7 -> ((x*x)*(x*x))*(x*x)*x`.
///
/// Applies to any constant exponent that round-trips through an integer. A
/// negative exponent pushes the powers onto the division side, so `0^-2`
/// evaluates to `+∞` via division rather than a domain error.
fn expand_exponent(cx: Cursor<'_>, base: &RcTerm, exponent: &RcTerm, term: &RcTerm) -> RcTerm {
    if let Some(value) = exponent.evaluate_constant() {
        let integer = value as i64;
        if integer as Real == value {
            let mut positive: Vec<RcTerm> = Vec::new();
            let mut negative: Vec<RcTerm> = Vec::new();
            let mut current = base.clone();
            let mut bits = integer.unsigned_abs();
            while bits > 0 {
                if bits & 1 == 1 {
                    if integer > 0 {
                        positive.push(current.clone());
                    } else {
                        negative.push(current.clone());
                    }
                }
                bits >>= 1;
                if bits > 0 {
                    current = Term::squaring(current);
                }
            }
            let product = Term::multiplication(Group::new(
                GroupOp::Multiplication,
                None,
                positive,
                negative,
            ));
            return cx.transform_next(&product);
        }
    }
    cx.transform_next(term)
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::asg::transform::Transformer;
    use crate::asg::transforms::{ConstEvaluated, Grouped, Merge};

    fn reduced() -> Transformer {
        Transformer::identity()
            .with(Reduced::new())
            .with(Grouped::new())
            .with(ConstEvaluated::new())
            .with(Merge::new())
    }

    fn addition(positive: Vec<RcTerm>, negative: Vec<RcTerm>) -> RcTerm {
        Term::addition(Group::new(GroupOp::Addition, None, positive, negative))
    }

    fn multiplication(positive: Vec<RcTerm>, negative: Vec<RcTerm>) -> RcTerm {
        Term::multiplication(Group::new(GroupOp::Multiplication, None, positive, negative))
    }

    #[test]
    fn cancellation_is_complete() {
        // a+b-a -> b, via the single-term rule
        let a1 = Term::input("a");
        let a2 = Term::input("a");
        let b = Term::input("b");
        let root = addition(vec![a1, b], vec![a2]);
        assert_eq!(reduced().transform(&root).key(), "b");
    }

    #[test]
    fn multiplicative_cancellation() {
        // a*b/a -> b
        let root = multiplication(
            vec![Term::input("a"), Term::input("b")],
            vec![Term::input("a")],
        );
        assert_eq!(reduced().transform(&root).key(), "b");
    }

    #[test]
    fn identity_constant_single_term_reduces() {
        // 0+a -> a and 1*a -> a
        assert_eq!(
            reduced().transform(&addition(vec![Term::input("a")], vec![])).key(),
            "a"
        );
        assert_eq!(
            reduced()
                .transform(&multiplication(vec![Term::input("a")], vec![]))
                .key(),
            "a"
        );
    }

    #[test]
    fn repeated_sum_terms_fuse_into_products() {
        // a+a+a -> 3*a, still wrapped in the rebuilt addition after one pass
        let a = Term::input("a");
        let root = addition(vec![a.clone(), a.clone(), a], vec![]);
        assert_eq!(reduced().transform(&root).key(), "0+(3*(a))");
    }

    #[test]
    fn repeated_product_terms_fuse_into_powers() {
        // a*a*a -> a^3 -> (a*a)*a as a squaring chain
        let a = Term::input("a");
        let root = multiplication(vec![a.clone(), a.clone(), a], vec![]);
        assert_eq!(reduced().transform(&root).key(), "1*((a)^2)*(a)");
    }

    #[test]
    fn exponent_expansion_uses_squaring() {
        // x^7 -> ((x*x)*(x*x))*(x*x)*x
        let root = Term::exponentiation(Term::input("x"), Term::constant(7.0));
        let transformed = reduced().transform(&root);
        assert_eq!(transformed.key(), "1*(((x)^2)^2)*((x)^2)*(x)");
    }

    #[test]
    fn negative_exponents_divide() {
        // x^-2 -> 1/(x*x)
        let root = Term::exponentiation(Term::input("x"), Term::constant(-2.0));
        let transformed = reduced().transform(&root);
        assert_eq!(transformed.key(), "1/((x)^2)");
    }

    #[test]
    fn fractional_exponents_stay_exponentiations() {
        let root = Term::exponentiation(Term::input("x"), Term::constant(2.5));
        let transformed = reduced().transform(&root);
        assert!(matches!(transformed.kind(), TermKind::Exponentiation(..)));
    }

    #[test]
    fn zeroth_power_folds_to_one() {
        let root = Term::exponentiation(Term::input("x"), Term::constant(0.0));
        assert_eq!(reduced().transform(&root).key(), "1");
    }

    #[test]
    fn negative_constant_moves_into_owned_addition() {
        // -1*(a-b) -> 1*(b-a), i.e. b-a after reduction
        let difference = addition(vec![Term::input("a")], vec![Term::input("b")]);
        let root = Term::multiplication(Group::new(
            GroupOp::Multiplication,
            Some(Term::constant(-1.0)),
            vec![difference],
            vec![],
        ));
        let transformed = reduced().transform(&root);
        assert_eq!(transformed.key(), "0+(b)-(a)");
    }

    #[test]
    fn sorted_by_key_length() {
        let long = Term::unary_function(f64::sin, Term::input("alpha"));
        let root = addition(vec![long, Term::input("b")], vec![]);
        let transformed = reduced().transform(&root);
        let (_, group) = transformed.as_group().unwrap();
        assert_eq!(group.positive()[0].key(), "b");
    }

    #[test]
    fn duplicate_sequence_roots_collapse() {
        let out = Term::output("x", Term::input("a"));
        let root = Term::sequence(vec![out.clone(), out]);
        let transformed = reduced().transform(&root);
        match transformed.kind() {
            TermKind::Sequence(terms) => assert_eq!(terms.len(), 1),
            other => panic!("expected a sequence, got {other:?}"),
        }
    }
}
