//! N-ary flattening of additive and multiplicative groups.

use crate::asg::transform::{Cursor, TermPass};
use crate::asg::{Group, GroupOp, RcTerm, Term, TermKind};

/// Flattens nested same-kind groups and absorbs constant children into the
/// group constant: `(a+2)-(c-(3+b))` becomes `5+a+b-c`, and likewise
/// `(a*2)/(c/(3*b))` becomes `5*a*b/c`. Nested sequences are inlined.
///
/// Absorption reassociates constants, which may alter low-order bits of the
/// evaluated result.
#[derive(Default)]
pub struct Grouped;

impl Grouped {
    pub fn new() -> Self {
        Self
    }
}

impl TermPass for Grouped {
    fn name(&self) -> &'static str {
        "grouped"
    }

    fn transform_term(&self, cx: Cursor<'_>, term: &RcTerm) -> Option<RcTerm> {
        match term.kind() {
            TermKind::Sequence(terms) => {
                // Expand nested sequences: (a,b),(c,d) -> a,b,c,d
                let mut flattened = Vec::with_capacity(terms.len());
                for term in terms {
                    let transformed = cx.transform(term);
                    if let TermKind::Sequence(nested) = transformed.kind() {
                        flattened.extend(nested.iter().cloned());
                    } else {
                        flattened.push(transformed);
                    }
                }
                Some(cx.transform_next(&Term::sequence(flattened)))
            }
            TermKind::Addition(group) => Some(group_terms(cx, GroupOp::Addition, group)),
            TermKind::Multiplication(group) => {
                Some(group_terms(cx, GroupOp::Multiplication, group))
            }
            _ => None,
        }
    }
}

fn group_terms(cx: Cursor<'_>, op: GroupOp, group: &Group) -> RcTerm {
    let mut constant = group.constant_value();
    let mut positive: Vec<RcTerm> = Vec::new();
    let mut negative: Vec<RcTerm> = Vec::new();

    for term in group.positive() {
        let transformed = cx.transform(term);
        if let TermKind::Constant(value) = transformed.kind() {
            constant = op.apply(constant, *value);
            continue;
        }
        if let Some((sibling_op, sibling)) = transformed.as_group() {
            if sibling_op == op {
                constant = op.apply(constant, sibling.constant_value());
                positive.extend(sibling.positive().iter().cloned());
                negative.extend(sibling.negative().iter().cloned());
                continue;
            }
        }
        positive.push(transformed);
    }
    for term in group.negative() {
        let transformed = cx.transform(term);
        if let TermKind::Constant(value) = transformed.kind() {
            constant = op.apply_inverse(constant, *value);
            continue;
        }
        if let Some((sibling_op, sibling)) = transformed.as_group() {
            if sibling_op == op {
                // A same-kind negative child contributes with flipped signs.
                constant = op.apply_inverse(constant, sibling.constant_value());
                positive.extend(sibling.negative().iter().cloned());
                negative.extend(sibling.positive().iter().cloned());
                continue;
            }
        }
        negative.push(transformed);
    }

    let constant = cx.transform(&Term::constant(constant));
    cx.transform_next(&Term::group(op, Group::new(op, Some(constant), positive, negative)))
}
