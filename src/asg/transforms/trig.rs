//! The Pythagorean trigonometric identity.

use crate::asg::transform::{Cursor, TermPass};
use crate::asg::{Group, GroupOp, RcTerm, Term, TermKind};
use crate::functions;

use std::cell::RefCell;
use std::collections::HashMap;

/// Rewrites the second of a `sin²(a)` / `cos²(a)` pair as `1 − other²(a)`,
/// so the pair costs a single squaring after reduction.
///
/// Squarings are remembered per argument key, so the rule applies whether or
/// not the two arguments are already pointer-shared.
#[derive(Default)]
pub struct TrigonometricIdentities {
    squared_sines: RefCell<HashMap<String, RcTerm>>,
    squared_cosines: RefCell<HashMap<String, RcTerm>>,
}

impl TrigonometricIdentities {
    pub fn new() -> Self {
        Self::default()
    }
}

impl TermPass for TrigonometricIdentities {
    fn name(&self) -> &'static str {
        "trigonometric-identities"
    }

    fn transform_term(&self, cx: Cursor<'_>, term: &RcTerm) -> Option<RcTerm> {
        let base = match term.kind() {
            TermKind::Squaring(base) => base,
            _ => return None,
        };
        let (fun, argument) = match base.kind() {
            TermKind::UnaryFunction(fun, argument) => (*fun, argument),
            _ => return None,
        };
        let (seen, memo) = if fun == functions::SIN {
            (&self.squared_cosines, &self.squared_sines)
        } else if fun == functions::COS {
            (&self.squared_sines, &self.squared_cosines)
        } else {
            return None;
        };

        let argument_key = argument.key().to_owned();
        let counterpart = seen.borrow().get(&argument_key).cloned();
        match counterpart {
            Some(counterpart) => {
                let difference = Term::addition(Group::new(
                    GroupOp::Addition,
                    Some(Term::constant(1.0)),
                    vec![],
                    vec![counterpart],
                ));
                Some(cx.transform_next(&difference))
            }
            None => {
                let transformed = cx.transform_next(term);
                memo.borrow_mut().insert(argument_key, transformed.clone());
                Some(transformed)
            }
        }
    }
}
