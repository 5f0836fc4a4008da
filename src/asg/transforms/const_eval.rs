//! Constant folding.

use crate::asg::transform::{Cursor, TermPass};
use crate::asg::{RcTerm, Term, TermKind};

/// Folds any term that evaluates to a constant into a fresh `Constant`.
#[derive(Default)]
pub struct ConstEvaluated;

impl ConstEvaluated {
    pub fn new() -> Self {
        Self
    }
}

impl TermPass for ConstEvaluated {
    fn name(&self) -> &'static str {
        "const-evaluated"
    }

    fn coalesce(&self, _cx: Cursor<'_>, term: RcTerm) -> RcTerm {
        if matches!(term.kind(), TermKind::Constant(_)) {
            return term;
        }
        match term.evaluate_constant() {
            Some(value) => {
                let constant = Term::constant(value);
                if let Some(provenance) = term.provenance() {
                    constant.set_provenance(provenance.clone());
                }
                constant
            }
            None => term,
        }
    }
}
