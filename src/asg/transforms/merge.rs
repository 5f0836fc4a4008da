//! Hash-consing of structurally equal terms.

use crate::asg::transform::{Cursor, TermPass};
use crate::asg::{RcTerm, Term};

use std::cell::RefCell;
use std::collections::HashMap;
use std::rc::{Rc, Weak};

/// Deduplicates terms by canonical key.
///
/// Two terms with equal keys are replaced by a single shared term; the table
/// holds weak references only, so terms dropped between passes can be
/// reclaimed.
#[derive(Default)]
pub struct Merge {
    terms: RefCell<HashMap<String, Weak<Term>>>,
}

impl Merge {
    pub fn new() -> Self {
        Self::default()
    }
}

impl TermPass for Merge {
    fn name(&self) -> &'static str {
        "merge"
    }

    fn coalesce(&self, _cx: Cursor<'_>, term: RcTerm) -> RcTerm {
        let key = term.key().to_owned();
        let mut table = self.terms.borrow_mut();
        match table.get(&key).and_then(Weak::upgrade) {
            Some(unique) => {
                // The surviving term wins; augment its provenance if it has
                // none yet.
                if unique.provenance().is_none() {
                    if let Some(provenance) = term.provenance() {
                        unique.set_provenance(provenance.clone());
                    }
                }
                unique
            }
            None => {
                table.insert(key, Rc::downgrade(&term));
                term
            }
        }
    }
}
