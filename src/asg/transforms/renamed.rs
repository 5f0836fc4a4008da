//! Input/output renaming.

use crate::asg::transform::{Cursor, TermPass};
use crate::asg::{RcTerm, Term, TermKind};

use std::collections::HashMap;

/// Substitutes input and output names per a supplied map, letting embedders
/// project a program onto caller-chosen names.
pub struct Renamed {
    renames: HashMap<String, String>,
}

impl Renamed {
    pub fn new<I>(renames: I) -> Self
    where
        I: IntoIterator<Item = (String, String)>,
    {
        Self {
            renames: renames.into_iter().collect(),
        }
    }

    fn rename<'a>(&'a self, name: &'a str) -> &'a str {
        self.renames.get(name).map(String::as_str).unwrap_or(name)
    }
}

impl TermPass for Renamed {
    fn name(&self) -> &'static str {
        "renamed"
    }

    fn transform_term(&self, cx: Cursor<'_>, term: &RcTerm) -> Option<RcTerm> {
        match term.kind() {
            TermKind::Input(name) => {
                Some(cx.transform_next(&Term::input(self.rename(name))))
            }
            TermKind::Output(name, child) => {
                Some(cx.transform_next(&Term::output(self.rename(name), child.clone())))
            }
            _ => None,
        }
    }
}
