//! The rewriting framework over semantic graph terms.
//!
//! A [Transformer] owns a stack of [TermPass]es, outermost first. Each pass
//! may rewrite some term variants and defers the rest; an implicit identity
//! pass at the bottom of the stack rebuilds unhandled terms from their
//! transformed children. Full transformations are memoized by input pointer,
//! so repeated inputs map to the same output term and sharing survives.
//!
//! Because the group rewrites reassociate and reorder children, transformed
//! graphs may differ from the input in the low-order bits of evaluated
//! floating-point results.

use super::{Group, GroupOp, RcTerm, Term, TermKind};

use std::cell::RefCell;
use std::collections::HashMap;
use std::hash::{Hash, Hasher};
use std::rc::Rc;

/// A single rewriting pass.
///
/// `transform_term` constructs a rewritten term for the variants the pass
/// handles and returns `None` for all others, deferring to the next pass in
/// the stack. `coalesce` post-processes every term produced by a full
/// [Transformer::transform] before it is memoized.
pub trait TermPass {
    /// The pass name, for logging and diagnostics.
    fn name(&self) -> &'static str;

    fn transform_term(&self, cx: Cursor<'_>, term: &RcTerm) -> Option<RcTerm> {
        let _ = (cx, term);
        None
    }

    fn coalesce(&self, cx: Cursor<'_>, term: RcTerm) -> RcTerm {
        let _ = cx;
        term
    }
}

/// The dispatch position of a pass inside a [Transformer] stack. Handed to
/// every pass hook so the pass can recurse into the full stack or continue
/// dispatch below itself.
#[derive(Copy, Clone)]
pub struct Cursor<'t> {
    transformer: &'t Transformer,
    index: usize,
}

impl Cursor<'_> {
    /// Fully transforms `term` through the whole stack, memoized.
    pub fn transform(&self, term: &RcTerm) -> RcTerm {
        self.transformer.transform(term)
    }

    /// Hands `term` to the passes below the current one.
    pub fn transform_next(&self, term: &RcTerm) -> RcTerm {
        self.transformer.dispatch(self.index + 1, term)
    }
}

/// A memoizing pipeline of rewriting passes.
pub struct Transformer {
    passes: Vec<Box<dyn TermPass>>,
    // Keyed by input pointer identity; the input Rc is kept alive alongside
    // the output so the address cannot be recycled mid-run.
    memo: RefCell<HashMap<TermPtr, RcTerm>>,
}

impl Transformer {
    /// A transformer with no passes: the identity rewrite.
    pub fn identity() -> Self {
        Self {
            passes: Vec::new(),
            memo: RefCell::new(HashMap::new()),
        }
    }

    /// Adds `pass` as the next inner layer; the first added pass is the
    /// outermost.
    pub fn with<P: TermPass + 'static>(mut self, pass: P) -> Self {
        self.passes.push(Box::new(pass));
        self
    }

    /// Transforms `term` through the pass stack.
    ///
    /// Repeated calls with the same input pointer return the same output
    /// pointer. Provenance is copied forward when the result lacks one, and
    /// every result runs through the passes' `coalesce` chain.
    pub fn transform(&self, term: &RcTerm) -> RcTerm {
        if let Some(output) = self.memo.borrow().get(&TermPtr(term.clone())) {
            return output.clone();
        }
        let mut result = self.dispatch(0, term);
        if result.provenance().is_none() {
            if let Some(provenance) = term.provenance() {
                result.set_provenance(provenance.clone());
            }
        }
        for (index, pass) in self.passes.iter().enumerate() {
            result = pass.coalesce(
                Cursor {
                    transformer: self,
                    index,
                },
                result,
            );
        }
        self.memo
            .borrow_mut()
            .insert(TermPtr(term.clone()), result.clone());
        result
    }

    fn dispatch(&self, index: usize, term: &RcTerm) -> RcTerm {
        for (i, pass) in self.passes.iter().enumerate().skip(index) {
            let cx = Cursor {
                transformer: self,
                index: i,
            };
            if let Some(result) = pass.transform_term(cx, term) {
                return result;
            }
        }
        self.reconstruct(term)
    }

    // The implicit innermost pass: rebuild the term from transformed
    // children.
    fn reconstruct(&self, term: &RcTerm) -> RcTerm {
        match term.kind() {
            TermKind::Constant(_) | TermKind::Input(_) => term.clone(),
            TermKind::Output(name, child) => Term::output(name.clone(), self.transform(child)),
            TermKind::Sequence(terms) => {
                Term::sequence(terms.iter().map(|term| self.transform(term)).collect())
            }
            TermKind::UnaryFunction(fun, argument) => {
                Term::unary_function(*fun, self.transform(argument))
            }
            TermKind::Addition(group) => {
                Term::addition(self.reconstruct_group(GroupOp::Addition, group))
            }
            TermKind::Multiplication(group) => {
                Term::multiplication(self.reconstruct_group(GroupOp::Multiplication, group))
            }
            TermKind::Exponentiation(base, exponent) => {
                Term::exponentiation(self.transform(base), self.transform(exponent))
            }
            TermKind::Squaring(base) => Term::squaring(self.transform(base)),
        }
    }

    fn reconstruct_group(&self, op: GroupOp, group: &Group) -> Group {
        Group::new(
            op,
            Some(self.transform(group.constant())),
            group
                .positive()
                .iter()
                .map(|term| self.transform(term))
                .collect(),
            group
                .negative()
                .iter()
                .map(|term| self.transform(term))
                .collect(),
        )
    }
}

/// An `Rc<Term>` compared and hashed by pointer identity.
#[derive(Clone)]
pub(crate) struct TermPtr(pub RcTerm);

impl PartialEq for TermPtr {
    fn eq(&self, other: &Self) -> bool {
        Rc::ptr_eq(&self.0, &other.0)
    }
}

impl Eq for TermPtr {}

impl Hash for TermPtr {
    fn hash<H: Hasher>(&self, state: &mut H) {
        Rc::as_ptr(&self.0).hash(state);
    }
}
