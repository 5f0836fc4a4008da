//! The stackable rewriting passes.
//!
//! The compiler composes, outermost to innermost:
//! [Reduced] ∘ [Grouped] ∘ [ConstEvaluated] ∘ [Merge], optionally with
//! [Renamed] on the outside and [TrigonometricIdentities] above the merge.

mod const_eval;
mod grouped;
mod merge;
mod reduced;
mod renamed;
mod trig;

pub use const_eval::ConstEvaluated;
pub use grouped::Grouped;
pub use merge::Merge;
pub use reduced::Reduced;
pub use renamed::Renamed;
pub use trig::TrigonometricIdentities;
