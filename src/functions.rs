//! The built-in unary function set.
//!
//! Hosts register functions by name; this module provides the standard set
//! and the canonical pointers the code generator recognizes for intrinsic
//! fusion (`sin`/`cos` pairs become a single `SINCOS`).

use crate::common::RealFn;

pub const SIN: RealFn = f64::sin;
pub const COS: RealFn = f64::cos;
pub const TAN: RealFn = f64::tan;
pub const ASIN: RealFn = f64::asin;
pub const ACOS: RealFn = f64::acos;
pub const ATAN: RealFn = f64::atan;
pub const EXP: RealFn = f64::exp;
pub const LN: RealFn = f64::ln;
pub const SQRT: RealFn = f64::sqrt;
pub const ABS: RealFn = f64::abs;

/// The functions registered by [Compiler::with_builtins].
///
/// [Compiler::with_builtins]: crate::Compiler::with_builtins
pub const BUILTINS: &[(&str, RealFn)] = &[
    ("sin", SIN),
    ("cos", COS),
    ("tan", TAN),
    ("asin", ASIN),
    ("acos", ACOS),
    ("atan", ATAN),
    ("exp", EXP),
    ("ln", LN),
    ("sqrt", SQRT),
    ("abs", ABS),
];
