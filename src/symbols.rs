//! Named symbols and the lexicon resolving identifiers in expressions.

use crate::common::{Real, RealFn};
use crate::diagnostics::CompileError;
use crate::parser::Expression;

use indexmap::IndexMap;
use std::cell::Cell;
use std::rc::Rc;

/// What a name stands for.
#[derive(Debug)]
pub enum SymbolKind {
    /// A fixed value, inlined at compile time.
    Constant(Real),

    /// A tunable value, inlined at compile time; may be updated between
    /// compilations.
    Parameter(Cell<Real>),

    /// A run-time input of the compiled program.
    Variable,

    /// A named sub-expression, substituted symbolically where referenced.
    Expression(Expression),

    /// A unary real function.
    Function(RealFn),
}

/// A named symbol.
#[derive(Debug)]
pub struct Symbol {
    name: String,
    kind: SymbolKind,
}

impl Symbol {
    pub fn new<N: Into<String>>(name: N, kind: SymbolKind) -> Rc<Self> {
        Rc::new(Self {
            name: name.into(),
            kind,
        })
    }

    pub fn constant<N: Into<String>>(name: N, value: Real) -> Rc<Self> {
        Self::new(name, SymbolKind::Constant(value))
    }

    pub fn parameter<N: Into<String>>(name: N, value: Real) -> Rc<Self> {
        Self::new(name, SymbolKind::Parameter(Cell::new(value)))
    }

    pub fn variable<N: Into<String>>(name: N) -> Rc<Self> {
        Self::new(name, SymbolKind::Variable)
    }

    pub fn expression<N: Into<String>>(name: N, expression: Expression) -> Rc<Self> {
        Self::new(name, SymbolKind::Expression(expression))
    }

    pub fn function<N: Into<String>>(name: N, fun: RealFn) -> Rc<Self> {
        Self::new(name, SymbolKind::Function(fun))
    }

    pub fn name(&self) -> &str {
        &self.name
    }

    pub fn kind(&self) -> &SymbolKind {
        &self.kind
    }

    /// Whether the symbol names a value, as opposed to a function.
    pub fn is_value(&self) -> bool {
        !matches!(self.kind, SymbolKind::Function(_))
    }

    pub fn as_function(&self) -> Option<RealFn> {
        match self.kind {
            SymbolKind::Function(fun) => Some(fun),
            _ => None,
        }
    }
}

/// A name → symbol mapping with unique keys.
#[derive(Debug, Default)]
pub struct Lexicon {
    symbols: IndexMap<String, Rc<Symbol>>,
}

impl Lexicon {
    pub fn new() -> Self {
        Self::default()
    }

    /// The registered symbols, in registration order.
    pub fn symbols(&self) -> impl Iterator<Item = &Rc<Symbol>> {
        self.symbols.values()
    }

    /// Adds the given symbol to the lexicon.
    ///
    /// Fails if another symbol with the same name is already present.
    pub fn add(&mut self, symbol: Rc<Symbol>) -> Result<(), CompileError> {
        match self.symbols.entry(symbol.name().to_owned()) {
            indexmap::map::Entry::Occupied(_) => Err(CompileError::new(format!(
                "Duplicate symbol '{}'",
                symbol.name()
            ))),
            indexmap::map::Entry::Vacant(entry) => {
                entry.insert(symbol);
                Ok(())
            }
        }
    }

    /// Finds a symbol matching the given name.
    pub fn find(&self, name: &str) -> Option<Rc<Symbol>> {
        self.symbols.get(name).cloned()
    }
}
