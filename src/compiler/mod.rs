//! The compiler front-end: symbol registration, script feeding, and the
//! graph → program pipeline.

mod codegen;
mod graph;

use crate::asg::transform::Transformer;
use crate::asg::transforms::{
    ConstEvaluated, Grouped, Merge, Reduced, Renamed, TrigonometricIdentities,
};
use crate::asg::RcTerm;
use crate::common::{CompileOptions, Real, RealFn};
use crate::diagnostics::{CompileError, Error};
use crate::functions;
use crate::parser::{parse_expression, Expression, ScriptParser};
use crate::program::Program;
use crate::symbols::{Lexicon, Symbol, SymbolKind};

use std::collections::HashSet;
use std::rc::Rc;
use tracing::{debug, trace};

/// How a named expression participates in the compiled program.
#[derive(PartialEq, Eq, Copy, Clone, Debug)]
pub enum Visibility {
    /// Visible to later expressions and compiled as an output.
    Public,
    /// Compiled as an output only.
    Private,
    /// A reusable name only, not an output.
    Symbolic,
}

/// Compiles registered symbols and expressions into a [Program].
#[derive(Default)]
pub struct Compiler {
    symbols: Lexicon,
    outputs: Vec<Rc<Symbol>>,
    options: CompileOptions,
}

impl Compiler {
    pub fn new() -> Self {
        Self::default()
    }

    /// A compiler with the standard function set pre-registered.
    pub fn with_builtins() -> Self {
        let mut compiler = Self::new();
        for &(name, fun) in functions::BUILTINS {
            // Builtin names are distinct; registration cannot fail.
            let _ = compiler.add_function(name, fun);
        }
        compiler
    }

    pub fn set_options(&mut self, options: CompileOptions) {
        self.options = options;
    }

    /// The symbols visible to expressions.
    pub fn symbols(&self) -> &Lexicon {
        &self.symbols
    }

    pub fn add_constant(&mut self, name: &str, value: Real) -> Result<(), CompileError> {
        self.symbols.add(Symbol::constant(name, value))
    }

    pub fn add_function(&mut self, name: &str, fun: RealFn) -> Result<(), CompileError> {
        self.symbols.add(Symbol::function(name, fun))
    }

    pub fn add_parameter(&mut self, name: &str, value: Real) -> Result<(), CompileError> {
        self.symbols.add(Symbol::parameter(name, value))
    }

    /// Updates a parameter's value ahead of the next compilation.
    pub fn set_parameter(&mut self, name: &str, value: Real) -> Result<(), CompileError> {
        match self.symbols.find(name).as_deref().map(Symbol::kind) {
            Some(SymbolKind::Parameter(cell)) => {
                cell.set(value);
                Ok(())
            }
            _ => Err(CompileError::new(format!("Unknown parameter '{}'", name))),
        }
    }

    pub fn add_variable(&mut self, name: &str) -> Result<(), CompileError> {
        self.symbols.add(Symbol::variable(name))
    }

    /// Parses `expression` against the current lexicon and registers it under
    /// `name` with the given visibility.
    ///
    /// A parse failure is captured inside the returned [Expression]; only
    /// name clashes fail the registration itself.
    pub fn add_expression(
        &mut self,
        name: &str,
        expression: &str,
        visibility: Visibility,
    ) -> Result<Expression, CompileError> {
        let parsed = parse_expression(expression, &self.symbols);
        let symbol = Symbol::expression(name, parsed.clone());
        if visibility != Visibility::Private {
            self.symbols.add(Rc::clone(&symbol))?;
        }
        if visibility != Visibility::Symbolic {
            if self.outputs.iter().any(|output| output.name() == name) {
                return Err(CompileError::new(format!(
                    "Duplicate output symbol '{}'",
                    name
                )));
            }
            self.outputs.push(symbol);
        }
        Ok(parsed)
    }

    /// Feeds a whole declaration script.
    pub fn add_source_script(&mut self, input: &str) -> Result<(), Error> {
        ScriptParser::new(self).parse_script(input)
    }

    /// The declared variable names.
    pub fn inputs(&self) -> Vec<&str> {
        self.symbols
            .symbols()
            .filter(|symbol| matches!(symbol.kind(), SymbolKind::Variable))
            .map(|symbol| symbol.name())
            .collect()
    }

    /// The declared parameters and their current values.
    pub fn parameters(&self) -> Vec<(&str, Real)> {
        self.symbols
            .symbols()
            .filter_map(|symbol| match symbol.kind() {
                SymbolKind::Parameter(value) => Some((symbol.name(), value.get())),
                _ => None,
            })
            .collect()
    }

    /// The registered outputs and their expressions.
    pub fn outputs(&self) -> impl Iterator<Item = (&str, &Expression)> {
        self.outputs.iter().filter_map(|symbol| match symbol.kind() {
            SymbolKind::Expression(expression) => Some((symbol.name(), expression)),
            _ => None,
        })
    }

    /// Compiles the registered outputs into a program.
    pub fn compile(&self) -> Result<Program, CompileError> {
        let graph = self.make_graph()?;
        let transformed = self.transform_graph(graph);
        self.compile_graph(&transformed)
    }

    /// Lowers the registered outputs into an untransformed semantic graph.
    pub fn make_graph(&self) -> Result<RcTerm, CompileError> {
        graph::build(self.outputs())
    }

    /// Rewrites `graph` to its canonical reduced form.
    ///
    /// The pass stack is applied repeatedly until the root's canonical key
    /// stops changing, so rewrites enabled by earlier rounds (collapsed
    /// wrappers, shared identical terms) are picked up.
    pub fn transform_graph(&self, graph: RcTerm) -> RcTerm {
        let mut graph = graph;
        let mut seen = HashSet::new();
        while seen.insert(graph.key().to_owned()) {
            graph = self.transform_stack().transform(&graph);
            trace!(key = graph.key(), "transform round");
        }
        debug!(rounds = seen.len(), "graph transformed");
        graph
    }

    /// Generates code for an already transformed graph.
    pub fn compile_graph(&self, graph: &RcTerm) -> Result<Program, CompileError> {
        let program = codegen::generate(graph, &self.symbols, &self.options)?;
        debug!(
            constants = program.constants().values().len(),
            instructions = program.instructions().code().len(),
            inputs = program.inputs().len(),
            outputs = program.outputs().len(),
            "program generated"
        );
        Ok(program)
    }

    fn transform_stack(&self) -> Transformer {
        let mut transformer = Transformer::identity();
        if !self.options.renames.is_empty() {
            transformer = transformer.with(Renamed::new(self.options.renames.iter().cloned()));
        }
        transformer = transformer
            .with(Reduced::new())
            .with(Grouped::new())
            .with(ConstEvaluated::new());
        if self.options.trigonometric_identities {
            transformer = transformer.with(TrigonometricIdentities::new());
        }
        transformer.with(Merge::new())
    }
}
