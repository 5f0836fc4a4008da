//! axon compiles small scripts of named scalar expressions into compact
//! linear programs a host can evaluate at very high throughput.
//!
//! The pipeline: a tokenizer and a precedence parser produce a syntax tree;
//! lowering builds an Abstract Semantic Graph (a maximally-shared DAG of
//! algebraic terms); a stack of rewriting passes folds constants, flattens
//! and cancels group operations, expands integer exponents by repeated
//! squaring and applies trigonometric identities; code generation emits a
//! flat instruction stream over a single linear memory; scalar and 4-lane
//! vector interpreters execute it.
//!
//! ```
//! use axon::Compiler;
//!
//! let mut compiler = Compiler::with_builtins();
//! compiler
//!     .add_source_script(
//!         "input x\n\
//!          param a = 3\n\
//!          output y = a * x + 1\n",
//!     )
//!     .unwrap();
//! let program = compiler.compile().unwrap();
//!
//! let x = program.input_address("x").unwrap();
//! let y = program.output_address("y").unwrap();
//! let mut executable = program.scalar_executable();
//! executable.set(x, 2.0);
//! executable.run();
//! assert_eq!(executable.get(y), 7.0);
//! ```

// Function pointers are compared on purpose: a registered `sin` is fused
// into SINCOS only when it is the canonical builtin.
#![allow(unknown_lints)]
#![allow(unpredictable_function_pointer_comparisons)]

mod common;
pub use common::{CompileOptions, Real, RealFn, Span};

mod diagnostics;
pub use diagnostics::{CompileError, Error, ParseError};

pub mod scanner;
pub use scanner::{tokenize, Token, TokenType, Tokenizer};

pub mod parser;
pub use parser::{parse_expression, Expression};

pub mod ast;

mod emit;
pub use emit::{stringify, Notation};

pub mod symbols;
pub use symbols::{Lexicon, Symbol, SymbolKind};

pub mod asg;

pub mod functions;

mod compiler;
pub use compiler::{Compiler, Visibility};

mod program;
pub use program::{Address, Constants, Instruction, Instructions, Program};

mod interpreter;
pub use interpreter::{Executable, Vector, Word};

mod printer;
pub use printer::{print_program, print_semantic_graph, print_syntax_tree};
