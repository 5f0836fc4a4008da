//! Depth-level code generation from the transformed graph.

use crate::asg::{Group, GroupOp, RcTerm, Term, TermKind};
use crate::common::{CompileOptions, Real};
use crate::diagnostics::CompileError;
use crate::functions;
use crate::program::{Address, Constants, Instruction, Instructions, Program};
use crate::symbols::{Lexicon, SymbolKind};

use indexmap::IndexMap;
use std::collections::{BTreeMap, HashMap, HashSet};
use std::rc::Rc;
use tracing::trace;

/// Generates a [Program] from a transformed graph root.
pub(crate) fn generate(
    root: &RcTerm,
    symbols: &Lexicon,
    options: &CompileOptions,
) -> Result<Program, CompileError> {
    let mut generator = CodeGenerator::default();
    generator.gather(root);
    generator.generate(symbols, options)
}

// Leaves first; decides emission order among terms of equal depth.
fn discriminant(term: &Term) -> u8 {
    match term.kind() {
        TermKind::Constant(_) => 0,
        TermKind::Input(_) => 1,
        TermKind::UnaryFunction(..) => 2,
        TermKind::Addition(_) => 3,
        TermKind::Multiplication(_) => 4,
        TermKind::Exponentiation(..) => 5,
        TermKind::Squaring(_) => 6,
        TermKind::Output(..) => 7,
        TermKind::Sequence(_) => 8,
    }
}

#[derive(Default)]
struct CodeGenerator {
    levels: Vec<Vec<RcTerm>>,
    gathered: HashSet<*const Term>,
    inputs: IndexMap<String, Address>,
    outputs: IndexMap<String, Address>,
    constants: Constants,
    instructions: Instructions,
    comments: BTreeMap<Address, String>,
    mapping: HashMap<*const Term, Address>,
}

impl CodeGenerator {
    /// Collects every unique term reachable from `term`, grouped by depth.
    ///
    /// Group constants are deliberately excluded; they reach the program only
    /// as instruction immediates.
    fn gather(&mut self, term: &RcTerm) {
        if let TermKind::Sequence(terms) = term.kind() {
            for term in terms {
                self.gather(term);
            }
            return;
        }
        if !self.gathered.insert(Rc::as_ptr(term)) {
            return;
        }
        let level = term.depth();
        if self.levels.len() <= level {
            self.levels.resize_with(level + 1, Vec::new);
        }
        self.levels[level].push(term.clone());

        match term.kind() {
            TermKind::Constant(_) | TermKind::Input(_) => {}
            TermKind::Output(_, child) => self.gather(child),
            TermKind::UnaryFunction(_, argument) => self.gather(argument),
            TermKind::Addition(group) | TermKind::Multiplication(group) => {
                for child in group.positive().iter().chain(group.negative()) {
                    self.gather(child);
                }
            }
            TermKind::Exponentiation(base, exponent) => {
                self.gather(base);
                self.gather(exponent);
            }
            TermKind::Squaring(base) => self.gather(base),
            TermKind::Sequence(_) => {}
        }
    }

    fn generate(
        mut self,
        symbols: &Lexicon,
        options: &CompileOptions,
    ) -> Result<Program, CompileError> {
        self.add_comment(Program::SCRATCHPAD_ADDRESS, "scratch-pad");
        // A program without terms still reserves the scratch-pad.
        self.constants.offset = 1;
        self.instructions.offset = 1;
        let mut levels = std::mem::take(&mut self.levels);
        for (depth, level) in levels.iter_mut().enumerate() {
            level.sort_by_key(|term| discriminant(term));
            if depth == 0 {
                self.generate_data_section(level)?;
            } else {
                self.generate_code_section(level)?;
            }
            trace!(depth, terms = level.len(), "level emitted");
        }
        self.fuse_sincos();
        if options.lower_sin_cos {
            self.lower_sin_cos();
        }
        // Map unused variables to the scratch-pad.
        for symbol in symbols.symbols() {
            if matches!(symbol.kind(), SymbolKind::Variable)
                && !self.inputs.contains_key(symbol.name())
            {
                self.inputs
                    .insert(symbol.name().to_owned(), Program::SCRATCHPAD_ADDRESS);
                self.add_comment(Program::SCRATCHPAD_ADDRESS, &format!("'{}'", symbol.name()));
            }
        }
        Program::new(
            self.inputs,
            self.outputs,
            self.constants,
            self.instructions,
            self.comments,
        )
    }

    fn generate_data_section(&mut self, terms: &[RcTerm]) -> Result<(), CompileError> {
        let mut constant_count: Address = 0;
        let mut variable_count: Address = 0;
        for term in terms {
            match term.kind() {
                TermKind::Constant(_) => constant_count += 1,
                TermKind::Input(_) => variable_count += 1,
                _ => {
                    return Err(CompileError::new(
                        "Code generation failed -- code present in the data section",
                    ))
                }
            }
        }
        let variable_section: Address = 1;
        let constant_section = variable_section + variable_count;
        let code_section = constant_section + constant_count;
        for term in terms {
            match term.kind() {
                TermKind::Constant(value) => {
                    let address = constant_section + self.constants.values.len() as Address;
                    self.constants.values.push(*value);
                    if !self.comments.contains_key(&address) {
                        self.add_comment(address, "constant");
                    }
                    self.map_term(term, address)?;
                }
                TermKind::Input(name) => {
                    let next = variable_section + self.inputs.len() as Address;
                    let address = *self.inputs.entry(name.clone()).or_insert(next);
                    if !self.comments.contains_key(&address) {
                        self.add_comment(address, "input");
                    }
                    self.map_term(term, address)?;
                }
                _ => {}
            }
        }
        self.constants.offset = constant_section;
        self.instructions.offset = code_section;
        Ok(())
    }

    fn generate_code_section(&mut self, terms: &[RcTerm]) -> Result<(), CompileError> {
        for term in terms {
            match term.kind() {
                TermKind::Output(name, child) => {
                    let address = self.address_of(child)?;
                    self.outputs.insert(name.clone(), address);
                    self.map_term(term, address)?;
                }
                TermKind::UnaryFunction(fun, argument) => {
                    let instruction = Instruction::Call {
                        fun: *fun,
                        arg: self.address_of(argument)?,
                    };
                    let address = self.emit(instruction);
                    self.map_term(term, address)?;
                }
                TermKind::Addition(group) => {
                    self.emit_group(term, GroupOp::Addition, group)?;
                }
                TermKind::Multiplication(group) => {
                    self.emit_group(term, GroupOp::Multiplication, group)?;
                }
                TermKind::Exponentiation(base, exponent) => {
                    let instruction = Instruction::Pow {
                        base: self.address_of(base)?,
                        exp: self.address_of(exponent)?,
                    };
                    let address = self.emit(instruction);
                    self.map_term(term, address)?;
                }
                TermKind::Squaring(base) => {
                    let address_of_base = self.address_of(base)?;
                    let instruction = Instruction::Mul {
                        lhs: address_of_base,
                        rhs: address_of_base,
                    };
                    let address = self.emit(instruction);
                    self.map_term(term, address)?;
                }
                _ => {
                    return Err(CompileError::new(
                        "Code generation failed -- data present in the code section",
                    ))
                }
            }
        }
        Ok(())
    }

    /// Streams a group operation as a chain of two-operand instructions.
    ///
    /// A non-identity constant enters through the immediate form of the first
    /// instruction; a single-child group without one still gets a final
    /// identity-immediate pass so the group owns an address of its own.
    fn emit_group(
        &mut self,
        term: &RcTerm,
        op: GroupOp,
        group: &Group,
    ) -> Result<(), CompileError> {
        let constant = group.constant_value();
        let needs_constant = constant != op.identity();
        // A chain that starts on the inverse side with more than one child
        // must seed with the constant, or the chain would compute
        // `first/second` instead of `c/first/second`.
        let needs_seed = group.positive().is_empty() && group.negative().len() > 1;
        let mut last: Option<Address> = None;
        let mut pending: Option<bool> = None;
        for (terms, positive) in [(group.positive(), true), (group.negative(), false)] {
            for child in terms {
                let address = self.address_of(child)?;
                if let Some(previous) = last {
                    last = Some(self.emit(sequential(op, positive, previous, address)));
                    pending = None;
                } else if needs_constant || (!positive && needs_seed) {
                    last = Some(self.emit(immediate(op, positive, constant, address)));
                } else {
                    last = Some(address);
                    pending = Some(positive);
                }
            }
        }
        let mut last = last.ok_or_else(|| {
            CompileError::new("Code generation failed -- group operation without children")
        })?;
        if let Some(positive) = pending {
            last = self.emit(immediate(op, positive, constant, last));
        }
        self.map_term(term, last)
    }

    /// Appends `instruction` unless an identical one already exists, in which
    /// case its address is reused.
    fn emit(&mut self, instruction: Instruction) -> Address {
        let found = self
            .instructions
            .code
            .iter()
            .position(|existing| *existing == instruction);
        let index = match found {
            Some(index) => index,
            None => {
                self.instructions.code.push(instruction);
                self.instructions.code.len() - 1
            }
        };
        self.instructions.offset + index as Address
    }

    fn map_term(&mut self, term: &RcTerm, address: Address) -> Result<(), CompileError> {
        if self
            .mapping
            .insert(Rc::as_ptr(term), address)
            .is_some()
        {
            return Err(CompileError::new(
                "Code generation failed -- ambiguous memory mapping",
            ));
        }
        if let TermKind::Output(name, _) = term.kind() {
            self.add_comment(address, &format!("'{}'", name));
        } else if let Some(provenance) = term.provenance() {
            self.add_comment(address, &format!("'{}'", provenance.outer_text()));
        }
        Ok(())
    }

    fn address_of(&self, term: &RcTerm) -> Result<Address, CompileError> {
        self.mapping
            .get(&Rc::as_ptr(term))
            .copied()
            .ok_or_else(|| CompileError::new("Code generation failed -- missing memory mapping"))
    }

    fn add_comment(&mut self, address: Address, comment: &str) {
        let entry = self.comments.entry(address).or_default();
        if !entry.is_empty() {
            entry.push_str(", ");
        }
        entry.push_str(comment);
    }

    /// Replaces `sin`/`cos` call pairs over the same argument with a fused
    /// `SINCOS` and a `NOP` at the cosine's slot.
    fn fuse_sincos(&mut self) {
        #[derive(Default)]
        struct Candidates {
            sin: Option<usize>,
            cos: Option<usize>,
        }
        let mut candidates: HashMap<Address, Candidates> = HashMap::new();
        for (index, instruction) in self.instructions.code.iter().enumerate() {
            if let Instruction::Call { fun, arg } = *instruction {
                if fun == functions::SIN {
                    candidates.entry(arg).or_default().sin = Some(index);
                }
                if fun == functions::COS {
                    candidates.entry(arg).or_default().cos = Some(index);
                }
            }
        }
        for (arg, candidate) in candidates {
            if let (Some(sin), Some(cos)) = (candidate.sin, candidate.cos) {
                self.instructions.code[sin] = Instruction::SinCos {
                    arg,
                    cos_offset: cos as i32 - sin as i32,
                };
                self.instructions.code[cos] = Instruction::Nop;
            }
        }
    }

    /// Lowers the remaining isolated `sin`/`cos` calls to their dedicated
    /// opcodes for a cheaper scalar dispatch.
    fn lower_sin_cos(&mut self) {
        for instruction in &mut self.instructions.code {
            if let Instruction::Call { fun, arg } = *instruction {
                if fun == functions::SIN {
                    *instruction = Instruction::Sin { arg };
                } else if fun == functions::COS {
                    *instruction = Instruction::Cos { arg };
                }
            }
        }
    }
}

fn sequential(op: GroupOp, positive: bool, lhs: Address, rhs: Address) -> Instruction {
    match (op, positive) {
        (GroupOp::Addition, true) => Instruction::Add { lhs, rhs },
        (GroupOp::Addition, false) => Instruction::Sub { lhs, rhs },
        (GroupOp::Multiplication, true) => Instruction::Mul { lhs, rhs },
        (GroupOp::Multiplication, false) => Instruction::Div { lhs, rhs },
    }
}

fn immediate(op: GroupOp, positive: bool, imm: Real, rhs: Address) -> Instruction {
    match (op, positive) {
        (GroupOp::Addition, true) => Instruction::AddImm { imm, rhs },
        (GroupOp::Addition, false) => Instruction::SubImm { imm, rhs },
        (GroupOp::Multiplication, true) => Instruction::MulImm { imm, rhs },
        (GroupOp::Multiplication, false) => Instruction::DivImm { imm, rhs },
    }
}
