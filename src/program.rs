//! The compiled artifact: constants, instructions and name maps over a
//! single linear memory.
//!
//! Memory layout: address 0 is a scratchpad (aliased by unused inputs),
//! followed by one address per input, the constants, and one address per
//! instruction; instruction `i` writes to `instructions.offset() + i`.

use crate::common::{Real, RealFn};
use crate::diagnostics::CompileError;
use crate::interpreter::{Executable, Vector};

use indexmap::IndexMap;
use std::collections::BTreeMap;

/// An index into program memory.
pub type Address = u32;

/// The constants section of a program.
#[derive(Clone, Debug, Default)]
pub struct Constants {
    pub(crate) offset: Address,
    pub(crate) values: Vec<Real>,
}

impl Constants {
    /// The memory address of the first constant.
    pub fn offset(&self) -> Address {
        self.offset
    }

    pub fn values(&self) -> &[Real] {
        &self.values
    }
}

/// The code section of a program.
#[derive(Clone, Debug, Default)]
pub struct Instructions {
    pub(crate) offset: Address,
    pub(crate) code: Vec<Instruction>,
}

impl Instructions {
    /// The memory address instruction 0 writes to.
    pub fn offset(&self) -> Address {
        self.offset
    }

    pub fn code(&self) -> &[Instruction] {
        &self.code
    }
}

/// One instruction of the linear program.
///
/// Binary forms read two addresses; immediate forms combine a literal with
/// one address, the literal on the left (`SubImm` computes
/// `imm - memory[rhs]`).
#[derive(Copy, Clone, Debug)]
pub enum Instruction {
    Nop,
    Add { lhs: Address, rhs: Address },
    AddImm { imm: Real, rhs: Address },
    Sub { lhs: Address, rhs: Address },
    SubImm { imm: Real, rhs: Address },
    Mul { lhs: Address, rhs: Address },
    MulImm { imm: Real, rhs: Address },
    Div { lhs: Address, rhs: Address },
    DivImm { imm: Real, rhs: Address },
    Pow { base: Address, exp: Address },
    Call { fun: RealFn, arg: Address },
    Sin { arg: Address },
    Cos { arg: Address },
    /// Writes the sine to its own slot and the cosine `cos_offset`
    /// instructions ahead.
    SinCos { arg: Address, cos_offset: i32 },
}

impl PartialEq for Instruction {
    fn eq(&self, other: &Self) -> bool {
        use Instruction::*;
        match (self, other) {
            // NOPs are never merged.
            (Nop, Nop) => false,
            (Add { lhs: a, rhs: b }, Add { lhs: c, rhs: d }) => a == c && b == d,
            (Sub { lhs: a, rhs: b }, Sub { lhs: c, rhs: d }) => a == c && b == d,
            (Mul { lhs: a, rhs: b }, Mul { lhs: c, rhs: d }) => a == c && b == d,
            (Div { lhs: a, rhs: b }, Div { lhs: c, rhs: d }) => a == c && b == d,
            (AddImm { imm: a, rhs: b }, AddImm { imm: c, rhs: d }) => a == c && b == d,
            (SubImm { imm: a, rhs: b }, SubImm { imm: c, rhs: d }) => a == c && b == d,
            (MulImm { imm: a, rhs: b }, MulImm { imm: c, rhs: d }) => a == c && b == d,
            (DivImm { imm: a, rhs: b }, DivImm { imm: c, rhs: d }) => a == c && b == d,
            (Pow { base: a, exp: b }, Pow { base: c, exp: d }) => a == c && b == d,
            (Call { fun: f, arg: a }, Call { fun: g, arg: b }) => *f == *g && a == b,
            (Sin { arg: a }, Sin { arg: b }) => a == b,
            (Cos { arg: a }, Cos { arg: b }) => a == b,
            (SinCos { arg: a, cos_offset: x }, SinCos { arg: b, cos_offset: y }) => {
                a == b && x == y
            }
            _ => false,
        }
    }
}

/// A compiled, immutable program.
///
/// Evaluation happens through per-thread [Executable] contexts; any number
/// of them may run over the same program in parallel.
#[derive(Clone, Debug)]
pub struct Program {
    inputs: IndexMap<String, Address>,
    outputs: IndexMap<String, Address>,
    constants: Constants,
    instructions: Instructions,
    comments: BTreeMap<Address, String>,
}

impl Program {
    /// The scratchpad address, aliased by unused inputs; its value is never
    /// read by any meaningful instruction.
    pub const SCRATCHPAD_ADDRESS: Address = 0;

    pub(crate) fn new(
        inputs: IndexMap<String, Address>,
        outputs: IndexMap<String, Address>,
        constants: Constants,
        instructions: Instructions,
        comments: BTreeMap<Address, String>,
    ) -> Result<Self, CompileError> {
        if !constants.values.is_empty()
            && (constants.offset <= Self::SCRATCHPAD_ADDRESS
                || constants.offset + constants.values.len() as Address > instructions.offset)
        {
            return Err(CompileError::new(
                "Code generation failed -- constants overlap another section",
            ));
        }
        let in_constants = |address: Address| {
            address >= constants.offset
                && address < constants.offset + constants.values.len() as Address
        };
        if inputs
            .values()
            .any(|&address| address >= instructions.offset || in_constants(address))
        {
            return Err(CompileError::new(
                "Code generation failed -- input mapped into a reserved section",
            ));
        }
        if outputs
            .values()
            .any(|&address| address == Self::SCRATCHPAD_ADDRESS)
        {
            return Err(CompileError::new(
                "Code generation failed -- output mapped to the scratch-pad",
            ));
        }
        Ok(Self {
            inputs,
            outputs,
            constants,
            instructions,
            comments,
        })
    }

    /// The input name → address map.
    pub fn inputs(&self) -> &IndexMap<String, Address> {
        &self.inputs
    }

    /// The output name → address map.
    pub fn outputs(&self) -> &IndexMap<String, Address> {
        &self.outputs
    }

    pub fn constants(&self) -> &Constants {
        &self.constants
    }

    pub fn instructions(&self) -> &Instructions {
        &self.instructions
    }

    /// Human-readable annotations per memory address.
    pub fn comments(&self) -> &BTreeMap<Address, String> {
        &self.comments
    }

    pub fn input_address(&self, name: &str) -> Option<Address> {
        self.inputs.get(name).copied()
    }

    pub fn output_address(&self, name: &str) -> Option<Address> {
        self.outputs.get(name).copied()
    }

    /// The number of memory words an executable needs.
    pub fn memory_size(&self) -> usize {
        self.instructions.offset as usize + self.instructions.code.len()
    }

    /// A fresh scalar evaluation context.
    pub fn scalar_executable(&self) -> Executable<'_, Real> {
        Executable::new(self)
    }

    /// A fresh 4-lane vector evaluation context.
    pub fn vector_executable(&self) -> Executable<'_, Vector> {
        Executable::new(self)
    }
}
