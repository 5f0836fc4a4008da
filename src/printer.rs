//! Plain-text dumps of the syntax tree, the semantic graph and compiled
//! programs, for diagnostics and external tools.

use crate::asg::{descend_term, Group, GroupOp, RcTerm, Term, TermVisitor};
use crate::ast::{BinaryOp, Node, NodeVisitor, UnaryOp};
use crate::common::Real;
use crate::parser::Expression;
use crate::program::{Address, Instruction, Program};
use crate::symbols::{Symbol, SymbolKind};

use std::collections::HashMap;
use std::fmt::Write;
use std::rc::Rc;

// Renders the `  +-` / `  | ` scaffolding of a tree listing.
#[derive(Default)]
struct TreePrinter {
    indents: Vec<usize>,
}

impl TreePrinter {
    fn line(&mut self, text: &str) -> String {
        let mut result = String::new();
        for (i, &indent) in self.indents.iter().enumerate() {
            if indent > 0 {
                result.push_str(if i + 1 < self.indents.len() {
                    "  | "
                } else {
                    "  +-"
                });
            } else {
                result.push_str("    ");
            }
        }
        result.push_str(text);
        if let Some(last) = self.indents.last_mut() {
            *last = last.saturating_sub(1);
        }
        result
    }

    fn enter(&mut self, children: usize) {
        self.indents.push(children);
    }

    fn leave(&mut self) {
        self.indents.pop();
    }
}

/// Renders the syntax tree of `expression`, one node per line.
pub fn print_syntax_tree(expression: &Expression) -> String {
    let mut visitor = DumpAst {
        source: expression.input().to_owned(),
        printer: TreePrinter::default(),
        out: String::new(),
    };
    if !expression.visit(&mut visitor) {
        if let Some(error) = expression.error() {
            return format!("*** Error: {}.\n", error);
        }
    }
    visitor.out
}

struct DumpAst {
    source: String,
    printer: TreePrinter,
    out: String,
}

impl DumpAst {
    fn row(&mut self, node: &Node, name: &str) {
        let text = node.inner.over(&self.source);
        let line = self.printer.line(&format!("{} '{}'", name, text));
        let _ = writeln!(self.out, "{}", line);
    }
}

impl NodeVisitor for DumpAst {
    fn visit_literal(&mut self, node: &Rc<Node>, _value: Real) {
        self.row(node, "Literal");
    }

    fn visit_value(&mut self, node: &Rc<Node>, symbol: &Rc<Symbol>) {
        let kind = match symbol.kind() {
            SymbolKind::Constant(_) => "Constant",
            SymbolKind::Parameter(_) => "Parameter",
            SymbolKind::Variable => "Variable",
            SymbolKind::Expression(_) => "Expression",
            SymbolKind::Function(_) => "Function",
        };
        self.row(node, &format!("Value -> {}", kind));
    }

    fn visit_unary_function(&mut self, node: &Rc<Node>, _symbol: &Rc<Symbol>, argument: &Rc<Node>) {
        self.row(node, "UnaryFunction");
        self.printer.enter(1);
        self.visit_node(argument);
        self.printer.leave();
    }

    fn visit_unary_operator(&mut self, node: &Rc<Node>, _op: UnaryOp, operand: &Rc<Node>) {
        self.row(node, "UnaryOperator");
        self.printer.enter(1);
        self.visit_node(operand);
        self.printer.leave();
    }

    fn visit_binary_operator(
        &mut self,
        node: &Rc<Node>,
        _op: BinaryOp,
        lhs: &Rc<Node>,
        rhs: &Rc<Node>,
    ) {
        self.row(node, "BinaryOperator");
        self.printer.enter(2);
        self.visit_node(lhs);
        self.visit_node(rhs);
        self.printer.leave();
    }
}

/// Renders the semantic graph below `root`; shared terms are printed once
/// and referenced by id afterwards.
pub fn print_semantic_graph(root: &RcTerm) -> String {
    let mut visitor = DumpAsg {
        ids: HashMap::new(),
        printer: TreePrinter::default(),
        out: String::new(),
    };
    visitor.visit_term(root);
    visitor.out
}

struct DumpAsg {
    ids: HashMap<*const Term, usize>,
    printer: TreePrinter,
    out: String,
}

impl DumpAsg {
    fn row(&mut self, term: &RcTerm, text: &str) {
        let id = self.ids.len() + 1;
        let id = *self.ids.entry(Rc::as_ptr(term)).or_insert(id);
        let line = self.printer.line(text);
        let _ = writeln!(self.out, "[{:04}] {} {}", id, term.depth(), line);
    }

    fn plain_row(&mut self, text: &str) {
        let line = self.printer.line(text);
        let _ = writeln!(self.out, "         {}", line);
    }

    fn group(&mut self, term: &RcTerm, name: &str, op: GroupOp, group: &Group) {
        self.row(term, name);
        let (positive_sign, negative_sign) = op.signs();
        let has_constant = group.constant_value() != op.identity();
        let children = usize::from(has_constant)
            + usize::from(!group.positive().is_empty())
            + usize::from(!group.negative().is_empty());
        self.printer.enter(children);
        if has_constant {
            self.visit_term(group.constant());
        }
        if !group.positive().is_empty() {
            self.plain_row(&format!("{{ {} }}", positive_sign));
            self.printer.enter(group.positive().len());
            for child in group.positive() {
                self.visit_term(child);
            }
            self.printer.leave();
        }
        if !group.negative().is_empty() {
            self.plain_row(&format!("{{ {} }}", negative_sign));
            self.printer.enter(group.negative().len());
            for child in group.negative() {
                self.visit_term(child);
            }
            self.printer.leave();
        }
        self.printer.leave();
    }
}

impl TermVisitor for DumpAsg {
    fn visit_term(&mut self, term: &RcTerm) {
        if let Some(&id) = self.ids.get(&Rc::as_ptr(term)) {
            self.row(term, &format!("->[{:04}]", id));
            return;
        }
        descend_term(self, term);
    }

    fn visit_constant(&mut self, term: &RcTerm, value: Real) {
        self.row(term, &format!("Constant ({})", value));
    }

    fn visit_input(&mut self, term: &RcTerm, name: &str) {
        self.row(term, &format!("Input ({})", name));
    }

    fn visit_output(&mut self, term: &RcTerm, name: &str, child: &RcTerm) {
        self.row(term, &format!("Output ({})", name));
        self.printer.enter(1);
        self.visit_term(child);
        self.printer.leave();
    }

    fn visit_sequence(&mut self, term: &RcTerm, terms: &[RcTerm]) {
        self.row(term, "Sequence");
        self.printer.enter(terms.len());
        for child in terms {
            self.visit_term(child);
        }
        self.printer.leave();
    }

    fn visit_unary_function(&mut self, term: &RcTerm, fun: crate::common::RealFn, argument: &RcTerm) {
        self.row(term, &format!("UnaryFunction ({:#x})", fun as usize));
        self.printer.enter(1);
        self.visit_term(argument);
        self.printer.leave();
    }

    fn visit_addition(&mut self, term: &RcTerm, group: &Group) {
        self.group(term, "Addition", GroupOp::Addition, group);
    }

    fn visit_multiplication(&mut self, term: &RcTerm, group: &Group) {
        self.group(term, "Multiplication", GroupOp::Multiplication, group);
    }

    fn visit_exponentiation(&mut self, term: &RcTerm, base: &RcTerm, exponent: &RcTerm) {
        self.row(term, "Exponentiation");
        self.printer.enter(2);
        self.visit_term(base);
        self.visit_term(exponent);
        self.printer.leave();
    }

    fn visit_squaring(&mut self, term: &RcTerm, base: &RcTerm) {
        self.row(term, "Squaring");
        self.printer.enter(1);
        self.visit_term(base);
        self.printer.leave();
    }
}

/// Renders the program's data section and disassembly with comments.
pub fn print_program(program: &Program) -> String {
    let address = |a: Address| format!("[{:03}]", a);
    let comment = |a: Address| match program.comments().get(&a) {
        Some(text) => format!("  ; {}", text),
        None => String::new(),
    };

    let constants = program.constants();
    let code_section = program.instructions().offset();
    let mut out = String::new();

    let _ = writeln!(out, "{} .data", address(0));
    for addr in 0..code_section {
        let value = if addr >= constants.offset()
            && addr < constants.offset() + constants.values().len() as Address
        {
            format!("{}", constants.values()[(addr - constants.offset()) as usize])
        } else {
            "?".to_owned()
        };
        let _ = writeln!(out, "{}  word  {}{}", address(addr), value, comment(addr));
    }

    let _ = writeln!(out, "{} .start", address(code_section));
    for (index, instruction) in program.instructions().code().iter().enumerate() {
        let addr = code_section + index as Address;
        let (mnemonic, arguments) = match *instruction {
            Instruction::Nop => ("nop", String::new()),
            Instruction::Add { lhs, rhs } => ("add", format!("{}, {}", address(lhs), address(rhs))),
            Instruction::AddImm { imm, rhs } => ("add", format!("{}, {}", imm, address(rhs))),
            Instruction::Sub { lhs, rhs } => ("sub", format!("{}, {}", address(lhs), address(rhs))),
            Instruction::SubImm { imm, rhs } => ("sub", format!("{}, {}", imm, address(rhs))),
            Instruction::Mul { lhs, rhs } => ("mul", format!("{}, {}", address(lhs), address(rhs))),
            Instruction::MulImm { imm, rhs } => ("mul", format!("{}, {}", imm, address(rhs))),
            Instruction::Div { lhs, rhs } => ("div", format!("{}, {}", address(lhs), address(rhs))),
            Instruction::DivImm { imm, rhs } => ("div", format!("{}, {}", imm, address(rhs))),
            Instruction::Pow { base, exp } => ("pow", format!("{}, {}", address(base), address(exp))),
            Instruction::Call { fun, arg } => {
                ("call", format!("{:#x}, {}", fun as usize, address(arg)))
            }
            Instruction::Sin { arg } => ("sin", address(arg)),
            Instruction::Cos { arg } => ("cos", address(arg)),
            Instruction::SinCos { arg, cos_offset } => {
                ("sincos", format!("${:+}, {}", cos_offset, address(arg)))
            }
        };
        let _ = writeln!(
            out,
            "{}  {:<6}{}{}",
            address(addr),
            mnemonic,
            arguments,
            comment(addr)
        );
    }
    out
}
