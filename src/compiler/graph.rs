//! Lowering of syntax trees into the semantic graph.

use crate::ast::{BinaryOp, Node, NodeKind, UnaryOp};
use crate::asg::{Group, GroupOp, Provenance, RcTerm, Term};
use crate::diagnostics::CompileError;
use crate::parser::Expression;
use crate::symbols::SymbolKind;

use std::rc::Rc;

/// Builds the graph root (a `Sequence` of `Output`s) from the registered
/// output expressions.
pub(crate) fn build<'a, I>(outputs: I) -> Result<RcTerm, CompileError>
where
    I: Iterator<Item = (&'a str, &'a Expression)>,
{
    let mut roots = Vec::new();
    for (name, expression) in outputs {
        let term = lower_output(expression)
            .map_err(|error| CompileError::new(format!("Output '{}': {}", name, error.message)))?;
        roots.push(Term::output(name, term));
    }
    Ok(Term::sequence(roots))
}

fn lower_output(expression: &Expression) -> Result<RcTerm, CompileError> {
    match expression.root() {
        Some(root) => lower(root, &expression.source()),
        None => match expression.error() {
            Some(error) => Err(CompileError::new(error.to_string())),
            None => Err(CompileError::new("Uninitialized expression")),
        },
    }
}

/// Lowers one AST node into a term, recording provenance on every term
/// emitted.
///
/// Negation is represented as `-1*x` rather than `0-x`; the multiplicative
/// shape lets downstream passes fuse it with surrounding multiplications.
fn lower(node: &Rc<Node>, source: &Rc<str>) -> Result<RcTerm, CompileError> {
    let term = match &node.kind {
        NodeKind::Literal(value) => Term::constant(*value),
        NodeKind::Value(symbol) => match symbol.kind() {
            SymbolKind::Constant(value) => Term::constant(*value),
            SymbolKind::Parameter(value) => Term::constant(value.get()),
            SymbolKind::Variable => Term::input(symbol.name()),
            SymbolKind::Expression(expression) => {
                // Symbolic substitution: lower the embedded tree in place.
                return lower_output(expression);
            }
            SymbolKind::Function(_) => {
                return Err(CompileError::new("Unhandled value symbol type"));
            }
        },
        NodeKind::UnaryFunction(symbol, argument) => {
            let fun = symbol
                .as_function()
                .ok_or_else(|| CompileError::new("Unhandled function symbol type"))?;
            Term::unary_function(fun, lower(argument, source)?)
        }
        NodeKind::UnaryOperator(UnaryOp::Plus, operand) => return lower(operand, source),
        NodeKind::UnaryOperator(UnaryOp::Minus, operand) => Term::multiplication(Group::new(
            GroupOp::Multiplication,
            Some(Term::constant(-1.0)),
            vec![lower(operand, source)?],
            vec![],
        )),
        NodeKind::BinaryOperator(op, lhs, rhs) => {
            let left = lower(lhs, source)?;
            let right = lower(rhs, source)?;
            match op {
                BinaryOp::Plus => {
                    Term::addition(Group::new(GroupOp::Addition, None, vec![left, right], vec![]))
                }
                BinaryOp::Minus => Term::addition(Group::new(
                    GroupOp::Addition,
                    None,
                    vec![left],
                    vec![right],
                )),
                BinaryOp::Asterisk => Term::multiplication(Group::new(
                    GroupOp::Multiplication,
                    None,
                    vec![left, right],
                    vec![],
                )),
                BinaryOp::Slash => Term::multiplication(Group::new(
                    GroupOp::Multiplication,
                    None,
                    vec![left],
                    vec![right],
                )),
                BinaryOp::Caret => Term::exponentiation(left, right),
            }
        }
    };
    term.set_provenance(Provenance {
        node: Rc::clone(node),
        source: Rc::clone(source),
    });
    Ok(term)
}

#[cfg(test)]
mod tests {
    use crate::asg::TermKind;
    use crate::compiler::{Compiler, Visibility};

    fn graph_key(source: &str, expression: &str) -> String {
        let mut compiler = Compiler::with_builtins();
        compiler.add_source_script(source).unwrap();
        compiler
            .add_expression("out", expression, Visibility::Private)
            .unwrap();
        compiler.make_graph().unwrap().key().to_owned()
    }

    #[test]
    fn negation_lowers_as_multiplication_by_minus_one() {
        assert_eq!(graph_key("input x", "-x"), "out[-1*(x)]");
    }

    #[test]
    fn unary_plus_lowers_transparently() {
        assert_eq!(graph_key("input x", "+x"), "out[x]");
    }

    #[test]
    fn binary_operators_lower_to_groups() {
        assert_eq!(graph_key("input x", "x - 1"), "out[0+(x)-(1)]");
        assert_eq!(graph_key("input x", "x / 2"), "out[1*(x)/(2)]");
    }

    #[test]
    fn constants_and_parameters_inline() {
        assert_eq!(graph_key("const c = 2.5", "c"), "out[2.5]");
        assert_eq!(graph_key("param p = 4", "p"), "out[4]");
    }

    #[test]
    fn symbolic_expressions_substitute() {
        let mut compiler = Compiler::new();
        compiler.add_variable("x").unwrap();
        compiler
            .add_expression("a", "x + 1", Visibility::Symbolic)
            .unwrap();
        compiler
            .add_expression("y", "a * a", Visibility::Private)
            .unwrap();
        let graph = compiler.make_graph().unwrap();
        assert_eq!(graph.key(), "y[1*(0+(1)+(x))*(0+(1)+(x))]");
    }

    #[test]
    fn provenance_points_at_source_text() {
        let mut compiler = Compiler::new();
        compiler.add_variable("x").unwrap();
        compiler
            .add_expression("y", "x + 1", Visibility::Private)
            .unwrap();
        let graph = compiler.make_graph().unwrap();
        let output = match graph.kind() {
            TermKind::Sequence(terms) => terms[0].clone(),
            other => panic!("expected a sequence, got {other:?}"),
        };
        let sum = match output.kind() {
            TermKind::Output(_, child) => child.clone(),
            other => panic!("expected an output, got {other:?}"),
        };
        assert_eq!(sum.provenance().unwrap().outer_text(), "x + 1");
    }
}
