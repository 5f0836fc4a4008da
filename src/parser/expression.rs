//! The recursive precedence parser for expressions.

use super::{Expression, TokenCursor};
use crate::ast::{BinaryOp, Node, NodeKind, UnaryOp};
use crate::common::Span;
use crate::diagnostics::ParseError;
use crate::scanner::{Token, TokenType};
use crate::symbols::Lexicon;

use std::rc::Rc;

/// Parses `input` against `lexicon` into an [Expression].
///
/// A parse failure is captured inside the returned expression rather than
/// surfaced as an error; the caller decides when to report it.
pub fn parse_expression(input: &str, lexicon: &Lexicon) -> Expression {
    let source: Rc<str> = Rc::from(input);
    match parse_to_tree(&source, lexicon) {
        Ok(root) => Expression::ok(source, root),
        Err(error) => Expression::errored(source, error),
    }
}

/// Parses `input` into a syntax tree, surfacing failures directly.
fn parse_to_tree(input: &str, lexicon: &Lexicon) -> Result<Rc<Node>, ParseError> {
    ExpressionParser {
        cur: TokenCursor::new(input),
        lexicon,
    }
    .parse()
}

fn span_of(token: &Token<'_>) -> Span {
    Span::from((token.pos, token.end()))
}

struct ExpressionParser<'a> {
    cur: TokenCursor<'a>,
    lexicon: &'a Lexicon,
}

type ParseStage<'a> = fn(&mut ExpressionParser<'a>) -> Result<Node, ParseError>;

impl<'a> ExpressionParser<'a> {
    fn parse(mut self) -> Result<Rc<Node>, ParseError> {
        let root = self.parse_l4()?;
        self.cur.expect(TokenType::End, None)?;
        Ok(Rc::new(root))
    }

    /// Parses a single unary operator.
    ///
    /// Unary operators do not sequence; `--x` is not a valid construct.
    fn parse_unary(
        &mut self,
        mapping: &[(TokenType, UnaryOp)],
        next: ParseStage<'a>,
    ) -> Result<Node, ParseError> {
        let start = self.cur.next().clone();
        for &(ty, op) in mapping {
            if self.cur.accept(ty) {
                let operand = next(self)?;
                let outer = Span::from((start.pos, self.cur.last().end()));
                return Ok(Node::new(
                    NodeKind::UnaryOperator(op, Rc::new(operand)),
                    span_of(&start),
                    outer,
                ));
            }
        }
        next(self)
    }

    /// Parses a sequence of binary operators.
    ///
    /// Sequenced operators associate left-to-right; `x-y-z` is `(x-y)-z`.
    fn parse_binary(
        &mut self,
        mapping: &[(TokenType, BinaryOp)],
        next: ParseStage<'a>,
    ) -> Result<Node, ParseError> {
        let start_pos = self.cur.next().pos;
        let mut prefix = next(self)?;
        'chain: loop {
            let inner = span_of(self.cur.next());
            for &(ty, op) in mapping {
                if self.cur.accept(ty) {
                    let postfix = next(self)?;
                    let outer = Span::from((start_pos, self.cur.last().end()));
                    prefix = Node::new(
                        NodeKind::BinaryOperator(op, Rc::new(prefix), Rc::new(postfix)),
                        inner,
                        outer,
                    );
                    continue 'chain;
                }
            }
            break;
        }
        Ok(prefix)
    }

    /// L0 stage (highest priority): identifiers, functions and brackets.
    fn parse_l0(&mut self) -> Result<Node, ParseError> {
        let start = self.cur.next().clone();
        if self.cur.accept(TokenType::Identifier) {
            let ident = self.cur.last().clone();
            return match self.lexicon.find(ident.text) {
                Some(symbol) if symbol.is_value() => Ok(Node::new(
                    NodeKind::Value(symbol),
                    span_of(&ident),
                    span_of(&ident),
                )),
                Some(symbol) => {
                    self.cur.expect(TokenType::ParenLeft, Some("Expected '('"))?;
                    let argument = self.parse_l4()?;
                    self.cur.expect(TokenType::ParenRight, Some("Expected ')'"))?;
                    let outer = Span::from((ident.pos, self.cur.last().end()));
                    Ok(Node::new(
                        NodeKind::UnaryFunction(symbol, Rc::new(argument)),
                        span_of(&ident),
                        outer,
                    ))
                }
                None => self.cur.fail(
                    format!("Unknown symbol '{}'", ident.text),
                    Some(ident.pos),
                ),
            };
        }
        if self.cur.accept(TokenType::Number) {
            let token = self.cur.last().clone();
            return Ok(Node::new(
                NodeKind::Literal(token.value),
                span_of(&token),
                span_of(&token),
            ));
        }
        if self.cur.accept(TokenType::ParenLeft) {
            let mut infix = self.parse_l4()?;
            self.cur.expect(TokenType::ParenRight, Some("Expected ')'"))?;
            infix.outer = Span::from((start.pos, self.cur.last().end()));
            return Ok(infix);
        }
        if self.cur.accept(TokenType::BracketLeft) {
            let mut infix = self.parse_l4()?;
            self.cur
                .expect(TokenType::BracketRight, Some("Expected ']'"))?;
            infix.outer = Span::from((start.pos, self.cur.last().end()));
            return Ok(infix);
        }
        if self.cur.next().is_end() {
            self.cur.fail("Unexpected end of input".to_owned(), None)
        } else {
            self.cur
                .fail(format!("Unexpected '{}'", self.cur.next().text), None)
        }
    }

    /// L1 stage: the binary `^` operator.
    fn parse_l1(&mut self) -> Result<Node, ParseError> {
        self.parse_binary(&[(TokenType::Caret, BinaryOp::Caret)], Self::parse_l0)
    }

    /// L2 stage: the unary `+` and `-` operators.
    fn parse_l2(&mut self) -> Result<Node, ParseError> {
        self.parse_unary(
            &[
                (TokenType::Plus, UnaryOp::Plus),
                (TokenType::Minus, UnaryOp::Minus),
            ],
            Self::parse_l1,
        )
    }

    /// L3 stage: the binary `*` and `/` operators.
    fn parse_l3(&mut self) -> Result<Node, ParseError> {
        self.parse_binary(
            &[
                (TokenType::Asterisk, BinaryOp::Asterisk),
                (TokenType::Slash, BinaryOp::Slash),
            ],
            Self::parse_l2,
        )
    }

    /// L4 stage (lowest priority): the binary `+` and `-` operators.
    fn parse_l4(&mut self) -> Result<Node, ParseError> {
        self.parse_binary(
            &[
                (TokenType::Plus, BinaryOp::Plus),
                (TokenType::Minus, BinaryOp::Minus),
            ],
            Self::parse_l3,
        )
    }
}

#[cfg(test)]
mod tests {
    use crate::emit::Notation;
    use crate::parser::parse_expression;
    use crate::symbols::{Lexicon, Symbol};

    fn lexicon() -> Lexicon {
        let mut lexicon = Lexicon::new();
        lexicon.add(Symbol::function("sin", f64::sin)).unwrap();
        lexicon.add(Symbol::function("cos", f64::cos)).unwrap();
        lexicon.add(Symbol::variable("x")).unwrap();
        lexicon.add(Symbol::variable("y")).unwrap();
        lexicon.add(Symbol::variable("z")).unwrap();
        lexicon.add(Symbol::constant("two", 2.0)).unwrap();
        lexicon
    }

    // Tests the parser's output against the prefix (Polish) stringification
    // of the expected tree.
    macro_rules! parser_tests {
        ($($name:ident: $program:expr, $prefix:expr)*) => {
        $(
            #[test]
            fn $name() {
                let expr = parse_expression($program, &lexicon());
                assert!(expr.is_ok(), "{:?}", expr.error());
                assert_eq!(expr.stringify(Notation::Prefix).unwrap(), $prefix);
            }
        )*
        }
    }

    mod parse {
        use super::lexicon;
        use crate::emit::Notation;
        use crate::parser::parse_expression;

        parser_tests! {
            number:                  "2",           "2"
            variable:                "x",           "x"
            named_constant:          "two",         "two"
            addition:                "2 + 2",       "+ 2 2"
            subtraction:             "2 - 2",       "- 2 2"
            multiplication:          "2 * 2",       "* 2 2"
            division:                "2 / 2",       "/ 2 2"
            exponentiation:          "2 ^ 5",       "^ 2 5"
            precedence_plus_times:   "1 + 2 * 3",   "+ 1 * 2 3"
            precedence_times_plus:   "1 * 2 + 3",   "+ * 1 2 3"
            precedence_times_caret:  "1 * 2 ^ 3",   "* 1 ^ 2 3"
            left_assoc_minus:        "1 - 2 - 3",   "- - 1 2 3"
            left_assoc_caret:        "2 ^ 3 ^ 2",   "^ ^ 2 3 2"
            unary_minus:             "-x",          "u- x"
            unary_plus:              "+x",          "u+ x"
            unary_binds_below_caret: "-x ^ 2",      "u- ^ x 2"
            unary_in_product:        "2 * -x",      "* 2 u- x"
            parens:                  "(1 + 2) * 3", "* + 1 2 3"
            brackets:                "[1 + 2] / 3", "/ + 1 2 3"
            mixed_brackets:          "[x + (y * z)]", "+ x * y z"
            function:                "sin(x)",      "sin x"
            function_nested:         "cos(sin(x + y))", "cos sin + x y"
        }
    }

    macro_rules! parser_error_tests {
        ($($name:ident: $program:expr, $message:expr, $position:expr)*) => {
        $(
            #[test]
            fn $name() {
                let expr = parse_expression($program, &lexicon());
                let error = expr.error().expect("expected a parse failure");
                assert_eq!(error.message, $message);
                assert_eq!(error.position, $position);
            }
        )*
        }
    }

    mod parse_invalid {
        use super::lexicon;
        use crate::parser::parse_expression;

        parser_error_tests! {
            unknown_symbol:         "x + foo",     "Unknown symbol 'foo'", 4
            missing_close_paren:    "(x + y",      "Expected ')'", 6
            mismatched_brackets:    "[x + y)",     "Expected ']'", 6
            function_needs_parens:  "sin x",       "Expected '('", 4
            double_unary:           "--x",         "Unexpected '-'", 1
            trailing_tokens:        "x + y y",     "Unexpected 'y'", 6
            empty_input:            "",            "Unexpected end of input", 0
            dangling_operator:      "x +",         "Unexpected end of input", 3
        }
    }

    #[test]
    fn infix_stringification_is_idempotent() {
        let lexicon = lexicon();
        for program in [
            "x + y * z",
            "(x + y) * z",
            "[x + y] * z",
            "-(x - y)",
            "x - (y - z)",
            "2 ^ 3 ^ 2",
            "x / y / z",
            "sin(x)^2 + cos(x)^2",
            "-x^2 * (y + 1)",
        ] {
            let once = parse_expression(program, &lexicon)
                .stringify(Notation::Infix)
                .unwrap();
            let twice = parse_expression(&once, &lexicon)
                .stringify(Notation::Infix)
                .unwrap();
            assert_eq!(once, twice, "program: {program}");
        }
    }

    #[test]
    fn prefix_and_postfix_are_parenthesis_free() {
        let lexicon = lexicon();
        let expr = parse_expression("((x + y) * cos(z)) ^ 2", &lexicon);
        assert_eq!(expr.stringify(Notation::Prefix).unwrap(), "^ * + x y cos z 2");
        assert_eq!(expr.stringify(Notation::Postfix).unwrap(), "x y + z cos * 2 ^");
    }

    #[test]
    fn outer_spans_include_brackets() {
        let lexicon = lexicon();
        let expr = parse_expression(" (x + y) ", &lexicon);
        let root = expr.root().unwrap();
        assert_eq!(root.outer.over(expr.input()), "(x + y)");
        assert_eq!(root.inner.over(expr.input()), "+");
    }
}
