//! The line-oriented parser for declaration scripts.

use super::TokenCursor;
use crate::compiler::{Compiler, Visibility};
use crate::diagnostics::{Error, ParseError};
use crate::scanner::TokenType;

/// Parses declaration scripts into a [Compiler].
pub(crate) struct ScriptParser<'c> {
    compiler: &'c mut Compiler,
}

impl<'c> ScriptParser<'c> {
    pub fn new(compiler: &'c mut Compiler) -> Self {
        Self { compiler }
    }

    /// Parses a whole script, line by line.
    ///
    /// Parse failures are reported in whole-script byte coordinates.
    pub fn parse_script(&mut self, input: &str) -> Result<(), Error> {
        let mut start = 0;
        loop {
            let rest = &input[start..];
            let end = rest.find('\n').map(|i| start + i).unwrap_or(input.len());
            self.parse_line(&input[start..end]).map_err(|error| match error {
                Error::Parse(parse) => Error::Parse(parse.offset(start)),
                other => other,
            })?;
            if end == input.len() {
                return Ok(());
            }
            start = end + 1;
        }
    }

    /// Parses a single script line.
    pub fn parse_line(&mut self, line: &str) -> Result<(), Error> {
        // Truncate line comments.
        let line = &line[..line.find('#').unwrap_or(line.len())];
        let mut cur = TokenCursor::new(line);
        while cur.accept(TokenType::Identifier) {
            match cur.last().text {
                "const" => {
                    cur.expect(TokenType::Identifier, None)?;
                    let name = cur.last().text;
                    cur.expect(TokenType::Equals, None)?;
                    cur.expect(TokenType::Number, None)?;
                    self.compiler.add_constant(name, cur.last().value)?;
                    break;
                }
                "param" => {
                    cur.expect(TokenType::Identifier, None)?;
                    let name = cur.last().text;
                    let mut value = 0.0;
                    if cur.accept(TokenType::Equals) {
                        cur.expect(TokenType::Number, None)?;
                        value = cur.last().value;
                    }
                    self.compiler.add_parameter(name, value)?;
                    break;
                }
                "input" => {
                    cur.expect(TokenType::Identifier, None)?;
                    self.compiler.add_variable(cur.last().text)?;
                    break;
                }
                _ => {
                    let visibility = if cur.last().text == "output" {
                        cur.expect(TokenType::Identifier, None)?;
                        Visibility::Public
                    } else {
                        Visibility::Symbolic
                    };
                    let name = cur.last().text;
                    cur.expect(TokenType::Equals, None)?;
                    // The right-hand side is taken verbatim from the character
                    // after the `=` to the end of the line.
                    let offset = cur.last().end();
                    let expression =
                        self.compiler
                            .add_expression(name, &line[offset..], visibility)?;
                    if let Some(error) = expression.error() {
                        return Err(ParseError::new(error.message.clone(), error.position + offset)
                            .into());
                    }
                    return Ok(());
                }
            }
        }
        cur.expect(TokenType::End, None)?;
        Ok(())
    }
}
