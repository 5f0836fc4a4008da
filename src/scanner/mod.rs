//! The axon scanner, turning source text into a token stream.

pub mod types;

pub use types::*;

// Deliberately hard-coded instead of `char::is_whitespace`, which is
// Unicode-aware; the expression language is ASCII.
fn is_space(ch: char) -> bool {
    matches!(ch, ' ' | '\t' | '\n' | '\r')
}

fn is_digit(ch: char) -> bool {
    ch.is_ascii_digit()
}

fn is_letter(ch: char) -> bool {
    ch.is_ascii_alphabetic() || ch == '_'
}

/// A single-pass tokenizer over a source text.
///
/// Tokens are pulled one at a time with [Tokenizer::next_token]; the scan
/// ends with a [TokenType::End] sentinel.
pub struct Tokenizer<'a> {
    input: &'a str,
    pos: usize,
}

impl<'a> Tokenizer<'a> {
    pub fn new(input: &'a str) -> Self {
        Self { input, pos: 0 }
    }

    pub fn input(&self) -> &'a str {
        self.input
    }

    /// The current byte position of the scan cursor.
    pub fn position(&self) -> usize {
        self.pos
    }

    #[inline]
    fn peek(&self) -> Option<char> {
        self.input[self.pos..].chars().next()
    }

    fn eat_while(&mut self, pred: fn(char) -> bool) {
        while let Some(ch) = self.peek() {
            if !pred(ch) {
                break;
            }
            self.pos += ch.len_utf8();
        }
    }

    pub fn next_token(&mut self) -> Token<'a> {
        self.eat_while(is_space);
        let start = self.pos;
        let ch = match self.peek() {
            Some(ch) => ch,
            None => return Token::new(TokenType::End, "", start),
        };
        self.pos += ch.len_utf8();

        let mut value = 0.0;
        let ty = match ch {
            '=' => TokenType::Equals,
            '+' => TokenType::Plus,
            '-' => TokenType::Minus,
            '*' => TokenType::Asterisk,
            '/' => TokenType::Slash,
            '^' => TokenType::Caret,
            '(' => TokenType::ParenLeft,
            ')' => TokenType::ParenRight,
            '[' => TokenType::BracketLeft,
            ']' => TokenType::BracketRight,
            _ if is_digit(ch) => {
                value = self.scan_number(start);
                TokenType::Number
            }
            _ if is_letter(ch) => {
                self.eat_while(|c| is_letter(c) || is_digit(c));
                TokenType::Identifier
            }
            _ => TokenType::Unknown,
        };
        Token {
            ty,
            text: &self.input[start..self.pos],
            pos: start,
            value,
        }
    }

    /// Scans the remainder of a decimal number whose first digit has already
    /// been consumed, advancing the cursor past exactly the accepted text.
    ///
    /// The accepted grammar is `digits [. digits] [(e|E) [+|-] digits]`; an
    /// exponent marker without at least one following digit is left for the
    /// next token, so `1.0f-1` scans as `1.0`, `f`, `-`, `1`.
    fn scan_number(&mut self, start: usize) -> f64 {
        self.eat_while(is_digit);
        if let Some('.') = self.peek() {
            self.pos += 1;
            self.eat_while(is_digit);
        }
        if let Some(marker @ ('e' | 'E')) = self.peek() {
            let mut lookahead = self.pos + marker.len_utf8();
            if let Some(sign @ ('+' | '-')) = self.input[lookahead..].chars().next() {
                lookahead += sign.len_utf8();
            }
            if self.input[lookahead..].chars().next().is_some_and(is_digit) {
                self.pos = lookahead;
                self.eat_while(is_digit);
            }
        }
        self.input[start..self.pos].parse().unwrap_or_default()
    }
}

/// Scans all tokens of `input`, including the trailing [TokenType::End].
pub fn tokenize(input: &str) -> Vec<Token<'_>> {
    let mut tokenizer = Tokenizer::new(input);
    let mut tokens = Vec::new();
    loop {
        let token = tokenizer.next_token();
        let done = token.is_end();
        tokens.push(token);
        if done {
            break;
        }
    }
    tokens
}
