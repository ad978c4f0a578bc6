// Copyright 2026 James Casey
// SPDX-License-Identifier: Apache-2.0

//! Lexical analysis for Tern source code.
//!
//! This module converts source text into an ordered sequence of [`Token`]s
//! terminated by [`TokenKind::Eof`]. The lexer is hand-written for exact
//! control over spans and error positions.
//!
//! # Error Policy
//!
//! The grammar defines no lexical leniency, so the lexer is fatal on the
//! first malformed input: an unterminated string, a number literal running
//! into identifier characters, or a character outside the alphabet aborts
//! tokenization of the file with a [`Diagnostic`]. There is no
//! partial-token recovery.
//!
//! Whitespace and `//` comments are skipped; skipping never shifts the
//! offsets of subsequent tokens because spans are always taken from the
//! underlying byte positions.
//!
//! # Example
//!
//! ```
//! use tern_core::source_analysis::{lex, TokenKind};
//!
//! let tokens = lex("x + 1").unwrap();
//! assert_eq!(tokens.len(), 4); // x, +, 1, <eof>
//! assert!(tokens.last().unwrap().kind().is_eof());
//! ```

use std::iter::Peekable;
use std::str::CharIndices;

use ecow::EcoString;

use crate::diagnostics::{Diagnostic, DiagnosticCode};

use super::{Span, Token, TokenKind};

/// Tokenizes an entire source file.
///
/// Returns the token sequence including the trailing EOF token, or the
/// first fatal lexical diagnostic.
///
/// # Errors
///
/// Returns a [`Diagnostic`] with code 101 (unexpected character), 102
/// (unterminated string, span at the opening quote), or 103 (malformed
/// number).
pub fn lex(source: &str) -> Result<Vec<Token>, Diagnostic> {
    Lexer::new(source).run()
}

/// A lexer over Tern source text.
struct Lexer<'src> {
    source: &'src str,
    chars: Peekable<CharIndices<'src>>,
    /// Current byte position in source.
    position: usize,
}

impl<'src> Lexer<'src> {
    fn new(source: &'src str) -> Self {
        Self {
            source,
            chars: source.char_indices().peekable(),
            position: 0,
        }
    }

    fn run(mut self) -> Result<Vec<Token>, Diagnostic> {
        let mut tokens = Vec::new();
        loop {
            let token = self.next_token()?;
            let done = token.kind().is_eof();
            tokens.push(token);
            if done {
                return Ok(tokens);
            }
        }
    }

    /// Peeks at the next character without consuming it.
    fn peek_char(&mut self) -> Option<char> {
        self.chars.peek().map(|&(_, c)| c)
    }

    /// Consumes the next character and returns it.
    fn advance(&mut self) -> Option<char> {
        let (pos, c) = self.chars.next()?;
        self.position = pos + c.len_utf8();
        Some(c)
    }

    /// Consumes characters while the predicate is true.
    fn advance_while(&mut self, predicate: impl Fn(char) -> bool) {
        while self.peek_char().is_some_and(&predicate) {
            self.advance();
        }
    }

    /// Returns the current byte position.
    #[expect(
        clippy::cast_possible_truncation,
        reason = "source files over 4GB are not supported"
    )]
    fn current_position(&self) -> u32 {
        self.position as u32
    }

    /// Creates a span from start to current position.
    fn span_from(&self, start: u32) -> Span {
        Span::new(start, self.current_position())
    }

    /// Extracts source text for a span.
    fn text_for(&self, span: Span) -> &'src str {
        &self.source[span.as_range()]
    }

    /// Skips whitespace and `//` comments.
    fn skip_trivia(&mut self) {
        loop {
            match self.peek_char() {
                Some(c) if c.is_whitespace() => {
                    self.advance_while(char::is_whitespace);
                }
                Some('/') if self.source[self.position..].starts_with("//") => {
                    self.advance_while(|c| c != '\n');
                }
                _ => break,
            }
        }
    }

    fn next_token(&mut self) -> Result<Token, Diagnostic> {
        self.skip_trivia();
        let start = self.current_position();

        let Some(c) = self.advance() else {
            return Ok(Token::new(TokenKind::Eof, Span::at(start)));
        };

        let kind = match c {
            c if is_identifier_start(c) => return Ok(self.lex_identifier(start)),
            c if c.is_ascii_digit() => return self.lex_number(start),
            '"' => return self.lex_string(start),
            '(' => TokenKind::LeftParen,
            ')' => TokenKind::RightParen,
            '{' => TokenKind::LeftBrace,
            '}' => TokenKind::RightBrace,
            '[' => TokenKind::LeftBracket,
            ']' => TokenKind::RightBracket,
            ';' => TokenKind::Semicolon,
            ',' => TokenKind::Comma,
            '.' => TokenKind::Dot,
            '+' => TokenKind::Plus,
            '-' => TokenKind::Minus,
            '*' => TokenKind::Star,
            '/' => TokenKind::Slash,
            '%' => TokenKind::Percent,
            '=' => self.either('=', TokenKind::EqEq, TokenKind::Assign),
            '!' => self.either('=', TokenKind::BangEq, TokenKind::Bang),
            '<' => self.either('=', TokenKind::LtEq, TokenKind::Lt),
            '>' => self.either('=', TokenKind::GtEq, TokenKind::Gt),
            c => {
                return Err(
                    Diagnostic::new(DiagnosticCode::UnexpectedCharacter, self.span_from(start))
                        .with_arg(c.to_string()),
                );
            }
        };
        Ok(Token::new(kind, self.span_from(start)))
    }

    /// Consumes `expected` and returns `matched`, or returns `single`.
    fn either(&mut self, expected: char, matched: TokenKind, single: TokenKind) -> TokenKind {
        if self.peek_char() == Some(expected) {
            self.advance();
            matched
        } else {
            single
        }
    }

    /// Lexes an identifier or keyword by maximal munch.
    fn lex_identifier(&mut self, start: u32) -> Token {
        self.advance_while(is_identifier_continue);
        let span = self.span_from(start);
        let text = self.text_for(span);
        let kind = TokenKind::keyword(text)
            .unwrap_or_else(|| TokenKind::Identifier(EcoString::from(text)));
        Token::new(kind, span)
    }

    /// Lexes a decimal integer literal by maximal munch.
    ///
    /// A digit run immediately followed by an identifier character is a
    /// malformed literal, not two tokens.
    fn lex_number(&mut self, start: u32) -> Result<Token, Diagnostic> {
        self.advance_while(|c| c.is_ascii_digit());
        if self.peek_char().is_some_and(is_identifier_start) {
            self.advance_while(is_identifier_continue);
            let span = self.span_from(start);
            return Err(Diagnostic::new(DiagnosticCode::MalformedNumber, span)
                .with_arg(EcoString::from(self.text_for(span))));
        }
        let span = self.span_from(start);
        Ok(Token::new(
            TokenKind::Integer(EcoString::from(self.text_for(span))),
            span,
        ))
    }

    /// Lexes a double-quoted string literal with escape sequences.
    ///
    /// The opening quote has already been consumed; `start` is its offset,
    /// which is also the offset reported for an unterminated literal.
    fn lex_string(&mut self, start: u32) -> Result<Token, Diagnostic> {
        let mut content = EcoString::new();
        loop {
            match self.advance() {
                None | Some('\n') => {
                    return Err(Diagnostic::new(
                        DiagnosticCode::UnterminatedString,
                        Span::new(start, start + 1),
                    ));
                }
                Some('"') => break,
                Some('\\') => match self.advance() {
                    Some('n') => content.push('\n'),
                    Some('t') => content.push('\t'),
                    Some('\\') => content.push('\\'),
                    Some('"') => content.push('"'),
                    // Unknown escapes keep the backslash verbatim.
                    Some(other) => {
                        content.push('\\');
                        content.push(other);
                    }
                    None => {
                        return Err(Diagnostic::new(
                            DiagnosticCode::UnterminatedString,
                            Span::new(start, start + 1),
                        ));
                    }
                },
                Some(c) => content.push(c),
            }
        }
        Ok(Token::new(TokenKind::Str(content), self.span_from(start)))
    }
}

fn is_identifier_start(c: char) -> bool {
    c.is_ascii_alphabetic() || c == '_'
}

fn is_identifier_continue(c: char) -> bool {
    c.is_ascii_alphanumeric() || c == '_'
}


#[cfg(test)]
mod property_tests {
    use super::*;
    use proptest::prelude::*;

    proptest! {
        /// The lexer never panics and, on success, every span lies within
        /// the source and the final token is EOF.
        #[test]
        fn lexer_spans_are_in_bounds(source in "\\PC*") {
            if let Ok(tokens) = lex(&source) {
                let len = source.len() as u32;
                prop_assert!(tokens.last().is_some_and(|t| t.kind().is_eof()));
                for token in &tokens {
                    prop_assert!(token.span().start() <= token.span().end());
                    prop_assert!(token.span().end() <= len);
                }
            }
        }

        /// Lexing is deterministic for identical input.
        #[test]
        fn lexer_is_deterministic(source in "\\PC*") {
            prop_assert_eq!(lex(&source), lex(&source));
        }
    }
}
