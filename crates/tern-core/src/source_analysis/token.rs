// Copyright 2026 James Casey
// SPDX-License-Identifier: Apache-2.0

//! Token types for Tern lexical analysis.
//!
//! Each token consists of a [`TokenKind`] and the [`Span`] of its lexeme.
//! Tokens are immutable once produced; the parser consumes them but never
//! rewrites them. Whitespace and comments are skipped by the lexer without
//! shifting the offsets of the tokens that follow.

use ecow::EcoString;

use super::Span;

/// The kind of token, not including its source location.
///
/// Tokens are cheap to clone: string-carrying variants use [`EcoString`].
#[derive(Debug, Clone, PartialEq, Eq, Hash)]
pub enum TokenKind {
    // === Literals and names ===
    /// An identifier: `counter`, `main`, `A`
    Identifier(EcoString),

    /// A decimal integer literal: `42`, `0`
    Integer(EcoString),

    /// A double-quoted string literal (content without quotes): `"core"`
    Str(EcoString),

    // === Keywords ===
    /// The `library` header keyword
    Library,
    /// The `include` directive keyword
    Include,
    /// The `component` declaration keyword
    Component,
    /// The `system` declaration keyword
    System,
    /// The `function` declaration keyword
    Function,
    /// The `var` declaration keyword
    Var,
    /// The `if` keyword
    If,
    /// The `else` keyword
    Else,
    /// The `while` keyword
    While,
    /// The `return` keyword
    Return,
    /// The `asm` raw-assembly block keyword
    Asm,

    // === Operators ===
    /// Assignment: `=`
    Assign,
    /// Addition: `+`
    Plus,
    /// Subtraction / negation: `-`
    Minus,
    /// Multiplication: `*`
    Star,
    /// Division: `/`
    Slash,
    /// Remainder: `%`
    Percent,
    /// Logical not: `!`
    Bang,
    /// Equality: `==`
    EqEq,
    /// Inequality: `!=`
    BangEq,
    /// Less than: `<`
    Lt,
    /// Less than or equal: `<=`
    LtEq,
    /// Greater than: `>`
    Gt,
    /// Greater than or equal: `>=`
    GtEq,

    // === Delimiters ===
    /// Left parenthesis: `(`
    LeftParen,
    /// Right parenthesis: `)`
    RightParen,
    /// Left brace: `{`
    LeftBrace,
    /// Right brace: `}`
    RightBrace,
    /// Left bracket: `[`
    LeftBracket,
    /// Right bracket: `]`
    RightBracket,
    /// Statement terminator: `;`
    Semicolon,
    /// Argument separator: `,`
    Comma,
    /// Path separator: `.`
    Dot,

    // === Special ===
    /// End of file
    Eof,
}

impl TokenKind {
    /// Returns the keyword kind for an identifier lexeme, if it is one.
    #[must_use]
    pub fn keyword(lexeme: &str) -> Option<Self> {
        match lexeme {
            "library" => Some(Self::Library),
            "include" => Some(Self::Include),
            "component" => Some(Self::Component),
            "system" => Some(Self::System),
            "function" => Some(Self::Function),
            "var" => Some(Self::Var),
            "if" => Some(Self::If),
            "else" => Some(Self::Else),
            "while" => Some(Self::While),
            "return" => Some(Self::Return),
            "asm" => Some(Self::Asm),
            _ => None,
        }
    }

    /// Returns `true` if this token starts a declaration.
    ///
    /// Declaration keywords double as panic-mode recovery points.
    #[must_use]
    pub const fn is_declaration_start(&self) -> bool {
        matches!(
            self,
            Self::Component | Self::System | Self::Function | Self::Var
        )
    }

    /// Returns `true` if this is the end-of-file marker.
    #[must_use]
    pub const fn is_eof(&self) -> bool {
        matches!(self, Self::Eof)
    }

    /// Returns the string content if this token carries one.
    #[must_use]
    pub fn as_str(&self) -> Option<&str> {
        match self {
            Self::Identifier(s) | Self::Integer(s) | Self::Str(s) => Some(s),
            _ => None,
        }
    }
}

impl std::fmt::Display for TokenKind {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        match self {
            Self::Identifier(s) | Self::Integer(s) => write!(f, "{s}"),
            Self::Str(s) => write!(f, "\"{s}\""),
            Self::Library => write!(f, "library"),
            Self::Include => write!(f, "include"),
            Self::Component => write!(f, "component"),
            Self::System => write!(f, "system"),
            Self::Function => write!(f, "function"),
            Self::Var => write!(f, "var"),
            Self::If => write!(f, "if"),
            Self::Else => write!(f, "else"),
            Self::While => write!(f, "while"),
            Self::Return => write!(f, "return"),
            Self::Asm => write!(f, "asm"),
            Self::Assign => write!(f, "="),
            Self::Plus => write!(f, "+"),
            Self::Minus => write!(f, "-"),
            Self::Star => write!(f, "*"),
            Self::Slash => write!(f, "/"),
            Self::Percent => write!(f, "%"),
            Self::Bang => write!(f, "!"),
            Self::EqEq => write!(f, "=="),
            Self::BangEq => write!(f, "!="),
            Self::Lt => write!(f, "<"),
            Self::LtEq => write!(f, "<="),
            Self::Gt => write!(f, ">"),
            Self::GtEq => write!(f, ">="),
            Self::LeftParen => write!(f, "("),
            Self::RightParen => write!(f, ")"),
            Self::LeftBrace => write!(f, "{{"),
            Self::RightBrace => write!(f, "}}"),
            Self::LeftBracket => write!(f, "["),
            Self::RightBracket => write!(f, "]"),
            Self::Semicolon => write!(f, ";"),
            Self::Comma => write!(f, ","),
            Self::Dot => write!(f, "."),
            Self::Eof => write!(f, "<eof>"),
        }
    }
}

/// A token with its source location.
///
/// # Examples
///
/// ```
/// use tern_core::source_analysis::{Span, Token, TokenKind};
///
/// let token = Token::new(TokenKind::Identifier("foo".into()), Span::new(0, 3));
/// assert!(matches!(token.kind(), TokenKind::Identifier(_)));
/// assert_eq!(token.span().len(), 3);
/// ```
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Token {
    kind: TokenKind,
    span: Span,
}

impl Token {
    /// Creates a new token.
    #[must_use]
    pub const fn new(kind: TokenKind, span: Span) -> Self {
        Self { kind, span }
    }

    /// Returns the kind of this token.
    #[must_use]
    pub const fn kind(&self) -> &TokenKind {
        &self.kind
    }

    /// Consumes the token and returns its kind.
    #[must_use]
    pub fn into_kind(self) -> TokenKind {
        self.kind
    }

    /// Returns the source span of this token.
    #[must_use]
    pub const fn span(&self) -> Span {
        self.span
    }
}

impl std::fmt::Display for Token {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        write!(f, "{}", self.kind)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn keyword_recognition() {
        assert_eq!(TokenKind::keyword("component"), Some(TokenKind::Component));
        assert_eq!(TokenKind::keyword("asm"), Some(TokenKind::Asm));
        assert_eq!(TokenKind::keyword("components"), None);
        assert_eq!(TokenKind::keyword(""), None);
    }

    #[test]
    fn declaration_start_predicate() {
        assert!(TokenKind::Component.is_declaration_start());
        assert!(TokenKind::Var.is_declaration_start());
        assert!(!TokenKind::If.is_declaration_start());
        assert!(!TokenKind::Identifier("x".into()).is_declaration_start());
    }

    #[test]
    fn token_kind_display() {
        assert_eq!(TokenKind::Identifier("foo".into()).to_string(), "foo");
        assert_eq!(TokenKind::Integer("42".into()).to_string(), "42");
        assert_eq!(TokenKind::Str("core".into()).to_string(), "\"core\"");
        assert_eq!(TokenKind::BangEq.to_string(), "!=");
        assert_eq!(TokenKind::LeftBrace.to_string(), "{");
        assert_eq!(TokenKind::Eof.to_string(), "<eof>");
    }

    #[test]
    fn token_accessors() {
        let token = Token::new(TokenKind::Integer("7".into()), Span::new(3, 4));
        assert_eq!(token.span(), Span::new(3, 4));
        assert_eq!(token.kind().as_str(), Some("7"));
        assert!(matches!(token.into_kind(), TokenKind::Integer(s) if s == "7"));
    }
}
