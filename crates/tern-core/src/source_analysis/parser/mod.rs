// Copyright 2026 James Casey
// SPDX-License-Identifier: Apache-2.0

//! Recursive descent parser for Tern source code.
//!
//! The parser consumes the full token sequence and produces exactly one
//! top-level [`Program`] tree: the `library` header, the include
//! directives, and the ordered declarations.
//!
//! # Design
//!
//! - **Statements** use straight recursive descent; each rule states the
//!   token kinds it expects, and a mismatch produces an
//!   "expected one of {…}" diagnostic carrying the actual token.
//! - **Expressions** use Pratt parsing with a fixed binding-power table
//!   (see [`expressions`]).
//! - **Error recovery is panic-mode**: on a statement-level failure the
//!   parser discards tokens until a statement boundary (a consumed `;`, a
//!   closing `}`, or a declaration keyword) and resumes, accumulating
//!   multiple diagnostics per file rather than stopping at the first.
//! - **References are never resolved here.** Every identifier reference is
//!   wrapped into an [`AddressFrame`](crate::address::AddressFrame)
//!   stamped with the scope open at the use site; resolution happens
//!   during code generation so forward references work.

use ecow::EcoString;

use crate::address::State;
use crate::ast::{Header, Identifier, Include, Program, RawLine, Stmt};
use crate::diagnostics::{Diagnostic, DiagnosticCode};

use super::{Span, Token, TokenKind};

mod expressions;

/// Parses a token sequence into a program tree.
///
/// Always produces a tree; parse failures are reported through the
/// returned diagnostics, and a unit with error diagnostics must not be
/// treated as successfully compiled.
#[must_use]
pub fn parse(tokens: Vec<Token>) -> (Program, Vec<Diagnostic>) {
    Parser::new(tokens).parse_program()
}

/// The parser state: a token cursor plus the open-scope path.
pub(super) struct Parser {
    tokens: Vec<Token>,
    position: usize,
    diagnostics: Vec<Diagnostic>,
    /// The scope open at the current parse position, mirroring nested
    /// component/system/function declarations. Stamped onto every
    /// `AddressFrame`.
    scope: State,
}

impl Parser {
    fn new(mut tokens: Vec<Token>) -> Self {
        // The cursor relies on a trailing EOF token.
        if !tokens.last().is_some_and(|t| t.kind().is_eof()) {
            let offset = tokens.last().map_or(0, |t| t.span().end());
            tokens.push(Token::new(TokenKind::Eof, Span::at(offset)));
        }
        Self {
            tokens,
            position: 0,
            diagnostics: Vec::new(),
            scope: State::top_level(),
        }
    }

    // === Cursor helpers ===

    /// Returns the current token without consuming it.
    pub(super) fn current_token(&self) -> &Token {
        &self.tokens[self.position.min(self.tokens.len() - 1)]
    }

    /// Returns the current token kind.
    pub(super) fn current_kind(&self) -> &TokenKind {
        self.current_token().kind()
    }

    /// Returns `true` if the cursor is at EOF.
    pub(super) fn is_at_end(&self) -> bool {
        self.current_kind().is_eof()
    }

    /// Consumes and returns the current token.
    pub(super) fn advance(&mut self) -> Token {
        let token = self.current_token().clone();
        if !self.is_at_end() {
            self.position += 1;
        }
        token
    }

    /// Returns `true` if the current token has the given kind.
    pub(super) fn check(&self, kind: &TokenKind) -> bool {
        self.current_kind() == kind
    }

    /// Consumes the current token if it has the given kind.
    pub(super) fn match_token(&mut self, kind: &TokenKind) -> bool {
        if self.check(kind) {
            self.advance();
            true
        } else {
            false
        }
    }

    /// Consumes a token of the given kind or fails with an expected-set
    /// diagnostic.
    pub(super) fn expect(&mut self, kind: &TokenKind) -> Result<Token, Diagnostic> {
        if self.check(kind) {
            Ok(self.advance())
        } else {
            Err(self.expected(&[&kind.to_string()]))
        }
    }

    /// Consumes an identifier token or fails.
    pub(super) fn expect_identifier(&mut self) -> Result<Identifier, Diagnostic> {
        match self.current_kind() {
            TokenKind::Identifier(name) => {
                let name = name.clone();
                let token = self.advance();
                Ok(Identifier::new(name, token.span()))
            }
            _ => Err(self.expected(&["identifier"])),
        }
    }

    /// Builds an "expected one of {…}, found '…'" diagnostic (code 201)
    /// at the current token.
    pub(super) fn expected(&self, expected: &[&str]) -> Diagnostic {
        let set = expected
            .iter()
            .map(|e| format!("'{e}'"))
            .collect::<Vec<_>>()
            .join(", ");
        Diagnostic::new(DiagnosticCode::UnexpectedToken, self.current_token().span())
            .with_arg(set)
            .with_arg(self.current_token().to_string())
    }

    /// Returns the scope open at the current position.
    pub(super) fn open_scope(&self) -> State {
        self.scope.clone()
    }

    /// Recovers from a failed rule that started at token index `before`.
    ///
    /// Skips to a statement boundary, then guarantees progress: when the
    /// boundary is the very token the rule failed on (a declaration
    /// keyword the context cannot accept, for example), that token is
    /// consumed so the enclosing loop never retries the same position.
    fn recover_from(&mut self, before: usize) {
        self.synchronize();
        if self.position == before && !self.is_at_end() {
            self.advance();
        }
    }

    /// Panic-mode recovery: discards tokens until a statement boundary.
    ///
    /// A consumed `;` is a boundary; a closing `}` or a declaration
    /// keyword is left for the caller to handle.
    fn synchronize(&mut self) {
        while !self.is_at_end() {
            if self.match_token(&TokenKind::Semicolon) {
                return;
            }
            if matches!(self.current_kind(), TokenKind::RightBrace)
                || self.current_kind().is_declaration_start()
            {
                return;
            }
            self.advance();
        }
    }

    // === Program structure ===

    fn parse_program(mut self) -> (Program, Vec<Diagnostic>) {
        let start = self.current_token().span();

        let header = match self.parse_header() {
            Ok(header) => header,
            Err(diagnostic) => {
                let span = self.current_token().span();
                self.diagnostics.push(diagnostic);
                self.synchronize();
                Header {
                    name: Identifier::new("", span),
                    span,
                }
            }
        };

        let mut includes = Vec::new();
        while self.check(&TokenKind::Include) {
            match self.parse_include() {
                Ok(include) => includes.push(include),
                Err(diagnostic) => {
                    self.diagnostics.push(diagnostic);
                    self.synchronize();
                }
            }
        }

        let mut declarations = Vec::new();
        while !self.is_at_end() {
            let before = self.position;
            match self.parse_top_level_declaration() {
                Ok(declaration) => declarations.push(declaration),
                Err(diagnostic) => {
                    self.diagnostics.push(diagnostic);
                    self.recover_from(before);
                    // A stray `}` has no meaning at top level.
                    if self.check(&TokenKind::RightBrace) {
                        self.advance();
                    }
                }
            }
        }

        let span = start.merge(self.current_token().span());
        let program = Program {
            header,
            includes,
            declarations,
            span,
        };
        (program, self.diagnostics)
    }

    /// `library <name>;`
    fn parse_header(&mut self) -> Result<Header, Diagnostic> {
        let keyword = self.expect(&TokenKind::Library)?;
        let name = self.expect_identifier()?;
        let terminator = self.expect(&TokenKind::Semicolon)?;
        Ok(Header {
            name,
            span: keyword.span().merge(terminator.span()),
        })
    }

    /// `include "<name>";`
    fn parse_include(&mut self) -> Result<Include, Diagnostic> {
        let keyword = self.expect(&TokenKind::Include)?;
        let library = match self.current_kind() {
            TokenKind::Str(name) => {
                let name = name.clone();
                self.advance();
                name
            }
            _ => return Err(self.expected(&["string literal"])),
        };
        let terminator = self.expect(&TokenKind::Semicolon)?;
        Ok(Include {
            library,
            span: keyword.span().merge(terminator.span()),
        })
    }

    /// Dispatches a top-level declaration.
    ///
    /// An identifier in declaration position reads as an unknown directive
    /// (code 202) rather than a generic token mismatch.
    fn parse_top_level_declaration(&mut self) -> Result<Stmt, Diagnostic> {
        match self.current_kind() {
            TokenKind::Component => self.parse_component(),
            TokenKind::System => self.parse_system(),
            TokenKind::Function => self.parse_function(),
            TokenKind::Var => self.parse_var(),
            TokenKind::Include => {
                // Includes must precede declarations.
                Err(self.expected(&["component", "system", "function", "var"]))
            }
            TokenKind::Identifier(name) => {
                let diagnostic =
                    Diagnostic::new(DiagnosticCode::UnknownDirective, self.current_token().span())
                        .with_arg(name.clone());
                Err(diagnostic)
            }
            _ => Err(self.expected(&["component", "system", "function", "var"])),
        }
    }

    /// `component <name> { (system | function | var)* }`
    fn parse_component(&mut self) -> Result<Stmt, Diagnostic> {
        let keyword = self.expect(&TokenKind::Component)?;
        let name = self.expect_identifier()?;
        self.expect(&TokenKind::LeftBrace)?;

        self.scope = self.scope.child(name.name.clone());
        let members = self.parse_members(&["system", "function", "var"], |parser| {
            match parser.current_kind() {
                TokenKind::System => Some(parser.parse_system()),
                TokenKind::Function => Some(parser.parse_function()),
                TokenKind::Var => Some(parser.parse_var()),
                _ => None,
            }
        });
        self.scope = self.scope.parent().unwrap_or_default();

        let close = self.expect(&TokenKind::RightBrace)?;
        Ok(Stmt::Component {
            name,
            members,
            span: keyword.span().merge(close.span()),
        })
    }

    /// `system <name> { (function | var)* }`
    fn parse_system(&mut self) -> Result<Stmt, Diagnostic> {
        let keyword = self.expect(&TokenKind::System)?;
        let name = self.expect_identifier()?;
        self.expect(&TokenKind::LeftBrace)?;

        self.scope = self.scope.child(name.name.clone());
        let members = self.parse_members(&["function", "var"], |parser| {
            match parser.current_kind() {
                TokenKind::Function => Some(parser.parse_function()),
                TokenKind::Var => Some(parser.parse_var()),
                _ => None,
            }
        });
        self.scope = self.scope.parent().unwrap_or_default();

        let close = self.expect(&TokenKind::RightBrace)?;
        Ok(Stmt::System {
            name,
            members,
            span: keyword.span().merge(close.span()),
        })
    }

    /// Parses brace-body members with per-member recovery.
    fn parse_members(
        &mut self,
        expected: &[&str],
        mut rule: impl FnMut(&mut Self) -> Option<Result<Stmt, Diagnostic>>,
    ) -> Vec<Stmt> {
        let mut members = Vec::new();
        while !self.check(&TokenKind::RightBrace) && !self.is_at_end() {
            let before = self.position;
            match rule(self) {
                Some(Ok(member)) => members.push(member),
                Some(Err(diagnostic)) => {
                    self.diagnostics.push(diagnostic);
                    self.recover_from(before);
                }
                None => {
                    let diagnostic = self.expected(expected);
                    self.diagnostics.push(diagnostic);
                    self.recover_from(before);
                }
            }
        }
        members
    }

    /// `function <name>(<params>) { … }`
    fn parse_function(&mut self) -> Result<Stmt, Diagnostic> {
        let keyword = self.expect(&TokenKind::Function)?;
        let name = self.expect_identifier()?;
        self.expect(&TokenKind::LeftParen)?;

        let mut parameters = Vec::new();
        if !self.check(&TokenKind::RightParen) {
            loop {
                parameters.push(self.expect_identifier()?);
                if !self.match_token(&TokenKind::Comma) {
                    break;
                }
            }
        }
        self.expect(&TokenKind::RightParen)?;

        self.scope = self.scope.child(name.name.clone());
        let body = self.parse_block_body();
        self.scope = self.scope.parent().unwrap_or_default();

        let body = body?;
        let span = keyword.span().merge(self.previous_span());
        Ok(Stmt::Function {
            name,
            parameters,
            body,
            span,
        })
    }

    /// `var <name> [= <expr>];`
    fn parse_var(&mut self) -> Result<Stmt, Diagnostic> {
        let keyword = self.expect(&TokenKind::Var)?;
        let name = self.expect_identifier()?;
        let initializer = if self.match_token(&TokenKind::Assign) {
            Some(self.parse_expression()?)
        } else {
            None
        };
        let terminator = self.expect(&TokenKind::Semicolon)?;
        Ok(Stmt::Var {
            name,
            initializer,
            span: keyword.span().merge(terminator.span()),
        })
    }

    /// `{ <statement>* }`, with per-statement recovery.
    fn parse_block_body(&mut self) -> Result<Vec<Stmt>, Diagnostic> {
        self.expect(&TokenKind::LeftBrace)?;
        let mut statements = Vec::new();
        while !self.check(&TokenKind::RightBrace) && !self.is_at_end() {
            let before = self.position;
            match self.parse_statement() {
                Ok(statement) => statements.push(statement),
                Err(diagnostic) => {
                    self.diagnostics.push(diagnostic);
                    self.recover_from(before);
                }
            }
        }
        self.expect(&TokenKind::RightBrace)?;
        Ok(statements)
    }

    /// Dispatches a body statement.
    fn parse_statement(&mut self) -> Result<Stmt, Diagnostic> {
        match self.current_kind() {
            TokenKind::Var => self.parse_var(),
            TokenKind::If => self.parse_if(),
            TokenKind::While => self.parse_while(),
            TokenKind::Return => self.parse_return(),
            TokenKind::Asm => self.parse_asm(),
            TokenKind::LeftBrace => {
                let open = self.current_token().span();
                let statements = self.parse_block_body()?;
                Ok(Stmt::Block {
                    statements,
                    span: open.merge(self.previous_span()),
                })
            }
            _ => {
                let expression = self.parse_expression()?;
                let terminator = self.expect(&TokenKind::Semicolon)?;
                let span = expression.span().merge(terminator.span());
                Ok(Stmt::Expression { expression, span })
            }
        }
    }

    /// `if (<expr>) { … } [else (<if> | { … })]`
    fn parse_if(&mut self) -> Result<Stmt, Diagnostic> {
        let keyword = self.expect(&TokenKind::If)?;
        self.expect(&TokenKind::LeftParen)?;
        let condition = self.parse_expression()?;
        self.expect(&TokenKind::RightParen)?;
        let then_branch = self.parse_block_body()?;

        let else_branch = if self.match_token(&TokenKind::Else) {
            if self.check(&TokenKind::If) {
                // else-if chains nest as a single statement.
                Some(vec![self.parse_if()?])
            } else {
                Some(self.parse_block_body()?)
            }
        } else {
            None
        };

        Ok(Stmt::If {
            condition,
            then_branch,
            else_branch,
            span: keyword.span().merge(self.previous_span()),
        })
    }

    /// `while (<expr>) { … }`
    fn parse_while(&mut self) -> Result<Stmt, Diagnostic> {
        let keyword = self.expect(&TokenKind::While)?;
        self.expect(&TokenKind::LeftParen)?;
        let condition = self.parse_expression()?;
        self.expect(&TokenKind::RightParen)?;
        let body = self.parse_block_body()?;
        Ok(Stmt::While {
            condition,
            body,
            span: keyword.span().merge(self.previous_span()),
        })
    }

    /// `return [<expr>];`
    fn parse_return(&mut self) -> Result<Stmt, Diagnostic> {
        let keyword = self.expect(&TokenKind::Return)?;
        let value = if self.check(&TokenKind::Semicolon) {
            None
        } else {
            Some(self.parse_expression()?)
        };
        let terminator = self.expect(&TokenKind::Semicolon)?;
        Ok(Stmt::Return {
            value,
            span: keyword.span().merge(terminator.span()),
        })
    }

    /// `asm { "<line>"* }`
    fn parse_asm(&mut self) -> Result<Stmt, Diagnostic> {
        let keyword = self.expect(&TokenKind::Asm)?;
        self.expect(&TokenKind::LeftBrace)?;
        let mut lines = Vec::new();
        while let TokenKind::Str(text) = self.current_kind() {
            let text = text.clone();
            let token = self.advance();
            lines.push(RawLine {
                text,
                span: token.span(),
            });
        }
        let close = self.expect(&TokenKind::RightBrace)?;
        Ok(Stmt::RawAsm {
            lines,
            span: keyword.span().merge(close.span()),
        })
    }

    /// Returns the span of the most recently consumed token.
    pub(super) fn previous_span(&self) -> Span {
        if self.position == 0 {
            self.current_token().span()
        } else {
            self.tokens[self.position - 1].span()
        }
    }

    /// Splits a dotted path's segments at the current position.
    ///
    /// Used by expression parsing for `a.b.c` references.
    pub(super) fn parse_path(&mut self) -> Result<(Vec<EcoString>, Span), Diagnostic> {
        let first = self.expect_identifier()?;
        let mut span = first.span;
        let mut segments = vec![first.name];
        while self.match_token(&TokenKind::Dot) {
            let next = self.expect_identifier()?;
            span = span.merge(next.span);
            segments.push(next.name);
        }
        Ok((segments, span))
    }
}
