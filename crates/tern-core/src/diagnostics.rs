// Copyright 2026 James Casey
// SPDX-License-Identifier: Apache-2.0

//! Compiler diagnostics.
//!
//! Every failure the pipeline can report is a [`Diagnostic`]: a numbered
//! code, the byte span it applies to, a severity, and up to four contextual
//! arguments. Diagnostics are plain values; they carry no formatted text.
//! The human-readable rendering, `[CODE] <message> (<file>:<line>:<column>)`,
//! is produced at report time by [`Diagnostic::render`], which scans the
//! source text to map the byte offset to a 1-based line and column. The
//! mapping is recomputed per diagnostic, never cached.
//!
//! Numeric codes double as process exit-code signals for the external CLI
//! collaborator (see [`exit_code`]).

use camino::Utf8Path;
use ecow::EcoString;

use crate::source_analysis::Span;

/// Maximum number of contextual arguments a diagnostic may carry.
pub const MAX_ARGS: usize = 4;

/// Severity of a diagnostic.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum Severity {
    /// Compilation of the unit cannot be claimed successful.
    Error,
    /// Something suspicious, but compilation continues.
    Warning,
}

/// The fixed table of diagnostic conditions.
///
/// The discriminant is the numeric code reported to the user and used as
/// the process exit code. Codes are grouped by pipeline stage: 1xx lexing,
/// 2xx parsing, 3xx resolution, 4xx lowering, 5xx I/O.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
#[repr(u16)]
pub enum DiagnosticCode {
    /// A character the lexer does not recognize.
    UnexpectedCharacter = 101,
    /// A string literal with no closing quote before end of input.
    UnterminatedString = 102,
    /// A number literal that runs into identifier characters.
    MalformedNumber = 103,
    /// The parser found a token outside the expected set.
    UnexpectedToken = 201,
    /// A directive keyword the parser does not know.
    UnknownDirective = 202,
    /// A second declaration of the same state in the same scope.
    DuplicateDeclaration = 301,
    /// A reference that resolves to no declared state.
    UndefinedIdentifier = 302,
    /// An AST construct the code generator does not translate.
    UnsupportedConstruct = 401,
    /// A raw assembly line whose first token is not a known mnemonic.
    UnknownMnemonic = 402,
    /// The source file could not be read.
    SourceNotFound = 501,
}

impl DiagnosticCode {
    /// Returns the numeric code.
    #[must_use]
    pub const fn code(self) -> u16 {
        self as u16
    }

    /// Returns the message template with `{0}`–`{3}` positional slots.
    #[must_use]
    pub const fn template(self) -> &'static str {
        match self {
            Self::UnexpectedCharacter => "unexpected character '{0}'",
            Self::UnterminatedString => "unterminated string literal",
            Self::MalformedNumber => "malformed number literal '{0}'",
            Self::UnexpectedToken => "expected one of {0}, found '{1}'",
            Self::UnknownDirective => "unknown directive '{0}'",
            Self::DuplicateDeclaration => "duplicate declaration of '{0}'",
            Self::UndefinedIdentifier => "undefined identifier '{0}'",
            Self::UnsupportedConstruct => "{0} is not supported by the code generator",
            Self::UnknownMnemonic => "unknown mnemonic '{0}' in raw assembly line",
            Self::SourceNotFound => "source file '{0}' not found",
        }
    }

    /// Returns the severity of this condition.
    #[must_use]
    pub const fn severity(self) -> Severity {
        // The grammar defines no lenient conditions today, so the whole
        // table is error-severity. Warnings slot in here when added.
        Severity::Error
    }
}

/// A single diagnostic record.
///
/// Immutable once created; consumed exactly once by the reporting sink.
/// The optional related span points at an earlier site involved in the
/// failure (for [`DiagnosticCode::DuplicateDeclaration`], the original
/// declaration).
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Diagnostic {
    code: DiagnosticCode,
    span: Span,
    args: Vec<EcoString>,
    related: Option<Span>,
}

impl Diagnostic {
    /// Creates a new diagnostic at the given span.
    #[must_use]
    pub fn new(code: DiagnosticCode, span: Span) -> Self {
        Self {
            code,
            span,
            args: Vec::new(),
            related: None,
        }
    }

    /// Appends a contextual argument.
    ///
    /// Arguments beyond [`MAX_ARGS`] are ignored; message templates only
    /// reference slots `{0}` through `{3}`.
    #[must_use]
    pub fn with_arg(mut self, arg: impl Into<EcoString>) -> Self {
        if self.args.len() < MAX_ARGS {
            self.args.push(arg.into());
        }
        self
    }

    /// Attaches a related source location.
    #[must_use]
    pub const fn with_related(mut self, span: Span) -> Self {
        self.related = Some(span);
        self
    }

    /// Returns the diagnostic code.
    #[must_use]
    pub const fn code(&self) -> DiagnosticCode {
        self.code
    }

    /// Returns the span this diagnostic applies to.
    #[must_use]
    pub const fn span(&self) -> Span {
        self.span
    }

    /// Returns the related span, if any.
    #[must_use]
    pub const fn related(&self) -> Option<Span> {
        self.related
    }

    /// Returns the severity of this diagnostic.
    #[must_use]
    pub const fn severity(&self) -> Severity {
        self.code.severity()
    }

    /// Returns `true` if this is an error-severity diagnostic.
    #[must_use]
    pub const fn is_error(&self) -> bool {
        matches!(self.severity(), Severity::Error)
    }

    /// Returns the message with positional arguments substituted.
    #[must_use]
    pub fn message(&self) -> String {
        let mut out = String::new();
        let mut rest = self.code.template();
        while let Some(open) = rest.find('{') {
            out.push_str(&rest[..open]);
            let tail = &rest[open..];
            match tail
                .get(1..2)
                .and_then(|d| d.parse::<usize>().ok())
                .filter(|_| tail.get(2..3) == Some("}"))
            {
                Some(index) => {
                    if let Some(arg) = self.args.get(index) {
                        out.push_str(arg);
                    }
                    rest = &tail[3..];
                }
                None => {
                    out.push('{');
                    rest = &tail[1..];
                }
            }
        }
        out.push_str(rest);
        out
    }

    /// Renders the diagnostic for the reporting sink.
    ///
    /// Format: `[CODE] <message> (<file>:<line>:<column>)`. Line and column
    /// are computed by scanning `source` from its start up to the failing
    /// offset. A related span is appended as a second position.
    #[must_use]
    pub fn render(&self, file: &Utf8Path, source: &str) -> String {
        let (line, column) = line_column(source, self.span.start());
        let mut out = format!(
            "[{}] {} ({file}:{line}:{column})",
            self.code.code(),
            self.message()
        );
        if let Some(related) = self.related {
            let (line, column) = line_column(source, related.start());
            out.push_str(&format!(", first declared at {file}:{line}:{column}"));
        }
        out
    }
}

impl std::fmt::Display for Diagnostic {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        write!(f, "{}", self.message())
    }
}

impl std::error::Error for Diagnostic {}

impl miette::Diagnostic for Diagnostic {
    fn code<'a>(&'a self) -> Option<Box<dyn std::fmt::Display + 'a>> {
        Some(Box::new(self.code.code()))
    }

    fn severity(&self) -> Option<miette::Severity> {
        match self.code.severity() {
            Severity::Error => Some(miette::Severity::Error),
            Severity::Warning => Some(miette::Severity::Warning),
        }
    }

    fn labels(&self) -> Option<Box<dyn Iterator<Item = miette::LabeledSpan> + '_>> {
        let primary = miette::LabeledSpan::new_primary_with_span(None, self.span);
        let related = self
            .related
            .map(|span| miette::LabeledSpan::new_with_span(Some("first declared here".into()), span));
        Some(Box::new(std::iter::once(primary).chain(related)))
    }
}

/// Maps a byte offset to a 1-based (line, column) pair.
///
/// Scans the source from the start, counting `\n` as the line separator
/// (which also handles `\r\n`) and resetting the column at each line start.
/// Columns count characters, not bytes, so multi-byte characters advance
/// the column by one.
#[must_use]
pub fn line_column(source: &str, offset: u32) -> (u32, u32) {
    let offset = offset as usize;
    let mut line = 1;
    let mut column = 1;
    for (pos, c) in source.char_indices() {
        if pos >= offset {
            break;
        }
        if c == '\n' {
            line += 1;
            column = 1;
        } else {
            column += 1;
        }
    }
    (line, column)
}

/// Returns the process exit code for a diagnostic set.
///
/// The first error-severity diagnostic's numeric code, or 0 when the set
/// contains no errors.
#[must_use]
pub fn exit_code(diagnostics: &[Diagnostic]) -> i32 {
    diagnostics
        .iter()
        .find(|d| d.is_error())
        .map_or(0, |d| i32::from(d.code().code()))
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn message_substitutes_args() {
        let diagnostic = Diagnostic::new(DiagnosticCode::UnexpectedToken, Span::new(4, 5))
            .with_arg("';', '}'")
            .with_arg("else");
        assert_eq!(diagnostic.message(), "expected one of ';', '}', found 'else'");
    }

    #[test]
    fn args_beyond_the_maximum_are_dropped() {
        let mut diagnostic = Diagnostic::new(DiagnosticCode::UnexpectedToken, Span::at(0));
        for i in 0..6 {
            diagnostic = diagnostic.with_arg(i.to_string());
        }
        // Slots {0} and {1} are filled from the first arguments; the
        // extras change nothing.
        assert_eq!(diagnostic.message(), "expected one of 0, found '1'");
    }

    #[test]
    fn message_without_args_keeps_template_text() {
        let diagnostic = Diagnostic::new(DiagnosticCode::UnterminatedString, Span::at(0));
        assert_eq!(diagnostic.message(), "unterminated string literal");
    }

    #[test]
    fn render_includes_code_and_position() {
        let source = "var x = 1;\nvar y = @;\n";
        let offset = source.find('@').unwrap();
        let diagnostic = Diagnostic::new(
            DiagnosticCode::UnexpectedCharacter,
            Span::new(offset as u32, offset as u32 + 1),
        )
        .with_arg("@");
        assert_eq!(
            diagnostic.render(Utf8Path::new("main.tern"), source),
            "[101] unexpected character '@' (main.tern:2:9)"
        );
    }

    #[test]
    fn render_appends_related_position() {
        let source = "var x;\nvar x;\n";
        let diagnostic = Diagnostic::new(DiagnosticCode::DuplicateDeclaration, Span::new(11, 12))
            .with_arg("x")
            .with_related(Span::new(4, 5));
        assert_eq!(
            diagnostic.render(Utf8Path::new("a.tern"), source),
            "[301] duplicate declaration of 'x' (a.tern:2:5), first declared at a.tern:1:5"
        );
    }

    #[test]
    fn line_column_counts_crlf_as_one_separator() {
        let source = "ab\r\ncd";
        assert_eq!(line_column(source, 0), (1, 1));
        assert_eq!(line_column(source, 4), (2, 1));
        assert_eq!(line_column(source, 5), (2, 2));
    }

    #[test]
    fn line_column_is_one_based_and_char_counted() {
        let source = "αβ x";
        // 'x' starts at byte 5 but is the 4th character on line 1.
        assert_eq!(line_column(source, 5), (1, 4));
    }

    #[test]
    fn exit_code_is_first_error_code() {
        let diagnostics = vec![
            Diagnostic::new(DiagnosticCode::UndefinedIdentifier, Span::at(0)).with_arg("x"),
            Diagnostic::new(DiagnosticCode::UnsupportedConstruct, Span::at(5)).with_arg("y"),
        ];
        assert_eq!(exit_code(&diagnostics), 302);
        assert_eq!(exit_code(&[]), 0);
    }
}
