// Copyright 2026 James Casey
// SPDX-License-Identifier: Apache-2.0

//! Tern compiler core.
//!
//! This crate contains the whole compilation pipeline:
//! - Lexical analysis (tokenization)
//! - Parsing (AST construction)
//! - Declaration collection and address resolution
//! - Code generation (assembly text output, NASM or MASM flavored)
//!
//! The pipeline is synchronous and deterministic: [`compile`] runs
//! lex → parse → declare → lower → render and returns a [`Compilation`]
//! holding the rendered assembly (when no error occurred) and every
//! diagnostic collected along the way. [`compile_file`] is the only
//! function that touches the filesystem.

#![doc = include_str!("../../../README.md")]

pub mod address;
pub mod asm;
pub mod ast;
pub mod codegen;
pub mod diagnostics;
pub mod source_analysis;

use camino::{Utf8Path, Utf8PathBuf};

use crate::address::SymbolTable;
use crate::asm::Dialect;
use crate::diagnostics::Diagnostic;

/// Re-export commonly used types.
pub mod prelude {
    pub use crate::address::{AddressFrame, State, SymbolTable};
    pub use crate::asm::Dialect;
    pub use crate::ast::{Expr, Program, Stmt};
    pub use crate::diagnostics::{Diagnostic, DiagnosticCode};
    pub use crate::source_analysis::Span;
}

/// The result of compiling one unit.
#[derive(Debug, Clone)]
pub struct Compilation {
    /// The unit's file name, used when rendering diagnostics.
    file: Utf8PathBuf,
    /// The rendered assembly, or `None` when any error was reported.
    assembly: Option<String>,
    /// Every diagnostic the pipeline produced, in pipeline order.
    diagnostics: Vec<Diagnostic>,
}

impl Compilation {
    /// Returns the rendered assembly, or `None` when compilation failed.
    #[must_use]
    pub fn assembly(&self) -> Option<&str> {
        self.assembly.as_deref()
    }

    /// Returns the collected diagnostics.
    #[must_use]
    pub fn diagnostics(&self) -> &[Diagnostic] {
        &self.diagnostics
    }

    /// Returns `true` if no error-severity diagnostic was reported.
    #[must_use]
    pub fn is_success(&self) -> bool {
        !self.diagnostics.iter().any(Diagnostic::is_error)
    }

    /// Returns the process exit code: the first error's numeric code, or 0.
    #[must_use]
    pub fn exit_code(&self) -> i32 {
        diagnostics::exit_code(&self.diagnostics)
    }

    /// Renders every diagnostic against the original source, one per line.
    #[must_use]
    pub fn report(&self, source: &str) -> String {
        self.diagnostics
            .iter()
            .map(|d| d.render(&self.file, source))
            .collect::<Vec<_>>()
            .join("\n")
    }
}

/// Compiles one unit of source text to assembly.
///
/// Never panics and never performs I/O. Any error-severity diagnostic
/// suppresses the assembly output; the partially lowered unit is not
/// observable.
///
/// # Examples
///
/// ```
/// use tern_core::{compile, asm::Dialect};
///
/// let compilation = compile("library m; var x = 1;", "m.tern".into(), Dialect::Nasm);
/// assert!(compilation.is_success());
/// assert_eq!(compilation.assembly(), Some("section .data\nx dd 1\n"));
/// ```
#[must_use]
pub fn compile(source: &str, file: Utf8PathBuf, dialect: Dialect) -> Compilation {
    let tokens = match source_analysis::lex(source) {
        Ok(tokens) => tokens,
        Err(diagnostic) => {
            return Compilation {
                file,
                assembly: None,
                diagnostics: vec![diagnostic],
            }
        }
    };

    let (program, mut diagnostics) = source_analysis::parse(tokens);

    let mut table = SymbolTable::new();
    let (library, lowering) = codegen::lower(&program, &mut table);
    diagnostics.extend(lowering);

    let assembly = if diagnostics.iter().any(Diagnostic::is_error) {
        None
    } else {
        Some(library.render(dialect))
    };
    Compilation {
        file,
        assembly,
        diagnostics,
    }
}

/// A failure outside the diagnostic pipeline.
#[derive(Debug, thiserror::Error)]
pub enum CompileError {
    /// The source file could not be read.
    #[error("source file '{path}' not found")]
    SourceNotFound {
        /// The path that failed to read.
        path: Utf8PathBuf,
        /// The underlying I/O failure.
        #[source]
        source: std::io::Error,
    },
}

impl CompileError {
    /// Returns the process exit code for this failure.
    #[must_use]
    pub fn exit_code(&self) -> i32 {
        match self {
            Self::SourceNotFound { .. } => {
                i32::from(diagnostics::DiagnosticCode::SourceNotFound.code())
            }
        }
    }
}

/// Reads and compiles a source file.
///
/// # Errors
///
/// Returns [`CompileError::SourceNotFound`] (exit code 501) when the file
/// cannot be read; every in-language failure is reported through the
/// returned [`Compilation`]'s diagnostics instead.
pub fn compile_file(path: &Utf8Path, dialect: Dialect) -> Result<Compilation, CompileError> {
    let source = std::fs::read_to_string(path).map_err(|source| CompileError::SourceNotFound {
        path: path.to_owned(),
        source,
    })?;
    Ok(compile(&source, path.to_owned(), dialect))
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn failed_compilation_yields_no_assembly() {
        let compilation = compile(
            "library m; function f() { missing; }",
            "m.tern".into(),
            Dialect::Nasm,
        );
        assert!(!compilation.is_success());
        assert!(compilation.assembly().is_none());
        assert_eq!(compilation.exit_code(), 302);
    }

    #[test]
    fn report_renders_each_diagnostic_with_position() {
        let source = "library m; function f() { missing; }";
        let compilation = compile(source, "m.tern".into(), Dialect::Nasm);
        assert_eq!(
            compilation.report(source),
            "[302] undefined identifier 'missing' (m.tern:1:27)"
        );
    }

    #[test]
    fn missing_file_maps_to_exit_code_501() {
        let error = compile_file(Utf8Path::new("does/not/exist.tern"), Dialect::Nasm)
            .expect_err("reading should fail");
        assert_eq!(error.exit_code(), 501);
        assert!(error.to_string().contains("does/not/exist.tern"));
    }

    #[test]
    fn successful_compilation_has_exit_code_zero() {
        let compilation = compile("library m;", "m.tern".into(), Dialect::Masm);
        assert!(compilation.is_success());
        assert_eq!(compilation.exit_code(), 0);
        assert_eq!(compilation.report(""), "");
    }
}
