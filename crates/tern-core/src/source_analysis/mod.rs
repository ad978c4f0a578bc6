// Copyright 2026 James Casey
// SPDX-License-Identifier: Apache-2.0

//! Source text analysis: spans, tokens, lexing, and parsing.
//!
//! The front half of the pipeline. [`lex`] turns source text into tokens;
//! [`parse`] turns tokens into a single [`crate::ast::Program`] tree plus
//! any diagnostics collected through panic-mode recovery.

mod lexer;
pub mod parser;
mod span;
mod token;

pub use lexer::lex;
pub use parser::parse;
pub use span::Span;
pub use token::{Token, TokenKind};
