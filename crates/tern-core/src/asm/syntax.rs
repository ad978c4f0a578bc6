// Copyright 2026 James Casey
// SPDX-License-Identifier: Apache-2.0

//! Output syntax dialects.
//!
//! A [`Dialect`] selects the textual rendering convention for the
//! instruction model. Selecting a dialect never changes the model or the
//! order of anything in it; it only changes per-token formatting:
//! mnemonic and register case, memory-operand syntax, section headers, and
//! directive spelling.

/// A textual assembly rendering convention.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Default)]
pub enum Dialect {
    /// NASM-flavored syntax: lowercase mnemonics, `section .text` headers,
    /// `[base+index*scale+disp]` memory operands, `%include` directives.
    #[default]
    Nasm,
    /// MASM-flavored syntax: uppercase mnemonics and registers, `.CODE`
    /// headers, `base[index*scale+disp]` memory operands, `INCLUDE`
    /// directives.
    Masm,
}

impl Dialect {
    /// Renders a mnemonic or directive word in this dialect's case.
    #[must_use]
    pub fn word(self, lowercase: &str) -> String {
        match self {
            Self::Nasm => lowercase.to_string(),
            Self::Masm => lowercase.to_ascii_uppercase(),
        }
    }
}

impl std::fmt::Display for Dialect {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.write_str(match self {
            Self::Nasm => "nasm",
            Self::Masm => "masm",
        })
    }
}
