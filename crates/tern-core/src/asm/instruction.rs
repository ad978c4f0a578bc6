// Copyright 2026 James Casey
// SPDX-License-Identifier: Apache-2.0

//! Instructions and mnemonics.
//!
//! An [`Instruction`] is a mnemonic plus ordered operands, a label
//! pseudo-instruction carrying a [`State`], or a raw passthrough line. Raw
//! lines let hand-written assembly fragments be embedded without full
//! structural modeling: the stored text renders unchanged in every
//! dialect, but the line's first whitespace-delimited token must map
//! case-insensitively to a known mnemonic.

use ecow::EcoString;

use crate::address::State;
use crate::diagnostics::{Diagnostic, DiagnosticCode};
use crate::source_analysis::Span;

use super::{Dialect, Operand};

/// The closed mnemonic set of the instruction model.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum Mnemonic {
    /// Move a value into a register or memory.
    Mov,
    /// Push a register onto the stack.
    Push,
    /// Pop the stack into a register.
    Pop,
    /// Integer addition.
    Add,
    /// Integer subtraction.
    Sub,
    /// Integer multiplication.
    Mul,
    /// Integer division.
    Div,
    /// Integer remainder.
    Mod,
    /// Arithmetic negation.
    Neg,
    /// Compare two operands, setting condition state.
    Cmp,
    /// Unconditional jump.
    Jmp,
    /// Jump if equal.
    Je,
    /// Jump if not equal.
    Jne,
    /// Jump if less.
    Jl,
    /// Jump if less or equal.
    Jle,
    /// Jump if greater.
    Jg,
    /// Jump if greater or equal.
    Jge,
    /// Call a labeled function.
    Call,
    /// Return from a function.
    Ret,
    /// Include pseudo-instruction referencing another compiled unit.
    Include,
}

impl Mnemonic {
    /// The lowercase spelling of the mnemonic.
    #[must_use]
    pub const fn as_str(self) -> &'static str {
        match self {
            Self::Mov => "mov",
            Self::Push => "push",
            Self::Pop => "pop",
            Self::Add => "add",
            Self::Sub => "sub",
            Self::Mul => "mul",
            Self::Div => "div",
            Self::Mod => "mod",
            Self::Neg => "neg",
            Self::Cmp => "cmp",
            Self::Jmp => "jmp",
            Self::Je => "je",
            Self::Jne => "jne",
            Self::Jl => "jl",
            Self::Jle => "jle",
            Self::Jg => "jg",
            Self::Jge => "jge",
            Self::Call => "call",
            Self::Ret => "ret",
            Self::Include => "include",
        }
    }

    /// Parses a mnemonic case-insensitively.
    #[must_use]
    pub fn parse(word: &str) -> Option<Self> {
        const ALL: [Mnemonic; 20] = [
            Mnemonic::Mov,
            Mnemonic::Push,
            Mnemonic::Pop,
            Mnemonic::Add,
            Mnemonic::Sub,
            Mnemonic::Mul,
            Mnemonic::Div,
            Mnemonic::Mod,
            Mnemonic::Neg,
            Mnemonic::Cmp,
            Mnemonic::Jmp,
            Mnemonic::Je,
            Mnemonic::Jne,
            Mnemonic::Jl,
            Mnemonic::Jle,
            Mnemonic::Jg,
            Mnemonic::Jge,
            Mnemonic::Call,
            Mnemonic::Ret,
            Mnemonic::Include,
        ];
        ALL.into_iter()
            .find(|m| m.as_str().eq_ignore_ascii_case(word))
    }

    /// Renders the mnemonic for the dialect.
    #[must_use]
    pub fn render(self, dialect: Dialect) -> String {
        dialect.word(self.as_str())
    }
}

/// One instruction of a text section.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum Instruction {
    /// A mnemonic with ordered operands.
    Op {
        /// The operation.
        mnemonic: Mnemonic,
        /// The operands, in model order; the emitter never reorders them.
        operands: Vec<Operand>,
    },

    /// A zero-operand label pseudo-instruction, rendered as `<name>:`.
    Label(State),

    /// A literal passthrough line, rendered unchanged in every dialect.
    Raw {
        /// The mnemonic derived from the line's first token.
        mnemonic: Mnemonic,
        /// The verbatim line.
        text: EcoString,
    },
}

impl Instruction {
    /// Builds an operation instruction.
    #[must_use]
    pub fn op(mnemonic: Mnemonic, operands: Vec<Operand>) -> Self {
        Self::Op { mnemonic, operands }
    }

    /// Builds a raw passthrough instruction from a literal line.
    ///
    /// The mnemonic is derived by taking the line's first
    /// whitespace-delimited token and mapping it case-insensitively to a
    /// known [`Mnemonic`].
    ///
    /// # Errors
    ///
    /// Returns an unknown-mnemonic diagnostic (code 402) when the first
    /// token is not recognized, or when the line is blank.
    pub fn raw(text: impl Into<EcoString>, span: Span) -> Result<Self, Diagnostic> {
        let text = text.into();
        let first = text.split_whitespace().next().unwrap_or("");
        match Mnemonic::parse(first) {
            Some(mnemonic) => Ok(Self::Raw { mnemonic, text }),
            None => Err(Diagnostic::new(DiagnosticCode::UnknownMnemonic, span).with_arg(first)),
        }
    }

    /// Builds the include pseudo-instruction for a unit name.
    ///
    /// The included unit is carried as a label-reference operand.
    #[must_use]
    pub fn include(unit: impl Into<EcoString>) -> Self {
        Self::Op {
            mnemonic: Mnemonic::Include,
            operands: vec![Operand::Label(State::root(unit))],
        }
    }

    /// Renders this instruction as one output line.
    ///
    /// Labels are rendered flush left; everything else is indented.
    #[must_use]
    pub fn render(&self, dialect: Dialect) -> String {
        match self {
            Self::Label(state) => format!("{state}:"),
            Self::Raw { text, .. } => format!("    {text}"),
            Self::Op { mnemonic, operands } => {
                if *mnemonic == Mnemonic::Include {
                    return render_include(operands, dialect);
                }
                let mut line = format!("    {}", mnemonic.render(dialect));
                for (i, operand) in operands.iter().enumerate() {
                    line.push_str(if i == 0 { " " } else { ", " });
                    line.push_str(&operand.render(dialect));
                }
                line
            }
        }
    }
}

/// Renders the include pseudo-instruction as the dialect's directive.
fn render_include(operands: &[Operand], dialect: Dialect) -> String {
    let unit = operands.first().map_or_else(String::new, |o| o.render(dialect));
    match dialect {
        Dialect::Nasm => format!("    %include \"{unit}\""),
        Dialect::Masm => format!("    INCLUDE {unit}"),
    }
}
