// Copyright 2026 James Casey
// SPDX-License-Identifier: Apache-2.0

//! Instruction operands.
//!
//! Operands are dialect-agnostic values; each knows how to render itself
//! for a selected [`Dialect`]. Rendering is pure and never reorders
//! anything.

use crate::address::State;

use super::Dialect;

/// The abstract register file of the lowering model.
///
/// Lowering uses an accumulator machine: `R0` holds every expression
/// result, `R1` is the scratch register for binary operations and array
/// indexing, and `Sp` is the stack pointer used for argument passing.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum Register {
    /// The accumulator.
    R0,
    /// The scratch register.
    R1,
    /// The stack pointer.
    Sp,
}

impl Register {
    /// Renders the register name for the dialect.
    #[must_use]
    pub fn render(self, dialect: Dialect) -> String {
        let name = match self {
            Self::R0 => "eax",
            Self::R1 => "ebx",
            Self::Sp => "esp",
        };
        dialect.word(name)
    }
}

/// A memory reference: `base + index*scale + displacement`.
///
/// At least one of `base` and `index` is present in practice; a bare
/// displacement renders as an absolute address.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct MemoryRef {
    /// The base symbol, if any.
    pub base: Option<State>,
    /// The index register and its scale factor, if any.
    pub index: Option<(Register, u8)>,
    /// The constant displacement in bytes.
    pub displacement: i64,
}

impl MemoryRef {
    /// A direct reference to a symbol's address.
    #[must_use]
    pub const fn direct(base: State) -> Self {
        Self {
            base: Some(base),
            index: None,
            displacement: 0,
        }
    }

    /// A reference to `base + index*scale`.
    #[must_use]
    pub const fn indexed(base: State, index: Register, scale: u8) -> Self {
        Self {
            base: Some(base),
            index: Some((index, scale)),
            displacement: 0,
        }
    }

    /// Renders the inner address expression (without brackets).
    fn address_expr(&self, dialect: Dialect, include_base: bool) -> String {
        let mut out = String::new();
        if include_base {
            if let Some(base) = &self.base {
                out.push_str(&base.to_string());
            }
        }
        if let Some((register, scale)) = self.index {
            if !out.is_empty() {
                out.push('+');
            }
            out.push_str(&register.render(dialect));
            if scale != 1 {
                out.push('*');
                out.push_str(&scale.to_string());
            }
        }
        if self.displacement != 0 || out.is_empty() {
            if self.displacement >= 0 && !out.is_empty() {
                out.push('+');
            }
            out.push_str(&self.displacement.to_string());
        }
        out
    }

    /// Renders the memory reference for the dialect.
    ///
    /// NASM puts the whole expression in brackets (`[x+ebx*4+8]`); MASM
    /// keeps the base symbol outside (`x[EBX*4+8]`, or plain `x` when the
    /// reference is direct).
    #[must_use]
    pub fn render(&self, dialect: Dialect) -> String {
        match dialect {
            Dialect::Nasm => format!("[{}]", self.address_expr(dialect, true)),
            Dialect::Masm => {
                let base = self
                    .base
                    .as_ref()
                    .map(State::to_string)
                    .unwrap_or_default();
                if self.index.is_none() && self.displacement == 0 && !base.is_empty() {
                    base
                } else {
                    format!("{base}[{}]", self.address_expr(dialect, false))
                }
            }
        }
    }
}

/// An instruction operand.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum Operand {
    /// A register.
    Register(Register),
    /// An immediate integer value.
    Immediate(i64),
    /// A memory reference.
    Memory(MemoryRef),
    /// A reference to a labeled state (jump and call targets).
    Label(State),
}

impl Operand {
    /// Renders the operand for the dialect.
    #[must_use]
    pub fn render(&self, dialect: Dialect) -> String {
        match self {
            Self::Register(register) => register.render(dialect),
            Self::Immediate(value) => value.to_string(),
            Self::Memory(memory) => memory.render(dialect),
            Self::Label(state) => state.to_string(),
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn state(path: &[&str]) -> State {
        State::from_segments(path.iter().copied())
    }

    #[test]
    fn register_case_per_dialect() {
        assert_eq!(Register::R0.render(Dialect::Nasm), "eax");
        assert_eq!(Register::R0.render(Dialect::Masm), "EAX");
        assert_eq!(Register::Sp.render(Dialect::Masm), "ESP");
    }

    #[test]
    fn direct_memory_reference() {
        let memory = MemoryRef::direct(state(&["A", "x"]));
        assert_eq!(memory.render(Dialect::Nasm), "[A.x]");
        assert_eq!(memory.render(Dialect::Masm), "A.x");
    }

    #[test]
    fn indexed_memory_reference() {
        let memory = MemoryRef::indexed(state(&["A", "a"]), Register::R1, 4);
        assert_eq!(memory.render(Dialect::Nasm), "[A.a+ebx*4]");
        assert_eq!(memory.render(Dialect::Masm), "A.a[EBX*4]");
    }

    #[test]
    fn displaced_memory_reference() {
        let memory = MemoryRef {
            base: Some(state(&["x"])),
            index: None,
            displacement: 8,
        };
        assert_eq!(memory.render(Dialect::Nasm), "[x+8]");
        assert_eq!(memory.render(Dialect::Masm), "x[8]");

        let negative = MemoryRef {
            base: Some(state(&["x"])),
            index: None,
            displacement: -4,
        };
        assert_eq!(negative.render(Dialect::Nasm), "[x-4]");
    }

    #[test]
    fn scale_of_one_is_elided() {
        let memory = MemoryRef::indexed(state(&["a"]), Register::R1, 1);
        assert_eq!(memory.render(Dialect::Nasm), "[a+ebx]");
    }

    #[test]
    fn operand_rendering() {
        assert_eq!(Operand::Immediate(42).render(Dialect::Nasm), "42");
        assert_eq!(Operand::Immediate(-1).render(Dialect::Masm), "-1");
        assert_eq!(
            Operand::Label(state(&["A", "B", "f"])).render(Dialect::Masm),
            "A.B.f"
        );
        assert_eq!(
            Operand::Register(Register::R1).render(Dialect::Nasm),
            "ebx"
        );
    }
}
