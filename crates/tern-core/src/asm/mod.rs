// Copyright 2026 James Casey
// SPDX-License-Identifier: Apache-2.0

//! The dialect-agnostic instruction model.
//!
//! A compiled unit is a [`Library`]: a name plus ordered [`Section`]s. A
//! data section holds [`Variable`]s; a text section holds
//! [`Instruction`]s. Ordering is preserved end-to-end: sections render in
//! the order they were added, and each section renders its items in
//! registration order, one per line, after its header line. Rendering is
//! deterministic, pure, and parameterized by [`Dialect`]; the model itself
//! never changes with the dialect.

mod instruction;
mod operand;
mod syntax;

pub use instruction::{Instruction, Mnemonic};
pub use operand::{MemoryRef, Operand, Register};
pub use syntax::Dialect;

use ecow::EcoString;

use crate::address::State;

/// The initial value of a data-section variable.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum Data {
    /// A machine word.
    Int(i64),
    /// A NUL-terminated byte string.
    Str(EcoString),
}

/// A data-section entry: a labeled storage location with an initial value.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Variable {
    /// The variable's full scope path, used as its label.
    pub state: State,
    /// The initial value.
    pub init: Data,
}

impl Variable {
    /// Renders this variable as one output line.
    #[must_use]
    pub fn render(&self, dialect: Dialect) -> String {
        match &self.init {
            Data::Int(value) => {
                format!("{} {} {value}", self.state, dialect.word("dd"))
            }
            Data::Str(text) => {
                format!(
                    "{} {} \"{}\", 0",
                    self.state,
                    dialect.word("db"),
                    escape(text)
                )
            }
        }
    }
}

/// Escapes a data string for emission between double quotes.
fn escape(text: &str) -> String {
    let mut out = String::with_capacity(text.len());
    for c in text.chars() {
        match c {
            '"' => out.push_str("\\\""),
            '\\' => out.push_str("\\\\"),
            '\n' => out.push_str("\\n"),
            '\t' => out.push_str("\\t"),
            c => out.push(c),
        }
    }
    out
}

/// A named region of a library.
///
/// Items are never reordered after construction; emission order equals
/// registration order.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum Section {
    /// Initialized storage.
    Data {
        /// The variables, in registration order.
        variables: Vec<Variable>,
    },
    /// Executable instructions.
    Text {
        /// The instructions, in registration order.
        instructions: Vec<Instruction>,
    },
}

impl Section {
    /// Creates an empty data section.
    #[must_use]
    pub const fn data() -> Self {
        Self::Data {
            variables: Vec::new(),
        }
    }

    /// Creates an empty text section.
    #[must_use]
    pub const fn text() -> Self {
        Self::Text {
            instructions: Vec::new(),
        }
    }

    /// Returns the number of items in this section.
    #[must_use]
    pub fn len(&self) -> usize {
        match self {
            Self::Data { variables } => variables.len(),
            Self::Text { instructions } => instructions.len(),
        }
    }

    /// Returns `true` if this section has no items.
    #[must_use]
    pub fn is_empty(&self) -> bool {
        self.len() == 0
    }

    /// Renders the section header line for the dialect.
    #[must_use]
    pub fn header(&self, dialect: Dialect) -> String {
        match (self, dialect) {
            (Self::Data { .. }, Dialect::Nasm) => "section .data".to_string(),
            (Self::Text { .. }, Dialect::Nasm) => "section .text".to_string(),
            (Self::Data { .. }, Dialect::Masm) => ".DATA".to_string(),
            (Self::Text { .. }, Dialect::Masm) => ".CODE".to_string(),
        }
    }

    /// Renders the section: its header line followed by one line per item,
    /// in registration order.
    #[must_use]
    pub fn render(&self, dialect: Dialect) -> String {
        let mut out = self.header(dialect);
        match self {
            Self::Data { variables } => {
                for variable in variables {
                    out.push('\n');
                    out.push_str(&variable.render(dialect));
                }
            }
            Self::Text { instructions } => {
                for instruction in instructions {
                    out.push('\n');
                    out.push_str(&instruction.render(dialect));
                }
            }
        }
        out
    }
}

/// A compiled unit: a name and its ordered sections.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Library {
    name: EcoString,
    sections: Vec<Section>,
}

impl Library {
    /// Creates an empty library.
    #[must_use]
    pub fn new(name: impl Into<EcoString>) -> Self {
        Self {
            name: name.into(),
            sections: Vec::new(),
        }
    }

    /// Returns the library name.
    #[must_use]
    pub fn name(&self) -> &EcoString {
        &self.name
    }

    /// Appends a section; sections render in the order they were added.
    pub fn add_section(&mut self, section: Section) {
        self.sections.push(section);
    }

    /// Returns the sections in order.
    #[must_use]
    pub fn sections(&self) -> &[Section] {
        &self.sections
    }

    /// Renders the whole library as assembly text.
    ///
    /// Sections are separated by a blank line; the output ends with a
    /// newline.
    #[must_use]
    pub fn render(&self, dialect: Dialect) -> String {
        let mut out = String::new();
        for (i, section) in self.sections.iter().enumerate() {
            if i > 0 {
                out.push_str("\n\n");
            }
            out.push_str(&section.render(dialect));
        }
        out.push('\n');
        out
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn sample_text_section(count: usize) -> Section {
        let mut instructions = Vec::new();
        for i in 0..count {
            instructions.push(Instruction::op(
                Mnemonic::Mov,
                vec![
                    Operand::Register(Register::R0),
                    Operand::Immediate(i64::try_from(i).unwrap()),
                ],
            ));
        }
        Section::Text { instructions }
    }

    #[test]
    fn section_renders_header_plus_one_line_per_instruction() {
        for count in [0, 1, 3, 7] {
            let section = sample_text_section(count);
            let rendered = section.render(Dialect::Nasm);
            let non_empty = rendered.lines().filter(|l| !l.trim().is_empty()).count();
            assert_eq!(non_empty, count + 1);
        }
    }

    #[test]
    fn dialects_agree_on_ordering() {
        let section = sample_text_section(4);
        let nasm: Vec<String> = section
            .render(Dialect::Nasm)
            .lines()
            .map(str::to_string)
            .collect();
        let masm: Vec<String> = section
            .render(Dialect::Masm)
            .lines()
            .map(str::to_string)
            .collect();
        assert_eq!(nasm.len(), masm.len());
        // Same immediate on the same line in both dialects.
        for (a, b) in nasm.iter().zip(&masm).skip(1) {
            let a_imm = a.rsplit(", ").next().unwrap();
            let b_imm = b.rsplit(", ").next().unwrap();
            assert_eq!(a_imm, b_imm);
        }
    }

    #[test]
    fn data_section_renders_variables() {
        let section = Section::Data {
            variables: vec![
                Variable {
                    state: State::from_segments(["main", "x"]),
                    init: Data::Int(42),
                },
                Variable {
                    state: State::from_segments(["main", "greeting"]),
                    init: Data::Str("hi \"there\"".into()),
                },
            ],
        };
        assert_eq!(
            section.render(Dialect::Nasm),
            "section .data\nmain.x dd 42\nmain.greeting db \"hi \\\"there\\\"\", 0"
        );
        assert_eq!(
            section.render(Dialect::Masm),
            ".DATA\nmain.x DD 42\nmain.greeting DB \"hi \\\"there\\\"\", 0"
        );
    }

    #[test]
    fn library_renders_sections_in_insertion_order() {
        let mut library = Library::new("main");
        library.add_section(Section::Data {
            variables: vec![Variable {
                state: State::root("x"),
                init: Data::Int(0),
            }],
        });
        library.add_section(sample_text_section(1));

        let rendered = library.render(Dialect::Nasm);
        let data_at = rendered.find("section .data").unwrap();
        let text_at = rendered.find("section .text").unwrap();
        assert!(data_at < text_at);
        assert!(rendered.ends_with('\n'));
    }

    #[test]
    fn empty_library_renders_nothing_but_a_newline() {
        assert_eq!(Library::new("empty").render(Dialect::Nasm), "\n");
    }
}
