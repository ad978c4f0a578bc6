// Copyright 2026 James Casey
// SPDX-License-Identifier: Apache-2.0

//! Lowering from the AST to the instruction model.
//!
//! Code generation is two passes over the tree:
//!
//! 1. **Declaration collection** walks every declaration (including
//!    function-local `var`s and parameters) and registers its [`State`] in
//!    a per-unit [`SymbolTable`], which is then committed into the shared
//!    table in one step. Forward references work because no resolution
//!    happens until the table is complete.
//! 2. **Lowering** walks the tree again, resolving every
//!    [`AddressFrame`](crate::address::AddressFrame) against the committed
//!    table and emitting instructions for an accumulator machine (see
//!    [`expressions`] for the evaluation model).
//!
//! A resolution or lowering failure aborts the enclosing declaration
//! (its partial instructions are discarded) and lowering continues with
//! the siblings, so one bad function does not hide diagnostics in the
//! next one.

mod expressions;
mod statements;

use ecow::EcoString;

use crate::address::{State, Symbol, SymbolKind, SymbolTable};
use crate::asm::{Instruction, Library, MemoryRef, Mnemonic, Operand, Register, Section, Variable};
use crate::ast::{Program, Stmt};
use crate::diagnostics::Diagnostic;

/// Lowers a parsed unit to its [`Library`].
///
/// The unit's declarations are committed into `table` before lowering, so
/// multiple units sharing one table see each other's states. Failures are
/// reported through the returned diagnostics; a unit that produced any
/// error must not have its library rendered as a successful compilation.
#[must_use]
pub fn lower(program: &Program, table: &mut SymbolTable) -> (Library, Vec<Diagnostic>) {
    let (unit, mut diagnostics) = collect(program);
    diagnostics.extend(table.commit(unit));

    let mut generator = Generator::new(table);
    generator.lower_unit(program);
    diagnostics.extend(generator.diagnostics);

    let mut library = Library::new(program.header.name.name.clone());
    if !generator.data.is_empty() {
        library.add_section(Section::Data {
            variables: generator.data,
        });
    }
    if !generator.text.is_empty() {
        library.add_section(Section::Text {
            instructions: generator.text,
        });
    }
    (library, diagnostics)
}

/// Pass 1: registers every declared state of the unit.
///
/// Duplicates within the unit are reported here; a duplicate declaration's
/// members are not descended into, so one clash does not cascade.
fn collect(program: &Program) -> (SymbolTable, Vec<Diagnostic>) {
    let mut table = SymbolTable::new();
    let mut diagnostics = Vec::new();
    for declaration in &program.declarations {
        collect_declaration(
            &mut table,
            &mut diagnostics,
            &State::top_level(),
            declaration,
        );
    }
    (table, diagnostics)
}

fn collect_declaration(
    table: &mut SymbolTable,
    diagnostics: &mut Vec<Diagnostic>,
    scope: &State,
    declaration: &Stmt,
) {
    let mut declare = |table: &mut SymbolTable, state: State, kind, span| match table.declare(
        Symbol { state, kind, span },
    ) {
        Ok(()) => true,
        Err(diagnostic) => {
            diagnostics.push(diagnostic);
            false
        }
    };

    match declaration {
        Stmt::Component { name, members, .. } | Stmt::System { name, members, .. } => {
            let kind = if matches!(declaration, Stmt::Component { .. }) {
                SymbolKind::Component
            } else {
                SymbolKind::System
            };
            let state = scope.child(name.name.clone());
            if declare(table, state.clone(), kind, name.span) {
                for member in members {
                    collect_declaration(table, diagnostics, &state, member);
                }
            }
        }
        Stmt::Function {
            name,
            parameters,
            body,
            ..
        } => {
            let state = scope.child(name.name.clone());
            if declare(table, state.clone(), SymbolKind::Function, name.span) {
                for parameter in parameters {
                    declare(
                        table,
                        state.child(parameter.name.clone()),
                        SymbolKind::Parameter,
                        parameter.span,
                    );
                }
                for statement in body {
                    collect_statement(table, diagnostics, &state, statement);
                }
            }
        }
        Stmt::Var { name, .. } => {
            declare(
                table,
                scope.child(name.name.clone()),
                SymbolKind::Variable,
                name.span,
            );
        }
        _ => {}
    }
}

/// Registers `var` declarations nested in statement position.
///
/// Blocks, `if`, and `while` bodies do not open scopes of their own; their
/// locals belong to the enclosing function state.
fn collect_statement(
    table: &mut SymbolTable,
    diagnostics: &mut Vec<Diagnostic>,
    scope: &State,
    statement: &Stmt,
) {
    match statement {
        Stmt::Var { .. } => collect_declaration(table, diagnostics, scope, statement),
        Stmt::If {
            then_branch,
            else_branch,
            ..
        } => {
            for s in then_branch {
                collect_statement(table, diagnostics, scope, s);
            }
            for s in else_branch.iter().flatten() {
                collect_statement(table, diagnostics, scope, s);
            }
        }
        Stmt::While { body, .. } | Stmt::Block {
            statements: body, ..
        } => {
            for s in body {
                collect_statement(table, diagnostics, scope, s);
            }
        }
        _ => {}
    }
}

/// Pass 2 state: the emission buffers and the lowering cursor.
struct Generator<'a> {
    table: &'a SymbolTable,
    /// The scope being lowered; inside a function body this is the
    /// function's state and also the prefix of generated labels.
    scope: State,
    data: Vec<Variable>,
    text: Vec<Instruction>,
    diagnostics: Vec<Diagnostic>,
    /// Per-unit label counter; never reset, so emission is deterministic.
    labels: u32,
}

impl<'a> Generator<'a> {
    fn new(table: &'a SymbolTable) -> Self {
        Self {
            table,
            scope: State::top_level(),
            data: Vec::new(),
            text: Vec::new(),
            diagnostics: Vec::new(),
            labels: 0,
        }
    }

    fn lower_unit(&mut self, program: &Program) {
        // Include pseudo-instructions come before any other text.
        for include in &program.includes {
            self.text.push(Instruction::include(include.library.clone()));
        }
        for declaration in &program.declarations {
            self.lower_declaration(declaration);
        }
    }

    /// Lowers one declaration with failure isolation: on error the
    /// declaration's partial output is rolled back and its diagnostic
    /// recorded, leaving siblings unaffected.
    fn lower_declaration(&mut self, declaration: &Stmt) {
        let data_mark = self.data.len();
        let text_mark = self.text.len();
        if let Err(diagnostic) = self.try_lower_declaration(declaration) {
            self.data.truncate(data_mark);
            self.text.truncate(text_mark);
            self.diagnostics.push(diagnostic);
        }
    }

    fn try_lower_declaration(&mut self, declaration: &Stmt) -> Result<(), Diagnostic> {
        match declaration {
            Stmt::Component { name, members, .. } | Stmt::System { name, members, .. } => {
                self.scope = self.scope.child(name.name.clone());
                for member in members {
                    self.lower_declaration(member);
                }
                self.scope = self.scope.parent().unwrap_or_default();
                Ok(())
            }
            Stmt::Function {
                name,
                parameters,
                body,
                ..
            } => self.lower_function(name, parameters, body),
            Stmt::Var {
                name, initializer, ..
            } => self.lower_var(name, initializer.as_ref(), false),
            other => {
                self.lower_statement(other)
            }
        }
    }

    fn lower_function(
        &mut self,
        name: &crate::ast::Identifier,
        parameters: &[crate::ast::Identifier],
        body: &[Stmt],
    ) -> Result<(), Diagnostic> {
        let state = self.scope.child(name.name.clone());
        self.text.push(Instruction::Label(state.clone()));
        self.scope = state;

        let result = self.lower_function_inner(parameters, body);

        self.scope = self.scope.parent().unwrap_or_default();
        result
    }

    fn lower_function_inner(
        &mut self,
        parameters: &[crate::ast::Identifier],
        body: &[Stmt],
    ) -> Result<(), Diagnostic> {
        // Parameters get static storage under the function state; the
        // prologue copies the caller's pushed arguments into it. Arguments
        // are pushed left to right, so the first parameter is deepest on
        // the stack, just above the return address.
        let count = i64::try_from(parameters.len()).unwrap_or(i64::MAX);
        for (i, parameter) in parameters.iter().enumerate() {
            let storage = self.scope.child(parameter.name.clone());
            self.data.push(Variable {
                state: storage.clone(),
                init: crate::asm::Data::Int(0),
            });
            let offset = 4 * (count - i64::try_from(i).unwrap_or(0));
            self.text.push(Instruction::op(
                Mnemonic::Mov,
                vec![
                    Operand::Register(Register::R0),
                    Operand::Memory(MemoryRef {
                        base: None,
                        index: Some((Register::Sp, 1)),
                        displacement: offset,
                    }),
                ],
            ));
            self.text.push(Instruction::op(
                Mnemonic::Mov,
                vec![
                    Operand::Memory(MemoryRef::direct(storage)),
                    Operand::Register(Register::R0),
                ],
            ));
        }

        for statement in body {
            self.lower_statement(statement)?;
        }

        if !matches!(body.last(), Some(Stmt::Return { .. })) {
            self.text.push(Instruction::op(Mnemonic::Ret, Vec::new()));
        }
        Ok(())
    }

    /// Returns a fresh control-flow label under the enclosing function.
    fn fresh_label(&mut self) -> State {
        self.labels += 1;
        self.scope.child(EcoString::from(format!("L{}", self.labels)))
    }

    fn emit(&mut self, mnemonic: Mnemonic, operands: Vec<Operand>) {
        self.text.push(Instruction::op(mnemonic, operands));
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::asm::Dialect;
    use crate::source_analysis::{lex, parse};

    pub(crate) fn lower_ok(source: &str) -> Library {
        let (library, diagnostics) = lower_source(source);
        assert!(
            diagnostics.is_empty(),
            "unexpected diagnostics: {diagnostics:?}"
        );
        library
    }

    pub(crate) fn lower_source(source: &str) -> (Library, Vec<Diagnostic>) {
        let tokens = lex(source).expect("lexing should succeed");
        let (program, diagnostics) = parse(tokens);
        assert!(
            diagnostics.is_empty(),
            "parse should succeed: {diagnostics:?}"
        );
        let mut table = SymbolTable::new();
        lower(&program, &mut table)
    }

    pub(crate) fn text_lines(library: &Library) -> Vec<String> {
        library
            .render(Dialect::Nasm)
            .lines()
            .map(|l| l.trim().to_string())
            .filter(|l| !l.is_empty())
            .collect()
    }

    #[test]
    fn include_is_first_in_text_section() {
        let library = lower_ok("library m; include \"core\"; function f() {}");
        let lines = text_lines(&library);
        let text_at = lines.iter().position(|l| l == "section .text").unwrap();
        assert_eq!(lines[text_at + 1], "%include \"core\"");
    }

    #[test]
    fn top_level_var_lands_in_data_section() {
        let library = lower_ok("library m; var x = 7;");
        assert_eq!(
            library.render(Dialect::Nasm),
            "section .data\nx dd 7\n"
        );
    }

    #[test]
    fn component_path_prefixes_the_label() {
        let library = lower_ok("library m; component A { system B { function f() {} } }");
        let lines = text_lines(&library);
        assert!(lines.contains(&"A.B.f:".to_string()), "got: {lines:?}");
    }

    #[test]
    fn function_without_return_gets_implicit_ret() {
        let library = lower_ok("library m; function f() {}");
        let lines = text_lines(&library);
        assert_eq!(lines.last().unwrap(), "ret");
    }

    #[test]
    fn explicit_trailing_return_is_not_doubled() {
        let library = lower_ok("library m; function f() { return 1; }");
        let lines = text_lines(&library);
        assert_eq!(lines.iter().filter(|l| *l == "ret").count(), 1);
    }

    #[test]
    fn parameters_are_copied_from_the_stack() {
        let library = lower_ok("library m; function f(a, b) {}");
        let lines = text_lines(&library);
        // First parameter is deepest: two slots above the return address.
        assert!(lines.contains(&"mov eax, [esp+8]".to_string()), "got: {lines:?}");
        assert!(lines.contains(&"mov [f.a], eax".to_string()), "got: {lines:?}");
        assert!(lines.contains(&"mov eax, [esp+4]".to_string()), "got: {lines:?}");
        assert!(lines.contains(&"mov [f.b], eax".to_string()), "got: {lines:?}");
    }

    #[test]
    fn failed_declaration_is_rolled_back_but_siblings_survive() {
        let (library, diagnostics) = lower_source(
            "library m;\n\
             function bad() { missing; }\n\
             function good() { return 2; }\n",
        );
        assert_eq!(diagnostics.len(), 1);
        assert_eq!(
            diagnostics[0].code(),
            crate::diagnostics::DiagnosticCode::UndefinedIdentifier
        );
        let lines = text_lines(&library);
        // The failing function's label was rolled back with its body.
        assert!(!lines.contains(&"bad:".to_string()));
        assert!(lines.contains(&"good:".to_string()));
    }

    #[test]
    fn duplicate_local_declaration_is_reported() {
        let tokens = lex("library m; function f() { var x; var x; }").unwrap();
        let (program, parse_diagnostics) = parse(tokens);
        assert!(parse_diagnostics.is_empty());
        let mut table = SymbolTable::new();
        let (_, diagnostics) = lower(&program, &mut table);
        assert_eq!(diagnostics.len(), 1);
        assert_eq!(
            diagnostics[0].code(),
            crate::diagnostics::DiagnosticCode::DuplicateDeclaration
        );
        assert!(diagnostics[0].related().is_some());
    }

    #[test]
    fn two_units_share_one_table() {
        let mut table = SymbolTable::new();

        let tokens = lex("library a; function f() {}").unwrap();
        let (first, _) = parse(tokens);
        let (_, diagnostics) = lower(&first, &mut table);
        assert!(diagnostics.is_empty());

        // Same top-level state in a second unit clashes.
        let tokens = lex("library b; function f() {}").unwrap();
        let (second, _) = parse(tokens);
        let (_, diagnostics) = lower(&second, &mut table);
        assert_eq!(
            diagnostics[0].code(),
            crate::diagnostics::DiagnosticCode::DuplicateDeclaration
        );
    }

    #[test]
    fn empty_program_renders_no_sections() {
        let library = lower_ok("library m;");
        assert_eq!(library.render(Dialect::Nasm), "\n");
        assert_eq!(library.name(), "m");
    }
}
