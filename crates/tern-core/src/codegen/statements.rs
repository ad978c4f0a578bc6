// Copyright 2026 James Casey
// SPDX-License-Identifier: Apache-2.0

//! Statement lowering.
//!
//! Control flow lowers to compare-against-zero plus conditional jumps;
//! every generated label is the enclosing function's state extended with a
//! fresh `L<n>` segment, so labels are unique per unit and stable across
//! runs.

use crate::asm::{Data, Instruction, MemoryRef, Mnemonic, Operand, Register, Variable};
use crate::ast::{Expr, Identifier, Stmt};
use crate::diagnostics::{Diagnostic, DiagnosticCode};

use super::Generator;

impl Generator<'_> {
    pub(super) fn lower_statement(&mut self, statement: &Stmt) -> Result<(), Diagnostic> {
        match statement {
            Stmt::Var {
                name, initializer, ..
            } => self.lower_var(name, initializer.as_ref(), true),

            Stmt::If {
                condition,
                then_branch,
                else_branch,
                ..
            } => self.lower_if(condition, then_branch, else_branch.as_deref()),

            Stmt::While {
                condition, body, ..
            } => self.lower_while(condition, body),

            Stmt::Return { value, .. } => {
                if let Some(value) = value {
                    self.lower_expr(value)?;
                }
                self.emit(Mnemonic::Ret, Vec::new());
                Ok(())
            }

            Stmt::RawAsm { lines, .. } => {
                for line in lines {
                    let instruction = Instruction::raw(line.text.clone(), line.span)?;
                    self.text.push(instruction);
                }
                Ok(())
            }

            Stmt::Block { statements, .. } => {
                for statement in statements {
                    self.lower_statement(statement)?;
                }
                Ok(())
            }

            Stmt::Expression { expression, .. } => self.lower_expr(expression),

            // The grammar only allows these in declaration position.
            Stmt::Component { span, .. } | Stmt::System { span, .. }
            | Stmt::Function { span, .. } => Err(Diagnostic::new(
                DiagnosticCode::UnsupportedConstruct,
                *span,
            )
            .with_arg("a nested declaration")),
        }
    }

    /// Lowers a `var` declaration.
    ///
    /// Storage always lands in the data section, labeled by the full
    /// state. A literal initializer is baked into the data entry; a
    /// non-literal initializer lowers to assignment code in program order,
    /// which is only possible inside a function body.
    pub(super) fn lower_var(
        &mut self,
        name: &Identifier,
        initializer: Option<&Expr>,
        local: bool,
    ) -> Result<(), Diagnostic> {
        let state = self.scope.child(name.name.clone());
        match initializer {
            None => {
                self.data.push(Variable {
                    state,
                    init: Data::Int(0),
                });
            }
            Some(Expr::Integer { value, .. }) => {
                self.data.push(Variable {
                    state,
                    init: Data::Int(*value),
                });
            }
            Some(Expr::Str { value, .. }) => {
                self.data.push(Variable {
                    state,
                    init: Data::Str(value.clone()),
                });
            }
            Some(other) if local => {
                self.data.push(Variable {
                    state: state.clone(),
                    init: Data::Int(0),
                });
                self.lower_expr(other)?;
                self.emit(
                    Mnemonic::Mov,
                    vec![
                        Operand::Memory(MemoryRef::direct(state)),
                        Operand::Register(Register::R0),
                    ],
                );
            }
            Some(other) => {
                return Err(Diagnostic::new(
                    DiagnosticCode::UnsupportedConstruct,
                    other.span(),
                )
                .with_arg("a non-literal initializer outside a function"));
            }
        }
        Ok(())
    }

    fn lower_if(
        &mut self,
        condition: &Expr,
        then_branch: &[Stmt],
        else_branch: Option<&[Stmt]>,
    ) -> Result<(), Diagnostic> {
        let after = self.fresh_label();
        let alternate = if else_branch.is_some() {
            self.fresh_label()
        } else {
            after.clone()
        };

        self.lower_expr(condition)?;
        self.emit(
            Mnemonic::Cmp,
            vec![Operand::Register(Register::R0), Operand::Immediate(0)],
        );
        self.emit(Mnemonic::Je, vec![Operand::Label(alternate.clone())]);

        for statement in then_branch {
            self.lower_statement(statement)?;
        }

        if let Some(else_branch) = else_branch {
            self.emit(Mnemonic::Jmp, vec![Operand::Label(after.clone())]);
            self.text.push(Instruction::Label(alternate));
            for statement in else_branch {
                self.lower_statement(statement)?;
            }
        }
        self.text.push(Instruction::Label(after));
        Ok(())
    }

    fn lower_while(&mut self, condition: &Expr, body: &[Stmt]) -> Result<(), Diagnostic> {
        let head = self.fresh_label();
        let after = self.fresh_label();

        self.text.push(Instruction::Label(head.clone()));
        self.lower_expr(condition)?;
        self.emit(
            Mnemonic::Cmp,
            vec![Operand::Register(Register::R0), Operand::Immediate(0)],
        );
        self.emit(Mnemonic::Je, vec![Operand::Label(after.clone())]);

        for statement in body {
            self.lower_statement(statement)?;
        }
        self.emit(Mnemonic::Jmp, vec![Operand::Label(head)]);
        self.text.push(Instruction::Label(after));
        Ok(())
    }
}
