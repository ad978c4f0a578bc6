// Copyright 2026 James Casey
// SPDX-License-Identifier: Apache-2.0

//! Expression lowering.
//!
//! Expressions evaluate on an accumulator machine: every expression leaves
//! its result in `r0`, binary operations stage the left operand on the
//! stack while the right operand is computed, and `r1` is the only scratch
//! register. Comparisons and logical not materialize `0`/`1` in `r0` via a
//! compare and conditional jump, so a condition value is always an
//! ordinary integer.
//!
//! String literals have no expression-level lowering; they are valid only
//! as `var` initializers (and include operands) and report an unsupported
//! construct anywhere else.

use crate::address::State;
use crate::asm::{Instruction, MemoryRef, Mnemonic, Operand, Register};
use crate::ast::{BinaryOp, Call, Expr, UnaryOp};
use crate::diagnostics::{Diagnostic, DiagnosticCode};

use super::Generator;

/// Machine word size in bytes; array elements and call arguments are one
/// word each.
const WORD: i64 = 4;

impl Generator<'_> {
    /// Lowers an expression, leaving its value in `r0`.
    pub(super) fn lower_expr(&mut self, expr: &Expr) -> Result<(), Diagnostic> {
        match expr {
            Expr::Integer { value, .. } => {
                self.emit(
                    Mnemonic::Mov,
                    vec![Operand::Register(Register::R0), Operand::Immediate(*value)],
                );
                Ok(())
            }

            Expr::Str { span, .. } => Err(Diagnostic::new(
                DiagnosticCode::UnsupportedConstruct,
                *span,
            )
            .with_arg("a string literal in an expression")),

            Expr::Grouping { expression, .. } => self.lower_expr(expression),

            Expr::Unary { op, operand, .. } => self.lower_unary(*op, operand),

            Expr::Binary {
                op, left, right, ..
            } => self.lower_binary(*op, left, right),

            Expr::Assignment { target, value, .. } => self.lower_assignment(target, value),

            Expr::Call(call) => self.lower_call(call),
        }
    }

    /// Resolves a reference or reports code 302 at the use site.
    fn resolve(&self, frame: &crate::address::AddressFrame) -> Result<State, Diagnostic> {
        self.table.resolve(frame).map_or_else(
            || {
                Err(
                    Diagnostic::new(DiagnosticCode::UndefinedIdentifier, frame.span())
                        .with_arg(frame.display_path()),
                )
            },
            |symbol| Ok(symbol.state.clone()),
        )
    }

    fn lower_unary(&mut self, op: UnaryOp, operand: &Expr) -> Result<(), Diagnostic> {
        self.lower_expr(operand)?;
        match op {
            UnaryOp::Neg => {
                self.emit(Mnemonic::Neg, vec![Operand::Register(Register::R0)]);
            }
            UnaryOp::Not => {
                self.emit(
                    Mnemonic::Cmp,
                    vec![Operand::Register(Register::R0), Operand::Immediate(0)],
                );
                self.materialize_flag(Mnemonic::Je);
            }
        }
        Ok(())
    }

    fn lower_binary(&mut self, op: BinaryOp, left: &Expr, right: &Expr) -> Result<(), Diagnostic> {
        // Left first, staged on the stack while the right side runs.
        self.lower_expr(left)?;
        self.emit(Mnemonic::Push, vec![Operand::Register(Register::R0)]);
        self.lower_expr(right)?;
        self.emit(
            Mnemonic::Mov,
            vec![
                Operand::Register(Register::R1),
                Operand::Register(Register::R0),
            ],
        );
        self.emit(Mnemonic::Pop, vec![Operand::Register(Register::R0)]);

        let registers = vec![
            Operand::Register(Register::R0),
            Operand::Register(Register::R1),
        ];
        match op {
            BinaryOp::Add => self.emit(Mnemonic::Add, registers),
            BinaryOp::Sub => self.emit(Mnemonic::Sub, registers),
            BinaryOp::Mul => self.emit(Mnemonic::Mul, registers),
            BinaryOp::Div => self.emit(Mnemonic::Div, registers),
            BinaryOp::Mod => self.emit(Mnemonic::Mod, registers),
            BinaryOp::Eq
            | BinaryOp::Ne
            | BinaryOp::Lt
            | BinaryOp::Le
            | BinaryOp::Gt
            | BinaryOp::Ge => {
                self.emit(Mnemonic::Cmp, registers);
                self.materialize_flag(comparison_jump(op));
            }
        }
        Ok(())
    }

    /// Turns the condition state set by a preceding `cmp` into `0`/`1` in
    /// `r0`, taking `jump` when the condition holds.
    fn materialize_flag(&mut self, jump: Mnemonic) {
        let truthy = self.fresh_label();
        let after = self.fresh_label();
        self.emit(jump, vec![Operand::Label(truthy.clone())]);
        self.emit(
            Mnemonic::Mov,
            vec![Operand::Register(Register::R0), Operand::Immediate(0)],
        );
        self.emit(Mnemonic::Jmp, vec![Operand::Label(after.clone())]);
        self.text.push(Instruction::Label(truthy));
        self.emit(
            Mnemonic::Mov,
            vec![Operand::Register(Register::R0), Operand::Immediate(1)],
        );
        self.text.push(Instruction::Label(after));
    }

    fn lower_assignment(&mut self, target: &Call, value: &Expr) -> Result<(), Diagnostic> {
        match target {
            Call::Identifier { frame, .. } => {
                let state = self.resolve(frame)?;
                self.lower_expr(value)?;
                self.emit(
                    Mnemonic::Mov,
                    vec![
                        Operand::Memory(MemoryRef::direct(state)),
                        Operand::Register(Register::R0),
                    ],
                );
                Ok(())
            }
            Call::Array { frame, index, .. } => {
                let state = self.resolve(frame)?;
                self.lower_expr(value)?;
                self.emit(Mnemonic::Push, vec![Operand::Register(Register::R0)]);
                self.lower_expr(index)?;
                self.emit(
                    Mnemonic::Mov,
                    vec![
                        Operand::Register(Register::R1),
                        Operand::Register(Register::R0),
                    ],
                );
                self.emit(Mnemonic::Pop, vec![Operand::Register(Register::R0)]);
                self.emit(
                    Mnemonic::Mov,
                    vec![
                        Operand::Memory(MemoryRef::indexed(state, Register::R1, 4)),
                        Operand::Register(Register::R0),
                    ],
                );
                Ok(())
            }
            // The parser only produces identifier and array targets.
            Call::Function { span, .. } => Err(Diagnostic::new(
                DiagnosticCode::UnsupportedConstruct,
                *span,
            )
            .with_arg("assignment to a call result")),
        }
    }

    fn lower_call(&mut self, call: &Call) -> Result<(), Diagnostic> {
        match call {
            Call::Identifier { frame, .. } => {
                let state = self.resolve(frame)?;
                self.emit(
                    Mnemonic::Mov,
                    vec![
                        Operand::Register(Register::R0),
                        Operand::Memory(MemoryRef::direct(state)),
                    ],
                );
                Ok(())
            }

            Call::Function {
                frame, arguments, ..
            } => {
                let state = self.resolve(frame)?;
                for argument in arguments {
                    self.lower_expr(argument)?;
                    self.emit(Mnemonic::Push, vec![Operand::Register(Register::R0)]);
                }
                self.emit(Mnemonic::Call, vec![Operand::Label(state)]);
                if !arguments.is_empty() {
                    let bytes = WORD * i64::try_from(arguments.len()).unwrap_or(i64::MAX);
                    self.emit(
                        Mnemonic::Add,
                        vec![
                            Operand::Register(Register::Sp),
                            Operand::Immediate(bytes),
                        ],
                    );
                }
                Ok(())
            }

            Call::Array { frame, index, .. } => {
                let state = self.resolve(frame)?;
                self.lower_expr(index)?;
                self.emit(
                    Mnemonic::Mov,
                    vec![
                        Operand::Register(Register::R1),
                        Operand::Register(Register::R0),
                    ],
                );
                self.emit(
                    Mnemonic::Mov,
                    vec![
                        Operand::Register(Register::R0),
                        Operand::Memory(MemoryRef::indexed(state, Register::R1, 4)),
                    ],
                );
                Ok(())
            }
        }
    }
}

/// The conditional jump taken when a comparison holds.
fn comparison_jump(op: BinaryOp) -> Mnemonic {
    match op {
        BinaryOp::Eq => Mnemonic::Je,
        BinaryOp::Ne => Mnemonic::Jne,
        BinaryOp::Lt => Mnemonic::Jl,
        BinaryOp::Le => Mnemonic::Jle,
        BinaryOp::Gt => Mnemonic::Jg,
        BinaryOp::Ge => Mnemonic::Jge,
        _ => unreachable!("not a comparison: {op}"),
    }
}
