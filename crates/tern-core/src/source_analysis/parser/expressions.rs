// Copyright 2026 James Casey
// SPDX-License-Identifier: Apache-2.0

//! Pratt expression parsing.
//!
//! Binding powers, loosest to tightest:
//!
//! | power | operators              | associativity |
//! |-------|------------------------|---------------|
//! | 5     | `=`                    | right         |
//! | 10    | `==` `!=`              | left          |
//! | 20    | `<` `<=` `>` `>=`      | left          |
//! | 30    | `+` `-`                | left          |
//! | 40    | `*` `/` `%`            | left          |
//! | 50    | unary `-` `!`          | prefix        |
//!
//! Reference expressions (`a.b.c`, `f(x)`, `a[i]`) parse into [`Call`]
//! nodes carrying an [`AddressFrame`](crate::address::AddressFrame); the
//! frame's scope is stamped at the use site and resolved later.

use crate::ast::{BinaryOp, Call, Expr, UnaryOp};
use crate::diagnostics::{Diagnostic, DiagnosticCode};

use super::{Parser, TokenKind};

/// The binding power of a prefix operator.
const UNARY_BINDING_POWER: u8 = 50;

/// An infix operator's left and right binding powers.
#[derive(Debug, Clone, Copy)]
struct BindingPower {
    left: u8,
    right: u8,
}

impl BindingPower {
    const fn left_assoc(power: u8) -> Self {
        Self {
            left: power,
            right: power + 1,
        }
    }

    const fn right_assoc(power: u8) -> Self {
        Self {
            left: power + 1,
            right: power,
        }
    }
}

/// Returns the infix binding power of a token, if it is an infix operator.
fn infix_binding_power(kind: &TokenKind) -> Option<BindingPower> {
    let power = match kind {
        TokenKind::Assign => BindingPower::right_assoc(5),
        TokenKind::EqEq | TokenKind::BangEq => BindingPower::left_assoc(10),
        TokenKind::Lt | TokenKind::LtEq | TokenKind::Gt | TokenKind::GtEq => {
            BindingPower::left_assoc(20)
        }
        TokenKind::Plus | TokenKind::Minus => BindingPower::left_assoc(30),
        TokenKind::Star | TokenKind::Slash | TokenKind::Percent => BindingPower::left_assoc(40),
        _ => return None,
    };
    Some(power)
}

/// Maps an infix token to its binary operator.
fn binary_op(kind: &TokenKind) -> BinaryOp {
    match kind {
        TokenKind::Plus => BinaryOp::Add,
        TokenKind::Minus => BinaryOp::Sub,
        TokenKind::Star => BinaryOp::Mul,
        TokenKind::Slash => BinaryOp::Div,
        TokenKind::Percent => BinaryOp::Mod,
        TokenKind::EqEq => BinaryOp::Eq,
        TokenKind::BangEq => BinaryOp::Ne,
        TokenKind::Lt => BinaryOp::Lt,
        TokenKind::LtEq => BinaryOp::Le,
        TokenKind::Gt => BinaryOp::Gt,
        TokenKind::GtEq => BinaryOp::Ge,
        _ => unreachable!("not an infix operator: {kind:?}"),
    }
}

impl Parser {
    /// Parses a full expression.
    pub(in crate::source_analysis) fn parse_expression(&mut self) -> Result<Expr, Diagnostic> {
        self.parse_binding_power(0)
    }

    fn parse_binding_power(&mut self, min_power: u8) -> Result<Expr, Diagnostic> {
        let mut left = self.parse_prefix()?;

        while let Some(power) = infix_binding_power(self.current_kind()) {
            if power.left < min_power {
                break;
            }
            let operator = self.advance();
            let right = self.parse_binding_power(power.right)?;
            let span = left.span().merge(right.span());

            left = if *operator.kind() == TokenKind::Assign {
                let target = assignment_target(left, &operator)?;
                Expr::Assignment {
                    target,
                    value: Box::new(right),
                    span,
                }
            } else {
                Expr::Binary {
                    op: binary_op(operator.kind()),
                    left: Box::new(left),
                    right: Box::new(right),
                    span,
                }
            };
        }

        Ok(left)
    }

    fn parse_prefix(&mut self) -> Result<Expr, Diagnostic> {
        match self.current_kind() {
            TokenKind::Integer(_) => self.parse_integer(),
            TokenKind::Str(value) => {
                let value = value.clone();
                let token = self.advance();
                Ok(Expr::Str {
                    value,
                    span: token.span(),
                })
            }
            TokenKind::Minus => self.parse_unary(UnaryOp::Neg),
            TokenKind::Bang => self.parse_unary(UnaryOp::Not),
            TokenKind::LeftParen => {
                let open = self.advance();
                let inner = self.parse_expression()?;
                let close = self.expect(&TokenKind::RightParen)?;
                Ok(Expr::Grouping {
                    expression: Box::new(inner),
                    span: open.span().merge(close.span()),
                })
            }
            TokenKind::Identifier(_) => self.parse_reference().map(Expr::Call),
            _ => Err(self.expected(&["expression"])),
        }
    }

    fn parse_integer(&mut self) -> Result<Expr, Diagnostic> {
        let TokenKind::Integer(text) = self.current_kind() else {
            return Err(self.expected(&["integer"]));
        };
        let text = text.clone();
        let token = self.advance();
        let value = text.parse::<i64>().map_err(|_| {
            Diagnostic::new(DiagnosticCode::MalformedNumber, token.span()).with_arg(text.clone())
        })?;
        Ok(Expr::Integer {
            value,
            span: token.span(),
        })
    }

    fn parse_unary(&mut self, op: UnaryOp) -> Result<Expr, Diagnostic> {
        let operator = self.advance();
        let operand = self.parse_binding_power(UNARY_BINDING_POWER)?;
        let span = operator.span().merge(operand.span());
        Ok(Expr::Unary {
            op,
            operand: Box::new(operand),
            span,
        })
    }

    /// Parses a reference: a dotted path, optionally followed by a call
    /// argument list or an array index.
    fn parse_reference(&mut self) -> Result<Call, Diagnostic> {
        let (path, path_span) = self.parse_path()?;
        let scope = self.open_scope();
        let frame = |path: &[ecow::EcoString], span| {
            crate::address::AddressFrame::new(path.to_vec(), scope.clone(), span)
        };

        if self.match_token(&TokenKind::LeftParen) {
            let mut arguments = Vec::new();
            if !self.check(&TokenKind::RightParen) {
                loop {
                    arguments.push(self.parse_expression()?);
                    if !self.match_token(&TokenKind::Comma) {
                        break;
                    }
                }
            }
            let close = self.expect(&TokenKind::RightParen)?;
            let span = path_span.merge(close.span());
            return Ok(Call::Function {
                frame: frame(&path, span),
                arguments,
                span,
            });
        }

        if self.match_token(&TokenKind::LeftBracket) {
            let index = self.parse_expression()?;
            let close = self.expect(&TokenKind::RightBracket)?;
            let span = path_span.merge(close.span());
            return Ok(Call::Array {
                frame: frame(&path, span),
                index: Box::new(index),
                span,
            });
        }

        Ok(Call::Identifier {
            frame: frame(&path, path_span),
            span: path_span,
        })
    }
}

/// Validates an assignment target: only identifier and array-element
/// references can be assigned.
fn assignment_target(
    left: Expr,
    operator: &super::Token,
) -> Result<Call, Diagnostic> {
    match left {
        Expr::Call(call @ (Call::Identifier { .. } | Call::Array { .. })) => Ok(call),
        _ => Err(
            Diagnostic::new(DiagnosticCode::UnexpectedToken, operator.span())
                .with_arg("'an assignable reference'")
                .with_arg("="),
        ),
    }
}

#[cfg(test)]
mod tests {
    use super::super::tests::parse_ok;
    use super::*;
    use crate::ast::Stmt;
    use crate::source_analysis::{lex, parse};

    /// Parses `source` as a single expression statement inside a function.
    fn expr_of(source: &str) -> Expr {
        let program = parse_ok(&format!("library m; function f() {{ {source}; }}"));
        let Stmt::Function { mut body, .. } = program.declarations.into_iter().next().unwrap()
        else {
            panic!("expected function");
        };
        let Stmt::Expression { expression, .. } = body.remove(0) else {
            panic!("expected expression statement");
        };
        expression
    }

    #[test]
    fn multiplication_binds_tighter_than_addition() {
        let Expr::Binary { op, right, .. } = expr_of("1 + 2 * 3") else {
            panic!("expected binary");
        };
        assert_eq!(op, BinaryOp::Add);
        assert!(matches!(
            *right,
            Expr::Binary {
                op: BinaryOp::Mul,
                ..
            }
        ));
    }

    #[test]
    fn comparison_binds_looser_than_arithmetic() {
        let Expr::Binary { op, left, right, .. } = expr_of("a + 1 < b * 2") else {
            panic!("expected binary");
        };
        assert_eq!(op, BinaryOp::Lt);
        assert!(matches!(*left, Expr::Binary { op: BinaryOp::Add, .. }));
        assert!(matches!(*right, Expr::Binary { op: BinaryOp::Mul, .. }));
    }

    #[test]
    fn equality_binds_loosest_of_the_operators() {
        let Expr::Binary { op, .. } = expr_of("a < b == c < d") else {
            panic!("expected binary");
        };
        assert_eq!(op, BinaryOp::Eq);
    }

    #[test]
    fn subtraction_is_left_associative() {
        let Expr::Binary { left, .. } = expr_of("1 - 2 - 3") else {
            panic!("expected binary");
        };
        assert!(matches!(*left, Expr::Binary { op: BinaryOp::Sub, .. }));
    }

    #[test]
    fn assignment_is_right_associative() {
        let Expr::Assignment { value, .. } = expr_of("a = b = 1") else {
            panic!("expected assignment");
        };
        assert!(matches!(*value, Expr::Assignment { .. }));
    }

    #[test]
    fn assignment_to_array_element() {
        let Expr::Assignment { target, .. } = expr_of("a[i + 1] = 0") else {
            panic!("expected assignment");
        };
        assert!(matches!(target, Call::Array { .. }));
    }

    #[test]
    fn assignment_to_literal_is_rejected() {
        let tokens = lex("library m; function f() { 1 = 2; }").unwrap();
        let (_, diagnostics) = parse(tokens);
        assert!(!diagnostics.is_empty());
        assert_eq!(diagnostics[0].code(), DiagnosticCode::UnexpectedToken);
    }

    #[test]
    fn grouping_overrides_precedence() {
        let Expr::Binary { op, left, .. } = expr_of("(1 + 2) * 3") else {
            panic!("expected binary");
        };
        assert_eq!(op, BinaryOp::Mul);
        assert!(matches!(*left, Expr::Grouping { .. }));
    }

    #[test]
    fn unary_binds_tighter_than_multiplication() {
        let Expr::Binary { op, left, .. } = expr_of("-a * b") else {
            panic!("expected binary");
        };
        assert_eq!(op, BinaryOp::Mul);
        assert!(matches!(*left, Expr::Unary { op: UnaryOp::Neg, .. }));
    }

    #[test]
    fn dotted_reference_keeps_segments() {
        let Expr::Call(Call::Identifier { frame, .. }) = expr_of("A.B.x") else {
            panic!("expected identifier reference");
        };
        assert_eq!(frame.display_path(), "A.B.x");
    }

    #[test]
    fn call_with_arguments() {
        let Expr::Call(Call::Function { frame, arguments, .. }) = expr_of("add(1, 2 + 3)") else {
            panic!("expected function call");
        };
        assert_eq!(frame.display_path(), "add");
        assert_eq!(arguments.len(), 2);
    }

    #[test]
    fn integer_overflow_is_malformed() {
        let tokens = lex("library m; var x = 99999999999999999999;").unwrap();
        let (_, diagnostics) = parse(tokens);
        assert_eq!(diagnostics[0].code(), DiagnosticCode::MalformedNumber);
    }
}
