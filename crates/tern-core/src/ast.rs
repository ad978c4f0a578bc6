// Copyright 2026 James Casey
// SPDX-License-Identifier: Apache-2.0

//! Abstract syntax tree definitions for Tern.
//!
//! The AST is a closed set of node variants split into two families,
//! [`Stmt`] and [`Expr`]. Lowering and rendering are exhaustive pattern
//! matches over these enums, so an unhandled variant is a build-time error
//! rather than a runtime "not implemented" failure.
//!
//! Every node carries a [`Span`]. Nodes are created once by the parser and
//! never mutated; resolved address information is produced by the pure
//! resolver during code generation instead of being written back into the
//! tree. Identifier references are recorded as [`AddressFrame`]s because
//! the enclosing scope may still be open (and the declaration may appear
//! later in the source) when the reference is parsed.

use ecow::EcoString;

use crate::address::AddressFrame;
use crate::source_analysis::Span;

/// The single top-level node of a compiled unit.
///
/// Aggregates the `library` header, the include directives, and the
/// ordered list of declarations.
#[derive(Debug, Clone, PartialEq)]
pub struct Program {
    /// The `library <name>;` header.
    pub header: Header,
    /// `include "<name>";` directives, in source order.
    pub includes: Vec<Include>,
    /// Top-level declarations, in source order.
    pub declarations: Vec<Stmt>,
    /// Source location spanning the entire unit.
    pub span: Span,
}

/// The `library <name>;` header naming the compiled unit.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Header {
    /// The library name.
    pub name: Identifier,
    /// Source location of the whole header statement.
    pub span: Span,
}

/// An `include "<name>";` directive.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Include {
    /// The included unit's name, as written.
    pub library: EcoString,
    /// Source location of the whole directive.
    pub span: Span,
}

/// A declared name.
#[derive(Debug, Clone, PartialEq, Eq, Hash)]
pub struct Identifier {
    /// The name as written.
    pub name: EcoString,
    /// Source location of the name.
    pub span: Span,
}

impl Identifier {
    /// Creates a new identifier.
    #[must_use]
    pub fn new(name: impl Into<EcoString>, span: Span) -> Self {
        Self {
            name: name.into(),
            span,
        }
    }
}

/// One literal line inside an `asm { … }` block.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct RawLine {
    /// The assembly text, passed through verbatim.
    pub text: EcoString,
    /// Source location of the string literal.
    pub span: Span,
}

/// A Tern statement.
#[derive(Debug, Clone, PartialEq)]
pub enum Stmt {
    /// A `component <name> { … }` declaration.
    Component {
        /// The component name.
        name: Identifier,
        /// Nested declarations.
        members: Vec<Stmt>,
        /// Source location of the whole declaration.
        span: Span,
    },

    /// A `system <name> { … }` declaration.
    System {
        /// The system name.
        name: Identifier,
        /// Nested declarations.
        members: Vec<Stmt>,
        /// Source location of the whole declaration.
        span: Span,
    },

    /// A `function <name>(…) { … }` declaration.
    Function {
        /// The function name.
        name: Identifier,
        /// Parameter names, in order.
        parameters: Vec<Identifier>,
        /// Body statements.
        body: Vec<Stmt>,
        /// Source location of the whole declaration.
        span: Span,
    },

    /// A `var <name> [= <expr>];` declaration.
    Var {
        /// The variable name.
        name: Identifier,
        /// The optional initializer.
        initializer: Option<Expr>,
        /// Source location of the whole declaration.
        span: Span,
    },

    /// An `if (…) { … } [else …]` statement.
    If {
        /// The condition.
        condition: Expr,
        /// Statements of the then-branch.
        then_branch: Vec<Stmt>,
        /// Statements of the else-branch (an else-if chain is a single
        /// nested [`Stmt::If`]).
        else_branch: Option<Vec<Stmt>>,
        /// Source location of the whole statement.
        span: Span,
    },

    /// A `while (…) { … }` loop.
    While {
        /// The loop condition.
        condition: Expr,
        /// The loop body.
        body: Vec<Stmt>,
        /// Source location of the whole statement.
        span: Span,
    },

    /// A `return [<expr>];` statement.
    Return {
        /// The returned value, if any.
        value: Option<Expr>,
        /// Source location of the whole statement.
        span: Span,
    },

    /// An `asm { "…" … }` block of raw assembly lines.
    RawAsm {
        /// The literal lines, in order.
        lines: Vec<RawLine>,
        /// Source location of the whole block.
        span: Span,
    },

    /// A freestanding `{ … }` block.
    Block {
        /// The contained statements.
        statements: Vec<Stmt>,
        /// Source location including braces.
        span: Span,
    },

    /// An expression statement (`<expr>;`).
    Expression {
        /// The expression.
        expression: Expr,
        /// Source location including the terminator.
        span: Span,
    },
}

impl Stmt {
    /// Returns the span of this statement.
    #[must_use]
    pub const fn span(&self) -> Span {
        match self {
            Self::Component { span, .. }
            | Self::System { span, .. }
            | Self::Function { span, .. }
            | Self::Var { span, .. }
            | Self::If { span, .. }
            | Self::While { span, .. }
            | Self::Return { span, .. }
            | Self::RawAsm { span, .. }
            | Self::Block { span, .. }
            | Self::Expression { span, .. } => *span,
        }
    }

    /// Returns `true` if this is a declaration statement.
    #[must_use]
    pub const fn is_declaration(&self) -> bool {
        matches!(
            self,
            Self::Component { .. } | Self::System { .. } | Self::Function { .. } | Self::Var { .. }
        )
    }
}

/// A Tern expression.
#[derive(Debug, Clone, PartialEq)]
pub enum Expr {
    /// A decimal integer literal.
    Integer {
        /// The literal value.
        value: i64,
        /// Source location.
        span: Span,
    },

    /// A double-quoted string literal.
    Str {
        /// The literal content, escapes already processed.
        value: EcoString,
        /// Source location including quotes.
        span: Span,
    },

    /// A binary operation; the left operand is evaluated first.
    Binary {
        /// The operator.
        op: BinaryOp,
        /// The left operand.
        left: Box<Expr>,
        /// The right operand.
        right: Box<Expr>,
        /// Source location of the whole operation.
        span: Span,
    },

    /// A prefix unary operation.
    Unary {
        /// The operator.
        op: UnaryOp,
        /// The operand.
        operand: Box<Expr>,
        /// Source location of the whole operation.
        span: Span,
    },

    /// A parenthesized expression.
    Grouping {
        /// The inner expression.
        expression: Box<Expr>,
        /// Source location including parentheses.
        span: Span,
    },

    /// An assignment; the target must be an identifier or array call.
    Assignment {
        /// The assignment target.
        target: Call,
        /// The assigned value.
        value: Box<Expr>,
        /// Source location of the whole assignment.
        span: Span,
    },

    /// A reference in one of its call forms.
    Call(Call),
}

impl Expr {
    /// Returns the span of this expression.
    #[must_use]
    pub const fn span(&self) -> Span {
        match self {
            Self::Integer { span, .. }
            | Self::Str { span, .. }
            | Self::Binary { span, .. }
            | Self::Unary { span, .. }
            | Self::Grouping { span, .. }
            | Self::Assignment { span, .. } => *span,
            Self::Call(call) => call.span(),
        }
    }
}

/// A symbolic reference, polymorphic over its call form.
#[derive(Debug, Clone, PartialEq)]
pub enum Call {
    /// A bare or dotted identifier reference: `x`, `a.b.x`.
    Identifier {
        /// The unresolved reference.
        frame: AddressFrame,
        /// Source location.
        span: Span,
    },

    /// A function call: `f(a, b)`.
    Function {
        /// The unresolved reference to the callee.
        frame: AddressFrame,
        /// Argument expressions, in order.
        arguments: Vec<Expr>,
        /// Source location including the argument list.
        span: Span,
    },

    /// An array element access: `a[i]`.
    Array {
        /// The unresolved reference to the array.
        frame: AddressFrame,
        /// The index expression.
        index: Box<Expr>,
        /// Source location including the index.
        span: Span,
    },
}

impl Call {
    /// Returns the span of this call.
    #[must_use]
    pub const fn span(&self) -> Span {
        match self {
            Self::Identifier { span, .. }
            | Self::Function { span, .. }
            | Self::Array { span, .. } => *span,
        }
    }

    /// Returns the unresolved reference of this call.
    #[must_use]
    pub const fn frame(&self) -> &AddressFrame {
        match self {
            Self::Identifier { frame, .. }
            | Self::Function { frame, .. }
            | Self::Array { frame, .. } => frame,
        }
    }
}

/// A binary operator.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum BinaryOp {
    /// `+`
    Add,
    /// `-`
    Sub,
    /// `*`
    Mul,
    /// `/`
    Div,
    /// `%`
    Mod,
    /// `==`
    Eq,
    /// `!=`
    Ne,
    /// `<`
    Lt,
    /// `<=`
    Le,
    /// `>`
    Gt,
    /// `>=`
    Ge,
}

impl BinaryOp {
    /// Returns `true` for the comparison operators, which lower to a
    /// compare plus conditional jump rather than a single mnemonic.
    #[must_use]
    pub const fn is_comparison(self) -> bool {
        matches!(
            self,
            Self::Eq | Self::Ne | Self::Lt | Self::Le | Self::Gt | Self::Ge
        )
    }
}

impl std::fmt::Display for BinaryOp {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        let text = match self {
            Self::Add => "+",
            Self::Sub => "-",
            Self::Mul => "*",
            Self::Div => "/",
            Self::Mod => "%",
            Self::Eq => "==",
            Self::Ne => "!=",
            Self::Lt => "<",
            Self::Le => "<=",
            Self::Gt => ">",
            Self::Ge => ">=",
        };
        f.write_str(text)
    }
}

/// A prefix unary operator.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum UnaryOp {
    /// Arithmetic negation: `-`
    Neg,
    /// Logical not: `!`
    Not,
}

impl std::fmt::Display for UnaryOp {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.write_str(match self {
            Self::Neg => "-",
            Self::Not => "!",
        })
    }
}
