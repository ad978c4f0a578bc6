// Copyright 2026 James Casey
// SPDX-License-Identifier: Apache-2.0

//! Hierarchical symbol addressing.
//!
//! A [`State`] is the fully-qualified scope path of a declaration, an
//! ordered sequence of name segments (`A.B.f` for function `f` inside
//! system `B` inside component `A`). States have structural equality and
//! are the unique keys of the [`SymbolTable`].
//!
//! An [`AddressFrame`] is a possibly-unresolved reference recorded at parse
//! time: the dotted path as written, plus the scope that was open at the
//! use site. Resolution is deferred to code generation so that forward
//! references work regardless of declaration order. [`SymbolTable::resolve`]
//! is a pure read over an immutable table snapshot: it tries the use-site
//! scope's prefixes innermost first, ending at top level, and the first hit
//! wins, so shadowing is lexical and deterministic.

use std::collections::HashMap;

use ecow::EcoString;

use crate::diagnostics::{Diagnostic, DiagnosticCode};
use crate::source_analysis::Span;

/// A fully-qualified scope path identifying a declaration.
///
/// The empty path is the unit's top level; it never names a declaration
/// itself but serves as the outermost enclosing scope of an
/// [`AddressFrame`].
#[derive(Debug, Clone, PartialEq, Eq, Hash, Default)]
pub struct State {
    segments: Vec<EcoString>,
}

impl State {
    /// Creates the top-level (empty) state.
    #[must_use]
    pub const fn top_level() -> Self {
        Self {
            segments: Vec::new(),
        }
    }

    /// Creates a single-segment state.
    #[must_use]
    pub fn root(segment: impl Into<EcoString>) -> Self {
        Self {
            segments: vec![segment.into()],
        }
    }

    /// Creates a state from an ordered segment sequence.
    #[must_use]
    pub fn from_segments(segments: impl IntoIterator<Item = impl Into<EcoString>>) -> Self {
        Self {
            segments: segments.into_iter().map(Into::into).collect(),
        }
    }

    /// Returns a new state with `segment` appended.
    #[must_use]
    pub fn child(&self, segment: impl Into<EcoString>) -> Self {
        let mut segments = self.segments.clone();
        segments.push(segment.into());
        Self { segments }
    }

    /// Returns a new state with `path` appended segment by segment.
    #[must_use]
    pub fn join(&self, path: &[EcoString]) -> Self {
        let mut segments = self.segments.clone();
        segments.extend(path.iter().cloned());
        Self { segments }
    }

    /// Returns the ordered segments.
    #[must_use]
    pub fn segments(&self) -> &[EcoString] {
        &self.segments
    }

    /// Returns the number of segments.
    #[must_use]
    pub fn depth(&self) -> usize {
        self.segments.len()
    }

    /// Returns the enclosing state, or `None` at top level.
    #[must_use]
    pub fn parent(&self) -> Option<Self> {
        if self.segments.is_empty() {
            return None;
        }
        Some(Self {
            segments: self.segments[..self.segments.len() - 1].to_vec(),
        })
    }

    /// Returns the truncation of this state to its first `len` segments.
    #[must_use]
    fn prefix(&self, len: usize) -> Self {
        Self {
            segments: self.segments[..len].to_vec(),
        }
    }

    /// Returns the final segment, or `None` at top level.
    #[must_use]
    pub fn name(&self) -> Option<&EcoString> {
        self.segments.last()
    }
}

impl std::fmt::Display for State {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        let mut first = true;
        for segment in &self.segments {
            if !first {
                f.write_str(".")?;
            }
            f.write_str(segment)?;
            first = false;
        }
        Ok(())
    }
}

/// A possibly-unresolved reference to a [`State`].
///
/// Created by the parser for every identifier reference; resolved (or
/// failed) during code generation.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct AddressFrame {
    /// The dotted path as written at the use site.
    path: Vec<EcoString>,
    /// The scope that was open where the reference appeared.
    scope: State,
    /// Source location of the reference.
    span: Span,
}

impl AddressFrame {
    /// Creates a frame for a reference written as `path` inside `scope`.
    #[must_use]
    pub fn new(path: Vec<EcoString>, scope: State, span: Span) -> Self {
        debug_assert!(!path.is_empty(), "a reference has at least one segment");
        Self { path, scope, span }
    }

    /// Returns the dotted path as written.
    #[must_use]
    pub fn path(&self) -> &[EcoString] {
        &self.path
    }

    /// Returns the path as written, joined with dots.
    #[must_use]
    pub fn display_path(&self) -> EcoString {
        let mut out = EcoString::new();
        for (i, segment) in self.path.iter().enumerate() {
            if i > 0 {
                out.push('.');
            }
            out.push_str(segment);
        }
        out
    }

    /// Returns the scope open at the use site.
    #[must_use]
    pub const fn scope(&self) -> &State {
        &self.scope
    }

    /// Returns the source location of the reference.
    #[must_use]
    pub const fn span(&self) -> Span {
        self.span
    }
}

/// What a declared state names.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum SymbolKind {
    /// A `component` declaration.
    Component,
    /// A `system` declaration.
    System,
    /// A `function` declaration.
    Function,
    /// A `var` declaration.
    Variable,
    /// A function parameter.
    Parameter,
}

/// A registered declaration.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Symbol {
    /// The declaration's full scope path.
    pub state: State,
    /// What kind of declaration this is.
    pub kind: SymbolKind,
    /// Where the declaration's name appears in source.
    pub span: Span,
}

/// The registered declarations of one or more compiled units.
///
/// Built in a single-writer phase before any resolution happens. A unit
/// collects its declarations into its own table and [`SymbolTable::commit`]s
/// them in one step, so a failing unit never leaves a partially registered
/// scope visible to other units.
#[derive(Debug, Clone, Default)]
pub struct SymbolTable {
    symbols: HashMap<State, Symbol>,
}

impl SymbolTable {
    /// Creates an empty table.
    #[must_use]
    pub fn new() -> Self {
        Self::default()
    }

    /// Registers a declaration.
    ///
    /// # Errors
    ///
    /// Returns a duplicate-declaration diagnostic (code 301, citing both
    /// the original and the duplicate offsets) if `symbol.state` is already
    /// registered.
    pub fn declare(&mut self, symbol: Symbol) -> Result<(), Diagnostic> {
        if let Some(existing) = self.symbols.get(&symbol.state) {
            return Err(
                Diagnostic::new(DiagnosticCode::DuplicateDeclaration, symbol.span)
                    .with_arg(symbol.state.to_string())
                    .with_related(existing.span),
            );
        }
        self.symbols.insert(symbol.state.clone(), symbol);
        Ok(())
    }

    /// Merges a fully built per-unit table into this one in a single step.
    ///
    /// Cross-unit duplicates are reported, keeping the first registration.
    pub fn commit(&mut self, unit: Self) -> Vec<Diagnostic> {
        let mut diagnostics = Vec::new();
        let mut symbols: Vec<Symbol> = unit.symbols.into_values().collect();
        symbols.sort_by_key(|symbol| symbol.span.start());
        for symbol in symbols {
            if let Err(diagnostic) = self.declare(symbol) {
                diagnostics.push(diagnostic);
            }
        }
        diagnostics
    }

    /// Looks up an exact state.
    #[must_use]
    pub fn get(&self, state: &State) -> Option<&Symbol> {
        self.symbols.get(state)
    }

    /// Returns the number of registered declarations.
    #[must_use]
    pub fn len(&self) -> usize {
        self.symbols.len()
    }

    /// Returns `true` if no declarations are registered.
    #[must_use]
    pub fn is_empty(&self) -> bool {
        self.symbols.is_empty()
    }

    /// Resolves an address frame against the registered states.
    ///
    /// Searches enclosing scopes from the innermost prefix of the use-site
    /// scope outward, ending with the top level. The first match wins, so
    /// inner declarations shadow outer ones. Returns `None` when no
    /// candidate is registered; the caller reports code 302.
    #[must_use]
    pub fn resolve(&self, frame: &AddressFrame) -> Option<&Symbol> {
        for len in (0..=frame.scope.depth()).rev() {
            let candidate = frame.scope.prefix(len).join(frame.path());
            if let Some(symbol) = self.symbols.get(&candidate) {
                return Some(symbol);
            }
        }
        None
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn declare(table: &mut SymbolTable, state: State, kind: SymbolKind, span: Span) {
        table
            .declare(Symbol { state, kind, span })
            .expect("declaration should succeed");
    }

    fn function_states() -> SymbolTable {
        // component A { system B { function f() {} } }
        let mut table = SymbolTable::new();
        let a = State::root("A");
        let b = a.child("B");
        let f = b.child("f");
        declare(&mut table, a, SymbolKind::Component, Span::new(10, 11));
        declare(&mut table, b, SymbolKind::System, Span::new(21, 22));
        declare(&mut table, f, SymbolKind::Function, Span::new(34, 35));
        table
    }

    #[test]
    fn state_display_joins_segments() {
        assert_eq!(State::root("A").child("B").child("f").to_string(), "A.B.f");
        assert_eq!(State::top_level().to_string(), "");
    }

    #[test]
    fn state_equality_is_structural() {
        let a = State::from_segments(["A", "B"]);
        let b = State::root("A").child("B");
        assert_eq!(a, b);
        assert_ne!(a, State::root("A"));
    }

    #[test]
    fn state_parent_walks_outward() {
        let f = State::from_segments(["A", "B", "f"]);
        assert_eq!(f.parent(), Some(State::from_segments(["A", "B"])));
        assert_eq!(State::top_level().parent(), None);
    }

    #[test]
    fn nested_reference_resolves_innermost_first() {
        let table = function_states();
        // A reference to `f` from inside A.B resolves to A.B.f.
        let frame = AddressFrame::new(
            vec!["f".into()],
            State::from_segments(["A", "B"]),
            Span::new(40, 41),
        );
        let symbol = table.resolve(&frame).expect("f should resolve");
        assert_eq!(symbol.state, State::from_segments(["A", "B", "f"]));
    }

    #[test]
    fn qualified_reference_resolves_from_top_level() {
        let table = function_states();
        let frame = AddressFrame::new(
            vec!["A".into(), "B".into(), "f".into()],
            State::top_level(),
            Span::at(0),
        );
        assert!(table.resolve(&frame).is_some());
    }

    #[test]
    fn inner_declaration_shadows_outer() {
        let mut table = SymbolTable::new();
        let outer = State::from_segments(["A", "x"]);
        let inner = State::from_segments(["A", "B", "x"]);
        declare(&mut table, outer, SymbolKind::Variable, Span::new(0, 1));
        declare(
            &mut table,
            inner.clone(),
            SymbolKind::Variable,
            Span::new(10, 11),
        );

        let frame = AddressFrame::new(
            vec!["x".into()],
            State::from_segments(["A", "B", "f"]),
            Span::at(20),
        );
        assert_eq!(table.resolve(&frame).unwrap().state, inner);
    }

    #[test]
    fn unresolvable_reference_returns_none() {
        let table = function_states();
        let frame = AddressFrame::new(
            vec!["missing".into()],
            State::from_segments(["A", "B"]),
            Span::at(0),
        );
        assert!(table.resolve(&frame).is_none());
    }

    #[test]
    fn duplicate_declaration_cites_both_offsets() {
        let mut table = SymbolTable::new();
        let state = State::from_segments(["A", "x"]);
        declare(
            &mut table,
            state.clone(),
            SymbolKind::Variable,
            Span::new(4, 5),
        );

        let error = table
            .declare(Symbol {
                state,
                kind: SymbolKind::Variable,
                span: Span::new(30, 31),
            })
            .unwrap_err();
        assert_eq!(error.code(), DiagnosticCode::DuplicateDeclaration);
        assert_eq!(error.span(), Span::new(30, 31));
        assert_eq!(error.related(), Some(Span::new(4, 5)));
    }

    #[test]
    fn commit_merges_unit_atomically() {
        let mut shared = SymbolTable::new();
        let mut unit = SymbolTable::new();
        declare(&mut unit, State::root("A"), SymbolKind::Component, Span::at(0));
        declare(
            &mut unit,
            State::from_segments(["A", "x"]),
            SymbolKind::Variable,
            Span::at(5),
        );

        assert!(shared.commit(unit).is_empty());
        assert_eq!(shared.len(), 2);
    }

    #[test]
    fn commit_reports_cross_unit_duplicates() {
        let mut shared = SymbolTable::new();
        declare(&mut shared, State::root("A"), SymbolKind::Component, Span::at(0));

        let mut unit = SymbolTable::new();
        declare(&mut unit, State::root("A"), SymbolKind::Component, Span::at(9));

        let diagnostics = shared.commit(unit);
        assert_eq!(diagnostics.len(), 1);
        assert_eq!(diagnostics[0].code(), DiagnosticCode::DuplicateDeclaration);
        // The first registration survives.
        assert_eq!(shared.get(&State::root("A")).unwrap().span, Span::at(0));
    }
}
