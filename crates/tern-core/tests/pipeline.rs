// Copyright 2026 James Casey
// SPDX-License-Identifier: Apache-2.0

//! End-to-end pipeline tests through the public API.

use tern_core::asm::Dialect;
use tern_core::compile;
use tern_core::diagnostics::DiagnosticCode;

fn compile_ok(source: &str, dialect: Dialect) -> String {
    let compilation = compile(source, "test.tern".into(), dialect);
    assert!(
        compilation.is_success(),
        "unexpected diagnostics:\n{}",
        compilation.report(source)
    );
    compilation.assembly().expect("assembly on success").to_string()
}

#[test]
fn counter_program_compiles_in_both_dialects() {
    let source = "\
library demo;
include \"core\";

component App {
    system Counter {
        var count = 0;

        function bump(step) {
            count = count + step;
            return count;
        }
    }
}
";
    let nasm = compile_ok(source, Dialect::Nasm);
    assert!(nasm.contains("section .data"));
    assert!(nasm.contains("App.Counter.count dd 0"));
    assert!(nasm.contains("App.Counter.bump:"));
    assert!(nasm.contains("%include \"core\""));
    assert!(nasm.contains("mov [App.Counter.count], eax"));

    let masm = compile_ok(source, Dialect::Masm);
    assert!(masm.contains(".DATA"));
    assert!(masm.contains("App.Counter.count DD 0"));
    assert!(masm.contains("INCLUDE core"));
    assert!(masm.contains("MOV App.Counter.count, EAX"));
}

#[test]
fn dialects_render_the_same_line_structure() {
    let source = "library m; var x = 1; function f() { x = x + 1; }";
    let nasm = compile_ok(source, Dialect::Nasm);
    let masm = compile_ok(source, Dialect::Masm);
    assert_eq!(nasm.lines().count(), masm.lines().count());
    // Labels are dialect-independent.
    for (a, b) in nasm.lines().zip(masm.lines()) {
        assert_eq!(a.ends_with(':'), b.ends_with(':'));
    }
}

#[test]
fn nested_function_is_addressable_from_inside_and_outside() {
    let source = "\
library m;
component A {
    system B {
        function f() { return 1; }
        function g() { return f(); }
    }
}
function main() { return A.B.f(); }
";
    let assembly = compile_ok(source, Dialect::Nasm);
    assert!(assembly.contains("A.B.f:"));
    assert!(assembly.contains("A.B.g:"));
    // Both the local and the fully qualified reference hit the same state.
    assert_eq!(assembly.matches("call A.B.f").count(), 2);
}

#[test]
fn unterminated_string_reports_102_at_the_opening_quote() {
    let source = "library m; include \"core;\nvar x;";
    let compilation = compile(source, "m.tern".into(), Dialect::Nasm);
    assert_eq!(compilation.exit_code(), 102);
    let quote = source.find('"').unwrap();
    assert_eq!(
        compilation.diagnostics()[0].span().start() as usize,
        quote
    );
    assert_eq!(
        compilation.report(source),
        "[102] unterminated string literal (m.tern:1:20)"
    );
}

#[test]
fn raw_assembly_renders_unchanged_in_both_dialects() {
    let source = "library m; function f() { asm { \"mov eax, 1\" } }";
    let nasm = compile_ok(source, Dialect::Nasm);
    let masm = compile_ok(source, Dialect::Masm);
    assert!(nasm.contains("    mov eax, 1\n"));
    assert!(masm.contains("    mov eax, 1\n"));
}

#[test]
fn include_lowers_to_exactly_one_directive_first_in_text() {
    let source = "library m; include \"core\"; function f() { return 0; }";
    let assembly = compile_ok(source, Dialect::Nasm);
    assert_eq!(assembly.matches("%include").count(), 1);
    let text = assembly.split("section .text\n").nth(1).unwrap();
    assert!(text.starts_with("    %include \"core\""));
}

#[test]
fn duplicate_declaration_cites_both_positions() {
    let source = "library m;\nvar x;\nvar x;\n";
    let compilation = compile(source, "m.tern".into(), Dialect::Nasm);
    assert_eq!(compilation.exit_code(), 301);
    assert_eq!(
        compilation.report(source),
        "[301] duplicate declaration of 'x' (m.tern:3:5), first declared at m.tern:2:5"
    );
}

#[test]
fn multiple_errors_are_reported_together() {
    let source = "\
library m;
function f() { missing; }
function g() { var x = ; }
";
    let compilation = compile(source, "m.tern".into(), Dialect::Nasm);
    assert!(compilation.assembly().is_none());
    let codes: Vec<DiagnosticCode> = compilation
        .diagnostics()
        .iter()
        .map(tern_core::diagnostics::Diagnostic::code)
        .collect();
    assert!(codes.contains(&DiagnosticCode::UnexpectedToken), "got {codes:?}");
    assert!(codes.contains(&DiagnosticCode::UndefinedIdentifier), "got {codes:?}");
    // Exit code is the first error in pipeline order.
    assert_eq!(compilation.exit_code(), 201);
}

#[test]
fn forward_reference_resolves_without_declaration_order() {
    let source = "\
library m;
function first() { return second(); }
function second() { return 2; }
";
    let assembly = compile_ok(source, Dialect::Nasm);
    assert!(assembly.contains("call second"));
}

#[test]
fn unexpected_character_aborts_with_101() {
    let compilation = compile("library m; var x = €;", "m.tern".into(), Dialect::Nasm);
    assert_eq!(compilation.exit_code(), 101);
    assert!(compilation.assembly().is_none());
}

#[test]
fn rendered_output_is_deterministic() {
    let source = "\
library m;
var a = 1;
component A { var b; function f(p) { if (p < a) { a = p; } return a; } }
";
    let first = compile_ok(source, Dialect::Nasm);
    let second = compile_ok(source, Dialect::Nasm);
    assert_eq!(first, second);
}
