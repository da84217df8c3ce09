use crate::{analyze, BuiltinType, SymbolTable};
use myra_diagnostic::{DiagnosticBag, ErrorCode};
use myra_ir::{CallBinding, CompileOptions, ExprKind, Module, StmtKind};
use pretty_assertions::assert_eq;

fn compile_into(
    table: &mut SymbolTable,
    src: &str,
) -> (Module, DiagnosticBag, CompileOptions) {
    let mut bag = DiagnosticBag::new();
    let mut options = CompileOptions::default();
    let tokens = myra_lexer::tokenize(src, "test.myra", &mut bag).expect("lex");
    let mut module =
        myra_parse::parse_module(&tokens, src, "test.myra", &mut options, &mut bag).expect("parse");
    assert!(!bag.has_errors(), "parse errors: {:?}", bag.diagnostics());
    let _ = analyze(&mut module, table, &options, &mut bag);
    (module, bag, options)
}

fn check(src: &str) -> (Module, SymbolTable, DiagnosticBag) {
    let mut table = SymbolTable::new();
    let (module, bag, _) = compile_into(&mut table, src);
    (module, table, bag)
}

fn check_clean(src: &str) -> (Module, SymbolTable) {
    let (module, table, bag) = check(src);
    assert!(
        !bag.has_errors(),
        "unexpected errors: {:?}",
        bag.diagnostics()
    );
    (module, table)
}

fn has_code(bag: &DiagnosticBag, code: ErrorCode) -> bool {
    bag.diagnostics().iter().any(|d| d.code == code)
}

#[test]
fn test_method_binding_detection() {
    let (module, table) = check_clean(
        "module lib Shapes;\n\
         type TP = record X: INTEGER; end;\n\
         method GetX(var Self: TP): INTEGER;\n\
         begin return Self.X; end;\n\
         end.",
    );
    assert_eq!(module.routines[0].bound_type.as_deref(), Some("TP"));
    let tp = table.lookup_qualified("Shapes", "TP").expect("TP");
    let get = table.find_method(tp.as_type(), "getx").expect("method indexed");
    assert_eq!(table.symbol(get).name, "GetX");
}

#[test]
fn test_method_dispatch_walks_base_chain() {
    let (module, _table) = check_clean(
        "module lib M;\n\
         type\n\
           TA = record V: INTEGER; end;\n\
           TB = record(TA) end;\n\
         method Get(var Self: TA): INTEGER;\n\
         begin return Self.V; end;\n\
         routine Use(var LB: TB): INTEGER;\n\
         begin return LB.Get(); end;\n\
         end.",
    );
    let body = module.routines[1].body.as_ref().expect("body");
    let StmtKind::Return { value: Some(v) } = &body.stmts[0].kind else {
        panic!("expected return");
    };
    let ExprKind::Call { binding, .. } = &module.arena.get(*v).kind else {
        panic!("expected call");
    };
    assert_eq!(
        binding,
        &CallBinding::Method {
            name: "Get".to_string()
        }
    );
}

#[test]
fn test_module_qualified_call_classification() {
    let mut table = SymbolTable::new();
    let (_, bag, _) = compile_into(
        &mut table,
        "module lib Console;\nroutine PrintLn(s: STRING);\nbegin\nend;\nend.",
    );
    assert!(!bag.has_errors());

    let (module, bag, _) = compile_into(
        &mut table,
        "module exe Main;\nimport Console;\nbegin Console.PrintLn('Hi'); end.",
    );
    assert!(!bag.has_errors(), "errors: {:?}", bag.diagnostics());
    let body = module.body.expect("body");
    let StmtKind::Call { call } = &body.stmts[0].kind else {
        panic!("expected call statement");
    };
    let ExprKind::Call { binding, args, .. } = &module.arena.get(*call).kind else {
        panic!("expected call");
    };
    assert_eq!(
        binding,
        &CallBinding::ModuleQualified {
            module: "Console".to_string(),
            name: "PrintLn".to_string()
        }
    );
    // Argument annotated from the declared parameter type.
    let arg_ty = module.arena.ty(args[0]).expect("annotated");
    assert!(table.is_builtin(arg_ty, BuiltinType::String));
}

#[test]
fn test_unknown_receiver_is_foreign_member() {
    let (module, _table) = check_clean(
        "module exe M;\nbegin\n  widget.Update(1);\nend.",
    );
    let body = module.body.expect("body");
    let StmtKind::Call { call } = &body.stmts[0].kind else {
        panic!("expected call statement");
    };
    let ExprKind::Call { binding, .. } = &module.arena.get(*call).kind else {
        panic!("expected call");
    };
    assert_eq!(
        binding,
        &CallBinding::ForeignMember {
            name: "Update".to_string()
        }
    );
    assert_eq!(module.arena.ty(*call), None);
}

#[test]
fn test_method_keyword_requires_var_self() {
    let (_, _, bag) = check(
        "module lib M;\n\
         type TP = record end;\n\
         method Bad(Self: TP): INTEGER;\n\
         begin return 0; end;\n\
         end.",
    );
    assert!(has_code(&bag, ErrorCode::E210));
}

#[test]
fn test_inherited_contracts() {
    let (_, _, bag) = check(
        "module lib M;\nroutine Free(x: INTEGER);\nbegin inherited; end;\nend.",
    );
    assert!(has_code(&bag, ErrorCode::E212));

    let (_, _, bag) = check(
        "module lib M;\n\
         type TA = record end;\n\
         method Go(var Self: TA);\n\
         begin inherited; end;\n\
         end.",
    );
    assert!(has_code(&bag, ErrorCode::E213));
}

#[test]
fn test_inherited_resolves_parent() {
    let (module, _) = check_clean(
        "module lib M;\n\
         type\n\
           TA = record end;\n\
           TB = record(TA) end;\n\
         method Go(var Self: TA);\n\
         begin\nend;\n\
         method Go(var Self: TB);\n\
         begin inherited; end;\n\
         end.",
    );
    let body = module.routines[1].body.as_ref().expect("body");
    let StmtKind::Inherited { resolved_parent, .. } = &body.stmts[0].kind else {
        panic!("expected inherited");
    };
    assert_eq!(resolved_parent.as_deref(), Some("TA"));
}

#[test]
fn test_condition_must_be_boolean() {
    let (_, _, bag) = check("module exe M;\nbegin\n  if 1 then return;\nend.");
    assert!(has_code(&bag, ErrorCode::E204));
}

#[test]
fn test_loop_contracts() {
    let (_, _, bag) = check("module exe M;\nbegin\n  for i := 1 to 10 do return;\nend.");
    assert!(has_code(&bag, ErrorCode::E206));

    let (_, _, bag) = check(
        "module exe M;\nvar i: INTEGER;\nbegin\n  for i := 'a' to 10 do return;\nend.",
    );
    assert!(has_code(&bag, ErrorCode::E205));
}

#[test]
fn test_return_contracts() {
    let (_, _, bag) = check(
        "module lib M;\nroutine P();\nbegin return 1; end;\nend.",
    );
    assert!(has_code(&bag, ErrorCode::E207));

    let (_, _, bag) = check(
        "module lib M;\nroutine F(): INTEGER;\nbegin return; end;\nend.",
    );
    assert!(has_code(&bag, ErrorCode::E208));

    let (_, _, bag) = check(
        "module lib M;\nroutine F(): INTEGER;\nbegin return 'no'; end;\nend.",
    );
    assert!(has_code(&bag, ErrorCode::E209));
}

#[test]
fn test_assignment_compatibility() {
    let (_, _, bag) = check(
        "module exe M;\nvar S: STRING;\nbegin\n  S := 42;\nend.",
    );
    assert!(has_code(&bag, ErrorCode::E203));

    // Float := Integer widens without complaint.
    check_clean("module exe M;\nvar F: FLOAT;\nbegin\n  F := 42;\nend.");
    // nil assigns to pointer-shaped things.
    check_clean(
        "module exe M;\ntype TP = pointer to TR;\ntype TR = record end;\nvar P: TP;\nbegin\n  P := nil;\nend.",
    );
}

#[test]
fn test_inheritance_cycle_detected() {
    let (_, _, bag) = check(
        "module lib M;\n\
         type\n\
           TA = record(TB) end;\n\
           TB = record(TA) end;\n\
         end.",
    );
    assert!(has_code(&bag, ErrorCode::E218));
}

#[test]
fn test_new_requires_inferable_type() {
    let (_, _, bag) = check(
        "module exe M;\nvar P: Pointer;\nbegin\n  new(P);\nend.",
    );
    assert!(has_code(&bag, ErrorCode::E400));

    check_clean(
        "module exe M;\n\
         type TR = record end;\n\
         type TP = pointer to TR;\n\
         var P: TP;\n\
         begin\n  new(P);\nend.",
    );
}

#[test]
fn test_duplicate_identifier() {
    let (_, _, bag) = check(
        "module lib M;\nvar X: INTEGER;\nvar X: STRING;\nend.",
    );
    assert!(has_code(&bag, ErrorCode::E200));
}

#[test]
fn test_routine_overloads_are_not_duplicates() {
    let (_, _, bag) = check(
        "module lib M;\n\
         routine W(x: INTEGER);\nbegin\nend;\n\
         routine W(x: STRING);\nbegin\nend;\n\
         end.",
    );
    assert!(!has_code(&bag, ErrorCode::E200));
}

#[test]
fn test_char_string_comparison_promotion() {
    let (module, table) = check_clean(
        "module exe M;\nvar C: CHAR; S: STRING;\nbegin\n  if C = S then return;\nend.",
    );
    let body = module.body.expect("body");
    let StmtKind::If { cond, .. } = &body.stmts[0].kind else {
        panic!("expected if");
    };
    let ExprKind::Binary { lhs, .. } = &module.arena.get(*cond).kind else {
        panic!("expected comparison");
    };
    // The Char operand was re-annotated as String.
    let lhs_ty = module.arena.ty(*lhs).expect("annotated");
    assert!(table.is_builtin(lhs_ty, BuiltinType::String));
}

#[test]
fn test_foreign_expressions_stay_unannotated() {
    let (module, _) = check_clean(
        "module exe M;\nvar X: INTEGER;\nbegin\n  X := std::rand() + 1;\nend.",
    );
    let body = module.body.expect("body");
    let StmtKind::Assign { value, .. } = &body.stmts[0].kind else {
        panic!("expected assign");
    };
    let ExprKind::Binary { lhs, .. } = &module.arena.get(*value).kind else {
        panic!("expected binary");
    };
    assert_eq!(module.arena.ty(*lhs), None);
}

#[test]
fn test_arithmetic_annotation() {
    let (module, table) = check_clean(
        "module exe M;\nvar F: FLOAT; I: INTEGER;\nbegin\n  F := I + 1.5;\nend.",
    );
    let body = module.body.expect("body");
    let StmtKind::Assign { value, .. } = &body.stmts[0].kind else {
        panic!("expected assign");
    };
    let ty = module.arena.ty(*value).expect("annotated");
    assert!(table.is_builtin(ty, BuiltinType::Float));
}

#[test]
fn test_import_cycle_modules_coexist() {
    // A and B import each other; analysis of each against the shared
    // table resolves the partner's public symbols once present.
    let mut table = SymbolTable::new();
    let (_, bag, _) = compile_into(
        &mut table,
        "module lib A;\nimport B;\nroutine FA(): INTEGER;\nbegin return 1; end;\nend.",
    );
    assert!(!bag.has_errors());
    let (_, bag, _) = compile_into(
        &mut table,
        "module lib B;\nimport A;\nroutine FB(): INTEGER;\nbegin return A.FA(); end;\nend.",
    );
    assert!(!bag.has_errors(), "errors: {:?}", bag.diagnostics());
}
