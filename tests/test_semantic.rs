use sbstcmp::frontend::ast::{
    DataType, Declaration, DeclarationKind, Expression, ExpressionKind, Program, Statement,
};
use sbstcmp::frontend::diagnostics::{Diagnostic, Phase};
use sbstcmp::frontend::lex::Lexer;
use sbstcmp::frontend::parse::parse;
use sbstcmp::frontend::semantic::analyze;
use sbstcmp::frontend::symbols::{Symbol, SymbolTable};
use sbstcmp::frontend::token::Pos;

fn analyze_source(source: &str) -> Result<Program, Diagnostic> {
    let program = parse(Lexer::new(source.as_bytes(), "test.c"))?;
    analyze(program, "test.c")
}

fn semantic_error(source: &str) -> Diagnostic {
    let error = analyze_source(source).unwrap_err();
    assert_eq!(error.phase, Phase::Semantic);
    error
}

#[test]
fn minimal_main_passes() {
    let program = analyze_source("int main(){}").unwrap();
    assert_eq!(program.declarations.len(), 1);
}

#[test]
fn typedef_array_size_propagates() {
    // `a` inherits array-ness and size 3 from the typedef, so indexing works
    // while assigning to the whole array does not.
    analyze_source("typedef int vec[3]; int main(){ vec a; a[0] = 1; }").unwrap();

    let error = semantic_error("typedef int vec[3]; int main(){ vec a; a = 1; }");
    assert_eq!(
        error.message,
        "left operand of an assignment operator must be a l-value"
    );
}

#[test]
fn string_initializer_sizes_the_array() {
    analyze_source("int main(){ char s[] = \"hi\"; s[2] = 'x'; }").unwrap();
    analyze_source("int main(){ char s[3] = \"hi\"; }").unwrap();

    let error = semantic_error("int main(){ char s[2] = \"hi\"; }");
    assert_eq!(
        error.message,
        "an array of size 2 is too small for initialization with a string of size 3"
    );
}

#[test]
fn string_initializer_requires_a_char_array() {
    let error = semantic_error("int main(){ int s[] = \"hi\"; }");
    assert_eq!(
        error.message,
        "an array of type other than 'char' can't be initialized with a string"
    );
}

#[test]
fn string_initializer_through_a_char_typedef() {
    analyze_source("typedef char small; int main(){ small s[] = \"ab\"; }").unwrap();
}

#[test]
fn redeclaration_in_the_same_scope() {
    let error = semantic_error("int main(){ int x; int x; }");
    assert_eq!(error.message, "redeclaration of 'x'");
    assert_eq!(error.to_string(), "test.c:1:24: semantic error: redeclaration of 'x'");
}

#[test]
fn shadowing_in_a_nested_scope_is_allowed() {
    analyze_source("int main(){ int x; { int x; x = 1; } }").unwrap();
}

#[test]
fn names_do_not_escape_their_scope() {
    let error = semantic_error("int main(){ { int y; } y = 1; }");
    assert_eq!(error.message, "identifier usage before a declaration");
}

#[test]
fn use_before_declaration() {
    let error = semantic_error("int main(){ x = 1; }");
    assert_eq!(error.message, "identifier usage before a declaration");

    let error = semantic_error("int main(){ int x = y; }");
    assert_eq!(error.message, "identifier usage before a declaration");
}

#[test]
fn typedef_name_is_not_a_variable() {
    let error = semantic_error("typedef int t; int main(){ t = 1; }");
    assert_eq!(error.message, "typename 't' was used as a variable name");

    let error = semantic_error("typedef int t; int main(){ int t; }");
    assert_eq!(error.message, "typename 't' was used as a variable name");
}

#[test]
fn undefined_type() {
    let error = semantic_error("foo x;");
    assert_eq!(error.message, "usage of an undefined type 'foo'");
}

#[test]
fn loop_condition_must_be_an_integer() {
    let error = semantic_error("int main(){ char a[2]; for(;a;); }");
    assert_eq!(
        error.message,
        "the loop condition must be resolvable to a boolean (integer) value"
    );

    analyze_source("int main(){ int i; for(i = 0; i < 3; i = i + 1); }").unwrap();
}

#[test]
fn for_loop_scopes_are_balanced() {
    analyze_source("int main(){ int i; for(i = 0; i < 3; i = i + 1) { int j; j = i; } }").unwrap();
}

#[test]
fn arrays_are_not_arithmetic_operands() {
    let error = semantic_error("int main(){ char a[2]; int x; x = a + 1; }");
    assert_eq!(
        error.message,
        "operands for arithmetic/shift operations must be integers"
    );

    let error = semantic_error("int main(){ char a[2]; for(; a < 2;); }");
    assert_eq!(
        error.message,
        "operands for a comparison operation must be integers"
    );
}

#[test]
fn indexing_requires_an_array() {
    let error = semantic_error("int main(){ int x; x[0] = 1; }");
    assert_eq!(error.message, "attempt to index not an array");
}

#[test]
fn assignment_target_must_be_an_lvalue() {
    let error = semantic_error("int main(){ char a[2]; a = 1; }");
    assert_eq!(
        error.message,
        "left operand of an assignment operator must be a l-value"
    );
}

#[test]
fn main_is_declared_once() {
    let error = semantic_error("int main(){} int main(){}");
    assert_eq!(error.message, "main function is already declared");
}

#[test]
fn array_sizes_fold_at_compile_time() {
    analyze_source("int main(){ int a[2 + 3]; a[4] = 1; }").unwrap();
    analyze_source("int main(){ int a['a']; }").unwrap();
    analyze_source("int main(){ int a[0x7FFFFFFF / 0x40000000]; }").unwrap();

    let error = semantic_error("int main(){ int a[2 / 0]; }");
    assert_eq!(error.message, "division by zero");

    let error = semantic_error("int main(){ int n; int a[n]; }");
    assert_eq!(error.message, "not a compile-time constant");

    let error = semantic_error("int main(){ int a[0x7FFFFFFF + 0xFFFFFFFF]; }");
    assert_eq!(error.message, "constant out of range");
}

#[test]
fn array_size_must_be_positive() {
    let error = semantic_error("int main(){ int a[0]; }");
    assert_eq!(error.message, "the array size must be greater than 0");

    let error = semantic_error("int main(){ int a[1 - 2]; }");
    assert_eq!(error.message, "the array size must be greater than 0");

    let error = semantic_error("typedef int v[0];");
    assert_eq!(error.message, "the array size must be greater than 0");
}

#[test]
fn array_size_must_be_determined() {
    let error = semantic_error("int main(){ int a[]; }");
    assert_eq!(error.message, "failed to determine the size of the array 'a'");

    let error = semantic_error("int main(){ int a[] = {}; }");
    assert_eq!(error.message, "failed to determine the size of the array 'a'");
}

#[test]
fn brace_initializer_sizes_and_limits() {
    analyze_source("int main(){ int a[] = {1, 2, 3}; a[2] = 0; }").unwrap();
    analyze_source("int main(){ int a[5] = {1, 2}; }").unwrap();

    let error = semantic_error("int main(){ int a[2] = {1, 2, 3}; }");
    assert_eq!(error.message, "too many initializers for an array of size 2");
}

#[test]
fn typedef_chains_and_array_typedefs() {
    analyze_source("typedef int vec[3]; typedef vec alias; int main(){ alias a; a[2] = 1; }")
        .unwrap();

    let error = semantic_error("typedef int vec[3]; typedef vec bad[2];");
    assert_eq!(error.message, "underlying type is already an array");

    let error = semantic_error("typedef int vec[3]; int main(){ vec a[2]; }");
    assert_eq!(error.message, "underlying type is already an array");
}

#[test]
fn typedef_redeclaration() {
    let error = semantic_error("typedef int t; typedef int t;");
    assert_eq!(error.message, "redeclaration of 't'");
}

#[test]
fn scalar_typedef_declares_a_scalar() {
    analyze_source("typedef int t; int main(){ t x; x = 1; }").unwrap();

    let error = semantic_error("typedef int t; int main(){ t x; x[0] = 1; }");
    assert_eq!(error.message, "attempt to index not an array");
}

fn walk_expression<'a>(expression: &'a Expression, sink: &mut Vec<&'a Expression>) {
    sink.push(expression);
    match &expression.kind {
        ExpressionKind::Binary { left, right, .. } => {
            walk_expression(left, sink);
            walk_expression(right, sink);
        }
        ExpressionKind::Index { index, .. } => walk_expression(index, sink),
        _ => {}
    }
}

fn walk_declaration<'a>(decl: &'a Declaration, sink: &mut Vec<&'a Expression>) {
    match &decl.kind {
        DeclarationKind::Variable(variable) => {
            if let Some(init) = &variable.init {
                walk_expression(init, sink);
            }
        }
        DeclarationKind::Array(array) => {
            if let Some(size) = &array.size {
                walk_expression(size, sink);
            }
            for value in &array.brace_init {
                walk_expression(value, sink);
            }
            if let Some(literal) = &array.string_init {
                walk_expression(literal, sink);
            }
        }
        DeclarationKind::Typedef(typedef) => {
            if let Some(size) = &typedef.array_size {
                walk_expression(size, sink);
            }
        }
        DeclarationKind::Main(main) => {
            for statement in &main.body {
                walk_expressions(statement, sink);
            }
        }
    }
}

fn walk_expressions<'a>(statement: &'a Statement, sink: &mut Vec<&'a Expression>) {
    match statement {
        Statement::Empty => {}
        Statement::Compound(statements) => {
            for statement in statements {
                walk_expressions(statement, sink);
            }
        }
        Statement::For(for_loop) => {
            if let Some(init) = &for_loop.init {
                walk_expression(&init.target, sink);
                walk_expression(&init.value, sink);
            }
            if let Some(condition) = &for_loop.condition {
                walk_expression(condition, sink);
            }
            if let Some(increment) = &for_loop.increment {
                walk_expression(&increment.target, sink);
                walk_expression(&increment.value, sink);
            }
            walk_expressions(&for_loop.body, sink);
        }
        Statement::Assign(assignment) => {
            walk_expression(&assignment.target, sink);
            walk_expression(&assignment.value, sink);
        }
        Statement::Declaration(decl) => walk_declaration(decl, sink),
    }
}

#[test]
fn every_expression_is_type_stamped() {
    let source = "
    typedef int vec[4];
    int pad = 1;
    int main() {
        vec a;
        char c = 'x';
        long l = 2;
        int i;
        char s[] = \"abc\";
        for (i = 0; i < 4; i = i + 1) {
            a[i] = i * 2 + pad;
        }
        l = l + c;
    }
    ";

    let program = analyze_source(source).unwrap();

    let mut expressions = Vec::new();
    for declaration in &program.declarations {
        walk_declaration(declaration, &mut expressions);
    }

    assert!(!expressions.is_empty());
    for expression in expressions {
        assert_ne!(
            expression.resolved_type,
            DataType::Unknown,
            "unstamped expression {:?}",
            expression
        );
    }
}

#[test]
fn widening_picks_the_larger_type() {
    let program = analyze_source(
        "int main(){ char c = 'x'; long l = 1; int i = 2; i = 0; l = l + c; c = 'y'; }",
    )
    .unwrap();

    let body = match &program.declarations[0].kind {
        DeclarationKind::Main(main) => &main.body,
        other => panic!("unexpected declaration {:?}", other),
    };

    // `l + c` widens to long, `i` alone stays int, constants are int.
    let mut found = false;
    for statement in body {
        let mut expressions = Vec::new();
        walk_expressions(statement, &mut expressions);
        for expression in expressions {
            if let ExpressionKind::Binary { .. } = expression.kind {
                assert_eq!(expression.resolved_type, DataType::Long);
                found = true;
            }
        }
    }
    assert!(found);
}

#[test]
fn symbol_table_scopes() {
    let mut table = SymbolTable::new();
    assert_eq!(table.depth(), 1);

    let symbol = Symbol {
        ty: DataType::Int,
        is_array: false,
        array_size: -1,
        is_typedef: false,
        declared_at: Pos { line: 1, column: 1 },
    };

    table.declare("x", symbol);
    assert!(!table.is_unique_in_current_scope("x"));

    table.enter_scope();
    assert_eq!(table.depth(), 2);
    assert!(table.is_unique_in_current_scope("x"));
    assert!(table.lookup("x").is_some());

    table.declare("y", symbol);
    table.leave_scope();
    assert_eq!(table.depth(), 1);
    assert!(table.lookup("y").is_none());

    // The global scope can never be popped.
    table.leave_scope();
    table.leave_scope();
    assert_eq!(table.depth(), 1);
    assert!(table.lookup("x").is_some());
}
