//! Integration tests for end-to-end compilation.
//!
//! These tests run the complete pipeline from source code through
//! tokenization, parsing and LLVM IR generation, then JIT-execute the
//! synthesized `main` to check the behaviour of the emitted code.

use basiq::{
    compiler::compiler::{compile, Compiler, CompilerOptions},
    errors::errors::{Error, ErrorImpl},
    lexer::lexer::tokenize,
    parser::parser::parse,
};
use inkwell::{
    context::Context,
    execution_engine::JitFunction,
    targets::{InitializationConfig, Target},
    OptimizationLevel,
};

type MainFn = unsafe extern "C" fn() -> i32;

fn compile_source<'a>(source: &str, context: &'a Context) -> Result<Compiler<'a>, Error> {
    let tokens = tokenize(source.to_string(), Some("test.bq".to_string()))?;
    let program = parse(tokens)?;
    compile(&program, context, &CompilerOptions::default())
}

/// Compiles `source` and returns what its `main` returns.
fn run(source: &str) -> i32 {
    let context = Context::create();
    let compiler = compile_source(source, &context).unwrap();

    Target::initialize_native(&InitializationConfig::default()).unwrap();
    let engine = compiler
        .module
        .create_jit_execution_engine(OptimizationLevel::None)
        .unwrap();

    unsafe {
        let main: JitFunction<MainFn> = engine.get_function("main").unwrap();
        main.call()
    }
}

fn compile_error(source: &str) -> ErrorImpl {
    let context = Context::create();
    let error = match compile_source(source, &context) {
        Ok(_) => panic!("expected compilation of {:?} to fail", source),
        Err(error) => error.get_internal_error().clone(),
    };
    error
}

#[test]
fn test_arithmetic_follows_precedence() {
    assert_eq!(run("return 2 + 3 * 4;"), 14);
    assert_eq!(run("return (2 + 3) * 4;"), 20);
    assert_eq!(run("return 20 - 6 / 3 - 1;"), 17);
    assert_eq!(run("return -7 + 10;"), 3);
    assert_eq!(run("return -2147483648 + 2147483647;"), -1);
}

#[test]
fn test_main_returns_zero_without_return() {
    assert_eq!(run("let a: Integer = 3;"), 0);
    assert_eq!(run(""), 0);
}

#[test]
fn test_declarations_store_and_load() {
    let source = "let a: Integer = 5; let b: Integer = a + 2; return b;";
    assert_eq!(run(source), 7);

    let context = Context::create();
    let ir = compile_source(source, &context).unwrap().emit_ir();
    assert!(ir.contains("define i32 @main()"));
    assert!(ir.contains("store i32 5, i32* %a"));
    assert!(ir.contains("%b = alloca i32"));
}

#[test]
fn test_read_after_write() {
    assert_eq!(run("let a: Integer; a = 41; a = a + 1; return a;"), 42);
}

#[test]
fn test_function_call() {
    let source = "
        func add(x: Integer, y: Integer) -> Integer { return x + y; }
        return add(3, 4);
    ";
    assert_eq!(run(source), 7);

    let context = Context::create();
    let ir = compile_source(source, &context).unwrap().emit_ir();
    assert!(ir.contains("define i32 @add(i32 %0, i32 %1)"));
}

#[test]
fn test_call_before_definition_and_recursion() {
    let source = "
        let r: Integer = fact(5);
        func fact(n: Integer) -> Integer {
            if n <= 1 { return 1; }
            return n * fact(n - 1);
        }
        return r;
    ";
    assert_eq!(run(source), 120);
}

#[test]
fn test_void_function_call_statement() {
    let source = "
        func noop(x: Integer) { if x > 0 { return; } }
        noop(1);
        return 1;
    ";
    assert_eq!(run(source), 1);
}

#[test]
fn test_inner_scope_shadows_outer() {
    let source = "
        let x: Integer = 1;
        {
            let x: Integer = 2;
            x = 5;
        }
        return x;
    ";
    assert_eq!(run(source), 1);
}

#[test]
fn test_constant_condition_if() {
    assert_eq!(run("if true { return 1; } else { return 2; }"), 1);
    assert_eq!(run("if false { return 1; } else { return 2; }"), 2);
    assert_eq!(run("if 0 { return 1; } return 3;"), 3);
}

#[test]
fn test_elif_chain() {
    let source = "
        let x: Integer = 7;
        let r: Integer = 0;
        if x < 5 { r = 1; } elif x < 10 { r = 2; } else { r = 3; }
        return r;
    ";
    assert_eq!(run(source), 2);
}

#[test]
fn test_while_break_exits_once() {
    let source = "
        let i: Integer = 0;
        let exits: Integer = 0;
        while true {
            i = i + 1;
            if i == 10 { break; }
        }
        exits = exits + 1;
        return i * 10 + exits;
    ";
    assert_eq!(run(source), 101);
}

#[test]
fn test_for_loop_with_continue() {
    let source = "
        let sum: Integer = 0;
        for (let i: Integer = 0; i < 5; i = i + 1) {
            if i == 2 { continue; }
            sum = sum + i;
        }
        return sum;
    ";
    assert_eq!(run(source), 8);
}

#[test]
fn test_nested_loops_restore_targets() {
    let source = "
        let i: Integer = 0;
        let total: Integer = 0;
        while true {
            let j: Integer = 0;
            while true {
                j = j + 1;
                if j == 3 { break; }
            }
            total = total + j;
            i = i + 1;
            if i == 14 { break; }
        }
        return total;
    ";
    assert_eq!(run(source), 42);

    let source = "
        let sum: Integer = 0;
        for (let i: Integer = 0; i < 3; i = i + 1) {
            for (let j: Integer = 0; j < 3; j = j + 1) {
                if j == 1 { continue; }
                sum = sum + j;
            }
        }
        return sum;
    ";
    assert_eq!(run(source), 6);

    let source = "
        let outer: Integer = 0;
        for (let i: Integer = 0; i < 10; i = i + 1) {
            let k: Integer = 0;
            while k < 5 { k = k + 1; }
            outer = outer + k;
            if outer >= 10 { break; }
        }
        return outer;
    ";
    assert_eq!(run(source), 10);
}

#[test]
fn test_for_without_header_needs_break() {
    let source = "
        let n: Integer = 0;
        for (;;) {
            n = n + 3;
            if n > 10 { break; }
        }
        return n;
    ";
    assert_eq!(run(source), 12);
}

#[test]
fn test_arrays() {
    let source = "
        let xs: Integer[4] = [1, 2, 3];
        xs[3] = 10;
        return xs[0] + xs[2] + xs[3];
    ";
    assert_eq!(run(source), 14);
}

#[test]
fn test_string_into_char_array() {
    assert_eq!(run("let s: Char[6] = \"hello\"; return s[1];"), 'e' as i32);
    assert_eq!(run("let s: Char[6] = \"hello\"; return s[5];"), 0);
    assert_eq!(run("let c: Char = 'a'; return c;"), 97);
}

#[test]
fn test_numeric_coercions() {
    let source = "
        let x: Float = 2;
        let y: Float = x * 1.5;
        if y == 3.0 { return 1; }
        return 0;
    ";
    assert_eq!(run(source), 1);

    assert_eq!(run("let b: Boolean = true; return b + 1;"), 2);
    assert_eq!(run("let n: Integer = 3 < 4; return n;"), 1);
}

#[test]
fn test_logical_operators() {
    assert_eq!(run("if true && !false { return 3; } return 4;"), 3);
    assert_eq!(run("if 0 || 0 { return 3; } return 4;"), 4);
    assert_eq!(run("if 1 < 2 || 5 < 3 && false { return 5; } return 6;"), 5);
}

#[test]
fn test_nested_function_is_hoisted_within_block() {
    assert_eq!(run("{ return h(); func h() -> Integer { return 9; } }"), 9);

    let source = "
        func outer() -> Integer {
            let r: Integer = inner(4);
            return r;
            func inner(x: Integer) -> Integer { return x * 2; }
        }
        return outer();
    ";
    assert_eq!(run(source), 8);
}

#[test]
fn test_print_statement_calls_printf() {
    let source = "
        let n: Integer = 5;
        let c: Char = 'z';
        let s: String = \"hi\";
        let f: Float = 2.5;
        print n;
        print c;
        print f;
        print s;
        print n > 3;
        return n;
    ";
    assert_eq!(run(source), 5);

    let context = Context::create();
    let ir = compile_source(source, &context).unwrap().emit_ir();
    assert!(ir.contains("declare i32 @printf(i8*, ...)"));
    assert!(ir.contains("c\"%d\\0A\\00\""));
    assert!(ir.contains("c\"%c\\0A\\00\""));
    assert!(ir.contains("c\"%f\\0A\\00\""));
    assert!(ir.contains("c\"%s\\0A\\00\""));
    assert!(ir.contains("fpext float"));
    assert!(ir.contains("select i1"));
    assert_eq!(ir.matches("@print_int = ").count(), 1);
}

#[test]
fn test_print_reuses_format_strings() {
    let context = Context::create();
    let ir = compile_source("print 1; print 2; print 3;", &context)
        .unwrap()
        .emit_ir();

    assert_eq!(ir.matches("@print_int = ").count(), 1);
    assert_eq!(ir.matches("call i32 (i8*, ...) @printf").count(), 3);
}

#[test]
fn test_break_outside_loop() {
    assert_eq!(
        compile_error("break;"),
        ErrorImpl::MisplacedControlFlow {
            statement: "break".to_string()
        }
    );
    assert_eq!(
        compile_error("func f() { continue; }"),
        ErrorImpl::MisplacedControlFlow {
            statement: "continue".to_string()
        }
    );
}

#[test]
fn test_undeclared_names() {
    assert_eq!(
        compile_error("return y;"),
        ErrorImpl::UndeclaredVariable {
            variable: "y".to_string()
        }
    );
    assert_eq!(
        compile_error("{ let t: Integer = 1; } t = 2;"),
        ErrorImpl::UndeclaredVariable {
            variable: "t".to_string()
        }
    );
    assert_eq!(
        compile_error("return foo();"),
        ErrorImpl::UndeclaredFunction {
            function: "foo".to_string()
        }
    );
}

#[test]
fn test_function_body_cannot_see_callers_locals() {
    assert_eq!(
        compile_error("let a: Integer = 1; func f() -> Integer { return a; }"),
        ErrorImpl::UndeclaredVariable {
            variable: "a".to_string()
        }
    );
}

#[test]
fn test_arity_mismatch() {
    assert_eq!(
        compile_error("func add(x: Integer, y: Integer) -> Integer { return x + y; } return add(1);"),
        ErrorImpl::ArityMismatch {
            function: "add".to_string(),
            expected: 2,
            received: 1,
        }
    );
}

#[test]
fn test_missing_terminator() {
    assert_eq!(
        compile_error("func f(x: Integer) -> Integer { if x > 0 { return 1; } }"),
        ErrorImpl::MissingTerminator {
            function: "f".to_string()
        }
    );
}

#[test]
fn test_array_size_mismatch() {
    assert_eq!(
        compile_error("let xs: Integer[2] = [1, 2, 3];"),
        ErrorImpl::ArraySizeMismatch {
            capacity: 2,
            received: 3,
        }
    );
    assert_eq!(
        compile_error("let s: Char[5] = \"hello\";"),
        ErrorImpl::ArraySizeMismatch {
            capacity: 5,
            received: 6,
        }
    );
}

#[test]
fn test_type_mismatches() {
    assert_eq!(
        compile_error("let s: String = \"a\"; let n: Integer = s;"),
        ErrorImpl::TypeMismatch {
            expected: "Integer".to_string(),
            received: "String".to_string(),
        }
    );
    assert_eq!(
        compile_error("let f: Float = 1.5; let n: Integer = f;"),
        ErrorImpl::TypeMismatch {
            expected: "Integer".to_string(),
            received: "Float".to_string(),
        }
    );
    assert_eq!(
        compile_error("func f() { return 1; }"),
        ErrorImpl::TypeMismatch {
            expected: "Void".to_string(),
            received: "Integer".to_string(),
        }
    );
    assert!(matches!(
        compile_error("func f() { } let x: Integer = f();"),
        ErrorImpl::TypeMismatch { .. }
    ));
}

#[test]
fn test_redeclarations() {
    assert_eq!(
        compile_error("let x: Integer = 1; let x: Integer = 2;"),
        ErrorImpl::VariableAlreadyDeclared {
            variable: "x".to_string()
        }
    );
    assert_eq!(
        compile_error("func main() { }"),
        ErrorImpl::FunctionAlreadyDeclared {
            function: "main".to_string()
        }
    );
    assert_eq!(
        compile_error("func f() { } func f() { }"),
        ErrorImpl::FunctionAlreadyDeclared {
            function: "f".to_string()
        }
    );
}

#[test]
fn test_unknown_type() {
    assert_eq!(
        compile_error("let m: Matrix = 1;"),
        ErrorImpl::UnknownType {
            type_: "Matrix".to_string()
        }
    );
}

#[test]
fn test_error_position_points_at_statement() {
    let context = Context::create();
    let source = "let a: Integer = 1;\nreturn b;";

    let Err(error) = compile_source(source, &context) else {
        panic!("expected an undeclared variable error");
    };

    assert_eq!(error.get_position().0, 27);
    assert_eq!(error.get_position().1.as_str(), "test.bq");
}

#[test]
fn test_options_and_module_output() {
    let tokens = tokenize("return 1;".to_string(), None).unwrap();
    let program = parse(tokens).unwrap();

    let context = Context::create();
    let options = CompilerOptions {
        module_name: "custom".to_string(),
        verify: false,
    };
    let compiler = compile(&program, &context, &options).unwrap();

    let path = std::env::temp_dir().join(format!("basiq_test_{}.ll", std::process::id()));
    compiler.save_module_to_file(&path).unwrap();

    let written = std::fs::read_to_string(&path).unwrap();
    std::fs::remove_file(&path).unwrap();

    assert!(written.contains("; ModuleID = 'custom'"));
    assert!(written.contains("ret i32 1"));
}
