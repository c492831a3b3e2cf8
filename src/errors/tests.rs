//! Unit tests for error handling.
//!
//! This module contains tests for error types and error reporting.

use crate::errors::errors::{Error, ErrorImpl, ErrorTip};
use crate::Position;
use std::rc::Rc;

fn at_start(error_impl: ErrorImpl) -> Error {
    Error::new(error_impl, Position(0, Rc::new("test.bq".to_string())))
}

#[test]
fn test_error_creation() {
    let error = at_start(ErrorImpl::UnrecognisedToken {
        token: "@".to_string(),
    });

    assert_eq!(error.get_error_name(), "UnrecognisedToken");
}

#[test]
fn test_error_position() {
    let pos = Position(42, Rc::new("test.bq".to_string()));
    let error = Error::new(
        ErrorImpl::SyntaxError {
            expected: "Identifier".to_string(),
            found: "Assignment".to_string(),
            index: 1,
        },
        pos,
    );

    assert_eq!(error.get_position().0, 42);
}

#[test]
fn test_syntax_error_carries_token_index() {
    let error = at_start(ErrorImpl::SyntaxError {
        expected: "Semicolon".to_string(),
        found: "EOF".to_string(),
        index: 7,
    });

    assert_eq!(error.get_error_name(), "SyntaxError");
    match error.get_internal_error() {
        ErrorImpl::SyntaxError { index, .. } => assert_eq!(*index, 7),
        other => panic!("unexpected error {:?}", other),
    }
}

#[test]
fn test_type_mismatch_error() {
    let error = at_start(ErrorImpl::TypeMismatch {
        expected: "Integer".to_string(),
        received: "String".to_string(),
    });

    assert_eq!(error.get_error_name(), "TypeMismatch");
    assert_eq!(
        error.get_tip().to_string(),
        "Expected type `Integer`, received `String`"
    );
}

#[test]
fn test_undeclared_variable_error() {
    let error = at_start(ErrorImpl::UndeclaredVariable {
        variable: "foo".to_string(),
    });

    assert_eq!(error.get_error_name(), "UndeclaredVariable");
}

#[test]
fn test_undeclared_function_error() {
    let error = at_start(ErrorImpl::UndeclaredFunction {
        function: "foo".to_string(),
    });

    assert_eq!(error.get_error_name(), "UndeclaredFunction");
}

#[test]
fn test_array_size_mismatch_error() {
    let error = at_start(ErrorImpl::ArraySizeMismatch {
        capacity: 2,
        received: 3,
    });

    assert_eq!(error.get_error_name(), "ArraySizeMismatch");
    assert_eq!(
        error.get_tip().to_string(),
        "Array holds 2 elements, initializer has 3"
    );
}

#[test]
fn test_misplaced_control_flow_error() {
    let error = at_start(ErrorImpl::MisplacedControlFlow {
        statement: "break".to_string(),
    });

    assert_eq!(error.get_error_name(), "MisplacedControlFlow");
}

#[test]
fn test_arity_mismatch_error() {
    let error = at_start(ErrorImpl::ArityMismatch {
        function: "add".to_string(),
        expected: 2,
        received: 3,
    });

    assert_eq!(error.get_error_name(), "ArityMismatch");
    assert_eq!(
        error.get_tip().to_string(),
        "`add` expects 2 arguments, received 3"
    );
}

#[test]
fn test_missing_terminator_error() {
    let error = at_start(ErrorImpl::MissingTerminator {
        function: "f".to_string(),
    });

    assert_eq!(error.get_error_name(), "MissingTerminator");
}

#[test]
fn test_error_tip_none() {
    let error = at_start(ErrorImpl::UnrecognisedToken {
        token: "@".to_string(),
    });

    assert!(matches!(error.get_tip(), ErrorTip::None));
}

#[test]
fn test_syntax_error_tip_mentions_semicolon() {
    let error = at_start(ErrorImpl::SyntaxError {
        expected: "Semicolon".to_string(),
        found: "CloseCurly".to_string(),
        index: 3,
    });

    match error.get_tip() {
        ErrorTip::Suggestion(tip) => assert!(tip.contains("semicolon")),
        _ => panic!("Expected suggestion tip"),
    }
}

#[test]
fn test_error_tip_display() {
    let tip = ErrorTip::Suggestion("Try this instead".to_string());
    assert_eq!(tip.to_string(), "Try this instead");

    let tip = ErrorTip::None;
    assert_eq!(tip.to_string(), "");
}

#[test]
fn test_error_display_includes_file_and_offset() {
    let error = Error::new(
        ErrorImpl::UnknownType {
            type_: "Matrix".to_string(),
        },
        Position(12, Rc::new("main.bq".to_string())),
    );

    assert_eq!(error.to_string(), "unknown type Matrix found at main.bq:12");
}
