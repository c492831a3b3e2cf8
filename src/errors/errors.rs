use std::fmt::Display;

use inkwell::builder::BuilderError;
use thiserror::Error;

use crate::Position;

/// A compilation error together with the source position it was raised at.
///
/// Every phase (lexing, parsing, code generation) reports failures with this
/// type, and the first error aborts the whole compilation unit.
#[derive(Debug, Clone)]
pub struct Error {
    internal_error: ErrorImpl,
    position: Position,
}

impl Error {
    pub fn new(error_impl: ErrorImpl, position: Position) -> Self {
        Error {
            internal_error: error_impl,
            position,
        }
    }

    pub fn get_position(&self) -> &Position {
        &self.position
    }

    pub fn get_internal_error(&self) -> &ErrorImpl {
        &self.internal_error
    }

    pub fn get_error_name(&self) -> &str {
        match &self.internal_error {
            ErrorImpl::UnrecognisedToken { .. } => "UnrecognisedToken",
            ErrorImpl::SyntaxError { .. } => "SyntaxError",
            ErrorImpl::NumberParseError { .. } => "NumberParseError",
            ErrorImpl::UndeclaredVariable { .. } => "UndeclaredVariable",
            ErrorImpl::VariableAlreadyDeclared { .. } => "VariableAlreadyDeclared",
            ErrorImpl::UndeclaredFunction { .. } => "UndeclaredFunction",
            ErrorImpl::FunctionAlreadyDeclared { .. } => "FunctionAlreadyDeclared",
            ErrorImpl::TypeMismatch { .. } => "TypeMismatch",
            ErrorImpl::UnknownType { .. } => "UnknownType",
            ErrorImpl::ArraySizeMismatch { .. } => "ArraySizeMismatch",
            ErrorImpl::MisplacedControlFlow { .. } => "MisplacedControlFlow",
            ErrorImpl::ArityMismatch { .. } => "ArityMismatch",
            ErrorImpl::MissingTerminator { .. } => "MissingTerminator",
            ErrorImpl::InvalidModule { .. } => "InvalidModule",
            ErrorImpl::Builder { .. } => "Builder",
        }
    }

    pub fn get_tip(&self) -> ErrorTip {
        match &self.internal_error {
            ErrorImpl::UnrecognisedToken { .. } => ErrorTip::None,
            ErrorImpl::SyntaxError {
                expected, found, ..
            } => {
                if found == "Semicolon" || expected == "Semicolon" {
                    ErrorTip::Suggestion(format!(
                        "Expected {}, found `{}`, did you miss a semicolon?",
                        expected, found
                    ))
                } else {
                    ErrorTip::Suggestion(format!("Expected {}, found `{}`", expected, found))
                }
            }
            ErrorImpl::NumberParseError { token } => ErrorTip::Suggestion(format!(
                "Invalid number: `{}`, is it above the integer limit?",
                token
            )),
            ErrorImpl::UndeclaredVariable { variable } => ErrorTip::Suggestion(format!(
                "Variable `{}` is not declared in any enclosing scope",
                variable
            )),
            ErrorImpl::VariableAlreadyDeclared { variable } => ErrorTip::Suggestion(format!(
                "Variable `{}` already declared in this scope, use a nested block to shadow it",
                variable
            )),
            ErrorImpl::UndeclaredFunction { function } => {
                ErrorTip::Suggestion(format!("Function `{}` is not declared", function))
            }
            ErrorImpl::FunctionAlreadyDeclared { function } => {
                ErrorTip::Suggestion(format!("Function `{}` already declared", function))
            }
            ErrorImpl::TypeMismatch { expected, received } => ErrorTip::Suggestion(format!(
                "Expected type `{}`, received `{}`",
                expected, received
            )),
            ErrorImpl::UnknownType { type_ } => {
                ErrorTip::Suggestion(format!("Unknown type `{}` found", type_))
            }
            ErrorImpl::ArraySizeMismatch { capacity, received } => ErrorTip::Suggestion(format!(
                "Array holds {} elements, initializer has {}",
                capacity, received
            )),
            ErrorImpl::MisplacedControlFlow { statement } => ErrorTip::Suggestion(format!(
                "`{}` can only be used inside a `while` or `for` loop",
                statement
            )),
            ErrorImpl::ArityMismatch {
                function,
                expected,
                received,
            } => ErrorTip::Suggestion(format!(
                "`{}` expects {} arguments, received {}",
                function, expected, received
            )),
            ErrorImpl::MissingTerminator { function } => ErrorTip::Suggestion(format!(
                "Function `{}` can reach its end without returning a value",
                function
            )),
            ErrorImpl::InvalidModule { .. } | ErrorImpl::Builder { .. } => ErrorTip::None,
        }
    }
}

impl Display for Error {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        write!(
            f,
            "{} at {}:{}",
            self.internal_error, self.position.1, self.position.0
        )
    }
}

impl std::error::Error for Error {}

impl From<BuilderError> for Error {
    fn from(error: BuilderError) -> Self {
        Error::new(
            ErrorImpl::Builder {
                message: error.to_string(),
            },
            Position::null(),
        )
    }
}

pub enum ErrorTip {
    None,
    Suggestion(String),
}

impl Display for ErrorTip {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        match self {
            ErrorTip::None => write!(f, ""),
            ErrorTip::Suggestion(suggestion) => write!(f, "{}", suggestion),
        }
    }
}

#[derive(Error, Debug, Clone, PartialEq)]
pub enum ErrorImpl {
    #[error("unrecognised token: {token:?}")]
    UnrecognisedToken { token: String },
    #[error("syntax error at token {index}: expected {expected}, found {found:?}")]
    SyntaxError {
        expected: String,
        found: String,
        index: usize,
    },
    #[error("error parsing number: {token:?}")]
    NumberParseError { token: String },
    #[error("variable {variable:?} not declared")]
    UndeclaredVariable { variable: String },
    #[error("variable {variable:?} already declared")]
    VariableAlreadyDeclared { variable: String },
    #[error("function {function:?} not declared")]
    UndeclaredFunction { function: String },
    #[error("function {function:?} already declared")]
    FunctionAlreadyDeclared { function: String },
    #[error("types do not match: expected {expected:?}, received {received:?}")]
    TypeMismatch { expected: String, received: String },
    #[error("unknown type {type_} found")]
    UnknownType { type_: String },
    #[error("array size mismatch: capacity {capacity}, received {received}")]
    ArraySizeMismatch { capacity: u32, received: usize },
    #[error("{statement:?} outside of a loop")]
    MisplacedControlFlow { statement: String },
    #[error("{function:?} expects {expected} arguments, received {received}")]
    ArityMismatch {
        function: String,
        expected: usize,
        received: usize,
    },
    #[error("function {function:?} falls through without returning a value")]
    MissingTerminator { function: String },
    #[error("invalid module: {message}")]
    InvalidModule { message: String },
    #[error("instruction builder error: {message}")]
    Builder { message: String },
}
