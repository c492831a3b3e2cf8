//! Code generation module for the compiler.
//!
//! This module contains the LLVM-based code generator that lowers the AST
//! into LLVM IR. It handles:
//!
//! - Lexical scoping of variables and the function table
//! - Compilation of expressions and statements
//! - Type conversion from type tags to LLVM types, and implicit coercions
//! - Control flow lowering into basic blocks

pub mod compiler;
pub mod expr;
pub mod scope;
pub mod stmt;
