/// AST (Abstract Syntax Tree) module
/// Contains all definitions related to the AST structure
///
/// Submodules:
/// - ast: Printing the tree back to source
/// - expressions: Expression nodes and operators
/// - statements: Statement nodes
/// - types: Type annotations
pub mod ast;
pub mod expressions;
pub mod statements;
pub mod types;
