//! Source printer for the AST.
//!
//! Every node prints back to source that parses to a structurally equal
//! tree. Binary and unary expressions are fully parenthesised so precedence
//! never has to be reconstructed.

use std::fmt::{Display, Formatter, Result};

use super::statements::{BlockStmt, Stmt, StmtKind, VarDeclStmt};

const INDENT: &str = "    ";

/// Prints a whole program, one top-level statement per line.
pub fn repr(program: &[Stmt]) -> String {
    program
        .iter()
        .map(|stmt| format!("{}\n", stmt))
        .collect()
}

impl Display for Stmt {
    fn fmt(&self, f: &mut Formatter<'_>) -> Result {
        write_stmt(f, self, 0)
    }
}

impl Display for BlockStmt {
    fn fmt(&self, f: &mut Formatter<'_>) -> Result {
        write_block(f, self, 0)
    }
}

fn write_stmt(f: &mut Formatter<'_>, stmt: &Stmt, depth: usize) -> Result {
    match &stmt.kind {
        StmtKind::VarDecl(decl) => write!(f, "{};", var_decl(decl)),
        StmtKind::Assignment { .. } | StmtKind::Expression(_) => {
            write!(f, "{};", simple(stmt))
        }
        StmtKind::Block(block) => write_block(f, block, depth),
        StmtKind::If { .. } => {
            write!(f, "if ")?;
            write_if_chain(f, stmt, depth)
        }
        StmtKind::While { condition, body } => {
            write!(f, "while {} ", condition)?;
            write_block(f, body, depth)
        }
        StmtKind::For {
            init,
            condition,
            increment,
            body,
        } => {
            write!(f, "for (")?;
            match init {
                Some(init) => write!(f, "{}", init)?,
                None => write!(f, ";")?,
            }
            if let Some(condition) = condition {
                write!(f, " {}", condition)?;
            }
            write!(f, ";")?;
            if let Some(increment) = increment {
                write!(f, " {}", simple(increment))?;
            }
            write!(f, ") ")?;
            write_block(f, body, depth)
        }
        StmtKind::FnDecl(decl) => {
            let parameters = decl
                .parameters
                .iter()
                .map(|(name, tag)| format!("{}: {}", name, tag))
                .collect::<Vec<String>>()
                .join(", ");

            write!(f, "func {}({}) ", decl.identifier, parameters)?;
            if !decl.return_type.is_void() {
                write!(f, "-> {} ", decl.return_type)?;
            }
            write_block(f, &decl.body, depth)
        }
        StmtKind::Return(Some(value)) => write!(f, "return {};", value),
        StmtKind::Return(None) => write!(f, "return;"),
        StmtKind::Print(value) => write!(f, "print {};", value),
        StmtKind::Break => write!(f, "break;"),
        StmtKind::Continue => write!(f, "continue;"),
    }
}

// Writes everything after the leading `if`/`elif` keyword.
fn write_if_chain(f: &mut Formatter<'_>, stmt: &Stmt, depth: usize) -> Result {
    let StmtKind::If {
        condition,
        then_body,
        else_body,
    } = &stmt.kind
    else {
        return write_block_or_stmt(f, stmt, depth);
    };

    write!(f, "{} ", condition)?;
    write_block(f, then_body, depth)?;

    match else_body.as_deref() {
        Some(nested) if matches!(nested.kind, StmtKind::If { .. }) => {
            write!(f, " elif ")?;
            write_if_chain(f, nested, depth)
        }
        Some(other) => {
            write!(f, " else ")?;
            write_block_or_stmt(f, other, depth)
        }
        None => Ok(()),
    }
}

fn write_block_or_stmt(f: &mut Formatter<'_>, stmt: &Stmt, depth: usize) -> Result {
    match &stmt.kind {
        StmtKind::Block(block) => write_block(f, block, depth),
        _ => write_block(
            f,
            &BlockStmt {
                body: vec![stmt.clone()],
            },
            depth,
        ),
    }
}

fn write_block(f: &mut Formatter<'_>, block: &BlockStmt, depth: usize) -> Result {
    writeln!(f, "{{")?;
    for stmt in &block.body {
        write!(f, "{}", INDENT.repeat(depth + 1))?;
        write_stmt(f, stmt, depth + 1)?;
        writeln!(f)?;
    }
    write!(f, "{}}}", INDENT.repeat(depth))
}

fn var_decl(decl: &VarDeclStmt) -> String {
    let mut out = format!("let {}: {}", decl.identifier, decl.var_type);
    if let Some(size) = decl.array_size {
        out.push_str(&format!("[{}]", size));
    }
    if let Some(value) = &decl.assigned_value {
        out.push_str(&format!(" = {}", value));
    }
    out
}

// Assignment or expression without the trailing semicolon, as used in a
// `for` header's increment slot.
fn simple(stmt: &Stmt) -> String {
    match &stmt.kind {
        StmtKind::Assignment {
            identifier,
            index: Some(index),
            value,
        } => format!("{}[{}] = {}", identifier, index, value),
        StmtKind::Assignment {
            identifier,
            index: None,
            value,
        } => format!("{} = {}", identifier, value),
        StmtKind::Expression(expr) => expr.to_string(),
        _ => stmt.to_string(),
    }
}
