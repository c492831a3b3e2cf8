use std::mem;

use inkwell::values::{BasicMetadataValueEnum, BasicValueEnum, IntValue};
use tracing::debug;

use crate::{
    ast::{
        expressions::{Expr, ExprKind},
        statements::{BlockStmt, FnDeclStmt, Stmt, StmtKind, VarDeclStmt},
        types::TypeTag,
    },
    errors::errors::{Error, ErrorImpl},
    Span,
};

use super::{
    compiler::{type_name, Compiler, LoopTargets, Variable},
    expr::{element_pointer, gen_call, gen_expression, lookup_variable},
    scope::ScopeStack,
};

/// Generates LLVM IR for the given statement.
///
/// Returns the value of expression statements, and of the last such
/// statement for blocks.
pub fn gen_statement<'a>(
    compiler: &mut Compiler<'a>,
    statement: &Stmt,
) -> Result<Option<BasicValueEnum<'a>>, Error> {
    let span = &statement.span;

    match &statement.kind {
        StmtKind::Expression(expr) => match &expr.kind {
            ExprKind::Call { callee, arguments } => gen_call(compiler, callee, arguments, span),
            _ => Ok(Some(gen_expression(compiler, expr)?)),
        },
        StmtKind::VarDecl(decl) => {
            gen_var_decl(compiler, decl, span)?;
            Ok(None)
        }
        StmtKind::Assignment {
            identifier,
            index,
            value,
        } => {
            gen_assignment(compiler, identifier, index.as_ref(), value, span)?;
            Ok(None)
        }
        StmtKind::Block(block) => gen_block(compiler, block),
        StmtKind::If {
            condition,
            then_body,
            else_body,
        } => {
            gen_if(compiler, condition, then_body, else_body.as_deref())?;
            Ok(None)
        }
        StmtKind::While { condition, body } => {
            gen_while(compiler, condition, body)?;
            Ok(None)
        }
        StmtKind::For {
            init,
            condition,
            increment,
            body,
        } => {
            gen_for(
                compiler,
                init.as_deref(),
                condition.as_ref(),
                increment.as_deref(),
                body,
            )?;
            Ok(None)
        }
        StmtKind::FnDecl(decl) => {
            gen_fn_decl(compiler, decl, span)?;
            Ok(None)
        }
        StmtKind::Return(value) => {
            gen_return(compiler, value.as_ref(), span)?;
            Ok(None)
        }
        StmtKind::Print(value) => {
            gen_print(compiler, value)?;
            Ok(None)
        }
        StmtKind::Break | StmtKind::Continue => {
            let is_break = matches!(statement.kind, StmtKind::Break);

            let Some(targets) = compiler.loop_targets else {
                return Err(Error::new(
                    ErrorImpl::MisplacedControlFlow {
                        statement: String::from(if is_break { "break" } else { "continue" }),
                    },
                    span.start.clone(),
                ));
            };

            let target = if is_break {
                targets.break_block
            } else {
                targets.continue_block
            };
            compiler.builder.build_unconditional_branch(target)?;

            Ok(None)
        }
    }
}

/// Lowers a block in its own scope.
///
/// Functions defined in the block are declared up front so earlier
/// statements may call them. Once the block is terminated only those
/// definitions are still lowered.
pub fn gen_block<'a>(
    compiler: &mut Compiler<'a>,
    block: &BlockStmt,
) -> Result<Option<BasicValueEnum<'a>>, Error> {
    for stmt in &block.body {
        if let StmtKind::FnDecl(decl) = &stmt.kind {
            if !compiler.functions.contains_key(&decl.identifier) {
                compiler.declare_function(decl, &stmt.span)?;
            }
        }
    }

    compiler.scopes.push();

    let mut last = None;
    for stmt in &block.body {
        if compiler.is_terminated() && !matches!(stmt.kind, StmtKind::FnDecl(_)) {
            continue;
        }

        if let Some(value) = gen_statement(compiler, stmt)? {
            last = Some(value);
        }
    }

    compiler.scopes.pop();
    Ok(last)
}

fn gen_var_decl<'a>(
    compiler: &mut Compiler<'a>,
    decl: &VarDeclStmt,
    span: &Span,
) -> Result<(), Error> {
    let storage = compiler.storage_type(&decl.var_type, decl.array_size, span)?;
    let pointer = compiler.create_entry_block_alloca(storage, &decl.identifier)?;

    match (decl.array_size, &decl.assigned_value) {
        (_, None) => {
            let zero = compiler.zero_value(&decl.var_type, decl.array_size, span)?;
            compiler.builder.build_store(pointer, zero)?;
        }
        (None, Some(value)) => {
            let value_span = &value.span;
            let value = gen_expression(compiler, value)?;
            let value = compiler.coerce(value, &decl.var_type, value_span)?;
            compiler.builder.build_store(pointer, value)?;
        }
        (Some(capacity), Some(value)) => {
            let variable = Variable {
                pointer,
                tag: decl.var_type.clone(),
                array_len: Some(capacity),
            };
            gen_array_init(compiler, &variable, capacity, value)?;
        }
    }

    compiler
        .scopes
        .declare(
            &decl.identifier,
            Variable {
                pointer,
                tag: decl.var_type.clone(),
                array_len: decl.array_size,
            },
        )
        .map_err(|error| Error::new(error, span.start.clone()))
}

/// Stores an array literal, or a string into a `Char` array.
fn gen_array_init<'a>(
    compiler: &mut Compiler<'a>,
    variable: &Variable<'a>,
    capacity: u32,
    value: &Expr,
) -> Result<(), Error> {
    let span = &value.span;

    match &value.kind {
        ExprKind::Array(elements) => {
            if elements.len() > capacity as usize {
                return Err(Error::new(
                    ErrorImpl::ArraySizeMismatch {
                        capacity,
                        received: elements.len(),
                    },
                    span.start.clone(),
                ));
            }

            // Elements past the literal stay zeroed.
            let zero = compiler.zero_value(&variable.tag, Some(capacity), span)?;
            compiler.builder.build_store(variable.pointer, zero)?;

            let i32_type = compiler.context.i32_type();
            for (i, element) in elements.iter().enumerate() {
                let element_value = gen_expression(compiler, element)?;
                let element_value = compiler.coerce(element_value, &variable.tag, &element.span)?;

                let indices = [i32_type.const_zero(), i32_type.const_int(i as u64, false)];
                let slot = unsafe {
                    compiler
                        .builder
                        .build_in_bounds_gep(variable.pointer, &indices, "init_ptr")?
                };
                compiler.builder.build_store(slot, element_value)?;
            }

            Ok(())
        }
        ExprKind::String(text) if variable.tag == TypeTag::Char => {
            let needed = text.chars().count() + 1;
            if needed > capacity as usize {
                return Err(Error::new(
                    ErrorImpl::ArraySizeMismatch {
                        capacity,
                        received: needed,
                    },
                    span.start.clone(),
                ));
            }

            let i32_type = compiler.context.i32_type();
            let mut chars: Vec<IntValue> = text
                .chars()
                .map(|c| i32_type.const_int(c as u64, false))
                .collect();
            chars.resize(capacity as usize, i32_type.const_zero());

            compiler
                .builder
                .build_store(variable.pointer, i32_type.const_array(&chars))?;

            Ok(())
        }
        _ => {
            let received = gen_expression(compiler, value)?;
            Err(Error::new(
                ErrorImpl::TypeMismatch {
                    expected: format!("{}[{}]", variable.tag, capacity),
                    received: type_name(received.get_type()),
                },
                span.start.clone(),
            ))
        }
    }
}

fn gen_assignment<'a>(
    compiler: &mut Compiler<'a>,
    identifier: &str,
    index: Option<&Expr>,
    value: &Expr,
    span: &Span,
) -> Result<(), Error> {
    let variable = lookup_variable(compiler, identifier, span)?;

    let pointer = match (index, variable.array_len) {
        (Some(index), _) => element_pointer(compiler, identifier, index, span)?,
        (None, None) => variable.pointer,
        (None, Some(len)) => {
            return Err(Error::new(
                ErrorImpl::TypeMismatch {
                    expected: format!("{}[{}] element", variable.tag, len),
                    received: format!("array of {}", len),
                },
                span.start.clone(),
            ))
        }
    };

    let stored = gen_expression(compiler, value)?;
    let stored = compiler.coerce(stored, &variable.tag, &value.span)?;
    compiler.builder.build_store(pointer, stored)?;

    Ok(())
}

fn gen_if<'a>(
    compiler: &mut Compiler<'a>,
    condition: &Expr,
    then_body: &BlockStmt,
    else_body: Option<&Stmt>,
) -> Result<(), Error> {
    let value = gen_expression(compiler, condition)?;
    let test = compiler.to_bool(value, &condition.span)?;

    let then_block = compiler.append_block("then")?;
    let else_block = match else_body {
        Some(_) => Some(compiler.append_block("else")?),
        None => None,
    };
    let merge_block = compiler.append_block("merge")?;

    compiler.builder.build_conditional_branch(
        test,
        then_block,
        else_block.unwrap_or(merge_block),
    )?;

    compiler.builder.position_at_end(then_block);
    gen_block(compiler, then_body)?;
    if !compiler.is_terminated() {
        compiler.builder.build_unconditional_branch(merge_block)?;
    }

    if let (Some(block), Some(stmt)) = (else_block, else_body) {
        compiler.builder.position_at_end(block);
        gen_statement(compiler, stmt)?;
        if !compiler.is_terminated() {
            compiler.builder.build_unconditional_branch(merge_block)?;
        }
    }

    compiler.builder.position_at_end(merge_block);
    if merge_block.get_first_use().is_none() {
        compiler.builder.build_unreachable()?;
    }

    Ok(())
}

fn gen_while<'a>(
    compiler: &mut Compiler<'a>,
    condition: &Expr,
    body: &BlockStmt,
) -> Result<(), Error> {
    let cond_block = compiler.append_block("while_cond")?;
    let body_block = compiler.append_block("while_body")?;
    let end_block = compiler.append_block("while_end")?;

    compiler.builder.build_unconditional_branch(cond_block)?;

    compiler.builder.position_at_end(cond_block);
    let value = gen_expression(compiler, condition)?;
    let test = compiler.to_bool(value, &condition.span)?;
    compiler
        .builder
        .build_conditional_branch(test, body_block, end_block)?;

    compiler.builder.position_at_end(body_block);
    let saved = compiler.loop_targets.replace(LoopTargets {
        break_block: end_block,
        continue_block: cond_block,
    });
    gen_block(compiler, body)?;
    compiler.loop_targets = saved;

    if !compiler.is_terminated() {
        compiler.builder.build_unconditional_branch(cond_block)?;
    }

    compiler.builder.position_at_end(end_block);
    Ok(())
}

fn gen_for<'a>(
    compiler: &mut Compiler<'a>,
    init: Option<&Stmt>,
    condition: Option<&Expr>,
    increment: Option<&Stmt>,
    body: &BlockStmt,
) -> Result<(), Error> {
    // The init binding lives in a scope wrapping the whole loop.
    compiler.scopes.push();

    if let Some(init) = init {
        gen_statement(compiler, init)?;
    }

    let cond_block = compiler.append_block("for_cond")?;
    let body_block = compiler.append_block("for_body")?;
    let step_block = compiler.append_block("for_step")?;
    let end_block = compiler.append_block("for_end")?;

    compiler.builder.build_unconditional_branch(cond_block)?;

    compiler.builder.position_at_end(cond_block);
    match condition {
        Some(condition) => {
            let value = gen_expression(compiler, condition)?;
            let test = compiler.to_bool(value, &condition.span)?;
            compiler
                .builder
                .build_conditional_branch(test, body_block, end_block)?;
        }
        None => {
            compiler.builder.build_unconditional_branch(body_block)?;
        }
    }

    compiler.builder.position_at_end(body_block);
    let saved = compiler.loop_targets.replace(LoopTargets {
        break_block: end_block,
        continue_block: step_block,
    });
    gen_block(compiler, body)?;
    compiler.loop_targets = saved;

    if !compiler.is_terminated() {
        compiler.builder.build_unconditional_branch(step_block)?;
    }

    compiler.builder.position_at_end(step_block);
    if let Some(increment) = increment {
        gen_statement(compiler, increment)?;
    }
    compiler.builder.build_unconditional_branch(cond_block)?;

    compiler.builder.position_at_end(end_block);
    // `for (;;)` without a `break` never exits.
    if end_block.get_first_use().is_none() {
        compiler.builder.build_unreachable()?;
    }

    compiler.scopes.pop();
    Ok(())
}

/// Lowers `print` to a `printf` call with a format picked from the value's type.
fn gen_print<'a>(compiler: &mut Compiler<'a>, value: &Expr) -> Result<(), Error> {
    let is_char = match &value.kind {
        ExprKind::Char(_) => true,
        ExprKind::Identifier(name) | ExprKind::Index { array: name, .. } => compiler
            .scopes
            .lookup(name)
            .is_some_and(|variable| variable.tag == TypeTag::Char),
        _ => false,
    };

    let lowered = gen_expression(compiler, value)?;

    let (format, argument): (_, BasicMetadataValueEnum<'a>) = match lowered {
        BasicValueEnum::IntValue(int) if int.get_type().get_bit_width() == 1 => {
            let yes = compiler.format_string("print_true", "true")?;
            let no = compiler.format_string("print_false", "false")?;
            let word = compiler.builder.build_select(int, yes, no, "bool_str")?;
            (compiler.format_string("print_str", "%s\n")?, word.into())
        }
        BasicValueEnum::IntValue(int) if is_char => {
            (compiler.format_string("print_char", "%c\n")?, int.into())
        }
        BasicValueEnum::IntValue(int) => (compiler.format_string("print_int", "%d\n")?, int.into()),
        BasicValueEnum::FloatValue(float) => {
            // Variadic arguments are promoted to double.
            let double = compiler
                .builder
                .build_float_ext(float, compiler.context.f64_type(), "fpext")?;
            (compiler.format_string("print_float", "%f\n")?, double.into())
        }
        BasicValueEnum::PointerValue(pointer) => {
            (compiler.format_string("print_str", "%s\n")?, pointer.into())
        }
        other => {
            return Err(Error::new(
                ErrorImpl::TypeMismatch {
                    expected: String::from("a printable value"),
                    received: type_name(other.get_type()),
                },
                value.span.start.clone(),
            ))
        }
    };

    compiler
        .builder
        .build_call(compiler.printf, &[format.into(), argument], "printf")?;

    Ok(())
}

fn gen_return<'a>(
    compiler: &mut Compiler<'a>,
    value: Option<&Expr>,
    span: &Span,
) -> Result<(), Error> {
    let return_type = compiler.current_return.clone();

    match (value, return_type.is_void()) {
        (None, true) => {
            compiler.builder.build_return(None)?;
        }
        (Some(expr), false) => {
            let value = gen_expression(compiler, expr)?;
            let value = compiler.coerce(value, &return_type, &expr.span)?;
            compiler.builder.build_return(Some(&value))?;
        }
        (Some(expr), true) => {
            let value = gen_expression(compiler, expr)?;
            return Err(Error::new(
                ErrorImpl::TypeMismatch {
                    expected: TypeTag::Void.to_string(),
                    received: type_name(value.get_type()),
                },
                span.start.clone(),
            ));
        }
        (None, false) => {
            return Err(Error::new(
                ErrorImpl::TypeMismatch {
                    expected: return_type.to_string(),
                    received: TypeTag::Void.to_string(),
                },
                span.start.clone(),
            ))
        }
    }

    Ok(())
}

fn gen_fn_decl<'a>(
    compiler: &mut Compiler<'a>,
    decl: &FnDeclStmt,
    span: &Span,
) -> Result<(), Error> {
    let existing = compiler.functions.get(&decl.identifier).cloned();
    let signature = match existing {
        // Pre-declared prototype still waiting for its body.
        Some(signature) if signature.value.count_basic_blocks() == 0 => signature,
        Some(_) => {
            return Err(Error::new(
                ErrorImpl::FunctionAlreadyDeclared {
                    function: decl.identifier.clone(),
                },
                span.start.clone(),
            ))
        }
        None => {
            compiler.declare_function(decl, span)?;
            compiler
                .functions
                .get(&decl.identifier)
                .cloned()
                .ok_or_else(|| {
                    Error::new(
                        ErrorImpl::UndeclaredFunction {
                            function: decl.identifier.clone(),
                        },
                        span.start.clone(),
                    )
                })?
        }
    };
    let function = signature.value;

    let saved_block = compiler.builder.get_insert_block();
    let saved_scopes = mem::replace(&mut compiler.scopes, ScopeStack::new());
    let saved_targets = compiler.loop_targets.take();
    let saved_function = compiler.current_function.replace(function);
    let saved_return = mem::replace(&mut compiler.current_return, signature.return_type.clone());

    let entry = compiler.context.append_basic_block(function, "entry");
    compiler.builder.position_at_end(entry);

    for ((name, tag), param) in decl.parameters.iter().zip(function.get_param_iter()) {
        let ty = compiler.convert_type(tag, span)?;
        let pointer = compiler.create_entry_block_alloca(ty, name)?;
        compiler.builder.build_store(pointer, param)?;

        compiler
            .scopes
            .declare(
                name,
                Variable {
                    pointer,
                    tag: tag.clone(),
                    array_len: None,
                },
            )
            .map_err(|error| Error::new(error, span.start.clone()))?;
    }

    gen_block(compiler, &decl.body)?;

    if !compiler.is_terminated() {
        if signature.return_type.is_void() {
            compiler.builder.build_return(None)?;
        } else {
            return Err(Error::new(
                ErrorImpl::MissingTerminator {
                    function: decl.identifier.clone(),
                },
                span.start.clone(),
            ));
        }
    }

    debug!(
        function = %decl.identifier,
        blocks = function.count_basic_blocks(),
        "lowered function"
    );

    compiler.scopes = saved_scopes;
    compiler.loop_targets = saved_targets;
    compiler.current_function = saved_function;
    compiler.current_return = saved_return;
    if let Some(block) = saved_block {
        compiler.builder.position_at_end(block);
    }

    Ok(())
}
