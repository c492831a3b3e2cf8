use inkwell::{
    values::{BasicMetadataValueEnum, BasicValueEnum, FloatValue, IntValue, PointerValue},
    FloatPredicate, IntPredicate,
};

use crate::{
    ast::{
        expressions::{BinaryOperator, Expr, ExprKind, UnaryOperator},
        types::TypeTag,
    },
    errors::errors::{Error, ErrorImpl},
    Span,
};

use super::compiler::{type_name, Compiler, Variable};

/// Generates LLVM IR for the given expression and returns its value.
///
/// Calls to `Void` functions are rejected here; use [`gen_call`] where a
/// value is not needed.
pub fn gen_expression<'a>(
    compiler: &Compiler<'a>,
    expression: &Expr,
) -> Result<BasicValueEnum<'a>, Error> {
    let span = &expression.span;

    match &expression.kind {
        ExprKind::Integer(value) => Ok(compiler
            .context
            .i32_type()
            .const_int(*value as u64, true)
            .into()),
        ExprKind::Float(value) => Ok(compiler
            .context
            .f32_type()
            .const_float(*value as f64)
            .into()),
        ExprKind::Boolean(value) => Ok(compiler
            .context
            .bool_type()
            .const_int(*value as u64, false)
            .into()),
        ExprKind::Char(value) => Ok(compiler
            .context
            .i32_type()
            .const_int(*value as u64, false)
            .into()),
        ExprKind::String(value) => Ok(compiler
            .builder
            .build_global_string_ptr(value, "str")?
            .as_pointer_value()
            .into()),
        ExprKind::Identifier(name) => {
            let variable = lookup_variable(compiler, name, span)?;

            if let Some(len) = variable.array_len {
                return Err(Error::new(
                    ErrorImpl::TypeMismatch {
                        expected: variable.tag.to_string(),
                        received: format!("array of {}", len),
                    },
                    span.start.clone(),
                ));
            }

            Ok(compiler.builder.build_load(variable.pointer, name)?)
        }
        ExprKind::Unary { operator, operand } => {
            let value = gen_expression(compiler, operand)?;
            gen_unary(compiler, operator, value, span)
        }
        ExprKind::Binary {
            left,
            operator,
            right,
        } => {
            let lhs = gen_expression(compiler, left)?;
            let rhs = gen_expression(compiler, right)?;
            gen_binary(compiler, operator, lhs, rhs, span)
        }
        ExprKind::Call { callee, arguments } => gen_call(compiler, callee, arguments, span)?
            .ok_or_else(|| {
                Error::new(
                    ErrorImpl::TypeMismatch {
                        expected: String::from("a value"),
                        received: TypeTag::Void.to_string(),
                    },
                    span.start.clone(),
                )
            }),
        ExprKind::Array(elements) => Err(Error::new(
            ErrorImpl::TypeMismatch {
                expected: String::from("a scalar value"),
                received: format!("array of {}", elements.len()),
            },
            span.start.clone(),
        )),
        ExprKind::Index { array, index } => {
            let pointer = element_pointer(compiler, array, index, span)?;
            Ok(compiler.builder.build_load(pointer, "elem")?)
        }
    }
}

/// Emits a call, returning `None` for `Void` functions.
///
/// Arguments are evaluated left to right and converted to the declared
/// parameter types.
pub fn gen_call<'a>(
    compiler: &Compiler<'a>,
    callee: &str,
    arguments: &[Expr],
    span: &Span,
) -> Result<Option<BasicValueEnum<'a>>, Error> {
    let Some(signature) = compiler.functions.get(callee) else {
        return Err(Error::new(
            ErrorImpl::UndeclaredFunction {
                function: callee.to_string(),
            },
            span.start.clone(),
        ));
    };

    if signature.parameters.len() != arguments.len() {
        return Err(Error::new(
            ErrorImpl::ArityMismatch {
                function: callee.to_string(),
                expected: signature.parameters.len(),
                received: arguments.len(),
            },
            span.start.clone(),
        ));
    }

    let mut args: Vec<BasicMetadataValueEnum<'a>> = Vec::with_capacity(arguments.len());
    for (argument, tag) in arguments.iter().zip(&signature.parameters) {
        let value = gen_expression(compiler, argument)?;
        args.push(compiler.coerce(value, tag, &argument.span)?.into());
    }

    let name = if signature.return_type.is_void() {
        ""
    } else {
        "call"
    };

    let call = compiler.builder.build_call(signature.value, &args, name)?;
    Ok(call.try_as_basic_value().left())
}

/// Address of `array[index]`. The index is converted to `Integer`.
pub fn element_pointer<'a>(
    compiler: &Compiler<'a>,
    array: &str,
    index: &Expr,
    span: &Span,
) -> Result<PointerValue<'a>, Error> {
    let variable = lookup_variable(compiler, array, span)?;

    if variable.array_len.is_none() {
        return Err(Error::new(
            ErrorImpl::TypeMismatch {
                expected: String::from("an array"),
                received: variable.tag.to_string(),
            },
            span.start.clone(),
        ));
    }

    let index_value = gen_expression(compiler, index)?;
    let index_value = compiler
        .coerce(index_value, &TypeTag::Integer, &index.span)?
        .into_int_value();
    let zero = compiler.context.i32_type().const_zero();

    // The alloca is `[N x T]*`, so the first index steps through the pointer.
    let pointer = unsafe {
        compiler
            .builder
            .build_in_bounds_gep(variable.pointer, &[zero, index_value], "elem_ptr")?
    };

    Ok(pointer)
}

pub fn lookup_variable<'a>(
    compiler: &Compiler<'a>,
    name: &str,
    span: &Span,
) -> Result<Variable<'a>, Error> {
    compiler.scopes.lookup(name).cloned().ok_or_else(|| {
        Error::new(
            ErrorImpl::UndeclaredVariable {
                variable: name.to_string(),
            },
            span.start.clone(),
        )
    })
}

fn gen_unary<'a>(
    compiler: &Compiler<'a>,
    operator: &UnaryOperator,
    value: BasicValueEnum<'a>,
    span: &Span,
) -> Result<BasicValueEnum<'a>, Error> {
    match operator {
        UnaryOperator::Not => {
            let truth = compiler.to_bool(value, span)?;
            Ok(compiler.builder.build_not(truth, "not")?.into())
        }
        UnaryOperator::Negate => match value {
            BasicValueEnum::FloatValue(float) => {
                Ok(compiler.builder.build_float_neg(float, "neg")?.into())
            }
            BasicValueEnum::IntValue(_) => {
                let int = compiler
                    .coerce(value, &TypeTag::Integer, span)?
                    .into_int_value();
                Ok(compiler.builder.build_int_neg(int, "neg")?.into())
            }
            other => Err(Error::new(
                ErrorImpl::TypeMismatch {
                    expected: TypeTag::Integer.to_string(),
                    received: type_name(other.get_type()),
                },
                span.start.clone(),
            )),
        },
    }
}

fn gen_binary<'a>(
    compiler: &Compiler<'a>,
    operator: &BinaryOperator,
    lhs: BasicValueEnum<'a>,
    rhs: BasicValueEnum<'a>,
    span: &Span,
) -> Result<BasicValueEnum<'a>, Error> {
    if operator.is_logical() {
        // Both operands are always evaluated.
        let lhs = compiler.to_bool(lhs, span)?;
        let rhs = compiler.to_bool(rhs, span)?;

        return Ok(match operator {
            BinaryOperator::And => compiler.builder.build_and(lhs, rhs, "and")?,
            _ => compiler.builder.build_or(lhs, rhs, "or")?,
        }
        .into());
    }

    for value in [lhs, rhs] {
        if !matches!(
            value,
            BasicValueEnum::IntValue(_) | BasicValueEnum::FloatValue(_)
        ) {
            return Err(Error::new(
                ErrorImpl::TypeMismatch {
                    expected: String::from("a number"),
                    received: type_name(value.get_type()),
                },
                span.start.clone(),
            ));
        }
    }

    if lhs.is_float_value() || rhs.is_float_value() {
        let lhs = compiler
            .coerce(lhs, &TypeTag::Float, span)?
            .into_float_value();
        let rhs = compiler
            .coerce(rhs, &TypeTag::Float, span)?
            .into_float_value();
        gen_float_binary(compiler, operator, lhs, rhs)
    } else {
        let lhs = compiler
            .coerce(lhs, &TypeTag::Integer, span)?
            .into_int_value();
        let rhs = compiler
            .coerce(rhs, &TypeTag::Integer, span)?
            .into_int_value();
        gen_int_binary(compiler, operator, lhs, rhs)
    }
}

fn gen_int_binary<'a>(
    compiler: &Compiler<'a>,
    operator: &BinaryOperator,
    lhs: IntValue<'a>,
    rhs: IntValue<'a>,
) -> Result<BasicValueEnum<'a>, Error> {
    let builder = &compiler.builder;

    let value = match operator {
        BinaryOperator::Add => builder.build_int_add(lhs, rhs, "add")?,
        BinaryOperator::Subtract => builder.build_int_sub(lhs, rhs, "sub")?,
        BinaryOperator::Multiply => builder.build_int_mul(lhs, rhs, "mul")?,
        BinaryOperator::Divide => builder.build_int_signed_div(lhs, rhs, "div")?,
        BinaryOperator::Equals => builder.build_int_compare(IntPredicate::EQ, lhs, rhs, "eq")?,
        BinaryOperator::NotEquals => {
            builder.build_int_compare(IntPredicate::NE, lhs, rhs, "ne")?
        }
        BinaryOperator::Less => builder.build_int_compare(IntPredicate::SLT, lhs, rhs, "lt")?,
        BinaryOperator::LessEquals => {
            builder.build_int_compare(IntPredicate::SLE, lhs, rhs, "le")?
        }
        BinaryOperator::Greater => {
            builder.build_int_compare(IntPredicate::SGT, lhs, rhs, "gt")?
        }
        BinaryOperator::GreaterEquals => {
            builder.build_int_compare(IntPredicate::SGE, lhs, rhs, "ge")?
        }
        BinaryOperator::And => builder.build_and(lhs, rhs, "and")?,
        BinaryOperator::Or => builder.build_or(lhs, rhs, "or")?,
    };

    Ok(value.into())
}

fn gen_float_binary<'a>(
    compiler: &Compiler<'a>,
    operator: &BinaryOperator,
    lhs: FloatValue<'a>,
    rhs: FloatValue<'a>,
) -> Result<BasicValueEnum<'a>, Error> {
    let builder = &compiler.builder;

    let value: BasicValueEnum<'a> = match operator {
        BinaryOperator::Add => builder.build_float_add(lhs, rhs, "fadd")?.into(),
        BinaryOperator::Subtract => builder.build_float_sub(lhs, rhs, "fsub")?.into(),
        BinaryOperator::Multiply => builder.build_float_mul(lhs, rhs, "fmul")?.into(),
        BinaryOperator::Divide => builder.build_float_div(lhs, rhs, "fdiv")?.into(),
        comparison => {
            let predicate = match comparison {
                BinaryOperator::Equals => FloatPredicate::OEQ,
                BinaryOperator::NotEquals => FloatPredicate::ONE,
                BinaryOperator::Less => FloatPredicate::OLT,
                BinaryOperator::LessEquals => FloatPredicate::OLE,
                BinaryOperator::Greater => FloatPredicate::OGT,
                _ => FloatPredicate::OGE,
            };
            builder
                .build_float_compare(predicate, lhs, rhs, "fcmp")?
                .into()
        }
    };

    Ok(value)
}
