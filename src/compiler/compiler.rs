//! Main compiler module.
//!
//! This module contains the core Compiler structure and the `compile` entry
//! point lowering a parsed program to an LLVM module. It owns the LLVM
//! module and builder, the lexical scope stack, the function table and the
//! innermost loop's branch targets.

use std::{collections::HashMap, fs, io, path::Path};

use inkwell::{
    basic_block::BasicBlock,
    builder::Builder,
    context::Context,
    module::{Linkage, Module},
    types::{BasicMetadataTypeEnum, BasicType, BasicTypeEnum, FunctionType},
    values::{BasicValueEnum, FunctionValue, IntValue, PointerValue},
    AddressSpace, FloatPredicate, IntPredicate,
};
use tracing::{debug, info};

use crate::{
    ast::{
        statements::{FnDeclStmt, Stmt, StmtKind},
        types::TypeTag,
    },
    errors::errors::{Error, ErrorImpl},
    Position, Span,
};

use super::{scope::ScopeStack, stmt::gen_statement};

/// Settings for a single compilation unit.
#[derive(Debug, Clone)]
pub struct CompilerOptions {
    /// Name given to the LLVM module
    pub module_name: String,
    /// Run the LLVM verifier after code generation
    pub verify: bool,
}

impl Default for CompilerOptions {
    fn default() -> Self {
        CompilerOptions {
            module_name: String::from("main"),
            verify: true,
        }
    }
}

/// Storage bound to a variable name.
#[derive(Debug, Clone)]
pub struct Variable<'a> {
    /// Stack slot in the owning function's entry block
    pub pointer: PointerValue<'a>,
    /// Declared type, or the element type for arrays
    pub tag: TypeTag,
    /// Element count when the variable is an array
    pub array_len: Option<u32>,
}

/// A declared function and the source-level types of its signature.
#[derive(Debug, Clone)]
pub struct FunctionSignature<'a> {
    pub value: FunctionValue<'a>,
    pub parameters: Vec<TypeTag>,
    pub return_type: TypeTag,
}

/// Branch targets for `break` and `continue` in the innermost loop.
#[derive(Debug, Clone, Copy)]
pub struct LoopTargets<'a> {
    pub break_block: BasicBlock<'a>,
    pub continue_block: BasicBlock<'a>,
}

/// The main compiler structure that holds the state of the compilation process.
///
/// # Type Parameters
///
/// * `'a` - Lifetime of the LLVM context
pub struct Compiler<'a> {
    /// Reference to the LLVM context
    pub context: &'a Context,
    /// The LLVM module being built
    pub module: Module<'a>,
    /// The LLVM IR builder
    pub builder: Builder<'a>,

    /// Lexical scopes of the function being lowered
    pub scopes: ScopeStack<Variable<'a>>,
    /// Every function declared so far, by name
    pub functions: HashMap<String, FunctionSignature<'a>>,
    /// Targets of the innermost enclosing loop, if any
    pub loop_targets: Option<LoopTargets<'a>>,
    /// The function whose body is being lowered
    pub current_function: Option<FunctionValue<'a>>,
    /// Return type of `current_function`
    pub current_return: TypeTag,
    /// External `i32 printf(i8*, ...)` used by `print`
    pub printf: FunctionValue<'a>,

    pub options: CompilerOptions,
}

impl<'a> Compiler<'a> {
    pub fn new(context: &'a Context, options: CompilerOptions) -> Self {
        let module = context.create_module(&options.module_name);

        let format_type = context.i8_type().ptr_type(AddressSpace::default());
        let printf_type = context.i32_type().fn_type(&[format_type.into()], true);
        let printf = module.add_function("printf", printf_type, Some(Linkage::External));

        Compiler {
            module,
            builder: context.create_builder(),
            context,
            scopes: ScopeStack::new(),
            functions: HashMap::new(),
            loop_targets: None,
            current_function: None,
            current_return: TypeTag::Integer,
            printf,
            options,
        }
    }

    /// Returns the module as textual LLVM IR.
    pub fn emit_ir(&self) -> String {
        self.module.print_to_string().to_string()
    }

    /// Writes the module as textual LLVM IR.
    pub fn save_module_to_file(&self, output_file: &Path) -> io::Result<()> {
        fs::write(output_file, self.emit_ir())
    }

    /// Converts a type tag to the LLVM type used to store it.
    ///
    /// Integer and Char are `i32`, Float is `f32`, Boolean is `i1` and String
    /// is `i8*`. `Void` has no storage and unknown names are rejected.
    pub fn convert_type(&self, tag: &TypeTag, span: &Span) -> Result<BasicTypeEnum<'a>, Error> {
        match tag {
            TypeTag::Integer | TypeTag::Char => Ok(self.context.i32_type().into()),
            TypeTag::Float => Ok(self.context.f32_type().into()),
            TypeTag::Boolean => Ok(self.context.bool_type().into()),
            TypeTag::String => Ok(self
                .context
                .i8_type()
                .ptr_type(AddressSpace::default())
                .into()),
            TypeTag::Void => Err(Error::new(
                ErrorImpl::TypeMismatch {
                    expected: String::from("a value type"),
                    received: tag.to_string(),
                },
                span.start.clone(),
            )),
            TypeTag::Identifier(name) => Err(Error::new(
                ErrorImpl::UnknownType {
                    type_: name.clone(),
                },
                span.start.clone(),
            )),
        }
    }

    /// Storage type for a declaration, `[N x T]` when sized.
    pub fn storage_type(
        &self,
        tag: &TypeTag,
        array_size: Option<u32>,
        span: &Span,
    ) -> Result<BasicTypeEnum<'a>, Error> {
        let element = self.convert_type(tag, span)?;

        Ok(match array_size {
            Some(size) => element.array_type(size).into(),
            None => element,
        })
    }

    /// Zero of the storage type, used for declarations without initializer.
    pub fn zero_value(
        &self,
        tag: &TypeTag,
        array_size: Option<u32>,
        span: &Span,
    ) -> Result<BasicValueEnum<'a>, Error> {
        let element = self.convert_type(tag, span)?;

        if let Some(size) = array_size {
            return Ok(element.array_type(size).const_zero().into());
        }

        match element {
            BasicTypeEnum::IntType(int) => Ok(int.const_zero().into()),
            BasicTypeEnum::FloatType(float) => Ok(float.const_zero().into()),
            BasicTypeEnum::PointerType(pointer) => Ok(pointer.const_null().into()),
            other => Err(Error::new(
                ErrorImpl::TypeMismatch {
                    expected: tag.to_string(),
                    received: type_name(other),
                },
                span.start.clone(),
            )),
        }
    }

    pub fn fn_type(
        &self,
        parameters: &[TypeTag],
        return_type: &TypeTag,
        span: &Span,
    ) -> Result<FunctionType<'a>, Error> {
        let params = parameters
            .iter()
            .map(|tag| self.convert_type(tag, span).map(BasicMetadataTypeEnum::from))
            .collect::<Result<Vec<BasicMetadataTypeEnum<'a>>, Error>>()?;

        Ok(match return_type {
            TypeTag::Void => self.context.void_type().fn_type(&params, false),
            tag => self.convert_type(tag, span)?.fn_type(&params, false),
        })
    }

    /// Adds the prototype of a function to the module and the function table.
    pub fn declare_function(&mut self, decl: &FnDeclStmt, span: &Span) -> Result<(), Error> {
        if decl.identifier == "main" || self.functions.contains_key(&decl.identifier) {
            return Err(Error::new(
                ErrorImpl::FunctionAlreadyDeclared {
                    function: decl.identifier.clone(),
                },
                span.start.clone(),
            ));
        }

        let parameters: Vec<TypeTag> = decl.parameters.iter().map(|(_, tag)| tag.clone()).collect();
        let function_type = self.fn_type(&parameters, &decl.return_type, span)?;
        let value = self.module.add_function(&decl.identifier, function_type, None);

        debug!(function = %decl.identifier, arity = parameters.len(), "declared function");

        self.functions.insert(
            decl.identifier.clone(),
            FunctionSignature {
                value,
                parameters,
                return_type: decl.return_type.clone(),
            },
        );

        Ok(())
    }

    pub fn current_function(&self) -> Result<FunctionValue<'a>, Error> {
        self.current_function.ok_or_else(|| {
            Error::new(
                ErrorImpl::Builder {
                    message: String::from("no function is being lowered"),
                },
                Position::null(),
            )
        })
    }

    /// Allocates stack storage at the top of the current function's entry block.
    pub fn create_entry_block_alloca(
        &self,
        ty: BasicTypeEnum<'a>,
        name: &str,
    ) -> Result<PointerValue<'a>, Error> {
        let function = self.current_function()?;
        let entry = function.get_first_basic_block().ok_or_else(|| {
            Error::new(
                ErrorImpl::Builder {
                    message: format!("function {:?} has no entry block", function.get_name()),
                },
                Position::null(),
            )
        })?;

        let builder = self.context.create_builder();
        match entry.get_first_instruction() {
            Some(instruction) => builder.position_before(&instruction),
            None => builder.position_at_end(entry),
        }

        Ok(builder.build_alloca(ty, name)?)
    }

    /// Pointer to a named, null-terminated format string, emitted once per module.
    pub fn format_string(&self, name: &str, text: &str) -> Result<PointerValue<'a>, Error> {
        match self.module.get_global(name) {
            Some(global) => Ok(self.builder.build_pointer_cast(
                global.as_pointer_value(),
                self.context.i8_type().ptr_type(AddressSpace::default()),
                name,
            )?),
            None => Ok(self
                .builder
                .build_global_string_ptr(text, name)?
                .as_pointer_value()),
        }
    }

    pub fn append_block(&self, name: &str) -> Result<BasicBlock<'a>, Error> {
        Ok(self
            .context
            .append_basic_block(self.current_function()?, name))
    }

    /// Whether the insertion block already ends in a terminator.
    pub fn is_terminated(&self) -> bool {
        self.builder
            .get_insert_block()
            .and_then(|block| block.get_terminator())
            .is_some()
    }

    /// Converts `value` to the storage type of `target`.
    ///
    /// The only implicit conversions are `i1 -> i32` (zext), `i32 -> f32`
    /// (sitofp) and `i1 -> f32` (uitofp).
    pub fn coerce(
        &self,
        value: BasicValueEnum<'a>,
        target: &TypeTag,
        span: &Span,
    ) -> Result<BasicValueEnum<'a>, Error> {
        let target_type = self.convert_type(target, span)?;
        if value.get_type() == target_type {
            return Ok(value);
        }

        match (value, target_type) {
            (BasicValueEnum::IntValue(int), BasicTypeEnum::IntType(int_type))
                if int.get_type().get_bit_width() == 1 && int_type.get_bit_width() == 32 =>
            {
                Ok(self.builder.build_int_z_extend(int, int_type, "zext")?.into())
            }
            (BasicValueEnum::IntValue(int), BasicTypeEnum::FloatType(float_type))
                if int.get_type().get_bit_width() == 1 =>
            {
                Ok(self
                    .builder
                    .build_unsigned_int_to_float(int, float_type, "uitofp")?
                    .into())
            }
            (BasicValueEnum::IntValue(int), BasicTypeEnum::FloatType(float_type))
                if int.get_type().get_bit_width() == 32 =>
            {
                Ok(self
                    .builder
                    .build_signed_int_to_float(int, float_type, "sitofp")?
                    .into())
            }
            _ => Err(Error::new(
                ErrorImpl::TypeMismatch {
                    expected: target.to_string(),
                    received: type_name(value.get_type()),
                },
                span.start.clone(),
            )),
        }
    }

    /// Tests a scalar for non-zero, producing an `i1`.
    pub fn to_bool(&self, value: BasicValueEnum<'a>, span: &Span) -> Result<IntValue<'a>, Error> {
        match value {
            BasicValueEnum::IntValue(int) if int.get_type().get_bit_width() == 1 => Ok(int),
            BasicValueEnum::IntValue(int) => Ok(self.builder.build_int_compare(
                IntPredicate::NE,
                int,
                int.get_type().const_zero(),
                "tobool",
            )?),
            BasicValueEnum::FloatValue(float) => Ok(self.builder.build_float_compare(
                FloatPredicate::ONE,
                float,
                float.get_type().const_zero(),
                "tobool",
            )?),
            BasicValueEnum::PointerValue(pointer) => {
                Ok(self.builder.build_is_not_null(pointer, "tobool")?)
            }
            other => Err(Error::new(
                ErrorImpl::TypeMismatch {
                    expected: TypeTag::Boolean.to_string(),
                    received: type_name(other.get_type()),
                },
                span.start.clone(),
            )),
        }
    }

    fn finish_main(&mut self) -> Result<(), Error> {
        if !self.is_terminated() {
            self.builder
                .build_return(Some(&self.context.i32_type().const_zero()))?;
        }

        if self.options.verify {
            self.module.verify().map_err(|message| {
                Error::new(
                    ErrorImpl::InvalidModule {
                        message: message.to_string(),
                    },
                    Position::null(),
                )
            })?;
        }

        Ok(())
    }
}

/// Source-level name of an LLVM type, for diagnostics.
pub fn type_name(ty: BasicTypeEnum) -> String {
    match ty {
        BasicTypeEnum::IntType(int) if int.get_bit_width() == 1 => TypeTag::Boolean.to_string(),
        BasicTypeEnum::IntType(_) => TypeTag::Integer.to_string(),
        BasicTypeEnum::FloatType(_) => TypeTag::Float.to_string(),
        BasicTypeEnum::PointerType(_) => TypeTag::String.to_string(),
        BasicTypeEnum::ArrayType(array) => format!("array of {}", array.len()),
        other => format!("{:?}", other),
    }
}

/// Lowers a whole program into a fresh module.
///
/// Top-level functions are declared first so calls may precede definitions.
/// Every other top-level statement is lowered into a synthesized
/// `i32 main()`, which returns 0 unless the program returns explicitly.
pub fn compile<'a>(
    program: &[Stmt],
    context: &'a Context,
    options: &CompilerOptions,
) -> Result<Compiler<'a>, Error> {
    let mut compiler = Compiler::new(context, options.clone());

    info!(
        module = %options.module_name,
        statements = program.len(),
        "compiling module"
    );

    for stmt in program {
        if let StmtKind::FnDecl(decl) = &stmt.kind {
            compiler.declare_function(decl, &stmt.span)?;
        }
    }

    let main = compiler
        .module
        .add_function("main", context.i32_type().fn_type(&[], false), None);
    let entry = context.append_basic_block(main, "entry");
    compiler.builder.position_at_end(entry);
    compiler.current_function = Some(main);
    compiler.current_return = TypeTag::Integer;

    for stmt in program {
        // Code after a top-level return is dead, but functions still need bodies.
        if compiler.is_terminated() && !matches!(stmt.kind, StmtKind::FnDecl(_)) {
            continue;
        }
        gen_statement(&mut compiler, stmt)?;
    }

    compiler.finish_main()?;

    debug!(functions = compiler.functions.len(), "module complete");
    Ok(compiler)
}
