use std::{
    fs::{self, read_to_string},
    path::PathBuf,
    process::ExitCode,
    time::Instant,
};

use basiq::{
    ast::ast::repr,
    compiler::compiler::{compile, CompilerOptions},
    display_error,
    errors::errors::Error,
    lexer::lexer::tokenize,
    parser::parser::parse,
};
use clap::{ArgAction, Parser as ClapParser};
use inkwell::context::Context;
use tracing::{info, Level};

#[derive(ClapParser, Debug)]
#[command(name = "basiq")]
#[command(about = "Compiles a basiq source file to LLVM IR", long_about = None)]
struct Args {
    /// Source file to compile
    input: PathBuf,

    /// Output file, defaults to the input with an `.ll` extension
    #[arg(short, long)]
    output: Option<PathBuf>,

    /// Print the generated IR to stdout
    #[arg(long)]
    print_ir: bool,

    /// Print the parsed program to stdout
    #[arg(long)]
    print_ast: bool,

    /// Skip LLVM module verification
    #[arg(long)]
    no_verify: bool,

    /// Increase log verbosity (-v info, -vv debug, -vvv trace)
    #[arg(short, long, action = ArgAction::Count)]
    verbose: u8,
}

fn main() -> ExitCode {
    let args = Args::parse();

    let level = match args.verbose {
        0 => Level::WARN,
        1 => Level::INFO,
        2 => Level::DEBUG,
        _ => Level::TRACE,
    };
    tracing_subscriber::fmt()
        .with_target(false)
        .with_max_level(level)
        .with_writer(std::io::stderr)
        .init();

    let source = match read_to_string(&args.input) {
        Ok(source) => source,
        Err(error) => {
            eprintln!("Error: failed to read {}: {}", args.input.display(), error);
            return ExitCode::FAILURE;
        }
    };

    let ir = match run(&args, source.clone()) {
        Ok(ir) => ir,
        Err(error) => {
            display_error(&error, &source);
            return ExitCode::FAILURE;
        }
    };

    let output = args
        .output
        .clone()
        .unwrap_or_else(|| args.input.with_extension("ll"));

    if let Err(error) = fs::write(&output, ir) {
        eprintln!("Error: failed to write {}: {}", output.display(), error);
        return ExitCode::FAILURE;
    }

    info!(output = %output.display(), "wrote module");
    ExitCode::SUCCESS
}

/// Runs the pipeline and returns the module as textual IR.
fn run(args: &Args, source: String) -> Result<String, Error> {
    let file_name = args
        .input
        .file_name()
        .map(|name| name.to_string_lossy().into_owned())
        .unwrap_or_else(|| args.input.display().to_string());

    let start = Instant::now();

    let tokens = tokenize(source, Some(file_name.clone()))?;
    info!(tokens = tokens.len(), elapsed = ?start.elapsed(), "tokenized");

    let parse_start = Instant::now();
    let program = parse(tokens)?;
    info!(statements = program.len(), elapsed = ?parse_start.elapsed(), "parsed");

    if args.print_ast {
        println!("{}", repr(&program));
    }

    let options = CompilerOptions {
        module_name: file_name,
        verify: !args.no_verify,
    };

    let compile_start = Instant::now();
    let context = Context::create();
    let compiler = compile(&program, &context, &options)?;
    info!(elapsed = ?compile_start.elapsed(), "generated IR");

    let ir = compiler.emit_ir();
    if args.print_ir {
        print!("{}", ir);
    }

    info!(total = ?start.elapsed(), "compiled");
    Ok(ir)
}
