//! CLI front end: parses flags, drives the library, prints diagnostics.
//!
//! Diagnostics are always written to stdout (spec §7) — `tracing` to
//! stderr is the only exception, and only at `-v`/`-vv`.

use std::fs;
use std::path::PathBuf;
use std::process;

use clap::Parser as ClapParser;

use subc::config::{CompilerConfig, FileConfig};
use subc::render;

/// Translate a `.sub` source file into portable C.
#[derive(ClapParser)]
#[command(name = "subc")]
#[command(version = env!("CARGO_PKG_VERSION"))]
#[command(about = "Translate a low-level systems-language subset into C", long_about = None)]
struct Cli {
    /// Input source file
    input: PathBuf,

    /// Output .c file (defaults to the input stem with a .c extension)
    #[arg(short = 'o', long = "output")]
    output: Option<PathBuf>,

    /// Directory holding prelude.h, used instead of the builtin include set
    #[arg(long = "lib")]
    lib: Option<PathBuf>,

    /// Dump the token stream instead of compiling
    #[arg(long = "tokens")]
    tokens: bool,

    /// Dump the parsed AST instead of compiling
    #[arg(long = "ast")]
    ast: bool,

    /// Dump the lowered IR instead of compiling
    #[arg(long = "ir")]
    ir: bool,

    /// Print memory/size statistics to stdout before writing output
    #[arg(long = "report")]
    report: bool,

    /// Parse and lower but do not write the generated C file
    #[arg(long = "no-emit-bin")]
    no_emit_bin: bool,

    /// Load defaults from a compiler.toml; CLI flags still win
    #[arg(long = "config")]
    config: Option<PathBuf>,

    /// Increase log verbosity (-v info, -vv debug)
    #[arg(short = 'v', action = clap::ArgAction::Count)]
    verbose: u8,
}

fn main() {
    let cli = Cli::parse();
    init_logging(cli.verbose);

    if let Err(err) = run(&cli) {
        println!("{err}");
        process::exit(1);
    }
}

fn init_logging(verbose: u8) {
    let level = match verbose {
        0 => "warn",
        1 => "info",
        _ => "debug",
    };
    let filter = tracing_subscriber::EnvFilter::try_from_default_env()
        .unwrap_or_else(|_| tracing_subscriber::EnvFilter::new(level));
    tracing_subscriber::fmt()
        .with_env_filter(filter)
        .with_writer(std::io::stderr)
        .init();
}

fn run(cli: &Cli) -> Result<(), subc::diagnostics::CompileError> {
    if cli.tokens {
        let (src, tokens) = subc::tokenize_file(&cli.input)?;
        print!("{}", render::render_tokens(&tokens, &src));
        return Ok(());
    }

    let text = fs::read_to_string(&cli.input)?;

    if cli.ast {
        let parsed = subc::parse_source(&cli.input, text)?;
        print!("{}", render::render_ast(&parsed.ast, parsed.root, &parsed.strings));
        return Ok(());
    }
    if cli.ir {
        let lowered = subc::lower_source(&cli.input, text)?;
        print!("{}", render::render_ir(&lowered.ir, &lowered.strings));
        return Ok(());
    }

    let default_output = cli.input.with_extension("c");
    let mut config = CompilerConfig::new(default_output);

    if let Some(config_path) = &cli.config {
        let config_text = fs::read_to_string(config_path)?;
        config.merge_file_defaults(FileConfig::from_toml(&config_text)?);
    }
    if let Some(output) = &cli.output {
        config.output = output.clone();
    }
    if let Some(lib) = &cli.lib {
        config.lib_dir = Some(lib.clone());
    }
    if cli.report {
        config.report = true;
    }
    if cli.no_emit_bin {
        config.no_emit_bin = true;
    }
    if !config.no_emit_bin && cli.output.is_none() && cli.config.is_none() {
        return Err(subc::diagnostics::CompileError::semantic(
            "-o is required unless -no-emit-bin is set",
        ));
    }
    if !config.no_emit_bin && config.lib_dir.is_none() {
        return Err(subc::diagnostics::CompileError::semantic(
            "-lib is required unless -no-emit-bin is set",
        ));
    }

    tracing::info!(input = %cli.input.display(), output = %config.output.display(), "starting compile");

    let lowered = subc::lower_source(&cli.input, text)?;

    if config.report {
        println!(
            "{}: {} function(s), {} block(s)",
            cli.input.display(),
            lowered.ir.funcs.len(),
            lowered.ir.funcs.iter().map(|f| f.blocks.len()).sum::<usize>()
        );
    }

    if config.no_emit_bin {
        return Ok(());
    }

    let prelude = match &config.lib_dir {
        Some(dir) => Some(fs::read_to_string(dir.join("prelude.h"))?),
        None => None,
    };
    let binary_name = env!("CARGO_PKG_NAME");
    let version = env!("CARGO_PKG_VERSION");
    let c_source = subc::codegen::CodeGen::new(&lowered.types).emit_program(
        &lowered.ir,
        &lowered.strings,
        binary_name,
        version,
        prelude.as_deref(),
    )?;
    fs::write(&config.output, c_source)?;

    Ok(())
}
