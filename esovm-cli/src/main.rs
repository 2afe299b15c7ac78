//! # esovm CLI
//!
//! Command-line interface for running esoteric programs.
//!
//! Usage:
//!   esovm run <language> <file> [--input TEXT] [options]
//!   esovm schema [language] [--json]
//!   esovm languages
//!
//! Examples:
//!   esovm run bf hello.b
//!   esovm run befunge quine.bf --dialect 98 --wrap
//!   esovm run piet hello.ppm --codel-size 10 --trace path.ppm -v

use clap::{ArgAction, Args, Parser, Subcommand};
use esovm_vm::{Dialect, ExecutionResult, Language, Options, PixelGrid, VmSchema};
use log::{debug, LevelFilter};
use std::fs;
use std::path::{Path, PathBuf};
use std::process::ExitCode;
use thiserror::Error;

#[derive(Parser)]
#[command(name = "esovm")]
#[command(author, version, about = "esovm - five esoteric machines, one lifecycle")]
struct Cli {
    #[command(subcommand)]
    command: Commands,

    /// Verbosity: -v prints the state snapshot, -vv debug logs, -vvv trace logs
    #[arg(short, long, global = true, action = ArgAction::Count)]
    verbose: u8,
}

#[derive(Subcommand)]
enum Commands {
    /// Run a program
    Run(RunArgs),
    /// Show the instruction reference
    Schema {
        /// Only this language
        language: Option<String>,

        /// Print JSON instead of markdown
        #[arg(long)]
        json: bool,
    },
    /// List supported languages and their aliases
    Languages,
}

#[derive(Args, Debug, Default)]
struct RunArgs {
    /// Language name or alias (bf, befunge, malbolge, ws, piet, ...)
    language: String,

    /// Program file; geometric programs are PPM images
    file: PathBuf,

    /// Program input
    #[arg(short, long, conflicts_with = "input_file")]
    input: Option<String>,

    /// Read program input from a file
    #[arg(long)]
    input_file: Option<PathBuf>,

    /// JSON file with run options; flags override it
    #[arg(short, long)]
    config: Option<PathBuf>,

    /// Fault on characters that are not instructions (tape)
    #[arg(long)]
    strict: bool,

    /// Canonicalise the source before parsing
    #[arg(long)]
    normalize: bool,

    /// Grid dialect: 93 or 98
    #[arg(long)]
    dialect: Option<String>,

    /// Wrap around the grid edges instead of halting (grid)
    #[arg(long)]
    wrap: bool,

    /// Pixels per codel side (geometric)
    #[arg(long)]
    codel_size: Option<u32>,

    /// Write a trace image of the execution path here (geometric)
    #[arg(long)]
    trace: Option<PathBuf>,

    /// Seed for the random direction instruction (grid)
    #[arg(long)]
    seed: Option<u64>,

    #[arg(long)]
    max_cycles: Option<u64>,

    #[arg(long)]
    max_time_ms: Option<u64>,

    #[arg(long)]
    max_output: Option<usize>,
}

/// Errors the CLI reports before or around a run
#[derive(Debug, Error)]
enum CliError {
    #[error("cannot read {path}: {source}")]
    Read {
        path: PathBuf,
        #[source]
        source: std::io::Error,
    },

    #[error("cannot write {path}: {source}")]
    Write {
        path: PathBuf,
        #[source]
        source: std::io::Error,
    },

    #[error("{0}")]
    Vm(String),
}

impl From<esovm_error::Error> for CliError {
    fn from(err: esovm_error::Error) -> Self {
        CliError::Vm(err.annotation())
    }
}

fn init_logging(verbose: u8) {
    let mut builder = env_logger::Builder::from_default_env();
    builder.format_timestamp(None);
    match verbose {
        0 | 1 => {}
        2 => {
            builder.filter(None, LevelFilter::Debug);
        }
        _ => {
            builder.filter(None, LevelFilter::Trace);
        }
    }
    let _ = builder.try_init();
}

fn read_text(path: &Path) -> Result<String, CliError> {
    fs::read_to_string(path).map_err(|source| CliError::Read {
        path: path.to_path_buf(),
        source,
    })
}

/// Layer the config file, then flags, over the defaults
fn build_options(args: &RunArgs, verbose: u8) -> Result<Options, CliError> {
    let mut options = match &args.config {
        Some(path) => Options::from_json(&read_text(path)?)?,
        None => Options::default(),
    };
    options.debug = options.debug.max(verbose);
    options.strict |= args.strict;
    options.normalize |= args.normalize;
    options.wrap |= args.wrap;
    if let Some(dialect) = &args.dialect {
        options.dialect = dialect.parse::<Dialect>()?;
    }
    if let Some(size) = args.codel_size {
        options.codel_size = size;
    }
    if args.trace.is_some() {
        options.trace = true;
    }
    if let Some(seed) = args.seed {
        options.seed = Some(seed);
    }
    if let Some(max) = args.max_cycles {
        options.max_cycles = max;
    }
    if let Some(max) = args.max_time_ms {
        options.max_time_ms = max;
    }
    if let Some(max) = args.max_output {
        options.max_output = max;
    }
    options.validate()?;
    Ok(options)
}

fn read_input(args: &RunArgs) -> Result<String, CliError> {
    match (&args.input, &args.input_file) {
        (Some(input), _) => Ok(input.clone()),
        (None, Some(path)) => read_text(path),
        (None, None) => Ok(String::new()),
    }
}

/// Load and run a program. Syntax errors come back as `Err`; faults are on
/// the result.
fn execute(args: &RunArgs, verbose: u8) -> Result<ExecutionResult, CliError> {
    let language: Language = args.language.parse()?;
    let options = build_options(args, verbose)?;
    let input = read_input(args)?;
    debug!("running {} program {}", language, args.file.display());

    if language.is_text() {
        let source = read_text(&args.file)?;
        Ok(language.run_source(&source, &input, &options)?)
    } else {
        let bytes = fs::read(&args.file).map_err(|source| CliError::Read {
            path: args.file.clone(),
            source,
        })?;
        let pixels = PixelGrid::from_ppm(&bytes)?;
        Ok(Language::run_pixels(&pixels, &input, &options)?)
    }
}

fn run_program(args: &RunArgs, verbose: u8) -> Result<bool, CliError> {
    let result = execute(args, verbose)?;
    println!("{}", result.report());

    if verbose > 0 {
        if let Some(snapshot) = &result.snapshot {
            println!("{}", snapshot.to_json());
        }
    }
    if let (Some(path), Some(trace)) = (&args.trace, &result.trace) {
        fs::write(path, trace.to_ppm()).map_err(|source| CliError::Write {
            path: path.clone(),
            source,
        })?;
        debug!("trace written to {}", path.display());
    } else if args.trace.is_some() {
        eprintln!("No trace image: the path was too long to render or the language has no trace");
    }
    Ok(result.is_ok())
}

fn show_schema(language: Option<&str>, json: bool) -> Result<(), CliError> {
    let schema = match language {
        Some(name) => VmSchema::for_language(name.parse()?),
        None => VmSchema::new(),
    };
    if json {
        println!("{}", schema.to_json());
    } else {
        println!("{}", schema.to_markdown());
    }
    Ok(())
}

fn list_languages() {
    for language in Language::ALL {
        println!(
            "{:<10} {:<11} aliases: {}",
            language.name(),
            language.dialect_name(),
            language.aliases().join(", ")
        );
    }
}

fn main() -> ExitCode {
    let cli = Cli::parse();
    init_logging(cli.verbose);

    let outcome = match cli.command {
        Commands::Run(args) => run_program(&args, cli.verbose),
        Commands::Schema { language, json } => show_schema(language.as_deref(), json).map(|_| true),
        Commands::Languages => {
            list_languages();
            Ok(true)
        }
    };

    match outcome {
        Ok(true) => ExitCode::SUCCESS,
        Ok(false) => ExitCode::FAILURE,
        Err(e) => {
            eprintln!("Error: {}", e);
            ExitCode::FAILURE
        }
    }
}
