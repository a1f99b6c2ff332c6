use clap::{Args, Parser, Subcommand};
use frundis_engine::{Config, Context, TraceRenderer};
use std::path::{Path, PathBuf};

#[derive(Parser)]
#[command(name = "frundis")]
#[command(about = "frundis document compiler core")]
#[command(version)]
struct Cli {
    #[command(subcommand)]
    command: Command,
}

#[derive(Subcommand)]
enum Command {
    /// Run both passes and print the trace of renderer calls
    Trace {
        #[command(flatten)]
        opts: CompileOpts,
    },

    /// Report diagnostics without printing any output
    Check {
        #[command(flatten)]
        opts: CompileOpts,
    },

    /// Print the parsed blocks of a file as JSON
    Ast {
        /// Input .frundis file
        path: String,
    },

    /// Print a file in canonical form
    Fmt {
        /// Input .frundis file
        path: String,
    },
}

#[derive(Args)]
struct CompileOpts {
    /// Input .frundis file
    path: String,

    /// Format name matched by `-f` options
    #[arg(short = 'T', long, default_value = "trace")]
    target: String,

    /// Allow `.#run` and shell filters
    #[arg(short, long)]
    unrestricted: bool,

    /// Extra directory searched by `.If`
    #[arg(short = 'I', long = "include")]
    include_dirs: Vec<PathBuf>,
}

fn main() {
    env_logger::init();
    let cli = Cli::parse();

    match cli.command {
        Command::Trace { opts } => cmd_trace(&opts),
        Command::Check { opts } => cmd_check(&opts),
        Command::Ast { path } => cmd_ast(&path),
        Command::Fmt { path } => cmd_fmt(&path),
    }
}

fn read_source(path: &str) -> String {
    let p = Path::new(path);
    if !p.exists() {
        eprintln!("Error: file not found: {path}");
        std::process::exit(1);
    }
    match std::fs::read_to_string(p) {
        Ok(source) => source,
        Err(e) => {
            eprintln!("Error reading {path}: {e}");
            std::process::exit(1);
        }
    }
}

fn parse(path: &str) -> frundis_parser::Document {
    let source = read_source(path);
    match frundis_parser::Parser::parse(&source) {
        Ok(doc) => doc,
        Err(e) => {
            eprintln!("{path}: {e}");
            std::process::exit(1);
        }
    }
}

fn compile(opts: &CompileOpts) -> (String, Context) {
    let mut config = Config::from_env().unrestricted(opts.unrestricted);
    for dir in &opts.include_dirs {
        config = config.include_dir(dir);
    }
    let mut renderer = TraceRenderer::with_format(&opts.target);
    match frundis_engine::compile(&opts.path, config, &mut renderer) {
        Ok(result) => result,
        Err(e) => {
            eprintln!("Error: {e}");
            std::process::exit(1);
        }
    }
}

fn print_diagnostics(ctx: &Context) {
    for diagnostic in ctx.diagnostics().iter() {
        eprintln!("frundis: {diagnostic}");
    }
}

fn cmd_trace(opts: &CompileOpts) {
    let (output, ctx) = compile(opts);
    print_diagnostics(&ctx);
    print!("{output}");
}

fn cmd_check(opts: &CompileOpts) {
    let (_, ctx) = compile(opts);
    print_diagnostics(&ctx);
    if !ctx.diagnostics().is_empty() {
        std::process::exit(1);
    }
    eprintln!("OK: {}", opts.path);
}

fn cmd_ast(path: &str) {
    let doc = parse(path);
    for warning in &doc.warnings {
        eprintln!("{path}:{}:{}: {}", warning.line, warning.column, warning.message);
    }
    match serde_json::to_string_pretty(&doc.blocks) {
        Ok(json) => println!("{json}"),
        Err(e) => {
            eprintln!("Error: {e}");
            std::process::exit(1);
        }
    }
}

fn cmd_fmt(path: &str) {
    let doc = parse(path);
    print!("{}", frundis_parser::print_blocks(&doc.blocks));
}
