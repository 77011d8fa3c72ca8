// lemonc: front end for the Lemon language

use clap::Parser;
use std::io::{self, IsTerminal};
use std::path::PathBuf;
use std::process;
use tracing::error;
use tracing_subscriber::EnvFilter;

use lemonc::parser::source::{ScanOptions, DEFAULT_CHANNEL_CAPACITY};
use lemonc::report;
use lemonc::resolver::{self, ErrorCategory, FsLoader, Program, ResolveOptions};

#[derive(Parser, Debug)]
#[command(name = "lemonc")]
#[command(about = "Parse a Lemon program and resolve its imports", long_about = None)]
struct Cli {
    /// Root source file
    file: PathBuf,

    /// Print every token as the parser receives it
    #[arg(long)]
    print_tokens: bool,

    /// Print the resolved module order
    #[arg(long)]
    print_order: bool,

    /// Print the resolved modules as JSON
    #[arg(long)]
    print_ast: bool,

    /// Print the options in effect
    #[arg(long)]
    print_options: bool,

    /// Scan each file on its own thread
    #[arg(long)]
    threaded_scan: bool,

    /// Tokens buffered between scanner thread and parser
    #[arg(long, default_value_t = DEFAULT_CHANNEL_CAPACITY)]
    channel_capacity: usize,

    /// Verbose logging
    #[arg(short, long)]
    verbose: bool,
}

impl Cli {
    fn resolve_options(&self) -> ResolveOptions {
        ResolveOptions {
            scan: ScanOptions {
                threaded: self.threaded_scan,
                echo_tokens: self.print_tokens,
                channel_capacity: self.channel_capacity,
            },
        }
    }
}

fn exit_code(category: ErrorCategory) -> i32 {
    match category {
        ErrorCategory::File => 1,
        ErrorCategory::Parse => 2,
        ErrorCategory::Cycle => 3,
    }
}

fn main() {
    let cli = Cli::parse();

    // Initialize logging
    let filter = if cli.verbose { "debug" } else { "warn" };
    tracing_subscriber::fmt()
        .with_env_filter(
            EnvFilter::try_from_default_env().unwrap_or_else(|_| EnvFilter::new(filter)),
        )
        .with_writer(io::stderr)
        .init();

    let options = cli.resolve_options();
    if cli.print_options {
        println!("{:#?}", options);
    }

    let (loader, root) = FsLoader::for_file(&cli.file);
    let color = io::stderr().is_terminal();

    match resolver::resolve(&loader, &root, &options) {
        Ok(program) => {
            if let Err(code) = print_program(&cli, &program) {
                process::exit(code);
            }
        }
        Err(err) => {
            eprintln!("{}", report::render_resolve_error(&err, color));
            process::exit(exit_code(err.category()));
        }
    }
}

fn print_program(cli: &Cli, program: &Program) -> Result<(), i32> {
    if cli.print_order {
        for module in &program.modules {
            println!("{}", module.name);
        }
    }

    if cli.print_ast {
        match serde_json::to_string_pretty(program) {
            Ok(json) => println!("{}", json),
            Err(e) => {
                error!("cannot serialize AST: {}", e);
                return Err(4);
            }
        }
    }

    Ok(())
}
