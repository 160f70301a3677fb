use clap::{Parser as ClapParser, Subcommand};
use std::io::{self, Read};
use thyme_query::{
    Strategy,
    cli::{self, CheckOptions, CheckResult, CliError, EvalOptions},
    output::{to_json, to_json_pretty},
};

#[derive(ClapParser)]
#[command(name = "thyme")]
#[command(about = "Thyme - evaluate expressions against a JSON context")]
#[command(version)]
struct Cli {
    #[command(subcommand)]
    command: Commands,
}

#[derive(Subcommand)]
enum Commands {
    /// Evaluate a query and print the result as JSON
    Eval {
        /// The query to evaluate
        query: String,

        /// JSON object used as context (reads from stdin if not provided)
        #[arg(short, long)]
        context: Option<String>,

        /// Execution strategy: interpret or compile
        #[arg(short, long, default_value_t = Strategy::Interpret)]
        strategy: Strategy,

        /// Pretty-print the output
        #[arg(short, long)]
        pretty: bool,

        /// Do not register the standard functions
        #[arg(long)]
        no_builtins: bool,
    },

    /// Validate query syntax without evaluating it
    Check {
        /// The query to validate
        query: String,

        /// Print the parsed AST
        #[arg(long)]
        ast: bool,
    },

    /// Print the compiled listing of a query
    Explain {
        /// The query to compile
        query: String,
    },
}

/// Installs a stderr subscriber when `RUST_LOG` is set.
fn init_tracing() {
    use tracing_subscriber::{EnvFilter, fmt, prelude::*};

    if std::env::var("RUST_LOG").is_ok() {
        tracing_subscriber::registry()
            .with(fmt::layer().with_writer(io::stderr).with_target(true))
            .with(EnvFilter::from_default_env())
            .init();
    }
}

fn main() {
    init_tracing();
    let cli = Cli::parse();

    let result = match cli.command {
        Commands::Eval {
            query,
            context,
            strategy,
            pretty,
            no_builtins,
        } => run_eval(query, context, strategy, pretty, !no_builtins),
        Commands::Check { query, ast } => run_check(query, ast),
        Commands::Explain { query } => cli::explain(&query).map(|listing| println!("{}", listing)),
    };

    if let Err(e) = result {
        eprintln!("{}", e);
        std::process::exit(1);
    }
}

fn run_eval(
    query: String,
    context: Option<String>,
    strategy: Strategy,
    pretty: bool,
    builtins: bool,
) -> Result<(), CliError> {
    let context = match context {
        Some(s) => Some(s),
        None if !atty::is(atty::Stream::Stdin) => {
            let mut buffer = String::new();
            io::stdin().read_to_string(&mut buffer)?;
            Some(buffer)
        }
        None => None,
    };

    let options = EvalOptions {
        query,
        context,
        strategy,
        builtins,
    };

    let value = cli::execute_eval(&options)?;
    if pretty {
        println!("{}", to_json_pretty(&value));
    } else {
        println!("{}", to_json(&value));
    }
    Ok(())
}

fn run_check(query: String, ast: bool) -> Result<(), CliError> {
    match cli::execute_check(&CheckOptions { query, ast })? {
        CheckResult::SyntaxValid => println!("Syntax is valid"),
        CheckResult::Ast(node) => println!("{:#?}", node),
    }
    Ok(())
}
