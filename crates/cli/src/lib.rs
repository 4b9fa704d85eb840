//! Command-line interface of `sdkgen`.

use clap::{CommandFactory, Parser, Subcommand};
use tracing_subscriber::EnvFilter;
use tracing_subscriber::prelude::*;

mod commands;
mod report;

#[derive(Parser)]
#[command(
    name = "sdkgen",
    version,
    about = "Generate the Unity C# SDK and WebGL jslib glue from TypeScript declarations"
)]
struct Cli {
    #[command(subcommand)]
    command: Option<Commands>,
}

#[derive(Subcommand)]
enum Commands {
    /// Generate C#, jslib and bridge files from a declaration corpus
    Generate(commands::generate::GenerateArgs),
    /// Format every C# file in a directory
    Format(commands::format::FormatArgs),
    /// Refresh or check the golden snapshots of generated files
    UpdateGolden(commands::golden::UpdateGoldenArgs),
}

/// Parse `args` (program name first) and run the command. Returns the
/// process exit code: 0 on success, 1 on failure, 2 on usage errors.
pub fn run(args: Vec<String>) -> i32 {
    match Cli::try_parse_from(args) {
        Ok(cli) => match cli.command {
            Some(Commands::Generate(args)) => commands::generate::run(args),
            Some(Commands::Format(args)) => commands::format::run(args),
            Some(Commands::UpdateGolden(args)) => commands::golden::run(args),
            None => {
                let mut cmd = Cli::command();
                let _ = cmd.print_help();
                println!();
                0
            }
        },
        Err(e) => {
            let code = e.exit_code();
            let _ = e.print();
            code
        }
    }
}

/// Install the stderr log subscriber.
///
/// `SDKGEN_LOG` takes a plain level ("debug") applied to the sdkgen crates,
/// or a full filter spec such as "sdkgen_core=trace,sdkgen_cli=info".
pub fn init_tracing() {
    let filter = match std::env::var("SDKGEN_LOG") {
        Ok(level) if is_plain_level(&level) => scoped_filter(&level),
        Ok(spec) => spec,
        Err(_) => scoped_filter("info"),
    };

    let fmt_layer = tracing_subscriber::fmt::layer()
        .with_writer(std::io::stderr)
        .with_target(true)
        .with_line_number(true)
        .with_file(true)
        .with_filter(EnvFilter::new(filter));

    if tracing_subscriber::registry()
        .with(fmt_layer)
        .try_init()
        .is_err()
    {
        eprintln!("Warning: tracing subscriber already initialized");
    }
}

fn scoped_filter(level: &str) -> String {
    format!("sdkgen_core={level},sdkgen_cli={level}")
}

fn is_plain_level(s: &str) -> bool {
    matches!(
        s.to_ascii_lowercase().as_str(),
        "trace" | "debug" | "info" | "warn" | "error"
    )
}
