use clap::Args;
use std::path::PathBuf;

use super::{load_config, run_command};

#[derive(Args, Debug, Clone)]
pub struct FormatArgs {
    #[arg(value_name = "DIR", help = "Directory whose .cs files are formatted in place")]
    pub dir: PathBuf,
    #[arg(long, value_name = "FILE", help = "Configuration file. Defaults to ./sdkgen.toml")]
    pub config: Option<PathBuf>,
}

pub fn run(args: FormatArgs) -> i32 {
    run_command(|| run_inner(args))
}

fn run_inner(args: FormatArgs) -> Result<(), String> {
    if !args.dir.is_dir() {
        return Err(format!("Directory not found: {}", args.dir.display()));
    }
    let config = load_config(args.config.as_deref())?;
    let changed = sdkgen_core::format_directory(&args.dir, &config.formatter.formatter())
        .map_err(|e| format!("Formatting failed: {e}"))?;
    println!("Formatted {changed} file(s) in {}", args.dir.display());
    Ok(())
}
