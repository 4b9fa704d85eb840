use clap::Args;
use std::path::PathBuf;

use sdkgen_core::golden;

use super::{load_config, run_command};
use crate::report;

#[derive(Args, Debug, Clone)]
pub struct UpdateGoldenArgs {
    #[arg(long, value_name = "DIR", help = "Directory holding the generated files")]
    pub output: PathBuf,
    #[arg(long, value_name = "DIR", help = "Directory holding the .golden snapshots")]
    pub fixtures: PathBuf,
    #[arg(long, help = "Compare against the snapshots instead of updating them")]
    pub check: bool,
    #[arg(
        long = "file",
        value_name = "NAME",
        help = "File to snapshot, repeatable. Defaults to golden_files from the configuration"
    )]
    pub files: Vec<String>,
    #[arg(long, value_name = "FILE", help = "Configuration file. Defaults to ./sdkgen.toml")]
    pub config: Option<PathBuf>,
}

pub fn run(args: UpdateGoldenArgs) -> i32 {
    run_command(|| run_inner(args))
}

fn run_inner(args: UpdateGoldenArgs) -> Result<(), String> {
    let files = if args.files.is_empty() {
        load_config(args.config.as_deref())?.golden_files
    } else {
        args.files
    };

    if !args.check {
        let entries = golden::update(&args.output, &args.fixtures, &files)?;
        report::print_golden(&entries);
        return Ok(());
    }

    let entries = golden::check(&args.output, &args.fixtures, &files)?;
    report::print_golden(&entries);
    let failures = entries.iter().filter(|e| e.is_failure()).count();
    if failures > 0 {
        return Err(format!(
            "{failures} golden file(s) out of date; run `sdkgen update-golden` to refresh them"
        ));
    }
    Ok(())
}
