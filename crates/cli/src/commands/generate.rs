use clap::Args;
use std::path::PathBuf;
use std::time::Instant;
use tracing::debug;

use sdkgen_core::config::Config;
use sdkgen_core::formatter::Formatter;
use sdkgen_core::{GenerateError, GenerateOptions};

use super::{load_config, run_command};
use crate::report;

#[derive(Args, Debug, Clone)]
pub struct GenerateArgs {
    #[arg(long, value_name = "DIR", help = "Root of the .d.ts declaration corpus")]
    pub source: PathBuf,
    #[arg(long, value_name = "DIR", help = "Directory receiving AIT*.cs and Plugins/")]
    pub output: PathBuf,
    #[arg(
        long = "bridge-output",
        value_name = "FILE",
        help = "Path of the bridge exposure file. Defaults to <output>/unity-bridge.ts"
    )]
    pub bridge_output: Option<PathBuf>,
    #[arg(long = "manual-templates", value_name = "DIR", help = "Directory of hand-written API overrides")]
    pub manual_templates: Option<PathBuf>,
    #[arg(long = "include-deprecated", help = "Generate @deprecated APIs too")]
    pub include_deprecated: bool,
    #[arg(long = "no-format", help = "Skip the external C# formatter")]
    pub no_format: bool,
    #[arg(long, value_name = "FILE", help = "Configuration file. Defaults to ./sdkgen.toml")]
    pub config: Option<PathBuf>,
    #[arg(long, value_name = "TAG", help = "Web framework version recorded in generated headers")]
    pub tag: Option<String>,
}

pub fn run(args: GenerateArgs) -> i32 {
    run_command(|| run_inner(args))
}

fn run_inner(args: GenerateArgs) -> Result<(), String> {
    let started = Instant::now();
    let config = load_config(args.config.as_deref())?;
    let options = resolve_options(args, &config);
    debug!(?options, "Resolved generation options");

    println!(
        "Generating SDK from {} into {}",
        options.source.display(),
        options.output.display()
    );
    match sdkgen_core::generate(&options) {
        Ok(generated) => {
            report::print_generate(&generated);
            println!(
                "{} in {:.1}s",
                console::style("Generation complete").green().bold(),
                started.elapsed().as_secs_f64()
            );
            Ok(())
        }
        Err(GenerateError::Validation(validation)) => {
            report::print_validation(&validation);
            Err(format!(
                "Generation failed: {} validation error(s), nothing was written",
                validation.result.errors.len()
            ))
        }
        Err(err) => Err(format!("Generation failed: {err}")),
    }
}

/// Flags override the configuration file.
fn resolve_options(args: GenerateArgs, config: &Config) -> GenerateOptions {
    let mut options = GenerateOptions::from_config(args.source, args.output, config);
    options.bridge_output = args.bridge_output;
    if args.manual_templates.is_some() {
        options.manual_templates = args.manual_templates;
    }
    options.include_deprecated |= args.include_deprecated;
    if let Some(tag) = args.tag {
        options.tag = tag;
    }
    if args.no_format {
        options.formatter = Formatter::disabled();
    }
    options
}
