pub mod format;
pub mod generate;
pub mod golden;

use std::path::{Path, PathBuf};

use sdkgen_core::config::Config;

/// Exit code of a command body.
pub fn run_command<F>(f: F) -> i32
where
    F: FnOnce() -> Result<(), String>,
{
    match f() {
        Ok(()) => 0,
        Err(err) => {
            eprintln!("{}", console::style(err).red());
            1
        }
    }
}

/// `--config` when given, else `sdkgen.toml` in the working directory.
pub fn load_config(explicit: Option<&Path>) -> Result<Config, String> {
    let cwd = std::env::current_dir().unwrap_or_else(|_| PathBuf::from("."));
    Config::discover(explicit, &cwd)
}
