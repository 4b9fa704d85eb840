//! `sdkgen` executable.

fn main() {
    sdkgen_cli::init_tracing();
    let code = sdkgen_cli::run(std::env::args().collect());
    std::process::exit(code);
}
