//! Tack compiler binary.

use std::process;

use tack::args::Args;
use tack::compiler::driver;
use tack::print_err;

use tracing_subscriber::EnvFilter;

fn main() {
    let args = Args::parse();

    // `-v` raises the default filter; an explicit RUST_LOG still wins.
    let default_filter = if args.verbose { "tack=debug" } else { "warn" };
    tracing_subscriber::fmt()
        .with_env_filter(
            EnvFilter::try_from_default_env().unwrap_or_else(|_| EnvFilter::new(default_filter)),
        )
        .with_writer(std::io::stderr)
        .init();

    if let Err(err) = driver::run(&args) {
        print_err!(&args.program, "{err}");
        process::exit(1);
    }
}
