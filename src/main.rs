//! Leech CLI entry point.

use clap::Parser;
use leech::cli::{self, Cli, EXIT_ERROR};

fn main() {
    let cli = Cli::parse();
    cli::init_logging(cli.verbose);

    let exit_code = match cli::run(&cli) {
        Ok(code) => code,
        Err(e) => {
            log::error!("{:#}", e);
            EXIT_ERROR
        }
    };

    std::process::exit(exit_code);
}
