use clap::Parser;
use tradequery::cli::{Cli, run};

fn main() -> std::process::ExitCode {
    run(Cli::parse())
}
