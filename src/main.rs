use clap::Parser;
use smartbugs_orchestrator::cli::Cli;
use std::process;

fn main() {
    if let Err(e) = run() {
        eprintln!("Error: {}", e);
        process::exit(1);
    }
}

fn run() -> smartbugs_orchestrator::Result<()> {
    let cli = Cli::parse();

    // Initialize logging
    cli.init_logging();

    smartbugs_orchestrator::run_command(cli)
}
