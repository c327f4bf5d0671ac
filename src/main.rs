//! Codedoc CLI entry point.

use clap::Parser;
use codedoc::cli::{self, Cli, Commands, EXIT_ERROR};

fn main() {
    let cli = Cli::parse();

    let config = match cli::load_config(cli.config.as_deref()) {
        Ok(config) => config,
        Err(e) => {
            eprintln!("Error loading config: {}", e);
            std::process::exit(EXIT_ERROR);
        }
    };
    cli::init_logging(cli.verbose, &config.logging);

    let result = match &cli.command {
        Commands::Parse(args) => cli::run_parse(args, &config),
        Commands::Complexity(args) => cli::run_complexity(args, &config),
        Commands::Graph(args) => cli::run_graph(args, &config),
    };

    let exit_code = match result {
        Ok(code) => code,
        Err(e) => {
            eprintln!("Error: {}", e);
            EXIT_ERROR
        }
    };

    std::process::exit(exit_code);
}
