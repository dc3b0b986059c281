use clap::Parser;
use shelf::cli::commands::Cli;
use shelf::cli::handlers::{self, Settings};
use shelf::logging::{self, LogTarget};

fn main() {
    let cli = Cli::parse();

    let settings = match Settings::from_cli(&cli) {
        Ok(settings) => settings,
        Err(e) => {
            eprintln!("error: {}", e);
            std::process::exit(1);
        }
    };

    match cli.command {
        None => {
            // No subcommand → launch TUI
            if let Err(e) = logging::init(&settings.config.log, LogTarget::FileOnly) {
                eprintln!("warning: could not open log file: {}", e);
            }
            settings.log_resolved();
            if let Err(e) = shelf::tui::run(&settings) {
                eprintln!("error: {}", e);
                std::process::exit(1);
            }
        }
        Some(command) => {
            if let Err(e) = logging::init(&settings.config.log, LogTarget::Stderr) {
                eprintln!("warning: could not open log file: {}", e);
            }
            settings.log_resolved();
            if let Err(e) = handlers::dispatch(command, cli.json, &settings) {
                eprintln!("error: {}", e);
                std::process::exit(1);
            }
        }
    }
}
