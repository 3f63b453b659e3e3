//! Magnet CLI: the `magnet` command.

mod cli;
mod commands;
mod support;

use clap::Parser;
use cli::{Cli, Commands};

fn main() {
    support::init_tracing();
    let cli = Cli::parse();

    match cli.command {
        Commands::Evaluate {
            card,
            summary,
            json,
        } => commands::evaluate::run(card, summary, json),

        Commands::Summarize {
            card,
            evaluate,
            json,
        } => commands::summarize::run(card, evaluate, json),

        Commands::Order {
            card,
            cards_dir,
            json,
        } => commands::order::run(card, cards_dir, json),
    }
}
