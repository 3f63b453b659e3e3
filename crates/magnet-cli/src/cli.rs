use clap::{Args, Parser, Subcommand};

pub const DEFAULT_CARDS_DIR: &str = "magnet/cards";

#[derive(Parser)]
#[command(
    name = "magnet",
    about = "Magnet: evaluate empirical claims declared as evaluation cards",
    version
)]
pub struct Cli {
    #[command(subcommand)]
    pub command: Commands,
}

#[derive(Subcommand)]
pub enum Commands {
    /// Resolve every symbol of a card, run its claim, and print the status
    Evaluate {
        #[command(flatten)]
        card: CardArgs,

        /// Print the full card summary after the status
        #[arg(long)]
        summary: bool,

        /// Output as JSON
        #[arg(long)]
        json: bool,
    },

    /// Print a card's summary (title, symbols, claim, status)
    Summarize {
        #[command(flatten)]
        card: CardArgs,

        /// Evaluate the card before summarizing it
        #[arg(long)]
        evaluate: bool,

        /// Output as JSON
        #[arg(long)]
        json: bool,
    },

    /// Print the symbol resolution order and required external bindings
    Order {
        /// Card path, or a file name under --cards-dir
        card: String,

        /// Directory searched when the card path does not exist
        #[arg(long, env = "MAGNET_CARDS_DIR", default_value = DEFAULT_CARDS_DIR)]
        cards_dir: String,

        /// Output as JSON
        #[arg(long)]
        json: bool,
    },
}

/// Card location plus the external bindings seeded before resolution.
#[derive(Args, Debug, Clone)]
pub struct CardArgs {
    /// Card path, or a file name under --cards-dir
    pub card: String,

    /// Directory searched when the card path does not exist
    #[arg(long, env = "MAGNET_CARDS_DIR", default_value = DEFAULT_CARDS_DIR)]
    pub cards_dir: String,

    /// External binding NAME=VALUE; VALUE is parsed as JSON, else taken as a string (repeatable)
    #[arg(long = "bind", value_name = "NAME=VALUE")]
    pub bind: Vec<String>,

    /// JSON or YAML object of external bindings
    #[arg(long, value_name = "FILE")]
    pub bindings: Option<String>,
}
