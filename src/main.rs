use anyhow::Result;
use clap::{Parser, Subcommand};

mod cli_exec;

#[derive(Parser)]
#[command(name = "stepwise")]
#[command(about = "Checklist tracker for collections of steps", long_about = None)]
struct Cli {
    #[command(subcommand)]
    command: Option<Commands>,
}

#[derive(Subcommand)]
enum Commands {
    /// Configure the remote tracker service
    Login {
        /// Base URL of the service, e.g. http://localhost:8000
        #[arg(long)]
        url: String,
    },

    /// Show the configured remote
    Remote {
        /// Emit JSON
        #[arg(long)]
        json: bool,
    },

    /// List collections
    Collections {
        /// Emit JSON
        #[arg(long)]
        json: bool,
    },

    /// Create a collection
    Create { name: String },

    /// List the steps of a collection
    Steps {
        /// Collection id
        #[arg(long)]
        collection: String,
        /// Show completed steps instead of open ones
        #[arg(long)]
        completed: bool,
        /// Emit JSON
        #[arg(long)]
        json: bool,
    },

    /// Append a step to a collection
    Add {
        /// Collection id
        #[arg(long)]
        collection: String,
        description: String,
    },

    /// Rewrite a step's description
    Edit { step_id: String, description: String },

    /// Mark steps completed
    Complete { step_ids: Vec<String> },

    /// Mark completed steps open again
    Revert { step_ids: Vec<String> },

    /// Delete steps
    Delete { step_ids: Vec<String> },
}

fn main() {
    if let Err(err) = run() {
        eprintln!("{:#}", err);
        std::process::exit(1);
    }
}

fn run() -> Result<()> {
    let cli = Cli::parse();
    match cli.command {
        None => stepwise::tui::run(),
        Some(command) => cli_exec::handle_command(command),
    }
}
