//! ieltsim CLI — the user-facing command-line interface.

use std::path::PathBuf;
use std::process;

use clap::{Parser, Subcommand};

mod commands;

#[derive(Parser)]
#[command(
    name = "ieltsim",
    version,
    about = "AI-generated IELTS practice-test simulator"
)]
struct Cli {
    #[command(subcommand)]
    command: Commands,
}

#[derive(Subcommand)]
enum Commands {
    /// Run a complete non-interactive attempt
    Run {
        /// Section to take: reading, writing, or full
        #[arg(long, default_value = "full")]
        section: String,

        /// JSON file of reading answers keyed by question id
        #[arg(long)]
        answers: Option<PathBuf>,

        /// File containing the task 1 essay text
        #[arg(long)]
        task1: Option<PathBuf>,

        /// File containing the task 2 essay text
        #[arg(long)]
        task2: Option<PathBuf>,

        /// Provider name from config, or "mock" for the offline backend
        #[arg(long)]
        provider: Option<String>,

        /// Output directory
        #[arg(long, default_value = "./ieltsim-results")]
        output: PathBuf,

        /// Config file path
        #[arg(long)]
        config: Option<PathBuf>,
    },

    /// Generate a test and save it as JSON
    Generate {
        /// Output directory
        #[arg(long, default_value = "./ieltsim-results")]
        output: PathBuf,

        /// Provider name from config, or "mock" for the offline backend
        #[arg(long)]
        provider: Option<String>,

        /// Config file path
        #[arg(long)]
        config: Option<PathBuf>,
    },

    /// Validate a saved test file against the content contract
    Validate {
        /// Path to a test JSON file
        #[arg(long)]
        test: PathBuf,
    },

    /// Score reading answers against a saved test
    Score {
        /// Path to a test JSON file
        #[arg(long)]
        test: PathBuf,

        /// JSON file of answers keyed by question id
        #[arg(long)]
        answers: PathBuf,
    },

    /// Grade essay files against the writing criteria
    Grade {
        /// File containing the task 1 essay text
        #[arg(long)]
        task1: PathBuf,

        /// File containing the task 2 essay text
        #[arg(long)]
        task2: PathBuf,

        /// Provider name from config, or "mock" for the offline backend
        #[arg(long)]
        provider: Option<String>,

        /// Config file path
        #[arg(long)]
        config: Option<PathBuf>,
    },
}

#[tokio::main]
async fn main() {
    tracing_subscriber::fmt()
        .with_env_filter(
            tracing_subscriber::EnvFilter::from_default_env()
                .add_directive("ieltsim=info".parse().unwrap()),
        )
        .init();

    let cli = Cli::parse();

    let result = match cli.command {
        Commands::Run {
            section,
            answers,
            task1,
            task2,
            provider,
            output,
            config,
        } => commands::run::execute(section, answers, task1, task2, provider, output, config).await,
        Commands::Generate {
            output,
            provider,
            config,
        } => commands::generate::execute(output, provider, config).await,
        Commands::Validate { test } => commands::validate::execute(test),
        Commands::Score { test, answers } => commands::score::execute(test, answers),
        Commands::Grade {
            task1,
            task2,
            provider,
            config,
        } => commands::grade::execute(task1, task2, provider, config).await,
    };

    if let Err(e) = result {
        eprintln!("Error: {e:#}");
        process::exit(1);
    }
}
