mod app;
mod commands;

use std::path::PathBuf;

use clap::{Parser, Subcommand};

#[derive(Parser)]
#[command(
    name = "mneme-cli",
    about = "Flashcard extraction and spaced repetition study",
    version
)]
struct Cli {
    /// Use a specific data directory (default: platform data dir)
    #[arg(long, global = true)]
    data_dir: Option<PathBuf>,

    /// Output format
    #[arg(long, global = true, default_value = "plain")]
    format: OutputFormat,

    #[command(subcommand)]
    command: Command,
}

#[derive(Clone, Debug, clap::ValueEnum)]
pub enum OutputFormat {
    Plain,
    Json,
}

#[derive(Clone, Debug, clap::ValueEnum)]
pub enum HintArg {
    Easy,
    Medium,
    Hard,
}

#[derive(Subcommand)]
enum Command {
    /// Extract flashcards from markdown notes into a topic
    Extract {
        /// Markdown file or directory to mine
        path: PathBuf,
        /// Topic the accepted cards belong to
        #[arg(long)]
        topic: String,
        /// Seed for question-template variety (random when omitted)
        #[arg(long)]
        seed: Option<u64>,
        /// Show candidates without storing them
        #[arg(long)]
        dry_run: bool,
    },

    /// Add a card by hand
    Add {
        topic: String,
        question: String,
        answer: String,
        /// Advisory difficulty
        #[arg(long)]
        hint: Option<HintArg>,
    },

    /// List a topic's cards
    List {
        topic: String,
        /// Only cards due now
        #[arg(long)]
        due: bool,
    },

    /// Delete a card
    Delete {
        topic: String,
        /// Card id as shown by `list`
        id: uuid::Uuid,
    },

    /// List topics with their review statistics
    Topics,

    /// Run an interactive study session
    Study {
        topic: String,
        /// Include cards that are not due yet
        #[arg(long)]
        all: bool,
        /// Shuffle the deck
        #[arg(long)]
        shuffle: bool,
    },

    /// Export a topic to a JSON backup file
    Export { topic: String, file: PathBuf },

    /// Import a topic backup (duplicate questions are skipped)
    Import { file: PathBuf },

    /// Show or edit a topic's scheduler settings
    Config {
        topic: String,
        /// Learning steps in minutes, comma separated (e.g. 10,1440)
        #[arg(long)]
        steps: Option<String>,
        /// Interval in days assigned at graduation
        #[arg(long)]
        graduating_days: Option<f32>,
        /// Ceiling on review intervals in days
        #[arg(long)]
        max_days: Option<f32>,
    },
}

fn main() -> anyhow::Result<()> {
    env_logger::init();

    let cli = Cli::parse();
    let mut app = app::App::new(cli.data_dir.clone())?;

    match cli.command {
        Command::Extract {
            path,
            topic,
            seed,
            dry_run,
        } => commands::extract::run(&mut app, &path, &topic, seed, dry_run, &cli.format),
        Command::Add {
            topic,
            question,
            answer,
            hint,
        } => commands::cards::add(&mut app, &topic, question, answer, hint),
        Command::List { topic, due } => commands::cards::list(&mut app, &topic, due, &cli.format),
        Command::Delete { topic, id } => commands::cards::delete(&mut app, &topic, id),
        Command::Topics => commands::topics::run(&mut app, &cli.format),
        Command::Study {
            topic,
            all,
            shuffle,
        } => commands::study::run(&mut app, &topic, all, shuffle),
        Command::Export { topic, file } => commands::transfer::export(&mut app, &topic, &file),
        Command::Import { file } => commands::transfer::import(&mut app, &file),
        Command::Config {
            topic,
            steps,
            graduating_days,
            max_days,
        } => commands::config::run(
            &mut app,
            &topic,
            steps.as_deref(),
            graduating_days,
            max_days,
            &cli.format,
        ),
    }
}
