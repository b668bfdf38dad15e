//! CLI frontend for the EduQuest learning game.

mod commands;

use std::path::PathBuf;
use std::process;

use clap::{Parser, Subcommand};
use tracing_subscriber::{layer::SubscriberExt, util::SubscriberInitExt};

#[derive(Parser)]
#[command(
    name = "eq",
    about = "EduQuest — adaptive quiz adventures in the terminal",
    version,
    propagate_version = true
)]
struct Cli {
    /// Log collaborator and room activity to stderr
    #[arg(short, long, global = true)]
    verbose: bool,

    #[command(subcommand)]
    command: Commands,
}

#[derive(Subcommand)]
enum Commands {
    /// Play a chapter interactively
    Play {
        /// School subject (Math, Science, History, Geography, English)
        #[arg(short, long, default_value = "Math")]
        subject: String,

        /// Grade level
        #[arg(short, long, default_value = "5")]
        grade: String,

        /// Use the built-in question bank instead of the question service
        #[arg(long)]
        offline: bool,

        /// Question service base URL
        #[arg(long, default_value = eq_http::DEFAULT_BASE_URL)]
        server: String,

        /// Syllabus JSON file to play chapter by chapter
        #[arg(long)]
        syllabus: Option<PathBuf>,

        /// Chapter of the syllabus to start with
        #[arg(long, default_value = "1")]
        chapter: u32,

        /// RNG seed for the offline question bank
        #[arg(long)]
        seed: Option<u64>,

        /// Game rules JSON file
        #[arg(short, long)]
        config: Option<PathBuf>,
    },

    /// Simulate a multiplayer room with scripted players
    SimulateRoom {
        /// Number of players
        #[arg(short, long, default_value = "3")]
        players: usize,

        /// Number of question rounds
        #[arg(short, long, default_value = "5")]
        rounds: u32,

        /// RNG seed for deterministic simulation
        #[arg(short, long, default_value = "42")]
        seed: u64,

        /// Subject of the broadcast questions
        #[arg(long, default_value = "Math")]
        subject: String,

        /// Game rules JSON file; scores answers with these rules instead of
        /// the room defaults
        #[arg(short, long)]
        config: Option<PathBuf>,
    },

    /// Print the effective game rules
    Config {
        /// Game rules JSON file
        #[arg(short, long)]
        config: Option<PathBuf>,
    },
}

fn init_tracing(verbose: bool) {
    let default = if verbose { "eq=info" } else { "warn" };
    tracing_subscriber::registry()
        .with(
            tracing_subscriber::EnvFilter::try_from_default_env()
                .unwrap_or_else(|_| default.into()),
        )
        .with(tracing_subscriber::fmt::layer().with_writer(std::io::stderr))
        .init();
}

fn main() {
    let cli = Cli::parse();
    init_tracing(cli.verbose);

    let result = match cli.command {
        Commands::Play {
            subject,
            grade,
            offline,
            server,
            syllabus,
            chapter,
            seed,
            config,
        } => commands::play::run(commands::play::PlayOptions {
            subject,
            grade,
            server: (!offline).then_some(server),
            syllabus,
            chapter,
            seed,
            config,
        }),
        Commands::SimulateRoom {
            players,
            rounds,
            seed,
            subject,
            config,
        } => commands::simulate_room::run(players, rounds, seed, &subject, config.as_deref()),
        Commands::Config { config } => commands::config::run(config.as_deref()),
    };

    if let Err(e) = result {
        eprintln!("error: {e}");
        process::exit(1);
    }
}
