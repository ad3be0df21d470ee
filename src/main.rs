use clap::{Parser, Subcommand};

use audioprint_rs::config::Config;

mod command_handlers;

#[derive(Parser)]
#[command(name = "audioprint", about = "Acoustic fingerprinting and recognition")]
struct Cli {
    #[command(subcommand)]
    command: Commands,
}

#[derive(Subcommand)]
enum Commands {
    /// Fingerprint a WAV file (or every WAV under a directory) and save it
    /// as a reference recording
    Save {
        /// Path to a WAV file or a directory of WAV files
        path: String,
        /// Song title; defaults to the file name
        #[arg(long)]
        title: Option<String>,
        /// Song artist
        #[arg(long)]
        artist: Option<String>,
    },
    /// Recognize a recording against the saved references
    Find {
        /// Path to the WAV file to identify
        path: String,
        /// Print results as JSON instead of text
        #[arg(long)]
        json: bool,
    },
    /// Delete every saved song and fingerprint
    Erase,
}

fn main() -> anyhow::Result<()> {
    let cli = Cli::parse();
    let config = Config::default();

    match cli.command {
        Commands::Save { path, title, artist } => {
            command_handlers::save(&path, title.as_deref(), artist.as_deref(), &config)
        }
        Commands::Find { path, json } => command_handlers::find(&path, json, &config),
        Commands::Erase => command_handlers::erase(),
    }
}
