//! avsrt CLI: build subtitle tracks from recognized speech.
//!
//! Usage:
//!   avsrt init <MEDIA>      Create or locate the workspace for a media file
//!   avsrt run <MEDIA>       Run the subtitle pipeline
//!   avsrt status <MEDIA>    Show which stages are cached
//!   avsrt check <SRT>       Check a subtitle file against the layout limits

use std::path::PathBuf;

use anyhow::Context;
use avsrt_common::AppConfig;
use clap::{Parser, Subcommand};

mod commands;

#[derive(Parser)]
#[command(
    name = "avsrt",
    about = "Readable subtitle tracks from speech recognition output",
    version,
    author
)]
struct Cli {
    /// Enable verbose logging
    #[arg(short, long, global = true)]
    verbose: bool,

    /// Configuration file (defaults to ~/.config/avsrt/config.json)
    #[arg(long, global = true)]
    config: Option<PathBuf>,

    #[command(subcommand)]
    command: Commands,
}

/// Overrides shared by commands that build or check subtitles.
#[derive(clap::Args, Debug, Default)]
struct LayoutArgs {
    /// Subtitle language (BCP 47 tag)
    #[arg(short, long)]
    language: Option<String>,

    /// Characters per subtitle line
    #[arg(long)]
    chars_per_line: Option<usize>,

    /// Lines per subtitle block
    #[arg(long)]
    max_lines: Option<usize>,
}

impl LayoutArgs {
    fn apply(&self, config: &mut AppConfig) {
        if let Some(language) = &self.language {
            config.language = language.clone();
        }
        if let Some(chars_per_line) = self.chars_per_line {
            config.blocks.chars_per_line = chars_per_line;
        }
        if let Some(max_lines) = self.max_lines {
            config.blocks.max_lines = max_lines;
        }
    }
}

#[derive(Subcommand)]
enum Commands {
    /// Create or locate the workspace for a media file
    Init {
        /// Path to the media file
        media: PathBuf,
    },

    /// Run the subtitle pipeline for a media file
    Run {
        /// Path to the media file
        media: PathBuf,

        #[command(flatten)]
        layout: LayoutArgs,
    },

    /// Show which pipeline stages would be reused
    Status {
        /// Path to the media file
        media: PathBuf,

        #[command(flatten)]
        layout: LayoutArgs,
    },

    /// Check a subtitle file against the layout limits
    Check {
        /// Path to the .srt file
        path: PathBuf,

        #[command(flatten)]
        layout: LayoutArgs,
    },
}

fn main() -> anyhow::Result<()> {
    let cli = Cli::parse();

    let mut config = match &cli.config {
        Some(path) => AppConfig::load_from(path)
            .with_context(|| format!("Failed to load config from {}", path.display()))?,
        None => AppConfig::load(),
    };

    let mut logging = config.logging.clone();
    if cli.verbose {
        logging.level = "debug".to_string();
    }
    avsrt_common::logging::init_logging(&logging);
    tracing::debug!(?config, "configuration loaded");

    match cli.command {
        Commands::Init { media } => commands::init::run(media),
        Commands::Run { media, layout } => {
            layout.apply(&mut config);
            commands::run::run(media, &config)
        }
        Commands::Status { media, layout } => {
            layout.apply(&mut config);
            commands::status::run(media, &config)
        }
        Commands::Check { path, layout } => {
            layout.apply(&mut config);
            commands::check::run(path, &config)
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use clap::CommandFactory;

    #[test]
    fn test_cli_definition_is_consistent() {
        Cli::command().debug_assert();
    }

    #[test]
    fn test_layout_flags_override_config() {
        let cli = Cli::parse_from([
            "avsrt",
            "run",
            "talk.mp4",
            "--language",
            "en",
            "--chars-per-line",
            "42",
        ]);
        let Commands::Run { layout, .. } = cli.command else {
            panic!("expected run");
        };

        let mut config = AppConfig::default();
        layout.apply(&mut config);
        assert_eq!(config.language, "en");
        assert_eq!(config.blocks.chars_per_line, 42);
        assert_eq!(config.blocks.max_lines, AppConfig::default().blocks.max_lines);
    }
}
