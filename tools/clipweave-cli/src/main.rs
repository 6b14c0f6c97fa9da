//! Clipweave CLI: command-line interface for timeline projects.
//!
//! Usage:
//!   clipweave init <NAME>              Create a new project
//!   clipweave info <PATH>              Show project information
//!   clipweave validate <PATH>          Check project invariants
//!   clipweave add-media <PATH> <SRC>   Append a video or image clip
//!   clipweave add-text <PATH> <TEXT>   Append a text clip
//!   clipweave move <PATH> <CLIP>       Drag a clip along the timeline
//!   clipweave trim <PATH> <CLIP>       Drag a clip edge
//!   clipweave play <PATH>              Play to the end with simulated media
//!   clipweave export-subs <PATH>       Write subtitles as ASS, SRT, or VTT
//!   clipweave manifest <PATH>          Write the export manifest

use std::path::PathBuf;

use clap::{Parser, Subcommand};

mod commands;

#[derive(Parser)]
#[command(
    name = "clipweave",
    about = "Timeline video compositor engine",
    version,
    author
)]
struct Cli {
    /// Enable verbose logging
    #[arg(short, long, global = true)]
    verbose: bool,

    #[command(subcommand)]
    command: Commands,
}

#[derive(Subcommand)]
enum Commands {
    /// Create a new empty project
    Init {
        /// Project name
        name: String,

        /// Output directory
        #[arg(short, long, default_value = ".")]
        output: PathBuf,

        /// Canvas width
        #[arg(long)]
        width: Option<u32>,

        /// Canvas height
        #[arg(long)]
        height: Option<u32>,
    },

    /// Show project information
    Info {
        /// Path to the project directory
        path: PathBuf,

        /// Timeline zoom used for the ruler preview
        #[arg(long)]
        px_per_sec: Option<f64>,
    },

    /// Check project invariants and media sources
    Validate {
        /// Path to the project directory
        path: PathBuf,
    },

    /// Append a video or image clip
    AddMedia {
        /// Path to the project directory
        path: PathBuf,

        /// Media location, relative to the project or a URL
        source: String,

        /// Clip kind: video|image
        #[arg(long, default_value = "video")]
        kind: String,

        /// Known media duration in seconds
        #[arg(long)]
        duration: Option<f64>,

        /// Known pixel size as WIDTHxHEIGHT
        #[arg(long)]
        size: Option<String>,
    },

    /// Append a text clip
    AddText {
        /// Path to the project directory
        path: PathBuf,

        /// Text content
        text: String,

        /// Start time in seconds
        #[arg(long, default_value = "0")]
        at: f64,
    },

    /// Drag a clip along the timeline
    Move {
        /// Path to the project directory
        path: PathBuf,

        /// Clip id
        clip: String,

        /// Horizontal drag distance in pixels
        #[arg(long, allow_hyphen_values = true)]
        delta_px: f64,

        /// Timeline zoom in pixels per second
        #[arg(long)]
        px_per_sec: Option<f64>,
    },

    /// Drag the leading or trailing edge of a clip
    Trim {
        /// Path to the project directory
        path: PathBuf,

        /// Clip id
        clip: String,

        /// Leading edge drag distance in pixels
        #[arg(long, allow_hyphen_values = true, conflicts_with = "trailing_width_px")]
        leading_px: Option<f64>,

        /// New clip width in pixels
        #[arg(long)]
        trailing_width_px: Option<f64>,

        /// Timeline zoom in pixels per second
        #[arg(long)]
        px_per_sec: Option<f64>,
    },

    /// Play the timeline to the end with simulated media
    Play {
        /// Path to the project directory
        path: PathBuf,

        /// Start time in seconds
        #[arg(long, default_value = "0")]
        from: f64,

        /// Playback rate
        #[arg(long)]
        rate: Option<f64>,

        /// Frames per second of the tick loop
        #[arg(long, default_value = "60")]
        fps: u32,

        /// Pace ticks in real time instead of running as fast as possible
        #[arg(long)]
        realtime: bool,
    },

    /// Write the subtitle track as ASS, SRT, or VTT
    ExportSubs {
        /// Path to the project directory
        path: PathBuf,

        /// Output file path
        #[arg(short, long)]
        output: Option<PathBuf>,

        /// Subtitle format: ass|srt|vtt (default: from output extension, else ass)
        #[arg(long)]
        format: Option<String>,
    },

    /// Write the export manifest consumed by the transcoder
    Manifest {
        /// Path to the project directory
        path: PathBuf,

        /// Output file path
        #[arg(short, long)]
        output: Option<PathBuf>,
    },
}

#[tokio::main]
async fn main() -> anyhow::Result<()> {
    let cli = Cli::parse();

    let config = clipweave_common::config::AppConfig::load();
    let mut logging = config.logging.clone();
    if cli.verbose {
        logging.level = "debug".to_string();
    }
    clipweave_common::logging::init_logging(&logging);

    match cli.command {
        Commands::Init {
            name,
            output,
            width,
            height,
        } => commands::init::run(
            name,
            output,
            width.unwrap_or(config.engine.canvas_width),
            height.unwrap_or(config.engine.canvas_height),
        ),
        Commands::Info { path, px_per_sec } => commands::info::run(path, px_per_sec, &config),
        Commands::Validate { path } => commands::validate::run(path, &config),
        Commands::AddMedia {
            path,
            source,
            kind,
            duration,
            size,
        } => commands::edit::add_media(path, source, kind, duration, size, &config),
        Commands::AddText { path, text, at } => commands::edit::add_text(path, text, at, &config),
        Commands::Move {
            path,
            clip,
            delta_px,
            px_per_sec,
        } => commands::edit::move_clip(path, clip, delta_px, px_per_sec, &config),
        Commands::Trim {
            path,
            clip,
            leading_px,
            trailing_width_px,
            px_per_sec,
        } => commands::edit::trim_clip(
            path,
            clip,
            leading_px,
            trailing_width_px,
            px_per_sec,
            &config,
        ),
        Commands::Play {
            path,
            from,
            rate,
            fps,
            realtime,
        } => commands::play::run(path, from, rate, fps, realtime, &config).await,
        Commands::ExportSubs {
            path,
            output,
            format,
        } => commands::export::subtitles(path, output, format),
        Commands::Manifest { path, output } => commands::export::manifest(path, output),
    }
}
