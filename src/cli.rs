use std::path::PathBuf;

use clap::{Parser, Subcommand};
use gesture_control::ContextMode;

/// Replays recorded hand-landmark sessions through the gesture pipeline.
#[derive(Parser, Debug)]
#[command(name = "gesture-control")]
#[command(author, version, about, long_about = None)]
pub struct Cli {
    #[command(subcommand)]
    pub command: Commands,

    /// Log at debug level unless RUST_LOG says otherwise
    #[arg(short, long, global = true)]
    pub verbose: bool,
}

#[derive(Subcommand, Debug)]
pub enum Commands {
    /// Run a JSON-lines landmark recording and report what it triggers
    Replay {
        /// Recording file, one frame per line
        file: PathBuf,

        /// Context mode preset (normal, gaming, irl-streaming, just-chatting)
        #[arg(short, long)]
        mode: Option<ContextMode>,

        /// TOML config file; --mode overrides its mode
        #[arg(short, long)]
        config: Option<PathBuf>,

        /// Cursor viewport, e.g. 1920x1080
        #[arg(long, value_parser = parse_viewport)]
        viewport: Option<(f32, f32)>,

        /// Pace frames by their timestamps through the background worker
        #[arg(long)]
        realtime: bool,
    },

    /// Print every context-mode preset as TOML
    Presets,
}

fn parse_viewport(value: &str) -> Result<(f32, f32), String> {
    let (w, h) = value
        .split_once(['x', 'X'])
        .ok_or_else(|| format!("expected WIDTHxHEIGHT, got `{value}`"))?;
    let parse = |v: &str| {
        v.trim()
            .parse::<f32>()
            .ok()
            .filter(|v| *v > 0.0)
            .ok_or_else(|| format!("invalid viewport dimension `{v}`"))
    };
    Ok((parse(w)?, parse(h)?))
}
