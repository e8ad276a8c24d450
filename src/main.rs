mod cli;

use std::{path::Path, time::Instant};

use anyhow::{Context, Result};
use clap::Parser;
use crossbeam_channel::{bounded, unbounded};
use gesture_control::{
    ContextMode, GestureCandidate, GestureConfig, GestureSession, GestureSink, MotionEvent,
    pipeline::{self, SessionEvent},
    types::Point2,
};

use cli::{Cli, Commands};

fn main() -> Result<()> {
    let cli = Cli::parse();
    let default_level = if cli.verbose { "debug" } else { "info" };
    env_logger::Builder::from_env(env_logger::Env::default().default_filter_or(default_level))
        .init();

    match cli.command {
        Commands::Replay {
            file,
            mode,
            config,
            viewport,
            realtime,
        } => {
            let config = load_config(config.as_deref(), mode)?;
            let report = if realtime {
                replay_realtime(&file, config, viewport)?
            } else {
                replay_offline(&file, config, viewport)?
            };
            println!("{report}");
        }
        Commands::Presets => {
            for mode in ContextMode::ALL {
                let toml = GestureConfig::for_mode(mode)
                    .to_toml()
                    .with_context(|| format!("failed to render preset {}", mode.name()))?;
                println!("# {}\n{toml}", mode.name());
            }
        }
    }

    Ok(())
}

fn load_config(path: Option<&Path>, mode: Option<ContextMode>) -> Result<GestureConfig> {
    match path {
        Some(path) => GestureConfig::load_with_mode(path, mode)
            .with_context(|| format!("failed to load config {}", path.display())),
        None => Ok(mode.map(GestureConfig::for_mode).unwrap_or_default()),
    }
}

#[derive(Debug, Default)]
struct ReplayReport {
    frames: usize,
    gestures: usize,
    cursor_updates: usize,
    motions: usize,
}

impl std::fmt::Display for ReplayReport {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        write!(
            f,
            "{} frames: {} gestures, {} cursor updates, {} zoom/scroll steps",
            self.frames, self.gestures, self.cursor_updates, self.motions
        )
    }
}

impl ReplayReport {
    fn record(&mut self, event: &SessionEvent) {
        match event {
            SessionEvent::Gesture(gesture) => {
                self.gestures += 1;
                log::info!("gesture {}", gesture.display_text());
            }
            SessionEvent::Cursor(point) => {
                self.cursor_updates += 1;
                log::trace!("cursor {:.1},{:.1}", point.x, point.y);
            }
            SessionEvent::Motion(motion) => {
                self.motions += 1;
                log::info!("{}", motion.label());
            }
        }
    }
}

impl GestureSink for ReplayReport {
    fn on_gesture(&mut self, gesture: &GestureCandidate) {
        self.record(&SessionEvent::Gesture(*gesture));
    }

    fn on_cursor(&mut self, x: f32, y: f32) {
        self.record(&SessionEvent::Cursor(Point2::new(x, y)));
    }

    fn on_motion(&mut self, event: MotionEvent) {
        self.record(&SessionEvent::Motion(event));
    }
}

fn replay_offline(
    file: &Path,
    config: GestureConfig,
    viewport: Option<(f32, f32)>,
) -> Result<ReplayReport> {
    let frames = pipeline::read_recording(file)
        .with_context(|| format!("failed to read recording {}", file.display()))?;

    let mut session = GestureSession::new(config);
    if let Some((width, height)) = viewport {
        session.set_viewport(width, height);
    }

    let origin = Instant::now();
    let mut report = ReplayReport {
        frames: frames.len(),
        ..ReplayReport::default()
    };
    for recorded in &frames {
        session.process_frame_with(&recorded.to_hand_frame(origin), &mut report);
    }
    session.stop();
    Ok(report)
}

/// Plays the recording in wall-clock time through the session worker.
fn replay_realtime(
    file: &Path,
    config: GestureConfig,
    viewport: Option<(f32, f32)>,
) -> Result<ReplayReport> {
    let frames = pipeline::read_recording(file)
        .with_context(|| format!("failed to read recording {}", file.display()))?;
    let mut report = ReplayReport {
        frames: frames.len(),
        ..ReplayReport::default()
    };

    let (frame_tx, frame_rx) = bounded(1);
    let (event_tx, event_rx) = unbounded();
    let worker = pipeline::start_session_worker(config, viewport, frame_rx, event_tx);
    let stream = pipeline::start_replay_stream(frames, frame_tx);

    for event in event_rx.iter() {
        report.record(&event);
    }

    stream.wait();
    worker
        .join()
        .map_err(|_| anyhow::anyhow!("session worker panicked"))?;
    Ok(report)
}
