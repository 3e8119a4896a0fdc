//! # pitchviz monitor
//!
//! Headless driver for the visualizer core. It captures the default
//! microphone and analyzes the newest snapshot once per render tick, then
//! logs the frequency, note, level and line color a renderer would draw.
//!
//! ## Architecture
//! - **Main Thread**: fixed-rate frame loop driven by a crossbeam ticker
//! - **Audio Thread**: owns the CPAL stream and forwards snapshots
//! - **Communication**: crossbeam channels; a bounded one-slot channel for shutdown

use std::path::PathBuf;
use std::thread::{self, JoinHandle};
use std::time::{Duration, Instant};

use anyhow::{Context, Result, anyhow, bail};
use clap::Parser;
use cpal::traits::StreamTrait;
use crossbeam_channel::{Receiver, Sender, TryRecvError};
use pitchviz_core::{FrameReading, Note, VisualizerConfig, analyze_frame, audio};

/// Snapshots buffered between the audio thread and the frame loop.
const FRAME_QUEUE_DEPTH: usize = 4;

#[derive(Parser, Debug)]
#[command(name = "pitchviz-monitor", version, about = "Live pitch and loudness monitor")]
struct Args {
    /// JSON configuration file; defaults are used when omitted
    #[arg(short, long)]
    config: Option<PathBuf>,

    /// Frames analyzed per second
    #[arg(long, default_value_t = 60)]
    fps: u32,

    /// Stop after this many seconds
    #[arg(long)]
    duration: Option<u64>,

    /// Write the default configuration to this path and exit
    #[arg(long, value_name = "PATH")]
    write_config: Option<PathBuf>,
}

/// One captured block together with the rate it was recorded at.
#[derive(Debug, Clone)]
struct AudioFrame {
    samples: Vec<f32>,
    sample_rate: u32,
}

/// Audio worker thread management structure.
///
/// Owns the dedicated capture thread and the channel used to stop it.
#[derive(Debug)]
struct AudioWorker {
    shutdown_tx: Sender<()>,
    thread_handle: Option<JoinHandle<()>>,
}

impl AudioWorker {
    /// Spawns the capture thread.
    ///
    /// The CPAL stream is created inside the thread because it cannot move
    /// between threads on every platform. Snapshots arrive on the returned
    /// receiver; it disconnects when capture fails or stops.
    fn start(config: &VisualizerConfig) -> (Self, Receiver<AudioFrame>) {
        let (shutdown_tx, shutdown_rx) = crossbeam_channel::bounded::<()>(1);
        let (frame_tx, frame_rx) = crossbeam_channel::bounded::<AudioFrame>(FRAME_QUEUE_DEPTH);
        let buffer_size = config.buffer_size;
        let target_rate = config.target_sample_rate;

        let thread_handle = thread::spawn(move || {
            log::info!("[AUDIO-THREAD] Starting audio capture...");
            let (raw_audio_tx, raw_audio_rx) =
                crossbeam_channel::bounded::<Vec<f32>>(FRAME_QUEUE_DEPTH);

            let (stream, sample_rate) =
                match audio::start_audio_capture(raw_audio_tx, buffer_size, target_rate) {
                    Ok(tuple) => tuple,
                    Err(e) => {
                        log::error!("[AUDIO-THREAD] Fatal error starting audio: {e:#}");
                        return;
                    }
                };
            log::info!("[AUDIO-THREAD] Capturing {buffer_size}-sample blocks at {sample_rate} Hz");

            loop {
                crossbeam_channel::select! {
                    recv(raw_audio_rx) -> msg => match msg {
                        Ok(samples) => {
                            let frame = AudioFrame { samples, sample_rate };
                            // A full queue means the frame loop is behind; drop the block.
                            if let Err(crossbeam_channel::TrySendError::Disconnected(_)) =
                                frame_tx.try_send(frame)
                            {
                                log::debug!("[AUDIO-THREAD] Frame loop gone");
                                break;
                            }
                        }
                        Err(_) => {
                            log::warn!("[AUDIO-THREAD] Audio channel closed");
                            break;
                        }
                    },
                    recv(shutdown_rx) -> _ => {
                        log::info!("[AUDIO-THREAD] Received shutdown signal");
                        break;
                    },
                }
            }

            if let Err(e) = stream.pause() {
                log::warn!("[AUDIO-THREAD] Error pausing stream: {e}");
            }
            drop(stream);
            log::info!("[AUDIO-THREAD] Audio thread finished");
        });

        let worker = Self {
            shutdown_tx,
            thread_handle: Some(thread_handle),
        };
        (worker, frame_rx)
    }

    /// Signals the capture thread and waits for it to exit.
    fn stop(mut self) {
        let _ = self.shutdown_tx.try_send(());
        if let Some(handle) = self.thread_handle.take() {
            if handle.join().is_err() {
                log::error!("[MAIN] Audio thread panicked");
            }
        }
    }
}

/// Logs readings, promoting note changes to `info`.
#[derive(Debug, Default)]
struct Reporter {
    frames: u64,
    last_note: Option<Note>,
}

impl Reporter {
    fn report(&mut self, reading: &FrameReading) {
        self.frames += 1;
        log::debug!(
            "[FRAME {}] level={:.3} freq={:?} note={:?} color={}",
            self.frames,
            reading.rms,
            reading.frequency(),
            reading.note.map(|n| n.to_string()),
            reading.color
        );

        if reading.note != self.last_note {
            match (reading.note, reading.frequency()) {
                (Some(note), Some(freq)) => log::info!(
                    "{:<4} {freq:8.2} Hz  level {:.3}  color {}",
                    note.to_string(),
                    reading.rms,
                    reading.color
                ),
                _ => log::info!("--   no pitch     level {:.3}", reading.rms),
            }
            self.last_note = reading.note;
        }
    }
}

/// Runs the render-rate loop until the deadline passes or capture stops.
///
/// Each tick drains the queue, keeps only the newest snapshot and
/// analyzes it; with no new audio the previous snapshot is analyzed again.
fn run_frame_loop(
    frames: &Receiver<AudioFrame>,
    config: &VisualizerConfig,
    fps: u32,
    deadline: Option<Instant>,
) -> Result<()> {
    let ticker = crossbeam_channel::tick(Duration::from_secs_f64(1.0 / fps as f64));
    let mut reporter = Reporter::default();
    let mut latest: Option<AudioFrame> = None;

    loop {
        ticker.recv().context("frame ticker stopped")?;

        loop {
            match frames.try_recv() {
                Ok(frame) => latest = Some(frame),
                Err(TryRecvError::Empty) => break,
                Err(TryRecvError::Disconnected) => {
                    return Err(anyhow!("audio capture stopped"));
                }
            }
        }

        if let Some(frame) = &latest {
            match analyze_frame(&frame.samples, frame.sample_rate, config) {
                Ok(reading) => reporter.report(&reading),
                Err(e) => log::warn!("[MAIN] Skipping frame: {e}"),
            }
        }

        if deadline.is_some_and(|d| Instant::now() >= d) {
            log::info!("[MAIN] Duration elapsed after {} frames", reporter.frames);
            return Ok(());
        }
    }
}

fn main() -> Result<()> {
    env_logger::Builder::from_env(env_logger::Env::default().default_filter_or("info")).init();
    let args = Args::parse();

    if let Some(path) = &args.write_config {
        VisualizerConfig::default().save(path)?;
        log::info!("[MAIN] Wrote default configuration to {}", path.display());
        return Ok(());
    }

    let config = match &args.config {
        Some(path) => VisualizerConfig::load(path)?,
        None => VisualizerConfig::default(),
    };
    config.validate()?;
    if args.fps == 0 {
        bail!("--fps must be at least 1");
    }
    log::info!("[MAIN] Starting monitor with {:?}", config);

    let deadline = args
        .duration
        .map(|secs| Instant::now() + Duration::from_secs(secs));
    let (worker, frames) = AudioWorker::start(&config);

    let result = run_frame_loop(&frames, &config, args.fps, deadline);

    log::info!("[MAIN] Shutting down audio worker...");
    worker.stop();
    result
}
