//! # Audio Capture Module
//!
//! This module handles real-time audio capture using CPAL (Cross-Platform Audio Library).
//! Incoming samples are collected in a rolling [`SampleWindow`] that always holds
//! the most recent block; owned snapshots of that window are handed to the
//! analysis side over a channel, so the estimator never reads a buffer the
//! device callback is still writing.
//!
//! ## Features
//! - Automatic audio device selection
//! - Mono f32 configuration closest to a target sample rate
//! - Rolling window of the latest samples with snapshot hand-off
//! - Lossy publishing: snapshots are dropped while the consumer lags

use std::collections::VecDeque;

use anyhow::{Result, anyhow};
use cpal::SupportedStreamConfigRange;
use cpal::traits::{DeviceTrait, HostTrait, StreamTrait};
use crossbeam_channel::Sender;

/// Rolling buffer holding the most recent `capacity` samples.
#[derive(Debug, Clone)]
pub struct SampleWindow {
    samples: VecDeque<f32>,
    capacity: usize,
}

impl SampleWindow {
    pub fn new(capacity: usize) -> Self {
        Self {
            samples: VecDeque::with_capacity(capacity),
            capacity,
        }
    }

    pub fn capacity(&self) -> usize {
        self.capacity
    }

    pub fn len(&self) -> usize {
        self.samples.len()
    }

    pub fn is_empty(&self) -> bool {
        self.samples.is_empty()
    }

    /// True once a full block has been collected.
    pub fn is_full(&self) -> bool {
        self.samples.len() == self.capacity
    }

    /// Appends samples, evicting the oldest ones beyond capacity.
    pub fn push(&mut self, data: &[f32]) {
        let incoming = if data.len() > self.capacity {
            &data[data.len() - self.capacity..]
        } else {
            data
        };
        let overflow = (self.samples.len() + incoming.len()).saturating_sub(self.capacity);
        self.samples.drain(..overflow);
        self.samples.extend(incoming.iter().copied());
    }

    /// Owned copy of the window, oldest sample first.
    pub fn snapshot(&self) -> Vec<f32> {
        self.samples.iter().copied().collect()
    }

    pub fn clear(&mut self) {
        self.samples.clear();
    }
}

/// Starts audio capture from the default input device.
///
/// This function:
/// 1. Selects the default audio input device
/// 2. Picks a mono f32 configuration closest to `target_rate`
/// 3. Feeds every callback into a [`SampleWindow`] of `buffer_size` samples
///    and publishes a snapshot whenever the window is full
///
/// # Arguments
/// * `sender` - Channel for snapshots; use a bounded channel so stale frames are dropped
/// * `buffer_size` - Samples per snapshot
/// * `target_rate` - Preferred sample rate in Hz
///
/// # Returns
/// * `Ok((stream, sample_rate))` - Running stream handle and its actual sample rate
/// * `Err(e)` - No input device, no usable format, or the stream failed to start
pub fn start_audio_capture(
    sender: Sender<Vec<f32>>,
    buffer_size: usize,
    target_rate: u32,
) -> Result<(cpal::Stream, u32)> {
    let host = cpal::default_host();
    let device = host
        .default_input_device()
        .ok_or_else(|| anyhow!("No input device available"))?;

    log::info!("Using audio input device: {}", device.name()?);

    let configs = device.supported_input_configs()?.collect::<Vec<_>>();
    let supported_config = find_supported_config(configs, target_rate)
        .ok_or_else(|| anyhow!("No suitable f32 input format found"))?;

    let sample_rate = clamp_rate(&supported_config, target_rate);
    let config = supported_config.with_sample_rate(cpal::SampleRate(sample_rate));
    let config: cpal::StreamConfig = config.into();

    log::info!("Selected sample rate: {} Hz", sample_rate);

    let err_fn = |err| log::error!("An error occurred on the audio stream: {}", err);

    let mut window = SampleWindow::new(buffer_size);

    let stream = device.build_input_stream(
        &config,
        move |data: &[f32], _: &cpal::InputCallbackInfo| {
            window.push(data);
            if window.is_full() {
                // Ignore a full channel; the consumer only wants the newest block.
                let _ = sender.try_send(window.snapshot());
            }
        },
        err_fn,
        None,
    )?;

    stream.play()?;

    Ok((stream, sample_rate))
}

/// Finds the mono f32 configuration whose rate range is closest to `target_rate`.
fn find_supported_config(
    configs: Vec<SupportedStreamConfigRange>,
    target_rate: u32,
) -> Option<SupportedStreamConfigRange> {
    configs
        .into_iter()
        .filter(|c| c.channels() == 1 && c.sample_format() == cpal::SampleFormat::F32)
        .min_by_key(|c| rate_distance(c.min_sample_rate().0, c.max_sample_rate().0, target_rate))
}

/// Distance from `target` to the range `[min, max]`; zero when inside it.
fn rate_distance(min: u32, max: u32, target: u32) -> u32 {
    if target < min {
        min - target
    } else {
        target.saturating_sub(max)
    }
}

fn clamp_rate(config: &SupportedStreamConfigRange, target_rate: u32) -> u32 {
    target_rate.clamp(config.min_sample_rate().0, config.max_sample_rate().0)
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn window_fills_then_rolls() {
        let mut window = SampleWindow::new(4);
        window.push(&[1.0, 2.0]);
        assert!(!window.is_full());
        assert_eq!(window.len(), 2);

        window.push(&[3.0, 4.0, 5.0]);
        assert!(window.is_full());
        assert_eq!(window.snapshot(), vec![2.0, 3.0, 4.0, 5.0]);
    }

    #[test]
    fn oversized_push_keeps_the_tail() {
        let mut window = SampleWindow::new(3);
        window.push(&[1.0, 2.0, 3.0, 4.0, 5.0, 6.0]);
        assert_eq!(window.snapshot(), vec![4.0, 5.0, 6.0]);
    }

    #[test]
    fn snapshot_is_independent_of_later_writes() {
        let mut window = SampleWindow::new(2);
        window.push(&[0.1, 0.2]);
        let snapshot = window.snapshot();
        window.push(&[0.9]);
        assert_eq!(snapshot, vec![0.1, 0.2]);
        assert_eq!(window.snapshot(), vec![0.2, 0.9]);
    }

    #[test]
    fn clear_empties_the_window() {
        let mut window = SampleWindow::new(2);
        window.push(&[0.1, 0.2]);
        window.clear();
        assert!(window.is_empty());
        assert_eq!(window.capacity(), 2);
    }

    #[test]
    fn rate_distance_inside_and_outside() {
        assert_eq!(rate_distance(8000, 96000, 44100), 0);
        assert_eq!(rate_distance(48000, 48000, 44100), 3900);
        assert_eq!(rate_distance(8000, 22050, 44100), 22050);
    }
}
