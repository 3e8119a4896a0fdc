//! # Color Mapping Module
//!
//! Maps a frequency to a color by walking a six-stage RGB wheel
//! (red → yellow → green → cyan → blue → magenta → red). Each stage ramps a
//! single channel by one unit per step until it saturates, then hands off to
//! the next stage. Higher frequencies take more steps around the wheel.

use serde::{Deserialize, Serialize};
use std::fmt;

use crate::config::VisualizerConfig;

/// One full trip around the wheel.
pub const MAX_WHEEL_STEPS: u32 = 6 * 255;

/// An 8-bit RGB color.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub struct Rgb {
    pub r: u8,
    pub g: u8,
    pub b: u8,
}

impl Rgb {
    /// Idle color, shown when there is no usable pitch.
    pub const WHITE: Rgb = Rgb::new(255, 255, 255);
    pub const RED: Rgb = Rgb::new(255, 0, 0);

    pub const fn new(r: u8, g: u8, b: u8) -> Self {
        Self { r, g, b }
    }

    fn channel_mut(&mut self, channel: Channel) -> &mut u8 {
        match channel {
            Channel::Red => &mut self.r,
            Channel::Green => &mut self.g,
            Channel::Blue => &mut self.b,
        }
    }
}

impl fmt::Display for Rgb {
    /// Hex notation, e.g. `#ff5d00`.
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "#{:02x}{:02x}{:02x}", self.r, self.g, self.b)
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
enum Channel {
    Red,
    Green,
    Blue,
}

/// The six ramps of the wheel, in traversal order.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum ColorStage {
    GreenRising,
    RedFalling,
    BlueRising,
    GreenFalling,
    RedRising,
    BlueFalling,
}

impl ColorStage {
    pub fn next(self) -> Self {
        match self {
            ColorStage::GreenRising => ColorStage::RedFalling,
            ColorStage::RedFalling => ColorStage::BlueRising,
            ColorStage::BlueRising => ColorStage::GreenFalling,
            ColorStage::GreenFalling => ColorStage::RedRising,
            ColorStage::RedRising => ColorStage::BlueFalling,
            ColorStage::BlueFalling => ColorStage::GreenRising,
        }
    }

    fn channel(self) -> Channel {
        match self {
            ColorStage::RedFalling | ColorStage::RedRising => Channel::Red,
            ColorStage::GreenRising | ColorStage::GreenFalling => Channel::Green,
            ColorStage::BlueRising | ColorStage::BlueFalling => Channel::Blue,
        }
    }

    fn rising(self) -> bool {
        matches!(
            self,
            ColorStage::GreenRising | ColorStage::BlueRising | ColorStage::RedRising
        )
    }

    /// Value at which the stage's channel saturates.
    fn target(self) -> u8 {
        if self.rising() { u8::MAX } else { 0 }
    }
}

/// Position on the wheel: the active stage and the current color.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct ColorWheel {
    stage: ColorStage,
    rgb: Rgb,
}

impl ColorWheel {
    /// Pure red, about to ramp green up.
    pub const START: ColorWheel = ColorWheel {
        stage: ColorStage::GreenRising,
        rgb: Rgb::RED,
    };

    pub fn stage(&self) -> ColorStage {
        self.stage
    }

    pub fn rgb(&self) -> Rgb {
        self.rgb
    }

    /// Moves one unit along the wheel.
    ///
    /// The active channel moves toward its target; reaching it hands off to
    /// the next stage within the same step.
    pub fn step(self) -> Self {
        let mut rgb = self.rgb;
        let target = self.stage.target();
        let channel = rgb.channel_mut(self.stage.channel());
        debug_assert_ne!(
            *channel, target,
            "stage {:?} entered with its channel already saturated",
            self.stage
        );

        *channel = if self.stage.rising() {
            channel.saturating_add(1)
        } else {
            channel.saturating_sub(1)
        };

        let stage = if *channel == target {
            self.stage.next()
        } else {
            self.stage
        };
        Self { stage, rgb }
    }

    /// Takes `steps` steps, never more than one full trip.
    pub fn advance(self, steps: u32) -> Self {
        (0..steps.min(MAX_WHEEL_STEPS)).fold(self, |wheel, _| wheel.step())
    }
}

/// Number of wheel steps for a frequency:
/// `floor(f * 255 / (max_audible_hz / color_stage_span))`, capped at one trip.
pub fn step_budget(frequency: f32, config: &VisualizerConfig) -> u32 {
    let points = frequency * 255.0 * config.color_stage_span / config.max_audible_hz;
    // Float-to-int casts saturate: NaN becomes 0, +inf becomes u32::MAX.
    (points.floor() as u32).min(MAX_WHEEL_STEPS)
}

/// Color for a frequency.
///
/// Anything below `config.idle_below_hz`, including negative values and NaN,
/// maps to [`Rgb::WHITE`].
pub fn hue_from_frequency(frequency: f32, config: &VisualizerConfig) -> Rgb {
    if frequency.is_nan() || frequency < config.idle_below_hz {
        return Rgb::WHITE;
    }
    ColorWheel::START
        .advance(step_budget(frequency, config))
        .rgb()
}
