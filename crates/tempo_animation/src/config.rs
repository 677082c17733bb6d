//! Timing configuration
//!
//! Every tween runs from one canonical [`TweenConfig`]. Callers may describe
//! timing in two other shapes, both accepted by [`normalize`]:
//!
//! - [`TimingDescriptor`]: the engine-native description (style/direction
//!   pair, time, reverses flag, repeat count, delay)
//! - [`TweenConfigRecord`]: a loose record where every field is optional,
//!   as read from presets or other serialized sources
//!
//! Normalization never fails. Values that cannot drive a tween (a missing
//! or zero duration, negative delays) are caught by [`TweenConfig::validate`]
//! when the tween is constructed.

use crate::easing::{Easing, EasingDirection, EasingStyle};
use crate::error::{Result, TweenError};
use serde::{Deserialize, Serialize};

/// Canonical timing configuration
///
/// All times are in seconds. `repeat_count` is the number of extra plays
/// after the first, so a config with `repeat_count = 2` plays three times.
#[derive(Clone, Copy, Debug)]
pub struct TweenConfig {
    pub easing: Easing,
    /// Length of one forward (or reverse) leg
    pub duration: f64,
    /// Wait before the first leg
    pub start_delay: f64,
    pub repeat_count: u32,
    /// Wait before each repeat cycle
    pub repeat_delay: f64,
    /// Wait between a forward leg and its reverse leg
    pub reverse_delay: f64,
    pub should_reverse: bool,
}

impl TweenConfig {
    /// Single forward play with linear easing
    pub fn new(duration: f64) -> Self {
        Self {
            easing: Easing::Linear,
            duration,
            start_delay: 0.0,
            repeat_count: 0,
            repeat_delay: 0.0,
            reverse_delay: 0.0,
            should_reverse: false,
        }
    }

    pub fn with_easing(mut self, easing: Easing) -> Self {
        self.easing = easing;
        self
    }

    pub fn with_start_delay(mut self, seconds: f64) -> Self {
        self.start_delay = seconds;
        self
    }

    /// Play `count` extra times, waiting `delay` seconds before each
    pub fn with_repeat(mut self, count: u32, delay: f64) -> Self {
        self.repeat_count = count;
        self.repeat_delay = delay;
        self
    }

    /// Follow each forward leg with a reverse leg after `delay` seconds
    pub fn with_reverse(mut self, delay: f64) -> Self {
        self.should_reverse = true;
        self.reverse_delay = delay;
        self
    }

    /// Total number of forward legs
    pub fn play_count(&self) -> u32 {
        self.repeat_count.saturating_add(1)
    }

    /// One forward leg plus its reverse leg, if any
    pub fn cycle_duration(&self) -> f64 {
        if self.should_reverse {
            self.duration + self.reverse_delay + self.duration
        } else {
            self.duration
        }
    }

    /// Wall-clock length of a full run including every delay
    pub fn total_duration(&self) -> f64 {
        let cycle = self.cycle_duration();
        self.start_delay + cycle + f64::from(self.repeat_count) * (self.repeat_delay + cycle)
    }

    /// Whether the config uses repeat or reverse cycles
    pub fn is_cyclic(&self) -> bool {
        self.repeat_count > 0 || self.should_reverse
    }

    /// Reject configs that cannot drive a progression
    pub fn validate(&self) -> Result<()> {
        if !self.duration.is_finite() || self.duration <= 0.0 {
            return Err(TweenError::invalid_config(format!(
                "duration must be a positive number of seconds, got {}",
                self.duration
            )));
        }
        for (name, value) in [
            ("start_delay", self.start_delay),
            ("repeat_delay", self.repeat_delay),
            ("reverse_delay", self.reverse_delay),
        ] {
            if !value.is_finite() || value < 0.0 {
                return Err(TweenError::invalid_config(format!(
                    "{name} must be zero or positive, got {value}"
                )));
            }
        }
        Ok(())
    }
}

/// Loosely specified timing record
///
/// `repeat_count` and `play_count` are two encodings of the same thing. When
/// both are present `repeat_count` wins.
#[derive(Clone, Debug, Default, Serialize, Deserialize)]
#[serde(default)]
pub struct TweenConfigRecord {
    /// Easing style name, case-insensitive
    pub style: Option<String>,
    /// Easing direction name, case-insensitive
    pub direction: Option<String>,
    pub duration: Option<f64>,
    pub start_delay: Option<f64>,
    pub repeat_count: Option<u32>,
    pub play_count: Option<u32>,
    pub repeat_delay: Option<f64>,
    pub reverse_delay: Option<f64>,
    pub should_reverse: Option<bool>,
    /// Resolved easing; takes precedence over `style`/`direction`
    #[serde(skip)]
    pub easing: Option<Easing>,
}

impl TweenConfigRecord {
    fn repeat_count(&self) -> u32 {
        match (self.repeat_count, self.play_count) {
            (Some(repeats), _) => repeats,
            (None, Some(plays)) => plays.saturating_sub(1),
            (None, None) => 0,
        }
    }

    fn easing(&self) -> Easing {
        self.easing.unwrap_or_else(|| {
            Easing::from_names(self.style.as_deref(), self.direction.as_deref())
        })
    }
}

/// Engine-native timing description
#[derive(Clone, Copy, Debug, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct TimingDescriptor {
    /// Leg length in seconds
    pub time: f64,
    pub style: EasingStyle,
    pub direction: EasingDirection,
    pub repeat_count: u32,
    pub reverses: bool,
    /// Wait before the first leg
    pub delay_time: f64,
}

impl TimingDescriptor {
    pub fn new(time: f64) -> Self {
        Self {
            time,
            ..Self::default()
        }
    }

    pub fn with_style(mut self, style: EasingStyle, direction: EasingDirection) -> Self {
        self.style = style;
        self.direction = direction;
        self
    }

    pub fn repeating(mut self, count: u32) -> Self {
        self.repeat_count = count;
        self
    }

    pub fn reversing(mut self, reverses: bool) -> Self {
        self.reverses = reverses;
        self
    }

    pub fn delayed(mut self, seconds: f64) -> Self {
        self.delay_time = seconds;
        self
    }
}

impl Default for TimingDescriptor {
    fn default() -> Self {
        Self {
            time: 1.0,
            style: EasingStyle::Quad,
            direction: EasingDirection::Out,
            repeat_count: 0,
            reverses: false,
            delay_time: 0.0,
        }
    }
}

/// Any accepted timing shape
#[derive(Clone, Debug)]
pub enum TimingInput {
    Native(TimingDescriptor),
    Record(TweenConfigRecord),
    Config(TweenConfig),
}

impl From<TimingDescriptor> for TimingInput {
    fn from(descriptor: TimingDescriptor) -> Self {
        TimingInput::Native(descriptor)
    }
}

impl From<TweenConfigRecord> for TimingInput {
    fn from(record: TweenConfigRecord) -> Self {
        TimingInput::Record(record)
    }
}

impl From<TweenConfig> for TimingInput {
    fn from(config: TweenConfig) -> Self {
        TimingInput::Config(config)
    }
}

/// Convert any timing shape into the canonical config
pub fn normalize(input: impl Into<TimingInput>) -> TweenConfig {
    match input.into() {
        TimingInput::Config(config) => config,
        TimingInput::Native(native) => TweenConfig {
            easing: Easing::styled(native.style, native.direction),
            duration: native.time,
            start_delay: native.delay_time,
            repeat_count: native.repeat_count,
            repeat_delay: 0.0,
            reverse_delay: 0.0,
            should_reverse: native.reverses,
        },
        TimingInput::Record(record) => TweenConfig {
            easing: record.easing(),
            duration: record.duration.unwrap_or(0.0),
            start_delay: record.start_delay.unwrap_or(0.0),
            repeat_count: record.repeat_count(),
            repeat_delay: record.repeat_delay.unwrap_or(0.0),
            reverse_delay: record.reverse_delay.unwrap_or(0.0),
            should_reverse: record.should_reverse.unwrap_or(false),
        },
    }
}
