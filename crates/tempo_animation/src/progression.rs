//! Progression state machine
//!
//! A [`Progression`] owns the canonical config of one tween and the mutable
//! phase variables that describe where the tween is: local progress within
//! the current leg (`fade`), whether the leg is a reverse leg, and how many
//! cycles have been played.
//!
//! Progress moves in one of two ways:
//!
//! - [`Progression::advance`] adds a frame delta to `fade`
//! - [`Progression::sync_to`] re-derives `fade` from an anchor timestamp,
//!   so progress does not drift with frame jitter
//!
//! Both feed the same stage-completion loop. The loop runs while
//! `fade >= 1`, so one large step can fast-forward through several reverse
//! and repeat stages.
//!
//! Internally `fade` goes negative while inside a delay window (the start
//! delay, or a reverse/repeat delay between stages). Reads clamp it to
//! `[0, 1]`.

use crate::config::TweenConfig;
use crate::error::Result;
use serde::{Deserialize, Serialize};

/// Identity of one run of the per-frame loop
#[derive(Clone, Copy, Debug, PartialEq, Eq, Hash)]
pub struct RunToken(u64);

/// Fully populated read view of a progression
#[derive(Clone, Copy, Debug, PartialEq, Serialize, Deserialize)]
pub struct StateSnapshot {
    /// Index of the cycle in progress, counted from 1
    pub playing_count: u32,
    /// Completed cycles
    pub played_count: u32,
    pub repeating_count: u32,
    pub repeated_count: u32,
    /// `fade` as seen from the start of the forward leg
    pub reversed_fade: f64,
    pub is_reversing: bool,
    /// Local progress within the current leg, in `[0, 1]`
    pub fade: f64,
    /// Reserved; always `None`
    pub total_seconds: Option<f64>,
}

/// Partial write to a progression
///
/// `total_seconds` seeks to an absolute position measured from the start of
/// the run (start delay included). The remaining phase fields override what
/// the seek computed. `delay` is only read by the timing driver: seconds to
/// wait before starting, or when negative, seconds already elapsed.
#[derive(Clone, Copy, Debug, Default, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct StatePatch {
    #[serde(skip_serializing_if = "Option::is_none")]
    pub total_seconds: Option<f64>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub played_count: Option<u32>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub is_reversing: Option<bool>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub fade: Option<f64>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub delay: Option<f64>,
}

impl StatePatch {
    /// Seek to `total_seconds` from the start of the run
    pub fn seek(total_seconds: f64) -> Self {
        Self {
            total_seconds: Some(total_seconds),
            ..Self::default()
        }
    }

    /// Start after `delay` seconds
    pub fn delayed(delay: f64) -> Self {
        Self {
            delay: Some(delay),
            ..Self::default()
        }
    }

    pub fn with_total_seconds(mut self, total_seconds: f64) -> Self {
        self.total_seconds = Some(total_seconds);
        self
    }

    pub fn with_played_count(mut self, played_count: u32) -> Self {
        self.played_count = Some(played_count);
        self
    }

    pub fn with_reversing(mut self, is_reversing: bool) -> Self {
        self.is_reversing = Some(is_reversing);
        self
    }

    pub fn with_fade(mut self, fade: f64) -> Self {
        self.fade = Some(fade);
        self
    }

    pub fn with_delay(mut self, delay: f64) -> Self {
        self.delay = Some(delay);
        self
    }

    fn overrides_phase(&self) -> bool {
        self.played_count.is_some() || self.is_reversing.is_some() || self.fade.is_some()
    }
}

impl From<StateSnapshot> for StatePatch {
    fn from(snapshot: StateSnapshot) -> Self {
        Self {
            played_count: Some(snapshot.played_count),
            is_reversing: Some(snapshot.is_reversing),
            fade: Some(snapshot.fade),
            ..Self::default()
        }
    }
}

/// Phase state of one tween
#[derive(Clone, Debug)]
pub struct Progression {
    config: TweenConfig,
    fade: f64,
    is_reversing: bool,
    played_count: u32,
    has_completed: bool,
    /// Host time at which `fade` is 0 for the current stage
    anchor: Option<f64>,
    run_token: Option<RunToken>,
    issued_tokens: u64,
}

impl Progression {
    /// Create a progression at the start of its first leg
    pub fn new(config: TweenConfig) -> Result<Self> {
        config.validate()?;
        let mut progression = Self {
            config,
            fade: 0.0,
            is_reversing: false,
            played_count: 0,
            has_completed: false,
            anchor: None,
            run_token: None,
            issued_tokens: 0,
        };
        progression.reset();
        Ok(progression)
    }

    pub fn config(&self) -> &TweenConfig {
        &self.config
    }

    /// Rewind to the beginning of the run, start delay included
    pub fn reset(&mut self) {
        self.fade = -self.config.start_delay / self.config.duration;
        self.is_reversing = false;
        self.played_count = 0;
        self.has_completed = false;
    }

    /// Seek and/or override phase variables
    ///
    /// Returns the multiplier for the resulting position.
    pub fn apply_patch(&mut self, patch: &StatePatch) -> f32 {
        if let Some(total_seconds) = patch.total_seconds {
            self.reset();
            self.fade = (total_seconds - self.config.start_delay) / self.config.duration;
            self.resolve_stages(None);
        }

        if patch.overrides_phase() {
            if let Some(played_count) = patch.played_count {
                self.played_count = played_count;
            }
            if let Some(is_reversing) = patch.is_reversing {
                self.is_reversing = is_reversing;
            }
            if let Some(fade) = patch.fade {
                self.fade = fade;
            }
            self.has_completed = false;
            self.resolve_stages(None);
        }

        self.multiplier()
    }

    /// Move forward by `delta` seconds
    ///
    /// Returns the multiplier to emit, or `None` when already complete or
    /// still waiting out a delay.
    pub fn advance(&mut self, delta: f64) -> Option<f32> {
        if self.has_completed {
            return None;
        }
        self.fade += delta / self.config.duration;
        self.settle(None)
    }

    /// Re-derive progress from the anchor at host time `now`
    pub fn sync_to(&mut self, now: f64) -> Option<f32> {
        if self.has_completed {
            return None;
        }
        let anchor = self.anchor?;
        self.fade = (now - anchor) / self.config.duration;
        self.settle(Some(now))
    }

    fn settle(&mut self, now: Option<f64>) -> Option<f32> {
        if self.fade < 0.0 {
            return None;
        }
        let transitions = self.resolve_stages(now);
        // Inside an inter-stage delay: hold the boundary value once
        if self.fade < 0.0 && transitions == 0 {
            return None;
        }
        Some(self.multiplier())
    }

    /// Stage-completion loop; returns the number of stage changes
    fn resolve_stages(&mut self, now: Option<f64>) -> u32 {
        let mut transitions = 0;
        while self.fade >= 1.0 {
            if self.config.should_reverse && !self.is_reversing {
                self.is_reversing = true;
                self.shift_stage(self.config.reverse_delay, now);
                tracing::trace!(played = self.played_count, "entering reverse leg");
            } else if self.played_count + 1 < self.config.play_count() {
                self.is_reversing = false;
                self.played_count += 1;
                self.shift_stage(self.config.repeat_delay, now);
                tracing::trace!(played = self.played_count, "starting repeat cycle");
            } else {
                self.has_completed = true;
                self.fade = 1.0;
                tracing::trace!(played = self.played_count, "progression complete");
                break;
            }
            transitions += 1;
        }
        transitions
    }

    fn shift_stage(&mut self, delay: f64, now: Option<f64>) {
        let duration = self.config.duration;
        match (now, self.anchor.as_mut()) {
            (Some(now), Some(anchor)) => {
                *anchor += delay + duration;
                self.fade = (now - *anchor) / duration;
            }
            _ => self.fade -= 1.0 + delay / duration,
        }
    }

    /// Anchor the current position to host time `now`
    ///
    /// `over_elapsed` is time that already passed before `now` and counts
    /// as progress.
    pub fn anchor_at(&mut self, now: f64, over_elapsed: f64) {
        self.anchor = Some(now - self.fade * self.config.duration - over_elapsed);
    }

    pub fn anchor(&self) -> Option<f64> {
        self.anchor
    }

    /// Issue a new run token, invalidating any earlier run
    pub fn begin_run(&mut self) -> RunToken {
        self.issued_tokens += 1;
        let token = RunToken(self.issued_tokens);
        self.run_token = Some(token);
        token
    }

    /// Whether `token` is the live run
    pub fn owns(&self, token: RunToken) -> bool {
        self.run_token == Some(token)
    }

    /// Release `token` if it is still live
    pub fn end_run(&mut self, token: RunToken) {
        if self.owns(token) {
            self.run_token = None;
            self.anchor = None;
        }
    }

    /// Invalidate the live run; returns whether one existed
    pub fn cancel(&mut self) -> bool {
        self.anchor = None;
        self.run_token.take().is_some()
    }

    pub fn is_running(&self) -> bool {
        self.run_token.is_some()
    }

    pub fn is_complete(&self) -> bool {
        self.has_completed
    }

    pub fn is_reversing(&self) -> bool {
        self.is_reversing
    }

    pub fn played_count(&self) -> u32 {
        self.played_count
    }

    /// Local progress clamped to `[0, 1]`
    pub fn fade(&self) -> f64 {
        self.fade.clamp(0.0, 1.0)
    }

    /// Position between origin (0) and goal (1) before easing
    pub fn multiplier(&self) -> f32 {
        let fade = self.fade();
        let multiplier = if self.is_reversing { 1.0 - fade } else { fade };
        multiplier as f32
    }

    pub fn snapshot(&self) -> StateSnapshot {
        let fade = self.fade();
        StateSnapshot {
            playing_count: self.played_count + 1,
            played_count: self.played_count,
            repeating_count: self.played_count,
            repeated_count: self.played_count.saturating_sub(1),
            reversed_fade: if self.is_reversing { 1.0 - fade } else { fade },
            is_reversing: self.is_reversing,
            fade,
            total_seconds: None,
        }
    }
}
