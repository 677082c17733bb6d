//! Tempo Animation System
//!
//! Time-based tweening driven by explicit progression state machines.
//!
//! # Features
//!
//! - **Progression**: fade, reverse and repeat stages with seekable,
//!   serializable state snapshots
//! - **Timing Driver**: drift-free per-frame loop anchored to a host clock,
//!   cancellable through run tokens
//! - **Sequences**: compose tweens (and other sequences) at keypoints,
//!   playable and scrubbable in both directions
//! - **Config Normalizer**: native timing descriptors, loose records and
//!   TOML presets all resolve to one canonical config
//!
//! # Example
//!
//! ```rust
//! use tempo_animation::{StatePatch, Tween, TweenConfig};
//! use tempo_core::ManualHost;
//!
//! let tween = Tween::builder()
//!     .origin(0.0f32)
//!     .goal(1.0)
//!     .config(TweenConfig::new(2.0).with_reverse(0.0))
//!     .host(ManualHost::new())
//!     .build()
//!     .unwrap();
//!
//! assert_eq!(tween.advance(1.0).unwrap(), Some(0.5));
//! assert_eq!(tween.lerp(&StatePatch::seek(3.0)).unwrap(), 0.5);
//! assert!(tween.snapshot().unwrap().is_reversing);
//! ```

pub mod builder;
pub mod config;
pub mod easing;
pub mod error;
pub mod lerp;
pub mod presets;
pub mod progression;
pub mod sequence;
pub mod tween;

pub use builder::TweenBuilder;
pub use config::{normalize, TimingDescriptor, TimingInput, TweenConfig, TweenConfigRecord};
pub use easing::{Easing, EasingDirection, EasingFn, EasingStyle};
pub use error::{Result, RunOutcome, TweenError};
pub use lerp::{LerpFactory, LerpFn, LerpRegistry};
pub use presets::TimingPresets;
pub use progression::{Progression, RunToken, StatePatch, StateSnapshot};
pub use sequence::{Playable, Sequence, TimelineEntryId};
pub use tween::{Consumer, Endpoint, Tween};
