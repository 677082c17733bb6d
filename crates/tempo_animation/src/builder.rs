//! Fluent tween construction
//!
//! ```rust
//! use tempo_animation::{EasingDirection, EasingStyle, TimingDescriptor, TweenBuilder};
//! use tempo_core::ManualHost;
//!
//! let tween = TweenBuilder::new()
//!     .origin(0.0f32)
//!     .goal(100.0)
//!     .config(TimingDescriptor::new(0.5).with_style(EasingStyle::Sine, EasingDirection::InOut))
//!     .host(ManualHost::new())
//!     .on_step(|x| println!("x = {x}"))
//!     .unwrap();
//!
//! assert_eq!(tween.total_duration(), 0.5);
//! ```

use crate::config::{normalize, TimingInput, TweenConfig};
use crate::error::{Result, TweenError};
use crate::lerp::LerpRegistry;
use crate::tween::{Consumer, Endpoint, Tween};
use std::sync::Arc;
use tempo_core::{FrameHost, Observable, SharedHost, TokioHost};

/// Accumulates the parts of a [`Tween`]
///
/// Without an explicit host the tween runs on a [`TokioHost`]; without an
/// explicit registry it uses [`LerpRegistry::global`]. Timing defaults to a
/// one second linear tween.
pub struct TweenBuilder<T> {
    origin: Option<Endpoint<T>>,
    goal: Option<Endpoint<T>>,
    config: TweenConfig,
    host: Option<SharedHost>,
    registry: Option<Arc<LerpRegistry>>,
}

impl<T: Clone + Send + Sync + 'static> TweenBuilder<T> {
    pub fn new() -> Self {
        Self {
            origin: None,
            goal: None,
            config: TweenConfig::new(1.0),
            host: None,
            registry: None,
        }
    }

    pub fn origin(mut self, value: T) -> Self {
        self.origin = Some(Endpoint::Fixed(value));
        self
    }

    /// Use a live cell as the origin
    pub fn origin_cell(mut self, cell: Observable<T>) -> Self {
        self.origin = Some(Endpoint::Live(cell));
        self
    }

    pub fn goal(mut self, value: T) -> Self {
        self.goal = Some(Endpoint::Fixed(value));
        self
    }

    /// Use a live cell as the goal
    pub fn goal_cell(mut self, cell: Observable<T>) -> Self {
        self.goal = Some(Endpoint::Live(cell));
        self
    }

    /// Timing from any accepted shape
    pub fn config(mut self, timing: impl Into<TimingInput>) -> Self {
        self.config = normalize(timing);
        self
    }

    pub fn host(self, host: impl FrameHost) -> Self {
        self.shared_host(Arc::new(host))
    }

    pub fn shared_host(mut self, host: SharedHost) -> Self {
        self.host = Some(host);
        self
    }

    pub fn registry(mut self, registry: Arc<LerpRegistry>) -> Self {
        self.registry = Some(registry);
        self
    }

    /// Build a tween that pushes every value to `on_step`
    pub fn on_step<F>(self, on_step: F) -> Result<Tween<T>>
    where
        F: FnMut(&T) + Send + 'static,
    {
        self.finish(Some(Box::new(on_step)))
    }

    /// Build a tween that mirrors every value into `cell`
    pub fn into_cell(self, cell: Observable<T>) -> Result<Tween<T>> {
        self.finish(Some(Box::new(move |value: &T| cell.set(value.clone()))))
    }

    /// Build a tween without a consumer; read it with [`Tween::value`]
    pub fn build(self) -> Result<Tween<T>> {
        self.finish(None)
    }

    fn finish(self, consumer: Option<Consumer<T>>) -> Result<Tween<T>> {
        let origin = self.origin.ok_or(TweenError::MissingEndpoint("origin"))?;
        let goal = self.goal.ok_or(TweenError::MissingEndpoint("goal"))?;
        let host = self
            .host
            .unwrap_or_else(|| Arc::new(TokioHost::default()));
        let registry = self.registry.unwrap_or_else(LerpRegistry::global);
        Tween::from_parts(origin, goal, self.config, consumer, host, registry)
    }
}

impl<T: Clone + Send + Sync + 'static> Default for TweenBuilder<T> {
    fn default() -> Self {
        Self::new()
    }
}
