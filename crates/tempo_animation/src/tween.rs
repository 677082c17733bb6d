//! Timing driver
//!
//! A [`Tween`] couples a [`Progression`] with its endpoints, a consumer and
//! a frame host. [`Tween::play`] anchors the progression to host time and
//! runs the per-frame loop until the progression completes or the run is
//! cancelled.
//!
//! Handles are cheap to clone; every clone drives the same state.

use crate::builder::TweenBuilder;
use crate::config::{TimingInput, TweenConfig};
use crate::error::{Result, RunOutcome, TweenError};
use crate::lerp::{LerpFn, LerpRegistry};
use crate::progression::{Progression, RunToken, StatePatch, StateSnapshot};
use smallvec::SmallVec;
use std::fmt;
use std::future::Future;
use std::sync::atomic::{AtomicBool, Ordering};
use std::sync::{Arc, Mutex, MutexGuard, PoisonError, TryLockError};
use tempo_core::{DirtyFlag, Observable, SharedHost, Subscription};

/// Receives every interpolated value
///
/// Called after the tween's state lock is released, so a consumer may query
/// or cancel its own tween. It must not make the same tween emit again.
pub type Consumer<T> = Box<dyn FnMut(&T) + Send>;

/// Origin or goal of a tween
pub enum Endpoint<T> {
    /// A value fixed at construction
    Fixed(T),
    /// A cell re-read whenever it changes
    Live(Observable<T>),
}

impl<T: Clone + Send + 'static> Endpoint<T> {
    pub fn fixed(value: T) -> Self {
        Endpoint::Fixed(value)
    }

    pub fn live(cell: Observable<T>) -> Self {
        Endpoint::Live(cell)
    }

    /// The endpoint's value right now
    pub fn current(&self) -> T {
        match self {
            Endpoint::Fixed(value) => value.clone(),
            Endpoint::Live(cell) => cell.peek(),
        }
    }
}

impl<T> From<Observable<T>> for Endpoint<T> {
    fn from(cell: Observable<T>) -> Self {
        Endpoint::Live(cell)
    }
}

impl<T: fmt::Debug> fmt::Debug for Endpoint<T> {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Endpoint::Fixed(value) => f.debug_tuple("Fixed").field(value).finish(),
            Endpoint::Live(cell) => f.debug_tuple("Live").field(cell).finish(),
        }
    }
}

/// Endpoints plus the lerp resolved for them
struct Endpoints<T> {
    origin: Endpoint<T>,
    goal: Endpoint<T>,
    registry: Arc<LerpRegistry>,
    lerp: LerpFn<T>,
    /// Raised by live endpoints, cleared when the lerp is rebuilt
    stale: DirtyFlag,
    _subscriptions: SmallVec<[Subscription; 2]>,
}

impl<T: Clone + Send + Sync + 'static> Endpoints<T> {
    fn new(origin: Endpoint<T>, goal: Endpoint<T>, registry: Arc<LerpRegistry>) -> Self {
        let stale: DirtyFlag = Arc::new(AtomicBool::new(false));
        let mut subscriptions = SmallVec::new();
        for endpoint in [&origin, &goal] {
            if let Endpoint::Live(cell) = endpoint {
                let stale = stale.clone();
                subscriptions.push(cell.on_change(move |_| stale.store(true, Ordering::Release)));
            }
        }
        let lerp = registry.resolve(&origin.current(), &goal.current());

        Self {
            origin,
            goal,
            registry,
            lerp,
            stale,
            _subscriptions: subscriptions,
        }
    }

    fn value_at(&mut self, eased: f32) -> T {
        if self.stale.swap(false, Ordering::AcqRel) {
            self.lerp = self
                .registry
                .resolve(&self.origin.current(), &self.goal.current());
            tracing::trace!("endpoint changed, lerp rebuilt");
        }
        (self.lerp)(eased)
    }
}

struct TweenState<T> {
    progression: Progression,
    /// `None` once destroyed
    endpoints: Option<Endpoints<T>>,
    last_value: Option<T>,
}

impl<T: Clone + Send + Sync + 'static> TweenState<T> {
    fn ensure_alive(&self) -> Result<()> {
        match self.endpoints {
            Some(_) => Ok(()),
            None => Err(TweenError::Destroyed),
        }
    }

    /// Ease and interpolate; the caller delivers the value once unlocked
    fn interpolate(&mut self, multiplier: f32) -> Result<T> {
        let eased = self.progression.config().easing.apply(multiplier);
        let endpoints = self.endpoints.as_mut().ok_or(TweenError::Destroyed)?;
        let value = endpoints.value_at(eased);
        self.last_value = Some(value.clone());
        Ok(value)
    }
}

type SharedState<T> = Arc<Mutex<TweenState<T>>>;
type SharedConsumer<T> = Arc<Mutex<Option<Consumer<T>>>>;

fn lock<T>(state: &Mutex<TweenState<T>>) -> MutexGuard<'_, TweenState<T>> {
    state.lock().unwrap_or_else(PoisonError::into_inner)
}

/// Hand `value` to the consumer with the state lock released
fn deliver<T>(
    state: &Mutex<TweenState<T>>,
    consumer: &Mutex<Option<Consumer<T>>>,
    value: &T,
) {
    let mut slot = consumer.lock().unwrap_or_else(PoisonError::into_inner);
    if let Some(on_step) = slot.as_mut() {
        on_step(value);
    }
    // A destroy issued during delivery could not clear the slot itself
    if lock(state).endpoints.is_none() {
        *slot = None;
    }
}

/// Releases a run token when its future finishes or is dropped
struct RunGuard<T> {
    state: SharedState<T>,
    token: RunToken,
}

impl<T> Drop for RunGuard<T> {
    fn drop(&mut self) {
        lock(&self.state).progression.end_run(self.token);
    }
}

/// Handle to a running or idle tween
pub struct Tween<T> {
    state: SharedState<T>,
    consumer: SharedConsumer<T>,
    host: SharedHost,
}

impl<T> Clone for Tween<T> {
    fn clone(&self) -> Self {
        Self {
            state: self.state.clone(),
            consumer: self.consumer.clone(),
            host: self.host.clone(),
        }
    }
}

impl<T: Clone + Send + Sync + 'static> Tween<T> {
    /// Start building a tween
    pub fn builder() -> TweenBuilder<T> {
        TweenBuilder::new()
    }

    /// Tween that pushes every value to `on_step`
    pub fn bound<F>(origin: T, goal: T, timing: impl Into<TimingInput>, on_step: F) -> Result<Self>
    where
        F: FnMut(&T) + Send + 'static,
    {
        TweenBuilder::new()
            .origin(origin)
            .goal(goal)
            .config(timing)
            .on_step(on_step)
    }

    /// Tween that mirrors every value into `cell`
    pub fn stateful(
        origin: T,
        goal: T,
        timing: impl Into<TimingInput>,
        cell: Observable<T>,
    ) -> Result<Self> {
        TweenBuilder::new()
            .origin(origin)
            .goal(goal)
            .config(timing)
            .into_cell(cell)
    }

    pub(crate) fn from_parts(
        origin: Endpoint<T>,
        goal: Endpoint<T>,
        config: TweenConfig,
        consumer: Option<Consumer<T>>,
        host: SharedHost,
        registry: Arc<LerpRegistry>,
    ) -> Result<Self> {
        let progression = Progression::new(config)?;
        let endpoints = Endpoints::new(origin, goal, registry);
        Ok(Self {
            state: Arc::new(Mutex::new(TweenState {
                progression,
                endpoints: Some(endpoints),
                last_value: None,
            })),
            consumer: Arc::new(Mutex::new(consumer)),
            host,
        })
    }

    pub fn config(&self) -> TweenConfig {
        *lock(&self.state).progression.config()
    }

    pub fn total_duration(&self) -> f64 {
        lock(&self.state).progression.config().total_duration()
    }

    pub fn host(&self) -> &SharedHost {
        &self.host
    }

    pub fn snapshot(&self) -> Result<StateSnapshot> {
        let state = lock(&self.state);
        state.ensure_alive()?;
        Ok(state.progression.snapshot())
    }

    /// Seek or override phase variables without emitting
    ///
    /// A running tween is re-anchored so it continues from the new position.
    pub fn apply_patch(&self, patch: &StatePatch) -> Result<()> {
        let mut state = lock(&self.state);
        state.ensure_alive()?;
        state.progression.apply_patch(patch);
        if state.progression.is_running() {
            state.progression.anchor_at(self.host.now(), 0.0);
        }
        Ok(())
    }

    /// Apply a patch and emit the value at the resulting position
    pub fn lerp(&self, patch: &StatePatch) -> Result<T> {
        let value = {
            let mut state = lock(&self.state);
            state.ensure_alive()?;
            let multiplier = state.progression.apply_patch(patch);
            if state.progression.is_running() {
                state.progression.anchor_at(self.host.now(), 0.0);
            }
            state.interpolate(multiplier)?
        };
        deliver(&self.state, &self.consumer, &value);
        Ok(value)
    }

    /// Step the progression by `delta` seconds without a host
    ///
    /// Returns the emitted value, if any.
    pub fn advance(&self, delta: f64) -> Result<Option<T>> {
        let value = {
            let mut state = lock(&self.state);
            state.ensure_alive()?;
            match state.progression.advance(delta) {
                Some(multiplier) => state.interpolate(multiplier)?,
                None => return Ok(None),
            }
        };
        deliver(&self.state, &self.consumer, &value);
        Ok(Some(value))
    }

    /// Ease `multiplier`, interpolate and hand the value to the consumer
    pub fn emit_at(&self, multiplier: f32) -> Result<T> {
        let value = lock(&self.state).interpolate(multiplier)?;
        deliver(&self.state, &self.consumer, &value);
        Ok(value)
    }

    /// The last emitted value
    pub fn value(&self) -> Option<T> {
        lock(&self.state).last_value.clone()
    }

    pub fn is_complete(&self) -> bool {
        lock(&self.state).progression.is_complete()
    }

    pub fn is_running(&self) -> bool {
        lock(&self.state).progression.is_running()
    }

    pub fn is_destroyed(&self) -> bool {
        lock(&self.state).endpoints.is_none()
    }

    /// Stop the live run, if any
    ///
    /// The run observes this on its next frame and reports
    /// [`RunOutcome::Cancelled`]. Phase state is kept.
    pub fn cancel(&self) {
        if lock(&self.state).progression.cancel() {
            tracing::debug!("tween cancelled");
        }
    }

    /// Cancel, drop endpoint subscriptions and the consumer
    pub fn destroy(&self) {
        {
            let mut state = lock(&self.state);
            if state.progression.cancel() {
                tracing::debug!("tween cancelled");
            }
            state.endpoints = None;
            state.last_value = None;
        }
        match self.consumer.try_lock() {
            Ok(mut slot) => *slot = None,
            Err(TryLockError::Poisoned(poisoned)) => *poisoned.into_inner() = None,
            // Mid-delivery; `deliver` drops it once the consumer returns
            Err(TryLockError::WouldBlock) => {}
        }
        tracing::debug!("tween destroyed");
    }

    /// Run the tween against the host clock
    ///
    /// The run token and the start time are taken when `play` is called, so
    /// any earlier run of this tween is superseded immediately and a positive
    /// `delay` counts from the call. Time the run starts late by, whether
    /// from a negative `delay` or a coarse frame, is caught up. A completed
    /// tween restarts from the beginning unless `patch` seeks with
    /// `total_seconds`.
    pub fn play(
        &self,
        patch: Option<StatePatch>,
    ) -> impl Future<Output = Result<RunOutcome>> + Send + 'static {
        let state = self.state.clone();
        let consumer = self.consumer.clone();
        let host = self.host.clone();
        let patch = patch.unwrap_or_default();
        let start = host.now() + patch.delay.unwrap_or(0.0);
        let issued = {
            let mut guard = lock(&state);
            guard
                .ensure_alive()
                .map(|()| guard.progression.begin_run())
        };

        async move {
            let token = issued?;
            let _release = RunGuard {
                state: state.clone(),
                token,
            };
            let remaining = start - host.now();
            if remaining > 0.0 {
                host.delay(remaining).await;
            }

            let (value, completed) = {
                let mut guard = lock(&state);
                if !guard.progression.owns(token) {
                    return Ok(RunOutcome::Cancelled);
                }
                if guard.progression.is_complete() && patch.total_seconds.is_none() {
                    guard.progression.reset();
                }
                guard.progression.apply_patch(&patch);
                let now = host.now();
                let over_elapsed = (now - start).max(0.0);
                guard.progression.anchor_at(now, over_elapsed);
                tracing::debug!(
                    duration = guard.progression.config().total_duration(),
                    over_elapsed,
                    "tween run started"
                );

                // Late starts catch up before the first frame
                let multiplier = if guard.progression.is_complete() {
                    Some(guard.progression.multiplier())
                } else if over_elapsed > 0.0 {
                    guard.progression.sync_to(now)
                } else {
                    None
                };
                let value = match multiplier {
                    Some(multiplier) => Some(guard.interpolate(multiplier)?),
                    None => None,
                };
                let completed = guard.progression.is_complete();
                if completed {
                    guard.progression.end_run(token);
                }
                (value, completed)
            };
            if let Some(value) = value {
                deliver(&state, &consumer, &value);
            }
            if completed {
                tracing::debug!("tween run completed on start");
                return Ok(RunOutcome::Completed);
            }

            loop {
                host.next_frame().await;

                let (value, completed) = {
                    let mut guard = lock(&state);
                    if !guard.progression.owns(token) {
                        tracing::debug!("tween run superseded");
                        return Ok(RunOutcome::Cancelled);
                    }
                    let value = match guard.progression.sync_to(host.now()) {
                        Some(multiplier) => Some(guard.interpolate(multiplier)?),
                        None => None,
                    };
                    let completed = guard.progression.is_complete();
                    if completed {
                        guard.progression.end_run(token);
                    }
                    (value, completed)
                };
                if let Some(value) = value {
                    deliver(&state, &consumer, &value);
                }
                if completed {
                    tracing::debug!("tween run completed");
                    return Ok(RunOutcome::Completed);
                }
            }
        }
    }
}

impl<T> fmt::Debug for Tween<T> {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        let state = lock(&self.state);
        f.debug_struct("Tween")
            .field("config", state.progression.config())
            .field("snapshot", &state.progression.snapshot())
            .field("running", &state.progression.is_running())
            .field("destroyed", &state.endpoints.is_none())
            .finish()
    }
}
