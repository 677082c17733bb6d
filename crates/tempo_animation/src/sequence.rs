//! Sequence composition
//!
//! A [`Sequence`] places [`Playable`] children at keypoints on one
//! timeline. It never looks inside a child: playing, scrubbing and
//! cancelling are forwarded after translating the global timeline position
//! into a per-child delay or local time.
//!
//! Children are assumed to be single-shot. A child with repeat or reverse
//! cycles is accepted, but only its total duration is used for placement.

use crate::error::{Result, RunOutcome, TweenError};
use crate::progression::StatePatch;
use crate::tween::Tween;
use futures::future::{self, BoxFuture, FutureExt};
use slotmap::{new_key_type, SlotMap};
use smallvec::{smallvec, SmallVec};
use std::fmt;
use std::future::Future;
use std::sync::{Arc, Mutex, MutexGuard, PoisonError};

new_key_type! {
    /// Identifier of a child within one sequence
    pub struct TimelineEntryId;
}

/// Anything a sequence can place on its timeline
///
/// `StatePatch::total_seconds` passed to [`Playable::play`] and
/// [`Playable::lerp`] is measured from the start of the child's own run in
/// the requested direction.
pub trait Playable: Send + Sync {
    /// Wall-clock length of a full run
    fn total_duration(&self) -> f64;

    /// Timing feature a sequence cannot remap, if the child uses one
    fn unsupported_feature(&self) -> Option<&'static str> {
        None
    }

    fn play(&self, patch: Option<StatePatch>) -> BoxFuture<'static, Result<RunOutcome>>;

    /// Jump to the patched position and emit, without a host
    fn lerp(&self, patch: &StatePatch) -> Result<()>;

    fn cancel(&self);

    fn is_running(&self) -> bool;
}

impl<T: Clone + Send + Sync + 'static> Playable for Tween<T> {
    fn total_duration(&self) -> f64 {
        Tween::total_duration(self)
    }

    fn unsupported_feature(&self) -> Option<&'static str> {
        let config = self.config();
        if config.should_reverse {
            Some("reverse")
        } else if config.repeat_count > 0 {
            Some("repeat")
        } else {
            None
        }
    }

    fn play(&self, patch: Option<StatePatch>) -> BoxFuture<'static, Result<RunOutcome>> {
        Tween::play(self, patch).boxed()
    }

    fn lerp(&self, patch: &StatePatch) -> Result<()> {
        Tween::lerp(self, patch).map(drop)
    }

    fn cancel(&self) {
        Tween::cancel(self)
    }

    fn is_running(&self) -> bool {
        Tween::is_running(self)
    }
}

struct TimelineEntry {
    keypoint: f64,
    child: Arc<dyn Playable>,
}

#[derive(Default)]
struct Timeline {
    entries: SlotMap<TimelineEntryId, TimelineEntry>,
    /// Sorted by keypoint; children keep insertion order
    keypoints: Vec<(f64, SmallVec<[TimelineEntryId; 4]>)>,
    duration: f64,
}

impl Timeline {
    fn insert(&mut self, keypoint: f64, child: Arc<dyn Playable>) -> TimelineEntryId {
        self.duration = self.duration.max(keypoint + child.total_duration());
        let id = self.entries.insert(TimelineEntry { keypoint, child });

        let slot = self
            .keypoints
            .partition_point(|(existing, _)| *existing < keypoint);
        let shared = self
            .keypoints
            .get(slot)
            .is_some_and(|(existing, _)| *existing == keypoint);
        if shared {
            self.keypoints[slot].1.push(id);
        } else {
            self.keypoints.insert(slot, (keypoint, smallvec![id]));
        }
        id
    }

    /// Children in timeline order
    fn layout(&self) -> Vec<(f64, Arc<dyn Playable>)> {
        self.keypoints
            .iter()
            .flat_map(|(_, ids)| ids.iter())
            .filter_map(|id| self.entries.get(*id))
            .map(|entry| (entry.keypoint, entry.child.clone()))
            .collect()
    }
}

/// Why a sequence run stopped early
enum Interrupted {
    Cancelled,
    Failed(TweenError),
}

fn interruption(outcome: Result<RunOutcome>) -> std::result::Result<(), Interrupted> {
    match outcome {
        Ok(RunOutcome::Completed) => Ok(()),
        Ok(RunOutcome::Cancelled) => Err(Interrupted::Cancelled),
        Err(err) => Err(Interrupted::Failed(err)),
    }
}

/// Children composed at fixed timeline offsets
#[derive(Clone, Default)]
pub struct Sequence {
    timeline: Arc<Mutex<Timeline>>,
}

impl Sequence {
    pub fn new() -> Self {
        Self::default()
    }

    fn timeline(&self) -> MutexGuard<'_, Timeline> {
        self.timeline.lock().unwrap_or_else(PoisonError::into_inner)
    }

    /// Place `child` at `keypoint` seconds from the start
    pub fn add<P: Playable + 'static>(&self, child: P, keypoint: f64) -> Result<TimelineEntryId> {
        if !keypoint.is_finite() || keypoint < 0.0 {
            return Err(TweenError::invalid_config(format!(
                "keypoint must be zero or positive, got {keypoint}"
            )));
        }
        if let Some(feature) = child.unsupported_feature() {
            let warning = TweenError::UnsupportedCompositionFeature { keypoint, feature };
            tracing::warn!(%warning, "sequence child will not be remapped accurately");
        }
        Ok(self.timeline().insert(keypoint, Arc::new(child)))
    }

    /// End of the last child, in seconds
    pub fn duration(&self) -> f64 {
        self.timeline().duration
    }

    pub fn len(&self) -> usize {
        self.timeline().entries.len()
    }

    pub fn is_empty(&self) -> bool {
        self.timeline().entries.is_empty()
    }

    /// Keypoint of a child
    pub fn keypoint(&self, id: TimelineEntryId) -> Option<f64> {
        self.timeline().entries.get(id).map(|entry| entry.keypoint)
    }

    fn snapshot(&self) -> (Vec<(f64, Arc<dyn Playable>)>, f64) {
        let timeline = self.timeline();
        (timeline.layout(), timeline.duration)
    }

    /// Play every child from the patched timeline position
    ///
    /// `total_seconds` is a position on the forward timeline. It defaults to
    /// the start, or to the end when `is_reversing` is set. Children already
    /// behind the position catch up instead of waiting.
    ///
    /// Resolves when all children complete. The first cancellation or
    /// failure cancels the remaining children and is reported.
    pub fn play(
        &self,
        patch: Option<StatePatch>,
    ) -> impl Future<Output = Result<RunOutcome>> + Send + 'static {
        let (children, duration) = self.snapshot();
        let patch = patch.unwrap_or_default();
        let reverse = patch.is_reversing.unwrap_or(false);
        let position = patch
            .total_seconds
            .unwrap_or(if reverse { duration } else { 0.0 });
        let extra_delay = patch.delay.unwrap_or(0.0);

        let runs: Vec<_> = children
            .iter()
            .map(|(keypoint, child)| {
                let delay = if reverse {
                    position - (keypoint + child.total_duration())
                } else {
                    keypoint - position
                };
                let child_patch = StatePatch {
                    total_seconds: Some(0.0),
                    is_reversing: Some(reverse),
                    delay: Some(delay + extra_delay),
                    ..StatePatch::default()
                };
                child.play(Some(child_patch)).map(interruption)
            })
            .collect();
        tracing::debug!(
            children = runs.len(),
            position,
            reverse,
            "sequence run started"
        );

        async move {
            match future::try_join_all(runs).await {
                Ok(_) => {
                    tracing::debug!("sequence run completed");
                    Ok(RunOutcome::Completed)
                }
                Err(interrupted) => {
                    for (_, child) in &children {
                        child.cancel();
                    }
                    match interrupted {
                        Interrupted::Cancelled => {
                            tracing::debug!("sequence run cancelled");
                            Ok(RunOutcome::Cancelled)
                        }
                        Interrupted::Failed(err) => Err(err),
                    }
                }
            }
        }
    }

    /// Scrub every child to the patched position without a host
    ///
    /// `total_seconds` is measured from the start of playback in the
    /// requested direction and defaults to 0.
    pub fn lerp(&self, patch: &StatePatch) -> Result<()> {
        let (children, duration) = self.snapshot();
        let reverse = patch.is_reversing.unwrap_or(false);
        let position = patch.total_seconds.unwrap_or(0.0);

        for (keypoint, child) in &children {
            let child_duration = child.total_duration();
            let local = if reverse {
                position - (duration - keypoint - child_duration)
            } else {
                position - keypoint
            };
            let mut child_patch = StatePatch::seek(local);
            if reverse {
                child_patch.is_reversing = Some(true);
            }
            child.lerp(&child_patch)?;
        }
        Ok(())
    }

    /// Cancel every child run
    pub fn cancel(&self) {
        let (children, _) = self.snapshot();
        for (_, child) in &children {
            child.cancel();
        }
    }

    /// Whether any child is running
    pub fn is_running(&self) -> bool {
        let (children, _) = self.snapshot();
        children.iter().any(|(_, child)| child.is_running())
    }
}

impl Playable for Sequence {
    fn total_duration(&self) -> f64 {
        self.duration()
    }

    fn play(&self, patch: Option<StatePatch>) -> BoxFuture<'static, Result<RunOutcome>> {
        // Reverse runs count from the end of the forward timeline
        let patch = patch.map(|mut patch| {
            if patch.is_reversing == Some(true) {
                patch.total_seconds = patch.total_seconds.map(|t| self.duration() - t);
            }
            patch
        });
        Sequence::play(self, patch).boxed()
    }

    fn lerp(&self, patch: &StatePatch) -> Result<()> {
        Sequence::lerp(self, patch)
    }

    fn cancel(&self) {
        Sequence::cancel(self)
    }

    fn is_running(&self) -> bool {
        Sequence::is_running(self)
    }
}

impl fmt::Debug for Sequence {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        let timeline = self.timeline();
        f.debug_struct("Sequence")
            .field("children", &timeline.entries.len())
            .field("keypoints", &timeline.keypoints.len())
            .field("duration", &timeline.duration)
            .finish()
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::config::TweenConfig;
    use tempo_core::ManualHost;

    fn tween(duration: f64) -> Tween<f32> {
        Tween::builder()
            .origin(0.0f32)
            .goal(10.0)
            .config(TweenConfig::new(duration))
            .host(ManualHost::new())
            .build()
            .unwrap()
    }

    #[test]
    fn test_duration_grows_with_children() {
        let sequence = Sequence::new();
        assert!(sequence.is_empty());
        assert_eq!(sequence.duration(), 0.0);

        sequence.add(tween(1.0), 0.0).unwrap();
        assert_eq!(sequence.duration(), 1.0);
        sequence.add(tween(1.0), 2.0).unwrap();
        assert_eq!(sequence.duration(), 3.0);
        sequence.add(tween(0.5), 1.0).unwrap();
        assert_eq!(sequence.duration(), 3.0);
        assert_eq!(sequence.len(), 3);
    }

    #[test]
    fn test_layout_orders_by_keypoint_then_insertion() {
        let sequence = Sequence::new();
        let late = sequence.add(tween(1.0), 2.0).unwrap();
        let early = sequence.add(tween(1.0), 0.5).unwrap();
        let shared = sequence.add(tween(2.0), 2.0).unwrap();

        let timeline = sequence.timeline();
        let order: Vec<_> = timeline
            .keypoints
            .iter()
            .flat_map(|(_, ids)| ids.iter().copied())
            .collect();
        assert_eq!(order, vec![early, late, shared]);
        assert_eq!(timeline.keypoints.len(), 2);
        drop(timeline);

        assert_eq!(sequence.keypoint(shared), Some(2.0));
    }

    #[test]
    fn test_cyclic_child_is_accepted() {
        let cyclic = Tween::builder()
            .origin(0.0f32)
            .goal(1.0)
            .config(TweenConfig::new(1.0).with_reverse(0.0))
            .host(ManualHost::new())
            .build()
            .unwrap();
        assert_eq!(cyclic.unsupported_feature(), Some("reverse"));

        let sequence = Sequence::new();
        sequence.add(cyclic, 1.0).unwrap();
        assert_eq!(sequence.duration(), 3.0);
    }

    #[test]
    fn test_rejects_bad_keypoint() {
        let sequence = Sequence::new();
        assert!(sequence.add(tween(1.0), -1.0).is_err());
        assert!(sequence.add(tween(1.0), f64::NAN).is_err());
        assert!(sequence.is_empty());
    }

    #[test]
    fn test_lerp_forward() {
        let (a, b) = (tween(1.0), tween(1.0));
        let sequence = Sequence::new();
        sequence.add(a.clone(), 0.0).unwrap();
        sequence.add(b.clone(), 2.0).unwrap();

        sequence.lerp(&StatePatch::seek(0.5)).unwrap();
        assert_eq!((a.value(), b.value()), (Some(5.0), Some(0.0)));

        sequence.lerp(&StatePatch::seek(2.5)).unwrap();
        assert_eq!((a.value(), b.value()), (Some(10.0), Some(5.0)));
    }

    #[test]
    fn test_lerp_reverse() {
        let (a, b) = (tween(1.0), tween(1.0));
        let sequence = Sequence::new();
        sequence.add(a.clone(), 0.0).unwrap();
        sequence.add(b.clone(), 2.0).unwrap();

        let reverse = StatePatch::seek(0.25).with_reversing(true);
        sequence.lerp(&reverse).unwrap();
        assert_eq!((a.value(), b.value()), (Some(10.0), Some(7.5)));

        let reverse = StatePatch::seek(2.75).with_reversing(true);
        sequence.lerp(&reverse).unwrap();
        assert_eq!((a.value(), b.value()), (Some(2.5), Some(0.0)));
    }
}
