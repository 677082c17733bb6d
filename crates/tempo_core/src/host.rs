//! Host scheduling primitives
//!
//! Animation drivers never read the system clock or sleep directly. They go
//! through a [`FrameHost`], which supplies:
//!
//! - a monotonic clock in seconds
//! - a per-frame await that resolves with the seconds since the previous frame
//! - a delay primitive
//!
//! Two hosts are provided. [`TokioHost`] runs in real time on the tokio timer
//! with frames at a fixed rate. [`ManualHost`] only advances when
//! [`ManualHost::step`] publishes a frame, which makes timing fully
//! deterministic for tests and offline rendering.

use futures::future::{self, BoxFuture};
use std::sync::Arc;
use std::time::Duration;
use tokio::sync::watch;
use tokio::time::Instant;

/// Frame clock consumed by animation drivers
pub trait FrameHost: Send + Sync + 'static {
    /// Monotonic time in seconds
    fn now(&self) -> f64;

    /// Suspend until the next frame, resolving with the elapsed seconds
    fn next_frame(&self) -> BoxFuture<'static, f64>;

    /// Suspend for `seconds` of host time
    fn delay(&self, seconds: f64) -> BoxFuture<'static, ()>;
}

/// Host shared between every tween driven by it
pub type SharedHost = Arc<dyn FrameHost>;

// ============================================================================
// Real-time host
// ============================================================================

/// Real-time host driven by the tokio timer
///
/// Frames land on fixed boundaries measured from the host's creation, so all
/// tweens sharing a host wake on the same frame.
#[derive(Clone, Debug)]
pub struct TokioHost {
    origin: Instant,
    frame_interval: Duration,
}

impl TokioHost {
    pub fn new(target_fps: u32) -> Self {
        let fps = target_fps.max(1);
        Self {
            origin: Instant::now(),
            frame_interval: Duration::from_secs(1) / fps,
        }
    }

    /// Duration of one frame
    pub fn frame_interval(&self) -> Duration {
        self.frame_interval
    }

    fn next_boundary(&self) -> Instant {
        let interval = self.frame_interval.as_nanos().max(1);
        let frames = self.origin.elapsed().as_nanos() / interval + 1;
        let offset = u64::try_from(frames * interval).unwrap_or(u64::MAX);
        self.origin + Duration::from_nanos(offset)
    }
}

impl Default for TokioHost {
    fn default() -> Self {
        Self::new(120)
    }
}

impl FrameHost for TokioHost {
    fn now(&self) -> f64 {
        self.origin.elapsed().as_secs_f64()
    }

    fn next_frame(&self) -> BoxFuture<'static, f64> {
        let deadline = self.next_boundary();
        let delta = self.frame_interval.as_secs_f64();
        Box::pin(async move {
            tokio::time::sleep_until(deadline).await;
            delta
        })
    }

    fn delay(&self, seconds: f64) -> BoxFuture<'static, ()> {
        if seconds.is_nan() || seconds <= 0.0 {
            return Box::pin(future::ready(()));
        }
        let duration = Duration::try_from_secs_f64(seconds).unwrap_or(Duration::MAX);
        Box::pin(tokio::time::sleep(duration))
    }
}

// ============================================================================
// Manually stepped host
// ============================================================================

/// One published frame of a [`ManualHost`]
#[derive(Clone, Copy, Debug, Default, PartialEq)]
pub struct Frame {
    /// Number of frames published so far
    pub index: u64,
    /// Host time at this frame, in seconds
    pub timestamp: f64,
    /// Seconds since the previous frame
    pub delta: f64,
}

/// Host whose clock only moves when a frame is stepped
///
/// Waiters that miss intermediate frames observe the latest one; drivers
/// derive progress from [`FrameHost::now`], so nothing is lost.
#[derive(Clone, Debug)]
pub struct ManualHost {
    frames: Arc<watch::Sender<Frame>>,
}

impl ManualHost {
    pub fn new() -> Self {
        let (frames, _) = watch::channel(Frame::default());
        Self {
            frames: Arc::new(frames),
        }
    }

    /// Publish a frame `delta` seconds after the previous one
    pub fn step(&self, delta: f64) -> Frame {
        self.frames.send_modify(|frame| {
            frame.index += 1;
            frame.timestamp += delta;
            frame.delta = delta;
        });
        self.frame()
    }

    /// The most recently published frame
    pub fn frame(&self) -> Frame {
        *self.frames.borrow()
    }

    /// Publish `count` frames, yielding to other tasks after each one
    pub async fn run_frames(&self, count: usize, delta: f64) {
        for _ in 0..count {
            self.step(delta);
            tokio::task::yield_now().await;
        }
    }
}

impl Default for ManualHost {
    fn default() -> Self {
        Self::new()
    }
}

impl FrameHost for ManualHost {
    fn now(&self) -> f64 {
        self.frames.borrow().timestamp
    }

    fn next_frame(&self) -> BoxFuture<'static, f64> {
        let mut frames = self.frames.subscribe();
        let sender = self.frames.clone();
        Box::pin(async move {
            let _sender = sender;
            if frames.changed().await.is_err() {
                return 0.0;
            }
            let delta = frames.borrow().delta;
            delta
        })
    }

    fn delay(&self, seconds: f64) -> BoxFuture<'static, ()> {
        let mut frames = self.frames.subscribe();
        let sender = self.frames.clone();
        let target = frames.borrow().timestamp + seconds;
        Box::pin(async move {
            let _sender = sender;
            loop {
                let reached = frames.borrow_and_update().timestamp >= target;
                if reached || frames.changed().await.is_err() {
                    break;
                }
            }
        })
    }
}
