//! Tempo Core Runtime
//!
//! This crate provides the primitives the Tempo animation system runs on:
//!
//! - **Observable Cells**: change-notified values used as live tween endpoints
//!   and as outputs of stateful tweens
//! - **Frame Hosts**: monotonic clock, per-frame await and delays, either in
//!   real time on tokio or stepped manually
//!
//! # Example
//!
//! ```rust
//! use tempo_core::{FrameHost, ManualHost, Observable};
//!
//! let host = ManualHost::new();
//! host.step(1.0 / 60.0);
//! assert!(host.now() > 0.0);
//!
//! let opacity = Observable::new(0.0f32);
//! opacity.set(0.5);
//! assert_eq!(opacity.peek(), 0.5);
//! ```

pub mod host;
pub mod observable;

pub use host::{Frame, FrameHost, ManualHost, SharedHost, TokioHost};
pub use observable::{ChangeCallback, DirtyFlag, Observable, SubscriberId, Subscription};
