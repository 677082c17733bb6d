//! Observable cells
//!
//! A cell holds one value and notifies its subscribers every time the value
//! is replaced. Animations use cells both as live endpoints (re-read when they
//! change) and as output targets for stateful tweens.
//!
//! ```rust
//! use tempo_core::observable::Observable;
//! use std::sync::atomic::{AtomicBool, Ordering};
//! use std::sync::Arc;
//!
//! let cell = Observable::new(1.0f32);
//! let changed = Arc::new(AtomicBool::new(false));
//! let flag = changed.clone();
//! let _sub = cell.on_change(move |_| flag.store(true, Ordering::SeqCst));
//!
//! cell.set(2.0);
//! assert_eq!(cell.peek(), 2.0);
//! assert!(changed.load(Ordering::SeqCst));
//! ```

use slotmap::{new_key_type, SlotMap};
use smallvec::SmallVec;
use std::fmt;
use std::sync::atomic::AtomicBool;
use std::sync::{Arc, Mutex, MutexGuard, PoisonError, Weak};

new_key_type! {
    /// Identifier of a change subscriber within one cell
    pub struct SubscriberId;
}

/// Callback invoked with the new value after a cell changes
pub type ChangeCallback<T> = Arc<dyn Fn(&T) + Send + Sync>;

/// Shared flag raised by change notifications and cleared by the reader
pub type DirtyFlag = Arc<AtomicBool>;

struct CellState<T> {
    value: T,
    version: u64,
    subscribers: SlotMap<SubscriberId, ChangeCallback<T>>,
}

type SharedCell<T> = Arc<Mutex<CellState<T>>>;

fn lock<T>(cell: &Mutex<CellState<T>>) -> MutexGuard<'_, CellState<T>> {
    cell.lock().unwrap_or_else(PoisonError::into_inner)
}

/// A change-notified value container
///
/// Cloning an `Observable` yields another handle to the same cell.
pub struct Observable<T> {
    cell: SharedCell<T>,
}

impl<T> Clone for Observable<T> {
    fn clone(&self) -> Self {
        Self {
            cell: self.cell.clone(),
        }
    }
}

impl<T: Clone + Send + 'static> Observable<T> {
    /// Create a cell holding `value`
    pub fn new(value: T) -> Self {
        Self {
            cell: Arc::new(Mutex::new(CellState {
                value,
                version: 0,
                subscribers: SlotMap::with_key(),
            })),
        }
    }

    /// Read the current value without subscribing
    pub fn peek(&self) -> T {
        lock(&self.cell).value.clone()
    }

    /// Number of times the value has been replaced
    pub fn version(&self) -> u64 {
        lock(&self.cell).version
    }

    /// Replace the value and notify subscribers
    ///
    /// Callbacks run after the cell lock is released, so a callback may read
    /// or even write the same cell.
    pub fn set(&self, value: T) {
        self.update(move |current| *current = value);
    }

    /// Mutate the value in place and notify subscribers
    pub fn update(&self, f: impl FnOnce(&mut T)) {
        let (value, callbacks) = {
            let mut state = lock(&self.cell);
            f(&mut state.value);
            state.version += 1;
            let callbacks: SmallVec<[ChangeCallback<T>; 4]> =
                state.subscribers.values().cloned().collect();
            (state.value.clone(), callbacks)
        };

        tracing::trace!(subscribers = callbacks.len(), "observable changed");
        for callback in callbacks {
            callback(&value);
        }
    }

    /// Register a change callback
    ///
    /// The callback stays registered until the returned [`Subscription`] is
    /// dropped or explicitly unsubscribed.
    pub fn on_change<F>(&self, callback: F) -> Subscription
    where
        F: Fn(&T) + Send + Sync + 'static,
    {
        let id = lock(&self.cell).subscribers.insert(Arc::new(callback));
        let weak: Weak<Mutex<CellState<T>>> = Arc::downgrade(&self.cell);
        Subscription {
            release: Some(Box::new(move || {
                if let Some(cell) = weak.upgrade() {
                    lock(&cell).subscribers.remove(id);
                }
            })),
        }
    }

    /// Number of live subscriptions
    pub fn subscriber_count(&self) -> usize {
        lock(&self.cell).subscribers.len()
    }
}

impl<T: fmt::Debug> fmt::Debug for Observable<T> {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        let state = self.cell.lock().unwrap_or_else(PoisonError::into_inner);
        f.debug_struct("Observable")
            .field("value", &state.value)
            .field("version", &state.version)
            .finish()
    }
}

/// Handle to a registered change callback
///
/// Dropping the handle removes the callback from its cell.
#[must_use = "dropping a Subscription unsubscribes immediately"]
pub struct Subscription {
    release: Option<Box<dyn FnOnce() + Send + Sync>>,
}

impl Subscription {
    /// Remove the callback from its cell
    pub fn unsubscribe(mut self) {
        self.release_now();
    }

    fn release_now(&mut self) {
        if let Some(release) = self.release.take() {
            release();
        }
    }
}

impl Drop for Subscription {
    fn drop(&mut self) {
        self.release_now();
    }
}

impl fmt::Debug for Subscription {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("Subscription")
            .field("active", &self.release.is_some())
            .finish()
    }
}
