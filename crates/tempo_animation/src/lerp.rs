//! Value interpolation registry
//!
//! Lerpers are selected by the type of the animated value. Each registered
//! type maps to a factory that, given an origin and a goal, returns a function
//! from the eased multiplier to the interpolated value. Types without an entry
//! use a step fallback that holds the origin until halfway and then snaps to
//! the goal.
//!
//! The default registry is built once per process and is read-only. Custom
//! registries can be assembled with [`LerpRegistry::with`] and handed to
//! individual tweens.

use rustc_hash::FxHashMap;
use std::any::{Any, TypeId};
use std::fmt;
use std::sync::{Arc, OnceLock};

/// Interpolation function bound to one origin/goal pair
pub type LerpFn<T> = Arc<dyn Fn(f32) -> T + Send + Sync>;

/// Builds a [`LerpFn`] for an origin/goal pair
pub type LerpFactory<T> = fn(&T, &T) -> LerpFn<T>;

/// Type-indexed table of lerp factories
#[derive(Default)]
pub struct LerpRegistry {
    factories: FxHashMap<TypeId, Box<dyn Any + Send + Sync>>,
}

impl LerpRegistry {
    /// A registry with no entries; every type uses the step fallback
    pub fn empty() -> Self {
        Self::default()
    }

    /// A registry with the numeric and vector built-ins
    pub fn with_builtins() -> Self {
        Self::empty()
            .with::<f32>(|a, b| {
                let (a, b) = (*a, *b);
                Arc::new(move |t: f32| a + (b - a) * t)
            })
            .with::<f64>(|a, b| {
                let (a, b) = (*a, *b);
                Arc::new(move |t: f32| a + (b - a) * t as f64)
            })
            .with::<i32>(|a, b| {
                let (a, b) = (*a as f64, *b as f64);
                Arc::new(move |t: f32| (a + (b - a) * t as f64).round() as i32)
            })
            .with::<i64>(|a, b| {
                let (a, b) = (*a as f64, *b as f64);
                Arc::new(move |t: f32| (a + (b - a) * t as f64).round() as i64)
            })
            .with::<[f32; 2]>(lerp_array::<2>)
            .with::<[f32; 3]>(lerp_array::<3>)
            .with::<[f32; 4]>(lerp_array::<4>)
    }

    /// The shared process-wide registry
    pub fn global() -> Arc<LerpRegistry> {
        static GLOBAL: OnceLock<Arc<LerpRegistry>> = OnceLock::new();
        GLOBAL
            .get_or_init(|| Arc::new(LerpRegistry::with_builtins()))
            .clone()
    }

    /// Builder: register (or replace) the factory for `T`
    pub fn with<T: 'static>(mut self, factory: LerpFactory<T>) -> Self {
        self.register(factory);
        self
    }

    /// Register (or replace) the factory for `T`
    pub fn register<T: 'static>(&mut self, factory: LerpFactory<T>) {
        self.factories.insert(TypeId::of::<T>(), Box::new(factory));
    }

    /// Whether `T` has a dedicated factory
    pub fn contains<T: 'static>(&self) -> bool {
        self.factories.contains_key(&TypeId::of::<T>())
    }

    /// Resolve the interpolation function for an origin/goal pair
    pub fn resolve<T>(&self, origin: &T, goal: &T) -> LerpFn<T>
    where
        T: Clone + Send + Sync + 'static,
    {
        match self
            .factories
            .get(&TypeId::of::<T>())
            .and_then(|entry| entry.downcast_ref::<LerpFactory<T>>())
        {
            Some(factory) => factory(origin, goal),
            None => step_lerp(origin, goal),
        }
    }

    pub fn len(&self) -> usize {
        self.factories.len()
    }

    pub fn is_empty(&self) -> bool {
        self.factories.is_empty()
    }
}

impl fmt::Debug for LerpRegistry {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("LerpRegistry")
            .field("entries", &self.factories.len())
            .finish()
    }
}

/// Fallback for types without a factory
fn step_lerp<T>(origin: &T, goal: &T) -> LerpFn<T>
where
    T: Clone + Send + Sync + 'static,
{
    let (origin, goal) = (origin.clone(), goal.clone());
    Arc::new(move |t: f32| {
        if t < 0.5 {
            origin.clone()
        } else {
            goal.clone()
        }
    })
}

fn lerp_array<const N: usize>(a: &[f32; N], b: &[f32; N]) -> LerpFn<[f32; N]> {
    let (a, b) = (*a, *b);
    Arc::new(move |t: f32| std::array::from_fn(|i| a[i] + (b[i] - a[i]) * t))
}
