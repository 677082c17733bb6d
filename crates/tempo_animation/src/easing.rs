//! Easing functions for animations
//!
//! Curves are addressed by an [`EasingStyle`] / [`EasingDirection`] pair and
//! looked up in a process-wide table that is built once and never mutated.
//! Unknown names resolve to linear.

use rustc_hash::FxHashMap;
use serde::{Deserialize, Serialize};
use std::f32::consts::PI;
use std::str::FromStr;
use std::sync::OnceLock;

/// Pure easing curve: progress in, multiplier out
pub type EasingFn = fn(f32) -> f32;

/// Shape of an easing curve
#[derive(Clone, Copy, Debug, Default, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub enum EasingStyle {
    #[default]
    Linear,
    Sine,
    Quad,
    Cubic,
    Quart,
    Quint,
    Exponential,
    Circular,
    Back,
    Elastic,
    Bounce,
}

impl EasingStyle {
    pub const ALL: [EasingStyle; 11] = [
        EasingStyle::Linear,
        EasingStyle::Sine,
        EasingStyle::Quad,
        EasingStyle::Cubic,
        EasingStyle::Quart,
        EasingStyle::Quint,
        EasingStyle::Exponential,
        EasingStyle::Circular,
        EasingStyle::Back,
        EasingStyle::Elastic,
        EasingStyle::Bounce,
    ];

    pub fn name(self) -> &'static str {
        match self {
            EasingStyle::Linear => "Linear",
            EasingStyle::Sine => "Sine",
            EasingStyle::Quad => "Quad",
            EasingStyle::Cubic => "Cubic",
            EasingStyle::Quart => "Quart",
            EasingStyle::Quint => "Quint",
            EasingStyle::Exponential => "Exponential",
            EasingStyle::Circular => "Circular",
            EasingStyle::Back => "Back",
            EasingStyle::Elastic => "Elastic",
            EasingStyle::Bounce => "Bounce",
        }
    }
}

/// Which end of the curve the style is applied to
#[derive(Clone, Copy, Debug, Default, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub enum EasingDirection {
    In,
    #[default]
    Out,
    InOut,
}

impl EasingDirection {
    pub const ALL: [EasingDirection; 3] = [
        EasingDirection::In,
        EasingDirection::Out,
        EasingDirection::InOut,
    ];

    pub fn name(self) -> &'static str {
        match self {
            EasingDirection::In => "In",
            EasingDirection::Out => "Out",
            EasingDirection::InOut => "InOut",
        }
    }
}

/// Error returned when an easing name is not recognised
#[derive(Clone, Debug, PartialEq, Eq, thiserror::Error)]
#[error("unknown easing name `{0}`")]
pub struct UnknownEasing(pub String);

impl FromStr for EasingStyle {
    type Err = UnknownEasing;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        let trimmed = s.trim();
        Self::ALL
            .into_iter()
            .find(|style| style.name().eq_ignore_ascii_case(trimmed))
            .or_else(|| match trimmed.to_ascii_lowercase().as_str() {
                "expo" => Some(EasingStyle::Exponential),
                "circ" => Some(EasingStyle::Circular),
                _ => None,
            })
            .ok_or_else(|| UnknownEasing(s.to_string()))
    }
}

impl FromStr for EasingDirection {
    type Err = UnknownEasing;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        let trimmed = s.trim();
        Self::ALL
            .into_iter()
            .find(|direction| direction.name().eq_ignore_ascii_case(trimmed))
            .or_else(|| trimmed.eq_ignore_ascii_case("in_out").then_some(EasingDirection::InOut))
            .ok_or_else(|| UnknownEasing(s.to_string()))
    }
}

/// Easing function type
#[derive(Clone, Copy, Debug, Default)]
pub enum Easing {
    #[default]
    Linear,
    /// A curve from the shared style table
    Styled(EasingStyle, EasingDirection),
    CubicBezier(f32, f32, f32, f32),
    /// Caller-supplied curve
    Custom(EasingFn),
}

impl Easing {
    pub fn styled(style: EasingStyle, direction: EasingDirection) -> Self {
        match style {
            EasingStyle::Linear => Easing::Linear,
            _ => Easing::Styled(style, direction),
        }
    }

    /// Resolve an easing from its style and direction names
    ///
    /// Unknown or missing names fall back to linear.
    pub fn from_names(style: Option<&str>, direction: Option<&str>) -> Self {
        let Some(style) = style else {
            return Easing::Linear;
        };
        let style = match style.parse::<EasingStyle>() {
            Ok(style) => style,
            Err(err) => {
                tracing::debug!(%err, "falling back to linear easing");
                return Easing::Linear;
            }
        };
        let direction = direction
            .and_then(|name| name.parse::<EasingDirection>().ok())
            .unwrap_or_default();
        Easing::styled(style, direction)
    }

    /// Apply the easing function to a progress value (0.0 to 1.0)
    pub fn apply(&self, t: f32) -> f32 {
        match self {
            Easing::Linear => t,
            Easing::Styled(style, direction) => easing_fn(*style, *direction)(t),
            Easing::CubicBezier(x1, y1, x2, y2) => cubic_bezier_ease(t, *x1, *y1, *x2, *y2),
            Easing::Custom(f) => f(t),
        }
    }
}

/// Derive the out and in-out variants from an ease-in curve
macro_rules! directional {
    ($ease_in:ident) => {
        (
            $ease_in as EasingFn,
            (|t: f32| -> f32 { 1.0 - $ease_in(1.0 - t) }) as EasingFn,
            (|t: f32| -> f32 {
                if t < 0.5 {
                    $ease_in(2.0 * t) / 2.0
                } else {
                    1.0 - $ease_in(2.0 - 2.0 * t) / 2.0
                }
            }) as EasingFn,
        )
    };
}

/// Look up the curve for a style/direction pair
pub fn easing_fn(style: EasingStyle, direction: EasingDirection) -> EasingFn {
    easing_table()
        .get(&(style, direction))
        .copied()
        .unwrap_or(linear)
}

fn easing_table() -> &'static FxHashMap<(EasingStyle, EasingDirection), EasingFn> {
    static TABLE: OnceLock<FxHashMap<(EasingStyle, EasingDirection), EasingFn>> = OnceLock::new();
    TABLE.get_or_init(|| {
        let mut table = FxHashMap::default();
        let mut insert = |style, (ease_in, ease_out, ease_in_out): (EasingFn, EasingFn, EasingFn)| {
            table.insert((style, EasingDirection::In), ease_in);
            table.insert((style, EasingDirection::Out), ease_out);
            table.insert((style, EasingDirection::InOut), ease_in_out);
        };

        insert(
            EasingStyle::Linear,
            (linear as EasingFn, linear as EasingFn, linear as EasingFn),
        );
        insert(EasingStyle::Sine, directional!(sine_in));
        insert(EasingStyle::Quad, directional!(quad_in));
        insert(EasingStyle::Cubic, directional!(cubic_in));
        insert(EasingStyle::Quart, directional!(quart_in));
        insert(EasingStyle::Quint, directional!(quint_in));
        insert(EasingStyle::Exponential, directional!(exponential_in));
        insert(EasingStyle::Circular, directional!(circular_in));
        insert(EasingStyle::Back, directional!(back_in));
        insert(EasingStyle::Elastic, directional!(elastic_in));
        insert(EasingStyle::Bounce, directional!(bounce_in));
        table
    })
}

fn linear(t: f32) -> f32 {
    t
}

fn sine_in(t: f32) -> f32 {
    1.0 - (t * PI / 2.0).cos()
}

fn quad_in(t: f32) -> f32 {
    t * t
}

fn cubic_in(t: f32) -> f32 {
    t * t * t
}

fn quart_in(t: f32) -> f32 {
    t * t * t * t
}

fn quint_in(t: f32) -> f32 {
    t * t * t * t * t
}

fn exponential_in(t: f32) -> f32 {
    if t <= 0.0 {
        0.0
    } else {
        2f32.powf(10.0 * t - 10.0)
    }
}

fn circular_in(t: f32) -> f32 {
    1.0 - (1.0 - t * t).max(0.0).sqrt()
}

fn back_in(t: f32) -> f32 {
    const C1: f32 = 1.70158;
    const C3: f32 = C1 + 1.0;
    C3 * t * t * t - C1 * t * t
}

fn elastic_in(t: f32) -> f32 {
    const C4: f32 = (2.0 * PI) / 3.0;
    if t <= 0.0 {
        0.0
    } else if t >= 1.0 {
        1.0
    } else {
        -(2f32.powf(10.0 * t - 10.0)) * ((t * 10.0 - 10.75) * C4).sin()
    }
}

fn bounce_in(t: f32) -> f32 {
    1.0 - bounce_out(1.0 - t)
}

fn bounce_out(t: f32) -> f32 {
    const N1: f32 = 7.5625;
    const D1: f32 = 2.75;
    if t < 1.0 / D1 {
        N1 * t * t
    } else if t < 2.0 / D1 {
        let t = t - 1.5 / D1;
        N1 * t * t + 0.75
    } else if t < 2.5 / D1 {
        let t = t - 2.25 / D1;
        N1 * t * t + 0.9375
    } else {
        let t = t - 2.625 / D1;
        N1 * t * t + 0.984375
    }
}

/// Cubic bezier easing calculation (matches CSS `cubic-bezier()`).
///
/// Uses Newton-Raphson with binary-search fallback for robustness.
/// Computes in f64 internally to avoid f32 precision jitter at high frame rates.
fn cubic_bezier_ease(t: f32, x1: f32, y1: f32, x2: f32, y2: f32) -> f32 {
    // Endpoints are always exact
    if t <= 0.0 {
        return 0.0;
    }
    if t >= 1.0 {
        return 1.0;
    }

    let x = t as f64;
    let (x1, y1, x2, y2) = (x1 as f64, y1 as f64, x2 as f64, y2 as f64);

    let mut p = x;
    for _ in 0..8 {
        let err = bezier_sample(p, x1, x2) - x;
        if err.abs() < 1e-7 {
            return bezier_sample(p, y1, y2) as f32;
        }
        let slope = bezier_slope(p, x1, x2);
        if slope.abs() < 1e-7 {
            break;
        }
        p -= err / slope;
    }

    // Binary search fallback (always converges)
    let mut lo = 0.0_f64;
    let mut hi = 1.0_f64;
    p = x;
    for _ in 0..20 {
        let val = bezier_sample(p, x1, x2);
        if (val - x).abs() < 1e-7 {
            break;
        }
        if val < x {
            lo = p;
        } else {
            hi = p;
        }
        p = (lo + hi) * 0.5;
    }

    bezier_sample(p, y1, y2) as f32
}

/// B(t) = 3(1-t)²t·p1 + 3(1-t)t²·p2 + t³ in Horner form
#[inline]
fn bezier_sample(t: f64, p1: f64, p2: f64) -> f64 {
    let a = 1.0 - 3.0 * p2 + 3.0 * p1;
    let b = 3.0 * p2 - 6.0 * p1;
    let c = 3.0 * p1;
    ((a * t + b) * t + c) * t
}

#[inline]
fn bezier_slope(t: f64, p1: f64, p2: f64) -> f64 {
    let a = 1.0 - 3.0 * p2 + 3.0 * p1;
    let b = 3.0 * p2 - 6.0 * p1;
    let c = 3.0 * p1;
    (3.0 * a * t + 2.0 * b) * t + c
}
