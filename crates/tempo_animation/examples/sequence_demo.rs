//! Sequence Demo
//!
//! Plays a small staggered entrance in real time and prints every frame:
//! - A fade driven by a built-in timing preset
//! - A slide whose timing comes from a TOML preset
//! - A nested pulse sequence that starts once both have begun
//!
//! Afterwards the whole sequence is scrubbed backwards without a clock.
//!
//! Run with: cargo run -p tempo_animation --example sequence_demo
//! Set `RUST_LOG=tempo_animation=debug` to see run lifecycle events.

use anyhow::Context;
use tempo_animation::{Sequence, StatePatch, TimingPresets, Tween, TweenConfig};
use tempo_core::{FrameHost, SharedHost, TokioHost};
use tracing_subscriber::EnvFilter;

const PRESETS: &str = r#"
[presets.slide]
style = "Quint"
direction = "Out"
duration = 0.6
"#;

#[tokio::main]
async fn main() -> anyhow::Result<()> {
    tracing_subscriber::fmt()
        .with_env_filter(
            EnvFilter::try_from_default_env().unwrap_or_else(|_| EnvFilter::new("info")),
        )
        .init();

    let mut presets = TimingPresets::builtin();
    presets.merge(TimingPresets::from_toml_str(PRESETS)?);

    let host: SharedHost = std::sync::Arc::new(TokioHost::new(30));
    let clock = host.clone();

    let fade = Tween::builder()
        .origin(0.0f32)
        .goal(1.0)
        .config(presets.get("fade_in").context("missing fade_in preset")?)
        .shared_host(host.clone())
        .on_step(move |opacity| println!("{:>6.3}s  opacity {opacity:.2}", clock.now()))?;

    let clock = host.clone();
    let slide = Tween::builder()
        .origin([-120.0f32, 0.0])
        .goal([0.0, 0.0])
        .config(presets.get("slide").context("missing slide preset")?)
        .shared_host(host.clone())
        .on_step(move |&[x, y]: &[f32; 2]| {
            println!("{:>6.3}s  offset ({x:.1}, {y:.1})", clock.now())
        })?;

    let clock = host.clone();
    let pulse = Tween::builder()
        .origin(1.0f32)
        .goal(1.1)
        .config(TweenConfig::new(0.15))
        .shared_host(host.clone())
        .on_step(move |scale| println!("{:>6.3}s  scale {scale:.3}", clock.now()))?;

    let accent = Sequence::new();
    accent.add(pulse, 0.0)?;

    let entrance = Sequence::new();
    entrance.add(fade, 0.0)?;
    entrance.add(slide, 0.1)?;
    entrance.add(accent, 0.5)?;

    println!("entrance runs for {:.2}s", entrance.duration());
    let outcome = entrance.play(None).await?;
    println!("entrance finished: {outcome:?}");

    println!("scrubbing backwards");
    for step in 0..=4 {
        let position = entrance.duration() * f64::from(step) / 4.0;
        entrance.lerp(&StatePatch::seek(position).with_reversing(true))?;
    }

    Ok(())
}
