//! Integration tests for observable cells + tweens
//!
//! These tests verify that:
//! - Live endpoints are re-read after they change, even mid-run
//! - Stateful tweens mirror their values into a cell
//! - A stateful tween's cell can feed another tween
//! - Destroying a tween severs its subscriptions

use std::sync::{Arc, Mutex};
use tempo_animation::{RunOutcome, StatePatch, TimingDescriptor, Tween, TweenConfig, TweenError};
use tempo_core::{ManualHost, Observable};

const FRAME: f64 = 0.125;

/// Test that a goal changed mid-run redirects the rest of the run
#[tokio::test]
async fn test_goal_change_mid_run() {
    let host = ManualHost::new();
    let goal = Observable::new(10.0f32);
    let tween = Tween::builder()
        .origin(0.0f32)
        .goal_cell(goal.clone())
        .config(TweenConfig::new(1.0))
        .host(host.clone())
        .build()
        .unwrap();

    let (outcome, _) = tokio::join!(tween.play(None), async {
        host.run_frames(4, FRAME).await;
        goal.set(-10.0);
        host.run_frames(8, FRAME).await;
    });

    assert_eq!(outcome, Ok(RunOutcome::Completed));
    assert_eq!(tween.value(), Some(-10.0));
}

/// Test that a stateful tween writes every value into its cell
#[tokio::test]
async fn test_stateful_tween_mirrors_into_cell() {
    let host = ManualHost::new();
    let opacity = Observable::new(0.0f32);
    let seen = Arc::new(Mutex::new(Vec::new()));
    let sink = seen.clone();
    let _watch = opacity.on_change(move |v| sink.lock().unwrap().push(*v));

    let tween = Tween::builder()
        .origin(0.0f32)
        .goal(1.0)
        .config(TimingDescriptor::new(0.5))
        .host(host.clone())
        .into_cell(opacity.clone())
        .unwrap();

    let (outcome, _) = tokio::join!(tween.play(None), host.run_frames(8, FRAME));

    assert_eq!(outcome, Ok(RunOutcome::Completed));
    assert_eq!(opacity.peek(), 1.0);
    let seen = seen.lock().unwrap();
    assert!(!seen.is_empty());
    assert!(seen.windows(2).all(|pair| pair[0] <= pair[1]));
}

/// Test that one tween's output cell can be another tween's origin
#[test]
fn test_chained_tweens() {
    let host = ManualHost::new();
    let leader = Observable::new(0.0f64);
    let follower_out = Observable::new(0.0f64);

    let lead = Tween::builder()
        .origin(0.0f64)
        .goal(8.0)
        .config(TweenConfig::new(1.0))
        .host(host.clone())
        .into_cell(leader.clone())
        .unwrap();
    let follow = Tween::builder()
        .origin_cell(leader.clone())
        .goal(0.0)
        .config(TweenConfig::new(1.0))
        .host(host)
        .into_cell(follower_out.clone())
        .unwrap();

    lead.advance(0.5).unwrap();
    assert_eq!(leader.peek(), 4.0);

    // Follower starts from wherever the leader is now
    follow.lerp(&StatePatch::seek(0.25)).unwrap();
    assert_eq!(follower_out.peek(), 3.0);

    lead.advance(0.5).unwrap();
    follow.lerp(&StatePatch::seek(0.25)).unwrap();
    assert_eq!(follower_out.peek(), 6.0);
}

/// Test that destroy releases cells and rejects further use
#[test]
fn test_destroy_releases_cells() {
    let host = ManualHost::new();
    let origin = Observable::new(0.0f32);
    let goal = Observable::new(1.0f32);
    let tween = Tween::builder()
        .origin_cell(origin.clone())
        .goal_cell(goal.clone())
        .config(TweenConfig::new(1.0))
        .host(host)
        .build()
        .unwrap();

    assert_eq!(origin.subscriber_count(), 1);
    assert_eq!(goal.subscriber_count(), 1);

    tween.destroy();

    assert_eq!(origin.subscriber_count(), 0);
    assert_eq!(goal.subscriber_count(), 0);
    assert_eq!(tween.lerp(&StatePatch::seek(0.5)), Err(TweenError::Destroyed));
    assert!(tween.is_destroyed());
}
