//! Integration tests for the timing driver
//!
//! These tests verify that:
//! - A played tween completes once host time covers its duration
//! - Repeat and reverse stages are traversed in order
//! - Cancellation stops a run before its next frame
//! - Start delays, seeks and restarts behave as documented
//!
//! Frames come from a `ManualHost` stepped in exact binary fractions of a
//! second. The driver may observe only every other frame, so assertions
//! never depend on seeing a particular frame.

use std::sync::{Arc, Mutex};
use std::task::Poll;
use tempo_animation::{
    Easing, EasingDirection, EasingStyle, RunOutcome, StatePatch, Tween, TweenConfig,
    TweenError,
};
use tempo_core::{FrameHost, ManualHost, TokioHost};

const FRAME: f64 = 0.125;

type Log = Arc<Mutex<Vec<(f64, f32)>>>;

/// A 0 -> 10 tween that logs `(host time, value)` for every emission
fn logged_tween(host: &ManualHost, config: TweenConfig) -> (Tween<f32>, Log) {
    let log: Log = Arc::new(Mutex::new(Vec::new()));
    let sink = log.clone();
    let clock = host.clone();
    let tween = Tween::builder()
        .origin(0.0f32)
        .goal(10.0)
        .config(config)
        .host(host.clone())
        .on_step(move |v: &f32| sink.lock().unwrap().push((clock.now(), *v)))
        .unwrap();
    (tween, log)
}

fn values(log: &Log) -> Vec<f32> {
    log.lock().unwrap().iter().map(|(_, v)| *v).collect()
}

/// Number of times the value fell back, i.e. a new forward leg began
fn restarts(values: &[f32]) -> usize {
    values.windows(2).filter(|pair| pair[1] < pair[0]).count()
}

#[tokio::test]
async fn test_single_leg_completes_at_goal() {
    let host = ManualHost::new();
    let config = TweenConfig::new(1.0)
        .with_easing(Easing::styled(EasingStyle::Cubic, EasingDirection::Out));
    let (tween, log) = logged_tween(&host, config);

    let (outcome, _) = tokio::join!(tween.play(None), host.run_frames(12, FRAME));

    assert_eq!(outcome, Ok(RunOutcome::Completed));
    assert!(tween.is_complete());
    assert!(!tween.is_running());
    assert_eq!(values(&log).last(), Some(&10.0));

    // Nothing reached the goal before a full duration had passed
    let (first_done, _) = *log
        .lock()
        .unwrap()
        .iter()
        .find(|(_, v)| *v == 10.0)
        .unwrap();
    assert!(first_done >= 1.0);
}

#[tokio::test]
async fn test_repeats_traverse_every_forward_leg() {
    let host = ManualHost::new();
    let (tween, log) = logged_tween(&host, TweenConfig::new(0.5).with_repeat(2, 0.0));

    let (outcome, _) = tokio::join!(tween.play(None), host.run_frames(16, FRAME));

    assert_eq!(outcome, Ok(RunOutcome::Completed));
    assert_eq!(tween.snapshot().unwrap().played_count, 2);
    let seen = values(&log);
    assert_eq!(restarts(&seen), 2);
    assert_eq!(seen.last(), Some(&10.0));
}

#[tokio::test]
async fn test_reverse_leg_returns_to_origin() {
    let host = ManualHost::new();
    let (tween, log) = logged_tween(&host, TweenConfig::new(0.5).with_reverse(0.0));

    let (outcome, _) = tokio::join!(tween.play(None), host.run_frames(12, FRAME));

    assert_eq!(outcome, Ok(RunOutcome::Completed));
    let snapshot = tween.snapshot().unwrap();
    assert!(snapshot.is_reversing);
    assert_eq!(snapshot.reversed_fade, 0.0);

    // Rises to a peak near the goal, then falls back
    let seen = values(&log);
    let peak = (0..seen.len())
        .max_by(|a, b| seen[*a].total_cmp(&seen[*b]))
        .unwrap();
    assert!(seen[peak] >= 5.0);
    assert!(seen[..=peak].windows(2).all(|pair| pair[0] <= pair[1]));
    assert!(seen[peak..].windows(2).all(|pair| pair[0] >= pair[1]));
    assert_eq!(seen.last(), Some(&0.0));
}

#[tokio::test]
async fn test_cancel_stops_before_next_frame() {
    let host = ManualHost::new();
    let (tween, log) = logged_tween(&host, TweenConfig::new(4.0));
    let controller = tween.clone();

    let (outcome, emitted_at_cancel) = tokio::join!(tween.play(None), async {
        host.run_frames(4, FRAME).await;
        controller.cancel();
        let emitted = log.lock().unwrap().len();
        host.run_frames(8, FRAME).await;
        emitted
    });

    assert_eq!(outcome, Ok(RunOutcome::Cancelled));
    assert_eq!(log.lock().unwrap().len(), emitted_at_cancel);
    assert!(!tween.is_running());
    assert!(!tween.is_complete());
}

#[tokio::test]
async fn test_second_play_supersedes_first() {
    let host = ManualHost::new();
    let (tween, _) = logged_tween(&host, TweenConfig::new(0.5));

    let first = tween.play(None);
    let second = tween.play(None);
    let (first, second, _) = tokio::join!(first, second, host.run_frames(8, FRAME));

    assert_eq!(first, Ok(RunOutcome::Cancelled));
    assert_eq!(second, Ok(RunOutcome::Completed));
}

#[tokio::test]
async fn test_positive_delay_waits() {
    let host = ManualHost::new();
    let (tween, log) = logged_tween(&host, TweenConfig::new(0.5));

    let (outcome, _) = tokio::join!(
        tween.play(Some(StatePatch::delayed(1.0))),
        host.run_frames(20, FRAME),
    );

    assert_eq!(outcome, Ok(RunOutcome::Completed));
    let (first_emit, _) = log.lock().unwrap()[0];
    assert!(first_emit > 1.0);
}

#[tokio::test]
async fn test_delay_overshoot_is_caught_up() {
    let host = ManualHost::new();
    let (tween, log) = logged_tween(&host, TweenConfig::new(1.0));
    let run = tween.play(Some(StatePatch::delayed(1.0)));
    tokio::pin!(run);

    // 0.3s frames wake the delay at 1.2s, 0.2s past its target
    let mut finished = None;
    for _ in 0..12 {
        if let Poll::Ready(outcome) = futures::poll!(run.as_mut()) {
            finished = Some((host.now(), outcome));
            break;
        }
        host.step(0.3);
    }

    let (finished_at, outcome) = finished.unwrap();
    assert_eq!(outcome, Ok(RunOutcome::Completed));
    assert!(finished_at < 2.2, "completed at {finished_at}");
    let (woke_at, first) = log.lock().unwrap()[0];
    assert!(woke_at > 1.1 && woke_at < 1.3);
    assert!((first - 2.0).abs() < 1e-3);
}

#[tokio::test]
async fn test_delay_counts_from_play_call() {
    let host = ManualHost::new();
    let (tween, log) = logged_tween(&host, TweenConfig::new(1.0));

    let run = tween.play(Some(StatePatch::delayed(1.0)));
    // Not polled until the delay has already passed
    host.step(1.25);
    tokio::pin!(run);

    assert!(futures::poll!(run.as_mut()).is_pending());
    assert_eq!(values(&log), vec![2.5]);

    host.step(0.75);
    assert_eq!(run.await, Ok(RunOutcome::Completed));
    assert_eq!(values(&log).last(), Some(&10.0));
}

#[tokio::test]
async fn test_start_delay_is_part_of_the_run() {
    let host = ManualHost::new();
    let (tween, log) = logged_tween(&host, TweenConfig::new(0.5).with_start_delay(0.5));
    assert_eq!(tween.total_duration(), 1.0);

    let (outcome, _) = tokio::join!(tween.play(None), host.run_frames(12, FRAME));

    assert_eq!(outcome, Ok(RunOutcome::Completed));
    let (first_emit, _) = log.lock().unwrap()[0];
    assert!(first_emit >= 0.5);
}

#[tokio::test]
async fn test_negative_delay_catches_up() {
    let host = ManualHost::new();
    let (tween, log) = logged_tween(&host, TweenConfig::new(1.0));

    let (outcome, _) = tokio::join!(
        tween.play(Some(StatePatch::delayed(-0.5))),
        host.run_frames(12, FRAME),
    );

    assert_eq!(outcome, Ok(RunOutcome::Completed));
    assert_eq!(values(&log)[0], 5.0);
}

#[tokio::test]
async fn test_seek_past_end_completes_immediately() {
    let host = ManualHost::new();
    let (tween, log) = logged_tween(&host, TweenConfig::new(1.0));

    let outcome = tween.play(Some(StatePatch::seek(5.0))).await;

    assert_eq!(outcome, Ok(RunOutcome::Completed));
    assert_eq!(values(&log), vec![10.0]);
    assert_eq!(host.frame().index, 0);
}

#[tokio::test]
async fn test_resume_from_snapshot() {
    let host = ManualHost::new();
    let (tween, log) = logged_tween(&host, TweenConfig::new(1.0));

    tween.advance(0.5).unwrap();
    let paused = tween.snapshot().unwrap();
    assert_eq!(paused.fade, 0.5);

    let (outcome, _) = tokio::join!(
        tween.play(Some(paused.into())),
        host.run_frames(8, FRAME),
    );

    assert_eq!(outcome, Ok(RunOutcome::Completed));
    // Resumed from the middle, never back at the origin
    assert!(values(&log).iter().all(|v| *v >= 5.0));
}

#[tokio::test]
async fn test_completed_tween_restarts() {
    let host = ManualHost::new();
    let (tween, log) = logged_tween(&host, TweenConfig::new(0.5));

    let (first, _) = tokio::join!(tween.play(None), host.run_frames(8, FRAME));
    assert_eq!(first, Ok(RunOutcome::Completed));
    let first_run = log.lock().unwrap().len();

    let (second, _) = tokio::join!(tween.play(None), host.run_frames(8, FRAME));
    assert_eq!(second, Ok(RunOutcome::Completed));

    let seen = values(&log);
    assert!(seen[first_run] < 10.0);
    assert_eq!(seen.last(), Some(&10.0));
}

#[tokio::test]
async fn test_destroyed_tween_cannot_play() {
    let host = ManualHost::new();
    let (tween, _) = logged_tween(&host, TweenConfig::new(1.0));

    tween.destroy();
    assert_eq!(tween.play(None).await, Err(TweenError::Destroyed));
}

#[tokio::test]
async fn test_coarse_frames_fast_forward_stages() {
    let host = ManualHost::new();
    let config = TweenConfig::new(0.25).with_reverse(0.0).with_repeat(3, 0.0);
    let (tween, _) = logged_tween(&host, config);

    // Each frame spans several stages
    let (outcome, _) = tokio::join!(tween.play(None), host.run_frames(4, 1.0));

    assert_eq!(outcome, Ok(RunOutcome::Completed));
    assert_eq!(tween.snapshot().unwrap().played_count, 3);
    assert_eq!(tween.value(), Some(0.0));
}

#[tokio::test(start_paused = true)]
async fn test_tokio_host_drives_to_completion() {
    let host = TokioHost::new(60);
    let cell = tempo_core::Observable::new(0.0f32);
    let tween = Tween::builder()
        .origin(0.0f32)
        .goal(1.0)
        .config(TweenConfig::new(0.25))
        .host(host.clone())
        .into_cell(cell.clone())
        .unwrap();

    assert_eq!(tween.play(None).await, Ok(RunOutcome::Completed));
    assert_eq!(cell.peek(), 1.0);
    assert!(host.now() >= 0.25);
}
