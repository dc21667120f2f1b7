//! Plan frame-capture timestamps around a mention.
//!
//! When the mention time is known, the plan clusters shots just after
//! the mention (when the bottle is usually held up to the camera) plus
//! an early and a late anchor. Without a mention it falls back to an
//! even spread over the interior of the video.

use crate::pipeline::timing::MatchMethod;

/// Number of timestamps a plan aims for.
const PLAN_SIZE: usize = 6;

/// Frame timestamps for a located mention at `mention_secs` in a video
/// of `duration_secs`. All values in `[0, duration]`, rounded to one
/// decimal, unique, at most [`PLAN_SIZE`] of them.
pub fn plan_frame_times(mention_secs: f64, duration_secs: f64) -> Vec<f64> {
    let duration = duration_secs.max(0.0);
    let t = mention_secs;

    let raw = [
        t + 0.75,
        (t - 1.25).max(0.0),
        t + 1.5,
        t + 4.0,
        0.1 * duration,
        0.85 * duration,
    ];

    let mut times: Vec<f64> = Vec::with_capacity(PLAN_SIZE);
    for ts in raw {
        push_unique(&mut times, clamp_round(ts, duration));
    }

    // Backfill with evenly spaced points when the cluster collapsed
    // (mention near an edge, very short video).
    let mut i = 1;
    while times.len() < PLAN_SIZE && i <= PLAN_SIZE {
        push_unique(&mut times, clamp_round(i as f64 * duration / 7.0, duration));
        i += 1;
    }

    times.truncate(PLAN_SIZE);
    times
}

/// Frame timestamps when no mention was found: an even spread inside
/// `[2, duration − 2]`. Degenerate windows collapse to the midpoint.
pub fn fallback_frame_times(duration_secs: f64) -> Vec<f64> {
    let duration = duration_secs.max(0.0);
    let lo = 2.0;
    let hi = duration - 2.0;

    if hi <= lo {
        return vec![clamp_round(duration / 2.0, duration)];
    }

    let mut times = Vec::with_capacity(PLAN_SIZE);
    for i in 0..PLAN_SIZE {
        let ts = lo + (hi - lo) * i as f64 / (PLAN_SIZE - 1) as f64;
        push_unique(&mut times, clamp_round(ts, duration));
    }
    times
}

/// Plan based on whether the locator found anything.
pub fn frame_times_for(
    mention: Option<f64>,
    method: &MatchMethod,
    duration_secs: f64,
) -> Vec<f64> {
    match (mention, method) {
        (Some(t), m) if *m != MatchMethod::None => plan_frame_times(t, duration_secs),
        _ => fallback_frame_times(duration_secs),
    }
}

fn clamp_round(ts: f64, duration: f64) -> f64 {
    let clamped = ts.clamp(0.0, duration);
    (clamped * 10.0).round() / 10.0
}

fn push_unique(times: &mut Vec<f64>, ts: f64) {
    if !times.iter().any(|&t| t == ts) {
        times.push(ts);
    }
}
