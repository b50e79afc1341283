//! Keyframe bracketing, channel sampling, and the pose-transition blend

use crate::track::{Keyframe, KeyframeTrack, PostState};
use crate::types::Lerp;

/// Timing context shared by the three channels of one bone during a walk
#[derive(Debug, Clone, Copy)]
pub(crate) struct SampleCtx {
    /// Current time in ticks, already wrapped into `[0, duration)`
    pub tick: f32,
    /// Clip length in ticks
    pub duration: f32,
    /// How many times the clip has wrapped since playback began
    pub loop_count: u32,
    /// Length of the transition blend window in ticks
    pub blend_ticks: f32,
}

/// Find the index of the key at or before `t`
///
/// Returns the largest `i` with `keys[i].time <= t`, or 0 when `t` precedes
/// every key. Track sizes are small, so a linear scan beats a binary search
/// in practice.
pub fn find_key_index<T>(keys: &[Keyframe<T>], t: f32) -> usize {
    let mut index = 0;
    for (i, key) in keys.iter().enumerate() {
        if key.time <= t {
            index = i;
        } else {
            break;
        }
    }
    index
}

/// Interpolation factor for `t` between `t0` and `t1`, clamped to `[0, 1]`
///
/// A degenerate span clamps to 0 instead of propagating NaN.
fn segment_factor(t: f32, t0: f32, t1: f32) -> f32 {
    let span = t1 - t0;
    if span <= 0.0 {
        return 0.0;
    }
    ((t - t0) / span).clamp(0.0, 1.0)
}

/// Sample one channel at `ctx.tick`
///
/// Outside the keyed range the track holds its boundary value, except when
/// `post_state` is [`PostState::Repeat`]: then the segment between the last
/// and first key spans `(last.time .. duration + first.time)` and the
/// factor is computed against that wrapped span, on both sides of the clip
/// boundary.
///
/// `hint` is a bracketing index already found for a time-aligned sibling
/// channel; it skips the scan. The returned index feeds the next channel's
/// hint and is `None` when no interior bracketing happened.
pub(crate) fn sample_track<T: Lerp>(
    track: &KeyframeTrack<T>,
    post_state: PostState,
    ctx: &SampleCtx,
    hint: Option<usize>,
) -> (T, Option<usize>) {
    let keys = track.keys();
    let n = keys.len();
    if n == 1 {
        return (keys[0].value, None);
    }

    let t = ctx.tick;
    let first = &keys[0];
    let last = &keys[n - 1];
    let repeat = post_state == PostState::Repeat;

    if t < first.time {
        if repeat {
            let f = segment_factor(t + ctx.duration, last.time, ctx.duration + first.time);
            return (last.value.lerp(first.value, f), None);
        }
        return (first.value, None);
    }

    if t >= last.time {
        if repeat {
            let f = segment_factor(t, last.time, ctx.duration + first.time);
            return (last.value.lerp(first.value, f), None);
        }
        return (last.value, None);
    }

    let i = hint.unwrap_or_else(|| find_key_index(keys, t)).min(n - 2);
    let f = segment_factor(t, keys[i].time, keys[i + 1].time);
    (keys[i].value.lerp(keys[i + 1].value, f), Some(i))
}

/// Sample one channel, blending in from the pose that was current when the
/// clip (re)started
///
/// While the clip is on its first pass and `ctx.tick` is still inside the
/// window ending at `first_key.time + blend_ticks`, the result is a blend
/// from the channel's remembered value toward the regular sample at the
/// current tick, so the pose converges exactly onto normal sampling at the
/// window boundary. `last` is frozen for the duration of the blend (it is
/// the blend origin) and tracks the sampled value otherwise; `blend_start`
/// is captured on entry into the window and cleared on exit.
pub(crate) fn sample_with_transition<T: Lerp>(
    track: &KeyframeTrack<T>,
    post_state: PostState,
    ctx: &SampleCtx,
    hint: Option<usize>,
    last: &mut Option<T>,
    blend_start: &mut Option<f32>,
) -> (T, Option<usize>) {
    let (value, index) = sample_track(track, post_state, ctx, hint);

    let window_end = track.first().time + ctx.blend_ticks;
    if ctx.loop_count == 0 && ctx.blend_ticks > 0.0 && ctx.tick < window_end {
        if let Some(origin) = *last {
            let start = *blend_start.get_or_insert(ctx.tick);
            let f = segment_factor(ctx.tick, start, window_end);
            return (origin.lerp(value, f), index);
        }
    }

    *blend_start = None;
    *last = Some(value);
    (value, index)
}

#[cfg(test)]
mod tests {
    use super::*;
    use glam::Vec3;
    use test_case::test_case;

    fn track(keys: &[(f32, f32)]) -> KeyframeTrack<Vec3> {
        KeyframeTrack {
            keys: keys
                .iter()
                .map(|&(t, x)| Keyframe::new(t, Vec3::new(x, 0.0, 0.0)))
                .collect(),
        }
    }

    fn ctx(tick: f32, duration: f32) -> SampleCtx {
        SampleCtx {
            tick,
            duration,
            loop_count: 0,
            blend_ticks: 0.0,
        }
    }

    #[test_case(0.0, 0; "before all keys")]
    #[test_case(0.5, 0; "on first key")]
    #[test_case(1.5, 1; "between keys")]
    #[test_case(2.0, 2; "on last key")]
    #[test_case(9.0, 2; "past last key")]
    fn test_find_key_index(t: f32, expected: usize) {
        let track = track(&[(0.5, 0.0), (1.0, 0.0), (2.0, 0.0)]);
        assert_eq!(find_key_index(track.keys(), t), expected);
    }

    #[test]
    fn test_exact_key_hits() {
        let track = track(&[(0.0, 0.0), (1.0, 3.0), (2.5, -1.0)]);
        for key in track.keys() {
            let (v, _) = sample_track(&track, PostState::Default, &ctx(key.time, 4.0), None);
            assert!((v.x - key.value.x).abs() < 1e-6);
        }
    }

    #[test]
    fn test_linear_midpoint() {
        let track = track(&[(0.0, 0.0), (2.0, 4.0)]);
        let (v, i) = sample_track(&track, PostState::Default, &ctx(1.0, 4.0), None);
        assert!((v.x - 2.0).abs() < 1e-6);
        assert_eq!(i, Some(0));
    }

    #[test]
    fn test_hold_outside_range() {
        let track = track(&[(1.0, 2.0), (2.0, 6.0)]);
        let (before, _) = sample_track(&track, PostState::Constant, &ctx(0.5, 4.0), None);
        let (after, _) = sample_track(&track, PostState::Constant, &ctx(3.9, 4.0), None);
        assert!((before.x - 2.0).abs() < 1e-6);
        assert!((after.x - 6.0).abs() < 1e-6);
    }

    #[test]
    fn test_linear_post_state_degrades_to_hold() {
        let track = track(&[(0.0, 0.0), (1.0, 1.0)]);
        let (v, _) = sample_track(&track, PostState::Linear, &ctx(3.0, 4.0), None);
        assert!((v.x - 1.0).abs() < 1e-6);
    }

    #[test]
    fn test_repeat_wraps_past_last_key() {
        // Keys at 0 and 1, clip lasts 2 ticks: the wrapped segment spans
        // (1.0 .. 2.0) and blends the last key back toward the first.
        let track = track(&[(0.0, 0.0), (1.0, 1.0)]);
        let (v, _) = sample_track(&track, PostState::Repeat, &ctx(1.5, 2.0), None);
        assert!((v.x - 0.5).abs() < 1e-6);
    }

    #[test]
    fn test_repeat_wraps_before_first_key() {
        // First key at 0.5: ticks below it sit inside the wrapped segment
        // (1.5 .. 2.5) carried over from the previous loop.
        let track = track(&[(0.5, 0.0), (1.5, 1.0)]);
        let (v, _) = sample_track(&track, PostState::Repeat, &ctx(0.0, 2.0), None);
        assert!((v.x - 0.5).abs() < 1e-6);
    }

    #[test]
    fn test_repeat_periodicity() {
        let track = track(&[(0.25, 1.0), (0.75, 2.0), (1.5, 0.5)]);
        let duration = 2.0;
        for step in 0..8 {
            let t = step as f32 * 0.25;
            let (base, _) = sample_track(&track, PostState::Repeat, &ctx(t, duration), None);
            // Same wrapped tick on a later loop must sample identically
            let later = SampleCtx {
                loop_count: 3,
                ..ctx(t, duration)
            };
            let (v, _) = sample_track(&track, PostState::Repeat, &later, None);
            assert!((v.x - base.x).abs() < 1e-6);
        }
    }

    #[test]
    fn test_single_key_track() {
        let track = track(&[(1.0, 7.0)]);
        for t in [0.0, 1.0, 3.0] {
            let (v, i) = sample_track(&track, PostState::Repeat, &ctx(t, 4.0), None);
            assert!((v.x - 7.0).abs() < 1e-6);
            assert_eq!(i, None);
        }
    }

    #[test]
    fn test_degenerate_wrap_span_clamps() {
        // Last key past the clip end makes the wrapped span negative; the
        // factor clamps to 0 and the value holds instead of going NaN.
        let track = track(&[(0.0, 0.0), (5.0, 1.0)]);
        let (v, _) = sample_track(&track, PostState::Repeat, &ctx(5.5, 4.0), None);
        assert!(v.x.is_finite());
        assert!((v.x - 1.0).abs() < 1e-6);
    }

    #[test]
    fn test_hint_reuses_bracket() {
        let track = track(&[(0.0, 0.0), (1.0, 1.0), (2.0, 2.0)]);
        let (v, _) = sample_track(&track, PostState::Default, &ctx(1.5, 4.0), Some(1));
        assert!((v.x - 1.5).abs() < 1e-6);
    }

    #[test]
    fn test_transition_blend_converges() {
        let track = track(&[(0.0, 10.0), (4.0, 10.0)]);
        let mut last = Some(Vec3::new(0.0, 0.0, 0.0));
        let mut blend_start = None;

        let blend_ctx = |tick| SampleCtx {
            tick,
            duration: 4.0,
            loop_count: 0,
            blend_ticks: 2.0,
        };

        // Window spans (0 .. 2): halfway through, halfway blended
        let (v, _) = sample_with_transition(
            &track,
            PostState::Default,
            &blend_ctx(0.0),
            None,
            &mut last,
            &mut blend_start,
        );
        assert!((v.x - 0.0).abs() < 1e-6);
        assert_eq!(blend_start, Some(0.0));

        let (v, _) = sample_with_transition(
            &track,
            PostState::Default,
            &blend_ctx(1.0),
            None,
            &mut last,
            &mut blend_start,
        );
        assert!((v.x - 5.0).abs() < 1e-6);
        // Origin stays frozen while the blend runs
        assert_eq!(last, Some(Vec3::ZERO));

        // Past the window: plain sample, bookkeeping reset
        let (v, _) = sample_with_transition(
            &track,
            PostState::Default,
            &blend_ctx(2.5),
            None,
            &mut last,
            &mut blend_start,
        );
        assert!((v.x - 10.0).abs() < 1e-6);
        assert_eq!(blend_start, None);
        assert_eq!(last, Some(Vec3::new(10.0, 0.0, 0.0)));
    }

    #[test]
    fn test_transition_inactive_without_history() {
        let track = track(&[(0.0, 10.0), (4.0, 20.0)]);
        let mut last = None;
        let mut blend_start = None;
        let ctx = SampleCtx {
            tick: 0.0,
            duration: 4.0,
            loop_count: 0,
            blend_ticks: 2.0,
        };
        let (v, _) = sample_with_transition(
            &track,
            PostState::Default,
            &ctx,
            None,
            &mut last,
            &mut blend_start,
        );
        // Nothing to blend from on the very first sample
        assert!((v.x - 10.0).abs() < 1e-6);
        assert_eq!(last, Some(Vec3::new(10.0, 0.0, 0.0)));
    }

    #[test]
    fn test_transition_inactive_on_later_loops() {
        let track = track(&[(0.0, 10.0), (4.0, 20.0)]);
        let mut last = Some(Vec3::ZERO);
        let mut blend_start = None;
        let ctx = SampleCtx {
            tick: 0.5,
            duration: 4.0,
            loop_count: 1,
            blend_ticks: 2.0,
        };
        let (v, _) = sample_with_transition(
            &track,
            PostState::Default,
            &ctx,
            None,
            &mut last,
            &mut blend_start,
        );
        assert!((v.x - 11.25).abs() < 1e-6);
    }
}
