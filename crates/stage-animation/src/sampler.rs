//! Pure keyframe evaluation: binary search and interpolation

use crate::clip::{AnimationTrack, Interpolation, Keyframe};

/// Sample a track at `time` seconds.
///
/// Times outside the keyframe range clamp to the first/last value.
pub fn sample_track(track: &AnimationTrack, time: f64) -> [f32; 3] {
    let keyframes = &track.keyframes;
    let (Some(first), Some(last)) = (keyframes.first(), keyframes.last()) else {
        return [0.0; 3];
    };

    if time <= first.time {
        return first.value;
    }
    if time >= last.time {
        return last.value;
    }

    // Insertion point: `time` lies between [idx - 1] and [idx]
    let idx = keyframes.partition_point(|kf| kf.time <= time);
    let prev = &keyframes[idx - 1];
    let next = &keyframes[idx];
    interpolate(track.interpolation, prev, next, time)
}

fn interpolate(mode: Interpolation, prev: &Keyframe, next: &Keyframe, time: f64) -> [f32; 3] {
    let span = next.time - prev.time;
    if span <= 0.0 {
        return prev.value;
    }
    let t = ((time - prev.time) / span) as f32;

    match mode {
        Interpolation::Step => prev.value,
        Interpolation::Linear => lerp_array(prev.value, next.value, t),
        Interpolation::CubicSpline => cubic_hermite(
            prev.value,
            prev.out_tangent.unwrap_or([0.0; 3]),
            next.value,
            next.in_tangent.unwrap_or([0.0; 3]),
            span as f32,
            t,
        ),
    }
}

/// Component-wise linear interpolation between two [f32; 3] arrays.
pub fn lerp_array(a: [f32; 3], b: [f32; 3], t: f32) -> [f32; 3] {
    [
        a[0] + (b[0] - a[0]) * t,
        a[1] + (b[1] - a[1]) * t,
        a[2] + (b[2] - a[2]) * t,
    ]
}

/// Cubic Hermite spline interpolation with tangents scaled by the interval `dt`.
pub fn cubic_hermite(
    p0: [f32; 3],
    m0: [f32; 3],
    p1: [f32; 3],
    m1: [f32; 3],
    dt: f32,
    t: f32,
) -> [f32; 3] {
    let t2 = t * t;
    let t3 = t2 * t;

    let h00 = 2.0 * t3 - 3.0 * t2 + 1.0;
    let h10 = t3 - 2.0 * t2 + t;
    let h01 = -2.0 * t3 + 3.0 * t2;
    let h11 = t3 - t2;

    std::array::from_fn(|i| h00 * p0[i] + h10 * (m0[i] * dt) + h01 * p1[i] + h11 * (m1[i] * dt))
}
