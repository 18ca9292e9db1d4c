//! Cubic IR resampling
//!
//! Converts the IR from its file rate to the host rate. The input is padded
//! with one zero on each side, then read with a four-point Catmull-Rom
//! interpolator. Output sample `k` sits at `k * source_rate / target_rate`
//! in padded-input samples; production stops before the last padded sample,
//! which gives `ceil((len + 1) * target_rate / source_rate)` outputs.
//! Callers pass a cap on the output length; production stops there, so the
//! work is bounded by the cap even for extreme rate ratios.

use ir_core::Tap;

/// Catmull-Rom interpolation between `p[1]` and `p[2]`, `x` in [0, 1).
#[inline]
pub fn cubic_interpolate(p: [f64; 4], x: f64) -> f64 {
    p[1] + 0.5
        * x
        * (p[2] - p[0]
            + x * (2.0 * p[0] - 5.0 * p[1] + 4.0 * p[2] - p[3]
                + x * (3.0 * (p[1] - p[2]) + p[3] - p[0])))
}

/// Resample `samples` from `source_rate` to `target_rate`, producing at
/// most `max_len` samples.
///
/// Equal rates return an exact copy (truncated to `max_len`). Rates are
/// assumed positive and finite; callers validate them.
pub fn resample(samples: &[Tap], source_rate: f64, target_rate: f64, max_len: usize) -> Vec<Tap> {
    if source_rate == target_rate {
        return samples[..samples.len().min(max_len)].to_vec();
    }

    let mut padded = Vec::with_capacity(samples.len() + 2);
    padded.push(0.0);
    padded.extend(samples.iter().map(|&s| f64::from(s)));
    padded.push(0.0);

    let step = source_rate / target_rate;
    let end = (padded.len() - 1) as f64;
    let last = padded.len() - 1;

    let mut output = Vec::with_capacity(((end / step).ceil() as usize).min(max_len));
    // Position is recomputed from k each time so no rounding accumulates
    let mut k = 0usize;
    loop {
        let position = k as f64 * step;
        if position >= end || output.len() == max_len {
            break;
        }
        let index = position.floor() as usize;
        let frac = position - index as f64;

        let p = [
            padded[index.saturating_sub(1)],
            padded[index],
            padded[index + 1],
            padded[(index + 2).min(last)],
        ];
        output.push(cubic_interpolate(p, frac) as Tap);
        k += 1;
    }

    output
}
