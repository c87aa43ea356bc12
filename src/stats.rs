//! Latency statistics
//!
//! Pure numeric routines over per-reaction latency samples (milliseconds
//! from share creation to reaction). Sample order is irrelevant; every
//! function is total and degrades to neutral values on empty or
//! single-sample input instead of erroring.

use std::cmp::Ordering;

/// Fraction of the slowest samples dropped by [`trimmed_median`]
const TRIM_FRACTION: f64 = 0.2;

/// Width of the fast band used by [`has_consensus`], as a fraction of the
/// observed latency range
const CONSENSUS_BAND: f64 = 0.1;

/// Share of samples that must land in the fast band for consensus
const CONSENSUS_QUORUM: f64 = 0.5;

/// Arithmetic mean; 0 for an empty set.
pub fn mean(samples: &[f64]) -> f64 {
    if samples.is_empty() {
        return 0.0;
    }
    samples.iter().sum::<f64>() / samples.len() as f64
}

/// Median after ascending sort.
///
/// 0 for an empty set, the single value for N=1, the average of the two
/// middle values for even N.
pub fn median(samples: &[f64]) -> f64 {
    let sorted = sorted_copy(samples);
    median_of_sorted(&sorted)
}

/// Percentile via linear interpolation between closest ranks.
///
/// `pct` is 0-100; 0 for an empty set. `percentile(s, 50.0)` agrees with
/// [`median`].
pub fn percentile(samples: &[f64], pct: f64) -> f64 {
    let sorted = sorted_copy(samples);
    if sorted.is_empty() {
        return 0.0;
    }
    let rank = (pct / 100.0).clamp(0.0, 1.0) * (sorted.len() - 1) as f64;
    let lo = rank.floor() as usize;
    let hi = rank.ceil() as usize;
    if lo == hi {
        sorted[lo]
    } else {
        sorted[lo] + (rank - lo as f64) * (sorted[hi] - sorted[lo])
    }
}

/// Population standard deviation; 0 for N <= 1.
pub fn std_dev(samples: &[f64]) -> f64 {
    if samples.len() <= 1 {
        return 0.0;
    }
    let m = mean(samples);
    let variance = samples.iter().map(|x| (x - m).powi(2)).sum::<f64>() / samples.len() as f64;
    variance.sqrt()
}

/// Coefficient of variation: std dev / mean.
///
/// 0 for N <= 1. A zero-mean set with N > 1 returns 1 rather than
/// dividing by zero.
pub fn coefficient_of_variation(samples: &[f64]) -> f64 {
    if samples.len() <= 1 {
        return 0.0;
    }
    let m = mean(samples);
    if m == 0.0 {
        return 1.0;
    }
    std_dev(samples) / m
}

/// Median of the sample set with the slowest 20% dropped.
///
/// Sorts ascending, drops `floor(N * 0.2)` elements from the tail, and
/// takes the median of the remainder, so a few very slow ghost reactors
/// cannot distort the central tendency. Falls back to the full-set median
/// if trimming would empty the set.
pub fn trimmed_median(samples: &[f64]) -> f64 {
    let sorted = sorted_copy(samples);
    if sorted.is_empty() {
        return 0.0;
    }
    let drop = (sorted.len() as f64 * TRIM_FRACTION).floor() as usize;
    let kept = &sorted[..sorted.len() - drop];
    if kept.is_empty() {
        median_of_sorted(&sorted)
    } else {
        median_of_sorted(kept)
    }
}

/// Detect an instant mass reaction despite a minority of stragglers.
///
/// True when the range is zero or N=1. Otherwise true iff at least 50% of
/// samples fall within the fastest 10% of the observed range. False for an
/// empty set: no samples, no consensus.
pub fn has_consensus(samples: &[f64]) -> bool {
    let sorted = sorted_copy(samples);
    match sorted.len() {
        0 => false,
        1 => true,
        n => {
            let min = sorted[0];
            let max = sorted[n - 1];
            let range = max - min;
            if range == 0.0 {
                return true;
            }
            let cutoff = min + CONSENSUS_BAND * range;
            let fast = sorted.iter().take_while(|&&s| s <= cutoff).count();
            fast as f64 >= CONSENSUS_QUORUM * n as f64
        }
    }
}

fn sorted_copy(samples: &[f64]) -> Vec<f64> {
    let mut sorted = samples.to_vec();
    sorted.sort_by(|a, b| a.partial_cmp(b).unwrap_or(Ordering::Equal));
    sorted
}

fn median_of_sorted(sorted: &[f64]) -> f64 {
    let n = sorted.len();
    if n == 0 {
        return 0.0;
    }
    if n % 2 == 1 {
        sorted[n / 2]
    } else {
        (sorted[n / 2 - 1] + sorted[n / 2]) / 2.0
    }
}
