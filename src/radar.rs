//! Radar profile normalizer
//!
//! Converts raw per-member reaction metrics into 0-100 axis scores
//! relative to the cohort. Each axis is linearly normalized against the
//! cohort's observed maximum; a cohort max of 0 clamps the whole axis to
//! 0 instead of dividing by zero. Low-data profiles are flagged, never
//! hidden.

use std::collections::{HashMap, HashSet};

use crate::reflex;
use crate::stats;
use crate::store::GroupSnapshot;
use crate::types::{RadarAxes, RadarProfile, RadarRaw};
use crate::window::{AnalysisWindow, ReactionThresholds};

/// Reaction count under which a profile is flagged `low_data`
pub const MIN_SAMPLE_FLOOR: usize = 3;

/// Newest fraction of the group's shares counted by the recency axis
const RECENCY_SHARE_FRACTION: f64 = 0.25;

struct RawMetrics {
    user_id: String,
    speed: f64,
    consistency: f64,
    recency: f64,
    volume: f64,
    burstiness: f64,
    reaction_count: usize,
    median_ms: f64,
    iqr_ms: f64,
}

/// Cohort-normalized radar profiles for every group member.
pub fn radar_profiles(snapshot: &GroupSnapshot, window: AnalysisWindow) -> Vec<RadarProfile> {
    let thresholds = ReactionThresholds::for_window(window);
    let latencies_by_member = reflex::latencies_by_member(snapshot, window);

    // newest quartile of the group's shares, for the recency bias
    let mut shares_by_age: Vec<&crate::types::ShareRecord> = snapshot.shares.iter().collect();
    shares_by_age.sort_by(|a, b| b.created_at.cmp(&a.created_at));
    let newest_count = ((shares_by_age.len() as f64 * RECENCY_SHARE_FRACTION).ceil()) as usize;
    let newest_ids: HashSet<&str> = shares_by_age
        .iter()
        .take(newest_count)
        .map(|s| s.id.as_str())
        .collect();

    let mut reaction_times = HashMap::new();
    let mut newest_hits: HashMap<&str, usize> = HashMap::new();
    for reaction in snapshot.reactions_in(window) {
        reaction_times
            .entry(reaction.user_id.as_str())
            .or_insert_with(Vec::new)
            .push(reaction.reacted_at);
        if newest_ids.contains(reaction.share_id.as_str()) {
            *newest_hits.entry(reaction.user_id.as_str()).or_insert(0) += 1;
        }
    }

    let raw_metrics: Vec<RawMetrics> = snapshot
        .members
        .iter()
        .map(|member| {
            let latencies = latencies_by_member
                .get(member.user_id.as_str())
                .map(Vec::as_slice)
                .unwrap_or(&[]);
            let times = reaction_times
                .get(member.user_id.as_str())
                .map(Vec::as_slice)
                .unwrap_or(&[]);

            let median_ms = stats::median(latencies);
            let iqr_ms = stats::percentile(latencies, 75.0) - stats::percentile(latencies, 25.0);

            let (speed, consistency) = if latencies.is_empty() {
                (0.0, 0.0)
            } else {
                (
                    1.0 / (1.0 + median_ms / 1000.0),
                    1.0 / (1.0 + iqr_ms / 1000.0),
                )
            };

            let recency = if latencies.is_empty() {
                0.0
            } else {
                let hits = newest_hits.get(member.user_id.as_str()).copied().unwrap_or(0);
                hits as f64 / latencies.len() as f64
            };

            let burstiness = burstiness_raw(times, thresholds.cluster_gap_ms);

            RawMetrics {
                user_id: member.user_id.clone(),
                speed,
                consistency,
                recency,
                volume: latencies.len() as f64,
                burstiness,
                reaction_count: latencies.len(),
                median_ms,
                iqr_ms,
            }
        })
        .collect();

    let max_speed = cohort_max(&raw_metrics, |m| m.speed);
    let max_consistency = cohort_max(&raw_metrics, |m| m.consistency);
    let max_recency = cohort_max(&raw_metrics, |m| m.recency);
    let max_volume = cohort_max(&raw_metrics, |m| m.volume);
    let max_burstiness = cohort_max(&raw_metrics, |m| m.burstiness);

    raw_metrics
        .into_iter()
        .map(|m| RadarProfile {
            axes: RadarAxes {
                speed: normalize(m.speed, max_speed),
                consistency: normalize(m.consistency, max_consistency),
                recency: normalize(m.recency, max_recency),
                volume: normalize(m.volume, max_volume),
                burstiness: normalize(m.burstiness, max_burstiness),
            },
            raw: RadarRaw {
                reaction_count: m.reaction_count,
                median_latency_seconds: m.median_ms / 1000.0,
                iqr_seconds: m.iqr_ms / 1000.0,
            },
            low_data: m.reaction_count < MIN_SAMPLE_FLOOR,
            user_id: m.user_id,
        })
        .collect()
}

/// Degree of clustering: share of reaction triplets forming a burst
/// inside the window's cluster gap. 0 with fewer than three reactions.
fn burstiness_raw(times: &[chrono::DateTime<chrono::Utc>], cluster_gap_ms: i64) -> f64 {
    if times.len() < 3 {
        return 0.0;
    }
    let mut sorted = times.to_vec();
    sorted.sort();
    let windows = sorted.len() - 2;
    let bursts = sorted
        .windows(3)
        .filter(|w| {
            (w[1] - w[0]).num_milliseconds() <= cluster_gap_ms
                && (w[2] - w[1]).num_milliseconds() <= cluster_gap_ms
        })
        .count();
    bursts as f64 / windows as f64
}

fn cohort_max(metrics: &[RawMetrics], axis: impl Fn(&RawMetrics) -> f64) -> f64 {
    metrics.iter().map(axis).fold(0.0, f64::max)
}

fn normalize(value: f64, cohort_max: f64) -> f64 {
    if cohort_max <= 0.0 {
        return 0.0;
    }
    (value / cohort_max * 100.0).clamp(0.0, 100.0)
}
