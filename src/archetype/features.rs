//! Archetype feature derivation
//!
//! Builds the two feature vectors the rule tables match against: the
//! listening-style vector (how a member reacts to the group's shares) and
//! the influence vector (how the group reacts to a member's shares). All
//! derivations are pure functions of latency samples, reaction
//! timestamps, and the windowed thresholds.

use chrono::{DateTime, Utc};

use crate::reflex::{FAST_CUTOFF_MS, INSTANT_CUTOFF_MS, STEADY_CUTOFF_MS};
use crate::stats;
use crate::types::{
    HabitCategory, InfluenceLevel, InfluenceStyle, ListeningStyle, SpeedCategory, VolumeCategory,
};
use crate::window::ReactionThresholds;

/// Gravity: trimmed group latency at or under ten minutes is high,
/// at or under two hours medium
const GRAVITY_HIGH_MAX_MS: f64 = 600_000.0;
const GRAVITY_MEDIUM_MAX_MS: f64 = 7_200_000.0;

/// Urgency: fastest-quartile latency at or under five minutes is high,
/// at or under one hour medium
const URGENCY_HIGH_MAX_MS: f64 = 300_000.0;
const URGENCY_MEDIUM_MAX_MS: f64 = 3_600_000.0;

/// Magnetism: share of the other members who reacted at all
const MAGNETISM_HIGH_MIN: f64 = 0.75;
const MAGNETISM_MEDIUM_MIN: f64 = 0.4;

/// Volume (influence side): reactions drawn per share
const DRAW_HIGH_MIN: f64 = 3.0;
const DRAW_MEDIUM_MIN: f64 = 1.5;

/// Volume (listening side): member count relative to the group mean
const HIGH_FREQ_RATIO: f64 = 1.2;
const SELECTIVE_RATIO: f64 = 0.5;

/// Speed category from a member's median latency.
///
/// Shares the band edges of the reflex bucketer: exactly one hour is
/// fast, one millisecond past it is steady.
pub fn speed_category(median_ms: f64) -> SpeedCategory {
    if median_ms < INSTANT_CUTOFF_MS {
        SpeedCategory::Instant
    } else if median_ms <= FAST_CUTOFF_MS {
        SpeedCategory::Fast
    } else if median_ms <= STEADY_CUTOFF_MS {
        SpeedCategory::Steady
    } else {
        SpeedCategory::Delayed
    }
}

/// True when three chronologically adjacent reactions form a burst:
/// both gaps inside the window's cluster gap.
pub fn has_cluster(reaction_times: &[DateTime<Utc>], cluster_gap_ms: i64) -> bool {
    let mut sorted = reaction_times.to_vec();
    sorted.sort();
    sorted.windows(3).any(|w| {
        (w[1] - w[0]).num_milliseconds() <= cluster_gap_ms
            && (w[2] - w[1]).num_milliseconds() <= cluster_gap_ms
    })
}

/// Habit category from the dynamic variance arc.
///
/// The coefficient of variation, scaled by the window's normalization
/// factor, is projected onto a 20-330 degree arc. Arcs at or under the
/// window's consistency cutoff read as ritualist; otherwise bursts make a
/// batcher, arcs past the erratic cutoff make an erratic, and the
/// remaining mid-arc members without bursts read as ritualist habit
/// rather than chaos.
pub fn habit_category(
    latencies: &[f64],
    reaction_times: &[DateTime<Utc>],
    thresholds: &ReactionThresholds,
) -> HabitCategory {
    let cv = stats::coefficient_of_variation(latencies);
    let arc = thresholds.variance_arc_deg(cv);

    if arc <= thresholds.ritualist_arc_deg {
        return HabitCategory::Ritualist;
    }
    if has_cluster(reaction_times, thresholds.cluster_gap_ms) {
        return HabitCategory::Batcher;
    }
    if arc > thresholds.erratic_arc_deg {
        return HabitCategory::Erratic;
    }
    HabitCategory::Ritualist
}

/// Volume category relative to the group's mean reaction count.
///
/// The mean is taken over members with at least one reaction in the
/// window, so a quiet group does not inflate everyone else.
pub fn volume_category(reaction_count: usize, group_mean_count: f64) -> VolumeCategory {
    if group_mean_count <= 0.0 {
        return VolumeCategory::Casual;
    }
    let ratio = reaction_count as f64 / group_mean_count;
    if ratio > HIGH_FREQ_RATIO {
        VolumeCategory::HighFreq
    } else if ratio < SELECTIVE_RATIO {
        VolumeCategory::Selective
    } else {
        VolumeCategory::Casual
    }
}

/// Full listening-style vector for one member.
pub fn listening_style(
    latencies: &[f64],
    reaction_times: &[DateTime<Utc>],
    group_mean_count: f64,
    thresholds: &ReactionThresholds,
) -> ListeningStyle {
    ListeningStyle {
        speed: speed_category(stats::median(latencies)),
        habit: habit_category(latencies, reaction_times, thresholds),
        volume: volume_category(latencies.len(), group_mean_count),
    }
}

fn latency_level(ms: f64, high_max: f64, medium_max: f64) -> InfluenceLevel {
    if ms <= high_max {
        InfluenceLevel::High
    } else if ms <= medium_max {
        InfluenceLevel::Medium
    } else {
        InfluenceLevel::Low
    }
}

fn ratio_level(value: f64, high_min: f64, medium_min: f64) -> InfluenceLevel {
    if value >= high_min {
        InfluenceLevel::High
    } else if value >= medium_min {
        InfluenceLevel::Medium
    } else {
        InfluenceLevel::Low
    }
}

/// Full influence vector for one member, from the latencies of *other*
/// members' reactions to that member's shares.
///
/// Gravity uses the trimmed median so a single slow outlier cannot
/// downgrade an otherwise-instant group response, and is forced high
/// whenever consensus is detected, regardless of the trimmed-median
/// threshold. A member whose shares drew no reactions bottoms out at low
/// on every latency level rather than erroring.
pub fn influence_style(
    latencies: &[f64],
    reacting_members: usize,
    other_member_count: usize,
    share_count: usize,
) -> InfluenceStyle {
    let has_consensus = stats::has_consensus(latencies);

    let gravity = if has_consensus {
        InfluenceLevel::High
    } else if latencies.is_empty() {
        InfluenceLevel::Low
    } else {
        latency_level(
            stats::trimmed_median(latencies),
            GRAVITY_HIGH_MAX_MS,
            GRAVITY_MEDIUM_MAX_MS,
        )
    };

    let urgency = if latencies.is_empty() {
        InfluenceLevel::Low
    } else {
        latency_level(
            stats::percentile(latencies, 25.0),
            URGENCY_HIGH_MAX_MS,
            URGENCY_MEDIUM_MAX_MS,
        )
    };

    let magnetism = if other_member_count == 0 {
        InfluenceLevel::Low
    } else {
        ratio_level(
            reacting_members as f64 / other_member_count as f64,
            MAGNETISM_HIGH_MIN,
            MAGNETISM_MEDIUM_MIN,
        )
    };

    let volume = if share_count == 0 {
        InfluenceLevel::Low
    } else {
        ratio_level(
            latencies.len() as f64 / share_count as f64,
            DRAW_HIGH_MIN,
            DRAW_MEDIUM_MIN,
        )
    };

    InfluenceStyle {
        gravity,
        urgency,
        magnetism,
        volume,
        has_consensus,
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::window::{AnalysisWindow, HOUR_MS};
    use chrono::{Duration, TimeZone};
    use pretty_assertions::assert_eq;

    fn ts(min: i64) -> DateTime<Utc> {
        Utc.with_ymd_and_hms(2026, 7, 3, 9, 0, 0).unwrap() + Duration::minutes(min)
    }

    #[test]
    fn speed_boundaries_match_reflex_bands() {
        assert_eq!(speed_category(0.0), SpeedCategory::Instant);
        assert_eq!(speed_category(59_999.0), SpeedCategory::Instant);
        assert_eq!(speed_category(60_000.0), SpeedCategory::Fast);
        // exactly one hour is fast, not steady
        assert_eq!(speed_category(3_600_000.0), SpeedCategory::Fast);
        assert_eq!(speed_category(3_600_001.0), SpeedCategory::Steady);
        assert_eq!(speed_category(86_400_000.0), SpeedCategory::Delayed);
    }

    #[test]
    fn cluster_needs_three_adjacent_reactions() {
        let gap = 10 * 60 * 1000;
        // two close reactions are not a burst
        assert!(!has_cluster(&[ts(0), ts(1)], gap));
        // three within the gap are
        assert!(has_cluster(&[ts(0), ts(4), ts(9)], gap));
        // a long pause in the middle breaks it
        assert!(!has_cluster(&[ts(0), ts(30), ts(60)], gap));
        // order on input does not matter
        assert!(has_cluster(&[ts(9), ts(0), ts(4)], gap));
    }

    #[test]
    fn near_constant_latencies_read_as_ritualist() {
        let thresholds = ReactionThresholds::for_window(AnalysisWindow::Week);
        let latencies = vec![60_000.0, 61_000.0, 62_000.0, 60_500.0];
        let times = vec![ts(0), ts(600), ts(1200), ts(1800)];
        assert_eq!(
            habit_category(&latencies, &times, &thresholds),
            HabitCategory::Ritualist
        );
    }

    #[test]
    fn variable_latencies_with_bursts_read_as_batcher() {
        let thresholds = ReactionThresholds::for_window(AnalysisWindow::Week);
        // wildly variable latency, but reactions arrive in one tight burst
        let latencies = vec![1_000.0, 500_000.0, 9_000_000.0, 40_000.0];
        let times = vec![ts(0), ts(4), ts(8), ts(2000)];
        assert_eq!(
            habit_category(&latencies, &times, &thresholds),
            HabitCategory::Batcher
        );
    }

    #[test]
    fn variable_latencies_without_bursts_read_as_erratic() {
        let thresholds = ReactionThresholds::for_window(AnalysisWindow::Week);
        let latencies = vec![1_000.0, 500_000.0, 9_000_000.0, 40_000.0];
        // hours apart, no clustering
        let times = vec![ts(0), ts(300), ts(700), ts(1400)];
        assert_eq!(
            habit_category(&latencies, &times, &thresholds),
            HabitCategory::Erratic
        );
    }

    #[test]
    fn volume_category_compares_against_group_mean() {
        assert_eq!(volume_category(13, 10.0), VolumeCategory::HighFreq);
        assert_eq!(volume_category(10, 10.0), VolumeCategory::Casual);
        assert_eq!(volume_category(4, 10.0), VolumeCategory::Selective);
        // empty cohort degrades to casual, not a division by zero
        assert_eq!(volume_category(5, 0.0), VolumeCategory::Casual);
    }

    #[test]
    fn consensus_forces_gravity_high() {
        // one sample, instant: consensus true even with n = 1
        let style = influence_style(&[45_000.0], 1, 2, 1);
        assert!(style.has_consensus);
        assert_eq!(style.gravity, InfluenceLevel::High);

        // mass instant reaction with one straggler
        let latencies = [10_000.0, 11_000.0, 12_000.0, 13_000.0, 20_000_000.0];
        let style = influence_style(&latencies, 3, 4, 2);
        assert!(style.has_consensus);
        assert_eq!(style.gravity, InfluenceLevel::High);
    }

    #[test]
    fn gravity_uses_trimmed_median_without_consensus() {
        // evenly spread, no consensus; trimmed median drops the 12h tail
        let latencies = [
            2.0 * HOUR_MS as f64,
            3.0 * HOUR_MS as f64,
            5.0 * HOUR_MS as f64,
            8.0 * HOUR_MS as f64,
            12.0 * HOUR_MS as f64,
        ];
        let style = influence_style(&latencies, 3, 4, 3);
        assert!(!style.has_consensus);
        assert_eq!(style.gravity, InfluenceLevel::Low);
    }

    #[test]
    fn no_reactions_bottoms_out_all_levels() {
        let style = influence_style(&[], 0, 3, 2);
        assert!(!style.has_consensus);
        assert_eq!(style.gravity, InfluenceLevel::Low);
        assert_eq!(style.urgency, InfluenceLevel::Low);
        assert_eq!(style.magnetism, InfluenceLevel::Low);
        assert_eq!(style.volume, InfluenceLevel::Low);
    }

    #[test]
    fn magnetism_tracks_group_reach() {
        let latencies = [30_000.0, 30_000.0, 30_000.0];
        assert_eq!(
            influence_style(&latencies, 3, 4, 1).magnetism,
            InfluenceLevel::High
        );
        assert_eq!(
            influence_style(&latencies, 2, 4, 1).magnetism,
            InfluenceLevel::Medium
        );
        assert_eq!(
            influence_style(&latencies, 1, 4, 1).magnetism,
            InfluenceLevel::Low
        );
        // a solo group has nobody else to magnetize
        assert_eq!(
            influence_style(&latencies, 0, 0, 1).magnetism,
            InfluenceLevel::Low
        );
    }
}
