//! Reflex bucketer
//!
//! Assigns each group member a fixed reaction-speed bucket from absolute,
//! window-independent latency cutoffs and computes the group-wide
//! summary. Buckets are mutually exclusive and exhaustive. A member with
//! zero reactions in the window still appears in the profile list with
//! `reaction_count: 0` but is excluded from bucket counts.

use std::collections::HashMap;

use crate::stats;
use crate::store::GroupSnapshot;
use crate::types::{ReflexCategory, ReflexReport, UserLatencyProfile};
use crate::window::AnalysisWindow;

/// Upper bound of the instant band, exclusive: one minute
pub const INSTANT_CUTOFF_MS: f64 = 60_000.0;

/// Upper bound of the quick/fast band, inclusive: one hour
pub const FAST_CUTOFF_MS: f64 = 3_600_000.0;

/// Upper bound of the slow/steady band, inclusive: twelve hours
pub const STEADY_CUTOFF_MS: f64 = 43_200_000.0;

/// Absolute bucket assignment from an aggregate latency.
///
/// Band edges are defined once for both this bucketer and the archetype
/// speed category: instant is strictly under one minute, while the quick
/// and slow upper bounds are inclusive. A median of exactly one hour is
/// quick, not slow.
pub fn bucket_for(median_ms: f64) -> ReflexCategory {
    if median_ms < INSTANT_CUTOFF_MS {
        ReflexCategory::Instant
    } else if median_ms <= FAST_CUTOFF_MS {
        ReflexCategory::Quick
    } else if median_ms <= STEADY_CUTOFF_MS {
        ReflexCategory::Slow
    } else {
        ReflexCategory::LongTail
    }
}

/// In-window latency samples for every member, keyed by user id.
///
/// Every member gets an entry (possibly empty); reactions from users
/// outside the directory were already dropped at the snapshot boundary.
pub(crate) fn latencies_by_member<'a>(
    snapshot: &'a GroupSnapshot,
    window: AnalysisWindow,
) -> HashMap<&'a str, Vec<f64>> {
    let mut map: HashMap<&str, Vec<f64>> = snapshot
        .members
        .iter()
        .map(|m| (m.user_id.as_str(), Vec::new()))
        .collect();

    for reaction in snapshot.reactions_in(window) {
        if let Some(latencies) = map.get_mut(reaction.user_id.as_str()) {
            latencies.push(reaction.latency_ms as f64);
        }
    }

    map
}

/// Latency profile for one member from their in-window samples.
pub fn latency_profile(
    user_id: &str,
    display_name: &str,
    latencies: &[f64],
) -> UserLatencyProfile {
    let median_ms = stats::median(latencies);
    let category = if latencies.is_empty() {
        None
    } else {
        Some(bucket_for(median_ms))
    };

    UserLatencyProfile {
        user_id: user_id.to_string(),
        display_name: display_name.to_string(),
        reaction_count: latencies.len(),
        median_ms,
        p25_ms: stats::percentile(latencies, 25.0),
        p75_ms: stats::percentile(latencies, 75.0),
        std_dev_ms: stats::std_dev(latencies),
        coefficient_of_variation: stats::coefficient_of_variation(latencies),
        trimmed_median_ms: stats::trimmed_median(latencies),
        category,
    }
}

/// Per-member profiles plus the group-wide summary for one window.
pub fn reflex_report(snapshot: &GroupSnapshot, window: AnalysisWindow) -> ReflexReport {
    let by_member = latencies_by_member(snapshot, window);

    let profiles: Vec<UserLatencyProfile> = snapshot
        .members
        .iter()
        .map(|m| {
            let latencies = by_member
                .get(m.user_id.as_str())
                .map(Vec::as_slice)
                .unwrap_or(&[]);
            latency_profile(&m.user_id, &m.display_name, latencies)
        })
        .collect();

    let all_latencies: Vec<f64> = snapshot
        .reactions_in(window)
        .iter()
        .map(|r| r.latency_ms as f64)
        .collect();

    let instant_count = profiles
        .iter()
        .filter(|p| p.category == Some(ReflexCategory::Instant))
        .count();

    ReflexReport {
        group_median_ms: stats::median(&all_latencies),
        instant_count,
        profiles,
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::store::{RawReaction, RawShare, RawSnapshot, ReactionKind};
    use crate::types::GroupMember;
    use chrono::{DateTime, Duration, TimeZone, Utc};
    use pretty_assertions::assert_eq;

    #[test]
    fn buckets_are_exhaustive_with_inclusive_upper_bounds() {
        assert_eq!(bucket_for(0.0), ReflexCategory::Instant);
        assert_eq!(bucket_for(59_999.0), ReflexCategory::Instant);
        // the one-minute mark leaves the instant band
        assert_eq!(bucket_for(60_000.0), ReflexCategory::Quick);
        // exactly one hour stays quick; one ms past it does not
        assert_eq!(bucket_for(3_600_000.0), ReflexCategory::Quick);
        assert_eq!(bucket_for(3_600_001.0), ReflexCategory::Slow);
        assert_eq!(bucket_for(43_200_000.0), ReflexCategory::Slow);
        assert_eq!(bucket_for(43_200_001.0), ReflexCategory::LongTail);
    }

    fn ts(sec: i64) -> DateTime<Utc> {
        Utc.with_ymd_and_hms(2026, 7, 1, 12, 0, 0).unwrap() + Duration::seconds(sec)
    }

    fn member(id: &str) -> GroupMember {
        GroupMember {
            user_id: id.to_string(),
            display_name: id.to_string(),
            avatar_url: None,
        }
    }

    fn snapshot_with_reactions(latencies_sec: &[(&str, i64)]) -> crate::store::GroupSnapshot {
        let raw = RawSnapshot {
            group_id: "g-1".to_string(),
            fetched_at: Some(ts(7200)),
            members: vec![member("u-alice"), member("u-bob"), member("u-quiet")],
            shares: vec![RawShare {
                id: "s-1".to_string(),
                sharer_id: "u-alice".to_string(),
                created_at: Some(ts(0)),
                like_count: 0,
                listen_count: 0,
                artists: vec![],
                genres: vec![],
            }],
            reactions: latencies_sec
                .iter()
                .map(|(user, sec)| RawReaction {
                    user_id: user.to_string(),
                    share_id: "s-1".to_string(),
                    kind: ReactionKind::Listen,
                    reacted_at: Some(ts(*sec)),
                })
                .collect(),
        };
        raw.sanitize().0
    }

    #[test]
    fn zero_reaction_members_appear_without_category() {
        let snapshot = snapshot_with_reactions(&[("u-bob", 10), ("u-bob", 20)]);
        let report = reflex_report(&snapshot, AnalysisWindow::Day);

        assert_eq!(report.profiles.len(), 3);
        let quiet = report
            .profiles
            .iter()
            .find(|p| p.user_id == "u-quiet")
            .unwrap();
        assert_eq!(quiet.reaction_count, 0);
        assert_eq!(quiet.category, None);
        assert_eq!(quiet.median_ms, 0.0);
    }

    #[test]
    fn instant_count_only_counts_instant_members() {
        // bob reacts in seconds, alice in hours
        let snapshot =
            snapshot_with_reactions(&[("u-bob", 10), ("u-bob", 20), ("u-alice", 7000)]);
        let report = reflex_report(&snapshot, AnalysisWindow::Day);

        assert_eq!(report.instant_count, 1);
        let alice = report
            .profiles
            .iter()
            .find(|p| p.user_id == "u-alice")
            .unwrap();
        assert_eq!(alice.category, Some(ReflexCategory::Slow));
    }

    #[test]
    fn group_median_spans_all_members() {
        let snapshot =
            snapshot_with_reactions(&[("u-bob", 10), ("u-bob", 30), ("u-alice", 50)]);
        let report = reflex_report(&snapshot, AnalysisWindow::Day);
        assert_eq!(report.group_median_ms, 30_000.0);
    }

    #[test]
    fn profile_carries_full_statistics() {
        let snapshot = snapshot_with_reactions(&[
            ("u-bob", 10),
            ("u-bob", 20),
            ("u-bob", 30),
            ("u-bob", 40),
        ]);
        let report = reflex_report(&snapshot, AnalysisWindow::Day);
        let bob = report
            .profiles
            .iter()
            .find(|p| p.user_id == "u-bob")
            .unwrap();

        assert_eq!(bob.reaction_count, 4);
        assert_eq!(bob.median_ms, 25_000.0);
        assert_eq!(bob.trimmed_median_ms, 25_000.0);
        assert!(bob.p25_ms < bob.median_ms);
        assert!(bob.p75_ms > bob.median_ms);
        assert!(bob.std_dev_ms > 0.0);
        assert_eq!(bob.category, Some(ReflexCategory::Instant));
    }
}
