//! Group aggregation engine
//!
//! Operates directly over the group's share, like, and listen records
//! rather than the per-member latency profiles: the activity timeline,
//! member engagement totals, and superlative winners. Every aggregation
//! is an independent pure function of the snapshot.

use std::cmp::Ordering;
use std::collections::HashMap;

use chrono::{DateTime, Duration, DurationRound, Utc};

use crate::reflex;
use crate::stats;
use crate::store::GroupSnapshot;
use crate::types::{
    ActivityTimeline, MemberEngagement, SuperlativeResult, TimelineBucket, TimelineInterval,
};
use crate::window::AnalysisWindow;

/// Reactions required before the quick-draw ranking trusts a median
const QUICK_DRAW_MIN_REACTIONS: usize = 3;

/// Bucket shares, likes, and listens over the window.
///
/// Hourly buckets for the 24h window, daily otherwise. Buckets are
/// contiguous from the window start (or the earliest event, for
/// all-time) through the snapshot time; quiet intervals appear as zero
/// buckets rather than gaps.
pub fn activity_timeline(snapshot: &GroupSnapshot, window: AnalysisWindow) -> ActivityTimeline {
    let (interval, step) = match window {
        AnalysisWindow::Day => (TimelineInterval::Hourly, Duration::hours(1)),
        _ => (TimelineInterval::Daily, Duration::days(1)),
    };

    let start = match snapshot.window_start(window) {
        Some(start) => Some(start),
        None => earliest_event(snapshot),
    };
    let Some(start) = start else {
        return ActivityTimeline {
            interval,
            buckets: Vec::new(),
        };
    };

    let floor = |t: DateTime<Utc>| t.duration_trunc(step).unwrap_or(t);

    let mut counts: HashMap<DateTime<Utc>, (usize, usize, usize)> = HashMap::new();
    for share in snapshot.shares_in(window) {
        counts.entry(floor(share.created_at)).or_default().0 += 1;
    }
    for like in &snapshot.likes {
        if like.liked_at >= start {
            counts.entry(floor(like.liked_at)).or_default().1 += 1;
        }
    }
    for listen in &snapshot.listens {
        if listen.listened_at >= start {
            counts.entry(floor(listen.listened_at)).or_default().2 += 1;
        }
    }

    let mut buckets = Vec::new();
    let mut cursor = floor(start);
    let end = snapshot.fetched_at;
    while cursor <= end {
        let (shares, likes, listens) = counts.get(&cursor).copied().unwrap_or_default();
        buckets.push(TimelineBucket {
            bucket_start: cursor,
            shares,
            likes,
            listens,
            activity: shares + likes + listens,
        });
        cursor += step;
    }

    ActivityTimeline { interval, buckets }
}

fn earliest_event(snapshot: &GroupSnapshot) -> Option<DateTime<Utc>> {
    let earliest_share = snapshot.shares.iter().map(|s| s.created_at).min();
    let earliest_reaction = snapshot.reactions.iter().map(|r| r.reacted_at).min();
    match (earliest_share, earliest_reaction) {
        (Some(a), Some(b)) => Some(a.min(b)),
        (a, b) => a.or(b),
    }
}

/// Per-member engagement totals over the window.
///
/// Sourced from the member directory, so members with no shares still
/// appear with zero stats.
pub fn member_engagement(
    snapshot: &GroupSnapshot,
    window: AnalysisWindow,
) -> Vec<MemberEngagement> {
    let mut by_sharer: HashMap<&str, (usize, u32, u32, Option<DateTime<Utc>>)> = HashMap::new();
    for share in snapshot.shares_in(window) {
        let entry = by_sharer.entry(share.sharer_id.as_str()).or_default();
        entry.0 += 1;
        entry.1 += share.like_count;
        entry.2 += share.listen_count;
        entry.3 = Some(match entry.3 {
            Some(latest) => latest.max(share.created_at),
            None => share.created_at,
        });
    }

    snapshot
        .members
        .iter()
        .map(|member| {
            let (total_shares, likes_received, listens_received, last_shared_at) = by_sharer
                .get(member.user_id.as_str())
                .copied()
                .unwrap_or_default();
            MemberEngagement {
                user_id: member.user_id.clone(),
                display_name: member.display_name.clone(),
                total_shares,
                likes_received,
                listens_received,
                last_shared_at,
            }
        })
        .collect()
}

type CandidateFn = fn(&GroupSnapshot, AnalysisWindow) -> Vec<(String, f64)>;

struct SuperlativeRule {
    key: &'static str,
    label: &'static str,
    description: &'static str,
    /// false for rankings where the smallest value wins (quick draw)
    higher_wins: bool,
    candidates: CandidateFn,
}

/// Fixed, independently evaluated ranking rules. Each yields at most one
/// winner; a rule with no qualifying data yields no entry rather than a
/// zero-value winner.
const SUPERLATIVE_RULES: &[SuperlativeRule] = &[
    SuperlativeRule {
        key: "dj",
        label: "The DJ",
        description: "Shared the most tracks",
        higher_wins: true,
        candidates: shares_given,
    },
    SuperlativeRule {
        key: "trendsetter",
        label: "Trendsetter",
        description: "Collected the most likes on their shares",
        higher_wins: true,
        candidates: likes_received,
    },
    SuperlativeRule {
        key: "hype_machine",
        label: "Hype Machine",
        description: "Handed out the most likes",
        higher_wins: true,
        candidates: likes_given,
    },
    SuperlativeRule {
        key: "marathon_ears",
        label: "Marathon Ears",
        description: "Played the most shared tracks",
        higher_wins: true,
        candidates: listens_given,
    },
    SuperlativeRule {
        key: "quick_draw",
        label: "Quick Draw",
        description: "Fastest median reaction time",
        higher_wins: false,
        candidates: fastest_median,
    },
];

fn shares_given(snapshot: &GroupSnapshot, window: AnalysisWindow) -> Vec<(String, f64)> {
    let mut counts: HashMap<&str, usize> = HashMap::new();
    for share in snapshot.shares_in(window) {
        *counts.entry(share.sharer_id.as_str()).or_default() += 1;
    }
    counts
        .into_iter()
        .filter(|(_, n)| *n > 0)
        .map(|(user, n)| (user.to_string(), n as f64))
        .collect()
}

fn likes_received(snapshot: &GroupSnapshot, window: AnalysisWindow) -> Vec<(String, f64)> {
    let mut totals: HashMap<&str, u32> = HashMap::new();
    for share in snapshot.shares_in(window) {
        *totals.entry(share.sharer_id.as_str()).or_default() += share.like_count;
    }
    totals
        .into_iter()
        .filter(|(_, n)| *n > 0)
        .map(|(user, n)| (user.to_string(), n as f64))
        .collect()
}

fn likes_given(snapshot: &GroupSnapshot, window: AnalysisWindow) -> Vec<(String, f64)> {
    let start = snapshot.window_start(window);
    let mut counts: HashMap<&str, usize> = HashMap::new();
    for like in &snapshot.likes {
        if start.map(|s| like.liked_at >= s).unwrap_or(true) {
            *counts.entry(like.user_id.as_str()).or_default() += 1;
        }
    }
    counts
        .into_iter()
        .map(|(user, n)| (user.to_string(), n as f64))
        .collect()
}

fn listens_given(snapshot: &GroupSnapshot, window: AnalysisWindow) -> Vec<(String, f64)> {
    let start = snapshot.window_start(window);
    let mut counts: HashMap<&str, usize> = HashMap::new();
    for listen in &snapshot.listens {
        if start.map(|s| listen.listened_at >= s).unwrap_or(true) {
            *counts.entry(listen.user_id.as_str()).or_default() += 1;
        }
    }
    counts
        .into_iter()
        .map(|(user, n)| (user.to_string(), n as f64))
        .collect()
}

fn fastest_median(snapshot: &GroupSnapshot, window: AnalysisWindow) -> Vec<(String, f64)> {
    reflex::latencies_by_member(snapshot, window)
        .into_iter()
        .filter(|(_, latencies)| latencies.len() >= QUICK_DRAW_MIN_REACTIONS)
        .map(|(user, latencies)| (user.to_string(), stats::median(&latencies)))
        .collect()
}

/// Evaluate every superlative rule over the caller-specified window
/// (pass all-time for the feed's classic unwindowed rankings).
///
/// Ties on the metric are broken by ascending user id, a deliberate
/// deterministic secondary key.
pub fn superlatives(snapshot: &GroupSnapshot, window: AnalysisWindow) -> Vec<SuperlativeResult> {
    SUPERLATIVE_RULES
        .iter()
        .filter_map(|rule| {
            let mut candidates = (rule.candidates)(snapshot, window);
            candidates.sort_by(|a, b| {
                let ord = if rule.higher_wins {
                    b.1.partial_cmp(&a.1)
                } else {
                    a.1.partial_cmp(&b.1)
                }
                .unwrap_or(Ordering::Equal);
                ord.then_with(|| a.0.cmp(&b.0))
            });
            candidates.into_iter().next().map(|(user, value)| SuperlativeResult {
                key: rule.key.to_string(),
                winning_user_id: user,
                value,
                label: rule.label.to_string(),
                description: rule.description.to_string(),
            })
        })
        .collect()
}
