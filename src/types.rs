//! Core types for the Mixtape Pulse engine
//!
//! This module defines the data structures that flow through each stage of
//! the engine: persisted event records, per-member latency profiles, radar
//! profiles, archetype results, group aggregates, and the assembled report.
//!
//! JSON field names are the de facto contract with the frontend and must
//! stay stable (camelCase as rendered by the feed UI).

use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};

use crate::window::AnalysisWindow;

/// A listen or like tied to a share, with latency relative to the share's
/// creation time.
///
/// Immutable once produced; owned by the event store. The engine only ever
/// reads a list of these per query. Invariant: `latency_ms >= 0`
/// (reactions predating the share are excluded at the snapshot boundary).
#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct ReactionEvent {
    pub user_id: String,
    pub share_id: String,
    pub group_id: String,
    /// When the share was created (UTC)
    pub shared_at: DateTime<Utc>,
    /// When the reaction happened (UTC)
    pub reacted_at: DateTime<Utc>,
    /// `reacted_at - shared_at` in milliseconds
    pub latency_ms: i64,
}

/// A like on a share. Used by the aggregation engine for support/hype
/// metrics, not by latency statistics.
#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct LikeEvent {
    pub user_id: String,
    pub share_id: String,
    pub liked_at: DateTime<Utc>,
}

/// A listen on a share. Drives the activity timeline and listen-volume
/// superlatives.
#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct ListenEvent {
    pub user_id: String,
    pub share_id: String,
    pub listened_at: DateTime<Utc>,
}

/// A track shared into the group feed, as returned by the event store.
#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct ShareRecord {
    pub id: String,
    pub group_id: String,
    pub sharer_id: String,
    pub created_at: DateTime<Utc>,
    /// Denormalized like total maintained by the event store
    #[serde(default)]
    pub like_count: u32,
    /// Denormalized listen total maintained by the event store
    #[serde(default)]
    pub listen_count: u32,
    /// Artist tags on the shared track
    #[serde(default)]
    pub artists: Vec<String>,
    /// Genre tags on the shared track
    #[serde(default)]
    pub genres: Vec<String>,
}

/// Current group membership, independent of share history.
///
/// Sourced from the member directory so that members with zero activity
/// still appear in every output.
#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct GroupMember {
    pub user_id: String,
    pub display_name: String,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub avatar_url: Option<String>,
}

/// Fixed reaction-speed bucket assigned from absolute latency cutoffs.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum ReflexCategory {
    Instant,
    Quick,
    Slow,
    LongTail,
}

/// Per-member latency statistics for one window. Derived, recomputed on
/// every query, never persisted.
#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct UserLatencyProfile {
    pub user_id: String,
    pub display_name: String,
    pub reaction_count: usize,
    pub median_ms: f64,
    pub p25_ms: f64,
    pub p75_ms: f64,
    pub std_dev_ms: f64,
    pub coefficient_of_variation: f64,
    pub trimmed_median_ms: f64,
    /// `None` when the member has no reactions in the window; such
    /// members still appear here but are excluded from bucket counts.
    pub category: Option<ReflexCategory>,
}

/// Group-wide reflex summary plus the per-member profile list.
#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct ReflexReport {
    /// Median over every in-window reaction latency in the group
    pub group_median_ms: f64,
    /// Number of members bucketed as instant reactors
    pub instant_count: usize,
    pub profiles: Vec<UserLatencyProfile>,
}

/// Radar axis scores, each normalized to 0-100 against the cohort.
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct RadarAxes {
    pub speed: f64,
    pub consistency: f64,
    pub recency: f64,
    pub volume: f64,
    pub burstiness: f64,
}

/// Raw figures behind a radar profile, for tooltips.
#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct RadarRaw {
    pub reaction_count: usize,
    pub median_latency_seconds: f64,
    pub iqr_seconds: f64,
}

/// A member's five-axis, cohort-normalized behavioral score vector.
///
/// `low_data` profiles must be rendered with reduced visual confidence but
/// never hidden.
#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct RadarProfile {
    pub user_id: String,
    pub axes: RadarAxes,
    pub raw: RadarRaw,
    pub low_data: bool,
}

/// How fast a member reacts, from their median latency.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum SpeedCategory {
    Instant,
    Fast,
    Steady,
    Delayed,
}

/// How regular a member's reaction habit is.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum HabitCategory {
    Ritualist,
    Batcher,
    Erratic,
}

/// How much a member reacts relative to the group.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum VolumeCategory {
    HighFreq,
    Casual,
    Selective,
}

/// Feature vector for the listening-style taxonomy: how a member reacts
/// to the group's shares.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct ListeningStyle {
    pub speed: SpeedCategory,
    pub habit: HabitCategory,
    pub volume: VolumeCategory,
}

/// Coarse level used by the influence taxonomy.
#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum InfluenceLevel {
    Low,
    Medium,
    High,
}

/// Feature vector for the influence taxonomy: how the group reacts to a
/// member's shares. Computed from *other* members' reactions only.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct InfluenceStyle {
    /// How fast the group converges on this member's shares
    /// (trimmed median, so single slow outliers cannot downgrade it)
    pub gravity: InfluenceLevel,
    /// How fast the fastest quartile jumps on them
    pub urgency: InfluenceLevel,
    /// How much of the group reacts at all
    pub magnetism: InfluenceLevel,
    /// Reactions drawn per share
    pub volume: InfluenceLevel,
    /// Instant mass reaction detected; forces gravity high
    pub has_consensus: bool,
}

/// Badge metadata rendered next to an archetype title.
#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct ArchetypeBadge {
    pub icon: String,
    pub color: String,
}

/// One label from a closed, ordered taxonomy describing a member's
/// reaction behavior or influence over the group.
///
/// `key` is the matched identity and never changes; `title` may carry a
/// contextual refinement (time-of-day or day-of-week framing).
#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct ArchetypeResult {
    pub user_id: String,
    pub key: String,
    pub title: String,
    /// One of the archetype's three fixed variants, chosen
    /// deterministically per user
    pub description: String,
    pub badge: ArchetypeBadge,
}

/// A group-wide best-in-category ranking result.
#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct SuperlativeResult {
    pub key: String,
    pub winning_user_id: String,
    pub value: f64,
    pub label: String,
    pub description: String,
}

/// Bucket interval for the activity timeline.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum TimelineInterval {
    Hourly,
    Daily,
}

/// One interval of group activity.
#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct TimelineBucket {
    pub bucket_start: DateTime<Utc>,
    pub shares: usize,
    pub likes: usize,
    pub listens: usize,
    /// shares + likes + listens
    pub activity: usize,
}

/// Group activity bucketed over the window.
#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct ActivityTimeline {
    pub interval: TimelineInterval,
    pub buckets: Vec<TimelineBucket>,
}

/// Per-member engagement totals. Members with no shares appear with zero
/// stats.
#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct MemberEngagement {
    pub user_id: String,
    pub display_name: String,
    pub total_shares: usize,
    pub likes_received: u32,
    pub listens_received: u32,
    pub last_shared_at: Option<DateTime<Utc>>,
}

/// Node of the taste-gravity graph.
#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct GravityNode {
    pub user_id: String,
    /// Force-layout mass, from sharing volume
    pub mass: f64,
    pub top_artists: Vec<String>,
}

/// Affinity link between two members, from shared-artist overlap.
#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct GravityLink {
    pub source: String,
    pub target: String,
    /// 0-1 overlap strength
    pub gravity: f64,
    /// Shared artists backing the link
    pub reasons: Vec<String>,
}

/// Affinity graph derived from shared artist overlap. Recomputed per
/// query, never persisted; rendered by the consumer as a force layout.
#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct TasteGravityGraph {
    pub nodes: Vec<GravityNode>,
    pub links: Vec<GravityLink>,
}

/// Engine provenance stamped on every report.
#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct Producer {
    pub name: String,
    pub version: String,
    pub instance_id: String,
}

/// Complete analytics response for one group and window.
///
/// Sections are computed on concurrent read-only tasks over
/// independently fetched snapshots; two sections in the same report may
/// reflect events separated by a few milliseconds of writes. This is a
/// documented, bounded inconsistency window, not a correctness bug.
#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct GroupPulseReport {
    pub producer: Producer,
    pub generated_at: DateTime<Utc>,
    pub group_id: String,
    pub window: AnalysisWindow,
    pub reflex: ReflexReport,
    pub radar: Vec<RadarProfile>,
    pub listening_archetypes: Vec<ArchetypeResult>,
    pub influence_archetypes: Vec<ArchetypeResult>,
    pub superlatives: Vec<SuperlativeResult>,
    pub timeline: ActivityTimeline,
    pub engagement: Vec<MemberEngagement>,
    pub gravity: TasteGravityGraph,
}

#[cfg(test)]
mod tests {
    use super::*;
    use pretty_assertions::assert_eq;

    #[test]
    fn reaction_event_uses_contract_field_names() {
        let json = r#"{
            "userId": "u-alice",
            "shareId": "s-1",
            "groupId": "g-1",
            "sharedAt": "2026-07-01T12:00:00Z",
            "reactedAt": "2026-07-01T12:00:30Z",
            "latencyMs": 30000
        }"#;

        let event: ReactionEvent = serde_json::from_str(json).unwrap();
        assert_eq!(event.user_id, "u-alice");
        assert_eq!(event.latency_ms, 30_000);

        let back = serde_json::to_value(&event).unwrap();
        assert!(back.get("latencyMs").is_some());
        assert!(back.get("latency_ms").is_none());
    }

    #[test]
    fn reflex_category_serializes_snake_case() {
        let json = serde_json::to_string(&ReflexCategory::LongTail).unwrap();
        assert_eq!(json, "\"long_tail\"");
    }

    #[test]
    fn volume_category_serializes_snake_case() {
        let json = serde_json::to_string(&VolumeCategory::HighFreq).unwrap();
        assert_eq!(json, "\"high_freq\"");
    }

    #[test]
    fn influence_levels_are_ordered() {
        assert!(InfluenceLevel::Low < InfluenceLevel::Medium);
        assert!(InfluenceLevel::Medium < InfluenceLevel::High);
    }

    #[test]
    fn zero_reaction_profile_serializes_null_category() {
        let profile = UserLatencyProfile {
            user_id: "u-quiet".to_string(),
            display_name: "Quiet".to_string(),
            reaction_count: 0,
            median_ms: 0.0,
            p25_ms: 0.0,
            p75_ms: 0.0,
            std_dev_ms: 0.0,
            coefficient_of_variation: 0.0,
            trimmed_median_ms: 0.0,
            category: None,
        };

        let value = serde_json::to_value(&profile).unwrap();
        assert!(value.get("category").unwrap().is_null());
        assert_eq!(value.get("reactionCount").unwrap(), 0);
    }

    #[test]
    fn share_record_defaults_optional_counts() {
        let json = r#"{
            "id": "s-1",
            "groupId": "g-1",
            "sharerId": "u-alice",
            "createdAt": "2026-07-01T12:00:00Z"
        }"#;

        let share: ShareRecord = serde_json::from_str(json).unwrap();
        assert_eq!(share.like_count, 0);
        assert_eq!(share.listen_count, 0);
        assert!(share.artists.is_empty());
    }
}
