//! Snapshot boundary for the event store and member directory
//!
//! The engine consumes a point-in-time snapshot of already-persisted
//! records and never mutates source data. Records missing a timestamp are
//! invalid and excluded rather than failing the whole query; reactions
//! predating their share's creation are excluded the same way, which is
//! what keeps the `latency_ms >= 0` invariant upstream of every
//! statistic.

use std::collections::{HashMap, HashSet};

use chrono::{DateTime, Duration, Utc};
use serde::{Deserialize, Serialize};

use crate::error::AnalyticsError;
use crate::types::{
    GroupMember, LikeEvent, ListenEvent, ReactionEvent, ShareRecord,
};
use crate::window::AnalysisWindow;

/// Current snapshot schema version
pub const SNAPSHOT_SCHEMA: &str = "pulse.group_snapshot.v1";

/// Reaction kinds on the wire
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum ReactionKind {
    Listen,
    Like,
}

/// Share record as persisted, before validation
#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct RawShare {
    pub id: String,
    pub sharer_id: String,
    pub created_at: Option<DateTime<Utc>>,
    #[serde(default)]
    pub like_count: u32,
    #[serde(default)]
    pub listen_count: u32,
    #[serde(default)]
    pub artists: Vec<String>,
    #[serde(default)]
    pub genres: Vec<String>,
}

/// Reaction record as persisted, before validation
#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct RawReaction {
    pub user_id: String,
    pub share_id: String,
    pub kind: ReactionKind,
    pub reacted_at: Option<DateTime<Utc>>,
}

/// Wire format of a full group snapshot, as handed over by the event
/// store and member directory.
#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct RawSnapshot {
    pub group_id: String,
    /// Snapshot time; defaults to now when the store omits it
    #[serde(default)]
    pub fetched_at: Option<DateTime<Utc>>,
    #[serde(default)]
    pub members: Vec<GroupMember>,
    #[serde(default)]
    pub shares: Vec<RawShare>,
    #[serde(default)]
    pub reactions: Vec<RawReaction>,
}

/// Why a record was excluded during sanitization
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum DropReason {
    MissingTimestamp,
    UnknownShare,
    UnknownUser,
    BeforeShareCreation,
}

/// One excluded record, for the validation report
#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct DroppedRecord {
    /// "share" or "reaction"
    pub record: String,
    pub id: String,
    pub reason: DropReason,
}

/// Outcome of snapshot sanitization
#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct SanitizeReport {
    pub accepted_shares: usize,
    pub accepted_reactions: usize,
    pub dropped: Vec<DroppedRecord>,
}

/// Validated point-in-time snapshot the engine computes over.
#[derive(Debug, Clone)]
pub struct GroupSnapshot {
    pub group_id: String,
    pub fetched_at: DateTime<Utc>,
    pub members: Vec<GroupMember>,
    pub shares: Vec<ShareRecord>,
    /// Every reaction (listen or like) with a valid latency
    pub reactions: Vec<ReactionEvent>,
    /// The like subset, timestamped for aggregation
    pub likes: Vec<LikeEvent>,
    /// The listen subset, timestamped for aggregation
    pub listens: Vec<ListenEvent>,
}

impl RawSnapshot {
    pub fn parse(json: &str) -> Result<RawSnapshot, AnalyticsError> {
        let snapshot: RawSnapshot = serde_json::from_str(json)?;
        Ok(snapshot)
    }

    /// Validate and index the raw records.
    ///
    /// Dropped records are reported, never fatal: a partially damaged
    /// snapshot still yields every statistic the surviving records
    /// support.
    pub fn sanitize(self) -> (GroupSnapshot, SanitizeReport) {
        let fetched_at = self.fetched_at.unwrap_or_else(Utc::now);
        let mut dropped = Vec::new();

        let member_ids: HashSet<&str> =
            self.members.iter().map(|m| m.user_id.as_str()).collect();

        let mut shares = Vec::with_capacity(self.shares.len());
        for raw in &self.shares {
            let Some(created_at) = raw.created_at else {
                dropped.push(DroppedRecord {
                    record: "share".to_string(),
                    id: raw.id.clone(),
                    reason: DropReason::MissingTimestamp,
                });
                continue;
            };
            shares.push(ShareRecord {
                id: raw.id.clone(),
                group_id: self.group_id.clone(),
                sharer_id: raw.sharer_id.clone(),
                created_at,
                like_count: raw.like_count,
                listen_count: raw.listen_count,
                artists: raw.artists.clone(),
                genres: raw.genres.clone(),
            });
        }

        let share_index: HashMap<&str, &ShareRecord> =
            shares.iter().map(|s| (s.id.as_str(), s)).collect();

        let mut reactions = Vec::with_capacity(self.reactions.len());
        let mut likes = Vec::new();
        let mut listens = Vec::new();

        for raw in &self.reactions {
            let Some(reacted_at) = raw.reacted_at else {
                dropped.push(DroppedRecord {
                    record: "reaction".to_string(),
                    id: raw.share_id.clone(),
                    reason: DropReason::MissingTimestamp,
                });
                continue;
            };
            let Some(share) = share_index.get(raw.share_id.as_str()) else {
                dropped.push(DroppedRecord {
                    record: "reaction".to_string(),
                    id: raw.share_id.clone(),
                    reason: DropReason::UnknownShare,
                });
                continue;
            };
            if !member_ids.contains(raw.user_id.as_str()) {
                dropped.push(DroppedRecord {
                    record: "reaction".to_string(),
                    id: raw.user_id.clone(),
                    reason: DropReason::UnknownUser,
                });
                continue;
            }
            let latency_ms = (reacted_at - share.created_at).num_milliseconds();
            if latency_ms < 0 {
                dropped.push(DroppedRecord {
                    record: "reaction".to_string(),
                    id: raw.share_id.clone(),
                    reason: DropReason::BeforeShareCreation,
                });
                continue;
            }

            reactions.push(ReactionEvent {
                user_id: raw.user_id.clone(),
                share_id: raw.share_id.clone(),
                group_id: self.group_id.clone(),
                shared_at: share.created_at,
                reacted_at,
                latency_ms,
            });
            match raw.kind {
                ReactionKind::Like => likes.push(LikeEvent {
                    user_id: raw.user_id.clone(),
                    share_id: raw.share_id.clone(),
                    liked_at: reacted_at,
                }),
                ReactionKind::Listen => listens.push(ListenEvent {
                    user_id: raw.user_id.clone(),
                    share_id: raw.share_id.clone(),
                    listened_at: reacted_at,
                }),
            }
        }

        let report = SanitizeReport {
            accepted_shares: shares.len(),
            accepted_reactions: reactions.len(),
            dropped,
        };

        let snapshot = GroupSnapshot {
            group_id: self.group_id,
            fetched_at,
            members: self.members,
            shares,
            reactions,
            likes,
            listens,
        };

        (snapshot, report)
    }
}

impl GroupSnapshot {
    /// Start of the window measured back from fetch time; `None` for
    /// all-time.
    pub fn window_start(&self, window: AnalysisWindow) -> Option<DateTime<Utc>> {
        window
            .duration_ms()
            .map(|ms| self.fetched_at - Duration::milliseconds(ms))
    }

    /// Reactions whose timestamp falls inside the window.
    pub fn reactions_in(&self, window: AnalysisWindow) -> Vec<&ReactionEvent> {
        match self.window_start(window) {
            None => self.reactions.iter().collect(),
            Some(start) => self
                .reactions
                .iter()
                .filter(|r| r.reacted_at >= start)
                .collect(),
        }
    }

    /// Shares created inside the window.
    pub fn shares_in(&self, window: AnalysisWindow) -> Vec<&ShareRecord> {
        match self.window_start(window) {
            None => self.shares.iter().collect(),
            Some(start) => self
                .shares
                .iter()
                .filter(|s| s.created_at >= start)
                .collect(),
        }
    }

    /// Display-name lookup for report assembly.
    pub fn display_names(&self) -> HashMap<&str, &str> {
        self.members
            .iter()
            .map(|m| (m.user_id.as_str(), m.display_name.as_str()))
            .collect()
    }

    pub fn has_member(&self, user_id: &str) -> bool {
        self.members.iter().any(|m| m.user_id == user_id)
    }
}

/// Query interface the engine uses to obtain snapshots.
///
/// Each report section fetches its own snapshot, so two sections served
/// in the same response may reflect events separated by a few
/// milliseconds of writes. Best-effort, not transactional.
pub trait SnapshotSource: Sync {
    fn fetch(&self, group_id: &str) -> Result<GroupSnapshot, AnalyticsError>;
}

/// Snapshot source backed by pre-loaded snapshots. Used by the CLI and
/// by tests; a persistent store implements [`SnapshotSource`] the same
/// way.
#[derive(Debug, Default)]
pub struct InMemorySource {
    groups: HashMap<String, GroupSnapshot>,
}

impl InMemorySource {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn insert(&mut self, snapshot: GroupSnapshot) {
        self.groups.insert(snapshot.group_id.clone(), snapshot);
    }

    /// Sanitize and load a raw snapshot, returning the validation report.
    pub fn load_raw(&mut self, raw: RawSnapshot) -> SanitizeReport {
        let (snapshot, report) = raw.sanitize();
        self.insert(snapshot);
        report
    }
}

impl SnapshotSource for InMemorySource {
    fn fetch(&self, group_id: &str) -> Result<GroupSnapshot, AnalyticsError> {
        self.groups
            .get(group_id)
            .cloned()
            .ok_or_else(|| AnalyticsError::GroupNotFound(group_id.to_string()))
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use chrono::TimeZone;

    fn ts(min: i64) -> DateTime<Utc> {
        Utc.with_ymd_and_hms(2026, 7, 1, 12, 0, 0).unwrap() + Duration::minutes(min)
    }

    fn member(id: &str) -> GroupMember {
        GroupMember {
            user_id: id.to_string(),
            display_name: id.to_string(),
            avatar_url: None,
        }
    }

    fn raw_share(id: &str, sharer: &str, created_at: Option<DateTime<Utc>>) -> RawShare {
        RawShare {
            id: id.to_string(),
            sharer_id: sharer.to_string(),
            created_at,
            like_count: 0,
            listen_count: 0,
            artists: vec![],
            genres: vec![],
        }
    }

    fn raw_reaction(
        user: &str,
        share: &str,
        kind: ReactionKind,
        reacted_at: Option<DateTime<Utc>>,
    ) -> RawReaction {
        RawReaction {
            user_id: user.to_string(),
            share_id: share.to_string(),
            kind,
            reacted_at,
        }
    }

    fn make_raw() -> RawSnapshot {
        RawSnapshot {
            group_id: "g-1".to_string(),
            fetched_at: Some(ts(120)),
            members: vec![member("u-alice"), member("u-bob")],
            shares: vec![
                raw_share("s-1", "u-alice", Some(ts(0))),
                raw_share("s-bad", "u-alice", None),
            ],
            reactions: vec![
                raw_reaction("u-bob", "s-1", ReactionKind::Listen, Some(ts(5))),
                raw_reaction("u-bob", "s-1", ReactionKind::Like, Some(ts(6))),
                raw_reaction("u-bob", "s-1", ReactionKind::Listen, None),
                raw_reaction("u-bob", "s-missing", ReactionKind::Listen, Some(ts(7))),
                raw_reaction("u-ghost", "s-1", ReactionKind::Listen, Some(ts(8))),
                raw_reaction("u-bob", "s-1", ReactionKind::Listen, Some(ts(-10))),
            ],
        }
    }

    #[test]
    fn sanitize_drops_invalid_records_without_failing() {
        let (snapshot, report) = make_raw().sanitize();

        assert_eq!(report.accepted_shares, 1);
        assert_eq!(report.accepted_reactions, 2);
        assert_eq!(report.dropped.len(), 5);

        let reasons: Vec<DropReason> = report.dropped.iter().map(|d| d.reason).collect();
        assert!(reasons.contains(&DropReason::MissingTimestamp));
        assert!(reasons.contains(&DropReason::UnknownShare));
        assert!(reasons.contains(&DropReason::UnknownUser));
        assert!(reasons.contains(&DropReason::BeforeShareCreation));

        assert_eq!(snapshot.shares.len(), 1);
        assert_eq!(snapshot.reactions.len(), 2);
        assert_eq!(snapshot.likes.len(), 1);
        assert_eq!(snapshot.listens.len(), 1);
    }

    #[test]
    fn sanitize_computes_latency_from_share_creation() {
        let (snapshot, _) = make_raw().sanitize();
        let listen = &snapshot.listens[0];
        assert_eq!(listen.listened_at, ts(5));

        let reaction = snapshot
            .reactions
            .iter()
            .find(|r| r.reacted_at == ts(5))
            .unwrap();
        assert_eq!(reaction.latency_ms, 5 * 60 * 1000);
    }

    #[test]
    fn window_filter_measures_back_from_fetch_time() {
        let (snapshot, _) = make_raw().sanitize();
        // both reactions happened ~2h before fetch, inside 24h
        assert_eq!(snapshot.reactions_in(AnalysisWindow::Day).len(), 2);
        assert_eq!(snapshot.reactions_in(AnalysisWindow::AllTime).len(), 2);
    }

    #[test]
    fn missing_group_surfaces_not_found() {
        let source = InMemorySource::new();
        let err = source.fetch("g-unknown").unwrap_err();
        assert!(matches!(err, AnalyticsError::GroupNotFound(g) if g == "g-unknown"));
    }

    #[test]
    fn loaded_group_round_trips() {
        let mut source = InMemorySource::new();
        source.load_raw(make_raw());
        let snapshot = source.fetch("g-1").unwrap();
        assert_eq!(snapshot.group_id, "g-1");
        assert_eq!(snapshot.members.len(), 2);
    }

    #[test]
    fn parse_rejects_malformed_json() {
        let err = RawSnapshot::parse("not json").unwrap_err();
        assert!(matches!(err, AnalyticsError::JsonError(_)));
    }
}
