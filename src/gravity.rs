//! Taste gravity graph
//!
//! An affinity graph derived from shared-artist overlap: node mass comes
//! from sharing volume, link gravity from Jaccard overlap of the two
//! members' artist tag sets. Recomputed per query, never persisted; the
//! consumer renders it as a force layout, so there is no structural
//! invariant beyond deterministic node and link ordering.

use std::collections::{HashMap, HashSet};

use crate::store::GroupSnapshot;
use crate::types::{GravityLink, GravityNode, TasteGravityGraph};

/// Most-shared artists listed per node
const TOP_ARTISTS: usize = 3;

/// Shared artists listed as link reasons
const MAX_REASONS: usize = 3;

/// Build the affinity graph for a group.
///
/// Nodes appear for every member in directory order, including members
/// with no shares (mass 0). Links appear only between members whose
/// artist sets overlap.
pub fn taste_gravity(snapshot: &GroupSnapshot) -> TasteGravityGraph {
    let mut artist_counts: HashMap<&str, HashMap<&str, usize>> = HashMap::new();
    let mut share_counts: HashMap<&str, usize> = HashMap::new();

    for share in &snapshot.shares {
        *share_counts.entry(share.sharer_id.as_str()).or_default() += 1;
        let counts = artist_counts.entry(share.sharer_id.as_str()).or_default();
        for artist in &share.artists {
            *counts.entry(artist.as_str()).or_default() += 1;
        }
    }

    let nodes: Vec<GravityNode> = snapshot
        .members
        .iter()
        .map(|member| {
            let counts = artist_counts.get(member.user_id.as_str());
            GravityNode {
                user_id: member.user_id.clone(),
                mass: share_counts
                    .get(member.user_id.as_str())
                    .copied()
                    .unwrap_or(0) as f64,
                top_artists: top_artists(counts),
            }
        })
        .collect();

    let mut links = Vec::new();
    for (i, a) in snapshot.members.iter().enumerate() {
        for b in snapshot.members.iter().skip(i + 1) {
            if let Some(link) = link_between(
                &a.user_id,
                &b.user_id,
                artist_counts.get(a.user_id.as_str()),
                artist_counts.get(b.user_id.as_str()),
            ) {
                links.push(link);
            }
        }
    }

    TasteGravityGraph { nodes, links }
}

fn top_artists(counts: Option<&HashMap<&str, usize>>) -> Vec<String> {
    let Some(counts) = counts else {
        return Vec::new();
    };
    let mut ranked: Vec<(&str, usize)> = counts.iter().map(|(a, n)| (*a, *n)).collect();
    ranked.sort_by(|a, b| b.1.cmp(&a.1).then_with(|| a.0.cmp(b.0)));
    ranked
        .into_iter()
        .take(TOP_ARTISTS)
        .map(|(artist, _)| artist.to_string())
        .collect()
}

fn link_between(
    user_a: &str,
    user_b: &str,
    counts_a: Option<&HashMap<&str, usize>>,
    counts_b: Option<&HashMap<&str, usize>>,
) -> Option<GravityLink> {
    let (counts_a, counts_b) = match (counts_a, counts_b) {
        (Some(a), Some(b)) => (a, b),
        _ => return None,
    };

    let set_a: HashSet<&str> = counts_a.keys().copied().collect();
    let set_b: HashSet<&str> = counts_b.keys().copied().collect();
    if set_a.is_empty() || set_b.is_empty() {
        return None;
    }

    let mut shared: Vec<&str> = set_a.intersection(&set_b).copied().collect();
    if shared.is_empty() {
        return None;
    }

    let union = set_a.union(&set_b).count();
    let gravity = shared.len() as f64 / union as f64;

    // strongest shared artists first, name as the deterministic tiebreak
    shared.sort_by(|a, b| {
        let weight = |artist: &str| {
            counts_a.get(artist).copied().unwrap_or(0) + counts_b.get(artist).copied().unwrap_or(0)
        };
        weight(b).cmp(&weight(a)).then_with(|| a.cmp(b))
    });

    Some(GravityLink {
        source: user_a.to_string(),
        target: user_b.to_string(),
        gravity,
        reasons: shared
            .into_iter()
            .take(MAX_REASONS)
            .map(str::to_string)
            .collect(),
    })
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::store::{RawShare, RawSnapshot};
    use crate::types::GroupMember;
    use chrono::{TimeZone, Utc};
    use pretty_assertions::assert_eq;

    fn member(id: &str) -> GroupMember {
        GroupMember {
            user_id: id.to_string(),
            display_name: id.to_string(),
            avatar_url: None,
        }
    }

    fn share(id: &str, sharer: &str, artists: &[&str]) -> RawShare {
        RawShare {
            id: id.to_string(),
            sharer_id: sharer.to_string(),
            created_at: Some(Utc.with_ymd_and_hms(2026, 7, 6, 12, 0, 0).unwrap()),
            like_count: 0,
            listen_count: 0,
            artists: artists.iter().map(|a| a.to_string()).collect(),
            genres: vec![],
        }
    }

    fn make_snapshot(shares: Vec<RawShare>) -> GroupSnapshot {
        RawSnapshot {
            group_id: "g-1".to_string(),
            fetched_at: Some(Utc.with_ymd_and_hms(2026, 7, 6, 13, 0, 0).unwrap()),
            members: vec![member("u-alice"), member("u-bob"), member("u-quiet")],
            shares,
            reactions: vec![],
        }
        .sanitize()
        .0
    }

    #[test]
    fn overlapping_artists_form_a_link() {
        let snapshot = make_snapshot(vec![
            share("s-1", "u-alice", &["caribou", "four tet"]),
            share("s-2", "u-alice", &["four tet"]),
            share("s-3", "u-bob", &["four tet", "burial"]),
        ]);
        let graph = taste_gravity(&snapshot);

        assert_eq!(graph.links.len(), 1);
        let link = &graph.links[0];
        assert_eq!(link.source, "u-alice");
        assert_eq!(link.target, "u-bob");
        // intersection {four tet}, union {caribou, four tet, burial}
        assert!((link.gravity - 1.0 / 3.0).abs() < 1e-9);
        assert_eq!(link.reasons, vec!["four tet".to_string()]);
    }

    #[test]
    fn disjoint_tastes_stay_unlinked() {
        let snapshot = make_snapshot(vec![
            share("s-1", "u-alice", &["caribou"]),
            share("s-2", "u-bob", &["burial"]),
        ]);
        let graph = taste_gravity(&snapshot);
        assert!(graph.links.is_empty());
    }

    #[test]
    fn silent_members_keep_zero_mass_nodes() {
        let snapshot = make_snapshot(vec![share("s-1", "u-alice", &["caribou"])]);
        let graph = taste_gravity(&snapshot);

        assert_eq!(graph.nodes.len(), 3);
        let quiet = graph.nodes.iter().find(|n| n.user_id == "u-quiet").unwrap();
        assert_eq!(quiet.mass, 0.0);
        assert!(quiet.top_artists.is_empty());

        let alice = graph.nodes.iter().find(|n| n.user_id == "u-alice").unwrap();
        assert_eq!(alice.mass, 1.0);
    }

    #[test]
    fn top_artists_rank_by_share_count_then_name() {
        let snapshot = make_snapshot(vec![
            share("s-1", "u-alice", &["caribou", "burial"]),
            share("s-2", "u-alice", &["caribou", "aphex twin"]),
            share("s-3", "u-alice", &["caribou", "aphex twin", "daphni"]),
            share("s-4", "u-alice", &["daphni"]),
        ]);
        let graph = taste_gravity(&snapshot);
        let alice = graph.nodes.iter().find(|n| n.user_id == "u-alice").unwrap();

        // caribou 3, aphex twin 2, daphni 2 (name breaks the tie), burial 1
        assert_eq!(
            alice.top_artists,
            vec![
                "caribou".to_string(),
                "aphex twin".to_string(),
                "daphni".to_string()
            ]
        );
    }

    #[test]
    fn reasons_lead_with_the_strongest_shared_artist() {
        let snapshot = make_snapshot(vec![
            share("s-1", "u-alice", &["caribou", "burial"]),
            share("s-2", "u-alice", &["caribou"]),
            share("s-3", "u-bob", &["caribou", "burial"]),
        ]);
        let graph = taste_gravity(&snapshot);
        let link = &graph.links[0];

        // caribou weighs 3 combined, burial 2
        assert_eq!(
            link.reasons,
            vec!["caribou".to_string(), "burial".to_string()]
        );
        assert_eq!(link.gravity, 1.0);
    }
}
