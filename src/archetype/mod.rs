//! Archetype classifier
//!
//! Maps feature vectors derived from latency statistics and the windowed
//! threshold policy onto two closed taxonomies: listening style (how a
//! member reacts to the group's shares) and influence (how the group
//! reacts to a member's shares). Matching is a single stable pass over an
//! ordered rule list with a guaranteed fallback, followed by a label-only
//! contextual title refinement.

pub mod features;
pub mod refine;
pub mod rules;

pub use rules::{classify_influence, classify_listening, InfluenceArchetype, ListeningArchetype};

use std::collections::{HashMap, HashSet};

use chrono::{DateTime, Utc};

use crate::reflex;
use crate::store::GroupSnapshot;
use crate::types::ArchetypeResult;
use crate::window::{AnalysisWindow, ReactionThresholds};

/// Listening-style archetypes for every group member.
///
/// Exactly one result per member per query. Members with no in-window
/// reactions take the balanced fallback directly; there is no signal to
/// classify.
pub fn listening_archetypes(
    snapshot: &GroupSnapshot,
    window: AnalysisWindow,
) -> Vec<ArchetypeResult> {
    let thresholds = ReactionThresholds::for_window(window);
    let latencies_by_member = reflex::latencies_by_member(snapshot, window);

    let mut times_by_member: HashMap<&str, Vec<DateTime<Utc>>> = HashMap::new();
    for reaction in snapshot.reactions_in(window) {
        times_by_member
            .entry(reaction.user_id.as_str())
            .or_default()
            .push(reaction.reacted_at);
    }

    // mean over members with at least one reaction, for the volume axis
    let active_counts: Vec<usize> = latencies_by_member
        .values()
        .map(Vec::len)
        .filter(|n| *n > 0)
        .collect();
    let group_mean = if active_counts.is_empty() {
        0.0
    } else {
        active_counts.iter().sum::<usize>() as f64 / active_counts.len() as f64
    };

    let empty_times: Vec<DateTime<Utc>> = Vec::new();

    snapshot
        .members
        .iter()
        .map(|member| {
            let latencies = latencies_by_member
                .get(member.user_id.as_str())
                .map(Vec::as_slice)
                .unwrap_or(&[]);
            let times = times_by_member
                .get(member.user_id.as_str())
                .unwrap_or(&empty_times);

            let archetype = if latencies.is_empty() {
                ListeningArchetype::Balanced
            } else {
                let style =
                    features::listening_style(latencies, times, group_mean, &thresholds);
                rules::classify_listening(&style)
            };

            let mut result = archetype.result(&member.user_id);
            result.title = refine::refine_title(archetype.title(), window, times);
            result
        })
        .collect()
}

/// Influence archetypes: how the group reacts to each member's shares.
///
/// Latencies come from *other* members' reactions only; a member's own
/// plays on their own shares never count. Members whose shares drew no
/// in-window reactions (or who have no shares at all) take the
/// steady-signal fallback directly.
pub fn influence_archetypes(
    snapshot: &GroupSnapshot,
    window: AnalysisWindow,
) -> Vec<ArchetypeResult> {
    let share_owner: HashMap<&str, &str> = snapshot
        .shares
        .iter()
        .map(|s| (s.id.as_str(), s.sharer_id.as_str()))
        .collect();

    let mut latencies_by_owner: HashMap<&str, Vec<f64>> = HashMap::new();
    let mut reactors_by_owner: HashMap<&str, HashSet<&str>> = HashMap::new();
    let mut times_by_owner: HashMap<&str, Vec<DateTime<Utc>>> = HashMap::new();
    let mut shares_with_reactions: HashMap<&str, HashSet<&str>> = HashMap::new();

    for reaction in snapshot.reactions_in(window) {
        let Some(&owner) = share_owner.get(reaction.share_id.as_str()) else {
            continue;
        };
        if owner == reaction.user_id {
            continue;
        }
        latencies_by_owner
            .entry(owner)
            .or_default()
            .push(reaction.latency_ms as f64);
        reactors_by_owner
            .entry(owner)
            .or_default()
            .insert(reaction.user_id.as_str());
        times_by_owner
            .entry(owner)
            .or_default()
            .push(reaction.reacted_at);
        shares_with_reactions
            .entry(owner)
            .or_default()
            .insert(reaction.share_id.as_str());
    }

    // a member's qualifying shares: in-window shares plus older shares
    // that still drew in-window reactions
    let mut share_ids_by_owner: HashMap<&str, HashSet<&str>> = shares_with_reactions;
    for share in snapshot.shares_in(window) {
        share_ids_by_owner
            .entry(share.sharer_id.as_str())
            .or_default()
            .insert(share.id.as_str());
    }

    let other_members = snapshot.members.len().saturating_sub(1);
    let empty_times: Vec<DateTime<Utc>> = Vec::new();

    snapshot
        .members
        .iter()
        .map(|member| {
            let latencies = latencies_by_owner
                .get(member.user_id.as_str())
                .map(Vec::as_slice)
                .unwrap_or(&[]);
            let share_count = share_ids_by_owner
                .get(member.user_id.as_str())
                .map(HashSet::len)
                .unwrap_or(0);
            let times = times_by_owner
                .get(member.user_id.as_str())
                .unwrap_or(&empty_times);

            let archetype = if latencies.is_empty() || share_count == 0 {
                InfluenceArchetype::SteadySignal
            } else {
                let reacting = reactors_by_owner
                    .get(member.user_id.as_str())
                    .map(HashSet::len)
                    .unwrap_or(0);
                let style = features::influence_style(
                    latencies,
                    reacting,
                    other_members,
                    share_count,
                );
                rules::classify_influence(&style)
            };

            let mut result = archetype.result(&member.user_id);
            result.title = refine::refine_title(archetype.title(), window, times);
            result
        })
        .collect()
}
