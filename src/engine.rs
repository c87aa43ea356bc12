//! Engine orchestration
//!
//! Assembles the full analytics report for one group and window. Every
//! section is a pure function of a snapshot, so a request fans the
//! sections out onto concurrent read-only tasks and joins them before
//! responding. Each section fetches its own snapshot: cross-section
//! consistency is best-effort, not transactional, and two sections in
//! one report may reflect writes a few milliseconds apart. Group
//! existence is checked before any section runs.

use chrono::Utc;
use uuid::Uuid;

use crate::aggregate;
use crate::archetype;
use crate::error::AnalyticsError;
use crate::gravity;
use crate::radar;
use crate::reflex;
use crate::store::SnapshotSource;
use crate::types::{ArchetypeResult, GroupPulseReport, Producer};
use crate::window::AnalysisWindow;
use crate::{PRODUCER_NAME, PULSE_VERSION};

/// Stateless analytics engine with a stable instance id for provenance.
pub struct PulseEngine {
    instance_id: String,
}

impl Default for PulseEngine {
    fn default() -> Self {
        Self::new()
    }
}

impl PulseEngine {
    /// Create an engine with a fresh instance id
    pub fn new() -> Self {
        Self {
            instance_id: Uuid::new_v4().to_string(),
        }
    }

    /// Create an engine with a specific instance id
    pub fn with_instance_id(instance_id: String) -> Self {
        Self { instance_id }
    }

    fn producer(&self) -> Producer {
        Producer {
            name: PRODUCER_NAME.to_string(),
            version: PULSE_VERSION.to_string(),
            instance_id: self.instance_id.clone(),
        }
    }

    /// Full report for one group: reflex buckets, radar profiles, both
    /// archetype sets, superlatives, activity timeline, engagement
    /// totals, and the taste-gravity graph.
    ///
    /// Superlatives rank over the all-time event set (the feed's
    /// leaderboard); every other section uses the requested window.
    pub fn group_pulse(
        &self,
        source: &dyn SnapshotSource,
        group_id: &str,
        window: AnalysisWindow,
    ) -> Result<GroupPulseReport, AnalyticsError> {
        // existence surfaces here, before the aggregation fan-out
        source.fetch(group_id)?;

        let (reflex, radar, listening, influence, aggregates, graph) =
            std::thread::scope(|scope| {
                let reflex = scope.spawn(|| {
                    source
                        .fetch(group_id)
                        .map(|snap| reflex::reflex_report(&snap, window))
                });
                let radar = scope.spawn(|| {
                    source
                        .fetch(group_id)
                        .map(|snap| radar::radar_profiles(&snap, window))
                });
                let listening = scope.spawn(|| {
                    source
                        .fetch(group_id)
                        .map(|snap| archetype::listening_archetypes(&snap, window))
                });
                let influence = scope.spawn(|| {
                    source
                        .fetch(group_id)
                        .map(|snap| archetype::influence_archetypes(&snap, window))
                });
                let aggregates = scope.spawn(|| {
                    source.fetch(group_id).map(|snap| {
                        (
                            aggregate::activity_timeline(&snap, window),
                            aggregate::member_engagement(&snap, window),
                            aggregate::superlatives(&snap, AnalysisWindow::AllTime),
                        )
                    })
                });
                let graph = scope.spawn(|| {
                    source
                        .fetch(group_id)
                        .map(|snap| gravity::taste_gravity(&snap))
                });

                (
                    join(reflex),
                    join(radar),
                    join(listening),
                    join(influence),
                    join(aggregates),
                    join(graph),
                )
            });

        let (timeline, engagement, superlatives) = aggregates?;

        Ok(GroupPulseReport {
            producer: self.producer(),
            generated_at: Utc::now(),
            group_id: group_id.to_string(),
            window,
            reflex: reflex?,
            radar: radar?,
            listening_archetypes: listening?,
            influence_archetypes: influence?,
            superlatives,
            timeline,
            engagement,
            gravity: graph?,
        })
    }

    /// Listening and influence archetypes for a single member.
    pub fn member_archetypes(
        &self,
        source: &dyn SnapshotSource,
        group_id: &str,
        user_id: &str,
        window: AnalysisWindow,
    ) -> Result<(ArchetypeResult, ArchetypeResult), AnalyticsError> {
        let snapshot = source.fetch(group_id)?;
        if !snapshot.has_member(user_id) {
            return Err(AnalyticsError::UserNotFound(user_id.to_string()));
        }

        let listening = archetype::listening_archetypes(&snapshot, window)
            .into_iter()
            .find(|r| r.user_id == user_id);
        let influence = archetype::influence_archetypes(&snapshot, window)
            .into_iter()
            .find(|r| r.user_id == user_id);

        match (listening, influence) {
            (Some(listening), Some(influence)) => Ok((listening, influence)),
            _ => Err(AnalyticsError::UserNotFound(user_id.to_string())),
        }
    }
}

fn join<T>(handle: std::thread::ScopedJoinHandle<'_, T>) -> T {
    match handle.join() {
        Ok(value) => value,
        Err(panic) => std::panic::resume_unwind(panic),
    }
}
