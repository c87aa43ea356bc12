//! Archetype taxonomies and ordered rule matching
//!
//! Two closed taxonomies share one mechanism: a fixed, ordered list of
//! `(predicate, archetype)` pairs scanned top to bottom in a single
//! stable pass; the first matching rule wins. The trailing rule of each
//! table has no predicate and matches everything, guaranteeing totality.
//! Precedence is designed behavior, not an artifact: do not reorder.

use crate::types::{
    ArchetypeBadge, ArchetypeResult, HabitCategory, InfluenceLevel, InfluenceStyle,
    ListeningStyle, SpeedCategory, VolumeCategory,
};

/// Labels for how a member reacts to the group's shares.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum ListeningArchetype {
    FirstResponder,
    SpeedDemon,
    HeavyRotation,
    Binger,
    Ritualist,
    ShuffleMode,
    Connoisseur,
    FashionablyLate,
    Balanced,
}

/// Labels for how the group reacts to a member's shares.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum InfluenceArchetype {
    MainStage,
    CrowdPuller,
    HypeSpark,
    SlowBurn,
    CultFollowing,
    BackgroundRotation,
    SteadySignal,
}

type ListeningPredicate = fn(&ListeningStyle) -> bool;
type InfluencePredicate = fn(&InfluenceStyle) -> bool;

fn is_first_responder(s: &ListeningStyle) -> bool {
    s.speed == SpeedCategory::Instant && s.habit == HabitCategory::Ritualist
}

fn is_speed_demon(s: &ListeningStyle) -> bool {
    s.speed == SpeedCategory::Instant
}

fn is_heavy_rotation(s: &ListeningStyle) -> bool {
    s.volume == VolumeCategory::HighFreq && s.speed == SpeedCategory::Fast
}

fn is_binger(s: &ListeningStyle) -> bool {
    s.habit == HabitCategory::Batcher
}

fn is_ritualist(s: &ListeningStyle) -> bool {
    s.habit == HabitCategory::Ritualist && s.speed != SpeedCategory::Delayed
}

fn is_shuffle_mode(s: &ListeningStyle) -> bool {
    s.habit == HabitCategory::Erratic && s.volume == VolumeCategory::HighFreq
}

fn is_connoisseur(s: &ListeningStyle) -> bool {
    s.volume == VolumeCategory::Selective
        && matches!(s.speed, SpeedCategory::Steady | SpeedCategory::Delayed)
}

fn is_fashionably_late(s: &ListeningStyle) -> bool {
    s.speed == SpeedCategory::Delayed
}

/// Ordered listening-style rules; the trailing `None` predicate is the
/// balanced fallback.
const LISTENING_RULES: &[(Option<ListeningPredicate>, ListeningArchetype)] = &[
    (Some(is_first_responder), ListeningArchetype::FirstResponder),
    (Some(is_speed_demon), ListeningArchetype::SpeedDemon),
    (Some(is_heavy_rotation), ListeningArchetype::HeavyRotation),
    (Some(is_binger), ListeningArchetype::Binger),
    (Some(is_ritualist), ListeningArchetype::Ritualist),
    (Some(is_shuffle_mode), ListeningArchetype::ShuffleMode),
    (Some(is_connoisseur), ListeningArchetype::Connoisseur),
    (Some(is_fashionably_late), ListeningArchetype::FashionablyLate),
    (None, ListeningArchetype::Balanced),
];

fn is_main_stage(s: &InfluenceStyle) -> bool {
    s.gravity == InfluenceLevel::High && s.urgency == InfluenceLevel::High
}

fn is_crowd_puller(s: &InfluenceStyle) -> bool {
    s.magnetism == InfluenceLevel::High && s.gravity >= InfluenceLevel::Medium
}

fn is_hype_spark(s: &InfluenceStyle) -> bool {
    s.urgency == InfluenceLevel::High
}

fn is_slow_burn(s: &InfluenceStyle) -> bool {
    s.magnetism == InfluenceLevel::High
}

fn is_cult_following(s: &InfluenceStyle) -> bool {
    s.volume == InfluenceLevel::High && s.magnetism != InfluenceLevel::High
}

fn is_background_rotation(s: &InfluenceStyle) -> bool {
    s.gravity == InfluenceLevel::Low && s.urgency == InfluenceLevel::Low
}

/// Ordered influence rules; the trailing `None` predicate is the
/// balanced fallback.
const INFLUENCE_RULES: &[(Option<InfluencePredicate>, InfluenceArchetype)] = &[
    (Some(is_main_stage), InfluenceArchetype::MainStage),
    (Some(is_crowd_puller), InfluenceArchetype::CrowdPuller),
    (Some(is_hype_spark), InfluenceArchetype::HypeSpark),
    (Some(is_slow_burn), InfluenceArchetype::SlowBurn),
    (Some(is_cult_following), InfluenceArchetype::CultFollowing),
    (Some(is_background_rotation), InfluenceArchetype::BackgroundRotation),
    (None, InfluenceArchetype::SteadySignal),
];

/// First matching listening-style rule.
pub fn classify_listening(style: &ListeningStyle) -> ListeningArchetype {
    for (predicate, archetype) in LISTENING_RULES {
        match predicate {
            Some(p) if !p(style) => continue,
            _ => return *archetype,
        }
    }
    ListeningArchetype::Balanced
}

/// First matching influence rule.
pub fn classify_influence(style: &InfluenceStyle) -> InfluenceArchetype {
    for (predicate, archetype) in INFLUENCE_RULES {
        match predicate {
            Some(p) if !p(style) => continue,
            _ => return *archetype,
        }
    }
    InfluenceArchetype::SteadySignal
}

/// Deterministic description variant: char code of the user id's first
/// character modulo 3. Same user, same phrasing, across queries. Not a
/// random pick.
pub fn variant_index(user_id: &str) -> usize {
    user_id
        .chars()
        .next()
        .map(|c| (c as u32 % 3) as usize)
        .unwrap_or(0)
}

impl ListeningArchetype {
    pub fn key(&self) -> &'static str {
        match self {
            ListeningArchetype::FirstResponder => "first_responder",
            ListeningArchetype::SpeedDemon => "speed_demon",
            ListeningArchetype::HeavyRotation => "heavy_rotation",
            ListeningArchetype::Binger => "binger",
            ListeningArchetype::Ritualist => "ritualist",
            ListeningArchetype::ShuffleMode => "shuffle_mode",
            ListeningArchetype::Connoisseur => "connoisseur",
            ListeningArchetype::FashionablyLate => "fashionably_late",
            ListeningArchetype::Balanced => "balanced",
        }
    }

    pub fn title(&self) -> &'static str {
        match self {
            ListeningArchetype::FirstResponder => "First Responder",
            ListeningArchetype::SpeedDemon => "Speed Demon",
            ListeningArchetype::HeavyRotation => "Heavy Rotation",
            ListeningArchetype::Binger => "The Binger",
            ListeningArchetype::Ritualist => "The Ritualist",
            ListeningArchetype::ShuffleMode => "Shuffle Mode",
            ListeningArchetype::Connoisseur => "The Connoisseur",
            ListeningArchetype::FashionablyLate => "Fashionably Late",
            ListeningArchetype::Balanced => "Balanced Listener",
        }
    }

    pub fn descriptions(&self) -> [&'static str; 3] {
        match self {
            ListeningArchetype::FirstResponder => [
                "Drops everything the second a track lands, every single time.",
                "The share notification barely fires before they've pressed play.",
                "A metronome of instant listens; the feed never waits on them.",
            ],
            ListeningArchetype::SpeedDemon => [
                "First to the play button more often than not.",
                "New drop? Already listening.",
                "Reaction times measured in seconds, not hours.",
            ],
            ListeningArchetype::HeavyRotation => [
                "Plays nearly everything the group posts, and quickly.",
                "The group's most reliable pair of ears, hour after hour.",
                "If it hit the feed, it hit their queue.",
            ],
            ListeningArchetype::Binger => [
                "Disappears for a while, then devours the whole feed in one sitting.",
                "Listens arrive in bursts; silence, then a storm of plays.",
                "Saves the queue up and clears it in marathon sessions.",
            ],
            ListeningArchetype::Ritualist => [
                "Same rhythm every time; you could set a clock by their listens.",
                "A steady, predictable listening habit that never wavers.",
                "Consistency is the whole brand: regular plays, reliable timing.",
            ],
            ListeningArchetype::ShuffleMode => [
                "Listens a lot, but never on any discernible schedule.",
                "High volume, zero pattern; every play arrives unannounced.",
                "The feed's wildcard: plenty of plays at unpredictable hours.",
            ],
            ListeningArchetype::Connoisseur => [
                "Picks tracks carefully and gives each one an unhurried listen.",
                "Quality over quantity; every play is a considered one.",
                "Doesn't chase the feed, but what they do play, they savor.",
            ],
            ListeningArchetype::FashionablyLate => [
                "Always arrives at the listening party after it has ended.",
                "Gets to every track eventually, on their own schedule.",
                "The feed's archivist: days behind, but never skips.",
            ],
            ListeningArchetype::Balanced => [
                "A bit of everything: steady pace, steady volume, no extremes.",
                "Keeps the group's pulse without dominating any one metric.",
                "The dependable middle of the group's listening curve.",
            ],
        }
    }

    pub fn badge(&self) -> ArchetypeBadge {
        let (icon, color) = match self {
            ListeningArchetype::FirstResponder => ("⚡", "#f5a623"),
            ListeningArchetype::SpeedDemon => ("🏁", "#e5484d"),
            ListeningArchetype::HeavyRotation => ("🔁", "#46a758"),
            ListeningArchetype::Binger => ("🌊", "#0091ff"),
            ListeningArchetype::Ritualist => ("🕰️", "#8e4ec6"),
            ListeningArchetype::ShuffleMode => ("🎲", "#f76b15"),
            ListeningArchetype::Connoisseur => ("🍷", "#ad7f58"),
            ListeningArchetype::FashionablyLate => ("🦉", "#687076"),
            ListeningArchetype::Balanced => ("⚖️", "#00a2c7"),
        };
        ArchetypeBadge {
            icon: icon.to_string(),
            color: color.to_string(),
        }
    }

    /// Assemble the presentation result for one member.
    pub fn result(&self, user_id: &str) -> ArchetypeResult {
        let variant = variant_index(user_id);
        ArchetypeResult {
            user_id: user_id.to_string(),
            key: self.key().to_string(),
            title: self.title().to_string(),
            description: self.descriptions()[variant].to_string(),
            badge: self.badge(),
        }
    }
}

impl InfluenceArchetype {
    pub fn key(&self) -> &'static str {
        match self {
            InfluenceArchetype::MainStage => "main_stage",
            InfluenceArchetype::CrowdPuller => "crowd_puller",
            InfluenceArchetype::HypeSpark => "hype_spark",
            InfluenceArchetype::SlowBurn => "slow_burn",
            InfluenceArchetype::CultFollowing => "cult_following",
            InfluenceArchetype::BackgroundRotation => "background_rotation",
            InfluenceArchetype::SteadySignal => "steady_signal",
        }
    }

    pub fn title(&self) -> &'static str {
        match self {
            InfluenceArchetype::MainStage => "Main Stage",
            InfluenceArchetype::CrowdPuller => "Crowd Puller",
            InfluenceArchetype::HypeSpark => "Hype Spark",
            InfluenceArchetype::SlowBurn => "Slow Burn",
            InfluenceArchetype::CultFollowing => "Cult Following",
            InfluenceArchetype::BackgroundRotation => "Background Rotation",
            InfluenceArchetype::SteadySignal => "Steady Signal",
        }
    }

    pub fn descriptions(&self) -> [&'static str; 3] {
        match self {
            InfluenceArchetype::MainStage => [
                "When they share, the whole group drops what it's doing.",
                "Their posts trigger an instant, unanimous pile-on of plays.",
                "Every share is an event; the group shows up immediately.",
            ],
            InfluenceArchetype::CrowdPuller => [
                "Nearly everyone ends up listening to what they post.",
                "Their shares reach every corner of the group, fast.",
                "A reliable draw: wide reach and a quick group response.",
            ],
            InfluenceArchetype::HypeSpark => [
                "A fast first wave jumps on their shares within minutes.",
                "Their drops ignite the early listeners instantly.",
                "The group's quickest ears always catch their posts first.",
            ],
            InfluenceArchetype::SlowBurn => [
                "Everyone gets there in the end; their shares age well.",
                "Wide reach on a long fuse: the plays keep trickling in.",
                "No rush, full coverage; the group always comes around.",
            ],
            InfluenceArchetype::CultFollowing => [
                "A devoted few replay their shares over and over.",
                "Not the widest audience, but easily the most obsessive.",
                "Their corner of the group hangs on every post.",
            ],
            InfluenceArchetype::BackgroundRotation => [
                "Their shares settle into the feed and get picked up late.",
                "Steady posts that the group reaches on its own time.",
                "Low urgency, long shelf life.",
            ],
            InfluenceArchetype::SteadySignal => [
                "A dependable middle-of-the-group response to every share.",
                "No fireworks, no silence: the group reliably tunes in.",
                "Consistent reach and pace without ever spiking.",
            ],
        }
    }

    pub fn badge(&self) -> ArchetypeBadge {
        let (icon, color) = match self {
            InfluenceArchetype::MainStage => ("🎤", "#e5484d"),
            InfluenceArchetype::CrowdPuller => ("🧲", "#0091ff"),
            InfluenceArchetype::HypeSpark => ("🔥", "#f76b15"),
            InfluenceArchetype::SlowBurn => ("🕯️", "#ad7f58"),
            InfluenceArchetype::CultFollowing => ("🌙", "#8e4ec6"),
            InfluenceArchetype::BackgroundRotation => ("📻", "#687076"),
            InfluenceArchetype::SteadySignal => ("📶", "#46a758"),
        };
        ArchetypeBadge {
            icon: icon.to_string(),
            color: color.to_string(),
        }
    }

    /// Assemble the presentation result for one member.
    pub fn result(&self, user_id: &str) -> ArchetypeResult {
        let variant = variant_index(user_id);
        ArchetypeResult {
            user_id: user_id.to_string(),
            key: self.key().to_string(),
            title: self.title().to_string(),
            description: self.descriptions()[variant].to_string(),
            badge: self.badge(),
        }
    }
}
