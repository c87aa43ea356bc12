//! Contextual title refinement
//!
//! Long windows can reveal a weekly rhythm in a member's reactions, short
//! windows a daily one. When the underlying events skew hard enough, the
//! archetype's display title gets a contextual frame. Refinement rewrites
//! only the title text; the matched archetype key never changes.

use chrono::{DateTime, Datelike, Timelike, Utc, Weekday};

use crate::window::{AnalysisWindow, DAY_MS};

/// Windows longer than this get day-of-week framing
const WEEKDAY_FRAMING_MIN_MS: i64 = 5 * DAY_MS;

/// Windows at most this long get time-of-day framing
const TIME_OF_DAY_MAX_MS: i64 = DAY_MS;

/// Share of reactions one segment needs to skew the title
const SKEW_SHARE: f64 = 0.6;

/// Share of reactions one weekday needs for single-day framing
const WEEKDAY_SHARE: f64 = 0.5;

/// Minimum reactions before a skew is trusted
const MIN_SKEW_SAMPLES: usize = 4;

/// Apply window-appropriate framing to an archetype title.
///
/// Bounded windows up to 24h are checked for time-of-day skew; windows
/// past five days (including all-time) for day-of-week skew. Anything in
/// between, or any member without enough reactions, keeps the base title.
pub fn refine_title(
    base: &str,
    window: AnalysisWindow,
    reaction_times: &[DateTime<Utc>],
) -> String {
    if reaction_times.len() < MIN_SKEW_SAMPLES {
        return base.to_string();
    }

    match window.duration_ms() {
        Some(ms) if ms <= TIME_OF_DAY_MAX_MS => time_of_day_title(base, reaction_times),
        Some(ms) if ms > WEEKDAY_FRAMING_MIN_MS => weekday_title(base, reaction_times),
        None => weekday_title(base, reaction_times),
        _ => base.to_string(),
    }
}

fn day_segment(hour: u32) -> usize {
    match hour {
        5..=11 => 1,  // morning
        12..=17 => 2, // afternoon
        18..=22 => 3, // evening
        _ => 0,       // late night
    }
}

const SEGMENT_PREFIXES: [&str; 4] = ["Late-Night", "Morning", "Afternoon", "Evening"];

fn time_of_day_title(base: &str, reaction_times: &[DateTime<Utc>]) -> String {
    let mut counts = [0usize; 4];
    for time in reaction_times {
        counts[day_segment(time.hour())] += 1;
    }

    let quorum = (SKEW_SHARE * reaction_times.len() as f64).ceil() as usize;
    for (segment, count) in counts.iter().enumerate() {
        if *count >= quorum {
            return format!("{} {}", SEGMENT_PREFIXES[segment], base);
        }
    }
    base.to_string()
}

fn weekday_name(weekday: Weekday) -> &'static str {
    match weekday {
        Weekday::Mon => "Monday",
        Weekday::Tue => "Tuesday",
        Weekday::Wed => "Wednesday",
        Weekday::Thu => "Thursday",
        Weekday::Fri => "Friday",
        Weekday::Sat => "Saturday",
        Weekday::Sun => "Sunday",
    }
}

fn weekday_title(base: &str, reaction_times: &[DateTime<Utc>]) -> String {
    let mut counts = [0usize; 7];
    for time in reaction_times {
        counts[time.weekday().num_days_from_monday() as usize] += 1;
    }

    let n = reaction_times.len();
    let single_quorum = (WEEKDAY_SHARE * n as f64).ceil() as usize;
    for (day, count) in counts.iter().enumerate() {
        if *count >= single_quorum {
            let weekday = match day {
                0 => Weekday::Mon,
                1 => Weekday::Tue,
                2 => Weekday::Wed,
                3 => Weekday::Thu,
                4 => Weekday::Fri,
                5 => Weekday::Sat,
                _ => Weekday::Sun,
            };
            return format!("{} {}", weekday_name(weekday), base);
        }
    }

    let weekend = counts[5] + counts[6];
    let weekend_quorum = (SKEW_SHARE * n as f64).ceil() as usize;
    if weekend >= weekend_quorum {
        return format!("Weekend {}", base);
    }

    base.to_string()
}
