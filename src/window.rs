//! Analysis windows and the windowed threshold policy
//!
//! Classifier thresholds depend on how much history a query looks at: a
//! member judged over 24 hours of reactions must be held to stricter
//! habit cutoffs than one judged over 90 days. The policy is a total
//! function of window duration with no hidden state and no I/O.

use std::fmt;
use std::str::FromStr;

use serde::{Deserialize, Serialize};

use crate::error::AnalyticsError;

pub const HOUR_MS: i64 = 3_600_000;
pub const DAY_MS: i64 = 86_400_000;

/// Minimum of the habit arc projection (degrees)
pub const ARC_MIN_DEG: f64 = 20.0;

/// Maximum of the habit arc projection (degrees)
pub const ARC_MAX_DEG: f64 = 330.0;

/// Base maximum gap between adjacent reactions in a single burst
const BASE_CLUSTER_GAP_MS: i64 = 10 * 60 * 1000;

/// Fixed time range over which statistics are computed.
///
/// Created per request, never persisted.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub enum AnalysisWindow {
    #[serde(rename = "24h")]
    Day,
    #[serde(rename = "7d")]
    Week,
    #[serde(rename = "30d")]
    Month,
    #[serde(rename = "90d")]
    Quarter,
    #[serde(rename = "all")]
    AllTime,
}

impl AnalysisWindow {
    /// Window duration in milliseconds; `None` for all-time.
    pub fn duration_ms(&self) -> Option<i64> {
        match self {
            AnalysisWindow::Day => Some(DAY_MS),
            AnalysisWindow::Week => Some(7 * DAY_MS),
            AnalysisWindow::Month => Some(30 * DAY_MS),
            AnalysisWindow::Quarter => Some(90 * DAY_MS),
            AnalysisWindow::AllTime => None,
        }
    }

    /// Duration the threshold policy judges this window by.
    /// All-time falls in the loosest bracket.
    pub(crate) fn policy_ms(&self) -> i64 {
        self.duration_ms().unwrap_or(i64::MAX)
    }

    pub fn as_str(&self) -> &'static str {
        match self {
            AnalysisWindow::Day => "24h",
            AnalysisWindow::Week => "7d",
            AnalysisWindow::Month => "30d",
            AnalysisWindow::Quarter => "90d",
            AnalysisWindow::AllTime => "all",
        }
    }

    /// Every supported window, in ascending duration order.
    pub fn all() -> [AnalysisWindow; 5] {
        [
            AnalysisWindow::Day,
            AnalysisWindow::Week,
            AnalysisWindow::Month,
            AnalysisWindow::Quarter,
            AnalysisWindow::AllTime,
        ]
    }
}

impl fmt::Display for AnalysisWindow {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

impl FromStr for AnalysisWindow {
    type Err = AnalyticsError;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s {
            "24h" | "day" => Ok(AnalysisWindow::Day),
            "7d" | "week" => Ok(AnalysisWindow::Week),
            "30d" | "month" => Ok(AnalysisWindow::Month),
            "90d" | "quarter" => Ok(AnalysisWindow::Quarter),
            "all" | "alltime" => Ok(AnalysisWindow::AllTime),
            other => Err(AnalyticsError::InvalidWindow(other.to_string())),
        }
    }
}

/// Threshold sets derived from the analysis window length.
///
/// Used by the habit classifier (ritualist / batcher / erratic) and by
/// the burst detector. Short windows are judged more strictly: less
/// history means the same raw variance says more about a member.
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct ReactionThresholds {
    /// Habit arc spans (degrees) at or below this count as ritualist
    pub ritualist_arc_deg: f64,
    /// Habit arc spans (degrees) above this count as erratic
    pub erratic_arc_deg: f64,
    /// Maximum gap between chronologically adjacent reactions that still
    /// counts as a single burst
    pub cluster_gap_ms: i64,
    /// Divisor converting coefficient of variation into a 0-1 variance
    /// score
    pub variance_norm: f64,
}

impl ReactionThresholds {
    pub fn for_window(window: AnalysisWindow) -> Self {
        Self::for_duration_ms(window.policy_ms())
    }

    /// Total function of window duration.
    ///
    /// Consistency cutoffs: stricter below 48h, looser above 7d, a
    /// default in between. Cluster gap: base 10 minutes, halved below
    /// 24h, doubled above 7d.
    pub fn for_duration_ms(duration_ms: i64) -> Self {
        let (ritualist_arc_deg, erratic_arc_deg, variance_norm) = if duration_ms < 48 * HOUR_MS {
            (80.0, 220.0, 1.5)
        } else if duration_ms > 7 * DAY_MS {
            (130.0, 270.0, 2.5)
        } else {
            (100.0, 240.0, 2.0)
        };

        let cluster_gap_ms = if duration_ms < DAY_MS {
            BASE_CLUSTER_GAP_MS / 2
        } else if duration_ms > 7 * DAY_MS {
            BASE_CLUSTER_GAP_MS * 2
        } else {
            BASE_CLUSTER_GAP_MS
        };

        Self {
            ritualist_arc_deg,
            erratic_arc_deg,
            cluster_gap_ms,
            variance_norm,
        }
    }

    /// Normalize a coefficient of variation to a 0-1 variance score.
    pub fn variance_score(&self, cv: f64) -> f64 {
        (cv / self.variance_norm).clamp(0.0, 1.0)
    }

    /// Project a coefficient of variation onto the 20-330 degree habit arc.
    pub fn variance_arc_deg(&self, cv: f64) -> f64 {
        ARC_MIN_DEG + self.variance_score(cv) * (ARC_MAX_DEG - ARC_MIN_DEG)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use pretty_assertions::assert_eq;

    #[test]
    fn window_round_trips_through_strings() {
        for window in AnalysisWindow::all() {
            assert_eq!(window.as_str().parse::<AnalysisWindow>().unwrap(), window);
        }
    }

    #[test]
    fn unknown_window_is_rejected() {
        let err = "14d".parse::<AnalysisWindow>().unwrap_err();
        assert!(matches!(err, AnalyticsError::InvalidWindow(w) if w == "14d"));
    }

    #[test]
    fn window_serializes_to_contract_names() {
        let json = serde_json::to_string(&AnalysisWindow::Week).unwrap();
        assert_eq!(json, "\"7d\"");
        let parsed: AnalysisWindow = serde_json::from_str("\"all\"").unwrap();
        assert_eq!(parsed, AnalysisWindow::AllTime);
    }

    #[test]
    fn short_windows_get_strict_thresholds() {
        let strict = ReactionThresholds::for_duration_ms(12 * HOUR_MS);
        let default = ReactionThresholds::for_duration_ms(3 * DAY_MS);
        let loose = ReactionThresholds::for_duration_ms(30 * DAY_MS);

        assert!(strict.ritualist_arc_deg < default.ritualist_arc_deg);
        assert!(default.ritualist_arc_deg < loose.ritualist_arc_deg);
        assert!(strict.variance_norm < loose.variance_norm);
    }

    #[test]
    fn cluster_gap_scales_with_window() {
        assert_eq!(
            ReactionThresholds::for_duration_ms(6 * HOUR_MS).cluster_gap_ms,
            5 * 60 * 1000
        );
        assert_eq!(
            ReactionThresholds::for_duration_ms(3 * DAY_MS).cluster_gap_ms,
            10 * 60 * 1000
        );
        assert_eq!(
            ReactionThresholds::for_duration_ms(30 * DAY_MS).cluster_gap_ms,
            20 * 60 * 1000
        );
    }

    #[test]
    fn enum_windows_land_in_expected_brackets() {
        // 24h is under the 48h consistency cutoff but not under 24h,
        // so strict arcs with the base cluster gap
        let day = ReactionThresholds::for_window(AnalysisWindow::Day);
        assert_eq!(day.ritualist_arc_deg, 80.0);
        assert_eq!(day.cluster_gap_ms, 10 * 60 * 1000);

        // 7d is neither below 48h nor above 7d
        let week = ReactionThresholds::for_window(AnalysisWindow::Week);
        assert_eq!(week.ritualist_arc_deg, 100.0);
        assert_eq!(week.cluster_gap_ms, 10 * 60 * 1000);

        // all-time is judged like the loosest bounded window
        let all = ReactionThresholds::for_window(AnalysisWindow::AllTime);
        assert_eq!(all.ritualist_arc_deg, 130.0);
        assert_eq!(all.cluster_gap_ms, 20 * 60 * 1000);
    }

    #[test]
    fn variance_arc_spans_20_to_330() {
        let t = ReactionThresholds::for_window(AnalysisWindow::Week);
        assert_eq!(t.variance_arc_deg(0.0), 20.0);
        assert_eq!(t.variance_arc_deg(1000.0), 330.0);
        let mid = t.variance_arc_deg(1.0); // cv 1.0 / norm 2.0 = 0.5
        assert!((mid - 175.0).abs() < 1e-9);
    }

    #[test]
    fn variance_score_is_clamped() {
        let t = ReactionThresholds::for_window(AnalysisWindow::Day);
        assert_eq!(t.variance_score(100.0), 1.0);
        assert_eq!(t.variance_score(0.0), 0.0);
    }
}
