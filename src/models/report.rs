// src/models/report.rs
// DOCUMENTATION: Per-video scroll smoothness report
// PURPOSE: Serializable result of analysing one video

use serde::{Deserialize, Serialize};
use std::fmt;

/// Overall smoothness grade, ordered from worst to best
#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Hash, Serialize, Deserialize)]
pub enum SmoothnessRating {
    Poor,
    Fair,
    Good,
    Excellent,
}

impl SmoothnessRating {
    /// Fixed human-readable description for each grade
    pub fn description(&self) -> &'static str {
        match self {
            SmoothnessRating::Excellent => {
                "Perfectly smooth scrolling - meets industry benchmark standards"
            }
            SmoothnessRating::Good => "Smooth scrolling with minimal stutter",
            SmoothnessRating::Fair => "Noticeable lag or stutter, but acceptable performance",
            SmoothnessRating::Poor => "Significant stutter and lag - below industry standards",
        }
    }
}

impl fmt::Display for SmoothnessRating {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        let label = match self {
            SmoothnessRating::Excellent => "Excellent",
            SmoothnessRating::Good => "Good",
            SmoothnessRating::Fair => "Fair",
            SmoothnessRating::Poor => "Poor",
        };
        f.write_str(label)
    }
}

/// Kind of weak spot found in a recording
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum ProblemKind {
    /// Content motion far from the average
    MotionSpike,
    /// Frame intervals far from the average
    TimingJitter,
}

/// Time range where the scrolling experience is weakest
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct ProblemWindow {
    #[serde(rename = "type")]
    pub kind: ProblemKind,
    pub start_sec: f64,
    pub end_sec: f64,
    pub description: String,
}

/// Sample indices flagged by the changed-pixel detector
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
pub struct FrameEvents {
    /// Almost nothing changed between samples
    pub lag: Vec<usize>,
    /// Most of the screen changed at once
    pub flicker: Vec<usize>,
    /// Large sudden change
    pub jerk: Vec<usize>,
}

/// Scroll smoothness report for a single video
/// DOCUMENTATION: Written to scroll_analysis_report.json and returned by the API
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct ScrollReport {
    /// Frames that went through motion analysis
    pub frames_processed: usize,
    /// Frames decoded, including skipped ones
    pub frames_decoded: usize,
    /// Mean activity score (content movement level)
    pub average_scroll_activity: f64,
    /// Standard deviation of the activity score
    pub scroll_jerkiness: f64,
    /// Standard deviation of frame intervals in ms
    pub frame_time_jitter_ms: f64,
    pub estimated_fps: f64,
    pub mean_frame_interval_ms: f64,
    pub frame_skip: usize,
    pub max_frames: usize,
    pub smoothness_rating: SmoothnessRating,
    pub smoothness_description: String,
    pub summary: String,
    pub issues: Vec<String>,
    pub problem_windows: Vec<ProblemWindow>,
    pub frame_events: FrameEvents,
    pub video_path: String,
    /// RFC 3339 timestamp of when the analysis finished
    pub analyzed_at: String,
}

/// Raw per-sample series behind a report, used for the dashboards
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
pub struct MotionSeries {
    /// Activity score per analysed frame pair
    pub velocities: Vec<f64>,
    /// Timestamp (ms) of the later frame of each pair
    pub sample_times_ms: Vec<f64>,
    /// Timestamps (ms) of every decoded frame considered
    pub frame_times_ms: Vec<f64>,
    /// Time (ms) between consecutive decoded frames
    pub frame_intervals_ms: Vec<f64>,
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_rating_order() {
        assert!(SmoothnessRating::Excellent > SmoothnessRating::Good);
        assert!(SmoothnessRating::Good > SmoothnessRating::Fair);
        assert!(SmoothnessRating::Fair > SmoothnessRating::Poor);
    }

    #[test]
    fn test_problem_window_serializes_type_field() {
        let window = ProblemWindow {
            kind: ProblemKind::TimingJitter,
            start_sec: 1.0,
            end_sec: 1.5,
            description: "unstable".to_string(),
        };
        let value = serde_json::to_value(&window).unwrap();
        assert_eq!(value["type"], "timing_jitter");
    }
}
