// src/models/comparison.rs
// DOCUMENTATION: Two-video comparison report
// PURPOSE: Side-by-side metrics and per-metric winners

use crate::models::{ScrollReport, SmoothnessRating};
use serde::{Deserialize, Serialize};

/// Which video came out ahead on a metric
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub enum Winner {
    #[serde(rename = "Video 1")]
    Video1,
    #[serde(rename = "Video 2")]
    Video2,
    Tie,
}

/// Headline metrics for one side of a comparison
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct VideoSummary {
    pub path: String,
    pub name: String,
    pub rating: SmoothnessRating,
    pub activity_score: f64,
    pub jerkiness: f64,
    pub jitter_ms: f64,
    pub estimated_fps: f64,
}

impl VideoSummary {
    /// Build a summary from a full report and the display name of the upload
    pub fn from_report(report: &ScrollReport, name: &str) -> Self {
        VideoSummary {
            path: report.video_path.clone(),
            name: name.to_string(),
            rating: report.smoothness_rating,
            activity_score: report.average_scroll_activity,
            jerkiness: report.scroll_jerkiness,
            jitter_ms: report.frame_time_jitter_ms,
            estimated_fps: report.estimated_fps,
        }
    }
}

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct ComparisonResults {
    pub overall_winner: Winner,
    pub better_jerkiness: Winner,
    pub better_jitter: Winner,
    pub better_fps: Winner,
}

/// Comparison report
/// DOCUMENTATION: Written to comparison_report.json and returned by POST /api/compare
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct ComparisonReport {
    pub video1: VideoSummary,
    pub video2: VideoSummary,
    pub results: ComparisonResults,
}
