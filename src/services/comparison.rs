// src/services/comparison.rs
// DOCUMENTATION: Winner selection between two analysed videos

use crate::models::{ComparisonReport, ComparisonResults, ScrollReport, VideoSummary, Winner};
use std::cmp::Ordering;

/// Winner of a single metric; equal values tie
fn pick(a: f64, b: f64, lower_is_better: bool) -> Winner {
    match a.partial_cmp(&b) {
        Some(Ordering::Less) if lower_is_better => Winner::Video1,
        Some(Ordering::Less) => Winner::Video2,
        Some(Ordering::Greater) if lower_is_better => Winner::Video2,
        Some(Ordering::Greater) => Winner::Video1,
        _ => Winner::Tie,
    }
}

/// Overall winner: higher rating, then lower jitter, then lower jerkiness
pub fn overall_winner(r1: &ScrollReport, r2: &ScrollReport) -> Winner {
    match r1.smoothness_rating.cmp(&r2.smoothness_rating) {
        Ordering::Greater => Winner::Video1,
        Ordering::Less => Winner::Video2,
        Ordering::Equal => match pick(r1.frame_time_jitter_ms, r2.frame_time_jitter_ms, true) {
            Winner::Tie => pick(r1.scroll_jerkiness, r2.scroll_jerkiness, true),
            decided => decided,
        },
    }
}

/// Build the comparison report for two analysed videos
pub fn compare_reports(
    r1: &ScrollReport,
    name1: &str,
    r2: &ScrollReport,
    name2: &str,
) -> ComparisonReport {
    let results = ComparisonResults {
        overall_winner: overall_winner(r1, r2),
        better_jerkiness: pick(r1.scroll_jerkiness, r2.scroll_jerkiness, true),
        better_jitter: pick(r1.frame_time_jitter_ms, r2.frame_time_jitter_ms, true),
        better_fps: pick(r1.estimated_fps, r2.estimated_fps, false),
    };

    log::info!(
        "Comparison {} vs {}: overall {:?}, jerkiness {:?}, jitter {:?}, fps {:?}",
        name1,
        name2,
        results.overall_winner,
        results.better_jerkiness,
        results.better_jitter,
        results.better_fps
    );

    ComparisonReport {
        video1: VideoSummary::from_report(r1, name1),
        video2: VideoSummary::from_report(r2, name2),
        results,
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::models::{FrameEvents, SmoothnessRating};

    fn report(rating: SmoothnessRating, jerkiness: f64, jitter: f64, fps: f64) -> ScrollReport {
        ScrollReport {
            frames_processed: 10,
            frames_decoded: 50,
            average_scroll_activity: 3.0,
            scroll_jerkiness: jerkiness,
            frame_time_jitter_ms: jitter,
            estimated_fps: fps,
            mean_frame_interval_ms: if fps > 0.0 { 1000.0 / fps } else { 0.0 },
            frame_skip: 5,
            max_frames: 2000,
            smoothness_rating: rating,
            smoothness_description: rating.description().to_string(),
            summary: String::new(),
            issues: Vec::new(),
            problem_windows: Vec::new(),
            frame_events: FrameEvents::default(),
            video_path: "uploads/s/video.mp4".to_string(),
            analyzed_at: String::new(),
        }
    }

    #[test]
    fn test_better_rating_wins_overall() {
        let good = report(SmoothnessRating::Good, 4.0, 7.0, 55.0);
        let poor = report(SmoothnessRating::Poor, 1.0, 20.0, 60.0);

        let cmp = compare_reports(&good, "a.mp4", &poor, "b.mp4");
        assert_eq!(cmp.results.overall_winner, Winner::Video1);
        assert_eq!(cmp.results.better_jerkiness, Winner::Video2);
        assert_eq!(cmp.results.better_jitter, Winner::Video1);
        assert_eq!(cmp.results.better_fps, Winner::Video2);
        assert_eq!(cmp.video1.name, "a.mp4");
        assert_eq!(cmp.video2.rating, SmoothnessRating::Poor);
    }

    #[test]
    fn test_equal_rating_falls_back_to_jitter_then_jerkiness() {
        let a = report(SmoothnessRating::Fair, 6.0, 9.0, 50.0);
        let b = report(SmoothnessRating::Fair, 7.0, 10.0, 50.0);
        assert_eq!(overall_winner(&a, &b), Winner::Video1);
        assert_eq!(overall_winner(&b, &a), Winner::Video2);

        let c = report(SmoothnessRating::Fair, 8.0, 9.0, 50.0);
        assert_eq!(overall_winner(&a, &c), Winner::Video1);
        assert_eq!(overall_winner(&c, &a), Winner::Video2);
    }

    #[test]
    fn test_identical_reports_tie() {
        let a = report(SmoothnessRating::Good, 3.0, 5.0, 60.0);
        let cmp = compare_reports(&a, "a.mp4", &a.clone(), "a-copy.mp4");
        assert_eq!(cmp.results.overall_winner, Winner::Tie);
        assert_eq!(cmp.results.better_jerkiness, Winner::Tie);
        assert_eq!(cmp.results.better_jitter, Winner::Tie);
        assert_eq!(cmp.results.better_fps, Winner::Tie);
    }

    #[test]
    fn test_winner_serialization() {
        assert_eq!(serde_json::to_value(Winner::Video1).unwrap(), "Video 1");
        assert_eq!(serde_json::to_value(Winner::Tie).unwrap(), "Tie");
    }
}
