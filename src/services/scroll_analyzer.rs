// src/services/scroll_analyzer.rs
// DOCUMENTATION: Scroll smoothness analysis of a single video
// PURPOSE: Turn a frame stream into activity, jerkiness, jitter and FPS metrics,
// a rating, human-readable issues and the time ranges that feel worst

use crate::errors::DashboardError;
use crate::models::{MotionSeries, ProblemKind, ProblemWindow, ScrollReport, SmoothnessRating};
use crate::services::events::FrameEventDetector;
use crate::services::frame_source::FrameSource;
use crate::services::motion::{
    block_activity, changed_ratio, match_dimensions, mean, ranges_from_mask, std_dev,
};
use image::GrayImage;

// Jitter thresholds in ms, relative to a 60 FPS target (16.67 ms per frame)
pub const JITTER_EXCELLENT: f64 = 3.0;
pub const JITTER_GOOD: f64 = 8.0;
pub const JITTER_FAIR: f64 = 16.0;

// Jerkiness thresholds (standard deviation of the activity score)
pub const JERK_EXCELLENT: f64 = 2.0;
pub const JERK_GOOD: f64 = 5.0;
pub const JERK_FAIR: f64 = 10.0;

/// Frame rate below which a recording is flagged
pub const LOW_FPS: f64 = 50.0;

/// Activity score below which scrolling is flagged as sluggish
pub const LOW_ACTIVITY: f64 = 1.0;

/// Shortest run of abnormal samples reported as a problem window
const MIN_WINDOW_SAMPLES: usize = 2;

/// Tuning knobs for an analysis run
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct AnalysisSettings {
    /// Analyse one decoded frame out of every `frame_skip`
    pub frame_skip: usize,
    /// Upper bound on analysed frames
    pub max_frames: usize,
    /// Rows per motion band
    pub block_size: u32,
}

impl Default for AnalysisSettings {
    fn default() -> Self {
        Self {
            frame_skip: 5,
            max_frames: 2000,
            block_size: 32,
        }
    }
}

/// Report plus the raw series it was computed from
#[derive(Debug, Clone)]
pub struct AnalysisOutcome {
    pub report: ScrollReport,
    pub series: MotionSeries,
}

/// Scroll analyzer
/// DOCUMENTATION: Deterministic for a given frame stream and settings
pub struct ScrollAnalyzer {
    settings: AnalysisSettings,
}

impl ScrollAnalyzer {
    pub fn new(settings: AnalysisSettings) -> Self {
        Self {
            settings: AnalysisSettings {
                frame_skip: settings.frame_skip.max(1),
                max_frames: settings.max_frames.max(1),
                block_size: settings.block_size.max(1),
            },
        }
    }

    /// Analyze a frame stream
    ///
    /// # Arguments
    /// * `source` - Frames in presentation order
    /// * `video_path` - Recorded verbatim in the report
    ///
    /// # Returns
    /// Report and series, or `NoFramesProcessed` when fewer than two frames
    /// were analysed
    pub fn analyze<S: FrameSource + ?Sized>(
        &self,
        source: &mut S,
        video_path: &str,
    ) -> Result<AnalysisOutcome, DashboardError> {
        let AnalysisSettings {
            frame_skip,
            max_frames,
            block_size,
        } = self.settings;

        let mut series = MotionSeries::default();
        let mut detector = FrameEventDetector::new();
        let mut reference: Option<(u32, u32)> = None;
        let mut prev: Option<GrayImage> = None;
        let mut frames_decoded = 0usize;
        let mut processed = 0usize;

        while processed < max_frames {
            let Some(frame) = source.next_frame()? else {
                break;
            };

            let decode_index = frames_decoded;
            frames_decoded += 1;
            series.frame_times_ms.push(frame.timestamp_ms);

            if decode_index % frame_skip != 0 {
                continue;
            }

            let luma = match reference {
                None => {
                    reference = Some(frame.luma.dimensions());
                    frame.luma
                }
                Some((width, height)) => {
                    if frame.luma.dimensions() != (width, height) {
                        log::debug!(
                            "Frame {} is {}x{}, resizing to {}x{}",
                            frame.index,
                            frame.luma.width(),
                            frame.luma.height(),
                            width,
                            height
                        );
                    }
                    match_dimensions(frame.luma, width, height)
                }
            };

            if let Some(prev_luma) = prev.as_ref() {
                series
                    .velocities
                    .push(block_activity(prev_luma, &luma, block_size));
                series.sample_times_ms.push(frame.timestamp_ms);
                detector.record(processed, changed_ratio(prev_luma, &luma));
            }

            prev = Some(luma);
            processed += 1;
        }

        series.frame_intervals_ms = series
            .frame_times_ms
            .windows(2)
            .map(|pair| pair[1] - pair[0])
            .collect();

        if series.velocities.is_empty() {
            return Err(DashboardError::NoFramesProcessed(video_path.to_string()));
        }

        let avg_speed = mean(&series.velocities);
        let jerkiness = std_dev(&series.velocities);
        let jitter = std_dev(&series.frame_intervals_ms);
        let mean_interval = mean(&series.frame_intervals_ms);
        let estimated_fps = if mean_interval > 0.0 {
            1000.0 / mean_interval
        } else {
            0.0
        };

        let rating = rate(jerkiness, jitter);
        let issues = detect_issues(avg_speed, jerkiness, jitter, estimated_fps);
        let summary = format!(
            "Overall scroll smoothness: {} - {}. \
             Activity score: {:.2} (content movement level), \
             Jerkiness: {:.2} (motion consistency, lower is better), \
             Frame-time jitter: {:.2} ms (timing stability, target < 8ms for smooth), \
             Estimated FPS: {:.1} (target: 60 FPS). \
             Motion sampled every {} frames; timing measured over all {} decoded frames.",
            rating,
            rating.description(),
            avg_speed,
            jerkiness,
            jitter,
            estimated_fps,
            frame_skip,
            frames_decoded
        );
        let problem_windows = find_problem_windows(&series, avg_speed, jerkiness, jitter);

        log::info!(
            "Analyzed {}: {} frames decoded, {} processed, rating {} (jerkiness {:.2}, jitter {:.2} ms, {:.1} fps)",
            video_path,
            frames_decoded,
            processed,
            rating,
            jerkiness,
            jitter,
            estimated_fps
        );

        let report = ScrollReport {
            frames_processed: processed,
            frames_decoded,
            average_scroll_activity: avg_speed,
            scroll_jerkiness: jerkiness,
            frame_time_jitter_ms: jitter,
            estimated_fps,
            mean_frame_interval_ms: mean_interval,
            frame_skip,
            max_frames,
            smoothness_rating: rating,
            smoothness_description: rating.description().to_string(),
            summary,
            issues,
            problem_windows,
            frame_events: detector.finish(),
            video_path: video_path.to_string(),
            analyzed_at: chrono::Utc::now().to_rfc3339(),
        };

        Ok(AnalysisOutcome { report, series })
    }
}

/// Grade a recording; both thresholds of a grade must hold
pub fn rate(jerkiness: f64, jitter: f64) -> SmoothnessRating {
    if jerkiness < JERK_EXCELLENT && jitter < JITTER_EXCELLENT {
        SmoothnessRating::Excellent
    } else if jerkiness < JERK_GOOD && jitter < JITTER_GOOD {
        SmoothnessRating::Good
    } else if jerkiness < JERK_FAIR && jitter < JITTER_FAIR {
        SmoothnessRating::Fair
    } else {
        SmoothnessRating::Poor
    }
}

/// Human-readable list of what is wrong with a recording
pub fn detect_issues(avg_speed: f64, jerkiness: f64, jitter: f64, estimated_fps: f64) -> Vec<String> {
    let mut issues = Vec::new();

    if jerkiness >= JERK_FAIR {
        issues.push(format!(
            "High jerkiness ({:.2}): Scrolling motion is very uneven and jerky.",
            jerkiness
        ));
    } else if jerkiness >= JERK_GOOD {
        issues.push(format!(
            "Moderate jerkiness ({:.2}): Some uneven motion detected.",
            jerkiness
        ));
    }

    if jitter >= JITTER_FAIR {
        issues.push(format!(
            "High frame-time jitter ({:.2} ms): Significant frame timing variation causing stutter (target: < 16ms for 60 FPS).",
            jitter
        ));
    } else if jitter >= JITTER_GOOD {
        issues.push(format!(
            "Moderate frame-time jitter ({:.2} ms): Some frame timing inconsistency (target: < 8ms for smooth).",
            jitter
        ));
    }

    if estimated_fps > 0.0 && estimated_fps < LOW_FPS {
        issues.push(format!(
            "Low frame rate (estimated {:.1} FPS): Below optimal 60 FPS target.",
            estimated_fps
        ));
    }

    if avg_speed < LOW_ACTIVITY {
        issues.push(
            "Low scroll activity: Scrolling speed is very low and may feel sluggish.".to_string(),
        );
    }

    if issues.is_empty() {
        issues.push("No major problems detected - scrolling meets industry standards.".to_string());
    }

    issues
}

fn round2(value: f64) -> f64 {
    (value * 100.0).round() / 100.0
}

/// Locate motion spikes and timing instability in the series
fn find_problem_windows(
    series: &MotionSeries,
    avg_speed: f64,
    jerkiness: f64,
    jitter: f64,
) -> Vec<ProblemWindow> {
    let mut windows = Vec::new();

    let motion_limit = jerkiness.max(1.0);
    let motion_mask: Vec<bool> = series
        .velocities
        .iter()
        .map(|v| (v - avg_speed).abs() > motion_limit)
        .collect();

    for (s, e) in ranges_from_mask(&motion_mask, MIN_WINDOW_SAMPLES) {
        windows.push(ProblemWindow {
            kind: ProblemKind::MotionSpike,
            start_sec: round2(series.sample_times_ms[s] / 1000.0),
            end_sec: round2(series.sample_times_ms[e] / 1000.0),
            description: "Content motion is very uneven in this range, which may feel jerky."
                .to_string(),
        });
    }

    if !series.frame_intervals_ms.is_empty() {
        let mean_interval = mean(&series.frame_intervals_ms);
        let timing_limit = jitter.max(JITTER_GOOD);
        let timing_mask: Vec<bool> = series
            .frame_intervals_ms
            .iter()
            .map(|iv| (iv - mean_interval).abs() > timing_limit)
            .collect();

        // Interval i spans frame_times[i]..frame_times[i + 1]
        for (s, e) in ranges_from_mask(&timing_mask, MIN_WINDOW_SAMPLES) {
            windows.push(ProblemWindow {
                kind: ProblemKind::TimingJitter,
                start_sec: round2(series.frame_times_ms[s] / 1000.0),
                end_sec: round2(series.frame_times_ms[e + 1] / 1000.0),
                description: "Frame timing is unstable here and may look like stutter."
                    .to_string(),
            });
        }
    }

    windows
}
