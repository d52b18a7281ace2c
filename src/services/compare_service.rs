// src/services/compare_service.rs
// DOCUMENTATION: Comparison orchestration
// PURPOSE: Analyze both uploaded videos, persist reports and dashboards,
// and assemble the API response

use crate::config::Config;
use crate::errors::DashboardError;
use crate::models::{CompareResponse, ComparisonReport, MotionSeries};
use crate::services::charts::{render_comparison_dashboard, render_video_dashboard, save_png};
use crate::services::comparison::compare_reports;
use crate::services::ffmpeg::{FfmpegDecoder, FfmpegTools};
use crate::services::frame_source::FrameSource;
use crate::services::scroll_analyzer::{AnalysisOutcome, AnalysisSettings, ScrollAnalyzer};
use actix_web::web;
use governor::{DefaultDirectRateLimiter, Quota, RateLimiter};
use std::num::NonZeroU32;
use std::path::{Path, PathBuf};
use std::sync::Arc;
use std::time::Instant;
use tokio::sync::Semaphore;

pub const COMPARISON_DIR: &str = "comparison";
pub const REPORT_FILE: &str = "scroll_analysis_report.json";
pub const SERIES_FILE: &str = "motion_series.json";
pub const DASHBOARD_FILE: &str = "scroll_analysis_dashboard.png";
pub const COMPARISON_REPORT_FILE: &str = "comparison_report.json";
pub const COMPARISON_DASHBOARD_FILE: &str = "comparison_dashboard.png";

/// Opens the frame stream of a stored video. Called on a blocking thread.
pub type SourceFactory =
    Arc<dyn Fn(&Path) -> Result<Box<dyn FrameSource>, DashboardError> + Send + Sync>;

/// Frame sources decoded by ffmpeg child processes
pub fn ffmpeg_sources(tools: FfmpegTools) -> SourceFactory {
    Arc::new(move |video: &Path| {
        let decoder = FfmpegDecoder::open(&tools, video)?;
        Ok(Box::new(decoder) as Box<dyn FrameSource>)
    })
}

/// A stored upload ready for analysis
#[derive(Debug, Clone)]
pub struct UploadedVideo {
    /// Sanitized client file name, used for display
    pub name: String,
    /// Location inside the session directory
    pub path: PathBuf,
}

/// Comparison service
/// DOCUMENTATION: Shared across workers; bounds concurrent comparisons with
/// a semaphore and accepted requests with a rate limiter
pub struct CompareService {
    open_source: SourceFactory,
    settings: AnalysisSettings,
    permits: Arc<Semaphore>,
    limiter: Option<DefaultDirectRateLimiter>,
}

impl CompareService {
    pub fn new(
        tools: FfmpegTools,
        settings: AnalysisSettings,
        max_concurrent: usize,
        rate_per_minute: u32,
    ) -> Self {
        Self::with_sources(
            ffmpeg_sources(tools),
            settings,
            max_concurrent,
            rate_per_minute,
        )
    }

    /// Build a service that reads frames through a custom factory
    pub fn with_sources(
        open_source: SourceFactory,
        settings: AnalysisSettings,
        max_concurrent: usize,
        rate_per_minute: u32,
    ) -> Self {
        Self {
            open_source,
            settings,
            permits: Arc::new(Semaphore::new(max_concurrent.max(1))),
            limiter: NonZeroU32::new(rate_per_minute)
                .map(|rate| RateLimiter::direct(Quota::per_minute(rate))),
        }
    }

    pub fn from_config(config: &Config) -> Self {
        Self::new(
            FfmpegTools::from_config(config),
            AnalysisSettings {
                frame_skip: config.frame_skip,
                max_frames: config.max_frames,
                block_size: config.block_size,
            },
            config.max_concurrent_analyses,
            config.compare_rate_per_minute,
        )
    }

    /// Consume one unit of the compare rate budget
    pub fn check_rate(&self) -> Result<(), DashboardError> {
        match &self.limiter {
            Some(limiter) if limiter.check().is_err() => Err(DashboardError::RateLimitExceeded),
            _ => Ok(()),
        }
    }

    /// Analyze two stored videos and write every artifact under
    /// `<session_dir>/comparison`
    pub async fn compare(
        &self,
        session_id: &str,
        session_dir: &Path,
        video1: &UploadedVideo,
        video2: &UploadedVideo,
    ) -> Result<CompareResponse, DashboardError> {
        let _permit = self
            .permits
            .clone()
            .acquire_owned()
            .await
            .map_err(|e| DashboardError::Internal(format!("analysis pool closed: {}", e)))?;

        let start_time = Instant::now();
        let out_dir = session_dir.join(COMPARISON_DIR);

        log::info!(
            "Comparing {} vs {} (session {})",
            video1.name,
            video2.name,
            session_id
        );

        // Both jobs run to completion before the permit is released, even
        // when one of them fails early
        let (result1, result2) = tokio::join!(
            self.analyze_video(video1.path.clone(), out_dir.join("video1_analysis")),
            self.analyze_video(video2.path.clone(), out_dir.join("video2_analysis")),
        );
        let (outcome1, outcome2) = (result1?, result2?);

        let comparison = compare_reports(
            &outcome1.report,
            &video1.name,
            &outcome2.report,
            &video2.name,
        );

        let artifacts = (
            comparison.clone(),
            outcome1.series.clone(),
            outcome2.series.clone(),
            out_dir.clone(),
        );
        web::block(move || {
            let (comparison, series1, series2, out_dir) = artifacts;
            write_comparison_artifacts(&comparison, &series1, &series2, &out_dir)
        })
        .await
        .map_err(|e| DashboardError::Internal(e.to_string()))??;

        log::info!(
            "Session {} finished in {:.1}s: overall winner {:?}",
            session_id,
            start_time.elapsed().as_secs_f64(),
            comparison.results.overall_winner
        );

        let base = format!("/api/image/{}/{}", session_id, COMPARISON_DIR);
        Ok(CompareResponse {
            success: true,
            session_id: session_id.to_string(),
            comparison,
            video1_report: outcome1.report,
            video2_report: outcome2.report,
            dashboard_image: format!("{}/{}", base, COMPARISON_DASHBOARD_FILE),
            video1_analysis: format!("{}/video1_analysis/{}", base, DASHBOARD_FILE),
            video2_analysis: format!("{}/video2_analysis/{}", base, DASHBOARD_FILE),
        })
    }

    async fn analyze_video(
        &self,
        video: PathBuf,
        out_dir: PathBuf,
    ) -> Result<AnalysisOutcome, DashboardError> {
        let open_source = self.open_source.clone();
        let settings = self.settings;

        web::block(move || run_analysis(&open_source, settings, &video, &out_dir))
            .await
            .map_err(|e| DashboardError::Internal(e.to_string()))?
    }
}

/// Decode, analyze and persist one video (blocking)
pub fn run_analysis(
    open_source: &SourceFactory,
    settings: AnalysisSettings,
    video: &Path,
    out_dir: &Path,
) -> Result<AnalysisOutcome, DashboardError> {
    log::info!("Processing video: {}", video.display());

    let outcome = {
        let mut source = open_source(video)?;
        ScrollAnalyzer::new(settings).analyze(source.as_mut(), &video.display().to_string())?
    };

    write_video_artifacts(&outcome, out_dir)?;
    Ok(outcome)
}

/// Write report JSON, series JSON and dashboard PNG for one video
pub fn write_video_artifacts(outcome: &AnalysisOutcome, out_dir: &Path) -> Result<(), DashboardError> {
    std::fs::create_dir_all(out_dir)?;
    std::fs::write(
        out_dir.join(REPORT_FILE),
        serde_json::to_vec_pretty(&outcome.report)?,
    )?;
    std::fs::write(
        out_dir.join(SERIES_FILE),
        serde_json::to_vec_pretty(&outcome.series)?,
    )?;
    save_png(
        &render_video_dashboard(&outcome.report, &outcome.series)?,
        &out_dir.join(DASHBOARD_FILE),
    )?;
    Ok(())
}

/// Write comparison JSON and the side-by-side dashboard
pub fn write_comparison_artifacts(
    comparison: &ComparisonReport,
    series1: &MotionSeries,
    series2: &MotionSeries,
    out_dir: &Path,
) -> Result<(), DashboardError> {
    std::fs::create_dir_all(out_dir)?;
    std::fs::write(
        out_dir.join(COMPARISON_REPORT_FILE),
        serde_json::to_vec_pretty(comparison)?,
    )?;
    save_png(
        &render_comparison_dashboard(series1, series2, comparison)?,
        &out_dir.join(COMPARISON_DASHBOARD_FILE),
    )?;
    Ok(())
}
