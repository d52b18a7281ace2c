// src/services/charts.rs
// DOCUMENTATION: PNG dashboards for single-video and comparison results
// PURPOSE: Line charts, legends and the comparison summary panel, drawn with
// plotters into an in-memory RGB buffer

use crate::errors::DashboardError;
use crate::models::{ComparisonReport, MotionSeries, ScrollReport, VideoSummary, Winner};
use crate::services::motion::mean;
use image::RgbImage;
use plotters::coord::Shift;
use plotters::prelude::*;
use plotters::style::{register_font, FontStyle};
use std::path::Path;
use std::sync::Once;

const FONT: &str = "sans-serif";
static FONT_DATA: &[u8] = include_bytes!("../../assets/fonts/DejaVuSans.ttf");

const ACTIVITY: RGBColor = RGBColor(31, 119, 180);
const INTERVAL: RGBColor = RGBColor(255, 127, 14);
const AVERAGE: RGBColor = RGBColor(44, 160, 44);
const WINNER: RGBColor = RGBColor(5, 150, 105);
const NEUTRAL: RGBColor = RGBColor(107, 114, 128);
const TEXT: RGBColor = RGBColor(31, 41, 55);
const BORDER: RGBColor = RGBColor(156, 163, 175);
const EMPTY: RGBColor = RGBColor(243, 244, 246);
const SUMMARY_BG: RGBColor = RGBColor(245, 240, 225);

pub const VIDEO_DASHBOARD_SIZE: (u32, u32) = (1000, 700);
pub const COMPARISON_DASHBOARD_SIZE: (u32, u32) = (1400, 1000);

/// Height of the text panel under the comparison charts
const SUMMARY_HEIGHT: u32 = 260;

type Area<'a> = DrawingArea<BitMapBackend<'a>, Shift>;

/// Register the bundled font under the generic sans-serif family
fn ensure_font() {
    static REGISTER: Once = Once::new();
    REGISTER.call_once(|| {
        if register_font(FONT, FontStyle::Normal, FONT_DATA).is_err() {
            log::error!("Bundled chart font could not be loaded");
        }
    });
}

fn render_err<E: std::fmt::Display>(e: E) -> DashboardError {
    DashboardError::Render(e.to_string())
}

/// One line chart panel
struct Panel<'a> {
    title: &'a str,
    x_desc: &'a str,
    y_desc: &'a str,
    values: &'a [f64],
    color: RGBColor,
    label: &'a str,
    /// Legend label of the dashed average line, when one is drawn
    mean_label: Option<&'a str>,
}

/// Value range with headroom; flat data gets a unit band around it
fn value_range(values: &[f64]) -> (f64, f64) {
    let min = values.iter().cloned().fold(f64::INFINITY, f64::min);
    let max = values.iter().cloned().fold(f64::NEG_INFINITY, f64::max);
    if (max - min).abs() < f64::EPSILON {
        return (min - 1.0, max + 1.0);
    }
    let pad = (max - min) * 0.05;
    (min - pad, max + pad)
}

fn legend_swatch(color: RGBColor) -> impl Fn((i32, i32)) -> Rectangle<(i32, i32)> {
    move |(x, y)| Rectangle::new([(x, y - 5), (x + 18, y + 5)], color.filled())
}

fn draw_panel(area: &Area, panel: &Panel) -> Result<(), DashboardError> {
    let finite: Vec<f64> = panel.values.iter().cloned().filter(|v| v.is_finite()).collect();

    if finite.is_empty() {
        area.fill(&EMPTY).map_err(render_err)?;
        let (w, h) = area.dim_in_pixel();
        area.draw(&Text::new(
            panel.title.to_string(),
            (16, 12),
            (FONT, 18).into_font().color(&TEXT),
        ))
        .map_err(render_err)?;
        area.draw(&Text::new(
            "No data",
            (w as i32 / 2 - 30, h as i32 / 2),
            (FONT, 18).into_font().color(&NEUTRAL),
        ))
        .map_err(render_err)?;
        return Ok(());
    }

    let (lo, hi) = value_range(&finite);
    let x_max = (finite.len().max(2) - 1) as f64;

    let mut chart = ChartBuilder::on(area)
        .caption(panel.title, (FONT, 18))
        .margin(12)
        .x_label_area_size(40)
        .y_label_area_size(60)
        .build_cartesian_2d(0f64..x_max, lo..hi)
        .map_err(render_err)?;

    chart
        .configure_mesh()
        .x_desc(panel.x_desc)
        .y_desc(panel.y_desc)
        .label_style((FONT, 12))
        .axis_desc_style((FONT, 14))
        .draw()
        .map_err(render_err)?;

    let color = panel.color;
    let points: Vec<(f64, f64)> = finite
        .iter()
        .enumerate()
        .map(|(i, v)| (i as f64, *v))
        .collect();

    if points.len() == 1 {
        chart
            .draw_series(points.iter().map(|p| Circle::new(*p, 4, color.filled())))
            .map_err(render_err)?
            .label(panel.label)
            .legend(legend_swatch(color));
    } else {
        chart
            .draw_series(LineSeries::new(points, color.stroke_width(2)))
            .map_err(render_err)?
            .label(panel.label)
            .legend(legend_swatch(color));
    }

    if let Some(mean_label) = panel.mean_label {
        let avg = mean(&finite);
        let step = (x_max / 40.0).max(f64::EPSILON);
        // Dashes: every other step-wide segment
        let dashes = (0..40).step_by(2).map(move |i| {
            let start = i as f64 * step;
            PathElement::new(
                vec![(start, avg), ((start + step).min(x_max), avg)],
                AVERAGE.stroke_width(2),
            )
        });
        chart
            .draw_series(dashes)
            .map_err(render_err)?
            .label(mean_label)
            .legend(legend_swatch(AVERAGE));
    }

    chart
        .configure_series_labels()
        .position(SeriesLabelPosition::UpperRight)
        .background_style(WHITE.mix(0.85))
        .border_style(BORDER)
        .label_font((FONT, 13))
        .draw()
        .map_err(render_err)?;

    Ok(())
}

fn activity_panel<'a>(title: &'a str, series: &'a MotionSeries) -> Panel<'a> {
    Panel {
        title,
        x_desc: "Sample index",
        y_desc: "Movement score",
        values: &series.velocities,
        color: ACTIVITY,
        label: "How much the screen changes",
        mean_label: None,
    }
}

fn timing_panel<'a>(title: &'a str, series: &'a MotionSeries) -> Panel<'a> {
    Panel {
        title,
        x_desc: "Frame index",
        y_desc: "Milliseconds between frames",
        values: &series.frame_intervals_ms,
        color: INTERVAL,
        label: "Time between frames (ms)",
        mean_label: Some("Average timing"),
    }
}

/// Render into a fresh white canvas and hand back the pixels
fn render<F>(size: (u32, u32), draw: F) -> Result<RgbImage, DashboardError>
where
    F: FnOnce(&Area) -> Result<(), DashboardError>,
{
    ensure_font();
    let (width, height) = size;
    let mut buf = vec![0u8; width as usize * height as usize * 3];
    {
        let root = BitMapBackend::with_buffer(&mut buf, size).into_drawing_area();
        root.fill(&WHITE).map_err(render_err)?;
        draw(&root)?;
        root.present().map_err(render_err)?;
    }
    RgbImage::from_raw(width, height, buf)
        .ok_or_else(|| DashboardError::Render("canvas size mismatch".to_string()))
}

/// Dashboard for one video: activity on top, frame timing below
pub fn render_video_dashboard(
    report: &ScrollReport,
    series: &MotionSeries,
) -> Result<RgbImage, DashboardError> {
    let title = format!(
        "Scroll smoothness: {} (jerkiness {:.2}, jitter {:.2} ms, {:.1} FPS)",
        report.smoothness_rating,
        report.scroll_jerkiness,
        report.frame_time_jitter_ms,
        report.estimated_fps
    );

    render(VIDEO_DASHBOARD_SIZE, |root| {
        let body = root.titled(&title, (FONT, 22)).map_err(render_err)?;
        let panels = body.split_evenly((2, 1));
        draw_panel(
            &panels[0],
            &activity_panel("Scroll activity over time (higher = more movement)", series),
        )?;
        draw_panel(
            &panels[1],
            &timing_panel("Frame timing stability (flatter line = smoother)", series),
        )
    })
}

fn better(winner: Winner, side: Winner) -> &'static str {
    if winner == side {
        " (BETTER)"
    } else {
        ""
    }
}

/// Text lines of one column of the summary panel, with highlight flags
pub fn summary_lines(
    summary: &VideoSummary,
    side: Winner,
    comparison: &ComparisonReport,
) -> Vec<(String, bool)> {
    let results = &comparison.results;
    let label = if side == Winner::Video1 { "Video 1" } else { "Video 2" };
    let overall = results.overall_winner == side;

    vec![
        (format!("{}: {}", label, summary.name), overall),
        (
            format!(
                "Rating: {}{}",
                summary.rating,
                if overall { " (WINNER)" } else { "" }
            ),
            overall,
        ),
        (
            format!(
                "Jerkiness: {:.2}{}",
                summary.jerkiness,
                better(results.better_jerkiness, side)
            ),
            results.better_jerkiness == side,
        ),
        (
            format!(
                "Jitter: {:.2} ms{}",
                summary.jitter_ms,
                better(results.better_jitter, side)
            ),
            results.better_jitter == side,
        ),
        (
            format!(
                "Estimated FPS: {:.1}{}",
                summary.estimated_fps,
                better(results.better_fps, side)
            ),
            results.better_fps == side,
        ),
    ]
}

/// Closing line of the summary panel
pub fn overall_line(comparison: &ComparisonReport) -> String {
    match comparison.results.overall_winner {
        Winner::Video1 => format!("Overall Winner: Video 1 ({})", comparison.video1.name),
        Winner::Video2 => format!("Overall Winner: Video 2 ({})", comparison.video2.name),
        Winner::Tie => "Overall Winner: Tie".to_string(),
    }
}

fn draw_summary(area: &Area, comparison: &ComparisonReport) -> Result<(), DashboardError> {
    area.fill(&SUMMARY_BG).map_err(render_err)?;
    let (w, h) = area.dim_in_pixel();
    let (w, h) = (w as i32, h as i32);
    area.draw(&Rectangle::new([(0, 0), (w - 1, h - 1)], BORDER.stroke_width(2)))
        .map_err(render_err)?;
    area.draw(&Text::new(
        "COMPARISON SUMMARY",
        (24, 14),
        (FONT, 24).into_font().color(&TEXT),
    ))
    .map_err(render_err)?;

    let columns = [
        (&comparison.video1, Winner::Video1),
        (&comparison.video2, Winner::Video2),
    ];
    for (col, (summary, side)) in columns.into_iter().enumerate() {
        let x = 24 + col as i32 * (w / 2);
        for (row, (line, highlight)) in summary_lines(summary, side, comparison)
            .into_iter()
            .enumerate()
        {
            let color = if highlight { WINNER } else { NEUTRAL };
            area.draw(&Text::new(
                line,
                (x, 56 + row as i32 * 30),
                (FONT, 19).into_font().color(&color),
            ))
            .map_err(render_err)?;
        }
    }

    let overall_color = match comparison.results.overall_winner {
        Winner::Tie => NEUTRAL,
        _ => WINNER,
    };
    area.draw(&Text::new(
        overall_line(comparison),
        (24, h - 40),
        (FONT, 22).into_font().color(&overall_color),
    ))
    .map_err(render_err)?;

    Ok(())
}

/// Side-by-side dashboard for a comparison
/// DOCUMENTATION: Left column is video 1, right column is video 2. Rows are
/// activity and frame timing, followed by a summary panel with every
/// headline metric, "(BETTER)" marks and the overall winner.
pub fn render_comparison_dashboard(
    series1: &MotionSeries,
    series2: &MotionSeries,
    comparison: &ComparisonReport,
) -> Result<RgbImage, DashboardError> {
    let title1 = format!("Video 1: {} - Activity Over Time", comparison.video1.name);
    let title2 = format!("Video 2: {} - Activity Over Time", comparison.video2.name);

    render(COMPARISON_DASHBOARD_SIZE, |root| {
        let (charts, summary) =
            root.split_vertically(COMPARISON_DASHBOARD_SIZE.1 - SUMMARY_HEIGHT);
        let cells = charts.split_evenly((2, 2));

        draw_panel(&cells[0], &activity_panel(&title1, series1))?;
        draw_panel(&cells[1], &activity_panel(&title2, series2))?;
        draw_panel(&cells[2], &timing_panel("Frame Timing Stability", series1))?;
        draw_panel(&cells[3], &timing_panel("Frame Timing Stability", series2))?;

        draw_summary(&summary.margin(8, 8, 8, 8), comparison)
    })
}

/// Encode a dashboard as PNG
pub fn save_png(img: &RgbImage, path: &Path) -> Result<(), DashboardError> {
    img.save_with_format(path, image::ImageFormat::Png)?;
    log::debug!("Dashboard saved to {}", path.display());
    Ok(())
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::models::{ComparisonResults, FrameEvents, SmoothnessRating};
    use image::Rgb;

    fn series(velocities: Vec<f64>, intervals: Vec<f64>) -> MotionSeries {
        MotionSeries {
            velocities,
            frame_intervals_ms: intervals,
            ..MotionSeries::default()
        }
    }

    fn report() -> ScrollReport {
        ScrollReport {
            frames_processed: 3,
            frames_decoded: 3,
            average_scroll_activity: 2.0,
            scroll_jerkiness: 1.0,
            frame_time_jitter_ms: 2.0,
            estimated_fps: 60.0,
            mean_frame_interval_ms: 16.7,
            frame_skip: 1,
            max_frames: 100,
            smoothness_rating: SmoothnessRating::Excellent,
            smoothness_description: String::new(),
            summary: String::new(),
            issues: Vec::new(),
            problem_windows: Vec::new(),
            frame_events: FrameEvents::default(),
            video_path: "v.mp4".to_string(),
            analyzed_at: String::new(),
        }
    }

    fn summary(name: &str, jerkiness: f64, jitter_ms: f64, estimated_fps: f64) -> VideoSummary {
        VideoSummary {
            path: "p".to_string(),
            name: name.to_string(),
            rating: SmoothnessRating::Good,
            activity_score: 1.0,
            jerkiness,
            jitter_ms,
            estimated_fps,
        }
    }

    fn comparison(overall: Winner, fps: Winner) -> ComparisonReport {
        ComparisonReport {
            video1: summary("fast.mp4", 1.0, 2.0, 60.0),
            video2: summary("slow.mp4", 3.0, 9.0, 45.0),
            results: ComparisonResults {
                overall_winner: overall,
                better_jerkiness: Winner::Video1,
                better_jitter: Winner::Video1,
                better_fps: fps,
            },
        }
    }

    fn contains(img: &RgbImage, color: RGBColor) -> bool {
        let RGBColor(r, g, b) = color;
        img.pixels().any(|p| *p == Rgb([r, g, b]))
    }

    #[test]
    fn test_video_dashboard_draws_both_series() {
        let img = render_video_dashboard(
            &report(),
            &series(vec![1.0, 4.0, 2.0], vec![16.0, 17.0, 33.0]),
        )
        .unwrap();
        assert_eq!(img.dimensions(), VIDEO_DASHBOARD_SIZE);
        // Legend swatches are solid fills
        assert!(contains(&img, ACTIVITY));
        assert!(contains(&img, INTERVAL));
        assert!(contains(&img, AVERAGE));
    }

    #[test]
    fn test_empty_series_draws_empty_panels() {
        let img = render_video_dashboard(&report(), &MotionSeries::default()).unwrap();
        assert!(!contains(&img, ACTIVITY));
        assert!(contains(&img, EMPTY));
    }

    #[test]
    fn test_single_sample_is_drawn() {
        let img = render_video_dashboard(&report(), &series(vec![3.0], vec![])).unwrap();
        assert!(contains(&img, ACTIVITY));
    }

    #[test]
    fn test_summary_lines_mark_better_metrics() {
        let cmp = comparison(Winner::Video1, Winner::Video2);

        let left = summary_lines(&cmp.video1, Winner::Video1, &cmp);
        assert_eq!(left[0], ("Video 1: fast.mp4".to_string(), true));
        assert_eq!(left[1].0, "Rating: Good (WINNER)");
        assert_eq!(left[2], ("Jerkiness: 1.00 (BETTER)".to_string(), true));
        assert_eq!(left[3].0, "Jitter: 2.00 ms (BETTER)");
        assert_eq!(left[4], ("Estimated FPS: 60.0".to_string(), false));

        let right = summary_lines(&cmp.video2, Winner::Video2, &cmp);
        assert_eq!(right[1].0, "Rating: Good");
        assert_eq!(right[2].0, "Jerkiness: 3.00");
        assert_eq!(right[4], ("Estimated FPS: 45.0 (BETTER)".to_string(), true));
    }

    #[test]
    fn test_overall_line() {
        assert_eq!(
            overall_line(&comparison(Winner::Video2, Winner::Tie)),
            "Overall Winner: Video 2 (slow.mp4)"
        );
        assert_eq!(
            overall_line(&comparison(Winner::Tie, Winner::Tie)),
            "Overall Winner: Tie"
        );
    }

    #[test]
    fn test_comparison_dashboard_has_summary_panel() {
        let s = series(vec![1.0, 2.0], vec![16.0, 16.0]);
        let img =
            render_comparison_dashboard(&s, &s, &comparison(Winner::Video1, Winner::Video1))
                .unwrap();

        assert_eq!(img.dimensions(), COMPARISON_DASHBOARD_SIZE);
        assert!(contains(&img, SUMMARY_BG));
        assert!(contains(&img, ACTIVITY));
        let (w, h) = COMPARISON_DASHBOARD_SIZE;
        let RGBColor(r, g, b) = SUMMARY_BG;
        assert_eq!(*img.get_pixel(w - 30, h - 20), Rgb([r, g, b]));
    }

    #[test]
    fn test_save_png() {
        let dir = tempfile::tempdir().unwrap();
        let path = dir.path().join("dash.png");
        let img = render_video_dashboard(&report(), &series(vec![1.0], vec![])).unwrap();
        save_png(&img, &path).unwrap();

        let decoded = image::open(&path).unwrap();
        assert_eq!(decoded.width(), VIDEO_DASHBOARD_SIZE.0);
    }
}
