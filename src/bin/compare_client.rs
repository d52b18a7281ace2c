// src/bin/compare_client.rs
// DOCUMENTATION: Command-line client for the comparison API
// PURPOSE: Upload two recordings and print the smoothness comparison
use anyhow::{bail, Context, Result};
use clap::Parser;
use dotenv::dotenv;
use reqwest::multipart::{Form, Part};
use reqwest::Client;
use serde::Deserialize;
use std::path::{Path, PathBuf};
use std::process;
use std::time::{Duration, Instant};

// --- ANSI colours ---
const RESET: &str = "\x1b[0m";
const BOLD: &str = "\x1b[1m";
const RED: &str = "\x1b[31m";
const GREEN: &str = "\x1b[32m";
const YELLOW: &str = "\x1b[33m";
const CYAN: &str = "\x1b[36m";

// --- Response shapes ---

#[derive(Deserialize, Debug)]
struct VideoSummary {
    name: String,
    rating: String,
    jerkiness: f64,
    jitter_ms: f64,
    estimated_fps: f64,
}

#[derive(Deserialize, Debug)]
struct ComparisonResults {
    overall_winner: String,
    better_jerkiness: String,
    better_jitter: String,
    better_fps: String,
}

#[derive(Deserialize, Debug)]
struct Comparison {
    video1: VideoSummary,
    video2: VideoSummary,
    results: ComparisonResults,
}

#[derive(Deserialize, Debug)]
struct CompareResponse {
    session_id: String,
    comparison: Comparison,
    dashboard_image: String,
    video1_analysis: String,
    video2_analysis: String,
}

/// Compare the scroll smoothness of two screen recordings
#[derive(Parser, Debug)]
#[command(name = "compare_client", version)]
#[command(about = "Upload two recordings to a scroll-dashboard server and print the comparison")]
struct Args {
    /// First recording
    video1: PathBuf,

    /// Second recording
    video2: PathBuf,

    /// Base URL of the dashboard server
    #[arg(short, long, env = "SCROLL_DASHBOARD_URL", default_value = "http://localhost:5000")]
    server: String,

    /// Session ID to store results under (generated by the server if omitted)
    #[arg(long)]
    session: Option<String>,
}

impl Args {
    fn base_url(&self) -> &str {
        self.server.trim_end_matches('/')
    }
}

async fn file_part(path: &Path) -> Result<Part> {
    let bytes = tokio::fs::read(path)
        .await
        .with_context(|| format!("Failed to read {}", path.display()))?;
    let name = path
        .file_name()
        .map(|n| n.to_string_lossy().into_owned())
        .unwrap_or_else(|| "video.mp4".to_string());

    Ok(Part::bytes(bytes).file_name(name))
}

fn winner_label(winner: &str, summary1: &VideoSummary, summary2: &VideoSummary) -> String {
    match winner {
        "Video 1" => format!("{}{}{}", GREEN, summary1.name, RESET),
        "Video 2" => format!("{}{}{}", GREEN, summary2.name, RESET),
        _ => format!("{}tie{}", YELLOW, RESET),
    }
}

fn print_report(server: &str, resp: &CompareResponse) {
    let cmp = &resp.comparison;

    println!("{}╔══════════════════════════════════════════════════════════════╗{}", CYAN, RESET);
    println!("{}║   Scroll Smoothness Comparison                               ║{}", CYAN, RESET);
    println!("{}╚══════════════════════════════════════════════════════════════╝{}", CYAN, RESET);
    println!("Session: {}\n", resp.session_id);

    println!(
        "{:<16} {:>24} {:>24}",
        "Metric", cmp.video1.name, cmp.video2.name
    );
    println!("──────────────────────────────────────────────────────────────────");
    println!("{:<16} {:>24} {:>24}", "Rating", cmp.video1.rating, cmp.video2.rating);
    println!(
        "{:<16} {:>24.2} {:>24.2}",
        "Jerkiness", cmp.video1.jerkiness, cmp.video2.jerkiness
    );
    println!(
        "{:<16} {:>21.2} ms {:>21.2} ms",
        "Jitter", cmp.video1.jitter_ms, cmp.video2.jitter_ms
    );
    println!(
        "{:<16} {:>24.1} {:>24.1}",
        "Estimated FPS", cmp.video1.estimated_fps, cmp.video2.estimated_fps
    );
    println!("──────────────────────────────────────────────────────────────────");

    let r = &cmp.results;
    println!("Smoother motion:  {}", winner_label(&r.better_jerkiness, &cmp.video1, &cmp.video2));
    println!("Steadier timing:  {}", winner_label(&r.better_jitter, &cmp.video1, &cmp.video2));
    println!("Higher FPS:       {}", winner_label(&r.better_fps, &cmp.video1, &cmp.video2));
    println!(
        "\n{}Overall winner: {}{}",
        BOLD,
        winner_label(&r.overall_winner, &cmp.video1, &cmp.video2),
        RESET
    );

    println!("\n{}Dashboards:{}", BOLD, RESET);
    println!("  • Comparison: {}{}", server, resp.dashboard_image);
    println!("  • Video 1:    {}{}", server, resp.video1_analysis);
    println!("  • Video 2:    {}{}", server, resp.video2_analysis);
}

async fn run(args: Args) -> Result<()> {
    let client = Client::builder()
        .timeout(Duration::from_secs(1800))
        .build()
        .context("Failed to create HTTP client")?;

    let server = args.base_url();

    println!("{}🔍 Checking service status...{}", CYAN, RESET);
    let healthy = match client.get(format!("{}/api/status", server)).send().await {
        Ok(resp) => resp.status().is_success(),
        Err(_) => false,
    };
    if !healthy {
        bail!("Service unavailable at {}", server);
    }

    let mut form = Form::new()
        .part("video1", file_part(&args.video1).await?)
        .part("video2", file_part(&args.video2).await?);
    if let Some(session) = &args.session {
        form = form.text("session_id", session.clone());
    }

    println!("{}🚀 Uploading and analyzing...{}", CYAN, RESET);
    let start_time = Instant::now();
    let response = client
        .post(format!("{}/api/compare", server))
        .multipart(form)
        .send()
        .await
        .context("Upload failed")?;

    let status = response.status();
    if !status.is_success() {
        let body = response
            .text()
            .await
            .unwrap_or_else(|_| "Unknown error".to_string());
        bail!("HTTP {} - {}", status, body);
    }

    let resp: CompareResponse = response
        .json()
        .await
        .context("Failed to parse response JSON")?;
    println!(
        "{}✅ Done in {:.1}s{}\n",
        GREEN,
        start_time.elapsed().as_secs_f64(),
        RESET
    );

    print_report(server, &resp);
    Ok(())
}

#[tokio::main]
async fn main() {
    // Load .env first so it can supply SCROLL_DASHBOARD_URL
    dotenv().ok();
    let args = Args::parse();

    if let Err(e) = run(args).await {
        eprintln!("{}❌ {:#}{}", RED, e, RESET);
        process::exit(1);
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    use clap::CommandFactory;

    #[test]
    fn test_cli_definition() {
        Args::command().debug_assert();
    }

    #[test]
    fn test_parse_args() {
        let args = Args::try_parse_from([
            "compare_client",
            "a.mp4",
            "--server",
            "http://host:8080/",
            "b.mov",
            "--session",
            "s1",
        ])
        .unwrap();

        assert_eq!(args.video1, PathBuf::from("a.mp4"));
        assert_eq!(args.video2, PathBuf::from("b.mov"));
        assert_eq!(args.base_url(), "http://host:8080");
        assert_eq!(args.session.as_deref(), Some("s1"));
    }

    #[test]
    fn test_parse_args_errors() {
        let parse = |argv: &[&str]| {
            Args::try_parse_from(std::iter::once("compare_client").chain(argv.iter().copied()))
        };
        assert!(parse(&["a.mp4"]).is_err());
        assert!(parse(&["a.mp4", "b.mp4", "c.mp4"]).is_err());
        assert!(parse(&["a.mp4", "b.mp4", "--server"]).is_err());
        assert!(parse(&["a.mp4", "b.mp4", "--verbose"]).is_err());
    }

    #[test]
    fn test_response_parsing() {
        let body = serde_json::json!({
            "success": true,
            "session_id": "s1",
            "comparison": {
                "video1": {"path": "p1", "name": "a.mp4", "rating": "Good", "activity_score": 3.0,
                           "jerkiness": 4.0, "jitter_ms": 6.0, "estimated_fps": 58.0},
                "video2": {"path": "p2", "name": "b.mp4", "rating": "Poor", "activity_score": 3.0,
                           "jerkiness": 12.0, "jitter_ms": 20.0, "estimated_fps": 30.0},
                "results": {"overall_winner": "Video 1", "better_jerkiness": "Video 1",
                            "better_jitter": "Video 1", "better_fps": "Tie"}
            },
            "dashboard_image": "/api/image/s1/comparison/comparison_dashboard.png",
            "video1_analysis": "/api/image/s1/comparison/video1_analysis/scroll_analysis_dashboard.png",
            "video2_analysis": "/api/image/s1/comparison/video2_analysis/scroll_analysis_dashboard.png"
        });

        let resp: CompareResponse = serde_json::from_value(body).unwrap();
        assert_eq!(resp.comparison.results.better_fps, "Tie");
        assert!(winner_label("Video 1", &resp.comparison.video1, &resp.comparison.video2)
            .contains("a.mp4"));
        assert!(winner_label("Tie", &resp.comparison.video1, &resp.comparison.video2)
            .contains("tie"));
    }
}
