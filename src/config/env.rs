// src/config/env.rs
// DOCUMENTATION: Environment variable management
// PURPOSE: Load and validate configuration from .env files

use dotenv::dotenv;
use std::env;
use std::path::PathBuf;
use std::str::FromStr;

/// Application configuration loaded from environment variables
/// DOCUMENTATION: Centralizes all configuration in one struct
/// Load with Config::from_env() at application startup
#[derive(Debug, Clone)]
pub struct Config {
    /// Server bind address (e.g., "127.0.0.1")
    pub server_address: String,

    /// Server listen port (default 5000)
    pub server_port: u16,

    /// Environment: development, staging, production
    pub environment: String,

    /// Log level: debug, info, warn, error
    pub log_level: String,

    /// Root directory for uploaded videos and generated artifacts
    pub upload_dir: PathBuf,

    /// Per-file upload limit in bytes
    pub max_upload_bytes: u64,

    /// ffmpeg executable used to decode frames
    pub ffmpeg_path: PathBuf,

    /// ffprobe executable used to read stream metadata and timestamps
    pub ffprobe_path: PathBuf,

    /// Analyse one decoded frame out of every `frame_skip`
    pub frame_skip: usize,

    /// Upper bound on analysed frames per video
    pub max_frames: usize,

    /// Height in rows of each motion block
    pub block_size: u32,

    /// Comparisons allowed to run at the same time
    pub max_concurrent_analyses: usize,

    /// Accepted compare requests per minute (0 disables the limiter)
    pub compare_rate_per_minute: u32,

    /// Session directories older than this are swept (0 disables the sweep)
    pub upload_retention_hours: u64,

    /// Seconds between retention sweeps
    pub cleanup_interval_secs: u64,
}

impl Default for Config {
    fn default() -> Self {
        Config {
            server_address: "127.0.0.1".to_string(),
            server_port: 5000,
            environment: "development".to_string(),
            log_level: "info".to_string(),
            upload_dir: PathBuf::from("uploads"),
            max_upload_bytes: 500 * 1024 * 1024,
            ffmpeg_path: PathBuf::from("ffmpeg"),
            ffprobe_path: PathBuf::from("ffprobe"),
            frame_skip: 5,
            max_frames: 2000,
            block_size: 32,
            max_concurrent_analyses: 2,
            compare_rate_per_minute: 30,
            upload_retention_hours: 24,
            cleanup_interval_secs: 600,
        }
    }
}

impl Config {
    /// Load configuration from environment variables
    /// DOCUMENTATION: Reads from .env or process environment
    /// Called once at application startup
    pub fn from_env() -> Self {
        // Load .env file if it exists
        dotenv().ok();

        let defaults = Config::default();

        // SERVER_PORT wins over the PORT convention used by hosting platforms
        let server_port = env::var("SERVER_PORT")
            .or_else(|_| env::var("PORT"))
            .ok()
            .and_then(|v| v.parse().ok())
            .unwrap_or(defaults.server_port);

        Config {
            server_address: env::var("SERVER_ADDRESS").unwrap_or(defaults.server_address),

            server_port,

            environment: env::var("ENVIRONMENT").unwrap_or(defaults.environment),

            log_level: env::var("LOG_LEVEL").unwrap_or(defaults.log_level),

            upload_dir: env::var("UPLOAD_DIR")
                .map(PathBuf::from)
                .unwrap_or(defaults.upload_dir),

            max_upload_bytes: megabytes(parse_var("MAX_UPLOAD_MB", 500u64)),

            ffmpeg_path: env::var("FFMPEG_PATH")
                .map(PathBuf::from)
                .unwrap_or(defaults.ffmpeg_path),

            ffprobe_path: env::var("FFPROBE_PATH")
                .map(PathBuf::from)
                .unwrap_or(defaults.ffprobe_path),

            frame_skip: parse_var("FRAME_SKIP", defaults.frame_skip),

            max_frames: parse_var("MAX_FRAMES", defaults.max_frames),

            block_size: parse_var("BLOCK_SIZE", defaults.block_size),

            max_concurrent_analyses: parse_var(
                "MAX_CONCURRENT_ANALYSES",
                defaults.max_concurrent_analyses,
            ),

            compare_rate_per_minute: parse_var(
                "COMPARE_RATE_PER_MINUTE",
                defaults.compare_rate_per_minute,
            ),

            upload_retention_hours: parse_var(
                "UPLOAD_RETENTION_HOURS",
                defaults.upload_retention_hours,
            ),

            cleanup_interval_secs: parse_var("CLEANUP_INTERVAL_SECS", defaults.cleanup_interval_secs),
        }
    }

    /// Validate critical configuration
    /// DOCUMENTATION: Ensures application can start safely
    pub fn validate(&self) -> Result<(), String> {
        if self.upload_dir.as_os_str().is_empty() {
            return Err("UPLOAD_DIR must not be empty".to_string());
        }

        if self.frame_skip == 0 {
            return Err("FRAME_SKIP must be at least 1".to_string());
        }

        if self.max_frames == 0 {
            return Err("MAX_FRAMES must be at least 1".to_string());
        }

        if self.block_size == 0 {
            return Err("BLOCK_SIZE must be at least 1".to_string());
        }

        if self.max_upload_bytes == 0 {
            return Err("MAX_UPLOAD_MB must be at least 1".to_string());
        }

        if self.max_concurrent_analyses == 0 {
            log::warn!("MAX_CONCURRENT_ANALYSES is 0 - using 1");
        }

        if self.compare_rate_per_minute == 0 {
            log::warn!("COMPARE_RATE_PER_MINUTE is 0 - compare requests are not rate limited");
        }

        Ok(())
    }
}

fn parse_var<T: FromStr>(name: &str, default: T) -> T {
    env::var(name)
        .ok()
        .and_then(|v| v.trim().parse().ok())
        .unwrap_or(default)
}

/// Megabytes to bytes, saturating for absurdly large settings
fn megabytes(mb: u64) -> u64 {
    mb.saturating_mul(1024 * 1024)
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_defaults_are_valid() {
        let config = Config::default();
        assert!(config.validate().is_ok());
        assert_eq!(config.server_port, 5000);
        assert_eq!(config.max_upload_bytes, 500 * 1024 * 1024);
    }

    #[test]
    fn test_zero_frame_skip_rejected() {
        let config = Config {
            frame_skip: 0,
            ..Config::default()
        };
        assert!(config.validate().is_err());
    }

    #[test]
    fn test_upload_limit_saturates() {
        assert_eq!(megabytes(500), 500 * 1024 * 1024);
        assert_eq!(megabytes(u64::MAX), u64::MAX);
        assert_eq!(megabytes(u64::MAX / 1024), u64::MAX);
    }

    #[test]
    fn test_parse_var_falls_back_on_garbage() {
        env::set_var("SCROLL_DASHBOARD_TEST_PARSE", "not-a-number");
        assert_eq!(parse_var("SCROLL_DASHBOARD_TEST_PARSE", 7usize), 7);
        env::remove_var("SCROLL_DASHBOARD_TEST_PARSE");
    }
}
