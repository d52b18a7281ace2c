// src/services/ffmpeg.rs
// DOCUMENTATION: ffmpeg/ffprobe process wrapper
// PURPOSE: Inspect video streams and stream raw luma frames into the analyzer

use crate::config::Config;
use crate::errors::DashboardError;
use crate::services::frame_source::{Frame, FrameSource};
use image::GrayImage;
use serde::{Deserialize, Serialize};
use std::io::{BufReader, ErrorKind, Read};
use std::path::{Path, PathBuf};
use std::process::{Child, ChildStdout, Command, Stdio};
use std::thread::JoinHandle;

/// Metadata of the first video stream
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct StreamInfo {
    pub width: u32,
    pub height: u32,
    pub framerate: f64,
    pub codec: String,
}

/// Locations of the ffmpeg and ffprobe executables
#[derive(Debug, Clone)]
pub struct FfmpegTools {
    ffmpeg_path: PathBuf,
    ffprobe_path: PathBuf,
}

impl FfmpegTools {
    pub fn new(ffmpeg_path: impl Into<PathBuf>, ffprobe_path: impl Into<PathBuf>) -> Self {
        Self {
            ffmpeg_path: ffmpeg_path.into(),
            ffprobe_path: ffprobe_path.into(),
        }
    }

    pub fn from_config(config: &Config) -> Self {
        Self::new(config.ffmpeg_path.clone(), config.ffprobe_path.clone())
    }

    /// Verify both executables can be started
    pub fn check(&self) -> Result<(), DashboardError> {
        for tool in [&self.ffmpeg_path, &self.ffprobe_path] {
            let output = Command::new(tool)
                .arg("-version")
                .stdout(Stdio::null())
                .stderr(Stdio::null())
                .status()
                .map_err(|e| {
                    DashboardError::Internal(format!("{} not runnable: {}", tool.display(), e))
                })?;

            if !output.success() {
                return Err(DashboardError::Internal(format!(
                    "{} -version exited with {}",
                    tool.display(),
                    output
                )));
            }
        }
        Ok(())
    }

    /// Get video stream information using ffprobe
    pub fn stream_info(&self, input: &Path) -> Result<StreamInfo, DashboardError> {
        let output = Command::new(&self.ffprobe_path)
            .args([
                "-v",
                "error",
                "-select_streams",
                "v:0",
                "-show_entries",
                "stream=width,height,codec_name,r_frame_rate,avg_frame_rate",
                "-of",
                "json",
            ])
            .arg(input)
            .output()
            .map_err(|e| DashboardError::VideoDecode(format!("failed to execute ffprobe: {}", e)))?;

        if !output.status.success() {
            return Err(DashboardError::VideoDecode(format!(
                "{}: {}",
                input.display(),
                String::from_utf8_lossy(&output.stderr).trim()
            )));
        }

        let json: serde_json::Value = serde_json::from_slice(&output.stdout)
            .map_err(|e| DashboardError::VideoDecode(format!("unreadable ffprobe output: {}", e)))?;

        let stream = json["streams"]
            .as_array()
            .and_then(|s| s.first())
            .ok_or_else(|| {
                DashboardError::VideoDecode(format!("{}: no video stream found", input.display()))
            })?;

        let width = stream["width"].as_u64().unwrap_or(0) as u32;
        let height = stream["height"].as_u64().unwrap_or(0) as u32;
        if width == 0 || height == 0 {
            return Err(DashboardError::VideoDecode(format!(
                "{}: video stream has no dimensions",
                input.display()
            )));
        }

        let framerate = parse_framerate(
            stream["avg_frame_rate"]
                .as_str()
                .filter(|r| *r != "0/0")
                .or_else(|| stream["r_frame_rate"].as_str())
                .unwrap_or("0"),
        );

        Ok(StreamInfo {
            width,
            height,
            framerate,
            codec: stream["codec_name"]
                .as_str()
                .unwrap_or("unknown")
                .to_string(),
        })
    }

    /// Presentation timestamps (ms) of every frame of the first video stream
    pub fn frame_timestamps(&self, input: &Path, framerate: f64) -> Result<Vec<f64>, DashboardError> {
        let output = Command::new(&self.ffprobe_path)
            .args([
                "-v",
                "error",
                "-select_streams",
                "v:0",
                "-show_entries",
                "frame=best_effort_timestamp_time",
                "-of",
                "csv=p=0",
            ])
            .arg(input)
            .output()
            .map_err(|e| DashboardError::VideoDecode(format!("failed to execute ffprobe: {}", e)))?;

        if !output.status.success() {
            return Err(DashboardError::VideoDecode(format!(
                "{}: {}",
                input.display(),
                String::from_utf8_lossy(&output.stderr).trim()
            )));
        }

        let nominal_ms = if framerate > 0.0 { 1000.0 / framerate } else { 0.0 };
        Ok(parse_timestamps(
            &String::from_utf8_lossy(&output.stdout),
            nominal_ms,
        ))
    }
}

/// Parse "30000/1001" or "30" into frames per second
pub fn parse_framerate(fps_str: &str) -> f64 {
    if let Some((num, den)) = fps_str.split_once('/') {
        let num: f64 = num.trim().parse().unwrap_or(0.0);
        let den: f64 = den.trim().parse().unwrap_or(0.0);
        if den != 0.0 {
            return num / den;
        }
        return 0.0;
    }
    fps_str.trim().parse().unwrap_or(0.0)
}

/// Parse ffprobe csv timestamps (seconds) into milliseconds
/// DOCUMENTATION: Frames without a timestamp ("N/A") are placed one nominal
/// frame duration after their predecessor
pub fn parse_timestamps(csv: &str, nominal_ms: f64) -> Vec<f64> {
    let mut timestamps: Vec<f64> = Vec::new();

    for line in csv.lines() {
        let field = line.split(',').next().unwrap_or("").trim();
        if field.is_empty() {
            continue;
        }

        let ts = match field.parse::<f64>() {
            Ok(seconds) => seconds * 1000.0,
            Err(_) => timestamps.last().map(|prev| prev + nominal_ms).unwrap_or(0.0),
        };
        timestamps.push(ts);
    }

    timestamps
}

/// Streaming frame decoder backed by an ffmpeg child process
/// DOCUMENTATION: Frames arrive as raw 8-bit gray planes on stdout; stderr
/// is collected on a helper thread and reported if ffmpeg exits non-zero.
/// Dropping the decoder kills the child, so callers may stop early.
pub struct FfmpegDecoder {
    child: Child,
    stdout: BufReader<ChildStdout>,
    stderr: Option<JoinHandle<String>>,
    width: u32,
    height: u32,
    timestamps: Vec<f64>,
    next_index: usize,
    finished: bool,
}

impl FfmpegDecoder {
    /// Read stream metadata and start decoding
    pub fn open(tools: &FfmpegTools, input: &Path) -> Result<Self, DashboardError> {
        if !input.is_file() {
            return Err(DashboardError::VideoDecode(format!(
                "{}: file does not exist",
                input.display()
            )));
        }

        let info = tools.stream_info(input)?;
        let timestamps = tools.frame_timestamps(input, info.framerate)?;

        log::debug!(
            "Opened {} ({}x{}, {:.2} fps, {}, {} frames)",
            input.display(),
            info.width,
            info.height,
            info.framerate,
            info.codec,
            timestamps.len()
        );

        let mut child = Command::new(&tools.ffmpeg_path)
            .args(["-v", "error", "-nostdin", "-noautorotate", "-i"])
            .arg(input)
            .args([
                "-map",
                "0:v:0",
                "-fps_mode",
                "passthrough",
                "-f",
                "rawvideo",
                "-pix_fmt",
                "gray",
                "-",
            ])
            .stdin(Stdio::null())
            .stdout(Stdio::piped())
            .stderr(Stdio::piped())
            .spawn()
            .map_err(|e| DashboardError::VideoDecode(format!("failed to execute ffmpeg: {}", e)))?;

        let stdout = child
            .stdout
            .take()
            .ok_or_else(|| DashboardError::Internal("ffmpeg stdout not captured".to_string()))?;
        let stderr = child.stderr.take().map(|mut pipe| {
            std::thread::spawn(move || {
                let mut text = String::new();
                let _ = pipe.read_to_string(&mut text);
                text
            })
        });

        Ok(Self {
            child,
            stdout: BufReader::with_capacity(1 << 20, stdout),
            stderr,
            width: info.width,
            height: info.height,
            timestamps,
            next_index: 0,
            finished: false,
        })
    }

    fn frame_len(&self) -> usize {
        self.width as usize * self.height as usize
    }

    /// Reap the child once stdout is exhausted
    fn finish(&mut self) -> Result<(), DashboardError> {
        let status = self
            .child
            .wait()
            .map_err(|e| DashboardError::VideoDecode(format!("waiting for ffmpeg failed: {}", e)))?;
        let stderr = self
            .stderr
            .take()
            .and_then(|handle| handle.join().ok())
            .unwrap_or_default();

        if !status.success() {
            return Err(DashboardError::VideoDecode(format!(
                "ffmpeg {} after {} frames: {}",
                status,
                self.next_index,
                stderr.trim()
            )));
        }
        Ok(())
    }
}

impl FrameSource for FfmpegDecoder {
    fn next_frame(&mut self) -> Result<Option<Frame>, DashboardError> {
        if self.finished {
            return Ok(None);
        }

        let Some(&timestamp_ms) = self.timestamps.get(self.next_index) else {
            self.finished = true;
            return Ok(None);
        };

        let mut buf = vec![0u8; self.frame_len()];
        match self.stdout.read_exact(&mut buf) {
            Ok(()) => {}
            Err(e) if e.kind() == ErrorKind::UnexpectedEof => {
                self.finished = true;
                self.finish()?;
                if self.timestamps.len() > self.next_index + 1 {
                    log::debug!(
                        "ffmpeg produced {} frames, ffprobe listed {}",
                        self.next_index,
                        self.timestamps.len()
                    );
                }
                return Ok(None);
            }
            Err(e) => {
                self.finished = true;
                return Err(DashboardError::VideoDecode(format!(
                    "reading frame {} failed: {}",
                    self.next_index, e
                )));
            }
        }

        let luma = GrayImage::from_raw(self.width, self.height, buf).ok_or_else(|| {
            DashboardError::Internal("frame buffer does not match dimensions".to_string())
        })?;

        let frame = Frame {
            index: self.next_index,
            timestamp_ms,
            luma,
        };
        self.next_index += 1;
        Ok(Some(frame))
    }
}

impl Drop for FfmpegDecoder {
    fn drop(&mut self) {
        // Already-exited children make kill() fail; that is fine
        let _ = self.child.kill();
        let _ = self.child.wait();
        if let Some(handle) = self.stderr.take() {
            let _ = handle.join();
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_parse_framerate() {
        assert!((parse_framerate("30000/1001") - 29.97).abs() < 0.01);
        assert_eq!(parse_framerate("60"), 60.0);
        assert_eq!(parse_framerate("0/0"), 0.0);
        assert_eq!(parse_framerate("garbage"), 0.0);
    }

    #[test]
    fn test_parse_timestamps_fills_missing() {
        let csv = "0.000000\n0.016667\nN/A\n0.050000,\n\n";
        let ts = parse_timestamps(csv, 16.0);
        assert_eq!(ts.len(), 4);
        assert_eq!(ts[0], 0.0);
        assert!((ts[1] - 16.667).abs() < 1e-9);
        assert!((ts[2] - 32.667).abs() < 1e-9);
        assert!((ts[3] - 50.0).abs() < 1e-9);
    }

    #[test]
    fn test_open_missing_file_is_decode_error() {
        let tools = FfmpegTools::new("ffmpeg", "ffprobe");
        let result = FfmpegDecoder::open(&tools, Path::new("/definitely/not/here.mp4"));
        assert!(matches!(result, Err(DashboardError::VideoDecode(_))));
    }

    /// Stand-in ffprobe reporting an 8x8 stream with four frames, and an
    /// ffmpeg running `ffmpeg_body`
    #[cfg(unix)]
    fn fake_tools(dir: &Path, ffmpeg_body: &str) -> FfmpegTools {
        use std::os::unix::fs::PermissionsExt;

        let ffprobe = "#!/bin/sh\n\
            case \"$*\" in\n\
            *csv*) printf '0.0\\n0.033\\n0.066\\n0.1\\n' ;;\n\
            *) printf '%s' '{\"streams\":[{\"width\":8,\"height\":8,\"codec_name\":\"h264\",\"r_frame_rate\":\"30/1\",\"avg_frame_rate\":\"30/1\"}]}' ;;\n\
            esac\n";
        let ffmpeg = format!("#!/bin/sh\n{}\n", ffmpeg_body);

        for (name, body) in [("ffprobe", ffprobe.to_string()), ("ffmpeg", ffmpeg)] {
            let path = dir.join(name);
            std::fs::write(&path, body).unwrap();
            std::fs::set_permissions(&path, std::fs::Permissions::from_mode(0o755)).unwrap();
        }
        FfmpegTools::new(dir.join("ffmpeg"), dir.join("ffprobe"))
    }

    #[cfg(unix)]
    #[test]
    fn test_ffmpeg_failure_is_decode_error() {
        let dir = tempfile::tempdir().unwrap();
        let video = dir.path().join("v.mp4");
        std::fs::write(&video, b"not a video").unwrap();
        let tools = fake_tools(
            dir.path(),
            "echo \"Unrecognized option 'fps_mode'.\" >&2\nexit 1",
        );

        let mut decoder = FfmpegDecoder::open(&tools, &video).unwrap();
        match decoder.next_frame() {
            Err(DashboardError::VideoDecode(msg)) => assert!(msg.contains("fps_mode"), "{}", msg),
            other => panic!("expected VideoDecode, got {:?}", other.map(|f| f.is_some())),
        }
        assert!(decoder.next_frame().unwrap().is_none());
    }

    #[cfg(unix)]
    #[test]
    fn test_ffmpeg_failure_after_some_frames() {
        let dir = tempfile::tempdir().unwrap();
        let video = dir.path().join("v.mp4");
        std::fs::write(&video, b"not a video").unwrap();
        // Two full 8x8 frames, then a crash
        let tools = fake_tools(dir.path(), "head -c 128 /dev/zero\nexit 139");

        let mut decoder = FfmpegDecoder::open(&tools, &video).unwrap();
        assert_eq!(decoder.next_frame().unwrap().unwrap().index, 0);
        assert_eq!(decoder.next_frame().unwrap().unwrap().index, 1);
        assert!(matches!(
            decoder.next_frame(),
            Err(DashboardError::VideoDecode(_))
        ));
    }

    #[cfg(unix)]
    #[test]
    fn test_clean_exit_ends_stream() {
        let dir = tempfile::tempdir().unwrap();
        let video = dir.path().join("v.mp4");
        std::fs::write(&video, b"not a video").unwrap();
        // Three of the four listed frames, then a clean exit
        let tools = fake_tools(dir.path(), "head -c 192 /dev/zero");

        let mut decoder = FfmpegDecoder::open(&tools, &video).unwrap();
        let mut frames = Vec::new();
        while let Some(frame) = decoder.next_frame().unwrap() {
            frames.push(frame);
        }
        assert_eq!(frames.len(), 3);
        assert!((frames[2].timestamp_ms - 66.0).abs() < 1e-9);
    }
}
