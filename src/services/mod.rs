// src/services/mod.rs
// DOCUMENTATION: Services module organization
// PURPOSE: Re-export service components

pub mod charts;
pub mod compare_service;
pub mod comparison;
pub mod events;
pub mod ffmpeg;
pub mod frame_source;
pub mod motion;
pub mod scroll_analyzer;
pub mod storage;

pub use compare_service::{CompareService, UploadedVideo};
pub use ffmpeg::FfmpegTools;
pub use storage::{start_cleanup_task, UploadStore};
