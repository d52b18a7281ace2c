// src/services/motion.rs
// DOCUMENTATION: Frame-to-frame motion measurements and basic statistics
// PURPOSE: Pure numeric building blocks for the scroll analyzer

use image::imageops::{self, FilterType};
use image::GrayImage;

/// Luma difference above which a pixel counts as changed
pub const CHANGED_PIXEL_THRESHOLD: u8 = 20;

/// Arithmetic mean; 0 for an empty slice
pub fn mean(values: &[f64]) -> f64 {
    if values.is_empty() {
        return 0.0;
    }
    values.iter().sum::<f64>() / values.len() as f64
}

/// Population standard deviation; 0 for an empty slice
pub fn std_dev(values: &[f64]) -> f64 {
    if values.is_empty() {
        return 0.0;
    }
    let m = mean(values);
    let variance = values.iter().map(|v| (v - m).powi(2)).sum::<f64>() / values.len() as f64;
    variance.sqrt()
}

/// Bring `frame` to the reference dimensions if it differs
pub fn match_dimensions(frame: GrayImage, width: u32, height: u32) -> GrayImage {
    if frame.dimensions() == (width, height) {
        frame
    } else {
        imageops::resize(&frame, width, height, FilterType::Triangle)
    }
}

/// Block-based activity score between two frames of equal size
/// DOCUMENTATION: The frame is cut into full-width bands of `block_size` rows.
/// Each band contributes its mean absolute luma difference; the score is the
/// mean over bands. A trailing partial band is ignored unless the frame is
/// shorter than one band, in which case the whole frame is one band.
pub fn block_activity(prev: &GrayImage, current: &GrayImage, block_size: u32) -> f64 {
    debug_assert_eq!(prev.dimensions(), current.dimensions());

    let (width, height) = current.dimensions();
    if width == 0 || height == 0 {
        return 0.0;
    }

    let block_size = block_size.max(1);
    let band_rows = if height < block_size {
        height
    } else {
        block_size
    };
    let bands = (height / band_rows) as usize;
    let row_len = width as usize;

    let prev_raw = prev.as_raw();
    let curr_raw = current.as_raw();

    let mut band_means = Vec::with_capacity(bands);
    for band in 0..bands {
        let start = band * band_rows as usize * row_len;
        let end = start + band_rows as usize * row_len;
        let total: u64 = prev_raw[start..end]
            .iter()
            .zip(&curr_raw[start..end])
            .map(|(a, b)| a.abs_diff(*b) as u64)
            .sum();
        band_means.push(total as f64 / (end - start) as f64);
    }

    mean(&band_means)
}

/// Fraction of pixels whose luma changed by more than the threshold
pub fn changed_ratio(prev: &GrayImage, current: &GrayImage) -> f64 {
    debug_assert_eq!(prev.dimensions(), current.dimensions());

    let total = current.as_raw().len();
    if total == 0 {
        return 0.0;
    }

    let changed = prev
        .as_raw()
        .iter()
        .zip(current.as_raw())
        .filter(|(a, b)| a.abs_diff(**b) > CHANGED_PIXEL_THRESHOLD)
        .count();

    changed as f64 / total as f64
}

/// Contiguous runs of `true` at least `min_len` long, as inclusive index ranges
pub fn ranges_from_mask(mask: &[bool], min_len: usize) -> Vec<(usize, usize)> {
    let mut ranges = Vec::new();
    let mut start: Option<usize> = None;

    for (i, &flag) in mask.iter().enumerate() {
        match (flag, start) {
            (true, None) => start = Some(i),
            (false, Some(s)) => {
                if i - s >= min_len {
                    ranges.push((s, i - 1));
                }
                start = None;
            }
            _ => {}
        }
    }

    if let Some(s) = start {
        if mask.len() - s >= min_len {
            ranges.push((s, mask.len() - 1));
        }
    }

    ranges
}
