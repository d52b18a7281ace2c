// src/services/events.rs
// DOCUMENTATION: Changed-pixel event detection
// PURPOSE: Flag lag, flicker and jerk moments between analysed frames

use crate::models::FrameEvents;

/// Classifies changed-pixel ratios into frame events
#[derive(Debug, Clone)]
pub struct FrameEventDetector {
    /// Ratio below which the screen is considered frozen
    pub lag_below: f64,
    /// Ratio above which the whole screen is considered to flash
    pub flicker_above: f64,
    /// Ratio above which a change counts as a sudden jump
    pub jerk_above: f64,
    events: FrameEvents,
}

impl Default for FrameEventDetector {
    fn default() -> Self {
        Self {
            lag_below: 0.005,
            flicker_above: 0.2,
            jerk_above: 0.1,
            events: FrameEvents::default(),
        }
    }
}

impl FrameEventDetector {
    pub fn new() -> Self {
        Self::default()
    }

    /// Record the ratio measured between sample `index - 1` and `index`
    pub fn record(&mut self, index: usize, changed_ratio: f64) {
        if changed_ratio > self.flicker_above {
            self.events.flicker.push(index);
        }
        if changed_ratio < self.lag_below {
            self.events.lag.push(index);
        }
        if changed_ratio > self.jerk_above {
            self.events.jerk.push(index);
        }
    }

    pub fn finish(self) -> FrameEvents {
        self.events
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_classification() {
        let mut detector = FrameEventDetector::new();
        detector.record(1, 0.0);
        detector.record(2, 0.05);
        detector.record(3, 0.15);
        detector.record(4, 0.5);

        let events = detector.finish();
        assert_eq!(events.lag, vec![1]);
        assert_eq!(events.jerk, vec![3, 4]);
        // A flicker is always also a jerk
        assert_eq!(events.flicker, vec![4]);
    }
}
