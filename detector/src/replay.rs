//! Synthetic replay input: a scripted fingertip trajectory and a logging
//! indicator sink, for headless runs and tests.

use tracing::info;

use crate::indicator::Indicator;
use crate::tracking::FingertipSensor;

/// Fingertip that rests, then jumps forward along z in a single tick.
#[derive(Debug, Clone)]
pub struct SyntheticTrajectory {
    /// Tick rate in Hz.
    pub rate_hz: f64,
    /// Resting position.
    pub rest: [f32; 3],
    /// Tick index at which the jump happens.
    pub tap_at: usize,
    /// Forward displacement of the jump (meters).
    pub tap_depth_m: f32,
    /// Half-open tick range during which tracking is lost.
    pub dropout: Option<(usize, usize)>,
}

impl SyntheticTrajectory {
    pub fn new(rate_hz: f64) -> Self {
        Self {
            rate_hz,
            rest: [0.0, 1.2, 0.35],
            tap_at: 99,
            tap_depth_m: 0.05,
            dropout: None,
        }
    }

    pub fn with_tap_at(mut self, tick: usize) -> Self {
        self.tap_at = tick;
        self
    }

    pub fn with_dropout(mut self, start: usize, len: usize) -> Self {
        self.dropout = Some((start, start + len));
        self
    }

    /// Sensor reading for tick `index`.
    pub fn frame(&self, index: usize) -> ReplayFrame {
        let tracked = match self.dropout {
            Some((start, end)) => !(start..end).contains(&index),
            None => true,
        };
        let mut position = self.rest;
        if index >= self.tap_at {
            position[2] += self.tap_depth_m;
        }
        ReplayFrame {
            tracked,
            position,
            now_s: index as f64 / self.rate_hz,
        }
    }
}

/// One scripted sensor reading.
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct ReplayFrame {
    pub tracked: bool,
    pub position: [f32; 3],
    pub now_s: f64,
}

impl FingertipSensor for ReplayFrame {
    fn is_tracked(&self) -> bool {
        self.tracked
    }

    fn fingertip_position(&self) -> Option<[f32; 3]> {
        self.tracked.then_some(self.position)
    }

    fn now(&self) -> f64 {
        self.now_s
    }
}

/// Indicator that logs transitions and counts pulses.
#[derive(Debug, Default)]
pub struct LoggingIndicator {
    pub visible: bool,
    pub shows: u64,
    pub hides: u64,
}

impl Indicator for LoggingIndicator {
    fn show(&mut self) {
        if !self.visible {
            info!("Showing tap indicator");
            self.shows += 1;
        }
        self.visible = true;
    }

    fn hide(&mut self) {
        if self.visible {
            info!("Hiding tap indicator");
            self.hides += 1;
        }
        self.visible = false;
    }
}
