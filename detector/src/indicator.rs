//! Tap indicator control: threshold, debounce, and timed auto-hide.
//!
//! A crossing shows the indicator for a fixed duration.  While it is
//! visible further crossings are ignored (no re-arming), and the hide is an
//! explicit deadline checked on each tick rather than a scheduled callback.

use tracing::debug;

/// External sink for the visual pulse.  Both calls are idempotent.
pub trait Indicator {
    fn show(&mut self);
    fn hide(&mut self);
}

/// What the sink should do this tick.
#[derive(Debug, Clone, Copy, PartialEq)]
pub enum IndicatorAction {
    /// Show the indicator; it will be hidden `duration_s` later.
    ShowFor { duration_s: f64 },
    Hide,
    NoOp,
}

impl IndicatorAction {
    /// Forward the action to `sink`.
    pub fn apply(self, sink: &mut dyn Indicator) {
        match self {
            Self::ShowFor { .. } => sink.show(),
            Self::Hide => sink.hide(),
            Self::NoOp => {}
        }
    }

    pub fn as_str(&self) -> &'static str {
        match self {
            Self::ShowFor { .. } => "show",
            Self::Hide => "hide",
            Self::NoOp => "noop",
        }
    }
}

/// Indicator visibility.
#[derive(Debug, Clone, Copy, PartialEq)]
pub enum IndicatorState {
    Hidden,
    Visible { until_s: f64 },
}

/// Two-state debounce machine driving the indicator.
#[derive(Debug, Clone)]
pub struct TapEventController {
    visible_duration_s: f64,
    state: IndicatorState,
    taps: u64,
}

impl TapEventController {
    pub fn new(visible_duration_s: f64) -> Self {
        Self {
            visible_duration_s,
            state: IndicatorState::Hidden,
            taps: 0,
        }
    }

    /// Decide the indicator action for one classifier score.
    ///
    /// Strictly greater than `threshold` fires.  An expired pulse is hidden
    /// before a new one can start, so a score that stays high re-fires on
    /// the tick after the hide.
    pub fn evaluate(&mut self, confidence: f32, threshold: f32, now_s: f64) -> IndicatorAction {
        match self.state {
            IndicatorState::Hidden if confidence > threshold => {
                self.state = IndicatorState::Visible {
                    until_s: now_s + self.visible_duration_s,
                };
                self.taps += 1;
                debug!("Tap pulse started at {:.3}s (confidence {:.3})", now_s, confidence);
                IndicatorAction::ShowFor {
                    duration_s: self.visible_duration_s,
                }
            }
            IndicatorState::Visible { until_s } if now_s >= until_s => {
                self.state = IndicatorState::Hidden;
                IndicatorAction::Hide
            }
            _ => IndicatorAction::NoOp,
        }
    }

    /// Deadline check for ticks that produced no score.
    pub fn poll(&mut self, now_s: f64) -> IndicatorAction {
        match self.state {
            IndicatorState::Visible { until_s } if now_s >= until_s => {
                self.state = IndicatorState::Hidden;
                IndicatorAction::Hide
            }
            _ => IndicatorAction::NoOp,
        }
    }

    /// Force the indicator hidden.  Returns `Hide` if it was visible.
    pub fn reset(&mut self) -> IndicatorAction {
        match std::mem::replace(&mut self.state, IndicatorState::Hidden) {
            IndicatorState::Visible { .. } => IndicatorAction::Hide,
            IndicatorState::Hidden => IndicatorAction::NoOp,
        }
    }

    pub fn state(&self) -> IndicatorState {
        self.state
    }

    pub fn is_visible(&self) -> bool {
        matches!(self.state, IndicatorState::Visible { .. })
    }

    pub fn visible_until(&self) -> Option<f64> {
        match self.state {
            IndicatorState::Visible { until_s } => Some(until_s),
            IndicatorState::Hidden => None,
        }
    }

    pub fn visible_duration_s(&self) -> f64 {
        self.visible_duration_s
    }

    /// Pulses started so far.
    pub fn taps(&self) -> u64 {
        self.taps
    }
}

// ── Tests ──────────────────────────────────────────────────
