//! Per-tick tap detection loop.
//!
//! One `tick` is one synchronous pass: sample the sensor, extract a
//! feature, slide the window, classify, and drive the indicator.  Every
//! degraded condition maps to a `TickOutcome`; only startup can fail.

use tracing::{debug, info, warn};

use crate::config::DetectorConfig;
use crate::error::{ConfigError, Error, InferenceError};
use crate::indicator::{Indicator, IndicatorAction, TapEventController};
use crate::inference::{BackendKind, InferenceAdapter, ModelRuntime, ModelSource};
use crate::pipeline::{extract, Extraction, FeatureWindow, KinematicState, Sample, SkipReason};
use crate::tracking::FingertipSensor;

/// What happened on one tick.
#[derive(Debug, Clone, PartialEq)]
pub enum TickOutcome {
    /// Hand untracked or joint missing; kinematic state was reset.
    SensorGap,
    /// First sample after (re)acquisition; state seeded, no feature.
    Acquired,
    /// Timestamp did not advance; tick dropped.
    InvalidTiming,
    /// Classifier call failed; tick dropped.
    InferenceFailed,
    /// Classifier ran and the controller decided `action`.
    Evaluated {
        confidence: f32,
        action: IndicatorAction,
    },
}

impl TickOutcome {
    pub fn action(&self) -> IndicatorAction {
        match self {
            Self::Evaluated { action, .. } => *action,
            _ => IndicatorAction::NoOp,
        }
    }
}

/// Running counters.
#[derive(Debug, Clone, Default, PartialEq)]
pub struct DetectorStats {
    pub ticks: u64,
    pub sensor_gaps: u64,
    pub invalid_timing: u64,
    pub features: u64,
    pub inferences: u64,
    pub inference_failures: u64,
    pub taps: u64,
    pub last_confidence: Option<f32>,
}

/// Orchestrates feature extraction, the window, the classifier, and the
/// indicator controller.
#[derive(Debug)]
pub struct TapDetector {
    config: DetectorConfig,
    kinematics: KinematicState,
    window: FeatureWindow,
    adapter: InferenceAdapter,
    controller: TapEventController,
    /// Reused flat classifier input.
    input: Vec<f32>,
    stats: DetectorStats,
    failure_streak: u64,
}

impl TapDetector {
    /// Load the model through `runtime` and build a detector.  A load
    /// failure is fatal and returned to the host.
    pub fn start(config: DetectorConfig, runtime: &dyn ModelRuntime, source: &ModelSource) -> Result<Self, Error> {
        config.validate()?;
        let adapter = InferenceAdapter::initialize(runtime, source, config.input_shape(), config.backend)?;
        Self::new(config, adapter)
    }

    /// Build a detector around an already initialized adapter.
    pub fn new(config: DetectorConfig, adapter: InferenceAdapter) -> Result<Self, Error> {
        config.validate()?;
        if adapter.input_shape() != config.input_shape() {
            return Err(ConfigError::Invalid(format!(
                "adapter input {:?} does not match configured window {:?}",
                adapter.input_shape().dims(),
                config.input_shape().dims()
            ))
            .into());
        }

        info!(
            "Tap detector ready: axis={} window={} threshold={:.2} backend={}",
            config.axis.as_str(),
            config.window_size,
            config.detection_threshold,
            adapter.backend_kind().as_str(),
        );

        Ok(Self {
            window: FeatureWindow::new(config.window_size),
            controller: TapEventController::new(config.indicator_visible_duration_s),
            input: Vec::with_capacity(config.input_shape().len()),
            kinematics: KinematicState::Uninitialized,
            stats: DetectorStats::default(),
            failure_streak: 0,
            adapter,
            config,
        })
    }

    /// Run one detection pass.
    pub fn tick(&mut self, sensor: &dyn FingertipSensor, indicator: &mut dyn Indicator) -> TickOutcome {
        self.stats.ticks += 1;
        let now_s = sensor.now();

        let position = if sensor.is_tracked() {
            sensor.fingertip_position()
        } else {
            None
        };
        let Some(position) = position else {
            return self.sensor_gap(now_s, indicator);
        };

        let sample = Sample::new(position, now_s);
        let (extraction, next) = extract(&sample, self.kinematics, self.config.axis);
        self.kinematics = next;

        let feature = match extraction {
            Extraction::Feature(feature) => feature,
            Extraction::Skip(reason) => {
                debug!("Tick skipped at {:.3}s: {}", now_s, reason.as_str());
                self.controller.poll(now_s).apply(indicator);
                return match reason {
                    SkipReason::Acquired => TickOutcome::Acquired,
                    SkipReason::InvalidTiming => {
                        self.stats.invalid_timing += 1;
                        TickOutcome::InvalidTiming
                    }
                };
            }
        };

        self.window.push(feature);
        self.stats.features += 1;
        self.window.snapshot_into(&mut self.input);

        let raw = match self.adapter.infer(&self.input) {
            Ok(score) => score,
            Err(e) => return self.inference_failed(e),
        };
        if self.failure_streak > 0 {
            info!("Inference recovered after {} failed tick(s)", self.failure_streak);
            self.failure_streak = 0;
        }
        self.stats.inferences += 1;

        let confidence = if self.config.clamp_confidence {
            raw.clamp(0.0, 1.0)
        } else {
            raw
        };
        self.stats.last_confidence = Some(confidence);

        let action = self
            .controller
            .evaluate(confidence, self.config.detection_threshold, now_s);
        if let IndicatorAction::ShowFor { .. } = action {
            self.stats.taps += 1;
            info!("TAP DETECTED! Confidence: {:.0}%", confidence * 100.0);
        }
        action.apply(indicator);

        TickOutcome::Evaluated { confidence, action }
    }

    fn sensor_gap(&mut self, now_s: f64, indicator: &mut dyn Indicator) -> TickOutcome {
        if self.kinematics.is_tracking() {
            debug!("Tracking lost at {:.3}s, resetting kinematic state", now_s);
        }
        self.kinematics = KinematicState::Uninitialized;
        self.stats.sensor_gaps += 1;
        self.controller.poll(now_s).apply(indicator);
        TickOutcome::SensorGap
    }

    fn inference_failed(&mut self, err: InferenceError) -> TickOutcome {
        self.stats.inference_failures += 1;
        if self.failure_streak == 0 {
            warn!("Inference failed, skipping tick: {}", err);
        } else {
            debug!("Inference still failing ({} ticks): {}", self.failure_streak + 1, err);
        }
        self.failure_streak += 1;
        TickOutcome::InferenceFailed
    }

    /// Hide a visible indicator and release the classifier backend.  Safe to
    /// call more than once; later ticks report `InferenceFailed`.
    pub fn shutdown(&mut self, indicator: &mut dyn Indicator) {
        self.controller.reset().apply(indicator);
        if self.adapter.release() {
            info!(
                "Tap detector shut down: {} tick(s), {} tap(s)",
                self.stats.ticks, self.stats.taps
            );
        }
    }

    pub fn config(&self) -> &DetectorConfig {
        &self.config
    }

    pub fn stats(&self) -> &DetectorStats {
        &self.stats
    }

    pub fn window(&self) -> &FeatureWindow {
        &self.window
    }

    pub fn kinematic_state(&self) -> KinematicState {
        self.kinematics
    }

    pub fn is_indicator_visible(&self) -> bool {
        self.controller.is_visible()
    }

    /// Hide deadline of the current pulse, if one is showing.
    pub fn indicator_visible_until(&self) -> Option<f64> {
        self.controller.visible_until()
    }

    pub fn backend_kind(&self) -> BackendKind {
        self.adapter.backend_kind()
    }

    pub fn is_released(&self) -> bool {
        self.adapter.is_released()
    }

    /// One-line s-expression status.
    pub fn status_sexp(&self) -> String {
        format!(
            "(:backend {} :released {} :axis {} :threshold {:.2} :ticks {} :features {} :inferences {} :failures {} :taps {} :window-real {}/{} :indicator {} :last-confidence {})",
            self.adapter.backend_kind().as_str(),
            if self.adapter.is_released() { "t" } else { "nil" },
            self.config.axis.as_str(),
            self.config.detection_threshold,
            self.stats.ticks,
            self.stats.features,
            self.stats.inferences,
            self.stats.inference_failures,
            self.stats.taps,
            self.window.real_count(),
            self.window.capacity(),
            if self.controller.is_visible() { "t" } else { "nil" },
            match self.stats.last_confidence {
                Some(c) => format!("{:.3}", c),
                None => "nil".to_string(),
            },
        )
    }
}

// ── Tests ──────────────────────────────────────────────────
