//! Kinematic feature extraction from fingertip samples.
//!
//! Turns consecutive timestamped positions into a (position, velocity,
//! acceleration) triple along one spatial axis.  Tracking history lives in
//! an explicit `KinematicState` value that callers pass in and get back, so
//! the reset-on-gap policy is a plain state transition.

use serde::{Deserialize, Serialize};

/// Number of features per window step.
pub const FEATURE_COUNT: usize = 3;

// ── Samples ────────────────────────────────────────────────

/// One tracked fingertip position, captured once per tick.
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct Sample {
    /// Position in meters (x, y, z).
    pub position: [f32; 3],
    /// Monotonic capture time in seconds.
    pub timestamp_s: f64,
}

impl Sample {
    pub fn new(position: [f32; 3], timestamp_s: f64) -> Self {
        Self {
            position,
            timestamp_s,
        }
    }
}

/// Spatial axis the classifier was trained on.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum Axis {
    X,
    Y,
    /// Forward/depth axis.
    #[default]
    Z,
}

impl Axis {
    /// Component index into a position array.
    pub fn index(&self) -> usize {
        match self {
            Self::X => 0,
            Self::Y => 1,
            Self::Z => 2,
        }
    }

    pub fn as_str(&self) -> &'static str {
        match self {
            Self::X => "x",
            Self::Y => "y",
            Self::Z => "z",
        }
    }
}

// ── State ──────────────────────────────────────────────────

/// Motion history needed to differentiate the next sample.
#[derive(Debug, Clone, Copy, PartialEq, Default)]
pub enum KinematicState {
    /// No sample since start or since tracking was lost.
    #[default]
    Uninitialized,
    /// At least one sample seen since (re)acquisition.
    Tracking {
        last_position: [f32; 3],
        last_velocity: [f32; 3],
        last_timestamp_s: f64,
    },
}

impl KinematicState {
    /// State right after (re)acquiring tracking at `sample`: at rest.
    pub fn acquired(sample: &Sample) -> Self {
        Self::Tracking {
            last_position: sample.position,
            last_velocity: [0.0; 3],
            last_timestamp_s: sample.timestamp_s,
        }
    }

    pub fn is_tracking(&self) -> bool {
        matches!(self, Self::Tracking { .. })
    }
}

// ── Features ───────────────────────────────────────────────

/// One window step, in the order the model consumes it.
#[derive(Debug, Clone, Copy, PartialEq, Default)]
pub struct FeatureVector {
    pub position: f32,
    pub velocity: f32,
    pub acceleration: f32,
}

impl FeatureVector {
    pub const ZERO: Self = Self {
        position: 0.0,
        velocity: 0.0,
        acceleration: 0.0,
    };

    pub fn new(position: f32, velocity: f32, acceleration: f32) -> Self {
        Self {
            position,
            velocity,
            acceleration,
        }
    }

    pub fn to_array(self) -> [f32; FEATURE_COUNT] {
        [self.position, self.velocity, self.acceleration]
    }
}

/// Why a sample produced no feature.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum SkipReason {
    /// First sample after (re)acquisition; it only seeds the state.
    Acquired,
    /// Timestamp did not advance (duplicate or out-of-order tick).
    InvalidTiming,
}

impl SkipReason {
    pub fn as_str(&self) -> &'static str {
        match self {
            Self::Acquired => "acquired",
            Self::InvalidTiming => "invalid-timing",
        }
    }
}

/// Result of feeding one sample to the extractor.
#[derive(Debug, Clone, Copy, PartialEq)]
pub enum Extraction {
    Feature(FeatureVector),
    Skip(SkipReason),
}

/// Differentiate `sample` against `state`.
///
/// Returns the extraction and the state to carry into the next tick.  On
/// `InvalidTiming` the state is returned unchanged: a clock hiccup is not a
/// tracking loss.
pub fn extract(sample: &Sample, state: KinematicState, axis: Axis) -> (Extraction, KinematicState) {
    let (last_position, last_velocity, last_timestamp_s) = match state {
        KinematicState::Uninitialized => {
            return (
                Extraction::Skip(SkipReason::Acquired),
                KinematicState::acquired(sample),
            );
        }
        KinematicState::Tracking {
            last_position,
            last_velocity,
            last_timestamp_s,
        } => (last_position, last_velocity, last_timestamp_s),
    };

    // Written as !(dt > 0) so a NaN timestamp is rejected too.
    let dt = sample.timestamp_s - last_timestamp_s;
    if !(dt > 0.0) {
        return (Extraction::Skip(SkipReason::InvalidTiming), state);
    }

    // Differences are taken in f64 so small dt at large timestamps stays exact.
    let mut velocity = [0.0f32; 3];
    let mut acceleration = [0.0f32; 3];
    for i in 0..3 {
        let v = (sample.position[i] as f64 - last_position[i] as f64) / dt;
        let a = (v - last_velocity[i] as f64) / dt;
        velocity[i] = v as f32;
        acceleration[i] = a as f32;
    }

    let k = axis.index();
    let feature = FeatureVector::new(sample.position[k], velocity[k], acceleration[k]);
    let next = KinematicState::Tracking {
        last_position: sample.position,
        last_velocity: velocity,
        last_timestamp_s: sample.timestamp_s,
    };
    (Extraction::Feature(feature), next)
}

// ── Tests ──────────────────────────────────────────────────

#[cfg(test)]
mod tests {
    use super::*;

    const DT: f64 = 1.0 / 60.0;

    fn feature(extraction: Extraction) -> FeatureVector {
        match extraction {
            Extraction::Feature(f) => f,
            Extraction::Skip(reason) => panic!("expected feature, got skip {:?}", reason),
        }
    }

    #[test]
    fn test_first_sample_seeds_state() {
        let s = Sample::new([0.1, 0.2, 0.3], 5.0);
        let (out, state) = extract(&s, KinematicState::Uninitialized, Axis::Z);
        assert_eq!(out, Extraction::Skip(SkipReason::Acquired));
        assert_eq!(
            state,
            KinematicState::Tracking {
                last_position: [0.1, 0.2, 0.3],
                last_velocity: [0.0; 3],
                last_timestamp_s: 5.0,
            }
        );
    }

    #[test]
    fn test_stationary_gives_zero_motion() {
        let s0 = Sample::new([0.0, 0.0, 0.4], 0.0);
        let s1 = Sample::new([0.0, 0.0, 0.4], DT);
        let (_, state) = extract(&s0, KinematicState::default(), Axis::Z);
        let (out, _) = extract(&s1, state, Axis::Z);
        let f = feature(out);
        assert!((f.position - 0.4).abs() < 1e-6);
        assert_eq!(f.velocity, 0.0);
        assert_eq!(f.acceleration, 0.0);
    }

    #[test]
    fn test_velocity_and_acceleration() {
        // 0.1 m in 0.1 s from rest: v = 1 m/s, a = 10 m/s^2
        let s0 = Sample::new([0.0, 0.0, 0.0], 1.0);
        let s1 = Sample::new([0.0, 0.0, 0.1], 1.1);
        let (_, state) = extract(&s0, KinematicState::default(), Axis::Z);
        let (out, state) = extract(&s1, state, Axis::Z);
        let f = feature(out);
        assert!((f.velocity - 1.0).abs() < 1e-4, "velocity {}", f.velocity);
        assert!((f.acceleration - 10.0).abs() < 1e-2, "acceleration {}", f.acceleration);

        // Constant velocity afterwards: acceleration drops to zero.
        let s2 = Sample::new([0.0, 0.0, 0.2], 1.2);
        let f = feature(extract(&s2, state, Axis::Z).0);
        assert!((f.velocity - 1.0).abs() < 1e-4);
        assert!(f.acceleration.abs() < 1e-2, "acceleration {}", f.acceleration);
    }

    #[test]
    fn test_axis_selection() {
        let s0 = Sample::new([0.0, 0.0, 0.0], 0.0);
        let s1 = Sample::new([0.5, -0.5, 0.0], 0.5);
        let (_, state) = extract(&s0, KinematicState::default(), Axis::X);

        let fx = feature(extract(&s1, state, Axis::X).0);
        let fy = feature(extract(&s1, state, Axis::Y).0);
        let fz = feature(extract(&s1, state, Axis::Z).0);
        assert!((fx.velocity - 1.0).abs() < 1e-5);
        assert!((fy.velocity + 1.0).abs() < 1e-5);
        assert_eq!(fz.velocity, 0.0);
        assert!((fy.position + 0.5).abs() < 1e-6);
    }

    #[test]
    fn test_duplicate_timestamp_keeps_state() {
        let s0 = Sample::new([0.0, 0.0, 0.0], 2.0);
        let (_, state) = extract(&s0, KinematicState::default(), Axis::Z);
        let dup = Sample::new([0.0, 0.0, 0.3], 2.0);
        let (out, after) = extract(&dup, state, Axis::Z);
        assert_eq!(out, Extraction::Skip(SkipReason::InvalidTiming));
        assert_eq!(after, state);
    }

    #[test]
    fn test_backwards_timestamp_skipped() {
        let s0 = Sample::new([0.0, 0.0, 0.0], 2.0);
        let (_, state) = extract(&s0, KinematicState::default(), Axis::Z);
        let back = Sample::new([0.0, 0.0, 0.3], 1.5);
        let (out, after) = extract(&back, state, Axis::Z);
        assert_eq!(out, Extraction::Skip(SkipReason::InvalidTiming));
        assert_eq!(after, state);
    }

    #[test]
    fn test_nan_timestamp_skipped() {
        let s0 = Sample::new([0.0, 0.0, 0.0], 2.0);
        let (_, state) = extract(&s0, KinematicState::default(), Axis::Z);
        let bad = Sample::new([0.0, 0.0, 0.3], f64::NAN);
        let (out, after) = extract(&bad, state, Axis::Z);
        assert_eq!(out, Extraction::Skip(SkipReason::InvalidTiming));
        assert_eq!(after, state);
    }

    #[test]
    fn test_reacquire_discards_history() {
        // Fast motion before the gap.
        let (_, state) = extract(&Sample::new([0.0, 0.0, 0.0], 0.0), KinematicState::default(), Axis::Z);
        let (_, state) = extract(&Sample::new([0.0, 0.0, 1.0], DT), state, Axis::Z);
        assert!(state.is_tracking());

        // Gap: the caller drops the state.  Reacquire far away.
        let state = KinematicState::Uninitialized;
        let (out, state) = extract(&Sample::new([0.0, 0.0, 3.0], 1.0), state, Axis::Z);
        assert_eq!(out, Extraction::Skip(SkipReason::Acquired));

        let f = feature(extract(&Sample::new([0.0, 0.0, 3.0], 1.0 + DT), state, Axis::Z).0);
        assert_eq!(f.velocity, 0.0);
        assert_eq!(f.acceleration, 0.0);
    }

    #[test]
    fn test_large_timestamps_keep_precision() {
        // An hour into a session, 1/90 s apart.
        let t0 = 3600.0;
        let (_, state) = extract(&Sample::new([0.0, 0.0, 0.0], t0), KinematicState::default(), Axis::Z);
        let f = feature(extract(&Sample::new([0.0, 0.0, 0.01], t0 + 1.0 / 90.0), state, Axis::Z).0);
        assert!((f.velocity - 0.9).abs() < 1e-3, "velocity {}", f.velocity);
    }

    #[test]
    fn test_feature_order() {
        let f = FeatureVector::new(1.0, 2.0, 3.0);
        assert_eq!(f.to_array(), [1.0, 2.0, 3.0]);
        assert_eq!(FeatureVector::ZERO.to_array(), [0.0; FEATURE_COUNT]);
    }

    #[test]
    fn test_axis_as_str() {
        assert_eq!(Axis::X.as_str(), "x");
        assert_eq!(Axis::default(), Axis::Z);
        assert_eq!(Axis::Y.index(), 1);
    }
}
