//! Fingertip sensor interface consumed by the detector.

/// Per-tick source of fingertip samples.
///
/// The detector queries each method at most once per tick.
pub trait FingertipSensor {
    /// Whether the hand is currently tracked.
    fn is_tracked(&self) -> bool;

    /// Tracked point in meters, or `None` if the joint is missing this tick.
    fn fingertip_position(&self) -> Option<[f32; 3]>;

    /// Monotonic time in seconds.
    fn now(&self) -> f64;
}
