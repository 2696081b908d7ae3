//! XR hand skeleton state and the fingertip sensor built on it.
//!
//! Models 26 joints per hand per the XR_EXT_hand_tracking layout.  The host
//! pushes skeleton frames in; `SkeletonSensor` exposes one joint of one hand
//! (the right index tip by default) through `FingertipSensor`.

use serde::{Deserialize, Serialize};
use tracing::debug;

use super::sensor::FingertipSensor;
use crate::config::DetectorConfig;

// ── Joint definitions ──────────────────────────────────────

/// The 26 hand joints defined by XR_EXT_hand_tracking.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "kebab-case")]
pub enum HandJoint {
    Palm,
    Wrist,
    ThumbMetacarpal,
    ThumbProximal,
    ThumbDistal,
    ThumbTip,
    IndexMetacarpal,
    IndexProximal,
    IndexIntermediate,
    IndexDistal,
    IndexTip,
    MiddleMetacarpal,
    MiddleProximal,
    MiddleIntermediate,
    MiddleDistal,
    MiddleTip,
    RingMetacarpal,
    RingProximal,
    RingIntermediate,
    RingDistal,
    RingTip,
    LittleMetacarpal,
    LittleProximal,
    LittleIntermediate,
    LittleDistal,
    LittleTip,
}

/// Total number of joints per hand.
pub const JOINT_COUNT: usize = 26;

impl HandJoint {
    /// Convert joint enum to array index (0-25).
    pub fn index(&self) -> usize {
        *self as usize
    }
}

/// Which hand.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Default, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum Hand {
    Left,
    #[default]
    Right,
}

// ── Skeleton ───────────────────────────────────────────────

/// Pose data for a single joint.
#[derive(Debug, Clone, Copy)]
pub struct JointPose {
    /// Position in meters (x, y, z).
    pub position: [f32; 3],
    /// Whether this joint has valid tracking data.
    pub valid: bool,
}

impl Default for JointPose {
    fn default() -> Self {
        Self {
            position: [0.0; 3],
            valid: false,
        }
    }
}

impl JointPose {
    pub fn tracked(position: [f32; 3]) -> Self {
        Self {
            position,
            valid: true,
        }
    }
}

/// Latest skeleton frame for one hand.
#[derive(Debug, Clone)]
pub struct HandSkeleton {
    pub hand: Hand,
    /// 26 joint poses indexed by HandJoint.
    pub joints: Vec<JointPose>,
    /// Timestamp of last update in nanoseconds.
    pub timestamp_ns: u64,
    pub tracking_active: bool,
    /// Overall tracking confidence (0.0-1.0).
    pub confidence: f32,
}

impl HandSkeleton {
    pub fn new(hand: Hand) -> Self {
        Self {
            hand,
            joints: vec![JointPose::default(); JOINT_COUNT],
            timestamp_ns: 0,
            tracking_active: false,
            confidence: 0.0,
        }
    }

    /// Position of `joint` if it is valid in this frame.
    pub fn joint_position(&self, joint: HandJoint) -> Option<[f32; 3]> {
        self.joints
            .get(joint.index())
            .filter(|pose| pose.valid)
            .map(|pose| pose.position)
    }

    pub fn reset(&mut self) {
        *self = Self::new(self.hand);
    }
}

// ── State ──────────────────────────────────────────────────

/// Both hands' latest skeletons plus the tracking clock.
#[derive(Debug, Clone)]
pub struct HandTrackingState {
    /// Minimum confidence (0.0-1.0) for a hand to count as tracked.
    pub min_confidence: f32,
    pub left: HandSkeleton,
    pub right: HandSkeleton,
    /// Most recent timestamp seen from the runtime, tracked or not.
    latest_timestamp_ns: u64,
}

impl HandTrackingState {
    pub fn new(min_confidence: f32) -> Self {
        Self {
            min_confidence,
            left: HandSkeleton::new(Hand::Left),
            right: HandSkeleton::new(Hand::Right),
            latest_timestamp_ns: 0,
        }
    }

    pub fn skeleton(&self, hand: Hand) -> &HandSkeleton {
        match hand {
            Hand::Left => &self.left,
            Hand::Right => &self.right,
        }
    }

    fn skeleton_mut(&mut self, hand: Hand) -> &mut HandSkeleton {
        match hand {
            Hand::Left => &mut self.left,
            Hand::Right => &mut self.right,
        }
    }

    /// Store a new skeleton frame.
    ///
    /// `joints` must contain exactly 26 entries; other frames are dropped
    /// and the hand is marked untracked.
    pub fn update_hand(&mut self, hand: Hand, joints: Vec<JointPose>, timestamp_ns: u64, confidence: f32) {
        self.latest_timestamp_ns = self.latest_timestamp_ns.max(timestamp_ns);
        let min_confidence = self.min_confidence;
        let skel = self.skeleton_mut(hand);

        if joints.len() != JOINT_COUNT {
            debug!(
                "Hand tracking: expected {} joints, got {} for {:?}",
                JOINT_COUNT,
                joints.len(),
                hand,
            );
            skel.tracking_active = false;
            return;
        }

        skel.joints = joints;
        skel.timestamp_ns = timestamp_ns;
        skel.confidence = confidence;
        skel.tracking_active = confidence >= min_confidence;
    }

    /// Runtime reported the hand as lost.
    pub fn mark_lost(&mut self, hand: Hand, timestamp_ns: u64) {
        self.latest_timestamp_ns = self.latest_timestamp_ns.max(timestamp_ns);
        let skel = self.skeleton_mut(hand);
        skel.tracking_active = false;
        skel.confidence = 0.0;
    }

    pub fn is_tracking(&self, hand: Hand) -> bool {
        self.skeleton(hand).tracking_active
    }

    pub fn latest_timestamp_s(&self) -> f64 {
        self.latest_timestamp_ns as f64 / 1e9
    }

    pub fn reset(&mut self) {
        self.left.reset();
        self.right.reset();
    }
}

impl Default for HandTrackingState {
    fn default() -> Self {
        Self::new(0.5)
    }
}

// ── Sensor ────────────────────────────────────────────────

/// Exposes one joint of one hand as a `FingertipSensor`.
#[derive(Debug, Clone)]
pub struct SkeletonSensor {
    pub tracking: HandTrackingState,
    hand: Hand,
    joint: HandJoint,
}

impl SkeletonSensor {
    pub fn new(tracking: HandTrackingState, hand: Hand, joint: HandJoint) -> Self {
        Self {
            tracking,
            hand,
            joint,
        }
    }

    /// Sensor for the configured hand and joint, gated at the configured
    /// minimum tracking confidence.
    pub fn from_config(config: &DetectorConfig) -> Self {
        debug!(
            "Skeleton sensor: {:?} hand, {:?} joint, min confidence {}",
            config.hand, config.joint, config.min_tracking_confidence,
        );
        Self::new(
            HandTrackingState::new(config.min_tracking_confidence),
            config.hand,
            config.joint,
        )
    }

    pub fn hand(&self) -> Hand {
        self.hand
    }

    pub fn joint(&self) -> HandJoint {
        self.joint
    }
}

impl Default for SkeletonSensor {
    fn default() -> Self {
        Self::new(HandTrackingState::default(), Hand::Right, HandJoint::IndexTip)
    }
}

impl FingertipSensor for SkeletonSensor {
    fn is_tracked(&self) -> bool {
        self.tracking.is_tracking(self.hand)
    }

    fn fingertip_position(&self) -> Option<[f32; 3]> {
        self.tracking.skeleton(self.hand).joint_position(self.joint)
    }

    fn now(&self) -> f64 {
        self.tracking.latest_timestamp_s()
    }
}

/// Full set of 26 joints, all valid, with `tip` placed at `position`.
#[cfg(test)]
fn test_joints(tip: HandJoint, position: [f32; 3]) -> Vec<JointPose> {
    let mut joints = vec![JointPose::tracked([0.0; 3]); JOINT_COUNT];
    joints[tip.index()] = JointPose::tracked(position);
    joints
}

// ── Tests ──────────────────────────────────────────────────
