//! Tracking input: the fingertip sensor interface and the XR hand
//! skeleton adapter that implements it.

pub mod hand_tracking;
pub mod sensor;

pub use hand_tracking::{Hand, HandJoint, HandSkeleton, HandTrackingState, JointPose, SkeletonSensor, JOINT_COUNT};
pub use sensor::FingertipSensor;
