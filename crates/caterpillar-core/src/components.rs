//! ECS components and per-step world state shared by every crate.

use bevy::math::EulerRot;
use bevy::prelude::*;

// ---------------------------------------------------------------------------
// Joint components
// ---------------------------------------------------------------------------

/// Position of an actuated joint in the head-to-tail order.
///
/// This index is the `i` of the traveling wave and the slot of the joint in
/// the action and observation vectors.
#[derive(Component, Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Hash)]
pub struct JointIndex(pub usize);

/// Measured joint state, written back from the physics session every step.
#[derive(Component, Debug, Clone, Copy, Default, PartialEq)]
pub struct JointState {
    /// Joint angle (rad).
    pub position: f32,
    /// Joint angular velocity (rad/s).
    pub velocity: f32,
}

/// Position-control command for one joint.
#[derive(Component, Debug, Clone, Copy, Default, PartialEq)]
pub struct JointCommand {
    /// Target angle (rad).
    pub target_position: f32,
    /// Maximum force the motor may apply to reach the target.
    pub max_force: f32,
}

// ---------------------------------------------------------------------------
// BaseState
// ---------------------------------------------------------------------------

/// Pose and velocity of the robot's base link in the world frame.
#[derive(Resource, Debug, Clone, Copy, PartialEq)]
pub struct BaseState {
    pub position: Vec3,
    pub orientation: Quat,
    pub linear_velocity: Vec3,
    pub angular_velocity: Vec3,
}

impl Default for BaseState {
    fn default() -> Self {
        Self {
            position: Vec3::ZERO,
            orientation: Quat::IDENTITY,
            linear_velocity: Vec3::ZERO,
            angular_velocity: Vec3::ZERO,
        }
    }
}

impl BaseState {
    /// Roll, pitch and yaw of the base (extrinsic XYZ, i.e. yaw-pitch-roll).
    pub fn roll_pitch_yaw(&self) -> (f32, f32, f32) {
        let (yaw, pitch, roll) = self.orientation.to_euler(EulerRot::ZYX);
        (roll, pitch, yaw)
    }

    /// Velocity along the world x axis, the crawl direction.
    pub const fn forward_velocity(&self) -> f32 {
        self.linear_velocity.x
    }

    /// Height of the base above the world origin.
    pub const fn height(&self) -> f32 {
        self.position.z
    }

    /// Whether any component of the state is NaN or infinite.
    pub fn is_finite(&self) -> bool {
        self.position.is_finite()
            && self.orientation.is_finite()
            && self.linear_velocity.is_finite()
            && self.angular_velocity.is_finite()
    }
}

// ---------------------------------------------------------------------------
// LastAction
// ---------------------------------------------------------------------------

/// The action most recently applied to the environment.
///
/// Empty until the first step; reset fills it with zeros.
#[derive(Resource, Debug, Clone, Default, PartialEq)]
pub struct LastAction(pub Vec<f32>);

// ---------------------------------------------------------------------------
// Tests
// ---------------------------------------------------------------------------
