//! Observation sensors for the crawl environment.
//!
//! Registered in this order they produce the observation vector
//! `[position(3), quaternion xyzw(4), linear velocity(3), angular velocity(3),
//! joint angles(n), joint velocities(n), sin phase, cos phase]`.

use bevy::prelude::*;

use caterpillar_core::components::{BaseState, JointIndex, JointState};
use caterpillar_core::config::GaitConfig;
use caterpillar_core::traits::{ObservationSensor, Sensor};
use caterpillar_core::types::Observation;

use crate::episode::Episode;
use crate::gait::TravelingWave;

// ---------------------------------------------------------------------------
// BasePoseSensor
// ---------------------------------------------------------------------------

/// Base position followed by the orientation quaternion in xyzw order.
pub struct BasePoseSensor;

impl Sensor for BasePoseSensor {
    type Output = Observation;

    fn read(&self, world: &mut World) -> Observation {
        let base = world.get_resource::<BaseState>().copied().unwrap_or_default();
        let mut data = Vec::with_capacity(7);
        data.extend_from_slice(&base.position.to_array());
        data.extend_from_slice(&base.orientation.to_array());
        Observation::new(data)
    }

    #[allow(clippy::unnecessary_literal_bound)]
    fn name(&self) -> &str {
        "base_pose"
    }
}

impl ObservationSensor for BasePoseSensor {
    fn observation_dim(&self) -> usize {
        7
    }
}

// ---------------------------------------------------------------------------
// BaseVelocitySensor
// ---------------------------------------------------------------------------

/// Base linear then angular velocity, world frame.
pub struct BaseVelocitySensor;

impl Sensor for BaseVelocitySensor {
    type Output = Observation;

    fn read(&self, world: &mut World) -> Observation {
        let base = world.get_resource::<BaseState>().copied().unwrap_or_default();
        let mut data = Vec::with_capacity(6);
        data.extend_from_slice(&base.linear_velocity.to_array());
        data.extend_from_slice(&base.angular_velocity.to_array());
        Observation::new(data)
    }

    #[allow(clippy::unnecessary_literal_bound)]
    fn name(&self) -> &str {
        "base_velocity"
    }
}

impl ObservationSensor for BaseVelocitySensor {
    fn observation_dim(&self) -> usize {
        6
    }
}

// ---------------------------------------------------------------------------
// JointStateSensor
// ---------------------------------------------------------------------------

/// All joint angles, then all joint velocities, ordered by [`JointIndex`].
///
/// Produces `2 × n_joints` values. Missing joints read as zero so the
/// dimension never changes.
pub struct JointStateSensor {
    n_joints: usize,
}

impl JointStateSensor {
    pub const fn new(n_joints: usize) -> Self {
        Self { n_joints }
    }
}

impl Sensor for JointStateSensor {
    type Output = Observation;

    fn read(&self, world: &mut World) -> Observation {
        let mut data = vec![0.0; self.n_joints * 2];
        let mut query = world.query::<(&JointIndex, &JointState)>();
        for (index, state) in query.iter(world) {
            if index.0 < self.n_joints {
                data[index.0] = state.position;
                data[self.n_joints + index.0] = state.velocity;
            }
        }
        Observation::new(data)
    }

    #[allow(clippy::unnecessary_literal_bound)]
    fn name(&self) -> &str {
        "joint_state"
    }
}

impl ObservationSensor for JointStateSensor {
    fn observation_dim(&self) -> usize {
        self.n_joints * 2
    }
}

// ---------------------------------------------------------------------------
// GaitPhaseSensor
// ---------------------------------------------------------------------------

/// `[sin(t·wave_freq), cos(t·wave_freq)]` for the current step `t`.
pub struct GaitPhaseSensor;

impl Sensor for GaitPhaseSensor {
    type Output = Observation;

    fn read(&self, world: &mut World) -> Observation {
        let step = world.get_resource::<Episode>().map_or(0, |e| e.step_count);
        let wave = world
            .get_resource::<GaitConfig>()
            .map(TravelingWave::from_config)
            .unwrap_or_default();
        Observation::new(wave.phase(step).to_vec())
    }

    #[allow(clippy::unnecessary_literal_bound)]
    fn name(&self) -> &str {
        "gait_phase"
    }
}

impl ObservationSensor for GaitPhaseSensor {
    fn observation_dim(&self) -> usize {
        2
    }
}

/// Observation dimension for a robot with `n_joints` actuated joints.
pub const fn crawl_observation_dim(n_joints: usize) -> usize {
    13 + 2 * n_joints + 2
}

// ---------------------------------------------------------------------------
// Tests
// ---------------------------------------------------------------------------
