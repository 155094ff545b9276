//! Episode lifecycle, gait, sensors and evaluation systems for the
//! caterpillar environment.
//!
//! [`CaterpillarEnvPlugin`] wires the per-step pipeline around the physics
//! step: advance the counter and write joint targets in `Act`, score the
//! step in `Evaluate`, rebuild the observation in `Observe`.

pub mod buffer;
pub mod episode;
pub mod gait;
pub mod sensors;
pub mod systems;

use bevy::prelude::*;

use caterpillar_core::CaterpillarSet;
use caterpillar_core::config::{GaitConfig, RewardConfig, TerminationConfig};
use caterpillar_core::rewards::crawl_reward;
use caterpillar_core::terminations::crawl_termination;
use caterpillar_core::traits::ObservationSensor;

use crate::buffer::ObservationBuffer;
use crate::episode::Episode;
use crate::gait::{GaitMode, gait_command_system};
use crate::sensors::{BasePoseSensor, BaseVelocitySensor, GaitPhaseSensor, JointStateSensor};
use crate::systems::{
    RewardBreakdown, RewardModel, StepReward, TerminationModel, episode_step_system,
    episode_tick_system, observe_system, reward_system, termination_system,
};

// ---------------------------------------------------------------------------
// SensorRegistry
// ---------------------------------------------------------------------------

/// A registered sensor and its slot in the [`ObservationBuffer`].
pub struct SensorEntry {
    pub sensor: Box<dyn ObservationSensor>,
    pub slot_index: usize,
}

/// Sensors read by [`observe_system`](systems::observe_system), in
/// observation order.
#[derive(Resource, Default)]
pub struct SensorRegistry {
    pub entries: Vec<SensorEntry>,
}

impl SensorRegistry {
    /// Register `sensor` and reserve its slot. Returns the slot index.
    pub fn register(
        &mut self,
        sensor: Box<dyn ObservationSensor>,
        buffer: &mut ObservationBuffer,
    ) -> usize {
        let slot_index = buffer.register(sensor.name(), sensor.observation_dim());
        self.entries.push(SensorEntry { sensor, slot_index });
        slot_index
    }

    pub fn len(&self) -> usize {
        self.entries.len()
    }

    pub fn is_empty(&self) -> bool {
        self.entries.is_empty()
    }
}

/// Register the crawl observation sensors for `n_joints` joints in world.
pub fn register_crawl_sensors(world: &mut World, n_joints: usize) {
    let mut registry = world.remove_resource::<SensorRegistry>().unwrap_or_default();
    let mut buffer = world
        .remove_resource::<ObservationBuffer>()
        .unwrap_or_default();
    registry.register(Box::new(BasePoseSensor), &mut buffer);
    registry.register(Box::new(BaseVelocitySensor), &mut buffer);
    registry.register(Box::new(JointStateSensor::new(n_joints)), &mut buffer);
    registry.register(Box::new(GaitPhaseSensor), &mut buffer);
    world.insert_resource(buffer);
    world.insert_resource(registry);
}

// ---------------------------------------------------------------------------
// CaterpillarEnvPlugin
// ---------------------------------------------------------------------------

/// Adds the episode resources and the act, evaluate and observe systems.
///
/// Reward and termination models are built from the config resources present
/// when the plugin is added; add [`CaterpillarCorePlugin`] (or insert the
/// configs) first.
///
/// [`CaterpillarCorePlugin`]: caterpillar_core::CaterpillarCorePlugin
pub struct CaterpillarEnvPlugin;

impl Plugin for CaterpillarEnvPlugin {
    fn build(&self, app: &mut App) {
        let world = app.world();
        let reward = world.get_resource::<RewardConfig>().cloned().unwrap_or_default();
        let neutral = world
            .get_resource::<GaitConfig>()
            .map_or_else(|| GaitConfig::default().neutral_action, |g| g.neutral_action);
        let termination = world
            .get_resource::<TerminationConfig>()
            .cloned()
            .unwrap_or_default();

        app.init_resource::<Episode>()
            .init_resource::<ObservationBuffer>()
            .init_resource::<SensorRegistry>()
            .init_resource::<StepReward>()
            .init_resource::<RewardBreakdown>()
            .init_resource::<GaitMode>()
            .insert_resource(RewardModel(crawl_reward(&reward, neutral)))
            .insert_resource(TerminationModel(crawl_termination(&termination)));

        app.add_systems(
            Update,
            (episode_tick_system, gait_command_system)
                .chain()
                .in_set(CaterpillarSet::Act),
        );
        app.add_systems(
            Update,
            (reward_system, termination_system, episode_step_system)
                .chain()
                .in_set(CaterpillarSet::Evaluate),
        );
        app.add_systems(Update, observe_system.in_set(CaterpillarSet::Observe));
    }
}

pub mod prelude {
    pub use crate::{
        CaterpillarEnvPlugin, SensorRegistry, register_crawl_sensors,
        buffer::ObservationBuffer,
        episode::{Episode, EpisodeState},
        gait::{GaitMode, OpenLoopWave, TravelingWave},
        sensors::{
            BasePoseSensor, BaseVelocitySensor, GaitPhaseSensor, JointStateSensor,
            crawl_observation_dim,
        },
        systems::{RewardBreakdown, RewardModel, StepReward, TerminationModel},
    };
}

// ---------------------------------------------------------------------------
// Tests
// ---------------------------------------------------------------------------

#[cfg(test)]
mod tests {
    use super::*;
    use crate::sensors::crawl_observation_dim;
    use caterpillar_core::CaterpillarCorePlugin;

    #[test]
    fn plugin_inserts_resources() {
        let mut app = App::new();
        app.add_plugins(CaterpillarCorePlugin);
        app.add_plugins(CaterpillarEnvPlugin);
        let world = app.world();
        assert!(world.contains_resource::<Episode>());
        assert!(world.contains_resource::<ObservationBuffer>());
        assert_eq!(world.resource::<RewardModel>().0.len(), 4);
        assert_eq!(*world.resource::<GaitMode>(), GaitMode::Residual);
    }

    #[test]
    fn crawl_sensors_match_observation_dim() {
        let mut world = World::new();
        register_crawl_sensors(&mut world, 9);
        assert_eq!(world.resource::<SensorRegistry>().len(), 4);
        assert_eq!(
            world.resource::<ObservationBuffer>().dim(),
            crawl_observation_dim(9)
        );
    }
}
