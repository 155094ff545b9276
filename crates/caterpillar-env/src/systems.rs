//! Bevy systems for the step counter, reward, termination, episode
//! bookkeeping and observation assembly.

use bevy::prelude::*;
use tracing::debug;

use caterpillar_core::config::{SimConfig, TerminationConfig};
use caterpillar_core::traits::{CompositeReward, CompositeTermination};

use crate::SensorRegistry;
use crate::buffer::ObservationBuffer;
use crate::episode::Episode;

// ---------------------------------------------------------------------------
// Resources
// ---------------------------------------------------------------------------

/// Reward of the step being evaluated.
///
/// Written by [`reward_system`], reduced by [`termination_system`] and
/// consumed by [`episode_step_system`].
#[derive(Resource, Clone, Debug, Default)]
pub struct StepReward(pub f32);

/// Weighted reward terms of the last evaluated step, by name.
#[derive(Resource, Clone, Debug, Default)]
pub struct RewardBreakdown(pub Vec<(String, f32)>);

/// The reward evaluated every step.
#[derive(Resource, Default)]
pub struct RewardModel(pub CompositeReward);

/// Conditions that end the episode early.
#[derive(Resource, Default)]
pub struct TerminationModel(pub CompositeTermination);

// ---------------------------------------------------------------------------
// episode_tick_system
// ---------------------------------------------------------------------------

/// Advance the step counter before the gait reads it.
///
/// Runs first in [`CaterpillarSet::Act`](caterpillar_core::CaterpillarSet::Act).
pub fn episode_tick_system(mut episode: ResMut<Episode>) {
    episode.begin_step();
}

// ---------------------------------------------------------------------------
// reward_system
// ---------------------------------------------------------------------------

/// Exclusive system computing the step reward from the post-physics state.
///
/// Temporarily removes [`RewardModel`] so terms can read the world.
pub fn reward_system(world: &mut World) {
    if !world.get_resource::<Episode>().is_some_and(Episode::is_running) {
        return;
    }
    let Some(model) = world.remove_resource::<RewardModel>() else {
        return;
    };

    let terms: Vec<(String, f32)> = model
        .0
        .breakdown(world)
        .into_iter()
        .map(|(name, value)| (name.to_owned(), value))
        .collect();
    let total = terms.iter().map(|(_, value)| value).sum();

    world.insert_resource(StepReward(total));
    world.insert_resource(RewardBreakdown(terms));
    world.insert_resource(model);
}

// ---------------------------------------------------------------------------
// termination_system
// ---------------------------------------------------------------------------

/// Exclusive system flagging termination and applying its penalty.
pub fn termination_system(world: &mut World) {
    if !world.get_resource::<Episode>().is_some_and(Episode::is_running) {
        return;
    }
    let Some(model) = world.remove_resource::<TerminationModel>() else {
        return;
    };

    let triggered: Vec<String> = model
        .0
        .triggered(world)
        .into_iter()
        .map(str::to_owned)
        .collect();
    world.insert_resource(model);
    if triggered.is_empty() {
        return;
    }

    let penalty = world
        .get_resource::<TerminationConfig>()
        .map_or_else(|| TerminationConfig::default().penalty, |c| c.penalty);
    if let Some(mut reward) = world.get_resource_mut::<StepReward>() {
        reward.0 -= penalty;
    }
    if let Some(mut breakdown) = world.get_resource_mut::<RewardBreakdown>() {
        breakdown.0.push(("termination".to_owned(), -penalty));
    }
    if let Some(mut episode) = world.get_resource_mut::<Episode>() {
        episode.terminate();
        debug!(
            step = episode.step_count,
            conditions = ?triggered,
            "episode terminated"
        );
    }
}

// ---------------------------------------------------------------------------
// episode_step_system
// ---------------------------------------------------------------------------

/// Record the step reward, check the step limit and settle the episode state.
///
/// Truncation is checked whether or not the step also terminated.
#[allow(clippy::needless_pass_by_value)]
pub fn episode_step_system(
    mut episode: ResMut<Episode>,
    sim: Res<SimConfig>,
    mut reward: ResMut<StepReward>,
) {
    if !episode.is_running() {
        return;
    }
    episode.record(reward.0);
    if episode.check_truncation(sim.max_episode_steps) {
        debug!(step = episode.step_count, "episode truncated");
    }
    episode.settle();
    reward.0 = 0.0;
}

// ---------------------------------------------------------------------------
// observe_system
// ---------------------------------------------------------------------------

/// Exclusive system reading every registered sensor into the buffer.
///
/// Runs in [`CaterpillarSet::Observe`](caterpillar_core::CaterpillarSet::Observe)
/// and directly after a reset.
pub fn observe_system(world: &mut World) {
    let Some(registry) = world.remove_resource::<SensorRegistry>() else {
        return;
    };
    let Some(mut buffer) = world.remove_resource::<ObservationBuffer>() else {
        world.insert_resource(registry);
        return;
    };

    for entry in &registry.entries {
        let obs = entry.sensor.read(world);
        if let Err(err) = buffer.write(entry.slot_index, obs.as_slice()) {
            tracing::warn!(sensor = entry.sensor.name(), %err, "sensor output dropped");
        }
    }

    world.insert_resource(buffer);
    world.insert_resource(registry);
}

// ---------------------------------------------------------------------------
// Tests
// ---------------------------------------------------------------------------

#[cfg(test)]
mod tests {
    use super::*;
    use crate::CaterpillarEnvPlugin;
    use crate::sensors::BaseVelocitySensor;
    use caterpillar_core::CaterpillarCorePlugin;
    use caterpillar_core::components::{BaseState, LastAction};

    fn build_test_app() -> App {
        let mut app = App::new();
        app.add_plugins(CaterpillarCorePlugin);
        app.add_plugins(CaterpillarEnvPlugin);
        app.finish();
        app.cleanup();
        app
    }

    fn start(app: &mut App, n_joints: usize) {
        app.world_mut().resource_mut::<Episode>().reset(None);
        app.world_mut().resource_mut::<LastAction>().0 = vec![0.5; n_joints];
    }

    fn set_base(app: &mut App, base: BaseState) {
        app.world_mut().insert_resource(base);
    }

    fn moving(vx: f32) -> BaseState {
        BaseState {
            linear_velocity: Vec3::new(vx, 0.0, 0.0),
            ..BaseState::default()
        }
    }

    #[test]
    fn nothing_happens_before_reset() {
        let mut app = build_test_app();
        app.update();
        let episode = app.world().resource::<Episode>();
        assert_eq!(episode.step_count, 0);
        assert!(episode.total_reward.abs() < f32::EPSILON);
    }

    #[test]
    fn neutral_crawl_step_rewards_two() {
        let mut app = build_test_app();
        start(&mut app, 9);
        set_base(&mut app, moving(0.01));
        app.update();

        let episode = app.world().resource::<Episode>();
        assert_eq!(episode.step_count, 1);
        assert!((episode.last_reward - 2.0).abs() < 1e-5);
        assert!(episode.is_running());
    }

    #[test]
    fn breakdown_names_every_term() {
        let mut app = build_test_app();
        start(&mut app, 9);
        set_base(&mut app, moving(0.0));
        app.update();

        let breakdown = &app.world().resource::<RewardBreakdown>().0;
        let names: Vec<&str> = breakdown.iter().map(|(n, _)| n.as_str()).collect();
        assert_eq!(names, vec!["forward_velocity", "effort", "tilt", "stall"]);
        let stall = breakdown.iter().find(|(n, _)| n == "stall").unwrap().1;
        assert!((stall + 1.0).abs() < f32::EPSILON);
    }

    #[test]
    fn height_at_limit_does_not_terminate() {
        let mut app = build_test_app();
        start(&mut app, 9);
        let mut base = moving(0.01);
        base.position.z = 0.5;
        set_base(&mut app, base);
        app.update();
        let episode = app.world().resource::<Episode>();
        assert!(!episode.terminated);
        assert!(episode.is_running());
    }

    #[test]
    fn launch_terminates_with_penalty() {
        let mut app = build_test_app();
        start(&mut app, 9);
        let mut base = moving(0.01);
        base.position.z = 0.5 + 1e-4;
        set_base(&mut app, base);
        app.update();

        let episode = app.world().resource::<Episode>();
        assert!(episode.terminated);
        assert!(!episode.truncated);
        assert!(episode.is_done());
        assert!((episode.last_reward - (2.0 - 50.0)).abs() < 1e-4);
    }

    #[test]
    fn tilt_terminates() {
        let mut app = build_test_app();
        start(&mut app, 9);
        let mut base = moving(0.01);
        base.orientation = Quat::from_rotation_x(1.6);
        set_base(&mut app, base);
        app.update();
        assert!(app.world().resource::<Episode>().terminated);
    }

    #[test]
    fn truncation_fires_at_step_limit() {
        let mut app = build_test_app();
        app.world_mut().resource_mut::<SimConfig>().max_episode_steps = 5;
        start(&mut app, 9);
        set_base(&mut app, moving(0.01));
        for _ in 0..4 {
            app.update();
            assert!(!app.world().resource::<Episode>().truncated);
        }
        app.update();
        let episode = app.world().resource::<Episode>();
        assert!(episode.truncated);
        assert!(!episode.terminated);
        assert_eq!(episode.step_count, 5);
    }

    #[test]
    fn truncation_and_termination_on_same_step() {
        let mut app = build_test_app();
        app.world_mut().resource_mut::<SimConfig>().max_episode_steps = 1;
        start(&mut app, 9);
        let mut base = moving(0.0);
        base.position.z = 1.0;
        set_base(&mut app, base);
        app.update();
        let episode = app.world().resource::<Episode>();
        assert!(episode.terminated && episode.truncated);
    }

    #[test]
    fn done_episode_stops_counting() {
        let mut app = build_test_app();
        start(&mut app, 9);
        let mut base = moving(0.0);
        base.position.z = 1.0;
        set_base(&mut app, base);
        app.update();
        let total = app.world().resource::<Episode>().total_reward;
        app.update();
        let episode = app.world().resource::<Episode>();
        assert_eq!(episode.step_count, 1);
        assert!((episode.total_reward - total).abs() < f32::EPSILON);
    }

    #[test]
    fn observe_system_fills_registered_slots() {
        let mut app = build_test_app();
        {
            let world = app.world_mut();
            let mut registry = world.remove_resource::<SensorRegistry>().unwrap();
            let mut buffer = world.remove_resource::<ObservationBuffer>().unwrap();
            registry.register(Box::new(BaseVelocitySensor), &mut buffer);
            world.insert_resource(buffer);
            world.insert_resource(registry);
        }
        set_base(&mut app, moving(0.25));
        app.update();
        let buffer = app.world().resource::<ObservationBuffer>();
        assert_eq!(buffer.dim(), 6);
        assert!((buffer.as_slice()[0] - 0.25).abs() < f32::EPSILON);
    }
}
