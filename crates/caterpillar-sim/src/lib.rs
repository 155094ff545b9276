//! Top-level plugin and scene builder for the caterpillar environment.
//!
//! [`CaterpillarSimPlugin`] adds the core and environment plugins plus
//! episode statistics. [`SceneBuilder`] goes further and produces a ready
//! environment with an open physics session.

pub mod builder;
pub mod stats;

use bevy::prelude::*;
use caterpillar_core::CaterpillarSet;

pub use builder::{SceneBuilder, SceneError, SpawnedScene};
pub use stats::EpisodeStats;

// ---------------------------------------------------------------------------
// CaterpillarSimPlugin
// ---------------------------------------------------------------------------

/// Meta-plugin adding
/// [`CaterpillarCorePlugin`](caterpillar_core::CaterpillarCorePlugin),
/// [`CaterpillarEnvPlugin`](caterpillar_env::CaterpillarEnvPlugin) and
/// [`EpisodeStats`].
///
/// Physics is not included; add a
/// [`CaterpillarPhysicsPlugin`](caterpillar_physics::CaterpillarPhysicsPlugin).
pub struct CaterpillarSimPlugin;

impl Plugin for CaterpillarSimPlugin {
    fn build(&self, app: &mut App) {
        app.add_plugins(caterpillar_core::CaterpillarCorePlugin)
            .add_plugins(caterpillar_env::CaterpillarEnvPlugin)
            .init_resource::<EpisodeStats>()
            .add_systems(
                Update,
                stats::episode_stats_system.in_set(CaterpillarSet::Report),
            );
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use caterpillar_env::episode::Episode;

    #[test]
    fn plugin_builds_and_runs_without_physics() {
        let mut app = App::new();
        app.add_plugins(CaterpillarSimPlugin);
        app.finish();
        app.cleanup();
        app.update();
        assert!(app.world().get_resource::<EpisodeStats>().is_some());
        assert!(app.world().get_resource::<Episode>().is_some());
    }

    #[test]
    fn plugin_tracks_truncated_episodes() {
        let mut app = App::new();
        app.add_plugins(CaterpillarSimPlugin);
        app.finish();
        app.cleanup();
        app.world_mut()
            .resource_mut::<caterpillar_core::config::SimConfig>()
            .max_episode_steps = 3;

        for _ in 0..2 {
            app.world_mut().resource_mut::<Episode>().reset(None);
            for _ in 0..3 {
                app.update();
            }
        }
        let stats = app.world().resource::<EpisodeStats>();
        assert_eq!(stats.episodes_completed, 2);
        assert_eq!(stats.total_steps, 6);
    }
}
