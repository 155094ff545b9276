//! [`EpisodeStats`]: lengths and returns of finished episodes, kept across resets.

use bevy::prelude::*;
use caterpillar_env::episode::Episode;

// ---------------------------------------------------------------------------
// EpisodeStats
// ---------------------------------------------------------------------------

/// Bevy resource with per-episode history since app start.
#[derive(Resource, Clone, Debug, Default)]
pub struct EpisodeStats {
    pub episodes_completed: u32,
    /// Steps across all completed episodes.
    pub total_steps: u64,
    pub step_history: Vec<u32>,
    pub return_history: Vec<f32>,
    /// `episode_number` of the last recorded episode.
    last_recorded: u32,
}

impl EpisodeStats {
    pub fn mean_episode_length(&self) -> Option<f32> {
        if self.step_history.is_empty() {
            return None;
        }
        let sum: f32 = self.step_history.iter().map(|&s| s as f32).sum();
        Some(sum / self.step_history.len() as f32)
    }

    pub fn mean_return(&self) -> Option<f32> {
        if self.return_history.is_empty() {
            return None;
        }
        Some(self.return_history.iter().sum::<f32>() / self.return_history.len() as f32)
    }

    fn record(&mut self, episode: &Episode) {
        self.episodes_completed += 1;
        self.total_steps += u64::from(episode.step_count);
        self.step_history.push(episode.step_count);
        self.return_history.push(episode.total_reward);
        self.last_recorded = episode.episode_number;
    }

    pub fn reset(&mut self) {
        *self = Self::default();
    }
}

// ---------------------------------------------------------------------------
// System
// ---------------------------------------------------------------------------

/// Record each episode once, on the step it finishes.
///
/// Runs in [`CaterpillarSet::Report`](caterpillar_core::CaterpillarSet::Report).
#[allow(clippy::needless_pass_by_value)]
pub fn episode_stats_system(episode: Res<Episode>, mut stats: ResMut<EpisodeStats>) {
    if episode.is_done() && stats.last_recorded != episode.episode_number {
        stats.record(&episode);
    }
}

// ---------------------------------------------------------------------------
// Tests
// ---------------------------------------------------------------------------

#[cfg(test)]
mod tests {
    use super::*;

    fn finished(episode_number: u32, steps: u32, total: f32) -> Episode {
        let mut episode = Episode::default();
        episode.reset(None);
        episode.episode_number = episode_number;
        episode.step_count = steps;
        episode.total_reward = total;
        episode.terminate();
        episode.settle();
        episode
    }

    fn stats_app() -> App {
        let mut app = App::new();
        app.init_resource::<EpisodeStats>();
        app.add_systems(Update, episode_stats_system);
        app
    }

    #[test]
    fn empty_stats_have_no_means() {
        let stats = EpisodeStats::default();
        assert!(stats.mean_episode_length().is_none());
        assert!(stats.mean_return().is_none());
    }

    #[test]
    fn means_over_history() {
        let stats = EpisodeStats {
            step_history: vec![100, 200, 300],
            return_history: vec![1.0, -1.0, 3.0],
            ..EpisodeStats::default()
        };
        assert!((stats.mean_episode_length().unwrap() - 200.0).abs() < f32::EPSILON);
        assert!((stats.mean_return().unwrap() - 1.0).abs() < f32::EPSILON);
    }

    #[test]
    fn finished_episode_recorded_once() {
        let mut app = stats_app();
        app.insert_resource(finished(1, 12, 4.0));
        app.update();
        app.update();
        let stats = app.world().resource::<EpisodeStats>();
        assert_eq!(stats.episodes_completed, 1);
        assert_eq!(stats.total_steps, 12);
        assert_eq!(stats.return_history, vec![4.0]);
    }

    #[test]
    fn running_episode_not_recorded() {
        let mut app = stats_app();
        let mut episode = Episode::default();
        episode.reset(None);
        app.insert_resource(episode);
        app.update();
        assert_eq!(app.world().resource::<EpisodeStats>().episodes_completed, 0);
    }

    #[test]
    fn consecutive_episodes_all_recorded() {
        let mut app = stats_app();
        for n in 1..=3 {
            app.insert_resource(finished(n, 1, 0.0));
            app.update();
        }
        assert_eq!(app.world().resource::<EpisodeStats>().episodes_completed, 3);
    }

    #[test]
    fn reset_clears_history() {
        let mut stats = EpisodeStats::default();
        stats.record(&finished(1, 5, 1.0));
        stats.reset();
        assert_eq!(stats.episodes_completed, 0);
        assert!(stats.step_history.is_empty());
    }
}
