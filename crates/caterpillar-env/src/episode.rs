//! Episode lifecycle: idle until the first reset, running, then done.
//!
//! An episode runs from an explicit reset until the robot falls
//! (termination) or the step limit is reached (truncation). The two are
//! tracked separately and may both hold on the same step.

use bevy::prelude::*;

// ---------------------------------------------------------------------------
// EpisodeState
// ---------------------------------------------------------------------------

/// Lifecycle state of an episode.
#[derive(Clone, Copy, Debug, Default, PartialEq, Eq, Hash)]
pub enum EpisodeState {
    /// Before the first reset.
    #[default]
    Idle,
    /// Actively stepping.
    Running,
    /// Terminated, truncated or both. Only a reset leaves this state.
    Done,
}

impl EpisodeState {
    pub const fn is_running(self) -> bool {
        matches!(self, Self::Running)
    }

    pub const fn is_done(self) -> bool {
        matches!(self, Self::Done)
    }
}

// ---------------------------------------------------------------------------
// Episode
// ---------------------------------------------------------------------------

/// Bevy resource tracking the current episode.
#[derive(Resource, Clone, Debug, Default)]
pub struct Episode {
    pub state: EpisodeState,
    /// Steps taken this episode. The gait clock reads this value.
    pub step_count: u32,
    pub total_reward: f32,
    /// Reward of the most recent step, penalties included.
    pub last_reward: f32,
    pub terminated: bool,
    pub truncated: bool,
    /// Seed passed to the last reset.
    pub seed: Option<u64>,
    /// Number of resets since app start.
    pub episode_number: u32,
}

impl Episode {
    /// Start a fresh episode.
    pub const fn reset(&mut self, seed: Option<u64>) {
        self.state = EpisodeState::Running;
        self.step_count = 0;
        self.total_reward = 0.0;
        self.last_reward = 0.0;
        self.terminated = false;
        self.truncated = false;
        self.seed = seed;
        self.episode_number += 1;
    }

    /// Advance the step counter. Returns `false` if the episode is not running.
    pub const fn begin_step(&mut self) -> bool {
        if !self.state.is_running() {
            return false;
        }
        self.step_count += 1;
        true
    }

    /// Record the finished step's reward.
    pub fn record(&mut self, reward: f32) {
        self.last_reward = reward;
        self.total_reward += reward;
    }

    pub const fn terminate(&mut self) {
        self.terminated = true;
    }

    /// Flag truncation once `step_count` reaches `max_steps`. The limit is
    /// always positive; config validation rejects zero.
    pub const fn check_truncation(&mut self, max_steps: u32) -> bool {
        if self.step_count >= max_steps {
            self.truncated = true;
        }
        self.truncated
    }

    /// Move to [`EpisodeState::Done`] if the step ended the episode.
    pub const fn settle(&mut self) {
        if self.terminated || self.truncated {
            self.state = EpisodeState::Done;
        }
    }

    pub const fn is_running(&self) -> bool {
        self.state.is_running()
    }

    pub const fn is_done(&self) -> bool {
        self.state.is_done()
    }
}

// ---------------------------------------------------------------------------
// Tests
// ---------------------------------------------------------------------------

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn default_is_idle() {
        let episode = Episode::default();
        assert_eq!(episode.state, EpisodeState::Idle);
        assert_eq!(episode.episode_number, 0);
    }

    #[test]
    fn idle_episode_does_not_step() {
        let mut episode = Episode::default();
        assert!(!episode.begin_step());
        assert_eq!(episode.step_count, 0);
    }

    #[test]
    fn reset_clears_everything() {
        let mut episode = Episode::default();
        episode.reset(Some(3));
        episode.begin_step();
        episode.record(2.0);
        episode.terminate();
        episode.settle();

        episode.reset(None);
        assert!(episode.is_running());
        assert_eq!(episode.step_count, 0);
        assert!(episode.total_reward.abs() < f32::EPSILON);
        assert!(!episode.terminated);
        assert!(!episode.truncated);
        assert_eq!(episode.seed, None);
        assert_eq!(episode.episode_number, 2);
    }

    #[test]
    fn record_accumulates() {
        let mut episode = Episode::default();
        episode.reset(None);
        episode.record(1.5);
        episode.record(-0.5);
        assert!((episode.total_reward - 1.0).abs() < f32::EPSILON);
        assert!((episode.last_reward + 0.5).abs() < f32::EPSILON);
    }

    #[test]
    fn truncation_fires_exactly_at_limit() {
        let mut episode = Episode::default();
        episode.reset(None);
        for _ in 0..1999 {
            episode.begin_step();
            assert!(!episode.check_truncation(2000));
        }
        episode.begin_step();
        assert!(episode.check_truncation(2000));
        assert_eq!(episode.step_count, 2000);
    }

    #[test]
    fn termination_and_truncation_can_coincide() {
        let mut episode = Episode::default();
        episode.reset(None);
        episode.step_count = 2000;
        episode.terminate();
        episode.check_truncation(2000);
        episode.settle();
        assert!(episode.is_done());
        assert!(episode.terminated && episode.truncated);
    }

    #[test]
    fn settle_keeps_running_episode() {
        let mut episode = Episode::default();
        episode.reset(None);
        episode.begin_step();
        episode.settle();
        assert!(episode.is_running());
    }

    #[test]
    fn done_episode_does_not_step() {
        let mut episode = Episode::default();
        episode.reset(None);
        episode.terminate();
        episode.settle();
        assert!(!episode.begin_step());
    }
}
