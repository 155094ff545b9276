//! Augmented random search over a [`LinearPolicy`].

use std::path::PathBuf;

use caterpillar_core::config::TrainingConfig;
use caterpillar_core::types::Action;
use caterpillar_gym::Environment;
use caterpillar_policy::{LinearPolicy, PolicyArtifact, checkpoint_path};
use rand::{Rng, SeedableRng};
use rand_chacha::ChaCha8Rng;
use rand_distr::StandardNormal;
use tracing::{debug, info};

use crate::error::TrainError;

/// Outcome of a finished [`RandomSearchTrainer::train`] run.
#[derive(Debug, Clone, PartialEq)]
pub struct TrainingSummary {
    pub iterations: u32,
    pub timesteps: u64,
    pub best_return: f32,
    pub checkpoints: Vec<PathBuf>,
    pub final_model: PathBuf,
}

/// One scored direction: `(δ, return of θ+νδ, return of θ−νδ)`.
type ScoredDirection = (Vec<f32>, f32, f32);

/// Random-search trainer generic over the environment.
pub struct RandomSearchTrainer<E: Environment> {
    env: E,
    config: TrainingConfig,
    policy: LinearPolicy,
    rng: ChaCha8Rng,
    timesteps: u64,
    iteration: u32,
    best_return: f32,
    last_mean_return: Option<f32>,
    checkpoints: Vec<PathBuf>,
}

impl<E: Environment> RandomSearchTrainer<E> {
    /// Start from the all-zero (neutral) policy.
    pub fn new(env: E, config: TrainingConfig) -> Result<Self, TrainError> {
        config.validate()?;
        let policy = LinearPolicy::zeros(
            env.observation_space().size(),
            env.action_space().size(),
        );
        Ok(Self {
            rng: ChaCha8Rng::seed_from_u64(config.seed),
            env,
            config,
            policy,
            timesteps: 0,
            iteration: 0,
            best_return: f32::NEG_INFINITY,
            last_mean_return: None,
            checkpoints: Vec::new(),
        })
    }

    /// Continue from an existing policy.
    pub fn with_policy(mut self, policy: LinearPolicy) -> Result<Self, TrainError> {
        let (obs_dim, act_dim) = (
            self.env.observation_space().size(),
            self.env.action_space().size(),
        );
        if policy.obs_dim() != obs_dim || policy.act_dim() != act_dim {
            return Err(caterpillar_policy::PolicyError::ShapeMismatch {
                expected: LinearPolicy::param_count(obs_dim, act_dim),
                got: LinearPolicy::param_count(policy.obs_dim(), policy.act_dim()),
            }
            .into());
        }
        self.policy = policy;
        Ok(self)
    }

    pub const fn policy(&self) -> &LinearPolicy {
        &self.policy
    }

    pub const fn timesteps(&self) -> u64 {
        self.timesteps
    }

    pub fn into_env(self) -> E {
        self.env
    }

    fn budget_left(&self) -> bool {
        self.timesteps < self.config.total_timesteps
    }

    /// Run until the timestep budget is spent, then write the final artifact.
    pub fn train(&mut self) -> Result<TrainingSummary, TrainError> {
        info!(
            total_timesteps = self.config.total_timesteps,
            params = self.policy.params().len(),
            "training started"
        );
        while self.budget_left() {
            self.iterate()?;
        }

        let final_model = self.config.final_model_path();
        self.artifact().save(&final_model)?;
        info!(
            path = %final_model.display(),
            timesteps = self.timesteps,
            "final policy saved"
        );
        self.env.close();

        Ok(TrainingSummary {
            iterations: self.iteration,
            timesteps: self.timesteps,
            best_return: self.best_return,
            checkpoints: self.checkpoints.clone(),
            final_model,
        })
    }

    /// One search iteration. Returns the mean return over all rollouts.
    pub fn iterate(&mut self) -> Result<f32, TrainError> {
        let base = self.policy.params();
        let noise = self.config.exploration_noise;
        let mut scored: Vec<ScoredDirection> = Vec::with_capacity(self.config.directions);

        for _ in 0..self.config.directions {
            if !self.budget_left() {
                break;
            }
            let delta: Vec<f32> = (0..base.len())
                .map(|_| self.rng.sample::<f32, _>(StandardNormal))
                .collect();
            let plus = self.rollout(&perturb(&base, &delta, noise))?;
            let minus = self.rollout(&perturb(&base, &delta, -noise))?;
            scored.push((delta, plus, minus));
        }
        if scored.is_empty() {
            return Ok(0.0);
        }

        let returns: Vec<f32> = scored.iter().flat_map(|(_, p, m)| [*p, *m]).collect();
        let mean_return = returns.iter().sum::<f32>() / returns.len() as f32;
        let iteration_best = returns.iter().copied().fold(f32::NEG_INFINITY, f32::max);
        self.best_return = self.best_return.max(iteration_best);

        scored.sort_by(|a, b| a.1.max(a.2).total_cmp(&b.1.max(b.2)).reverse());
        scored.truncate(self.config.top_directions);
        let updated = self.update(&base, &scored);
        self.policy = LinearPolicy::from_params(self.policy.obs_dim(), self.policy.act_dim(), updated)?;

        self.iteration += 1;
        self.last_mean_return = Some(mean_return);
        info!(
            iteration = self.iteration,
            timesteps = self.timesteps,
            mean_return,
            best_return = self.best_return,
            "search iteration"
        );
        Ok(mean_return)
    }

    /// `θ + α / (b·σ_R) · Σ (r⁺ − r⁻)·δ` over the kept directions.
    fn update(&self, base: &[f32], kept: &[ScoredDirection]) -> Vec<f32> {
        let used: Vec<f32> = kept.iter().flat_map(|(_, p, m)| [*p, *m]).collect();
        let mean = used.iter().sum::<f32>() / used.len() as f32;
        let variance = used.iter().map(|r| (r - mean).powi(2)).sum::<f32>() / used.len() as f32;
        let std = variance.sqrt();
        let scale = self.config.step_size / (kept.len() as f32 * if std > 1e-8 { std } else { 1.0 });

        let mut params = base.to_vec();
        for (delta, plus, minus) in kept {
            let weight = scale * (plus - minus);
            for (p, d) in params.iter_mut().zip(delta) {
                *p += weight * d;
            }
        }
        params
    }

    /// Play one episode (capped at the rollout horizon) and return its return.
    fn rollout(&mut self, params: &[f32]) -> Result<f32, TrainError> {
        let policy =
            LinearPolicy::from_params(self.policy.obs_dim(), self.policy.act_dim(), params.to_vec())?;
        let mut obs = self.env.reset(None)?.observation;
        let mut total = 0.0;

        for _ in 0..self.config.rollout_horizon {
            if !self.budget_left() {
                break;
            }
            let action = Action::new(policy.act(obs.as_slice())?);
            let result = self.env.step(&action)?;
            total += result.reward;
            self.timesteps += 1;
            self.maybe_checkpoint()?;
            if result.is_done() {
                break;
            }
            obs = result.observation;
        }
        debug!(total, timesteps = self.timesteps, "rollout finished");
        Ok(total)
    }

    /// Save the current policy whenever the step count hits a checkpoint multiple.
    fn maybe_checkpoint(&mut self) -> Result<(), TrainError> {
        if self.timesteps % self.config.checkpoint_freq != 0 {
            return Ok(());
        }
        let path = checkpoint_path(&self.config.save_path, &self.config.name_prefix, self.timesteps);
        self.artifact().save(&path)?;
        info!(path = %path.display(), timesteps = self.timesteps, "checkpoint saved");
        self.checkpoints.push(path);
        Ok(())
    }

    fn artifact(&self) -> PolicyArtifact {
        let mut artifact = PolicyArtifact::new(self.policy.clone(), self.timesteps);
        artifact.mean_return = self.last_mean_return;
        artifact
    }
}

fn perturb(base: &[f32], delta: &[f32], scale: f32) -> Vec<f32> {
    base.iter().zip(delta).map(|(b, d)| scale.mul_add(*d, *b)).collect()
}

// ---------------------------------------------------------------------------
// Tests
// ---------------------------------------------------------------------------
