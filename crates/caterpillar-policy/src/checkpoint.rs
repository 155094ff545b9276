//! Policy artifacts on disk.
//!
//! Checkpoints are JSON files named `<prefix>_<timesteps>_steps.json` in the
//! save directory; the final artifact has a fixed name next to them.

use std::fs;
use std::path::{Path, PathBuf};

use caterpillar_core::config::TrainingConfig;
use serde::{Deserialize, Serialize};
use tracing::{debug, info};

use crate::error::PolicyError;
use crate::linear::LinearPolicy;

// ---------------------------------------------------------------------------
// PolicyArtifact
// ---------------------------------------------------------------------------

/// A saved policy plus the training progress it was saved at.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct PolicyArtifact {
    /// Environment timesteps consumed when the artifact was written.
    pub timesteps: u64,
    /// Mean return of the latest update, if known.
    #[serde(default)]
    pub mean_return: Option<f32>,
    pub policy: LinearPolicy,
}

impl PolicyArtifact {
    pub const fn new(policy: LinearPolicy, timesteps: u64) -> Self {
        Self {
            timesteps,
            mean_return: None,
            policy,
        }
    }

    /// Write as pretty JSON, creating parent directories as needed.
    pub fn save(&self, path: &Path) -> Result<(), PolicyError> {
        if let Some(parent) = path.parent().filter(|p| !p.as_os_str().is_empty()) {
            fs::create_dir_all(parent).map_err(|e| PolicyError::io(parent, e))?;
        }
        let json = serde_json::to_string_pretty(self)?;
        fs::write(path, json).map_err(|e| PolicyError::io(path, e))?;
        debug!(path = %path.display(), timesteps = self.timesteps, "policy saved");
        Ok(())
    }

    pub fn load(path: &Path) -> Result<Self, PolicyError> {
        let json = fs::read_to_string(path).map_err(|e| PolicyError::io(path, e))?;
        let artifact: Self = serde_json::from_str(&json)?;
        artifact.policy.validate()?;
        Ok(artifact)
    }
}

// ---------------------------------------------------------------------------
// Paths
// ---------------------------------------------------------------------------

/// `<save_path>/<prefix>_<timesteps>_steps.json`
pub fn checkpoint_path(save_path: &Path, prefix: &str, timesteps: u64) -> PathBuf {
    save_path.join(format!("{prefix}_{timesteps}_steps.json"))
}

/// Most recently modified `*.json` file directly inside `dir`.
pub fn find_latest_checkpoint(dir: &Path) -> Option<PathBuf> {
    let entries = fs::read_dir(dir).ok()?;
    entries
        .filter_map(Result::ok)
        .map(|entry| entry.path())
        .filter(|path| path.is_file() && path.extension().is_some_and(|ext| ext == "json"))
        .filter_map(|path| {
            let modified = fs::metadata(&path).and_then(|m| m.modified()).ok()?;
            Some((modified, path))
        })
        .max_by(|(a, pa), (b, pb)| a.cmp(b).then_with(|| pa.cmp(pb)))
        .map(|(_, path)| path)
}

/// The artifact evaluation should load: the final model if present, else the
/// newest checkpoint.
pub fn resolve_policy_artifact(config: &TrainingConfig) -> Result<PathBuf, PolicyError> {
    let final_path = config.final_model_path();
    if final_path.is_file() {
        info!(path = %final_path.display(), "using final policy");
        return Ok(final_path);
    }
    match find_latest_checkpoint(&config.save_path) {
        Some(path) => {
            info!(path = %path.display(), "final policy missing, using latest checkpoint");
            Ok(path)
        }
        None => Err(PolicyError::NoArtifact(config.save_path.clone())),
    }
}

// ---------------------------------------------------------------------------
// Tests
// ---------------------------------------------------------------------------

#[cfg(test)]
mod tests {
    use super::*;

    fn scratch_dir(name: &str) -> PathBuf {
        let dir = std::env::temp_dir().join(format!("caterpillar_policy_{name}"));
        let _ = fs::remove_dir_all(&dir);
        fs::create_dir_all(&dir).unwrap();
        dir
    }

    fn sample_artifact(timesteps: u64) -> PolicyArtifact {
        let policy = LinearPolicy::from_params(2, 1, vec![0.1, -0.2, 0.3]).unwrap();
        PolicyArtifact::new(policy, timesteps)
    }

    #[test]
    fn checkpoint_name_format() {
        let path = checkpoint_path(Path::new("models"), "crawl_policy", 10000);
        assert_eq!(path, PathBuf::from("models/crawl_policy_10000_steps.json"));
    }

    #[test]
    fn save_and_load() {
        let dir = scratch_dir("save_load");
        let path = dir.join("nested").join("policy.json");
        let artifact = sample_artifact(42);
        artifact.save(&path).unwrap();
        assert_eq!(PolicyArtifact::load(&path).unwrap(), artifact);
    }

    #[test]
    fn load_rejects_inconsistent_shapes() {
        let dir = scratch_dir("bad_shape");
        let path = dir.join("bad.json");
        fs::write(
            &path,
            r#"{"timesteps":1,"policy":{"obs_dim":2,"act_dim":1,"weights":[0.0],"bias":[0.0]}}"#,
        )
        .unwrap();
        assert!(matches!(
            PolicyArtifact::load(&path),
            Err(PolicyError::ShapeMismatch { .. })
        ));
    }

    #[test]
    fn load_missing_file_is_io_error() {
        let err = PolicyArtifact::load(Path::new("/nonexistent/policy.json")).unwrap_err();
        assert!(matches!(err, PolicyError::Io { .. }));
    }

    #[test]
    fn latest_checkpoint_ignores_other_files() {
        let dir = scratch_dir("latest");
        fs::write(dir.join("notes.txt"), "x").unwrap();
        assert!(find_latest_checkpoint(&dir).is_none());
        sample_artifact(1).save(&dir.join("a.json")).unwrap();
        assert_eq!(find_latest_checkpoint(&dir), Some(dir.join("a.json")));
    }

    #[test]
    fn resolve_prefers_final_model() {
        let dir = scratch_dir("resolve_final");
        let config = TrainingConfig {
            save_path: dir.clone(),
            ..TrainingConfig::default()
        };
        sample_artifact(10000)
            .save(&checkpoint_path(&dir, "crawl_policy", 10000))
            .unwrap();
        assert_eq!(
            resolve_policy_artifact(&config).unwrap(),
            dir.join("crawl_policy_10000_steps.json")
        );
        sample_artifact(50000).save(&config.final_model_path()).unwrap();
        assert_eq!(
            resolve_policy_artifact(&config).unwrap(),
            config.final_model_path()
        );
    }

    #[test]
    fn resolve_without_artifacts_fails() {
        let dir = scratch_dir("resolve_empty");
        let config = TrainingConfig {
            save_path: dir.join("missing"),
            ..TrainingConfig::default()
        };
        assert!(matches!(
            resolve_policy_artifact(&config),
            Err(PolicyError::NoArtifact(_))
        ));
    }
}
