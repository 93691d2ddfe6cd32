use crate::error::Error;
use crate::mccfr::discount::Discount;
use crate::mccfr::epsilon::Adaptive;
use crate::mccfr::epsilon::Epsilon;
use crate::search::SearchConfig;
use serde::Deserialize;
use serde::Serialize;
use std::path::PathBuf;

/// the training horizon: a fixed iteration count or a
/// wall-clock budget, never both
#[derive(Debug, Clone, Copy, PartialEq)]
pub enum Horizon {
    Iterations(usize),
    WallClock(std::time::Duration),
}

/// every recognized training option. constructed in code or
/// deserialized by an external config loader; validated once
/// at startup so incompatible combinations fail fast.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct TrainConfig {
    pub num_iterations: Option<usize>,
    pub time_budget_seconds: Option<u64>,
    /// 0 auto-detects the cpu count
    pub num_workers: usize,
    /// iterations per merge cycle
    pub batch_size: usize,
    pub num_instances: usize,
    pub enable_chunked_training: bool,
    pub chunk_iterations: Option<usize>,
    pub chunk_minutes: Option<u64>,
    pub checkpoint_interval: usize,
    pub snapshot_interval_seconds: u64,
    pub exploration_epsilon: Option<f64>,
    pub epsilon_schedule: Option<Vec<(usize, f64)>>,
    pub adaptive_epsilon: Option<Adaptive>,
    pub discount: Discount,
    pub discount_interval: usize,
    pub enable_pruning: bool,
    pub pruning_threshold: f64,
    pub pruning_probability: f64,
    pub use_linear_weighting: bool,
    pub resume_from: Option<PathBuf>,
    pub run_seed: u64,
    pub workspace: PathBuf,
    pub search: SearchConfig,
}

impl Default for TrainConfig {
    fn default() -> Self {
        Self {
            num_iterations: Some(1_000_000),
            time_budget_seconds: None,
            num_workers: 0,
            batch_size: 256,
            num_instances: 1,
            enable_chunked_training: false,
            chunk_iterations: None,
            chunk_minutes: None,
            checkpoint_interval: 100_000,
            snapshot_interval_seconds: 900,
            exploration_epsilon: None,
            epsilon_schedule: None,
            adaptive_epsilon: None,
            discount: Discount::default(),
            discount_interval: 10_000,
            enable_pruning: true,
            pruning_threshold: crate::PRUNE_THRESHOLD,
            pruning_probability: crate::PRUNE_PROBABILITY,
            use_linear_weighting: true,
            resume_from: None,
            run_seed: 0x1BADB002,
            workspace: PathBuf::from("checkpoints"),
            search: SearchConfig::default(),
        }
    }
}

impl TrainConfig {
    pub fn validate(&self) -> Result<(), Error> {
        match (self.num_iterations, self.time_budget_seconds) {
            (Some(_), Some(_)) => {
                return Err(Error::Configuration(
                    "num_iterations and time_budget_seconds are mutually exclusive".into(),
                ))
            }
            (None, None) => {
                return Err(Error::Configuration(
                    "one of num_iterations or time_budget_seconds is required".into(),
                ))
            }
            _ => {}
        }
        if self.num_instances == 0 {
            return Err(Error::Configuration("num_instances must be at least 1".into()));
        }
        if self.num_instances > 1 && self.workers() > 1 {
            return Err(Error::Configuration(
                "multi-instance mode is incompatible with num_workers > 1".into(),
            ));
        }
        if self.enable_chunked_training {
            match (self.chunk_iterations, self.chunk_minutes) {
                (Some(_), Some(_)) | (None, None) => {
                    return Err(Error::Configuration(
                        "chunked training needs exactly one of chunk_iterations or chunk_minutes"
                            .into(),
                    ))
                }
                _ => {}
            }
        }
        if self.exploration_epsilon.is_some() && self.epsilon_schedule.is_some() {
            return Err(Error::Configuration(
                "exploration_epsilon and epsilon_schedule are mutually exclusive".into(),
            ));
        }
        if self.batch_size == 0 {
            return Err(Error::Configuration("batch_size must be positive".into()));
        }
        if self.checkpoint_interval == 0 || self.discount_interval == 0 {
            return Err(Error::Configuration(
                "checkpoint_interval and discount_interval must be positive".into(),
            ));
        }
        if !(0.0..=1.0).contains(&self.pruning_probability) {
            return Err(Error::Configuration(
                "pruning_probability must lie in [0, 1]".into(),
            ));
        }
        Ok(())
    }

    pub fn workers(&self) -> usize {
        match self.num_workers {
            0 => num_cpus::get(),
            n => n,
        }
    }

    pub fn horizon(&self) -> Horizon {
        match (self.num_iterations, self.time_budget_seconds) {
            (Some(n), None) => Horizon::Iterations(n),
            (None, Some(s)) => Horizon::WallClock(std::time::Duration::from_secs(s)),
            _ => unreachable!("validated at startup"),
        }
    }

    pub fn epsilon(&self) -> Epsilon {
        match (&self.exploration_epsilon, &self.epsilon_schedule) {
            (Some(epsilon), None) => Epsilon::constant(*epsilon),
            (None, Some(schedule)) => Epsilon::scheduled(schedule.clone(), self.adaptive_epsilon),
            _ => Epsilon::standard(self.num_iterations.unwrap_or(1_000_000)),
        }
    }

    pub fn prune(&self) -> Option<(f64, f64)> {
        if self.enable_pruning {
            Some((self.pruning_threshold, self.pruning_probability))
        } else {
            None
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn default_validates() {
        assert!(TrainConfig::default().validate().is_ok());
    }

    #[test]
    fn horizon_is_exclusive() {
        let mut config = TrainConfig::default();
        config.time_budget_seconds = Some(60);
        assert!(matches!(config.validate(), Err(Error::Configuration(_))));
        config.num_iterations = None;
        assert!(config.validate().is_ok());
        config.time_budget_seconds = None;
        assert!(matches!(config.validate(), Err(Error::Configuration(_))));
    }

    #[test]
    fn instances_exclude_workers() {
        let mut config = TrainConfig::default();
        config.num_instances = 4;
        config.num_workers = 2;
        assert!(matches!(config.validate(), Err(Error::Configuration(_))));
        config.num_workers = 1;
        assert!(config.validate().is_ok());
    }

    #[test]
    fn chunked_needs_a_size() {
        let mut config = TrainConfig::default();
        config.enable_chunked_training = true;
        assert!(matches!(config.validate(), Err(Error::Configuration(_))));
        config.chunk_iterations = Some(10_000);
        assert!(config.validate().is_ok());
        config.chunk_minutes = Some(30);
        assert!(matches!(config.validate(), Err(Error::Configuration(_))));
    }
}
