use crate::cards::street::Street;
use serde::Deserialize;
use serde::Serialize;

/// how boundary nodes of the depth-limited subgame are valued
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum LeafPolicy {
    Blueprint,
    Fold,
    Call,
    Raise,
}

/// knobs for the real-time resolver. the time budget is a
/// wall-clock bound the solve loop checks cooperatively;
/// min_iterations is honored even past the budget, up to the
/// hard ceiling of max_iterations.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct SearchConfig {
    pub time_budget_ms: u64,
    pub min_iterations: usize,
    pub max_iterations: usize,
    pub max_depth: usize,
    pub kl_weight_flop: f64,
    pub kl_weight_turn: f64,
    pub kl_weight_river: f64,
    pub kl_weight_oop_bonus: f64,
    /// public-card sampling, active only with enable_sampling
    pub samples_per_solve: usize,
    pub enable_sampling: bool,
    pub use_leaf_policies: bool,
    pub leaf_policy_default: LeafPolicy,
    pub resolve_from_round_start: bool,
    pub sentinel_probability: f64,
}

impl SearchConfig {
    /// per-street KL-to-blueprint weight, with the positional
    /// bonus applied when the hero is out of position
    pub fn kl_weight(&self, street: Street, out_of_position: bool) -> f64 {
        let base = match street {
            Street::Pref | Street::Flop => self.kl_weight_flop,
            Street::Turn => self.kl_weight_turn,
            Street::Rive => self.kl_weight_river,
        };
        base + if out_of_position {
            self.kl_weight_oop_bonus
        } else {
            0.0
        }
    }

    /// how many public-card completions one decision solves
    pub fn samples(&self) -> usize {
        if self.enable_sampling {
            self.samples_per_solve.max(1)
        } else {
            1
        }
    }

    pub fn leaf_policy(&self) -> LeafPolicy {
        if self.use_leaf_policies {
            self.leaf_policy_default
        } else {
            LeafPolicy::Blueprint
        }
    }
}

impl Default for SearchConfig {
    fn default() -> Self {
        Self {
            time_budget_ms: 80,
            min_iterations: 100,
            max_iterations: 10_000,
            max_depth: 1,
            kl_weight_flop: 0.3,
            kl_weight_turn: 0.2,
            kl_weight_river: 0.1,
            kl_weight_oop_bonus: 0.1,
            samples_per_solve: 1,
            enable_sampling: false,
            use_leaf_policies: false,
            leaf_policy_default: LeafPolicy::Blueprint,
            resolve_from_round_start: true,
            sentinel_probability: 0.02,
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn sampling_gate() {
        let mut config = SearchConfig::default();
        config.samples_per_solve = 4;
        assert!(config.samples() == 1, "disabled sampling solves once");
        config.enable_sampling = true;
        assert!(config.samples() == 4);
    }

    #[test]
    fn leaf_policy_gate() {
        let mut config = SearchConfig::default();
        config.leaf_policy_default = LeafPolicy::Fold;
        assert!(config.leaf_policy() == LeafPolicy::Blueprint);
        config.use_leaf_policies = true;
        assert!(config.leaf_policy() == LeafPolicy::Fold);
    }
}
