use crate::cards::street::Street;

/// identity of a hand abstraction: cluster counts per street,
/// the training seed, and the feature schema version. the
/// digest over these plus the centroids gates checkpoint
/// resumption.
#[derive(Debug, Clone, Copy, PartialEq, Eq, serde::Serialize, serde::Deserialize)]
pub struct BucketConfig {
    pub k_pref: usize,
    pub k_flop: usize,
    pub k_turn: usize,
    pub k_rive: usize,
    pub seed: u64,
    pub feature_version: u32,
}

impl BucketConfig {
    pub fn ks(&self, street: Street) -> usize {
        match street {
            Street::Pref => self.k_pref,
            Street::Flop => self.k_flop,
            Street::Turn => self.k_turn,
            Street::Rive => self.k_rive,
        }
    }
    /// feature dimensionality per street
    pub const fn dims(street: Street) -> usize {
        match street {
            Street::Pref => 10,
            _ => 34,
        }
    }
}

impl Default for BucketConfig {
    fn default() -> Self {
        Self {
            k_pref: 24,
            k_flop: 128,
            k_turn: 144,
            k_rive: 101,
            seed: 0x5EED,
            feature_version: 2,
        }
    }
}

impl std::fmt::Display for BucketConfig {
    fn fmt(&self, f: &mut std::fmt::Formatter) -> std::fmt::Result {
        write!(
            f,
            "v{} k=({},{},{},{}) seed={:#x}",
            self.feature_version, self.k_pref, self.k_flop, self.k_turn, self.k_rive, self.seed
        )
    }
}
