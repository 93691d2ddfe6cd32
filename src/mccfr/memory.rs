use crate::Utility;

/// one (infoset, action) cell: cumulative counterfactual
/// regret and cumulative strategy weight. values here are
/// physical; the store's lazy scalars convert to logical.
#[derive(Debug, Default, Clone, Copy, PartialEq)]
pub struct Memory {
    pub regret: Utility,
    pub policy: Utility,
}

impl Memory {
    pub fn is_zero(&self) -> bool {
        self.regret == 0.0 && self.policy == 0.0
    }
}

impl From<(Utility, Utility)> for Memory {
    fn from((regret, policy): (Utility, Utility)) -> Self {
        Self { regret, policy }
    }
}

impl std::fmt::Display for Memory {
    fn fmt(&self, f: &mut std::fmt::Formatter) -> std::fmt::Result {
        write!(f, "R{:<+10.3} S{:<10.3}", self.regret, self.policy)
    }
}
