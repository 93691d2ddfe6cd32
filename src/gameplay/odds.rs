use crate::Chips;
use crate::Probability;

/// pot-normalized bet size as a reduced positive rational
#[derive(Debug, Clone, Copy, Eq, Hash, PartialEq, Ord, PartialOrd)]
pub struct Odds(pub Chips, pub Chips);

impl Odds {
    /// every pot fraction the action abstraction uses anywhere.
    /// pre-sorted ascending; nibble codes in Path index into this.
    pub const GRID: [Self; 8] = [
        Self(1, 4), // 0.25
        Self(1, 3), // 0.33
        Self(1, 2), // 0.50
        Self(2, 3), // 0.66
        Self(3, 4), // 0.75
        Self(1, 1), // 1.00
        Self(3, 2), // 1.50
        Self(2, 1), // 2.00
    ];

    pub fn position(&self) -> usize {
        Self::GRID
            .iter()
            .position(|o| o == self)
            .expect("odds on grid")
    }

    /// nearest grid member at or below the given chip ratio
    pub fn nearest((a, b): (Chips, Chips)) -> Self {
        let ratio = a as Probability / b as Probability;
        Self::GRID[Self::GRID
            .map(Probability::from)
            .binary_search_by(|p| p.partial_cmp(&ratio).expect("not NaN"))
            .unwrap_or_else(|i| i.saturating_sub(1))
            .min(Self::GRID.len() - 1)]
    }

    /// integer percent of pot, matching the infoset alphabet
    pub fn percent(&self) -> Chips {
        self.0 * 100 / self.1
    }
}

impl From<Odds> for Probability {
    fn from(odds: Odds) -> Self {
        odds.0 as Probability / odds.1 as Probability
    }
}

impl std::fmt::Display for Odds {
    fn fmt(&self, f: &mut std::fmt::Formatter) -> std::fmt::Result {
        write!(f, "B{}", self.percent())
    }
}

impl crate::Arbitrary for Odds {
    fn random() -> Self {
        use rand::prelude::IndexedRandom;
        let ref mut rng = rand::rng();
        Self::GRID.choose(rng).copied().expect("grid is non-empty")
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn grid_is_sorted() {
        let probs = Odds::GRID.map(Probability::from);
        assert!(probs.windows(2).all(|w| w[0] < w[1]));
    }

    #[test]
    fn percent_alphabet() {
        assert_eq!(Odds(1, 4).percent(), 25);
        assert_eq!(Odds(1, 3).percent(), 33);
        assert_eq!(Odds(2, 3).percent(), 66);
        assert_eq!(Odds(3, 2).percent(), 150);
    }

    #[test]
    fn nearest_snaps_down() {
        assert_eq!(Odds::nearest((2, 5)), Odds(1, 3)); // 0.40
        assert_eq!(Odds::nearest((1, 1)), Odds(1, 1));
        assert_eq!(Odds::nearest((9, 1)), Odds(2, 1)); // above grid
    }
}
