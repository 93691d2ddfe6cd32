use super::seat::State;
use super::settlement::Settlement;
use crate::Chips;

/// distributes the pot across main and side pots.
/// commitment levels are the distinct amounts risked; each
/// slice between consecutive levels goes to the strongest
/// live hand among seats committed at least that far.
pub struct Showdown(Vec<Settlement>);

impl From<Vec<Settlement>> for Showdown {
    fn from(entries: Vec<Settlement>) -> Self {
        Self(entries)
    }
}

impl Showdown {
    pub fn settle(mut self) -> Vec<Settlement> {
        let mut floor = 0;
        for level in self.levels() {
            let slice = self.slice(floor, level);
            self.award(slice, level);
            floor = level;
        }
        assert!(
            self.0.iter().map(|e| e.risked).sum::<Chips>()
                == self.0.iter().map(|e| e.reward).sum::<Chips>(),
            "pot conserved"
        );
        self.0
    }

    /// distinct commitment levels, ascending, over all seats.
    /// folded seats contribute dead chips but never levels of
    /// their own beyond what live seats cover; including them
    /// is harmless since unreachable slices refund the sole
    /// eligible seat.
    fn levels(&self) -> Vec<Chips> {
        let mut levels = self
            .0
            .iter()
            .map(|e| e.risked)
            .filter(|&r| r > 0)
            .collect::<Vec<Chips>>();
        levels.sort_unstable();
        levels.dedup();
        levels
    }

    /// chips committed between the previous level and this one
    fn slice(&self, floor: Chips, level: Chips) -> Chips {
        self.0
            .iter()
            .map(|e| e.risked.min(level) - e.risked.min(floor))
            .sum()
    }

    fn award(&mut self, slice: Chips, level: Chips) {
        let best = self
            .0
            .iter()
            .filter(|e| e.status != State::Folding)
            .filter(|e| e.risked >= level)
            .map(|e| e.strength)
            .max()
            .expect("at least one live seat per slice");
        let mut winners = self
            .0
            .iter_mut()
            .filter(|e| e.status != State::Folding)
            .filter(|e| e.risked >= level)
            .filter(|e| e.strength == best)
            .collect::<Vec<&mut Settlement>>();
        let share = slice / winners.len() as Chips;
        let extra = slice % winners.len() as Chips;
        for winner in winners.iter_mut() {
            winner.reward += share;
        }
        for winner in winners.iter_mut().take(extra as usize) {
            winner.reward += 1;
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::cards::hand::Hand;
    use crate::cards::strength::Strength;

    fn strength(cards: u64) -> Strength {
        Strength::from(Hand::from(cards))
    }

    /// seven low spades vs seven high spades gives a strict order
    fn weak() -> Strength {
        strength(0b_1000_1000_1000_1000_1000_1000_1000_u64)
    }
    fn strong() -> Strength {
        strength(0b_1000_1000_1000_1000_1000_1000_1000_u64 << 24)
    }

    #[test]
    fn winner_takes_pot() {
        let settled = Showdown::from(vec![
            Settlement::from((50, State::Betting, weak())),
            Settlement::from((50, State::Betting, strong())),
        ])
        .settle();
        assert_eq!(settled[0].reward, 0);
        assert_eq!(settled[1].reward, 100);
    }

    #[test]
    fn fold_forfeits() {
        let settled = Showdown::from(vec![
            Settlement::from((30, State::Folding, strong())),
            Settlement::from((50, State::Betting, weak())),
        ])
        .settle();
        assert_eq!(settled[0].reward, 0);
        assert_eq!(settled[1].reward, 80);
    }

    #[test]
    fn side_pot_refund() {
        // short stack shoves 40 with the best hand; caller risked 100.
        // the 60 uncalled chips return to the caller.
        let settled = Showdown::from(vec![
            Settlement::from((40, State::Shoving, strong())),
            Settlement::from((100, State::Betting, weak())),
        ])
        .settle();
        assert_eq!(settled[0].reward, 80);
        assert_eq!(settled[1].reward, 60);
    }

    #[test]
    fn chopped_pot_conserves_odd_chip() {
        let settled = Showdown::from(vec![
            Settlement::from((51, State::Betting, strong())),
            Settlement::from((50, State::Betting, strong())),
        ])
        .settle();
        assert_eq!(settled.iter().map(|e| e.reward).sum::<Chips>(), 101);
        assert!(settled[0].reward >= 50);
    }
}
