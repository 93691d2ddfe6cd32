use super::card::Card;
use super::hand::Hand;
use super::hole::Hole;
use super::street::Street;
use rand::rngs::SmallRng;
use rand::Rng;

/// the undealt remainder of a 52-card deck.
/// dealing is uniform without replacement; the caller's rng is
/// the sole source of stochasticity.
#[derive(Debug, Clone)]
pub struct Deck(Hand);

impl Deck {
    pub fn new() -> Self {
        Self(Hand::empty().complement())
    }
    pub fn size(&self) -> usize {
        self.0.size()
    }
    pub fn contains(&self, card: &Card) -> bool {
        self.0.contains(card)
    }
    pub fn deal(&mut self, rng: &mut SmallRng) -> Card {
        assert!(self.size() > 0);
        let card = self.0.nth(rng.random_range(0..self.size()));
        self.0.remove(card);
        card
    }
    pub fn hole(&mut self, rng: &mut SmallRng) -> Hole {
        Hole::from((self.deal(rng), self.deal(rng)))
    }
    /// the cards revealed when this street's betting closes
    pub fn reveal(&mut self, street: Street, rng: &mut SmallRng) -> Hand {
        (0..street.n_revealed())
            .map(|_| self.deal(rng))
            .map(Hand::from)
            .fold(Hand::empty(), Hand::add)
    }
}

/// a deck missing the given cards
impl From<Hand> for Deck {
    fn from(removed: Hand) -> Self {
        Self(removed.complement())
    }
}
impl From<Deck> for Hand {
    fn from(deck: Deck) -> Self {
        deck.0
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use rand::SeedableRng;

    #[test]
    fn no_replacement() {
        let ref mut rng = SmallRng::seed_from_u64(0);
        let mut deck = Deck::new();
        let mut seen = Hand::empty();
        for _ in 0..52 {
            seen.insert(deck.deal(rng));
        }
        assert!(seen.size() == 52);
        assert!(deck.size() == 0);
    }

    #[test]
    fn removal_respected() {
        let ref mut rng = SmallRng::seed_from_u64(1);
        let blocked = Hand::from(0b_111_u64);
        let mut deck = Deck::from(blocked);
        assert!(deck.size() == 49);
        for _ in 0..49 {
            let card = deck.deal(rng);
            assert!(!blocked.contains(&card));
        }
    }
}
