use super::card::Card;
use super::hand::Hand;

/// two private cards, stored high-card-first
#[derive(Debug, Clone, Copy, Hash, PartialEq, Eq, PartialOrd, Ord)]
pub struct Hole(Card, Card);

impl Hole {
    pub fn hi(&self) -> Card {
        self.0
    }
    pub fn lo(&self) -> Card {
        self.1
    }
    pub fn suited(&self) -> bool {
        self.0.suit() == self.1.suit()
    }
    pub fn paired(&self) -> bool {
        self.0.rank() == self.1.rank()
    }
    /// rank distance, 0 for pairs
    pub fn gap(&self) -> u8 {
        u8::from(self.0.rank()) - u8::from(self.1.rank())
    }
}

impl From<(Card, Card)> for Hole {
    fn from((a, b): (Card, Card)) -> Self {
        assert!(a != b);
        if a.rank() >= b.rank() {
            Self(a, b)
        } else {
            Self(b, a)
        }
    }
}

impl From<Hole> for Hand {
    fn from(hole: Hole) -> Self {
        Hand::add(Hand::from(hole.0), Hand::from(hole.1))
    }
}

impl std::fmt::Display for Hole {
    fn fmt(&self, f: &mut std::fmt::Formatter) -> std::fmt::Result {
        write!(f, "{}{}", self.0, self.1)
    }
}

impl crate::Arbitrary for Hole {
    fn random() -> Self {
        use crate::Arbitrary;
        let a = Card::random();
        loop {
            let b = Card::random();
            if b != a {
                return Self::from((a, b));
            }
        }
    }
}
