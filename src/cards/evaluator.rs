use super::hand::Hand;
use super::kicks::Kickers;
use super::rank::Rank;
use super::ranking::Ranking;
use super::strength::Strength;
use super::suit::Suit;

/// finds the best 5-card ranking within a set of up to 7 cards.
/// works from per-rank counts and per-suit rank masks, searching
/// categories from the top down.
pub struct Evaluator {
    counts: [u8; 13],
    suits: [u16; 4],
    ranks: u16,
}

impl From<Hand> for Evaluator {
    fn from(hand: Hand) -> Self {
        let mut counts = [0u8; 13];
        let mut suits = [0u16; 4];
        let mut ranks = 0u16;
        for card in hand {
            counts[u8::from(card.rank()) as usize] += 1;
            suits[u8::from(card.suit()) as usize] |= u16::from(card.rank());
            ranks |= u16::from(card.rank());
        }
        Self {
            counts,
            suits,
            ranks,
        }
    }
}

impl Evaluator {
    pub fn strength(&self) -> Strength {
        let ranking = self.ranking();
        let kicks = self.kickers(ranking);
        Strength::from((ranking, kicks))
    }

    pub fn ranking(&self) -> Ranking {
        None.or_else(|| self.straight_flush())
            .or_else(|| self.four_oak())
            .or_else(|| self.full_house())
            .or_else(|| self.flush())
            .or_else(|| self.straight())
            .or_else(|| self.three_oak())
            .or_else(|| self.two_pair())
            .or_else(|| self.one_pair())
            .or_else(|| self.high_card())
            .expect("at least one card")
    }

    fn kickers(&self, ranking: Ranking) -> Kickers {
        let (used, pool, n) = match ranking {
            Ranking::HighCard(hi) => (u16::from(hi), self.ranks, 4),
            Ranking::OnePair(r) => (u16::from(r), self.ranks, 3),
            Ranking::ThreeOAK(r) => (u16::from(r), self.ranks, 2),
            Ranking::FourOAK(r) => (u16::from(r), self.ranks, 1),
            Ranking::TwoPair(hi, lo) => (u16::from(hi) | u16::from(lo), self.ranks, 1),
            Ranking::Flush(hi) => {
                let suit = self.flush_suit().expect("flush was found");
                (u16::from(hi), self.suits[suit as usize], 4)
            }
            _ => return Kickers::default(),
        };
        Kickers::from(Self::top_n(pool & !used, n))
    }

    /// keep only the n highest set bits
    fn top_n(mask: u16, n: u32) -> u16 {
        let mut bits = mask;
        while bits.count_ones() > n {
            bits &= bits - 1;
        }
        bits
    }

    /// highest rank completing a 5-long run, wheel-aware
    fn straight_high(mask: u16) -> Option<Rank> {
        const WHEEL: u16 = 0b_1_0000_0000_1111;
        let run = mask & mask << 1 & mask << 2 & mask << 3 & mask << 4;
        if run != 0 {
            Some(Rank::from(run))
        } else if mask & WHEEL == WHEEL {
            Some(Rank::Five)
        } else {
            None
        }
    }

    fn flush_suit(&self) -> Option<Suit> {
        self.suits
            .iter()
            .position(|mask| mask.count_ones() >= 5)
            .map(|i| Suit::from(i as u8))
    }

    /// highest rank held by at least n cards, below an optional cap
    fn oak(&self, n: u8, below: Option<Rank>) -> Option<Rank> {
        let cap = below.map(|r| u8::from(r)).unwrap_or(13);
        (0..cap)
            .rev()
            .find(|&r| self.counts[r as usize] >= n)
            .map(Rank::from)
    }

    fn straight_flush(&self) -> Option<Ranking> {
        self.flush_suit()
            .and_then(|suit| Self::straight_high(self.suits[suit as usize]))
            .map(Ranking::StraightFlush)
    }
    fn four_oak(&self) -> Option<Ranking> {
        self.oak(4, None).map(Ranking::FourOAK)
    }
    fn full_house(&self) -> Option<Ranking> {
        self.oak(3, None).and_then(|trips| {
            (0u8..13)
                .rev()
                .map(Rank::from)
                .filter(|r| *r != trips)
                .find(|r| self.counts[u8::from(*r) as usize] >= 2)
                .map(|pair| Ranking::FullHouse(trips, pair))
        })
    }
    fn flush(&self) -> Option<Ranking> {
        self.flush_suit()
            .map(|suit| Ranking::Flush(Rank::from(self.suits[suit as usize])))
    }
    fn straight(&self) -> Option<Ranking> {
        Self::straight_high(self.ranks).map(Ranking::Straight)
    }
    fn three_oak(&self) -> Option<Ranking> {
        self.oak(3, None).map(Ranking::ThreeOAK)
    }
    fn two_pair(&self) -> Option<Ranking> {
        self.oak(2, None).and_then(|hi| {
            self.oak(2, Some(hi))
                .map(|lo| Ranking::TwoPair(hi, lo))
        })
    }
    fn one_pair(&self) -> Option<Ranking> {
        self.oak(2, None).map(Ranking::OnePair)
    }
    fn high_card(&self) -> Option<Ranking> {
        self.oak(1, None).map(Ranking::HighCard)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::cards::card::Card;

    fn ranking(cards: Vec<(Rank, Suit)>) -> Ranking {
        Evaluator::from(Hand::from(
            cards
                .into_iter()
                .map(Card::from)
                .collect::<Vec<Card>>(),
        ))
        .ranking()
    }

    #[test]
    fn high_card() {
        assert_eq!(
            ranking(vec![
                (Rank::Ace, Suit::Spade),
                (Rank::King, Suit::Heart),
                (Rank::Queen, Suit::Diamond),
                (Rank::Jack, Suit::Club),
                (Rank::Nine, Suit::Spade),
            ]),
            Ranking::HighCard(Rank::Ace)
        );
    }

    #[test]
    fn two_pair_over_three() {
        assert_eq!(
            ranking(vec![
                (Rank::Ace, Suit::Spade),
                (Rank::Ace, Suit::Heart),
                (Rank::King, Suit::Diamond),
                (Rank::King, Suit::Club),
                (Rank::Queen, Suit::Spade),
                (Rank::Queen, Suit::Heart),
                (Rank::Jack, Suit::Diamond),
            ]),
            Ranking::TwoPair(Rank::Ace, Rank::King)
        );
    }

    #[test]
    fn wheel() {
        assert_eq!(
            ranking(vec![
                (Rank::Ace, Suit::Spade),
                (Rank::Two, Suit::Heart),
                (Rank::Three, Suit::Diamond),
                (Rank::Four, Suit::Club),
                (Rank::Five, Suit::Spade),
            ]),
            Ranking::Straight(Rank::Five)
        );
    }

    #[test]
    fn two_trips_make_full_house() {
        assert_eq!(
            ranking(vec![
                (Rank::Ace, Suit::Spade),
                (Rank::Ace, Suit::Heart),
                (Rank::Ace, Suit::Diamond),
                (Rank::King, Suit::Club),
                (Rank::King, Suit::Spade),
                (Rank::King, Suit::Heart),
                (Rank::Queen, Suit::Diamond),
            ]),
            Ranking::FullHouse(Rank::Ace, Rank::King)
        );
    }

    #[test]
    fn flush_beats_straight() {
        assert_eq!(
            ranking(vec![
                (Rank::Four, Suit::Heart),
                (Rank::Six, Suit::Heart),
                (Rank::Seven, Suit::Heart),
                (Rank::Eight, Suit::Heart),
                (Rank::Nine, Suit::Heart),
                (Rank::Ten, Suit::Spade),
            ]),
            Ranking::Flush(Rank::Nine)
        );
    }

    #[test]
    fn steel_wheel() {
        assert_eq!(
            ranking(vec![
                (Rank::Ace, Suit::Club),
                (Rank::Two, Suit::Club),
                (Rank::Three, Suit::Club),
                (Rank::Four, Suit::Club),
                (Rank::Five, Suit::Club),
            ]),
            Ranking::StraightFlush(Rank::Five)
        );
    }

    #[test]
    fn kickers_break_ties() {
        let better = Strength::from(Hand::from(vec![
            Card::from((Rank::Ace, Suit::Spade)),
            Card::from((Rank::Ace, Suit::Heart)),
            Card::from((Rank::King, Suit::Diamond)),
            Card::from((Rank::Queen, Suit::Club)),
            Card::from((Rank::Nine, Suit::Spade)),
        ]));
        let worse = Strength::from(Hand::from(vec![
            Card::from((Rank::Ace, Suit::Diamond)),
            Card::from((Rank::Ace, Suit::Club)),
            Card::from((Rank::King, Suit::Spade)),
            Card::from((Rank::Jack, Suit::Heart)),
            Card::from((Rank::Nine, Suit::Club)),
        ]));
        assert!(better > worse);
    }

    #[test]
    fn quads_over_full_house() {
        assert_eq!(
            ranking(vec![
                (Rank::Ace, Suit::Spade),
                (Rank::Ace, Suit::Heart),
                (Rank::Ace, Suit::Diamond),
                (Rank::Ace, Suit::Club),
                (Rank::King, Suit::Spade),
                (Rank::King, Suit::Heart),
                (Rank::Queen, Suit::Diamond),
            ]),
            Ranking::FourOAK(Rank::Ace)
        );
    }
}
