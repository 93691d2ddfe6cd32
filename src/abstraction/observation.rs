use super::config::BucketConfig;
use super::equity;
use crate::cards::board::Board;
use crate::cards::hand::Hand;
use crate::cards::hole::Hole;
use crate::cards::rank::Rank;
use crate::cards::ranking::Ranking;
use crate::cards::street::Street;
use crate::cards::evaluator::Evaluator;
use crate::gameplay::game::Game;
use crate::Chips;
use crate::STACK;

const EQUITY_TRIALS: usize = 48;

/// what one player can see at a decision point, plus the
/// chip context that shapes hand value. the input to bucket
/// assignment.
#[derive(Debug, Clone, Copy, Hash, PartialEq, Eq)]
pub struct Observation {
    pub hole: Hole,
    pub board: Board,
    pub pot: Chips,
    pub stack: Chips,
    pub position: bool,
}

/// made-hand category relative to the board, the first 12
/// dimensions of the postflop feature vector
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Category {
    Air = 0,
    WeakPair = 1,
    MidPair = 2,
    TopPair = 3,
    Overpair = 4,
    TwoPair = 5,
    Trips = 6,
    Straight = 7,
    Flush = 8,
    FullHouse = 9,
    Quads = 10,
    StraightFlush = 11,
}

impl Observation {
    pub fn from_game(game: &Game, position: usize) -> Self {
        Self {
            hole: game.seat(position).cards(),
            board: game.board(),
            pot: game.pot(),
            stack: game.seat(position).stack(),
            position: game.in_position(position),
        }
    }

    pub fn street(&self) -> Street {
        self.board.street()
    }

    pub fn features(&self, config: &BucketConfig) -> Vec<f64> {
        let features = match self.street() {
            Street::Pref => self.preflop(config),
            _ => self.postflop(config),
        };
        assert!(features.len() == BucketConfig::dims(self.street()));
        features
    }

    /// 10-dimensional preflop vector
    fn preflop(&self, config: &BucketConfig) -> Vec<f64> {
        let hi = u8::from(self.hole.hi().rank()) as f64;
        let lo = u8::from(self.hole.lo().rank()) as f64;
        let gap = self.hole.gap() as f64;
        let equity = equity::equity(self.hole, self.board, EQUITY_TRIALS, config.seed);
        vec![
            hi / 12.0,
            lo / 12.0,
            if self.hole.paired() { 1.0 } else { 0.0 },
            if self.hole.suited() { 1.0 } else { 0.0 },
            gap / 12.0,
            if self.hole.paired() {
                1.0
            } else {
                (1.0 - (gap - 1.0) / 4.0).max(0.0)
            },
            [self.hole.hi(), self.hole.lo()]
                .iter()
                .filter(|c| c.rank().is_broadway())
                .count() as f64
                / 2.0,
            if self.hole.paired() && self.hole.hi().rank() >= Rank::Queen {
                1.0
            } else {
                0.0
            },
            equity,
            self.chen() / 20.0,
        ]
    }

    /// 34-dimensional postflop vector
    fn postflop(&self, config: &BucketConfig) -> Vec<f64> {
        let mut features = Vec::with_capacity(34);
        let category = self.category();
        for i in 0..12 {
            features.push(if category as usize == i { 1.0 } else { 0.0 });
        }
        features.push(self.flush_draw());
        features.push(self.straight_draw());
        features.push(if self.flush_draw() >= 0.5 && self.straight_draw() >= 0.5 {
            1.0
        } else {
            0.0
        });
        features.extend(self.texture());
        features.push(equity::equity(self.hole, self.board, EQUITY_TRIALS, config.seed));
        features.push(match self.street() {
            Street::Rive => 0.5,
            _ => equity::future(self.hole, self.board, EQUITY_TRIALS, config.seed),
        });
        features.push(self.spr_bin() / 5.0);
        features.push(if self.position { 1.0 } else { 0.0 });
        features.push(u8::from(self.hole.hi().rank()) as f64 / 12.0);
        features.push(u8::from(self.hole.lo().rank()) as f64 / 12.0);
        features.push(if self.hole.suited() { 1.0 } else { 0.0 });
        features.push(if self.hole.paired() { 1.0 } else { 0.0 });
        features.push(self.overcards() / 2.0);
        features.push(u8::from(self.board_high()) as f64 / 12.0);
        features.push(self.pot as f64 / (2.0 * STACK as f64));
        features.push(self.stack as f64 / STACK as f64);
        features.push(self.street() as usize as f64 / 3.0);
        features.push(Hand::from(self.board).size() as f64 / 5.0);
        features
    }

    /// Chen-formula-style preflop score
    fn chen(&self) -> f64 {
        let hi = self.hole.hi().rank();
        let base = match hi {
            Rank::Ace => 10.0,
            Rank::King => 8.0,
            Rank::Queen => 7.0,
            Rank::Jack => 6.0,
            r => (u8::from(r) as f64 + 2.0) / 2.0,
        };
        let mut score = base;
        if self.hole.paired() {
            score = (base * 2.0).max(5.0);
        }
        if self.hole.suited() {
            score += 2.0;
        }
        score -= match self.hole.gap() {
            0 | 1 => 0.0,
            2 => 1.0,
            3 => 2.0,
            4 => 4.0,
            _ => 5.0,
        };
        score.max(0.0)
    }

    fn category(&self) -> Category {
        let full = Hand::add(Hand::from(self.hole), Hand::from(self.board));
        let board_high = self.board_high();
        match Evaluator::from(full).ranking() {
            Ranking::StraightFlush(_) => Category::StraightFlush,
            Ranking::FourOAK(_) => Category::Quads,
            Ranking::FullHouse(_, _) => Category::FullHouse,
            Ranking::Flush(_) => Category::Flush,
            Ranking::Straight(_) => Category::Straight,
            Ranking::ThreeOAK(_) => Category::Trips,
            Ranking::TwoPair(_, _) => Category::TwoPair,
            Ranking::OnePair(pair) => {
                if pair > board_high {
                    Category::Overpair
                } else if pair == board_high {
                    Category::TopPair
                } else if pair >= self.board_median() {
                    Category::MidPair
                } else {
                    Category::WeakPair
                }
            }
            Ranking::HighCard(_) => Category::Air,
        }
    }

    /// 0 none, 0.5 backdoor, 1 four-to-a-flush
    fn flush_draw(&self) -> f64 {
        let full = Hand::add(Hand::from(self.hole), Hand::from(self.board));
        let longest = crate::cards::suit::Suit::all()
            .iter()
            .map(|s| full.of(*s).count_ones())
            .max()
            .expect("four suits");
        match longest {
            0..=2 => 0.0,
            3 => 0.5,
            4 => 1.0,
            _ => 0.0, // made flush is a category, not a draw
        }
    }

    /// 0 none, 0.5 gutshot, 1 open-ended
    fn straight_draw(&self) -> f64 {
        let ranks = Hand::add(Hand::from(self.hole), Hand::from(self.board)).ranks();
        // bit 0 plays the ace low, bits 1..=13 are Two..=Ace
        let mask = ((ranks as u32) << 1) | ((ranks as u32 >> 12) & 1);
        if (0..10).any(|lo| (mask >> lo) & 0b11111 == 0b11111) {
            return 0.0; // made straight is a category, not a draw
        }
        if mask & mask << 1 & mask << 2 & mask << 3 != 0 {
            return 1.0;
        }
        if (0..10).any(|lo| ((mask >> lo) & 0b11111).count_ones() == 4) {
            return 0.5;
        }
        0.0
    }

    /// board-only texture flags: paired, two-tone, monotone,
    /// connected, broadway-high
    fn texture(&self) -> Vec<f64> {
        let board = Hand::from(self.board);
        let ranks = board.ranks();
        let paired = board.size() > ranks.count_ones() as usize;
        let suits = crate::cards::suit::Suit::all()
            .iter()
            .map(|s| board.of(*s).count_ones())
            .max()
            .expect("four suits");
        let connected = (0..11).any(|lo| ((ranks >> lo) & 0b111) == 0b111);
        vec![
            if paired { 1.0 } else { 0.0 },
            if suits >= 2 { 1.0 } else { 0.0 },
            if suits >= 3 { 1.0 } else { 0.0 },
            if connected { 1.0 } else { 0.0 },
            if self.board_high().is_broadway() { 1.0 } else { 0.0 },
        ]
    }

    fn board_high(&self) -> Rank {
        Hand::from(self.board)
            .into_iter()
            .map(|c| c.rank())
            .max()
            .unwrap_or(Rank::Two)
    }
    fn board_median(&self) -> Rank {
        let mut ranks = Hand::from(self.board)
            .into_iter()
            .map(|c| c.rank())
            .collect::<Vec<Rank>>();
        ranks.sort();
        ranks.get(ranks.len() / 2).copied().unwrap_or(Rank::Two)
    }
    fn overcards(&self) -> f64 {
        let high = self.board_high();
        [self.hole.hi(), self.hole.lo()]
            .iter()
            .filter(|c| c.rank() > high)
            .count() as f64
    }
    /// stack-to-pot ratio bucketed to [0, 5]
    fn spr_bin(&self) -> f64 {
        let spr = self.stack as f64 / self.pot.max(1) as f64;
        match spr {
            s if s < 0.5 => 0.0,
            s if s < 1.0 => 1.0,
            s if s < 2.0 => 2.0,
            s if s < 4.0 => 3.0,
            s if s < 8.0 => 4.0,
            _ => 5.0,
        }
    }
}

impl std::fmt::Display for Observation {
    fn fmt(&self, f: &mut std::fmt::Formatter) -> std::fmt::Result {
        write!(f, "{} | {}", self.hole, self.board)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::cards::card::Card;
    use crate::cards::suit::Suit;

    fn observe(hole: Vec<(Rank, Suit)>, board: Vec<(Rank, Suit)>) -> Observation {
        let hole = Hole::from((Card::from(hole[0]), Card::from(hole[1])));
        let board = Board::from(Hand::from(
            board.into_iter().map(Card::from).collect::<Vec<Card>>(),
        ));
        Observation {
            hole,
            board,
            pot: 10,
            stack: 100,
            position: true,
        }
    }

    #[test]
    fn dimensions_match_config() {
        let ref config = BucketConfig::default();
        let preflop = observe(
            vec![(Rank::Ace, Suit::Spade), (Rank::King, Suit::Spade)],
            vec![],
        );
        assert!(preflop.features(config).len() == 10);
        let flop = observe(
            vec![(Rank::Ace, Suit::Spade), (Rank::King, Suit::Spade)],
            vec![
                (Rank::Two, Suit::Heart),
                (Rank::Seven, Suit::Club),
                (Rank::Jack, Suit::Diamond),
            ],
        );
        assert!(flop.features(config).len() == 34);
    }

    #[test]
    fn overpair_categorized() {
        let obs = observe(
            vec![(Rank::Ace, Suit::Spade), (Rank::Ace, Suit::Heart)],
            vec![
                (Rank::Two, Suit::Heart),
                (Rank::Seven, Suit::Club),
                (Rank::Jack, Suit::Diamond),
            ],
        );
        assert!(obs.category() == Category::Overpair);
    }

    #[test]
    fn top_pair_categorized() {
        let obs = observe(
            vec![(Rank::Jack, Suit::Spade), (Rank::King, Suit::Heart)],
            vec![
                (Rank::Two, Suit::Heart),
                (Rank::Seven, Suit::Club),
                (Rank::Jack, Suit::Diamond),
            ],
        );
        assert!(obs.category() == Category::TopPair);
    }

    #[test]
    fn four_to_flush_is_a_draw() {
        let obs = observe(
            vec![(Rank::Ace, Suit::Spade), (Rank::King, Suit::Spade)],
            vec![
                (Rank::Two, Suit::Spade),
                (Rank::Seven, Suit::Spade),
                (Rank::Jack, Suit::Diamond),
            ],
        );
        assert!(obs.flush_draw() == 1.0);
    }
}
