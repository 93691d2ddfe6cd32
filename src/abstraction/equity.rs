use crate::cards::board::Board;
use crate::cards::deck::Deck;
use crate::cards::hand::Hand;
use crate::cards::hole::Hole;
use crate::cards::street::Street;
use crate::cards::strength::Strength;
use crate::Probability;

/// win probability of a hole against a uniform random opponent.
/// exact enumeration on the river, seeded Monte-Carlo earlier.
/// deterministic given (hole, board, seed), so bucket assignment
/// is stable across processes and resumes.
pub fn equity(hole: Hole, board: Board, trials: usize, seed: u64) -> Probability {
    match board.street() {
        Street::Rive => exact(hole, board),
        _ => sampled(hole, board, trials, seed),
    }
}

/// equity after one more public card, averaged over a seeded
/// sample of completions. a cheap forward-looking signal for
/// the clustering features.
pub fn future(hole: Hole, board: Board, trials: usize, seed: u64) -> Probability {
    assert!(board.street() != Street::Rive);
    let ref mut rng = crate::rng(seed, (hole, board, "future"));
    let blocked = Hand::add(Hand::from(hole), Hand::from(board));
    let outer = trials.max(1) / 4 + 1;
    let inner = trials.max(1) / 4 + 1;
    (0..outer)
        .map(|i| {
            let mut deck = Deck::from(blocked);
            let reveal = deck.reveal(board.street(), rng);
            let mut next = board;
            next.add(reveal);
            sampled(hole, next, inner, seed ^ i as u64)
        })
        .sum::<Probability>()
        / outer as Probability
}

fn exact(hole: Hole, board: Board) -> Probability {
    let mine = Strength::from(Hand::add(Hand::from(hole), Hand::from(board)));
    let deck = Hand::from(Deck::from(Hand::add(Hand::from(hole), Hand::from(board))));
    let cards = deck.into_iter().collect::<Vec<_>>();
    let mut score = 0.0;
    let mut count = 0.0;
    for i in 0..cards.len() {
        for j in (i + 1)..cards.len() {
            let theirs = Strength::from(Hand::add(
                Hand::from(Hole::from((cards[i], cards[j]))),
                Hand::from(board),
            ));
            score += match mine.cmp(&theirs) {
                std::cmp::Ordering::Greater => 1.0,
                std::cmp::Ordering::Equal => 0.5,
                std::cmp::Ordering::Less => 0.0,
            };
            count += 1.0;
        }
    }
    score / count
}

fn sampled(hole: Hole, board: Board, trials: usize, seed: u64) -> Probability {
    let ref mut rng = crate::rng(seed, (hole, board));
    let blocked = Hand::add(Hand::from(hole), Hand::from(board));
    let mut score = 0.0;
    for _ in 0..trials {
        let mut deck = Deck::from(blocked);
        let theirs = deck.hole(rng);
        let mut runout = Hand::from(board);
        for street in Street::all().iter().skip(board.street() as usize) {
            match street {
                Street::Rive => break,
                _ => runout = Hand::add(runout, deck.reveal(*street, rng)),
            }
        }
        let mine = Strength::from(Hand::add(Hand::from(hole), runout));
        let theirs = Strength::from(Hand::add(Hand::from(theirs), runout));
        score += match mine.cmp(&theirs) {
            std::cmp::Ordering::Greater => 1.0,
            std::cmp::Ordering::Equal => 0.5,
            std::cmp::Ordering::Less => 0.0,
        };
    }
    score / trials as Probability
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::cards::card::Card;
    use crate::cards::rank::Rank;
    use crate::cards::suit::Suit;

    fn hole(a: (Rank, Suit), b: (Rank, Suit)) -> Hole {
        Hole::from((Card::from(a), Card::from(b)))
    }

    #[test]
    fn aces_beat_deuces_preflop() {
        let aces = hole((Rank::Ace, Suit::Spade), (Rank::Ace, Suit::Heart));
        let deuces = hole((Rank::Two, Suit::Club), (Rank::Two, Suit::Diamond));
        let board = Board::empty();
        let strong = equity(aces, board, 200, 7);
        let weak = equity(deuces, board, 200, 7);
        assert!(strong > 0.7);
        assert!(strong > weak);
    }

    #[test]
    fn nuts_have_full_equity_on_river() {
        let royal = hole((Rank::Ace, Suit::Spade), (Rank::King, Suit::Spade));
        let board = Board::from(Hand::from(vec![
            Card::from((Rank::Queen, Suit::Spade)),
            Card::from((Rank::Jack, Suit::Spade)),
            Card::from((Rank::Ten, Suit::Spade)),
            Card::from((Rank::Two, Suit::Heart)),
            Card::from((Rank::Seven, Suit::Diamond)),
        ]));
        assert!(equity(royal, board, 0, 0) == 1.0);
    }

    #[test]
    fn deterministic_given_seed() {
        let suited = hole((Rank::Jack, Suit::Heart), (Rank::Ten, Suit::Heart));
        let board = Board::empty();
        assert!(equity(suited, board, 100, 42) == equity(suited, board, 100, 42));
    }
}
