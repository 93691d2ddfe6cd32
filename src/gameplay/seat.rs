use crate::cards::hole::Hole;
use crate::Chips;

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum State {
    Betting,
    Folding,
    Shoving,
}

impl std::fmt::Display for State {
    fn fmt(&self, f: &mut std::fmt::Formatter) -> std::fmt::Result {
        match self {
            State::Betting => write!(f, "B"),
            State::Folding => write!(f, "F"),
            State::Shoving => write!(f, "S"),
        }
    }
}

/// per-seat chips and status. stake is this street's
/// commitment, spent is the whole hand's.
#[derive(Debug, Clone, Copy)]
pub struct Seat {
    cards: Hole,
    stack: Chips,
    stake: Chips,
    spent: Chips,
    state: State,
    acted: bool,
}

impl Seat {
    pub fn cards(&self) -> Hole {
        self.cards
    }
    pub fn stack(&self) -> Chips {
        self.stack
    }
    pub fn stake(&self) -> Chips {
        self.stake
    }
    pub fn spent(&self) -> Chips {
        self.spent
    }
    pub fn state(&self) -> State {
        self.state
    }
    pub fn acted(&self) -> bool {
        self.acted
    }

    pub fn set_cards(&mut self, cards: Hole) {
        self.cards = cards;
    }
    pub fn set_state(&mut self, state: State) {
        self.state = state;
    }
    pub fn set_acted(&mut self, acted: bool) {
        self.acted = acted;
    }
    /// commit chips this street. shoves are detected by
    /// the caller when the stack hits zero.
    pub fn bet(&mut self, chips: Chips) {
        assert!(chips <= self.stack, "bet within stack");
        self.stack -= chips;
        self.stake += chips;
        self.spent += chips;
    }
    pub fn win(&mut self, chips: Chips) {
        self.stack += chips;
    }
    pub fn reset_stake(&mut self) {
        self.stake = 0;
    }
}

impl From<(Hole, Chips)> for Seat {
    fn from((cards, stack): (Hole, Chips)) -> Self {
        Self {
            cards,
            stack,
            stake: 0,
            spent: 0,
            state: State::Betting,
            acted: false,
        }
    }
}

impl std::fmt::Display for Seat {
    fn fmt(&self, f: &mut std::fmt::Formatter) -> std::fmt::Result {
        write!(f, "{}{:<6}", self.state, self.stack)
    }
}
