use super::action::Action;
use super::edge::Edge;
use super::seat::Seat;
use super::seat::State;
use super::settlement::Settlement;
use super::showdown::Showdown;
use super::turn::Turn;
use crate::abstraction::menu;
use crate::cards::board::Board;
use crate::cards::deck::Deck;
use crate::cards::hand::Hand;
use crate::cards::hole::Hole;
use crate::cards::street::Street;
use crate::cards::strength::Strength;
use crate::error::Error;
use crate::Chips;
use crate::Utility;
use crate::B_BLIND;
use crate::N;
use crate::S_BLIND;
use crate::STACK;
use rand::rngs::SmallRng;

/// the full table state between actions. copy-on-apply:
/// immutable methods expose the rules, apply() yields the
/// successor state. this is also the MCCFR node payload.
#[derive(Debug, Clone, Copy)]
pub struct Game {
    seats: [Seat; N],
    board: Board,
    pot: Chips,
    dealer: usize,
    actor: usize,
    raises: usize,
}

impl Game {
    /// a fresh hand: holes dealt from the caller's rng,
    /// blinds posted, dealer first to act preflop.
    pub fn root(rng: &mut SmallRng) -> Self {
        let mut deck = Deck::new();
        let mut game = Self {
            seats: [
                Seat::from((deck.hole(rng), STACK)),
                Seat::from((deck.hole(rng), STACK)),
            ],
            board: Board::empty(),
            pot: 0,
            dealer: 0,
            actor: 0,
            raises: 0,
        };
        game.post(game.dealer, S_BLIND);
        game.post(1 - game.dealer, B_BLIND);
        game.actor = game.dealer;
        game
    }

    /// reconstitute a mid-hand public state, e.g. at the root
    /// of a resolver subgame. the caller vouches for the chips.
    pub fn recall(
        seats: [Seat; N],
        board: Board,
        pot: Chips,
        dealer: usize,
        actor: usize,
        raises: usize,
    ) -> Result<Self, Error> {
        let game = Self {
            seats,
            board,
            pot,
            dealer,
            actor,
            raises,
        };
        game.audit()?;
        Ok(game)
    }

    pub fn pot(&self) -> Chips {
        self.pot
    }
    pub fn board(&self) -> Board {
        self.board
    }
    pub fn street(&self) -> Street {
        self.board.street()
    }
    pub fn dealer(&self) -> usize {
        self.dealer
    }
    pub fn raises(&self) -> usize {
        self.raises
    }
    pub fn actor(&self) -> &Seat {
        &self.seats[self.actor]
    }
    pub fn seat(&self, position: usize) -> &Seat {
        &self.seats[position]
    }
    pub fn seat_mut(&mut self, position: usize) -> &mut Seat {
        &mut self.seats[position]
    }
    /// the dealer closes the action postflop
    pub fn in_position(&self, position: usize) -> bool {
        position == self.dealer
    }
    pub fn facing_bet(&self) -> bool {
        self.to_call() > 0
    }

    pub fn turn(&self) -> Turn {
        if self.must_stop() {
            Turn::Terminal
        } else if self.must_deal() {
            Turn::Chance
        } else {
            Turn::Choice(self.actor)
        }
    }

    pub fn apply(&self, action: Action) -> Self {
        let mut child = self.clone();
        child.act(action);
        child
    }

    /// concrete legal actions at this state
    pub fn legal(&self) -> Vec<Action> {
        let mut options = Vec::new();
        if self.must_stop() {
            return options;
        }
        if self.must_deal() {
            return options;
        }
        if self.may_check() {
            options.push(Action::Check);
        }
        if self.may_fold() {
            options.push(Action::Fold);
        }
        if self.may_call() {
            options.push(Action::Call(self.to_call()));
        }
        if self.may_raise() {
            options.push(Action::Raise(self.to_raise()));
        }
        if self.may_shove() {
            options.push(Action::Shove(self.to_shove()));
        }
        assert!(!options.is_empty());
        options
    }

    /// the ordered abstract menu at this decision point,
    /// filtered for legality
    pub fn choices(&self) -> Vec<Edge> {
        assert!(self.turn().is_choice());
        menu(
            self.street(),
            self.in_position(self.actor),
            self.facing_bet(),
            self.raises,
        )
        .into_iter()
        .filter(|edge| match edge {
            Edge::Fold => self.may_fold(),
            Edge::Call => true,
            Edge::Raise(_) => self.may_raise(),
            Edge::Shove => self.may_shove(),
        })
        .collect()
    }

    /// abstract-to-concrete back-mapping: clamp to min-raise,
    /// integer chips, shove when the clamped amount covers the
    /// stack. not injective: neighboring fractions can land on
    /// the same chip amount.
    pub fn actionize(&self, edge: &Edge) -> Action {
        match edge {
            Edge::Fold => Action::Fold,
            Edge::Shove => Action::Shove(self.to_shove()),
            Edge::Call => match self.to_call() {
                0 => Action::Check,
                x if x >= self.to_shove() => Action::Shove(self.to_shove()),
                x => Action::Call(x),
            },
            Edge::Raise(odds) => {
                let min = self.to_raise();
                let max = self.to_shove();
                let bet = (self.pot as Utility * Utility::from(*odds)) as Chips;
                match bet {
                    bet if bet >= max => Action::Shove(max),
                    bet if bet <= min => Action::Raise(min),
                    bet => Action::Raise(bet),
                }
            }
        }
    }

    /// concrete-to-abstract: the inverse of actionize up to
    /// the grid, snapping raise amounts to the nearest pot
    /// fraction. used to extend infoset paths at play time.
    pub fn edgify(&self, action: &Action) -> Edge {
        match action {
            Action::Fold => Edge::Fold,
            Action::Check | Action::Call(_) | Action::Blind(_) => Edge::Call,
            Action::Shove(_) => Edge::Shove,
            Action::Raise(chips) => {
                Edge::Raise(crate::gameplay::odds::Odds::nearest((*chips, self.pot)))
            }
            Action::Draw(_) => panic!("chance is not an abstract action"),
        }
    }

    pub fn is_allowed(&self, action: &Action) -> bool {
        match action {
            Action::Blind(_) => false,
            Action::Check => self.turn().is_choice() && self.may_check(),
            Action::Fold => self.turn().is_choice() && self.may_fold(),
            Action::Call(x) => self.turn().is_choice() && self.may_call() && *x == self.to_call(),
            Action::Shove(x) => self.turn().is_choice() && self.may_shove() && *x == self.to_shove(),
            Action::Raise(x) => {
                self.turn().is_choice()
                    && self.may_raise()
                    && *x >= self.to_raise()
                    && *x < self.to_shove()
            }
            Action::Draw(cards) => {
                self.turn().is_chance()
                    && cards.size() == self.street().n_revealed()
                    && cards.into_iter().all(|c| self.deck().contains(&c))
            }
        }
    }

    /// re-deal one seat's hole cards, e.g. when a subgame
    /// samples opponent hands at its root
    pub fn with_cards(mut self, position: usize, hole: Hole) -> Self {
        let board = Hand::from(self.board);
        assert!(!board.contains(&hole.hi()) && !board.contains(&hole.lo()));
        let other = self.seats[1 - position].cards();
        assert!(hole.hi() != other.hi() && hole.hi() != other.lo());
        assert!(hole.lo() != other.hi() && hole.lo() != other.lo());
        self.seats[position].set_cards(hole);
        self
    }

    /// the community cards owed at this chance node
    pub fn draw(&self, rng: &mut SmallRng) -> Hand {
        assert!(self.turn().is_chance());
        self.deck().reveal(self.street(), rng)
    }

    /// cards unseen by the table
    pub fn deck(&self) -> Deck {
        let mut removed = Hand::from(self.board);
        for seat in self.seats.iter() {
            removed = Hand::add(removed, Hand::from(seat.cards()));
        }
        Deck::from(removed)
    }

    fn act(&mut self, action: Action) {
        assert!(self.is_allowed(&action), "illegal {} at\n{}", action, self);
        match action {
            Action::Blind(_) => unreachable!("blinds are posted at root"),
            Action::Check => {
                self.actor_mut().set_acted(true);
                self.rotate();
            }
            Action::Fold => {
                self.actor_mut().set_state(State::Folding);
                self.actor_mut().set_acted(true);
                self.rotate();
            }
            Action::Call(chips) => {
                self.bet(chips);
                self.actor_mut().set_acted(true);
                self.rotate();
            }
            Action::Raise(chips) => {
                self.bet(chips);
                self.actor_mut().set_acted(true);
                self.raises += 1;
                self.rotate();
            }
            Action::Shove(chips) => {
                let aggro = self.actor().stake() + chips > self.effective_stake();
                self.bet(chips);
                self.actor_mut().set_state(State::Shoving);
                self.actor_mut().set_acted(true);
                self.raises += if aggro { 1 } else { 0 };
                self.rotate();
            }
            Action::Draw(cards) => {
                self.board.add(cards);
                self.next_street();
            }
        }
    }

    fn post(&mut self, position: usize, blind: Chips) {
        let blind = blind.min(self.seats[position].stack());
        self.seats[position].bet(blind);
        self.pot += blind;
        if self.seats[position].stack() == 0 {
            self.seats[position].set_state(State::Shoving);
        }
    }

    fn bet(&mut self, chips: Chips) {
        self.actor_mut().bet(chips);
        self.pot += chips;
        if self.actor().stack() == 0 {
            self.actor_mut().set_state(State::Shoving);
        }
    }

    fn rotate(&mut self) {
        for step in 1..=N {
            let next = (self.actor + step) % N;
            if self.seats[next].state() == State::Betting {
                self.actor = next;
                return;
            }
        }
    }

    fn next_street(&mut self) {
        self.raises = 0;
        for seat in self.seats.iter_mut() {
            seat.reset_stake();
            seat.set_acted(false);
        }
        self.actor = (0..N)
            .map(|step| (1 - self.dealer + step) % N)
            .find(|&i| self.seats[i].state() == State::Betting)
            .unwrap_or(self.actor);
    }

    fn actor_mut(&mut self) -> &mut Seat {
        &mut self.seats[self.actor]
    }

    /// everyone folded but one
    fn is_everyone_folding(&self) -> bool {
        self.live().count() == 1
    }
    fn live(&self) -> impl Iterator<Item = &Seat> {
        self.seats.iter().filter(|s| s.state() != State::Folding)
    }
    fn betting(&self) -> impl Iterator<Item = &Seat> {
        self.seats.iter().filter(|s| s.state() == State::Betting)
    }
    pub fn effective_stake(&self) -> Chips {
        self.live().map(|s| s.stake()).max().expect("live seats")
    }

    /// the street's betting is settled: nobody can or needs
    /// to respond. one lone betting seat closes once it has
    /// covered the highest live stake; two need matched
    /// stakes and a chance to have acted (preserving the big
    /// blind's option preflop).
    fn round_closed(&self) -> bool {
        let stake = self.effective_stake();
        match self.betting().count() {
            0 => true,
            1 => self.betting().all(|s| s.stake() >= stake),
            _ => self.betting().all(|s| s.acted() && s.stake() == stake),
        }
    }

    fn must_stop(&self) -> bool {
        self.is_everyone_folding() || (self.street() == Street::Rive && self.round_closed())
    }
    fn must_deal(&self) -> bool {
        !self.is_everyone_folding() && self.street() != Street::Rive && self.round_closed()
    }

    fn may_check(&self) -> bool {
        self.to_call() == 0
    }
    fn may_fold(&self) -> bool {
        self.to_call() > 0
    }
    fn may_call(&self) -> bool {
        self.to_call() > 0 && self.to_call() < self.to_shove()
    }
    fn may_raise(&self) -> bool {
        self.to_raise() < self.to_shove()
    }
    fn may_shove(&self) -> bool {
        self.to_shove() > 0
    }

    pub fn to_call(&self) -> Chips {
        self.effective_stake() - self.actor().stake()
    }
    pub fn to_shove(&self) -> Chips {
        self.actor().stack()
    }
    /// minimum chips to put in now for a legal raise: cover
    /// the lead, then raise by at least the last increment
    /// (or a big blind)
    pub fn to_raise(&self) -> Chips {
        let (most, next) = self
            .live()
            .map(|s| s.stake())
            .fold((0, 0), |(most, next), stake| {
                if stake > most {
                    (stake, most)
                } else if stake > next {
                    (most, stake)
                } else {
                    (most, next)
                }
            });
        (most - self.actor().stake()) + std::cmp::max(most - next, B_BLIND)
    }

    pub fn is_terminal(&self) -> bool {
        self.turn().is_terminal()
    }

    pub fn settlements(&self) -> Vec<Settlement> {
        assert!(self.must_stop(), "settle only terminal states\n{}", self);
        Showdown::from(
            self.seats
                .iter()
                .map(|seat| {
                    Settlement::from((
                        seat.spent(),
                        seat.state(),
                        Strength::from(Hand::add(
                            Hand::from(seat.cards()),
                            Hand::from(self.board),
                        )),
                    ))
                })
                .collect::<Vec<Settlement>>(),
        )
        .settle()
    }

    /// chips won or lost by a seat over the whole hand
    pub fn payoff(&self, position: usize) -> Utility {
        self.settlements()
            .get(position)
            .map(|settlement| settlement.pnl() as Utility)
            .expect("position in bounds")
    }

    /// structural invariants. a violation is a bug in the
    /// rules engine, not in the caller.
    pub fn audit(&self) -> Result<(), Error> {
        if self.pot != self.seats.iter().map(|s| s.spent()).sum::<Chips>() {
            return Err(Error::InvariantViolation(format!(
                "pot {} != committed chips",
                self.pot
            )));
        }
        if self.seats.iter().any(|s| s.spent() > STACK) {
            return Err(Error::InvariantViolation(
                "seat committed beyond its stack".to_string(),
            ));
        }
        if self.seats.iter().any(|s| s.stake() > s.spent()) {
            return Err(Error::InvariantViolation(
                "street stake exceeds hand spend".to_string(),
            ));
        }
        if self.turn().is_choice() && self.actor().state() != State::Betting {
            return Err(Error::InvariantViolation(
                "actor is folded or all-in".to_string(),
            ));
        }
        Ok(())
    }
}

impl std::fmt::Display for Game {
    fn fmt(&self, f: &mut std::fmt::Formatter) -> std::fmt::Result {
        for seat in self.seats.iter() {
            write!(f, "{}", seat)?;
        }
        write!(f, " @ {:>4} {} {}", self.pot, self.board, self.street())
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use rand::SeedableRng;

    fn fresh() -> (Game, SmallRng) {
        let mut rng = SmallRng::seed_from_u64(0);
        let game = Game::root(&mut rng);
        (game, rng)
    }

    #[test]
    fn root_posts_blinds() {
        let (game, _) = fresh();
        assert!(game.street() == Street::Pref);
        assert!(game.pot() == S_BLIND + B_BLIND);
        assert!(game.turn() == Turn::Choice(0));
        assert!(game.to_call() == B_BLIND - S_BLIND);
    }

    #[test]
    fn instant_fold_ends_hand() {
        let (game, _) = fresh();
        let game = game.apply(Action::Fold);
        assert!(game.is_terminal());
        assert!(game.payoff(0) == -(S_BLIND as Utility));
        assert!(game.payoff(1) == S_BLIND as Utility);
    }

    #[test]
    fn big_blind_keeps_option() {
        let (game, _) = fresh();
        let game = game.apply(Action::Call(1));
        assert!(game.turn() == Turn::Choice(1), "bb still owed an action");
        let game = game.apply(Action::Check);
        assert!(game.turn() == Turn::Chance);
    }

    #[test]
    fn checked_down_to_showdown() {
        let (game, mut rng) = fresh();
        let mut game = game.apply(Action::Call(1)).apply(Action::Check);
        for _ in 0..3 {
            assert!(game.turn() == Turn::Chance);
            game = game.apply(Action::Draw(game.draw(&mut rng)));
            assert!(game.turn() == Turn::Choice(1), "oop acts first postflop");
            game = game.apply(Action::Check).apply(Action::Check);
        }
        assert!(game.is_terminal());
        assert!(game.street() == Street::Rive);
        assert!(game.payoff(0) + game.payoff(1) == 0.0, "zero sum");
    }

    #[test]
    fn shove_call_fast_forwards() {
        let (game, mut rng) = fresh();
        let game = game
            .apply(Action::Shove(STACK - S_BLIND))
            .apply(Action::Shove(STACK - B_BLIND));
        let mut game = game;
        for _ in 0..3 {
            assert!(game.turn() == Turn::Chance, "all-in deals out the board");
            game = game.apply(Action::Draw(game.draw(&mut rng)));
        }
        assert!(game.is_terminal());
        assert!(game.pot() == 2 * STACK);
    }

    #[test]
    fn min_raise_grows_with_last_raise() {
        let (game, _) = fresh();
        // sb completes, bb raises to 8 (puts in 6 more)
        let game = game.apply(Action::Call(1)).apply(Action::Raise(6));
        // facing a raise of 6, sb must put in 6 to call plus 6 to raise
        assert!(game.to_call() == 6);
        assert!(game.to_raise() == 12);
    }

    #[test]
    fn raises_counted_per_street() {
        let (game, mut rng) = fresh();
        let game = game.apply(Action::Call(1)).apply(Action::Raise(6));
        assert!(game.raises() == 1);
        let game = game.apply(Action::Call(6));
        let game = game.apply(Action::Draw(game.draw(&mut rng)));
        assert!(game.raises() == 0);
    }

    #[test]
    fn conservation_audit() {
        let (game, _) = fresh();
        let game = game.apply(Action::Call(1)).apply(Action::Raise(6));
        assert!(game.audit().is_ok());
    }

    /// random playouts: chips conserve, payoffs are zero-sum,
    /// and whoever shows down the strictly best hand never
    /// loses money on the hand
    #[test]
    fn random_hands_settle_consistently() {
        use crate::cards::strength::Strength;
        use crate::gameplay::seat::State;
        use rand::Rng;
        let ref mut rng = SmallRng::seed_from_u64(99);
        for _ in 0..200 {
            let mut game = Game::root(rng);
            while !game.is_terminal() {
                game = match game.turn() {
                    Turn::Chance => game.apply(Action::Draw(game.draw(rng))),
                    Turn::Terminal => unreachable!(),
                    Turn::Choice(_) => {
                        let legal = game.legal();
                        let action = legal[rng.random_range(0..legal.len())];
                        game.apply(action)
                    }
                };
                game.audit().unwrap();
            }
            let settlements = game.settlements();
            let risked = settlements.iter().map(|s| s.risked).sum::<Chips>();
            let reward = settlements.iter().map(|s| s.reward).sum::<Chips>();
            assert!(risked == reward);
            assert!(game.payoff(0) + game.payoff(1) == 0.0);
            let live = settlements
                .iter()
                .filter(|s| s.status != State::Folding)
                .collect::<Vec<_>>();
            if live.len() == 2 {
                let strengths = game
                    .seats
                    .iter()
                    .map(|s| {
                        Strength::from(Hand::add(
                            Hand::from(s.cards()),
                            Hand::from(game.board()),
                        ))
                    })
                    .collect::<Vec<Strength>>();
                if strengths[0] > strengths[1] {
                    assert!(settlements[0].pnl() >= 0);
                } else if strengths[1] > strengths[0] {
                    assert!(settlements[1].pnl() >= 0);
                }
            }
        }
    }
}
