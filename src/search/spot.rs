use crate::abstraction::Model;
use crate::abstraction::Observation;
use crate::error::Error;
use crate::gameplay::edge::Edge;
use crate::gameplay::game::Game;
use crate::gameplay::turn::Turn;
use crate::mccfr::infoset::Infoset;
use crate::mccfr::path::Path;

/// the hero's situation at play time, anchored at a street
/// start. `history` is the actual in-street action sequence
/// (both seats) leading to the hero's decision; during
/// re-solving the hero's entries on that line are frozen
/// while the opponent's are not, which is the documented
/// unsafe-search construction.
#[derive(Debug, Clone)]
pub struct Spot {
    root: Game,
    history: Vec<Edge>,
    prefix: Path,
    hero: usize,
}

impl Spot {
    /// validate and build. refuses when the replayed history
    /// does not land on a hero decision or violates the
    /// engine's invariants.
    pub fn build(root: Game, history: Vec<Edge>, prefix: Path, hero: usize) -> Result<Self, Error> {
        root.audit()?;
        let spot = Self {
            root,
            history,
            prefix,
            hero,
        };
        let current = spot.current()?;
        match current.turn() {
            Turn::Choice(seat) if seat == hero => Ok(spot),
            turn => Err(Error::InvariantViolation(format!(
                "subgame history ends at {} instead of hero seat {}",
                turn, hero
            ))),
        }
    }

    pub fn root(&self) -> &Game {
        &self.root
    }
    pub fn history(&self) -> &[Edge] {
        &self.history
    }
    pub fn prefix(&self) -> Path {
        self.prefix
    }
    pub fn hero(&self) -> usize {
        self.hero
    }

    /// the state at the hero's actual decision point
    pub fn current(&self) -> Result<Game, Error> {
        let mut game = self.root;
        for edge in self.history.iter() {
            if !game.turn().is_choice() {
                return Err(Error::InvariantViolation(
                    "subgame history crosses a street boundary".into(),
                ));
            }
            let action = game.actionize(edge);
            if !game.is_allowed(&action) {
                return Err(Error::InvariantViolation(format!(
                    "history action {} is illegal",
                    action
                )));
            }
            game = game.apply(action);
            game.audit()?;
        }
        Ok(game)
    }

    /// the abstract path at the hero's decision, prior
    /// streets plus the observed in-street sequence
    pub fn path(&self) -> Path {
        let mut path = self.prefix;
        for edge in self.history.iter() {
            path.push(*edge);
        }
        path
    }

    pub fn infoset(&self, model: &Model) -> Result<Infoset, Error> {
        let current = self.current()?;
        let observation = Observation::from_game(&current, self.hero);
        Ok(Infoset::from((
            current.street(),
            model.bucket(&observation),
            self.path(),
        )))
    }

    pub fn choices(&self) -> Result<Vec<Edge>, Error> {
        Ok(self.current()?.choices())
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::gameplay::action::Action;
    use rand::rngs::SmallRng;
    use rand::SeedableRng;

    fn preflop_spot() -> Spot {
        let ref mut rng = SmallRng::seed_from_u64(0);
        let root = Game::root(rng);
        Spot::build(root, vec![], Path::default(), 0).unwrap()
    }

    #[test]
    fn hero_to_act_validates() {
        let spot = preflop_spot();
        assert!(spot.current().unwrap().turn() == Turn::Choice(0));
        assert!(!spot.choices().unwrap().is_empty());
    }

    #[test]
    fn wrong_seat_refuses() {
        let ref mut rng = SmallRng::seed_from_u64(0);
        let root = Game::root(rng);
        assert!(matches!(
            Spot::build(root, vec![], Path::default(), 1),
            Err(Error::InvariantViolation(_))
        ));
    }

    #[test]
    fn history_replays_to_hero() {
        let ref mut rng = SmallRng::seed_from_u64(0);
        let root = Game::root(rng);
        let spot = Spot::build(root, vec![Edge::Call], Path::default(), 1).unwrap();
        let current = spot.current().unwrap();
        assert!(current.turn() == Turn::Choice(1));
        assert!(current.pot() == 4);
    }

    #[test]
    fn terminal_history_refuses() {
        let ref mut rng = SmallRng::seed_from_u64(0);
        let root = Game::root(rng);
        let folded = root.apply(Action::Fold);
        assert!(folded.is_terminal());
        assert!(Spot::build(root, vec![Edge::Fold], Path::default(), 1).is_err());
    }
}
