use crate::abstraction::Model;
use crate::abstraction::Observation;
use crate::gameplay::action::Action;
use crate::gameplay::game::Game;
use crate::mccfr::infoset::Infoset;
use crate::mccfr::path::Path;
use crate::mccfr::profile::Profile;
use rand::distr::weighted::WeightedIndex;
use rand::prelude::Distribution;
use rand::rngs::SmallRng;

/// the capability an agent exposes to whatever drives the
/// table. evaluation harnesses and baseline opponents both
/// live behind this.
pub trait ChooseAction {
    fn choose(&self, game: &Game, path: Path, seat: usize, rng: &mut SmallRng) -> Action;
}

/// plays the blueprint's average strategy directly
pub struct Advisor<'a> {
    pub blueprint: &'a Profile,
    pub model: &'a Model,
}

impl<'a> ChooseAction for Advisor<'a> {
    fn choose(&self, game: &Game, path: Path, seat: usize, rng: &mut SmallRng) -> Action {
        let edges = game.choices();
        let observation = Observation::from_game(game, seat);
        let infoset = Infoset::from((game.street(), self.model.bucket(&observation), path));
        let advice = self.blueprint.advice(&infoset, &edges);
        let weights = edges
            .iter()
            .map(|edge| advice[edge].max(crate::POLICY_MIN))
            .collect::<Vec<f64>>();
        let choice = WeightedIndex::new(&weights)
            .expect("advice has positive mass")
            .sample(rng);
        game.actionize(&edges[choice])
    }
}

/// the passive baseline: always checks or calls
pub struct Caller;

impl ChooseAction for Caller {
    fn choose(&self, game: &Game, _: Path, _: usize, _: &mut SmallRng) -> Action {
        game.actionize(&crate::gameplay::edge::Edge::Call)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::gameplay::turn::Turn;
    use rand::SeedableRng;

    #[test]
    fn caller_checks_down_every_hand() {
        let ref mut rng = SmallRng::seed_from_u64(2);
        let mut game = Game::root(rng);
        let caller = Caller;
        while !game.is_terminal() {
            game = match game.turn() {
                Turn::Chance => game.apply(Action::Draw(game.draw(rng))),
                Turn::Choice(seat) => {
                    game.apply(caller.choose(&game, Path::default(), seat, rng))
                }
                Turn::Terminal => unreachable!(),
            };
        }
        assert!(game.payoff(0) + game.payoff(1) == 0.0);
    }
}
