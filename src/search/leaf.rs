use super::config::LeafPolicy;
use crate::abstraction::Model;
use crate::abstraction::Observation;
use crate::gameplay::edge::Edge;
use crate::gameplay::game::Game;
use crate::gameplay::turn::Turn;
use crate::mccfr::infoset::Infoset;
use crate::mccfr::path::Path;
use crate::mccfr::profile::Profile;
use crate::Utility;
use crate::LEAF_ROLLOUTS;
use rand::distr::weighted::WeightedIndex;
use rand::prelude::Distribution;

/// values a node at the subgame's depth boundary. the core
/// is agnostic to how: blueprint rollouts here, or a learned
/// counterfactual-value network behind the same trait.
pub trait LeafEvaluator: Sync {
    fn evaluate(&self, game: &Game, path: Path, hero: usize) -> Utility;
}

/// rolls the hand out to a terminal under a fixed
/// continuation policy and averages a few seeded runs.
/// Blueprint samples both seats from the trained average
/// strategy; Fold / Call / Raise assume the matching
/// stereotyped continuation.
pub struct RolloutLeaf<'a> {
    pub blueprint: &'a Profile,
    pub model: &'a Model,
    pub policy: LeafPolicy,
    pub seed: u64,
}

impl<'a> LeafEvaluator for RolloutLeaf<'a> {
    fn evaluate(&self, game: &Game, path: Path, hero: usize) -> Utility {
        (0..LEAF_ROLLOUTS)
            .map(|i| self.rollout(game, path, hero, i))
            .sum::<Utility>()
            / LEAF_ROLLOUTS as Utility
    }
}

impl<'a> RolloutLeaf<'a> {
    fn rollout(&self, game: &Game, path: Path, hero: usize, salt: usize) -> Utility {
        let ref mut rng = crate::rng(self.seed, (path, salt, game.pot()));
        let mut game = *game;
        let mut path = path;
        loop {
            match game.turn() {
                Turn::Terminal => return game.payoff(hero),
                Turn::Chance => {
                    let cards = game.draw(rng);
                    game = game.apply(crate::gameplay::action::Action::Draw(cards));
                    path.advance_street();
                }
                Turn::Choice(seat) => {
                    let edges = game.choices();
                    let edge = match self.policy {
                        LeafPolicy::Blueprint => self.sample(&game, seat, path, &edges, rng),
                        LeafPolicy::Fold => Self::prefer(&edges, |e| *e == Edge::Fold),
                        LeafPolicy::Call => Edge::Call,
                        LeafPolicy::Raise => Self::prefer(&edges, Edge::is_aggro),
                    };
                    path.push(edge);
                    game = game.apply(game.actionize(&edge));
                }
            }
        }
    }

    fn prefer(edges: &[Edge], wanted: impl Fn(&Edge) -> bool) -> Edge {
        edges.iter().copied().find(wanted).unwrap_or(Edge::Call)
    }

    fn sample(
        &self,
        game: &Game,
        seat: usize,
        path: Path,
        edges: &[Edge],
        rng: &mut rand::rngs::SmallRng,
    ) -> Edge {
        let observation = Observation::from_game(game, seat);
        let infoset = Infoset::from((game.street(), self.model.bucket(&observation), path));
        let advice = self.blueprint.advice(&infoset, edges);
        let weights = edges
            .iter()
            .map(|edge| advice[edge].max(crate::POLICY_MIN))
            .collect::<Vec<f64>>();
        let choice = WeightedIndex::new(&weights)
            .expect("advice has positive mass")
            .sample(rng);
        edges[choice]
    }
}
