use super::infoset::Infoset;
use super::path::Path;
use super::profile::Profile;
use crate::abstraction::Model;
use crate::abstraction::Observation;
use crate::error::Error;
use crate::gameplay::action::Action;
use crate::gameplay::game::Game;
use crate::gameplay::turn::Turn;
use crate::Probability;
use crate::Utility;
use rand::distr::weighted::WeightedIndex;
use rand::prelude::Distribution;
use rand::rngs::SmallRng;
use rand::Rng;

/// what one episode reports back: the traverser's realized
/// utility plus counters for throughput and prune telemetry
#[derive(Debug, Default, Clone, Copy)]
pub struct Episode {
    pub utility: Utility,
    pub nodes: usize,
    pub prunes: usize,
    pub river_prunes: usize,
}

/// one outcome-sampling MCCFR episode: a single sampled
/// trajectory through a freshly dealt hand. chance nodes
/// sample uniformly, the opponent samples from its current
/// strategy, and the traverser mixes epsilon-greedily with
/// an importance-sampling correction on the sampled branch.
/// only the traverser's infosets receive updates.
pub struct Traversal<'a> {
    profile: &'a mut Profile,
    model: &'a Model,
    traverser: usize,
    t: usize,
    epsilon: f64,
    linear: bool,
    prune: Option<(Utility, Probability)>,
    rng: SmallRng,
    nodes: usize,
    prunes: usize,
    river_prunes: usize,
}

impl<'a> Traversal<'a> {
    /// the rng derives from (seed, t, traverser) alone, so a
    /// resumed run replays the exact sampling stream of an
    /// uninterrupted one.
    pub fn new(
        profile: &'a mut Profile,
        model: &'a Model,
        traverser: usize,
        t: usize,
        epsilon: f64,
        linear: bool,
        prune: Option<(Utility, Probability)>,
        seed: u64,
    ) -> Self {
        Self {
            profile,
            model,
            traverser,
            t,
            epsilon,
            linear,
            prune,
            rng: crate::rng(seed, (t, traverser)),
            nodes: 0,
            prunes: 0,
            river_prunes: 0,
        }
    }

    /// play out one episode and return the traverser's
    /// realized utility and counters for logging
    pub fn run(mut self) -> Result<Episode, Error> {
        let root = Game::root(&mut self.rng);
        root.audit()?;
        let utility = self.walk(root, Path::default(), 1.0)?;
        Ok(Episode {
            utility,
            nodes: self.nodes,
            prunes: self.prunes,
            river_prunes: self.river_prunes,
        })
    }

    fn walk(&mut self, game: Game, path: Path, reach: Probability) -> Result<Utility, Error> {
        match game.turn() {
            Turn::Terminal => Ok(game.payoff(self.traverser)),
            Turn::Chance => {
                let cards = game.draw(&mut self.rng);
                let child = game.apply(Action::Draw(cards));
                child.audit()?;
                let mut path = path;
                path.advance_street();
                self.walk(child, path, reach)
            }
            Turn::Choice(seat) if seat == self.traverser => self.decide(game, path, reach),
            Turn::Choice(_) => self.respond(game, path, reach),
        }
    }

    /// traverser decision: epsilon-greedy sample, recurse,
    /// then update regrets for every action and accumulate
    /// the linearly-weighted average strategy
    fn decide(&mut self, game: Game, path: Path, reach: Probability) -> Result<Utility, Error> {
        self.nodes += 1;
        let info = self.infoset(&game, path);
        let edges = game.choices();
        self.profile.witness(&info, &edges);
        if let Some((threshold, probability)) = self.prune {
            if self.profile.should_prune(&info, threshold)
                && self.rng.random::<Probability>() < probability
            {
                self.prunes += 1;
                if info.street == crate::cards::street::Street::Rive {
                    self.river_prunes += 1;
                }
                return Ok(0.0);
            }
        }
        let strategy = self.profile.strategy(&info);
        let uniform = self.epsilon / edges.len() as Probability;
        let mixture = edges
            .iter()
            .map(|edge| (1.0 - self.epsilon) * strategy[edge] + uniform)
            .collect::<Vec<Probability>>();
        let choice = WeightedIndex::new(&mixture)
            .expect("mixture has positive mass")
            .sample(&mut self.rng);
        let ref edge = edges[choice];
        let mut subpath = path;
        subpath.push(*edge);
        let child = game.apply(game.actionize(edge));
        child.audit()?;
        let value = self.walk(child, subpath, reach * strategy[edge])?;

        // importance-corrected counterfactual utilities: the
        // sampled branch is scaled by its sampling probability,
        // unsampled branches contribute zero this episode
        let corrected = value / mixture[choice];
        let baseline = strategy[edge] * corrected;
        let weight = if self.linear { self.t as f64 } else { 1.0 };
        for (i, edge) in edges.iter().enumerate() {
            let utility = if i == choice { corrected } else { 0.0 };
            self.profile
                .update_regret(&info, edge, utility - baseline, weight);
        }
        self.profile
            .accumulate_policy(&info, &strategy, weight * reach);
        Ok(baseline)
    }

    /// opponent decision: sample from the opponent's current
    /// strategy and pass through, no updates
    fn respond(&mut self, game: Game, path: Path, reach: Probability) -> Result<Utility, Error> {
        self.nodes += 1;
        let info = self.infoset(&game, path);
        let edges = game.choices();
        self.profile.witness(&info, &edges);
        let strategy = self.profile.strategy(&info);
        let weights = edges
            .iter()
            .map(|edge| strategy[edge])
            .collect::<Vec<Probability>>();
        let choice = WeightedIndex::new(&weights)
            .expect("strategy has positive mass")
            .sample(&mut self.rng);
        let ref edge = edges[choice];
        let mut subpath = path;
        subpath.push(*edge);
        let child = game.apply(game.actionize(edge));
        child.audit()?;
        self.walk(child, subpath, reach)
    }

    fn infoset(&self, game: &Game, path: Path) -> Infoset {
        let position = game.turn().position();
        let observation = Observation::from_game(game, position);
        Infoset::from((game.street(), self.model.bucket(&observation), path))
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::abstraction::BucketConfig;

    fn model() -> Model {
        Model::seeded(BucketConfig {
            k_pref: 4,
            k_flop: 4,
            k_turn: 4,
            k_rive: 4,
            ..BucketConfig::default()
        })
    }

    #[test]
    fn episodes_complete_and_discover_infosets() {
        let ref model = model();
        let mut profile = Profile::default();
        for t in 1..=8 {
            let traverser = t % crate::N;
            Traversal::new(&mut profile, model, traverser, t, 0.6, true, None, 42)
                .run()
                .unwrap();
        }
        assert!(profile.infosets() > 0);
    }

    #[test]
    fn episodes_are_deterministic_in_seed_and_t() {
        let ref model = model();
        let mut a = Profile::default();
        let mut b = Profile::default();
        for t in 1..=4 {
            Traversal::new(&mut a, model, t % 2, t, 0.5, true, None, 7)
                .run()
                .unwrap();
            Traversal::new(&mut b, model, t % 2, t, 0.5, true, None, 7)
                .run()
                .unwrap();
        }
        assert!(a.logical() == b.logical());
    }

    /// aggressive pruning never fires on the river even when
    /// every regret sits far below the threshold
    #[test]
    fn pruning_spares_the_river() {
        let ref model = model();
        let mut profile = Profile::default();
        let mut prunes = 0;
        let mut river_prunes = 0;
        for t in 1..=64 {
            let episode = Traversal::new(
                &mut profile,
                model,
                t % 2,
                t,
                0.6,
                true,
                Some((crate::Utility::MAX, 1.0)),
                13,
            )
            .run()
            .unwrap();
            prunes += episode.prunes;
            river_prunes += episode.river_prunes;
        }
        assert!(prunes > 0, "threshold above all regrets prunes eagerly");
        assert!(river_prunes == 0);
    }

    #[test]
    fn strategies_remain_distributions() {
        let ref model = model();
        let mut profile = Profile::default();
        for t in 1..=16 {
            Traversal::new(&mut profile, model, t % 2, t, 0.4, true, None, 3)
                .run()
                .unwrap();
        }
        assert!(profile.infosets() > 0);
        for info in profile.logical().keys() {
            let edges = profile.edges(info);
            let strategy = profile.strategy(info);
            let advice = profile.advice(info, &edges);
            assert!((strategy.values().sum::<Probability>() - 1.0).abs() < 1e-9);
            assert!((advice.values().sum::<Probability>() - 1.0).abs() < 1e-9);
            assert!(strategy.values().all(|p| *p >= 0.0));
            assert!(advice.values().all(|p| *p >= 0.0));
        }
    }
}
