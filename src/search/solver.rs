use super::config::SearchConfig;
use super::leaf::LeafEvaluator;
use super::leaf::RolloutLeaf;
use super::spot::Spot;
use super::telemetry::Telemetry;
use crate::abstraction::Model;
use crate::abstraction::Observation;
use crate::cards::card::Card;
use crate::cards::deck::Deck;
use crate::cards::hand::Hand;
use crate::cards::hole::Hole;
use crate::error::Error;
use crate::gameplay::action::Action;
use crate::gameplay::edge::Edge;
use crate::gameplay::game::Game;
use crate::gameplay::turn::Turn;
use crate::mccfr::infoset::Infoset;
use crate::mccfr::path::Path;
use crate::mccfr::profile::Policy;
use crate::mccfr::profile::Profile;
use crate::Probability;
use crate::Utility;
use crate::OPPONENT_SAMPLES;
use crate::WARM_START_SCALE;
use rayon::prelude::*;
use std::collections::BTreeMap;
use std::time::Duration;
use std::time::Instant;

/// grace past the soft budget while still short of
/// min_iterations; past this the solve is abandoned and the
/// caller falls back to the blueprint
const HARD_BUDGET_FACTOR: u32 = 2;

/// what the resolver hands back: a distribution over the
/// hero's legal abstract actions plus the call's telemetry
pub struct Resolution {
    pub policy: Policy,
    pub telemetry: Telemetry,
}

/// the depth-limited subgame re-solver. per hero decision it
/// rebuilds a bounded subgame at the current public state,
/// warm-starts from the blueprint, runs KL-regularized CFR
/// under a cooperative deadline, and falls back to the
/// blueprint average strategy on any failure.
///
/// per call: INIT -> BUILD_SUBGAME -> WARM_START ->
/// SOLVE_LOOP -> RETURN, with failure edges from build and
/// solve into FALLBACK.
pub struct Resolver<'a> {
    pub blueprint: &'a Profile,
    pub model: &'a Model,
    pub config: SearchConfig,
}

impl<'a> Resolver<'a> {
    /// never fails: the fallback path returns the blueprint's
    /// average strategy at the hero's infoset
    pub fn resolve(&self, spot: &Spot) -> Resolution {
        let started = Instant::now();
        match self.attempt(spot, started) {
            Ok((policy, iterations, variance)) => {
                let policy = self.sentinels(policy);
                let telemetry = self.telemetry(spot, &policy, started, iterations, variance, false);
                telemetry.emit();
                Resolution { policy, telemetry }
            }
            Err(error) => {
                match error {
                    Error::ResolverTimeout { iterations } => {
                        log::debug!("resolver fallback after {} iterations", iterations)
                    }
                    ref error => log::warn!("resolver fallback: {}", error),
                }
                let policy = self.fallback(spot);
                let telemetry = self.telemetry(spot, &policy, started, 0, 0.0, true);
                telemetry.emit();
                Resolution { policy, telemetry }
            }
        }
    }

    /// the blueprint's average strategy at the hero's infoset
    pub fn fallback(&self, spot: &Spot) -> Policy {
        match (spot.infoset(self.model), spot.choices()) {
            (Ok(ref infoset), Ok(ref edges)) => self.blueprint.advice(infoset, edges),
            // the public state is beyond reconstruction; the
            // check/call action is legal everywhere
            _ => std::iter::once((Edge::Call, 1.0)).collect(),
        }
    }

    fn attempt(
        &self,
        spot: &Spot,
        started: Instant,
    ) -> Result<(Policy, usize, f64), Error> {
        let edges = spot.choices()?;
        let samples = self.config.samples();
        let budget = Duration::from_millis(self.config.time_budget_ms) / samples as u32;
        let solved = match samples {
            1 => vec![self.solve_once(spot, 0, budget)?],
            _ => (0..samples)
                .into_par_iter()
                .map(|sample| self.solve_once(spot, sample, budget))
                .collect::<Result<Vec<(Policy, usize)>, Error>>()?,
        };
        let iterations = solved.iter().map(|(_, i)| *i).sum::<usize>();
        let mean = edges
            .iter()
            .map(|edge| {
                (
                    *edge,
                    solved
                        .iter()
                        .map(|(policy, _)| policy.get(edge).copied().unwrap_or(0.0))
                        .sum::<Probability>()
                        / solved.len() as Probability,
                )
            })
            .collect::<Policy>();
        let variance = edges
            .iter()
            .map(|edge| {
                let mu = mean[edge];
                solved
                    .iter()
                    .map(|(policy, _)| policy.get(edge).copied().unwrap_or(0.0) - mu)
                    .map(|d| d * d)
                    .sum::<f64>()
                    / solved.len() as f64
            })
            .sum::<f64>()
            / edges.len().max(1) as f64;
        Ok((mean, iterations, variance))
    }

    /// solve the subgame on one pinned public-card completion
    fn solve_once(
        &self,
        spot: &Spot,
        sample: usize,
        budget: Duration,
    ) -> Result<(Policy, usize), Error> {
        let started = Instant::now();
        let current = spot.current()?;
        let hero = spot.hero();
        let hole = current.seat(hero).cards();
        let seed = self.seed(spot, sample);
        let ref mut rng = crate::rng(seed, "solve");

        // BUILD_SUBGAME: pin this sample's board completion,
        // then sample opponent holes from what remains
        let known = Hand::add(Hand::from(current.board()), Hand::from(hole));
        let mut deck = Deck::from(known);
        let runout = (0..5 - current.board().street().n_observed())
            .map(|_| deck.deal(rng))
            .collect::<Vec<Card>>();
        let opponents = (0..OPPONENT_SAMPLES)
            .map(|_| deck.clone().hole(rng))
            .collect::<Vec<Hole>>();

        let leaf = RolloutLeaf {
            blueprint: self.blueprint,
            model: self.model,
            policy: self.config.leaf_policy(),
            seed,
        };

        // without round-start re-solving the subgame roots at
        // the decision itself and nothing is frozen
        let (anchor, prefix, frozen) = if self.config.resolve_from_round_start {
            (*spot.root(), spot.prefix(), Some(0))
        } else {
            (current, spot.path(), None)
        };

        // WARM_START happens lazily as infosets are first
        // witnessed inside the loop; SOLVE_LOOP checks the
        // deadline cooperatively between iterations, and the
        // traversal itself aborts at the hard deadline so one
        // wide pass cannot blow the wall-clock bound
        let deadline = started + budget * HARD_BUDGET_FACTOR;
        let mut local = Profile::default();
        let mut iterations = 0;
        while iterations < self.config.max_iterations {
            let elapsed = started.elapsed();
            if elapsed >= budget && iterations >= self.config.min_iterations {
                break;
            }
            if elapsed >= budget * HARD_BUDGET_FACTOR {
                break;
            }
            let villain = opponents[iterations % opponents.len()];
            let root = anchor.with_cards(1 - hero, villain);
            match self.cfr(
                &mut local,
                &leaf,
                spot,
                root,
                prefix,
                frozen,
                [1.0, 1.0],
                0,
                &runout,
                0,
                (iterations + 1) as f64,
                deadline,
            ) {
                Ok(_) => iterations += 1,
                Err(Error::ResolverTimeout { .. }) => break,
                Err(error) => return Err(error),
            }
        }
        if iterations < self.config.min_iterations {
            return Err(Error::ResolverTimeout { iterations });
        }
        let infoset = spot.infoset(self.model)?;
        let edges = spot.choices()?;
        Ok((local.advice(&infoset, &edges), iterations))
    }

    /// chance-sampled vanilla CFR over the bounded subgame.
    /// both seats' regrets update each pass; hero regrets
    /// carry the KL-to-blueprint penalty. returns utility
    /// from the hero's perspective (the game is zero-sum).
    #[allow(clippy::too_many_arguments)]
    fn cfr(
        &self,
        local: &mut Profile,
        leaf: &dyn LeafEvaluator,
        spot: &Spot,
        game: Game,
        path: Path,
        frozen: Option<usize>,
        reach: [Probability; 2],
        depth: usize,
        runout: &[Card],
        dealt: usize,
        weight: f64,
        deadline: Instant,
    ) -> Result<Utility, Error> {
        let hero = spot.hero();
        match game.turn() {
            Turn::Terminal => Ok(game.payoff(hero)),
            Turn::Chance => {
                if Instant::now() >= deadline {
                    return Err(Error::ResolverTimeout { iterations: 0 });
                }
                if depth >= self.config.max_depth {
                    return Ok(leaf.evaluate(&game, path, hero));
                }
                let n = game.street().n_revealed();
                let cards = runout[dealt..dealt + n]
                    .iter()
                    .copied()
                    .map(Hand::from)
                    .fold(Hand::empty(), Hand::add);
                let child = game.apply(Action::Draw(cards));
                let mut path = path;
                path.advance_street();
                self.cfr(
                    local,
                    leaf,
                    spot,
                    child,
                    path,
                    None,
                    reach,
                    depth + 1,
                    runout,
                    dealt + n,
                    weight,
                    deadline,
                )
            }
            Turn::Choice(seat) => {
                if Instant::now() >= deadline {
                    return Err(Error::ResolverTimeout { iterations: 0 });
                }
                // frozen hero actions on the observed line
                // replay with probability one and no updates
                if let Some(index) = frozen {
                    if index < spot.history().len() && seat == hero {
                        let next = spot.history()[index];
                        let child = game.apply(game.actionize(&next));
                        let mut path = path;
                        path.push(next);
                        return self.cfr(
                            local,
                            leaf,
                            spot,
                            child,
                            path,
                            Some(index + 1),
                            reach,
                            depth,
                            runout,
                            dealt,
                            weight,
                            deadline,
                        );
                    }
                }
                let edges = game.choices();
                let observation = Observation::from_game(&game, seat);
                let infoset =
                    Infoset::from((game.street(), self.model.bucket(&observation), path));
                self.witness(local, &infoset, &edges);
                let strategy = local.strategy(&infoset);
                let mut utilities = BTreeMap::new();
                let mut node = 0.0;
                for edge in edges.iter() {
                    let child = game.apply(game.actionize(edge));
                    let mut subpath = path;
                    subpath.push(*edge);
                    let follows = match frozen {
                        Some(index)
                            if index < spot.history().len()
                                && spot.history()[index] == *edge =>
                        {
                            Some(index + 1)
                        }
                        _ => None,
                    };
                    let mut reach = reach;
                    reach[seat] *= strategy[edge];
                    let utility = self.cfr(
                        local, leaf, spot, child, subpath, follows, reach, depth, runout,
                        dealt, weight, deadline,
                    )?;
                    utilities.insert(*edge, utility);
                    node += strategy[edge] * utility;
                }
                let sign = if seat == hero { 1.0 } else { -1.0 };
                let penalty = if seat == hero {
                    let advice = self.blueprint.advice(&infoset, &edges);
                    let lambda = self
                        .config
                        .kl_weight(game.street(), !game.in_position(hero));
                    lambda * Self::kl(&strategy, &advice)
                } else {
                    0.0
                };
                for edge in edges.iter() {
                    let delta = sign * (utilities[edge] - node) - penalty;
                    local.update_regret(&infoset, edge, delta, reach[1 - seat]);
                }
                local.accumulate_policy(&infoset, &strategy, weight * reach[seat]);
                Ok(node)
            }
        }
    }

    /// first touch of a subgame infoset seeds its regrets
    /// proportional to the blueprint's average strategy, so
    /// the initial regret-matched strategy is the blueprint
    fn witness(&self, local: &mut Profile, infoset: &Infoset, edges: &[Edge]) {
        if !local.contains(infoset) {
            local.witness(infoset, edges);
            let advice = self.blueprint.advice(infoset, edges);
            for edge in edges.iter() {
                local.update_regret(infoset, edge, WARM_START_SCALE * advice[edge], 1.0);
            }
        }
    }

    /// hold at least one member of each bet family (small
    /// bet, overbet, shove) above the sentinel floor so the
    /// strategy never abandons a line entirely
    fn sentinels(&self, policy: Policy) -> Policy {
        let floor = self.config.sentinel_probability;
        if floor <= 0.0 {
            return policy;
        }
        let fraction = |edge: &Edge| match edge {
            Edge::Raise(odds) => Some(Probability::from(*odds)),
            _ => None,
        };
        let edges = policy.keys().copied().collect::<Vec<Edge>>();
        let small = edges
            .iter()
            .copied()
            .filter(|e| fraction(e).is_some_and(|f| f < 1.0))
            .min_by(|a, b| fraction(a).partial_cmp(&fraction(b)).expect("not NaN"));
        let overbet = edges
            .iter()
            .copied()
            .filter(|e| fraction(e).is_some_and(|f| f > 1.0))
            .max_by(|a, b| fraction(a).partial_cmp(&fraction(b)).expect("not NaN"));
        let shove = edges.iter().copied().find(|e| e.is_shove());
        let mut policy = policy;
        for sentinel in [small, overbet, shove].into_iter().flatten() {
            let p = policy.get_mut(&sentinel).expect("sentinel is a legal edge");
            *p = p.max(floor);
        }
        let denom = policy.values().sum::<Probability>();
        policy.values_mut().for_each(|p| *p /= denom);
        policy
    }

    fn kl(sigma: &Policy, reference: &Policy) -> f64 {
        sigma
            .iter()
            .filter(|(_, p)| **p > 0.0)
            .map(|(edge, p)| {
                let q = reference
                    .get(edge)
                    .copied()
                    .unwrap_or(crate::POLICY_MIN)
                    .max(crate::POLICY_MIN);
                p * (p / q).ln()
            })
            .sum()
    }

    fn telemetry(
        &self,
        spot: &Spot,
        policy: &Policy,
        started: Instant,
        iterations: usize,
        variance: f64,
        fallback: bool,
    ) -> Telemetry {
        let blueprint = self.fallback(spot);
        Telemetry {
            millis: started.elapsed().as_millis() as u64,
            iterations,
            fallback,
            kl_to_blueprint: Self::kl(policy, &blueprint),
            variance,
            distribution: policy.clone(),
        }
    }

    fn seed(&self, spot: &Spot, sample: usize) -> u64 {
        use std::hash::Hash;
        use std::hash::Hasher;
        let ref mut hasher = std::collections::hash_map::DefaultHasher::new();
        spot.path().hash(hasher);
        spot.root().pot().hash(hasher);
        sample.hash(hasher);
        hasher.finish()
    }
}
