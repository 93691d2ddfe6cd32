use super::infoset::Infoset;
use super::memory::Memory;
use crate::cards::street::Street;
use crate::gameplay::edge::Edge;
use crate::Probability;
use crate::Utility;
use crate::GAMMA_DRIFT;
use std::collections::BTreeMap;

pub type Policy = BTreeMap<Edge, Probability>;
type Cells = BTreeMap<Infoset, BTreeMap<Edge, Memory>>;

/// a full copy of the store's logical values, taken by a
/// worker before a batch so the batch's changes can be
/// extracted as a sparse delta afterwards
#[derive(Debug, Default, Clone)]
pub struct Snapshot(Cells);

/// the sparse logical changes between a snapshot and the
/// store now. zero cells are omitted, so the payload scales
/// with work done, not with store size.
#[derive(Debug, Default, Clone)]
pub struct Delta(Cells);

impl Delta {
    pub fn is_empty(&self) -> bool {
        self.0.is_empty()
    }
    pub fn cells(&self) -> usize {
        self.0.values().map(|edges| edges.len()).sum()
    }
}

/// the regret store: per (infoset, action) cumulative regret
/// and strategy weight, with regret-matching reads, weighted
/// writes, lazy discounting, pruning queries, and snapshot /
/// delta / merge support for the parallel trainer.
///
/// discounting multiplies every cell by a scalar; doing that
/// eagerly is O(store) in the hot path. instead the scalars
/// gamma_r / gamma_s accumulate multiplicatively and every
/// read and write converts between physical and logical
/// values. when a scalar drifts far from 1 the store is
/// materialized once and the scalar resets.
pub struct Profile {
    gamma_r: f64,
    gamma_s: f64,
    encounters: Cells,
}

impl Default for Profile {
    fn default() -> Self {
        Self {
            gamma_r: 1.0,
            gamma_s: 1.0,
            encounters: Cells::new(),
        }
    }
}

impl Profile {
    /// idempotent initialization of an infoset with its
    /// abstraction-enumerated action set
    pub fn witness(&mut self, infoset: &Infoset, edges: &[Edge]) {
        self.encounters.entry(*infoset).or_insert_with(|| {
            edges
                .iter()
                .map(|edge| (*edge, Memory::default()))
                .collect()
        });
    }

    pub fn contains(&self, infoset: &Infoset) -> bool {
        self.encounters.contains_key(infoset)
    }
    pub fn infosets(&self) -> usize {
        self.encounters.len()
    }
    pub fn cells(&self) -> usize {
        self.encounters.values().map(|edges| edges.len()).sum()
    }
    /// the witnessed action set at an infoset
    pub fn edges(&self, infoset: &Infoset) -> Vec<Edge> {
        self.encounters
            .get(infoset)
            .map(|edges| edges.keys().copied().collect())
            .unwrap_or_default()
    }

    pub fn regret(&self, infoset: &Infoset, edge: &Edge) -> Utility {
        self.encounters
            .get(infoset)
            .and_then(|edges| edges.get(edge))
            .map(|memory| memory.regret * self.gamma_r)
            .unwrap_or(0.0)
    }
    pub fn weight(&self, infoset: &Infoset, edge: &Edge) -> Utility {
        self.encounters
            .get(infoset)
            .and_then(|edges| edges.get(edge))
            .map(|memory| memory.policy * self.gamma_s)
            .unwrap_or(0.0)
    }

    /// regret matching: normalize clipped-positive cumulative
    /// regrets, uniform when nothing is positive
    pub fn strategy(&self, infoset: &Infoset) -> Policy {
        let edges = self.edges(infoset);
        assert!(!edges.is_empty(), "infoset witnessed before read");
        let positive = edges
            .iter()
            .map(|edge| (*edge, self.regret(infoset, edge).max(0.0)))
            .collect::<BTreeMap<Edge, Utility>>();
        let denom = positive.values().sum::<Utility>();
        if denom <= 0.0 {
            let uniform = 1.0 / edges.len() as Probability;
            edges.into_iter().map(|edge| (edge, uniform)).collect()
        } else {
            positive
                .into_iter()
                .map(|(edge, regret)| (edge, regret / denom))
                .collect()
        }
    }

    /// the average strategy: normalized cumulative weights,
    /// uniform when the infoset is unseen or unweighted
    pub fn advice(&self, infoset: &Infoset, edges: &[Edge]) -> Policy {
        let weights = edges
            .iter()
            .map(|edge| (*edge, self.weight(infoset, edge)))
            .collect::<BTreeMap<Edge, Utility>>();
        let denom = weights.values().sum::<Utility>();
        if denom <= 0.0 {
            let uniform = 1.0 / edges.len().max(1) as Probability;
            edges.iter().map(|edge| (*edge, uniform)).collect()
        } else {
            weights
                .into_iter()
                .map(|(edge, weight)| (edge, weight / denom))
                .collect()
        }
    }

    /// logical R[I,a] += w * delta. the increment is divided
    /// by gamma so a later read multiplies back out exactly.
    pub fn update_regret(&mut self, infoset: &Infoset, edge: &Edge, delta: Utility, weight: f64) {
        let gamma = self.gamma_r;
        let memory = self.cell(infoset, edge);
        memory.regret += weight * delta / gamma;
        assert!(!memory.regret.is_nan());
    }

    /// logical S[I,a] += w * sigma(a) for the whole policy
    pub fn accumulate_policy(&mut self, infoset: &Infoset, policy: &Policy, weight: f64) {
        let gamma = self.gamma_s;
        for (edge, probability) in policy.iter() {
            assert!(*probability >= 0.0);
            self.cell(infoset, edge).policy += weight * probability / gamma;
        }
    }

    fn cell(&mut self, infoset: &Infoset, edge: &Edge) -> &mut Memory {
        self.encounters
            .get_mut(infoset)
            .expect("infoset witnessed before write")
            .get_mut(edge)
            .expect("edge witnessed before write")
    }

    /// true iff every action's logical regret sits below the
    /// pruning threshold. never true on the river, where a
    /// skipped subtree would bias terminal values directly.
    pub fn should_prune(&self, infoset: &Infoset, threshold: Utility) -> bool {
        if infoset.street == Street::Rive {
            return false;
        }
        match self.encounters.get(infoset) {
            None => false,
            Some(edges) => edges
                .values()
                .all(|memory| memory.regret * self.gamma_r < threshold),
        }
    }

    /// schedule a discount: regrets by alpha, strategy weights
    /// by beta. O(1) now; cost is paid at materialization.
    pub fn discount(&mut self, alpha: f64, beta: f64) {
        assert!(alpha > 0.0 && beta > 0.0);
        self.gamma_r *= alpha;
        self.gamma_s *= beta;
        if self.gamma_r.ln().abs() > GAMMA_DRIFT || self.gamma_s.ln().abs() > GAMMA_DRIFT {
            self.materialize();
        }
    }

    /// fold the lazy scalars into every cell and reset them
    pub fn materialize(&mut self) {
        if self.gamma_r == 1.0 && self.gamma_s == 1.0 {
            return;
        }
        for edges in self.encounters.values_mut() {
            for memory in edges.values_mut() {
                memory.regret *= self.gamma_r;
                memory.policy *= self.gamma_s;
            }
        }
        self.gamma_r = 1.0;
        self.gamma_s = 1.0;
    }

    /// CFR+-style floor: zero out negative cumulative regrets
    pub fn reset_negative_regrets(&mut self) {
        for edges in self.encounters.values_mut() {
            for memory in edges.values_mut() {
                if memory.regret < 0.0 {
                    memory.regret = 0.0;
                }
            }
        }
    }

    pub fn gammas(&self) -> (f64, f64) {
        (self.gamma_r, self.gamma_s)
    }
    pub fn set_gammas(&mut self, gamma_r: f64, gamma_s: f64) {
        self.gamma_r = gamma_r;
        self.gamma_s = gamma_s;
    }

    /// a full logical copy for later delta extraction
    pub fn snapshot(&self) -> Snapshot {
        Snapshot(self.logical())
    }

    /// replace contents wholesale, e.g. from a coordinator
    /// full-sync or a checkpoint load. scalars reset to 1.
    pub fn restore(&mut self, snapshot: Snapshot) {
        self.encounters = snapshot.0;
        self.gamma_r = 1.0;
        self.gamma_s = 1.0;
    }

    /// the sparse logical change set since a snapshot. rows
    /// with no changed cell are omitted; a touched row ships
    /// whole so the receiving store always carries the full
    /// action enumeration for every infoset it knows.
    pub fn delta_since(&self, snapshot: &Snapshot) -> Delta {
        let mut delta = Cells::new();
        for (infoset, edges) in self.encounters.iter() {
            let before = snapshot.0.get(infoset);
            let row = edges
                .iter()
                .map(|(edge, memory)| {
                    let prior = before
                        .and_then(|edges| edges.get(edge))
                        .copied()
                        .unwrap_or_default();
                    (
                        *edge,
                        Memory::from((
                            memory.regret * self.gamma_r - prior.regret,
                            memory.policy * self.gamma_s - prior.policy,
                        )),
                    )
                })
                .collect::<BTreeMap<Edge, Memory>>();
            if row.values().any(|change| !change.is_zero()) {
                delta.insert(*infoset, row);
            }
        }
        Delta(delta)
    }

    /// additive merge of a worker delta. addition commutes,
    /// so arrival order across workers is immaterial.
    pub fn absorb(&mut self, delta: &Delta) {
        for (infoset, edges) in delta.0.iter() {
            let gamma_r = self.gamma_r;
            let gamma_s = self.gamma_s;
            let cells = self.encounters.entry(*infoset).or_default();
            for (edge, change) in edges.iter() {
                let memory = cells.entry(*edge).or_default();
                memory.regret += change.regret / gamma_r;
                memory.policy += change.policy / gamma_s;
            }
        }
    }

    /// every cell in logical form, for serialization
    pub fn logical(&self) -> Cells {
        self.encounters
            .iter()
            .map(|(infoset, edges)| {
                (
                    *infoset,
                    edges
                        .iter()
                        .map(|(edge, memory)| {
                            (
                                *edge,
                                Memory::from((
                                    memory.regret * self.gamma_r,
                                    memory.policy * self.gamma_s,
                                )),
                            )
                        })
                        .collect(),
                )
            })
            .collect()
    }
}

impl From<Cells> for Profile {
    fn from(encounters: Cells) -> Self {
        Self {
            gamma_r: 1.0,
            gamma_s: 1.0,
            encounters,
        }
    }
}
impl From<Cells> for Snapshot {
    fn from(cells: Cells) -> Self {
        Self(cells)
    }
}
impl From<Snapshot> for Profile {
    fn from(snapshot: Snapshot) -> Self {
        Self::from(snapshot.0)
    }
}

impl std::fmt::Display for Profile {
    fn fmt(&self, f: &mut std::fmt::Formatter) -> std::fmt::Result {
        write!(
            f,
            "{} infosets {} cells (gamma {:.3}/{:.3})",
            self.infosets(),
            self.cells(),
            self.gamma_r,
            self.gamma_s
        )
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::gameplay::odds::Odds;
    use crate::mccfr::path::Path;

    fn infoset() -> Infoset {
        let path = [Edge::Call, Edge::Raise(Odds(3, 4)), Edge::Call]
            .into_iter()
            .collect::<Path>();
        Infoset::from((Street::Flop, 12, path))
    }
    fn edges() -> Vec<Edge> {
        vec![Edge::Fold, Edge::Call, Edge::Raise(Odds(1, 1))]
    }

    #[test]
    fn regret_matching_normalizes_positive() {
        let ref info = infoset();
        let mut profile = Profile::default();
        profile.witness(info, &edges());
        profile.update_regret(info, &Edge::Fold, -1.0, 1.0);
        profile.update_regret(info, &Edge::Call, 2.0, 1.0);
        profile.update_regret(info, &Edge::Raise(Odds(1, 1)), 1.0, 1.0);
        let strategy = profile.strategy(info);
        assert!((strategy[&Edge::Fold] - 0.0).abs() < 1e-9);
        assert!((strategy[&Edge::Call] - 2.0 / 3.0).abs() < 1e-9);
        assert!((strategy[&Edge::Raise(Odds(1, 1))] - 1.0 / 3.0).abs() < 1e-9);
    }

    #[test]
    fn uniform_when_no_positive_regret() {
        let ref info = infoset();
        let mut profile = Profile::default();
        profile.witness(info, &edges());
        profile.update_regret(info, &Edge::Fold, -5.0, 1.0);
        let strategy = profile.strategy(info);
        assert!(strategy.values().all(|p| (p - 1.0 / 3.0).abs() < 1e-12));
        assert!((strategy.values().sum::<Probability>() - 1.0).abs() < 1e-9);
    }

    #[test]
    fn linear_weighting_scales_updates() {
        let ref info = infoset();
        let mut profile = Profile::default();
        profile.witness(info, &edges());
        profile.update_regret(info, &Edge::Call, 3.0, 1.0);
        profile.update_regret(info, &Edge::Call, 5.0, 2.0);
        assert!(profile.regret(info, &Edge::Call) == 1.0 * 3.0 + 2.0 * 5.0);
    }

    #[test]
    fn lazy_discount_is_exact() {
        let ref info = infoset();
        let mut profile = Profile::default();
        profile.witness(info, &edges());
        profile.update_regret(info, &Edge::Call, 10.0, 1.0);
        profile.discount(0.5, 1.0);
        profile.discount(0.5, 1.0);
        assert!(profile.regret(info, &Edge::Call) == 2.5);
        profile.update_regret(info, &Edge::Call, 1.0, 1.0);
        assert!(profile.regret(info, &Edge::Call) == 3.5);
    }

    #[test]
    fn discount_preserves_ratios() {
        let ref info = infoset();
        let mut profile = Profile::default();
        profile.witness(info, &edges());
        profile.update_regret(info, &Edge::Call, 6.0, 1.0);
        profile.update_regret(info, &Edge::Fold, 2.0, 1.0);
        let before = profile.regret(info, &Edge::Call) / profile.regret(info, &Edge::Fold);
        profile.discount(0.37, 0.91);
        let after = profile.regret(info, &Edge::Call) / profile.regret(info, &Edge::Fold);
        assert!((before - after).abs() < 1e-12);
    }

    #[test]
    fn materialization_preserves_logical_values() {
        let ref info = infoset();
        let mut profile = Profile::default();
        profile.witness(info, &edges());
        profile.update_regret(info, &Edge::Call, 8.0, 1.0);
        profile.accumulate_policy(info, &profile.strategy(info), 4.0);
        let regret = profile.regret(info, &Edge::Call);
        let weight = profile.weight(info, &Edge::Call);
        profile.discount(0.9, 0.9);
        let regret = regret * 0.9;
        let weight = weight * 0.9;
        profile.materialize();
        assert!((profile.regret(info, &Edge::Call) - regret).abs() < 1e-12);
        assert!((profile.weight(info, &Edge::Call) - weight).abs() < 1e-12);
        assert!(profile.gammas() == (1.0, 1.0));
    }

    #[test]
    fn delta_merge_sums() {
        let ref info = infoset();
        let mut coordinator = Profile::default();
        coordinator.witness(info, &edges());
        let snapshot = coordinator.snapshot();

        let mut a = Profile::default();
        a.restore(snapshot.clone());
        a.update_regret(info, &Edge::Call, 3.0, 1.0);

        let mut b = Profile::default();
        b.restore(snapshot.clone());
        b.update_regret(info, &Edge::Call, 5.0, 1.0);
        b.update_regret(info, &Edge::Fold, 1.0, 1.0);

        coordinator.absorb(&a.delta_since(&snapshot));
        coordinator.absorb(&b.delta_since(&snapshot));
        assert!(coordinator.regret(info, &Edge::Call) == 8.0);
        assert!(coordinator.regret(info, &Edge::Fold) == 1.0);
    }

    #[test]
    fn merge_order_is_immaterial() {
        let ref info = infoset();
        let mut base = Profile::default();
        base.witness(info, &edges());
        let snapshot = base.snapshot();

        let mut a = Profile::default();
        a.restore(snapshot.clone());
        a.update_regret(info, &Edge::Call, 3.0, 1.0);
        let da = a.delta_since(&snapshot);

        let mut b = Profile::default();
        b.restore(snapshot.clone());
        b.update_regret(info, &Edge::Call, 5.0, 1.0);
        let db = b.delta_since(&snapshot);

        let mut fwd = Profile::default();
        fwd.restore(snapshot.clone());
        fwd.absorb(&da);
        fwd.absorb(&db);

        let mut rev = Profile::default();
        rev.restore(snapshot.clone());
        rev.absorb(&db);
        rev.absorb(&da);

        assert!(fwd.regret(info, &Edge::Call) == rev.regret(info, &Edge::Call));
    }

    #[test]
    fn delta_omits_untouched_rows() {
        let ref touched = infoset();
        let ref untouched = Infoset::from((Street::Turn, 7, Path::default()));
        let mut profile = Profile::default();
        profile.witness(touched, &edges());
        profile.witness(untouched, &edges());
        profile.update_regret(untouched, &Edge::Call, 1.0, 1.0);
        let snapshot = profile.snapshot();
        profile.update_regret(touched, &Edge::Fold, -1.0, 1.0);
        let delta = profile.delta_since(&snapshot);
        assert!(delta.cells() == edges().len());
    }

    #[test]
    fn never_prunes_river() {
        let path = Path::default();
        let ref info = Infoset::from((Street::Rive, 3, path));
        let mut profile = Profile::default();
        profile.witness(info, &edges());
        profile.update_regret(info, &Edge::Call, crate::PRUNE_THRESHOLD, 1.0);
        profile.update_regret(info, &Edge::Fold, crate::PRUNE_THRESHOLD, 1.0);
        profile.update_regret(info, &Edge::Raise(Odds(1, 1)), crate::PRUNE_THRESHOLD, 1.0);
        assert!(!profile.should_prune(info, crate::PRUNE_THRESHOLD / 2.0));
    }

    #[test]
    fn prunes_hopeless_flop_infosets() {
        let ref info = infoset();
        let mut profile = Profile::default();
        profile.witness(info, &edges());
        for edge in edges() {
            profile.update_regret(info, &edge, crate::PRUNE_THRESHOLD, 1.0);
        }
        assert!(profile.should_prune(info, crate::PRUNE_THRESHOLD / 2.0));
    }

    #[test]
    fn snapshot_restore_round_trip() {
        let ref info = infoset();
        let mut profile = Profile::default();
        profile.witness(info, &edges());
        profile.update_regret(info, &Edge::Call, 7.0, 3.0);
        profile.discount(0.5, 0.5);
        let snapshot = profile.snapshot();
        let mut other = Profile::default();
        other.restore(snapshot);
        assert!(other.regret(info, &Edge::Call) == profile.regret(info, &Edge::Call));
        assert!(other.gammas() == (1.0, 1.0));
    }
}
