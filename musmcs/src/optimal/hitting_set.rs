use std::cmp::Reverse;
use std::collections::BinaryHeap;

use itertools::Itertools;

use crate::subset::{SoftIdx, Subset, Weights};

/// Weight of a set of soft constraints. Sums of any number of weights fit without overflow.
pub(crate) type Cost = u128;

fn cost_of(weights: &Weights, i: SoftIdx) -> Cost {
    Cost::from(weights.weight(i))
}

/// An optimiser for the weighted minimum hitting set problem with side constraints.
pub trait HittingSetSolver {
    /// Returns a minimum-weight subset of the soft set that intersects every set of `sets`
    /// and is accepted by `admissible`, or `None` if there is no such subset.
    ///
    /// `admissible` is only evaluated on hitting sets and need not be monotone.
    fn solve(&mut self, sets: &[Subset], weights: &Weights, admissible: &dyn Fn(&Subset) -> bool) -> Option<Subset>;
}

/// Exact depth-first branch and bound.
///
/// Branching follows the first set that is not yet hit: each of its non-excluded members is in
/// turn included, the previously tried ones being excluded. Once every set is hit, the remaining
/// elements are branched on (include / exclude) until a candidate is admissible.
/// The bound sums, over pairwise disjoint unhit sets, the lightest member of each.
#[derive(Default, Debug)]
pub struct BranchAndBound {
    /// Number of search nodes explored over all calls.
    pub num_nodes: u64,
}

impl BranchAndBound {
    pub fn new() -> Self {
        Self::default()
    }
}

impl HittingSetSolver for BranchAndBound {
    fn solve(&mut self, sets: &[Subset], weights: &Weights, admissible: &dyn Fn(&Subset) -> bool) -> Option<Subset> {
        let n = weights.len();
        let mut search = Search {
            sets,
            weights,
            admissible,
            by_weight: weights.order_by_increasing_weight(),
            best: None,
            num_nodes: 0,
        };
        let mut chosen = Subset::empty(n);
        let mut excluded = Subset::empty(n);
        search.branch(&mut chosen, &mut excluded, 0);
        self.num_nodes += search.num_nodes;
        tracing::trace!(
            "hitting set over {} sets: {:?} ({} nodes)",
            sets.len(),
            search.best,
            search.num_nodes
        );
        search.best.map(|(_, best)| best)
    }
}

struct Search<'a> {
    sets: &'a [Subset],
    weights: &'a Weights,
    admissible: &'a dyn Fn(&Subset) -> bool,
    by_weight: Vec<SoftIdx>,
    best: Option<(Cost, Subset)>,
    num_nodes: u64,
}

impl Search<'_> {
    fn branch(&mut self, chosen: &mut Subset, excluded: &mut Subset, cost: Cost) {
        self.num_nodes += 1;
        let Some(bound) = self.lower_bound(chosen, excluded) else {
            return;
        };
        if self.best.as_ref().is_some_and(|(best, _)| cost + bound >= *best) {
            return;
        }

        let sets = self.sets;
        match sets.iter().find(|set| !set.intersects(chosen)) {
            Some(unhit) => {
                let candidates = unhit
                    .difference(excluded)
                    .iter()
                    .sorted_by_key(|&i| self.weights.weight(i))
                    .collect_vec();
                for &c in &candidates {
                    chosen.insert(c);
                    self.branch(chosen, excluded, cost + cost_of(self.weights, c));
                    chosen.remove(c);
                    excluded.insert(c);
                }
                for &c in &candidates {
                    excluded.remove(c);
                }
            }
            None => {
                if (self.admissible)(chosen) {
                    self.best = Some((cost, chosen.clone()));
                    return;
                }
                let undecided = self
                    .by_weight
                    .iter()
                    .copied()
                    .find(|&i| !chosen.contains(i) && !excluded.contains(i));
                let Some(next) = undecided else {
                    return;
                };
                chosen.insert(next);
                self.branch(chosen, excluded, cost + cost_of(self.weights, next));
                chosen.remove(next);
                excluded.insert(next);
                self.branch(chosen, excluded, cost);
                excluded.remove(next);
            }
        }
    }

    /// Additional cost needed to hit every set, or `None` if some set cannot be hit anymore.
    fn lower_bound(&self, chosen: &Subset, excluded: &Subset) -> Option<Cost> {
        let mut used = Subset::empty(chosen.universe());
        let mut bound = 0;
        for set in self.sets.iter().filter(|set| !set.intersects(chosen)) {
            let candidates = set.difference(excluded);
            let lightest = candidates.iter().map(|i| cost_of(self.weights, i)).min()?;
            if !candidates.intersects(&used) {
                bound += lightest;
                used.union_with(&candidates);
            }
        }
        Some(bound)
    }
}

/// Exhaustive fallback: subsets are enumerated by non-decreasing weight until one is an
/// admissible hitting set. Exponential in the size of the result.
#[derive(Default, Debug)]
pub struct CostOrdered;

impl HittingSetSolver for CostOrdered {
    fn solve(&mut self, sets: &[Subset], weights: &Weights, admissible: &dyn Fn(&Subset) -> bool) -> Option<Subset> {
        SubsetsByCost::new(weights)
            .map(|(_, subset)| subset)
            .find(|subset| subset.hits_all(sets) && admissible(subset))
    }
}

/// Enumerates every subset of the soft set exactly once, by non-decreasing weight.
///
/// Subsets are represented by their sorted positions in the increasing-weight order of the
/// soft constraints. The successors of `[.., k]` are `[.., k, k+1]` and `[.., k+1]`: neither is
/// lighter than its parent, and every non-empty subset has exactly one parent.
/// Ties are broken by the lexicographic order of positions, so enumeration is deterministic.
pub(crate) struct SubsetsByCost<'a> {
    weights: &'a Weights,
    by_weight: Vec<SoftIdx>,
    queue: BinaryHeap<Reverse<(Cost, Vec<usize>)>>,
}

impl<'a> SubsetsByCost<'a> {
    pub fn new(weights: &'a Weights) -> Self {
        let mut queue = BinaryHeap::new();
        queue.push(Reverse((0, Vec::new())));
        SubsetsByCost {
            weights,
            by_weight: weights.order_by_increasing_weight(),
            queue,
        }
    }

    fn weight_at(&self, pos: usize) -> Cost {
        cost_of(self.weights, self.by_weight[pos])
    }
}

impl Iterator for SubsetsByCost<'_> {
    type Item = (Cost, Subset);

    fn next(&mut self) -> Option<Self::Item> {
        let Reverse((cost, positions)) = self.queue.pop()?;
        let n = self.by_weight.len();

        match positions.last() {
            None if n > 0 => self.queue.push(Reverse((self.weight_at(0), vec![0]))),
            Some(&last) if last + 1 < n => {
                let mut extended = positions.clone();
                extended.push(last + 1);
                self.queue.push(Reverse((cost + self.weight_at(last + 1), extended)));

                let mut shifted = positions.clone();
                *shifted.last_mut()? = last + 1;
                let shifted_cost = cost - self.weight_at(last) + self.weight_at(last + 1);
                self.queue.push(Reverse((shifted_cost, shifted)));
            }
            _ => {}
        }

        let mut subset = Subset::empty(n);
        for &pos in &positions {
            subset.insert(self.by_weight[pos]);
        }
        Some((cost, subset))
    }
}
