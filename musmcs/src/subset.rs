//! Bookkeeping over the indices of soft constraints.
//!
//! All algorithms of this crate reason about the soft constraints through their index in the
//! (ordered) soft set. A [`Subset`] is a set of such indices over a fixed universe `0..n`.
//! [`SoftSet`] maps indices back and forth with the caller's own constraint identifiers.

use std::cmp::Ordering;
use std::collections::{BTreeMap, HashMap};
use std::fmt::{Debug, Display, Formatter};
use std::hash::{Hash, Hasher};

use fixedbitset::FixedBitSet;
use itertools::Itertools;

use crate::error::{ExplainError, Result};

/// Index of a soft constraint in the soft set.
pub type SoftIdx = usize;

/// Weight of a soft constraint. Weights are non-negative.
pub type Weight = u64;

/// A set of soft constraint indices, drawn from the universe `0..n` where `n` is the size of the soft set.
///
/// Two subsets compare, hash and order through their sorted sequence of indices,
/// so they can be used as keys when detecting duplicates.
#[derive(Clone)]
pub struct Subset {
    bits: FixedBitSet,
}

impl Subset {
    /// The empty subset of a soft set of size `universe`.
    pub fn empty(universe: usize) -> Self {
        Subset {
            bits: FixedBitSet::with_capacity(universe),
        }
    }

    /// The whole soft set of size `universe`.
    pub fn full(universe: usize) -> Self {
        let mut bits = FixedBitSet::with_capacity(universe);
        bits.insert_range(..);
        Subset { bits }
    }

    /// Builds a subset from indices, failing if any of them is outside of the universe.
    pub fn from_indices(universe: usize, indices: impl IntoIterator<Item = SoftIdx>) -> Result<Self> {
        let mut res = Subset::empty(universe);
        for index in indices {
            if index >= universe {
                return Err(ExplainError::InvalidSubset { index, len: universe });
            }
            res.insert(index);
        }
        Ok(res)
    }

    /// Size of the soft set this subset is drawn from.
    pub fn universe(&self) -> usize {
        self.bits.len()
    }

    pub fn len(&self) -> usize {
        self.bits.count_ones(..)
    }

    pub fn is_empty(&self) -> bool {
        self.bits.ones().next().is_none()
    }

    pub fn contains(&self, index: SoftIdx) -> bool {
        self.bits.contains(index)
    }

    /// Adds `index` to the subset.
    ///
    /// # Panic
    /// Panics if the index is outside of the universe.
    pub fn insert(&mut self, index: SoftIdx) {
        self.bits.insert(index)
    }

    pub fn remove(&mut self, index: SoftIdx) {
        self.bits.set(index, false)
    }

    /// Indices of the subset, in increasing order.
    pub fn iter(&self) -> impl Iterator<Item = SoftIdx> + '_ {
        self.bits.ones()
    }

    /// The soft constraints that are NOT in this subset.
    pub fn complement(&self) -> Subset {
        let mut bits = self.bits.clone();
        bits.toggle_range(..);
        Subset { bits }
    }

    pub fn union(&self, other: &Subset) -> Subset {
        debug_assert_eq!(self.universe(), other.universe());
        let mut res = self.clone();
        res.union_with(other);
        res
    }

    pub fn union_with(&mut self, other: &Subset) {
        self.bits.union_with(&other.bits)
    }

    pub fn intersection(&self, other: &Subset) -> Subset {
        debug_assert_eq!(self.universe(), other.universe());
        let mut res = self.clone();
        res.bits.intersect_with(&other.bits);
        res
    }

    pub fn difference(&self, other: &Subset) -> Subset {
        debug_assert_eq!(self.universe(), other.universe());
        let mut res = self.clone();
        res.bits.difference_with(&other.bits);
        res
    }

    /// Returns true if the two subsets share at least one index.
    pub fn intersects(&self, other: &Subset) -> bool {
        !self.bits.is_disjoint(&other.bits)
    }

    pub fn is_subset(&self, other: &Subset) -> bool {
        self.bits.is_subset(&other.bits)
    }

    pub fn is_superset(&self, other: &Subset) -> bool {
        other.is_subset(self)
    }

    /// Hitting-set test: true if this subset intersects every one of `sets`.
    pub fn hits_all<'a>(&self, sets: impl IntoIterator<Item = &'a Subset>) -> bool {
        sets.into_iter().all(|set| self.intersects(set))
    }

    /// Sum of the weights of the members, saturating at `Weight::MAX`.
    pub fn weight(&self, weights: &Weights) -> Weight {
        self.iter().fold(0, |acc: Weight, i| acc.saturating_add(weights.weight(i)))
    }
}

impl PartialEq for Subset {
    fn eq(&self, other: &Self) -> bool {
        self.iter().eq(other.iter())
    }
}

impl Eq for Subset {}

impl Hash for Subset {
    fn hash<H: Hasher>(&self, state: &mut H) {
        for i in self.iter() {
            i.hash(state);
        }
    }
}

impl PartialOrd for Subset {
    fn partial_cmp(&self, other: &Self) -> Option<Ordering> {
        Some(self.cmp(other))
    }
}

impl Ord for Subset {
    fn cmp(&self, other: &Self) -> Ordering {
        self.iter().cmp(other.iter())
    }
}

impl Debug for Subset {
    fn fmt(&self, f: &mut Formatter<'_>) -> std::fmt::Result {
        f.debug_set().entries(self.iter()).finish()
    }
}

impl Display for Subset {
    fn fmt(&self, f: &mut Formatter<'_>) -> std::fmt::Result {
        write!(f, "{{{}}}", self.iter().join(", "))
    }
}

/// Non-negative weights of the soft constraints, indexed like the soft set.
#[derive(Clone, Debug, PartialEq, Eq)]
pub struct Weights {
    weights: Vec<Weight>,
}

impl Weights {
    /// Every soft constraint weighs 1: weight of a subset is its cardinality.
    pub fn unit(num_soft: usize) -> Self {
        Weights {
            weights: vec![1; num_soft],
        }
    }

    /// Fails if there is not exactly one weight per soft constraint.
    pub fn new(weights: Vec<Weight>, num_soft: usize) -> Result<Self> {
        if weights.len() != num_soft {
            return Err(ExplainError::InvalidWeights {
                expected: num_soft,
                actual: weights.len(),
            });
        }
        Ok(Weights { weights })
    }

    pub fn len(&self) -> usize {
        self.weights.len()
    }

    pub fn is_empty(&self) -> bool {
        self.weights.is_empty()
    }

    pub fn weight(&self, index: SoftIdx) -> Weight {
        self.weights[index]
    }

    pub fn is_unit(&self) -> bool {
        self.weights.iter().all(|&w| w == 1)
    }

    /// Indices sorted by decreasing weight. Ties are kept in input order.
    pub fn order_by_decreasing_weight(&self) -> Vec<SoftIdx> {
        (0..self.weights.len())
            .sorted_by_key(|&i| std::cmp::Reverse(self.weights[i]))
            .collect()
    }

    /// Indices sorted by increasing weight. Ties are kept in input order.
    pub fn order_by_increasing_weight(&self) -> Vec<SoftIdx> {
        (0..self.weights.len()).sorted_by_key(|&i| self.weights[i]).collect()
    }
}

/// The ordered sequence of soft constraint identifiers of one explanation session.
///
/// Order matters for the preference-based algorithms (QuickXplain, greedy growing)
/// and for the readability of results, but not for minimality.
#[derive(Clone, Debug)]
pub struct SoftSet<C> {
    constraints: Vec<C>,
    indices: HashMap<C, SoftIdx>,
}

impl<C: Eq + Hash + Clone> SoftSet<C> {
    /// Fails if the same identifier appears twice.
    pub fn new(constraints: impl IntoIterator<Item = C>) -> Result<Self> {
        let constraints = constraints.into_iter().collect_vec();
        let mut indices = HashMap::with_capacity(constraints.len());
        for (i, c) in constraints.iter().enumerate() {
            if indices.insert(c.clone(), i).is_some() {
                return Err(ExplainError::DuplicateConstraint(i));
            }
        }
        Ok(SoftSet { constraints, indices })
    }

    pub fn len(&self) -> usize {
        self.constraints.len()
    }

    pub fn is_empty(&self) -> bool {
        self.constraints.is_empty()
    }

    pub fn get(&self, index: SoftIdx) -> Option<&C> {
        self.constraints.get(index)
    }

    pub fn index_of(&self, constraint: &C) -> Option<SoftIdx> {
        self.indices.get(constraint).copied()
    }

    pub fn constraints(&self) -> &[C] {
        &self.constraints
    }

    /// The subset made of the given identifiers.
    /// An identifier that is not part of the soft set results in an `UnknownConstraint` error,
    /// reporting its position among `constraints`.
    pub fn subset_of<'a>(&self, constraints: impl IntoIterator<Item = &'a C>) -> Result<Subset>
    where
        C: 'a,
    {
        let mut res = Subset::empty(self.len());
        for (position, c) in constraints.into_iter().enumerate() {
            let index = self.index_of(c).ok_or(ExplainError::UnknownConstraint(position))?;
            res.insert(index);
        }
        Ok(res)
    }

    /// The identifiers of the members of `subset`, in soft set order.
    pub fn project(&self, subset: &Subset) -> Vec<&C> {
        debug_assert_eq!(subset.universe(), self.len());
        subset.iter().map(|i| &self.constraints[i]).collect()
    }

    /// Builds the weight vector from a weight map. Unmapped constraints weigh 1.
    pub fn weights(&self, map: &BTreeMap<C, Weight>) -> Weights
    where
        C: Ord,
    {
        Weights {
            weights: self.constraints.iter().map(|c| map.get(c).copied().unwrap_or(1)).collect(),
        }
    }
}
