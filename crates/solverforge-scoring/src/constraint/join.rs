// Indexed join memory shared by join and existence nodes.
//
// Each side keeps its tuples in a `JoinIndex`. Entries are bucketed by the
// values of the equality joiners and, inside a bucket, ordered by the value
// of the first comparison or overlap joiner, so a probe only visits
// candidates that can match. Every candidate is then checked against all
// structured joiners, and finally the filtering joiners run on the joined
// tuple.

use std::collections::{BTreeMap, BTreeSet, HashMap};
use std::ops::Bound;

use solverforge_core::{Result, SolverForgeError, Tuple, Value};

use super::graph::{Delta, StreamNode};
use crate::stream::definition::Side;
use crate::stream::joiner::{ComparisonOp, Joiner, JoinerValues};

pub(super) type EntryId = u64;

type RangeBounds = (Bound<Value>, Bound<Value>);

pub(super) struct JoinPlan {
    joiners: Vec<Joiner>,
    equal: Vec<usize>,
    range: Option<usize>,
    has_filters: bool,
}

impl JoinPlan {
    pub(super) fn new(joiners: &[Joiner]) -> Self {
        let equal = joiners
            .iter()
            .enumerate()
            .filter(|(_, j)| matches!(j, Joiner::Equal { .. }))
            .map(|(i, _)| i)
            .collect();
        let range = joiners.iter().position(|j| {
            matches!(j, Joiner::Comparison { .. } | Joiner::Overlapping { .. })
        });
        Self {
            joiners: joiners.to_vec(),
            equal,
            range,
            has_filters: joiners.iter().any(|j| matches!(j, Joiner::Filtering(_))),
        }
    }

    pub(super) fn values(&self, side: Side, tuple: &Tuple) -> Vec<JoinerValues> {
        self.joiners
            .iter()
            .map(|joiner| match side {
                Side::Left => joiner.left_values(tuple),
                Side::Right => joiner.right_values(tuple),
            })
            .collect()
    }

    fn bucket_key(&self, values: &[JoinerValues]) -> Vec<Value> {
        self.equal.iter().map(|&i| values[i][0].clone()).collect()
    }

    // Comparison value, or the interval start of an overlap joiner.
    fn range_key(&self, values: &[JoinerValues]) -> Value {
        match self.range {
            Some(i) => values[i][0].clone(),
            None => Value::None,
        }
    }

    // Range of stored keys on the other side that can match the probe.
    fn range_bounds(&self, probe: Side, values: &[JoinerValues]) -> RangeBounds {
        let Some(i) = self.range else {
            return (Bound::Unbounded, Bound::Unbounded);
        };
        match (&self.joiners[i], probe) {
            (Joiner::Comparison { op, .. }, Side::Left) => {
                let left = values[i][0].clone();
                match op {
                    ComparisonOp::LessThan => (Bound::Excluded(left), Bound::Unbounded),
                    ComparisonOp::LessThanOrEqual => (Bound::Included(left), Bound::Unbounded),
                    ComparisonOp::GreaterThan => (Bound::Unbounded, Bound::Excluded(left)),
                    ComparisonOp::GreaterThanOrEqual => (Bound::Unbounded, Bound::Included(left)),
                }
            }
            (Joiner::Comparison { op, .. }, Side::Right) => {
                let right = values[i][0].clone();
                match op {
                    ComparisonOp::LessThan => (Bound::Unbounded, Bound::Excluded(right)),
                    ComparisonOp::LessThanOrEqual => (Bound::Unbounded, Bound::Included(right)),
                    ComparisonOp::GreaterThan => (Bound::Excluded(right), Bound::Unbounded),
                    ComparisonOp::GreaterThanOrEqual => (Bound::Included(right), Bound::Unbounded),
                }
            }
            // Stored intervals must start before the probe ends.
            (Joiner::Overlapping { .. }, _) => {
                (Bound::Unbounded, Bound::Excluded(values[i][1].clone()))
            }
            _ => (Bound::Unbounded, Bound::Unbounded),
        }
    }

    fn structured_match(&self, left: &[JoinerValues], right: &[JoinerValues]) -> bool {
        self.joiners
            .iter()
            .zip(left.iter().zip(right))
            .all(|(joiner, (l, r))| joiner.matches_values(l, r))
    }

    fn filters_match(&self, left: &Tuple, right: &Tuple) -> bool {
        if !self.has_filters {
            return true;
        }
        let joined = left.joined(right);
        self.joiners.iter().all(|joiner| match joiner {
            Joiner::Filtering(predicate) => predicate.test(&joined),
            _ => true,
        })
    }

    /// Entries of `other` matching a probe from `side`.
    pub(super) fn matches(
        &self,
        side: Side,
        tuple: &Tuple,
        values: &[JoinerValues],
        other: &JoinIndex,
    ) -> Vec<EntryId> {
        let bucket = self.bucket_key(values);
        let bounds = self.range_bounds(side, values);
        other
            .candidates(&bucket, bounds)
            .into_iter()
            .filter(|id| {
                let entry = &other.entries[id];
                match side {
                    Side::Left => {
                        self.structured_match(values, &entry.values)
                            && self.filters_match(tuple, &entry.tuple)
                    }
                    Side::Right => {
                        self.structured_match(&entry.values, values)
                            && self.filters_match(&entry.tuple, tuple)
                    }
                }
            })
            .collect()
    }
}

pub(super) struct IndexEntry {
    pub(super) tuple: Tuple,
    values: Vec<JoinerValues>,
    bucket: Vec<Value>,
    range: Value,
    pub(super) partners: BTreeSet<EntryId>,
}

/// Tuples of one side of a join, indexed for probing.
#[derive(Default)]
pub(super) struct JoinIndex {
    pub(super) entries: HashMap<EntryId, IndexEntry>,
    by_tuple: HashMap<Tuple, Vec<EntryId>>,
    buckets: HashMap<Vec<Value>, BTreeMap<Value, BTreeSet<EntryId>>>,
}

impl JoinIndex {
    pub(super) fn insert(
        &mut self,
        plan: &JoinPlan,
        id: EntryId,
        tuple: Tuple,
        values: Vec<JoinerValues>,
        partners: BTreeSet<EntryId>,
    ) {
        let bucket = plan.bucket_key(&values);
        let range = plan.range_key(&values);
        self.buckets
            .entry(bucket.clone())
            .or_default()
            .entry(range.clone())
            .or_default()
            .insert(id);
        self.by_tuple.entry(tuple.clone()).or_default().push(id);
        self.entries.insert(
            id,
            IndexEntry {
                tuple,
                values,
                bucket,
                range,
                partners,
            },
        );
    }

    /// Removes the most recent entry equal to `tuple`.
    pub(super) fn remove(&mut self, tuple: &Tuple, node: &str) -> Result<(EntryId, IndexEntry)> {
        let id = self
            .by_tuple
            .get_mut(tuple)
            .and_then(Vec::pop)
            .ok_or_else(|| {
                SolverForgeError::InvalidState(format!(
                    "{} node received a retraction of {:?} which it never saw inserted",
                    node, tuple
                ))
            })?;
        if self.by_tuple.get(tuple).is_some_and(Vec::is_empty) {
            self.by_tuple.remove(tuple);
        }
        let entry = self.entries.remove(&id).ok_or_else(|| {
            SolverForgeError::InvalidState(format!("{} node lost entry {}", node, id))
        })?;
        if let Some(ranges) = self.buckets.get_mut(&entry.bucket) {
            if let Some(ids) = ranges.get_mut(&entry.range) {
                ids.remove(&id);
                if ids.is_empty() {
                    ranges.remove(&entry.range);
                }
            }
            if ranges.is_empty() {
                self.buckets.remove(&entry.bucket);
            }
        }
        Ok((id, entry))
    }

    fn candidates(&self, bucket: &[Value], bounds: RangeBounds) -> Vec<EntryId> {
        match self.buckets.get(bucket) {
            Some(ranges) => ranges
                .range(bounds)
                .flat_map(|(_, ids)| ids.iter().copied())
                .collect(),
            None => Vec::new(),
        }
    }

    pub(super) fn partners_mut(&mut self, id: EntryId) -> Option<&mut BTreeSet<EntryId>> {
        self.entries.get_mut(&id).map(|entry| &mut entry.partners)
    }
}

/// Cross product of two streams restricted by joiners.
pub(crate) struct JoinNode {
    plan: JoinPlan,
    left: JoinIndex,
    right: JoinIndex,
    next_id: EntryId,
}

impl JoinNode {
    pub(crate) fn new(joiners: &[Joiner]) -> Self {
        Self {
            plan: JoinPlan::new(joiners),
            left: JoinIndex::default(),
            right: JoinIndex::default(),
            next_id: 0,
        }
    }
}

impl StreamNode for JoinNode {
    fn process(&mut self, side: Side, delta: Delta, out: &mut Vec<Delta>) -> Result<()> {
        let Self {
            plan,
            left,
            right,
            next_id,
        } = self;
        let (own, other) = match side {
            Side::Left => (left, right),
            Side::Right => (right, left),
        };
        match delta {
            Delta::Insert(tuple) => {
                let id = *next_id;
                *next_id += 1;
                let values = plan.values(side, &tuple);
                let matched = plan.matches(side, &tuple, &values, other);
                for partner in &matched {
                    if let Some(entry) = other.entries.get_mut(partner) {
                        entry.partners.insert(id);
                        out.push(Delta::Insert(joined(side, &tuple, &entry.tuple)));
                    }
                }
                own.insert(plan, id, tuple, values, matched.into_iter().collect());
            }
            Delta::Retract(tuple) => {
                let (id, entry) = own.remove(&tuple, "join")?;
                for partner in &entry.partners {
                    if let Some(other_entry) = other.entries.get_mut(partner) {
                        other_entry.partners.remove(&id);
                        out.push(Delta::Retract(joined(side, &entry.tuple, &other_entry.tuple)));
                    }
                }
            }
        }
        Ok(())
    }
}

// Joined tuples always read left elements first.
fn joined(side: Side, own: &Tuple, other: &Tuple) -> Tuple {
    match side {
        Side::Left => own.joined(other),
        Side::Right => other.joined(own),
    }
}
