// Arity-checked stream builder.
//
// A `ConstraintStream` carries tuples of arity 1 to 4. Operators check their
// arguments against the current arity as they are called; the first failure
// sticks to the stream and is reported by `as_constraint`, so a constraint
// definition reads as one fluent chain.

use std::any::{Any, TypeId};
use std::fmt;
use std::sync::Arc;

use solverforge_core::domain::{short_type_name, MAX_ARITY};
use solverforge_core::{ImpactType, Result, Score, SolverForgeError, Value};

use super::collector::{self, Collector};
use super::definition::{ExistenceMode, StreamDef, StreamOp};
use super::function::{Mapping, Predicate};
use super::joiner::{equal_bi, filtering, validate_joiners, Joiner};
use super::terminal::{ConstraintBuilder, MatchWeigher};

/// One `group_by` argument: a key mapping or a collector.
#[derive(Clone, Debug)]
pub enum GroupArg {
    Key(Mapping),
    Collect(Collector),
}

impl GroupArg {
    pub fn key(mapping: Mapping) -> Self {
        GroupArg::Key(mapping)
    }

    pub fn collect(collector: Collector) -> Self {
        GroupArg::Collect(collector)
    }
}

impl From<Mapping> for GroupArg {
    fn from(mapping: Mapping) -> Self {
        GroupArg::Key(mapping)
    }
}

impl From<Collector> for GroupArg {
    fn from(collector: Collector) -> Self {
        GroupArg::Collect(collector)
    }
}

/// A stream of tuples under construction.
///
/// Obtained from [`ConstraintFactory`](super::ConstraintFactory) and finished
/// with `penalize`, `reward` or `impact`.
#[derive(Clone)]
pub struct ConstraintStream {
    def: Result<Arc<StreamDef>>,
    package: Arc<str>,
}

impl ConstraintStream {
    pub(crate) fn source(
        class: TypeId,
        class_name: &'static str,
        include_unassigned: bool,
        package: Arc<str>,
    ) -> Self {
        Self {
            def: Ok(Arc::new(StreamDef::new(
                StreamOp::ForEach {
                    class,
                    class_name,
                    include_unassigned,
                },
                1,
            ))),
            package,
        }
    }

    pub(crate) fn for_class<T: Any>(include_unassigned: bool, package: Arc<str>) -> Self {
        Self::source(TypeId::of::<T>(), short_type_name::<T>(), include_unassigned, package)
    }

    pub(crate) fn definition(&self) -> Result<Arc<StreamDef>> {
        self.def.clone()
    }

    pub(crate) fn package(&self) -> &Arc<str> {
        &self.package
    }

    /// Tuple arity, or `None` when an earlier operator was rejected.
    pub fn arity(&self) -> Option<usize> {
        self.def.as_ref().ok().map(|def| def.arity)
    }

    /// The configuration error recorded on this stream, if any.
    pub fn error(&self) -> Option<&SolverForgeError> {
        self.def.as_ref().err()
    }

    fn derive<F>(&self, build: F) -> Self
    where
        F: FnOnce(&Arc<StreamDef>) -> Result<StreamDef>,
    {
        let def = match &self.def {
            Ok(parent) => build(parent).map(Arc::new),
            Err(e) => Err(e.clone()),
        };
        Self {
            def,
            package: self.package.clone(),
        }
    }

    fn derive_with<F>(&self, other: &ConstraintStream, build: F) -> Self
    where
        F: FnOnce(&Arc<StreamDef>, &Arc<StreamDef>) -> Result<StreamDef>,
    {
        let def = match (&self.def, &other.def) {
            (Ok(left), Ok(right)) => build(left, right).map(Arc::new),
            (Err(e), _) | (_, Err(e)) => Err(e.clone()),
        };
        Self {
            def,
            package: self.package.clone(),
        }
    }

    /// Keeps the tuples accepted by `predicate`.
    pub fn filter(&self, predicate: Predicate) -> Self {
        self.derive(|parent| {
            Ok(StreamDef::new(
                StreamOp::Filter {
                    parent: parent.clone(),
                    predicate,
                },
                parent.arity,
            ))
        })
    }

    /// Joins with every assigned `B`, appending it to the tuple.
    pub fn join<B: Any>(&self, joiners: Vec<Joiner>) -> Self {
        let other = Self::for_class::<B>(false, self.package.clone());
        self.join_stream(&other, joiners)
    }

    /// Joins with the tuples of a uni stream.
    pub fn join_stream(&self, other: &ConstraintStream, joiners: Vec<Joiner>) -> Self {
        self.derive_with(other, |left, right| {
            if right.arity != 1 {
                return Err(SolverForgeError::Config(format!(
                    "join() needs a uni stream on the right, got a stream of arity {}",
                    right.arity
                )));
            }
            if left.arity >= MAX_ARITY {
                return Err(SolverForgeError::Config(format!(
                    "join() cannot extend a stream of arity {}; the maximum arity is {}",
                    left.arity, MAX_ARITY
                )));
            }
            validate_joiners("join", &joiners, left.arity)?;
            Ok(StreamDef::new(
                StreamOp::Join {
                    left: left.clone(),
                    right: right.clone(),
                    joiners,
                },
                left.arity + 1,
            ))
        })
    }

    fn exists(
        &self,
        operator: &'static str,
        other: &ConstraintStream,
        mut joiners: Vec<Joiner>,
        mode: ExistenceMode,
        exclude_self: bool,
    ) -> Self {
        self.derive_with(other, |parent, other| {
            if other.arity != 1 {
                return Err(SolverForgeError::Config(format!(
                    "{}() needs a uni stream to test against, got a stream of arity {}",
                    operator, other.arity
                )));
            }
            if exclude_self {
                if parent.arity != 1 {
                    return Err(SolverForgeError::Config(format!(
                        "{}() is only available on uni streams, got arity {}",
                        operator, parent.arity
                    )));
                }
                joiners.push(filtering(Predicate::new(|t| t.get(0) != t.get(1))));
            }
            validate_joiners(operator, &joiners, parent.arity)?;
            Ok(StreamDef::new(
                StreamOp::Exists {
                    parent: parent.clone(),
                    other: other.clone(),
                    joiners,
                    mode,
                },
                parent.arity,
            ))
        })
    }

    /// Keeps tuples for which some assigned `B` matches the joiners.
    pub fn if_exists<B: Any>(&self, joiners: Vec<Joiner>) -> Self {
        let other = Self::for_class::<B>(false, self.package.clone());
        self.exists("if_exists", &other, joiners, ExistenceMode::Exists, false)
    }

    /// Keeps tuples for which no assigned `B` matches the joiners.
    pub fn if_not_exists<B: Any>(&self, joiners: Vec<Joiner>) -> Self {
        let other = Self::for_class::<B>(false, self.package.clone());
        self.exists("if_not_exists", &other, joiners, ExistenceMode::NotExists, false)
    }

    pub fn if_exists_including_unassigned<B: Any>(&self, joiners: Vec<Joiner>) -> Self {
        let other = Self::for_class::<B>(true, self.package.clone());
        self.exists(
            "if_exists_including_unassigned",
            &other,
            joiners,
            ExistenceMode::Exists,
            false,
        )
    }

    pub fn if_not_exists_including_unassigned<B: Any>(&self, joiners: Vec<Joiner>) -> Self {
        let other = Self::for_class::<B>(true, self.package.clone());
        self.exists(
            "if_not_exists_including_unassigned",
            &other,
            joiners,
            ExistenceMode::NotExists,
            false,
        )
    }

    /// Like [`if_exists`](Self::if_exists), ignoring the tuple's own fact.
    pub fn if_exists_other<B: Any>(&self, joiners: Vec<Joiner>) -> Self {
        let other = Self::for_class::<B>(false, self.package.clone());
        self.exists("if_exists_other", &other, joiners, ExistenceMode::Exists, true)
    }

    pub fn if_not_exists_other<B: Any>(&self, joiners: Vec<Joiner>) -> Self {
        let other = Self::for_class::<B>(false, self.package.clone());
        self.exists("if_not_exists_other", &other, joiners, ExistenceMode::NotExists, true)
    }

    pub fn if_exists_other_including_unassigned<B: Any>(&self, joiners: Vec<Joiner>) -> Self {
        let other = Self::for_class::<B>(true, self.package.clone());
        self.exists(
            "if_exists_other_including_unassigned",
            &other,
            joiners,
            ExistenceMode::Exists,
            true,
        )
    }

    pub fn if_not_exists_other_including_unassigned<B: Any>(&self, joiners: Vec<Joiner>) -> Self {
        let other = Self::for_class::<B>(true, self.package.clone());
        self.exists(
            "if_not_exists_other_including_unassigned",
            &other,
            joiners,
            ExistenceMode::NotExists,
            true,
        )
    }

    /// Existence test against an arbitrary uni stream.
    pub fn if_exists_stream(&self, other: &ConstraintStream, joiners: Vec<Joiner>) -> Self {
        self.exists("if_exists", other, joiners, ExistenceMode::Exists, false)
    }

    pub fn if_not_exists_stream(&self, other: &ConstraintStream, joiners: Vec<Joiner>) -> Self {
        self.exists("if_not_exists", other, joiners, ExistenceMode::NotExists, false)
    }

    /// Groups tuples by key mappings and aggregates each group with collectors.
    ///
    /// Keys come first, then collectors; the output tuple holds the keys
    /// followed by the collector results. Without arguments the whole stream
    /// collapses into a single `(count)` tuple while it is non-empty.
    pub fn group_by(&self, args: impl IntoIterator<Item = GroupArg>) -> Self {
        let args: Vec<GroupArg> = args.into_iter().collect();
        self.derive(|parent| {
            if args.len() > MAX_ARITY {
                return Err(SolverForgeError::argument_count(
                    "group_by",
                    "0 to 4",
                    "arguments",
                    args.len(),
                ));
            }
            let mut keys = Vec::new();
            let mut collectors = Vec::new();
            for (position, arg) in args.into_iter().enumerate() {
                match arg {
                    GroupArg::Key(mapping) => {
                        if !collectors.is_empty() {
                            return Err(SolverForgeError::Type(format!(
                                "group_by() argument {} is a key after a collector; \
                                 a collector cannot be used as a key, so keys must come first",
                                position
                            )));
                        }
                        keys.push(mapping);
                    }
                    GroupArg::Collect(collector) => collectors.push(collector),
                }
            }
            if keys.is_empty() && collectors.is_empty() {
                collectors.push(collector::count());
            }
            let arity = keys.len() + collectors.len();
            Ok(StreamDef::new(
                StreamOp::GroupBy {
                    parent: parent.clone(),
                    keys,
                    collectors,
                },
                arity,
            ))
        })
    }

    /// Replaces each tuple with the values of 1 to 4 mappings.
    pub fn map(&self, mappings: Vec<Mapping>) -> Self {
        self.derive(|parent| {
            if mappings.is_empty() || mappings.len() > MAX_ARITY {
                return Err(SolverForgeError::argument_count(
                    "map",
                    "1 to 4",
                    "mapping functions",
                    mappings.len(),
                ));
            }
            let arity = mappings.len();
            Ok(StreamDef::new(
                StreamOp::Map {
                    parent: parent.clone(),
                    mappings,
                },
                arity,
            ))
        })
    }

    /// Appends the values of `mappings` to each tuple.
    pub fn expand(&self, mappings: Vec<Mapping>) -> Self {
        self.derive(|parent| {
            let room = MAX_ARITY - parent.arity;
            if room == 0 {
                return Err(SolverForgeError::Config(format!(
                    "expand() cannot extend a stream of arity {}",
                    parent.arity
                )));
            }
            if mappings.is_empty() || mappings.len() > room {
                let expected = if room == 1 {
                    "1".to_string()
                } else {
                    format!("1 to {}", room)
                };
                return Err(SolverForgeError::argument_count(
                    "expand",
                    expected,
                    "mapping functions",
                    mappings.len(),
                ));
            }
            let arity = parent.arity + mappings.len();
            Ok(StreamDef::new(
                StreamOp::Expand {
                    parent: parent.clone(),
                    mappings,
                },
                arity,
            ))
        })
    }

    /// Replaces the last element with each item of the collection it maps to.
    ///
    /// `mapping` receives a 1-tuple holding the last element and must return
    /// a list, set or map (whose keys are used).
    pub fn flatten_last(&self, mapping: Mapping) -> Self {
        self.derive(|parent| {
            Ok(StreamDef::new(
                StreamOp::FlattenLast {
                    parent: parent.clone(),
                    mapping,
                },
                parent.arity,
            ))
        })
    }

    /// Drops repeated tuples.
    pub fn distinct(&self) -> Self {
        self.derive(|parent| {
            Ok(StreamDef::new(
                StreamOp::Distinct {
                    parent: parent.clone(),
                },
                parent.arity,
            ))
        })
    }

    /// Every tuple of both streams; the narrower side is padded with `None`.
    pub fn concat(&self, other: &ConstraintStream) -> Self {
        self.concat_padded(other, Vec::new())
    }

    /// Every tuple of both streams, the narrower side padded by `paddings`.
    ///
    /// Takes either no paddings or exactly one per missing position.
    pub fn concat_padded(&self, other: &ConstraintStream, paddings: Vec<Mapping>) -> Self {
        self.derive_with(other, |left, right| {
            let missing = left.arity.abs_diff(right.arity);
            let paddings = padding("concat", missing, paddings)?;
            let (left_padding, right_padding) = if left.arity < right.arity {
                (paddings, Vec::new())
            } else {
                (Vec::new(), paddings)
            };
            Ok(StreamDef::new(
                StreamOp::Concat {
                    left: left.clone(),
                    right: right.clone(),
                    left_padding,
                    right_padding,
                },
                left.arity.max(right.arity),
            ))
        })
    }

    /// Adds every assigned `T` that is not the first element of some tuple.
    pub fn complement<T: Any>(&self) -> Self {
        self.complement_padded::<T>(Vec::new())
    }

    /// Like [`complement`](Self::complement), filling the positions after the
    /// added fact with `paddings` (none, or one per position).
    pub fn complement_padded<T: Any>(&self, paddings: Vec<Mapping>) -> Self {
        let all = Self::for_class::<T>(false, self.package.clone());
        self.derive_with(&all, |parent, all| {
            let paddings = padding("complement", parent.arity - 1, paddings)?;
            // Facts of `T` that start no tuple of this stream.
            let missing = StreamDef::new(
                StreamOp::Exists {
                    parent: all.clone(),
                    other: parent.clone(),
                    joiners: vec![equal_bi(Mapping::identity(), Mapping::element(0))],
                    mode: ExistenceMode::NotExists,
                },
                1,
            );
            Ok(StreamDef::new(
                StreamOp::Concat {
                    left: parent.clone(),
                    right: Arc::new(missing),
                    left_padding: Vec::new(),
                    right_padding: paddings,
                },
                parent.arity,
            ))
        })
    }

    /// Subtracts `weight` per match.
    pub fn penalize<Sc: Score>(&self, weight: Sc) -> ConstraintBuilder<Sc> {
        self.terminal(ImpactType::Penalty, weight, MatchWeigher::One)
    }

    /// Subtracts `weight * match_weight` per match; match weights must not be
    /// negative.
    pub fn penalize_with<Sc: Score>(&self, weight: Sc, match_weigher: Mapping) -> ConstraintBuilder<Sc> {
        self.terminal(ImpactType::Penalty, weight, MatchWeigher::Int(match_weigher))
    }

    /// Like [`penalize_with`](Self::penalize_with) with decimal match weights.
    pub fn penalize_decimal<Sc: Score>(
        &self,
        weight: Sc,
        match_weigher: Mapping,
    ) -> ConstraintBuilder<Sc> {
        self.terminal(ImpactType::Penalty, weight, MatchWeigher::Decimal(match_weigher))
    }

    pub fn reward<Sc: Score>(&self, weight: Sc) -> ConstraintBuilder<Sc> {
        self.terminal(ImpactType::Reward, weight, MatchWeigher::One)
    }

    pub fn reward_with<Sc: Score>(&self, weight: Sc, match_weigher: Mapping) -> ConstraintBuilder<Sc> {
        self.terminal(ImpactType::Reward, weight, MatchWeigher::Int(match_weigher))
    }

    pub fn reward_decimal<Sc: Score>(&self, weight: Sc, match_weigher: Mapping) -> ConstraintBuilder<Sc> {
        self.terminal(ImpactType::Reward, weight, MatchWeigher::Decimal(match_weigher))
    }

    /// Adds `weight` per match.
    pub fn impact<Sc: Score>(&self, weight: Sc) -> ConstraintBuilder<Sc> {
        self.terminal(ImpactType::Mixed, weight, MatchWeigher::One)
    }

    /// Adds `weight * match_weight` per match; the match weight may be negative.
    pub fn impact_with<Sc: Score>(&self, weight: Sc, match_weigher: Mapping) -> ConstraintBuilder<Sc> {
        self.terminal(ImpactType::Mixed, weight, MatchWeigher::Int(match_weigher))
    }

    pub fn impact_decimal<Sc: Score>(&self, weight: Sc, match_weigher: Mapping) -> ConstraintBuilder<Sc> {
        self.terminal(ImpactType::Mixed, weight, MatchWeigher::Decimal(match_weigher))
    }

    fn terminal<Sc: Score>(
        &self,
        impact_type: ImpactType,
        weight: Sc,
        weigher: MatchWeigher,
    ) -> ConstraintBuilder<Sc> {
        ConstraintBuilder::new(self.clone(), impact_type, weight, weigher)
    }
}

// Checks a padding list and fills an empty one with `None` constants.
fn padding(operator: &'static str, needed: usize, paddings: Vec<Mapping>) -> Result<Vec<Mapping>> {
    if paddings.is_empty() {
        return Ok((0..needed).map(|_| Mapping::constant(Value::None)).collect());
    }
    if paddings.len() != needed {
        return Err(SolverForgeError::argument_count(
            operator,
            needed,
            "padding functions",
            paddings.len(),
        ));
    }
    Ok(paddings)
}

impl fmt::Debug for ConstraintStream {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match &self.def {
            Ok(def) => write!(f, "ConstraintStream({:?})", def),
            Err(e) => write!(f, "ConstraintStream(error: {})", e),
        }
    }
}
