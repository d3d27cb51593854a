//! Serializable score analysis and its diff.
//!
//! A [`ScoreAnalysis`] rolls the matches of every constraint up into one
//! [`ConstraintAnalysis`] each, ordered by weight (heaviest first) and then
//! by constraint id. Two analyses of the same constraint set can be diffed:
//! `a.diff(&b)` subtracts `b` from `a` constraint by constraint and, inside a
//! constraint, match by match where matches pair up by justification.

use std::collections::{BTreeMap, HashMap};
use std::fmt;
use std::fmt::Write as _;

use serde::Serialize;
use solverforge_core::{ConstraintRef, Result, Score, SolverForgeError};

use super::justification::ConstraintJustification;

const SUMMARY_MATCH_LIMIT: usize = 3;

/// One (possibly merged) match in an analysis.
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct MatchAnalysis<Sc: Score> {
    pub constraint_ref: ConstraintRef,
    pub score: Sc,
    pub justification: ConstraintJustification<Sc>,
}

impl<Sc: Score> MatchAnalysis<Sc> {
    pub fn new(
        constraint_ref: ConstraintRef,
        score: Sc,
        justification: ConstraintJustification<Sc>,
    ) -> Self {
        Self {
            constraint_ref,
            score,
            justification,
        }
    }

    fn negate(&self) -> Self {
        Self {
            constraint_ref: self.constraint_ref.clone(),
            score: -self.score,
            justification: self.justification.clone(),
        }
    }
}

/// Contribution of one constraint.
///
/// `matches` is `None` unless the analysis was fetched with
/// `FetchPolicy::FetchAll`; `match_count` is `None` for shallow analyses. Both
/// can be negative-valued in a diff.
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct ConstraintAnalysis<Sc: Score> {
    pub constraint_ref: ConstraintRef,
    pub weight: Sc,
    pub score: Sc,
    pub matches: Option<Vec<MatchAnalysis<Sc>>>,
    pub match_count: Option<i64>,
}

impl<Sc: Score> ConstraintAnalysis<Sc> {
    /// Analysis with match detail. Matches with equal justifications are
    /// merged into one whose score is their sum; `match_count` still counts
    /// them separately.
    pub fn with_matches(
        constraint_ref: ConstraintRef,
        weight: Sc,
        score: Sc,
        matches: Vec<MatchAnalysis<Sc>>,
    ) -> Self {
        let match_count = matches.len() as i64;
        let mut merged: Vec<MatchAnalysis<Sc>> = Vec::with_capacity(matches.len());
        let mut positions: HashMap<ConstraintJustification<Sc>, usize> = HashMap::new();
        for m in matches {
            match positions.get(&m.justification) {
                Some(&i) => merged[i].score = merged[i].score + m.score,
                None => {
                    positions.insert(m.justification.clone(), merged.len());
                    merged.push(m);
                }
            }
        }
        Self {
            constraint_ref,
            weight,
            score,
            matches: Some(merged),
            match_count: Some(match_count),
        }
    }

    /// Analysis without match detail.
    pub fn without_matches(
        constraint_ref: ConstraintRef,
        weight: Sc,
        score: Sc,
        match_count: Option<i64>,
    ) -> Self {
        Self {
            constraint_ref,
            weight,
            score,
            matches: None,
            match_count,
        }
    }

    pub fn constraint_name(&self) -> &str {
        &self.constraint_ref.name
    }

    pub fn negate(&self) -> Self {
        Self {
            constraint_ref: self.constraint_ref.clone(),
            weight: -self.weight,
            score: -self.score,
            matches: self
                .matches
                .as_ref()
                .map(|matches| matches.iter().map(MatchAnalysis::negate).collect()),
            match_count: self.match_count.map(|count| -count),
        }
    }

    /// `this - other` for one constraint; either side may be absent.
    pub(crate) fn diff(
        constraint_ref: &ConstraintRef,
        this: Option<&Self>,
        other: Option<&Self>,
    ) -> Result<Self> {
        let (this, other) = match (this, other) {
            (Some(this), Some(other)) => (this, other),
            (Some(this), None) => return Ok(this.clone()),
            (None, Some(other)) => return Ok(other.negate()),
            (None, None) => {
                return Err(SolverForgeError::InvalidState(format!(
                    "neither analysis has constraint ({})",
                    constraint_ref
                )))
            }
        };
        let weight = this.weight - other.weight;
        let score = this.score - other.score;
        let match_count = match (this.match_count, other.match_count) {
            (Some(a), Some(b)) => Some(a - b),
            _ => None,
        };
        let (matches, other_matches) = match (&this.matches, &other.matches) {
            (Some(a), Some(b)) => (a, b),
            (None, None) => {
                return Ok(Self::without_matches(
                    constraint_ref.clone(),
                    weight,
                    score,
                    match_count,
                ))
            }
            _ => {
                return Err(SolverForgeError::IncompatibleAnalyses(format!(
                    "only one of the analyses has match detail for constraint ({}); \
                     fetch both with FetchPolicy::FetchAll",
                    constraint_ref
                )))
            }
        };

        let by_justification = index_by_justification(constraint_ref, matches)?;
        let other_by_justification = index_by_justification(constraint_ref, other_matches)?;
        let mut result = Vec::new();
        for m in matches {
            match other_by_justification.get(&m.justification) {
                Some(o) => {
                    let delta = m.score - o.score;
                    if !delta.is_zero() {
                        result.push(MatchAnalysis::new(
                            constraint_ref.clone(),
                            delta,
                            m.justification.clone(),
                        ));
                    }
                }
                None => result.push(m.clone()),
            }
        }
        for o in other_matches {
            if !by_justification.contains_key(&o.justification) {
                result.push(o.negate());
            }
        }
        Ok(Self {
            constraint_ref: constraint_ref.clone(),
            weight,
            score,
            matches: Some(result),
            match_count,
        })
    }

    /// Summary of this constraint alone; needs match detail.
    pub fn summarize(&self) -> Result<String> {
        let matches = self.fetched_matches()?;
        let mut out = String::new();
        let _ = writeln!(out, "Explanation of score ({}):", self.score);
        out.push_str("    Constraint matches:\n");
        summarize_constraint(&mut out, self, matches);
        Ok(out)
    }

    fn fetched_matches(&self) -> Result<&[MatchAnalysis<Sc>]> {
        self.matches.as_deref().ok_or_else(|| {
            SolverForgeError::InvalidState(format!(
                "constraint ({}) has no match detail; use FetchPolicy::FetchAll to request it",
                self.constraint_ref
            ))
        })
    }
}

impl<Sc: Score> fmt::Display for ConstraintAnalysis<Sc> {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match &self.matches {
            Some(matches) => write!(f, "({} at {}, {} matches)", self.score, self.weight, matches.len()),
            None => write!(f, "({} at {}, no matches)", self.score, self.weight),
        }
    }
}

fn index_by_justification<'a, Sc: Score>(
    constraint_ref: &ConstraintRef,
    matches: &'a [MatchAnalysis<Sc>],
) -> Result<HashMap<&'a ConstraintJustification<Sc>, &'a MatchAnalysis<Sc>>> {
    let mut map = HashMap::with_capacity(matches.len());
    for m in matches {
        if map.insert(&m.justification, m).is_some() {
            return Err(SolverForgeError::InvalidState(format!(
                "constraint ({}) has several matches justified with ({})",
                constraint_ref, m.justification
            )));
        }
    }
    Ok(map)
}

fn summarize_constraint<Sc: Score>(
    out: &mut String,
    constraint: &ConstraintAnalysis<Sc>,
    matches: &[MatchAnalysis<Sc>],
) {
    if matches.is_empty() {
        let _ = writeln!(
            out,
            "        {}: constraint ({}) has no matches.",
            constraint.score.to_short_string(),
            constraint.constraint_ref.name
        );
    } else {
        let _ = writeln!(
            out,
            "        {}: constraint ({}) has {} matches:",
            constraint.score.to_short_string(),
            constraint.constraint_ref.name,
            matches.len()
        );
    }
    let mut sorted: Vec<_> = matches.iter().collect();
    sorted.sort_by(|a, b| a.score.cmp(&b.score));
    for m in sorted.iter().take(SUMMARY_MATCH_LIMIT) {
        let _ = writeln!(
            out,
            "            {}: justified with ({})",
            m.score.to_short_string(),
            m.justification
        );
    }
    if matches.len() > SUMMARY_MATCH_LIMIT {
        out.push_str("            ...\n");
    }
}

/// Per-constraint breakdown of a score.
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct ScoreAnalysis<Sc: Score> {
    pub score: Sc,
    constraints: Vec<ConstraintAnalysis<Sc>>,
    pub is_solution_initialized: bool,
}

impl<Sc: Score> ScoreAnalysis<Sc> {
    /// Orders the constraints by weight, heaviest first, then by id.
    pub fn new(
        score: Sc,
        mut constraints: Vec<ConstraintAnalysis<Sc>>,
        is_solution_initialized: bool,
    ) -> Self {
        constraints.sort_by(|a, b| {
            b.weight
                .cmp(&a.weight)
                .then_with(|| a.constraint_ref.cmp(&b.constraint_ref))
        });
        Self {
            score,
            constraints,
            is_solution_initialized,
        }
    }

    /// Constraint analyses in their stable order.
    pub fn constraint_analyses(&self) -> &[ConstraintAnalysis<Sc>] {
        &self.constraints
    }

    pub fn constraint_map(&self) -> BTreeMap<&ConstraintRef, &ConstraintAnalysis<Sc>> {
        self.constraints
            .iter()
            .map(|c| (&c.constraint_ref, c))
            .collect()
    }

    pub fn get(&self, constraint_ref: &ConstraintRef) -> Option<&ConstraintAnalysis<Sc>> {
        self.constraints
            .iter()
            .find(|c| &c.constraint_ref == constraint_ref)
    }

    pub fn constraint_analysis(&self, package: &str, name: &str) -> Result<&ConstraintAnalysis<Sc>> {
        let constraint_ref = ConstraintRef::new(package, name);
        self.get(&constraint_ref)
            .ok_or_else(|| SolverForgeError::NoSuchConstraint(constraint_ref.constraint_id()))
    }

    /// Looks a constraint up by name alone.
    pub fn constraint_analysis_by_name(&self, name: &str) -> Result<&ConstraintAnalysis<Sc>> {
        let mut found = self.constraints.iter().filter(|c| c.constraint_ref.name == name);
        match (found.next(), found.next()) {
            (Some(analysis), None) => Ok(analysis),
            (None, _) => Err(SolverForgeError::NoSuchConstraint(name.to_string())),
            (Some(_), Some(_)) => Err(SolverForgeError::AmbiguousConstraint(format!(
                "several constraints are named ({}); look them up with their package",
                name
            ))),
        }
    }

    /// `self - other`.
    ///
    /// Constraints whose weight, score and matches are all unchanged are left
    /// out, as are matches whose score did not change.
    pub fn diff(&self, other: &ScoreAnalysis<Sc>) -> Result<ScoreAnalysis<Sc>> {
        let mut refs: Vec<&ConstraintRef> = self.constraints.iter().map(|c| &c.constraint_ref).collect();
        for c in &other.constraints {
            if self.get(&c.constraint_ref).is_none() {
                refs.push(&c.constraint_ref);
            }
        }
        let mut result = Vec::new();
        for constraint_ref in refs {
            let diff = ConstraintAnalysis::diff(
                constraint_ref,
                self.get(constraint_ref),
                other.get(constraint_ref),
            )?;
            let changed = !diff.weight.is_zero()
                || !diff.score.is_zero()
                || match &diff.matches {
                    Some(matches) => !matches.is_empty(),
                    None => diff.match_count.is_some_and(|count| count != 0),
                };
            if changed {
                result.push(diff);
            }
        }
        Ok(ScoreAnalysis::new(
            self.score - other.score,
            result,
            self.is_solution_initialized,
        ))
    }

    /// Human-readable breakdown, worst constraint first; needs match detail.
    pub fn summarize(&self) -> Result<String> {
        let mut out = String::new();
        let _ = writeln!(out, "Explanation of score ({}):", self.score);
        out.push_str("    Constraint matches:\n");
        let mut constraints: Vec<_> = self.constraints.iter().collect();
        constraints.sort_by(|a, b| a.score.cmp(&b.score));
        for constraint in constraints {
            let matches = constraint.fetched_matches()?;
            summarize_constraint(&mut out, constraint, matches);
        }
        Ok(out)
    }
}

impl<Sc: Score> fmt::Display for ScoreAnalysis<Sc> {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(
            f,
            "Score analysis of score {} with {} constraints.",
            self.score,
            self.constraints.len()
        )
    }
}
