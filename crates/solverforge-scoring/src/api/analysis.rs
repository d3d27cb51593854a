//! Constraint matches, indictments and score explanations.
//!
//! These are snapshots taken from a session: plain values that stay valid
//! after the session changes and can be handed to other threads.

use std::collections::{BTreeMap, HashMap};
use std::fmt::Write as _;

use serde::Serialize;
use solverforge_core::score::Score;
use solverforge_core::{ConstraintRef, Value};

use super::justification::{ConstraintJustification, DisplayValue};

// Matches shown per constraint or indictment in a summary.
const SUMMARY_MATCH_LIMIT: usize = 2;
const SUMMARY_INDICTMENT_LIMIT: usize = 5;

/// One matched tuple's contribution to one constraint.
#[derive(Debug, Clone, Serialize)]
pub struct ConstraintMatch<Sc: Score> {
    /// Reference to the constraint that matched.
    pub constraint_ref: ConstraintRef,
    pub justification: ConstraintJustification<Sc>,
    /// Objects blamed for this match.
    pub indicted_objects: Vec<Value>,
    /// Score impact of this match.
    pub score: Sc,
}

impl<Sc: Score> ConstraintMatch<Sc> {
    pub fn new(
        constraint_ref: ConstraintRef,
        justification: ConstraintJustification<Sc>,
        indicted_objects: Vec<Value>,
        score: Sc,
    ) -> Self {
        Self {
            constraint_ref,
            justification,
            indicted_objects,
            score,
        }
    }
}

/// All current matches of one constraint.
#[derive(Debug, Clone, Serialize)]
pub struct ConstraintMatchTotal<Sc: Score> {
    pub constraint_ref: ConstraintRef,
    /// Weight in effect (after overrides).
    pub weight: Sc,
    /// Sum of the match scores.
    pub score: Sc,
    pub matches: Vec<ConstraintMatch<Sc>>,
}

impl<Sc: Score> ConstraintMatchTotal<Sc> {
    pub fn match_count(&self) -> usize {
        self.matches.len()
    }

    pub fn constraint_id(&self) -> String {
        self.constraint_ref.constraint_id()
    }
}

/// Every match an object is indicted in.
#[derive(Debug, Clone, Serialize)]
pub struct Indictment<Sc: Score> {
    pub indicted_object: Value,
    /// Sum of the scores of its matches.
    pub score: Sc,
    pub matches: Vec<ConstraintMatch<Sc>>,
}

impl<Sc: Score> Indictment<Sc> {
    /// Creates an empty indictment for an object.
    pub fn new(indicted_object: Value) -> Self {
        Self {
            indicted_object,
            score: Sc::zero(),
            matches: Vec::new(),
        }
    }

    /// Adds a match to this indictment.
    pub fn add_match(&mut self, constraint_match: ConstraintMatch<Sc>) {
        self.score = self.score + constraint_match.score;
        self.matches.push(constraint_match);
    }

    pub fn match_count(&self) -> usize {
        self.matches.len()
    }

    /// Distinct constraints the object is indicted by.
    pub fn constraint_refs(&self) -> Vec<&ConstraintRef> {
        let mut refs: Vec<_> = self.matches.iter().map(|m| &m.constraint_ref).collect();
        refs.sort();
        refs.dedup();
        refs
    }
}

/// Score of a session broken down per constraint and per indicted object.
#[derive(Debug, Clone, Serialize)]
pub struct ScoreExplanation<Sc: Score> {
    pub score: Sc,
    /// Keyed by constraint id.
    pub constraint_match_total_map: BTreeMap<String, ConstraintMatchTotal<Sc>>,
    #[serde(skip)]
    pub indictment_map: HashMap<Value, Indictment<Sc>>,
}

impl<Sc: Score> ScoreExplanation<Sc> {
    /// Builds the explanation, deriving indictments from the match totals.
    pub fn new(score: Sc, totals: Vec<ConstraintMatchTotal<Sc>>) -> Self {
        let mut indictment_map: HashMap<Value, Indictment<Sc>> = HashMap::new();
        for total in &totals {
            for m in &total.matches {
                for object in &m.indicted_objects {
                    indictment_map
                        .entry(object.clone())
                        .or_insert_with(|| Indictment::new(object.clone()))
                        .add_match(m.clone());
                }
            }
        }
        Self {
            score,
            constraint_match_total_map: totals
                .into_iter()
                .map(|total| (total.constraint_id(), total))
                .collect(),
            indictment_map,
        }
    }

    pub fn constraint_match_total(&self, constraint_id: &str) -> Option<&ConstraintMatchTotal<Sc>> {
        self.constraint_match_total_map.get(constraint_id)
    }

    pub fn indictment(&self, object: &Value) -> Option<&Indictment<Sc>> {
        self.indictment_map.get(object)
    }

    /// Returns the total match count across all constraints.
    pub fn total_match_count(&self) -> usize {
        self.constraint_match_total_map
            .values()
            .map(ConstraintMatchTotal::match_count)
            .sum()
    }

    /// Indictments, worst score first.
    pub fn worst_indictments(&self) -> Vec<&Indictment<Sc>> {
        let mut indictments: Vec<_> = self.indictment_map.values().collect();
        indictments.sort_by(|a, b| {
            a.score
                .cmp(&b.score)
                .then_with(|| a.indicted_object.cmp(&b.indicted_object))
        });
        indictments
    }

    /// Human-readable breakdown: constraints worst first, then the five
    /// worst indicted objects.
    pub fn summary(&self) -> String {
        let mut out = String::new();
        let _ = writeln!(out, "Explanation of score ({}):", self.score);
        out.push_str("    Constraint matches:\n");

        let mut totals: Vec<_> = self.constraint_match_total_map.values().collect();
        totals.sort_by(|a, b| a.score.cmp(&b.score));
        for total in totals {
            let _ = writeln!(
                out,
                "        {}: constraint ({}) has {} matches:",
                total.score.to_short_string(),
                total.constraint_ref.name,
                total.match_count()
            );
            let mut matches: Vec<_> = total.matches.iter().collect();
            matches.sort_by(|a, b| a.score.cmp(&b.score));
            for m in matches.iter().take(SUMMARY_MATCH_LIMIT) {
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

        let indictments = self.worst_indictments();
        if indictments.len() > SUMMARY_INDICTMENT_LIMIT {
            let _ = writeln!(
                out,
                "    Indictments (top {} of {}):",
                SUMMARY_INDICTMENT_LIMIT,
                indictments.len()
            );
        } else {
            out.push_str("    Indictments:\n");
        }
        for indictment in indictments.iter().take(SUMMARY_INDICTMENT_LIMIT) {
            let _ = writeln!(
                out,
                "        {}: indicted with ({}) has {} matches:",
                indictment.score.to_short_string(),
                DisplayValue(&indictment.indicted_object),
                indictment.match_count()
            );
            let mut matches: Vec<_> = indictment.matches.iter().collect();
            matches.sort_by(|a, b| a.score.cmp(&b.score));
            for m in matches.iter().take(SUMMARY_MATCH_LIMIT) {
                let _ = writeln!(
                    out,
                    "            {}: constraint ({})",
                    m.score.to_short_string(),
                    m.constraint_ref.name
                );
            }
            if matches.len() > SUMMARY_MATCH_LIMIT {
                out.push_str("            ...\n");
            }
        }
        out
    }
}
