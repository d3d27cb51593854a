//! LoadBalance collector for computing unfairness.
//!
//! Unfairness is the square root of the summed squared deviations of every
//! item's load from the mean load: `sqrt(sum(x^2) - sum(x)^2 / n)`. Zero means
//! perfectly balanced. The result is a decimal so it can feed decimal scores
//! without scaling.

use std::collections::{BTreeMap, HashMap};

use rust_decimal::{Decimal, MathematicalOps};
use solverforge_core::{Result, SolverForgeError, Tuple, Value};

use super::{Accumulator, Undo};
use crate::stream::function::Mapping;

/// Significant digits kept in the unfairness.
const UNFAIRNESS_DIGITS: u32 = 6;

/// Loads per balanced item and the resulting unfairness.
#[derive(Debug, Clone, Default, PartialEq, Eq, Hash)]
pub struct LoadBalance {
    pub loads: BTreeMap<Value, i64>,
    pub unfairness: Decimal,
}

impl LoadBalance {
    pub fn load_of(&self, item: &Value) -> i64 {
        self.loads.get(item).copied().unwrap_or(0)
    }
}

pub(super) struct LoadBalanceAccumulator {
    item: Mapping,
    load: Option<Mapping>,
    initial_load: Option<Mapping>,
    item_counts: HashMap<Value, usize>,
    loads: BTreeMap<Value, i64>,
    sum: i128,
    sum_of_squares: i128,
}

impl LoadBalanceAccumulator {
    pub(super) fn new(item: Mapping, load: Option<Mapping>, initial_load: Option<Mapping>) -> Self {
        Self {
            item,
            load,
            initial_load,
            item_counts: HashMap::new(),
            loads: BTreeMap::new(),
            sum: 0,
            sum_of_squares: 0,
        }
    }

    fn load_value(mapping: &Option<Mapping>, tuple: &Tuple, default: i64) -> Result<i64> {
        let Some(mapping) = mapping else {
            return Ok(default);
        };
        let value = mapping.apply(tuple);
        value.as_int().ok_or_else(|| {
            SolverForgeError::Type(format!(
                "load_balance() loads must be ints, got {}",
                value.type_label()
            ))
        })
    }

    fn add_to_load(&mut self, item: &Value, diff: i64) {
        let old = self.loads.get(item).copied().unwrap_or(0);
        let new = old + diff;
        self.loads.insert(item.clone(), new);
        self.replace(old, new);
    }

    fn reset_load(&mut self, item: &Value) {
        if let Some(old) = self.loads.remove(item) {
            self.replace(old, 0);
        }
    }

    fn replace(&mut self, old: i64, new: i64) {
        let (old, new) = (old as i128, new as i128);
        self.sum += new - old;
        self.sum_of_squares += new * new - old * old;
    }

    fn unfairness(&self) -> Decimal {
        let n = self.loads.len() as i128;
        if n == 0 {
            return Decimal::ZERO;
        }
        let numerator = self
            .sum_of_squares
            .checked_mul(n)
            .zip(self.sum.checked_mul(self.sum))
            .map(|(squares, square)| squares - square);
        let exact = numerator
            .and_then(|numerator| Decimal::try_from_i128_with_scale(numerator, 0).ok())
            .and_then(|numerator| (numerator / Decimal::from(n as i64)).sqrt());
        exact
            .or_else(|| self.approximate_unfairness(numerator, n))
            .and_then(|root| root.round_sf(UNFAIRNESS_DIGITS))
            .map(|root| root.normalize())
            .unwrap_or(Decimal::ZERO)
    }

    // Loads whose squared deviation exceeds 96 bits fall back to f64.
    fn approximate_unfairness(&self, numerator: Option<i128>, n: i128) -> Option<Decimal> {
        let n = n as f64;
        let squared_deviation = match numerator {
            Some(numerator) => numerator as f64 / n,
            None => {
                let mean = self.sum as f64 / n;
                self.sum_of_squares as f64 - mean * mean * n
            }
        };
        Decimal::from_f64_retain(squared_deviation.max(0.0).sqrt())
    }
}

impl Accumulator for LoadBalanceAccumulator {
    fn accumulate(&mut self, tuple: &Tuple) -> Result<Undo> {
        let item = self.item.apply(tuple);
        let load = Self::load_value(&self.load, tuple, 1)?;
        let initial = if self.item_counts.contains_key(&item) {
            0
        } else {
            Self::load_value(&self.initial_load, tuple, 0)?
        };
        *self.item_counts.entry(item.clone()).or_insert(0) += 1;
        self.add_to_load(&item, load + initial);
        Ok(Undo::Entry(item, Value::Int(load)))
    }

    fn retract(&mut self, undo: Undo) {
        let (item, load) = undo.into_entry();
        let load = load.as_int().unwrap_or(0);
        let Some(count) = self.item_counts.get_mut(&item) else {
            return;
        };
        *count -= 1;
        if *count == 0 {
            self.item_counts.remove(&item);
            self.reset_load(&item);
        } else {
            self.add_to_load(&item, -load);
        }
    }

    fn finish(&self) -> Value {
        Value::object(LoadBalance {
            loads: self.loads.clone(),
            unfairness: self.unfairness(),
        })
    }
}
