//! Sum and average collectors.

use rust_decimal::prelude::ToPrimitive;
use rust_decimal::Decimal;
use solverforge_core::{Result, SolverForgeError, Tuple, Value};

use super::{Accumulator, SumMonoid, Undo};
use crate::stream::function::Mapping;

fn not_numeric(collector: &str, value: &Value) -> SolverForgeError {
    SolverForgeError::Type(format!(
        "{}() over {} values is not implemented; use sum_with() with a zero, adder and subtractor",
        collector,
        value.type_label()
    ))
}

// Running totals per numeric representation.
#[derive(Default)]
struct NumericSum {
    ints: i64,
    decimals: Decimal,
    decimal_count: usize,
    floats: f64,
    float_count: usize,
}

impl NumericSum {
    fn add(&mut self, value: &Value) -> bool {
        match value {
            Value::Int(i) => self.ints += *i,
            Value::Decimal(d) => {
                self.decimals += *d;
                self.decimal_count += 1;
            }
            Value::Float(f) => {
                self.floats += *f;
                self.float_count += 1;
            }
            _ => return false,
        }
        true
    }

    fn subtract(&mut self, value: &Value) {
        match value {
            Value::Int(i) => self.ints -= *i,
            Value::Decimal(d) => {
                self.decimals -= *d;
                self.decimal_count -= 1;
            }
            Value::Float(f) => {
                self.float_count -= 1;
                // Drop accumulated rounding once no float is left.
                self.floats = if self.float_count == 0 { 0.0 } else { self.floats - *f };
            }
            _ => {}
        }
    }

    fn total(&self) -> Value {
        if self.float_count > 0 {
            let rest = self.ints as f64 + self.decimals.to_f64().unwrap_or(0.0);
            Value::Float(self.floats + rest)
        } else if self.decimal_count > 0 {
            Value::Decimal(self.decimals + Decimal::from(self.ints))
        } else {
            Value::Int(self.ints)
        }
    }
}

enum SumState {
    Numeric(NumericSum),
    Monoid { monoid: SumMonoid, current: Value },
}

pub(super) struct SumAccumulator {
    mapping: Mapping,
    state: SumState,
}

impl SumAccumulator {
    pub(super) fn new(mapping: Mapping, monoid: Option<SumMonoid>) -> Self {
        let state = match monoid {
            Some(monoid) => SumState::Monoid {
                current: monoid.zero.clone(),
                monoid,
            },
            None => SumState::Numeric(NumericSum::default()),
        };
        Self { mapping, state }
    }
}

impl Accumulator for SumAccumulator {
    fn accumulate(&mut self, tuple: &Tuple) -> Result<Undo> {
        let value = self.mapping.apply(tuple);
        match &mut self.state {
            SumState::Numeric(sum) => {
                if !sum.add(&value) {
                    return Err(not_numeric("sum", &value));
                }
            }
            SumState::Monoid { monoid, current } => {
                *current = (monoid.adder)(current, &value);
            }
        }
        Ok(Undo::Value(value))
    }

    fn retract(&mut self, undo: Undo) {
        let value = undo.into_value();
        match &mut self.state {
            SumState::Numeric(sum) => sum.subtract(&value),
            SumState::Monoid { monoid, current } => {
                *current = (monoid.subtractor)(current, &value);
            }
        }
    }

    fn finish(&self) -> Value {
        match &self.state {
            SumState::Numeric(sum) => sum.total(),
            SumState::Monoid { current, .. } => current.clone(),
        }
    }
}

pub(super) struct AverageAccumulator {
    mapping: Mapping,
    sum: Decimal,
    count: i64,
}

impl AverageAccumulator {
    pub(super) fn new(mapping: Mapping) -> Self {
        Self {
            mapping,
            sum: Decimal::ZERO,
            count: 0,
        }
    }
}

impl Accumulator for AverageAccumulator {
    fn accumulate(&mut self, tuple: &Tuple) -> Result<Undo> {
        let value = self.mapping.apply(tuple);
        let number = value
            .as_decimal()
            .ok_or_else(|| not_numeric("average", &value))?;
        self.sum += number;
        self.count += 1;
        Ok(Undo::Value(Value::Decimal(number)))
    }

    fn retract(&mut self, undo: Undo) {
        if let Value::Decimal(number) = undo.into_value() {
            self.sum -= number;
            self.count -= 1;
        }
    }

    fn finish(&self) -> Value {
        if self.count == 0 {
            Value::None
        } else {
            Value::Decimal((self.sum / Decimal::from(self.count)).normalize())
        }
    }
}
