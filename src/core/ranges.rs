use serde::{Deserialize, Serialize};

use crate::core::document::VariableKind;
use crate::core::field_key::FieldKey;
use crate::core::flatten::FlatRecord;

#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
pub struct ValueRange {
    pub min: f64,
    pub max: f64,
}

impl ValueRange {
    #[must_use]
    pub fn new(min: f64, max: f64) -> Self {
        Self { min, max }
    }

    /// Largest magnitude reached by either bound.
    #[must_use]
    pub fn max_abs(self) -> f64 {
        self.min.abs().max(self.max.abs())
    }
}

/// Min/max of the finite samples stored under any of `keys`.
#[must_use]
pub fn value_range(records: &[FlatRecord], keys: &[FieldKey]) -> Option<ValueRange> {
    records
        .iter()
        .flat_map(|record| keys.iter().filter_map(|key| record.get(key)))
        .filter(|value| value.is_finite())
        .fold(None, |range: Option<ValueRange>, value| {
            Some(match range {
                Some(range) => ValueRange::new(range.min.min(value), range.max.max(value)),
                None => ValueRange::new(value, value),
            })
        })
}

/// Reference cart position range (`coor_0.qpos`).
#[must_use]
pub fn position_range(records: &[FlatRecord], fallback: ValueRange) -> ValueRange {
    value_range(records, &[FieldKey::reference(0, VariableKind::Qpos)]).unwrap_or(fallback)
}

/// Reference actuation range over cart force and pole torque.
#[must_use]
pub fn force_range(records: &[FlatRecord], fallback: ValueRange) -> ValueRange {
    value_range(
        records,
        &[
            FieldKey::reference(0, VariableKind::Forces),
            FieldKey::reference(1, VariableKind::Forces),
        ],
    )
    .unwrap_or(fallback)
}
