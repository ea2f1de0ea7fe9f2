use serde::{Deserialize, Serialize};
use tracing::trace;

use crate::core::field_key::FieldKey;
use crate::core::flatten::FlatRecord;

/// Records and line keys of one panel in relative mode.
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
pub struct RelativeProjection {
    pub records: Vec<FlatRecord>,
    pub line_keys: Vec<FieldKey>,
}

/// Re-expresses ranked candidate lines as differences from the reference line.
///
/// The first reference key in `line_keys` is the baseline. Each ranked key
/// `r.coord.var` produces `r_rel = value - baseline` wherever both samples are
/// present. The output keys are the `_rel` keys in candidate order; the
/// baseline itself is dropped. Without a baseline or without ranked lines the
/// input is returned as-is. Unranked (UID-prefixed) lines have no relative
/// counterpart. Input records are never modified.
#[must_use]
pub fn to_relative(records: &[FlatRecord], line_keys: &[FieldKey]) -> RelativeProjection {
    let unchanged = || RelativeProjection {
        records: records.to_vec(),
        line_keys: line_keys.to_vec(),
    };

    let Some(baseline) = line_keys.iter().find(|key| key.is_reference()) else {
        return unchanged();
    };
    let candidates: Vec<(&FieldKey, FieldKey)> = line_keys
        .iter()
        .filter_map(|key| key.relative().map(|relative| (key, relative)))
        .collect();
    if candidates.is_empty() {
        return unchanged();
    }

    let records = records
        .iter()
        .map(|record| {
            let mut derived = record.clone();
            if let Some(base) = record.get(baseline) {
                for (source, relative) in &candidates {
                    if let Some(value) = record.get(source) {
                        derived.fields.insert(relative.clone(), value - base);
                    }
                }
            }
            derived
        })
        .collect::<Vec<_>>();

    trace!(
        baseline = %baseline,
        lines = candidates.len(),
        records = records.len(),
        "built relative projection"
    );
    RelativeProjection {
        records,
        line_keys: candidates.into_iter().map(|(_, relative)| relative).collect(),
    }
}
