use indexmap::IndexMap;
use serde::{Deserialize, Serialize};
use tracing::{debug, trace, warn};

use crate::core::alignment::TimeAlignment;
use crate::core::document::{Coordinate, TrajectoryGroup, VariableKind};
use crate::core::field_key::{FieldKey, SeriesPrefix};
use crate::core::ranking::RankingMap;
use crate::core::visibility::HiddenSet;
use crate::error::{ViewError, ViewResult};

/// One reference time step with every sample plotted at that instant.
///
/// Serializes flat: `{"time": 0.0, "coor_0.qpos": 1.0, "1.coor_0.qpos": 2.0}`.
/// A missing sample is an absent field, never a sentinel.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct FlatRecord {
    pub time: f64,
    #[serde(flatten)]
    pub fields: IndexMap<FieldKey, f64>,
}

impl FlatRecord {
    #[must_use]
    pub fn new(time: f64) -> Self {
        Self {
            time,
            fields: IndexMap::new(),
        }
    }

    #[must_use]
    pub fn get(&self, key: &FieldKey) -> Option<f64> {
        self.fields.get(key).copied()
    }
}

/// Field keys to plot together, by variable then coordinate, in first-seen order.
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
#[serde(transparent)]
pub struct GroupedLines {
    panels: IndexMap<VariableKind, IndexMap<Coordinate, Vec<FieldKey>>>,
}

impl GroupedLines {
    /// Records a key under its panel, ignoring duplicates and relative keys.
    pub fn push(&mut self, key: FieldKey) {
        let Some((variable, coordinate)) = key.channel() else {
            return;
        };
        let lines = self
            .panels
            .entry(variable)
            .or_default()
            .entry(coordinate)
            .or_default();
        if !lines.contains(&key) {
            lines.push(key);
        }
    }

    #[must_use]
    pub fn lines(&self, variable: VariableKind, coordinate: Coordinate) -> &[FieldKey] {
        self.panels
            .get(&variable)
            .and_then(|coordinates| coordinates.get(&coordinate))
            .map_or(&[], Vec::as_slice)
    }

    /// Iterates `(variable, coordinate, keys)` panels in display order.
    pub fn panels(&self) -> impl Iterator<Item = (VariableKind, Coordinate, &[FieldKey])> {
        self.panels.iter().flat_map(|(variable, coordinates)| {
            coordinates
                .iter()
                .map(move |(coordinate, keys)| (*variable, *coordinate, keys.as_slice()))
        })
    }

    #[must_use]
    pub fn is_empty(&self) -> bool {
        self.panels.is_empty()
    }

    /// Copy keeping only keys accepted by `keep`; panel structure is preserved.
    #[must_use]
    pub fn filtered<F>(&self, mut keep: F) -> Self
    where
        F: FnMut(&FieldKey) -> bool,
    {
        let panels = self
            .panels
            .iter()
            .map(|(variable, coordinates)| {
                let coordinates = coordinates
                    .iter()
                    .map(|(coordinate, keys)| {
                        let keys = keys.iter().filter(|key| keep(key)).cloned().collect();
                        (*coordinate, keys)
                    })
                    .collect();
                (*variable, coordinates)
            })
            .collect();
        Self { panels }
    }
}

#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
pub struct FlattenedGroup {
    pub records: Vec<FlatRecord>,
    pub lines: GroupedLines,
}

/// Where a channel reads its sample for reference step `i`.
enum SampleIndex {
    Aligned,
    Nearest(Vec<Option<usize>>),
}

impl SampleIndex {
    fn resolve(&self, step: usize) -> Option<usize> {
        match self {
            Self::Aligned => Some(step),
            Self::Nearest(map) => map.get(step).copied().flatten(),
        }
    }
}

struct Channel<'a> {
    key: FieldKey,
    data: &'a [f64],
    index: usize,
}

/// Flattens one group into time-indexed records plus the panel line index.
///
/// Records follow the reference time axis. Candidates whose axis has the same
/// length as the reference are read index-for-index; any other length is
/// resampled with `alignment`. Hidden candidates and candidates without
/// series contribute nothing. The ranking is only consulted for prefixes.
pub fn flatten_group<A>(
    group_name: &str,
    group: &TrajectoryGroup,
    ranking: &RankingMap,
    hidden: &HiddenSet,
    alignment: &A,
) -> ViewResult<FlattenedGroup>
where
    A: TimeAlignment + ?Sized,
{
    if group.trajectories.is_empty() {
        return Err(ViewError::EmptyGroup {
            group: group_name.to_owned(),
        });
    }
    let reference = group.reference().ok_or_else(|| ViewError::MissingReference {
        group: group_name.to_owned(),
    })?;
    let reference_series = reference
        .series
        .as_ref()
        .ok_or_else(|| ViewError::MissingReference {
            group: group_name.to_owned(),
        })?;
    let reference_time = reference_series.time.as_slice();
    if reference_time.is_empty() {
        return Err(ViewError::EmptyGroup {
            group: group_name.to_owned(),
        });
    }
    let steps = reference_time.len();

    let mut indices = vec![SampleIndex::Aligned];
    let mut channels: Vec<Channel<'_>> = reference_series
        .channels()
        .map(|(variable, coordinate, data)| Channel {
            key: FieldKey::Reference {
                coordinate,
                variable,
            },
            data,
            index: 0,
        })
        .collect();

    let mut hidden_count = 0_usize;
    for trajectory in group.trajectories.iter() {
        if std::ptr::eq(trajectory, reference) {
            continue;
        }
        if trajectory.reference {
            warn!(
                group = group_name,
                trajectory = %trajectory.name,
                "ignoring additional reference trajectory"
            );
            continue;
        }
        let uid = trajectory.uid();
        if hidden.is_hidden_in(group_name, &uid) {
            hidden_count += 1;
            continue;
        }
        let Some(series) = trajectory.series.as_ref() else {
            trace!(uid = %uid, "candidate has no series");
            continue;
        };

        let time = series.time.as_slice();
        let index = if time.len() == steps {
            SampleIndex::Aligned
        } else {
            SampleIndex::Nearest(
                reference_time
                    .iter()
                    .map(|target| alignment.find_nearest_index(time, *target))
                    .collect(),
            )
        };
        indices.push(index);
        let slot = indices.len() - 1;

        let prefix = ranking
            .rank_of(&uid)
            .map_or(SeriesPrefix::Uid(uid), SeriesPrefix::Rank);
        channels.extend(series.channels().map(|(variable, coordinate, data)| Channel {
            key: FieldKey::Candidate {
                prefix: prefix.clone(),
                coordinate,
                variable,
            },
            data,
            index: slot,
        }));
    }

    let build_record = |step: usize| {
        let mut record = FlatRecord::new(reference_time[step]);
        for channel in &channels {
            let sample = indices[channel.index]
                .resolve(step)
                .and_then(|sample| channel.data.get(sample));
            if let Some(value) = sample {
                record.fields.insert(channel.key.clone(), *value);
            }
        }
        record
    };

    #[cfg(feature = "parallel-projection")]
    let records: Vec<FlatRecord> = {
        use rayon::prelude::*;
        (0..steps).into_par_iter().map(build_record).collect()
    };
    #[cfg(not(feature = "parallel-projection"))]
    let records: Vec<FlatRecord> = (0..steps).map(build_record).collect();

    let mut lines = GroupedLines::default();
    for channel in &channels {
        let written = (0..steps).any(|step| {
            indices[channel.index]
                .resolve(step)
                .is_some_and(|sample| sample < channel.data.len())
        });
        if written {
            lines.push(channel.key.clone());
        }
    }

    debug!(
        group = group_name,
        records = records.len(),
        channels = channels.len(),
        hidden = hidden_count,
        "flattened group"
    );
    Ok(FlattenedGroup { records, lines })
}
