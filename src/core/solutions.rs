use indexmap::IndexSet;
use ordered_float::OrderedFloat;
use serde::{Deserialize, Serialize};

use crate::core::document::ExperimentDocument;
use crate::core::ranking::RankingMap;
use crate::core::visibility::{HiddenSet, SolutionId};

/// One ranked candidate as listed in the solution control table.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct SolutionRow {
    pub id: SolutionId,
    pub trajectory_name: String,
    pub rank: u32,
    /// Regression paradigm, e.g. `mixed` or `sindy`.
    pub solution_type: String,
    pub regression_type: String,
    pub optimization_function: String,
    pub noise_level: f64,
    pub valid: Option<bool>,
    pub rmse_acceleration: Option<f64>,
    pub regression_time: Option<f64>,
    pub visible: bool,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum SortField {
    Rank,
    SolutionType,
    RegressionType,
    OptimizationFunction,
    NoiseLevel,
    Valid,
    Rmse,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum SortDirection {
    Asc,
    Desc,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub struct SortState {
    pub field: SortField,
    pub direction: SortDirection,
}

impl Default for SortState {
    fn default() -> Self {
        Self {
            field: SortField::Rank,
            direction: SortDirection::Asc,
        }
    }
}

impl SortState {
    /// Header click: same field flips direction, another field restarts ascending.
    #[must_use]
    pub fn clicked(self, field: SortField) -> Self {
        if self.field == field {
            let direction = match self.direction {
                SortDirection::Asc => SortDirection::Desc,
                SortDirection::Desc => SortDirection::Asc,
            };
            Self { field, direction }
        } else {
            Self {
                field,
                direction: SortDirection::Asc,
            }
        }
    }
}

/// Comparable value of one table cell.
#[derive(Debug, Clone, PartialEq, Eq, PartialOrd, Ord)]
pub enum CellValue {
    Rank(u32),
    Text(String),
    Number(OrderedFloat<f64>),
    Flag(bool),
}

impl SolutionRow {
    /// Cell value used for sorting and value-click matching. Missing validity
    /// counts as valid, missing RMSE as infinite.
    #[must_use]
    pub fn value(&self, field: SortField) -> CellValue {
        match field {
            SortField::Rank => CellValue::Rank(self.rank),
            SortField::SolutionType => CellValue::Text(self.solution_type.clone()),
            SortField::RegressionType => CellValue::Text(self.regression_type.clone()),
            SortField::OptimizationFunction => {
                CellValue::Text(self.optimization_function.clone())
            }
            SortField::NoiseLevel => CellValue::Number(OrderedFloat(self.noise_level)),
            SortField::Valid => CellValue::Flag(self.valid.unwrap_or(true)),
            SortField::Rmse => {
                CellValue::Number(OrderedFloat(self.rmse_acceleration.unwrap_or(f64::INFINITY)))
            }
        }
    }
}

#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
pub struct SolutionControlTable {
    rows: Vec<SolutionRow>,
}

impl SolutionControlTable {
    /// One row per group and ranked candidate, in document order.
    #[must_use]
    pub fn build(document: &ExperimentDocument, ranking: &RankingMap, hidden: &HiddenSet) -> Self {
        let mut rows = Vec::new();
        for (group, data) in &document.data {
            for trajectory in data.trajectories.iter().filter(|t| t.is_rankable()) {
                let uid = trajectory.uid();
                let Some(ranking) = ranking.get(&uid) else {
                    continue;
                };
                let id = SolutionId::new(group.as_str(), uid);
                let metadata = &ranking.metadata;
                let solution_type = if metadata.paradigm.is_empty() {
                    "unknown".to_owned()
                } else {
                    metadata.paradigm.clone()
                };
                rows.push(SolutionRow {
                    visible: !hidden.contains(&id),
                    id,
                    trajectory_name: trajectory.name.clone(),
                    rank: ranking.rank,
                    solution_type,
                    regression_type: metadata.regression_type.clone(),
                    optimization_function: metadata.optimization_function.clone(),
                    noise_level: metadata.noise_level,
                    valid: metadata.valid,
                    rmse_acceleration: metadata.rmse_acceleration,
                    regression_time: metadata.regression_time,
                });
            }
        }
        Self { rows }
    }

    #[must_use]
    pub fn rows(&self) -> &[SolutionRow] {
        &self.rows
    }

    #[must_use]
    pub fn len(&self) -> usize {
        self.rows.len()
    }

    #[must_use]
    pub fn is_empty(&self) -> bool {
        self.rows.is_empty()
    }

    #[must_use]
    pub fn visible_count(&self) -> usize {
        self.rows.iter().filter(|row| row.visible).count()
    }

    /// Rows in display order; equal cells keep document order.
    #[must_use]
    pub fn sorted(&self, sort: SortState) -> Vec<&SolutionRow> {
        let mut rows: Vec<&SolutionRow> = self.rows.iter().collect();
        rows.sort_by(|a, b| {
            let ordering = a.value(sort.field).cmp(&b.value(sort.field));
            match sort.direction {
                SortDirection::Asc => ordering,
                SortDirection::Desc => ordering.reverse(),
            }
        });
        rows
    }

    /// Value-click bulk toggle: rows whose `field` equals `value` are all shown
    /// when none of them is visible, otherwise all hidden.
    #[must_use]
    pub fn toggle_matching(&self, hidden: &HiddenSet, field: SortField, value: &CellValue) -> HiddenSet {
        let matching: Vec<&SolutionRow> = self
            .rows
            .iter()
            .filter(|row| row.value(field) == *value)
            .collect();
        let show = !matching.iter().any(|row| row.visible);
        matching.into_iter().fold(hidden.clone(), |set, row| {
            if show {
                set.with_shown(&row.id)
            } else {
                set.with_hidden(row.id.clone())
            }
        })
    }

    #[must_use]
    pub fn show_all(&self, hidden: &HiddenSet) -> HiddenSet {
        self.rows
            .iter()
            .fold(hidden.clone(), |set, row| set.with_shown(&row.id))
    }

    #[must_use]
    pub fn hide_all(&self, hidden: &HiddenSet) -> HiddenSet {
        self.rows
            .iter()
            .fold(hidden.clone(), |set, row| set.with_hidden(row.id.clone()))
    }
}

/// Column of a solution matrix: one non-reference trajectory.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct MatrixColumn {
    pub group: String,
    pub trajectory_name: String,
    /// Rank when ranked, otherwise the UID.
    pub header: String,
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct MatrixRow {
    pub label: String,
    pub reference: Option<f64>,
    pub candidates: Vec<Option<f64>>,
}

impl MatrixRow {
    fn is_all_zero(&self) -> bool {
        let zero = |value: &Option<f64>| value.is_none_or(|v| v == 0.0 || v.is_nan());
        zero(&self.reference) && self.candidates.iter().all(zero)
    }
}

/// Coefficient comparison for one solution mode, rows labelled by the
/// reference trajectory's solution labels.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct SolutionMatrix {
    pub mode_key: String,
    pub reference_group: String,
    pub reference_name: String,
    pub columns: Vec<MatrixColumn>,
    pub rows: Vec<MatrixRow>,
}

/// Builds one matrix per solution mode found in the document.
///
/// Modes without a reference solution are skipped. With `collapse_zeros`
/// rows whose reference and candidate values are all zero or missing are
/// dropped. A document without solutions yields no matrices.
#[must_use]
pub fn solution_matrices(
    document: &ExperimentDocument,
    ranking: &RankingMap,
    collapse_zeros: bool,
) -> Vec<SolutionMatrix> {
    let modes: IndexSet<&str> = document
        .data
        .values()
        .flat_map(|group| group.trajectories.iter())
        .filter_map(|trajectory| trajectory.solutions.as_deref())
        .flat_map(|solutions| solutions.iter().map(|s| s.mode_key.as_str()))
        .collect();

    let mut matrices = Vec::with_capacity(modes.len());
    for mode in modes {
        let reference = document.data.iter().find_map(|(group, data)| {
            data.trajectories
                .iter()
                .filter(|t| t.reference)
                .find_map(|t| t.solution(mode).map(|solution| (group, t, solution)))
        });
        let Some((reference_group, reference_trajectory, reference_solution)) = reference else {
            continue;
        };

        let mut columns = Vec::new();
        let mut vectors = Vec::new();
        for (group, data) in &document.data {
            for trajectory in &data.trajectories {
                if group == reference_group && std::ptr::eq(trajectory, reference_trajectory) {
                    continue;
                }
                let Some(solution) = trajectory.solution(mode) else {
                    continue;
                };
                columns.push(MatrixColumn {
                    group: group.clone(),
                    trajectory_name: trajectory.name.clone(),
                    header: ranking.label_for(&trajectory.uid()),
                });
                vectors.push(&solution.vector);
            }
        }

        let rows = reference_solution
            .labels
            .iter()
            .enumerate()
            .map(|(index, label)| MatrixRow {
                label: label.clone(),
                reference: reference_solution.vector.get(index).copied(),
                candidates: vectors
                    .iter()
                    .map(|vector| vector.get(index).copied())
                    .collect(),
            })
            .filter(|row| !(collapse_zeros && row.is_all_zero()))
            .collect();

        matrices.push(SolutionMatrix {
            mode_key: mode.to_owned(),
            reference_group: reference_group.clone(),
            reference_name: reference_trajectory.name.clone(),
            columns,
            rows,
        });
    }
    matrices
}
