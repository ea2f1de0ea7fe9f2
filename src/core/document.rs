use std::fmt;
use std::str::FromStr;

use indexmap::IndexMap;
use serde::de::{self, Deserializer};
use serde::{Deserialize, Serialize, Serializer};
use serde_json::Value;

use crate::error::{ViewError, ViewResult};

/// Number of leading name characters that identify a trajectory.
pub const UID_LEN: usize = 8;

/// Canonical short identifier of a trajectory: the first [`UID_LEN`]
/// characters of its name.
///
/// Two trajectories sharing that prefix are indistinguishable everywhere
/// downstream.
#[derive(Debug, Clone, PartialEq, Eq, Hash, PartialOrd, Ord, Serialize, Deserialize)]
#[serde(transparent)]
pub struct Uid(String);

impl Uid {
    #[must_use]
    pub fn from_name(name: &str) -> Self {
        Self(name.chars().take(UID_LEN).collect())
    }

    #[must_use]
    pub fn as_str(&self) -> &str {
        &self.0
    }
}

impl fmt::Display for Uid {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(&self.0)
    }
}

/// Physical quantity recorded per coordinate.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum VariableKind {
    Qpos,
    Qvel,
    Qacc,
    Forces,
}

impl VariableKind {
    pub const ALL: [Self; 4] = [Self::Qpos, Self::Qvel, Self::Qacc, Self::Forces];

    #[must_use]
    pub fn as_str(self) -> &'static str {
        match self {
            Self::Qpos => "qpos",
            Self::Qvel => "qvel",
            Self::Qacc => "qacc",
            Self::Forces => "forces",
        }
    }

    #[must_use]
    pub fn parse(raw: &str) -> Option<Self> {
        Self::ALL.into_iter().find(|kind| kind.as_str() == raw)
    }
}

impl fmt::Display for VariableKind {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

/// Coordinate index, displayed as `coor_{index}`.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord)]
pub struct Coordinate(pub u32);

impl Coordinate {
    const PREFIX: &'static str = "coor_";

    #[must_use]
    pub fn index(self) -> u32 {
        self.0
    }
}

impl fmt::Display for Coordinate {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}{}", Self::PREFIX, self.0)
    }
}

impl FromStr for Coordinate {
    type Err = ViewError;

    fn from_str(raw: &str) -> ViewResult<Self> {
        raw.strip_prefix(Self::PREFIX)
            .and_then(|digits| digits.parse::<u32>().ok())
            .map(Self)
            .ok_or_else(|| ViewError::InvalidFieldKey(format!("invalid coordinate `{raw}`")))
    }
}

impl Serialize for Coordinate {
    fn serialize<S: Serializer>(&self, serializer: S) -> Result<S::Ok, S::Error> {
        serializer.collect_str(self)
    }
}

impl<'de> Deserialize<'de> for Coordinate {
    fn deserialize<D: Deserializer<'de>>(deserializer: D) -> Result<Self, D::Error> {
        let raw = String::deserialize(deserializer)?;
        raw.parse().map_err(de::Error::custom)
    }
}

/// Parsed experiment result file.
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
pub struct ExperimentDocument {
    /// Simulation setup, kept verbatim for display.
    #[serde(default)]
    pub generation_params: Value,
    #[serde(default)]
    pub data_path: String,
    /// Trajectory groups keyed by name, in document order.
    pub data: IndexMap<String, TrajectoryGroup>,
}

impl ExperimentDocument {
    #[must_use]
    pub fn new() -> Self {
        Self {
            generation_params: Value::Null,
            data_path: String::new(),
            data: IndexMap::new(),
        }
    }

    /// Appends (or replaces) a named group.
    #[must_use]
    pub fn with_group(mut self, name: impl Into<String>, group: TrajectoryGroup) -> Self {
        self.data.insert(name.into(), group);
        self
    }

    #[must_use]
    pub fn with_generation_params(mut self, params: Value) -> Self {
        self.generation_params = params;
        self
    }

    pub fn from_json_str(input: &str) -> ViewResult<Self> {
        serde_json::from_str(input)
            .map_err(|e| ViewError::DocumentParse(format!("failed to parse experiment json: {e}")))
    }

    pub fn group(&self, name: &str) -> ViewResult<&TrajectoryGroup> {
        self.data.get(name).ok_or_else(|| ViewError::UnknownGroup {
            group: name.to_owned(),
        })
    }

    pub fn group_names(&self) -> impl Iterator<Item = &str> {
        self.data.keys().map(String::as_str)
    }

    /// Last path segment of `generation_params.experiment_folder`, e.g.
    /// `cart_pole`. Empty when the field is absent.
    #[must_use]
    pub fn simulation_type(&self) -> &str {
        self.generation_params
            .get("experiment_folder")
            .and_then(Value::as_str)
            .and_then(|folder| folder.rsplit('/').next())
            .unwrap_or("")
    }
}

#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
pub struct TrajectoryGroup {
    #[serde(
        default,
        rename = "batch_starting_time",
        alias = "batch_starting_times"
    )]
    pub batch_start_times: Vec<f64>,
    #[serde(default)]
    pub trajectories: Vec<Trajectory>,
}

impl TrajectoryGroup {
    #[must_use]
    pub fn new(trajectories: Vec<Trajectory>) -> Self {
        Self {
            batch_start_times: Vec::new(),
            trajectories,
        }
    }

    /// First trajectory flagged as reference.
    #[must_use]
    pub fn reference(&self) -> Option<&Trajectory> {
        self.trajectories.iter().find(|trajectory| trajectory.reference)
    }

    pub fn candidates(&self) -> impl Iterator<Item = &Trajectory> {
        self.trajectories.iter().filter(|trajectory| !trajectory.reference)
    }
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Trajectory {
    pub name: String,
    #[serde(default)]
    pub series: Option<Series>,
    #[serde(default)]
    pub solutions: Option<Vec<Solution>>,
    #[serde(default)]
    pub reference: bool,
    #[serde(default)]
    pub regression_result: Option<RegressionResult>,
}

impl Trajectory {
    #[must_use]
    pub fn new(name: impl Into<String>) -> Self {
        Self {
            name: name.into(),
            series: None,
            solutions: None,
            reference: false,
            regression_result: None,
        }
    }

    #[must_use]
    pub fn as_reference(mut self) -> Self {
        self.reference = true;
        self
    }

    #[must_use]
    pub fn with_series(mut self, series: Series) -> Self {
        self.series = Some(series);
        self
    }

    #[must_use]
    pub fn with_solutions(mut self, solutions: Vec<Solution>) -> Self {
        self.solutions = Some(solutions);
        self
    }

    #[must_use]
    pub fn with_regression_result(mut self, result: RegressionResult) -> Self {
        self.regression_result = Some(result);
        self
    }

    #[must_use]
    pub fn uid(&self) -> Uid {
        Uid::from_name(&self.name)
    }

    /// Whether this trajectory takes part in solution ranking.
    #[must_use]
    pub fn is_rankable(&self) -> bool {
        !self.reference && self.solutions.is_some() && self.regression_result.is_some()
    }

    #[must_use]
    pub fn solution(&self, mode_key: &str) -> Option<&Solution> {
        self.solutions
            .as_deref()
            .and_then(|solutions| solutions.iter().find(|s| s.mode_key == mode_key))
    }
}

/// Sampled trajectory: one time axis plus per-variable, per-coordinate data.
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
pub struct Series {
    pub time: TimeAxis,
    #[serde(default)]
    pub qpos: DataSeries,
    #[serde(default)]
    pub qvel: DataSeries,
    #[serde(default)]
    pub qacc: DataSeries,
    #[serde(default)]
    pub forces: DataSeries,
    #[serde(default)]
    pub sample_number: Option<usize>,
}

impl Series {
    #[must_use]
    pub fn new(time: Vec<f64>) -> Self {
        Self {
            time: TimeAxis::new(time),
            ..Self::default()
        }
    }

    /// Adds (or replaces) one coordinate channel.
    #[must_use]
    pub fn with_channel(mut self, variable: VariableKind, coordinate: u32, data: Vec<f64>) -> Self {
        let series = &mut self.variable_mut(variable).series;
        match series
            .iter_mut()
            .find(|entry| entry.coordinate_number == coordinate)
        {
            Some(entry) => entry.data = data,
            None => series.push(CoordinateSeries {
                coordinate_number: coordinate,
                data,
            }),
        }
        self
    }

    #[must_use]
    pub fn variable(&self, kind: VariableKind) -> &DataSeries {
        match kind {
            VariableKind::Qpos => &self.qpos,
            VariableKind::Qvel => &self.qvel,
            VariableKind::Qacc => &self.qacc,
            VariableKind::Forces => &self.forces,
        }
    }

    fn variable_mut(&mut self, kind: VariableKind) -> &mut DataSeries {
        match kind {
            VariableKind::Qpos => &mut self.qpos,
            VariableKind::Qvel => &mut self.qvel,
            VariableKind::Qacc => &mut self.qacc,
            VariableKind::Forces => &mut self.forces,
        }
    }

    /// Iterates every recorded channel, variable-major then coordinate order.
    pub fn channels(&self) -> impl Iterator<Item = (VariableKind, Coordinate, &[f64])> {
        VariableKind::ALL.into_iter().flat_map(move |kind| {
            self.variable(kind).series.iter().map(move |entry| {
                (
                    kind,
                    Coordinate(entry.coordinate_number),
                    entry.data.as_slice(),
                )
            })
        })
    }
}

/// Ordered time stamps of a series.
///
/// Accepts `{"time": [...]}` or a bare list, where each stamp is either a
/// number or a singleton list `[t]`.
#[derive(Debug, Clone, Default, PartialEq, Serialize)]
pub struct TimeAxis {
    time: Vec<f64>,
}

impl TimeAxis {
    #[must_use]
    pub fn new(time: Vec<f64>) -> Self {
        Self { time }
    }

    #[must_use]
    pub fn as_slice(&self) -> &[f64] {
        &self.time
    }

    #[must_use]
    pub fn len(&self) -> usize {
        self.time.len()
    }

    #[must_use]
    pub fn is_empty(&self) -> bool {
        self.time.is_empty()
    }
}

impl<'de> Deserialize<'de> for TimeAxis {
    fn deserialize<D: Deserializer<'de>>(deserializer: D) -> Result<Self, D::Error> {
        #[derive(Deserialize)]
        #[serde(untagged)]
        enum Stamp {
            Bare(f64),
            Wrapped(Vec<f64>),
        }

        #[derive(Deserialize)]
        #[serde(untagged)]
        enum Repr {
            Nested { time: Vec<Stamp> },
            Flat(Vec<Stamp>),
        }

        let stamps = match Repr::deserialize(deserializer)? {
            Repr::Nested { time } | Repr::Flat(time) => time,
        };
        let mut time = Vec::with_capacity(stamps.len());
        for stamp in stamps {
            match stamp {
                Stamp::Bare(value) => time.push(value),
                Stamp::Wrapped(values) => match values.first() {
                    Some(value) => time.push(*value),
                    None => return Err(de::Error::custom("empty wrapped time stamp")),
                },
            }
        }
        Ok(Self { time })
    }
}

#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
pub struct DataSeries {
    #[serde(default)]
    pub series: Vec<CoordinateSeries>,
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct CoordinateSeries {
    pub coordinate_number: u32,
    #[serde(default)]
    pub data: Vec<f64>,
}

/// One regression mode fitted to a trajectory; `labels[i]` names `vector[i]`.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Solution {
    #[serde(rename = "mode_solution")]
    pub mode_key: String,
    #[serde(rename = "solution_vector", default)]
    pub vector: Vec<f64>,
    #[serde(rename = "solution_label", default)]
    pub labels: Vec<String>,
}

impl Solution {
    #[must_use]
    pub fn new(mode_key: impl Into<String>, vector: Vec<f64>, labels: Vec<String>) -> Self {
        Self {
            mode_key: mode_key.into(),
            vector,
            labels,
        }
    }
}

#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
pub struct RegressionParameters {
    #[serde(default)]
    pub optimization_function: String,
    #[serde(default)]
    pub paradigm: String,
    #[serde(default)]
    pub regression_type: String,
    #[serde(default)]
    pub noise_level: f64,
    #[serde(default)]
    pub random_seed: Vec<i64>,
    #[serde(default)]
    pub data_ratio: Option<f64>,
}

#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
pub struct RegressionResult {
    pub regression_parameters: RegressionParameters,
    #[serde(default)]
    pub valid: Option<bool>,
    #[serde(default)]
    pub regression_time: Option<f64>,
    #[serde(default)]
    pub timeout: bool,
    #[serde(rename = "RMSE_acceleration", default)]
    pub rmse_acceleration: Option<f64>,
    #[serde(rename = "RMSE_validation_position", default)]
    pub rmse_validation_position: Option<f64>,
}

impl RegressionResult {
    #[must_use]
    pub fn new(regression_type: &str, optimization_function: &str, noise_level: f64) -> Self {
        Self {
            regression_parameters: RegressionParameters {
                optimization_function: optimization_function.to_owned(),
                regression_type: regression_type.to_owned(),
                noise_level,
                ..RegressionParameters::default()
            },
            ..Self::default()
        }
    }
}
