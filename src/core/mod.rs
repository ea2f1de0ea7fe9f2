pub mod alignment;
pub mod document;
pub mod field_key;
pub mod flatten;
pub mod playback;
pub mod ranges;
pub mod ranking;
pub mod relative;
pub mod solutions;
pub mod visibility;

pub use alignment::{
    AlignmentStrategy, BinarySearchAlignment, LinearScanAlignment, TimeAlignment,
};
pub use document::{
    Coordinate, CoordinateSeries, DataSeries, ExperimentDocument, RegressionParameters,
    RegressionResult, Series, Solution, TimeAxis, Trajectory, TrajectoryGroup, UID_LEN, Uid,
    VariableKind,
};
pub use field_key::{FieldKey, SeriesPrefix};
pub use flatten::{FlatRecord, FlattenedGroup, GroupedLines, flatten_group};
pub use playback::PlaybackCursor;
pub use ranges::{ValueRange, force_range, position_range, value_range};
pub use ranking::{RankingMap, RankingMetadata, SolutionRanking, rank_solutions};
pub use relative::{RelativeProjection, to_relative};
pub use solutions::{
    CellValue, MatrixColumn, MatrixRow, SolutionControlTable, SolutionMatrix, SolutionRow,
    SortDirection, SortField, SortState, solution_matrices,
};
pub use visibility::{HiddenSet, SolutionId};
