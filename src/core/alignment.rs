use ordered_float::OrderedFloat;
use serde::{Deserialize, Serialize};

/// Maps a reference time stamp onto the closest sample of another axis.
///
/// Ties resolve to the lowest index. An empty axis has no nearest sample.
pub trait TimeAlignment: Send + Sync {
    fn find_nearest_index(&self, axis: &[f64], target: f64) -> Option<usize>;
}

/// Exhaustive scan; makes no assumption about axis ordering.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq)]
pub struct LinearScanAlignment;

impl TimeAlignment for LinearScanAlignment {
    fn find_nearest_index(&self, axis: &[f64], target: f64) -> Option<usize> {
        axis.iter()
            .enumerate()
            .min_by_key(|(_, time)| OrderedFloat((*time - target).abs()))
            .map(|(index, _)| index)
    }
}

/// Bisection over an ascending axis.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq)]
pub struct BinarySearchAlignment;

impl TimeAlignment for BinarySearchAlignment {
    fn find_nearest_index(&self, axis: &[f64], target: f64) -> Option<usize> {
        if axis.is_empty() {
            return None;
        }

        let upper = axis.partition_point(|time| *time < target);
        if upper == 0 {
            return Some(0);
        }
        let lower_value = axis[upper - 1];
        // Equal stamps: report the first occurrence.
        let lower = axis.partition_point(|time| *time < lower_value);
        if upper == axis.len() {
            return Some(lower);
        }

        let lower_distance = OrderedFloat((lower_value - target).abs());
        let upper_distance = OrderedFloat((axis[upper] - target).abs());
        if upper_distance < lower_distance {
            Some(upper)
        } else {
            Some(lower)
        }
    }
}

/// Serializable selector for the alignment implementation.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum AlignmentStrategy {
    #[default]
    LinearScan,
    BinarySearch,
}

impl TimeAlignment for AlignmentStrategy {
    fn find_nearest_index(&self, axis: &[f64], target: f64) -> Option<usize> {
        match self {
            Self::LinearScan => LinearScanAlignment.find_nearest_index(axis, target),
            Self::BinarySearch => BinarySearchAlignment.find_nearest_index(axis, target),
        }
    }
}
