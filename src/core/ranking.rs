use indexmap::IndexMap;
use ordered_float::OrderedFloat;
use serde::{Deserialize, Serialize};
use tracing::debug;

use crate::core::document::{RegressionResult, TrajectoryGroup, Uid};

/// Regression metadata copied from the trajectory that produced a ranking.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct RankingMetadata {
    pub regression_type: String,
    pub optimization_function: String,
    pub noise_level: f64,
    pub paradigm: String,
    pub valid: Option<bool>,
    pub regression_time: Option<f64>,
    pub rmse_acceleration: Option<f64>,
}

impl From<&RegressionResult> for RankingMetadata {
    fn from(result: &RegressionResult) -> Self {
        let params = &result.regression_parameters;
        Self {
            regression_type: params.regression_type.clone(),
            optimization_function: params.optimization_function.clone(),
            noise_level: params.noise_level,
            paradigm: params.paradigm.clone(),
            valid: result.valid,
            regression_time: result.regression_time,
            rmse_acceleration: result.rmse_acceleration,
        }
    }
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct SolutionRanking {
    pub uid: Uid,
    pub rank: u32,
    pub metadata: RankingMetadata,
}

/// UID to rank lookup, iterated in rank order.
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
pub struct RankingMap {
    entries: IndexMap<Uid, SolutionRanking>,
}

impl RankingMap {
    #[must_use]
    pub fn get(&self, uid: &Uid) -> Option<&SolutionRanking> {
        self.entries.get(uid)
    }

    #[must_use]
    pub fn rank_of(&self, uid: &Uid) -> Option<u32> {
        self.entries.get(uid).map(|ranking| ranking.rank)
    }

    /// Inverse lookup. Ranks are dense, so the rank doubles as a position.
    #[must_use]
    pub fn uid_for_rank(&self, rank: u32) -> Option<&Uid> {
        let index = usize::try_from(rank.checked_sub(1)?).ok()?;
        self.entries.get_index(index).map(|(uid, _)| uid)
    }

    /// Display label for a UID: its rank, or the raw UID when unranked.
    #[must_use]
    pub fn label_for(&self, uid: &Uid) -> String {
        self.rank_of(uid)
            .map_or_else(|| uid.to_string(), |rank| rank.to_string())
    }

    #[must_use]
    pub fn len(&self) -> usize {
        self.entries.len()
    }

    #[must_use]
    pub fn is_empty(&self) -> bool {
        self.entries.is_empty()
    }

    pub fn iter(&self) -> impl Iterator<Item = &SolutionRanking> {
        self.entries.values()
    }
}

/// Ranks every distinct candidate UID across all groups.
///
/// A trajectory qualifies when it is not a reference and carries both
/// solutions and a regression result. The first occurrence of a UID wins.
/// Order: regression type, then optimization function, then noise level
/// (all ascending), with the UID as final tiebreak so the result does not
/// depend on document order. Ranks are `1..=N`.
pub fn rank_solutions<'a, I>(groups: I) -> RankingMap
where
    I: IntoIterator<Item = &'a TrajectoryGroup>,
{
    let mut seen = IndexMap::<Uid, RankingMetadata>::new();
    let mut qualifying = 0_usize;
    for group in groups {
        for trajectory in group.trajectories.iter().filter(|t| t.is_rankable()) {
            qualifying += 1;
            let Some(result) = trajectory.regression_result.as_ref() else {
                continue;
            };
            seen.entry(trajectory.uid())
                .or_insert_with(|| RankingMetadata::from(result));
        }
    }

    let mut candidates: Vec<(Uid, RankingMetadata)> = seen.into_iter().collect();
    candidates.sort_by(|(a_uid, a), (b_uid, b)| {
        a.regression_type
            .cmp(&b.regression_type)
            .then_with(|| a.optimization_function.cmp(&b.optimization_function))
            .then_with(|| OrderedFloat(a.noise_level).cmp(&OrderedFloat(b.noise_level)))
            .then_with(|| a_uid.cmp(b_uid))
    });

    let entries: IndexMap<Uid, SolutionRanking> = candidates
        .into_iter()
        .zip(1_u32..)
        .map(|((uid, metadata), rank)| {
            (
                uid.clone(),
                SolutionRanking {
                    uid,
                    rank,
                    metadata,
                },
            )
        })
        .collect();

    debug!(
        qualifying,
        ranked = entries.len(),
        "ranked candidate solutions"
    );
    RankingMap { entries }
}
