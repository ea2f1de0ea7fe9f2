use std::collections::BTreeSet;
use std::fmt;

use serde::{Deserialize, Serialize};

use crate::core::document::{ExperimentDocument, Uid};
use crate::core::field_key::{FieldKey, SeriesPrefix};
use crate::core::flatten::{FlatRecord, GroupedLines};
use crate::core::ranking::RankingMap;

/// Structured identity of one candidate inside one group.
#[derive(Debug, Clone, PartialEq, Eq, Hash, PartialOrd, Ord, Serialize, Deserialize)]
pub struct SolutionId {
    pub group: String,
    pub uid: Uid,
}

impl SolutionId {
    #[must_use]
    pub fn new(group: impl Into<String>, uid: Uid) -> Self {
        Self {
            group: group.into(),
            uid,
        }
    }

    /// Parses the flat `{group}_{trajectory name}` form against the known
    /// group names. The longest group prefix decides the split; an empty
    /// trajectory name after it is rejected rather than retried on a shorter
    /// group.
    #[must_use]
    pub fn parse_flat<'a, I>(raw: &str, group_names: I) -> Option<Self>
    where
        I: IntoIterator<Item = &'a str>,
    {
        let (group, rest) = group_names
            .into_iter()
            .filter_map(|group| {
                let rest = raw.strip_prefix(group)?.strip_prefix('_')?;
                Some((group, rest))
            })
            .max_by_key(|(group, _)| group.len())?;
        if rest.is_empty() {
            return None;
        }
        Some(Self::new(group, Uid::from_name(rest)))
    }
}

impl fmt::Display for SolutionId {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}_{}", self.group, self.uid)
    }
}

/// Candidates excluded from plotting.
///
/// Membership is exact on [`SolutionId`]: hiding a UID in one group leaves the
/// same UID in other groups untouched. References are never subject to hiding.
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct HiddenSet {
    ids: BTreeSet<SolutionId>,
}

impl HiddenSet {
    #[must_use]
    pub fn new() -> Self {
        Self::default()
    }

    /// Initial state on document load: every candidate of every group hidden.
    #[must_use]
    pub fn all_candidates(document: &ExperimentDocument) -> Self {
        let ids = document
            .data
            .iter()
            .flat_map(|(group, data)| {
                data.candidates()
                    .map(move |trajectory| SolutionId::new(group.as_str(), trajectory.uid()))
            })
            .collect();
        Self { ids }
    }

    #[must_use]
    pub fn with_hidden(mut self, id: SolutionId) -> Self {
        self.ids.insert(id);
        self
    }

    #[must_use]
    pub fn with_shown(mut self, id: &SolutionId) -> Self {
        self.ids.remove(id);
        self
    }

    /// Flips one id and returns the new set plus whether it is now visible.
    #[must_use]
    pub fn toggled(mut self, id: &SolutionId) -> (Self, bool) {
        let visible = if self.ids.remove(id) {
            true
        } else {
            self.ids.insert(id.clone());
            false
        };
        (self, visible)
    }

    #[must_use]
    pub fn contains(&self, id: &SolutionId) -> bool {
        self.ids.contains(id)
    }

    /// Whether `uid` is hidden within `group`.
    #[must_use]
    pub fn is_hidden_in(&self, group: &str, uid: &Uid) -> bool {
        self.ids
            .iter()
            .any(|id| id.group == group && &id.uid == uid)
    }

    #[must_use]
    pub fn len(&self) -> usize {
        self.ids.len()
    }

    #[must_use]
    pub fn is_empty(&self) -> bool {
        self.ids.is_empty()
    }

    pub fn iter(&self) -> impl Iterator<Item = &SolutionId> {
        self.ids.iter()
    }

    /// Whether a plotted field of `group` survives the filter.
    #[must_use]
    pub fn includes_field(&self, group: &str, key: &FieldKey, ranking: &RankingMap) -> bool {
        let uid = match key {
            FieldKey::Reference { .. } => return true,
            FieldKey::Candidate {
                prefix: SeriesPrefix::Uid(uid),
                ..
            } => Some(uid),
            FieldKey::Candidate {
                prefix: SeriesPrefix::Rank(rank),
                ..
            }
            | FieldKey::Relative { rank } => ranking.uid_for_rank(*rank),
        };
        uid.is_none_or(|uid| !self.is_hidden_in(group, uid))
    }

    /// Drops hidden candidates from a line index; empty panels are kept so
    /// the reference line stays plotted.
    #[must_use]
    pub fn filter_lines(
        &self,
        group: &str,
        lines: &GroupedLines,
        ranking: &RankingMap,
    ) -> GroupedLines {
        lines.filtered(|key| self.includes_field(group, key, ranking))
    }

    /// Drops hidden candidate fields from records, returning new records.
    #[must_use]
    pub fn filter_records(
        &self,
        group: &str,
        records: &[FlatRecord],
        ranking: &RankingMap,
    ) -> Vec<FlatRecord> {
        records
            .iter()
            .map(|record| FlatRecord {
                time: record.time,
                fields: record
                    .fields
                    .iter()
                    .filter(|(key, _)| self.includes_field(group, key, ranking))
                    .map(|(key, value)| (key.clone(), *value))
                    .collect(),
            })
            .collect()
    }
}

impl FromIterator<SolutionId> for HiddenSet {
    fn from_iter<T: IntoIterator<Item = SolutionId>>(iter: T) -> Self {
        Self {
            ids: iter.into_iter().collect(),
        }
    }
}
