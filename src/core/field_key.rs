use std::fmt;
use std::str::FromStr;

use serde::de::{self, Deserializer};
use serde::{Deserialize, Serialize, Serializer};
use smallvec::SmallVec;

use crate::core::document::{Coordinate, UID_LEN, Uid, VariableKind};
use crate::error::{ViewError, ViewResult};

const RELATIVE_SUFFIX: &str = "_rel";

/// Namespace of a candidate field: its rank when ranked, otherwise its raw UID.
///
/// In string form a prefix of exactly [`UID_LEN`] characters is always a UID,
/// even when it is all digits. Shorter all-digit prefixes are ranks, so a
/// rank of 10^7 or more, or an all-digit UID shorter than [`UID_LEN`], does
/// not survive a round trip through the string form.
#[derive(Debug, Clone, PartialEq, Eq, Hash, PartialOrd, Ord)]
pub enum SeriesPrefix {
    Rank(u32),
    Uid(Uid),
}

impl fmt::Display for SeriesPrefix {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Self::Rank(rank) => write!(f, "{rank}"),
            Self::Uid(uid) => f.write_str(uid.as_str()),
        }
    }
}

/// Typed name of one column of a flat record.
///
/// String forms:
/// - `coor_0.qpos` reference sample
/// - `3.coor_0.qpos` candidate ranked 3
/// - `abc12345.coor_0.qpos` unranked candidate
/// - `3_rel` candidate 3 minus reference
///
/// See [`SeriesPrefix`] for how numeric prefixes are read back.
#[derive(Debug, Clone, PartialEq, Eq, Hash, PartialOrd, Ord)]
pub enum FieldKey {
    Reference {
        coordinate: Coordinate,
        variable: VariableKind,
    },
    Candidate {
        prefix: SeriesPrefix,
        coordinate: Coordinate,
        variable: VariableKind,
    },
    Relative {
        rank: u32,
    },
}

impl FieldKey {
    #[must_use]
    pub fn reference(coordinate: u32, variable: VariableKind) -> Self {
        Self::Reference {
            coordinate: Coordinate(coordinate),
            variable,
        }
    }

    #[must_use]
    pub fn ranked(rank: u32, coordinate: u32, variable: VariableKind) -> Self {
        Self::Candidate {
            prefix: SeriesPrefix::Rank(rank),
            coordinate: Coordinate(coordinate),
            variable,
        }
    }

    #[must_use]
    pub fn unranked(uid: Uid, coordinate: u32, variable: VariableKind) -> Self {
        Self::Candidate {
            prefix: SeriesPrefix::Uid(uid),
            coordinate: Coordinate(coordinate),
            variable,
        }
    }

    #[must_use]
    pub fn is_reference(&self) -> bool {
        matches!(self, Self::Reference { .. })
    }

    /// Rank carried by a ranked candidate or relative field.
    #[must_use]
    pub fn rank(&self) -> Option<u32> {
        match self {
            Self::Candidate {
                prefix: SeriesPrefix::Rank(rank),
                ..
            }
            | Self::Relative { rank } => Some(*rank),
            _ => None,
        }
    }

    #[must_use]
    pub fn prefix(&self) -> Option<&SeriesPrefix> {
        match self {
            Self::Candidate { prefix, .. } => Some(prefix),
            _ => None,
        }
    }

    /// `(variable, coordinate)` panel this field is plotted on.
    #[must_use]
    pub fn channel(&self) -> Option<(VariableKind, Coordinate)> {
        match self {
            Self::Reference {
                coordinate,
                variable,
            }
            | Self::Candidate {
                coordinate,
                variable,
                ..
            } => Some((*variable, *coordinate)),
            Self::Relative { .. } => None,
        }
    }

    /// Relative-mode counterpart of a ranked candidate field.
    #[must_use]
    pub fn relative(&self) -> Option<Self> {
        match self {
            Self::Candidate {
                prefix: SeriesPrefix::Rank(rank),
                ..
            } => Some(Self::Relative { rank: *rank }),
            _ => None,
        }
    }

    /// Short legend label: the rank for ranked lines, the full key otherwise.
    #[must_use]
    pub fn legend_label(&self) -> String {
        match self {
            Self::Candidate {
                prefix: SeriesPrefix::Rank(rank),
                ..
            } => rank.to_string(),
            other => other.to_string(),
        }
    }
}

impl fmt::Display for FieldKey {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Self::Reference {
                coordinate,
                variable,
            } => write!(f, "{coordinate}.{variable}"),
            Self::Candidate {
                prefix,
                coordinate,
                variable,
            } => write!(f, "{prefix}.{coordinate}.{variable}"),
            Self::Relative { rank } => write!(f, "{rank}{RELATIVE_SUFFIX}"),
        }
    }
}

impl FromStr for FieldKey {
    type Err = ViewError;

    fn from_str(raw: &str) -> ViewResult<Self> {
        let invalid = || ViewError::InvalidFieldKey(format!("`{raw}`"));

        if let Some(rank) = raw.strip_suffix(RELATIVE_SUFFIX) {
            let rank = rank.parse::<u32>().map_err(|_| invalid())?;
            return Ok(Self::Relative { rank });
        }

        let parts: SmallVec<[&str; 3]> = raw.split('.').collect();
        match parts.as_slice() {
            [coordinate, variable] => Ok(Self::Reference {
                coordinate: coordinate.parse()?,
                variable: VariableKind::parse(variable).ok_or_else(invalid)?,
            }),
            [prefix, coordinate, variable] => {
                let len = prefix.chars().count();
                if len == 0 || len > UID_LEN {
                    return Err(invalid());
                }
                let prefix = match prefix.parse::<u32>() {
                    Ok(rank) if len < UID_LEN => SeriesPrefix::Rank(rank),
                    _ => SeriesPrefix::Uid(Uid::from_name(prefix)),
                };
                Ok(Self::Candidate {
                    prefix,
                    coordinate: coordinate.parse()?,
                    variable: VariableKind::parse(variable).ok_or_else(invalid)?,
                })
            }
            _ => Err(invalid()),
        }
    }
}

impl Serialize for FieldKey {
    fn serialize<S: Serializer>(&self, serializer: S) -> Result<S::Ok, S::Error> {
        serializer.collect_str(self)
    }
}

impl<'de> Deserialize<'de> for FieldKey {
    fn deserialize<D: Deserializer<'de>>(deserializer: D) -> Result<Self, D::Error> {
        let raw = String::deserialize(deserializer)?;
        raw.parse().map_err(de::Error::custom)
    }
}
