use thiserror::Error;

pub type ViewResult<T> = Result<T, ViewError>;

#[derive(Debug, Clone, PartialEq, Eq, Error)]
pub enum ViewError {
    #[error("failed to fetch `{path}`: {reason}")]
    DocumentFetch { path: String, reason: String },

    #[error("invalid document: {0}")]
    DocumentParse(String),

    #[error("group `{group}` is not present in the document")]
    UnknownGroup { group: String },

    #[error("no reference trajectory found in group `{group}`")]
    MissingReference { group: String },

    #[error("group `{group}` has no trajectory with series data")]
    EmptyGroup { group: String },

    #[error("invalid field key: {0}")]
    InvalidFieldKey(String),

    #[error("invalid config: {0}")]
    InvalidConfig(String),
}

impl ViewError {
    /// Returns `true` for errors the view layer reports inline for one group
    /// rather than for the whole document.
    #[must_use]
    pub fn is_group_scoped(&self) -> bool {
        matches!(
            self,
            Self::UnknownGroup { .. } | Self::MissingReference { .. } | Self::EmptyGroup { .. }
        )
    }
}
