mod document_source;
mod json_contract;
mod validation;
mod view_session;
mod viewer_config;

pub use document_source::{
    DampingGroup, DocumentSource, ExperimentSection, FileEntry, FileInfo, FilesManifest,
    FsDocumentSource, MemoryDocumentSource, format_experiment_name,
};
pub use json_contract::{VIEW_SNAPSHOT_JSON_SCHEMA_V1, ViewSnapshotJsonContractV1};
pub use validation::validate_viewer_config;
pub use view_session::{
    FetchTicket, RelativePanel, ViewParams, ViewSession, ViewSnapshot, ViewStatus, derive_view,
};
pub use viewer_config::ViewerConfig;
