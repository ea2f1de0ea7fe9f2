use std::fs;
use std::path::PathBuf;

use indexmap::IndexMap;
use ordered_float::OrderedFloat;
use serde::{Deserialize, Serialize};
use tracing::debug;

use crate::core::ExperimentDocument;
use crate::error::{ViewError, ViewResult};

use super::ViewerConfig;
use super::validation::is_contained_path;

/// Forces below this magnitude count as disabled actuators.
const FORCE_EPSILON: f64 = 1e-10;

/// Manifest entry describing one result file.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct FileInfo {
    pub filename: String,
    #[serde(default)]
    pub experiment_folder: String,
    #[serde(default)]
    pub damping_coefficients: Vec<f64>,
    #[serde(default)]
    pub forces_scale_vector: Vec<f64>,
}

impl FileInfo {
    #[must_use]
    pub fn new(filename: impl Into<String>) -> Self {
        Self {
            filename: filename.into(),
            experiment_folder: String::new(),
            damping_coefficients: Vec::new(),
            forces_scale_vector: Vec::new(),
        }
    }

    /// `true` per actuated coordinate.
    #[must_use]
    pub fn force_pattern(&self) -> Vec<bool> {
        self.forces_scale_vector
            .iter()
            .map(|force| force.abs() >= FORCE_EPSILON)
            .collect()
    }

    fn damping_magnitude(&self) -> f64 {
        self.damping_coefficients.iter().map(|c| c.abs()).sum()
    }
}

/// Older manifests list bare filenames.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(untagged)]
pub enum FileEntry {
    Info(FileInfo),
    Name(String),
}

impl FileEntry {
    #[must_use]
    pub fn filename(&self) -> &str {
        match self {
            Self::Info(info) => &info.filename,
            Self::Name(name) => name,
        }
    }

    #[must_use]
    pub fn to_info(&self) -> FileInfo {
        match self {
            Self::Info(info) => info.clone(),
            Self::Name(name) => FileInfo::new(name.as_str()),
        }
    }
}

#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
pub struct FilesManifest {
    #[serde(default)]
    pub files: Vec<FileEntry>,
}

/// Files sharing one damping setup inside an experiment section.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct DampingGroup {
    pub damping_coefficients: Vec<f64>,
    pub files: Vec<FileInfo>,
}

/// Files of one experiment folder, titled for display.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct ExperimentSection {
    pub folder: String,
    pub title: String,
    pub damping_groups: Vec<DampingGroup>,
}

impl ExperimentSection {
    #[must_use]
    pub fn file_count(&self) -> usize {
        self.damping_groups.iter().map(|group| group.files.len()).sum()
    }
}

impl FilesManifest {
    pub fn from_json_str(input: &str) -> ViewResult<Self> {
        serde_json::from_str(input)
            .map_err(|e| ViewError::DocumentParse(format!("failed to parse manifest json: {e}")))
    }

    pub fn filenames(&self) -> impl Iterator<Item = &str> {
        self.files.iter().map(FileEntry::filename)
    }

    #[must_use]
    pub fn find(&self, filename: &str) -> Option<FileInfo> {
        self.files
            .iter()
            .find(|entry| entry.filename() == filename)
            .map(FileEntry::to_info)
    }

    /// Groups files by experiment folder (first-seen order), then by damping
    /// coefficients ordered by total magnitude.
    #[must_use]
    pub fn sections(&self) -> Vec<ExperimentSection> {
        let mut folders: IndexMap<String, IndexMap<String, DampingGroup>> = IndexMap::new();
        for info in self.files.iter().map(FileEntry::to_info) {
            let damping_key = format!("{:?}", info.damping_coefficients);
            folders
                .entry(info.experiment_folder.clone())
                .or_default()
                .entry(damping_key)
                .or_insert_with(|| DampingGroup {
                    damping_coefficients: info.damping_coefficients.clone(),
                    files: Vec::new(),
                })
                .files
                .push(info);
        }

        folders
            .into_iter()
            .map(|(folder, groups)| {
                let mut damping_groups: Vec<DampingGroup> = groups.into_values().collect();
                damping_groups.sort_by_key(|group| {
                    OrderedFloat(group.files.first().map_or(0.0, FileInfo::damping_magnitude))
                });
                ExperimentSection {
                    title: format_experiment_name(&folder),
                    folder,
                    damping_groups,
                }
            })
            .collect()
    }
}

/// Human-readable title for an experiment folder such as `cart_pole`.
#[must_use]
pub fn format_experiment_name(folder: &str) -> String {
    let segment = folder.rsplit('/').next().unwrap_or(folder);
    match segment {
        "double_pendulum_pm" => "Double Pendulum".to_owned(),
        "cart_pole" => "Cart Pole".to_owned(),
        "cart_pole_double" => "Double Pendulum Cart Pole".to_owned(),
        other => other
            .split('_')
            .map(|word| {
                let mut chars = word.chars();
                match chars.next() {
                    Some(first) => first.to_uppercase().chain(chars).collect(),
                    None => String::new(),
                }
            })
            .collect::<Vec<String>>()
            .join(" "),
    }
}

/// Where manifests and result documents come from.
pub trait DocumentSource {
    fn fetch_manifest(&self) -> ViewResult<FilesManifest>;

    fn fetch_document(&self, filename: &str) -> ViewResult<ExperimentDocument>;
}

/// Reads `{root}/{manifest_name}` and `{root}/{filename}` from disk.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct FsDocumentSource {
    root: PathBuf,
    manifest_name: String,
}

impl FsDocumentSource {
    #[must_use]
    pub fn new(root: impl Into<PathBuf>) -> Self {
        Self {
            root: root.into(),
            manifest_name: "files.json".to_owned(),
        }
    }

    #[must_use]
    pub fn from_config(config: &ViewerConfig) -> Self {
        Self {
            root: config.results_root.clone(),
            manifest_name: config.manifest_name.clone(),
        }
    }

    #[must_use]
    pub fn with_manifest_name(mut self, manifest_name: impl Into<String>) -> Self {
        self.manifest_name = manifest_name.into();
        self
    }

    fn read(&self, name: &str) -> ViewResult<String> {
        let path = self.root.join(name);
        if !is_contained_path(name) {
            return Err(ViewError::DocumentFetch {
                path: path.display().to_string(),
                reason: "path escapes the results root".to_owned(),
            });
        }
        fs::read_to_string(&path).map_err(|e| ViewError::DocumentFetch {
            path: path.display().to_string(),
            reason: e.to_string(),
        })
    }
}

impl DocumentSource for FsDocumentSource {
    fn fetch_manifest(&self) -> ViewResult<FilesManifest> {
        let manifest = FilesManifest::from_json_str(&self.read(&self.manifest_name)?)?;
        debug!(
            root = %self.root.display(),
            files = manifest.files.len(),
            "loaded files manifest"
        );
        Ok(manifest)
    }

    fn fetch_document(&self, filename: &str) -> ViewResult<ExperimentDocument> {
        let document = ExperimentDocument::from_json_str(&self.read(filename)?)?;
        debug!(
            file = filename,
            groups = document.data.len(),
            "loaded experiment document"
        );
        Ok(document)
    }
}

/// Serves manifests and documents from memory; handy for embedding hosts
/// that already hold the JSON.
#[derive(Debug, Clone, Default, PartialEq)]
pub struct MemoryDocumentSource {
    manifest: FilesManifest,
    documents: IndexMap<String, String>,
}

impl MemoryDocumentSource {
    #[must_use]
    pub fn new() -> Self {
        Self::default()
    }

    /// Adds a document and lists it in the manifest.
    #[must_use]
    pub fn with_document(mut self, info: FileInfo, json: impl Into<String>) -> Self {
        self.documents.insert(info.filename.clone(), json.into());
        self.manifest.files.push(FileEntry::Info(info));
        self
    }
}

impl DocumentSource for MemoryDocumentSource {
    fn fetch_manifest(&self) -> ViewResult<FilesManifest> {
        Ok(self.manifest.clone())
    }

    fn fetch_document(&self, filename: &str) -> ViewResult<ExperimentDocument> {
        let raw = self
            .documents
            .get(filename)
            .ok_or_else(|| ViewError::DocumentFetch {
                path: filename.to_owned(),
                reason: "not found".to_owned(),
            })?;
        ExperimentDocument::from_json_str(raw)
    }
}
