use serde::{Deserialize, Serialize};
use tracing::{debug, warn};

use crate::core::{
    Coordinate, ExperimentDocument, FlatRecord, GroupedLines, HiddenSet, PlaybackCursor, RankingMap,
    RelativeProjection, SolutionControlTable, SolutionId, SolutionRow, ValueRange, VariableKind,
    flatten_group, force_range, position_range, rank_solutions, to_relative,
};
use crate::error::{ViewError, ViewResult};

use super::{DocumentSource, ViewerConfig};

/// Everything the user selected, as one immutable value.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct ViewParams {
    pub file: Option<String>,
    pub group: String,
    pub hidden: HiddenSet,
    pub relative: bool,
}

impl ViewParams {
    #[must_use]
    pub fn new(group: impl Into<String>) -> Self {
        Self {
            file: None,
            group: group.into(),
            hidden: HiddenSet::new(),
            relative: false,
        }
    }

    /// Initial parameters for a freshly loaded document.
    #[must_use]
    pub fn for_document(document: &ExperimentDocument, config: &ViewerConfig) -> Self {
        let hidden = if config.hidden_by_default {
            HiddenSet::all_candidates(document)
        } else {
            HiddenSet::new()
        };
        Self::new(config.default_group.as_str()).with_hidden(hidden)
    }

    #[must_use]
    pub fn with_file(mut self, file: impl Into<String>) -> Self {
        self.file = Some(file.into());
        self
    }

    #[must_use]
    pub fn with_group(mut self, group: impl Into<String>) -> Self {
        self.group = group.into();
        self
    }

    #[must_use]
    pub fn with_hidden(mut self, hidden: HiddenSet) -> Self {
        self.hidden = hidden;
        self
    }

    #[must_use]
    pub fn with_relative(mut self, relative: bool) -> Self {
        self.relative = relative;
        self
    }
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(tag = "state", rename_all = "snake_case")]
pub enum ViewStatus {
    Ready,
    Error { message: String },
}

impl ViewStatus {
    #[must_use]
    pub fn is_ready(&self) -> bool {
        matches!(self, Self::Ready)
    }
}

/// Relative projection of one plot panel.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct RelativePanel {
    pub variable: VariableKind,
    pub coordinate: Coordinate,
    pub projection: RelativeProjection,
}

/// Derived, read-only state for one render pass.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct ViewSnapshot {
    pub file: Option<String>,
    pub group: String,
    pub simulation_type: String,
    pub status: ViewStatus,
    pub batch_start_times: Vec<f64>,
    pub ranking: RankingMap,
    pub records: Vec<FlatRecord>,
    pub lines: GroupedLines,
    #[serde(default)]
    pub relative: Vec<RelativePanel>,
    pub control_rows: Vec<SolutionRow>,
    pub position_range: ValueRange,
    pub force_range: ValueRange,
}

impl ViewSnapshot {
    /// Snapshot for a view that could not be derived: no records, no lines.
    #[must_use]
    pub fn failed(params: &ViewParams, config: &ViewerConfig, error: &ViewError) -> Self {
        Self {
            file: params.file.clone(),
            group: params.group.clone(),
            simulation_type: String::new(),
            status: ViewStatus::Error {
                message: error.to_string(),
            },
            batch_start_times: Vec::new(),
            ranking: RankingMap::default(),
            records: Vec::new(),
            lines: GroupedLines::default(),
            relative: Vec::new(),
            control_rows: Vec::new(),
            position_range: config.fallback_position_range,
            force_range: config.fallback_force_range,
        }
    }
}

/// Derives the full view for one document and one set of parameters.
///
/// The ranking always covers every candidate of every group, so hiding a
/// solution never renumbers the others. Structural failures of the selected
/// group are reported through [`ViewStatus::Error`] with zero records; the
/// ranking and control rows stay available.
#[must_use]
pub fn derive_view(
    document: &ExperimentDocument,
    params: &ViewParams,
    config: &ViewerConfig,
) -> ViewSnapshot {
    let ranking = rank_solutions(document.data.values());
    let control_rows = SolutionControlTable::build(document, &ranking, &params.hidden)
        .rows()
        .to_vec();

    let flattened = document.group(&params.group).and_then(|group| {
        flatten_group(
            &params.group,
            group,
            &ranking,
            &params.hidden,
            &config.alignment,
        )
        .map(|flattened| (group, flattened))
    });

    let (group, flattened) = match flattened {
        Ok(found) => found,
        Err(err) => {
            warn!(group = %params.group, error = %err, "view derivation failed");
            let mut snapshot = ViewSnapshot::failed(params, config, &err);
            snapshot.simulation_type = document.simulation_type().to_owned();
            snapshot.ranking = ranking;
            snapshot.control_rows = control_rows;
            return snapshot;
        }
    };

    let relative = if params.relative {
        flattened
            .lines
            .panels()
            .map(|(variable, coordinate, keys)| RelativePanel {
                variable,
                coordinate,
                projection: to_relative(&flattened.records, keys),
            })
            .collect()
    } else {
        Vec::new()
    };

    debug!(
        group = %params.group,
        ranked = ranking.len(),
        records = flattened.records.len(),
        hidden = params.hidden.len(),
        relative = params.relative,
        "derived view"
    );

    ViewSnapshot {
        file: params.file.clone(),
        group: params.group.clone(),
        simulation_type: document.simulation_type().to_owned(),
        status: ViewStatus::Ready,
        batch_start_times: group.batch_start_times.clone(),
        position_range: position_range(&flattened.records, config.fallback_position_range),
        force_range: force_range(&flattened.records, config.fallback_force_range),
        ranking,
        records: flattened.records,
        lines: flattened.lines,
        relative,
        control_rows,
    }
}

/// Identifies one document fetch; only the latest ticket may land.
#[derive(Debug, Clone, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub struct FetchTicket {
    pub generation: u64,
    pub file: String,
}

/// Owns the selected document and view parameters.
///
/// File selection issues a [`FetchTicket`]; a fetch completing with anything
/// but the most recent ticket is discarded, so a slow response for an
/// abandoned selection never overwrites newer state.
#[derive(Debug, Clone)]
pub struct ViewSession {
    config: ViewerConfig,
    generation: u64,
    pending: Option<FetchTicket>,
    document: Option<ExperimentDocument>,
    params: ViewParams,
    fetch_error: Option<ViewError>,
}

impl ViewSession {
    #[must_use]
    pub fn new(config: ViewerConfig) -> Self {
        let params = ViewParams::new(config.default_group.as_str());
        Self {
            config,
            generation: 0,
            pending: None,
            document: None,
            params,
            fetch_error: None,
        }
    }

    #[must_use]
    pub fn config(&self) -> &ViewerConfig {
        &self.config
    }

    #[must_use]
    pub fn params(&self) -> &ViewParams {
        &self.params
    }

    #[must_use]
    pub fn document(&self) -> Option<&ExperimentDocument> {
        self.document.as_ref()
    }

    /// Starts a new selection and returns the ticket its fetch must present.
    pub fn select_file(&mut self, file: impl Into<String>) -> FetchTicket {
        self.generation += 1;
        let ticket = FetchTicket {
            generation: self.generation,
            file: file.into(),
        };
        self.pending = Some(ticket.clone());
        ticket
    }

    /// Lands a completed fetch. Returns `false` when the ticket is stale.
    ///
    /// A successful fetch resets the view parameters for the new document
    /// but keeps the selected group and relative mode.
    pub fn complete_fetch(
        &mut self,
        ticket: &FetchTicket,
        result: ViewResult<ExperimentDocument>,
    ) -> bool {
        if self.pending.as_ref() != Some(ticket) {
            debug!(
                file = %ticket.file,
                generation = ticket.generation,
                latest = self.generation,
                "rejected stale fetch"
            );
            return false;
        }
        self.pending = None;

        match result {
            Ok(document) => {
                self.params = ViewParams::for_document(&document, &self.config)
                    .with_file(ticket.file.as_str())
                    .with_group(self.params.group.as_str())
                    .with_relative(self.params.relative);
                self.document = Some(document);
                self.fetch_error = None;
            }
            Err(err) => {
                warn!(file = %ticket.file, error = %err, "document fetch failed");
                self.document = None;
                self.params = self.params.clone().with_file(ticket.file.as_str());
                self.fetch_error = Some(err);
            }
        }
        true
    }

    /// Selects and fetches a file synchronously.
    pub fn load<S>(&mut self, source: &S, file: &str) -> bool
    where
        S: DocumentSource + ?Sized,
    {
        let ticket = self.select_file(file);
        let result = source.fetch_document(file);
        self.complete_fetch(&ticket, result)
    }

    pub fn set_group(&mut self, group: impl Into<String>) {
        self.params = self.params.clone().with_group(group);
    }

    pub fn set_relative(&mut self, relative: bool) {
        self.params = self.params.clone().with_relative(relative);
    }

    pub fn set_hidden(&mut self, hidden: HiddenSet) {
        self.params = self.params.clone().with_hidden(hidden);
    }

    /// Flips one candidate's visibility; returns whether it is now visible.
    pub fn toggle(&mut self, id: &SolutionId) -> bool {
        let (hidden, visible) = self.params.hidden.clone().toggled(id);
        self.set_hidden(hidden);
        visible
    }

    /// Control table for the loaded document under the current hidden set.
    #[must_use]
    pub fn control_table(&self) -> Option<SolutionControlTable> {
        let document = self.document.as_ref()?;
        let ranking = rank_solutions(document.data.values());
        Some(SolutionControlTable::build(
            document,
            &ranking,
            &self.params.hidden,
        ))
    }

    /// Time-slider cursor over the selected group's reference axis, running at
    /// the configured playback speed. `None` until a view is ready.
    #[must_use]
    pub fn playback_cursor(&self) -> Option<PlaybackCursor> {
        let snapshot = self.snapshot()?;
        if !snapshot.status.is_ready() {
            return None;
        }
        let times = snapshot.records.iter().map(|record| record.time).collect();
        Some(PlaybackCursor::new(times).with_speed(self.config.playback_speed))
    }

    /// Current view, or `None` before any document has landed.
    #[must_use]
    pub fn snapshot(&self) -> Option<ViewSnapshot> {
        if let Some(err) = &self.fetch_error {
            return Some(ViewSnapshot::failed(&self.params, &self.config, err));
        }
        let document = self.document.as_ref()?;
        Some(derive_view(document, &self.params, &self.config))
    }
}
