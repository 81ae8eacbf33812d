// Per-session state
//
// Created when a session starts and dropped (or `end`ed) when it finishes.
// Nothing here outlives the process.

use askgrid_ai::PromptLimits;
use askgrid_config::settings::{clamp_preview_rows, Settings, DEFAULT_PREVIEW_ROWS};
use askgrid_engine::Dataset;

use crate::feedback::Feedback;
use crate::history::SessionHistory;
use crate::SessionError;

#[derive(Debug, Clone)]
pub struct SessionContext {
    /// Upload order; names are unique
    datasets: Vec<Dataset>,
    selected: Option<String>,
    preview_rows: usize,
    upload_attempted: bool,
    history: SessionHistory,
    feedback: Vec<Feedback>,
    limits: PromptLimits,
    default_rows: usize,
}

impl Default for SessionContext {
    fn default() -> Self {
        Self::new(DEFAULT_PREVIEW_ROWS, PromptLimits::default())
    }
}

impl SessionContext {
    pub fn new(preview_rows: usize, limits: PromptLimits) -> Self {
        let default_rows = clamp_preview_rows(preview_rows);
        Self {
            datasets: Vec::new(),
            selected: None,
            preview_rows: default_rows,
            upload_attempted: false,
            history: SessionHistory::new(),
            feedback: Vec::new(),
            limits,
            default_rows,
        }
    }

    pub fn from_settings(settings: &Settings) -> Self {
        Self::new(settings.preview.effective_rows(), PromptLimits::from(&settings.prompt))
    }

    // ------------------------------------------------------------------------
    // Datasets
    // ------------------------------------------------------------------------

    pub fn datasets(&self) -> &[Dataset] {
        &self.datasets
    }

    pub fn dataset(&self, name: &str) -> Option<&Dataset> {
        self.datasets.iter().find(|d| d.name() == name)
    }

    /// Add datasets in order. A dataset whose name is already loaded
    /// replaces the old one in place. Selects the first new dataset when
    /// nothing valid is selected.
    pub fn add_datasets(&mut self, datasets: Vec<Dataset>) {
        let first_new = datasets.first().map(|d| d.name().to_string());

        for dataset in datasets {
            match self.datasets.iter_mut().find(|d| d.name() == dataset.name()) {
                Some(slot) => *slot = dataset,
                None => self.datasets.push(dataset),
            }
        }

        if self.selected_dataset().is_none() {
            self.selected = first_new;
        }
    }

    pub fn select(&mut self, name: &str) -> Result<&Dataset, SessionError> {
        let index = self
            .datasets
            .iter()
            .position(|d| d.name() == name)
            .ok_or_else(|| SessionError::UnknownDataset { name: name.to_string() })?;
        self.selected = Some(name.to_string());
        Ok(&self.datasets[index])
    }

    pub fn selected_dataset(&self) -> Option<&Dataset> {
        self.selected.as_deref().and_then(|name| self.dataset(name))
    }

    // ------------------------------------------------------------------------
    // Preview and prompt settings
    // ------------------------------------------------------------------------

    pub fn preview_rows(&self) -> usize {
        self.preview_rows
    }

    /// Clamped to 1..=100; returns the value actually stored
    pub fn set_preview_rows(&mut self, rows: usize) -> usize {
        self.preview_rows = clamp_preview_rows(rows);
        self.preview_rows
    }

    pub fn limits(&self) -> PromptLimits {
        self.limits
    }

    // ------------------------------------------------------------------------
    // Upload attempts, history, feedback
    // ------------------------------------------------------------------------

    pub fn upload_attempted(&self) -> bool {
        self.upload_attempted
    }

    pub fn mark_upload_attempted(&mut self) {
        self.upload_attempted = true;
    }

    pub fn history(&self) -> &SessionHistory {
        &self.history
    }

    pub fn history_mut(&mut self) -> &mut SessionHistory {
        &mut self.history
    }

    /// History and datasets together, for re-asking
    pub(crate) fn history_and_datasets(&mut self) -> (&mut SessionHistory, &[Dataset]) {
        (&mut self.history, &self.datasets)
    }

    pub fn feedback(&self) -> &[Feedback] {
        &self.feedback
    }

    pub fn record_feedback(&mut self, feedback: Feedback) {
        self.feedback.push(feedback);
    }

    /// Drop all session state. Limits and the configured default row count
    /// carry over to the next session.
    pub fn end(&mut self) {
        log::debug!(
            "ending session: {} datasets, {} history entries",
            self.datasets.len(),
            self.history.len()
        );
        *self = Self::new(self.default_rows, self.limits);
    }
}
