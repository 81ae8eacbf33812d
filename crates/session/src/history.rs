// Prompt history
//
// Append-only, insertion ordered. Entries are never edited, reordered or
// deduplicated; re-asking adds a new entry.

use askgrid_ai::{
    build_prompt, Answer, AnswerService, CompletionBackend, CompletionError, PromptLimits,
    TruncationNotice,
};
use askgrid_engine::Dataset;

use crate::SessionError;

#[derive(Debug, Clone, PartialEq, Eq)]
pub struct HistoryEntry {
    /// Name of the dataset the question was asked against
    pub dataset: String,
    pub question: String,
    pub answer: Answer,
}

/// One answered question, with what the user should be told about it
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Asked {
    pub entry: HistoryEntry,
    pub truncation: Option<TruncationNotice>,
    pub error: Option<CompletionError>,
}

/// Build the prompt for `question` and send it.
pub fn ask_dataset<B: CompletionBackend>(
    dataset: &Dataset,
    question: &str,
    limits: PromptLimits,
    service: &AnswerService<B>,
) -> Asked {
    let prompt = build_prompt(dataset.table(), question, limits);
    let outcome = service.ask(&prompt.text);

    Asked {
        entry: HistoryEntry {
            dataset: dataset.name().to_string(),
            question: question.to_string(),
            answer: outcome.answer,
        },
        truncation: prompt.truncation,
        error: outcome.error,
    }
}

#[derive(Debug, Clone, Default)]
pub struct SessionHistory {
    entries: Vec<HistoryEntry>,
}

impl SessionHistory {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn append(&mut self, entry: HistoryEntry) {
        self.entries.push(entry);
    }

    pub fn all(&self) -> &[HistoryEntry] {
        &self.entries
    }

    pub fn get(&self, index: usize) -> Option<&HistoryEntry> {
        self.entries.get(index)
    }

    pub fn len(&self) -> usize {
        self.entries.len()
    }

    pub fn is_empty(&self) -> bool {
        self.entries.is_empty()
    }

    /// Ask the question at `index` again, against the dataset recorded for
    /// that entry, and append the result.
    pub fn re_ask<B: CompletionBackend>(
        &mut self,
        index: usize,
        datasets: &[Dataset],
        limits: PromptLimits,
        service: &AnswerService<B>,
    ) -> Result<Asked, SessionError> {
        let original = self.get(index).ok_or(SessionError::NoSuchEntry { index })?;

        let dataset = datasets
            .iter()
            .find(|d| d.name() == original.dataset)
            .ok_or_else(|| SessionError::DatasetNotLoaded { name: original.dataset.clone() })?;

        log::debug!("re-asking history entry {} against {}", index + 1, dataset.name());
        let asked = ask_dataset(dataset, &original.question, limits, service);
        self.append(asked.entry.clone());
        Ok(asked)
    }
}
