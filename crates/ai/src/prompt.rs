// Prompt construction
//
// Two character caps apply in sequence: `char_limit` on the serialized
// dataset (reported to the user), then `context_cap` when the text is
// placed into the prompt. With the defaults (3500, 2000) the second cap
// always wins; both are kept as configured.

use askgrid_config::settings::{PromptSettings, DEFAULT_CHAR_LIMIT, DEFAULT_CONTEXT_CAP};
use askgrid_engine::{render, Table};

pub const PROMPT_PREAMBLE: &str = "Provide a brief summary based on this dataset:\n\n";
pub const QUESTION_LABEL: &str = "\n\nQuestion: ";

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct PromptLimits {
    /// Max characters of serialized dataset before a truncation notice
    pub char_limit: usize,
    /// Max characters of dataset text inside the final prompt
    pub context_cap: usize,
}

impl Default for PromptLimits {
    fn default() -> Self {
        Self {
            char_limit: DEFAULT_CHAR_LIMIT,
            context_cap: DEFAULT_CONTEXT_CAP,
        }
    }
}

impl From<&PromptSettings> for PromptLimits {
    fn from(settings: &PromptSettings) -> Self {
        Self {
            char_limit: settings.char_limit,
            context_cap: settings.context_cap,
        }
    }
}

/// The serialized dataset was longer than the character limit.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct TruncationNotice {
    pub original_chars: usize,
    pub kept_chars: usize,
}

impl TruncationNotice {
    pub fn message(&self) -> &'static str {
        "Dataset is too large, truncating it for the query."
    }
}

impl std::fmt::Display for TruncationNotice {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.write_str(self.message())
    }
}

#[derive(Debug, Clone, PartialEq, Eq)]
pub struct BuiltPrompt {
    pub text: String,
    pub truncation: Option<TruncationNotice>,
}

/// First `n` characters of `s` (not bytes)
fn take_chars(s: &str, n: usize) -> &str {
    match s.char_indices().nth(n) {
        Some((idx, _)) => &s[..idx],
        None => s,
    }
}

/// Hard cut of the serialized dataset to `char_limit` characters.
pub fn truncate_dataset_text(text: &str, char_limit: usize) -> (&str, Option<TruncationNotice>) {
    let original_chars = text.chars().count();
    if original_chars <= char_limit {
        return (text, None);
    }

    let kept = take_chars(text, char_limit);
    (
        kept,
        Some(TruncationNotice {
            original_chars,
            kept_chars: char_limit,
        }),
    )
}

/// Preamble, dataset text capped at `context_cap` characters, then the
/// question verbatim after the label.
pub fn compose_prompt(dataset_text: &str, question: &str, context_cap: usize) -> String {
    let context = take_chars(dataset_text, context_cap);

    let mut prompt = String::with_capacity(
        PROMPT_PREAMBLE.len() + context.len() + QUESTION_LABEL.len() + question.len(),
    );
    prompt.push_str(PROMPT_PREAMBLE);
    prompt.push_str(context);
    prompt.push_str(QUESTION_LABEL);
    prompt.push_str(question);
    prompt
}

/// Build the prompt for a question about `table`.
pub fn build_prompt(table: &Table, question: &str, limits: PromptLimits) -> BuiltPrompt {
    let serialized = render::to_text(table);
    let (dataset_text, truncation) = truncate_dataset_text(&serialized, limits.char_limit);

    if let Some(notice) = &truncation {
        log::warn!(
            "dataset text truncated from {} to {} characters",
            notice.original_chars,
            notice.kept_chars
        );
    }

    BuiltPrompt {
        text: compose_prompt(dataset_text, question, limits.context_cap),
        truncation,
    }
}
