// Session layer
//
// All per-session state lives in `SessionContext`. Front ends translate
// user input into `Action`s and draw the `Render`s that `handle` returns.

mod context;
mod feedback;
mod handler;
mod history;

pub use context::SessionContext;
pub use feedback::{Feedback, FEEDBACK_PROMPT, FEEDBACK_THANKS};
pub use handler::{handle, Action, Render, NO_VALID_DATA, UPLOAD_REMINDER};
pub use history::{ask_dataset, Asked, HistoryEntry, SessionHistory};

#[derive(Debug, Clone, PartialEq, Eq, thiserror::Error)]
pub enum SessionError {
    /// `index` is 0-based; users see 1-based numbers
    #[error("No history entry #{}", .index + 1)]
    NoSuchEntry { index: usize },
    #[error("Dataset {name} is no longer loaded")]
    DatasetNotLoaded { name: String },
    #[error("Dataset {name} not found")]
    UnknownDataset { name: String },
    #[error("No dataset loaded. Please upload a valid CSV or Excel file.")]
    NoDataset,
}
