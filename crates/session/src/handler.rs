// Action handling
//
// Every user interaction is one `Action`. `handle` runs it to completion
// against the session and returns what the front end should show, in order.
// Failures become `Render::Error`/`Render::Warning`; nothing here aborts the
// session.

use askgrid_ai::{Answer, AnswerService, CompletionBackend};
use askgrid_engine::chart::{self, BarChart, Histogram};
use askgrid_engine::{Dataset, Table};
use askgrid_io::{ingest_batch, Upload};

use crate::context::SessionContext;
use crate::feedback::{Feedback, FEEDBACK_PROMPT, FEEDBACK_THANKS};
use crate::history::{ask_dataset, Asked, HistoryEntry};
use crate::SessionError;

/// Shown when an upload is attempted with no files
pub const UPLOAD_REMINDER: &str = "Please upload a valid CSV or Excel file.";
/// Shown after a batch is rejected
pub const NO_VALID_DATA: &str = "No valid data uploaded. Please upload a valid CSV or Excel file.";

#[derive(Debug, Clone)]
pub enum Action {
    /// One batch of files; an empty batch is an attempt with nothing chosen
    Upload(Vec<Upload>),
    SelectDataset(String),
    SetPreviewRows(usize),
    /// Question about the selected dataset
    Ask(String),
    /// 0-based history index
    ReAsk(usize),
    ShowAgeHistogram,
    ShowSurvivalBySex,
    ShowHistory,
    Feedback(Feedback),
}

#[derive(Debug, Clone, PartialEq)]
pub enum Render {
    Table { title: String, table: Table },
    Answer(Answer),
    Info(String),
    Warning(String),
    Error(String),
    Histogram(Histogram),
    BarChart(BarChart),
    History(Vec<HistoryEntry>),
}

pub fn handle<B: CompletionBackend>(
    ctx: &mut SessionContext,
    action: Action,
    service: &AnswerService<B>,
) -> Vec<Render> {
    match action {
        Action::Upload(uploads) => upload(ctx, uploads),
        Action::SelectDataset(name) => match ctx.select(&name) {
            Ok(_) => preview(ctx),
            Err(e) => vec![Render::Error(e.to_string())],
        },
        Action::SetPreviewRows(rows) => {
            ctx.set_preview_rows(rows);
            preview(ctx)
        }
        Action::Ask(question) => ask(ctx, question, service),
        Action::ReAsk(index) => re_ask(ctx, index, service),
        Action::ShowAgeHistogram => with_selected(ctx, |dataset| {
            match chart::age_histogram(dataset.table()) {
                Ok(histogram) => Render::Histogram(histogram),
                Err(warning) => Render::Warning(warning.to_string()),
            }
        }),
        Action::ShowSurvivalBySex => with_selected(ctx, |dataset| {
            match chart::survival_by_sex(dataset.table()) {
                Ok(bars) => Render::BarChart(bars),
                Err(warning) => Render::Warning(warning.to_string()),
            }
        }),
        Action::ShowHistory => vec![Render::History(ctx.history().all().to_vec())],
        Action::Feedback(feedback) => give_feedback(ctx, feedback),
    }
}

fn upload(ctx: &mut SessionContext, uploads: Vec<Upload>) -> Vec<Render> {
    if uploads.is_empty() {
        return if ctx.upload_attempted() {
            vec![Render::Warning(UPLOAD_REMINDER.to_string())]
        } else {
            Vec::new()
        };
    }

    ctx.mark_upload_attempted();

    match ingest_batch(&uploads) {
        Ok(datasets) => {
            let names: Vec<String> = datasets.iter().map(|d| d.name().to_string()).collect();
            ctx.add_datasets(datasets);

            let mut renders = vec![Render::Info(format!("Loaded {}", names.join(", ")))];
            renders.extend(preview(ctx));
            renders
        }
        Err(e) => {
            log::warn!("upload batch rejected at {}", e.file_name());
            vec![Render::Error(e.to_string()), Render::Error(NO_VALID_DATA.to_string())]
        }
    }
}

fn preview(ctx: &SessionContext) -> Vec<Render> {
    let rows = ctx.preview_rows();
    with_selected(ctx, |dataset| Render::Table {
        title: format!("{} (first {} rows)", dataset.name(), rows),
        table: dataset.table().head(rows),
    })
}

/// Run `f` on the selected dataset, or warn that nothing is loaded.
fn with_selected(ctx: &SessionContext, f: impl FnOnce(&Dataset) -> Render) -> Vec<Render> {
    match ctx.selected_dataset() {
        Some(dataset) => vec![f(dataset)],
        None => vec![Render::Warning(SessionError::NoDataset.to_string())],
    }
}

fn ask<B: CompletionBackend>(
    ctx: &mut SessionContext,
    question: String,
    service: &AnswerService<B>,
) -> Vec<Render> {
    if question.is_empty() {
        return Vec::new();
    }

    let asked = match ctx.selected_dataset() {
        Some(dataset) => ask_dataset(dataset, &question, ctx.limits(), service),
        None => return vec![Render::Warning(SessionError::NoDataset.to_string())],
    };

    ctx.history_mut().append(asked.entry.clone());
    answered(asked)
}

fn re_ask<B: CompletionBackend>(
    ctx: &mut SessionContext,
    index: usize,
    service: &AnswerService<B>,
) -> Vec<Render> {
    let limits = ctx.limits();
    let (history, datasets) = ctx.history_and_datasets();

    match history.re_ask(index, datasets, limits, service) {
        Ok(asked) => {
            let mut renders = vec![Render::Info(format!(
                "Reusing Question: {}",
                asked.entry.question
            ))];
            renders.extend(answered(asked));
            renders
        }
        Err(e) => vec![Render::Error(e.to_string())],
    }
}

fn answered(asked: Asked) -> Vec<Render> {
    let mut renders = Vec::new();
    if let Some(notice) = asked.truncation {
        renders.push(Render::Warning(notice.to_string()));
    }
    if let Some(err) = asked.error {
        renders.push(Render::Error(err.user_message()));
    }
    renders.push(Render::Answer(asked.entry.answer));
    renders
}

fn give_feedback(ctx: &mut SessionContext, feedback: Feedback) -> Vec<Render> {
    if feedback.helpful {
        return Vec::new();
    }
    if !feedback.is_actionable() {
        return vec![Render::Info(FEEDBACK_PROMPT.to_string())];
    }

    ctx.record_feedback(feedback);
    vec![Render::Info(FEEDBACK_THANKS.to_string())]
}
