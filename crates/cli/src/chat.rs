// Interactive session (`askgrid chat`)
//
// Plain lines are questions about the selected dataset. Lines starting
// with ':' are commands. History numbers are 1-based here and 0-based in
// the session layer.

use std::io::{self, BufRead, Write};
use std::path::PathBuf;

use askgrid_ai::{AnswerService, CompletionBackend};
use askgrid_session::{handle, Action, Feedback, Render, SessionContext};

use crate::render::emit;
use crate::uploads::read_uploads;

pub const HELP: &str = "\
Type a question to ask about the selected dataset, or a command:
  :use NAME             select a dataset
  :rows N               rows to preview (1-100)
  :datasets             list loaded datasets
  :history              show previous prompts and answers
  :reask N              ask prompt N again
  :age                  histogram of the Age column
  :survival             survival rate by Sex
  :feedback yes|no [TEXT]
                        was the last answer helpful?
  :upload FILE...       load more files (FILE=SHEET picks a sheet)
  :help                 this text
  :quit                 end the session";

#[derive(Debug, Clone, PartialEq, Eq)]
pub enum ChatLine {
    Blank,
    Question(String),
    Use(String),
    Rows(usize),
    Datasets,
    History,
    /// 1-based, as shown in `:history`
    ReAsk(usize),
    Age,
    Survival,
    Feedback { helpful: bool, comment: Option<String> },
    Upload(Vec<String>),
    Help,
    Quit,
}

pub fn parse_line(line: &str) -> Result<ChatLine, String> {
    let trimmed = line.trim();
    if trimmed.is_empty() {
        return Ok(ChatLine::Blank);
    }

    let Some(command) = trimmed.strip_prefix(':') else {
        return Ok(ChatLine::Question(trimmed.to_string()));
    };

    let (name, rest) = match command.split_once(char::is_whitespace) {
        Some((name, rest)) => (name, rest.trim()),
        None => (command, ""),
    };

    match name {
        "use" if !rest.is_empty() => Ok(ChatLine::Use(rest.to_string())),
        "use" => Err(":use needs a dataset name".to_string()),
        "rows" => rest
            .parse::<usize>()
            .map(ChatLine::Rows)
            .map_err(|_| format!(":rows needs a number, got '{}'", rest)),
        "datasets" => Ok(ChatLine::Datasets),
        "history" => Ok(ChatLine::History),
        "reask" => match rest.parse::<usize>() {
            Ok(n) if n >= 1 => Ok(ChatLine::ReAsk(n)),
            _ => Err(format!(":reask needs a prompt number from :history, got '{}'", rest)),
        },
        "age" => Ok(ChatLine::Age),
        "survival" => Ok(ChatLine::Survival),
        "feedback" => {
            let (answer, comment) = match rest.split_once(char::is_whitespace) {
                Some((answer, comment)) => (answer, Some(comment.trim().to_string())),
                None => (rest, None),
            };
            let helpful = match answer.to_ascii_lowercase().as_str() {
                "yes" | "y" => true,
                "no" | "n" => false,
                _ => return Err(":feedback needs yes or no".to_string()),
            };
            Ok(ChatLine::Feedback { helpful, comment })
        }
        "upload" if !rest.is_empty() => Ok(ChatLine::Upload(
            rest.split_whitespace().map(str::to_string).collect(),
        )),
        "upload" => Err(":upload needs at least one file".to_string()),
        "help" | "?" => Ok(ChatLine::Help),
        "quit" | "exit" | "q" => Ok(ChatLine::Quit),
        other => Err(format!("unknown command ':{}' (try :help)", other)),
    }
}

/// `FILE=SHEET` arguments split into paths and sheet choices
fn split_upload_args(args: &[String]) -> (Vec<PathBuf>, Vec<String>) {
    let mut files = Vec::new();
    let mut sheets = Vec::new();
    for arg in args {
        match arg.split_once('=') {
            Some((file, _)) => {
                files.push(PathBuf::from(file));
                sheets.push(arg.clone());
            }
            None => files.push(PathBuf::from(arg)),
        }
    }
    (files, sheets)
}

fn dataset_list(ctx: &SessionContext) -> Render {
    if ctx.datasets().is_empty() {
        return Render::Info("No datasets loaded.".to_string());
    }
    let selected = ctx.selected_dataset().map(|d| d.name().to_string());
    let lines: Vec<String> = ctx
        .datasets()
        .iter()
        .map(|d| {
            let marker = if Some(d.name()) == selected.as_deref() { "*" } else { " " };
            format!(
                "{} {} ({} rows x {} columns)",
                marker,
                d.name(),
                d.table().row_count(),
                d.table().col_count()
            )
        })
        .collect();
    Render::Info(lines.join("\n"))
}

/// Translate one input line into renders. Returns `None` on `:quit`.
pub fn step<B: CompletionBackend>(
    ctx: &mut SessionContext,
    line: &str,
    service: &AnswerService<B>,
) -> Option<Vec<Render>> {
    let parsed = match parse_line(line) {
        Ok(parsed) => parsed,
        Err(message) => return Some(vec![Render::Error(message)]),
    };

    let action = match parsed {
        ChatLine::Quit => return None,
        ChatLine::Blank => return Some(Vec::new()),
        ChatLine::Help => return Some(vec![Render::Info(HELP.to_string())]),
        ChatLine::Datasets => return Some(vec![dataset_list(ctx)]),
        ChatLine::Question(q) => Action::Ask(q),
        ChatLine::Use(name) => Action::SelectDataset(name),
        ChatLine::Rows(n) => Action::SetPreviewRows(n),
        ChatLine::History => Action::ShowHistory,
        ChatLine::ReAsk(n) => Action::ReAsk(n - 1),
        ChatLine::Age => Action::ShowAgeHistogram,
        ChatLine::Survival => Action::ShowSurvivalBySex,
        ChatLine::Feedback { helpful, comment } => {
            Action::Feedback(Feedback::new(helpful, comment.as_deref()))
        }
        ChatLine::Upload(args) => {
            let (files, sheets) = split_upload_args(&args);
            match read_uploads(&files, &sheets) {
                Ok(uploads) => Action::Upload(uploads),
                Err(e) => {
                    ctx.mark_upload_attempted();
                    return Some(vec![
                        Render::Error(e.to_string()),
                        Render::Error(askgrid_session::NO_VALID_DATA.to_string()),
                    ]);
                }
            }
        }
    };

    Some(handle(ctx, action, service))
}

/// Read lines until EOF or `:quit`, then end the session.
pub fn run<B: CompletionBackend, R: BufRead>(
    ctx: &mut SessionContext,
    service: &AnswerService<B>,
    input: R,
) -> io::Result<()> {
    println!("askgrid chat: type :help for commands, :quit to leave");

    let mut lines = input.lines();
    loop {
        print!("> ");
        io::stdout().flush()?;

        let Some(line) = lines.next() else { break };
        match step(ctx, &line?, service) {
            Some(renders) => emit(&renders),
            None => break,
        }
    }

    ctx.end();
    Ok(())
}
