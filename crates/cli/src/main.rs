// AskGrid CLI - ask questions about CSV and Excel files

mod chat;
mod exit_codes;
mod render;
mod uploads;

use std::io::{self, BufRead, Read};
use std::path::{Path, PathBuf};
use std::process::ExitCode;

use clap::{Parser, Subcommand, ValueEnum};

use askgrid_ai::{AnswerService, CompletionBackend, OpenAIClient};
use askgrid_config::ai::{self, AIConfigStatus, AIDiagnostics, ResolvedAIConfig};
use askgrid_config::settings::Settings;
use askgrid_io::{SourceFormat, Upload};
use askgrid_session::{handle, Action, Render, SessionContext};

use exit_codes::{
    ai_status_exit_code, EXIT_AI_DISABLED, EXIT_AI_KEYCHAIN_ERR, EXIT_AI_REQUEST, EXIT_ERROR,
    EXIT_SUCCESS, EXIT_UPLOAD, EXIT_USAGE,
};
use render::{emit, has_errors};
use uploads::read_uploads;

#[derive(Parser)]
#[command(name = "askgrid")]
#[command(about = "Preview CSV/Excel files and ask an LLM questions about them")]
#[command(version)]
#[command(long_version = long_version())]
struct Cli {
    /// Settings file (default: ~/.config/askgrid/settings.json)
    #[arg(long, global = true, env = "ASKGRID_CONFIG")]
    config: Option<PathBuf>,

    /// Debug logging (RUST_LOG overrides)
    #[arg(long, short = 'v', global = true)]
    verbose: bool,

    #[command(subcommand)]
    command: Commands,
}

/// Files to load plus optional sheet choices
#[derive(clap::Args)]
struct FileArgs {
    /// CSV (.csv) or Excel (.xlsx) files
    #[arg(required = true)]
    files: Vec<PathBuf>,

    /// Sheet to read from an Excel file, as FILE=SHEET (default: first sheet)
    #[arg(long = "sheet", value_name = "FILE=SHEET")]
    sheets: Vec<String>,

    /// Dataset to use (file name; default: first file)
    #[arg(long, short = 'd')]
    dataset: Option<String>,
}

#[derive(Subcommand)]
enum Commands {
    /// Show the first rows of a dataset
    #[command(after_help = "\
Examples:
  askgrid preview passengers.csv
  askgrid preview passengers.csv fares.xlsx --dataset fares.xlsx --rows 25
  askgrid preview book.xlsx --sheet book.xlsx=Q1")]
    Preview {
        #[command(flatten)]
        input: FileArgs,

        /// Rows to show (1-100; default from settings, normally 10)
        #[arg(long, short = 'n')]
        rows: Option<usize>,
    },

    /// Ask one question about a dataset
    #[command(after_help = "\
Examples:
  askgrid ask passengers.csv -q 'What was the survival rate?'
  askgrid ask a.csv b.csv --dataset b.csv -q 'Summarize this data'")]
    Ask {
        #[command(flatten)]
        input: FileArgs,

        /// The question
        #[arg(long, short = 'q')]
        question: String,
    },

    /// Draw one of the canned charts
    Chart {
        /// Which chart
        kind: ChartKind,

        #[command(flatten)]
        input: FileArgs,

        /// Print the chart data as JSON instead of drawing it
        #[arg(long)]
        json: bool,
    },

    /// List the sheets of an Excel file
    Sheets {
        file: PathBuf,
    },

    /// Interactive session: questions, history, re-asking, charts
    Chat {
        /// Files to load at start
        files: Vec<PathBuf>,

        /// Sheet to read from an Excel file, as FILE=SHEET
        #[arg(long = "sheet", value_name = "FILE=SHEET")]
        sheets: Vec<String>,
    },

    /// AI configuration and diagnostics
    Ai {
        #[command(subcommand)]
        command: AiCommands,
    },
}

#[derive(Subcommand)]
enum AiCommands {
    /// Check AI configuration
    Doctor {
        /// Output as JSON for machine parsing
        #[arg(long)]
        json: bool,
    },

    /// Store the API key (read from stdin) in the system keychain
    SetKey,
}

#[derive(Clone, Copy, ValueEnum)]
enum ChartKind {
    /// Histogram of the Age column
    Age,
    /// Mean of Survived grouped by Sex
    Survival,
}

fn long_version() -> &'static str {
    concat!(
        env!("CARGO_PKG_VERSION"),
        " (", env!("ASKGRID_COMMIT"), ")",
        "\ntarget:  ", env!("ASKGRID_TARGET"),
    )
}

fn main() -> ExitCode {
    let cli = Cli::parse();
    init_logging(cli.verbose);

    // key.env / .env in the working directory, never overriding the shell
    if let Ok(cwd) = std::env::current_dir() {
        ai::load_dotenv(&cwd);
    }

    let settings = match &cli.config {
        Some(path) => Settings::load_from(path),
        None => Settings::load(),
    };

    let result = match cli.command {
        Commands::Preview { input, rows } => cmd_preview(&settings, input, rows),
        Commands::Ask { input, question } => cmd_ask(&settings, input, question),
        Commands::Chart { kind, input, json } => cmd_chart(&settings, kind, input, json),
        Commands::Sheets { file } => cmd_sheets(&file),
        Commands::Chat { files, sheets } => cmd_chat(&settings, files, sheets),
        Commands::Ai { command } => match command {
            AiCommands::Doctor { json } => cmd_ai_doctor(&settings, json),
            AiCommands::SetKey => cmd_ai_set_key(&settings),
        },
    };

    match result {
        Ok(()) => ExitCode::from(EXIT_SUCCESS),
        Err(CliError { code, message, hint }) => {
            if !message.is_empty() {
                eprintln!("error: {}", message);
            }
            if let Some(hint) = hint {
                eprintln!("hint:  {}", hint);
            }
            ExitCode::from(code)
        }
    }
}

fn init_logging(verbose: bool) {
    let default_level = if verbose { "debug" } else { "warn" };
    env_logger::Builder::from_env(env_logger::Env::default().default_filter_or(default_level))
        .format_timestamp(None)
        .init();
}

#[derive(Debug)]
pub struct CliError {
    pub code: u8,
    pub message: String,
    pub hint: Option<String>,
}

impl CliError {
    pub fn args(msg: impl Into<String>) -> Self {
        Self { code: EXIT_USAGE, message: msg.into(), hint: None }
    }

    pub fn general(msg: impl Into<String>) -> Self {
        Self { code: EXIT_ERROR, message: msg.into(), hint: None }
    }

    /// Upload failures are printed as renders first, so the message is empty.
    pub fn upload() -> Self {
        Self { code: EXIT_UPLOAD, message: String::new(), hint: None }
    }

    pub fn with_hint(mut self, hint: impl Into<String>) -> Self {
        self.hint = Some(hint.into());
        self
    }
}

// ============================================================================
// Shared helpers
// ============================================================================

fn resolve_ai(settings: &Settings) -> ResolvedAIConfig {
    let config = ResolvedAIConfig::from_settings(&settings.ai);
    if config.status == AIConfigStatus::MissingKey {
        log::warn!(
            "{}; requests will be sent without credentials",
            config.blocking_reason.as_deref().unwrap_or("no API key")
        );
    }
    config
}

fn answer_service(config: &ResolvedAIConfig) -> Result<AnswerService<OpenAIClient>, CliError> {
    AnswerService::from_config(config)
        .map_err(|e| CliError::general(format!("cannot create AI client: {}", e)))
}

/// Load the files into a fresh session and select the requested dataset.
fn open_session<B: CompletionBackend>(
    settings: &Settings,
    input: &FileArgs,
    service: &AnswerService<B>,
) -> Result<SessionContext, CliError> {
    let mut ctx = SessionContext::from_settings(settings);
    load_files(&mut ctx, &input.files, &input.sheets, service)?;

    if let Some(name) = &input.dataset {
        let selected = ctx.select(name).map(|_| ());
        if let Err(e) = selected {
            let loaded: Vec<&str> = ctx.datasets().iter().map(|d| d.name()).collect();
            return Err(
                CliError::args(e.to_string()).with_hint(format!("loaded: {}", loaded.join(", ")))
            );
        }
    }
    Ok(ctx)
}

/// Run one upload batch, printing only failures.
fn load_files<B: CompletionBackend>(
    ctx: &mut SessionContext,
    files: &[PathBuf],
    sheets: &[String],
    service: &AnswerService<B>,
) -> Result<(), CliError> {
    let uploads = match read_uploads(files, sheets) {
        Ok(uploads) => uploads,
        Err(e) => {
            ctx.mark_upload_attempted();
            emit(&[
                Render::Error(e.to_string()),
                Render::Error(askgrid_session::NO_VALID_DATA.to_string()),
            ]);
            return Err(CliError::upload());
        }
    };

    let renders = handle(ctx, Action::Upload(uploads), service);
    if has_errors(&renders) {
        emit(&renders);
        return Err(CliError::upload());
    }
    Ok(())
}

// ============================================================================
// Commands
// ============================================================================

fn cmd_preview(settings: &Settings, input: FileArgs, rows: Option<usize>) -> Result<(), CliError> {
    // Previews never call the API
    let service = answer_service(&ResolvedAIConfig::from_settings(&settings.ai))?;
    let mut ctx = open_session(settings, &input, &service)?;

    let rows = rows.unwrap_or_else(|| ctx.preview_rows());
    emit(&handle(&mut ctx, Action::SetPreviewRows(rows), &service));
    Ok(())
}

fn cmd_ask(settings: &Settings, input: FileArgs, question: String) -> Result<(), CliError> {
    let config = resolve_ai(settings);
    if config.status == AIConfigStatus::Disabled {
        return Err(CliError {
            code: EXIT_AI_DISABLED,
            message: "AI is disabled".to_string(),
            hint: Some(format!("set ai.provider in {}", Settings::config_path_display())),
        });
    }

    let service = answer_service(&config)?;
    let mut ctx = open_session(settings, &input, &service)?;

    let renders = handle(&mut ctx, Action::Ask(question), &service);
    emit(&renders);

    if has_errors(&renders) {
        return Err(CliError { code: EXIT_AI_REQUEST, message: String::new(), hint: None });
    }
    Ok(())
}

fn cmd_chart(
    settings: &Settings,
    kind: ChartKind,
    input: FileArgs,
    json: bool,
) -> Result<(), CliError> {
    let service = answer_service(&ResolvedAIConfig::from_settings(&settings.ai))?;
    let mut ctx = open_session(settings, &input, &service)?;

    let action = match kind {
        ChartKind::Age => Action::ShowAgeHistogram,
        ChartKind::Survival => Action::ShowSurvivalBySex,
    };
    let renders = handle(&mut ctx, action, &service);
    if !json {
        emit(&renders);
        return Ok(());
    }

    for render in &renders {
        let value = match render {
            Render::Histogram(hist) => serde_json::to_value(hist),
            Render::BarChart(chart) => serde_json::to_value(chart),
            other => {
                emit(std::slice::from_ref(other));
                continue;
            }
        }
        .map_err(|e| CliError::general(e.to_string()))?;

        let text = serde_json::to_string_pretty(&value)
            .map_err(|e| CliError::general(e.to_string()))?;
        println!("{}", text);
    }
    Ok(())
}

fn cmd_sheets(file: &Path) -> Result<(), CliError> {
    let upload = Upload::from_path(file).map_err(|e| CliError {
        code: EXIT_UPLOAD,
        message: e.to_string(),
        hint: None,
    })?;

    match upload.format() {
        Ok(SourceFormat::Spreadsheet { .. }) => {}
        Ok(SourceFormat::Csv) => {
            return Err(CliError::args(format!("{} is a CSV file and has no sheets", upload.name)));
        }
        Err(e) => return Err(CliError { code: EXIT_UPLOAD, message: e.to_string(), hint: None }),
    }

    let names = askgrid_io::xlsx::sheet_names(&upload.bytes).map_err(|cause| CliError {
        code: EXIT_UPLOAD,
        message: format!("Error uploading file {}: {}", upload.name, cause),
        hint: None,
    })?;

    for name in names {
        println!("{}", name);
    }
    Ok(())
}

fn cmd_chat(settings: &Settings, files: Vec<PathBuf>, sheets: Vec<String>) -> Result<(), CliError> {
    let config = resolve_ai(settings);
    let service = answer_service(&config)?;
    let mut ctx = SessionContext::from_settings(settings);

    if !files.is_empty() {
        match read_uploads(&files, &sheets) {
            Ok(uploads) => emit(&handle(&mut ctx, Action::Upload(uploads), &service)),
            Err(e) => {
                ctx.mark_upload_attempted();
                emit(&[
                    Render::Error(e.to_string()),
                    Render::Error(askgrid_session::NO_VALID_DATA.to_string()),
                ]);
            }
        }
    }

    let stdin = io::stdin();
    chat::run(&mut ctx, &service, stdin.lock())
        .map_err(|e| CliError::general(format!("reading input: {}", e)))
}

fn cmd_ai_doctor(settings: &Settings, json: bool) -> Result<(), CliError> {
    let config = ResolvedAIConfig::from_settings(&settings.ai);
    let diag = AIDiagnostics::from_resolved(&config);

    if json {
        let json_output = serde_json::json!({
            "schema_version": 1,
            "status": diag.status.as_str(),
            "blocking_reason": diag.blocking_reason,
            "provider": diag.provider,
            "model": diag.model,
            "endpoint": diag.endpoint,
            "max_tokens": diag.max_tokens,
            "timeout_secs": diag.timeout_secs,
            "key": if diag.key_present { "present" } else { "missing" },
            "key_source": diag.key_source.as_str(),
            "keychain": if diag.keychain_available { "ok" } else { "unavailable" },
        });
        let text = serde_json::to_string_pretty(&json_output)
            .map_err(|e| CliError::general(e.to_string()))?;
        println!("{}", text);
    } else {
        println!("{}", diag);
        match diag.status {
            AIConfigStatus::Disabled => {
                println!();
                println!("AI is disabled. To enable:");
                println!("  Set ai.provider in {}", Settings::config_path_display());
            }
            AIConfigStatus::MissingKey => {
                println!();
                println!(
                    "Fix: put OPENAI_API_KEY in key.env, set ASKGRID_OPENAI_KEY, or run `askgrid ai set-key`"
                );
            }
            AIConfigStatus::Ready => {}
        }
    }

    match ai_status_exit_code(diag.status) {
        EXIT_SUCCESS => Ok(()),
        code => Err(CliError {
            code,
            message: format!("AI not ready: {}", diag.status.as_str()),
            hint: None,
        }),
    }
}

fn cmd_ai_set_key(settings: &Settings) -> Result<(), CliError> {
    let provider = settings.ai.provider;
    if !provider.needs_api_key() {
        return Err(CliError::args(format!("provider '{}' does not use an API key", provider.name())));
    }

    let mut key = String::new();
    let stdin = io::stdin();
    if atty_stdin() {
        eprintln!("Paste the {} API key and press Enter:", provider.name());
        stdin
            .lock()
            .read_line(&mut key)
            .map_err(|e| CliError::general(e.to_string()))?;
    } else {
        stdin
            .lock()
            .read_to_string(&mut key)
            .map_err(|e| CliError::general(e.to_string()))?;
    }

    let key = key.trim();
    if key.is_empty() {
        return Err(CliError::args("no key given on stdin"));
    }

    ai::set_api_key(provider.name(), key).map_err(|e| CliError {
        code: EXIT_AI_KEYCHAIN_ERR,
        message: e,
        hint: Some("set ASKGRID_OPENAI_KEY or OPENAI_API_KEY instead".to_string()),
    })?;
    eprintln!("Stored {} key in the system keychain", provider.name());
    Ok(())
}

fn atty_stdin() -> bool {
    use std::io::IsTerminal;
    io::stdin().is_terminal()
}
