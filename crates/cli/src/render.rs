// Terminal rendering of session output
//
// Tables use the engine's text layout; charts are drawn as horizontal ASCII
// bars. Warnings and errors go to stderr, everything else to stdout.

use std::io::{self, Write};

use askgrid_engine::chart::{BarChart, Histogram};
use askgrid_engine::render::to_text;
use askgrid_session::{HistoryEntry, Render};

/// Widest bar, in characters
const BAR_WIDTH: usize = 40;

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Stream {
    Stdout,
    Stderr,
}

/// Text for one render instruction and where it goes.
pub fn format(render: &Render) -> (Stream, String) {
    match render {
        Render::Table { title, table } => (Stream::Stdout, format!("{}\n{}", title, to_text(table))),
        Render::Answer(answer) => (Stream::Stdout, format!("Answer: {}", answer)),
        Render::Info(text) => (Stream::Stdout, text.clone()),
        Render::Warning(text) => (Stream::Stderr, format!("warning: {}", text)),
        Render::Error(text) => (Stream::Stderr, format!("error: {}", text)),
        Render::Histogram(histogram) => (Stream::Stdout, format_histogram(histogram)),
        Render::BarChart(chart) => (Stream::Stdout, format_bar_chart(chart)),
        Render::History(entries) => (Stream::Stdout, format_history(entries)),
    }
}

/// Write every render instruction, in order.
pub fn emit(renders: &[Render]) {
    let stdout = io::stdout();
    let stderr = io::stderr();
    let mut out = stdout.lock();
    let mut err = stderr.lock();

    for render in renders {
        let (stream, text) = format(render);
        // Nothing useful to do if the terminal went away
        let _ = match stream {
            Stream::Stdout => writeln!(out, "{}", text),
            Stream::Stderr => writeln!(err, "{}", text),
        };
    }
}

pub fn has_errors(renders: &[Render]) -> bool {
    renders.iter().any(|r| matches!(r, Render::Error(_)))
}

fn bar(value: f64, max: f64) -> String {
    let len = if max > 0.0 && value.is_finite() {
        ((value / max) * BAR_WIDTH as f64).round() as usize
    } else {
        0
    };
    "#".repeat(len.min(BAR_WIDTH))
}

fn format_histogram(histogram: &Histogram) -> String {
    let labels: Vec<String> = histogram
        .bins
        .iter()
        .map(|b| format!("{:.1} - {:.1}", b.start, b.end))
        .collect();
    let label_width = labels.iter().map(|l| l.len()).max().unwrap_or(0);
    let max = histogram.bins.iter().map(|b| b.count).max().unwrap_or(0) as f64;

    let mut out = histogram.title.clone();
    if histogram.bins.is_empty() {
        out.push_str("\n(no values)");
        return out;
    }
    for (label, bin) in labels.iter().zip(&histogram.bins) {
        out.push_str(&format!(
            "\n{:>width$} | {} {}",
            label,
            bar(bin.count as f64, max),
            bin.count,
            width = label_width
        ));
    }
    out
}

fn format_bar_chart(chart: &BarChart) -> String {
    let label_width = chart.bars.iter().map(|b| b.label.chars().count()).max().unwrap_or(0);
    let max = chart
        .bars
        .iter()
        .map(|b| b.value)
        .filter(|v| v.is_finite())
        .fold(0.0_f64, f64::max);

    let mut out = chart.title.clone();
    for b in &chart.bars {
        let value = if b.value.is_nan() {
            "NaN".to_string()
        } else {
            format!("{:.3}", b.value)
        };
        out.push_str(&format!(
            "\n{:>width$} | {} {}",
            b.label,
            bar(b.value, max),
            value,
            width = label_width
        ));
    }
    out
}

fn format_history(entries: &[HistoryEntry]) -> String {
    if entries.is_empty() {
        return "No previous prompts.".to_string();
    }

    let mut out = String::from("Previous Prompts and Answers:");
    for (i, entry) in entries.iter().enumerate() {
        out.push_str(&format!(
            "\n{}. File: {} | Question: {}\n   Answer: {}",
            i + 1,
            entry.dataset,
            entry.question,
            entry.answer
        ));
    }
    out
}
