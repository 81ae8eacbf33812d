// Canned charts
//
// Both charts are tied to passenger-manifest column names. Only the chart
// data is computed here; drawing belongs to the front end.

use std::cmp::Ordering;
use std::collections::BTreeMap;

use serde::Serialize;

use super::cell::CellValue;
use super::table::Table;

pub const AGE_COLUMN: &str = "Age";
pub const SURVIVED_COLUMN: &str = "Survived";
pub const SEX_COLUMN: &str = "Sex";

/// Number of equal-width bins in the age histogram
pub const HISTOGRAM_BINS: usize = 10;

/// A chart was requested but the dataset lacks the columns it needs.
#[derive(Debug, Clone, Copy, PartialEq, Eq, thiserror::Error)]
pub enum MissingColumnWarning {
    #[error("Age column not found in the dataset.")]
    Age,
    #[error("Survived and Sex columns not found in the dataset.")]
    SurvivalBySex,
}

#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct HistogramBin {
    pub start: f64,
    pub end: f64,
    pub count: usize,
}

#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct Histogram {
    pub title: String,
    pub bins: Vec<HistogramBin>,
}

impl Histogram {
    pub fn total(&self) -> usize {
        self.bins.iter().map(|b| b.count).sum()
    }
}

#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct Bar {
    pub label: String,
    pub value: f64,
}

#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct BarChart {
    pub title: String,
    pub bars: Vec<Bar>,
}

/// Distribution of the `Age` column. Missing and infinite values are dropped.
pub fn age_histogram(table: &Table) -> Result<Histogram, MissingColumnWarning> {
    let column = table.column(AGE_COLUMN).ok_or(MissingColumnWarning::Age)?;
    let values: Vec<f64> = column.numbers().filter(|v| v.is_finite()).collect();

    Ok(Histogram {
        title: "Age Distribution".to_string(),
        bins: equal_width_bins(&values, HISTOGRAM_BINS),
    })
}

/// Grouping key: numbers order by value and sort before text.
#[derive(Debug, Clone)]
enum GroupKey {
    Number(f64),
    Text(String),
}

impl GroupKey {
    fn of(cell: &CellValue) -> Self {
        match cell.as_f64() {
            Some(n) => GroupKey::Number(n),
            None => GroupKey::Text(cell.display()),
        }
    }
}

impl Ord for GroupKey {
    fn cmp(&self, other: &Self) -> Ordering {
        match (self, other) {
            (GroupKey::Number(a), GroupKey::Number(b)) => a.total_cmp(b),
            (GroupKey::Number(_), GroupKey::Text(_)) => Ordering::Less,
            (GroupKey::Text(_), GroupKey::Number(_)) => Ordering::Greater,
            (GroupKey::Text(a), GroupKey::Text(b)) => a.cmp(b),
        }
    }
}

impl PartialOrd for GroupKey {
    fn partial_cmp(&self, other: &Self) -> Option<Ordering> {
        Some(self.cmp(other))
    }
}

impl PartialEq for GroupKey {
    fn eq(&self, other: &Self) -> bool {
        self.cmp(other) == Ordering::Equal
    }
}

impl Eq for GroupKey {}

/// Mean of `Survived` for each distinct `Sex`, groups ordered by key.
/// Rows with a missing `Sex` are left out; a group with no numeric
/// `Survived` values gets NaN.
pub fn survival_by_sex(table: &Table) -> Result<BarChart, MissingColumnWarning> {
    let (survived, sex) = match (table.column(SURVIVED_COLUMN), table.column(SEX_COLUMN)) {
        (Some(survived), Some(sex)) => (survived, sex),
        _ => return Err(MissingColumnWarning::SurvivalBySex),
    };

    // label is the first cell seen for the key
    let mut groups: BTreeMap<GroupKey, (String, f64, usize)> = BTreeMap::new();
    for (key, value) in sex.cells.iter().zip(&survived.cells) {
        if key.is_empty() {
            continue;
        }
        let entry = groups
            .entry(GroupKey::of(key))
            .or_insert_with(|| (key.display(), 0.0, 0));
        if let Some(v) = value.as_f64() {
            entry.1 += v;
            entry.2 += 1;
        }
    }

    let bars = groups
        .into_values()
        .map(|(label, sum, count)| Bar {
            label,
            value: if count == 0 { f64::NAN } else { sum / count as f64 },
        })
        .collect();

    Ok(BarChart {
        title: "Survival Rate by Sex".to_string(),
        bars,
    })
}

/// Split `[min, max]` into `bins` equal intervals; the last one is closed.
/// A degenerate range is widened by 0.5 on each side.
fn equal_width_bins(values: &[f64], bins: usize) -> Vec<HistogramBin> {
    if values.is_empty() || bins == 0 {
        return Vec::new();
    }

    let mut lo = values.iter().copied().fold(f64::INFINITY, f64::min);
    let mut hi = values.iter().copied().fold(f64::NEG_INFINITY, f64::max);
    if lo == hi {
        lo -= 0.5;
        hi += 0.5;
    }
    let width = (hi - lo) / bins as f64;

    let mut out: Vec<HistogramBin> = (0..bins)
        .map(|i| HistogramBin {
            start: lo + width * i as f64,
            end: if i + 1 == bins { hi } else { lo + width * (i + 1) as f64 },
            count: 0,
        })
        .collect();

    for v in values {
        let idx = (((v - lo) / width).floor() as usize).min(bins - 1);
        out[idx].count += 1;
    }

    out
}
