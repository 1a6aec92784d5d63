use colored::Colorize;
use std::fmt;
use std::path::Path;
use std::str::FromStr;
use thiserror::Error;
use tracing::{debug, instrument};

use crate::metrics::MetricRow;

#[derive(Debug, Error)]
pub enum ReportError {
    #[error("Failed to write report file: {0}")]
    FileWrite(#[from] std::io::Error),

    #[error("Invalid result method: {0} (expected \"mean\" or \"percentileNN\", e.g. percentile90)")]
    InvalidMethod(String),
}

const CSV_HEADER: &str =
    ",repo,engineer,pr_number,created_at,pr_state,pr_lifetime_days,commits,comments,additions,deletions,changed_files";

/// Render rows as CSV with a leading 0-based positional index column.
/// Fields are written bare: repository names and logins cannot contain
/// commas, and every other column is numeric.
pub fn to_csv(rows: &[MetricRow]) -> String {
    let mut out = String::new();
    out.push_str(CSV_HEADER);
    out.push('\n');

    for (index, row) in rows.iter().enumerate() {
        out.push_str(&format!(
            "{},{},{},{},{},{},{},{},{},{},{},{}\n",
            index,
            row.repo,
            row.engineer,
            row.pr_number,
            row.created_at,
            row.pr_state,
            row.pr_lifetime_days,
            row.commits,
            row.comments,
            row.additions,
            row.deletions,
            row.changed_files,
        ));
    }

    out
}

#[instrument(skip(rows), fields(rows = rows.len()))]
pub fn write_csv(rows: &[MetricRow], path: &Path) -> Result<(), ReportError> {
    debug!(path = %path.display(), "writing csv report");
    std::fs::write(path, to_csv(rows))?;
    Ok(())
}

/// How to fold the per-PR lifetimes into one reported number.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum SummaryMethod {
    Mean,
    /// Nearest-rank percentile, 1 to 99
    Percentile(u8),
}

impl FromStr for SummaryMethod {
    type Err = ReportError;

    fn from_str(value: &str) -> Result<Self, Self::Err> {
        if value == "mean" {
            return Ok(SummaryMethod::Mean);
        }
        if let Some(digits) = value.strip_prefix("percentile") {
            if let Ok(p) = digits.parse::<u8>() {
                if (1..=99).contains(&p) {
                    return Ok(SummaryMethod::Percentile(p));
                }
            }
        }
        Err(ReportError::InvalidMethod(value.to_string()))
    }
}

impl fmt::Display for SummaryMethod {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            SummaryMethod::Mean => write!(f, "mean"),
            SummaryMethod::Percentile(p) => write!(f, "p{p}"),
        }
    }
}

impl SummaryMethod {
    /// Fold a non-empty sample; `None` when there is nothing to summarize.
    pub fn apply(&self, lifetimes: &[i64]) -> Option<f64> {
        if lifetimes.is_empty() {
            return None;
        }
        match self {
            SummaryMethod::Mean => {
                Some(lifetimes.iter().sum::<i64>() as f64 / lifetimes.len() as f64)
            }
            SummaryMethod::Percentile(p) => {
                let mut sorted = lifetimes.to_vec();
                sorted.sort_unstable();
                let rank = ((f64::from(*p) / 100.0) * sorted.len() as f64).ceil() as usize;
                let index = rank.max(1).min(sorted.len()) - 1;
                Some(sorted[index] as f64)
            }
        }
    }
}

/// Print the folded lifetime statistic to the terminal.
pub fn print_summary(rows: &[MetricRow], method: SummaryMethod) {
    let lifetimes: Vec<i64> = rows.iter().map(|row| row.pr_lifetime_days).collect();
    match method.apply(&lifetimes) {
        Some(days) => println!(
            "{} lifetime over {} pull requests: {} days",
            method.to_string().bold(),
            rows.len(),
            format!("{days:.1}").green().bold(),
        ),
        None => println!("{}", "no pull requests matched the window".yellow()),
    }
}
