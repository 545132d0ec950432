//! Report writers: five pure functions over a [`crate::scorer::ScoringResult`]
//! (or the [`crate::optimizer::OptimizationResult`] that wraps one), each
//! rendered as text or JSON.
//!
//! Every writer here takes its data by reference and returns an owned
//! `String`/[`serde_json::Value`]; none of them touch the filesystem.
//! [`write_to_file`] is the one place that does, and it's a thin wrapper the
//! CLI's `--output` flag calls through.

pub mod json;
pub mod text;

use crate::error::Result;
use std::path::Path;

/// Which of the five reports to render. `All` concatenates (text) or nests
/// (JSON) the other four.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum ReportKind {
    Summary,
    Student,
    Class,
    School,
    Config,
    All,
}

impl std::str::FromStr for ReportKind {
    type Err = String;

    fn from_str(s: &str) -> std::result::Result<Self, Self::Err> {
        match s {
            "summary" => Ok(ReportKind::Summary),
            "student" => Ok(ReportKind::Student),
            "class" => Ok(ReportKind::Class),
            "school" => Ok(ReportKind::School),
            "config" => Ok(ReportKind::Config),
            "all" => Ok(ReportKind::All),
            other => Err(format!(
                "unknown report kind '{other}', expected one of summary, student, class, school, config, all"
            )),
        }
    }
}

/// Writes `contents` to `path`, overwriting any existing file. The one
/// filesystem touch point in this module.
pub fn write_to_file(path: impl AsRef<Path>, contents: &str) -> Result<()> {
    std::fs::write(path, contents)?;
    Ok(())
}
