// src/report/persist.rs
//! Writes the three run artifacts. Every file is fully regenerated per run.

use serde::Serialize;
use std::fs;
use std::path::{Path, PathBuf};

use super::{render_markdown, RawSnapshot, RunReport};
use crate::error::PipelineError;

pub const RAW_FILE: &str = "raw_data.json";
pub const REPORT_FILE: &str = "signal_report.json";
pub const NARRATIVE_FILE: &str = "signal_report.md";

#[derive(Debug, Clone, PartialEq, Eq)]
pub struct OutputPaths {
    pub raw: PathBuf,
    pub report: PathBuf,
    pub narrative: PathBuf,
}

fn write_file(path: &Path, contents: &[u8]) -> Result<(), PipelineError> {
    fs::write(path, contents).map_err(|source| PipelineError::Persist {
        path: path.to_path_buf(),
        source,
    })
}

fn write_json<T: Serialize>(path: &Path, value: &T) -> Result<(), PipelineError> {
    let body = serde_json::to_vec_pretty(value)?;
    write_file(path, &body)
}

/// Create `dir` if needed and write raw data, structured report and narrative.
pub fn write_outputs(
    dir: &Path,
    raw: &RawSnapshot,
    report: &RunReport,
) -> Result<OutputPaths, PipelineError> {
    fs::create_dir_all(dir).map_err(|source| PipelineError::Persist {
        path: dir.to_path_buf(),
        source,
    })?;

    let paths = OutputPaths {
        raw: dir.join(RAW_FILE),
        report: dir.join(REPORT_FILE),
        narrative: dir.join(NARRATIVE_FILE),
    };
    write_json(&paths.raw, raw)?;
    write_json(&paths.report, report)?;
    write_file(&paths.narrative, render_markdown(report).as_bytes())?;

    tracing::info!(
        target: "pipeline",
        dir = %dir.display(),
        "outputs written"
    );
    Ok(paths)
}
