use std::path::{Path, PathBuf};

use results_core::{NormalizedResult, PollKey};
use serde_json::json;

use crate::filename::export_filename;
use crate::persist::{AtomicFileWriter, PersistError};

#[derive(Debug, thiserror::Error)]
pub enum ExportError {
    #[error("persist error: {0}")]
    Persist(#[from] PersistError),
    #[error("serialization error: {0}")]
    Serialize(#[from] serde_json::Error),
}

/// Writes a shareable JSON report `har-analysis-{jobId}-{persona}.json` into `dir`.
///
/// The report timestamp is the backend's `created_at` when known, otherwise
/// `exported_utc`.
pub fn export_result(
    dir: &Path,
    key: &PollKey,
    result: &NormalizedResult,
    exported_utc: &str,
) -> Result<PathBuf, ExportError> {
    let report = json!({
        "jobId": key.job_id,
        "persona": key.persona,
        "timestamp": result.created_at.as_deref().unwrap_or(exported_utc),
        "exportedAt": exported_utc,
        "primaryDomain": result.primary_domain(),
        "summary": result.metrics,
        "insights": result.insights,
    });
    let content = serde_json::to_string_pretty(&report)?;

    let filename = export_filename(&format!("har-analysis-{}-{}", key.job_id, key.persona));
    let writer = AtomicFileWriter::new(dir.to_path_buf());
    Ok(writer.write(&filename, &content)?)
}
