use std::path::{Path, PathBuf};
use std::sync::Arc;

use log::{info, warn};
use serde::Serialize;
use time::OffsetDateTime;
use tokio::sync::Semaphore;
use uuid::Uuid;

use crate::config::PipelineConfig;
use crate::error::Result;
use crate::models::ProcessingReport;
use crate::pipeline::Pipeline;

/// File extensions picked up from an input folder (compared case-insensitively)
pub const ACCEPTED_EXTENSIONS: [&str; 4] = ["png", "jpg", "jpeg", "gif"];

/// Outcome of one image in a batch
#[derive(Debug, Clone, Serialize)]
pub struct FileOutcome {
    pub original: String,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub report: Option<ProcessingReport>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub error: Option<String>,
}

/// Everything produced by one batch run
#[derive(Debug, Clone, Serialize)]
pub struct ScanSummary {
    pub scan_id: Uuid,
    pub started_at: String,
    pub output_dir: PathBuf,
    pub files: Vec<FileOutcome>,
}

impl ScanSummary {
    pub fn failed_files(&self) -> impl Iterator<Item = &FileOutcome> {
        self.files.iter().filter(|f| f.error.is_some())
    }
}

/// Image files of `dir` with an accepted extension, sorted by name
pub fn collect_images(dir: &Path) -> Result<Vec<PathBuf>> {
    let mut files = Vec::new();
    for entry in std::fs::read_dir(dir)? {
        let path = entry?.path();
        if !path.is_file() {
            continue;
        }
        let accepted = path
            .extension()
            .and_then(|e| e.to_str())
            .map(|e| ACCEPTED_EXTENSIONS.contains(&e.to_ascii_lowercase().as_str()))
            .unwrap_or(false);
        if accepted {
            files.push(path);
        }
    }
    files.sort();
    Ok(files)
}

/// Run one independent pipeline invocation per image in `input_dir`.
///
/// At most `concurrency` images are processed at a time, each on a blocking
/// worker. The configuration is validated once before any work starts; a
/// failure on one image is recorded in its [`FileOutcome`] and never stops the
/// other images.
pub async fn process_folder(
    input_dir: &Path,
    output_dir: &Path,
    config: PipelineConfig,
    concurrency: usize,
) -> Result<ScanSummary> {
    let pipeline = Arc::new(Pipeline::from_config(config)?);
    let files = collect_images(input_dir)?;
    let scan_id = Uuid::new_v4();
    let started_at = timestamp();
    info!(
        "Scan {}: processing {} images from {}",
        scan_id,
        files.len(),
        input_dir.display()
    );

    let semaphore = Arc::new(Semaphore::new(concurrency.max(1)));
    let mut handles = Vec::with_capacity(files.len());
    for path in files {
        let original = path
            .file_name()
            .map(|n| n.to_string_lossy().into_owned())
            .unwrap_or_default();
        let Ok(permit) = semaphore.clone().acquire_owned().await else {
            break;
        };
        let pipeline = pipeline.clone();
        let output_dir = output_dir.to_path_buf();
        let handle = tokio::task::spawn_blocking(move || {
            let _permit = permit;
            pipeline.process_image(&path, &output_dir)
        });
        handles.push((original, handle));
    }

    let mut outcomes = Vec::with_capacity(handles.len());
    for (original, handle) in handles {
        let outcome = match handle.await {
            Ok(Ok(report)) => FileOutcome {
                original,
                report: Some(report),
                error: None,
            },
            Ok(Err(e)) => {
                warn!("Scan {}: {} failed: {}", scan_id, original, e);
                FileOutcome {
                    original,
                    report: None,
                    error: Some(e.to_string()),
                }
            }
            Err(e) => {
                warn!("Scan {}: worker for {} did not finish: {}", scan_id, original, e);
                FileOutcome {
                    original,
                    report: None,
                    error: Some(format!("worker did not finish: {}", e)),
                }
            }
        };
        outcomes.push(outcome);
    }

    Ok(ScanSummary {
        scan_id,
        started_at,
        output_dir: output_dir.to_path_buf(),
        files: outcomes,
    })
}

/// Local wall-clock time as `YYYY-MM-DD HH:MM:SS`, UTC if the offset is unknown
fn timestamp() -> String {
    let now = OffsetDateTime::now_local().unwrap_or_else(|_| OffsetDateTime::now_utc());
    time::format_description::parse("[year]-[month]-[day] [hour]:[minute]:[second]")
        .ok()
        .and_then(|format| now.format(&format).ok())
        .unwrap_or_else(|| now.unix_timestamp().to_string())
}
