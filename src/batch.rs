//! Batch composition from a JSON job list.
//!
//! ## Job file
//!
//! ```json
//! [
//!   {"name": "drake", "image_url": "https://i.imgflip.com/30b1gx.jpg",
//!    "top_text": "writing tests", "bottom_text": "writing more tests"},
//!   {"image_path": "cat.png", "text": "i can has cheezburger", "width": 640}
//! ]
//! ```
//!
//! Each job names exactly one source (`image_url` or `image_path`; relative
//! paths resolve against the job file's directory) and the same caption
//! fields as a single request.
//!
//! ## Output
//!
//! ```text
//! out/
//! ├── drake-3f9a0c1d22be.jpg     # <name>-<sha256 prefix of the JPEG>
//! └── 002-b71e04c9aa10.jpg       # unnamed jobs use their 1-based position
//! ```
//!
//! Jobs run in parallel on the rayon pool. A failing job is reported and
//! logged; it never stops the others.

use crate::compose::{CaptionRequest, CaptionSource, ComposeError, Composer, CompositionRequest};
use crate::config::OutputConfig;
use crate::imaging::CaptionBackend;
use rayon::prelude::*;
use serde::{Deserialize, Serialize};
use sha2::{Digest, Sha256};
use std::path::{Path, PathBuf};
use thiserror::Error;

/// Hex characters of the content hash kept in output file names.
const HASH_PREFIX_LEN: usize = 12;

#[derive(Error, Debug)]
pub enum BatchError {
    #[error("IO error: {0}")]
    Io(#[from] std::io::Error),
    #[error("invalid job file: {0}")]
    Json(#[from] serde_json::Error),
}

/// Why a single job failed.
#[derive(Error, Debug)]
pub enum JobError {
    #[error("job must name exactly one of image_url or image_path")]
    Source,
    #[error("reading {path}: {source}")]
    Read {
        path: PathBuf,
        #[source]
        source: std::io::Error,
    },
    #[error(transparent)]
    Compose(#[from] ComposeError),
    #[error("writing {path}: {source}")]
    Write {
        path: PathBuf,
        #[source]
        source: std::io::Error,
    },
}

/// One entry of the job file.
///
/// Caption fields are spelled out rather than flattened from
/// [`CaptionRequest`] because serde cannot combine `flatten` with
/// `deny_unknown_fields`.
#[derive(Debug, Clone, Default, PartialEq, Eq, Deserialize)]
#[serde(default, deny_unknown_fields)]
pub struct BatchJob {
    pub name: Option<String>,
    pub image_url: Option<String>,
    pub image_path: Option<PathBuf>,
    pub top_text: Option<String>,
    pub bottom_text: Option<String>,
    pub text: Option<String>,
    pub width: Option<u32>,
    pub quality: Option<u32>,
}

impl BatchJob {
    fn caption_request(&self) -> CaptionRequest {
        CaptionRequest {
            top_text: self.top_text.clone(),
            bottom_text: self.bottom_text.clone(),
            text: self.text.clone(),
            width: self.width,
            quality: self.quality,
        }
    }

    fn source(&self, base_dir: &Path) -> Result<CaptionSource, JobError> {
        match (&self.image_url, &self.image_path) {
            (Some(url), None) => Ok(CaptionSource::Url(url.clone())),
            (None, Some(path)) => {
                let path = base_dir.join(path);
                CaptionSource::from_path(&path).map_err(|source| JobError::Read { path, source })
            }
            _ => Err(JobError::Source),
        }
    }
}

/// A job that produced a file.
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct JobOutput {
    pub path: PathBuf,
    pub width: u32,
    pub height: u32,
    pub bytes: usize,
}

/// Outcome of one job, in job file order.
#[derive(Debug)]
pub struct JobOutcome {
    /// 1-based position in the job file.
    pub position: usize,
    pub label: String,
    pub result: Result<JobOutput, JobError>,
}

#[derive(Debug, Default)]
pub struct BatchReport {
    pub outcomes: Vec<JobOutcome>,
}

impl BatchReport {
    pub fn succeeded(&self) -> usize {
        self.outcomes.iter().filter(|o| o.result.is_ok()).count()
    }

    pub fn failed(&self) -> usize {
        self.outcomes.len() - self.succeeded()
    }
}

/// Parse a job file.
pub fn load_jobs(path: &Path) -> Result<Vec<BatchJob>, BatchError> {
    let content = std::fs::read_to_string(path)?;
    Ok(serde_json::from_str(&content)?)
}

/// File name stem for a job: its slugified name, or its zero-padded position.
pub fn job_label(job: &BatchJob, position: usize) -> String {
    job.name
        .as_deref()
        .map(slugify)
        .filter(|s| !s.is_empty())
        .unwrap_or_else(|| format!("{:0>3}", position))
}

/// Lowercase ASCII alphanumerics, everything else collapsed to single dashes.
fn slugify(name: &str) -> String {
    let mut slug = String::with_capacity(name.len());
    for c in name.chars() {
        if c.is_ascii_alphanumeric() {
            slug.push(c.to_ascii_lowercase());
        } else if !slug.is_empty() && !slug.ends_with('-') {
            slug.push('-');
        }
    }
    slug.trim_end_matches('-').to_string()
}

/// `<label>-<sha256 prefix>.jpg` for the encoded output.
pub fn output_file_name(label: &str, jpeg: &[u8]) -> String {
    let digest = format!("{:x}", Sha256::digest(jpeg));
    format!("{label}-{}.jpg", &digest[..HASH_PREFIX_LEN])
}

/// Run every job and write the results into `out_dir`.
///
/// Only failing to create `out_dir` aborts the batch; job failures are
/// collected into the report.
pub fn run_batch<B: CaptionBackend>(
    composer: &Composer<B>,
    jobs: &[BatchJob],
    base_dir: &Path,
    out_dir: &Path,
    defaults: &OutputConfig,
) -> Result<BatchReport, BatchError> {
    std::fs::create_dir_all(out_dir)?;

    let outcomes = jobs
        .par_iter()
        .enumerate()
        .map(|(i, job)| {
            let position = i + 1;
            let label = job_label(job, position);
            let result = run_job(composer, job, &label, base_dir, out_dir, defaults);
            if let Err(e) = &result {
                tracing::warn!(job = %label, error = %e, "batch job failed");
            }
            JobOutcome {
                position,
                label,
                result,
            }
        })
        .collect();

    Ok(BatchReport { outcomes })
}

fn run_job<B: CaptionBackend>(
    composer: &Composer<B>,
    job: &BatchJob,
    label: &str,
    base_dir: &Path,
    out_dir: &Path,
    defaults: &OutputConfig,
) -> Result<JobOutput, JobError> {
    let request = CompositionRequest::resolve(job.caption_request(), defaults)?;
    let source = job.source(base_dir)?;
    let result = composer.compose(source, &request)?;

    let path = out_dir.join(output_file_name(label, &result.bytes));
    std::fs::write(&path, &result.bytes).map_err(|source| JobError::Write {
        path: path.clone(),
        source,
    })?;

    Ok(JobOutput {
        path,
        width: result.width,
        height: result.height,
        bytes: result.bytes.len(),
    })
}
