//! Artifact generation entry points.
//!
//! # Responsibility
//! - `generate_all`: render both views to SVG, the interchange JSON and the
//!   Markdown instructions into one output directory.
//! - `append_and_regenerate`: validate + append one record, persist, archive
//!   the previous outputs, then regenerate.
//!
//! # Invariants
//! - Artifacts are written into a staging directory next to the output
//!   directory and swapped in only after every file is written; a failed run
//!   leaves the previous output directory as it was.
//! - Previous outputs are never deleted before the new ones are in place. If
//!   they cannot be moved back after a failed swap they stay on disk and the
//!   error names their location.
//! - The dataset file is only written after strict validation succeeds.
//!
//! # See also
//! - `layout` for the rules shared by all artifacts.

use crate::dataset::{Dataset, DatasetError};
use crate::export::build_interchange;
use crate::instructions::{generate_instructions, DEFAULT_CANVAS_CM};
use crate::layout::CanvasMapping;
use crate::model::record::RawRecord;
use crate::render::render_svg;
use crate::view::compose_pair;
use log::{error, info, warn};
use std::error::Error;
use std::fmt::{Display, Formatter};
use std::path::{Path, PathBuf};
use std::time::Instant;

pub const NORMAL_SVG: &str = "composition_normal.svg";
pub const REVEAL_SVG: &str = "composition_reveal.svg";
pub const INTERCHANGE_JSON: &str = "composition_data.json";
pub const INSTRUCTIONS_MD: &str = "instructions.md";

pub const DEFAULT_PIXEL_SIZE: f64 = 1200.0;

const STAGING_PREFIX: &str = ".nailview-staging-";
const ARCHIVE_VERSION_PREFIX: &str = "v";
const PREVIOUS_DIR: &str = "previous";

pub type PipelineResult<T> = Result<T, PipelineError>;

#[derive(Debug)]
pub enum PipelineError {
    Dataset(DatasetError),
    /// Fatal artifact I/O failure, tagged with the file or directory involved.
    Io { path: PathBuf, source: std::io::Error },
    /// The new outputs could not be moved into place and the previous ones
    /// could not be moved back; they are kept at `preserved`.
    SwapFailed {
        out_dir: PathBuf,
        preserved: PathBuf,
        source: std::io::Error,
    },
    Serialize(serde_json::Error),
}

impl Display for PipelineError {
    fn fmt(&self, f: &mut Formatter<'_>) -> std::fmt::Result {
        match self {
            Self::Dataset(err) => write!(f, "{err}"),
            Self::Io { path, source } => {
                write!(f, "failed to write artifact `{}`: {source}", path.display())
            }
            Self::SwapFailed {
                out_dir,
                preserved,
                source,
            } => write!(
                f,
                "failed to replace `{}`; previous outputs preserved at `{}`: {source}",
                out_dir.display(),
                preserved.display()
            ),
            Self::Serialize(err) => write!(f, "failed to serialize interchange document: {err}"),
        }
    }
}

impl Error for PipelineError {
    fn source(&self) -> Option<&(dyn Error + 'static)> {
        match self {
            Self::Dataset(err) => Some(err),
            Self::Io { source, .. } => Some(source),
            Self::SwapFailed { source, .. } => Some(source),
            Self::Serialize(err) => Some(err),
        }
    }
}

impl From<DatasetError> for PipelineError {
    fn from(value: DatasetError) -> Self {
        Self::Dataset(value)
    }
}

impl From<serde_json::Error> for PipelineError {
    fn from(value: serde_json::Error) -> Self {
        Self::Serialize(value)
    }
}

fn io_at(path: &Path) -> impl FnOnce(std::io::Error) -> PipelineError + '_ {
    move |source| PipelineError::Io {
        path: path.to_path_buf(),
        source,
    }
}

/// Runtime options for one generation run.
#[derive(Debug, Clone, PartialEq)]
pub struct GenerateOptions {
    pub out_dir: PathBuf,
    /// SVG canvas edge in pixels.
    pub pixel_size: f64,
    /// Physical canvas edge in centimetres for the instructions.
    pub canvas_cm: f64,
}

impl GenerateOptions {
    pub fn new(out_dir: impl Into<PathBuf>) -> Self {
        Self {
            out_dir: out_dir.into(),
            pixel_size: DEFAULT_PIXEL_SIZE,
            canvas_cm: DEFAULT_CANVAS_CM,
        }
    }
}

#[derive(Debug, Clone, PartialEq)]
pub struct GenerationReport {
    pub out_dir: PathBuf,
    pub artifacts: Vec<PathBuf>,
    /// Non-fatal record warnings hit while composing.
    pub warnings: usize,
}

/// Renders every artifact for `dataset` into `options.out_dir`.
///
/// # Errors
/// - `Io` when any artifact or directory operation fails; the output
///   directory is then left untouched.
pub fn generate_all(dataset: &Dataset, options: &GenerateOptions) -> PipelineResult<GenerationReport> {
    let started_at = Instant::now();
    info!(
        "event=generate module=pipeline status=start out_dir={} records={}",
        options.out_dir.display(),
        dataset.records().len()
    );

    let config = dataset.config();
    let views = compose_pair(dataset.records(), config);
    for warning in &views.normal.warnings {
        warn!("event=record_defaulted module=pipeline status=warn detail={warning}");
    }

    let pixels = CanvasMapping::square(options.pixel_size);
    let interchange = build_interchange(dataset.metadata(), &views);
    let artifacts = [
        (NORMAL_SVG, render_svg(&views.normal, pixels)),
        (REVEAL_SVG, render_svg(&views.reveal, pixels)),
        (INTERCHANGE_JSON, interchange.to_json_pretty()?),
        (
            INSTRUCTIONS_MD,
            generate_instructions(&views, config, options.canvas_cm),
        ),
    ];

    match write_artifacts(&options.out_dir, &artifacts) {
        Ok(paths) => {
            info!(
                "event=generate module=pipeline status=ok out_dir={} artifacts={} duration_ms={}",
                options.out_dir.display(),
                paths.len(),
                started_at.elapsed().as_millis()
            );
            Ok(GenerationReport {
                out_dir: options.out_dir.clone(),
                artifacts: paths,
                warnings: views.normal.warnings.len(),
            })
        }
        Err(err) => {
            error!(
                "event=generate module=pipeline status=error out_dir={} duration_ms={} error={}",
                options.out_dir.display(),
                started_at.elapsed().as_millis(),
                err
            );
            Err(err)
        }
    }
}

fn parent_dir(path: &Path) -> &Path {
    match path.parent() {
        Some(parent) if !parent.as_os_str().is_empty() => parent,
        _ => Path::new("."),
    }
}

fn write_artifacts(out_dir: &Path, artifacts: &[(&str, String)]) -> PipelineResult<Vec<PathBuf>> {
    let parent = parent_dir(out_dir);
    std::fs::create_dir_all(parent).map_err(io_at(parent))?;

    let staging = tempfile::Builder::new()
        .prefix(STAGING_PREFIX)
        .tempdir_in(parent)
        .map_err(io_at(parent))?;
    for (name, contents) in artifacts {
        let path = staging.path().join(name);
        std::fs::write(&path, contents).map_err(io_at(&out_dir.join(name)))?;
    }

    // Move the previous output aside first so the swap never mixes files
    // from two runs; it is deleted when `retired` drops.
    let retired = tempfile::Builder::new()
        .prefix(STAGING_PREFIX)
        .tempdir_in(parent)
        .map_err(io_at(parent))?;
    let previous = retired.path().join(PREVIOUS_DIR);
    let had_previous = out_dir.exists();
    if had_previous {
        std::fs::rename(out_dir, &previous).map_err(io_at(out_dir))?;
    }
    if let Err(source) = std::fs::rename(staging.path(), out_dir) {
        if had_previous {
            return Err(restore_previous(retired, out_dir, source));
        }
        return Err(PipelineError::Io {
            path: out_dir.to_path_buf(),
            source,
        });
    }

    Ok(artifacts
        .iter()
        .map(|(name, _)| out_dir.join(name))
        .collect())
}

/// Moves `<retired>/previous` back to `out_dir` after a failed swap.
///
/// When that fails too, `retired` is kept on disk instead of being dropped
/// and the returned error points at the preserved outputs.
fn restore_previous(
    retired: tempfile::TempDir,
    out_dir: &Path,
    source: std::io::Error,
) -> PipelineError {
    let previous = retired.path().join(PREVIOUS_DIR);
    match std::fs::rename(&previous, out_dir) {
        Ok(()) => PipelineError::Io {
            path: out_dir.to_path_buf(),
            source,
        },
        Err(restore_err) => {
            let preserved = retired.into_path().join(PREVIOUS_DIR);
            error!(
                "event=generate module=pipeline status=error out_dir={} preserved={} error={} restore_error={}",
                out_dir.display(),
                preserved.display(),
                source,
                restore_err
            );
            PipelineError::SwapFailed {
                out_dir: out_dir.to_path_buf(),
                preserved,
                source,
            }
        }
    }
}

/// Copies the current output directory to `<archive_dir>/vNNN`.
///
/// Returns `None` when there is nothing to archive.
pub fn archive_outputs(out_dir: &Path, archive_dir: &Path) -> PipelineResult<Option<PathBuf>> {
    if !out_dir.is_dir() {
        return Ok(None);
    }
    std::fs::create_dir_all(archive_dir).map_err(io_at(archive_dir))?;
    let target = archive_dir.join(format!(
        "{ARCHIVE_VERSION_PREFIX}{:03}",
        next_archive_version(archive_dir)?
    ));

    let staging = tempfile::Builder::new()
        .prefix(STAGING_PREFIX)
        .tempdir_in(archive_dir)
        .map_err(io_at(archive_dir))?;
    let entries = std::fs::read_dir(out_dir).map_err(io_at(out_dir))?;
    for entry in entries {
        let entry = entry.map_err(io_at(out_dir))?;
        let source = entry.path();
        if source.is_file() {
            std::fs::copy(&source, staging.path().join(entry.file_name()))
                .map_err(io_at(&source))?;
        }
    }
    std::fs::rename(staging.path(), &target).map_err(io_at(&target))?;

    info!(
        "event=archive module=pipeline status=ok from={} to={}",
        out_dir.display(),
        target.display()
    );
    Ok(Some(target))
}

/// Next free archive number: one past the highest existing `vNNN`.
pub fn next_archive_version(archive_dir: &Path) -> PipelineResult<u32> {
    if !archive_dir.exists() {
        return Ok(1);
    }
    let mut highest = 0;
    for entry in std::fs::read_dir(archive_dir).map_err(io_at(archive_dir))? {
        let entry = entry.map_err(io_at(archive_dir))?;
        let name = entry.file_name();
        let version = name
            .to_str()
            .and_then(|name| name.strip_prefix(ARCHIVE_VERSION_PREFIX))
            .and_then(|digits| digits.parse::<u32>().ok());
        if let Some(version) = version {
            highest = highest.max(version);
        }
    }
    Ok(highest + 1)
}

#[derive(Debug)]
pub struct AppendReport {
    /// The dataset as persisted after the append.
    pub dataset: Dataset,
    pub archived: Option<PathBuf>,
    pub generation: GenerationReport,
}

/// Validates and appends `raw`, persists the dataset, archives the previous
/// outputs and regenerates every artifact.
///
/// # Errors
/// - `Dataset` when loading fails or `raw` is rejected; nothing is written.
/// - `Io` when archiving or generation fails; the dataset is already saved
///   at that point and a rerun of `generate_all` recovers.
pub fn append_and_regenerate(
    dataset_path: &Path,
    raw: RawRecord,
    options: &GenerateOptions,
    archive_dir: &Path,
) -> PipelineResult<AppendReport> {
    let record_name = raw.display_name();
    let current = Dataset::load(dataset_path)?;
    let next = match current.with_appended(raw) {
        Ok(next) => next,
        Err(err) => {
            warn!(
                "event=append module=pipeline status=rejected name={} error={}",
                record_name, err
            );
            return Err(err.into());
        }
    };
    next.save(dataset_path)?;
    info!(
        "event=append module=pipeline status=ok name={} records={}",
        record_name,
        next.records().len()
    );

    let archived = archive_outputs(&options.out_dir, archive_dir)?;
    let generation = generate_all(&next, options)?;
    Ok(AppendReport {
        dataset: next,
        archived,
        generation,
    })
}
