//! Dataset loading, validation and append.
//!
//! # Responsibility
//! - Read and write the dataset document.
//! - Turn persisted records into typed records exactly once per load.
//! - Produce a new dataset value on append instead of mutating in place.
//!
//! # Invariants
//! - Loading is lenient per record but strict about configuration and about
//!   the reveal pivot being unambiguous (at most one intersection record).
//! - Appending validates the new record strictly before anything is written.
//! - Saves are atomic: the previous file stays intact if a write fails.

mod document;

pub use document::{DatasetDocument, Metadata};

use crate::config::{CompositionConfig, ConfigError};
use crate::model::record::{DomainRecord, NailRole, RawRecord, RecordValidationError, RecordWarning};
use log::{error, info, warn};
use std::collections::BTreeSet;
use std::error::Error;
use std::fmt::{Display, Formatter};
use std::io::Write;
use std::path::{Path, PathBuf};

pub type DatasetResult<T> = Result<T, DatasetError>;

#[derive(Debug)]
pub enum DatasetError {
    Io { path: PathBuf, source: std::io::Error },
    Parse { path: PathBuf, source: serde_json::Error },
    Config(ConfigError),
    /// The reveal structure is undefined for this record set.
    Structure(String),
    Validation(RecordValidationError),
    DuplicateName(String),
}

impl Display for DatasetError {
    fn fmt(&self, f: &mut Formatter<'_>) -> std::fmt::Result {
        match self {
            Self::Io { path, source } => write!(f, "dataset I/O failed at `{}`: {source}", path.display()),
            Self::Parse { path, source } => {
                write!(f, "dataset `{}` is not valid JSON: {source}", path.display())
            }
            Self::Config(err) => write!(f, "invalid composition config: {err}"),
            Self::Structure(message) => write!(f, "invalid dataset structure: {message}"),
            Self::Validation(err) => write!(f, "record rejected: {err}"),
            Self::DuplicateName(name) => write!(f, "record rejected: name `{name}` already exists"),
        }
    }
}

impl Error for DatasetError {
    fn source(&self) -> Option<&(dyn Error + 'static)> {
        match self {
            Self::Io { source, .. } => Some(source),
            Self::Parse { source, .. } => Some(source),
            Self::Config(err) => Some(err),
            Self::Validation(err) => Some(err),
            Self::Structure(_) | Self::DuplicateName(_) => None,
        }
    }
}

impl From<ConfigError> for DatasetError {
    fn from(value: ConfigError) -> Self {
        Self::Config(value)
    }
}

impl From<RecordValidationError> for DatasetError {
    fn from(value: RecordValidationError) -> Self {
        Self::Validation(value)
    }
}

/// Role counts used to judge whether the cross can be drawn.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq)]
pub struct RoleCounts {
    pub vertical: usize,
    pub horizontal: usize,
    pub intersection: usize,
    pub peripheral: usize,
}

impl RoleCounts {
    pub fn of(records: &[DomainRecord]) -> Self {
        records.iter().fold(Self::default(), |mut counts, record| {
            match record.nail_role {
                NailRole::Vertical => counts.vertical += 1,
                NailRole::Horizontal => counts.horizontal += 1,
                NailRole::Intersection => counts.intersection += 1,
                NailRole::Peripheral => counts.peripheral += 1,
            }
            counts
        })
    }

    /// Parts of the overlay that will be omitted, as readable notes.
    pub fn degenerate_parts(&self) -> Vec<String> {
        let mut notes = Vec::new();
        if self.vertical < 2 {
            notes.push(format!("{} vertical record(s), vertical line omitted", self.vertical));
        }
        if self.horizontal < 2 {
            notes.push(format!(
                "{} horizontal record(s), horizontal line omitted",
                self.horizontal
            ));
        }
        if self.intersection == 0 {
            notes.push("no intersection record, marker omitted".to_string());
        }
        notes
    }
}

/// Names used by more than one record, each reported once in first-seen
/// order. `name` joins the two views, so repeats make that join ambiguous.
pub fn duplicate_names(records: &[DomainRecord]) -> Vec<&str> {
    let mut seen = BTreeSet::new();
    let mut reported = BTreeSet::new();
    records
        .iter()
        .map(|record| record.name.as_str())
        .filter(|name| !seen.insert(*name) && reported.insert(*name))
        .collect()
}

/// Loaded, validated dataset. Never mutated after construction.
#[derive(Debug, Clone)]
pub struct Dataset {
    document: DatasetDocument,
    records: Vec<DomainRecord>,
    config: CompositionConfig,
    warnings: Vec<RecordWarning>,
}

impl Dataset {
    /// Validates a parsed document and derives typed records.
    ///
    /// # Errors
    /// - `Config` when composition rules or geometry are invalid.
    /// - `Structure` when more than one record has the intersection role.
    pub fn from_document(document: DatasetDocument) -> DatasetResult<Self> {
        let config =
            CompositionConfig::from_sections(&document.composition_rules, &document.geometry)?;

        let mut records = Vec::with_capacity(document.domains.len());
        let mut warnings = Vec::new();
        for raw in &document.domains {
            let (record, record_warnings) = raw.to_record_lenient();
            records.push(record);
            warnings.extend(record_warnings);
        }

        let counts = RoleCounts::of(&records);
        if counts.intersection > 1 {
            return Err(DatasetError::Structure(format!(
                "{} records have nail_role `intersection`; at most one is allowed",
                counts.intersection
            )));
        }

        Ok(Self {
            document,
            records,
            config,
            warnings,
        })
    }

    pub fn from_json_str(json: &str, origin: &Path) -> DatasetResult<Self> {
        let document: DatasetDocument =
            serde_json::from_str(json).map_err(|source| DatasetError::Parse {
                path: origin.to_path_buf(),
                source,
            })?;
        Self::from_document(document)
    }

    /// Reads and validates a dataset file, logging non-fatal findings.
    pub fn load(path: impl AsRef<Path>) -> DatasetResult<Self> {
        let path = path.as_ref();
        let text = std::fs::read_to_string(path).map_err(|source| {
            error!(
                "event=dataset_load module=dataset status=error path={} error={}",
                path.display(),
                source
            );
            DatasetError::Io {
                path: path.to_path_buf(),
                source,
            }
        })?;
        let dataset = Self::from_json_str(&text, path)?;

        for warning in &dataset.warnings {
            warn!("event=record_defaulted module=dataset status=warn detail={warning}");
        }
        for note in RoleCounts::of(&dataset.records).degenerate_parts() {
            warn!("event=structure_incomplete module=dataset status=warn detail={note}");
        }
        for name in duplicate_names(&dataset.records) {
            warn!(
                "event=structure_incomplete module=dataset status=warn detail=duplicate record name `{name}`"
            );
        }
        info!(
            "event=dataset_load module=dataset status=ok path={} records={} warnings={}",
            path.display(),
            dataset.records.len(),
            dataset.warnings.len()
        );
        Ok(dataset)
    }

    pub fn document(&self) -> &DatasetDocument {
        &self.document
    }

    pub fn records(&self) -> &[DomainRecord] {
        &self.records
    }

    pub fn config(&self) -> &CompositionConfig {
        &self.config
    }

    pub fn metadata(&self) -> &Metadata {
        &self.document.metadata
    }

    /// Warnings collected while converting records at load time.
    pub fn warnings(&self) -> &[RecordWarning] {
        &self.warnings
    }

    /// Returns a new dataset with `raw` appended, stamped with today's date.
    pub fn with_appended(&self, raw: RawRecord) -> DatasetResult<Self> {
        let today = chrono::Local::now().date_naive().format("%Y-%m-%d").to_string();
        self.with_appended_on(raw, today)
    }

    /// Returns a new dataset with `raw` appended; `self` is left untouched.
    ///
    /// # Errors
    /// - `Validation` when `raw` fails strict validation.
    /// - `DuplicateName` when a record with the same name exists.
    /// - `Structure` when the append would create a second intersection.
    pub fn with_appended_on(&self, raw: RawRecord, date: String) -> DatasetResult<Self> {
        let record = raw.to_record_strict()?;
        let existing: BTreeSet<&str> = self.records.iter().map(|r| r.name.as_str()).collect();
        if existing.contains(record.name.as_str()) {
            return Err(DatasetError::DuplicateName(record.name));
        }

        let mut document = self.document.clone();
        document.domains.push(raw);
        document.metadata.total_domains = document.domains.len();
        if document.metadata.generated.is_none() {
            document.metadata.generated = Some(date.clone());
        }
        document.metadata.last_updated = Some(date);
        Self::from_document(document)
    }

    /// Writes the document atomically (temp file in the same directory, then
    /// rename).
    pub fn save(&self, path: impl AsRef<Path>) -> DatasetResult<()> {
        let path = path.as_ref();
        let io_error = |source: std::io::Error| DatasetError::Io {
            path: path.to_path_buf(),
            source,
        };

        let json = serde_json::to_string_pretty(&self.document).map_err(|source| {
            DatasetError::Parse {
                path: path.to_path_buf(),
                source,
            }
        })?;
        let parent = match path.parent() {
            Some(parent) if !parent.as_os_str().is_empty() => parent,
            _ => Path::new("."),
        };

        let mut staged = tempfile::NamedTempFile::new_in(parent).map_err(io_error)?;
        staged.write_all(json.as_bytes()).map_err(io_error)?;
        staged.write_all(b"\n").map_err(io_error)?;
        staged.as_file().sync_all().map_err(io_error)?;
        staged.persist(path).map_err(|err| io_error(err.error))?;

        info!(
            "event=dataset_save module=dataset status=ok path={} records={}",
            path.display(),
            self.records.len()
        );
        Ok(())
    }
}
