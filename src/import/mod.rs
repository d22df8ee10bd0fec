//! Import coordinator: detect format, parse, normalize, validate, preview,
//! commit.
//!
//! The commit loop is sequential on purpose: it keeps result ordering
//! deterministic and matches how the store assigns ids. The batch is not
//! atomic; a failed record is recorded and the loop carries on.

pub mod archive;
pub mod csv;
pub mod format;
pub mod json;
pub mod normalize;
pub mod sheet;

pub use format::FileFormat;
pub use normalize::{normalize_row, RawCandidate, RawRow};

use tracing::{info, warn};

use crate::catalog::{iso_now, WorkDraft, WorkStore};
use crate::error::{ImportError, StoreError};

/// How many candidates a preview shows.
pub const PREVIEW_LIMIT: usize = 10;

/// Result of the detect/parse/normalize/validate stages.
#[derive(Debug)]
pub struct ParseOutcome {
    /// Detected source format.
    pub format: FileFormat,
    /// Validated candidates, in source order.
    pub candidates: Vec<WorkDraft>,
    /// Rows dropped by validation. Only the count is observable.
    pub skipped: usize,
}

/// One failed record from a commit run.
#[derive(Debug)]
pub struct CommitError {
    /// Position of the candidate in the committed batch.
    pub index: usize,
    /// Title of the failed candidate, for display.
    pub title: String,
    /// The store failure.
    pub error: StoreError,
}

/// Outcome of a (possibly partial) commit.
#[derive(Debug, Default)]
pub struct CommitReport {
    /// Records actually persisted.
    pub committed: usize,
    /// Per-record failures; empty means a clean run.
    pub errors: Vec<CommitError>,
}

/// Detect the file format, parse, normalize and validate.
///
/// Tabular sources (CSV, spreadsheet) run through the row normalizer;
/// JSON and archive sources skip alias mapping and go straight to
/// validation. Fails fast with [`ImportError`] before any preview exists.
pub fn detect_and_parse(bytes: &[u8], declared_name: &str) -> Result<ParseOutcome, ImportError> {
    let file_format = FileFormat::detect(declared_name)?;

    let raw: Vec<RawCandidate> = match file_format {
        FileFormat::Archive => json::parse_records(&archive::read_data_entry(bytes)?)?,
        FileFormat::Json => json::parse_records(&String::from_utf8_lossy(bytes))?,
        FileFormat::Spreadsheet => sheet::parse_rows(bytes)?.iter().map(normalize_row).collect(),
        FileFormat::Csv => csv::parse_rows(bytes).iter().map(normalize_row).collect(),
    };

    let total = raw.len();
    let candidates: Vec<WorkDraft> = raw
        .into_iter()
        .filter_map(RawCandidate::into_draft)
        .collect();
    let skipped = total - candidates.len();

    info!(
        format = %file_format,
        candidates = candidates.len(),
        skipped,
        "import file parsed"
    );

    Ok(ParseOutcome {
        format: file_format,
        candidates,
        skipped,
    })
}

/// Commit candidates sequentially into the store.
///
/// Candidates carry no id by construction; the store assigns fresh ones in
/// batch order. `created_at` is filled with the current time only when the
/// source did not provide one. A store failure on one record is recorded
/// and does not stop or roll back the rest.
pub fn commit_import(store: &mut dyn WorkStore, candidates: Vec<WorkDraft>) -> CommitReport {
    commit_import_with_progress(store, candidates, |_, _| {})
}

/// [`commit_import`] with a `(done, total)` callback after each record.
pub fn commit_import_with_progress(
    store: &mut dyn WorkStore,
    candidates: Vec<WorkDraft>,
    mut on_progress: impl FnMut(usize, usize),
) -> CommitReport {
    let total = candidates.len();
    let mut report = CommitReport::default();

    for (index, mut draft) in candidates.into_iter().enumerate() {
        if draft.created_at.is_none() {
            draft.created_at = Some(iso_now());
        }

        match store.add(&draft) {
            Ok(_) => report.committed += 1,
            Err(error) => {
                warn!(index, title = %draft.title, %error, "record failed to commit");
                report.errors.push(CommitError {
                    index,
                    title: draft.title,
                    error,
                });
            }
        }
        on_progress(index + 1, total);
    }

    info!(
        committed = report.committed,
        failed = report.errors.len(),
        "import commit finished"
    );
    report
}

/// Stages of one import attempt.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum ImportStage {
    Idle,
    FileSelected,
    Parsed,
    Previewed,
    Committing,
    Done,
}

/// One import attempt from file selection to commit.
///
/// Drives the stage machine `Idle → FileSelected → Parsed → Previewed →
/// Committing → Done`; a parse failure drops back to `Idle` and is
/// surfaced to the caller. The commit itself never exits `Committing`
/// early, however many records fail.
#[derive(Debug, Default)]
pub struct ImportSession {
    stage: ImportStage,
    candidates: Vec<WorkDraft>,
    skipped: usize,
}

impl Default for ImportStage {
    fn default() -> Self {
        Self::Idle
    }
}

impl ImportSession {
    pub fn new() -> Self {
        Self::default()
    }

    /// Current stage of the attempt.
    pub fn stage(&self) -> ImportStage {
        self.stage
    }

    /// Parse a selected file, returning the candidate count.
    pub fn load(&mut self, bytes: &[u8], declared_name: &str) -> Result<usize, ImportError> {
        self.stage = ImportStage::FileSelected;
        self.candidates.clear();
        self.skipped = 0;

        match detect_and_parse(bytes, declared_name) {
            Ok(outcome) => {
                self.candidates = outcome.candidates;
                self.skipped = outcome.skipped;
                self.stage = ImportStage::Parsed;
                Ok(self.candidates.len())
            }
            Err(error) => {
                self.stage = ImportStage::Idle;
                Err(error)
            }
        }
    }

    /// All validated candidates, in source order.
    pub fn candidates(&self) -> &[WorkDraft] {
        &self.candidates
    }

    /// Rows dropped by validation during [`load`](Self::load).
    pub fn skipped(&self) -> usize {
        self.skipped
    }

    /// The bounded preview shown before the caller confirms the commit.
    pub fn preview(&mut self) -> &[WorkDraft] {
        if self.stage == ImportStage::Parsed {
            self.stage = ImportStage::Previewed;
        }
        &self.candidates[..self.candidates.len().min(PREVIEW_LIMIT)]
    }

    /// Commit every candidate after explicit caller confirmation.
    pub fn commit(&mut self, store: &mut dyn WorkStore) -> CommitReport {
        self.commit_with_progress(store, |_, _| {})
    }

    /// [`commit`](Self::commit) with a `(done, total)` progress callback.
    pub fn commit_with_progress(
        &mut self,
        store: &mut dyn WorkStore,
        on_progress: impl FnMut(usize, usize),
    ) -> CommitReport {
        self.stage = ImportStage::Committing;
        let candidates = std::mem::take(&mut self.candidates);
        let report = commit_import_with_progress(store, candidates, on_progress);
        self.stage = ImportStage::Done;
        report
    }
}
