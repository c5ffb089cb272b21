use std::fmt;
use std::fs;
use std::path::{Path, PathBuf};

use serde::{Deserialize, Serialize};
use tracing::{info, warn};

use crate::error::{CalverError, CalverResult};
use crate::io::{
    LoadWarning, append_summary_block, is_tabular, load_table, write_distance_summary,
    write_run_log,
};

use super::{CalibrationVerifier, ParticipantSummary};

/// Why a file of the input directory produced no summary.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord, Serialize, Deserialize)]
pub enum SkipReason {
    NonTabular,
    MissingRequiredColumns,
    MalformedData,
    NoFixationsFound,
    NoQualifyingStimulusData,
    /// The file was moved to the problem-files directory.
    NoDistanceData,
    Unreadable,
    /// Verified, but its block could not be appended to the summary CSV.
    OutputFailed,
}

impl SkipReason {
    pub const ALL: [SkipReason; 8] = [
        SkipReason::NonTabular,
        SkipReason::MissingRequiredColumns,
        SkipReason::MalformedData,
        SkipReason::NoFixationsFound,
        SkipReason::NoQualifyingStimulusData,
        SkipReason::NoDistanceData,
        SkipReason::Unreadable,
        SkipReason::OutputFailed,
    ];

    /// Classifies a per-file failure. Configuration errors have no skip reason.
    ///
    /// `OutputFailed` is never returned here; the batch assigns it when appending
    /// a verified summary fails.
    #[must_use]
    pub fn for_error(error: &CalverError) -> Option<Self> {
        Some(match error {
            CalverError::MissingRequiredColumns { .. } => Self::MissingRequiredColumns,
            CalverError::MalformedField { .. } | CalverError::Csv(_) => Self::MalformedData,
            CalverError::NoFixationsFound => Self::NoFixationsFound,
            CalverError::NoQualifyingStimulusData => Self::NoQualifyingStimulusData,
            CalverError::NoDistanceData => Self::NoDistanceData,
            CalverError::UnsupportedFile { .. } => Self::NonTabular,
            CalverError::Io { .. } | CalverError::Json(_) => Self::Unreadable,
            CalverError::InvalidGeometry(_) | CalverError::InvalidConfig(_) => return None,
        })
    }
}

impl fmt::Display for SkipReason {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        let label = match self {
            Self::NonTabular => "not a .csv/.tsv file",
            Self::MissingRequiredColumns => "missing required columns",
            Self::MalformedData => "malformed data",
            Self::NoFixationsFound => "no fixations found",
            Self::NoQualifyingStimulusData => "fixations found, but not on stimuli",
            Self::NoDistanceData => "no distance data (moved to problem files)",
            Self::Unreadable => "unreadable",
            Self::OutputFailed => "summary could not be written",
        };
        f.write_str(label)
    }
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct SkippedFile {
    pub path: PathBuf,
    pub reason: SkipReason,
    pub detail: String,
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct ParticipantDistance {
    pub participant: String,
    pub distance_mm: f64,
}

/// Everything a batch run did, file by file.
#[derive(Debug, Clone, PartialEq, Default, Serialize, Deserialize)]
pub struct BatchReport {
    pub processed: Vec<PathBuf>,
    /// Processed files that had no validity columns.
    pub assumed_valid: Vec<PathBuf>,
    pub skipped: Vec<SkippedFile>,
    pub distances: Vec<ParticipantDistance>,
    pub summaries: Vec<ParticipantSummary>,
}

impl BatchReport {
    #[must_use]
    pub fn files_with_reason(&self, reason: SkipReason) -> Vec<&Path> {
        self.skipped
            .iter()
            .filter(|skipped| skipped.reason == reason)
            .map(|skipped| skipped.path.as_path())
            .collect()
    }

    /// Skipped tabular files, i.e. everything except non-tabular entries.
    pub fn skipped_tabular(&self) -> impl Iterator<Item = &SkippedFile> {
        self.skipped
            .iter()
            .filter(|skipped| skipped.reason != SkipReason::NonTabular)
    }

    #[must_use]
    pub fn quarantined(&self) -> Vec<&Path> {
        self.files_with_reason(SkipReason::NoDistanceData)
    }

    /// Count per skip reason, every reason listed, in declaration order.
    #[must_use]
    pub fn skip_counts(&self) -> Vec<(SkipReason, usize)> {
        SkipReason::ALL
            .iter()
            .map(|reason| {
                let count = self.skipped.iter().filter(|s| s.reason == *reason).count();
                (*reason, count)
            })
            .collect()
    }

    #[must_use]
    pub fn mean_distance_mm(&self) -> Option<f64> {
        if self.distances.is_empty() {
            return None;
        }
        let total: f64 = self.distances.iter().map(|d| d.distance_mm).sum();
        Some(total / self.distances.len() as f64)
    }
}

/// Output locations derived from the input directory, next to it.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct BatchOutputs {
    pub summary_csv: PathBuf,
    pub run_log: PathBuf,
    pub distances_csv: PathBuf,
    pub problem_dir: PathBuf,
}

impl BatchOutputs {
    #[must_use]
    pub fn beside(input_dir: &Path) -> Self {
        let base = input_dir
            .to_string_lossy()
            .trim_end_matches(['/', '\\'])
            .to_owned();
        Self {
            summary_csv: PathBuf::from(format!("{base}_output.csv")),
            run_log: PathBuf::from(format!("{base}_summary.txt")),
            distances_csv: PathBuf::from(format!("{base}_distances_summary.csv")),
            problem_dir: PathBuf::from(format!("{base}_problemfiles")),
        }
    }
}

/// Verifies every recording of a directory, one file at a time.
#[derive(Debug, Clone)]
pub struct BatchRunner {
    verifier: CalibrationVerifier,
}

impl BatchRunner {
    #[must_use]
    pub fn new(verifier: CalibrationVerifier) -> Self {
        Self { verifier }
    }

    #[must_use]
    pub fn verifier(&self) -> &CalibrationVerifier {
        &self.verifier
    }

    /// Processes `input_dir` and writes outputs beside it.
    pub fn run(&self, input_dir: &Path) -> CalverResult<BatchReport> {
        self.run_with_outputs(input_dir, &BatchOutputs::beside(input_dir))
    }

    pub fn run_with_outputs(
        &self,
        input_dir: &Path,
        outputs: &BatchOutputs,
    ) -> CalverResult<BatchReport> {
        let mut entries: Vec<PathBuf> = fs::read_dir(input_dir)
            .map_err(|err| CalverError::io(input_dir, err))?
            .map(|entry| entry.map(|entry| entry.path()))
            .collect::<Result<_, _>>()
            .map_err(|err| CalverError::io(input_dir, err))?;
        entries.sort();
        fs::create_dir_all(&outputs.problem_dir)
            .map_err(|err| CalverError::io(&outputs.problem_dir, err))?;
        info!(dir = %input_dir.display(), files = entries.len(), "starting batch");

        let mut report = BatchReport::default();
        for path in entries.into_iter().filter(|path| path.is_file()) {
            if !is_tabular(&path) {
                info!(file = %path.display(), "skipping non-tabular file");
                report.skipped.push(SkippedFile {
                    path,
                    reason: SkipReason::NonTabular,
                    detail: String::new(),
                });
                continue;
            }

            match self.process_file(&path) {
                Ok((summary, assumed_valid)) => {
                    if let Err(err) = append_summary_block(&outputs.summary_csv, &summary) {
                        warn!(
                            file = %path.display(),
                            output = %outputs.summary_csv.display(),
                            error = %err,
                            "could not append summary block"
                        );
                        report.skipped.push(SkippedFile {
                            path,
                            reason: SkipReason::OutputFailed,
                            detail: err.to_string(),
                        });
                        continue;
                    }
                    report.distances.push(ParticipantDistance {
                        participant: summary.participant.clone(),
                        distance_mm: summary.viewer_distance_mm,
                    });
                    if assumed_valid {
                        report.assumed_valid.push(path.clone());
                    }
                    report.processed.push(path);
                    report.summaries.push(summary);
                }
                Err(err) => {
                    let Some(reason) = SkipReason::for_error(&err) else {
                        return Err(err);
                    };
                    warn!(file = %path.display(), %reason, error = %err, "skipping file");
                    let path = if reason == SkipReason::NoDistanceData {
                        quarantine(&path, &outputs.problem_dir)
                    } else {
                        path
                    };
                    report.skipped.push(SkippedFile {
                        path,
                        reason,
                        detail: err.to_string(),
                    });
                }
            }
        }

        let finished_at = chrono::Local::now();
        append_text(&outputs.run_log, |out| write_run_log(out, &report, &finished_at))?;
        append_text(&outputs.distances_csv, |out| {
            write_distance_summary(out, &report.distances)
        })?;
        info!(
            processed = report.processed.len(),
            skipped = report.skipped.len(),
            "batch finished"
        );
        Ok(report)
    }

    /// Loads and verifies one file; the flag is `true` when validity was assumed.
    fn process_file(&self, path: &Path) -> CalverResult<(ParticipantSummary, bool)> {
        let loaded = load_table(path)?;
        let assumed_valid = loaded.warnings.contains(&LoadWarning::MissingValidityColumns);
        let mut table = loaded.table;
        if table.participant.is_none() {
            table.participant = path
                .file_stem()
                .map(|stem| stem.to_string_lossy().into_owned());
        }
        let summary = self.verifier.verify(table)?;
        Ok((summary, assumed_valid))
    }
}

/// Moves `path` into `problem_dir`, returning where the file now lives.
fn quarantine(path: &Path, problem_dir: &Path) -> PathBuf {
    let Some(name) = path.file_name() else {
        return path.to_path_buf();
    };
    let target = problem_dir.join(name);
    match fs::rename(path, &target) {
        Ok(()) => target,
        Err(err) => {
            warn!(file = %path.display(), error = %err, "could not move file to problem files");
            path.to_path_buf()
        }
    }
}

fn append_text(
    path: &Path,
    write: impl FnOnce(&mut fs::File) -> std::io::Result<()>,
) -> CalverResult<()> {
    let mut file = fs::OpenOptions::new()
        .create(true)
        .append(true)
        .open(path)
        .map_err(|err| CalverError::io(path, err))?;
    write(&mut file).map_err(|err| CalverError::io(path, err))
}
