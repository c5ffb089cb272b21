mod batch;
mod config;
mod report;
mod verifier;

pub use batch::{
    BatchOutputs, BatchReport, BatchRunner, ParticipantDistance, SkipReason, SkippedFile,
};
pub use config::VerifierConfig;
pub use report::{
    FixationRecord, ParticipantSummary, StimulusRow, SummaryAverages, ValidCount,
    assemble_summary,
};
pub use verifier::{Analysis, CalibrationVerifier};
