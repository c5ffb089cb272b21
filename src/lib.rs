//! calver-rs: eye-tracker calibration verification.
//!
//! Each exported recording is segmented into fixation episodes per stimulus,
//! and the longest fixation landing within the accuracy threshold (in degrees
//! of visual angle) is reported per stimulus together with its precision.

pub mod api;
pub mod core;
pub mod error;
pub mod io;
pub mod telemetry;

pub use api::{BatchRunner, CalibrationVerifier, ParticipantSummary, VerifierConfig};
pub use error::{CalverError, CalverResult};
