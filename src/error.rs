use std::path::PathBuf;

use thiserror::Error;

pub type CalverResult<T> = Result<T, CalverError>;

#[derive(Debug, Error)]
pub enum CalverError {
    #[error("missing required columns: {}", missing.join(", "))]
    MissingRequiredColumns { missing: Vec<&'static str> },

    #[error("no fixation index boundaries found")]
    NoFixationsFound,

    #[error("no usable viewer distance samples")]
    NoDistanceData,

    #[error("fixations found, but none qualify on a configured stimulus")]
    NoQualifyingStimulusData,

    #[error("malformed `{column}` value `{value}` at line {line}")]
    MalformedField {
        line: usize,
        column: &'static str,
        value: String,
    },

    #[error("unsupported file type: {}", path.display())]
    UnsupportedFile { path: PathBuf },

    #[error("invalid screen geometry: {0}")]
    InvalidGeometry(String),

    #[error("invalid configuration: {0}")]
    InvalidConfig(String),

    #[error("i/o error on `{}`: {source}", path.display())]
    Io {
        path: PathBuf,
        #[source]
        source: std::io::Error,
    },

    #[error("csv error: {0}")]
    Csv(#[from] csv::Error),

    #[error("json error: {0}")]
    Json(#[from] serde_json::Error),
}

impl CalverError {
    pub(crate) fn io(path: impl Into<PathBuf>, source: std::io::Error) -> Self {
        Self::Io {
            path: path.into(),
            source,
        }
    }

    /// Returns `true` for errors that invalidate the whole run rather than one file.
    #[must_use]
    pub fn is_configuration_error(&self) -> bool {
        matches!(self, Self::InvalidGeometry(_) | Self::InvalidConfig(_))
    }
}
