use std::fs::File;
use std::path::Path;
use std::str::FromStr;

use csv::{ReaderBuilder, StringRecord};
use serde::{Deserialize, Serialize};
use tracing::{debug, warn};

use crate::core::{EyeValidity, GazeSample, SampleTable};
use crate::error::{CalverError, CalverResult};

/// Cell value the tracker exports when it has no data for a field.
pub const NO_DATA_SENTINEL: &str = "-9999";

pub mod column {
    pub const MEDIA_NAME: &str = "MediaName";
    pub const RECORDING_TIMESTAMP: &str = "RecordingTimestamp";
    pub const FIXATION_INDEX: &str = "FixationIndex";
    pub const GAZE_EVENT_DURATION: &str = "GazeEventDuration";
    pub const GAZE_POINT_X: &str = "GazePointX (ADCSpx)";
    pub const GAZE_POINT_Y: &str = "GazePointY (ADCSpx)";
    pub const DISTANCE_LEFT: &str = "DistanceLeft";
    pub const DISTANCE_RIGHT: &str = "DistanceRight";
    pub const VALIDITY_LEFT: &str = "ValidityLeft";
    pub const VALIDITY_RIGHT: &str = "ValidityRight";
    pub const PARTICIPANT_NAME: &str = "ParticipantName";
}

/// Non-fatal findings while loading a recording.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub enum LoadWarning {
    /// No `ValidityLeft`/`ValidityRight` columns: every sample is treated as valid.
    MissingValidityColumns,
}

#[derive(Debug, Clone, PartialEq)]
pub struct LoadedTable {
    pub table: SampleTable,
    pub warnings: Vec<LoadWarning>,
}

#[derive(Debug, Clone, Copy)]
struct ColumnMap {
    media_name: usize,
    timestamp: usize,
    fixation_index: usize,
    event_duration: usize,
    gaze_x: usize,
    gaze_y: usize,
    distance_left: usize,
    distance_right: usize,
    validity: Option<(usize, usize)>,
    participant: Option<usize>,
}

impl ColumnMap {
    fn resolve(headers: &StringRecord) -> CalverResult<Self> {
        let find = |name: &str| headers.iter().position(|header| header == name);
        let mut missing = Vec::new();
        let mut require = |name: &'static str| {
            let index = find(name);
            if index.is_none() {
                missing.push(name);
            }
            index.unwrap_or_default()
        };

        let media_name = require(column::MEDIA_NAME);
        let timestamp = require(column::RECORDING_TIMESTAMP);
        let fixation_index = require(column::FIXATION_INDEX);
        let event_duration = require(column::GAZE_EVENT_DURATION);
        let gaze_x = require(column::GAZE_POINT_X);
        let gaze_y = require(column::GAZE_POINT_Y);
        let distance_left = require(column::DISTANCE_LEFT);
        let distance_right = require(column::DISTANCE_RIGHT);

        if !missing.is_empty() {
            return Err(CalverError::MissingRequiredColumns { missing });
        }

        let validity = match (find(column::VALIDITY_LEFT), find(column::VALIDITY_RIGHT)) {
            (Some(left), Some(right)) => Some((left, right)),
            _ => None,
        };

        Ok(Self {
            media_name,
            timestamp,
            fixation_index,
            event_duration,
            gaze_x,
            gaze_y,
            distance_left,
            distance_right,
            validity,
            participant: find(column::PARTICIPANT_NAME),
        })
    }
}

/// Returns the cell with "no data" representations mapped to `None`.
fn cell(record: &StringRecord, index: usize) -> Option<&str> {
    let value = record.get(index)?.trim();
    (!value.is_empty() && value != NO_DATA_SENTINEL).then_some(value)
}

fn parse_cell<T: FromStr>(
    record: &StringRecord,
    index: usize,
    line: usize,
    column: &'static str,
) -> CalverResult<Option<T>> {
    cell(record, index)
        .map(|value| {
            value.parse::<T>().map_err(|_| CalverError::MalformedField {
                line,
                column,
                value: value.to_owned(),
            })
        })
        .transpose()
}

/// Like [`parse_cell`], but an unparsable value becomes `None`.
///
/// Used for columns that are carried along but never feed a computation.
fn parse_lenient<T: FromStr>(
    record: &StringRecord,
    index: usize,
    line: usize,
    column: &'static str,
) -> Option<T> {
    let value = cell(record, index)?;
    let parsed = value.parse().ok();
    if parsed.is_none() {
        debug!(line, column, value, "ignoring unparsable informational cell");
    }
    parsed
}

fn parse_sample(record: &StringRecord, columns: &ColumnMap, line: usize) -> CalverResult<GazeSample> {
    let validity = match columns.validity {
        Some((left, right)) => Some(EyeValidity::new(
            parse_cell(record, left, line, column::VALIDITY_LEFT)?,
            parse_cell(record, right, line, column::VALIDITY_RIGHT)?,
        )),
        None => None,
    };

    Ok(GazeSample {
        timestamp: parse_cell(record, columns.timestamp, line, column::RECORDING_TIMESTAMP)?,
        stimulus: cell(record, columns.media_name).map(str::to_owned),
        fixation_index: cell(record, columns.fixation_index).map(str::to_owned),
        event_duration_ms: parse_lenient(
            record,
            columns.event_duration,
            line,
            column::GAZE_EVENT_DURATION,
        ),
        gaze_x: parse_cell(record, columns.gaze_x, line, column::GAZE_POINT_X)?,
        gaze_y: parse_cell(record, columns.gaze_y, line, column::GAZE_POINT_Y)?,
        validity,
        distance_left_mm: parse_cell(record, columns.distance_left, line, column::DISTANCE_LEFT)?,
        distance_right_mm: parse_cell(
            record,
            columns.distance_right,
            line,
            column::DISTANCE_RIGHT,
        )?,
    })
}

/// Field delimiter implied by the file extension: `csv` or `tsv`.
#[must_use]
pub fn delimiter_for(path: &Path) -> Option<u8> {
    match path.extension()?.to_str()? {
        "csv" => Some(b','),
        "tsv" => Some(b'\t'),
        _ => None,
    }
}

#[must_use]
pub fn is_tabular(path: &Path) -> bool {
    delimiter_for(path).is_some()
}

/// Parses one exported recording from any reader.
pub fn read_table<R: std::io::Read>(reader: R, delimiter: u8) -> CalverResult<LoadedTable> {
    let mut reader = ReaderBuilder::new()
        .delimiter(delimiter)
        .has_headers(true)
        .flexible(true)
        .from_reader(reader);
    let headers = reader.headers()?.clone();
    let columns = ColumnMap::resolve(&headers)?;

    let mut warnings = Vec::new();
    if columns.validity.is_none() {
        warn!("no validity columns; assuming every sample is valid");
        warnings.push(LoadWarning::MissingValidityColumns);
    }

    let mut participant = None;
    let mut samples = Vec::new();
    for (row, record) in reader.records().enumerate() {
        let record = record?;
        // +2: one-based lines, header first.
        let line = row + 2;
        if row == 0 {
            participant = columns
                .participant
                .and_then(|index| cell(&record, index))
                .map(str::to_owned);
        }
        samples.push(parse_sample(&record, &columns, line)?);
    }

    debug!(
        samples = samples.len(),
        has_validity = columns.validity.is_some(),
        participant = participant.as_deref().unwrap_or(""),
        "loaded recording"
    );

    Ok(LoadedTable {
        table: SampleTable {
            participant,
            has_validity: columns.validity.is_some(),
            samples,
        },
        warnings,
    })
}

/// Loads a `.csv` or `.tsv` recording from disk.
pub fn load_table(path: &Path) -> CalverResult<LoadedTable> {
    let delimiter = delimiter_for(path).ok_or_else(|| CalverError::UnsupportedFile {
        path: path.to_path_buf(),
    })?;
    let file = File::open(path).map_err(|err| CalverError::io(path, err))?;
    read_table(file, delimiter)
}
