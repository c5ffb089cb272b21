use std::fs::File;
use std::io::{Read, Write};
use std::path::Path;

use csv::{ReaderBuilder, StringRecord, WriterBuilder};
use serde::{Deserialize, Serialize};
use tracing::{debug, warn};

use crate::error::{CalverError, CalverResult};

use super::writer::{AVERAGES_LABEL, SUMMARY_HEADER, UNAVAILABLE, VALID_COUNT_LABEL};

pub const LONG_FORMAT_HEADER: [&str; 10] = [
    "Participant",
    "Stimulus",
    "MinDist",
    "CoordX",
    "CoordY",
    "Dur",
    "PrecSDx",
    "PrecSDy",
    "PrecRMSx",
    "PrecRMSy",
];

/// One stimulus of one participant, as a flat record.
#[derive(Debug, Clone, PartialEq, Default, Serialize, Deserialize)]
pub struct LongRow {
    pub participant: String,
    pub stimulus: String,
    pub min_dist: Option<f64>,
    pub coord_x: Option<f64>,
    pub coord_y: Option<f64>,
    pub duration: Option<f64>,
    pub prec_sd_x: Option<f64>,
    pub prec_sd_y: Option<f64>,
    pub prec_rms_x: Option<f64>,
    pub prec_rms_y: Option<f64>,
}

impl LongRow {
    fn values(&self) -> [Option<f64>; 8] {
        [
            self.min_dist,
            self.coord_x,
            self.coord_y,
            self.duration,
            self.prec_sd_x,
            self.prec_sd_y,
            self.prec_rms_x,
            self.prec_rms_y,
        ]
    }
}

fn numeric_cell(
    record: &StringRecord,
    index: usize,
    line: usize,
) -> CalverResult<Option<f64>> {
    let Some(value) = record.get(index).map(str::trim) else {
        return Ok(None);
    };
    if value.is_empty() || value == UNAVAILABLE {
        return Ok(None);
    }
    value
        .parse::<f64>()
        .map(Some)
        .map_err(|_| CalverError::MalformedField {
            line,
            column: SUMMARY_HEADER[index],
            value: value.to_owned(),
        })
}

fn is_non_data_row(first: &str) -> bool {
    first == SUMMARY_HEADER[0] || first == AVERAGES_LABEL || first == VALID_COUNT_LABEL
}

/// Reads concatenated wide summary blocks into long-format rows.
pub fn reformat_summary<R: Read>(reader: R) -> CalverResult<Vec<LongRow>> {
    let mut reader = ReaderBuilder::new()
        .has_headers(false)
        .flexible(true)
        .from_reader(reader);

    let mut participant: Option<String> = None;
    let mut rows = Vec::new();
    for record in reader.records() {
        let record = record?;
        let line = record.position().map_or(0, |position| position.line() as usize);
        let Some(first) = record.get(0).map(str::trim) else {
            continue;
        };
        if record.len() == 1 {
            if !first.is_empty() {
                participant = Some(first.to_owned());
            }
            continue;
        }
        if is_non_data_row(first) {
            continue;
        }
        let Some(current) = participant.as_deref() else {
            warn!(line, stimulus = first, "stimulus row before any participant; skipped");
            continue;
        };

        rows.push(LongRow {
            participant: current.to_owned(),
            stimulus: first.to_owned(),
            min_dist: numeric_cell(&record, 1, line)?,
            coord_x: numeric_cell(&record, 2, line)?,
            coord_y: numeric_cell(&record, 3, line)?,
            duration: numeric_cell(&record, 4, line)?,
            prec_sd_x: numeric_cell(&record, 5, line)?,
            prec_sd_y: numeric_cell(&record, 6, line)?,
            prec_rms_x: numeric_cell(&record, 7, line)?,
            prec_rms_y: numeric_cell(&record, 8, line)?,
        });
    }
    debug!(rows = rows.len(), "reformatted summary");
    Ok(rows)
}

pub fn write_long_format<W: Write>(out: W, rows: &[LongRow]) -> CalverResult<()> {
    let mut writer = WriterBuilder::new().from_writer(out);
    writer.write_record(LONG_FORMAT_HEADER)?;
    for row in rows {
        let mut cells = vec![row.participant.clone(), row.stimulus.clone()];
        cells.extend(
            row.values()
                .iter()
                .map(|value| value.map(|v| v.to_string()).unwrap_or_default()),
        );
        writer.write_record(&cells)?;
    }
    writer
        .flush()
        .map_err(|err| CalverError::io("<long format>", err))
}

/// Reformats the summary at `input` into a long-format CSV at `output`.
pub fn reformat_file(input: &Path, output: &Path) -> CalverResult<usize> {
    let file = File::open(input).map_err(|err| CalverError::io(input, err))?;
    let rows = reformat_summary(file)?;
    let out = File::create(output).map_err(|err| CalverError::io(output, err))?;
    write_long_format(out, &rows)?;
    Ok(rows.len())
}

#[cfg(test)]
mod tests {
    use super::reformat_summary;

    #[test]
    fn unavailable_cells_become_empty() {
        let raw = "p1\nStimulus,a,b,c,d,e,f,g,h\nA,N/A,N/A,N/A,N/A,N/A,N/A,N/A,N/A\n";
        let rows = reformat_summary(raw.as_bytes()).expect("parse");
        assert_eq!(rows.len(), 1);
        assert_eq!(rows[0].participant, "p1");
        assert!(rows[0].min_dist.is_none());
        assert!(rows[0].prec_rms_y.is_none());
    }

    #[test]
    fn malformed_number_names_the_column() {
        let raw = "p1\nA,x,1,1,1,1,1,1,1\n";
        let err = reformat_summary(raw.as_bytes()).expect_err("malformed");
        assert!(format!("{err}").contains("Min Euclidean dist."));
    }
}
