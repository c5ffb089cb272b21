use std::fs::OpenOptions;
use std::io::Write;
use std::path::{Path, PathBuf};

use chrono::{DateTime, TimeZone};
use csv::WriterBuilder;

use crate::api::{BatchReport, ParticipantDistance, ParticipantSummary, SkipReason};
use crate::error::{CalverError, CalverResult};

/// Column titles of the wide summary block.
pub const SUMMARY_HEADER: [&str; 9] = [
    "Stimulus",
    "Min Euclidean dist. (degrees)",
    "Coordinates X",
    "Coordinates Y",
    "Duration (ms)",
    "Precision SD X",
    "Precision SD Y",
    "Precision RMS X",
    "Precision RMS Y",
];

pub const AVERAGES_LABEL: &str = "Averages:";
pub const VALID_COUNT_LABEL: &str = "Number valid:";
pub const UNAVAILABLE: &str = "N/A";

fn fixed2(value: f64) -> String {
    format!("{value:.2}")
}

/// Rows of one participant block: name, header, one row per stimulus, averages, count.
#[must_use]
pub fn summary_rows(summary: &ParticipantSummary) -> Vec<Vec<String>> {
    let mut rows = Vec::with_capacity(summary.rows.len() + 4);
    rows.push(vec![summary.participant.clone()]);
    rows.push(SUMMARY_HEADER.iter().map(|title| (*title).to_owned()).collect());

    for row in &summary.rows {
        let mut cells = vec![row.stimulus.clone()];
        match &row.record {
            Some(record) => cells.extend([
                fixed2(record.deviation_deg),
                fixed2(record.mean_x),
                fixed2(record.mean_y),
                fixed2(record.duration_ms as f64),
                fixed2(record.std_dev_deg.x),
                fixed2(record.std_dev_deg.y),
                fixed2(record.rms_deg.x),
                fixed2(record.rms_deg.y),
            ]),
            None => cells.extend(std::iter::repeat_n(UNAVAILABLE.to_owned(), 8)),
        }
        rows.push(cells);
    }

    let averages = &summary.averages;
    rows.push(vec![
        AVERAGES_LABEL.to_owned(),
        fixed2(averages.deviation_deg),
        fixed2(averages.mean_x),
        fixed2(averages.mean_y),
        fixed2(averages.duration_ms),
        fixed2(averages.std_dev_deg.x),
        fixed2(averages.std_dev_deg.y),
        fixed2(averages.rms_deg.x),
        fixed2(averages.rms_deg.y),
    ]);
    rows.push(vec![
        VALID_COUNT_LABEL.to_owned(),
        format!("{} points", summary.valid),
    ]);
    rows
}

pub fn write_summary_block<W: Write>(out: W, summary: &ParticipantSummary) -> CalverResult<()> {
    let mut writer = WriterBuilder::new().flexible(true).from_writer(out);
    for row in summary_rows(summary) {
        writer.write_record(&row)?;
    }
    writer.flush().map_err(|err| CalverError::io("<summary>", err))?;
    Ok(())
}

/// Appends one participant block to the summary CSV, creating it when missing.
///
/// The block is rendered in memory first and written with a single call, so a
/// failed render leaves the file untouched.
pub fn append_summary_block(path: &Path, summary: &ParticipantSummary) -> CalverResult<()> {
    let mut block = Vec::new();
    write_summary_block(&mut block, summary)?;
    let mut file = OpenOptions::new()
        .create(true)
        .append(true)
        .open(path)
        .map_err(|err| CalverError::io(path, err))?;
    file.write_all(&block).map_err(|err| CalverError::io(path, err))
}

pub fn write_distance_summary<W: Write>(
    mut out: W,
    distances: &[ParticipantDistance],
) -> std::io::Result<()> {
    writeln!(out, "Participant Name, Ave. Distance")?;
    for entry in distances {
        writeln!(out, "{}, {}", entry.participant, entry.distance_mm)?;
    }
    if !distances.is_empty() {
        let mean = distances.iter().map(|d| d.distance_mm).sum::<f64>() / distances.len() as f64;
        write!(out, "Ave. dist. to screen, {mean}")?;
    }
    writeln!(out)
}

fn write_name_list<W: Write>(out: &mut W, title: &str, names: &[&Path]) -> std::io::Result<()> {
    write!(out, "\n\n{title}: {}", names.len())?;
    if !names.is_empty() {
        write!(out, "\nFile names:")?;
    }
    for name in names {
        write!(out, "\n{}", name.display())?;
    }
    Ok(())
}

/// Plain-text run summary: processed, skipped and quarantined files.
pub fn write_run_log<W: Write, Tz: TimeZone>(
    mut out: W,
    report: &BatchReport,
    finished_at: &DateTime<Tz>,
) -> std::io::Result<()>
where
    Tz::Offset: std::fmt::Display,
{
    write!(
        out,
        "------ Run finished at {} with results: ------",
        finished_at.format("%Y-%m-%d %H:%M:%S%.6f")
    )?;

    write_name_list(
        &mut out,
        "Non-tabular files skipped",
        &report.files_with_reason(SkipReason::NonTabular),
    )?;
    write_name_list(
        &mut out,
        "Tabular files processed",
        &report.processed.iter().map(PathBuf::as_path).collect::<Vec<_>>(),
    )?;
    write_name_list(
        &mut out,
        "Files processed assuming valid eyes (no validity columns)",
        &report.assumed_valid.iter().map(PathBuf::as_path).collect::<Vec<_>>(),
    )?;

    let skipped = report.skipped_tabular().count();
    write!(
        out,
        "\n\nTabular files skipped (e.g., no fixation indices on stimuli, or no fixations at all): {skipped}"
    )?;
    for (reason, count) in report.skip_counts() {
        if reason == SkipReason::NonTabular {
            continue;
        }
        write!(out, "\n  {reason}: {count}")?;
    }
    for skipped in report.skipped_tabular() {
        write!(
            out,
            "\n{} [{}] {}",
            skipped.path.display(),
            skipped.reason,
            skipped.detail
        )?;
    }

    write!(out, "\n\n")
}
