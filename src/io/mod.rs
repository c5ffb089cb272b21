mod loader;
mod reformat;
mod writer;

pub use loader::{
    LoadWarning, LoadedTable, NO_DATA_SENTINEL, column, delimiter_for, is_tabular, load_table,
    read_table,
};
pub use reformat::{LONG_FORMAT_HEADER, LongRow, reformat_file, reformat_summary, write_long_format};
pub use writer::{
    AVERAGES_LABEL, SUMMARY_HEADER, UNAVAILABLE, VALID_COUNT_LABEL, append_summary_block,
    summary_rows, write_distance_summary, write_run_log, write_summary_block,
};
