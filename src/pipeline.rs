//! Drives a CSV record source through the grouper into a sink.

use std::fs::{self, File};
use std::io::{BufReader, BufWriter, Read, Write};
use std::path::{Path, PathBuf};

use csv::{ByteRecord, ReaderBuilder};
use log::{info, warn};

use crate::error::Result;
use crate::record::Record;
use crate::schema::OutputSchema;
use crate::session_grouper::SessionGrouper;
use crate::summary_emitter::{CsvSummaryWriter, SummarySink};

#[derive(Debug, Clone)]
pub struct PipelineOptions {
    pub schema: OutputSchema,
    /// Skip the first input row
    pub input_has_headers: bool,
    pub write_header: bool,
}

impl Default for PipelineOptions {
    fn default() -> Self {
        Self {
            schema: OutputSchema::full(),
            input_has_headers: false,
            write_header: false,
        }
    }
}

#[derive(Debug, Clone, Copy, Default, PartialEq, Eq)]
pub struct RunStats {
    pub records_read: usize,
    pub groups_emitted: usize,
    pub bad_timestamps: usize,
}

/// Stream every row of `source` through a grouper writing into `sink`.
/// The first error aborts the run.
pub fn summarize_reader<R: Read, S: SummarySink>(
    source: R,
    sink: S,
    options: &PipelineOptions,
) -> Result<(S, RunStats)> {
    options.schema.validate()?;

    let mut rdr = ReaderBuilder::new()
        .has_headers(options.input_has_headers)
        .flexible(true)
        .from_reader(source);

    let mut grouper = SessionGrouper::new(options.schema.clone(), sink);
    let mut stats = RunStats::default();
    let mut row = ByteRecord::new();

    while rdr.read_byte_record(&mut row)? {
        let record = Record::from_csv(&row);
        if !record.timestamp_valid {
            stats.bad_timestamps += 1;
        }
        grouper.push(&record)?;
        stats.records_read += 1;
    }

    grouper.flush()?;
    stats.groups_emitted = grouper.groups_emitted();
    let sink = grouper.into_sink();

    if stats.bad_timestamps > 0 {
        warn!(
            "{} records had unparseable timestamps; durations of their groups use the epoch",
            stats.bad_timestamps
        );
    }
    info!(
        "Summarized {} records into {} groups",
        stats.records_read, stats.groups_emitted
    );

    Ok((sink, stats))
}

/// Read `input`, write one CSV summary row per group to `output`.
///
/// Rows go to a sibling `.partial` file that replaces `output` only when the
/// whole run succeeds; on failure `output` is left as it was.
pub fn summarize_file(input: &Path, output: &Path, options: &PipelineOptions) -> Result<RunStats> {
    options.schema.validate()?;
    let source = BufReader::new(File::open(input)?);

    let staging = staging_path(output);
    match write_summaries(source, &staging, options) {
        Ok(stats) => {
            fs::rename(&staging, output)?;
            Ok(stats)
        }
        Err(e) => {
            if let Err(cleanup) = fs::remove_file(&staging) {
                warn!("Could not remove {}: {}", staging.display(), cleanup);
            }
            Err(e)
        }
    }
}

fn write_summaries<R: Read>(source: R, target: &Path, options: &PipelineOptions) -> Result<RunStats> {
    let target = BufWriter::new(File::create(target)?);
    let sink = CsvSummaryWriter::new(target, options.schema.clone(), options.write_header)?;
    let (sink, stats) = summarize_reader(source, sink, options)?;
    sink.finish()?.flush()?;
    Ok(stats)
}

fn staging_path(output: &Path) -> PathBuf {
    let mut name = output.file_name().map(|n| n.to_os_string()).unwrap_or_default();
    name.push(".partial");
    output.with_file_name(name)
}
