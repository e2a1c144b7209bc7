//! Output rows and the sinks that receive them.

use std::io::Write;

use csv::Writer;

use crate::error::Result;
use crate::metric_stats::MetricSummary;
use crate::schema::{Channel, OutputSchema};

/// Summary of one contiguous group of records
#[derive(Debug, Clone, PartialEq)]
pub struct FileSummary {
    pub start_time: String,
    pub end_time: String,
    pub sport: String,
    pub filename: String,
    pub duration_seconds: f64,
    pub distance_meters: f64,
    /// In schema channel order
    pub metrics: Vec<(Channel, MetricSummary)>,
}

impl FileSummary {
    pub fn metric(&self, channel: Channel) -> Option<&MetricSummary> {
        self.metrics
            .iter()
            .find(|(c, _)| *c == channel)
            .map(|(_, m)| m)
    }

    /// Row fields in schema order. Floats use the shortest text that reads
    /// back to the same value.
    pub fn to_row(&self, schema: &OutputSchema) -> Vec<String> {
        let mut row = vec![
            self.start_time.clone(),
            self.end_time.clone(),
            self.sport.clone(),
            self.filename.clone(),
            format_float(self.duration_seconds),
            format_float(self.distance_meters),
        ];

        for col in &schema.columns {
            // Channels the grouper did not track are written as empty cells
            match self.metric(col.channel) {
                Some(summary) => row.extend(col.stats.iter().map(|s| format_float(s.pick(summary)))),
                None => row.extend(col.stats.iter().map(|_| String::new())),
            }
        }
        row
    }
}

pub fn format_float(value: f64) -> String {
    format!("{}", value)
}

/// Receives finalized summaries in emission order
pub trait SummarySink {
    fn emit(&mut self, summary: FileSummary) -> Result<()>;
}

impl SummarySink for Vec<FileSummary> {
    fn emit(&mut self, summary: FileSummary) -> Result<()> {
        self.push(summary);
        Ok(())
    }
}

/// Writes each summary as one CSV row
pub struct CsvSummaryWriter<W: Write> {
    wtr: Writer<W>,
    schema: OutputSchema,
    rows: usize,
}

impl<W: Write> CsvSummaryWriter<W> {
    pub fn new(inner: W, schema: OutputSchema, write_header: bool) -> Result<Self> {
        let mut wtr = Writer::from_writer(inner);
        if write_header {
            wtr.write_record(schema.header())?;
        }
        Ok(Self { wtr, schema, rows: 0 })
    }

    pub fn rows_written(&self) -> usize {
        self.rows
    }

    pub fn finish(mut self) -> Result<W> {
        self.wtr.flush()?;
        self.wtr
            .into_inner()
            .map_err(|e| crate::error::Error::Io(e.into_error()))
    }
}

impl<W: Write> SummarySink for CsvSummaryWriter<W> {
    fn emit(&mut self, summary: FileSummary) -> Result<()> {
        self.wtr.write_record(summary.to_row(&self.schema))?;
        self.rows += 1;
        Ok(())
    }
}
