//! # Session Summary
//!
//! Turns a time-ordered stream of geotagged sensor records into one
//! summary row per contiguous run of records from the same source file:
//! duration, great-circle distance, and descriptive statistics for each
//! tracked channel (heart rate, elevation, cadence, power).
//!
//! ```rust
//! use session_summary::{summarize_reader, FileSummary, PipelineOptions};
//!
//! let csv = "\
//! 2024-05-01T08:00:00Z,running,a.fit,10,10,100,80,120,0
//! 2024-05-01T08:00:30Z,running,a.fit,10,10,101,82,130,0
//! ";
//! let (rows, stats) = summarize_reader(csv.as_bytes(), Vec::<FileSummary>::new(), &PipelineOptions::default()).unwrap();
//! assert_eq!(stats.groups_emitted, 1);
//! assert_eq!(rows[0].duration_seconds, 30.0);
//! ```

pub mod error;
pub mod geodistance;
pub mod metric_stats;
pub mod pipeline;
pub mod record;
pub mod schema;
pub mod session_grouper;
pub mod summary_emitter;

pub use error::{Error, Result};
pub use geodistance::{fix_distance, haversine_distance};
pub use metric_stats::MetricSummary;
pub use pipeline::{summarize_file, summarize_reader, PipelineOptions, RunStats};
pub use record::Record;
pub use schema::{Channel, ChannelColumns, OutputSchema, SchemaPreset, Stat};
pub use session_grouper::{SessionAggregate, SessionGrouper};
pub use summary_emitter::{CsvSummaryWriter, FileSummary, SummarySink};
