//! Streaming session grouping
//!
//! Records arrive in file order. A group is a maximal run of consecutive
//! records with the same file identifier; only the current group is held,
//! and it is finalized either when the identifier changes or when the
//! stream ends.

use chrono::{DateTime, Utc};
use geo::Point;
use log::debug;

use crate::error::{Error, Result};
use crate::geodistance::fix_distance;
use crate::metric_stats::MetricSummary;
use crate::record::Record;
use crate::schema::{Channel, OutputSchema};
use crate::summary_emitter::{FileSummary, SummarySink};

/// Working state of the currently open group
#[derive(Debug, Clone)]
pub struct SessionAggregate {
    pub filename: String,
    pub sport: String,
    pub start_timestamp: String,
    pub start_time: DateTime<Utc>,
    pub end_timestamp: String,
    pub end_time: DateTime<Utc>,
    pub distance_meters: f64,
    pub anchor: Option<Point<f64>>,
    pub samples: Vec<(Channel, Vec<f64>)>,
    pub records: usize,
}

impl SessionAggregate {
    /// Open a group from its first record; that record's samples are
    /// buffered too.
    pub fn open(record: &Record, channels: impl Iterator<Item = Channel>) -> Self {
        SessionAggregate {
            filename: record.filename.clone(),
            sport: record.sport.clone(),
            start_timestamp: record.timestamp.clone(),
            start_time: record.time,
            end_timestamp: record.timestamp.clone(),
            end_time: record.time,
            distance_meters: 0.0,
            anchor: record.fix(),
            samples: channels.map(|c| (c, vec![c.sample(record)])).collect(),
            records: 1,
        }
    }

    pub fn update(&mut self, record: &Record) {
        let fix = record.fix();

        self.end_timestamp = record.timestamp.clone();
        self.end_time = record.time;
        self.distance_meters += fix_distance(self.anchor, fix);
        self.anchor = fix;
        for (channel, buffer) in &mut self.samples {
            buffer.push(channel.sample(record));
        }
        self.records += 1;
    }

    /// Elapsed seconds between the first and the last record
    pub fn duration_seconds(&self) -> f64 {
        let elapsed = self.end_time.signed_duration_since(self.start_time);
        match elapsed.num_nanoseconds() {
            Some(ns) => ns as f64 / 1e9,
            None => elapsed.num_milliseconds() as f64 / 1e3,
        }
    }

    /// Reduce the buffers into a summary row
    pub fn finalize(self) -> Result<FileSummary> {
        let duration_seconds = self.duration_seconds();
        let mut metrics = Vec::with_capacity(self.samples.len());
        for (channel, buffer) in &self.samples {
            let summary = MetricSummary::compute(buffer).map_err(|_| Error::EmptyChannel {
                filename: self.filename.clone(),
                channel: *channel,
            })?;
            metrics.push((*channel, summary));
        }

        Ok(FileSummary {
            start_time: self.start_timestamp,
            end_time: self.end_timestamp,
            sport: self.sport,
            filename: self.filename,
            duration_seconds,
            distance_meters: self.distance_meters,
            metrics,
        })
    }
}

#[derive(Debug)]
enum GrouperState {
    Idle,
    GroupOpen(SessionAggregate),
}

/// Adjacency-based grouper feeding finalized summaries into a sink
pub struct SessionGrouper<S: SummarySink> {
    schema: OutputSchema,
    state: GrouperState,
    sink: S,
    groups_emitted: usize,
}

impl<S: SummarySink> SessionGrouper<S> {
    pub fn new(schema: OutputSchema, sink: S) -> Self {
        SessionGrouper {
            schema,
            state: GrouperState::Idle,
            sink,
            groups_emitted: 0,
        }
    }

    pub fn is_idle(&self) -> bool {
        matches!(self.state, GrouperState::Idle)
    }

    pub fn groups_emitted(&self) -> usize {
        self.groups_emitted
    }

    /// Identifier of the open group, if any
    pub fn current_filename(&self) -> Option<&str> {
        match &self.state {
            GrouperState::GroupOpen(agg) => Some(agg.filename.as_str()),
            GrouperState::Idle => None,
        }
    }

    pub fn push(&mut self, record: &Record) -> Result<()> {
        if let GrouperState::GroupOpen(agg) = &mut self.state {
            if agg.filename == record.filename {
                agg.update(record);
                return Ok(());
            }
        }

        self.close_group()?;
        self.state = GrouperState::GroupOpen(SessionAggregate::open(record, self.schema.channels()));
        Ok(())
    }

    /// End of input: finalize the open group, if any, and return to idle
    pub fn flush(&mut self) -> Result<()> {
        self.close_group()
    }

    pub fn into_sink(self) -> S {
        self.sink
    }

    pub fn finish(mut self) -> Result<S> {
        self.flush()?;
        Ok(self.into_sink())
    }

    fn close_group(&mut self) -> Result<()> {
        if let GrouperState::GroupOpen(agg) = std::mem::replace(&mut self.state, GrouperState::Idle) {
            debug!(
                "Closing group '{}': {} records, {:.1}m",
                agg.filename, agg.records, agg.distance_meters
            );
            let summary = agg.finalize()?;
            self.sink.emit(summary)?;
            self.groups_emitted += 1;
        }
        Ok(())
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::geodistance::haversine_distance;
    use crate::record::parse_timestamp;
    use crate::schema::Stat;
    use approx::assert_relative_eq;

    fn rec(ts: &str, filename: &str, lat: f64, lon: f64, hr: f64) -> Record {
        let time = parse_timestamp(ts);
        Record {
            timestamp: ts.to_string(),
            time: time.unwrap_or_default(),
            timestamp_valid: time.is_some(),
            sport: "running".to_string(),
            filename: filename.to_string(),
            latitude: lat,
            longitude: lon,
            elevation: 100.0,
            cadence: 80.0,
            heartrate: hr,
            power: 0.0,
        }
    }

    fn run(records: &[Record]) -> Vec<FileSummary> {
        let mut grouper = SessionGrouper::new(OutputSchema::full(), Vec::<FileSummary>::new());
        for r in records {
            grouper.push(r).unwrap();
        }
        grouper.finish().unwrap()
    }

    #[test]
    fn test_state_transitions() {
        let mut grouper = SessionGrouper::new(OutputSchema::full(), Vec::<FileSummary>::new());
        assert!(grouper.is_idle());

        grouper.push(&rec("2024-05-01T08:00:00Z", "a.csv", 10.0, 10.0, 120.0)).unwrap();
        assert_eq!(grouper.current_filename(), Some("a.csv"));
        assert_eq!(grouper.groups_emitted(), 0);

        grouper.push(&rec("2024-05-01T08:00:05Z", "b.csv", 10.0, 10.0, 120.0)).unwrap();
        assert_eq!(grouper.current_filename(), Some("b.csv"));
        assert_eq!(grouper.groups_emitted(), 1);

        grouper.flush().unwrap();
        assert!(grouper.is_idle());
        assert_eq!(grouper.groups_emitted(), 2);

        // flushing an idle grouper emits nothing more
        grouper.flush().unwrap();
        assert_eq!(grouper.into_sink().len(), 2);
    }

    #[test]
    fn test_duration_ignores_sample_count() {
        let out = run(&[
            rec("2024-05-01T08:00:00Z", "a.csv", 10.0, 10.0, 120.0),
            rec("2024-05-01T08:00:01Z", "a.csv", 10.0, 10.0, 121.0),
            rec("2024-05-01T08:00:02Z", "a.csv", 10.0, 10.0, 122.0),
            rec("2024-05-01T08:10:00.5Z", "a.csv", 10.0, 10.0, 123.0),
        ]);
        assert_eq!(out.len(), 1);
        assert_eq!(out[0].duration_seconds, 600.5);
        assert_eq!(out[0].end_time, "2024-05-01T08:10:00.5Z");
    }

    #[test]
    fn test_distance_is_ordered_sum_of_increments() {
        let pts = [(10.0, 10.0), (10.001, 10.0), (10.001, 10.002), (10.003, 10.004)];
        let records: Vec<Record> = pts
            .iter()
            .enumerate()
            .map(|(i, (lat, lon))| rec(&format!("2024-05-01T08:00:0{}Z", i), "a.csv", *lat, *lon, 130.0))
            .collect();

        let mut expected = 0.0;
        for w in pts.windows(2) {
            expected += haversine_distance(w[0].0, w[0].1, w[1].0, w[1].1);
        }

        let out = run(&records);
        assert_eq!(out[0].distance_meters, expected);
    }

    #[test]
    fn test_missing_fix_contributes_zero() {
        let out = run(&[
            rec("2024-05-01T08:00:00Z", "a.csv", 0.0, 0.0, 120.0),
            rec("2024-05-01T08:00:01Z", "a.csv", 10.0, 10.0, 120.0),
            rec("2024-05-01T08:00:02Z", "a.csv", 10.0, 10.001, 120.0),
        ]);
        assert_relative_eq!(out[0].distance_meters, haversine_distance(10.0, 10.0, 10.0, 10.001));
    }

    #[test]
    fn test_non_adjacent_repeat_is_separate_group() {
        let out = run(&[
            rec("2024-05-01T08:00:00Z", "a.csv", 10.0, 10.0, 100.0),
            rec("2024-05-01T09:00:00Z", "b.csv", 10.0, 10.0, 110.0),
            rec("2024-05-01T10:00:00Z", "a.csv", 10.0, 10.0, 120.0),
        ]);
        let names: Vec<&str> = out.iter().map(|s| s.filename.as_str()).collect();
        assert_eq!(names, vec!["a.csv", "b.csv", "a.csv"]);
        assert_eq!(out[2].metric(Channel::Heartrate).unwrap().mean, 120.0);
    }

    #[test]
    fn test_identifier_compared_raw() {
        let out = run(&[
            rec("2024-05-01T08:00:00Z", "A.csv", 10.0, 10.0, 100.0),
            rec("2024-05-01T08:00:01Z", "a.csv", 10.0, 10.0, 100.0),
            rec("2024-05-01T08:00:02Z", "a.csv ", 10.0, 10.0, 100.0),
        ]);
        assert_eq!(out.len(), 3);
    }

    #[test]
    fn test_single_record_group() {
        let out = run(&[rec("2024-05-01T08:00:00Z", "solo.csv", 10.0, 10.0, 99.0)]);
        assert_eq!(out.len(), 1);
        assert_eq!(out[0].duration_seconds, 0.0);
        assert_eq!(out[0].start_time, out[0].end_time);
        let hr = out[0].metric(Channel::Heartrate).unwrap();
        assert_eq!(hr.median, 99.0);
        assert_eq!(hr.std, 0.0);
    }

    #[test]
    fn test_empty_stream_emits_nothing() {
        assert!(run(&[]).is_empty());
    }

    #[test]
    fn test_finalize_empty_buffer_is_hard_error() {
        let mut agg = SessionAggregate::open(
            &rec("2024-05-01T08:00:00Z", "a.csv", 10.0, 10.0, 99.0),
            [Channel::Power].into_iter(),
        );
        agg.samples[0].1.clear();
        match agg.finalize() {
            Err(Error::EmptyChannel { filename, channel }) => {
                assert_eq!(filename, "a.csv");
                assert_eq!(channel, Channel::Power);
            }
            other => panic!("expected EmptyChannel, got {:?}", other),
        }
    }

    #[test]
    fn test_only_schema_channels_buffered() {
        let schema = OutputSchema::uniform(&[Channel::Heartrate], &[Stat::Max]);
        let mut grouper = SessionGrouper::new(schema, Vec::<FileSummary>::new());
        grouper.push(&rec("2024-05-01T08:00:00Z", "a.csv", 10.0, 10.0, 150.0)).unwrap();
        let out = grouper.finish().unwrap();
        assert_eq!(out[0].metrics.len(), 1);
        assert!(out[0].metric(Channel::Power).is_none());
    }
}
