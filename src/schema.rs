//! Output schema: which channels are summarized and which statistics are
//! written for each of them.

use std::fmt;
use std::fs::File;
use std::io::{BufReader, Read};
use std::path::Path;

use clap::ValueEnum;
use serde::Deserialize;

use crate::error::{Error, Result};
use crate::metric_stats::MetricSummary;
use crate::record::Record;

/// A numeric measurement tracked per group
#[derive(Debug, Clone, Copy, PartialEq, Eq, Deserialize, ValueEnum)]
#[serde(rename_all = "lowercase")]
pub enum Channel {
    Heartrate,
    Elevation,
    Cadence,
    Power,
}

impl Channel {
    pub const ALL: [Channel; 4] = [
        Channel::Heartrate,
        Channel::Elevation,
        Channel::Cadence,
        Channel::Power,
    ];

    pub fn name(&self) -> &'static str {
        match self {
            Channel::Heartrate => "heartrate",
            Channel::Elevation => "elevation",
            Channel::Cadence => "cadence",
            Channel::Power => "power",
        }
    }

    /// The sample this channel reads from a record
    pub fn sample(&self, record: &Record) -> f64 {
        match self {
            Channel::Heartrate => record.heartrate,
            Channel::Elevation => record.elevation,
            Channel::Cadence => record.cadence,
            Channel::Power => record.power,
        }
    }
}

impl fmt::Display for Channel {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.name())
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Deserialize, ValueEnum)]
#[serde(rename_all = "lowercase")]
pub enum Stat {
    Mean,
    Median,
    Min,
    Max,
    Std,
}

impl Stat {
    pub const ALL: [Stat; 5] = [Stat::Mean, Stat::Median, Stat::Min, Stat::Max, Stat::Std];

    pub fn name(&self) -> &'static str {
        match self {
            Stat::Mean => "mean",
            Stat::Median => "median",
            Stat::Min => "min",
            Stat::Max => "max",
            Stat::Std => "std",
        }
    }

    pub fn pick(&self, summary: &MetricSummary) -> f64 {
        match self {
            Stat::Mean => summary.mean,
            Stat::Median => summary.median,
            Stat::Min => summary.min,
            Stat::Max => summary.max,
            Stat::Std => summary.std,
        }
    }
}

/// Named schema layouts
#[derive(Debug, Clone, Copy, PartialEq, Eq, ValueEnum)]
pub enum SchemaPreset {
    /// Every channel with all five statistics
    Full,
    /// Column layout of the first-generation summarizer: no means, and
    /// only min/max for elevation
    Legacy,
}

#[derive(Debug, Clone, PartialEq, Deserialize)]
pub struct ChannelColumns {
    pub channel: Channel,
    pub stats: Vec<Stat>,
}

#[derive(Debug, Clone, PartialEq, Deserialize)]
pub struct OutputSchema {
    pub columns: Vec<ChannelColumns>,
}

impl OutputSchema {
    pub fn full() -> Self {
        Self::uniform(&Channel::ALL, &Stat::ALL)
    }

    pub fn legacy() -> Self {
        let four = vec![Stat::Median, Stat::Min, Stat::Max, Stat::Std];
        Self {
            columns: vec![
                ChannelColumns { channel: Channel::Heartrate, stats: four.clone() },
                ChannelColumns { channel: Channel::Elevation, stats: vec![Stat::Min, Stat::Max] },
                ChannelColumns { channel: Channel::Cadence, stats: four.clone() },
                ChannelColumns { channel: Channel::Power, stats: four },
            ],
        }
    }

    pub fn from_preset(preset: SchemaPreset) -> Self {
        match preset {
            SchemaPreset::Full => Self::full(),
            SchemaPreset::Legacy => Self::legacy(),
        }
    }

    /// Same statistics for every listed channel
    pub fn uniform(channels: &[Channel], stats: &[Stat]) -> Self {
        Self {
            columns: channels
                .iter()
                .map(|&channel| ChannelColumns { channel, stats: stats.to_vec() })
                .collect(),
        }
    }

    /// Read a layout from JSON, e.g.
    /// `{"columns": [{"channel": "heartrate", "stats": ["median", "max"]}]}`
    pub fn from_json_reader<R: Read>(reader: R) -> Result<Self> {
        let schema: OutputSchema = serde_json::from_reader(reader)?;
        schema.validate()?;
        Ok(schema)
    }

    pub fn load(path: &Path) -> Result<Self> {
        Self::from_json_reader(BufReader::new(File::open(path)?))
    }

    /// Rejects layouts that would produce no metric columns or repeat a
    /// channel.
    pub fn validate(&self) -> Result<()> {
        if self.columns.is_empty() {
            return Err(Error::InvalidSchema("no channels selected".into()));
        }
        for (i, col) in self.columns.iter().enumerate() {
            if col.stats.is_empty() {
                return Err(Error::InvalidSchema(format!(
                    "no statistics selected for {}",
                    col.channel
                )));
            }
            if self.columns[..i].iter().any(|c| c.channel == col.channel) {
                return Err(Error::InvalidSchema(format!(
                    "channel {} listed twice",
                    col.channel
                )));
            }
        }
        Ok(())
    }

    pub fn channels(&self) -> impl Iterator<Item = Channel> + '_ {
        self.columns.iter().map(|c| c.channel)
    }

    pub fn header(&self) -> Vec<String> {
        let mut header: Vec<String> = [
            "start_time",
            "end_time",
            "sport",
            "filename",
            "duration_seconds",
            "distance_meters",
        ]
        .iter()
        .map(|s| s.to_string())
        .collect();

        for col in &self.columns {
            for stat in &col.stats {
                header.push(format!("{}_{}", col.channel.name(), stat.name()));
            }
        }
        header
    }
}

impl Default for OutputSchema {
    fn default() -> Self {
        Self::full()
    }
}
