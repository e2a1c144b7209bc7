use thiserror::Error;

use crate::schema::Channel;

/// Errors raised while summarizing a record stream
#[derive(Error, Debug)]
pub enum Error {
    #[error("I/O error: {0}")]
    Io(#[from] std::io::Error),

    #[error("CSV error: {0}")]
    Csv(#[from] csv::Error),

    /// A group closed with no buffered samples on a channel. The grouper
    /// always buffers the opening record, so this means a broken boundary.
    #[error("Empty {channel} buffer while finalizing group '{filename}'")]
    EmptyChannel { filename: String, channel: Channel },

    #[error("Cannot compute statistics over an empty sample buffer")]
    EmptySamples,

    #[error("Schema file error: {0}")]
    Config(#[from] serde_json::Error),

    #[error("Invalid output schema: {0}")]
    InvalidSchema(String),
}

pub type Result<T> = std::result::Result<T, Error>;
