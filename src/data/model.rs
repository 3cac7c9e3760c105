use std::fmt;

use serde::{Deserialize, Serialize};

use crate::error::{FaultError, Result};

// ---------------------------------------------------------------------------
// Channel – one of the three measured signals
// ---------------------------------------------------------------------------

/// Number of measured channels in every row.
pub const CHANNEL_COUNT: usize = 3;

/// A measured channel. The declaration order is the column order used
/// everywhere: rows, label strings, model input.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum Channel {
    Vp1,
    Vp2,
    Vp3,
}

impl Channel {
    pub const ALL: [Channel; CHANNEL_COUNT] = [Channel::Vp1, Channel::Vp2, Channel::Vp3];

    /// Column name in the source table.
    pub fn name(self) -> &'static str {
        match self {
            Channel::Vp1 => "vp1",
            Channel::Vp2 => "vp2",
            Channel::Vp3 => "vp3",
        }
    }

    /// Position of the channel inside a [`Row`].
    pub fn index(self) -> usize {
        self as usize
    }
}

impl fmt::Display for Channel {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.name())
    }
}

/// One complete measurement: `[vp1, vp2, vp3]`.
pub type Row = [f64; CHANNEL_COUNT];

/// A row as read from a source, before missing values are removed.
pub type PartialRow = [Option<f64>; CHANNEL_COUNT];

// ---------------------------------------------------------------------------
// Column validation
// ---------------------------------------------------------------------------

/// Check that every required channel appears among `available` column names.
///
/// The error lists exactly the absent channels, in channel order.
pub fn validate_columns<S: AsRef<str>>(available: &[S]) -> Result<()> {
    let missing: Vec<String> = Channel::ALL
        .iter()
        .filter(|ch| !available.iter().any(|c| c.as_ref() == ch.name()))
        .map(|ch| ch.name().to_string())
        .collect();

    if missing.is_empty() {
        Ok(())
    } else {
        Err(FaultError::MissingColumns(missing))
    }
}

// ---------------------------------------------------------------------------
// Dataset – the normalized table
// ---------------------------------------------------------------------------

/// The normalized table: complete rows only, three channels each.
#[derive(Debug, Clone, Default, PartialEq)]
pub struct Dataset {
    rows: Vec<Row>,
}

impl Dataset {
    pub fn from_rows(rows: Vec<Row>) -> Self {
        Dataset { rows }
    }

    pub fn rows(&self) -> &[Row] {
        &self.rows
    }

    /// Number of rows.
    pub fn len(&self) -> usize {
        self.rows.len()
    }

    /// Whether the dataset is empty.
    pub fn is_empty(&self) -> bool {
        self.rows.is_empty()
    }

    /// Iterate the values of one channel in row order.
    pub fn column(&self, channel: Channel) -> impl Iterator<Item = f64> + '_ {
        let idx = channel.index();
        self.rows.iter().map(move |row| row[idx])
    }

    /// Arithmetic mean of a channel. An empty dataset gives NaN.
    pub fn mean(&self, channel: Channel) -> f64 {
        let sum: f64 = self.column(channel).sum();
        sum / self.rows.len() as f64
    }
}
