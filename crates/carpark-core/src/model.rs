//! Availability response model.
//!
//! Field names mirror the upstream JSON exactly. Counts stay as strings end
//! to end; nothing here validates or converts them.

use chrono::{DateTime, TimeZone};
use serde::{Deserialize, Serialize};
use std::fmt::Display;

use crate::error::{IngestError, Result};

/// Minute-granularity timestamp used as the message key prefix
pub const KEY_TIME_FORMAT: &str = "%Y-%m-%d %H:%M";

/// Top-level decoded availability response
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct ResultSet {
    /// Snapshots in response order
    pub items: Vec<Snapshot>,
}

/// One point-in-time capture of every carpark
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct Snapshot {
    /// Opaque capture timestamp, never parsed
    pub timestamp: String,
    pub carpark_data: Vec<CarparkRecord>,
}

/// Availability of a single carpark
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct CarparkRecord {
    pub carpark_info: Vec<LotInfo>,
    pub carpark_number: String,
    pub update_datetime: String,
}

/// Counts for one lot category within a carpark
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct LotInfo {
    pub total_lots: String,
    pub lot_type: String,
    pub lots_available: String,
}

impl ResultSet {
    /// Decode a raw response body.
    ///
    /// Missing fields or wrong types fail the whole decode; unknown fields
    /// (such as the endpoint's `api_info`) are ignored.
    pub fn decode(body: &[u8]) -> Result<Self> {
        serde_json::from_slice(body).map_err(IngestError::Decode)
    }

    /// The snapshot that gets published.
    pub fn first_snapshot(&self) -> Result<&Snapshot> {
        self.items.first().ok_or(IngestError::EmptyResult)
    }
}

impl CarparkRecord {
    /// JSON payload for this record's message.
    pub fn to_json(&self) -> Result<Vec<u8>> {
        serde_json::to_vec(self).map_err(|source| IngestError::Serialization {
            carpark: self.carpark_number.clone(),
            source,
        })
    }

    /// Message key: `<YYYY-MM-DD HH:MM>-<carpark_number>`.
    ///
    /// Two records for the same carpark keyed within one clock minute
    /// produce the same key.
    pub fn message_key<Tz>(&self, at: &DateTime<Tz>) -> String
    where
        Tz: TimeZone,
        Tz::Offset: Display,
    {
        format!("{}-{}", at.format(KEY_TIME_FORMAT), self.carpark_number)
    }
}
