use chrono::NaiveDate;
use serde::{Deserialize, Serialize};
use std::path::PathBuf;

/// A single fire detection from a tabular dataset (e.g. a FIRMS export).
///
/// Rows carry many more columns (brightness, confidence, satellite, ...);
/// only the position and acquisition date drive imagery retrieval, so
/// everything else is ignored on deserialization.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct FireEvent {
    pub longitude: f64,
    pub latitude: f64,
    pub acq_date: NaiveDate,
}

impl FireEvent {
    /// Deterministic output filename for this event's thumbnail.
    ///
    /// Duplicate (latitude, longitude, date) records map to the same name;
    /// the last writer wins.
    pub fn image_filename(&self) -> String {
        format!("{}_{}_{}.png", self.latitude, self.longitude, self.acq_date)
    }
}

/// Geographic bounding box in degrees (WGS84)
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct BoundingBox {
    pub min_lon: f64,
    pub max_lon: f64,
    pub min_lat: f64,
    pub max_lat: f64,
}

impl BoundingBox {
    /// Axis-aligned rectangle of ±`buffer` degrees around a point
    pub fn around(longitude: f64, latitude: f64, buffer: f64) -> Self {
        Self {
            min_lon: longitude - buffer,
            max_lon: longitude + buffer,
            min_lat: latitude - buffer,
            max_lat: latitude + buffer,
        }
    }

    /// `min_lon,min_lat,max_lon,max_lat` form used in query strings
    pub fn to_query_string(&self) -> String {
        format!(
            "{},{},{},{}",
            self.min_lon, self.min_lat, self.max_lon, self.max_lat
        )
    }
}

/// Opaque handle to a server-side median composite.
///
/// The composite is never materialized locally; it only exists as an id the
/// imagery backend can render a thumbnail from.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct CompositeRef {
    pub id: String,
}

/// Per-event result of the acquisition pipeline.
///
/// `NoImagery` is a valid empty outcome (zero scenes passed the filters),
/// distinct from `Failed` (network, HTTP, or filesystem trouble). Neither
/// is ever propagated as an error to the batch caller.
#[derive(Debug, Clone, PartialEq)]
pub enum FetchOutcome {
    /// Thumbnail downloaded and written to this path
    Saved(PathBuf),
    /// The filtered collection was empty for this event's window
    NoImagery,
    /// Something went wrong for this one event; the reason is logged too
    Failed(String),
}

impl FetchOutcome {
    pub fn is_saved(&self) -> bool {
        matches!(self, FetchOutcome::Saved(_))
    }

    /// Saved path, if any
    pub fn path(&self) -> Option<&PathBuf> {
        match self {
            FetchOutcome::Saved(p) => Some(p),
            _ => None,
        }
    }
}

/// Error types for imagery acquisition and preprocessing
#[derive(Debug, thiserror::Error)]
pub enum PyroError {
    #[error("I/O error: {0}")]
    Io(#[from] std::io::Error),

    #[error("HTTP error: {0}")]
    Http(#[from] reqwest::Error),

    #[error("Image error: {0}")]
    Image(#[from] image::ImageError),

    #[error("CSV error: {0}")]
    Csv(#[from] csv::Error),

    #[error("Invalid data format: {0}")]
    InvalidFormat(String),

    #[error("Processing error: {0}")]
    Processing(String),
}

/// Result type for acquisition and preprocessing operations
pub type PyroResult<T> = Result<T, PyroError>;
