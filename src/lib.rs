//! pyrosat: satellite imagery acquisition and preprocessing for wildfire
//! classification datasets.
//!
//! Two independent pipelines feed a downstream classifier: a batch fetcher
//! that turns tabular fire detections into cloud-filtered Sentinel-2
//! thumbnails, and a local preprocessor that contrast-enhances stored
//! images and splits them into fixed-size training patches.

pub mod core;
pub mod io;
pub mod types;

// Re-export main types and functions for easier access
pub use types::{
    BoundingBox, CompositeRef, FetchOutcome, FireEvent, PyroError, PyroResult,
};

pub use core::{
    fetch_event_batch, fetch_event_image, preprocess_and_patch, AcquisitionParams, ClaheParams,
    PreprocessParams,
};
pub use io::{read_events_csv, CompositeQuery, FetchClient, HttpImageryBackend, ImageryBackend};
