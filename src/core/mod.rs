//! Core acquisition and preprocessing modules

pub mod acquire;
pub mod dispatch;
pub mod enhance;
pub mod preprocess;
pub mod tile;
pub mod training;

// Re-export main types
pub use acquire::{fetch_event_image, AcquisitionParams};
pub use dispatch::fetch_event_batch;
pub use enhance::{apply_clahe_rgb, equalize_luma, ClaheParams};
pub use preprocess::{preprocess_and_patch, PreprocessParams, PreprocessSummary};
pub use tile::split_into_patches;
pub use training::{EarlyStopping, FineTunePlan, ReduceLrOnPlateau, StopDecision};
