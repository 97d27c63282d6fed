//! I/O modules for reading fire event tables and talking to the imagery service

pub mod events;
pub mod fetch;
pub mod imagery;

pub use events::read_events_csv;
pub use fetch::{save_image, FetchClient};
pub use imagery::{CompositeQuery, HttpImageryBackend, ImageryBackend};
