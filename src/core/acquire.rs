use crate::io::fetch::{save_image, FetchClient};
use crate::io::imagery::ImageryBackend;
use crate::types::{BoundingBox, FetchOutcome, FireEvent, PyroResult};
use chrono::Duration;
use std::path::{Path, PathBuf};

/// Acquisition parameters for a single fire event
#[derive(Debug, Clone)]
pub struct AcquisitionParams {
    /// Half-width in degrees of the rectangle around the event
    pub buffer: f64,
    /// Days on each side of the acquisition date to search for scenes
    pub window_days: i64,
}

impl Default for AcquisitionParams {
    fn default() -> Self {
        Self {
            buffer: 0.02,
            window_days: 1,
        }
    }
}

/// Fetch and persist the thumbnail for one fire event.
///
/// Queries the backend for a cloud-filtered median composite over a
/// ±`window_days` window and a ±`buffer` degree rectangle, renders a
/// thumbnail, downloads it and writes it to
/// `{latitude}_{longitude}_{acq_date}.png` under `output_dir`.
///
/// This function never returns an error: an empty filtered collection maps
/// to [`FetchOutcome::NoImagery`], and every failure (query, download,
/// write) is logged and mapped to [`FetchOutcome::Failed`], so one bad
/// event cannot poison a batch.
pub fn fetch_event_image<B: ImageryBackend + ?Sized>(
    backend: &B,
    client: &FetchClient,
    event: &FireEvent,
    output_dir: &Path,
    params: &AcquisitionParams,
) -> FetchOutcome {
    match try_fetch_event_image(backend, client, event, output_dir, params) {
        Ok(Some(path)) => FetchOutcome::Saved(path),
        Ok(None) => {
            log::info!(
                "No qualifying imagery for event at ({}, {}) on {}",
                event.latitude,
                event.longitude,
                event.acq_date
            );
            FetchOutcome::NoImagery
        }
        Err(e) => {
            log::warn!(
                "Failed to process event at ({}, {}) on {}: {}",
                event.latitude,
                event.longitude,
                event.acq_date,
                e
            );
            FetchOutcome::Failed(e.to_string())
        }
    }
}

fn try_fetch_event_image<B: ImageryBackend + ?Sized>(
    backend: &B,
    client: &FetchClient,
    event: &FireEvent,
    output_dir: &Path,
    params: &AcquisitionParams,
) -> PyroResult<Option<PathBuf>> {
    let start = event.acq_date - Duration::days(params.window_days);
    let end = event.acq_date + Duration::days(params.window_days);
    let region = BoundingBox::around(event.longitude, event.latitude, params.buffer);

    let composite = match backend.median_composite(&region, start, end)? {
        Some(composite) => composite,
        None => return Ok(None),
    };

    let url = backend.thumbnail_url(&composite, &region)?;
    let content = client.download(&url)?;
    let path = save_image(&content, output_dir, &event.image_filename())?;

    Ok(Some(path))
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::types::{CompositeRef, PyroError};
    use chrono::NaiveDate;
    use std::sync::Mutex;
    use tempfile::TempDir;

    /// Backend that records the query it received and returns a canned answer
    struct RecordingBackend {
        composite: Option<CompositeRef>,
        queries: Mutex<Vec<(BoundingBox, NaiveDate, NaiveDate)>>,
        fail_query: bool,
    }

    impl RecordingBackend {
        fn empty() -> Self {
            Self {
                composite: None,
                queries: Mutex::new(Vec::new()),
                fail_query: false,
            }
        }

        fn failing() -> Self {
            Self {
                composite: None,
                queries: Mutex::new(Vec::new()),
                fail_query: true,
            }
        }
    }

    impl ImageryBackend for RecordingBackend {
        fn median_composite(
            &self,
            region: &BoundingBox,
            start: NaiveDate,
            end: NaiveDate,
        ) -> PyroResult<Option<CompositeRef>> {
            if self.fail_query {
                return Err(PyroError::Processing("backend unavailable".to_string()));
            }
            self.queries.lock().unwrap().push((region.clone(), start, end));
            Ok(self.composite.clone())
        }

        fn thumbnail_url(
            &self,
            composite: &CompositeRef,
            _region: &BoundingBox,
        ) -> PyroResult<String> {
            Ok(format!("http://imagery.local/{}/thumbnail", composite.id))
        }
    }

    fn test_event() -> FireEvent {
        FireEvent {
            longitude: -120.5,
            latitude: 38.25,
            acq_date: NaiveDate::from_ymd_opt(2021, 8, 14).unwrap(),
        }
    }

    #[test]
    fn test_empty_collection_yields_no_imagery_and_no_file() {
        let backend = RecordingBackend::empty();
        let client = FetchClient::new().unwrap();
        let temp_dir = TempDir::new().unwrap();

        let outcome = fetch_event_image(
            &backend,
            &client,
            &test_event(),
            temp_dir.path(),
            &AcquisitionParams::default(),
        );

        assert_eq!(outcome, FetchOutcome::NoImagery);
        assert_eq!(std::fs::read_dir(temp_dir.path()).unwrap().count(), 0);
    }

    #[test]
    fn test_query_window_and_region_derivation() {
        let backend = RecordingBackend::empty();
        let client = FetchClient::new().unwrap();
        let temp_dir = TempDir::new().unwrap();

        fetch_event_image(
            &backend,
            &client,
            &test_event(),
            temp_dir.path(),
            &AcquisitionParams::default(),
        );

        let queries = backend.queries.lock().unwrap();
        assert_eq!(queries.len(), 1);

        let (region, start, end) = &queries[0];
        assert_eq!(*start, NaiveDate::from_ymd_opt(2021, 8, 13).unwrap());
        assert_eq!(*end, NaiveDate::from_ymd_opt(2021, 8, 15).unwrap());
        assert!((region.min_lon - -120.52).abs() < 1e-9);
        assert!((region.max_lat - 38.27).abs() < 1e-9);
    }

    #[test]
    fn test_backend_error_is_caught_not_propagated() {
        let backend = RecordingBackend::failing();
        let client = FetchClient::new().unwrap();
        let temp_dir = TempDir::new().unwrap();

        let outcome = fetch_event_image(
            &backend,
            &client,
            &test_event(),
            temp_dir.path(),
            &AcquisitionParams::default(),
        );

        match outcome {
            FetchOutcome::Failed(reason) => assert!(reason.contains("backend unavailable")),
            other => panic!("expected Failed, got {:?}", other),
        }
        assert_eq!(std::fs::read_dir(temp_dir.path()).unwrap().count(), 0);
    }
}
