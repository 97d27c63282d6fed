use crate::types::{BoundingBox, CompositeRef, PyroError, PyroResult};
use chrono::NaiveDate;
use serde::Deserialize;
use std::time::Duration;

/// Query and render parameters for cloud-filtered median composites.
///
/// Defaults match the Sentinel-2 surface-reflectance setup used to build
/// the wildfire training set: true-color B4/B3/B2 thumbnails, reflectance
/// stretched over [0, 0.5], 512 px output.
#[derive(Debug, Clone)]
pub struct CompositeQuery {
    /// Image collection identifier on the backend
    pub collection: String,
    /// Scenes with cloud cover at or above this percentage are filtered out
    pub max_cloud_pct: f64,
    /// Bands mapped to RGB, in render order
    pub bands: Vec<String>,
    /// Lower bound of the reflectance stretch
    pub min: f64,
    /// Upper bound of the reflectance stretch
    pub max: f64,
    /// Thumbnail size in pixels (longest side)
    pub dimensions: u32,
    /// Render format
    pub format: String,
}

impl Default for CompositeQuery {
    fn default() -> Self {
        Self {
            collection: "COPERNICUS/S2_SR_HARMONIZED".to_string(),
            max_cloud_pct: 10.0,
            bands: vec!["B4".to_string(), "B3".to_string(), "B2".to_string()],
            min: 0.0,
            max: 0.5,
            dimensions: 512,
            format: "png".to_string(),
        }
    }
}

/// Seam to the remote imagery service.
///
/// Implementations are injected into the acquisition pipeline instead of
/// relying on ambient service credentials, which also makes the pipeline
/// testable against a mock.
pub trait ImageryBackend: Send + Sync {
    /// Ask the backend for a cloud-filtered median composite of `region`
    /// over `[start, end]` (inclusive).
    ///
    /// Returns `Ok(None)` when zero scenes pass the filters; that is a
    /// valid empty outcome, not an error.
    fn median_composite(
        &self,
        region: &BoundingBox,
        start: NaiveDate,
        end: NaiveDate,
    ) -> PyroResult<Option<CompositeRef>>;

    /// Build a thumbnail download URL for a previously obtained composite,
    /// rendered over `region` with the configured band mapping and stretch.
    fn thumbnail_url(&self, composite: &CompositeRef, region: &BoundingBox) -> PyroResult<String>;
}

#[derive(Debug, Deserialize)]
struct CompositeResponse {
    id: Option<String>,
}

/// Imagery backend speaking JSON over HTTP.
///
/// The service is expected to expose `GET {base}/composites` for the
/// filtered-median query and `GET {base}/composites/{id}/thumbnail` as the
/// render endpoint; the thumbnail URL carries all render parameters so the
/// link is self-contained.
pub struct HttpImageryBackend {
    base_url: String,
    client: reqwest::blocking::Client,
    query: CompositeQuery,
}

impl HttpImageryBackend {
    pub fn new(base_url: &str, query: CompositeQuery) -> PyroResult<Self> {
        let client = reqwest::blocking::Client::builder()
            .timeout(Duration::from_secs(30))
            .user_agent(concat!("pyrosat/", env!("CARGO_PKG_VERSION")))
            .build()?;

        Ok(Self {
            base_url: base_url.trim_end_matches('/').to_string(),
            client,
            query,
        })
    }
}

impl ImageryBackend for HttpImageryBackend {
    fn median_composite(
        &self,
        region: &BoundingBox,
        start: NaiveDate,
        end: NaiveDate,
    ) -> PyroResult<Option<CompositeRef>> {
        let url = format!(
            "{}/composites?collection={}&bbox={}&start={}&end={}&max_cloud={}",
            self.base_url,
            self.query.collection,
            region.to_query_string(),
            start,
            end,
            self.query.max_cloud_pct,
        );
        log::debug!("Composite query: {}", url);

        let response = self.client.get(&url).send()?;

        // An empty filtered collection is reported as 404, not a failure
        if response.status() == reqwest::StatusCode::NOT_FOUND {
            return Ok(None);
        }
        if !response.status().is_success() {
            return Err(PyroError::Processing(format!(
                "Composite query failed with HTTP {}: {}",
                response.status().as_u16(),
                url
            )));
        }

        let body: CompositeResponse = response.json()?;
        Ok(body.id.map(|id| CompositeRef { id }))
    }

    fn thumbnail_url(&self, composite: &CompositeRef, region: &BoundingBox) -> PyroResult<String> {
        if composite.id.is_empty() {
            return Err(PyroError::InvalidFormat(
                "Composite reference has an empty id".to_string(),
            ));
        }

        Ok(format!(
            "{}/composites/{}/thumbnail?min={}&max={}&dimensions={}&format={}&bands={}&region={}",
            self.base_url,
            composite.id,
            self.query.min,
            self.query.max,
            self.query.dimensions,
            self.query.format,
            self.query.bands.join(","),
            region.to_query_string(),
        ))
    }
}
