use crate::types::{PyroError, PyroResult};
use std::fs;
use std::path::{Path, PathBuf};
use std::time::Duration;

/// Blocking HTTP client for thumbnail downloads.
///
/// One client is built per batch and shared across worker threads; reqwest's
/// blocking client is internally pooled and `Sync`.
pub struct FetchClient {
    client: reqwest::blocking::Client,
}

impl FetchClient {
    /// Client with the default 30 second timeout
    pub fn new() -> PyroResult<Self> {
        Self::with_timeout(Duration::from_secs(30))
    }

    pub fn with_timeout(timeout: Duration) -> PyroResult<Self> {
        let client = reqwest::blocking::Client::builder()
            .timeout(timeout)
            .user_agent(concat!("pyrosat/", env!("CARGO_PKG_VERSION")))
            .build()?;

        Ok(Self { client })
    }

    /// Download raw image bytes from a render URL.
    ///
    /// Any non-2xx status is a failure; render endpoints report an expired
    /// or invalid link that way rather than with an error body we could use.
    pub fn download(&self, url: &str) -> PyroResult<Vec<u8>> {
        log::debug!("Downloading thumbnail from: {}", url);

        let response = self.client.get(url).send()?;

        if !response.status().is_success() {
            return Err(PyroError::Processing(format!(
                "HTTP {} {}: {}",
                response.status().as_u16(),
                response.status().canonical_reason().unwrap_or(""),
                url
            )));
        }

        let content = response.bytes()?;
        log::debug!("Downloaded {} bytes", content.len());

        Ok(content.to_vec())
    }
}

/// Write image bytes under `output_dir`, creating the directory on demand.
///
/// Returns the full path of the written file. An existing file with the
/// same name is overwritten.
pub fn save_image<P: AsRef<Path>>(
    content: &[u8],
    output_dir: P,
    filename: &str,
) -> PyroResult<PathBuf> {
    fs::create_dir_all(&output_dir)?;

    let path = output_dir.as_ref().join(filename);
    fs::write(&path, content)?;

    log::info!("Saved: {}", path.display());
    Ok(path)
}
