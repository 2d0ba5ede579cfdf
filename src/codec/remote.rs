//! Blocking fetch of WAV sources given as URLs.

use std::io;

use crate::error::Result;

/// Whether `source` names a remote location rather than a path.
pub fn is_remote(source: &str) -> bool {
    source.starts_with("http://") || source.starts_with("https://")
}

/// Download `url` and return the response body.
#[cfg(feature = "remote")]
pub fn fetch(url: &str) -> Result<Vec<u8>> {
    tracing::debug!(url, "fetching remote WAV");
    let network = |e: reqwest::Error| io::Error::other(format!("failed to fetch {url}: {e}"));
    let response = reqwest::blocking::get(url)
        .and_then(|r| r.error_for_status())
        .map_err(network)?;
    let bytes = response.bytes().map_err(network)?;
    Ok(bytes.to_vec())
}

#[cfg(not(feature = "remote"))]
pub fn fetch(url: &str) -> Result<Vec<u8>> {
    Err(io::Error::new(
        io::ErrorKind::Unsupported,
        format!("cannot fetch {url}: built without the `remote` feature"),
    )
    .into())
}
