use std::path::Path;

use serde::Serialize;

use super::DataError;

/// Where the dataset bytes came from.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize)]
#[serde(rename_all = "lowercase")]
pub enum Source {
    Network,
    Cache,
}

/// Get the raw CSV bytes, from the on-disk cache when allowed, otherwise over HTTP.
///
/// A successful download overwrites the cache. A failed download is an error
/// even when an older cached copy exists.
pub fn fetch(url: &str, cache_path: Option<&Path>, refresh: bool) -> Result<(Vec<u8>, Source), DataError> {
    if let Some(path) = cache_path {
        if !refresh && path.exists() {
            log::info!("Using cached dataset {}", path.display());
            let bytes = std::fs::read(path)?;
            return Ok((bytes, Source::Cache));
        }
    }

    let bytes = download(url)?;

    if let Some(path) = cache_path {
        if let Err(e) = write_cache(path, &bytes) {
            log::warn!("Failed to cache dataset at {}: {}", path.display(), e);
        }
    }

    Ok((bytes, Source::Network))
}

fn download(url: &str) -> Result<Vec<u8>, DataError> {
    log::debug!("Fetching {url}");
    let bytes = ureq::get(url)
        .call()
        .map_err(|e| DataError::Http { url: url.to_string(), source: e })?
        .body_mut()
        .read_to_vec()
        .map_err(|e| DataError::Http { url: url.to_string(), source: e })?;
    log::debug!("  Got {} bytes", bytes.len());
    Ok(bytes)
}

fn write_cache(path: &Path, bytes: &[u8]) -> std::io::Result<()> {
    if let Some(parent) = path.parent() {
        std::fs::create_dir_all(parent)?;
    }
    std::fs::write(path, bytes)
}

#[cfg(test)]
mod tests {
    use super::*;

    fn temp_cache(name: &str) -> std::path::PathBuf {
        std::env::temp_dir().join(format!("streamdash_test_{}_{}", std::process::id(), name))
    }

    #[test]
    fn test_fetch_prefers_cache() {
        let path = temp_cache("prefers_cache.csv");
        std::fs::write(&path, b"track_name\nFlowers\n").unwrap();

        // Unroutable URL: reaching the network would fail the test.
        let (bytes, source) = fetch("http://127.0.0.1:9/none.csv", Some(&path), false).unwrap();
        assert_eq!(source, Source::Cache);
        assert_eq!(bytes, b"track_name\nFlowers\n");

        std::fs::remove_file(&path).ok();
    }

    #[test]
    fn test_refresh_does_not_fall_back_to_cache() {
        let path = temp_cache("refresh.csv");
        std::fs::write(&path, b"stale").unwrap();

        let result = fetch("http://127.0.0.1:9/none.csv", Some(&path), true);
        assert!(matches!(result, Err(DataError::Http { .. })));

        std::fs::remove_file(&path).ok();
    }

    #[test]
    fn test_write_cache_creates_parent() {
        let dir = temp_cache("nested_dir");
        let path = dir.join("a").join("dataset.csv");
        write_cache(&path, b"x").unwrap();
        assert_eq!(std::fs::read(&path).unwrap(), b"x");
        std::fs::remove_dir_all(&dir).ok();
    }
}
