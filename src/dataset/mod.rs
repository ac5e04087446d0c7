pub mod decode;
pub mod fetch;
pub mod prepare;

use std::path::PathBuf;
use std::sync::OnceLock;

use thiserror::Error;

pub use decode::{NameFix, TextEncoding};
pub use fetch::Source;
pub use prepare::{PrepareStats, RawTable, WORKING_SET_SIZE, WorkingSet, prepare};

/// The dataset could not be produced. Fatal at startup: there is no
/// fallback dataset and no partial result.
#[derive(Error, Debug)]
pub enum DataError {
    #[error("failed to download {url}: {source}")]
    Http {
        url: String,
        #[source]
        source: ureq::Error,
    },
    #[error("IO error: {0}")]
    Io(#[from] std::io::Error),
    #[error("CSV error: {0}")]
    Csv(#[from] csv::Error),
    #[error("missing required column: {0}")]
    MissingColumn(String),
    #[error("line {line}: invalid {column} value {value:?}")]
    InvalidValue {
        line: usize,
        column: String,
        value: String,
    },
}

/// Where and how to load the dataset.
#[derive(Debug, Clone)]
pub struct LoadOptions {
    pub url: String,
    pub cache_path: Option<PathBuf>,
    pub refresh: bool,
    pub name_fixes: Vec<NameFix>,
}

/// The prepared dataset plus provenance.
#[derive(Debug)]
pub struct Dataset {
    pub working_set: WorkingSet,
    pub encoding: TextEncoding,
    pub source: Source,
}

/// Fetch, decode and prepare the dataset. Not memoized; see [`init`].
pub fn load(opts: &LoadOptions) -> Result<Dataset, DataError> {
    let (bytes, source) = fetch::fetch(&opts.url, opts.cache_path.as_deref(), opts.refresh)?;
    let (text, encoding) = decode::decode(&bytes);
    log::info!("Decoded {} bytes as {}", bytes.len(), encoding.label());

    let raw = RawTable::from_csv(&text)?;
    let working_set = prepare(&raw, &opts.name_fixes)?;

    Ok(Dataset {
        working_set,
        encoding,
        source,
    })
}

static DATASET: OnceLock<Dataset> = OnceLock::new();

/// Load the dataset once for the whole process. Later calls return the
/// first result regardless of `opts`; the source is static, so the cache
/// is never invalidated.
pub fn init(opts: &LoadOptions) -> Result<&'static Dataset, DataError> {
    if let Some(ds) = DATASET.get() {
        return Ok(ds);
    }
    let ds = load(opts)?;
    Ok(DATASET.get_or_init(|| ds))
}
