pub mod diff;
pub mod replay;

use std::path::Path;

use rowbatch_core::errors::ExError;
use rowbatch_core::{BatchError, CoordinatorConfig};

/// Load a coordinator configuration, or the defaults when no path is given
pub fn load_config(path: Option<&Path>) -> Result<CoordinatorConfig, ExError> {
    match path {
        Some(path) => {
            let source = std::fs::read_to_string(path)
                .map_err(BatchError::from)
                .map_err(|e| ExError::from(e).with_op("load_config"))?;
            CoordinatorConfig::from_toml_str(&source)
                .map_err(|e| ExError::from(e).with_op("load_config"))
        }
        None => Ok(CoordinatorConfig::default()),
    }
}

/// Read and parse a JSON document
pub fn read_json<T: serde::de::DeserializeOwned>(path: &Path, op: &str) -> Result<T, ExError> {
    let annotate = |e: BatchError| {
        let message = format!("{}: {}", path.display(), e);
        ExError::from(e).with_op(op).with_message(message)
    };
    let source = std::fs::read_to_string(path)
        .map_err(BatchError::from)
        .map_err(annotate)?;
    serde_json::from_str(&source)
        .map_err(BatchError::from)
        .map_err(annotate)
}
