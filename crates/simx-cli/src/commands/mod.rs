//! Command handlers for the `simx` binary.

use std::path::Path;
use std::sync::Arc;

use anyhow::{Context, Result};
use simx_calendar::ExchangeCatalog;

pub mod replay;
pub mod sessions;

/// Exchange catalog from `path`, or the shipped catalog when `None`.
pub fn load_catalog(path: Option<&Path>) -> Result<Arc<ExchangeCatalog>> {
    let catalog = match path {
        Some(p) => {
            let text = std::fs::read_to_string(p)
                .with_context(|| format!("read exchange catalog failed: {}", p.display()))?;
            ExchangeCatalog::from_json(&text)
                .with_context(|| format!("parse exchange catalog failed: {}", p.display()))?
        }
        None => ExchangeCatalog::builtin().context("load builtin exchange catalog failed")?,
    };
    Ok(Arc::new(catalog))
}
