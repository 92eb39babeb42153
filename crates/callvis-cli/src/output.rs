//! Output generation (DOT or JSON) and writing.

use std::fs;
use std::io::{self, Write};

use tracing::info;

use callvis_core::{Error, Result};
use callvis_dot::{DotGraph, to_dot};

use crate::options::OutputFormat;

/// Serialize a rendered document in the requested format.
pub fn serialize(doc: &DotGraph, format: OutputFormat) -> Result<String> {
    match format {
        OutputFormat::Dot => Ok(to_dot(doc)),
        OutputFormat::Json => serde_json::to_string_pretty(doc).map_err(|e| {
            Error::serialization_failed(e.to_string())
                .with_operation("output::serialize")
                .set_source(e)
        }),
    }
}

/// Write `text` to `path`, or to stdout when no path is given.
pub fn write_output(path: Option<&str>, text: &str) -> Result<()> {
    match path {
        Some(path) => {
            fs::write(path, text).map_err(|e| {
                Error::from(e)
                    .with_operation("output::write_output")
                    .with_context("path", path)
            })?;
            info!(path, "output written");
        }
        None => {
            let mut stdout = io::stdout().lock();
            stdout
                .write_all(text.as_bytes())
                .and_then(|_| stdout.flush())
                .map_err(|e| Error::from(e).with_operation("output::write_output"))?;
        }
    }
    Ok(())
}
