//! callvis command-line interface.
//!
pub mod options;
pub mod output;
pub mod pipeline;

use std::path::PathBuf;

use callvis_core::Result;

pub use options::{OutputFormat, RenderOptions};
pub use output::write_output;
pub use pipeline::process_graph;

/// Options for running callvis.
#[derive(Debug, Clone, Default)]
pub struct CallvisOptions {
    /// Call graph JSON file, or `-` for stdin
    pub input: String,
    /// TOML render config
    pub config: Option<PathBuf>,
    pub render: RenderOptions,
    /// Toolchain root used to recognize standard packages
    pub goroot: Option<PathBuf>,
    pub format: OutputFormat,
    pub output: Option<String>,
    pub keep_synthetic: bool,
}

/// Main entry point
pub fn run_main(opts: &CallvisOptions) -> Result<String> {
    process_graph(opts)
}
