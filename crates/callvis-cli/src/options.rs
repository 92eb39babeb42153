//! Command-line options shared by the `callvis` binary and its tests.
//!
//! Every render option is optional on the command line: a value given here
//! overrides the one loaded from the config file, which in turn overrides the
//! built-in default.

use clap::{Args, ValueEnum};

use callvis_core::{Error, GroupBy, RenderConfig, Result};

/// Filtering, grouping and layout options.
#[derive(Args, Debug, Clone, Default)]
pub struct RenderOptions {
    /// Focus package name; only edges touching it are kept
    #[arg(long, value_name = "PKG")]
    pub focus: Option<String>,

    /// Keep only edges whose endpoints both live under this import path prefix
    #[arg(long = "limit", value_name = "PREFIX")]
    pub limit_path: Option<String>,

    /// Drop edges touching any of these import path prefixes (comma separated, repeatable)
    #[arg(
        long = "ignore",
        value_name = "PREFIX",
        value_delimiter = ',',
        action = clap::ArgAction::Append
    )]
    pub ignore_paths: Vec<String>,

    /// Grouping toggles: comma separated list of `pkg`, `type` [default: pkg]
    #[arg(long = "group", value_name = "LIST")]
    pub group_by: Option<String>,

    /// Minimum edge length [default: 2]
    #[arg(long)]
    pub minlen: Option<u32>,

    /// Minimum space between adjacent nodes [default: 0.35]
    #[arg(long)]
    pub nodesep: Option<f64>,
}

impl RenderOptions {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn with_focus(mut self, focus: impl Into<String>) -> Self {
        self.focus = Some(focus.into());
        self
    }

    pub fn with_limit_path(mut self, limit_path: impl Into<String>) -> Self {
        self.limit_path = Some(limit_path.into());
        self
    }

    pub fn with_ignore_paths<I, S>(mut self, ignore_paths: I) -> Self
    where
        I: IntoIterator<Item = S>,
        S: Into<String>,
    {
        self.ignore_paths = ignore_paths.into_iter().map(Into::into).collect();
        self
    }

    pub fn with_group_by(mut self, group_by: impl Into<String>) -> Self {
        self.group_by = Some(group_by.into());
        self
    }

    pub fn with_minlen(mut self, minlen: u32) -> Self {
        self.minlen = Some(minlen);
        self
    }

    pub fn with_nodesep(mut self, nodesep: f64) -> Self {
        self.nodesep = Some(nodesep);
        self
    }

    /// Overlay the options given on the command line onto `config`.
    pub fn apply(&self, mut config: RenderConfig) -> Result<RenderConfig> {
        if let Some(focus) = &self.focus {
            config.focus = focus.trim().to_string();
        }
        if let Some(limit_path) = &self.limit_path {
            config.limit_path = limit_path.trim().to_string();
        }

        let ignore_paths: Vec<String> = self
            .ignore_paths
            .iter()
            .map(|p| p.trim())
            .filter(|p| !p.is_empty())
            .map(str::to_string)
            .collect();
        if !ignore_paths.is_empty() {
            config.ignore_paths = ignore_paths;
        }

        if let Some(group_by) = &self.group_by {
            config.group_by = GroupBy::parse(group_by)?;
        }
        if let Some(minlen) = self.minlen {
            config.minlen = minlen;
        }
        if let Some(nodesep) = self.nodesep {
            if !nodesep.is_finite() || nodesep < 0.0 {
                return Err(Error::invalid_argument(format!(
                    "nodesep must be a non-negative number, got {nodesep}"
                ))
                .with_operation("options::apply"));
            }
            config.nodesep = nodesep;
        }
        Ok(config)
    }
}

/// Serialization of the rendered document.
#[derive(ValueEnum, Debug, Clone, Copy, PartialEq, Eq, Default)]
pub enum OutputFormat {
    /// Graphviz DOT text
    #[default]
    Dot,
    /// The document model as JSON
    Json,
}
