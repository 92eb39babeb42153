//! Render configuration: focus, path scoping, grouping and layout options.

use std::fs;
use std::path::Path;
use std::str::FromStr;

use serde::Deserialize;

use callvis_error::{Error, Result};

/// Grouping toggles, parsed from a list such as `"pkg,type"`.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
pub struct GroupBy {
    /// Nest nodes in a cluster per defining package
    pub pkg: bool,
    /// Nest methods in a cluster per receiver type
    pub type_: bool,
}

impl GroupBy {
    pub fn none() -> Self {
        Self::default()
    }

    pub fn pkg() -> Self {
        Self {
            pkg: true,
            type_: false,
        }
    }

    pub fn type_() -> Self {
        Self {
            pkg: false,
            type_: true,
        }
    }

    pub fn all() -> Self {
        Self {
            pkg: true,
            type_: true,
        }
    }

    pub fn is_empty(&self) -> bool {
        !self.pkg && !self.type_
    }

    /// Parse a comma separated toggle list. Blank entries are skipped.
    pub fn parse(list: &str) -> Result<Self> {
        let mut group_by = GroupBy::none();
        for toggle in list.split(',').map(str::trim).filter(|t| !t.is_empty()) {
            match toggle {
                "pkg" => group_by.pkg = true,
                "type" => group_by.type_ = true,
                other => {
                    return Err(Error::config_invalid(format!("invalid group option: {other}"))
                        .with_operation("config::GroupBy::parse")
                        .with_context("option", other));
                }
            }
        }
        Ok(group_by)
    }
}

impl FromStr for GroupBy {
    type Err = Error;

    fn from_str(s: &str) -> Result<Self> {
        GroupBy::parse(s)
    }
}

impl<'de> Deserialize<'de> for GroupBy {
    fn deserialize<D>(deserializer: D) -> std::result::Result<Self, D::Error>
    where
        D: serde::Deserializer<'de>,
    {
        let toggles = Vec::<String>::deserialize(deserializer)?;
        GroupBy::parse(&toggles.join(",")).map_err(|e| serde::de::Error::custom(e.message()))
    }
}

/// Options for one render pass.
#[derive(Debug, Clone, PartialEq, Deserialize)]
#[serde(default, deny_unknown_fields)]
pub struct RenderConfig {
    /// Package name singled out for highlighting; empty = no focus.
    pub focus: String,
    /// Both endpoints must live under this import path prefix; empty = unrestricted.
    pub limit_path: String,
    /// Edges touching any of these import path prefixes are dropped.
    pub ignore_paths: Vec<String>,
    pub group_by: GroupBy,
    /// Minimum edge length, echoed into the document.
    pub minlen: u32,
    /// Node separation, echoed into the document.
    pub nodesep: f64,
}

impl Default for RenderConfig {
    fn default() -> Self {
        Self {
            focus: String::new(),
            limit_path: String::new(),
            ignore_paths: Vec::new(),
            group_by: GroupBy::pkg(),
            minlen: 2,
            nodesep: 0.35,
        }
    }
}

impl RenderConfig {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn with_focus(mut self, focus: impl Into<String>) -> Self {
        self.focus = focus.into();
        self
    }

    pub fn with_limit_path(mut self, limit_path: impl Into<String>) -> Self {
        self.limit_path = limit_path.into();
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

    pub fn with_group_by(mut self, group_by: GroupBy) -> Self {
        self.group_by = group_by;
        self
    }

    pub fn with_minlen(mut self, minlen: u32) -> Self {
        self.minlen = minlen;
        self
    }

    pub fn with_nodesep(mut self, nodesep: f64) -> Self {
        self.nodesep = nodesep;
        self
    }

    pub fn has_focus(&self) -> bool {
        !self.focus.is_empty()
    }

    /// Whether `package_name` is the focus package. Always false without a focus.
    pub fn is_focus(&self, package_name: &str) -> bool {
        self.has_focus() && package_name == self.focus
    }

    pub fn from_toml_str(text: &str) -> Result<Self> {
        toml::from_str(text).map_err(|e| {
            Error::config_invalid(e.to_string())
                .with_operation("config::from_toml_str")
                .set_source(e)
        })
    }

    pub fn from_path(path: impl AsRef<Path>) -> Result<Self> {
        let path = path.as_ref();
        let text = fs::read_to_string(path).map_err(|e| {
            Error::from(e)
                .with_operation("config::from_path")
                .with_context("path", path.display().to_string())
        })?;
        Self::from_toml_str(&text).map_err(|e| e.with_context("path", path.display().to_string()))
    }
}
