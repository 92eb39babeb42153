//! Core processing pipeline: load → delete synthetic nodes → render → serialize.

use std::env;
use std::ffi::OsString;
use std::io;
use std::iter;
use std::path::{Path, PathBuf};
use std::process::Command;
use std::time::Instant;

use tracing::{info, warn};

use callvis_core::{
    CallGraph, Error, GorootLookup, ImportPathHeuristic, PackageLookup, RenderConfig, Result,
};
use callvis_dot::GraphRenderer;

use crate::CallvisOptions;
use crate::output::serialize;

/// Run every phase for one input and return the serialized document.
pub fn process_graph(opts: &CallvisOptions) -> Result<String> {
    let config = load_config(opts)?;
    let lookup = select_lookup(opts.goroot.as_deref(), env::var_os("GOROOT"), go_env_goroot)?;

    // 1. Load
    let load_start = Instant::now();
    let mut graph = load_graph(&opts.input)?;
    info!(
        "Loading {} funcs, {} edges: {:.2}s",
        graph.funcs.len(),
        graph.edges.len(),
        load_start.elapsed().as_secs_f64()
    );

    // 2. Synthetic node deletion
    if !opts.keep_synthetic {
        let delete_start = Instant::now();
        let removed = graph.delete_synthetic_nodes();
        info!(
            "Deleting {} synthetic nodes: {:.2}s",
            removed,
            delete_start.elapsed().as_secs_f64()
        );
    }

    // 3. Render
    let render_start = Instant::now();
    let doc = GraphRenderer::new(&config, lookup).render(&graph)?;
    info!("Graph rendering: {:.2}s", render_start.elapsed().as_secs_f64());

    // 4. Serialize
    let serialize_start = Instant::now();
    let text = serialize(&doc, opts.format)?;
    info!("Serializing: {:.2}s", serialize_start.elapsed().as_secs_f64());

    Ok(text)
}

/// Config file values (if any) overlaid with command-line options.
pub fn load_config(opts: &CallvisOptions) -> Result<RenderConfig> {
    let base = match &opts.config {
        Some(path) => RenderConfig::from_path(path)?,
        None => RenderConfig::default(),
    };
    opts.render.apply(base)
}

/// Read the call graph from a file, or from stdin for `-`.
pub fn load_graph(input: &str) -> Result<CallGraph> {
    if input == "-" {
        CallGraph::from_json_reader(io::stdin().lock())
    } else {
        CallGraph::from_path(input)
    }
}

/// Choose how packages are classified as standard.
///
/// An explicit toolchain root must exist. Otherwise `env_goroot` is tried,
/// then the root reported by `go_env`; the import path heuristic is used only
/// when neither yields a toolchain root.
pub fn select_lookup<F>(
    explicit: Option<&Path>,
    env_goroot: Option<OsString>,
    go_env: F,
) -> Result<Box<dyn PackageLookup>>
where
    F: FnOnce() -> Option<PathBuf>,
{
    if let Some(root) = explicit {
        if !GorootLookup::is_toolchain_root(root) {
            return Err(Error::invalid_argument(format!(
                "no src directory under toolchain root {}",
                root.display()
            ))
            .with_operation("pipeline::select_lookup")
            .with_context("goroot", root.display().to_string()));
        }
        return Ok(Box::new(GorootLookup::new(root)));
    }

    let candidates = env_goroot
        .filter(|root| !root.is_empty())
        .map(PathBuf::from)
        .into_iter()
        .chain(iter::once_with(go_env).flatten());
    match GorootLookup::from_candidates(candidates) {
        Some(lookup) => {
            info!(goroot = %lookup.root().display(), "classifying packages against toolchain root");
            Ok(Box::new(lookup))
        }
        None => {
            warn!("no toolchain root found, classifying packages by import path");
            Ok(Box::new(ImportPathHeuristic))
        }
    }
}

/// Toolchain root reported by `go env GOROOT`, if the tool is installed.
fn go_env_goroot() -> Option<PathBuf> {
    let output = Command::new("go").args(["env", "GOROOT"]).output().ok()?;
    if !output.status.success() {
        return None;
    }
    let root = String::from_utf8(output.stdout).ok()?;
    let root = root.trim();
    (!root.is_empty()).then(|| PathBuf::from(root))
}
