//! Call graph rendering to a clustered, styled DOT document.
//!
//! The renderer makes a single pass over the call graph's edges. It filters
//! them by focus package and import path scope, memoizes one rendered node per
//! function, nests nodes into package and receiver-type clusters, and
//! deduplicates edges that share caller, call-site description and callee.
//!
//! # Module Structure
//!
//! - [`document`]: the in-memory document (nodes, edges, cluster tree)
//! - [`render`]: the [`GraphRenderer`] transform and the edge filtering policy
//! - [`dot`]: DOT text serialization
//! - [`style`]: colors and attribute sets

pub mod document;
pub mod dot;
pub mod render;
pub mod style;

use callvis_core::{CallGraph, PackageLookup, RenderConfig};
use callvis_error::Result;

pub use document::{Attrs, DotCluster, DotEdge, DotGraph, DotNode, NodeId};
pub use dot::{DotBuilder, to_dot, write_dot};
pub use render::{EdgeVerdict, GraphRenderer, filter_edge};

/// Render `graph` to DOT text.
pub fn render_graph<L: PackageLookup>(
    graph: &CallGraph,
    config: &RenderConfig,
    lookup: L,
) -> Result<String> {
    let doc = GraphRenderer::new(config, lookup).render(graph)?;
    Ok(to_dot(&doc))
}
