//! Input model and policy inputs for callvis.
//!
//! - [`graph`]: the call graph handed over by the analysis engine
//! - [`lookup`]: standard-distribution vs project package classification
//! - [`config`]: focus, scope and grouping configuration

pub mod config;
pub mod graph;
pub mod lookup;

pub use callvis_error::{Error, ErrorKind, Result};
pub use config::{GroupBy, RenderConfig};
pub use graph::{
    CallEdge, CallGraph, CallMode, CallSite, Dispatch, EdgeRef, FuncId, FuncNode, Package,
};
pub use lookup::{GorootLookup, ImportPathHeuristic, PackageClass, PackageLookup, StaticLookup};
