//! Single-pass transform from a call graph into a clustered document.
//!
//! Every edge is visited once. Surviving edges resolve their endpoints into
//! memoized rendered nodes (styled and placed into the cluster tree on first
//! sight only) and are deduplicated by caller, call-site description and callee.

use std::collections::{BTreeMap, HashMap, HashSet};
use std::io::Write;

use strum_macros::{Display, IntoStaticStr};
use tracing::{debug, info};

use callvis_core::{
    CallGraph, EdgeRef, FuncNode, Package, PackageClass, PackageLookup, RenderConfig,
};
use callvis_error::{Error, Result};

use crate::document::{Attrs, DotCluster, DotEdge, DotGraph, DotNode, NodeId};
use crate::dot::write_dot;
use crate::style;

/// Outcome of the edge filtering policy.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Display, IntoStaticStr)]
#[strum(serialize_all = "snake_case")]
pub enum EdgeVerdict {
    Keep,
    /// Unattributable caller or generated callee
    Synthetic,
    /// Neither endpoint is in the focus package
    OutOfFocus,
    /// An endpoint lies outside the limit path
    OutOfScope,
    /// An endpoint lies under an ignored path
    Ignored,
}

/// Apply the scoping filters to one edge, in order, stopping at the first failure.
pub fn filter_edge(config: &RenderConfig, caller: &FuncNode, callee: &FuncNode) -> EdgeVerdict {
    let (Some(caller_pkg), Some(callee_pkg)) = (&caller.package, &callee.package) else {
        return EdgeVerdict::Synthetic;
    };
    if callee.is_synthetic() {
        return EdgeVerdict::Synthetic;
    }

    if config.has_focus()
        && !(config.is_focus(&caller_pkg.name) || config.is_focus(&callee_pkg.name))
    {
        return EdgeVerdict::OutOfFocus;
    }

    let limit = config.limit_path.as_str();
    if !(caller_pkg.path.starts_with(limit) && callee_pkg.path.starts_with(limit)) {
        return EdgeVerdict::OutOfScope;
    }

    let ignored = config.ignore_paths.iter().any(|p| {
        caller_pkg.path.starts_with(p.as_str()) || callee_pkg.path.starts_with(p.as_str())
    });
    if ignored {
        return EdgeVerdict::Ignored;
    }

    EdgeVerdict::Keep
}

/// Renders call graphs according to a [`RenderConfig`].
pub struct GraphRenderer<'a, L> {
    config: &'a RenderConfig,
    lookup: L,
}

impl<'a, L: PackageLookup> GraphRenderer<'a, L> {
    pub fn new(config: &'a RenderConfig, lookup: L) -> Self {
        Self { config, lookup }
    }

    /// Build the document. Fails on the first traversal error; nothing partial is returned.
    pub fn render(&self, graph: &CallGraph) -> Result<DotGraph> {
        let mut state = RenderState::new(self.config, &self.lookup);
        graph.visit_edges(|edge| state.visit(graph, edge))?;

        for (verdict, count) in &state.dropped {
            debug!(reason = %verdict, count, "dropped edges");
        }
        info!("{} edges", state.edges.len());

        Ok(state.finish(graph))
    }

    /// Build the document and serialize it as DOT into `writer`.
    pub fn render_to<W: Write>(&self, graph: &CallGraph, writer: W) -> Result<()> {
        let doc = self.render(graph)?;
        write_dot(writer, &doc)
    }
}

/// Memo tables and partial output owned by one render call.
struct RenderState<'a, L> {
    config: &'a RenderConfig,
    lookup: &'a L,
    root: DotCluster,
    node_table: Vec<DotNode>,
    top_level: Vec<NodeId>,
    edges: Vec<DotEdge>,
    node_memo: HashMap<String, NodeId>,
    edge_memo: HashSet<String>,
    class_cache: HashMap<String, PackageClass>,
    dropped: BTreeMap<&'static str, usize>,
}

impl<'a, L: PackageLookup> RenderState<'a, L> {
    fn new(config: &'a RenderConfig, lookup: &'a L) -> Self {
        Self {
            config,
            lookup,
            root: style::focus_cluster(&config.focus),
            node_table: Vec::new(),
            top_level: Vec::new(),
            edges: Vec::new(),
            node_memo: HashMap::new(),
            edge_memo: HashSet::new(),
            class_cache: HashMap::new(),
            dropped: BTreeMap::new(),
        }
    }

    fn visit(&mut self, graph: &CallGraph, edge: EdgeRef<'_>) -> Result<()> {
        let verdict = filter_edge(self.config, edge.caller, edge.callee);
        if verdict != EdgeVerdict::Keep {
            *self.dropped.entry(verdict.into()).or_insert(0) += 1;
            return Ok(());
        }

        let from = self.resolve_node(graph, edge.caller)?;
        let to = self.resolve_node(graph, edge.callee)?;
        self.add_edge(edge, from, to);
        Ok(())
    }

    fn classify(&mut self, import_path: &str) -> PackageClass {
        if let Some(class) = self.class_cache.get(import_path) {
            return *class;
        }
        let class = self.lookup.classify(import_path);
        self.class_cache.insert(import_path.to_string(), class);
        class
    }

    /// Rendered node for `func`, created, styled and placed on first use.
    fn resolve_node(&mut self, graph: &CallGraph, func: &FuncNode) -> Result<NodeId> {
        if let Some(&id) = self.node_memo.get(&func.name) {
            return Ok(id);
        }

        let package = func.package.as_ref().ok_or_else(|| {
            Error::graph_invalid("function without a defining package")
                .with_operation("render::resolve_node")
                .with_context("func", &func.name)
        })?;
        let receiver = graph
            .receiver_of(func)
            .map_err(|e| e.with_operation("render::resolve_node"))?;
        let group_by = self.config.group_by;
        let is_focus = self.config.is_focus(&package.name);
        let class = self.classify(&package.path);

        let mut label = if group_by.type_ && receiver.is_some() {
            // the receiver shows up as the enclosing cluster instead
            func.rel_name.rsplit('.').next().unwrap_or(&func.rel_name).to_string()
        } else {
            func.rel_name.clone()
        };
        if !group_by.pkg && !is_focus {
            label = format!("{}\n{}", package.name, label);
        }

        let mut attrs = Attrs::new();
        attrs.insert("fillcolor".into(), style::node_fill(class, is_focus).into());
        attrs.insert("label".into(), label);
        if func.is_nested() {
            attrs.insert("style".into(), "dotted,filled".into());
        } else if func.exported {
            attrs.insert("penwidth".into(), "1.5".into());
        } else {
            attrs.insert("penwidth".into(), "0.5".into());
        }

        let id = NodeId(self.node_table.len() as u32);
        self.node_table.push(DotNode {
            id: func.name.clone(),
            attrs,
        });
        self.place(id, func, package, receiver, is_focus, class);
        self.node_memo.insert(func.name.clone(), id);
        Ok(id)
    }

    /// Put a new node into its cluster, creating package and type clusters as needed.
    fn place(
        &mut self,
        id: NodeId,
        func: &FuncNode,
        package: &Package,
        receiver: Option<&str>,
        is_focus: bool,
        class: PackageClass,
    ) {
        let group_by = self.config.group_by;
        if group_by.is_empty() && is_focus {
            self.top_level.push(id);
            return;
        }

        let mut cluster = &mut self.root;
        if group_by.pkg && !is_focus {
            cluster = cluster.child_or_insert_with(&package.path, || {
                debug!(package = %package.path, "new package cluster");
                style::package_cluster(&package.name, &package.path, class)
            });
        }
        if group_by.type_
            && let Some(receiver) = receiver
        {
            let label = func.rel_name.split('.').next().unwrap_or(&func.rel_name);
            cluster = cluster.child_or_insert_with(receiver, || {
                debug!(receiver, "new type cluster");
                style::type_cluster(receiver, label, class, is_focus)
            });
        }
        cluster.nodes.push(id);
    }

    fn add_edge(&mut self, edge: EdgeRef<'_>, from: NodeId, to: NodeId) {
        let key = format!("{} = {} => {}", edge.caller.name, edge.description(), edge.callee.name);
        if self.edge_memo.contains(&key) {
            return;
        }

        let mut attrs = style::call_site_attrs(edge.site());
        let caller_focus = edge.caller.package_name().is_some_and(|n| self.config.is_focus(n));
        let callee_focus = edge.callee.package_name().is_some_and(|n| self.config.is_focus(n));
        if self.config.has_focus() && !(caller_focus && callee_focus) {
            attrs.insert("color".into(), style::CROSS_FOCUS_EDGE.into());
        }

        self.edge_memo.insert(key);
        self.edges.push(DotEdge { from, to, attrs });
    }

    fn finish(self, graph: &CallGraph) -> DotGraph {
        let mut options = BTreeMap::new();
        options.insert("minlen".to_string(), self.config.minlen.to_string());
        options.insert("nodesep".to_string(), self.config.nodesep.to_string());

        DotGraph {
            title: graph.main_package.clone(),
            options,
            cluster: self.root,
            node_table: self.node_table,
            nodes: self.top_level,
            edges: self.edges,
        }
    }
}
