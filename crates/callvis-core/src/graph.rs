//! The whole-program call graph consumed by the renderer.
//!
//! The graph is produced upstream by a static/pointer analysis engine and
//! handed over as a function table plus an edge list. Functions are addressed
//! by dense [`FuncId`]s; edges carry an optional [`CallSite`] describing how
//! the call is dispatched and executed.

use std::collections::{HashMap, HashSet};
use std::fs::File;
use std::io::{BufReader, Read};
use std::path::Path;

use serde::{Deserialize, Serialize};
use strum_macros::Display;
use tracing::debug;

use callvis_error::{Error, Result};

/// Index of a function in [`CallGraph::funcs`].
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord, Serialize, Deserialize)]
#[serde(transparent)]
pub struct FuncId(pub u32);

impl std::fmt::Display for FuncId {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        write!(f, "{}", self.0)
    }
}

impl FuncId {
    pub fn new(id: u32) -> Self {
        Self(id)
    }

    pub fn as_u32(self) -> u32 {
        self.0
    }

    pub fn index(self) -> usize {
        self.0 as usize
    }
}

/// Defining package of a function.
#[derive(Debug, Clone, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub struct Package {
    /// Short package name, e.g. `http`
    pub name: String,
    /// Import path, e.g. `net/http`
    pub path: String,
}

impl Package {
    pub fn new(name: impl Into<String>, path: impl Into<String>) -> Self {
        Self {
            name: name.into(),
            path: path.into(),
        }
    }
}

/// A function node of the call graph.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct FuncNode {
    /// Fully qualified name, stable across the whole program. Used as identity.
    pub name: String,
    /// Name relative to the defining package, e.g. `(*Conn).Close` or `main$1`.
    pub rel_name: String,
    /// Defining package; `None` when the function cannot be attributed.
    #[serde(default)]
    pub package: Option<Package>,
    /// Fully qualified receiver type for methods.
    #[serde(default)]
    pub receiver: Option<String>,
    #[serde(default)]
    pub exported: bool,
    /// Why the function was generated, for compiler/tool generated functions.
    #[serde(default)]
    pub synthetic: Option<String>,
    /// Enclosing function of an anonymous function.
    #[serde(default)]
    pub parent: Option<FuncId>,
}

impl FuncNode {
    pub fn new(
        name: impl Into<String>,
        rel_name: impl Into<String>,
        package: Option<Package>,
    ) -> Self {
        Self {
            name: name.into(),
            rel_name: rel_name.into(),
            package,
            receiver: None,
            exported: false,
            synthetic: None,
            parent: None,
        }
    }

    pub fn with_receiver(mut self, receiver: impl Into<String>) -> Self {
        self.receiver = Some(receiver.into());
        self
    }

    pub fn with_exported(mut self, exported: bool) -> Self {
        self.exported = exported;
        self
    }

    pub fn with_synthetic(mut self, reason: impl Into<String>) -> Self {
        self.synthetic = Some(reason.into());
        self
    }

    pub fn with_parent(mut self, parent: FuncId) -> Self {
        self.parent = Some(parent);
        self
    }

    pub fn is_synthetic(&self) -> bool {
        self.synthetic.is_some()
    }

    pub fn is_nested(&self) -> bool {
        self.parent.is_some()
    }

    /// Package initializers survive synthetic node deletion.
    pub fn is_package_init(&self) -> bool {
        self.package.is_some() && self.rel_name == "init"
    }

    pub fn package_name(&self) -> Option<&str> {
        self.package.as_ref().map(|p| p.name.as_str())
    }
}

/// How the callee of a call site is selected.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Default, Display, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
#[strum(serialize_all = "snake_case")]
pub enum Dispatch {
    /// Callee statically determined
    #[default]
    Static,
    /// Interface method or closure call
    Dynamic,
}

/// How the call executes relative to the caller.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Default, Display, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
#[strum(serialize_all = "snake_case")]
pub enum CallMode {
    #[default]
    Sync,
    /// Spawned concurrently (a `go` statement)
    Spawn,
    /// Deferred until the caller returns
    Deferred,
}

/// Call-site descriptor attached to an edge.
#[derive(Debug, Clone, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub struct CallSite {
    /// e.g. `static function call`, `dynamic method call`
    pub description: String,
    #[serde(default)]
    pub dispatch: Dispatch,
    #[serde(default)]
    pub mode: CallMode,
}

impl CallSite {
    pub fn new(description: impl Into<String>, dispatch: Dispatch, mode: CallMode) -> Self {
        Self {
            description: description.into(),
            dispatch,
            mode,
        }
    }

    pub fn is_dynamic(&self) -> bool {
        self.dispatch == Dispatch::Dynamic
    }
}

/// A directed call edge.
#[derive(Debug, Clone, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub struct CallEdge {
    pub caller: FuncId,
    pub callee: FuncId,
    /// `None` for edges the analysis synthesized (e.g. from the root node).
    #[serde(default)]
    pub site: Option<CallSite>,
}

impl CallEdge {
    pub fn new(caller: FuncId, callee: FuncId, site: Option<CallSite>) -> Self {
        Self { caller, callee, site }
    }

    /// Human readable call-site description.
    pub fn description(&self) -> String {
        match &self.site {
            None => "synthetic call".to_string(),
            Some(site) => match site.mode {
                CallMode::Sync => site.description.clone(),
                CallMode::Spawn => format!("concurrent {}", site.description),
                CallMode::Deferred => format!("deferred {}", site.description),
            },
        }
    }
}

/// An edge with both endpoints resolved, as seen by [`CallGraph::visit_edges`] callbacks.
#[derive(Debug, Clone, Copy)]
pub struct EdgeRef<'g> {
    pub caller_id: FuncId,
    pub callee_id: FuncId,
    pub caller: &'g FuncNode,
    pub callee: &'g FuncNode,
    pub edge: &'g CallEdge,
}

impl<'g> EdgeRef<'g> {
    pub fn site(&self) -> Option<&'g CallSite> {
        self.edge.site.as_ref()
    }

    pub fn description(&self) -> String {
        self.edge.description()
    }
}

/// Whole-program call graph.
#[derive(Debug, Clone, Default, Serialize, Deserialize)]
pub struct CallGraph {
    /// Import path of the analyzed program's main package.
    pub main_package: String,
    #[serde(default)]
    pub root: Option<FuncId>,
    #[serde(default)]
    pub funcs: Vec<FuncNode>,
    #[serde(default)]
    pub edges: Vec<CallEdge>,
}

impl CallGraph {
    pub fn new(main_package: impl Into<String>) -> Self {
        Self {
            main_package: main_package.into(),
            ..Default::default()
        }
    }

    pub fn add_func(&mut self, func: FuncNode) -> FuncId {
        let id = FuncId(self.funcs.len() as u32);
        self.funcs.push(func);
        id
    }

    pub fn add_edge(&mut self, caller: FuncId, callee: FuncId, site: Option<CallSite>) {
        self.edges.push(CallEdge::new(caller, callee, site));
    }

    pub fn func(&self, id: FuncId) -> Result<&FuncNode> {
        self.funcs
            .get(id.index())
            .ok_or_else(|| Error::func_not_found(id.to_string()))
    }

    /// Receiver that decides type grouping for `func`.
    ///
    /// An anonymous function takes the receiver of its enclosing function.
    pub fn receiver_of<'g>(&'g self, func: &'g FuncNode) -> Result<Option<&'g str>> {
        match func.parent {
            Some(parent) => {
                let parent = self.func(parent).map_err(|e| {
                    e.with_operation("graph::receiver_of")
                        .with_context("func", &func.name)
                })?;
                Ok(parent.receiver.as_deref())
            }
            None => Ok(func.receiver.as_deref()),
        }
    }

    /// Invoke `f` once per edge, in insertion order.
    ///
    /// Stops at the first error, either a dangling endpoint or an error
    /// returned by the callback, and propagates it.
    pub fn visit_edges<F>(&self, mut f: F) -> Result<()>
    where
        F: FnMut(EdgeRef<'_>) -> Result<()>,
    {
        for (index, edge) in self.edges.iter().enumerate() {
            let resolve = |id: FuncId| {
                self.func(id).map_err(|e| {
                    e.with_operation("graph::visit_edges")
                        .with_context("edge", index.to_string())
                })
            };
            let caller = resolve(edge.caller)?;
            let callee = resolve(edge.callee)?;
            f(EdgeRef {
                caller_id: edge.caller,
                callee_id: edge.callee,
                caller,
                callee,
                edge,
            })?;
        }
        Ok(())
    }

    /// Remove synthetic functions by connecting their callers directly to their callees.
    ///
    /// The root and package initializers are kept. Bridged edges reuse the call
    /// site of the incoming edge, and an edge already present in the graph is
    /// never added twice. Returns the number of removed functions.
    pub fn delete_synthetic_nodes(&mut self) -> usize {
        // Removed edges become `None`; each function indexes the slots it calls and is called from.
        let mut edges: Vec<Option<CallEdge>> =
            std::mem::take(&mut self.edges).into_iter().map(Some).collect();
        let mut seen: HashSet<CallEdge> = edges.iter().flatten().cloned().collect();
        let mut incoming: HashMap<FuncId, Vec<usize>> = HashMap::new();
        let mut outgoing: HashMap<FuncId, Vec<usize>> = HashMap::new();
        for (slot, edge) in edges.iter().flatten().enumerate() {
            outgoing.entry(edge.caller).or_default().push(slot);
            incoming.entry(edge.callee).or_default().push(slot);
        }

        let mut removed = 0usize;
        for (index, func) in self.funcs.iter().enumerate() {
            let id = FuncId(index as u32);
            if self.root == Some(id) || !func.is_synthetic() || func.is_package_init() {
                continue;
            }

            let in_slots = take_live_slots(&mut incoming, id, &edges);
            let out_slots = take_live_slots(&mut outgoing, id, &edges);
            let callees: Vec<FuncId> = out_slots
                .iter()
                .filter_map(|&slot| edges[slot].as_ref().map(|e| e.callee))
                .collect();

            for &slot in &in_slots {
                let Some(e_in) = edges[slot].clone() else {
                    continue;
                };
                for &callee in &callees {
                    let bridged = CallEdge::new(e_in.caller, callee, e_in.site.clone());
                    // a bridge through a self loop would touch the node being removed
                    if !seen.insert(bridged.clone()) || e_in.caller == id || callee == id {
                        continue;
                    }
                    let at = edges.len();
                    outgoing.entry(bridged.caller).or_default().push(at);
                    incoming.entry(bridged.callee).or_default().push(at);
                    edges.push(Some(bridged));
                }
            }

            for &slot in in_slots.iter().chain(&out_slots) {
                edges[slot] = None;
            }
            removed += 1;
            debug!(
                func = %func.name,
                in_degree = in_slots.len(),
                out_degree = out_slots.len(),
                "deleted synthetic node"
            );
        }

        self.edges = edges.into_iter().flatten().collect();
        removed
    }

    pub fn from_json_str(text: &str) -> Result<Self> {
        serde_json::from_str(text).map_err(|e| {
            Error::deserialization_failed(e.to_string())
                .with_operation("graph::from_json_str")
                .set_source(e)
        })
    }

    pub fn from_json_reader<R: Read>(reader: R) -> Result<Self> {
        serde_json::from_reader(reader).map_err(|e| {
            Error::deserialization_failed(e.to_string())
                .with_operation("graph::from_json_reader")
                .set_source(e)
        })
    }

    pub fn from_path(path: impl AsRef<Path>) -> Result<Self> {
        let path = path.as_ref();
        let file = File::open(path).map_err(|e| {
            Error::from(e)
                .with_operation("graph::from_path")
                .with_context("path", path.display().to_string())
        })?;
        Self::from_json_reader(BufReader::new(file))
            .map_err(|e| e.with_context("path", path.display().to_string()))
    }
}

/// Edge slots indexed under `id` that have not been removed yet.
fn take_live_slots(
    index: &mut HashMap<FuncId, Vec<usize>>,
    id: FuncId,
    edges: &[Option<CallEdge>],
) -> Vec<usize> {
    index
        .remove(&id)
        .unwrap_or_default()
        .into_iter()
        .filter(|&slot| edges[slot].is_some())
        .collect()
}

#[cfg(test)]
mod tests {
    use super::*;
    use callvis_error::ErrorKind;

    fn pkg(name: &str) -> Option<Package> {
        Some(Package::new(name, format!("example.com/{name}")))
    }

    fn static_call() -> Option<CallSite> {
        Some(CallSite::new("static function call", Dispatch::Static, CallMode::Sync))
    }

    #[test]
    fn test_edge_description() {
        let a = FuncId(0);
        let b = FuncId(1);
        assert_eq!(CallEdge::new(a, b, None).description(), "synthetic call");
        assert_eq!(CallEdge::new(a, b, static_call()).description(), "static function call");

        let spawn = CallSite::new("dynamic method call", Dispatch::Dynamic, CallMode::Spawn);
        assert_eq!(
            CallEdge::new(a, b, Some(spawn)).description(),
            "concurrent dynamic method call"
        );

        let deferred = CallSite::new("static method call", Dispatch::Static, CallMode::Deferred);
        assert_eq!(
            CallEdge::new(a, b, Some(deferred)).description(),
            "deferred static method call"
        );
    }

    #[test]
    fn test_visit_edges_in_order() {
        let mut graph = CallGraph::new("example.com/app");
        let f = graph.add_func(FuncNode::new("example.com/a.f", "f", pkg("a")));
        let g = graph.add_func(FuncNode::new("example.com/b.g", "g", pkg("b")));
        let h = graph.add_func(FuncNode::new("example.com/b.h", "h", pkg("b")));
        graph.add_edge(f, g, static_call());
        graph.add_edge(g, h, static_call());

        let mut seen = Vec::new();
        graph
            .visit_edges(|edge| {
                seen.push((edge.caller.name.clone(), edge.callee.name.clone()));
                Ok(())
            })
            .unwrap();

        assert_eq!(
            seen,
            vec![
                ("example.com/a.f".to_string(), "example.com/b.g".to_string()),
                ("example.com/b.g".to_string(), "example.com/b.h".to_string()),
            ]
        );
    }

    #[test]
    fn test_visit_edges_stops_on_callback_error() {
        let mut graph = CallGraph::new("example.com/app");
        let f = graph.add_func(FuncNode::new("example.com/a.f", "f", pkg("a")));
        graph.add_edge(f, f, static_call());
        graph.add_edge(f, f, static_call());

        let mut calls = 0;
        let err = graph
            .visit_edges(|_| {
                calls += 1;
                Err(Error::unexpected("stop"))
            })
            .unwrap_err();

        assert_eq!(calls, 1);
        assert_eq!(err.kind(), ErrorKind::Unexpected);
    }

    #[test]
    fn test_visit_edges_dangling_id() {
        let mut graph = CallGraph::new("example.com/app");
        let f = graph.add_func(FuncNode::new("example.com/a.f", "f", pkg("a")));
        graph.add_edge(f, FuncId(7), static_call());

        let err = graph.visit_edges(|_| Ok(())).unwrap_err();
        assert_eq!(err.kind(), ErrorKind::FuncNotFound);
        assert_eq!(err.operation(), "graph::visit_edges");
        assert!(err.context().contains(&("edge", "0".to_string())));
    }

    #[test]
    fn test_receiver_of_closure_uses_parent() {
        let mut graph = CallGraph::new("example.com/app");
        let method = graph.add_func(
            FuncNode::new("(*example.com/a.T).Run", "(*T).Run", pkg("a"))
                .with_receiver("*example.com/a.T"),
        );
        let closure =
            FuncNode::new("(*example.com/a.T).Run$1", "(*T).Run$1", pkg("a")).with_parent(method);
        let free = FuncNode::new("example.com/a.f", "f", pkg("a"));

        assert_eq!(graph.receiver_of(&closure).unwrap(), Some("*example.com/a.T"));
        assert_eq!(graph.receiver_of(&free).unwrap(), None);

        let orphan = FuncNode::new("example.com/a.g$1", "g$1", pkg("a")).with_parent(FuncId(99));
        assert_eq!(
            graph.receiver_of(&orphan).unwrap_err().kind(),
            ErrorKind::FuncNotFound
        );
    }

    #[test]
    fn test_delete_synthetic_nodes_bridges_edges() {
        let mut graph = CallGraph::new("example.com/app");
        let root = graph.add_func(FuncNode::new("<root>", "<root>", None).with_synthetic("root"));
        let a = graph.add_func(FuncNode::new("example.com/a.f", "f", pkg("a")));
        let wrapper = graph.add_func(
            FuncNode::new("(example.com/b.T).M$bound", "T.M$bound", pkg("b"))
                .with_synthetic("bound method wrapper"),
        );
        let b = graph.add_func(FuncNode::new("(example.com/b.T).M", "T.M", pkg("b")));
        let init = graph.add_func(
            FuncNode::new("example.com/a.init", "init", pkg("a"))
                .with_synthetic("package initializer"),
        );
        graph.root = Some(root);

        graph.add_edge(root, a, None);
        graph.add_edge(root, init, None);
        graph.add_edge(a, wrapper, static_call());
        graph.add_edge(wrapper, b, static_call());

        let removed = graph.delete_synthetic_nodes();
        assert_eq!(removed, 1);

        assert_eq!(
            graph.edges,
            vec![
                CallEdge::new(root, a, None),
                CallEdge::new(root, init, None),
                CallEdge::new(a, b, static_call()),
            ]
        );
    }

    #[test]
    fn test_delete_synthetic_nodes_no_duplicates() {
        let mut graph = CallGraph::new("example.com/app");
        let a = graph.add_func(FuncNode::new("example.com/a.f", "f", pkg("a")));
        let wrapper = graph.add_func(
            FuncNode::new("example.com/a.f$thunk", "f$thunk", pkg("a")).with_synthetic("thunk"),
        );
        let b = graph.add_func(FuncNode::new("example.com/b.g", "g", pkg("b")));

        graph.add_edge(a, b, static_call());
        graph.add_edge(a, wrapper, static_call());
        graph.add_edge(wrapper, b, static_call());

        graph.delete_synthetic_nodes();
        assert_eq!(graph.edges, vec![CallEdge::new(a, b, static_call())]);
    }

    #[test]
    fn test_delete_synthetic_nodes_chained() {
        let mut graph = CallGraph::new("example.com/app");
        let a = graph.add_func(FuncNode::new("example.com/a.f", "f", pkg("a")));
        let outer = graph.add_func(
            FuncNode::new("example.com/a.f$thunk", "f$thunk", pkg("a")).with_synthetic("thunk"),
        );
        let inner = graph.add_func(
            FuncNode::new("(example.com/b.T).M$bound", "T.M$bound", pkg("b"))
                .with_synthetic("bound method wrapper"),
        );
        let b = graph.add_func(FuncNode::new("(example.com/b.T).M", "T.M", pkg("b")));
        let deferred = CallSite::new("static function call", Dispatch::Static, CallMode::Deferred);

        graph.add_edge(a, outer, Some(deferred.clone()));
        graph.add_edge(outer, outer, static_call());
        graph.add_edge(outer, inner, static_call());
        graph.add_edge(inner, b, static_call());

        assert_eq!(graph.delete_synthetic_nodes(), 2);
        assert_eq!(graph.edges, vec![CallEdge::new(a, b, Some(deferred))]);
    }

    #[test]
    fn test_delete_synthetic_nodes_many_wrappers() {
        let mut graph = CallGraph::new("example.com/app");
        let count = 20_000;
        let mut expected = Vec::with_capacity(count);
        for i in 0..count {
            let caller = graph.add_func(FuncNode::new(
                format!("example.com/a.f{i}"),
                format!("f{i}"),
                pkg("a"),
            ));
            let wrapper = graph.add_func(
                FuncNode::new(format!("example.com/b.g{i}$bound"), format!("g{i}$bound"), pkg("b"))
                    .with_synthetic("bound method wrapper"),
            );
            let callee = graph.add_func(FuncNode::new(
                format!("example.com/b.g{i}"),
                format!("g{i}"),
                pkg("b"),
            ));
            graph.add_edge(caller, wrapper, static_call());
            graph.add_edge(wrapper, callee, static_call());
            expected.push(CallEdge::new(caller, callee, static_call()));
        }

        assert_eq!(graph.delete_synthetic_nodes(), count);
        assert_eq!(graph.edges, expected);
    }

    #[test]
    fn test_from_json_str() {
        let graph = CallGraph::from_json_str(
            r#"{
                "main_package": "example.com/app",
                "funcs": [
                    {"name": "example.com/app.main", "rel_name": "main",
                     "package": {"name": "main", "path": "example.com/app"}},
                    {"name": "fmt.Println", "rel_name": "Println", "exported": true,
                     "package": {"name": "fmt", "path": "fmt"}}
                ],
                "edges": [
                    {"caller": 0, "callee": 1,
                     "site": {"description": "static function call", "mode": "deferred"}}
                ]
            }"#,
        )
        .unwrap();

        assert_eq!(graph.main_package, "example.com/app");
        assert_eq!(graph.funcs.len(), 2);
        assert!(graph.funcs[1].exported);
        let site = graph.edges[0].site.as_ref().unwrap();
        assert_eq!(site.dispatch, Dispatch::Static);
        assert_eq!(site.mode, CallMode::Deferred);
    }

    #[test]
    fn test_from_json_str_invalid() {
        let err = CallGraph::from_json_str("{\"funcs\": 3}").unwrap_err();
        assert_eq!(err.kind(), ErrorKind::DeserializationFailed);
        assert!(err.source_ref().is_some());
    }
}
