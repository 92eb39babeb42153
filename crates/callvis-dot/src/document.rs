//! In-memory graph document handed to the serializer.

use std::collections::BTreeMap;

use indexmap::IndexMap;
use serde::Serialize;

/// Visual attributes, kept sorted so output is deterministic.
pub type Attrs = BTreeMap<String, String>;

/// Build an [`Attrs`] map from string pairs.
pub fn attrs<const N: usize>(pairs: [(&str, &str); N]) -> Attrs {
    pairs
        .into_iter()
        .map(|(k, v)| (k.to_string(), v.to_string()))
        .collect()
}

/// Index of a rendered node in [`DotGraph::node_table`].
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord, Serialize)]
#[serde(transparent)]
pub struct NodeId(pub u32);

impl NodeId {
    pub fn as_u32(self) -> u32 {
        self.0
    }

    pub fn index(self) -> usize {
        self.0 as usize
    }
}

#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct DotNode {
    /// Fully qualified function name
    pub id: String,
    pub attrs: Attrs,
}

impl DotNode {
    pub fn label(&self) -> Option<&str> {
        self.attrs.get("label").map(String::as_str)
    }

    pub fn attr(&self, key: &str) -> Option<&str> {
        self.attrs.get(key).map(String::as_str)
    }
}

#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct DotEdge {
    pub from: NodeId,
    pub to: NodeId,
    pub attrs: Attrs,
}

impl DotEdge {
    pub fn attr(&self, key: &str) -> Option<&str> {
        self.attrs.get(key).map(String::as_str)
    }
}

/// A styled container in the cluster tree.
///
/// Child clusters and member nodes keep insertion order.
#[derive(Debug, Clone, Default, PartialEq, Serialize)]
pub struct DotCluster {
    pub id: String,
    pub attrs: Attrs,
    pub clusters: IndexMap<String, DotCluster>,
    pub nodes: Vec<NodeId>,
}

impl DotCluster {
    pub fn new(id: impl Into<String>, attrs: Attrs) -> Self {
        Self {
            id: id.into(),
            attrs,
            clusters: IndexMap::new(),
            nodes: Vec::new(),
        }
    }

    /// Get the child cluster keyed by `key`, creating it with `make` on first use.
    pub fn child_or_insert_with<F>(&mut self, key: &str, make: F) -> &mut DotCluster
    where
        F: FnOnce() -> DotCluster,
    {
        self.clusters.entry(key.to_string()).or_insert_with(make)
    }

    pub fn child(&self, key: &str) -> Option<&DotCluster> {
        self.clusters.get(key)
    }

    /// This cluster followed by all of its descendants, breadth first.
    pub fn descendants(&self) -> Vec<&DotCluster> {
        let mut out = vec![self];
        let mut index = 0;
        while index < out.len() {
            let current = out[index];
            out.extend(current.clusters.values());
            index += 1;
        }
        out
    }

    /// Cluster whose member list holds `node`, searching the whole subtree.
    pub fn owner_of(&self, node: NodeId) -> Option<&DotCluster> {
        self.descendants()
            .into_iter()
            .find(|cluster| cluster.nodes.contains(&node))
    }
}

/// The assembled document.
#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct DotGraph {
    pub title: String,
    /// Global layout options (`minlen`, `nodesep`), passed through verbatim.
    pub options: BTreeMap<String, String>,
    /// Root of the cluster tree (the focus cluster).
    pub cluster: DotCluster,
    /// Every rendered node; [`NodeId`]s index into this table.
    pub node_table: Vec<DotNode>,
    /// Nodes placed outside any cluster.
    pub nodes: Vec<NodeId>,
    pub edges: Vec<DotEdge>,
}

impl DotGraph {
    pub fn node(&self, id: NodeId) -> Option<&DotNode> {
        self.node_table.get(id.index())
    }

    /// Look a node up by its function name.
    pub fn find_node(&self, name: &str) -> Option<NodeId> {
        self.node_table
            .iter()
            .position(|n| n.id == name)
            .map(|index| NodeId(index as u32))
    }

    pub fn option(&self, key: &str) -> Option<&str> {
        self.options.get(key).map(String::as_str)
    }
}
