//! DOT serialization of a [`DotGraph`].

use std::fmt::Write as _;
use std::io::Write;

use callvis_error::{Error, Result};

use crate::document::{Attrs, DotCluster, DotGraph, NodeId};

/// Escape special characters for quoted DOT strings.
pub fn escape_label(input: &str) -> String {
    input
        .replace('\\', "\\\\")
        .replace('"', "\\\"")
        .replace('\n', "\\n")
}

/// Write indentation to output.
pub fn write_indent(output: &mut String, level: usize) {
    for _ in 0..level {
        output.push_str("    ");
    }
}

fn join_attrs(attrs: &Attrs) -> String {
    attrs
        .iter()
        .map(|(key, value)| format!("{}=\"{}\"", key, escape_label(value)))
        .collect::<Vec<_>>()
        .join(" ")
}

/// A DOT graph builder for constructing valid DOT output.
pub struct DotBuilder {
    output: String,
    indent: usize,
}

impl DotBuilder {
    /// Create a new DOT digraph with the given name.
    pub fn new(name: &str) -> Self {
        let mut output = String::with_capacity(4096);
        let _ = writeln!(output, "digraph {name} {{");
        Self { output, indent: 1 }
    }

    /// Add a graph (or cluster) attribute.
    pub fn attr(&mut self, key: &str, value: &str) -> &mut Self {
        write_indent(&mut self.output, self.indent);
        let _ = writeln!(self.output, "{}=\"{}\";", key, escape_label(value));
        self
    }

    /// Add default attributes for `node` or `edge` statements.
    pub fn defaults(&mut self, target: &str, attrs: &Attrs) -> &mut Self {
        write_indent(&mut self.output, self.indent);
        let _ = writeln!(self.output, "{} [{}];", target, join_attrs(attrs));
        self
    }

    /// Add a blank line for readability.
    pub fn blank(&mut self) -> &mut Self {
        self.output.push('\n');
        self
    }

    /// Add a node with attributes.
    pub fn node(&mut self, id: &str, attrs: &Attrs) -> &mut Self {
        write_indent(&mut self.output, self.indent);
        let _ = writeln!(self.output, "\"{}\" [ {} ]", escape_label(id), join_attrs(attrs));
        self
    }

    /// Add an edge with attributes.
    pub fn edge(&mut self, from: &str, to: &str, attrs: &Attrs) -> &mut Self {
        write_indent(&mut self.output, self.indent);
        let _ = writeln!(
            self.output,
            "\"{}\" -> \"{}\" [ {} ]",
            escape_label(from),
            escape_label(to),
            join_attrs(attrs)
        );
        self
    }

    /// Start a subgraph cluster.
    pub fn start_cluster(&mut self, id: &str) -> &mut Self {
        write_indent(&mut self.output, self.indent);
        let _ = writeln!(self.output, "subgraph \"cluster_{}\" {{", escape_label(id));
        self.indent += 1;
        self
    }

    /// End the current subgraph cluster.
    pub fn end_cluster(&mut self) -> &mut Self {
        self.indent -= 1;
        write_indent(&mut self.output, self.indent);
        self.output.push_str("}\n");
        self
    }

    /// Finish building and return the DOT string.
    pub fn build(mut self) -> String {
        self.output.push_str("}\n");
        self.output
    }
}

fn node_defaults() -> Attrs {
    crate::document::attrs([
        ("shape", "box"),
        ("style", "filled,rounded"),
        ("fillcolor", "honeydew"),
        ("fontname", "Verdana"),
        ("penwidth", "1.0"),
        ("margin", "0.05,0.0"),
    ])
}

fn write_cluster(builder: &mut DotBuilder, doc: &DotGraph, cluster: &DotCluster) {
    builder.start_cluster(&cluster.id);
    for (key, value) in &cluster.attrs {
        builder.attr(key, value);
    }
    for &id in &cluster.nodes {
        write_node(builder, doc, id);
    }
    for child in cluster.clusters.values() {
        write_cluster(builder, doc, child);
    }
    builder.end_cluster();
}

fn write_node(builder: &mut DotBuilder, doc: &DotGraph, id: NodeId) {
    if let Some(node) = doc.node(id) {
        builder.node(&node.id, &node.attrs);
    }
}

/// Render the document as DOT text.
pub fn to_dot(doc: &DotGraph) -> String {
    let mut builder = DotBuilder::new("callvis");
    builder
        .attr("label", &doc.title)
        .attr("labeljust", "l")
        .attr("fontname", "Arial")
        .attr("fontsize", "14")
        .attr("rankdir", "LR")
        .attr("bgcolor", "lightgray")
        .attr("style", "solid")
        .attr("penwidth", "0.5")
        .attr("pad", "0.0");
    if let Some(nodesep) = doc.option("nodesep") {
        builder.attr("nodesep", nodesep);
    }
    builder.blank().defaults("node", &node_defaults());

    let mut edge_defaults = Attrs::new();
    if let Some(minlen) = doc.option("minlen") {
        edge_defaults.insert("minlen".into(), minlen.into());
    }
    builder.defaults("edge", &edge_defaults).blank();

    write_cluster(&mut builder, doc, &doc.cluster);

    for &id in &doc.nodes {
        write_node(&mut builder, doc, id);
    }
    for edge in &doc.edges {
        let (Some(from), Some(to)) = (doc.node(edge.from), doc.node(edge.to)) else {
            continue;
        };
        builder.edge(&from.id, &to.id, &edge.attrs);
    }

    builder.build()
}

/// Serialize the document as DOT into `writer`.
pub fn write_dot<W: Write>(mut writer: W, doc: &DotGraph) -> Result<()> {
    let text = to_dot(doc);
    writer
        .write_all(text.as_bytes())
        .and_then(|_| writer.flush())
        .map_err(|e| Error::from(e).with_operation("dot::write_dot"))
}
