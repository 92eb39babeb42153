//! Colors and attribute sets used by the renderer.

use callvis_core::{CallMode, CallSite, PackageClass};

use crate::document::{Attrs, DotCluster, attrs};

// Node fill colors
pub const STD_NODE_FILL: &str = "#adedad";
pub const FOCUS_NODE_FILL: &str = "lightblue";
pub const OTHER_NODE_FILL: &str = "wheat";

// Cluster fill colors
pub const FOCUS_CLUSTER_BG: &str = "aliceblue";
pub const PKG_CLUSTER_FILL: &str = "snow";
pub const STD_PKG_CLUSTER_FILL: &str = "#E0FFE1";
pub const TYPE_CLUSTER_FILL: &str = "lemonchiffon";
pub const FOCUS_TYPE_CLUSTER_FILL: &str = "lavender";
pub const STD_TYPE_CLUSTER_FILL: &str = "#c4ecc4";

// Edges
pub const CROSS_FOCUS_EDGE: &str = "saddlebrown";
pub const SPAWN_ARROWHEAD: &str = "normalnoneodot";
pub const DEFER_ARROWHEAD: &str = "normalnoneodiamond";

pub fn node_fill(class: PackageClass, is_focus: bool) -> &'static str {
    if class.is_standard() {
        STD_NODE_FILL
    } else if is_focus {
        FOCUS_NODE_FILL
    } else {
        OTHER_NODE_FILL
    }
}

/// Root container, labeled with the focus package name.
pub fn focus_cluster(focus: &str) -> DotCluster {
    DotCluster::new(
        "focus",
        attrs([
            ("label", focus),
            ("bgcolor", FOCUS_CLUSTER_BG),
            ("labelloc", "t"),
            ("labeljust", "c"),
            ("fontsize", "18"),
        ]),
    )
}

/// Cluster for one defining package, keyed by import path.
///
/// Standard packages are labeled with their full import path since short
/// names collide (`rand` in `math/rand` and `crypto/rand`).
pub fn package_cluster(name: &str, path: &str, class: PackageClass) -> DotCluster {
    let (label, fill) = if class.is_standard() {
        (path, STD_PKG_CLUSTER_FILL)
    } else {
        (name, PKG_CLUSTER_FILL)
    };
    DotCluster::new(
        path,
        attrs([
            ("penwidth", "0.8"),
            ("fontsize", "16"),
            ("label", label),
            ("style", "filled"),
            ("fillcolor", fill),
        ]),
    )
}

/// Cluster for one receiver type, keyed by the qualified type name.
pub fn type_cluster(
    receiver: &str,
    label: &str,
    class: PackageClass,
    is_focus: bool,
) -> DotCluster {
    let fill = if class.is_standard() {
        STD_TYPE_CLUSTER_FILL
    } else if is_focus {
        FOCUS_TYPE_CLUSTER_FILL
    } else {
        TYPE_CLUSTER_FILL
    };
    DotCluster::new(
        receiver,
        attrs([
            ("penwidth", "0.5"),
            ("fontsize", "15"),
            ("fontcolor", "#222222"),
            ("label", label),
            ("labelloc", "b"),
            ("style", "rounded,filled"),
            ("fillcolor", fill),
        ]),
    )
}

/// Dispatch and execution styling of an edge.
pub fn call_site_attrs(site: Option<&CallSite>) -> Attrs {
    let mut out = Attrs::new();
    let Some(site) = site else {
        return out;
    };
    if site.is_dynamic() {
        out.insert("style".into(), "dashed".into());
    }
    match site.mode {
        CallMode::Sync => {}
        CallMode::Spawn => {
            out.insert("arrowhead".into(), SPAWN_ARROWHEAD.into());
        }
        CallMode::Deferred => {
            out.insert("arrowhead".into(), DEFER_ARROWHEAD.into());
        }
    }
    out
}
