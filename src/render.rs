//! Interactive network rendering
//!
//! Serializes the per-compound exchange graph into a self-contained HTML
//! page driven by vis-network. Layout is fully delegated to the library's
//! physics engine; this module only attaches the node/edge payloads and a
//! fixed interaction/physics configuration.

use crate::extract::{CompoundExchanges, SpeciesNode};
use anyhow::Result;
use petgraph::visit::EdgeRef;
use petgraph::Direction;
use serde::Serialize;

#[derive(Serialize)]
struct VisNode {
    id: String,
    label: String,
    size: f64,
    group: String,
    title: String,
}

#[derive(Serialize)]
struct VisEdge {
    from: String,
    to: String,
    value: f64,
    title: String,
    arrows: &'static str,
}

// Physics and interaction settings: repulsive barnesHut layout tuned for
// readability, multi-select and navigation buttons enabled.
const OPTIONS: &str = r#"{
  "nodes": {
    "borderWidth": 2,
    "borderWidthSelected": 5
  },
  "edges": {
    "color": {
      "inherit": true
    },
    "dashes": true,
    "smooth": true
  },
  "interaction": {
    "multiselect": true,
    "navigationButtons": true
  },
  "physics": {
    "minVelocity": 0,
    "maxVelocity": 0.5,
    "barnesHut": {
      "gravitationalConstant": -85000,
      "centralGravity": 10,
      "springLength": 250,
      "springConstant": 0,
      "damping": 0,
      "avoidOverlap": 1
    }
  }
}"#;

const TEMPLATE: &str = r#"<!DOCTYPE html>
<html>
<head>
<meta charset="utf-8">
<title>__HEADING__</title>
<script src="https://unpkg.com/vis-network/standalone/umd/vis-network.min.js"></script>
<style>
  html, body { height: 100%; margin: 0; font-family: sans-serif; }
  h1 { text-align: center; margin: 8px; }
  #network { width: 100%; height: 90%; border: 1px solid #ddd; }
</style>
</head>
<body>
<h1>__HEADING__</h1>
<div id="network"></div>
<script>
  var nodes = new vis.DataSet(__NODES__);
  var edges = new vis.DataSet(__EDGES__);
  var container = document.getElementById("network");
  var network = new vis.Network(container, { nodes: nodes, edges: edges }, __OPTIONS__);
</script>
</body>
</html>
"#;

fn node_tooltip(node: &SpeciesNode, gives_to: &[String]) -> String {
    format!(
        "Gives to:<br>{}<br><br>Abundance: {}%<br><br>Phylum: {}",
        gives_to.join("<br>"),
        node.size / 100.0,
        node.group
    )
}

/// Render the exchange graph as an interactive HTML page.
pub fn render_network(extracted: &CompoundExchanges, display_name: &str) -> Result<String> {
    let graph = &extracted.graph;

    let mut nodes = Vec::with_capacity(graph.node_count());
    for idx in graph.node_indices() {
        let node = &graph[idx];
        let gives_to: Vec<String> = graph
            .neighbors_directed(idx, Direction::Outgoing)
            .map(|n| graph[n].id.clone())
            .collect();
        nodes.push(VisNode {
            id: node.id.clone(),
            label: node.id.clone(),
            size: node.size,
            group: node.group.clone(),
            title: node_tooltip(node, &gives_to),
        });
    }

    let mut edges = Vec::with_capacity(graph.edge_count());
    for edge in graph.edge_references() {
        let value = edge.weight().value;
        edges.push(VisEdge {
            from: graph[edge.source()].id.clone(),
            to: graph[edge.target()].id.clone(),
            value,
            title: format!("exchange probability (smetana value): {value}"),
            arrows: "to",
        });
    }

    let heading = format!("Exchanges of {display_name}");
    Ok(TEMPLATE
        .replace("__HEADING__", &heading)
        .replace("__NODES__", &serde_json::to_string(&nodes)?)
        .replace("__EDGES__", &serde_json::to_string(&edges)?)
        .replace("__OPTIONS__", OPTIONS))
}
