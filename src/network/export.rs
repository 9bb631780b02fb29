// Graph export: GEXF for network visualization tools, JSON for everything
// else. Both formats carry full node identity and edge weights, so a
// consumer never has to re-derive the similarity computation.

use std::fs::File;
use std::io::{BufWriter, Write};
use std::path::Path;

use chrono::Utc;
use petgraph::visit::EdgeRef;
use serde::{Deserialize, Serialize};
use tracing::info;

use crate::error::Result;

use super::builder::SimilarityGraph;

/// Supported export formats.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum ExportFormat {
    Gexf,
    Json,
}

/// Serializable edge-list form of the graph.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct GraphExport {
    pub nodes: Vec<NodeExport>,
    pub edges: Vec<EdgeExport>,
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct NodeExport {
    pub id: usize,
    pub brand: String,
    pub name: String,
}

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct EdgeExport {
    pub source: usize,
    pub target: usize,
    pub weight: f64,
}

impl GraphExport {
    pub fn from_graph(graph: &SimilarityGraph) -> Self {
        let nodes = graph
            .node_weights()
            .map(|node| NodeExport {
                id: node.doc_index,
                brand: node.brand.clone(),
                name: node.name.clone(),
            })
            .collect();
        let mut edges: Vec<EdgeExport> = graph
            .edge_references()
            .map(|edge| EdgeExport {
                source: edge.source().index(),
                target: edge.target().index(),
                weight: *edge.weight(),
            })
            .collect();
        // Stable artifact order regardless of internal edge storage.
        edges.sort_by(|a, b| (a.source, a.target).cmp(&(b.source, b.target)));
        Self { nodes, edges }
    }
}

/// Write the graph to `path` in the requested format.
pub fn write_graph(graph: &SimilarityGraph, path: &Path, format: ExportFormat) -> Result<()> {
    let file = File::create(path)?;
    let mut writer = BufWriter::new(file);
    match format {
        ExportFormat::Gexf => write_gexf(graph, &mut writer)?,
        ExportFormat::Json => write_json(graph, &mut writer)?,
    }
    writer.flush()?;
    info!(path = %path.display(), ?format, "Exported similarity network");
    Ok(())
}

/// JSON edge-list export.
pub fn write_json<W: Write>(graph: &SimilarityGraph, writer: &mut W) -> Result<()> {
    let export = GraphExport::from_graph(graph);
    serde_json::to_writer_pretty(&mut *writer, &export)?;
    writer.write_all(b"\n")?;
    Ok(())
}

/// GEXF 1.2draft export with brand/name node attributes.
pub fn write_gexf<W: Write>(graph: &SimilarityGraph, writer: &mut W) -> Result<()> {
    writeln!(writer, r#"<?xml version="1.0" encoding="UTF-8"?>"#)?;
    writeln!(
        writer,
        r#"<gexf xmlns="http://www.gexf.net/1.2draft" version="1.2">"#
    )?;
    writeln!(
        writer,
        r#"  <meta lastmodifieddate="{}">"#,
        Utc::now().format("%Y-%m-%d")
    )?;
    writeln!(writer, "    <creator>sillage</creator>")?;
    writeln!(
        writer,
        "    <description>perfume descriptor similarity network</description>"
    )?;
    writeln!(writer, "  </meta>")?;
    writeln!(
        writer,
        r#"  <graph mode="static" defaultedgetype="undirected">"#
    )?;
    writeln!(writer, r#"    <attributes class="node">"#)?;
    writeln!(
        writer,
        r#"      <attribute id="0" title="brand" type="string"/>"#
    )?;
    writeln!(
        writer,
        r#"      <attribute id="1" title="perfume_name" type="string"/>"#
    )?;
    writeln!(writer, "    </attributes>")?;

    writeln!(writer, "    <nodes>")?;
    for node in graph.node_weights() {
        writeln!(
            writer,
            r#"      <node id="{}" label="{}">"#,
            node.doc_index,
            escape_xml(&node.label())
        )?;
        writeln!(writer, "        <attvalues>")?;
        writeln!(
            writer,
            r#"          <attvalue for="0" value="{}"/>"#,
            escape_xml(&node.brand)
        )?;
        writeln!(
            writer,
            r#"          <attvalue for="1" value="{}"/>"#,
            escape_xml(&node.name)
        )?;
        writeln!(writer, "        </attvalues>")?;
        writeln!(writer, "      </node>")?;
    }
    writeln!(writer, "    </nodes>")?;

    writeln!(writer, "    <edges>")?;
    let export = GraphExport::from_graph(graph);
    for (id, edge) in export.edges.iter().enumerate() {
        writeln!(
            writer,
            r#"      <edge id="{}" source="{}" target="{}" weight="{}"/>"#,
            id, edge.source, edge.target, edge.weight
        )?;
    }
    writeln!(writer, "    </edges>")?;
    writeln!(writer, "  </graph>")?;
    writeln!(writer, "</gexf>")?;
    Ok(())
}

/// Minimal XML entity escaping for attribute values.
fn escape_xml(value: &str) -> String {
    value
        .replace('&', "&amp;")
        .replace('<', "&lt;")
        .replace('>', "&gt;")
        .replace('"', "&quot;")
        .replace('\'', "&apos;")
}
