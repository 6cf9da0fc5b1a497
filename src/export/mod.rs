//! Rendering of the import graph.
//!
//! This module provides exporters for the module import graph in three
//! formats: Graphviz DOT, Mermaid flowcharts and JSON.

pub mod dot;
pub mod json;
pub mod mermaid;

use std::collections::{BTreeMap, BTreeSet};
use std::io::{self, Write};

use crate::graph::{detect_cycles, Cycle, ImportGraph, ModuleImports};

/// Export format options
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
pub enum ExportFormat {
    /// Graphviz DOT
    #[default]
    Dot,
    /// Mermaid flowchart
    Mermaid,
    /// JSON document with `nodes` and `circularDependencies`
    Json,
}

impl std::str::FromStr for ExportFormat {
    type Err = String;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s.to_lowercase().as_str() {
            "dot" | "graphviz" => Ok(ExportFormat::Dot),
            "mermaid" | "mmd" => Ok(ExportFormat::Mermaid),
            "json" => Ok(ExportFormat::Json),
            _ => Err(format!(
                "Unknown export format: '{}'. Valid formats: dot, mermaid, json",
                s
            )),
        }
    }
}

impl std::fmt::Display for ExportFormat {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        match self {
            ExportFormat::Dot => write!(f, "dot"),
            ExportFormat::Mermaid => write!(f, "mermaid"),
            ExportFormat::Json => write!(f, "json"),
        }
    }
}

/// Data container for export operations.
#[derive(Debug, Clone, Default)]
pub struct ExportData {
    /// Module id to its imports, in id order.
    pub nodes: BTreeMap<String, ModuleImports>,
    /// Detected circular imports; empty when detection was skipped.
    pub cycles: Vec<Cycle>,
}

impl ExportData {
    /// Collect the graph's nodes and, if requested, its cycles.
    pub fn new(graph: &ImportGraph, detect_circular: bool) -> Self {
        let nodes = graph.to_module_map();
        let cycles = if detect_circular {
            detect_cycles(&nodes)
        } else {
            Vec::new()
        };
        Self { nodes, cycles }
    }

    /// Ids of every module that takes part in a cycle.
    pub fn nodes_in_cycles(&self) -> BTreeSet<&str> {
        self.cycles
            .iter()
            .flat_map(|c| c.path.iter().map(String::as_str))
            .collect()
    }

    /// Returns true if the edge `from -> to` closes or continues a cycle.
    pub fn is_cycle_edge(&self, from: &str, to: &str) -> bool {
        self.cycles
            .iter()
            .any(|c| c.path.windows(2).any(|w| w[0] == from && w[1] == to))
    }
}

/// Trait for exporters.
pub trait Exporter {
    /// Export the data to the given writer.
    fn export<W: Write>(&self, data: &ExportData, writer: &mut W) -> io::Result<()>;
}

/// Export data in the specified format.
pub fn export<W: Write>(format: ExportFormat, data: &ExportData, writer: &mut W) -> io::Result<()> {
    match format {
        ExportFormat::Dot => dot::DotExporter.export(data, writer),
        ExportFormat::Mermaid => mermaid::MermaidExporter.export(data, writer),
        ExportFormat::Json => json::JsonExporter.export(data, writer),
    }
}

/// Export data to a string.
pub fn export_to_string(format: ExportFormat, data: &ExportData) -> io::Result<String> {
    let mut buffer = Vec::new();
    export(format, data, &mut buffer)?;
    String::from_utf8(buffer).map_err(|e| io::Error::new(io::ErrorKind::InvalidData, e))
}

#[cfg(test)]
pub(crate) fn sample_data() -> ExportData {
    let mut graph = ImportGraph::new();
    for id in ["./a.ts", "./b.ts", "./c.ts", "react"] {
        graph.add_module(id, None);
    }
    graph.add_import("./a.ts", "./b.ts");
    graph.add_import("./b.ts", "./a.ts");
    graph.add_import("./a.ts", "./c.ts");
    graph.add_import("./c.ts", "react");
    ExportData::new(&graph, true)
}
