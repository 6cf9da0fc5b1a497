//! Mermaid flowchart export implementation.

use super::{ExportData, Exporter};
use std::collections::HashMap;
use std::io::{self, Write};

/// Mermaid exporter implementation.
pub struct MermaidExporter;

/// Label text safe inside `["..."]`.
fn label(id: &str) -> String {
    id.replace('"', "#quot;")
}

impl Exporter for MermaidExporter {
    fn export<W: Write>(&self, data: &ExportData, writer: &mut W) -> io::Result<()> {
        let in_cycle = data.nodes_in_cycles();

        // Mermaid ids cannot contain path characters.
        let ids: HashMap<&str, String> = data
            .nodes
            .keys()
            .enumerate()
            .map(|(i, id)| (id.as_str(), format!("n{}", i)))
            .collect();

        writeln!(writer, "graph LR")?;
        for (id, short) in data.nodes.keys().filter_map(|id| ids.get(id.as_str()).map(|s| (id, s))) {
            writeln!(writer, "  {}[\"{}\"]", short, label(id))?;
        }

        for (from, module) in &data.nodes {
            let Some(from_id) = ids.get(from.as_str()) else {
                continue;
            };
            for to in &module.imports {
                let Some(to_id) = ids.get(to.as_str()) else {
                    continue;
                };
                let arrow = if data.is_cycle_edge(from, to) { "-.->" } else { "-->" };
                writeln!(writer, "  {} {} {}", from_id, arrow, to_id)?;
            }
        }

        if !in_cycle.is_empty() {
            writeln!(writer, "  classDef cycle stroke:#d33,stroke-width:2px")?;
            let members: Vec<&str> = in_cycle
                .iter()
                .filter_map(|id| ids.get(id).map(String::as_str))
                .collect();
            writeln!(writer, "  class {} cycle", members.join(","))?;
        }

        Ok(())
    }
}
