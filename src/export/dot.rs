//! Graphviz DOT export implementation.

use super::{ExportData, Exporter};
use std::io::{self, Write};

/// DOT exporter implementation.
pub struct DotExporter;

/// Quote a DOT identifier.
fn quote(id: &str) -> String {
    format!("\"{}\"", id.replace('\\', "\\\\").replace('"', "\\\""))
}

impl Exporter for DotExporter {
    fn export<W: Write>(&self, data: &ExportData, writer: &mut W) -> io::Result<()> {
        let in_cycle = data.nodes_in_cycles();

        writeln!(writer, "digraph imports {{")?;
        writeln!(writer, "  rankdir=LR;")?;
        writeln!(writer, "  node [shape=box, fontname=\"Helvetica\"];")?;

        for id in data.nodes.keys() {
            let mut attrs = Vec::new();
            if !id.starts_with('.') {
                attrs.push("style=dashed");
            }
            if in_cycle.contains(id.as_str()) {
                attrs.push("color=red");
            }
            if attrs.is_empty() {
                writeln!(writer, "  {};", quote(id))?;
            } else {
                writeln!(writer, "  {} [{}];", quote(id), attrs.join(", "))?;
            }
        }

        for (from, module) in &data.nodes {
            for to in &module.imports {
                if data.is_cycle_edge(from, to) {
                    writeln!(writer, "  {} -> {} [color=red];", quote(from), quote(to))?;
                } else {
                    writeln!(writer, "  {} -> {};", quote(from), quote(to))?;
                }
            }
        }

        writeln!(writer, "}}")?;
        Ok(())
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::export::sample_data;

    fn render() -> String {
        let mut output = Vec::new();
        DotExporter.export(&sample_data(), &mut output).unwrap();
        String::from_utf8(output).unwrap()
    }

    #[test]
    fn test_dot_structure() {
        let dot = render();
        assert!(dot.starts_with("digraph imports {"));
        assert!(dot.trim_end().ends_with('}'));
    }

    #[test]
    fn test_dot_edges() {
        let dot = render();
        assert!(dot.contains("  \"./a.ts\" -> \"./c.ts\";"));
        assert!(dot.contains("  \"./c.ts\" -> \"react\";"));
    }

    #[test]
    fn test_dot_marks_cycles_and_packages() {
        let dot = render();
        assert!(dot.contains("  \"./a.ts\" [color=red];"));
        assert!(dot.contains("  \"./b.ts\" -> \"./a.ts\" [color=red];"));
        assert!(dot.contains("  \"react\" [style=dashed];"));
    }

    #[test]
    fn test_quote_escapes() {
        assert_eq!(quote("a\"b"), "\"a\\\"b\"");
    }
}
