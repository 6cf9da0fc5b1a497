//! JSON export implementation.
//!
//! Produces `{ "nodes": { id: { "imports": [...] } }, "circularDependencies": [...] }`.

use super::{ExportData, Exporter};
use crate::graph::{Cycle, ModuleImports};
use serde::Serialize;
use std::collections::BTreeMap;
use std::io::{self, Write};

/// JSON exporter implementation.
pub struct JsonExporter;

/// Root JSON export structure.
#[derive(Serialize)]
#[serde(rename_all = "camelCase")]
struct JsonExport<'a> {
    nodes: &'a BTreeMap<String, ModuleImports>,
    circular_dependencies: &'a [Cycle],
}

impl Exporter for JsonExporter {
    fn export<W: Write>(&self, data: &ExportData, writer: &mut W) -> io::Result<()> {
        let export = JsonExport {
            nodes: &data.nodes,
            circular_dependencies: &data.cycles,
        };

        serde_json::to_writer_pretty(&mut *writer, &export)
            .map_err(|e| io::Error::new(io::ErrorKind::Other, e))?;
        writeln!(writer)?;
        Ok(())
    }
}
