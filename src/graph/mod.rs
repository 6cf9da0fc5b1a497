//! Import graph modeling and circular import detection.
//!
//! [`ImportGraph`] holds module-to-module imports in a petgraph `DiGraph`.
//! [`detect_cycles`] works on the plain id-keyed map produced by
//! [`ImportGraph::to_module_map`], so it can also run on maps built elsewhere.
//!
//! # Example
//!
//! ```rust
//! use pathwright::graph::{detect_cycles, ImportGraph};
//!
//! let mut graph = ImportGraph::new();
//! graph.add_module("./a.ts", None);
//! graph.add_module("./b.ts", None);
//! graph.add_import("./a.ts", "./b.ts");
//! graph.add_import("./b.ts", "./a.ts");
//!
//! let cycles = detect_cycles(&graph.to_module_map());
//! assert_eq!(cycles.len(), 1);
//! ```

mod cycles;
mod import_graph;

pub use cycles::{detect_cycles, Cycle, CycleSeverity, ModuleImports};
pub use import_graph::{module_id, GraphOptions, ImportGraph, ModuleNode};
