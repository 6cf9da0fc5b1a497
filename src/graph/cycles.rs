//! Circular import detection.
//!
//! A single depth-first pass over a node map using an explicit stack in
//! place of recursion, so very deep import chains cannot overflow the call
//! stack. Each time the walk reaches a module that is still on the current
//! path, the path suffix starting at that module is reported as a cycle.
//!
//! The pass is linear in nodes plus edges and reports at most one cycle per
//! re-entry point. Graphs with overlapping cycles through already finished
//! modules are therefore not fully enumerated.

use std::collections::{BTreeMap, HashSet};
use std::fmt;

use serde::Serialize;

/// Outgoing imports of one module, by node id.
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize)]
pub struct ModuleImports {
    pub imports: Vec<String>,
}

impl ModuleImports {
    pub fn new(imports: Vec<String>) -> Self {
        Self { imports }
    }
}

/// How serious a cycle is.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize)]
#[serde(rename_all = "lowercase")]
pub enum CycleSeverity {
    Warning,
    Error,
}

impl fmt::Display for CycleSeverity {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            CycleSeverity::Warning => write!(f, "warning"),
            CycleSeverity::Error => write!(f, "error"),
        }
    }
}

/// A closed walk through the import graph.
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct Cycle {
    /// Node ids; the first id is repeated at the end.
    pub path: Vec<String>,
    pub severity: CycleSeverity,
}

impl Cycle {
    /// Build a cycle from a closed path, grading it by size.
    pub fn from_path(path: Vec<String>) -> Self {
        let distinct = path.len().saturating_sub(1);
        let severity = if distinct > 3 {
            CycleSeverity::Error
        } else {
            CycleSeverity::Warning
        };
        Self { path, severity }
    }

    /// Number of distinct modules in the cycle.
    pub fn len(&self) -> usize {
        self.path.len().saturating_sub(1)
    }

    pub fn is_empty(&self) -> bool {
        self.len() == 0
    }

    /// For example: "./a -> ./b -> ./a"
    pub fn cycle_path(&self) -> String {
        self.path.join(" -> ")
    }
}

/// Returns true if an edge stays inside the project.
fn is_local(id: &str) -> bool {
    id.starts_with('.')
}

/// Find circular imports in a node map.
///
/// Only edges whose target id starts with `.` are followed. Start nodes are
/// taken in key order, so the result is deterministic.
///
/// # Example
///
/// ```rust
/// use std::collections::BTreeMap;
/// use pathwright::graph::{detect_cycles, CycleSeverity, ModuleImports};
///
/// let mut nodes = BTreeMap::new();
/// nodes.insert("./a".to_string(), ModuleImports::new(vec!["./b".to_string()]));
/// nodes.insert("./b".to_string(), ModuleImports::new(vec!["./a".to_string()]));
///
/// let cycles = detect_cycles(&nodes);
/// assert_eq!(cycles.len(), 1);
/// assert_eq!(cycles[0].path, vec!["./a", "./b", "./a"]);
/// assert_eq!(cycles[0].severity, CycleSeverity::Warning);
/// ```
pub fn detect_cycles(nodes: &BTreeMap<String, ModuleImports>) -> Vec<Cycle> {
    let mut cycles = Vec::new();
    let mut visited: HashSet<&str> = HashSet::new();

    for start in nodes.keys() {
        if visited.contains(start.as_str()) {
            continue;
        }

        // (node, index of the next edge to follow)
        let mut stack: Vec<(&str, usize)> = vec![(start.as_str(), 0)];
        let mut on_stack: HashSet<&str> = HashSet::from([start.as_str()]);

        while let Some(frame) = stack.last_mut() {
            let (node, next_edge) = *frame;
            let edges = nodes
                .get(node)
                .map(|m| m.imports.as_slice())
                .unwrap_or_default();

            let Some(target) = edges.get(next_edge) else {
                stack.pop();
                on_stack.remove(node);
                visited.insert(node);
                continue;
            };
            frame.1 += 1;

            let target = target.as_str();
            if !is_local(target) {
                continue;
            }

            if on_stack.contains(target) {
                if let Some(pos) = stack.iter().position(|(id, _)| *id == target) {
                    let mut path: Vec<String> =
                        stack[pos..].iter().map(|(id, _)| id.to_string()).collect();
                    path.push(target.to_string());
                    cycles.push(Cycle::from_path(path));
                }
            } else if !visited.contains(target) {
                on_stack.insert(target);
                stack.push((target, 0));
            }
        }
    }

    if !cycles.is_empty() {
        tracing::debug!(count = cycles.len(), "Detected circular imports");
    }
    cycles
}

#[cfg(test)]
mod tests {
    use super::*;

    fn graph(edges: &[(&str, &[&str])]) -> BTreeMap<String, ModuleImports> {
        edges
            .iter()
            .map(|(id, imports)| {
                (
                    id.to_string(),
                    ModuleImports::new(imports.iter().map(|s| s.to_string()).collect()),
                )
            })
            .collect()
    }

    // ===== Basic Detection =====

    #[test]
    fn test_acyclic_graph() {
        let nodes = graph(&[("./a", &["./b", "./c"]), ("./b", &["./c"]), ("./c", &[])]);
        assert!(detect_cycles(&nodes).is_empty());
    }

    #[test]
    fn test_three_node_cycle_is_warning() {
        let nodes = graph(&[("./a", &["./b"]), ("./b", &["./c"]), ("./c", &["./a"])]);
        let cycles = detect_cycles(&nodes);

        assert_eq!(cycles.len(), 1);
        assert_eq!(cycles[0].path, vec!["./a", "./b", "./c", "./a"]);
        assert_eq!(cycles[0].severity, CycleSeverity::Warning);
        assert_eq!(cycles[0].len(), 3);
    }

    #[test]
    fn test_four_node_cycle_is_error() {
        let nodes = graph(&[
            ("./a", &["./b"]),
            ("./b", &["./c"]),
            ("./c", &["./d"]),
            ("./d", &["./a"]),
        ]);
        let cycles = detect_cycles(&nodes);

        assert_eq!(cycles.len(), 1);
        assert_eq!(cycles[0].severity, CycleSeverity::Error);
        assert_eq!(cycles[0].cycle_path(), "./a -> ./b -> ./c -> ./d -> ./a");
    }

    #[test]
    fn test_self_import() {
        let nodes = graph(&[("./a", &["./a"])]);
        let cycles = detect_cycles(&nodes);

        assert_eq!(cycles.len(), 1);
        assert_eq!(cycles[0].path, vec!["./a", "./a"]);
    }

    #[test]
    fn test_cycle_starting_mid_path() {
        let nodes = graph(&[("./entry", &["./a"]), ("./a", &["./b"]), ("./b", &["./a"])]);
        let cycles = detect_cycles(&nodes);

        assert_eq!(cycles.len(), 1);
        assert_eq!(cycles[0].path, vec!["./a", "./b", "./a"]);
    }

    // ===== Edge Filtering =====

    #[test]
    fn test_external_edges_not_followed() {
        let nodes = graph(&[("./a", &["react"]), ("react", &["./a"])]);
        assert!(detect_cycles(&nodes).is_empty());
    }

    #[test]
    fn test_edges_to_unknown_nodes() {
        let nodes = graph(&[("./a", &["./missing"])]);
        assert!(detect_cycles(&nodes).is_empty());
    }

    // ===== Known Limitation =====

    #[test]
    fn test_overlapping_cycles_report_once_per_reentry() {
        // a -> b -> a and a -> c -> b -> a share b; once b is finished,
        // the second cycle through it is not reported again.
        let nodes = graph(&[("./a", &["./b", "./c"]), ("./b", &["./a"]), ("./c", &["./b"])]);
        let cycles = detect_cycles(&nodes);

        assert_eq!(cycles.len(), 1);
        assert_eq!(cycles[0].path, vec!["./a", "./b", "./a"]);
    }

    #[test]
    fn test_deep_chain_does_not_overflow() {
        let count = 50_000;
        let nodes: BTreeMap<String, ModuleImports> = (0..count)
            .map(|i| {
                let next = format!("./m{}", (i + 1) % count);
                (format!("./m{}", i), ModuleImports::new(vec![next]))
            })
            .collect();

        let cycles = detect_cycles(&nodes);
        assert_eq!(cycles.len(), 1);
        assert_eq!(cycles[0].len(), count);
        assert_eq!(cycles[0].severity, CycleSeverity::Error);
    }

    #[test]
    fn test_cycle_serializes() {
        let cycle = Cycle::from_path(vec!["./a".into(), "./b".into(), "./a".into()]);
        let json = serde_json::to_value(&cycle).unwrap();
        assert_eq!(json["severity"], "warning");
        assert_eq!(json["path"][2], "./a");
    }
}
