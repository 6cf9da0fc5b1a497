//! Module import graph built on petgraph.
//!
//! Nodes are modules identified by their root-relative id (`./src/app.ts`)
//! or, for package imports, by the bare specifier. Edges point from the
//! importing module to the imported one.

use std::collections::{BTreeMap, HashMap};
use std::path::{Path, PathBuf};

use petgraph::graph::{DiGraph, NodeIndex};
use petgraph::Direction;

use super::cycles::ModuleImports;
use crate::project::ProjectSnapshot;
use crate::resolve::{paths::to_slash, Resolution};

/// A module in the import graph.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct ModuleNode {
    pub id: String,
    /// Absolute path for project files; `None` for packages.
    pub path: Option<PathBuf>,
}

impl ModuleNode {
    pub fn is_external(&self) -> bool {
        self.path.is_none()
    }
}

/// Which imports become edges.
#[derive(Debug, Clone, Copy, Default)]
pub struct GraphOptions {
    /// Add package imports as nodes.
    pub include_node_modules: bool,
    /// Add `import type` edges.
    pub include_type_only: bool,
}

/// Root-relative id of a project file, for example `./src/app.ts`.
pub fn module_id(root: &Path, path: &Path) -> String {
    match path.strip_prefix(root) {
        Ok(rest) => format!("./{}", to_slash(rest)),
        Err(_) => to_slash(path),
    }
}

/// Directed graph of module imports.
///
/// # Example
///
/// ```rust
/// use pathwright::graph::ImportGraph;
///
/// let mut graph = ImportGraph::new();
/// graph.add_module("./src/app.ts", None);
/// graph.add_module("./src/math.ts", None);
/// graph.add_import("./src/app.ts", "./src/math.ts");
///
/// assert_eq!(graph.node_count(), 2);
/// assert_eq!(graph.dependencies("./src/app.ts")[0].id, "./src/math.ts");
/// ```
#[derive(Debug, Clone, Default)]
pub struct ImportGraph {
    graph: DiGraph<ModuleNode, ()>,
    node_indices: HashMap<String, NodeIndex>,
}

impl ImportGraph {
    pub fn new() -> Self {
        Self::default()
    }

    /// Build the graph of every file in a project snapshot.
    ///
    /// Relative imports that do not resolve are left out.
    pub fn from_project(project: &ProjectSnapshot, options: GraphOptions) -> Self {
        let root = project.root();
        let resolver = project.resolver();
        let mut graph = Self::new();

        for file in project.files() {
            graph.add_module(&module_id(root, file.path()), Some(file.path().to_path_buf()));
        }

        for file in project.files() {
            let from = module_id(root, file.path());

            let specifiers = file
                .imports()
                .iter()
                .map(|i| (i.specifier.as_str(), i.is_type_only))
                .chain(
                    file.exports()
                        .iter()
                        .filter_map(|e| e.specifier.as_deref().map(|s| (s, e.is_type_only))),
                );

            for (specifier, is_type_only) in specifiers {
                if is_type_only && !options.include_type_only {
                    continue;
                }
                match resolver.resolve(file.path(), specifier) {
                    Resolution::Resolved(resolved) => {
                        let to = module_id(root, &resolved.path);
                        if !graph.contains(&to) {
                            graph.add_module(&to, Some(resolved.path.clone()));
                        }
                        graph.add_import(&from, &to);
                    }
                    Resolution::External if options.include_node_modules => {
                        graph.add_module(specifier, None);
                        graph.add_import(&from, specifier);
                    }
                    Resolution::External => {}
                    Resolution::Unresolved { .. } => {
                        tracing::debug!(
                            file = %file.path().display(),
                            specifier,
                            "Unresolved import left out of graph"
                        );
                    }
                }
            }
        }

        tracing::debug!(
            nodes = graph.node_count(),
            edges = graph.edge_count(),
            "Built import graph"
        );
        graph
    }

    /// Adds a module, returning the existing index if the id is known.
    pub fn add_module(&mut self, id: &str, path: Option<PathBuf>) -> NodeIndex {
        if let Some(&idx) = self.node_indices.get(id) {
            return idx;
        }

        let idx = self.graph.add_node(ModuleNode {
            id: id.to_string(),
            path,
        });
        self.node_indices.insert(id.to_string(), idx);
        idx
    }

    /// Adds an import edge between two known modules.
    ///
    /// Repeated imports share one edge.
    ///
    /// # Returns
    ///
    /// `true` if the edge exists afterwards, `false` if either node is unknown.
    pub fn add_import(&mut self, from: &str, to: &str) -> bool {
        let (Some(&from_idx), Some(&to_idx)) = (self.node_indices.get(from), self.node_indices.get(to))
        else {
            return false;
        };

        if self.graph.find_edge(from_idx, to_idx).is_none() {
            self.graph.add_edge(from_idx, to_idx, ());
        }
        true
    }

    /// Modules imported by `id`, sorted by id.
    pub fn dependencies(&self, id: &str) -> Vec<&ModuleNode> {
        let Some(&idx) = self.node_indices.get(id) else {
            return Vec::new();
        };

        let mut nodes: Vec<&ModuleNode> = self
            .graph
            .neighbors_directed(idx, Direction::Outgoing)
            .filter_map(|other| self.graph.node_weight(other))
            .collect();
        nodes.sort_by(|a, b| a.id.cmp(&b.id));
        nodes
    }

    /// The id-keyed adjacency map the cycle detector and renderers consume.
    pub fn to_module_map(&self) -> BTreeMap<String, ModuleImports> {
        self.graph
            .node_weights()
            .map(|node| {
                let imports = self
                    .dependencies(&node.id)
                    .into_iter()
                    .map(|n| n.id.clone())
                    .collect();
                (node.id.clone(), ModuleImports::new(imports))
            })
            .collect()
    }

    pub fn node_count(&self) -> usize {
        self.graph.node_count()
    }

    pub fn edge_count(&self) -> usize {
        self.graph.edge_count()
    }

    pub fn is_empty(&self) -> bool {
        self.graph.node_count() == 0
    }

    pub fn contains(&self, id: &str) -> bool {
        self.node_indices.contains_key(id)
    }
}
