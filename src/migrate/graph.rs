//! Project dependency graph.
//!
//! Nodes are absolute file paths; edges are resolved relative imports.
//! Cycles are detected with a coloured depth-first search and reported,
//! never treated as errors. The topological sort is Kahn's algorithm
//! with a lexicographic tie-breaker, so the conversion order is fully
//! deterministic; cycles are broken by lexicographic choice.

use std::collections::{BTreeMap, BTreeSet};
use std::path::{Path, PathBuf};

use super::imports::extract_import_specifiers;

/// Extensions tried when a relative specifier omits one.
const RESOLVE_EXTENSIONS: &[&str] = &["js", "jsx", "ts", "tsx", "mjs", "cjs", "json"];

#[derive(Debug, Default)]
pub struct DependencyGraph {
    pub nodes: BTreeSet<PathBuf>,
    pub edges: BTreeMap<PathBuf, Vec<PathBuf>>,
    pub cycles: Vec<Vec<PathBuf>>,
}

/// Warnings produced while building (unresolved imports).
pub struct GraphBuild {
    pub graph: DependencyGraph,
    pub warnings: Vec<String>,
}

/// Resolve a relative specifier against the importing file's directory:
/// direct hit, then known extensions, then `index.*` in the directory.
pub fn resolve_relative(importing_file: &Path, specifier: &str) -> Option<PathBuf> {
    let dir = importing_file.parent()?;
    let joined = normalize_path(&dir.join(specifier));

    if joined.is_file() {
        return Some(joined);
    }
    for ext in RESOLVE_EXTENSIONS {
        let with_ext = joined.with_file_name(format!(
            "{}.{ext}",
            joined.file_name()?.to_string_lossy()
        ));
        if with_ext.is_file() {
            return Some(with_ext);
        }
    }
    if joined.is_dir() {
        for ext in RESOLVE_EXTENSIONS {
            let index = joined.join(format!("index.{ext}"));
            if index.is_file() {
                return Some(index);
            }
        }
    }
    None
}

/// Lexically remove `.` and `..` segments.
fn normalize_path(path: &Path) -> PathBuf {
    let mut out = PathBuf::new();
    for component in path.components() {
        match component {
            std::path::Component::CurDir => {}
            std::path::Component::ParentDir => {
                out.pop();
            }
            other => out.push(other.as_os_str()),
        }
    }
    out
}

/// Build the graph from files and their contents. Only JS-family files
/// carry extractable imports; everything else becomes an isolated node.
pub fn build_graph(files: &[(PathBuf, String)]) -> GraphBuild {
    let mut graph = DependencyGraph::default();
    let mut warnings = Vec::new();
    let known: BTreeSet<&Path> = files.iter().map(|(p, _)| p.as_path()).collect();

    for (path, content) in files {
        graph.nodes.insert(path.clone());
        let mut edges = Vec::new();
        if is_js_family(path) {
            for import in extract_import_specifiers(content) {
                if !import.is_relative() {
                    continue;
                }
                match resolve_relative(path, &import.specifier) {
                    Some(resolved) if known.contains(resolved.as_path()) => {
                        if !edges.contains(&resolved) {
                            edges.push(resolved);
                        }
                    }
                    Some(_) => {
                        // Resolves outside the scanned set; not an edge.
                    }
                    None => warnings.push(format!(
                        "unresolved import '{}' in {} (line {})",
                        import.specifier,
                        path.display(),
                        import.line
                    )),
                }
            }
        }
        graph.edges.insert(path.clone(), edges);
    }

    graph.cycles = find_cycles(&graph);
    GraphBuild { graph, warnings }
}

pub(crate) fn is_js_family(path: &Path) -> bool {
    matches!(
        path.extension().and_then(|e| e.to_str()),
        Some("js" | "jsx" | "ts" | "tsx" | "mjs" | "cjs")
    )
}

#[derive(Clone, Copy, PartialEq)]
enum Colour {
    White,
    Grey,
    Black,
}

/// Coloured DFS cycle detection. Each cycle is reported as the path
/// segment from the first revisited node.
fn find_cycles(graph: &DependencyGraph) -> Vec<Vec<PathBuf>> {
    let mut colour: BTreeMap<&Path, Colour> = graph
        .nodes
        .iter()
        .map(|n| (n.as_path(), Colour::White))
        .collect();
    let mut cycles = Vec::new();
    let mut stack: Vec<&Path> = Vec::new();

    fn visit<'a>(
        node: &'a Path,
        graph: &'a DependencyGraph,
        colour: &mut BTreeMap<&'a Path, Colour>,
        stack: &mut Vec<&'a Path>,
        cycles: &mut Vec<Vec<PathBuf>>,
    ) {
        colour.insert(node, Colour::Grey);
        stack.push(node);
        if let Some(edges) = graph.edges.get(node) {
            for next in edges {
                match colour.get(next.as_path()).copied().unwrap_or(Colour::White) {
                    Colour::White => visit(next, graph, colour, stack, cycles),
                    Colour::Grey => {
                        let start = stack
                            .iter()
                            .position(|p| *p == next.as_path())
                            .unwrap_or(0);
                        cycles.push(stack[start..].iter().map(|p| p.to_path_buf()).collect());
                    }
                    Colour::Black => {}
                }
            }
        }
        stack.pop();
        colour.insert(node, Colour::Black);
    }

    for node in &graph.nodes {
        if colour[node.as_path()] == Colour::White {
            visit(node, graph, &mut colour, &mut stack, &mut cycles);
        }
    }
    cycles
}

/// Kahn topological sort: dependencies come before dependents. Zero
/// in-degree ties break lexicographically; a cycle remainder is broken
/// by taking the lexicographically smallest node and continuing.
pub fn topo_sort(graph: &DependencyGraph) -> Vec<PathBuf> {
    let mut remaining_deps: BTreeMap<&Path, BTreeSet<&Path>> = BTreeMap::new();
    let mut dependents: BTreeMap<&Path, Vec<&Path>> = BTreeMap::new();
    for node in &graph.nodes {
        remaining_deps.insert(node.as_path(), BTreeSet::new());
    }
    for (node, edges) in &graph.edges {
        for dep in edges {
            remaining_deps
                .entry(node.as_path())
                .or_default()
                .insert(dep.as_path());
            dependents
                .entry(dep.as_path())
                .or_default()
                .push(node.as_path());
        }
    }

    // BTreeSet keeps the ready pool in lexicographic order.
    let mut ready: BTreeSet<&Path> = remaining_deps
        .iter()
        .filter(|(_, deps)| deps.is_empty())
        .map(|(node, _)| *node)
        .collect();
    let mut order: Vec<PathBuf> = Vec::with_capacity(graph.nodes.len());
    let mut done: BTreeSet<&Path> = BTreeSet::new();

    while order.len() < graph.nodes.len() {
        let next = match ready.iter().next().copied() {
            Some(next) => next,
            None => {
                // Cycle: pick the smallest unprocessed node and carry on.
                match remaining_deps
                    .iter()
                    .filter(|(node, _)| !done.contains(**node))
                    .map(|(node, _)| *node)
                    .next()
                {
                    Some(node) => node,
                    None => break,
                }
            }
        };
        ready.remove(next);
        done.insert(next);
        order.push(next.to_path_buf());
        if let Some(deps) = dependents.get(next) {
            for dependent in deps.clone() {
                if done.contains(dependent) {
                    continue;
                }
                if let Some(deps_left) = remaining_deps.get_mut(dependent) {
                    deps_left.remove(next);
                    if deps_left.is_empty() {
                        ready.insert(dependent);
                    }
                }
            }
        }
    }
    order
}

#[cfg(test)]
mod tests {
    use std::fs;

    use pretty_assertions::assert_eq;
    use tempfile::TempDir;

    use super::*;

    fn write(dir: &TempDir, rel: &str, content: &str) -> PathBuf {
        let path = dir.path().join(rel);
        if let Some(parent) = path.parent() {
            fs::create_dir_all(parent).unwrap();
        }
        fs::write(&path, content).unwrap();
        path
    }

    #[test]
    fn resolves_direct_extension_and_index_forms() {
        let dir = TempDir::new().unwrap();
        let helper = write(&dir, "helper.js", "export const x = 1;\n");
        let nested = write(&dir, "lib/index.ts", "export const y = 2;\n");
        let importer = write(&dir, "a.test.js", "");

        assert_eq!(
            resolve_relative(&importer, "./helper.js"),
            Some(helper.clone())
        );
        assert_eq!(resolve_relative(&importer, "./helper"), Some(helper));
        assert_eq!(resolve_relative(&importer, "./lib"), Some(nested));
        assert_eq!(resolve_relative(&importer, "./missing"), None);
    }

    #[test]
    fn topological_order_puts_dependencies_first() {
        let dir = TempDir::new().unwrap();
        let helper = write(&dir, "helper.js", "export const add = 1;\n");
        let test = write(
            &dir,
            "math.test.js",
            "import { add } from './helper.js';\n",
        );

        let files = vec![
            (test.clone(), fs::read_to_string(&test).unwrap()),
            (helper.clone(), fs::read_to_string(&helper).unwrap()),
        ];
        let build = build_graph(&files);
        assert!(build.warnings.is_empty());
        assert!(build.graph.cycles.is_empty());

        let order = topo_sort(&build.graph);
        assert_eq!(order, vec![helper, test]);
    }

    #[test]
    fn cycles_are_reported_not_fatal() {
        let dir = TempDir::new().unwrap();
        let a = write(&dir, "a.js", "import './b.js';\n");
        let b = write(&dir, "b.js", "import './a.js';\n");

        let files = vec![
            (a.clone(), fs::read_to_string(&a).unwrap()),
            (b.clone(), fs::read_to_string(&b).unwrap()),
        ];
        let build = build_graph(&files);
        assert_eq!(build.graph.cycles.len(), 1);

        // Every node still appears exactly once.
        let order = topo_sort(&build.graph);
        assert_eq!(order.len(), 2);
        let unique: BTreeSet<_> = order.iter().collect();
        assert_eq!(unique.len(), 2);
    }

    #[test]
    fn unresolved_imports_warn_but_keep_the_node() {
        let dir = TempDir::new().unwrap();
        let a = write(&dir, "a.js", "import './missing.js';\n");
        let files = vec![(a.clone(), fs::read_to_string(&a).unwrap())];
        let build = build_graph(&files);
        assert_eq!(build.warnings.len(), 1);
        assert!(build.warnings[0].contains("./missing.js"));
        assert!(build.graph.nodes.contains(&a));
        assert_eq!(build.graph.edges[&a], Vec::<PathBuf>::new());
    }

    #[test]
    fn zero_indegree_ties_break_lexicographically() {
        let dir = TempDir::new().unwrap();
        let c = write(&dir, "c.js", "");
        let a = write(&dir, "a.js", "");
        let b = write(&dir, "b.js", "");

        let files = vec![
            (c.clone(), String::new()),
            (a.clone(), String::new()),
            (b.clone(), String::new()),
        ];
        let build = build_graph(&files);
        let order = topo_sort(&build.graph);
        assert_eq!(order, vec![a, b, c]);
    }
}
