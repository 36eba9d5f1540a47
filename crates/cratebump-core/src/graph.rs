//! Local dependency graph: flattening and processing order

use std::collections::{BTreeSet, HashMap, HashSet};

use serde::{Deserialize, Serialize};
use tracing::{debug, info};

use crate::config::GraphConfig;
use crate::error::{BumpError, Result};
use crate::types::{DependencyKind, Package};

/// A node in the dependency graph
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct PackageNode {
    /// Package name
    pub name: String,
    /// Package version
    pub version: String,
    /// Local packages this package depends on directly
    pub dependencies: Vec<String>,
    /// Local packages that depend on this package directly
    pub dependents: Vec<String>,
    /// Depth in the dependency tree (0 = no local dependencies)
    pub depth: usize,
}

/// Dependency graph for the local packages of a workspace
#[derive(Debug, Clone)]
pub struct DependencyGraph {
    /// Nodes indexed by package name
    nodes: HashMap<String, PackageNode>,
    /// Transitive local dependencies of every package
    flattened: HashMap<String, BTreeSet<String>>,
    /// Topologically sorted order (dependencies before dependents)
    sorted_order: Vec<String>,
}

impl DependencyGraph {
    /// Build a dependency graph following every dependency kind
    pub fn build(packages: &[Package]) -> Result<Self> {
        Self::build_with(packages, &GraphConfig::default())
    }

    /// Build a dependency graph.
    ///
    /// Edges are only recorded towards other packages of `packages`; the
    /// input order is irrelevant to the flattened sets and only breaks ties
    /// between unrelated packages in the processing order.
    pub fn build_with(packages: &[Package], config: &GraphConfig) -> Result<Self> {
        let mut local: HashSet<&str> = HashSet::with_capacity(packages.len());
        if let Some(duplicate) = packages.iter().find(|p| !local.insert(p.name.as_str())) {
            return Err(BumpError::discovery(format!(
                "package '{}' appears more than once in the workspace",
                duplicate.name
            )));
        }
        let mut nodes: HashMap<String, PackageNode> = HashMap::with_capacity(packages.len());
        let discovery_order: Vec<String> = packages.iter().map(|p| p.name.clone()).collect();

        for pkg in packages {
            let mut dependencies: Vec<String> = Vec::new();
            for dep in &pkg.dependencies {
                if dep.kind == DependencyKind::Dev && !config.include_dev_dependencies {
                    continue;
                }
                if dep.name == pkg.name || !local.contains(dep.name.as_str()) {
                    continue;
                }
                if !dependencies.contains(&dep.name) {
                    dependencies.push(dep.name.clone());
                }
            }
            nodes.insert(
                pkg.name.clone(),
                PackageNode {
                    name: pkg.name.clone(),
                    version: pkg.version.clone(),
                    dependencies,
                    dependents: Vec::new(),
                    depth: 0,
                },
            );
        }

        // Reverse edges, in discovery order so dependents lists are stable
        for name in &discovery_order {
            let deps = nodes
                .get(name)
                .map(|n| n.dependencies.clone())
                .unwrap_or_default();
            for dep in deps {
                if let Some(dep_node) = nodes.get_mut(&dep) {
                    dep_node.dependents.push(name.clone());
                }
            }
        }

        let flattened = Self::flatten(&nodes, &discovery_order);
        let sorted_order = Self::topological_sort(&nodes, &discovery_order)?;

        for name in &sorted_order {
            let depth = nodes
                .get(name)
                .map(|node| {
                    node.dependencies
                        .iter()
                        .filter_map(|dep| nodes.get(dep))
                        .map(|n| n.depth + 1)
                        .max()
                        .unwrap_or(0)
                })
                .unwrap_or(0);
            if let Some(node) = nodes.get_mut(name) {
                node.depth = depth;
            }
        }

        info!(
            packages = nodes.len(),
            edges = nodes.values().map(|n| n.dependencies.len()).sum::<usize>(),
            "built dependency graph"
        );

        Ok(Self {
            nodes,
            flattened,
            sorted_order,
        })
    }

    /// Transitive closure of the direct edges, one memoized DFS per node
    fn flatten(
        nodes: &HashMap<String, PackageNode>,
        order: &[String],
    ) -> HashMap<String, BTreeSet<String>> {
        fn visit(
            name: &str,
            nodes: &HashMap<String, PackageNode>,
            memo: &mut HashMap<String, BTreeSet<String>>,
            visiting: &mut HashSet<String>,
        ) -> BTreeSet<String> {
            if let Some(done) = memo.get(name) {
                return done.clone();
            }
            // Back edge; the cycle is reported by the sort
            if !visiting.insert(name.to_string()) {
                return BTreeSet::new();
            }

            let mut reachable = BTreeSet::new();
            if let Some(node) = nodes.get(name) {
                for dep in &node.dependencies {
                    reachable.insert(dep.clone());
                    reachable.extend(visit(dep, nodes, memo, visiting));
                }
            }

            visiting.remove(name);
            memo.insert(name.to_string(), reachable.clone());
            reachable
        }

        let mut memo = HashMap::with_capacity(nodes.len());
        let mut visiting = HashSet::new();
        for name in order {
            let reachable = visit(name, nodes, &mut memo, &mut visiting);
            debug!(package = %name, flattened = ?reachable, "flattened dependencies");
        }
        memo
    }

    /// Kahn's algorithm. Among packages that are ready at the same time the
    /// one discovered first goes first.
    fn topological_sort(
        nodes: &HashMap<String, PackageNode>,
        discovery_order: &[String],
    ) -> Result<Vec<String>> {
        let index: HashMap<&str, usize> = discovery_order
            .iter()
            .enumerate()
            .map(|(i, name)| (name.as_str(), i))
            .collect();
        let mut in_degree: HashMap<&str, usize> = HashMap::with_capacity(nodes.len());
        let mut ready: BTreeSet<usize> = BTreeSet::new();
        let mut sorted: Vec<String> = Vec::with_capacity(nodes.len());

        for (i, name) in discovery_order.iter().enumerate() {
            let degree = nodes.get(name).map(|n| n.dependencies.len()).unwrap_or(0);
            in_degree.insert(name.as_str(), degree);
            if degree == 0 {
                ready.insert(i);
            }
        }

        while let Some(i) = ready.pop_first() {
            let name = &discovery_order[i];
            sorted.push(name.clone());

            if let Some(node) = nodes.get(name) {
                for dependent in &node.dependents {
                    if let Some(degree) = in_degree.get_mut(dependent.as_str()) {
                        *degree = degree.saturating_sub(1);
                        if *degree == 0 {
                            ready.insert(index[dependent.as_str()]);
                        }
                    }
                }
            }
        }

        if sorted.len() != nodes.len() {
            let in_sorted: HashSet<&String> = sorted.iter().collect();
            let cyclic_nodes: Vec<String> = discovery_order
                .iter()
                .filter(|n| !in_sorted.contains(n))
                .cloned()
                .collect();

            let mut cycles: Vec<Vec<String>> = Vec::new();
            for start in &cyclic_nodes {
                if let Some(cycle) = Self::find_cycle(nodes, start, &cyclic_nodes) {
                    let members = &cycle[..cycle.len() - 1];
                    if !cycles.iter().any(|c| {
                        c.len() == cycle.len() && members.iter().all(|n| c.contains(n))
                    }) {
                        cycles.push(cycle);
                    }
                }
            }
            return Err(BumpError::CyclicDependency(cycles));
        }

        Ok(sorted)
    }

    /// Find a cycle through `start`, returned closed (`a, b, a`)
    fn find_cycle(
        nodes: &HashMap<String, PackageNode>,
        start: &str,
        cyclic_nodes: &[String],
    ) -> Option<Vec<String>> {
        fn dfs(
            nodes: &HashMap<String, PackageNode>,
            current: &str,
            start: &str,
            visited: &mut HashSet<String>,
            path: &mut Vec<String>,
            cyclic_nodes: &[String],
        ) -> bool {
            if visited.contains(current) {
                return current == start && !path.is_empty();
            }

            if !cyclic_nodes.iter().any(|n| n == current) {
                return false;
            }

            visited.insert(current.to_string());
            path.push(current.to_string());

            if let Some(node) = nodes.get(current) {
                for dep in &node.dependencies {
                    if dfs(nodes, dep, start, visited, path, cyclic_nodes) {
                        return true;
                    }
                }
            }

            path.pop();
            false
        }

        let mut visited: HashSet<String> = HashSet::new();
        let mut path: Vec<String> = Vec::new();

        if dfs(nodes, start, start, &mut visited, &mut path, cyclic_nodes) {
            path.push(start.to_string());
            Some(path)
        } else {
            None
        }
    }

    /// Get packages in processing order (dependencies first)
    pub fn sorted(&self) -> &[String] {
        &self.sorted_order
    }

    /// Order `packages` for processing
    pub fn sort_packages<'a>(&self, packages: &'a [Package]) -> Vec<&'a Package> {
        let by_name: HashMap<&str, &Package> =
            packages.iter().map(|p| (p.name.as_str(), p)).collect();
        self.sorted_order
            .iter()
            .filter_map(|name| by_name.get(name.as_str()).copied())
            .collect()
    }

    /// Transitive local dependencies of a package
    pub fn flattened(&self, name: &str) -> Option<&BTreeSet<String>> {
        self.flattened.get(name)
    }

    /// Whether `package` depends on `dependency`, directly or not
    pub fn depends_on(&self, package: &str, dependency: &str) -> bool {
        self.flattened
            .get(package)
            .is_some_and(|deps| deps.contains(dependency))
    }

    /// Get a package node
    pub fn get(&self, name: &str) -> Option<&PackageNode> {
        self.nodes.get(name)
    }

    /// Get the direct dependents of a package
    pub fn get_dependents(&self, name: &str) -> &[String] {
        self.nodes
            .get(name)
            .map(|n| n.dependents.as_slice())
            .unwrap_or_default()
    }

    /// Get the maximum depth of the dependency tree
    pub fn max_depth(&self) -> usize {
        self.nodes.values().map(|n| n.depth).max().unwrap_or(0)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::types::Dependency;

    fn pkg(name: &str, deps: &[&str]) -> Package {
        deps.iter().fold(
            Package::new(name, "1.0.0", format!("/ws/{}/Cargo.toml", name)),
            |p, d| p.with_dependency(Dependency::new(*d).with_path(format!("/ws/{}", d))),
        )
    }

    fn create_packages() -> Vec<Package> {
        vec![
            pkg("core", &[]),
            pkg("utils", &["core"]),
            pkg("cli", &["core", "utils"]),
        ]
    }

    fn names(set: &BTreeSet<String>) -> Vec<&str> {
        set.iter().map(String::as_str).collect()
    }

    fn position(order: &[String], name: &str) -> usize {
        order.iter().position(|n| n == name).unwrap()
    }

    /// All orderings of `items`
    fn permutations<T: Clone>(items: &[T]) -> Vec<Vec<T>> {
        if items.len() <= 1 {
            return vec![items.to_vec()];
        }
        let mut out = Vec::new();
        for i in 0..items.len() {
            let mut rest = items.to_vec();
            let head = rest.remove(i);
            for mut tail in permutations(&rest) {
                tail.insert(0, head.clone());
                out.push(tail);
            }
        }
        out
    }

    #[test]
    fn test_build_graph() {
        let graph = DependencyGraph::build(&create_packages()).unwrap();
        assert_eq!(graph.sorted().len(), 3);
        assert_eq!(names(graph.flattened("cli").unwrap()), vec!["core", "utils"]);
        assert!(graph.flattened("core").unwrap().is_empty());
    }

    #[test]
    fn test_topological_order() {
        let graph = DependencyGraph::build(&create_packages()).unwrap();
        let sorted = graph.sorted();

        assert!(position(sorted, "core") < position(sorted, "utils"));
        assert!(position(sorted, "utils") < position(sorted, "cli"));
        assert_eq!(sorted, ["core", "utils", "cli"]);
    }

    #[test]
    fn test_flattening_is_order_independent() {
        // d -> c -> b -> a, plus e -> d; closure needs several rounds when
        // dependents are discovered before their dependencies.
        let packages = vec![
            pkg("e", &["d"]),
            pkg("d", &["c"]),
            pkg("c", &["b"]),
            pkg("b", &["a"]),
            pkg("a", &[]),
        ];
        let baseline = DependencyGraph::build(&packages).unwrap();
        assert_eq!(names(baseline.flattened("e").unwrap()), vec!["a", "b", "c", "d"]);

        for permutation in permutations(&packages) {
            let graph = DependencyGraph::build(&permutation).unwrap();
            for package in &packages {
                assert_eq!(
                    graph.flattened(&package.name),
                    baseline.flattened(&package.name)
                );
            }
        }
    }

    #[test]
    fn test_order_respects_flattened_sets_under_permutation() {
        let packages = vec![
            pkg("app", &["http", "db"]),
            pkg("http", &["core"]),
            pkg("db", &["core", "macros"]),
            pkg("core", &["macros"]),
            pkg("macros", &[]),
            pkg("standalone", &[]),
        ];

        for permutation in permutations(&packages) {
            let graph = DependencyGraph::build(&permutation).unwrap();
            let sorted = graph.sorted();
            assert_eq!(sorted.len(), packages.len());
            for name in sorted {
                for dep in graph.flattened(name).unwrap() {
                    assert!(
                        position(sorted, dep) < position(sorted, name),
                        "{} must precede {} in {:?}",
                        dep,
                        name,
                        sorted
                    );
                }
            }
        }
    }

    #[test]
    fn test_unrelated_packages_keep_discovery_order() {
        let packages = vec![pkg("zeta", &[]), pkg("alpha", &[]), pkg("mid", &[])];
        let graph = DependencyGraph::build(&packages).unwrap();
        assert_eq!(graph.sorted(), ["zeta", "alpha", "mid"]);
    }

    #[test]
    fn test_diamond() {
        let packages = vec![
            pkg("top", &["left", "right"]),
            pkg("left", &["base"]),
            pkg("right", &["base"]),
            pkg("base", &[]),
        ];
        let graph = DependencyGraph::build(&packages).unwrap();
        assert_eq!(graph.sorted(), ["base", "left", "right", "top"]);
        assert_eq!(names(graph.flattened("top").unwrap()), vec!["base", "left", "right"]);
        assert_eq!(graph.get_dependents("base"), ["left", "right"]);
        assert_eq!(graph.get("top").unwrap().depth, 2);
        assert_eq!(graph.max_depth(), 2);
    }

    #[test]
    fn test_sort_packages() {
        let packages = vec![pkg("cli", &["core"]), pkg("core", &[])];
        let graph = DependencyGraph::build(&packages).unwrap();
        let sorted: Vec<&str> = graph
            .sort_packages(&packages)
            .iter()
            .map(|p| p.name.as_str())
            .collect();
        assert_eq!(sorted, vec!["core", "cli"]);
    }

    #[test]
    fn test_non_local_dependencies_ignored() {
        let packages = vec![pkg("cli", &["serde", "core"]), pkg("core", &[])];
        let graph = DependencyGraph::build(&packages).unwrap();
        assert_eq!(names(graph.flattened("cli").unwrap()), vec!["core"]);
        assert!(graph.depends_on("cli", "core"));
        assert!(!graph.depends_on("core", "cli"));
    }

    #[test]
    fn test_duplicate_names_rejected() {
        let packages = vec![pkg("a", &[]), pkg("b", &["a"]), pkg("a", &[])];
        match DependencyGraph::build(&packages) {
            Err(BumpError::Discovery(message)) => assert!(message.contains("'a'")),
            Err(other) => panic!("unexpected error: {}", other),
            Ok(_) => panic!("duplicate names were accepted"),
        }
    }

    #[test]
    fn test_cycle_detection() {
        let packages = vec![pkg("a", &["b"]), pkg("b", &["c"]), pkg("c", &["a"])];
        let err = DependencyGraph::build(&packages).unwrap_err();
        match err {
            BumpError::CyclicDependency(cycles) => {
                assert_eq!(cycles.len(), 1);
                assert_eq!(cycles[0], vec!["a", "b", "c", "a"]);
            }
            other => panic!("unexpected error: {}", other),
        }
    }

    #[test]
    fn test_dev_dependency_cycle_can_be_excluded() {
        let packages = vec![
            pkg("lib", &[]).with_dependency(
                Dependency::new("testkit")
                    .with_path("/ws/testkit")
                    .with_kind(DependencyKind::Dev),
            ),
            pkg("testkit", &["lib"]),
        ];
        assert!(DependencyGraph::build(&packages).is_err());

        let config = GraphConfig {
            include_dev_dependencies: false,
        };
        let graph = DependencyGraph::build_with(&packages, &config).unwrap();
        assert_eq!(graph.sorted(), ["lib", "testkit"]);
        assert!(!graph.depends_on("lib", "testkit"));
    }

    #[test]
    fn test_duplicate_edges_collapse() {
        let packages = vec![
            pkg("cli", &["core"]).with_dependency(
                Dependency::new("core")
                    .with_path("/ws/core")
                    .with_kind(DependencyKind::Build),
            ),
            pkg("core", &[]),
        ];
        let graph = DependencyGraph::build(&packages).unwrap();
        assert_eq!(graph.get("cli").unwrap().dependencies, vec!["core"]);
        assert_eq!(graph.get_dependents("core"), ["cli"]);
    }
}
