// Module import graph
//
// Directed graph of generated modules, with an edge for every deferred
// import. Used to report groups of modules that import each other.

use crate::model::CollectedModule;
use crate::modulepath::ModulePath;
use petgraph::algo::tarjan_scc;
use petgraph::graph::{DiGraph, NodeIndex};
use std::collections::{BTreeMap, HashMap};

pub struct ImportGraph {
    graph: DiGraph<ModulePath, ()>,
}

impl ImportGraph {
    /// Build from collected modules; imported modules that were not collected get a node too
    pub fn build(modules: &BTreeMap<ModulePath, CollectedModule>) -> Self {
        let mut graph = DiGraph::new();
        let mut nodes: HashMap<ModulePath, NodeIndex> = HashMap::new();

        let mut node = |graph: &mut DiGraph<ModulePath, ()>, path: &ModulePath| {
            *nodes
                .entry(path.clone())
                .or_insert_with(|| graph.add_node(path.clone()))
        };

        for (path, module) in modules {
            let from = node(&mut graph, path);
            for imported in module.imported_modules() {
                let to = node(&mut graph, imported);
                graph.update_edge(from, to, ());
            }
        }

        Self { graph }
    }

    pub fn module_count(&self) -> usize {
        self.graph.node_count()
    }

    pub fn import_count(&self) -> usize {
        self.graph.edge_count()
    }

    /// Groups of modules that import each other, each sorted, largest first
    pub fn cycles(&self) -> Vec<Vec<ModulePath>> {
        let mut cycles: Vec<Vec<ModulePath>> = tarjan_scc(&self.graph)
            .into_iter()
            .filter(|component| {
                component.len() > 1
                    || self.graph.contains_edge(component[0], component[0])
            })
            .map(|component| {
                let mut paths: Vec<ModulePath> =
                    component.iter().map(|&ix| self.graph[ix].clone()).collect();
                paths.sort();
                paths
            })
            .collect();
        cycles.sort_by(|a, b| b.len().cmp(&a.len()).then_with(|| a.cmp(b)));
        cycles
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::model::EntityRef;

    fn module(path: &str, imports: &[(&str, &str)]) -> (ModulePath, CollectedModule) {
        let p = ModulePath::parse(path).unwrap();
        let mut m = CollectedModule::new(p.clone());
        for (module, name) in imports {
            m.cross_imports
                .insert(EntityRef::new(ModulePath::parse(module).unwrap(), *name));
        }
        (p, m)
    }

    #[test]
    fn test_mutual_imports_form_cycle() {
        let modules: BTreeMap<_, _> = [
            module("app.user", &[("app.address", "Address")]),
            module("app.address", &[("app.user", "User")]),
            module("app.misc", &[("app.user", "User")]),
        ]
        .into_iter()
        .collect();

        let graph = ImportGraph::build(&modules);
        assert_eq!(graph.module_count(), 3);
        assert_eq!(graph.import_count(), 3);

        let cycles = graph.cycles();
        assert_eq!(cycles.len(), 1);
        let names: Vec<String> = cycles[0].iter().map(ModulePath::dotted).collect();
        assert_eq!(names, vec!["app.address", "app.user"]);
    }

    #[test]
    fn test_acyclic_graph_has_no_cycles() {
        let modules: BTreeMap<_, _> = [
            module("a", &[("b", "B"), ("b", "C")]),
            module("b", &[]),
        ]
        .into_iter()
        .collect();

        let graph = ImportGraph::build(&modules);
        assert_eq!(graph.import_count(), 1);
        assert!(graph.cycles().is_empty());
    }
}
