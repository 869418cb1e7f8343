//! Orders tables by foreign-key dependency so each can be created
//! without forward-referencing one that doesn't exist yet.

use std::collections::{BTreeMap, BTreeSet, HashMap, HashSet};

use ptah_ast::schema::DependencyGraph;

/// The tables to create, in dependency order, alongside the set of
/// foreign-key edges that must instead be applied as a deferred
/// `ALTER TABLE` once every table exists (edges inside a
/// strongly-connected component of size > 1).
#[derive(Debug, Clone, PartialEq, Eq, Default)]
pub struct Plan {
    /// Table names, creation-ready order.
    pub order: Vec<String>,
    /// `(from, to)` edges that participate in a cycle and must be
    /// emitted as a deferred constraint after every table exists.
    pub deferred_edges: Vec<(String, String)>
}

/// Compute a [`Plan`] for `graph`.
///
/// Algorithm: a Tarjan strongly-connected-components pass first
/// identifies cycles (a table that merely references itself is its
/// own size-1 component and is never deferred — self-references
/// never block creation). Edges whose endpoints land in the same
/// component of size > 1 are deferred; the remaining edges feed a
/// Kahn topological sort with alphabetical tie-breaking among
/// equal-rank tables, for determinism.
pub fn resolve(graph: &DependencyGraph) -> Plan {
    let components = tarjan_scc(graph);
    let mut component_of: HashMap<&str, usize> = HashMap::new();
    for (idx, component) in components.iter().enumerate() {
        for node in component {
            component_of.insert(node.as_str(), idx);
        }
    }

    let mut deferred_edges = Vec::new();
    let mut dag_edges: BTreeMap<String, BTreeSet<String>> = graph.nodes().map(|n| (n.to_string(), BTreeSet::new())).collect();

    for from in graph.nodes() {
        for to in graph.references_of(from) {
            if from == to {
                continue;
            }
            let same_component = components[component_of[from]].len() > 1 && component_of[from] == component_of[to];
            if same_component {
                deferred_edges.push((from.to_string(), to.to_string()));
            } else {
                dag_edges.entry(from.to_string()).or_default().insert(to.to_string());
            }
        }
    }

    let order = kahn_topological_sort(&dag_edges);
    deferred_edges.sort();

    Plan { order, deferred_edges }
}

/// Kahn's algorithm over `edges` (`from -> {to, ...}`, meaning `from`
/// depends on `to`, so `to` must precede `from` in the result). Ties
/// among nodes with no remaining unsatisfied dependencies are broken
/// alphabetically.
fn kahn_topological_sort(edges: &BTreeMap<String, BTreeSet<String>>) -> Vec<String> {
    let mut dependents: BTreeMap<String, BTreeSet<String>> = edges.keys().map(|n| (n.clone(), BTreeSet::new())).collect();
    let mut remaining: BTreeMap<String, usize> = BTreeMap::new();

    for (from, tos) in edges {
        remaining.insert(from.clone(), tos.len());
        for to in tos {
            dependents.entry(to.clone()).or_default().insert(from.clone());
        }
    }

    let mut ready: BTreeSet<String> = remaining.iter().filter(|(_, &count)| count == 0).map(|(n, _)| n.clone()).collect();
    let mut order = Vec::with_capacity(edges.len());

    while let Some(node) = ready.iter().next().cloned() {
        ready.remove(&node);
        order.push(node.clone());

        if let Some(deps) = dependents.get(&node) {
            for dependent in deps {
                if let Some(count) = remaining.get_mut(dependent) {
                    *count -= 1;
                    if *count == 0 {
                        ready.insert(dependent.clone());
                    }
                }
            }
        }
    }

    order
}

/// Tarjan state threaded through the recursive DFS.
struct Tarjan<'g> {
    graph: &'g DependencyGraph,
    index_counter: usize,
    indices: HashMap<String, usize>,
    lowlink: HashMap<String, usize>,
    on_stack: HashSet<String>,
    stack: Vec<String>,
    components: Vec<Vec<String>>
}

/// Tarjan's strongly-connected-components algorithm.
fn tarjan_scc(graph: &DependencyGraph) -> Vec<Vec<String>> {
    let mut t = Tarjan {
        graph,
        index_counter: 0,
        indices: HashMap::new(),
        lowlink: HashMap::new(),
        on_stack: HashSet::new(),
        stack: Vec::new(),
        components: Vec::new()
    };

    let nodes: Vec<String> = graph.nodes().map(String::from).collect();
    for node in &nodes {
        if !t.indices.contains_key(node) {
            t.strong_connect(node);
        }
    }

    t.components
}

impl Tarjan<'_> {
    fn strong_connect(&mut self, node: &str) {
        self.indices.insert(node.to_string(), self.index_counter);
        self.lowlink.insert(node.to_string(), self.index_counter);
        self.index_counter += 1;
        self.stack.push(node.to_string());
        self.on_stack.insert(node.to_string());

        let children: Vec<String> = self.graph.references_of(node).map(String::from).collect();
        for child in &children {
            if !self.indices.contains_key(child) {
                self.strong_connect(child);
                let child_low = self.lowlink[child];
                let entry = self.lowlink.get_mut(node).expect("node registered before visiting children");
                *entry = (*entry).min(child_low);
            } else if self.on_stack.contains(child) {
                let child_index = self.indices[child];
                let entry = self.lowlink.get_mut(node).expect("node registered before visiting children");
                *entry = (*entry).min(child_index);
            }
        }

        if self.lowlink[node] == self.indices[node] {
            let mut component = Vec::new();
            loop {
                let member = self.stack.pop().expect("scc root is on the stack");
                self.on_stack.remove(&member);
                let is_root = member == node;
                component.push(member);
                if is_root {
                    break;
                }
            }
            component.sort();
            self.components.push(component);
        }
    }
}
