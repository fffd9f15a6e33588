use std::any::{type_name, Any};
use std::collections::{HashMap, VecDeque};
use std::fmt;
use std::sync::Arc;

use crate::GraphError;

/// Type-erased node value.
pub type Value = Arc<dyn Any + Send + Sync>;

type ComputeFn = Box<dyn Fn(&Inputs<'_>) -> Result<Value, GraphError> + Send + Sync>;

enum Kind {
    Input,
    Derived(ComputeFn),
}

struct Node {
    name: String,
    kind: Kind,
    deps: Vec<usize>,
    value: Option<Value>,
    /// Bumped every time `value` changes; 0 while the node never held one.
    version: u64,
    /// Dependency versions `value` was computed from.
    seen: Vec<u64>,
}

/// Dependency values handed to a compute function.
pub struct Inputs<'a> {
    node: &'a str,
    entries: Vec<(&'a str, Option<&'a Value>)>,
}

impl Inputs<'_> {
    /// Name of the node being computed.
    pub fn node(&self) -> &str {
        self.node
    }

    pub fn get<T: Any + Send + Sync>(&self, name: &str) -> Result<&T, GraphError> {
        let value = self.value(name)?;
        (**value)
            .downcast_ref::<T>()
            .ok_or_else(|| GraphError::TypeMismatch {
                node: name.to_string(),
                expected: type_name::<T>(),
            })
    }

    /// Shared handle to a dependency value.
    pub fn arc<T: Any + Send + Sync>(&self, name: &str) -> Result<Arc<T>, GraphError> {
        let value = self.value(name)?;
        Arc::clone(value)
            .downcast::<T>()
            .map_err(|_| GraphError::TypeMismatch {
                node: name.to_string(),
                expected: type_name::<T>(),
            })
    }

    fn value(&self, name: &str) -> Result<&Value, GraphError> {
        let (_, value) = self
            .entries
            .iter()
            .find(|(dep, _)| *dep == name)
            .ok_or_else(|| GraphError::UnknownNode(name.to_string()))?;
        value.ok_or_else(|| GraphError::MissingValue(name.to_string()))
    }
}

/// Named input nodes plus derived nodes computed from declared dependencies.
///
/// Evaluation walks the cached topological order and recomputes a derived
/// node only when one of its dependency versions moved.
#[derive(Default)]
pub struct Graph {
    nodes: Vec<Node>,
    index: HashMap<String, usize>,
    order: Vec<usize>,
    next_version: u64,
    computations: u64,
}

impl fmt::Debug for Graph {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("Graph")
            .field("order", &self.order.iter().map(|&i| &self.nodes[i].name).collect::<Vec<_>>())
            .field("computations", &self.computations)
            .finish()
    }
}

impl Graph {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn len(&self) -> usize {
        self.nodes.len()
    }

    pub fn is_empty(&self) -> bool {
        self.nodes.is_empty()
    }

    pub fn contains(&self, name: &str) -> bool {
        self.index.contains_key(name)
    }

    /// Total number of compute function calls so far.
    pub fn computations(&self) -> u64 {
        self.computations
    }

    /// Declare an input node without a value.
    pub fn add_input(&mut self, name: &str) -> Result<(), GraphError> {
        self.insert(name, Kind::Input, Vec::new())
    }

    /// Declare an input node holding `value`.
    pub fn add_input_with<T: Any + Send + Sync>(&mut self, name: &str, value: T) -> Result<(), GraphError> {
        self.add_input(name)?;
        self.set(name, value)
    }

    /// Declare a derived node over existing nodes.
    pub fn add_derived<T, F>(&mut self, name: &str, deps: &[&str], compute: F) -> Result<(), GraphError>
    where
        T: Any + Send + Sync,
        F: Fn(&Inputs<'_>) -> Result<T, GraphError> + Send + Sync + 'static,
    {
        let deps = self.resolve(deps)?;
        self.insert(name, Kind::Derived(erase(compute)), deps)
    }

    /// Replace a node with a derived node over `deps`.
    ///
    /// Rejected with [`GraphError::Cycle`] when the new dependencies would make
    /// the node depend on itself; the graph is left unchanged in that case.
    pub fn redefine<T, F>(&mut self, name: &str, deps: &[&str], compute: F) -> Result<(), GraphError>
    where
        T: Any + Send + Sync,
        F: Fn(&Inputs<'_>) -> Result<T, GraphError> + Send + Sync + 'static,
    {
        let idx = self.lookup(name)?;
        let deps = self.resolve(deps)?;
        let old_deps = std::mem::replace(&mut self.nodes[idx].deps, deps);
        let Some(order) = topological_order(&self.nodes) else {
            self.nodes[idx].deps = old_deps;
            tracing::warn!(node = name, "rejected redefinition closing a cycle");
            return Err(GraphError::Cycle(name.to_string()));
        };
        self.order = order;
        let node = &mut self.nodes[idx];
        node.kind = Kind::Derived(erase(compute));
        node.seen.clear();
        node.value = None;
        Ok(())
    }

    /// Replace the value of an input node.
    pub fn set<T: Any + Send + Sync>(&mut self, name: &str, value: T) -> Result<(), GraphError> {
        let idx = self.lookup(name)?;
        if !matches!(self.nodes[idx].kind, Kind::Input) {
            return Err(GraphError::NotAnInput(name.to_string()));
        }
        let version = self.bump();
        let node = &mut self.nodes[idx];
        node.value = Some(Arc::new(value));
        node.version = version;
        Ok(())
    }

    /// Current version of a node without evaluating it.
    pub fn version(&self, name: &str) -> Result<u64, GraphError> {
        Ok(self.nodes[self.lookup(name)?].version)
    }

    /// Bring `name` and everything it depends on up to date and return its
    /// value.
    pub fn evaluate(&mut self, name: &str) -> Result<Value, GraphError> {
        let target = self.lookup(name)?;
        let needed = self.ancestors(target);
        for position in 0..self.order.len() {
            let idx = self.order[position];
            if needed[idx] {
                self.refresh(idx)?;
            }
        }
        self.nodes[target]
            .value
            .clone()
            .ok_or_else(|| GraphError::MissingValue(name.to_string()))
    }

    /// Typed [`Graph::evaluate`].
    pub fn get<T: Any + Send + Sync>(&mut self, name: &str) -> Result<Arc<T>, GraphError> {
        self.evaluate(name)?
            .downcast::<T>()
            .map_err(|_| GraphError::TypeMismatch {
                node: name.to_string(),
                expected: type_name::<T>(),
            })
    }

    fn insert(&mut self, name: &str, kind: Kind, deps: Vec<usize>) -> Result<(), GraphError> {
        if self.index.contains_key(name) {
            return Err(GraphError::DuplicateNode(name.to_string()));
        }
        let idx = self.nodes.len();
        self.nodes.push(Node {
            name: name.to_string(),
            kind,
            deps,
            value: None,
            version: 0,
            seen: Vec::new(),
        });
        self.index.insert(name.to_string(), idx);
        // Dependencies already exist, so appending keeps the order valid.
        self.order.push(idx);
        tracing::trace!(node = name, "graph node added");
        Ok(())
    }

    fn lookup(&self, name: &str) -> Result<usize, GraphError> {
        self.index
            .get(name)
            .copied()
            .ok_or_else(|| GraphError::UnknownNode(name.to_string()))
    }

    fn resolve(&self, deps: &[&str]) -> Result<Vec<usize>, GraphError> {
        deps.iter().map(|dep| self.lookup(dep)).collect()
    }

    fn bump(&mut self) -> u64 {
        self.next_version += 1;
        self.next_version
    }

    fn ancestors(&self, target: usize) -> Vec<bool> {
        let mut needed = vec![false; self.nodes.len()];
        let mut stack = vec![target];
        while let Some(idx) = stack.pop() {
            if std::mem::replace(&mut needed[idx], true) {
                continue;
            }
            stack.extend(&self.nodes[idx].deps);
        }
        needed
    }

    fn refresh(&mut self, idx: usize) -> Result<(), GraphError> {
        let node = &self.nodes[idx];
        let Kind::Derived(compute) = &node.kind else {
            return Ok(());
        };
        let current: Vec<u64> = node.deps.iter().map(|&dep| self.nodes[dep].version).collect();
        if node.value.is_some() && current == node.seen {
            return Ok(());
        }
        tracing::trace!(node = %node.name, "recomputing");
        let value = {
            let inputs = Inputs {
                node: &node.name,
                entries: node
                    .deps
                    .iter()
                    .map(|&dep| (self.nodes[dep].name.as_str(), self.nodes[dep].value.as_ref()))
                    .collect(),
            };
            compute(&inputs)?
        };

        self.computations += 1;
        let version = self.bump();
        let node = &mut self.nodes[idx];
        node.value = Some(value);
        node.version = version;
        node.seen = current;
        Ok(())
    }
}

fn erase<T, F>(compute: F) -> ComputeFn
where
    T: Any + Send + Sync,
    F: Fn(&Inputs<'_>) -> Result<T, GraphError> + Send + Sync + 'static,
{
    Box::new(move |inputs| compute(inputs).map(|value| Arc::new(value) as Value))
}

/// Kahn's algorithm over all nodes; `None` when a cycle remains.
fn topological_order(nodes: &[Node]) -> Option<Vec<usize>> {
    let mut in_degree: Vec<usize> = nodes.iter().map(|node| node.deps.len()).collect();
    let mut dependents: Vec<Vec<usize>> = vec![Vec::new(); nodes.len()];
    for (idx, node) in nodes.iter().enumerate() {
        for &dep in &node.deps {
            dependents[dep].push(idx);
        }
    }

    let mut queue: VecDeque<usize> = (0..nodes.len()).filter(|&idx| in_degree[idx] == 0).collect();
    let mut order = Vec::with_capacity(nodes.len());
    while let Some(idx) = queue.pop_front() {
        order.push(idx);
        for &dependent in &dependents[idx] {
            in_degree[dependent] -= 1;
            if in_degree[dependent] == 0 {
                queue.push_back(dependent);
            }
        }
    }
    (order.len() == nodes.len()).then_some(order)
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::sync::atomic::{AtomicUsize, Ordering};

    fn counted(counter: Arc<AtomicUsize>) -> impl Fn(&Inputs<'_>) -> Result<i64, GraphError> + Send + Sync + 'static {
        move |inputs: &Inputs<'_>| {
            counter.fetch_add(1, Ordering::SeqCst);
            Ok(inputs.get::<i64>("a")? + inputs.get::<i64>("b")?)
        }
    }

    fn sum_graph(counter: &Arc<AtomicUsize>) -> Graph {
        let mut g = Graph::new();
        g.add_input_with("a", 1_i64).unwrap();
        g.add_input_with("b", 2_i64).unwrap();
        g.add_derived("sum", &["a", "b"], counted(Arc::clone(counter))).unwrap();
        g
    }

    #[test]
    fn derived_value_is_memoized() {
        let counter = Arc::new(AtomicUsize::new(0));
        let mut g = sum_graph(&counter);
        assert_eq!(*g.get::<i64>("sum").unwrap(), 3);
        assert_eq!(*g.get::<i64>("sum").unwrap(), 3);
        assert_eq!(counter.load(Ordering::SeqCst), 1);
        assert_eq!(g.computations(), 1);
    }

    #[test]
    fn changed_dependency_triggers_recompute() {
        let counter = Arc::new(AtomicUsize::new(0));
        let mut g = sum_graph(&counter);
        g.get::<i64>("sum").unwrap();
        let before = g.version("sum").unwrap();
        g.set("a", 10_i64).unwrap();
        assert_eq!(*g.get::<i64>("sum").unwrap(), 12);
        assert_eq!(counter.load(Ordering::SeqCst), 2);
        assert!(g.version("sum").unwrap() > before);
    }

    #[test]
    fn unrelated_branch_is_not_recomputed() {
        let counter = Arc::new(AtomicUsize::new(0));
        let mut g = sum_graph(&counter);
        g.add_input_with("c", 0_i64).unwrap();
        g.add_derived("double_c", &["c"], |i: &Inputs<'_>| Ok(i.get::<i64>("c")? * 2))
            .unwrap();
        g.get::<i64>("sum").unwrap();
        g.set("c", 4_i64).unwrap();
        assert_eq!(*g.get::<i64>("double_c").unwrap(), 8);
        g.get::<i64>("sum").unwrap();
        assert_eq!(counter.load(Ordering::SeqCst), 1);
    }

    #[test]
    fn diamond_computes_shared_node_once() {
        let counter = Arc::new(AtomicUsize::new(0));
        let mut g = sum_graph(&counter);
        g.add_derived("left", &["sum"], |i: &Inputs<'_>| Ok(*i.get::<i64>("sum")? + 1))
            .unwrap();
        g.add_derived("right", &["sum"], |i: &Inputs<'_>| Ok(*i.get::<i64>("sum")? * 10))
            .unwrap();
        g.add_derived("top", &["left", "right"], |i: &Inputs<'_>| {
            Ok(*i.get::<i64>("left")? + *i.get::<i64>("right")?)
        })
        .unwrap();
        assert_eq!(*g.get::<i64>("top").unwrap(), 34);
        assert_eq!(counter.load(Ordering::SeqCst), 1);
        assert_eq!(g.computations(), 4);
    }

    #[test]
    fn redefinition_closing_a_cycle_is_rejected() {
        let counter = Arc::new(AtomicUsize::new(0));
        let mut g = sum_graph(&counter);
        let err = g
            .redefine("a", &["sum"], |i: &Inputs<'_>| Ok(*i.get::<i64>("sum")?))
            .unwrap_err();
        assert_eq!(err, GraphError::Cycle("a".into()));
        // Graph still evaluates with the old definition.
        assert_eq!(*g.get::<i64>("sum").unwrap(), 3);
    }

    #[test]
    fn redefinition_recomputes_and_reorders() {
        let mut g = Graph::new();
        g.add_input_with("x", 2_i64).unwrap();
        g.add_derived("y", &["x"], |i: &Inputs<'_>| Ok(*i.get::<i64>("x")? + 1))
            .unwrap();
        g.add_input_with("z", 100_i64).unwrap();
        g.get::<i64>("y").unwrap();
        g.redefine("y", &["x", "z"], |i: &Inputs<'_>| {
            Ok(*i.get::<i64>("x")? + *i.get::<i64>("z")?)
        })
        .unwrap();
        assert_eq!(*g.get::<i64>("y").unwrap(), 102);
    }

    #[test]
    fn construction_errors() {
        let mut g = Graph::new();
        g.add_input("a").unwrap();
        assert_eq!(g.add_input("a"), Err(GraphError::DuplicateNode("a".into())));
        assert_eq!(
            g.add_derived("b", &["missing"], |_: &Inputs<'_>| Ok(0_u8)),
            Err(GraphError::UnknownNode("missing".into()))
        );
        g.add_derived("b", &["a"], |_: &Inputs<'_>| Ok(0_u8)).unwrap();
        assert_eq!(g.set("b", 1_u8), Err(GraphError::NotAnInput("b".into())));
        assert_eq!(g.len(), 2);
    }

    #[test]
    fn evaluation_errors() {
        let mut g = Graph::new();
        g.add_input("a").unwrap();
        g.add_derived("b", &["a"], |i: &Inputs<'_>| Ok(*i.get::<u32>("a")?))
            .unwrap();
        assert_eq!(g.evaluate("b").unwrap_err(), GraphError::MissingValue("a".into()));

        g.set("a", "text").unwrap();
        assert!(matches!(g.evaluate("b").unwrap_err(), GraphError::TypeMismatch { .. }));

        g.set("a", 7_u32).unwrap();
        assert!(matches!(g.get::<String>("b").unwrap_err(), GraphError::TypeMismatch { .. }));
        assert_eq!(*g.get::<u32>("b").unwrap(), 7);
    }

    #[test]
    fn compute_failure_propagates() {
        let mut g = Graph::new();
        g.add_input_with("a", 0_i32).unwrap();
        g.add_derived("inv", &["a"], |i: &Inputs<'_>| {
            let a = *i.get::<i32>("a")?;
            if a == 0 {
                return Err(GraphError::compute(i.node(), "division by zero"));
            }
            Ok(1.0 / a as f32)
        })
        .unwrap();
        assert_eq!(
            g.evaluate("inv").unwrap_err(),
            GraphError::Compute {
                node: "inv".into(),
                reason: "division by zero".into()
            }
        );
        g.set("a", 2_i32).unwrap();
        assert_eq!(*g.get::<f32>("inv").unwrap(), 0.5);
    }
}
