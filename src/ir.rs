use serde::{Deserialize, Serialize};
use std::collections::{BTreeMap, BTreeSet};

/// One input graph-description file as handed over by the orchestrator.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Fragment {
    pub name: String,
    pub text: String,
}

impl Fragment {
    pub fn new(name: impl Into<String>, text: impl Into<String>) -> Self {
        Self {
            name: name.into(),
            text: text.into(),
        }
    }
}

/// Semantic role of a function, derived from its name.
#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Hash, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum Category {
    Entry,
    Init,
    Config,
    Error,
    Test,
    Io,
    Timing,
    Utility,
    Generic,
}

impl Category {
    pub const ALL: [Category; 9] = [
        Category::Entry,
        Category::Init,
        Category::Config,
        Category::Error,
        Category::Test,
        Category::Io,
        Category::Timing,
        Category::Utility,
        Category::Generic,
    ];

    pub fn as_str(self) -> &'static str {
        match self {
            Self::Entry => "entry",
            Self::Init => "init",
            Self::Config => "config",
            Self::Error => "error",
            Self::Test => "test",
            Self::Io => "io",
            Self::Timing => "timing",
            Self::Utility => "utility",
            Self::Generic => "generic",
        }
    }

    /// Left-to-right placement rank inside a level: entry points and setup
    /// first, I/O and processing in the middle, error/test/utility last.
    pub fn sequence_order(self) -> u8 {
        match self {
            Self::Entry => 0,
            Self::Init => 1,
            Self::Config => 2,
            Self::Io => 3,
            Self::Generic => 4,
            Self::Timing => 5,
            Self::Error => 6,
            Self::Test => 7,
            Self::Utility => 8,
        }
    }
}

/// Presentational kind of a call edge.
#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Hash, Serialize, Deserialize)]
#[serde(rename_all = "kebab-case")]
pub enum EdgeKind {
    MainPath,
    ErrorPath,
    Lateral,
    Callback,
    Call,
}

impl EdgeKind {
    pub const ALL: [EdgeKind; 5] = [
        EdgeKind::MainPath,
        EdgeKind::ErrorPath,
        EdgeKind::Lateral,
        EdgeKind::Callback,
        EdgeKind::Call,
    ];

    pub fn as_str(self) -> &'static str {
        match self {
            Self::MainPath => "main-path",
            Self::ErrorPath => "error-path",
            Self::Lateral => "lateral",
            Self::Callback => "callback",
            Self::Call => "call",
        }
    }
}

#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Node {
    pub id: String,
    pub label: String,
    pub category: Category,
}

#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Edge {
    pub from: String,
    pub to: String,
    pub multiplicity: usize,
}

impl Edge {
    pub fn is_self_loop(&self) -> bool {
        self.from == self.to
    }
}

/// Call graph addressed by identity: nodes by name, edges by (caller, callee).
///
/// Both maps are ordered so every iteration over the graph is deterministic
/// regardless of the order records were observed in.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct Graph {
    pub nodes: BTreeMap<String, Node>,
    pub edges: BTreeMap<(String, String), Edge>,
}

impl Graph {
    pub fn new() -> Self {
        Self::default()
    }

    /// Insert a node unless one with the same identity exists; the first
    /// label wins.
    pub fn ensure_node(&mut self, id: &str, label: Option<&str>) {
        self.nodes.entry(id.to_string()).or_insert_with(|| Node {
            id: id.to_string(),
            label: label.unwrap_or(id).to_string(),
            category: Category::Generic,
        });
    }

    /// Record `count` observations of `from -> to`, creating endpoints on demand.
    pub fn add_call(&mut self, from: &str, to: &str, count: usize) {
        self.ensure_node(from, None);
        self.ensure_node(to, None);
        self.edges
            .entry((from.to_string(), to.to_string()))
            .and_modify(|edge| edge.multiplicity += count)
            .or_insert_with(|| Edge {
                from: from.to_string(),
                to: to.to_string(),
                multiplicity: count,
            });
    }

    pub fn successors<'a>(&'a self, id: &'a str) -> impl Iterator<Item = &'a str> + 'a {
        self.edges
            .range((id.to_string(), String::new())..)
            .take_while(move |((from, _), _)| from == id)
            .map(|((_, to), _)| to.as_str())
    }

    pub fn in_degrees(&self) -> BTreeMap<&str, usize> {
        let mut degrees: BTreeMap<&str, usize> =
            self.nodes.keys().map(|id| (id.as_str(), 0)).collect();
        for (_, to) in self.edges.keys() {
            *degrees.entry(to.as_str()).or_default() += 1;
        }
        degrees
    }

    pub fn out_degrees(&self) -> BTreeMap<&str, usize> {
        let mut degrees: BTreeMap<&str, usize> =
            self.nodes.keys().map(|id| (id.as_str(), 0)).collect();
        for (from, _) in self.edges.keys() {
            *degrees.entry(from.as_str()).or_default() += 1;
        }
        degrees
    }

    /// Nodes that take part in no call at all.
    pub fn isolated_nodes(&self) -> BTreeSet<&str> {
        let mut connected: BTreeSet<&str> = BTreeSet::new();
        for (from, to) in self.edges.keys() {
            connected.insert(from.as_str());
            connected.insert(to.as_str());
        }
        self.nodes
            .keys()
            .map(String::as_str)
            .filter(|id| !connected.contains(id))
            .collect()
    }

    pub fn total_calls(&self) -> usize {
        self.edges.values().map(|edge| edge.multiplicity).sum()
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn ensure_node_keeps_first_label() {
        let mut graph = Graph::new();
        graph.ensure_node("run", Some("run"));
        graph.ensure_node("run", Some("other"));
        assert_eq!(graph.nodes.len(), 1);
        assert_eq!(graph.nodes["run"].label, "run");
    }

    #[test]
    fn repeated_calls_increment_multiplicity() {
        let mut graph = Graph::new();
        graph.add_call("a", "b", 1);
        graph.add_call("a", "b", 2);
        assert_eq!(graph.edges.len(), 1);
        assert_eq!(graph.edges[&("a".to_string(), "b".to_string())].multiplicity, 3);
        assert_eq!(graph.total_calls(), 3);
    }

    #[test]
    fn successors_are_scoped_to_the_caller() {
        let mut graph = Graph::new();
        graph.add_call("a", "c", 1);
        graph.add_call("a", "b", 1);
        graph.add_call("ab", "z", 1);
        let succ: Vec<&str> = graph.successors("a").collect();
        assert_eq!(succ, vec!["b", "c"]);
    }

    #[test]
    fn degrees_and_isolated_nodes() {
        let mut graph = Graph::new();
        graph.add_call("a", "b", 1);
        graph.add_call("b", "b", 1);
        graph.ensure_node("lonely", None);
        assert_eq!(graph.in_degrees()["b"], 2);
        assert_eq!(graph.out_degrees()["a"], 1);
        let isolated: Vec<&str> = graph.isolated_nodes().into_iter().collect();
        assert_eq!(isolated, vec!["lonely"]);
    }
}
