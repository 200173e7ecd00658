use crate::ir::{Category, EdgeKind, Graph};
use once_cell::sync::Lazy;
use regex::Regex;

/// One row of the category table: a label matching any pattern gets the
/// category.
#[derive(Debug, Clone, Copy)]
pub struct CategoryRule {
    pub category: Category,
    pub patterns: &'static [&'static str],
}

/// Evaluated top to bottom against the lowercased identity; the first rule
/// with a matching pattern wins and `Generic` is the fallback. Patterns are
/// regex fragments, mostly plain substrings.
pub const CATEGORY_RULES: &[CategoryRule] = &[
    CategoryRule {
        category: Category::Entry,
        patterns: &[r"^(?:int )?main$", r"_main$", r"^w(?:in)?main$"],
    },
    CategoryRule {
        category: Category::Test,
        patterns: &["test", "assert", "mock", "fixture", "debug"],
    },
    CategoryRule {
        category: Category::Init,
        patterns: &["init", "setup", "constructor", "bootstrap", "^start", "^begin"],
    },
    CategoryRule {
        category: Category::Config,
        patterns: &["config", "setting", "option", "pref"],
    },
    CategoryRule {
        category: Category::Error,
        patterns: &["error", "fail", "exception", "abort", "panic", "fault", "catch"],
    },
    CategoryRule {
        category: Category::Timing,
        patterns: &["timer", "timeout", "delay", "wait", "sleep", "schedule", "tick", "clock"],
    },
    CategoryRule {
        category: Category::Io,
        patterns: &[
            r"(?:^|[^h])read",
            "write",
            "input",
            "output",
            "send",
            "recv",
            "receive",
            "transmit",
            "print",
            "load",
            "save",
            "store",
            "socket",
            "serial",
            "uart",
            "stream",
        ],
    },
    CategoryRule {
        category: Category::Utility,
        patterns: &["helper", "util", "tool", "misc", "common", "format", "convert"],
    },
];

static COMPILED_RULES: Lazy<Vec<(Category, Regex)>> = Lazy::new(|| {
    CATEGORY_RULES
        .iter()
        .map(|rule| {
            let alternation = rule.patterns.join("|");
            let regex = Regex::new(&format!("(?:{alternation})")).unwrap();
            (rule.category, regex)
        })
        .collect()
});

pub fn classify_label(label: &str) -> Category {
    let lowered = label.to_lowercase();
    COMPILED_RULES
        .iter()
        .find(|(_, regex)| regex.is_match(&lowered))
        .map(|(category, _)| *category)
        .unwrap_or(Category::Generic)
}

/// Assign every node its category from its identity.
pub fn classify_nodes(graph: &mut Graph) {
    for node in graph.nodes.values_mut() {
        node.category = classify_label(&node.id);
    }
}

/// Facts about one edge once levels are known.
#[derive(Debug, Clone, Copy)]
pub struct EdgeFacts {
    pub callee: Category,
    pub caller_level: Option<usize>,
    pub callee_level: Option<usize>,
    pub self_loop: bool,
    pub caller_is_entry: bool,
    /// Edge belongs to the longest traversal path from an entry point.
    pub on_spine: bool,
}

/// Ordered rules: error-path, callback, main-path, lateral, plain call.
/// Callback precedes main-path so recursion into an entry point still reads
/// as a return arc.
pub fn classify_edge(facts: &EdgeFacts) -> EdgeKind {
    if facts.callee == Category::Error {
        return EdgeKind::ErrorPath;
    }
    if facts.self_loop {
        return EdgeKind::Callback;
    }
    if let (Some(caller), Some(callee)) = (facts.caller_level, facts.callee_level) {
        if caller > callee {
            return EdgeKind::Callback;
        }
    }
    if facts.caller_is_entry || facts.on_spine {
        return EdgeKind::MainPath;
    }
    match (facts.caller_level, facts.callee_level) {
        (Some(caller), Some(callee)) if caller == callee => EdgeKind::Lateral,
        _ => EdgeKind::Call,
    }
}
