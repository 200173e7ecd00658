use crate::error::Warning;
use crate::ir::Graph;
use crate::parser::ParsedFragment;
use std::collections::BTreeSet;

#[derive(Debug, Clone, Default)]
pub struct MergeOutput {
    pub graph: Graph,
    /// Names of the fragments that contributed to the graph, sorted.
    pub fragments: Vec<String>,
    pub warnings: Vec<Warning>,
}

/// Union per-fragment graphs into one.
///
/// Fragments are reduced in name order so the result (including which label
/// is "first") does not depend on the order parsing finished in. A name seen
/// twice keeps the earliest copy in the given order and drops the rest;
/// [`crate::parse`] hands fragments over sorted by name and content.
pub fn merge_fragments(mut parsed: Vec<ParsedFragment>) -> MergeOutput {
    parsed.sort_by(|a, b| a.name.cmp(&b.name));

    let mut output = MergeOutput::default();
    let mut seen: BTreeSet<String> = BTreeSet::new();

    for fragment in parsed {
        if !seen.insert(fragment.name.clone()) {
            Warning::DuplicateFragment {
                fragment: fragment.name.clone(),
            }
            .emit(&mut output.warnings);
            continue;
        }
        // Warnings were already logged by the parser; carry them over as-is.
        output.warnings.extend(fragment.warnings);
        if fragment.skipped {
            continue;
        }
        for node in fragment.graph.nodes.values() {
            output.graph.ensure_node(&node.id, Some(&node.label));
        }
        for edge in fragment.graph.edges.values() {
            output
                .graph
                .add_call(&edge.from, &edge.to, edge.multiplicity);
        }
        output.fragments.push(fragment.name);
    }

    if output.graph.nodes.is_empty() {
        Warning::EmptyGraph.emit(&mut output.warnings);
    }

    tracing::debug!(
        fragments = output.fragments.len(),
        nodes = output.graph.nodes.len(),
        edges = output.graph.edges.len(),
        calls = output.graph.total_calls(),
        "merged fragments"
    );
    output
}
