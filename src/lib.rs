#[cfg(feature = "cli")]
pub mod cli;
pub mod classify;
pub mod config;
pub mod error;
pub mod ir;
pub mod layout;
pub mod layout_dump;
pub mod merge;
pub mod parser;
pub mod render;
pub mod theme;

use rayon::prelude::*;

pub use config::{Config, DiagramConfig, LayoutConfig, load_config};
pub use error::{Error, Result, Warning};
pub use ir::{Category, EdgeKind, Fragment, Graph};
pub use layout::Layout;
pub use render::Statistics;
pub use theme::Theme;

#[cfg(feature = "cli")]
pub use cli::run;

/// Merged and classified call graph, ready for layout.
#[derive(Debug, Clone, Default)]
pub struct ParseOutput {
    pub graph: Graph,
    /// Names of the fragments that contributed, sorted.
    pub fragments: Vec<String>,
    pub warnings: Vec<Warning>,
}

#[derive(Debug, Clone)]
pub struct RenderOutput {
    /// Complete draw.io document.
    pub document: String,
    pub stats: Statistics,
    /// Parse warnings followed by layout warnings.
    pub warnings: Vec<Warning>,
    pub layout: Layout,
}

/// Parse every fragment and merge them into one classified graph.
///
/// The result does not depend on the order of `fragments`.
pub fn parse(fragments: &[Fragment]) -> ParseOutput {
    let mut ordered: Vec<&Fragment> = fragments.iter().collect();
    ordered.sort_by(|a, b| a.name.cmp(&b.name).then_with(|| a.text.cmp(&b.text)));

    let parsed: Vec<_> = ordered
        .par_iter()
        .map(|fragment| parser::parse_fragment(fragment))
        .collect();

    let merged = merge::merge_fragments(parsed);
    let mut graph = merged.graph;
    classify::classify_nodes(&mut graph);

    ParseOutput {
        graph,
        fragments: merged.fragments,
        warnings: merged.warnings,
    }
}

/// Lay out and serialize a parsed graph.
///
/// Fails only when the document could not be built; recoverable conditions
/// end up in [`RenderOutput::warnings`].
pub fn render(parsed: &ParseOutput, config: &Config) -> Result<RenderOutput> {
    let layout = layout::compute_layout(&parsed.graph, &config.layout);

    let mut warnings = parsed.warnings.clone();
    warnings.extend(layout.warnings.iter().cloned());

    let stats = Statistics::from_layout(&layout, parsed.fragments.len(), warnings.len());
    let document = render::render_drawio(&layout, &stats, &config.theme, &config.diagram)?;

    tracing::debug!(
        nodes = stats.nodes,
        edges = stats.edges,
        levels = stats.levels,
        bytes = document.len(),
        "diagram rendered"
    );

    Ok(RenderOutput {
        document,
        stats,
        warnings,
        layout,
    })
}
