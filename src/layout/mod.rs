mod ranking;
mod routing;
mod text;
pub(crate) mod types;
pub use types::*;

use std::collections::{BTreeMap, HashSet};

use crate::classify::{EdgeFacts, classify_edge};
use crate::config::LayoutConfig;
use crate::ir::{Category, Graph};
use routing::RouteRequest;

const REGION_PADDING: f32 = 20.0;
const ISOLATED_ROW_GAP: f32 = 40.0;

/// Place every node and route every edge of a classified graph.
///
/// Connected nodes go on a grid of levels (rows) ordered left to right;
/// nodes without any call go into a separate region below the grid. The
/// result only depends on the graph's content, never on insertion order.
pub fn compute_layout(graph: &Graph, config: &LayoutConfig) -> Layout {
    let mut warnings = Vec::new();
    let assignment = ranking::assign_levels(graph, &mut warnings);
    let order = ranking::order_levels(graph, &assignment.levels, config.order_passes);
    let spine = ranking::spine_edges(&assignment);

    let mut nodes = measure_nodes(graph, &assignment.levels, config);
    let (rows, grid_right, grid_bottom) = place_grid(&mut nodes, &order, config);
    let isolated_region = place_isolated(&mut nodes, graph, grid_bottom, rows.is_empty(), config);

    let entries: HashSet<&str> = assignment.entries.iter().map(String::as_str).collect();
    let requests: Vec<RouteRequest> = graph
        .edges
        .values()
        .map(|edge| {
            let facts = EdgeFacts {
                callee: graph
                    .nodes
                    .get(&edge.to)
                    .map_or(Category::Generic, |node| node.category),
                caller_level: assignment.levels.get(&edge.from).copied(),
                callee_level: assignment.levels.get(&edge.to).copied(),
                self_loop: edge.is_self_loop(),
                caller_is_entry: entries.contains(edge.from.as_str()),
                on_spine: spine.contains(&(edge.from.clone(), edge.to.clone())),
            };
            RouteRequest {
                from: edge.from.clone(),
                to: edge.to.clone(),
                kind: classify_edge(&facts),
                multiplicity: edge.multiplicity,
            }
        })
        .collect();
    let edges = routing::route_edges(&nodes, &rows, &requests, config);

    let mut right = grid_right;
    let mut bottom = grid_bottom;
    if let Some(region) = &isolated_region {
        right = right.max(region.x + region.width);
        bottom = bottom.max(region.y + region.height);
    }
    for edge in &edges {
        for (x, y) in &edge.points {
            right = right.max(*x);
            bottom = bottom.max(*y);
        }
    }

    tracing::debug!(
        levels = rows.len(),
        entries = assignment.entries.len(),
        isolated = graph.isolated_nodes().len(),
        edges = edges.len(),
        "computed layout"
    );

    Layout {
        nodes: nodes.into_values().collect(),
        edges,
        rows,
        entries: assignment.entries,
        isolated_region,
        width: (right + config.margin).round(),
        height: (bottom + config.margin).round(),
        warnings,
    }
}

fn measure_nodes(
    graph: &Graph,
    levels: &BTreeMap<String, usize>,
    config: &LayoutConfig,
) -> BTreeMap<String, NodeLayout> {
    graph
        .nodes
        .values()
        .map(|node| {
            let level = levels.get(&node.id).copied();
            let isolated = level.is_none();
            let font_size = text::font_size_for(node.category, isolated, config);
            let display = text::truncate_label(&node.label, config.max_label_chars);
            let label = text::measure_label(&display, font_size, config);
            let (width, height) = text::node_size(&label, isolated, config);
            let layout = NodeLayout {
                id: node.id.clone(),
                label,
                category: node.category,
                level,
                rank: 0,
                x: 0.0,
                y: 0.0,
                width,
                height,
                font_size,
            };
            (node.id.clone(), layout)
        })
        .collect()
}

/// Column pitch for one level: wide enough for its widest node, spread
/// further when the level is crowded.
fn level_pitch(widest: f32, count: usize, config: &LayoutConfig) -> f32 {
    let base = config.column_width.max(widest + config.column_gap);
    if count > config.crowded_level_threshold {
        base * (1.0 + config.crowded_spread * (count - config.crowded_level_threshold) as f32)
    } else {
        base
    }
}

/// Returns the rows plus the right and bottom edges of the grid.
fn place_grid(
    nodes: &mut BTreeMap<String, NodeLayout>,
    order: &[Vec<String>],
    config: &LayoutConfig,
) -> (Vec<RowLayout>, f32, f32) {
    let extent = |bucket: &[String], pick: fn(&NodeLayout) -> f32| {
        bucket
            .iter()
            .filter_map(|id| nodes.get(id))
            .map(pick)
            .fold(0.0, f32::max)
    };
    let metrics: Vec<(f32, f32, f32)> = order
        .iter()
        .map(|bucket| {
            let widest = extent(bucket, |node| node.width);
            let tallest = extent(bucket, |node| node.height);
            let pitch = level_pitch(widest, bucket.len(), config);
            let span = pitch * bucket.len().saturating_sub(1) as f32 + widest;
            (pitch, tallest, span)
        })
        .collect();
    let grid_width = metrics.iter().map(|(_, _, span)| *span).fold(0.0, f32::max);
    let centre_x = config.margin + grid_width / 2.0;

    let mut rows = Vec::with_capacity(order.len());
    let mut y = config.margin;
    let mut bottom = config.margin;
    for (level, (bucket, (pitch, tallest, _))) in order.iter().zip(&metrics).enumerate() {
        let middle = bucket.len().saturating_sub(1) as f32 / 2.0;
        for (rank, id) in bucket.iter().enumerate() {
            if let Some(node) = nodes.get_mut(id) {
                let cx = centre_x + (rank as f32 - middle) * pitch;
                node.rank = rank;
                node.x = (cx - node.width / 2.0).round();
                node.y = (y + (tallest - node.height) / 2.0).round();
            }
        }
        rows.push(RowLayout {
            level,
            y,
            height: *tallest,
            nodes: bucket.clone(),
        });
        bottom = y + tallest;
        y += config.row_height.max(tallest + config.row_gap);
    }
    (rows, config.margin + grid_width, bottom)
}

fn place_isolated(
    nodes: &mut BTreeMap<String, NodeLayout>,
    graph: &Graph,
    grid_bottom: f32,
    grid_empty: bool,
    config: &LayoutConfig,
) -> Option<RegionLayout> {
    let mut isolated: Vec<(u8, &str)> = graph
        .isolated_nodes()
        .into_iter()
        .map(|id| {
            let order = graph
                .nodes
                .get(id)
                .map_or(u8::MAX, |node| node.category.sequence_order());
            (order, id)
        })
        .collect();
    if isolated.is_empty() {
        return None;
    }
    isolated.sort();

    let columns = config.isolated_max_columns.max(1).min(isolated.len());
    let cell_width = isolated
        .iter()
        .filter_map(|(_, id)| nodes.get(*id))
        .map(|node| node.width)
        .fold(0.0, f32::max)
        + config.column_gap;
    let cell_height = isolated
        .iter()
        .filter_map(|(_, id)| nodes.get(*id))
        .map(|node| node.height)
        .fold(0.0, f32::max)
        + ISOLATED_ROW_GAP;
    let row_count = isolated.len().div_ceil(columns);

    let region_x = config.margin;
    let region_y = if grid_empty {
        config.margin
    } else {
        grid_bottom + config.isolated_gap
    };
    let inner_x = region_x + REGION_PADDING;
    let inner_y = region_y + config.isolated_header_height + REGION_PADDING;

    for (rank, (_, id)) in isolated.iter().enumerate() {
        if let Some(node) = nodes.get_mut(*id) {
            node.rank = rank;
            node.x = (inner_x + (rank % columns) as f32 * cell_width).round();
            node.y = (inner_y + (rank / columns) as f32 * cell_height).round();
        }
    }

    Some(RegionLayout {
        x: region_x,
        y: region_y,
        width: (columns as f32 * cell_width - config.column_gap + REGION_PADDING * 2.0).round(),
        height: (config.isolated_header_height
            + row_count as f32 * cell_height
            - ISOLATED_ROW_GAP
            + REGION_PADDING * 2.0)
            .round(),
        header_height: config.isolated_header_height,
    })
}
