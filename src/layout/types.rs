use crate::error::Warning;
use crate::ir::{Category, EdgeKind};

#[derive(Debug, Clone)]
pub struct TextBlock {
    pub lines: Vec<String>,
    pub width: f32,
    pub height: f32,
}

/// Placed function box. `x`/`y` are the top-left corner.
#[derive(Debug, Clone)]
pub struct NodeLayout {
    pub id: String,
    pub label: TextBlock,
    pub category: Category,
    /// Depth from the nearest entry point; `None` for isolated nodes.
    pub level: Option<usize>,
    /// Position within the level (or within the isolated grid).
    pub rank: usize,
    pub x: f32,
    pub y: f32,
    pub width: f32,
    pub height: f32,
    pub font_size: f32,
}

impl NodeLayout {
    pub fn is_isolated(&self) -> bool {
        self.level.is_none()
    }

    pub fn center(&self) -> (f32, f32) {
        (self.x + self.width / 2.0, self.y + self.height / 2.0)
    }

    pub fn right(&self) -> f32 {
        self.x + self.width
    }

    pub fn bottom(&self) -> f32 {
        self.y + self.height
    }
}

#[derive(Debug, Clone)]
pub struct EdgeLayout {
    pub from: String,
    pub to: String,
    pub kind: EdgeKind,
    pub multiplicity: usize,
    /// Start, waypoints, end. Always at least two points.
    pub points: Vec<(f32, f32)>,
}

/// Horizontal band occupied by one level.
#[derive(Debug, Clone)]
pub struct RowLayout {
    pub level: usize,
    pub y: f32,
    pub height: f32,
    pub nodes: Vec<String>,
}

#[derive(Debug, Clone)]
pub struct RegionLayout {
    pub x: f32,
    pub y: f32,
    pub width: f32,
    pub height: f32,
    pub header_height: f32,
}

#[derive(Debug, Clone, Default)]
pub struct Layout {
    /// Ordered by identity.
    pub nodes: Vec<NodeLayout>,
    /// Ordered by (caller, callee).
    pub edges: Vec<EdgeLayout>,
    pub rows: Vec<RowLayout>,
    pub entries: Vec<String>,
    pub isolated_region: Option<RegionLayout>,
    pub width: f32,
    pub height: f32,
    pub warnings: Vec<Warning>,
}

impl Layout {
    pub fn node(&self, id: &str) -> Option<&NodeLayout> {
        self.nodes
            .binary_search_by(|node| node.id.as_str().cmp(id))
            .ok()
            .map(|idx| &self.nodes[idx])
    }

    pub fn isolated_count(&self) -> usize {
        self.nodes.iter().filter(|node| node.is_isolated()).count()
    }

    pub fn level_count(&self) -> usize {
        self.rows.len()
    }
}
