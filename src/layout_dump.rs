use crate::layout::Layout;
use serde::Serialize;
use std::fs::File;
use std::io::BufWriter;
use std::path::Path;

/// JSON snapshot of a computed layout, for debugging placement and routing.
#[derive(Debug, Serialize)]
pub struct LayoutDump {
    pub width: f32,
    pub height: f32,
    pub entries: Vec<String>,
    pub nodes: Vec<NodeDump>,
    pub edges: Vec<EdgeDump>,
    pub rows: Vec<RowDump>,
    pub isolated_region: Option<RegionDump>,
}

#[derive(Debug, Serialize)]
pub struct NodeDump {
    pub id: String,
    pub category: String,
    pub level: Option<usize>,
    pub rank: usize,
    pub x: f32,
    pub y: f32,
    pub width: f32,
    pub height: f32,
    pub font_size: f32,
    pub label_lines: Vec<String>,
}

#[derive(Debug, Serialize)]
pub struct EdgeDump {
    pub from: String,
    pub to: String,
    pub kind: String,
    pub multiplicity: usize,
    pub points: Vec<[f32; 2]>,
}

#[derive(Debug, Serialize)]
pub struct RowDump {
    pub level: usize,
    pub y: f32,
    pub height: f32,
    pub nodes: Vec<String>,
}

#[derive(Debug, Serialize)]
pub struct RegionDump {
    pub x: f32,
    pub y: f32,
    pub width: f32,
    pub height: f32,
}

impl LayoutDump {
    pub fn from_layout(layout: &Layout) -> Self {
        let nodes = layout
            .nodes
            .iter()
            .map(|node| NodeDump {
                id: node.id.clone(),
                category: node.category.as_str().to_string(),
                level: node.level,
                rank: node.rank,
                x: node.x,
                y: node.y,
                width: node.width,
                height: node.height,
                font_size: node.font_size,
                label_lines: node.label.lines.clone(),
            })
            .collect();

        let edges = layout
            .edges
            .iter()
            .map(|edge| EdgeDump {
                from: edge.from.clone(),
                to: edge.to.clone(),
                kind: edge.kind.as_str().to_string(),
                multiplicity: edge.multiplicity,
                points: edge.points.iter().map(|(x, y)| [*x, *y]).collect(),
            })
            .collect();

        let rows = layout
            .rows
            .iter()
            .map(|row| RowDump {
                level: row.level,
                y: row.y,
                height: row.height,
                nodes: row.nodes.clone(),
            })
            .collect();

        LayoutDump {
            width: layout.width,
            height: layout.height,
            entries: layout.entries.clone(),
            nodes,
            edges,
            rows,
            isolated_region: layout.isolated_region.as_ref().map(|region| RegionDump {
                x: region.x,
                y: region.y,
                width: region.width,
                height: region.height,
            }),
        }
    }
}

pub fn write_layout_dump(path: &Path, layout: &Layout) -> anyhow::Result<()> {
    let file = File::create(path)?;
    let writer = BufWriter::new(file);
    let dump = LayoutDump::from_layout(layout);
    serde_json::to_writer_pretty(writer, &dump)?;
    Ok(())
}
