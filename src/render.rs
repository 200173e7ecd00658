use crate::config::DiagramConfig;
use crate::error::{Error, Result};
use crate::layout::{EdgeLayout, Layout, NodeLayout, RegionLayout};
use crate::theme::{EdgeStyle, NodeStyle, Theme};
use serde::Serialize;
use std::collections::{HashMap, HashSet};

const TITLE_Y: f32 = 30.0;
const STATS_Y: f32 = 64.0;
const SUMMARY_WIDTH: f32 = 520.0;
const DEFAULT_MARGIN: f32 = 120.0;
const MAX_MULTIPLICITY_BOOST: usize = 4;

/// Totals reported next to the diagram.
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize)]
pub struct Statistics {
    pub nodes: usize,
    pub edges: usize,
    /// Sum of edge multiplicities.
    pub calls: usize,
    pub fragments: usize,
    pub isolated: usize,
    pub levels: usize,
    pub warnings: usize,
}

impl Statistics {
    pub fn from_layout(layout: &Layout, fragments: usize, warnings: usize) -> Self {
        Self {
            nodes: layout.nodes.len(),
            edges: layout.edges.len(),
            calls: layout.edges.iter().map(|edge| edge.multiplicity).sum(),
            fragments,
            isolated: layout.isolated_count(),
            levels: layout.level_count(),
            warnings,
        }
    }

    pub fn summary_line(&self) -> String {
        format!(
            "{} functions · {} calls · {} fragments · {} isolated",
            self.nodes, self.edges, self.fragments, self.isolated
        )
    }
}

/// Serialize a finished layout as a draw.io document.
///
/// The layout is validated first; on error nothing is produced.
pub fn render_drawio(
    layout: &Layout,
    stats: &Statistics,
    theme: &Theme,
    diagram: &DiagramConfig,
) -> Result<String> {
    validate(layout)?;

    let cell_ids: HashMap<&str, String> = layout
        .nodes
        .iter()
        .enumerate()
        .map(|(idx, node)| (node.id.as_str(), format!("node-{}", idx + 1)))
        .collect();

    let page_width = layout.width.max(diagram.min_page_width);
    let page_height = layout.height.max(diagram.min_page_height);

    let mut xml = String::new();
    xml.push_str("<?xml version=\"1.0\" encoding=\"UTF-8\"?>\n");
    xml.push_str("<mxfile host=\"cg2drawio\" type=\"device\">\n");
    xml.push_str(&format!(
        "  <diagram id=\"{}\" name=\"{}\">\n",
        escape_xml(&diagram.diagram_id),
        escape_xml(&diagram.diagram_name)
    ));
    xml.push_str(&format!(
        "    <mxGraphModel dx=\"{w}\" dy=\"{h}\" grid=\"1\" gridSize=\"10\" guides=\"1\" tooltips=\"1\" connect=\"1\" arrows=\"1\" fold=\"1\" page=\"1\" pageScale=\"1\" pageWidth=\"{w}\" pageHeight=\"{h}\" background=\"{}\" math=\"0\" shadow=\"0\">\n",
        escape_xml(&theme.background),
        w = fmt_num(page_width),
        h = fmt_num(page_height),
    ));
    xml.push_str("      <root>\n");
    xml.push_str("        <mxCell id=\"0\"/>\n");
    xml.push_str("        <mxCell id=\"1\" parent=\"0\"/>\n");

    if let Some(region) = &layout.isolated_region {
        xml.push_str(&region_cells(region, theme, diagram));
    }
    for (idx, node) in layout.nodes.iter().enumerate() {
        xml.push_str(&node_cell(idx + 1, node, theme));
    }
    for (idx, edge) in layout.edges.iter().enumerate() {
        xml.push_str(&edge_cell(idx + 1, edge, layout, &cell_ids, theme)?);
    }
    if layout.nodes.is_empty() {
        xml.push_str(&text_cell(
            "empty-notice",
            &diagram.empty_notice,
            (layout_margin(layout), STATS_Y + 50.0, SUMMARY_WIDTH, 60.0),
            &format!(
                "rounded=1;whiteSpace=wrap;html=0;fillColor={};strokeColor={};fontColor={};fontSize=14;dashed=1;",
                theme.region_fill, theme.region_stroke, theme.header_text
            ),
        ));
    }
    if diagram.show_summary {
        xml.push_str(&text_cell(
            "summary-title",
            &diagram.title,
            (layout_margin(layout), TITLE_Y, SUMMARY_WIDTH, 30.0),
            &format!(
                "text;html=0;align=left;verticalAlign=middle;fontSize=18;fontStyle=1;fontColor={};fontFamily={};",
                theme.summary_text, theme.font_family
            ),
        ));
        xml.push_str(&text_cell(
            "summary-stats",
            &stats.summary_line(),
            (layout_margin(layout), STATS_Y, SUMMARY_WIDTH, 24.0),
            &format!(
                "text;html=0;align=left;verticalAlign=middle;fontSize=12;fontColor={};fontFamily={};",
                theme.summary_text, theme.font_family
            ),
        ));
    }

    xml.push_str("      </root>\n");
    xml.push_str("    </mxGraphModel>\n");
    xml.push_str("  </diagram>\n");
    xml.push_str("</mxfile>\n");
    Ok(xml)
}

/// Reject layouts that would produce a document the viewer has to repair.
fn validate(layout: &Layout) -> Result<()> {
    let mut seen: HashSet<&str> = HashSet::with_capacity(layout.nodes.len());
    for node in &layout.nodes {
        if !seen.insert(node.id.as_str()) {
            return Err(Error::Serialization(format!(
                "two shapes share the identity '{}'",
                node.id
            )));
        }
        let values = [node.x, node.y, node.width, node.height];
        if values.iter().any(|v| !v.is_finite()) || node.width <= 0.0 || node.height <= 0.0 {
            return Err(Error::Serialization(format!(
                "shape '{}' has invalid geometry",
                node.id
            )));
        }
    }
    for edge in &layout.edges {
        if !seen.contains(edge.from.as_str()) || !seen.contains(edge.to.as_str()) {
            return Err(Error::Serialization(format!(
                "connector {} -> {} references a missing shape",
                edge.from, edge.to
            )));
        }
        if edge.points.len() < 2 {
            return Err(Error::Serialization(format!(
                "connector {} -> {} has no route",
                edge.from, edge.to
            )));
        }
        if edge
            .points
            .iter()
            .any(|(x, y)| !x.is_finite() || !y.is_finite())
        {
            return Err(Error::Serialization(format!(
                "connector {} -> {} has a non-finite waypoint",
                edge.from, edge.to
            )));
        }
    }
    if !layout.width.is_finite() || !layout.height.is_finite() {
        return Err(Error::Serialization("page size is not finite".to_string()));
    }
    Ok(())
}

/// Left edge of the drawing, used to align the summary block.
fn layout_margin(layout: &Layout) -> f32 {
    layout
        .nodes
        .iter()
        .map(|node| node.x)
        .chain(layout.isolated_region.iter().map(|region| region.x))
        .reduce(f32::min)
        .unwrap_or(DEFAULT_MARGIN)
}

fn node_cell(index: usize, node: &NodeLayout, theme: &Theme) -> String {
    let style = theme.node_style(node.category, node.is_isolated());
    let level = node
        .level
        .map(|level| level.to_string())
        .unwrap_or_else(|| "isolated".to_string());
    format!(
        "        <UserObject label=\"{label}\" tooltip=\"{tooltip}\" category=\"{category}\" level=\"{level}\" id=\"node-{index}\">\n          <mxCell style=\"{style}\" vertex=\"1\" parent=\"1\">\n            <mxGeometry x=\"{x}\" y=\"{y}\" width=\"{w}\" height=\"{h}\" as=\"geometry\"/>\n          </mxCell>\n        </UserObject>\n",
        label = escape_xml(&node.label.lines.join("\n")),
        tooltip = escape_xml(&node.id),
        category = node.category.as_str(),
        style = escape_xml(&node_style_string(style, node.font_size, &theme.font_family)),
        x = fmt_num(node.x),
        y = fmt_num(node.y),
        w = fmt_num(node.width),
        h = fmt_num(node.height),
    )
}

fn node_style_string(style: &NodeStyle, font_size: f32, font_family: &str) -> String {
    format!(
        "rounded=1;whiteSpace=wrap;html=0;fillColor={};strokeColor={};fontColor={};fontSize={};fontFamily={};fontStyle={};dashed={};strokeWidth=2;arcSize=12;",
        style.fill_color,
        style.stroke_color,
        style.font_color,
        fmt_num(font_size),
        font_family,
        u8::from(style.bold),
        u8::from(style.dashed),
    )
}

fn edge_cell(
    index: usize,
    edge: &EdgeLayout,
    layout: &Layout,
    cell_ids: &HashMap<&str, String>,
    theme: &Theme,
) -> Result<String> {
    let (Some(source), Some(target)) = (layout.node(&edge.from), layout.node(&edge.to)) else {
        return Err(Error::Serialization(format!(
            "connector {} -> {} references a missing shape",
            edge.from, edge.to
        )));
    };
    let (Some(source_id), Some(target_id)) = (
        cell_ids.get(edge.from.as_str()),
        cell_ids.get(edge.to.as_str()),
    ) else {
        return Err(Error::Serialization(format!(
            "connector {} -> {} has no cell id",
            edge.from, edge.to
        )));
    };
    let (Some(start), Some(end)) = (edge.points.first(), edge.points.last()) else {
        return Err(Error::Serialization(format!(
            "connector {} -> {} has no route",
            edge.from, edge.to
        )));
    };

    let value = if edge.multiplicity > 1 {
        format!("×{}", edge.multiplicity)
    } else {
        String::new()
    };
    let style = edge_style_string(
        theme.edge_style(edge.kind),
        edge.multiplicity,
        anchor(source, *start),
        anchor(target, *end),
    );

    let mut xml = format!(
        "        <mxCell id=\"edge-{index}\" value=\"{}\" style=\"{}\" edge=\"1\" parent=\"1\" source=\"{source_id}\" target=\"{target_id}\">\n",
        escape_xml(&value),
        escape_xml(&style),
    );
    let inner = &edge.points[1..edge.points.len() - 1];
    if inner.is_empty() {
        xml.push_str("          <mxGeometry relative=\"1\" as=\"geometry\"/>\n");
    } else {
        xml.push_str("          <mxGeometry relative=\"1\" as=\"geometry\">\n");
        xml.push_str("            <Array as=\"points\">\n");
        for (x, y) in inner {
            xml.push_str(&format!(
                "              <mxPoint x=\"{}\" y=\"{}\"/>\n",
                fmt_num(*x),
                fmt_num(*y)
            ));
        }
        xml.push_str("            </Array>\n");
        xml.push_str("          </mxGeometry>\n");
    }
    xml.push_str("        </mxCell>\n");
    Ok(xml)
}

fn edge_style_string(
    style: &EdgeStyle,
    multiplicity: usize,
    exit: (f32, f32),
    entry: (f32, f32),
) -> String {
    let boost = multiplicity.saturating_sub(1).min(MAX_MULTIPLICITY_BOOST) as f32 * 0.5;
    format!(
        "edgeStyle=none;rounded=1;html=0;endArrow=block;endFill=1;strokeColor={};strokeWidth={};dashed={};opacity={};exitX={};exitY={};exitDx=0;exitDy=0;entryX={};entryY={};entryDx=0;entryDy=0;",
        style.stroke_color,
        fmt_num(style.stroke_width + boost),
        u8::from(style.dashed),
        style.opacity,
        fmt_ratio(exit.0),
        fmt_ratio(exit.1),
        fmt_ratio(entry.0),
        fmt_ratio(entry.1),
    )
}

/// Relative position of `point` on the node's bounding box.
fn anchor(node: &NodeLayout, point: (f32, f32)) -> (f32, f32) {
    (
        ((point.0 - node.x) / node.width).clamp(0.0, 1.0),
        ((point.1 - node.y) / node.height).clamp(0.0, 1.0),
    )
}

fn region_cells(region: &RegionLayout, theme: &Theme, diagram: &DiagramConfig) -> String {
    let mut xml = String::new();
    xml.push_str(&text_cell(
        "isolated-region",
        "",
        (region.x, region.y, region.width, region.height),
        &format!(
            "rounded=1;whiteSpace=wrap;html=0;fillColor={};strokeColor={};dashed=1;arcSize=4;",
            theme.region_fill, theme.region_stroke
        ),
    ));
    xml.push_str(&text_cell(
        "isolated-header",
        &diagram.isolated_header,
        (region.x, region.y, region.width, region.header_height),
        &format!(
            "text;html=0;align=center;verticalAlign=middle;fillColor={};fontColor={};fontSize=14;fontStyle=1;",
            theme.header_fill, theme.header_text
        ),
    ));
    xml
}

fn text_cell(id: &str, value: &str, geometry: (f32, f32, f32, f32), style: &str) -> String {
    let (x, y, w, h) = geometry;
    format!(
        "        <mxCell id=\"{id}\" value=\"{}\" style=\"{}\" vertex=\"1\" parent=\"1\">\n          <mxGeometry x=\"{}\" y=\"{}\" width=\"{}\" height=\"{}\" as=\"geometry\"/>\n        </mxCell>\n",
        escape_xml(value),
        escape_xml(style),
        fmt_num(x),
        fmt_num(y),
        fmt_num(w),
        fmt_num(h),
    )
}

/// Whole numbers print without a fraction, everything else with at most two
/// decimals, so the output is stable across runs.
fn fmt_num(value: f32) -> String {
    trim_fraction(format!("{value:.2}"))
}

fn fmt_ratio(value: f32) -> String {
    trim_fraction(format!("{value:.4}"))
}

fn trim_fraction(text: String) -> String {
    let trimmed = if text.contains('.') {
        text.trim_end_matches('0').trim_end_matches('.')
    } else {
        text.as_str()
    };
    match trimmed {
        "-0" | "" => "0".to_string(),
        other => other.to_string(),
    }
}

/// Escape for attribute values; newlines become character references and
/// other control characters are dropped.
pub(crate) fn escape_xml(input: &str) -> String {
    let mut out = String::with_capacity(input.len());
    for ch in input.chars() {
        match ch {
            '&' => out.push_str("&amp;"),
            '<' => out.push_str("&lt;"),
            '>' => out.push_str("&gt;"),
            '"' => out.push_str("&quot;"),
            '\'' => out.push_str("&apos;"),
            '\n' => out.push_str("&#xa;"),
            ch if ch.is_control() => {}
            ch => out.push(ch),
        }
    }
    out
}
