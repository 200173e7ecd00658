use crate::error::{Error, Result};
use crate::ir::{Category, EdgeKind};
use crate::theme::Theme;
use serde::{Deserialize, Serialize};
use std::path::Path;

#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(default)]
pub struct LayoutConfig {
    /// Left/top margin around the main grid.
    pub margin: f32,
    /// Minimum distance between the tops of consecutive levels.
    pub row_height: f32,
    /// Free vertical space kept between rows for routing.
    pub row_gap: f32,
    /// Minimum horizontal pitch between node centres.
    pub column_width: f32,
    pub column_gap: f32,
    /// Levels holding more nodes than this get a wider pitch.
    pub crowded_level_threshold: usize,
    pub crowded_spread: f32,
    pub min_node_width: f32,
    pub max_node_width: f32,
    pub min_node_height: f32,
    pub max_node_height: f32,
    pub node_padding_x: f32,
    pub node_padding_y: f32,
    pub font_size: f32,
    pub entry_font_size: f32,
    pub small_font_size: f32,
    pub label_line_height: f32,
    pub max_label_chars: usize,
    /// Upper bound on barycenter ordering sweeps.
    pub order_passes: usize,
    /// Base clearance of lateral arcs above/below their row.
    pub lateral_buffer: f32,
    /// Distance between neighbouring routing lanes.
    pub lane_step: f32,
    pub obstacle_padding: f32,
    pub isolated_gap: f32,
    pub isolated_max_columns: usize,
    pub isolated_header_height: f32,
}

impl Default for LayoutConfig {
    fn default() -> Self {
        Self {
            margin: 120.0,
            row_height: 220.0,
            row_gap: 120.0,
            column_width: 280.0,
            column_gap: 80.0,
            crowded_level_threshold: 8,
            crowded_spread: 0.08,
            min_node_width: 100.0,
            max_node_width: 300.0,
            min_node_height: 50.0,
            max_node_height: 100.0,
            node_padding_x: 20.0,
            node_padding_y: 20.0,
            font_size: 11.0,
            entry_font_size: 12.0,
            small_font_size: 10.0,
            label_line_height: 1.35,
            max_label_chars: 25,
            order_passes: 4,
            lateral_buffer: 30.0,
            lane_step: 14.0,
            obstacle_padding: 8.0,
            isolated_gap: 160.0,
            isolated_max_columns: 4,
            isolated_header_height: 35.0,
        }
    }
}

#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(default)]
pub struct DiagramConfig {
    pub diagram_name: String,
    pub diagram_id: String,
    pub title: String,
    pub show_summary: bool,
    pub isolated_header: String,
    pub empty_notice: String,
    pub min_page_width: f32,
    pub min_page_height: f32,
}

impl Default for DiagramConfig {
    fn default() -> Self {
        Self {
            diagram_name: "Function Call Graph".to_string(),
            diagram_id: "call-graph".to_string(),
            title: "Function Call Graph".to_string(),
            show_summary: true,
            isolated_header: "Isolated Functions".to_string(),
            empty_notice: "No functions were found in the supplied call graphs".to_string(),
            min_page_width: 1200.0,
            min_page_height: 900.0,
        }
    }
}

#[derive(Debug, Clone, Default, Serialize, Deserialize)]
#[serde(default)]
pub struct Config {
    pub theme: Theme,
    pub layout: LayoutConfig,
    pub diagram: DiagramConfig,
}

#[derive(Debug, Default, Deserialize)]
#[serde(rename_all = "camelCase")]
struct ConfigFile {
    theme_preset: Option<String>,
    theme: Option<serde_json::Value>,
    layout: Option<serde_json::Value>,
    diagram: Option<serde_json::Value>,
}

pub fn load_config(path: Option<&Path>) -> Result<Config> {
    let Some(path) = path else {
        return Ok(Config::default());
    };
    let contents = std::fs::read_to_string(path)?;
    parse_config(&contents)
}

pub fn parse_config(contents: &str) -> Result<Config> {
    let parsed: ConfigFile = match serde_json::from_str(contents) {
        Ok(parsed) => parsed,
        Err(strict_err) => json5::from_str(contents).map_err(|relaxed_err| {
            Error::Config(format!("{strict_err} (json5: {relaxed_err})"))
        })?,
    };

    let mut config = Config::default();
    if let Some(preset) = parsed.theme_preset.as_deref() {
        config.theme = match preset {
            "default" | "drawio" => Theme::drawio_default(),
            "monochrome" | "mono" => Theme::monochrome(),
            other => return Err(Error::Config(format!("unknown theme preset '{other}'"))),
        };
    }
    if let Some(patch) = parsed.theme {
        config.theme = apply_patch(&config.theme, patch)?;
    }
    if let Some(patch) = parsed.layout {
        config.layout = apply_patch(&config.layout, patch)?;
    }
    if let Some(patch) = parsed.diagram {
        config.diagram = apply_patch(&config.diagram, patch)?;
    }
    validate_layout(&config.layout)?;
    validate_theme(&config.theme)?;
    Ok(config)
}

/// Overlay a partial JSON object onto an existing value, keeping every field
/// the patch does not mention.
fn apply_patch<T>(base: &T, patch: serde_json::Value) -> Result<T>
where
    T: Serialize + for<'de> Deserialize<'de>,
{
    let mut merged = serde_json::to_value(base)?;
    merge_json(&mut merged, patch);
    Ok(serde_json::from_value(merged)?)
}

fn merge_json(base: &mut serde_json::Value, patch: serde_json::Value) {
    match (base, patch) {
        (serde_json::Value::Object(base_map), serde_json::Value::Object(patch_map)) => {
            for (key, value) in patch_map {
                match base_map.get_mut(&key) {
                    Some(slot) => merge_json(slot, value),
                    None => {
                        base_map.insert(key, value);
                    }
                }
            }
        }
        (slot, value) => *slot = value,
    }
}

fn validate_layout(layout: &LayoutConfig) -> Result<()> {
    if layout.min_node_width > layout.max_node_width {
        return Err(Error::Config(
            "layout.min_node_width exceeds layout.max_node_width".to_string(),
        ));
    }
    if layout.min_node_height > layout.max_node_height {
        return Err(Error::Config(
            "layout.min_node_height exceeds layout.max_node_height".to_string(),
        ));
    }
    if layout.max_label_chars < 4 {
        return Err(Error::Config("layout.max_label_chars must be at least 4".to_string()));
    }
    Ok(())
}

/// Theme values end up inside draw.io style strings, where `;` separates
/// entries; colours must also be plain tokens.
fn validate_theme(theme: &Theme) -> Result<()> {
    let mut colours: Vec<(String, &str)> = Vec::new();
    for category in Category::ALL {
        let style = theme.nodes.get(category);
        let name = category.as_str();
        colours.push((format!("nodes.{name}.fill_color"), style.fill_color.as_str()));
        colours.push((format!("nodes.{name}.stroke_color"), style.stroke_color.as_str()));
        colours.push((format!("nodes.{name}.font_color"), style.font_color.as_str()));
    }
    for kind in EdgeKind::ALL {
        colours.push((
            format!("edges.{}.stroke_color", kind.as_str()),
            theme.edges.get(kind).stroke_color.as_str(),
        ));
    }
    colours.push(("isolated.fill_color".to_string(), theme.isolated.fill_color.as_str()));
    colours.push(("isolated.stroke_color".to_string(), theme.isolated.stroke_color.as_str()));
    colours.push(("isolated.font_color".to_string(), theme.isolated.font_color.as_str()));
    for (name, value) in [
        ("region_fill", &theme.region_fill),
        ("region_stroke", &theme.region_stroke),
        ("header_fill", &theme.header_fill),
        ("header_text", &theme.header_text),
        ("summary_text", &theme.summary_text),
        ("background", &theme.background),
    ] {
        colours.push((name.to_string(), value.as_str()));
    }

    for (name, value) in colours {
        if value.is_empty() || value.contains(['"', '\'', ';', '<', '>', '&', '=']) {
            return Err(Error::Config(format!(
                "theme.{name} is not a valid colour: '{value}'"
            )));
        }
    }
    if theme.font_family.contains([';', '=']) {
        return Err(Error::Config(format!(
            "theme.font_family may not contain ';' or '=': '{}'",
            theme.font_family
        )));
    }
    Ok(())
}
