use serde::{Deserialize, Serialize};

use crate::ir::{Category, EdgeKind};

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct NodeStyle {
    pub fill_color: String,
    pub stroke_color: String,
    pub font_color: String,
    pub bold: bool,
    pub dashed: bool,
}

impl NodeStyle {
    fn new(fill: &str, stroke: &str, font: &str) -> Self {
        Self {
            fill_color: fill.to_string(),
            stroke_color: stroke.to_string(),
            font_color: font.to_string(),
            bold: false,
            dashed: false,
        }
    }
}

impl Default for NodeStyle {
    fn default() -> Self {
        Self::new("#74c0fc", "#339af0", "#ffffff")
    }
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct EdgeStyle {
    pub stroke_color: String,
    pub stroke_width: f32,
    pub dashed: bool,
    pub opacity: u8,
}

impl EdgeStyle {
    fn new(stroke: &str, width: f32, dashed: bool, opacity: u8) -> Self {
        Self {
            stroke_color: stroke.to_string(),
            stroke_width: width,
            dashed,
            opacity,
        }
    }
}

impl Default for EdgeStyle {
    fn default() -> Self {
        Self::new("#339af0", 2.0, false, 85)
    }
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct CategoryPalette {
    pub entry: NodeStyle,
    pub init: NodeStyle,
    pub config: NodeStyle,
    pub error: NodeStyle,
    pub test: NodeStyle,
    pub io: NodeStyle,
    pub timing: NodeStyle,
    pub utility: NodeStyle,
    pub generic: NodeStyle,
}

impl Default for CategoryPalette {
    fn default() -> Self {
        Self {
            entry: NodeStyle {
                bold: true,
                ..NodeStyle::new("#ff6b6b", "#e03131", "#ffffff")
            },
            init: NodeStyle::new("#51cf66", "#37b24d", "#ffffff"),
            config: NodeStyle::new("#69db7c", "#51cf66", "#ffffff"),
            error: NodeStyle::new("#ffd43b", "#fab005", "#212529"),
            test: NodeStyle::new("#da77f2", "#be4bdb", "#ffffff"),
            io: NodeStyle::new("#9775fa", "#7950f2", "#ffffff"),
            timing: NodeStyle::new("#ff8787", "#fd7e14", "#ffffff"),
            utility: NodeStyle::new("#38d9a9", "#20c997", "#ffffff"),
            generic: NodeStyle::default(),
        }
    }
}

impl CategoryPalette {
    pub fn get(&self, category: Category) -> &NodeStyle {
        match category {
            Category::Entry => &self.entry,
            Category::Init => &self.init,
            Category::Config => &self.config,
            Category::Error => &self.error,
            Category::Test => &self.test,
            Category::Io => &self.io,
            Category::Timing => &self.timing,
            Category::Utility => &self.utility,
            Category::Generic => &self.generic,
        }
    }
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct EdgePalette {
    pub main_path: EdgeStyle,
    pub error_path: EdgeStyle,
    pub lateral: EdgeStyle,
    pub callback: EdgeStyle,
    pub call: EdgeStyle,
}

impl Default for EdgePalette {
    fn default() -> Self {
        Self {
            main_path: EdgeStyle::new("#1976d2", 4.0, false, 90),
            error_path: EdgeStyle::new("#e53e3e", 2.5, true, 85),
            lateral: EdgeStyle::new("#38d9a9", 2.0, false, 80),
            callback: EdgeStyle::new("#fd7e14", 2.0, true, 75),
            call: EdgeStyle::default(),
        }
    }
}

impl EdgePalette {
    pub fn get(&self, kind: EdgeKind) -> &EdgeStyle {
        match kind {
            EdgeKind::MainPath => &self.main_path,
            EdgeKind::ErrorPath => &self.error_path,
            EdgeKind::Lateral => &self.lateral,
            EdgeKind::Callback => &self.callback,
            EdgeKind::Call => &self.call,
        }
    }
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct Theme {
    pub font_family: String,
    pub nodes: CategoryPalette,
    pub edges: EdgePalette,
    pub isolated: NodeStyle,
    pub region_fill: String,
    pub region_stroke: String,
    pub header_fill: String,
    pub header_text: String,
    pub summary_text: String,
    pub background: String,
}

impl Default for Theme {
    fn default() -> Self {
        Self::drawio_default()
    }
}

impl Theme {
    pub fn drawio_default() -> Self {
        Self {
            font_family: "Helvetica".to_string(),
            nodes: CategoryPalette::default(),
            edges: EdgePalette::default(),
            isolated: NodeStyle {
                dashed: true,
                ..NodeStyle::new("#f8f9fa", "#868e96", "#495057")
            },
            region_fill: "#f8f9fa".to_string(),
            region_stroke: "#adb5bd".to_string(),
            header_fill: "#e9ecef".to_string(),
            header_text: "#495057".to_string(),
            summary_text: "#343a40".to_string(),
            background: "#ffffff".to_string(),
        }
    }

    /// Greyscale variant for printing.
    pub fn monochrome() -> Self {
        let grey = |fill: &str| NodeStyle::new(fill, "#343a40", "#212529");
        Self {
            nodes: CategoryPalette {
                entry: NodeStyle {
                    bold: true,
                    ..grey("#ced4da")
                },
                init: grey("#dee2e6"),
                config: grey("#dee2e6"),
                error: grey("#adb5bd"),
                test: grey("#e9ecef"),
                io: grey("#dee2e6"),
                timing: grey("#e9ecef"),
                utility: grey("#f1f3f5"),
                generic: grey("#f8f9fa"),
            },
            edges: EdgePalette {
                main_path: EdgeStyle::new("#212529", 3.0, false, 100),
                error_path: EdgeStyle::new("#495057", 2.0, true, 100),
                lateral: EdgeStyle::new("#868e96", 1.5, false, 100),
                callback: EdgeStyle::new("#495057", 1.5, true, 100),
                call: EdgeStyle::new("#495057", 1.5, false, 100),
            },
            ..Self::drawio_default()
        }
    }

    pub fn node_style(&self, category: Category, isolated: bool) -> &NodeStyle {
        if isolated {
            &self.isolated
        } else {
            self.nodes.get(category)
        }
    }

    pub fn edge_style(&self, kind: EdgeKind) -> &EdgeStyle {
        self.edges.get(kind)
    }
}
