use crate::config::LayoutConfig;
use crate::ir::Category;

use super::TextBlock;

const ISOLATED_SHRINK: f32 = 10.0;

pub(super) fn font_size_for(category: Category, isolated: bool, config: &LayoutConfig) -> f32 {
    if isolated || category == Category::Test {
        config.small_font_size
    } else if category == Category::Entry {
        config.entry_font_size
    } else {
        config.font_size
    }
}

/// Shorten a label to `max_chars` characters, ending in `...` when cut.
pub(super) fn truncate_label(label: &str, max_chars: usize) -> String {
    if label.chars().count() <= max_chars {
        return label.to_string();
    }
    let keep = max_chars.saturating_sub(3);
    let mut out: String = label.chars().take(keep).collect();
    out.push_str("...");
    out
}

pub(super) fn measure_label(text: &str, font_size: f32, config: &LayoutConfig) -> TextBlock {
    let max_width = (config.max_node_width - config.node_padding_x * 2.0).max(font_size);
    let mut lines = wrap_line(text, max_width, font_size);
    if lines.is_empty() {
        lines.push(String::new());
    }
    let width = lines
        .iter()
        .map(|line| text_width(line, font_size))
        .fold(0.0, f32::max);
    let height = lines.len() as f32 * font_size * config.label_line_height;
    TextBlock {
        lines,
        width,
        height,
    }
}

/// Box size for a measured label, clamped to the configured bounds.
pub(super) fn node_size(block: &TextBlock, isolated: bool, config: &LayoutConfig) -> (f32, f32) {
    let mut width = (block.width + config.node_padding_x * 2.0)
        .clamp(config.min_node_width, config.max_node_width);
    if isolated {
        width = (width - ISOLATED_SHRINK).max(config.min_node_width);
    }
    let height = (block.height + config.node_padding_y * 2.0)
        .clamp(config.min_node_height, config.max_node_height);
    (width.round(), height.round())
}

pub(super) fn char_width_factor(ch: char) -> f32 {
    // Relative advance widths for a Helvetica-like face.
    match ch {
        ' ' => 0.278,
        '.' | ',' | ':' | ';' | '|' | '!' | '(' | ')' | '[' | ']' => 0.278,
        '_' => 0.556,
        'A' | 'B' | 'E' | 'K' | 'P' | 'S' | 'V' | 'X' | 'Y' => 0.667,
        'C' | 'D' | 'H' | 'N' | 'R' | 'U' => 0.722,
        'F' | 'T' | 'Z' => 0.611,
        'G' | 'O' | 'Q' => 0.778,
        'I' => 0.278,
        'J' => 0.5,
        'L' => 0.556,
        'M' => 0.833,
        'W' => 0.944,
        'f' | 't' => 0.278,
        'i' | 'j' | 'l' => 0.222,
        'm' => 0.833,
        'r' => 0.333,
        'w' => 0.722,
        'c' | 'k' | 's' | 'v' | 'x' | 'y' | 'z' => 0.5,
        'a'..='z' | '0'..='9' => 0.556,
        '@' | '%' | '&' => 0.9,
        _ => 0.6,
    }
}

pub(super) fn text_width(text: &str, font_size: f32) -> f32 {
    text.chars().map(char_width_factor).sum::<f32>() * font_size
}

/// Greedy wrap at spaces, underscores and scope separators; a single token
/// wider than the limit keeps its own line.
pub(super) fn wrap_line(line: &str, max_width: f32, font_size: f32) -> Vec<String> {
    if text_width(line, font_size) <= max_width {
        return vec![line.to_string()];
    }

    let mut lines = Vec::new();
    let mut current = String::new();
    for token in break_tokens(line) {
        let candidate = format!("{current}{token}");
        if !current.is_empty() && text_width(candidate.trim_end(), font_size) > max_width {
            lines.push(current.trim_end().to_string());
            current = token.trim_start().to_string();
        } else {
            current = candidate;
        }
    }
    if !current.trim().is_empty() {
        lines.push(current.trim_end().to_string());
    }
    lines
}

/// Split after each break opportunity, keeping the separator on the left.
fn break_tokens(line: &str) -> Vec<&str> {
    let mut tokens = Vec::new();
    let mut start = 0;
    for (idx, ch) in line.char_indices() {
        if matches!(ch, ' ' | '_' | ':') {
            let end = idx + ch.len_utf8();
            tokens.push(&line[start..end]);
            start = end;
        }
    }
    if start < line.len() {
        tokens.push(&line[start..]);
    }
    tokens
}
