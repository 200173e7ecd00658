use crate::error::Warning;
use crate::ir::{Fragment, Graph};
use once_cell::sync::Lazy;
use regex::Regex;
use std::collections::{BTreeMap, HashMap, HashSet};

static HEADER_RE: Lazy<Regex> =
    Lazy::new(|| Regex::new(r"(?i)^\s*(?:strict\s+)?(?:di)?graph\b").unwrap());
static ID_RE: Lazy<Regex> = Lazy::new(|| {
    Regex::new(r#"^(?:"(?:[^"\\]|\\.)*"|[A-Za-z_\x{80}-\x{10FFFF}][\w.\x{80}-\x{10FFFF}]*|-?(?:\.\d+|\d+(?:\.\d*)?))$"#)
        .unwrap()
});
static ATTR_RE: Lazy<Regex> = Lazy::new(|| {
    Regex::new(r#"(?P<key>[A-Za-z_]\w*)\s*=\s*(?P<value>"(?:[^"\\]|\\.)*"|<[^>]*>|[^,;\s\]]+)"#)
        .unwrap()
});
static ASSIGN_RE: Lazy<Regex> = Lazy::new(|| Regex::new(r"^[A-Za-z_]\w*\s*=").unwrap());
static SOURCE_EXT_RE: Lazy<Regex> = Lazy::new(|| {
    Regex::new(
        r"\.(c|h|cpp|hpp|cc|cxx|c\+\+|py|pyx|pyi|java|js|ts|jsx|tsx|go|rs|swift|m|mm|cs|php|rb|pl|sh|asm|s)$",
    )
    .unwrap()
});
static SEPARATOR_RE: Lazy<Regex> = Lazy::new(|| Regex::new(r"::|->|\.").unwrap());
static INVALID_CHARS_RE: Lazy<Regex> =
    Lazy::new(|| Regex::new(r#"[<>{}\\/:*?"|\[\]()]"#).unwrap());
static UNDERSCORES_RE: Lazy<Regex> = Lazy::new(|| Regex::new(r"_{2,}").unwrap());
static WHITESPACE_RE: Lazy<Regex> = Lazy::new(|| Regex::new(r"\s+").unwrap());

const RESERVED_NAMES: [&str; 5] = ["node", "edge", "graph", "digraph", "cluster"];

/// Result of parsing one fragment in isolation.
#[derive(Debug, Clone)]
pub struct ParsedFragment {
    pub name: String,
    pub graph: Graph,
    pub warnings: Vec<Warning>,
    /// The fragment was rejected as a whole and contributes nothing.
    pub skipped: bool,
}

#[derive(Debug, Clone, PartialEq, Eq)]
struct Statement {
    text: String,
    line: usize,
}

/// Readable form of a DOT label: escapes, source paths and file extensions
/// removed, scope separators kept.
pub fn display_label(raw: &str) -> String {
    let text = raw
        .replace("\\l", " ")
        .replace("\\n", " ")
        .replace("\\r", " ")
        .replace('\n', " ");
    let text = WHITESPACE_RE.replace_all(text.trim(), " ").into_owned();
    let text = match text.rfind('/') {
        Some(idx) if idx + 1 < text.len() => text[idx + 1..].to_string(),
        _ => text,
    };
    SOURCE_EXT_RE.replace(&text, "").trim().to_string()
}

/// Normalised identity used as the merge key for a function.
pub fn clean_label(raw: &str) -> String {
    let readable = display_label(raw);
    let joined = SEPARATOR_RE.replace_all(&readable, "_");
    let stripped = INVALID_CHARS_RE.replace_all(&joined, "");
    let collapsed = UNDERSCORES_RE.replace_all(&stripped, "_");
    collapsed.trim().trim_matches('_').trim().to_string()
}

pub fn parse_fragment(fragment: &Fragment) -> ParsedFragment {
    let mut parsed = ParsedFragment {
        name: fragment.name.clone(),
        graph: Graph::new(),
        warnings: Vec::new(),
        skipped: false,
    };

    let Some((body, body_line)) = graph_body(&fragment.text) else {
        Warning::SkippedFragment {
            fragment: fragment.name.clone(),
            reason: "no digraph header found".to_string(),
        }
        .emit(&mut parsed.warnings);
        parsed.skipped = true;
        return parsed;
    };

    let (statements, unterminated) = split_statements(body, body_line);
    if unterminated {
        Warning::MalformedRecord {
            fragment: fragment.name.clone(),
            line: statements.last().map(|s| s.line).unwrap_or(body_line),
            reason: "graph body is not terminated".to_string(),
        }
        .emit(&mut parsed.warnings);
    }

    let mut local_ids: HashMap<String, String> = HashMap::new();
    let mut rejected: HashSet<String> = HashSet::new();
    let mut edge_chains: Vec<(Vec<String>, usize)> = Vec::new();

    for statement in &statements {
        match classify_statement(&statement.text) {
            StatementKind::Ignored => {}
            StatementKind::Malformed(reason) => {
                warn_record(&mut parsed, statement.line, reason);
            }
            StatementKind::Node { id, attrs } => {
                if local_ids.contains_key(&id) || rejected.contains(&id) {
                    continue;
                }
                let raw_label = attrs.get("label").cloned().unwrap_or_else(|| id.clone());
                match identity_for(&raw_label) {
                    Ok((identity, label)) => {
                        parsed.graph.ensure_node(&identity, Some(&label));
                        local_ids.insert(id, identity);
                    }
                    Err(reason) => {
                        warn_record(&mut parsed, statement.line, reason);
                        rejected.insert(id);
                    }
                }
            }
            StatementKind::Edges { chain } => edge_chains.push((chain, statement.line)),
        }
    }

    // Edges are resolved after all declarations so a node may be declared
    // after the first edge that mentions it.
    for (chain, line) in edge_chains {
        let mut resolved = Vec::with_capacity(chain.len());
        for raw in &chain {
            if rejected.contains(raw) {
                warn_record(
                    &mut parsed,
                    line,
                    format!("edge endpoint '{raw}' refers to a skipped node"),
                );
                resolved.clear();
                break;
            }
            if let Some(identity) = local_ids.get(raw) {
                resolved.push(identity.clone());
                continue;
            }
            match identity_for(raw) {
                Ok((identity, label)) => {
                    parsed.graph.ensure_node(&identity, Some(&label));
                    local_ids.insert(raw.clone(), identity.clone());
                    resolved.push(identity);
                }
                Err(reason) => {
                    warn_record(&mut parsed, line, reason);
                    rejected.insert(raw.clone());
                    resolved.clear();
                    break;
                }
            }
        }
        for pair in resolved.windows(2) {
            parsed.graph.add_call(&pair[0], &pair[1], 1);
        }
    }

    tracing::debug!(
        fragment = %fragment.name,
        nodes = parsed.graph.nodes.len(),
        edges = parsed.graph.edges.len(),
        "parsed fragment"
    );
    parsed
}

fn warn_record(parsed: &mut ParsedFragment, line: usize, reason: String) {
    Warning::MalformedRecord {
        fragment: parsed.name.clone(),
        line,
        reason,
    }
    .emit(&mut parsed.warnings);
}

fn identity_for(raw_label: &str) -> Result<(String, String), String> {
    let identity = clean_label(raw_label);
    if identity.is_empty() {
        return Err(format!("label '{raw_label}' is empty after cleaning"));
    }
    if RESERVED_NAMES.contains(&identity.to_ascii_lowercase().as_str()) {
        return Err(format!("label '{identity}' is a reserved name"));
    }
    let label = display_label(raw_label);
    let label = if label.is_empty() { identity.clone() } else { label };
    Ok((identity, label))
}

/// Locate the text between the outermost braces of the first graph header.
/// Returns the body and the 1-based line it starts on.
fn graph_body(text: &str) -> Option<(&str, usize)> {
    let mut offset = 0usize;
    for line in text.split_inclusive('\n') {
        let trimmed = line.trim_start();
        if HEADER_RE.is_match(trimmed) {
            let rest = &text[offset..];
            let open = rest.find('{')?;
            let start = offset + open + 1;
            let line_no = text[..start].matches('\n').count() + 1;
            return Some((&text[start..], line_no));
        }
        if !trimmed.is_empty() && !is_comment_line(trimmed) {
            return None;
        }
        offset += line.len();
    }
    None
}

fn is_comment_line(trimmed: &str) -> bool {
    trimmed.starts_with("//") || trimmed.starts_with('#') || trimmed.starts_with("/*")
}

/// Split a graph body into statements on `;`, newlines and braces outside of
/// quotes and attribute lists. The flag reports a missing closing brace.
fn split_statements(body: &str, first_line: usize) -> (Vec<Statement>, bool) {
    let mut statements = Vec::new();
    let mut current = String::new();
    let mut current_line = first_line;
    let mut line = first_line;
    let mut depth = 0usize;
    let mut brace_depth = 0usize;
    let mut in_quote = false;
    let mut escaped = false;
    let mut terminated = false;
    let mut chars = body.chars().peekable();

    while let Some(ch) = chars.next() {
        if current.trim().is_empty() && !ch.is_whitespace() {
            current_line = line;
        }
        if in_quote {
            current.push(ch);
            if ch == '\n' {
                line += 1;
            }
            if escaped {
                escaped = false;
            } else if ch == '\\' {
                escaped = true;
            } else if ch == '"' {
                in_quote = false;
            }
            continue;
        }
        match ch {
            '"' => {
                in_quote = true;
                current.push(ch);
            }
            '/' if chars.peek() == Some(&'/') => {
                for next in chars.by_ref() {
                    if next == '\n' {
                        line += 1;
                        break;
                    }
                }
                if depth == 0 {
                    flush(&mut current, current_line, &mut statements);
                }
            }
            '/' if chars.peek() == Some(&'*') => {
                chars.next();
                let mut prev = '\0';
                for next in chars.by_ref() {
                    if next == '\n' {
                        line += 1;
                    }
                    if prev == '*' && next == '/' {
                        break;
                    }
                    prev = next;
                }
            }
            '#' if current.trim().is_empty() => {
                for next in chars.by_ref() {
                    if next == '\n' {
                        line += 1;
                        break;
                    }
                }
            }
            '[' => {
                depth += 1;
                current.push(ch);
            }
            ']' => {
                depth = depth.saturating_sub(1);
                current.push(ch);
            }
            '\n' => {
                line += 1;
                if depth == 0 {
                    flush(&mut current, current_line, &mut statements);
                } else {
                    current.push(' ');
                }
            }
            // A semicolon or closing brace always ends the statement, which
            // confines an unterminated attribute list to its own record.
            ';' => {
                depth = 0;
                flush(&mut current, current_line, &mut statements);
            }
            '{' if depth == 0 => {
                brace_depth += 1;
                flush(&mut current, current_line, &mut statements);
            }
            '}' => {
                depth = 0;
                flush(&mut current, current_line, &mut statements);
                if brace_depth == 0 {
                    terminated = true;
                    break;
                }
                brace_depth -= 1;
            }
            _ => current.push(ch),
        }
    }
    if !terminated {
        flush(&mut current, current_line, &mut statements);
    }
    (statements, !terminated)
}

fn flush(current: &mut String, line: usize, statements: &mut Vec<Statement>) {
    let text = current.trim();
    if !text.is_empty() {
        statements.push(Statement {
            text: text.to_string(),
            line,
        });
    }
    current.clear();
}

enum StatementKind {
    Ignored,
    Malformed(String),
    Node {
        id: String,
        attrs: BTreeMap<String, String>,
    },
    Edges {
        chain: Vec<String>,
    },
}

fn classify_statement(text: &str) -> StatementKind {
    let (head, attrs_text) = match split_attributes(text) {
        Ok(parts) => parts,
        Err(reason) => return StatementKind::Malformed(reason),
    };
    let head = head.trim();
    if head.is_empty() {
        return StatementKind::Malformed("attribute list without a target".to_string());
    }

    let keyword = head.split_whitespace().next().unwrap_or("").to_ascii_lowercase();
    if matches!(keyword.as_str(), "node" | "edge" | "graph" | "subgraph") {
        return StatementKind::Ignored;
    }
    if attrs_text.is_none() && ASSIGN_RE.is_match(head) {
        return StatementKind::Ignored;
    }

    let parts = split_edge_operators(head);
    for part in &parts {
        if !ID_RE.is_match(part) {
            return StatementKind::Malformed(format!("'{part}' is not a valid node id"));
        }
    }
    let mut ids: Vec<String> = parts.iter().map(|part| unquote(part)).collect();
    if ids.len() == 1 {
        let attrs = attrs_text.map(parse_attributes).unwrap_or_default();
        return StatementKind::Node {
            id: ids.remove(0),
            attrs,
        };
    }
    StatementKind::Edges { chain: ids }
}

/// Separate `head [attrs]`; the attribute list must close the statement.
fn split_attributes(text: &str) -> Result<(&str, Option<&str>), String> {
    let mut in_quote = false;
    let mut escaped = false;
    for (idx, ch) in text.char_indices() {
        if in_quote {
            if escaped {
                escaped = false;
            } else if ch == '\\' {
                escaped = true;
            } else if ch == '"' {
                in_quote = false;
            }
            continue;
        }
        match ch {
            '"' => in_quote = true,
            '[' => {
                let rest = &text[idx + 1..];
                let trimmed = rest.trim_end();
                let Some(inner) = trimmed.strip_suffix(']') else {
                    return Err("unterminated attribute list".to_string());
                };
                return Ok((&text[..idx], Some(inner)));
            }
            _ => {}
        }
    }
    if in_quote {
        return Err("unterminated quoted string".to_string());
    }
    Ok((text, None))
}

fn split_edge_operators(head: &str) -> Vec<String> {
    let mut parts = Vec::new();
    let mut current = String::new();
    let mut in_quote = false;
    let mut escaped = false;
    let mut chars = head.chars().peekable();
    while let Some(ch) = chars.next() {
        if in_quote {
            if escaped {
                escaped = false;
            } else if ch == '\\' {
                escaped = true;
            } else if ch == '"' {
                in_quote = false;
            }
        } else if ch == '"' {
            in_quote = true;
        } else if ch == '-' && matches!(chars.peek(), Some('>') | Some('-')) {
            chars.next();
            parts.push(current.trim().to_string());
            current.clear();
            continue;
        }
        current.push(ch);
    }
    parts.push(current.trim().to_string());
    parts
}

fn parse_attributes(text: &str) -> BTreeMap<String, String> {
    let mut attrs = BTreeMap::new();
    for caps in ATTR_RE.captures_iter(text) {
        let key = caps["key"].to_ascii_lowercase();
        let value = unquote(&caps["value"]);
        attrs.entry(key).or_insert(value);
    }
    attrs
}

fn unquote(value: &str) -> String {
    let value = value.trim();
    if value.len() >= 2 && value.starts_with('"') && value.ends_with('"') {
        let inner = &value[1..value.len() - 1];
        let mut out = String::with_capacity(inner.len());
        let mut chars = inner.chars();
        while let Some(ch) = chars.next() {
            if ch == '\\' {
                match chars.next() {
                    Some('"') => out.push('"'),
                    Some('\n') => {}
                    // Keep layout escapes like \l for label cleaning.
                    Some(other) => {
                        out.push('\\');
                        out.push(other);
                    }
                    None => out.push('\\'),
                }
            } else {
                out.push(ch);
            }
        }
        return out;
    }
    if value.len() >= 2 && value.starts_with('<') && value.ends_with('>') {
        return value[1..value.len() - 1].to_string();
    }
    value.to_string()
}
