use std::path::{Path, PathBuf};

use callgraph_drawio::{Category, Config, EdgeKind, Fragment, Warning, parse, render};

fn fixture_dir(name: &str) -> PathBuf {
    Path::new(env!("CARGO_MANIFEST_DIR"))
        .join("tests")
        .join("fixtures")
        .join(name)
}

fn load_fragments(dir: &str) -> Vec<Fragment> {
    let mut paths: Vec<PathBuf> = std::fs::read_dir(fixture_dir(dir))
        .expect("fixture dir missing")
        .map(|entry| entry.expect("fixture entry").path())
        .filter(|path| path.extension().is_some_and(|ext| ext == "dot"))
        .collect();
    paths.sort();
    paths
        .iter()
        .map(|path| {
            let text = std::fs::read_to_string(path).expect("fixture read failed");
            let name = path.file_name().unwrap().to_string_lossy().into_owned();
            Fragment::new(name, text)
        })
        .collect()
}

/// Tags must nest and close, with exactly one `mxfile` root.
fn assert_well_formed(xml: &str, fixture: &str) {
    let mut stack: Vec<String> = Vec::new();
    let mut roots = 0usize;
    let mut rest = xml;
    while let Some(open) = rest.find('<') {
        let close = rest[open..]
            .find('>')
            .unwrap_or_else(|| panic!("{fixture}: unterminated tag"))
            + open;
        let tag = &rest[open + 1..close];
        rest = &rest[close + 1..];
        if tag.starts_with('?') {
            continue;
        }
        if let Some(name) = tag.strip_prefix('/') {
            let top = stack.pop().unwrap_or_else(|| panic!("{fixture}: stray </{name}>"));
            assert_eq!(top, name.trim(), "{fixture}: mismatched closing tag");
            continue;
        }
        let name = tag
            .split_whitespace()
            .next()
            .unwrap_or("")
            .trim_end_matches('/')
            .to_string();
        if stack.is_empty() {
            roots += 1;
        }
        if !tag.ends_with('/') {
            stack.push(name);
        }
    }
    assert!(stack.is_empty(), "{fixture}: unclosed tags {stack:?}");
    assert_eq!(roots, 1, "{fixture}: expected a single root element");
    assert!(xml.contains("<mxfile"), "{fixture}: missing mxfile");
}

#[test]
fn recursion_scenario() {
    let parsed = parse(&load_fragments("recursion"));
    assert!(parsed.warnings.is_empty(), "{:?}", parsed.warnings);
    let output = render(&parsed, &Config::default()).unwrap();
    let layout = &output.layout;

    let level = |id: &str| layout.node(id).and_then(|node| node.level);
    assert_eq!(level("main"), Some(0));
    assert_eq!(level("init"), Some(1));
    assert_eq!(level("process"), Some(1));
    assert_eq!(level("helper"), Some(2));

    let back = layout
        .edges
        .iter()
        .find(|edge| edge.from == "helper" && edge.to == "main")
        .expect("recursive edge");
    assert_eq!(back.kind, EdgeKind::Callback);
    assert!(back.points.len() > 2, "callback should leave through a side lane");

    assert_eq!(output.stats.nodes, 4);
    assert_eq!(output.stats.edges, 4);
    assert_eq!(output.stats.isolated, 0);
    assert_eq!(output.stats.fragments, 3);
    assert_well_formed(&output.document, "recursion");
}

#[test]
fn repeated_call_sites_add_up() {
    let parsed = parse(&load_fragments("shared"));
    assert_eq!(parsed.graph.nodes.len(), 2);
    assert_eq!(parsed.graph.edges.len(), 1);
    assert_eq!(parsed.graph.edges[&("x".to_string(), "y".to_string())].multiplicity, 2);

    let output = render(&parsed, &Config::default()).unwrap();
    assert_eq!(output.layout.node("x").and_then(|n| n.level), Some(0));
    assert_eq!(output.layout.node("y").and_then(|n| n.level), Some(1));
    assert_eq!(output.stats.calls, 2);
    assert!(output.document.contains("value=\"×2\""));
    assert_well_formed(&output.document, "shared");
}

#[test]
fn output_is_independent_of_input_order() {
    let mut fragments = load_fragments("recursion");
    fragments.extend(load_fragments("shared"));
    let config = Config::default();
    let baseline = render(&parse(&fragments), &config).unwrap().document;

    fragments.reverse();
    assert_eq!(render(&parse(&fragments), &config).unwrap().document, baseline);

    fragments.rotate_left(2);
    assert_eq!(render(&parse(&fragments), &config).unwrap().document, baseline);
}

#[test]
fn mixed_fragments_classify_and_isolate() {
    let parsed = parse(&load_fragments("mixed"));
    assert!(
        parsed
            .warnings
            .iter()
            .any(|w| matches!(w, Warning::SkippedFragment { fragment, .. } if fragment == "broken_cgraph.dot"))
    );
    assert_eq!(parsed.fragments, vec!["driver_8cpp_cgraph.dot".to_string()]);

    let category = |id: &str| parsed.graph.nodes[id].category;
    assert_eq!(category("test_sensor_poll"), Category::Test);
    assert_eq!(category("read_register"), Category::Io);
    assert_eq!(category("handle_error"), Category::Error);
    assert_eq!(category("wait_ready"), Category::Timing);
    assert_eq!(category("unused_helper"), Category::Utility);
    assert_eq!(parsed.graph.nodes["Sensor_poll"].label, "Sensor::poll");

    let output = render(&parsed, &Config::default()).unwrap();
    let layout = &output.layout;
    assert_eq!(output.stats.isolated, 2);

    let grid_bottom = layout
        .nodes
        .iter()
        .filter(|node| !node.is_isolated())
        .map(|node| node.bottom())
        .fold(0.0, f32::max);
    for node in layout.nodes.iter().filter(|node| node.is_isolated()) {
        assert!(node.y > grid_bottom, "{} overlaps the main grid", node.id);
    }
    let region = layout.isolated_region.as_ref().expect("isolated region");
    assert!(region.y > grid_bottom);

    let error_edge = layout
        .edges
        .iter()
        .find(|edge| edge.to == "handle_error")
        .expect("error edge");
    assert_eq!(error_edge.kind, EdgeKind::ErrorPath);

    assert!(output.document.contains("tooltip=\"Sensor_poll\""));
    assert!(output.document.contains("Isolated Functions"));
    assert_well_formed(&output.document, "mixed");
}

#[test]
fn empty_input_produces_notice() {
    let parsed = parse(&[Fragment::new("empty.dot", "digraph \"none\" {\n}\n")]);
    let output = render(&parsed, &Config::default()).unwrap();
    assert!(output.warnings.contains(&Warning::EmptyGraph));
    assert_eq!(output.stats.nodes, 0);
    assert!(output.document.contains("empty-notice"));
    assert!(output.document.contains("0 functions · 0 calls · 1 fragments · 0 isolated"));
    assert_well_formed(&output.document, "empty");
}

#[test]
fn cycle_without_entry_still_lays_out() {
    let text = "digraph \"ring\" {\n  a -> b;\n  b -> c;\n  c -> a;\n}\n";
    let parsed = parse(&[Fragment::new("ring.dot", text)]);
    let output = render(&parsed, &Config::default()).unwrap();
    assert!(
        output
            .warnings
            .iter()
            .any(|w| matches!(w, Warning::CyclicNoEntry { .. }))
    );
    assert!(output.layout.nodes.iter().all(|node| node.level.is_some()));
    assert_well_formed(&output.document, "ring");
}
