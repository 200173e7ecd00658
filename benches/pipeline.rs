use callgraph_drawio::config::{Config, LayoutConfig};
use callgraph_drawio::ir::Fragment;
use callgraph_drawio::layout::compute_layout;
use callgraph_drawio::render::{Statistics, render_drawio};
use callgraph_drawio::{parse, render};
use criterion::{BenchmarkId, Criterion, criterion_group, criterion_main};
use std::hint::black_box;

/// Doxygen-style fragments: one per caller, each calling a few functions
/// further down plus an occasional call back up.
fn synthetic_fragments(functions: usize, fanout: usize) -> Vec<Fragment> {
    let name = |idx: usize| match idx {
        0 => "main".to_string(),
        idx if idx % 7 == 0 => format!("handle_error_{idx}"),
        idx if idx % 5 == 0 => format!("read_block_{idx}"),
        idx => format!("module::step_{idx}"),
    };
    (0..functions)
        .map(|caller| {
            let mut text = format!("digraph \"{}\"\n{{\n", name(caller));
            text.push_str(&format!("  Node1 [label=\"{}\"];\n", name(caller)));
            for k in 1..=fanout {
                let callee = (caller * fanout + k) % functions;
                text.push_str(&format!("  Node1 -> Node{};\n", k + 1));
                text.push_str(&format!("  Node{} [label=\"{}\"];\n", k + 1, name(callee)));
            }
            text.push_str("}\n");
            Fragment::new(format!("f{caller:04}_cgraph.dot"), text)
        })
        .collect()
}

fn bench_parse(c: &mut Criterion) {
    let mut group = c.benchmark_group("parse");
    for functions in [50usize, 200, 800] {
        let fragments = synthetic_fragments(functions, 3);
        group.bench_with_input(
            BenchmarkId::from_parameter(functions),
            &fragments,
            |b, fragments| {
                b.iter(|| {
                    let parsed = parse(black_box(fragments));
                    black_box(parsed.graph.nodes.len());
                });
            },
        );
    }
    group.finish();
}

fn bench_layout(c: &mut Criterion) {
    let mut group = c.benchmark_group("layout");
    let config = LayoutConfig::default();
    for functions in [50usize, 200, 800] {
        let parsed = parse(&synthetic_fragments(functions, 3));
        group.bench_with_input(
            BenchmarkId::from_parameter(functions),
            &parsed.graph,
            |b, graph| {
                b.iter(|| {
                    let layout = compute_layout(black_box(graph), &config);
                    black_box(layout.edges.len());
                });
            },
        );
    }
    group.finish();
}

fn bench_render(c: &mut Criterion) {
    let mut group = c.benchmark_group("render");
    let config = Config::default();
    for functions in [50usize, 200, 800] {
        let parsed = parse(&synthetic_fragments(functions, 3));
        let layout = compute_layout(&parsed.graph, &config.layout);
        let stats = Statistics::from_layout(&layout, functions, 0);
        group.bench_with_input(
            BenchmarkId::from_parameter(functions),
            &layout,
            |b, layout| {
                b.iter(|| {
                    let xml = render_drawio(black_box(layout), &stats, &config.theme, &config.diagram)
                        .expect("render failed");
                    black_box(xml.len());
                });
            },
        );
    }
    group.finish();
}

fn bench_end_to_end(c: &mut Criterion) {
    let mut group = c.benchmark_group("end_to_end");
    let config = Config::default();
    for (functions, fanout) in [(100usize, 2usize), (400, 4)] {
        let fragments = synthetic_fragments(functions, fanout);
        group.bench_with_input(
            BenchmarkId::from_parameter(format!("{functions}x{fanout}")),
            &fragments,
            |b, fragments| {
                b.iter(|| {
                    let output = render(&parse(black_box(fragments)), &config).expect("render failed");
                    black_box(output.document.len());
                });
            },
        );
    }
    group.finish();
}

criterion_group!(benches, bench_parse, bench_layout, bench_render, bench_end_to_end);
criterion_main!(benches);
