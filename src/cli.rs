use crate::config::load_config;
use crate::ir::Fragment;
use crate::layout_dump::write_layout_dump;
use crate::{RenderOutput, parse, render};
use anyhow::{Context, Result};
use clap::Parser;
use std::fs;
use std::path::{Path, PathBuf};
use tracing_subscriber::{layer::SubscriberExt, util::SubscriberInitExt};

#[derive(Parser, Debug)]
#[command(
    name = "cg2drawio",
    version,
    about = "Convert Doxygen call-graph DOT files into a draw.io diagram"
)]
pub struct Args {
    /// DOT files or directories containing them
    #[arg(required = true)]
    pub inputs: Vec<PathBuf>,

    /// Output diagram
    #[arg(short = 'o', long = "output", default_value = "callgraph.drawio")]
    pub output: PathBuf,

    /// Config file (JSON or JSON5)
    #[arg(short = 'c', long = "config")]
    pub config: Option<PathBuf>,

    /// Write the computed layout as JSON
    #[arg(long = "dump-layout")]
    pub dump_layout: Option<PathBuf>,

    /// Print statistics as JSON on stdout
    #[arg(long)]
    pub stats: bool,

    /// Enable debug logging
    #[arg(short, long)]
    pub verbose: bool,
}

pub fn run() -> Result<()> {
    let args = Args::parse();

    let log_level = if args.verbose { "debug" } else { "info" };
    tracing_subscriber::registry()
        .with(
            tracing_subscriber::EnvFilter::try_from_default_env().unwrap_or_else(|_| {
                tracing_subscriber::EnvFilter::new(format!("callgraph_drawio={log_level}"))
            }),
        )
        .with(tracing_subscriber::fmt::layer().with_writer(std::io::stderr))
        .init();

    let output = execute(&args)?;
    if args.stats {
        println!("{}", serde_json::to_string_pretty(&output.stats)?);
    }
    Ok(())
}

/// Read inputs, run the pipeline and write the results.
pub fn execute(args: &Args) -> Result<RenderOutput> {
    let config = load_config(args.config.as_deref())
        .context("failed to load configuration")?;

    let files = collect_inputs(&args.inputs)?;
    tracing::info!("Reading {} call graph file(s)", files.len());
    let fragments = read_fragments(&files)?;

    let parsed = parse(&fragments);
    let output = render(&parsed, &config)?;

    write_atomic(&args.output, &output.document)
        .with_context(|| format!("failed to write {}", args.output.display()))?;
    if let Some(path) = &args.dump_layout {
        write_layout_dump(path, &output.layout)?;
    }

    tracing::info!(
        "{} functions, {} calls, {} fragments, {} isolated -> {}",
        output.stats.nodes,
        output.stats.edges,
        output.stats.fragments,
        output.stats.isolated,
        args.output.display()
    );
    if !output.warnings.is_empty() {
        tracing::info!("{} warning(s) reported", output.warnings.len());
    }
    Ok(output)
}

/// Expand directories into their call-graph files, sorted.
fn collect_inputs(inputs: &[PathBuf]) -> Result<Vec<PathBuf>> {
    let mut files = Vec::new();
    for input in inputs {
        if input.is_dir() {
            let entries = fs::read_dir(input)
                .with_context(|| format!("failed to read directory {}", input.display()))?;
            for entry in entries {
                let path = entry?.path();
                if path.is_file() && is_call_graph_file(&path) {
                    files.push(path);
                }
            }
        } else {
            files.push(input.clone());
        }
    }
    files.sort();
    files.dedup();
    Ok(files)
}

/// `.dot` files, minus Doxygen's directory-dependency graphs.
fn is_call_graph_file(path: &Path) -> bool {
    let is_dot = path
        .extension()
        .and_then(|ext| ext.to_str())
        .map(|ext| ext.eq_ignore_ascii_case("dot"))
        .unwrap_or(false);
    let name = path.file_name().and_then(|n| n.to_str()).unwrap_or("");
    is_dot && !name.ends_with("dep.dot") && !name.starts_with("dir_")
}

fn read_fragments(files: &[PathBuf]) -> Result<Vec<Fragment>> {
    files
        .iter()
        .map(|path| {
            let text = fs::read_to_string(path)
                .with_context(|| format!("failed to read {}", path.display()))?;
            Ok(Fragment::new(fragment_name(path), text))
        })
        .collect()
}

/// The path as given on the command line, so same-named files from
/// different directories stay distinct.
fn fragment_name(path: &Path) -> String {
    path.to_string_lossy().replace('\\', "/")
}

/// Write next to the target and rename over it, so a failed run never leaves
/// a truncated diagram behind.
fn write_atomic(path: &Path, contents: &str) -> Result<()> {
    let file_name = path
        .file_name()
        .and_then(|n| n.to_str())
        .ok_or_else(|| anyhow::anyhow!("output path has no file name"))?;
    let tmp = path.with_file_name(format!(".{file_name}.tmp"));
    fs::write(&tmp, contents)?;
    if let Err(err) = fs::rename(&tmp, path) {
        let _ = fs::remove_file(&tmp);
        return Err(err.into());
    }
    Ok(())
}

#[cfg(test)]
mod tests {
    use super::*;

    const DOT: &str = r#"digraph "main"
{
  Node1 [label="main"];
  Node1 -> Node2;
  Node2 [label="worker"];
}
"#;

    fn args_for(inputs: Vec<PathBuf>, output: PathBuf) -> Args {
        Args {
            inputs,
            output,
            config: None,
            dump_layout: None,
            stats: false,
            verbose: false,
        }
    }

    #[test]
    fn directory_inputs_skip_dependency_graphs() {
        let dir = tempfile::tempdir().unwrap();
        fs::write(dir.path().join("main_cgraph.dot"), DOT).unwrap();
        fs::write(dir.path().join("dir_abc_dep.dot"), DOT).unwrap();
        fs::write(dir.path().join("file_dep.dot"), DOT).unwrap();
        fs::write(dir.path().join("notes.txt"), "x").unwrap();

        let files = collect_inputs(&[dir.path().to_path_buf()]).unwrap();
        assert_eq!(files, vec![dir.path().join("main_cgraph.dot")]);
    }

    #[test]
    fn execute_writes_document_and_dump() {
        let dir = tempfile::tempdir().unwrap();
        fs::write(dir.path().join("main_cgraph.dot"), DOT).unwrap();
        let output = dir.path().join("out.drawio");
        let dump = dir.path().join("layout.json");
        let mut args = args_for(vec![dir.path().to_path_buf()], output.clone());
        args.dump_layout = Some(dump.clone());

        let result = execute(&args).unwrap();
        assert_eq!(result.stats.nodes, 2);
        let written = fs::read_to_string(&output).unwrap();
        assert_eq!(written, result.document);
        assert!(!dir.path().join(".out.drawio.tmp").exists());

        let json: serde_json::Value =
            serde_json::from_str(&fs::read_to_string(&dump).unwrap()).unwrap();
        assert_eq!(json["nodes"].as_array().unwrap().len(), 2);
    }

    #[test]
    fn same_file_name_in_two_directories_is_kept_twice() {
        let dir = tempfile::tempdir().unwrap();
        let first = dir.path().join("lib_a");
        let second = dir.path().join("lib_b");
        fs::create_dir(&first).unwrap();
        fs::create_dir(&second).unwrap();
        fs::write(first.join("util_8c_cgraph.dot"), DOT).unwrap();
        fs::write(
            second.join("util_8c_cgraph.dot"),
            "digraph \"util\"\n{\n  Node1 [label=\"util\"];\n  Node1 -> Node2;\n  Node2 [label=\"format\"];\n}\n",
        )
        .unwrap();

        let args = args_for(vec![first, second], dir.path().join("out.drawio"));
        let result = execute(&args).unwrap();
        assert_eq!(result.stats.fragments, 2);
        assert_eq!(result.stats.nodes, 4);
        assert!(
            !result
                .warnings
                .iter()
                .any(|w| matches!(w, crate::Warning::DuplicateFragment { .. }))
        );
    }

    #[test]
    fn missing_input_fails_without_output() {
        let dir = tempfile::tempdir().unwrap();
        let output = dir.path().join("out.drawio");
        let args = args_for(vec![dir.path().join("absent.dot")], output.clone());
        assert!(execute(&args).is_err());
        assert!(!output.exists());
    }

    #[test]
    fn parses_command_line() {
        let args = Args::try_parse_from(["cg2drawio", "a.dot", "docs", "-o", "x.drawio", "--stats"])
            .unwrap();
        assert_eq!(args.inputs.len(), 2);
        assert_eq!(args.output, PathBuf::from("x.drawio"));
        assert!(args.stats);
        assert!(!args.verbose);
    }
}
