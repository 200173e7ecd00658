fn main() {
    if let Err(err) = callgraph_drawio::run() {
        eprintln!("error: {err:#}");
        std::process::exit(1);
    }
}
