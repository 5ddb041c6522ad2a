use clap::Parser;
use std::path::PathBuf;

#[derive(Debug, Clone, clap::ValueEnum)]
enum EmitStage {
    Ir,
    Dot,
}

#[derive(Parser, Debug)]
#[command(
    name = "vgc",
    version,
    about = "Visual Graph Compiler — lowers stateful control-flow graph nodes to executable IR"
)]
struct Cli {
    /// Input graph document (JSON)
    source: PathBuf,

    /// Output stage
    #[arg(long, value_enum, default_value_t = EmitStage::Ir)]
    emit: EmitStage,

    /// Print compiler phases and counts
    #[arg(long)]
    verbose: bool,
}

fn main() {
    let cli = Cli::parse();

    if cli.verbose {
        eprintln!("vgc: source = {}", cli.source.display());
        eprintln!("vgc: emit   = {:?}", cli.emit);
    }

    // ── Read and build the graph document ──
    let text = match std::fs::read_to_string(&cli.source) {
        Ok(s) => s,
        Err(e) => {
            eprintln!("vgc: error: {}: {}", cli.source.display(), e);
            std::process::exit(2);
        }
    };

    let doc = match vgc::doc::from_json(&text) {
        Ok(d) => d,
        Err(e) => {
            eprintln!("vgc: error: {}", e);
            std::process::exit(2);
        }
    };

    let (graph, names) = match doc.build() {
        Ok(pair) => pair,
        Err(e) => {
            eprintln!("vgc: error: {}", e);
            std::process::exit(2);
        }
    };

    if cli.verbose {
        eprintln!(
            "vgc: built graph with {} nodes ({} named)",
            graph.nodes().len(),
            names.len(),
        );
    }

    if matches!(cli.emit, EmitStage::Dot) {
        print!("{}", vgc::dot::emit_dot(&graph));
        return;
    }

    // ── Lower to IR ──
    let result = vgc::lower::lower_graph(&graph);
    for diag in &result.diagnostics {
        eprintln!("vgc: {}", diag);
    }

    if cli.verbose {
        eprintln!(
            "vgc: lowered {} statements, {} slots",
            result.unit.statements().len(),
            result.unit.slots().len(),
        );
    }

    if result.has_errors() {
        std::process::exit(1);
    }

    print!("{}", result.unit);
}
