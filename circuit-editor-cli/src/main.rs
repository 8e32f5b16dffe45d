//! Circuit Editor CLI - edit circuit graph files and sync them with the backend.

use anyhow::{bail, Context};
use circuit_editor::{
    load_graph_file, save_graph_file, ApiConfig, CircuitApi, CircuitEditor, CircuitRecord,
    CircuitStats, ComponentKind, EdgeStyle, EditorState, HttpCircuitApi, NewCircuit, NewEdge,
    Position, ValidationReport, WireGraph, STATIC_ANALYSIS,
};
use clap::{Parser, Subcommand, ValueEnum};
use std::path::{Path, PathBuf};
use std::process;
use std::sync::Arc;
use tracing_subscriber::EnvFilter;

#[derive(Parser)]
#[command(name = "circuit-editor")]
#[command(about = "Circuit diagram editor: build, validate and sync circuit graphs", long_about = None)]
#[command(version)]
struct Cli {
    /// Backend API root (overrides settings file and CIRCUIT_API_URL)
    #[arg(long, global = true, value_name = "URL")]
    api_url: Option<String>,

    /// JSON settings file for the API client
    #[arg(long, global = true, value_name = "FILE")]
    config: Option<PathBuf>,

    #[command(subcommand)]
    command: Commands,
}

#[derive(Subcommand)]
enum Commands {
    /// Create an empty circuit graph file
    New {
        #[arg(value_name = "FILE")]
        file: PathBuf,

        /// Overwrite an existing file
        #[arg(long)]
        force: bool,
    },

    /// Add a component and print its id
    Add {
        #[arg(value_name = "FILE")]
        file: PathBuf,

        /// voltage, resistor, capacitor or inductor
        #[arg(value_name = "KIND")]
        kind: ComponentKind,

        #[arg(long, allow_negative_numbers = true, value_parser = parse_coordinate)]
        x: Option<f64>,

        #[arg(long, allow_negative_numbers = true, value_parser = parse_coordinate)]
        y: Option<f64>,

        #[arg(long)]
        label: Option<String>,
    },

    /// Connect two components and print the connection id
    Connect {
        #[arg(value_name = "FILE")]
        file: PathBuf,

        source: String,

        target: String,

        /// Explicit connection id (default: e{source}-{target})
        #[arg(long)]
        id: Option<String>,

        #[arg(long, requires = "target_handle")]
        source_handle: Option<String>,

        #[arg(long, requires = "source_handle")]
        target_handle: Option<String>,

        /// Stroke colour, e.g. "#2563eb"
        #[arg(long)]
        stroke: Option<String>,
    },

    /// Move a component (the position is snapped to the grid)
    Move {
        #[arg(value_name = "FILE")]
        file: PathBuf,

        node: String,

        #[arg(allow_negative_numbers = true, value_parser = parse_coordinate)]
        x: f64,

        #[arg(allow_negative_numbers = true, value_parser = parse_coordinate)]
        y: f64,
    },

    /// Remove a component (with its connections) or a single connection
    Remove {
        #[arg(value_name = "FILE")]
        file: PathBuf,

        id: String,
    },

    /// Print component and connection counts
    Stats {
        #[arg(value_name = "FILE")]
        file: PathBuf,

        #[arg(short, long, value_enum, default_value = "human")]
        format: OutputFormat,
    },

    /// Check the circuit for connectivity problems
    Validate {
        #[arg(value_name = "FILE")]
        file: PathBuf,

        #[arg(short, long, value_enum, default_value = "human")]
        format: OutputFormat,

        /// Exit with error code if there are warnings
        #[arg(long)]
        strict: bool,
    },

    /// Print the graph file in backend form
    Show {
        #[arg(value_name = "FILE")]
        file: PathBuf,
    },

    /// List circuits stored on the backend
    List {
        #[arg(long, default_value_t = 1)]
        page: u32,

        #[arg(short, long, value_enum, default_value = "human")]
        format: OutputFormat,
    },

    /// Create a circuit on the backend
    Create {
        name: String,

        #[arg(long)]
        description: Option<String>,

        /// Graph file to upload with the new circuit
        #[arg(long, value_name = "FILE")]
        from: Option<PathBuf>,
    },

    /// Upload a graph file as the circuit's graph
    Push {
        id: u64,

        #[arg(value_name = "FILE")]
        file: PathBuf,
    },

    /// Download a circuit's graph into a file
    Pull {
        id: u64,

        #[arg(value_name = "FILE")]
        file: PathBuf,
    },

    /// Delete a circuit from the backend
    Delete { id: u64 },

    /// Save (optionally from a file) and run an analysis
    Analyze {
        id: u64,

        /// Graph file to push before analyzing
        #[arg(long, value_name = "FILE")]
        from: Option<PathBuf>,

        #[arg(long = "type", default_value = STATIC_ANALYSIS)]
        analysis_type: String,
    },
}

#[derive(Clone, ValueEnum)]
enum OutputFormat {
    /// Human-readable output
    Human,
    /// JSON output for scripts
    Json,
}

#[tokio::main]
async fn main() {
    tracing_subscriber::fmt()
        .with_env_filter(
            EnvFilter::try_from_default_env().unwrap_or_else(|_| EnvFilter::new("warn")),
        )
        .with_writer(std::io::stderr)
        .init();

    let cli = Cli::parse();

    let exit_code = match run(cli).await {
        Ok(code) => code,
        Err(e) => {
            eprintln!("Error: {:#}", e);
            1
        }
    };

    process::exit(exit_code);
}

async fn run(cli: Cli) -> anyhow::Result<i32> {
    match cli.command {
        Commands::New { file, force } => handle_new(&file, force),
        Commands::Add {
            file,
            kind,
            x,
            y,
            label,
        } => handle_add(&file, kind, x, y, label),
        Commands::Connect {
            file,
            source,
            target,
            id,
            source_handle,
            target_handle,
            stroke,
        } => {
            let mut request = NewEdge::new(source, target);
            if let Some(id) = id {
                request = request.with_id(id);
            }
            if let (Some(s), Some(t)) = (source_handle, target_handle) {
                request = request.with_handles(s, t);
            }
            if let Some(stroke) = stroke {
                request = request.with_style(EdgeStyle::stroke(stroke));
            }
            handle_connect(&file, request)
        }
        Commands::Move { file, node, x, y } => handle_move(&file, &node, x, y),
        Commands::Remove { file, id } => handle_remove(&file, &id),
        Commands::Stats { file, format } => handle_stats(&file, format),
        Commands::Validate {
            file,
            format,
            strict,
        } => handle_validate(&file, format, strict),
        Commands::Show { file } => handle_show(&file),
        Commands::List { page, format } => {
            let api = connect_api(cli.api_url, cli.config.as_deref())?;
            handle_list(api.as_ref(), page, format).await
        }
        Commands::Create {
            name,
            description,
            from,
        } => {
            let api = connect_api(cli.api_url, cli.config.as_deref())?;
            handle_create(api.as_ref(), name, description, from.as_deref()).await
        }
        Commands::Push { id, file } => {
            let api = connect_api(cli.api_url, cli.config.as_deref())?;
            handle_push(api, id, &file).await
        }
        Commands::Pull { id, file } => {
            let api = connect_api(cli.api_url, cli.config.as_deref())?;
            handle_pull(api, id, &file).await
        }
        Commands::Delete { id } => {
            let api = connect_api(cli.api_url, cli.config.as_deref())?;
            api.delete_circuit(id)
                .await
                .with_context(|| format!("deleting circuit {}", id))?;
            println!("Deleted circuit {}", id);
            Ok(0)
        }
        Commands::Analyze {
            id,
            from,
            analysis_type,
        } => {
            let api = connect_api(cli.api_url, cli.config.as_deref())?;
            handle_analyze(api, id, from.as_deref(), &analysis_type).await
        }
    }
}

/// Canvas coordinate; NaN and infinities cannot be stored.
fn parse_coordinate(raw: &str) -> Result<f64, String> {
    match raw.parse::<f64>() {
        Ok(value) if value.is_finite() => Ok(value),
        Ok(_) => Err(format!("{} is not a finite coordinate", raw)),
        Err(e) => Err(e.to_string()),
    }
}

fn connect_api(
    api_url: Option<String>,
    settings: Option<&Path>,
) -> anyhow::Result<Arc<dyn CircuitApi>> {
    let mut config = ApiConfig::load(settings).context("loading API settings")?;
    if let Some(url) = api_url {
        config = config.with_base_url(url);
    }
    tracing::debug!("Using API at {}", config.base_url);
    let api = HttpCircuitApi::new(&config)?;
    Ok(Arc::new(api))
}

fn open(file: &Path) -> anyhow::Result<EditorState> {
    load_graph_file(file).with_context(|| format!("reading {}", file.display()))
}

fn save(state: &EditorState, file: &Path) -> anyhow::Result<()> {
    save_graph_file(state, file).with_context(|| format!("writing {}", file.display()))
}

fn handle_new(file: &Path, force: bool) -> anyhow::Result<i32> {
    if file.exists() && !force {
        bail!("{} already exists (use --force to overwrite)", file.display());
    }
    save(&EditorState::new(), file)?;
    println!("Created {}", file.display());
    Ok(0)
}

fn handle_add(
    file: &Path,
    kind: ComponentKind,
    x: Option<f64>,
    y: Option<f64>,
    label: Option<String>,
) -> anyhow::Result<i32> {
    let mut state = open(file)?;
    let position = match (x, y) {
        (None, None) => None,
        (x, y) => {
            let default = Position::default();
            Some(Position::new(x.unwrap_or(default.x), y.unwrap_or(default.y)))
        }
    };
    let id = state.add_component(kind, position, label);
    save(&state, file)?;
    println!("{}", id);
    Ok(0)
}

fn handle_connect(file: &Path, request: NewEdge) -> anyhow::Result<i32> {
    let mut state = open(file)?;
    for endpoint in [&request.source, &request.target] {
        if state.node(endpoint).is_none() {
            bail!("no component named {}", endpoint);
        }
    }
    if let Some(ref id) = request.id {
        let duplicate = state
            .edges()
            .iter()
            .any(|e| &e.id == id && !e.connects(&request.source, &request.target));
        if duplicate {
            bail!("connection id {} is already in use", id);
        }
    }
    let id = state.connect(request);
    save(&state, file)?;
    println!("{}", id);
    Ok(0)
}

fn handle_move(file: &Path, node: &str, x: f64, y: f64) -> anyhow::Result<i32> {
    let mut state = open(file)?;
    if !state.update_node_position(node, Position::new(x, y)) {
        bail!("no component named {}", node);
    }
    save(&state, file)?;
    if let Some(moved) = state.node(node) {
        println!("{} at ({}, {})", node, moved.position.x, moved.position.y);
    }
    Ok(0)
}

fn handle_remove(file: &Path, id: &str) -> anyhow::Result<i32> {
    let mut state = open(file)?;
    let cascade = state.connected_edges(id).len();
    if state.remove_node(id) {
        println!("Removed component {} and {} connection(s)", id, cascade);
    } else if state.remove_edge(id) {
        println!("Removed connection {}", id);
    } else {
        bail!("nothing named {} in {}", id, file.display());
    }
    save(&state, file)?;
    Ok(0)
}

fn handle_stats(file: &Path, format: OutputFormat) -> anyhow::Result<i32> {
    let stats = open(file)?.circuit_stats();
    match format {
        OutputFormat::Human => output_stats_human(&stats),
        OutputFormat::Json => println!("{}", serde_json::to_string_pretty(&stats)?),
    }
    Ok(0)
}

fn output_stats_human(stats: &CircuitStats) {
    println!("Components:  {}", stats.total_nodes);
    println!("Connections: {}", stats.total_edges);
    for kind in ComponentKind::ALL {
        println!("  {:<10} {}", kind.as_str(), stats.count(kind));
    }
}

fn handle_validate(file: &Path, format: OutputFormat, strict: bool) -> anyhow::Result<i32> {
    let report = open(file)?.validate_circuit();
    match format {
        OutputFormat::Human => output_report_human(file, &report),
        OutputFormat::Json => println!("{}", serde_json::to_string_pretty(&report)?),
    }
    if strict && report.has_warnings() {
        return Ok(1);
    }
    Ok(0)
}

fn output_report_human(file: &Path, report: &ValidationReport) {
    println!("\nFile: {}", file.display());
    println!("{}", "─".repeat(60));

    if !report.has_warnings() && report.errors.is_empty() {
        println!("  No issues found");
        return;
    }

    if !report.errors.is_empty() {
        println!("\n  ERRORS:");
        for error in &report.errors {
            println!("    - {}", error);
        }
    }
    if report.has_warnings() {
        println!("\n  WARNINGS:");
        for warning in &report.warnings {
            println!("    - {}", warning);
        }
    }
}

fn handle_show(file: &Path) -> anyhow::Result<i32> {
    let state = open(file)?;
    println!("{}", state.export_to_api().to_json_pretty()?);
    Ok(0)
}

async fn handle_list(api: &dyn CircuitApi, page: u32, format: OutputFormat) -> anyhow::Result<i32> {
    let listing = api.list_circuits(page).await.context("listing circuits")?;
    match format {
        OutputFormat::Human => {
            if listing.results.is_empty() {
                println!("No circuits on page {}", page);
            }
            for record in &listing.results {
                output_record_human(record);
            }
            println!("\n{} circuit(s) in total", listing.count);
        }
        OutputFormat::Json => println!("{}", serde_json::to_string_pretty(&listing)?),
    }
    Ok(0)
}

fn output_record_human(record: &CircuitRecord) {
    let size = record
        .graph
        .as_ref()
        .map(|g| format!("{} components", g.nodes.len()))
        .unwrap_or_else(|| "empty".to_string());
    println!(
        "  {:>5}  {}  ({}, updated {})",
        record.id,
        record.name,
        size,
        record.updated_at.format("%Y-%m-%d %H:%M")
    );
    if let Some(ref description) = record.description {
        println!("         {}", description);
    }
}

async fn handle_create(
    api: &dyn CircuitApi,
    name: String,
    description: Option<String>,
    from: Option<&Path>,
) -> anyhow::Result<i32> {
    let mut circuit = NewCircuit::new(name);
    if let Some(description) = description {
        circuit = circuit.with_description(description);
    }
    if let Some(file) = from {
        circuit = circuit.with_graph(open(file)?.export_to_api());
    }
    let record = api.create_circuit(&circuit).await.context("creating circuit")?;
    println!("Created circuit {}", record.id);
    Ok(0)
}

fn read_wire(file: &Path) -> anyhow::Result<WireGraph> {
    let content =
        std::fs::read_to_string(file).with_context(|| format!("reading {}", file.display()))?;
    Ok(WireGraph::from_json(&content)?)
}

async fn handle_push(api: Arc<dyn CircuitApi>, id: u64, file: &Path) -> anyhow::Result<i32> {
    let graph = read_wire(file)?;
    let mut editor = CircuitEditor::load(api, id).await?;
    editor.state_mut().import_from_api(graph)?;

    let report = editor.state().validate_circuit();
    for warning in &report.warnings {
        eprintln!("warning: {}", warning);
    }
    editor.save_circuit().await?;
    println!("Saved circuit {}", id);
    Ok(0)
}

async fn handle_pull(api: Arc<dyn CircuitApi>, id: u64, file: &Path) -> anyhow::Result<i32> {
    let editor = CircuitEditor::load(api, id).await?;
    save(editor.state(), file)?;
    println!(
        "Wrote circuit {} ({} components) to {}",
        id,
        editor.state().nodes().len(),
        file.display()
    );
    Ok(0)
}

async fn handle_analyze(
    api: Arc<dyn CircuitApi>,
    id: u64,
    from: Option<&Path>,
    analysis_type: &str,
) -> anyhow::Result<i32> {
    let mut editor = CircuitEditor::load(api, id).await?;
    if let Some(file) = from {
        editor.state_mut().import_from_api(read_wire(file)?)?;
    }
    let response = editor.analyze_circuit(analysis_type).await?;
    println!("{}", serde_json::to_string_pretty(&response)?);
    Ok(0)
}
