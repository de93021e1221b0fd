use clap::{Parser, Subcommand};
use std::path::{Path, PathBuf};
use tracing_subscriber::EnvFilter;
use wn_app::{
    AppResult, NetworkView, ScenarioReport, ScenarioRequest, leak_counts_by_year,
    leak_year_range, leaks_in_year, list_cached, load_and_build, run_configured_scenarios,
    run_scenario, validate_deployment,
};

#[derive(Parser)]
#[command(name = "wn-cli")]
#[command(about = "Waternet CLI - water network build and what-if analysis", long_about = None)]
struct Cli {
    #[command(subcommand)]
    command: Commands,
}

#[derive(Subcommand)]
enum Commands {
    /// Validate a deployment file
    Validate {
        /// Path to the deployment YAML file
        deployment_path: PathBuf,
    },
    /// Build the network and report its structure
    Build {
        /// Path to the deployment YAML file
        deployment_path: PathBuf,
        /// Write the topology view as JSON
        #[arg(short, long)]
        output: Option<PathBuf>,
    },
    /// Analyze one scenario against the baseline
    Scenario {
        /// Path to the deployment YAML file
        deployment_path: PathBuf,
        /// Scenario defined in the deployment, or a label for ad-hoc overrides
        #[arg(long)]
        name: Option<String>,
        /// Pipe to close (repeatable)
        #[arg(long = "close")]
        close: Vec<String>,
        /// Pipe to open (repeatable)
        #[arg(long = "open")]
        open: Vec<String>,
        /// Service pressure threshold in metres, overriding the deployment
        #[arg(long)]
        threshold: Option<f64>,
        /// Skip cache and force re-solve
        #[arg(long)]
        no_cache: bool,
        /// Write the scenario view as JSON
        #[arg(short, long)]
        output: Option<PathBuf>,
    },
    /// Analyze every scenario defined in the deployment
    AnalyzeAll {
        /// Path to the deployment YAML file
        deployment_path: PathBuf,
        /// Skip cache and force re-solve
        #[arg(long)]
        no_cache: bool,
    },
    /// List cached scenario results
    Scenarios {
        /// Path to the deployment YAML file
        deployment_path: PathBuf,
    },
    /// Summarize recorded leaks
    Leaks {
        /// Path to the deployment YAML file
        deployment_path: PathBuf,
        /// List the leaks of one year
        #[arg(long)]
        year: Option<i32>,
    },
}

fn main() -> AppResult<()> {
    tracing_subscriber::fmt()
        .with_env_filter(
            EnvFilter::try_from_default_env().unwrap_or_else(|_| EnvFilter::new("info")),
        )
        .with_writer(std::io::stderr)
        .init();

    let cli = Cli::parse();

    match cli.command {
        Commands::Validate { deployment_path } => cmd_validate(&deployment_path),
        Commands::Build {
            deployment_path,
            output,
        } => cmd_build(&deployment_path, output.as_deref()),
        Commands::Scenario {
            deployment_path,
            name,
            close,
            open,
            threshold,
            no_cache,
            output,
        } => {
            let request = ScenarioRequest {
                deployment_path: &deployment_path,
                name: name.as_deref(),
                close: &close,
                open: &open,
                threshold_m: threshold,
                use_cache: !no_cache,
            };
            cmd_scenario(&request, output.as_deref())
        }
        Commands::AnalyzeAll {
            deployment_path,
            no_cache,
        } => cmd_analyze_all(&deployment_path, !no_cache),
        Commands::Scenarios { deployment_path } => cmd_scenarios(&deployment_path),
        Commands::Leaks {
            deployment_path,
            year,
        } => cmd_leaks(&deployment_path, year),
    }
}

fn write_json(path: &Path, view: &NetworkView) -> AppResult<()> {
    let json = view.to_json().map_err(std::io::Error::from)?;
    std::fs::write(path, json)?;
    println!("View written to {}", path.display());
    Ok(())
}

fn cmd_validate(deployment_path: &Path) -> AppResult<()> {
    println!("Validating deployment: {}", deployment_path.display());
    let deployment = validate_deployment(deployment_path)?;
    println!("✓ Deployment '{}' is valid", deployment.name);
    println!("  Input format: {:?}", deployment.inputs.format);
    println!("  Scenarios: {}", deployment.scenarios.len());
    Ok(())
}

fn cmd_build(deployment_path: &Path, output: Option<&Path>) -> AppResult<()> {
    let (ctx, built) = load_and_build(deployment_path)?;
    let s = built.summary();

    println!("Network '{}' built", ctx.deployment.name);
    println!("  Nodes: {}", s.nodes);
    println!("  Pipes: {} ({} rejected)", s.pipes, s.rejected_pipes);
    println!("  Components: {}", s.components);
    println!("  Isolated nodes: {}", s.isolated_nodes);
    println!("  Self loops: {}", s.self_loops);
    println!("  Assets: {}", s.assets);
    println!("  Leaks: {} ({} dropped)", s.leaks, s.dropped_leaks);

    for rejected in built.network.rejected() {
        let reason = wn_graph::GraphError::from(rejected.reason.clone());
        println!("  rejected {}: {}", rejected.record.id, reason);
    }
    if s.components > 1 {
        for (i, component) in built.connectivity.components.iter().enumerate() {
            println!("  component {}: {} node(s)", i + 1, component.len());
        }
    }

    if let Some(path) = output {
        let view = NetworkView::topology(&built, ctx.deployment.reference_year());
        write_json(path, &view)?;
    }
    Ok(())
}

fn print_report(report: &ScenarioReport) {
    let d = &report.diff;
    println!(
        "Scenario '{}'{}",
        report.scenario.name,
        if report.from_cache { " (cached)" } else { "" }
    );
    println!("  Id: {}", report.scenario_id);
    for (pipe, status) in &report.scenario.overrides {
        println!("  {} -> {}", pipe, status);
    }
    println!(
        "  Disconnected nodes: {}",
        report.classification.disconnected().count()
    );
    println!("  Newly disconnected: {}", d.newly_disconnected.len());
    for id in &d.newly_disconnected {
        println!("    {}", id);
    }
    println!("  Newly served: {}", d.newly_served.len());
    println!("  Demand at risk: {:.3} l/s", d.demand_at_risk);
}

fn cmd_scenario(request: &ScenarioRequest, output: Option<&Path>) -> AppResult<()> {
    let response = run_scenario(request)?;
    print_report(&response.report);
    if let Some(path) = output {
        write_json(path, &response.view)?;
    }
    Ok(())
}

fn cmd_analyze_all(deployment_path: &Path, use_cache: bool) -> AppResult<()> {
    let reports = run_configured_scenarios(deployment_path, use_cache)?;
    if reports.is_empty() {
        println!("No scenarios defined in deployment");
    }
    for (name, report) in reports {
        match report {
            Ok(r) => print_report(&r),
            Err(e) => println!("Scenario '{}' failed ({:?}): {}", name, e.category(), e),
        }
    }
    Ok(())
}

fn cmd_scenarios(deployment_path: &Path) -> AppResult<()> {
    let manifests = list_cached(deployment_path)?;
    if manifests.is_empty() {
        println!("No cached scenarios found");
    } else {
        println!("Cached scenarios:");
        for m in manifests {
            println!(
                "  {} '{}' [{}] ({})",
                &m.scenario_id[..12.min(m.scenario_id.len())],
                m.scenario_name,
                m.solver.split(':').next().unwrap_or(""),
                m.timestamp
            );
        }
    }
    Ok(())
}

fn cmd_leaks(deployment_path: &Path, year: Option<i32>) -> AppResult<()> {
    let (_ctx, built) = load_and_build(deployment_path)?;
    let leaks = &built.leaks;

    let Some((first, last)) = leak_year_range(leaks) else {
        println!("No leaks recorded");
        return Ok(());
    };
    println!("Leaks {}-{}: {} ({} rows dropped)", first, last, leaks.leaks.len(), leaks.dropped);

    match year {
        Some(y) => {
            let in_year = leaks_in_year(leaks, y);
            println!("Leaks in {}: {}", y, in_year.len());
            for leak in in_year {
                println!(
                    "  {} ({:.6}, {:.6})",
                    leak.id.as_deref().unwrap_or("-"),
                    leak.position.x,
                    leak.position.y
                );
            }
        }
        None => {
            for (y, count) in leak_counts_by_year(leaks) {
                println!("  {}: {}", y, count);
            }
        }
    }
    Ok(())
}
