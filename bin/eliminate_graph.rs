use std::time::Instant;

use apex_inference::core::{Conditional, Factor, FactorGraph, Key};
use apex_inference::factors::gaussian::back_substitute;
use apex_inference::factors::{GaussianFactor, SymbolicFactor};
use apex_inference::inference::{
    EliminationConfig, MinimumDegreeOrdering, NaturalOrdering, OrderingOracle,
    eliminate_with_oracle, marginal,
};
use apex_inference::{InferenceResult, init_logger_with_level};
use clap::Parser;
use nalgebra::{DMatrix, DVector};
use tracing::{Level, info, warn};

#[derive(Parser)]
#[command(name = "eliminate_graph")]
#[command(about = "Eliminate a synthetic pose graph and compare elimination orderings")]
struct Args {
    /// Number of poses in the trajectory
    #[arg(short, long, default_value = "200")]
    poses: usize,

    /// Add a loop closure at every N-th pose (0 disables loop closures)
    #[arg(long, default_value = "10")]
    loop_every: usize,

    /// How far back each loop closure reaches
    #[arg(long, default_value = "25")]
    loop_span: usize,

    /// Ordering: "natural", "min-degree", or "all"
    #[arg(short, long, default_value = "all")]
    ordering: String,

    /// Variables kept to the end of the ordering and marginalized onto (e.g. --keep 0 --keep 5)
    #[arg(long)]
    keep: Vec<Key>,

    /// Also eliminate the scalar Gaussian version of the graph and check the solution
    #[arg(long)]
    gaussian: bool,

    /// Enable verbose output
    #[arg(short, long)]
    verbose: bool,
}

struct OrderingResult {
    ordering: &'static str,
    conditionals: usize,
    fill_in: usize,
    max_parents: usize,
    time_ms: f64,
}

/// Odometry edges `(i, i+1)` plus loop closures `(i - span, i)`.
fn pose_graph_edges(args: &Args) -> Vec<(Key, Key)> {
    let mut edges: Vec<(Key, Key)> = (1..args.poses).map(|i| (i - 1, i)).collect();
    if args.loop_every > 0 && args.loop_span > 1 {
        for i in (args.loop_span..args.poses).step_by(args.loop_every) {
            edges.push((i - args.loop_span, i));
        }
    }
    edges
}

fn symbolic_graph(edges: &[(Key, Key)]) -> FactorGraph<SymbolicFactor> {
    std::iter::once(SymbolicFactor::new(vec![0]))
        .chain(edges.iter().map(|&(a, b)| SymbolicFactor::new(vec![a, b])))
        .collect()
}

/// Scalar poses on a line with exact measurements, so the solution is `x_i = i`.
fn gaussian_graph(edges: &[(Key, Key)]) -> InferenceResult<FactorGraph<GaussianFactor>> {
    let mut graph = FactorGraph::new();
    graph.push(GaussianFactor::prior(0, DVector::zeros(1), 0.1)?);
    for &(a, b) in edges {
        graph.push(GaussianFactor::from_jacobian(
            vec![a, b],
            vec![
                DMatrix::from_element(1, 1, -1.0),
                DMatrix::from_element(1, 1, 1.0),
            ],
            DVector::from_element(1, (b - a) as f64),
        )?);
    }
    Ok(graph)
}

fn run_ordering(
    name: &'static str,
    oracle: &dyn OrderingOracle,
    graph: &FactorGraph<SymbolicFactor>,
    args: &Args,
    config: &EliminationConfig,
) -> InferenceResult<OrderingResult> {
    let start = Instant::now();
    let (_, bayes_net) = eliminate_with_oracle(graph, oracle, &args.keep, config)?;
    let time_ms = start.elapsed().as_secs_f64() * 1000.0;

    Ok(OrderingResult {
        ordering: name,
        conditionals: bayes_net.len(),
        fill_in: bayes_net.fill_in(),
        max_parents: bayes_net
            .iter()
            .map(|c| c.parents().len())
            .max()
            .unwrap_or(0),
        time_ms,
    })
}

fn format_summary_table(results: &[OrderingResult]) {
    info!(
        "{:<12} | {:<12} | {:<8} | {:<11} | {:<9}",
        "Ordering", "Conditionals", "Fill-in", "Max parents", "Time(ms)"
    );
    info!("{}", "-".repeat(64));
    for result in results {
        info!(
            "{:<12} | {:<12} | {:<8} | {:<11} | {:<9.3}",
            result.ordering, result.conditionals, result.fill_in, result.max_parents, result.time_ms
        );
    }
}

fn check_gaussian(edges: &[(Key, Key)], args: &Args, config: &EliminationConfig) -> InferenceResult<()> {
    let graph = gaussian_graph(edges)?;
    let (_, bayes_net) = eliminate_with_oracle(&graph, &MinimumDegreeOrdering, &[], config)?;
    let solution = back_substitute(&bayes_net)?;

    let max_error = solution
        .iter()
        .map(|(&key, value)| (value[0] - key as f64).abs())
        .fold(0.0, f64::max);
    info!(
        "Gaussian solve: {} poses, max error {:.3e}",
        solution.len(),
        max_error
    );

    if !args.keep.is_empty() {
        let residual = marginal(&graph, &args.keep, config)?;
        for factor in residual.factors() {
            info!(
                "Marginal factor over {:?}: information {:.3}",
                factor.keys(),
                factor.information()
            );
        }
    }
    Ok(())
}

fn main() -> Result<(), Box<dyn std::error::Error>> {
    let args = Args::parse();

    init_logger_with_level(if args.verbose {
        Level::DEBUG
    } else {
        Level::INFO
    });

    info!("APEX-INFERENCE POSE GRAPH ELIMINATION\n");

    let edges = pose_graph_edges(&args);
    let graph = symbolic_graph(&edges);
    info!(
        "Graph: {} poses, {} factors ({} loop closures)",
        args.poses,
        graph.len(),
        edges.len().saturating_sub(args.poses.saturating_sub(1))
    );

    let config = EliminationConfig::new().with_trace_steps(args.verbose);

    let natural = || ("natural", Box::new(NaturalOrdering) as Box<dyn OrderingOracle>);
    let min_degree = || {
        (
            "min-degree",
            Box::new(MinimumDegreeOrdering) as Box<dyn OrderingOracle>,
        )
    };
    let oracles: Vec<(&'static str, Box<dyn OrderingOracle>)> = match args.ordering.as_str() {
        "natural" => vec![natural()],
        "min-degree" => vec![min_degree()],
        "all" => vec![natural(), min_degree()],
        other => {
            return Err(format!(
                "Unknown ordering: {}. Valid options: natural, min-degree, all",
                other
            )
            .into());
        }
    };

    let mut results = Vec::new();
    for (name, oracle) in &oracles {
        match run_ordering(*name, oracle.as_ref(), &graph, &args, &config) {
            Ok(result) => results.push(result),
            Err(e) => {
                warn!("Ordering {} failed", name);
                warn!("Full error chain:\n{}", e.chain());
            }
        }
    }
    format_summary_table(&results);

    if args.gaussian
        && let Err(e) = check_gaussian(&edges, &args, &config)
    {
        warn!("Gaussian elimination failed: {}", e.chain_compact());
        return Err(e.into());
    }

    if results.len() == oracles.len() {
        Ok(())
    } else {
        Err("Some orderings failed".into())
    }
}
