//! Steady-state solves on small networks.

use wn_graph::{Network, NetworkBuilder};
use wn_records::{NodeKind, NodeRecord, Numeric, PipeRecord, PipeStatus};
use wn_solver::{
    HazenWilliamsSolver, HydraulicSolver, HydrostaticSolver, NewtonConfig, SolverError,
    SolverKind, SolverSettings, build_solver,
};

fn reservoir(id: &str, x: f64, head: f64) -> NodeRecord {
    let mut n = NodeRecord::junction(id, x, 0.0);
    n.kind = NodeKind::Reservoir;
    n.head = Numeric::Value(head);
    n
}

fn junction(id: &str, x: f64, y: f64, elevation: f64, demand: f64) -> NodeRecord {
    let mut n = NodeRecord::junction(id, x, y);
    n.elevation = Numeric::Value(elevation);
    n.demand = Numeric::Value(demand);
    n
}

fn pipe(id: &str, a: &str, b: &str, length: f64, diameter: f64) -> PipeRecord {
    let mut p = PipeRecord::between(id, a, b);
    p.length = Numeric::Value(length);
    p.diameter = Numeric::Value(diameter);
    p.roughness = Numeric::Value(100.0);
    p
}

fn build(nodes: Vec<NodeRecord>, pipes: Vec<PipeRecord>) -> Network {
    NetworkBuilder::default().build(nodes, pipes).unwrap()
}

fn headloss(length: f64, q: f64, c: f64, d: f64) -> f64 {
    10.67 * length * q.powf(1.852) / (c.powf(1.852) * d.powf(4.87))
}

#[test]
fn single_pipe_matches_headloss_formula() {
    let net = build(
        vec![reservoir("R", 0.0, 50.0), junction("J", 1.0, 0.0, 10.0, 10.0)],
        vec![pipe("P1", "R", "J", 1000.0, 200.0)],
    );
    let r = HazenWilliamsSolver::default().solve(&net).unwrap();

    let expected = 50.0 - headloss(1000.0, 0.01, 100.0, 0.2) - 10.0;
    assert!((r.pressure("J").unwrap() - expected).abs() < 1e-4);
    assert!((r.flow("P1").unwrap() - 10.0).abs() < 1e-4);
    assert!((r.node("R").unwrap().demand_lps + 10.0).abs() < 1e-4);
}

#[test]
fn parallel_pipes_share_flow() {
    let net = build(
        vec![reservoir("R", 0.0, 60.0), junction("J", 1.0, 0.0, 0.0, 8.0)],
        vec![
            pipe("A", "R", "J", 500.0, 150.0),
            pipe("B", "R", "J", 500.0, 150.0),
        ],
    );
    let r = HazenWilliamsSolver::default().solve(&net).unwrap();
    assert!((r.flow("A").unwrap() - 4.0).abs() < 1e-4);
    assert!((r.flow("B").unwrap() - 4.0).abs() < 1e-4);
}

#[test]
fn looped_network_conserves_mass() {
    let net = build(
        vec![
            reservoir("R", 0.0, 80.0),
            junction("J1", 1.0, 0.0, 5.0, 4.0),
            junction("J2", 2.0, 0.0, 8.0, 6.0),
            junction("J3", 1.0, 1.0, 3.0, 5.0),
        ],
        vec![
            pipe("P1", "R", "J1", 800.0, 250.0),
            pipe("P2", "J1", "J2", 600.0, 150.0),
            pipe("P3", "J2", "J3", 700.0, 150.0),
            pipe("P4", "J3", "J1", 400.0, 200.0),
        ],
    );
    let r = HazenWilliamsSolver::default().solve(&net).unwrap();

    let inflow = |node: &str| -> f64 {
        net.pipes()
            .iter()
            .map(|p| {
                let q = r.flow(&p.id).unwrap();
                let start = &net.node(p.start).unwrap().id;
                let end = &net.node(p.end).unwrap().id;
                (if end == node { q } else { 0.0 }) - (if start == node { q } else { 0.0 })
            })
            .sum()
    };
    for (id, demand) in [("J1", 4.0), ("J2", 6.0), ("J3", 5.0)] {
        assert!((inflow(id) - demand).abs() < 1e-4, "{id}");
    }
}

#[test]
fn closed_pipe_isolates_downstream_junction() {
    let mut p2 = pipe("P2", "J1", "J2", 100.0, 100.0);
    p2.status = PipeStatus::Closed;
    let net = build(
        vec![
            reservoir("R", 0.0, 40.0),
            junction("J1", 1.0, 0.0, 0.0, 1.0),
            junction("J2", 2.0, 0.0, 0.0, 1.0),
        ],
        vec![pipe("P1", "R", "J1", 100.0, 100.0), p2],
    );
    for solver in [
        build_solver(&SolverSettings::default()),
        build_solver(&SolverSettings {
            kind: SolverKind::HazenWilliams,
            ..Default::default()
        }),
    ] {
        let r = solver.solve(&net).unwrap();
        assert_eq!(r.pressure("J2"), Some(0.0), "{}", solver.name());
        assert_eq!(r.flow("P2"), Some(0.0));
        assert!(r.pressure("J1").unwrap() > 30.0);
    }
}

#[test]
fn repeated_solves_are_identical() {
    let net = build(
        vec![reservoir("R", 0.0, 50.0), junction("J", 1.0, 0.0, 10.0, 3.0)],
        vec![pipe("P1", "R", "J", 300.0, 100.0)],
    );
    let solver = HazenWilliamsSolver::default();
    assert_eq!(solver.solve(&net).unwrap(), solver.solve(&net).unwrap());
    assert_eq!(
        HydrostaticSolver.solve(&net).unwrap(),
        HydrostaticSolver.solve(&net).unwrap()
    );
}

#[test]
fn convergence_failure_is_surfaced() {
    let net = build(
        vec![reservoir("R", 0.0, 50.0), junction("J", 1.0, 0.0, 10.0, 3.0)],
        vec![pipe("P1", "R", "J", 300.0, 100.0)],
    );
    let solver = HazenWilliamsSolver::new(
        NewtonConfig {
            max_iterations: 0,
            ..Default::default()
        },
        None,
    );
    assert!(matches!(
        solver.solve(&net),
        Err(SolverError::ConvergenceFailed { .. })
    ));
}

#[test]
fn missing_roughness_without_default_is_boundary_error() {
    let mut p = pipe("P1", "R", "J", 300.0, 100.0);
    p.roughness = Numeric::Missing;
    let net = build(
        vec![reservoir("R", 0.0, 50.0), junction("J", 1.0, 0.0, 10.0, 3.0)],
        vec![p],
    );
    let err = HazenWilliamsSolver::default().solve(&net).unwrap_err();
    assert!(err.to_string().contains("P1.roughness"));
    assert!(HazenWilliamsSolver::new(NewtonConfig::default(), Some(120.0))
        .solve(&net)
        .is_ok());
    // The frictionless solver does not need roughness.
    assert!(HydrostaticSolver.solve(&net).is_ok());
}
