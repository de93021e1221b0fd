//! Scenario engine, lifecycle and classifier working together.

use std::collections::BTreeSet;

use proptest::prelude::*;
use wn_graph::{Network, NetworkBuilder, analyze};
use wn_records::{Installation, NodeKind, NodeRecord, Numeric, PipeRecord, PipeStatus};
use wn_scenario::{
    ClassifySettings, Criticality, Scenario, ScenarioEngine, ScenarioError, ServiceStatus, Stage,
    classify_nodes,
};
use wn_solver::{
    HydraulicSolver, HydrostaticSolver, NodeResult, SimulationResult, SolverError, SolverResult,
};

/// Reports 40 m at N2 while P1 is open and 2 m once it is closed.
struct ScriptedSolver;

impl HydraulicSolver for ScriptedSolver {
    fn name(&self) -> &str {
        "scripted"
    }

    fn solve(&self, network: &Network) -> SolverResult<SimulationResult> {
        let open = network.pipe_by_id("P1").is_some_and(|p| p.is_open());
        let mut r = SimulationResult::default();
        r.nodes.insert(
            "N1".into(),
            NodeResult {
                pressure_m: 0.0,
                demand_lps: if open { -5.0 } else { 0.0 },
            },
        );
        r.nodes.insert(
            "N2".into(),
            NodeResult {
                pressure_m: if open { 40.0 } else { 2.0 },
                demand_lps: if open { 5.0 } else { 0.0 },
            },
        );
        Ok(r)
    }
}

struct FailingSolver;

impl HydraulicSolver for FailingSolver {
    fn name(&self) -> &str {
        "failing"
    }

    fn solve(&self, _: &Network) -> SolverResult<SimulationResult> {
        Err(SolverError::ConvergenceFailed {
            what: "diverged".into(),
        })
    }
}

fn settings() -> ClassifySettings {
    ClassifySettings {
        pressure_threshold_m: 10.0,
        reference_year: 2024,
    }
}

/// N1(0,0,demand=0) -- P1(length 100, diameter 150, PVC) -- N2(1,0,demand 5, elev 10).
fn two_node(n1_kind: NodeKind) -> Network {
    let mut n1 = NodeRecord::junction("N1", 0.0, 0.0);
    n1.kind = n1_kind;
    n1.demand = Numeric::Value(0.0);
    n1.elevation = Numeric::Value(0.0);
    n1.head = Numeric::Value(50.0);
    let mut n2 = NodeRecord::junction("N2", 1.0, 0.0);
    n2.demand = Numeric::Value(5.0);
    n2.elevation = Numeric::Value(10.0);
    let mut p1 = PipeRecord::between("P1", "N1", "N2");
    p1.length = Numeric::Value(100.0);
    p1.diameter = Numeric::Value(150.0);
    p1.material = Some("PVC".into());
    NetworkBuilder::default().build(vec![n1, n2], vec![p1]).unwrap()
}

#[test]
fn closing_the_only_feed_disconnects_downstream() {
    let baseline = two_node(NodeKind::Junction);
    let engine = ScenarioEngine::new(&baseline, &ScriptedSolver);
    let base = engine.classify_baseline(&settings()).unwrap();
    assert_eq!(base.service["N2"], ServiceStatus::Served);

    let outcome = engine
        .run(Scenario::new("close P1").close("P1"), &base, &settings())
        .unwrap();
    assert_eq!(outcome.classification.service["N2"], ServiceStatus::Disconnected);
    assert_eq!(outcome.diff.newly_disconnected, BTreeSet::from(["N2".to_string()]));
    assert!(outcome.diff.newly_served.is_empty());
    assert_eq!(outcome.diff.demand_at_risk, 5.0);
    assert_eq!(outcome.classification.criticality["P1"], Criticality::Low);
}

#[test]
fn hydrostatic_solver_reproduces_the_example() {
    let baseline = two_node(NodeKind::Reservoir);
    let solver = HydrostaticSolver;
    let engine = ScenarioEngine::new(&baseline, &solver);

    let base_result = engine.evaluate(&Default::default()).unwrap();
    assert_eq!(base_result.result.pressure("N2"), Some(40.0));

    let base = engine.classify_baseline(&settings()).unwrap();
    let outcome = engine
        .run(Scenario::new("close P1").close("P1"), &base, &settings())
        .unwrap();
    assert!(outcome.result.pressure("N2").unwrap() < 40.0);
    assert_eq!(outcome.diff.newly_disconnected, BTreeSet::from(["N2".to_string()]));
    assert_eq!(outcome.diff.demand_at_risk, 5.0);
}

#[test]
fn topology_and_service_are_different_notions() {
    let mut nodes = Vec::new();
    for (i, id) in ["A", "B", "C"].into_iter().enumerate() {
        let mut n = NodeRecord::junction(id, i as f64, 0.0);
        n.elevation = Numeric::Value(0.0);
        n.demand = Numeric::Value(1.0);
        if id == "A" {
            n.kind = NodeKind::Reservoir;
            n.head = Numeric::Value(30.0);
        }
        nodes.push(n);
    }
    let pipes = vec![
        PipeRecord::between("AB", "A", "B"),
        PipeRecord::between("BC", "B", "C"),
    ]
    .into_iter()
    .map(|mut p| {
        p.diameter = Numeric::Value(100.0);
        p
    })
    .collect();
    let baseline = NetworkBuilder::default().build(nodes, pipes).unwrap();
    let engine = ScenarioEngine::new(&baseline, &HydrostaticSolver);

    let derived = engine
        .derive(&Scenario::new("s").close("BC").overrides)
        .unwrap();
    // Closing BC leaves topology intact...
    assert_eq!(analyze(&derived), analyze(&baseline));
    assert!(analyze(&derived).is_fully_connected());
    // ...but C loses service.
    let result = engine.evaluate(&Scenario::new("s").close("BC").overrides).unwrap();
    let service = classify_nodes(&result.result, 10.0);
    assert_eq!(service["B"], ServiceStatus::Served);
    assert_eq!(service["C"], ServiceStatus::Disconnected);
}

#[test]
fn unknown_override_is_a_reference_error_at_apply() {
    let baseline = two_node(NodeKind::Junction);
    let engine = ScenarioEngine::new(&baseline, &ScriptedSolver);
    let base = engine.classify_baseline(&settings()).unwrap();
    let err = engine
        .run(Scenario::new("typo").close("P9"), &base, &settings())
        .unwrap_err();
    match &err {
        ScenarioError::Failed { stage, .. } => assert_eq!(*stage, Stage::Applying),
        other => panic!("unexpected {other:?}"),
    }
    assert_eq!(
        err.root(),
        &ScenarioError::UnknownPipe {
            pipe_id: "P9".into()
        }
    );
}

#[test]
fn solver_failure_aborts_only_that_scenario() {
    let baseline = two_node(NodeKind::Reservoir);
    let failing = ScenarioEngine::new(&baseline, &FailingSolver);
    let err = failing.evaluate(&Scenario::new("x").close("P1").overrides).unwrap_err();
    assert!(matches!(err, ScenarioError::Solver(SolverError::ConvergenceFailed { .. })));

    let engine = ScenarioEngine::new(&baseline, &HydrostaticSolver);
    let results = engine.evaluate_batch(&[
        Scenario::baseline(),
        Scenario::new("bad").close("nope"),
        Scenario::new("closed").close("P1"),
    ]);
    assert_eq!(results.len(), 3);
    assert!(results[0].1.is_ok());
    assert!(results[1].1.is_err());
    assert_eq!(results[2].0, "closed");
    assert!(results[2].1.is_ok());
}

#[test]
fn criticality_uses_installation_year() {
    let mut n1 = NodeRecord::junction("A", 0.0, 0.0);
    n1.kind = NodeKind::Reservoir;
    n1.head = Numeric::Value(10.0);
    let mut p = PipeRecord::between("P", "A", "B");
    p.installation = Installation::Year(1980);
    let net = NetworkBuilder::default()
        .build(vec![n1, NodeRecord::junction("B", 1.0, 0.0)], vec![p])
        .unwrap();
    let tiers = wn_scenario::classify_pipes(&net, 2024);
    assert_eq!(tiers["P"], Criticality::Medium);
}

/// A random tree-plus-chords network fed by one reservoir at node 0.
fn random_network(n: usize, chords: &[(usize, usize)]) -> Network {
    let mut nodes = Vec::new();
    for i in 0..n {
        let mut node = NodeRecord::junction(format!("N{i}"), i as f64, (i * i % 7) as f64);
        node.elevation = Numeric::Value((i % 5) as f64 * 4.0);
        node.demand = Numeric::Value(1.0);
        if i == 0 {
            node.kind = NodeKind::Reservoir;
            node.head = Numeric::Value(40.0);
        }
        nodes.push(node);
    }
    let mut pipes = Vec::new();
    for i in 1..n {
        let mut p = PipeRecord::between(format!("T{i}"), format!("N{}", i / 2), format!("N{i}"));
        p.diameter = Numeric::Value(100.0);
        pipes.push(p);
    }
    for (k, &(a, b)) in chords.iter().enumerate() {
        if a % n != b % n {
            let mut p = PipeRecord::between(format!("C{k}"), format!("N{}", a % n), format!("N{}", b % n));
            p.diameter = Numeric::Value(100.0);
            pipes.push(p);
        }
    }
    NetworkBuilder::default().build(nodes, pipes).unwrap()
}

fn disconnected(engine: &ScenarioEngine<'_>, closed: &[String]) -> BTreeSet<String> {
    let mut s = Scenario::new("p");
    for id in closed {
        s = s.close(id.clone());
    }
    let tagged = engine.evaluate(&s.overrides).unwrap();
    classify_nodes(&tagged.result, 10.0)
        .into_iter()
        .filter(|(_, st)| *st == ServiceStatus::Disconnected)
        .map(|(id, _)| id)
        .collect()
}

proptest! {
    #[test]
    fn closing_more_pipes_never_restores_service(
        n in 3usize..10,
        chords in prop::collection::vec((0usize..10, 0usize..10), 0..5),
        picks in prop::collection::vec(any::<prop::sample::Index>(), 1..6),
        split in 0usize..6,
    ) {
        let net = random_network(n, &chords);
        let engine = ScenarioEngine::new(&net, &HydrostaticSolver);
        let ids: Vec<String> = net.pipes().iter().map(|p| p.id.clone()).collect();
        let s2: Vec<String> = picks.iter().map(|i| ids[i.index(ids.len())].clone()).collect();
        let s1: Vec<String> = s2[..split.min(s2.len())].to_vec();

        let d1 = disconnected(&engine, &s1);
        let d2 = disconnected(&engine, &s2);
        prop_assert!(d1.is_subset(&d2), "S1 {:?} -> {:?}, S2 {:?} -> {:?}", s1, d1, s2, d2);
    }

    #[test]
    fn evaluation_is_idempotent_and_baseline_is_untouched(
        n in 3usize..10,
        chords in prop::collection::vec((0usize..10, 0usize..10), 0..5),
        picks in prop::collection::vec(any::<prop::sample::Index>(), 0..6),
    ) {
        let net = random_network(n, &chords);
        let before: Vec<(String, PipeStatus)> =
            net.statuses().into_iter().map(|(id, s)| (id.to_string(), s)).collect();
        let engine = ScenarioEngine::new(&net, &HydrostaticSolver);
        let ids: Vec<String> = net.pipes().iter().map(|p| p.id.clone()).collect();
        let mut scenario = Scenario::new("p");
        for i in &picks {
            scenario = scenario.close(ids[i.index(ids.len())].clone());
        }

        let first = engine.evaluate(&scenario.overrides).unwrap();
        let second = engine.evaluate(&scenario.overrides).unwrap();
        prop_assert_eq!(&first, &second);
        prop_assert_eq!(
            classify_nodes(&first.result, 10.0),
            classify_nodes(&second.result, 10.0)
        );

        let after: Vec<(String, PipeStatus)> =
            net.statuses().into_iter().map(|(id, s)| (id.to_string(), s)).collect();
        prop_assert_eq!(before, after);
        prop_assert!(net.pipes().iter().all(|p| p.status == PipeStatus::Open));
    }
}
