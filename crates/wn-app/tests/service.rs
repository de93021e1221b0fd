use std::path::{Path, PathBuf};

use wn_app::*;

const DEPLOYMENT: &str = r#"
version: 1
name: two-node
inputs:
  format: tabular
  nodes: nodes.csv
  pipes: pipes.csv
  leaks: leaks.csv
ages:
  convention: installation_year
  reference_year: 2024
service:
  pressure_threshold_m: 10
scenarios:
  - name: shut P1
    close: [P1]
  - name: shut P2
    close: [P2]
"#;

const NODES: &str = "\
NodeID,XCoord,YCoord,Elevation,Demand,Type,Head
N1,0,0,,0,Reservoir,50
N2,0.001,0,10,5,Junction,
N3,0.002,0,12,2,Junction,
";

const PIPES: &str = "\
PipeID,StartID,EndID,Length,Diameter,Material,Install_Year
P1,N1,N2,100,150,PVC,1990
P2,N2,N3,120,100,Cast Iron,1965
";

const LEAKS: &str = "\
XCoord,YCoord,Year
0.0005,0,2019
0.0015,0,2021
,0,2020
";

fn setup(name: &str) -> PathBuf {
    let dir = std::env::temp_dir().join(name);
    let _ = std::fs::remove_dir_all(&dir);
    std::fs::create_dir_all(&dir).unwrap();
    std::fs::write(dir.join("deployment.yaml"), DEPLOYMENT).unwrap();
    std::fs::write(dir.join("nodes.csv"), NODES).unwrap();
    std::fs::write(dir.join("pipes.csv"), PIPES).unwrap();
    std::fs::write(dir.join("leaks.csv"), LEAKS).unwrap();
    dir.join("deployment.yaml")
}

fn request<'a>(path: &'a Path, name: Option<&'a str>, close: &'a [String]) -> ScenarioRequest<'a> {
    ScenarioRequest {
        deployment_path: path,
        name,
        close,
        open: &[],
        threshold_m: None,
        use_cache: true,
    }
}

#[test]
fn second_run_is_served_from_cache() {
    let path = setup("wn_app_cache");

    let first = run_scenario(&request(&path, Some("shut P2"), &[])).unwrap();
    assert!(!first.report.from_cache);
    assert!(first.report.diff.newly_disconnected.contains("N3"));
    assert_eq!(first.report.diff.demand_at_risk, 2.0);

    let second = run_scenario(&request(&path, Some("shut P2"), &[])).unwrap();
    assert!(second.report.from_cache);
    assert_eq!(second.report.scenario_id, first.report.scenario_id);
    assert_eq!(second.report.result, first.report.result);
    assert_eq!(second.report.diff, first.report.diff);
    assert_ne!(second.request_id, first.request_id);

    // Baseline and scenario.
    let cached = list_cached(&path).unwrap();
    assert_eq!(cached.len(), 2);
    assert!(cached.iter().any(|m| m.scenario_name == "shut P2"));

    let _ = std::fs::remove_dir_all(path.parent().unwrap());
}

#[test]
fn ad_hoc_overrides_and_threshold() {
    let path = setup("wn_app_ad_hoc");
    let close = vec!["P1".to_string()];
    let mut req = request(&path, None, &close);
    req.use_cache = false;
    req.threshold_m = Some(45.0);

    let resp = run_scenario(&req).unwrap();
    assert_eq!(resp.report.scenario.name, "ad-hoc");
    // N2 at 40 m and N3 at 38 m are already below 45 m at baseline.
    assert!(resp.report.diff.newly_disconnected.is_empty());
    assert!(
        resp.report
            .classification
            .disconnected()
            .any(|id| id == "N3")
    );

    let _ = std::fs::remove_dir_all(path.parent().unwrap());
}

#[test]
fn unknown_named_scenario_is_an_error() {
    let path = setup("wn_app_unknown_scenario");
    let err = run_scenario(&request(&path, Some("nope"), &[])).unwrap_err();
    assert!(matches!(err, AppError::ScenarioNotFound(ref n) if n == "nope"));
    let _ = std::fs::remove_dir_all(path.parent().unwrap());
}

#[test]
fn configured_scenarios_run_in_order() {
    let path = setup("wn_app_configured");
    let reports = run_configured_scenarios(&path, false).unwrap();
    let names: Vec<_> = reports.iter().map(|(n, _)| n.as_str()).collect();
    assert_eq!(names, vec!["shut P1", "shut P2"]);

    let shut_p1 = reports[0].1.as_ref().unwrap();
    assert_eq!(shut_p1.diff.newly_disconnected.len(), 2);
    assert_eq!(shut_p1.diff.demand_at_risk, 7.0);

    let _ = std::fs::remove_dir_all(path.parent().unwrap());
}

#[test]
fn build_reports_leaks_and_criticality() {
    let path = setup("wn_app_build");
    let (ctx, built) = load_and_build(&path).unwrap();
    assert_eq!(ctx.deployment.name, "two-node");

    let summary = built.summary();
    assert_eq!(summary.nodes, 3);
    assert_eq!(summary.leaks, 2);
    assert_eq!(summary.dropped_leaks, 1);
    assert_eq!(leak_year_range(&built.leaks), Some((2019, 2021)));
    assert_eq!(leaks_in_year(&built.leaks, 2021).len(), 1);

    let view = NetworkView::topology(&built, ctx.deployment.reference_year());
    let p2 = view.pipes.iter().find(|p| p.id == "P2").unwrap();
    assert_eq!(p2.criticality, wn_scenario::Criticality::High);
    let p1 = view.pipes.iter().find(|p| p.id == "P1").unwrap();
    assert_eq!(p1.criticality, wn_scenario::Criticality::Medium);

    let _ = std::fs::remove_dir_all(path.parent().unwrap());
}

#[test]
fn missing_input_file_names_role_and_path() {
    let path = setup("wn_app_missing_file");
    std::fs::remove_file(path.parent().unwrap().join("pipes.csv")).unwrap();
    let err = load_and_build(&path).unwrap_err();
    match err {
        AppError::InputFileRead { role, path: p, .. } => {
            assert_eq!(role, "pipes");
            assert!(p.ends_with("pipes.csv"));
        }
        other => panic!("unexpected {other:?}"),
    }
    let _ = std::fs::remove_dir_all(path.parent().unwrap());
}
