use wn_graph::{LengthMetric, ReferencePolicy};
use wn_project::schema::*;
use wn_project::{from_yaml_str, load_yaml, save_yaml, validate_deployment};
use wn_records::{AgeConvention, EntityKind};
use wn_solver::SolverKind;

const DMA: &str = r#"
version: 1
name: North DMA
crs:
  source: EPSG:3857
  target: EPSG:4326
inputs:
  format: tabular
  nodes: data/nodes.csv
  pipes: data/pipes.csv
  leaks: data/leaks.csv
field_aliases:
  pipe:
    age_or_year: [InstallYr]
build:
  reference_policy: reject_and_continue
  length_metric: haversine
ages:
  convention: installation_year
  reference_year: 2024
service:
  pressure_threshold_m: 15
solver:
  kind: hazen_williams
  max_iterations: 60
  tolerance: 1.0e-8
  default_roughness: 120
connectivity:
  require_connected: true
scenarios:
  - name: valve V12 shut
    close: [P12, P13]
  - name: bypass
    close: [P12]
    open: [P40]
"#;

#[test]
fn parses_full_deployment() {
    let d = from_yaml_str(DMA).unwrap();
    assert_eq!(d.name, "North DMA");
    assert_eq!(d.inputs.format, InputFormat::Tabular);
    assert_eq!(d.build.reference_policy, ReferencePolicy::RejectAndContinue);
    assert_eq!(d.build.length_metric, Some(LengthMetric::Haversine));
    assert_eq!(d.ages.convention, AgeConvention::InstallationYear);
    assert_eq!(d.reference_year(), 2024);
    assert_eq!(d.service.pressure_threshold_m, 15.0);
    assert_eq!(d.solver.kind, SolverKind::HazenWilliams);
    assert_eq!(d.solver.default_roughness, Some(120.0));
    assert!(d.connectivity.require_connected);
    assert_eq!(d.scenario("bypass").unwrap().open, vec!["P40".to_string()]);

    let schemas = d.schema_set();
    let headers = vec!["PipeID".to_string(), "from".into(), "to".into(), "InstallYr".into()];
    assert_eq!(schemas.get(EntityKind::Pipe).resolve(&headers).get("age_or_year"), Some(&3));
}

#[test]
fn minimal_file_gets_defaults() {
    let d = from_yaml_str(
        "name: tiny\ninputs:\n  format: inp\n  network: net.inp\n",
    )
    .unwrap();
    assert_eq!(d.version, 1);
    assert_eq!(d.crs, CrsDef::default());
    assert_eq!(d.service.pressure_threshold_m, 10.0);
    assert_eq!(d.solver.kind, SolverKind::Hydrostatic);
    assert!(d.scenarios.is_empty());
}

#[test]
fn invalid_file_is_rejected_on_load() {
    let err = from_yaml_str("name: x\ninputs:\n  format: tabular\n  nodes: n.csv\n").unwrap_err();
    assert!(err.to_string().contains("pipes"));
}

#[test]
fn roundtrip_yaml_file() {
    let d = from_yaml_str(DMA).unwrap();
    validate_deployment(&d).unwrap();

    let path = std::env::temp_dir().join("wn_project_roundtrip.yaml");
    save_yaml(&path, &d).unwrap();
    let loaded = load_yaml(&path).unwrap();
    assert_eq!(d, loaded);
}
