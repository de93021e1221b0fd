//! Loader → normalizer round through each input format.

use wn_records::{
    AgeConvention, EntityKind, Installation, NetworkSource, NodeKind, NormalizeOptions,
    Numeric, PipeStatus, RoleBuffers, SchemaError, SchemaSet, SolverNativeSource,
    TabularSource, VectorFileSource, normalize_all,
};

fn opts(convention: AgeConvention) -> NormalizeOptions {
    NormalizeOptions {
        age_convention: convention,
        reference_year: 2024,
    }
}

#[test]
fn dashboard_csvs_normalize() {
    let source = TabularSource::new(RoleBuffers {
        nodes: b"NodeID,XCoord,YCoord\n1,0,0\n2,1,0\n".to_vec(),
        pipes: b"PipeID,StartID,EndID,Age,Material\nP1,1,2,60,Cast Iron\n".to_vec(),
        assets: None,
        leaks: Some(b"XCoord,YCoord,Year\n0.5,0,2019\n,,2020\n".to_vec()),
    });
    let tables = source.load().unwrap();
    let inputs = normalize_all(&tables, &SchemaSet::default(), &opts(AgeConvention::Age)).unwrap();

    assert_eq!(inputs.nodes.len(), 2);
    assert_eq!(inputs.pipes[0].start_id, "1");
    assert_eq!(inputs.pipes[0].installation, Installation::Age(60.0));
    assert_eq!(inputs.pipes[0].material.as_deref(), Some("Cast Iron"));
    assert_eq!(inputs.leaks.leaks.len(), 1);
    assert_eq!(inputs.leaks.dropped, 1);
}

#[test]
fn schema_errors_are_collected_across_kinds() {
    let source = TabularSource::new(RoleBuffers {
        nodes: b"NodeID,XCoord\nN1,0\n".to_vec(),
        pipes: b"PipeID,StartID,EndID,Year\nP1,N1,N2,1750\n".to_vec(),
        assets: None,
        leaks: None,
    });
    let tables = source.load().unwrap();
    let errs = normalize_all(
        &tables,
        &SchemaSet::default(),
        &opts(AgeConvention::InstallationYear),
    )
    .unwrap_err();

    assert_eq!(errs.0.len(), 2);
    match errs.for_kind(EntityKind::Node) {
        Some(SchemaError::MissingFields { missing, found, .. }) => {
            assert_eq!(missing, &vec!["y".to_string()]);
            assert_eq!(found, &vec!["NodeID".to_string(), "XCoord".to_string()]);
        }
        other => panic!("unexpected {other:?}"),
    }
    match errs.for_kind(EntityKind::Pipe) {
        Some(SchemaError::InvalidValues { issues, .. }) => {
            assert_eq!(issues[0].entity_id, "P1");
            assert_eq!(issues[0].field, "age_or_year");
        }
        other => panic!("unexpected {other:?}"),
    }
}

#[test]
fn geojson_features_normalize() {
    let nodes = br#"{"type":"FeatureCollection","features":[
        {"type":"Feature","id":"A","properties":{},"geometry":{"type":"Point","coordinates":[0,0]}},
        {"type":"Feature","id":"B","properties":{},"geometry":{"type":"Point","coordinates":[2,0]}}
    ]}"#;
    let pipes = br#"{"type":"FeatureCollection","features":[
        {"type":"Feature","properties":{"id":"AB","from":"A","to":"B","status":"closed"},
         "geometry":{"type":"LineString","coordinates":[[0,0],[1,1],[2,0]]}}
    ]}"#;
    let source = VectorFileSource::new(RoleBuffers {
        nodes: nodes.to_vec(),
        pipes: pipes.to_vec(),
        assets: None,
        leaks: None,
    });
    let tables = source.load().unwrap();
    let inputs = normalize_all(&tables, &SchemaSet::default(), &opts(AgeConvention::Age)).unwrap();

    assert_eq!(inputs.nodes[1].id, "B");
    assert_eq!(inputs.pipes[0].status, PipeStatus::Closed);
    assert_eq!(inputs.pipes[0].geometry.as_ref().map(Vec::len), Some(3));
}

#[test]
fn inp_model_normalizes() {
    let inp = b"[JUNCTIONS]\n J1 10 5\n[RESERVOIRS]\n R1 60\n[PIPES]\n P1 R1 J1 100 150 120 0 Open\n[COORDINATES]\n J1 1 0\n R1 0 0\n[END]\n";
    let source = SolverNativeSource {
        inp: inp.to_vec(),
        assets: None,
        leaks: None,
    };
    let tables = source.load().unwrap();
    let inputs = normalize_all(&tables, &SchemaSet::default(), &opts(AgeConvention::Age)).unwrap();

    let r1 = inputs.nodes.iter().find(|n| n.id == "R1").unwrap();
    assert_eq!(r1.kind, NodeKind::Reservoir);
    assert_eq!(r1.head, Numeric::Value(60.0));
    assert_eq!(inputs.pipes[0].diameter, Numeric::Value(150.0));
    assert_eq!(inputs.pipes[0].roughness, Numeric::Value(120.0));
}
