use serde_json::json;
use trajview::api::{ViewParams, ViewStatus, ViewerConfig, derive_view};
use trajview::core::{
    Coordinate, ExperimentDocument, FieldKey, HiddenSet, LinearScanAlignment, Uid, VariableKind,
    flatten_group, rank_solutions, to_relative,
};

const DOCUMENT: &str = r#"{
    "generation_params": {"experiment_folder": "results/cart_pole"},
    "data_path": "cart_pole/run_0",
    "data": {
        "validation": {
            "batch_starting_time": [0.0],
            "trajectories": [
                {
                    "name": "ref00000",
                    "reference": true,
                    "series": {
                        "time": {"time": [[0.0], [1.0], [2.0]]},
                        "qpos": {"series": [{"coordinate_number": 0, "data": [0.0, 1.0, 2.0]}]}
                    }
                },
                {
                    "name": "abc12345efgh",
                    "reference": false,
                    "series": {
                        "time": {"time": [0.0, 1.0, 2.0]},
                        "qpos": {"series": [{"coordinate_number": 0, "data": [0.0, 2.0, 4.0]}]}
                    },
                    "solutions": [
                        {"mode_solution": "explicit", "solution_vector": [1.0], "solution_label": ["x"]}
                    ],
                    "regression_result": {
                        "regression_parameters": {
                            "regression_type": "sindy",
                            "optimization_function": "lasso",
                            "noise_level": 0.0
                        },
                        "valid": true,
                        "RMSE_acceleration": 0.25
                    }
                }
            ]
        }
    }
}"#;

#[test]
fn ranks_flattens_and_projects_a_minimal_document() {
    let document = ExperimentDocument::from_json_str(DOCUMENT).expect("document should parse");
    let ranking = rank_solutions(document.data.values());

    assert_eq!(ranking.len(), 1);
    let entry = ranking
        .get(&Uid::from_name("abc12345"))
        .expect("candidate should be ranked");
    assert_eq!(entry.rank, 1);
    assert_eq!(entry.metadata.regression_type, "sindy");
    assert_eq!(entry.metadata.rmse_acceleration, Some(0.25));

    let group = document.group("validation").expect("group present");
    let flattened = flatten_group(
        "validation",
        group,
        &ranking,
        &HiddenSet::new(),
        &LinearScanAlignment,
    )
    .expect("group should flatten");

    let records = serde_json::to_value(&flattened.records).expect("records serialize");
    assert_eq!(
        records,
        json!([
            {"time": 0.0, "coor_0.qpos": 0.0, "1.coor_0.qpos": 0.0},
            {"time": 1.0, "coor_0.qpos": 1.0, "1.coor_0.qpos": 2.0},
            {"time": 2.0, "coor_0.qpos": 2.0, "1.coor_0.qpos": 4.0}
        ])
    );

    let lines: Vec<FieldKey> = ["coor_0.qpos", "1.coor_0.qpos"]
        .into_iter()
        .map(|raw| raw.parse().expect("valid key"))
        .collect();
    let projection = to_relative(&flattened.records, &lines);
    let relative: Vec<Option<f64>> = projection
        .records
        .iter()
        .map(|record| record.get(&FieldKey::Relative { rank: 1 }))
        .collect();
    assert_eq!(relative, vec![Some(0.0), Some(1.0), Some(2.0)]);
}

#[test]
fn derived_view_bundles_every_output() {
    let document = ExperimentDocument::from_json_str(DOCUMENT).expect("document should parse");
    let config = ViewerConfig::new(".");
    let params = ViewParams::new("validation").with_relative(true);

    let snapshot = derive_view(&document, &params, &config);

    assert_eq!(snapshot.status, ViewStatus::Ready);
    assert_eq!(snapshot.simulation_type, "cart_pole");
    assert_eq!(snapshot.batch_start_times, vec![0.0]);
    assert_eq!(snapshot.records.len(), 3);
    assert_eq!(snapshot.control_rows.len(), 1);
    assert!(snapshot.control_rows[0].visible);
    assert_eq!(snapshot.relative.len(), 1);
    let panel = &snapshot.relative[0];
    assert_eq!((panel.variable, panel.coordinate), (VariableKind::Qpos, Coordinate(0)));
    assert_eq!(panel.projection.line_keys, vec![FieldKey::Relative { rank: 1 }]);
    assert_eq!(snapshot.position_range.min, 0.0);
    assert_eq!(snapshot.position_range.max, 2.0);
    assert_eq!(snapshot.force_range, config.fallback_force_range);
}

#[test]
fn structural_failure_is_reported_as_status_with_no_records() {
    let document = ExperimentDocument::from_json_str(DOCUMENT).expect("document should parse");
    let config = ViewerConfig::new(".");

    let snapshot = derive_view(&document, &ViewParams::new("training_group"), &config);

    assert!(matches!(snapshot.status, ViewStatus::Error { .. }));
    assert!(snapshot.records.is_empty());
    assert!(snapshot.lines.is_empty());
    assert_eq!(snapshot.ranking.len(), 1);
}

#[test]
fn group_without_reference_yields_error_state() {
    let mut document = ExperimentDocument::from_json_str(DOCUMENT).expect("document should parse");
    let group = document.data.get_mut("validation").expect("group present");
    group.trajectories.retain(|trajectory| !trajectory.reference);

    let snapshot = derive_view(&document, &ViewParams::new("validation"), &ViewerConfig::new("."));

    match snapshot.status {
        ViewStatus::Error { message } => assert!(message.contains("no reference trajectory")),
        ViewStatus::Ready => panic!("expected error status"),
    }
    assert!(snapshot.records.is_empty());
}
