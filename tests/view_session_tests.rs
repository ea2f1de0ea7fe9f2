use trajview::api::{
    FileInfo, MemoryDocumentSource, ViewSession, ViewStatus, ViewerConfig,
};
use trajview::core::{ExperimentDocument, FieldKey, SolutionId, Uid, VariableKind};
use trajview::ViewError;

const DOCUMENT_A: &str = r#"{
    "data": {
        "validation_group": {
            "trajectories": [
                {"name": "ref00000", "reference": true, "series": {
                    "time": [0.0, 1.0],
                    "qpos": {"series": [{"coordinate_number": 0, "data": [0.0, 1.0]}]}
                }},
                {"name": "abc12345_a", "series": {
                    "time": [0.0, 1.0],
                    "qpos": {"series": [{"coordinate_number": 0, "data": [2.0, 3.0]}]}
                },
                "solutions": [{"mode_solution": "m", "solution_vector": [1.0], "solution_label": ["x"]}],
                "regression_result": {"regression_parameters": {"regression_type": "sindy", "optimization_function": "lasso", "noise_level": 0.0}}}
            ]
        }
    }
}"#;

const DOCUMENT_B: &str = r#"{
    "data": {
        "validation_group": {
            "trajectories": [
                {"name": "ref00000", "reference": true, "series": {
                    "time": [0.0, 1.0, 2.0],
                    "qpos": {"series": [{"coordinate_number": 0, "data": [0.0, 1.0, 2.0]}]}
                }}
            ]
        }
    }
}"#;

const DOCUMENT_SHARED: &str = r#"{
    "data": {
        "validation_group": {
            "trajectories": [
                {"name": "ref00000", "reference": true, "series": {
                    "time": [0.0, 1.0],
                    "qpos": {"series": [{"coordinate_number": 0, "data": [0.0, 1.0]}]}
                }},
                {"name": "abc12345_a", "series": {
                    "time": [0.0, 1.0],
                    "qpos": {"series": [{"coordinate_number": 0, "data": [2.0, 3.0]}]}
                },
                "solutions": [{"mode_solution": "m", "solution_vector": [1.0], "solution_label": ["x"]}],
                "regression_result": {"regression_parameters": {"regression_type": "sindy", "optimization_function": "lasso", "noise_level": 0.0}}}
            ]
        },
        "training_group": {
            "trajectories": [
                {"name": "ref00000", "reference": true, "series": {
                    "time": [0.0, 1.0],
                    "qpos": {"series": [{"coordinate_number": 0, "data": [0.0, 1.0]}]}
                }},
                {"name": "abc12345_a", "series": {
                    "time": [0.0, 1.0],
                    "qpos": {"series": [{"coordinate_number": 0, "data": [7.0, 8.0]}]}
                },
                "solutions": [{"mode_solution": "m", "solution_vector": [1.0], "solution_label": ["x"]}],
                "regression_result": {"regression_parameters": {"regression_type": "sindy", "optimization_function": "lasso", "noise_level": 0.0}}}
            ]
        }
    }
}"#;

fn source() -> MemoryDocumentSource {
    MemoryDocumentSource::new()
        .with_document(FileInfo::new("a.json"), DOCUMENT_A)
        .with_document(FileInfo::new("b.json"), DOCUMENT_B)
        .with_document(FileInfo::new("shared.json"), DOCUMENT_SHARED)
}

fn parse(raw: &str) -> ExperimentDocument {
    ExperimentDocument::from_json_str(raw).expect("document should parse")
}

#[test]
fn nothing_to_show_before_first_document() {
    let session = ViewSession::new(ViewerConfig::new("."));
    assert!(session.snapshot().is_none());
}

#[test]
fn stale_fetch_does_not_overwrite_newer_selection() {
    let mut session = ViewSession::new(ViewerConfig::new("."));

    let slow = session.select_file("a.json");
    let fast = session.select_file("b.json");

    assert!(session.complete_fetch(&fast, Ok(parse(DOCUMENT_B))));
    assert!(!session.complete_fetch(&slow, Ok(parse(DOCUMENT_A))));

    let snapshot = session.snapshot().expect("document loaded");
    assert_eq!(snapshot.file.as_deref(), Some("b.json"));
    assert_eq!(snapshot.records.len(), 3);
}

#[test]
fn completed_ticket_cannot_land_twice() {
    let mut session = ViewSession::new(ViewerConfig::new("."));
    let ticket = session.select_file("a.json");

    assert!(session.complete_fetch(&ticket, Ok(parse(DOCUMENT_A))));
    assert!(!session.complete_fetch(&ticket, Ok(parse(DOCUMENT_B))));
    assert_eq!(session.params().file.as_deref(), Some("a.json"));
}

#[test]
fn loaded_document_starts_with_candidates_hidden() {
    let mut session = ViewSession::new(ViewerConfig::new("."));
    assert!(session.load(&source(), "a.json"));

    let snapshot = session.snapshot().expect("document loaded");
    let candidate = FieldKey::ranked(1, 0, VariableKind::Qpos);
    assert_eq!(snapshot.status, ViewStatus::Ready);
    assert!(snapshot.records.iter().all(|record| record.get(&candidate).is_none()));
    assert_eq!(snapshot.ranking.len(), 1);

    let visible = session.toggle(&SolutionId::new("validation_group", Uid::from_name("abc12345")));
    assert!(visible);
    let snapshot = session.snapshot().expect("document loaded");
    assert_eq!(snapshot.records[1].get(&candidate), Some(3.0));
}

#[test]
fn toggled_row_is_plotted_when_uid_is_shared_across_groups() {
    let mut session = ViewSession::new(ViewerConfig::new("."));
    assert!(session.load(&source(), "shared.json"));

    let id = SolutionId::new("validation_group", Uid::from_name("abc12345"));
    assert!(session.toggle(&id));

    let snapshot = session.snapshot().expect("document loaded");
    let candidate = FieldKey::ranked(1, 0, VariableKind::Qpos);
    let row = snapshot
        .control_rows
        .iter()
        .find(|row| row.id == id)
        .expect("control row");
    assert!(row.visible);
    assert_eq!(snapshot.records[0].get(&candidate), Some(2.0));
    assert_eq!(snapshot.records[1].get(&candidate), Some(3.0));

    session.set_group("training_group");
    let snapshot = session.snapshot().expect("document loaded");
    assert!(snapshot.records.iter().all(|record| record.get(&candidate).is_none()));
}

#[test]
fn playback_cursor_runs_at_configured_speed() {
    let mut session = ViewSession::new(ViewerConfig::new(".").with_playback_speed(2.0));
    assert!(session.playback_cursor().is_none());
    assert!(session.load(&source(), "b.json"));

    let mut cursor = session.playback_cursor().expect("view ready");
    assert_eq!(cursor.speed(), 2.0);
    cursor.play();
    assert_eq!(cursor.advance(500.0), 1);
    assert_eq!(cursor.current_time(), Some(1.0));
}

#[test]
fn visible_by_default_config_shows_candidates() {
    let config = ViewerConfig::new(".").with_hidden_by_default(false);
    let mut session = ViewSession::new(config);
    assert!(session.load(&source(), "a.json"));

    let table = session.control_table().expect("document loaded");
    assert_eq!(table.visible_count(), 1);
}

#[test]
fn relative_mode_and_group_survive_a_new_document() {
    let mut session = ViewSession::new(ViewerConfig::new("."));
    session.set_relative(true);
    assert!(session.load(&source(), "b.json"));

    assert!(session.params().relative);
    assert_eq!(session.params().group, "validation_group");
}

#[test]
fn failed_fetch_surfaces_error_status() {
    let mut session = ViewSession::new(ViewerConfig::new("."));
    assert!(session.load(&source(), "missing.json"));

    let snapshot = session.snapshot().expect("error snapshot");
    assert!(matches!(snapshot.status, ViewStatus::Error { .. }));
    assert!(snapshot.records.is_empty());
    assert!(session.document().is_none());
}

#[test]
fn fetch_error_keeps_reason() {
    let mut session = ViewSession::new(ViewerConfig::new("."));
    let ticket = session.select_file("a.json");
    let err = ViewError::DocumentFetch {
        path: "a.json".to_owned(),
        reason: "connection reset".to_owned(),
    };
    assert!(session.complete_fetch(&ticket, Err(err)));

    match session.snapshot().expect("error snapshot").status {
        ViewStatus::Error { message } => assert!(message.contains("connection reset")),
        ViewStatus::Ready => panic!("expected error status"),
    }
}

#[test]
fn unknown_group_is_a_soft_error() {
    let mut session = ViewSession::new(ViewerConfig::new("."));
    assert!(session.load(&source(), "a.json"));
    session.set_group("training_group");

    let snapshot = session.snapshot().expect("document loaded");
    assert!(!snapshot.status.is_ready());
    assert!(snapshot.records.is_empty());
}
