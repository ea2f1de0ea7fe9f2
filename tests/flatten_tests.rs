use trajview::ViewError;
use trajview::core::{
    BinarySearchAlignment, Coordinate, FieldKey, FlatRecord, HiddenSet, LinearScanAlignment, RegressionResult,
    Series, Solution, TimeAlignment, Trajectory, TrajectoryGroup, Uid, VariableKind, flatten_group,
    rank_solutions,
};

fn reference(time: Vec<f64>, qpos: Vec<f64>) -> Trajectory {
    Trajectory::new("ref00000_truth")
        .as_reference()
        .with_series(Series::new(time).with_channel(VariableKind::Qpos, 0, qpos))
}

fn ranked(name: &str, time: Vec<f64>, qpos: Vec<f64>) -> Trajectory {
    Trajectory::new(name)
        .with_series(Series::new(time).with_channel(VariableKind::Qpos, 0, qpos))
        .with_solutions(vec![Solution::new("mode_0", vec![1.0], vec!["x".to_owned()])])
        .with_regression_result(RegressionResult::new("sindy", "lasso", 0.0))
}

#[test]
fn aligned_candidate_keeps_raw_samples() {
    let raw = vec![3.5, 4.25, 5.125];
    let group = TrajectoryGroup::new(vec![
        reference(vec![0.0, 1.0, 2.0], vec![0.0, 1.0, 2.0]),
        ranked("abc12345_run", vec![0.0, 1.0, 2.0], raw.clone()),
    ]);
    let ranking = rank_solutions([&group]);

    let flattened = flatten_group(
        "validation_group",
        &group,
        &ranking,
        &HiddenSet::new(),
        &LinearScanAlignment,
    )
    .expect("group should flatten");

    let key = FieldKey::ranked(1, 0, VariableKind::Qpos);
    assert_eq!(flattened.records.len(), 3);
    for (record, expected) in flattened.records.iter().zip(&raw) {
        assert_eq!(record.get(&key), Some(*expected));
    }
    assert_eq!(
        flattened.lines.lines(VariableKind::Qpos, Coordinate(0)),
        &[FieldKey::reference(0, VariableKind::Qpos), key]
    );
}

#[test]
fn shorter_candidate_uses_nearest_time_sample() {
    let group = TrajectoryGroup::new(vec![
        reference(vec![0.0, 0.1, 0.2], vec![1.0, 1.0, 1.0]),
        ranked("abc12345_run", vec![0.0, 0.15], vec![5.0, 9.0]),
    ]);
    let ranking = rank_solutions([&group]);
    let key = FieldKey::ranked(1, 0, VariableKind::Qpos);

    let strategies: [&dyn TimeAlignment; 2] = [&LinearScanAlignment, &BinarySearchAlignment];
    for alignment in strategies {
        let flattened = flatten_group(
            "validation_group",
            &group,
            &ranking,
            &HiddenSet::new(),
            alignment,
        )
        .expect("group should flatten");

        let values: Vec<Option<f64>> = flattened.records.iter().map(|r| r.get(&key)).collect();
        assert_eq!(values, vec![Some(5.0), Some(9.0), Some(9.0)]);
        assert_eq!(flattened.records[2].time, 0.2);
    }
}

#[test]
fn records_follow_reference_time_axis() {
    let group = TrajectoryGroup::new(vec![
        reference(vec![0.0, 0.5, 1.0, 1.5], vec![0.0, 0.0, 0.0, 0.0]),
        ranked("abc12345_run", vec![0.0, 1.0], vec![2.0, 3.0]),
    ]);
    let ranking = rank_solutions([&group]);

    let flattened = flatten_group(
        "validation_group",
        &group,
        &ranking,
        &HiddenSet::new(),
        &LinearScanAlignment,
    )
    .expect("group should flatten");

    let times: Vec<f64> = flattened.records.iter().map(|r| r.time).collect();
    assert_eq!(times, vec![0.0, 0.5, 1.0, 1.5]);
}

#[test]
fn missing_samples_leave_fields_absent() {
    let group = TrajectoryGroup::new(vec![
        reference(vec![0.0, 1.0, 2.0], vec![0.0, 1.0, 2.0]),
        ranked("abc12345_run", vec![0.0, 1.0, 2.0], vec![7.0]),
    ]);
    let ranking = rank_solutions([&group]);

    let flattened = flatten_group(
        "validation_group",
        &group,
        &ranking,
        &HiddenSet::new(),
        &LinearScanAlignment,
    )
    .expect("group should flatten");

    let key = FieldKey::ranked(1, 0, VariableKind::Qpos);
    assert_eq!(flattened.records[0].get(&key), Some(7.0));
    assert_eq!(flattened.records[1].get(&key), None);
    assert_eq!(flattened.records[2].get(&key), None);
    assert!(flattened.records[2].get(&FieldKey::reference(0, VariableKind::Qpos)).is_some());
}

#[test]
fn unranked_candidate_is_keyed_by_uid() {
    let unranked = Trajectory::new("zzzz9999_baseline")
        .with_series(Series::new(vec![0.0, 1.0]).with_channel(VariableKind::Qvel, 1, vec![4.0, 5.0]));
    let group = TrajectoryGroup::new(vec![reference(vec![0.0, 1.0], vec![0.0, 1.0]), unranked]);
    let ranking = rank_solutions([&group]);

    let flattened = flatten_group(
        "validation_group",
        &group,
        &ranking,
        &HiddenSet::new(),
        &LinearScanAlignment,
    )
    .expect("group should flatten");

    let key = FieldKey::unranked(Uid::from_name("zzzz9999"), 1, VariableKind::Qvel);
    assert_eq!(key.to_string(), "zzzz9999.coor_1.qvel");
    assert_eq!(flattened.records[1].get(&key), Some(5.0));
    assert_eq!(flattened.lines.lines(VariableKind::Qvel, Coordinate(1)), &[key]);
}

#[test]
fn candidate_without_series_contributes_nothing() {
    let mut bare = ranked("abc12345_run", vec![0.0], vec![0.0]);
    bare.series = None;
    let group = TrajectoryGroup::new(vec![reference(vec![0.0, 1.0], vec![0.0, 1.0]), bare]);
    let ranking = rank_solutions([&group]);

    let flattened = flatten_group(
        "validation_group",
        &group,
        &ranking,
        &HiddenSet::new(),
        &LinearScanAlignment,
    )
    .expect("group should flatten");

    assert_eq!(ranking.len(), 1);
    assert!(flattened.records.iter().all(|record| record.fields.len() == 1));
    assert_eq!(flattened.lines.lines(VariableKind::Qpos, Coordinate(0)).len(), 1);
}

#[test]
fn group_without_reference_is_a_structural_error() {
    let group = TrajectoryGroup::new(vec![ranked("abc12345_run", vec![0.0], vec![0.0])]);
    let ranking = rank_solutions([&group]);

    let err = flatten_group(
        "validation_group",
        &group,
        &ranking,
        &HiddenSet::new(),
        &LinearScanAlignment,
    )
    .expect_err("no reference should fail");

    assert_eq!(
        err,
        ViewError::MissingReference {
            group: "validation_group".to_owned()
        }
    );
    assert!(err.is_group_scoped());
}

#[test]
fn reference_without_series_is_a_structural_error() {
    let group = TrajectoryGroup::new(vec![Trajectory::new("ref00000").as_reference()]);
    let err = flatten_group(
        "training_group",
        &group,
        &rank_solutions([&group]),
        &HiddenSet::new(),
        &LinearScanAlignment,
    )
    .expect_err("reference without series should fail");

    assert!(matches!(err, ViewError::MissingReference { .. }));
}

#[test]
fn empty_group_is_a_structural_error() {
    let group = TrajectoryGroup::new(Vec::new());
    let err = flatten_group(
        "validation_group",
        &group,
        &rank_solutions([&group]),
        &HiddenSet::new(),
        &LinearScanAlignment,
    )
    .expect_err("empty group should fail");

    assert!(matches!(err, ViewError::EmptyGroup { .. }));
}

#[test]
fn additional_references_are_ignored() {
    let second_reference = Trajectory::new("ref11111_alt")
        .as_reference()
        .with_series(Series::new(vec![0.0, 1.0]).with_channel(VariableKind::Qpos, 0, vec![9.0, 9.0]));
    let group = TrajectoryGroup::new(vec![
        reference(vec![0.0, 1.0], vec![0.0, 1.0]),
        second_reference,
    ]);

    let flattened = flatten_group(
        "validation_group",
        &group,
        &rank_solutions([&group]),
        &HiddenSet::new(),
        &LinearScanAlignment,
    )
    .expect("group should flatten");

    assert_eq!(
        flattened.records[1].get(&FieldKey::reference(0, VariableKind::Qpos)),
        Some(1.0)
    );
    assert!(flattened.records.iter().all(|record| record.fields.len() == 1));
}

/// Reference at 10 Hz, one aligned candidate and one offset half-rate candidate.
fn mixed_rate_group(steps: usize) -> TrajectoryGroup {
    let reference_time: Vec<f64> = (0..steps).map(|i| i as f64 * 0.1).collect();
    let slow_time: Vec<f64> = (0..steps / 2).map(|j| j as f64 * 0.2 + 0.05).collect();
    TrajectoryGroup::new(vec![
        reference(reference_time.clone(), (0..steps).map(|i| i as f64).collect()),
        ranked(
            "aaaaaaaa_fast",
            reference_time,
            (0..steps).map(|i| i as f64 * 2.0).collect(),
        ),
        ranked(
            "bbbbbbbb_slow",
            slow_time,
            (0..steps / 2).map(|j| j as f64).collect(),
        ),
    ])
}

fn expected_mixed_records(steps: usize) -> Vec<FlatRecord> {
    (0..steps)
        .map(|i| {
            let mut record = FlatRecord::new(i as f64 * 0.1);
            record
                .fields
                .insert(FieldKey::reference(0, VariableKind::Qpos), i as f64);
            record
                .fields
                .insert(FieldKey::ranked(1, 0, VariableKind::Qpos), i as f64 * 2.0);
            record
                .fields
                .insert(FieldKey::ranked(2, 0, VariableKind::Qpos), (i / 2) as f64);
            record
        })
        .collect()
}

#[test]
fn mixed_rate_group_records_follow_time_order() {
    let group = mixed_rate_group(40);
    let ranking = rank_solutions([&group]);

    let flattened = flatten_group(
        "validation_group",
        &group,
        &ranking,
        &HiddenSet::new(),
        &BinarySearchAlignment,
    )
    .expect("group should flatten");

    assert_eq!(flattened.records, expected_mixed_records(40));
}

#[cfg(feature = "parallel-projection")]
#[test]
fn parallel_projection_matches_sequential_records() {
    let steps = 2_000;
    let group = mixed_rate_group(steps);
    let ranking = rank_solutions([&group]);
    let expected = expected_mixed_records(steps);

    let strategies: [&dyn TimeAlignment; 2] = [&LinearScanAlignment, &BinarySearchAlignment];
    for alignment in strategies {
        let flattened = flatten_group(
            "validation_group",
            &group,
            &ranking,
            &HiddenSet::new(),
            alignment,
        )
        .expect("group should flatten");

        assert_eq!(flattened.records.len(), steps);
        for (actual, expected) in flattened.records.iter().zip(&expected) {
            assert_eq!(actual.time, expected.time);
            assert_eq!(
                actual.fields.iter().collect::<Vec<_>>(),
                expected.fields.iter().collect::<Vec<_>>()
            );
        }
    }
}
