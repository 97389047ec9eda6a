#![allow(clippy::unwrap_used, clippy::expect_used)]

mod common;

use common::{completion_log, loaded_declarative, logging_completion, snapshot};
use rowbatch_core::{
    nested_diff, Coordinator, CoordinatorConfig, FlushPlan, IndexPath, ReconcileMode,
    RecordingSurface, RowAnimation, SnapshotDataSource, SurfaceCall,
};

#[test]
fn test_keyed_sections_example() {
    // GIVEN: [s0: A B] [s1: C]
    let old = snapshot(&[("s0", "AB"), ("s1", "C")]);
    let new = snapshot(&[("s0", "A"), ("s2", "CD"), ("s3", "E")]);
    let mut coordinator = loaded_declarative(old.clone());
    let log = completion_log();

    // WHEN: the source is refreshed to [s0: A] [s2: C D] [s3: E] inside a transaction
    coordinator.begin_updates();
    coordinator.data_source_mut().stage(new.clone());
    coordinator
        .end_updates(true, logging_completion(&log, "diffed"))
        .unwrap();

    // THEN: one item delete, one section delete, two section inserts
    assert_eq!(
        coordinator.surface().calls(),
        &[
            SurfaceCall::BeginBatch { animated: true },
            SurfaceCall::DeleteItems {
                items: vec![IndexPath::new(0, 1)],
                animation: RowAnimation::Automatic,
            },
            SurfaceCall::DeleteSections {
                sections: vec![1],
                animation: RowAnimation::Automatic,
            },
            SurfaceCall::InsertSections {
                sections: vec![1, 2],
                animation: RowAnimation::Automatic,
            },
            SurfaceCall::EndBatch,
        ]
    );
    assert_eq!(*log.borrow(), vec![("diffed", true)]);
    assert_eq!(coordinator.data_source().sections(), new.as_slice());

    // AND: replaying the diff on the old snapshot yields the new one
    let plan = FlushPlan::from_nested_diff(&nested_diff(&old, &new), RowAnimation::Automatic);
    assert_eq!(plan.apply_to_snapshot(&old, &new).unwrap(), new);
}

#[test]
fn test_explicit_edits_are_ignored() {
    let mut coordinator = loaded_declarative(snapshot(&[("a", "xy")]));

    coordinator.begin_updates();
    coordinator
        .insert_sections([0], RowAnimation::Fade)
        .unwrap();
    coordinator
        .delete_rows([IndexPath::new(0, 0)], RowAnimation::Fade)
        .unwrap();
    coordinator.end_updates(false, None).unwrap();

    assert_eq!(coordinator.surface().batch_count(), 1);
    assert!(coordinator.surface().structural_calls().is_empty());
}

#[test]
fn test_item_moving_between_sections_is_delete_plus_insert() {
    let mut coordinator = loaded_declarative(snapshot(&[("a", "xy"), ("b", "z")]));

    coordinator.begin_updates();
    coordinator
        .data_source_mut()
        .stage(snapshot(&[("a", "x"), ("b", "yz")]));
    coordinator.end_updates(false, None).unwrap();

    assert_eq!(
        coordinator.surface().structural_calls(),
        vec![
            &SurfaceCall::DeleteItems {
                items: vec![IndexPath::new(0, 1)],
                animation: RowAnimation::Automatic,
            },
            &SurfaceCall::InsertItems {
                items: vec![IndexPath::new(1, 0)],
                animation: RowAnimation::Automatic,
            },
        ]
    );
}

#[test]
fn test_configured_animation_applies_to_diff() {
    let config = CoordinatorConfig::from_toml_str(
        "mode = \"declarative\"\ndeclarative_animation = \"fade\"\n",
    )
    .unwrap();
    let mut coordinator = Coordinator::from_config(
        SnapshotDataSource::new(snapshot(&[("a", "x")])),
        RecordingSurface::new(),
        config,
    );
    assert_eq!(coordinator.mode(), ReconcileMode::Declarative);
    coordinator.reload_data(None).unwrap();

    coordinator.begin_updates();
    coordinator.data_source_mut().stage(snapshot(&[("a", "xw")]));
    coordinator.end_updates(true, None).unwrap();

    assert_eq!(
        coordinator.surface().structural_calls(),
        vec![&SurfaceCall::InsertItems {
            items: vec![IndexPath::new(0, 1)],
            animation: RowAnimation::Fade,
        }]
    );
}

#[test]
fn test_reload_data_refreshes_content_without_diffing() {
    let mut coordinator = Coordinator::declarative(
        SnapshotDataSource::new(snapshot(&[("a", "x")])),
        RecordingSurface::new(),
    );
    coordinator
        .data_source_mut()
        .stage(snapshot(&[("b", "yz")]));

    coordinator.reload_data(None).unwrap();

    assert_eq!(coordinator.surface().calls(), &[SurfaceCall::ReloadData]);
    assert_eq!(coordinator.data_source().sections()[0].key, "b");
}

#[test]
fn test_refresh_before_initial_load_is_absorbed() {
    let mut coordinator = Coordinator::declarative(
        SnapshotDataSource::new(snapshot(&[("a", "x")])),
        RecordingSurface::new(),
    );
    let log = completion_log();

    coordinator.begin_updates();
    coordinator
        .data_source_mut()
        .stage(snapshot(&[("a", "xy")]));
    coordinator
        .end_updates(true, logging_completion(&log, "early"))
        .unwrap();

    assert_eq!(*log.borrow(), vec![("early", true)]);
    assert!(coordinator.surface().calls().is_empty());
    // Not refreshed: the pending content is picked up by the first reload
    assert!(coordinator.data_source().has_staged());
}
