mod common;

use chrono::SubsecRound;
use common::{Call, FakeStore, valve, water_main};
use pretty_assertions::assert_eq;
use std::sync::{Arc, Mutex};
use undergrid_storage::format_timestamp;
use undergrid_sync::{SaveReport, SyncConfig, SyncError, Synchronizer};
use undergrid_types::{
    CAP_CLEAR_DRAWINGS, CAP_SAVE_DRAWINGS, CancelFlag, CapabilitySet, Entity, EntityKind,
    EntityState, GeoPoint, PipelineEntity, PipelineType, ProgressSink,
};

fn make_sync(store: &FakeStore) -> Synchronizer<FakeStore> {
    Synchronizer::new(store.clone(), SyncConfig::default()).unwrap()
}

fn save(sync: &mut Synchronizer<FakeStore>) -> SaveReport {
    sync.save_incremental(&CancelFlag::new()).unwrap()
}

// ── Construction ─────────────────────────────────────────────────

#[test]
fn invalid_config_is_rejected() {
    let config = SyncConfig {
        provenance_marker: "  ".into(),
        ..Default::default()
    };
    assert!(matches!(
        Synchronizer::new(FakeStore::new(), config),
        Err(SyncError::Config(_))
    ));

    let config = SyncConfig {
        progress_interval: 0,
        ..Default::default()
    };
    assert!(matches!(
        Synchronizer::new(FakeStore::new(), config),
        Err(SyncError::Config(_))
    ));
}

// ── Insert ───────────────────────────────────────────────────────

#[test]
fn single_added_pipeline_is_inserted() {
    let store = FakeStore::new();
    let mut sync = make_sync(&store);
    let id = sync.draw(water_main("Main St")).unwrap();

    let report = save(&mut sync);

    assert_eq!(
        report,
        SaveReport {
            inserted: 1,
            ..SaveReport::default()
        }
    );
    assert!(report.is_success());
    assert_eq!(sync.state(&id), EntityState::Unchanged);

    let rows = store.pipelines();
    assert_eq!(rows.len(), 1);
    assert_eq!(
        rows[0].geom,
        "LINESTRING(120.100000 30.100000, 120.200000 30.200000)"
    );
    assert_eq!(rows[0].diameter_mm, 200);
    assert_eq!(rows[0].created_by, "user_drawing");
    assert_eq!(rows[0].pipeline_id, "PIPELINE-1");

    let entity = sync.entity(&id).unwrap();
    assert_eq!(entity.store_id(), Some(rows[0].id));
    assert_eq!(entity.business_id(), "PIPELINE-1");
}

#[test]
fn generated_ids_follow_kind_format() {
    let store = FakeStore::new();
    let mut sync = make_sync(&store);
    sync.draw(water_main("a")).unwrap();
    sync.draw(water_main("b")).unwrap();
    sync.draw(valve("v")).unwrap();

    save(&mut sync);

    let pipeline_ids: Vec<String> = store.pipelines().into_iter().map(|r| r.pipeline_id).collect();
    assert_eq!(pipeline_ids, vec!["PIPELINE-1", "PIPELINE-2"]);
    assert_eq!(store.facilities()[0].facility_id, "FACILITY-001");
    assert_eq!(sync.next_sequence(EntityKind::Pipeline), 3);
    assert_eq!(sync.next_sequence(EntityKind::Facility), 2);
}

#[test]
fn preset_business_id_is_kept() {
    let store = FakeStore::new();
    let mut sync = make_sync(&store);
    let mut main = water_main("preset");
    main.pipeline_id = "PIPELINE-42".into();
    sync.draw(main).unwrap();

    save(&mut sync);

    assert_eq!(store.pipelines()[0].pipeline_id, "PIPELINE-42");
    assert_eq!(sync.next_sequence(EntityKind::Pipeline), 1);
}

#[test]
fn partial_failure_is_isolated() {
    let store = FakeStore::new();
    store.fail_nth_insert(2);
    let mut sync = make_sync(&store);
    let a = sync.draw(water_main("a")).unwrap();
    let b = sync.draw(water_main("b")).unwrap();
    let c = sync.draw(water_main("c")).unwrap();

    let report = save(&mut sync);

    assert_eq!(report.inserted, 2);
    assert_eq!(report.failed, 1);
    assert_eq!(sync.state(&a), EntityState::Unchanged);
    assert_eq!(sync.state(&b), EntityState::Added);
    assert_eq!(sync.state(&c), EntityState::Unchanged);

    // The failed insert gives its generated id back and retries cleanly.
    assert_eq!(sync.entity(&b).unwrap().business_id(), "");
    assert_eq!(sync.entity(&b).unwrap().store_id(), None);

    let retry = save(&mut sync);
    assert_eq!(retry.inserted, 1);
    assert_eq!(retry.unchanged, 2);
    assert_eq!(sync.state(&b), EntityState::Unchanged);
    assert_eq!(store.pipelines().len(), 3);
}

#[test]
fn invalid_entities_never_reach_the_store() {
    let store = FakeStore::new();
    let mut sync = make_sync(&store);
    let stub = PipelineEntity::new("stub", PipelineType::Gas, vec![GeoPoint::new(1.0, 1.0)], 50);
    let stub = sync.draw(stub).unwrap();
    let mut unhealthy = valve("bad");
    unhealthy.health_score = 140;
    let unhealthy = sync.draw(unhealthy).unwrap();
    let mut off_map = water_main("off map");
    off_map.geometry[1] = GeoPoint::new(200.0, 10.0);
    let off_map = sync.draw(off_map).unwrap();

    let report = save(&mut sync);

    assert_eq!(report.failed, 3);
    assert!(!report.is_success());
    assert!(store.mutations().is_empty());
    for id in [stub, unhealthy, off_map] {
        assert_eq!(sync.state(&id), EntityState::Added);
        assert_eq!(sync.entity(&id).unwrap().business_id(), "");
    }
}

#[test]
fn conflicting_business_id_fails_and_regenerates() {
    let store = FakeStore::new();
    store.seed_pipeline(common::pipeline_row("PIPELINE-1", 0, "LINESTRING(1 1, 2 2)"));
    let mut sync = make_sync(&store);
    let id = sync.draw(water_main("new")).unwrap();

    let first = save(&mut sync);
    assert_eq!(first.failed, 1);
    assert_eq!(sync.state(&id), EntityState::Added);

    let second = save(&mut sync);
    assert_eq!(second.inserted, 1);
    assert_eq!(sync.entity(&id).unwrap().business_id(), "PIPELINE-2");
}

#[test]
fn reload_before_save_continues_stored_sequence() {
    let store = FakeStore::new();
    store.seed_pipeline(common::pipeline_row("PIPELINE-1", 0, "LINESTRING(1 1, 2 2)"));
    store.seed_facility(common::facility_row("FACILITY-004", 1, "POINT(1 1)"));
    let mut sync = make_sync(&store);
    assert_eq!(sync.next_sequence(EntityKind::Pipeline), 1);

    sync.reload(&CancelFlag::new()).unwrap();
    assert_eq!(sync.next_sequence(EntityKind::Pipeline), 5);
    let id = sync.draw(water_main("new")).unwrap();

    let report = save(&mut sync);
    assert_eq!((report.inserted, report.failed), (1, 0));
    assert_eq!(sync.entity(&id).unwrap().business_id(), "PIPELINE-5");
}

#[test]
fn exhausted_sequence_fails_without_store_call() {
    let store = FakeStore::new();
    store.seed_pipeline(common::pipeline_row(
        "PIPELINE-9223372036854775807",
        0,
        "LINESTRING(1 1, 2 2)",
    ));
    let mut sync = make_sync(&store);
    sync.reload(&CancelFlag::new()).unwrap();
    assert_eq!(sync.next_sequence(EntityKind::Pipeline), i64::MAX);

    let pipe = sync.draw(water_main("one too many")).unwrap();
    let fac = sync.draw(valve("shares the sequence")).unwrap();
    let report = save(&mut sync);

    assert_eq!((report.inserted, report.failed), (0, 2));
    for id in [pipe, fac] {
        assert_eq!(sync.state(&id), EntityState::Added);
        assert_eq!(sync.entity(&id).unwrap().business_id(), "");
    }
    assert!(store.mutations().is_empty());
    assert_eq!(sync.next_sequence(EntityKind::Facility), i64::MAX);
}

// ── Update / delete ──────────────────────────────────────────────

#[test]
fn edit_then_save_updates() {
    let store = FakeStore::new();
    let mut sync = make_sync(&store);
    let id = sync.draw(water_main("old")).unwrap();
    save(&mut sync);
    let before = sync.entity(&id).unwrap().clone();

    let state = sync
        .edit(id, |e| {
            if let Entity::Pipeline(p) = e {
                p.name = "new".into();
                p.health_score = 55;
            }
        })
        .unwrap();
    assert_eq!(state, EntityState::Modified);

    let report = save(&mut sync);
    assert_eq!(report.updated, 1);
    assert_eq!(sync.state(&id), EntityState::Unchanged);

    let rows = store.pipelines();
    let row = &rows[0];
    assert_eq!(row.pipeline_name, "new");
    assert_eq!(row.health_score, 55);
    let Entity::Pipeline(after) = sync.entity(&id).unwrap() else {
        panic!("expected pipeline");
    };
    let Entity::Pipeline(before) = before else {
        panic!("expected pipeline");
    };
    assert!(after.updated_at >= before.updated_at.trunc_subsecs(6));
    assert_eq!(row.updated_at, format_timestamp(&after.updated_at));
}

#[test]
fn edit_added_before_save_still_inserts() {
    let store = FakeStore::new();
    let mut sync = make_sync(&store);
    let id = sync.draw(valve("v")).unwrap();
    assert_eq!(sync.edit(id, |_| {}).unwrap(), EntityState::Added);

    let report = save(&mut sync);
    assert_eq!(report.inserted, 1);
    assert_eq!(report.updated, 0);
}

#[test]
fn failed_update_stays_modified() {
    let store = FakeStore::new();
    let mut sync = make_sync(&store);
    let id = sync.draw(valve("v")).unwrap();
    save(&mut sync);
    sync.edit(id, |_| {}).unwrap();
    store.fail_key("FACILITY-001");

    let report = save(&mut sync);
    assert_eq!(report.failed, 1);
    assert_eq!(sync.state(&id), EntityState::Modified);

    store.heal_key("FACILITY-001");
    assert_eq!(save(&mut sync).updated, 1);
}

#[test]
fn delete_persisted_removes_row_and_entity() {
    let store = FakeStore::new();
    let mut sync = make_sync(&store);
    let id = sync.draw(water_main("gone")).unwrap();
    save(&mut sync);

    assert_eq!(sync.request_delete(id).unwrap(), EntityState::Deleted);
    assert!(sync.entity(&id).is_some());

    let report = save(&mut sync);
    assert_eq!(report.deleted, 1);
    assert!(sync.entity(&id).is_none());
    assert_eq!(sync.state(&id), EntityState::Detached);
    assert!(store.pipelines().is_empty());
}

#[test]
fn failed_delete_stays_deleted() {
    let store = FakeStore::new();
    let mut sync = make_sync(&store);
    let id = sync.draw(water_main("sticky")).unwrap();
    save(&mut sync);
    sync.request_delete(id).unwrap();
    store.fail_key("PIPELINE-1");

    let report = save(&mut sync);
    assert_eq!(report.failed, 1);
    assert_eq!(sync.state(&id), EntityState::Deleted);
    assert!(sync.entity(&id).is_some());
}

#[test]
fn deleting_unsaved_entity_makes_no_store_call() {
    let store = FakeStore::new();
    let mut sync = make_sync(&store);
    let id = sync.draw(water_main("scratch")).unwrap();
    sync.request_delete(id).unwrap();

    let report = save(&mut sync);
    assert_eq!(report.deleted, 1);
    assert!(store.mutations().is_empty());
    assert!(sync.entity(&id).is_none());
}

#[test]
fn deleted_entity_rejects_edit() {
    let store = FakeStore::new();
    let mut sync = make_sync(&store);
    let id = sync.draw(water_main("x")).unwrap();
    sync.request_delete(id).unwrap();

    let mut ran = false;
    let err = sync.edit(id, |_| ran = true).unwrap_err();
    assert!(matches!(err, SyncError::State(_)));
    assert!(!ran);
    assert!(matches!(sync.request_delete(id), Err(SyncError::State(_))));
}

#[test]
fn unknown_entity_is_reported() {
    let store = FakeStore::new();
    let mut sync = make_sync(&store);
    let id = undergrid_types::EntityId::new();
    assert!(matches!(sync.edit(id, |_| {}), Err(SyncError::UnknownEntity(x)) if x == id));
    assert!(matches!(sync.request_delete(id), Err(SyncError::UnknownEntity(_))));
}

// ── Detached / unchanged ─────────────────────────────────────────

#[test]
fn detached_entities_are_never_synchronized() {
    let store = FakeStore::new();
    let mut sync = make_sync(&store);
    let base = sync.attach_detached(water_main("basemap river"));

    assert_eq!(sync.state(&base), EntityState::Detached);
    assert!(sync.edit(base, |_| {}).is_err());
    assert!(sync.request_delete(base).is_err());

    let report = save(&mut sync);
    assert_eq!(report.unchanged, 1);
    assert!(store.mutations().is_empty());
    assert!(!report.is_success());
}

#[test]
fn nothing_pending_is_a_no_op() {
    let store = FakeStore::new();
    let mut sync = make_sync(&store);
    sync.draw(valve("v")).unwrap();
    save(&mut sync);
    let calls_before = store.mutations().len();

    let report = save(&mut sync);
    assert_eq!(report.unchanged, 1);
    assert!(!report.is_success());
    assert_eq!(store.mutations().len(), calls_before);
}

// ── Gates ────────────────────────────────────────────────────────

#[test]
fn missing_save_capability_touches_nothing() {
    let store = FakeStore::new();
    let caps = CapabilitySet::new().with(CAP_CLEAR_DRAWINGS);
    let mut sync =
        Synchronizer::with_permissions(store.clone(), SyncConfig::default(), Arc::new(caps)).unwrap();
    let id = sync.draw(water_main("x")).unwrap();

    let err = sync.save_incremental(&CancelFlag::new()).unwrap_err();
    assert!(matches!(err, SyncError::PermissionDenied { ref capability } if capability == CAP_SAVE_DRAWINGS));
    assert!(store.calls().is_empty());
    assert_eq!(sync.state(&id), EntityState::Added);
}

#[test]
fn unreachable_store_is_connection_error() {
    let store = FakeStore::new();
    let mut sync = make_sync(&store);
    let id = sync.draw(water_main("x")).unwrap();
    store.go_offline();

    let err = sync.save_incremental(&CancelFlag::new()).unwrap_err();
    assert!(matches!(err, SyncError::Connection(_)));
    assert_eq!(store.calls(), vec![Call::Ping]);
    assert_eq!(sync.state(&id), EntityState::Added);
}

// ── Cancellation / progress ──────────────────────────────────────

#[test]
fn precancelled_save_touches_nothing() {
    let store = FakeStore::new();
    let mut sync = make_sync(&store);
    let id = sync.draw(water_main("x")).unwrap();
    let cancel = CancelFlag::new();
    cancel.cancel();

    let report = sync.save_incremental(&cancel).unwrap();
    assert!(report.cancelled);
    assert_eq!(report.applied(), 0);
    assert!(store.mutations().is_empty());
    assert_eq!(sync.state(&id), EntityState::Added);
}

#[derive(Clone, Default)]
struct SharedProgress {
    events: Arc<Mutex<Vec<(usize, usize)>>>,
    finished: Arc<Mutex<Option<usize>>>,
}

impl ProgressSink for SharedProgress {
    fn progress(&mut self, current: usize, total: usize) {
        self.events.lock().unwrap().push((current, total));
    }

    fn finished(&mut self, count: usize) {
        *self.finished.lock().unwrap() = Some(count);
    }
}

#[test]
fn progress_every_interval_and_at_end() {
    let store = FakeStore::new();
    let config = SyncConfig {
        progress_interval: 2,
        ..Default::default()
    };
    let mut sync = Synchronizer::new(store.clone(), config).unwrap();
    let progress = SharedProgress::default();
    sync.set_progress_sink(Box::new(progress.clone()));
    for i in 0..5 {
        sync.draw(valve(&format!("v{i}"))).unwrap();
    }

    save(&mut sync);

    assert_eq!(*progress.events.lock().unwrap(), vec![(2, 5), (4, 5), (5, 5)]);
    assert_eq!(*progress.finished.lock().unwrap(), Some(5));
}

#[test]
fn cancel_mid_batch_keeps_rest_pending() {
    let store = FakeStore::new();
    let config = SyncConfig {
        progress_interval: 1,
        ..Default::default()
    };
    let mut sync = Synchronizer::new(store.clone(), config).unwrap();
    let cancel = CancelFlag::new();
    let trigger = cancel.clone();
    sync.set_progress_sink(Box::new(move |current: usize, _total: usize| {
        if current == 2 {
            trigger.cancel();
        }
    }));
    let ids: Vec<_> = (0..4)
        .map(|i| sync.draw(water_main(&format!("p{i}"))).unwrap())
        .collect();

    let report = sync.save_incremental(&cancel).unwrap();

    assert!(report.cancelled);
    assert_eq!(report.inserted, 2);
    assert_eq!(sync.state(&ids[0]), EntityState::Unchanged);
    assert_eq!(sync.state(&ids[1]), EntityState::Unchanged);
    assert_eq!(sync.state(&ids[2]), EntityState::Added);
    assert_eq!(sync.state(&ids[3]), EntityState::Added);
    assert_eq!(sync.pending_count(), 2);
}

#[test]
fn report_serializes_for_status_displays() {
    let report = SaveReport {
        inserted: 1,
        failed: 2,
        ..SaveReport::default()
    };
    let json = serde_json::to_value(report).unwrap();
    assert_eq!(
        json,
        serde_json::json!({
            "inserted": 1, "updated": 0, "deleted": 0,
            "unchanged": 0, "failed": 2, "cancelled": false
        })
    );
}
