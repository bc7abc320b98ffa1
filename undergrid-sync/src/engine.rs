//! Persistence synchronizer.
//!
//! Owns the working set of drawn and loaded entities, their lifecycle states
//! and the store handle. A save drains every pending entity into exactly one
//! store call; one entity failing never stops the rest of the batch and there
//! is no batch-wide transaction.

use crate::config::SyncConfig;
use crate::error::{SyncError, SyncResult};
use crate::report::{LoadReport, SaveReport};
use crate::rows::{facility_from_row, facility_row, pipeline_from_row, pipeline_row};
use crate::state::StateTracker;
use crate::working_set::WorkingSet;
use chrono::{SubsecRound, Utc};
use std::sync::Arc;
use tracing::{debug, info, warn};
use undergrid_storage::{FeatureStore, StorageResult, format_timestamp};
use undergrid_types::{
    AllowAll, CAP_CLEAR_DRAWINGS, CAP_SAVE_DRAWINGS, CancelFlag, Entity, EntityId, EntityKind,
    EntityState, PermissionOracle, ProgressSink, format_business_id, next_sequence_id,
};

/// Store call a pending entity turns into.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
enum Mutation {
    Insert,
    Update,
    Delete,
}

/// Reconciles in-memory entities with a [`FeatureStore`].
pub struct Synchronizer<S> {
    store: S,
    config: SyncConfig,
    tracker: StateTracker,
    working: WorkingSet,
    /// Next sequence number for generated pipeline identifiers.
    pipeline_seq: i64,
    /// Next sequence number for generated facility identifiers.
    facility_seq: i64,
    permissions: Arc<dyn PermissionOracle>,
    progress: Option<Box<dyn ProgressSink>>,
}

impl<S: FeatureStore> Synchronizer<S> {
    /// Creates a synchronizer that grants every capability.
    ///
    /// Generated identifiers start at sequence 1 until [`Self::reload`] has
    /// seen the store's rows. Call `reload` before saving against a store
    /// that may already hold drawings; otherwise generated identifiers can
    /// collide with stored ones and those inserts fail as conflicts.
    pub fn new(store: S, config: SyncConfig) -> SyncResult<Self> {
        Self::with_permissions(store, config, Arc::new(AllowAll))
    }

    /// Creates a synchronizer that checks capabilities against `permissions`.
    pub fn with_permissions(
        store: S,
        config: SyncConfig,
        permissions: Arc<dyn PermissionOracle>,
    ) -> SyncResult<Self> {
        config.validate()?;
        Ok(Self {
            store,
            config,
            tracker: StateTracker::new(),
            working: WorkingSet::new(),
            pipeline_seq: 1,
            facility_seq: 1,
            permissions,
            progress: None,
        })
    }

    /// Routes progress of saves and loads to `sink`.
    pub fn set_progress_sink(&mut self, sink: Box<dyn ProgressSink>) {
        self.progress = Some(sink);
    }

    pub fn store(&self) -> &S {
        &self.store
    }

    pub fn config(&self) -> &SyncConfig {
        &self.config
    }

    // ── Session ──────────────────────────────────────────────────

    /// Adds a freshly drawn entity. It is inserted on the next save.
    pub fn draw(&mut self, entity: impl Into<Entity>) -> SyncResult<EntityId> {
        let id = EntityId::new();
        self.tracker.track_drawn(id)?;
        self.working.insert(id, entity.into());
        Ok(id)
    }

    /// Adds an entity that is shown but never synchronized (base-map data).
    pub fn attach_detached(&mut self, entity: impl Into<Entity>) -> EntityId {
        let id = EntityId::new();
        self.working.insert(id, entity.into());
        id
    }

    /// Applies a user edit and returns the entity's new state.
    ///
    /// The edit is rejected without running `f` when the entity is detached
    /// or already marked for deletion.
    pub fn edit(&mut self, id: EntityId, f: impl FnOnce(&mut Entity)) -> SyncResult<EntityState> {
        let entity = self
            .working
            .get_mut(&id)
            .ok_or(SyncError::UnknownEntity(id))?;
        let state = self.tracker.mark_modified(id)?;
        f(entity);
        Ok(state)
    }

    /// Marks an entity for deletion. It stays in the working set until the
    /// store delete succeeds.
    pub fn request_delete(&mut self, id: EntityId) -> SyncResult<EntityState> {
        if !self.working.contains(&id) {
            return Err(SyncError::UnknownEntity(id));
        }
        Ok(self.tracker.mark_deleted(id)?)
    }

    pub fn entity(&self, id: &EntityId) -> Option<&Entity> {
        self.working.get(id)
    }

    pub fn state(&self, id: &EntityId) -> EntityState {
        self.tracker.state(id)
    }

    /// Every entity in the working set, in session order.
    pub fn entities(&self) -> impl Iterator<Item = (EntityId, &Entity)> + '_ {
        self.working.iter()
    }

    /// Number of entities the next save will send to the store.
    pub fn pending_count(&self) -> usize {
        self.tracker.pending_count()
    }

    /// Sequence number the next generated identifier of `kind` will use.
    pub fn next_sequence(&self, kind: EntityKind) -> i64 {
        match kind {
            EntityKind::Pipeline => self.pipeline_seq,
            EntityKind::Facility => self.facility_seq,
        }
    }

    fn require(&self, capability: &str) -> SyncResult<()> {
        if self.permissions.has_capability(capability) {
            Ok(())
        } else {
            warn!("capability {} not granted", capability);
            Err(SyncError::PermissionDenied {
                capability: capability.to_string(),
            })
        }
    }

    fn check_connection(&self) -> SyncResult<()> {
        self.store.ping().map_err(|e| {
            warn!("store unreachable: {}", e);
            SyncError::Connection(e.to_string())
        })
    }

    fn report_progress(&mut self, current: usize, total: usize) {
        if let Some(sink) = self.progress.as_mut() {
            sink.progress(current, total);
        }
    }

    fn report_finished(&mut self, count: usize) {
        if let Some(sink) = self.progress.as_mut() {
            sink.finished(count);
        }
    }

    // ── Save ─────────────────────────────────────────────────────

    /// Pushes every pending change to the store.
    ///
    /// Fails as a whole only when the save capability is missing or the store
    /// is unreachable; in both cases nothing is touched. Otherwise each
    /// pending entity gets exactly one store call and its outcome is counted
    /// in the report.
    pub fn save_incremental(&mut self, cancel: &CancelFlag) -> SyncResult<SaveReport> {
        self.require(CAP_SAVE_DRAWINGS)?;
        self.check_connection()?;

        let ids = self.working.ids();
        let total = self.tracker.pending_count();
        let interval = self.config.progress_interval.max(1);
        let mut report = SaveReport::default();
        let mut processed = 0;

        for id in ids {
            if cancel.is_cancelled() {
                info!("save cancelled after {} of {} pending entities", processed, total);
                report.cancelled = true;
                break;
            }

            let mutation = match self.tracker.state(&id) {
                EntityState::Added => Mutation::Insert,
                EntityState::Modified => Mutation::Update,
                EntityState::Deleted => Mutation::Delete,
                EntityState::Unchanged | EntityState::Detached => {
                    report.unchanged += 1;
                    continue;
                }
            };

            let ok = match mutation {
                Mutation::Insert => self.insert(id),
                Mutation::Update => self.update(id),
                Mutation::Delete => self.delete(id),
            };
            match (ok, mutation) {
                (true, Mutation::Insert) => report.inserted += 1,
                (true, Mutation::Update) => report.updated += 1,
                (true, Mutation::Delete) => report.deleted += 1,
                (false, _) => report.failed += 1,
            }

            processed += 1;
            if processed % interval == 0 {
                self.report_progress(processed, total);
            }
        }

        if processed % interval != 0 {
            self.report_progress(processed, total);
        }
        self.report_finished(processed);

        info!(
            "save finished: {} inserted, {} updated, {} deleted, {} unchanged, {} failed",
            report.inserted, report.updated, report.deleted, report.unchanged, report.failed
        );
        Ok(report)
    }

    /// Validates an `Added`/`Modified` entity before it reaches the store.
    fn is_valid(&self, id: EntityId) -> bool {
        let Some(entity) = self.working.get(&id) else {
            return false;
        };
        match entity.validate() {
            Ok(()) => true,
            Err(e) => {
                warn!("not saving {}: {}", id, e);
                false
            }
        }
    }

    fn insert(&mut self, id: EntityId) -> bool {
        if !self.is_valid(id) {
            return false;
        }
        let marker = &self.config.provenance_marker;
        let Some(entity) = self.working.get_mut(&id) else {
            return false;
        };

        let generated = entity.business_id().is_empty();
        if generated {
            let kind = entity.kind();
            let counter = match kind {
                EntityKind::Pipeline => &mut self.pipeline_seq,
                EntityKind::Facility => &mut self.facility_seq,
            };
            let seq = *counter;
            // The stored maximum saturates at i64::MAX, so that value is taken.
            let Some(next) = seq.checked_add(1) else {
                warn!("cannot insert {}: {:?} sequence exhausted", id, kind);
                return false;
            };
            *counter = next;
            let business_id = match kind {
                EntityKind::Pipeline => format_business_id(&self.config.pipeline_prefix, seq, 0),
                EntityKind::Facility => format_business_id(
                    &self.config.facility_prefix,
                    seq,
                    self.config.facility_id_width,
                ),
            };
            set_business_id(entity, business_id);
        }

        let result: StorageResult<i64> = match &*entity {
            Entity::Pipeline(p) => self.store.insert_pipeline(&pipeline_row(p, marker)),
            Entity::Facility(f) => self.store.insert_facility(&facility_row(f, marker)),
        };

        match result {
            Ok(store_id) => {
                set_store_id(entity, store_id);
                debug!("inserted {} as row {}", entity.business_id(), store_id);
                self.mark_synced(id);
                true
            }
            Err(e) => {
                warn!("insert of {} failed: {}", entity.business_id(), e);
                if generated {
                    set_business_id(entity, String::new());
                }
                false
            }
        }
    }

    fn update(&mut self, id: EntityId) -> bool {
        if !self.is_valid(id) {
            return false;
        }
        let marker = &self.config.provenance_marker;
        let Some(entity) = self.working.get_mut(&id) else {
            return false;
        };
        if entity.business_id().is_empty() {
            warn!("cannot update {}: no business identifier", id);
            return false;
        }

        let now = Utc::now().trunc_subsecs(6);
        let result = match &*entity {
            Entity::Pipeline(p) => {
                let mut row = pipeline_row(p, marker);
                row.updated_at = format_timestamp(&now);
                self.store.update_pipeline(&row)
            }
            Entity::Facility(f) => {
                let mut row = facility_row(f, marker);
                row.updated_at = format_timestamp(&now);
                self.store.update_facility(&row)
            }
        };

        match result {
            Ok(()) => {
                set_updated_at(entity, now);
                debug!("updated {}", entity.business_id());
                self.mark_synced(id);
                true
            }
            Err(e) => {
                warn!("update of {} failed: {}", entity.business_id(), e);
                false
            }
        }
    }

    fn delete(&mut self, id: EntityId) -> bool {
        let Some(entity) = self.working.get(&id) else {
            return false;
        };

        if entity.store_id().is_none() {
            debug!("discarding never-persisted {}", id);
            self.working.remove(&id);
            self.tracker.forget(&id);
            return true;
        }

        let business_id = entity.business_id().to_string();
        let result = match entity.kind() {
            EntityKind::Pipeline => self.store.delete_pipeline(&business_id),
            EntityKind::Facility => self.store.delete_facility(&business_id),
        };

        match result {
            Ok(()) => {
                debug!("deleted {}", business_id);
                self.working.remove(&id);
                self.tracker.forget(&id);
                true
            }
            Err(e) => {
                warn!("delete of {} failed: {}", business_id, e);
                false
            }
        }
    }

    fn mark_synced(&mut self, id: EntityId) {
        if let Err(e) = self.tracker.mark_synced(id) {
            warn!("state out of step after store call: {}", e);
        }
    }

    // ── Load ─────────────────────────────────────────────────────

    /// Reads every user-drawn row back into entities.
    ///
    /// Rows with malformed geometry or timestamps, unknown type names or
    /// values outside the model's invariants are skipped and counted. The working set is not
    /// touched; see [`Synchronizer::reload`].
    pub fn load_all(&mut self, cancel: &CancelFlag) -> SyncResult<LoadReport> {
        self.check_connection()?;

        let marker = &self.config.provenance_marker;
        let pipeline_rows = self.store.pipelines_by_provenance(marker)?;
        let facility_rows = self.store.facilities_by_provenance(marker)?;

        let mut report = LoadReport {
            next_sequence_id: next_sequence_id(
                pipeline_rows
                    .iter()
                    .map(|r| r.pipeline_id.as_str())
                    .chain(facility_rows.iter().map(|r| r.facility_id.as_str())),
            ),
            ..LoadReport::default()
        };

        let total = pipeline_rows.len() + facility_rows.len();
        let interval = self.config.progress_interval.max(1);
        let mut processed = 0;

        let mut pipelines = pipeline_rows.into_iter();
        let mut facilities = facility_rows.into_iter();
        loop {
            if cancel.is_cancelled() {
                info!("load cancelled after {} of {} rows", processed, total);
                report.cancelled = true;
                break;
            }
            if let Some(row) = pipelines.next() {
                let key = row.pipeline_id.clone();
                match pipeline_from_row(row) {
                    Ok(p) => report.pipelines.push(p),
                    Err(e) => {
                        warn!("skipping pipeline row {}: {}", key, e);
                        report.skipped += 1;
                    }
                }
            } else if let Some(row) = facilities.next() {
                let key = row.facility_id.clone();
                match facility_from_row(row) {
                    Ok(f) => report.facilities.push(f),
                    Err(e) => {
                        warn!("skipping facility row {}: {}", key, e);
                        report.skipped += 1;
                    }
                }
            } else {
                break;
            }

            processed += 1;
            if processed % interval == 0 {
                self.report_progress(processed, total);
            }
        }

        if processed % interval != 0 {
            self.report_progress(processed, total);
        }
        self.report_finished(processed);

        info!(
            "loaded {} pipelines and {} facilities ({} skipped), next sequence {}",
            report.pipelines.len(),
            report.facilities.len(),
            report.skipped,
            report.next_sequence_id
        );
        Ok(report)
    }

    /// Replaces every tracked entity with the store's current content.
    ///
    /// Detached entities stay. Local changes that were not saved are dropped.
    /// A cancelled load leaves the working set as it was.
    pub fn reload(&mut self, cancel: &CancelFlag) -> SyncResult<LoadReport> {
        let report = self.load_all(cancel)?;
        if report.cancelled {
            return Ok(report);
        }

        let tracker = &self.tracker;
        self.working.retain(|id, _| !tracker.is_tracked(id));
        self.tracker.clear();

        let loaded = report
            .pipelines
            .iter()
            .cloned()
            .map(Entity::from)
            .chain(report.facilities.iter().cloned().map(Entity::from));
        for entity in loaded {
            let id = EntityId::new();
            self.tracker.track_loaded(id)?;
            self.working.insert(id, entity);
        }

        self.pipeline_seq = report.next_sequence_id;
        self.facility_seq = report.next_sequence_id;
        Ok(report)
    }

    // ── Clear ────────────────────────────────────────────────────

    /// Deletes every user-drawn row of both kinds.
    ///
    /// Returns `Ok(true)` when both deletes succeeded. Tracked entities of
    /// each kind whose delete succeeded are dropped from the working set, so
    /// a partial failure leaves only the other kind in place.
    pub fn clear_all(&mut self) -> SyncResult<bool> {
        self.require(CAP_CLEAR_DRAWINGS)?;

        let marker = &self.config.provenance_marker;
        let outcomes = [
            (EntityKind::Pipeline, self.store.delete_pipelines_by_provenance(marker)),
            (EntityKind::Facility, self.store.delete_facilities_by_provenance(marker)),
        ];

        let mut complete = true;
        for (kind, outcome) in outcomes {
            match outcome {
                Ok(removed) => {
                    info!("cleared {} {:?} rows", removed, kind);
                    self.forget_tracked(kind);
                }
                Err(e) => {
                    warn!("clear of {:?} rows failed: {}", kind, e);
                    complete = false;
                }
            }
        }
        Ok(complete)
    }

    fn forget_tracked(&mut self, kind: EntityKind) {
        let tracker = &self.tracker;
        let dropped: Vec<EntityId> = self
            .working
            .iter()
            .filter(|(id, entity)| entity.kind() == kind && tracker.is_tracked(id))
            .map(|(id, _)| id)
            .collect();
        for id in &dropped {
            self.working.remove(id);
            self.tracker.forget(id);
        }
    }
}

fn set_business_id(entity: &mut Entity, business_id: String) {
    match entity {
        Entity::Pipeline(p) => p.pipeline_id = business_id,
        Entity::Facility(f) => f.facility_id = business_id,
    }
}

fn set_store_id(entity: &mut Entity, store_id: i64) {
    match entity {
        Entity::Pipeline(p) => p.store_id = Some(store_id),
        Entity::Facility(f) => f.store_id = Some(store_id),
    }
}

fn set_updated_at(entity: &mut Entity, at: chrono::DateTime<Utc>) {
    match entity {
        Entity::Pipeline(p) => p.updated_at = at,
        Entity::Facility(f) => f.updated_at = at,
    }
}
