#![allow(dead_code)]

use chrono::{Duration, TimeZone, Utc};
use std::collections::HashSet;
use std::sync::{Arc, Mutex};
use undergrid_storage::{
    FacilityRow, FeatureStore, PipelineRow, StorageError, StorageResult, format_timestamp,
};
use undergrid_types::{FacilityEntity, FacilityType, GeoPoint, PipelineEntity, PipelineType};

/// A store call as observed by [`FakeStore`].
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum Call {
    Ping,
    InsertPipeline(String),
    UpdatePipeline(String),
    DeletePipeline(String),
    QueryPipelines,
    ClearPipelines,
    InsertFacility(String),
    UpdateFacility(String),
    DeleteFacility(String),
    QueryFacilities,
    ClearFacilities,
}

impl Call {
    pub fn is_mutation(&self) -> bool {
        !matches!(self, Call::Ping | Call::QueryPipelines | Call::QueryFacilities)
    }
}

#[derive(Default)]
struct Inner {
    pipelines: Vec<PipelineRow>,
    facilities: Vec<FacilityRow>,
    last_id: i64,
    calls: Vec<Call>,
    inserts: usize,
    offline: bool,
    fail_inserts: HashSet<usize>,
    fail_keys: HashSet<String>,
    fail_clear_facilities: bool,
}

/// In-memory [`FeatureStore`] that records calls and fails on demand.
#[derive(Clone, Default)]
pub struct FakeStore {
    inner: Arc<Mutex<Inner>>,
}

impl FakeStore {
    pub fn new() -> Self {
        Self::default()
    }

    /// Every call, ping included, fails from now on.
    pub fn go_offline(&self) {
        self.inner.lock().unwrap().offline = true;
    }

    /// The `n`-th insert (1-based, both kinds counted together) fails.
    pub fn fail_nth_insert(&self, n: usize) {
        self.inner.lock().unwrap().fail_inserts.insert(n);
    }

    /// Every mutation keyed by `business_id` fails.
    pub fn fail_key(&self, business_id: &str) {
        self.inner.lock().unwrap().fail_keys.insert(business_id.to_string());
    }

    pub fn heal_key(&self, business_id: &str) {
        self.inner.lock().unwrap().fail_keys.remove(business_id);
    }

    pub fn fail_clear_facilities(&self) {
        self.inner.lock().unwrap().fail_clear_facilities = true;
    }

    pub fn calls(&self) -> Vec<Call> {
        self.inner.lock().unwrap().calls.clone()
    }

    pub fn mutations(&self) -> Vec<Call> {
        self.calls().into_iter().filter(Call::is_mutation).collect()
    }

    pub fn pipelines(&self) -> Vec<PipelineRow> {
        self.inner.lock().unwrap().pipelines.clone()
    }

    pub fn facilities(&self) -> Vec<FacilityRow> {
        self.inner.lock().unwrap().facilities.clone()
    }

    /// Seeds a row directly, bypassing call recording.
    pub fn seed_pipeline(&self, mut row: PipelineRow) -> i64 {
        let mut inner = self.inner.lock().unwrap();
        inner.last_id += 1;
        row.id = inner.last_id;
        inner.pipelines.push(row);
        inner.last_id
    }

    pub fn seed_facility(&self, mut row: FacilityRow) -> i64 {
        let mut inner = self.inner.lock().unwrap();
        inner.last_id += 1;
        row.id = inner.last_id;
        inner.facilities.push(row);
        inner.last_id
    }

    fn begin(&self, call: Call) -> StorageResult<std::sync::MutexGuard<'_, Inner>> {
        let mut inner = self.inner.lock().map_err(|_| StorageError::LockPoisoned)?;
        inner.calls.push(call);
        if inner.offline {
            return Err(StorageError::Unavailable("fake store offline".into()));
        }
        Ok(inner)
    }

    fn fail_insert(inner: &mut Inner, key: &str) -> StorageResult<()> {
        inner.inserts += 1;
        if inner.fail_inserts.contains(&inner.inserts) || inner.fail_keys.contains(key) {
            return Err(StorageError::Unavailable(format!("injected insert failure for {key}")));
        }
        Ok(())
    }

    fn fail_key_check(inner: &Inner, key: &str) -> StorageResult<()> {
        if inner.fail_keys.contains(key) {
            return Err(StorageError::Unavailable(format!("injected failure for {key}")));
        }
        Ok(())
    }
}

impl FeatureStore for FakeStore {
    fn ping(&self) -> StorageResult<()> {
        self.begin(Call::Ping).map(|_| ())
    }

    fn insert_pipeline(&self, row: &PipelineRow) -> StorageResult<i64> {
        let mut inner = self.begin(Call::InsertPipeline(row.pipeline_id.clone()))?;
        Self::fail_insert(&mut inner, &row.pipeline_id)?;
        if inner.pipelines.iter().any(|r| r.pipeline_id == row.pipeline_id) {
            return Err(StorageError::Conflict(row.pipeline_id.clone()));
        }
        inner.last_id += 1;
        let id = inner.last_id;
        inner.pipelines.push(PipelineRow { id, ..row.clone() });
        Ok(id)
    }

    fn update_pipeline(&self, row: &PipelineRow) -> StorageResult<()> {
        let mut inner = self.begin(Call::UpdatePipeline(row.pipeline_id.clone()))?;
        Self::fail_key_check(&inner, &row.pipeline_id)?;
        let existing = inner
            .pipelines
            .iter_mut()
            .find(|r| r.pipeline_id == row.pipeline_id)
            .ok_or_else(|| StorageError::NotFound(row.pipeline_id.clone()))?;
        *existing = PipelineRow {
            id: existing.id,
            created_at: existing.created_at.clone(),
            created_by: existing.created_by.clone(),
            ..row.clone()
        };
        Ok(())
    }

    fn delete_pipeline(&self, pipeline_id: &str) -> StorageResult<()> {
        let mut inner = self.begin(Call::DeletePipeline(pipeline_id.to_string()))?;
        Self::fail_key_check(&inner, pipeline_id)?;
        let before = inner.pipelines.len();
        inner.pipelines.retain(|r| r.pipeline_id != pipeline_id);
        if inner.pipelines.len() == before {
            return Err(StorageError::NotFound(pipeline_id.to_string()));
        }
        Ok(())
    }

    fn pipelines_by_provenance(&self, marker: &str) -> StorageResult<Vec<PipelineRow>> {
        let inner = self.begin(Call::QueryPipelines)?;
        let mut rows: Vec<PipelineRow> = inner
            .pipelines
            .iter()
            .filter(|r| r.created_by == marker)
            .cloned()
            .collect();
        rows.sort_by(|a, b| a.created_at.cmp(&b.created_at).then(a.id.cmp(&b.id)));
        Ok(rows)
    }

    fn delete_pipelines_by_provenance(&self, marker: &str) -> StorageResult<usize> {
        let mut inner = self.begin(Call::ClearPipelines)?;
        let before = inner.pipelines.len();
        inner.pipelines.retain(|r| r.created_by != marker);
        Ok(before - inner.pipelines.len())
    }

    fn insert_facility(&self, row: &FacilityRow) -> StorageResult<i64> {
        let mut inner = self.begin(Call::InsertFacility(row.facility_id.clone()))?;
        Self::fail_insert(&mut inner, &row.facility_id)?;
        if inner.facilities.iter().any(|r| r.facility_id == row.facility_id) {
            return Err(StorageError::Conflict(row.facility_id.clone()));
        }
        inner.last_id += 1;
        let id = inner.last_id;
        inner.facilities.push(FacilityRow { id, ..row.clone() });
        Ok(id)
    }

    fn update_facility(&self, row: &FacilityRow) -> StorageResult<()> {
        let mut inner = self.begin(Call::UpdateFacility(row.facility_id.clone()))?;
        Self::fail_key_check(&inner, &row.facility_id)?;
        let existing = inner
            .facilities
            .iter_mut()
            .find(|r| r.facility_id == row.facility_id)
            .ok_or_else(|| StorageError::NotFound(row.facility_id.clone()))?;
        *existing = FacilityRow {
            id: existing.id,
            created_at: existing.created_at.clone(),
            created_by: existing.created_by.clone(),
            ..row.clone()
        };
        Ok(())
    }

    fn delete_facility(&self, facility_id: &str) -> StorageResult<()> {
        let mut inner = self.begin(Call::DeleteFacility(facility_id.to_string()))?;
        Self::fail_key_check(&inner, facility_id)?;
        let before = inner.facilities.len();
        inner.facilities.retain(|r| r.facility_id != facility_id);
        if inner.facilities.len() == before {
            return Err(StorageError::NotFound(facility_id.to_string()));
        }
        Ok(())
    }

    fn facilities_by_provenance(&self, marker: &str) -> StorageResult<Vec<FacilityRow>> {
        let inner = self.begin(Call::QueryFacilities)?;
        let mut rows: Vec<FacilityRow> = inner
            .facilities
            .iter()
            .filter(|r| r.created_by == marker)
            .cloned()
            .collect();
        rows.sort_by(|a, b| a.created_at.cmp(&b.created_at).then(a.id.cmp(&b.id)));
        Ok(rows)
    }

    fn delete_facilities_by_provenance(&self, marker: &str) -> StorageResult<usize> {
        let mut inner = self.begin(Call::ClearFacilities)?;
        if inner.fail_clear_facilities {
            return Err(StorageError::Unavailable("injected clear failure".into()));
        }
        let before = inner.facilities.len();
        inner.facilities.retain(|r| r.created_by != marker);
        Ok(before - inner.facilities.len())
    }
}

// ── entity builders ──────────────────────────────────────────────

pub fn water_main(name: &str) -> PipelineEntity {
    PipelineEntity::new(
        name,
        PipelineType::WaterSupply,
        vec![GeoPoint::new(120.1, 30.1), GeoPoint::new(120.2, 30.2)],
        200,
    )
}

pub fn valve(name: &str) -> FacilityEntity {
    FacilityEntity::new(name, FacilityType::Valve, GeoPoint::new(120.15, 30.15))
}

pub fn pipeline_row(business_id: &str, minutes: i64, geom: &str) -> PipelineRow {
    let at = Utc.with_ymd_and_hms(2024, 6, 1, 9, 0, 0).unwrap() + Duration::minutes(minutes);
    PipelineRow {
        id: 0,
        pipeline_id: business_id.into(),
        pipeline_name: format!("line {business_id}"),
        pipeline_type: "sewage".into(),
        geom: geom.into(),
        diameter_mm: 300,
        material: "pvc".into(),
        status: "normal".into(),
        health_score: 80,
        created_at: format_timestamp(&at),
        updated_at: format_timestamp(&at),
        created_by: "user_drawing".into(),
    }
}

pub fn facility_row(business_id: &str, minutes: i64, geom: &str) -> FacilityRow {
    let at = Utc.with_ymd_and_hms(2024, 6, 1, 9, 0, 0).unwrap() + Duration::minutes(minutes);
    FacilityRow {
        id: 0,
        facility_id: business_id.into(),
        facility_name: format!("site {business_id}"),
        facility_type: "manhole".into(),
        geom: geom.into(),
        status: "normal".into(),
        health_score: 95,
        created_at: format_timestamp(&at),
        updated_at: format_timestamp(&at),
        created_by: "user_drawing".into(),
    }
}
