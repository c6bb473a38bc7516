use crate::db::KeyValueStorage;
use crate::errors::AppResult;
use crate::models::{CoiPatch, CoiRecord, CoiStatus, NewCoi, ReminderStatus};
use chrono::{DateTime, TimeZone, Utc};
use rand::Rng;
use serde::{Deserialize, Serialize};
use std::collections::HashSet;
use std::sync::Arc;
use uuid::Uuid;

pub const DEFAULT_STORAGE_KEY: &str = "legalgraph_cois_v2";

const SHORT_ID_LEN: usize = 9;
const BASE36: &[u8] = b"0123456789abcdefghijklmnopqrstuvwxyz";

#[derive(Debug, Clone, Copy, PartialEq, Eq, Default, Serialize, Deserialize)]
#[serde(rename_all = "kebab-case")]
pub enum IdStrategy {
    /// Nine random base-36 characters.
    #[default]
    Short,
    Uuid,
}

impl IdStrategy {
    fn generate(self) -> String {
        match self {
            Self::Short => {
                let mut rng = rand::rng();
                (0..SHORT_ID_LEN)
                    .map(|_| BASE36[rng.random_range(0..BASE36.len())] as char)
                    .collect()
            }
            Self::Uuid => Uuid::new_v4().to_string(),
        }
    }
}

/// The record list and its persisted snapshot. Every mutation rewrites the
/// whole list under `storage_key`.
pub struct RecordStore {
    records: Vec<CoiRecord>,
    storage: Arc<dyn KeyValueStorage>,
    storage_key: String,
    id_strategy: IdStrategy,
}

impl RecordStore {
    /// Rehydrates from storage, falling back to the seed dataset when the key
    /// is absent, unreadable or unparsable.
    pub fn load(storage: Arc<dyn KeyValueStorage>, storage_key: &str, id_strategy: IdStrategy) -> Self {
        let records = match storage.get_item(storage_key) {
            Ok(Some(raw)) => match serde_json::from_str::<Vec<CoiRecord>>(&raw) {
                Ok(records) => {
                    tracing::info!(count = records.len(), key = storage_key, "loaded persisted records");
                    records
                }
                Err(error) => {
                    tracing::warn!(error = %error, key = storage_key, "discarding unparsable persisted records");
                    seed_records()
                }
            },
            Ok(None) => {
                tracing::info!(key = storage_key, "no persisted records, using seed data");
                seed_records()
            }
            Err(error) => {
                tracing::warn!(error = %error, key = storage_key, "failed to read persisted records");
                seed_records()
            }
        };

        Self::with_records(storage, storage_key, id_strategy, records)
    }

    /// Builds a store with explicit initial records. Nothing is written until
    /// the first mutation.
    pub fn with_records(
        storage: Arc<dyn KeyValueStorage>,
        storage_key: &str,
        id_strategy: IdStrategy,
        records: Vec<CoiRecord>,
    ) -> Self {
        Self {
            records,
            storage,
            storage_key: storage_key.to_string(),
            id_strategy,
        }
    }

    pub fn records(&self) -> &[CoiRecord] {
        &self.records
    }

    pub fn get(&self, id: &str) -> Option<&CoiRecord> {
        self.records.iter().find(|record| record.id == id)
    }

    pub fn len(&self) -> usize {
        self.records.len()
    }

    pub fn is_empty(&self) -> bool {
        self.records.is_empty()
    }

    pub fn create(&mut self, fields: NewCoi) -> AppResult<CoiRecord> {
        let record = CoiRecord {
            id: self.next_id(),
            property: fields.property,
            tenant_name: fields.tenant_name,
            tenant_email: fields.tenant_email,
            unit: fields.unit,
            coi_name: fields.coi_name,
            expiry_date: fields.expiry_date,
            status: fields.status,
            reminder_status: fields.reminder_status,
            created_at: Utc::now(),
        };
        self.records.insert(0, record.clone());
        tracing::info!(coi_id = %record.id, "created coi");
        self.persist()?;
        Ok(record)
    }

    /// Returns `false` without persisting when `id` is unknown.
    pub fn update(&mut self, id: &str, patch: CoiPatch) -> AppResult<bool> {
        let Some(record) = self.records.iter_mut().find(|record| record.id == id) else {
            tracing::debug!(coi_id = id, "update skipped, no such coi");
            return Ok(false);
        };
        patch.apply_to(record);
        tracing::info!(coi_id = id, "updated coi");
        self.persist()?;
        Ok(true)
    }

    pub fn delete(&mut self, id: &str) -> AppResult<bool> {
        let before = self.records.len();
        self.records.retain(|record| record.id != id);
        let removed = self.records.len() < before;
        tracing::info!(coi_id = id, removed, "deleted coi");
        self.persist()?;
        Ok(removed)
    }

    pub fn bulk_delete(&mut self, ids: &[String]) -> AppResult<usize> {
        let ids = ids.iter().map(String::as_str).collect::<HashSet<_>>();
        let before = self.records.len();
        self.records.retain(|record| !ids.contains(record.id.as_str()));
        let removed = before - self.records.len();
        tracing::info!(requested = ids.len(), removed, "bulk deleted cois");
        self.persist()?;
        Ok(removed)
    }

    pub fn bulk_set_reminder(&mut self, ids: &[String], reminder_status: ReminderStatus) -> AppResult<usize> {
        let ids = ids.iter().map(String::as_str).collect::<HashSet<_>>();
        let mut touched = 0usize;
        for record in self.records.iter_mut().filter(|record| ids.contains(record.id.as_str())) {
            record.reminder_status = reminder_status;
            touched += 1;
        }
        tracing::info!(
            requested = ids.len(),
            touched,
            reminder_status = reminder_status.as_str(),
            "bulk updated reminder status"
        );
        self.persist()?;
        Ok(touched)
    }

    fn persist(&self) -> AppResult<()> {
        let snapshot = serde_json::to_string(&self.records)?;
        self.storage.set_item(&self.storage_key, &snapshot)
    }

    fn next_id(&self) -> String {
        loop {
            let id = self.id_strategy.generate();
            if self.get(&id).is_none() {
                return id;
            }
        }
    }
}

fn seeded_at(year: i32, month: u32, day: u32) -> DateTime<Utc> {
    Utc.with_ymd_and_hms(year, month, day, 10, 0, 0)
        .single()
        .unwrap_or_default()
}

#[allow(clippy::too_many_arguments)]
fn seed(
    id: &str,
    property: &str,
    tenant_name: &str,
    tenant_email: &str,
    unit: &str,
    coi_name: &str,
    expiry_date: &str,
    status: CoiStatus,
    reminder_status: ReminderStatus,
    created_at: DateTime<Utc>,
) -> CoiRecord {
    CoiRecord {
        id: id.to_string(),
        property: property.to_string(),
        tenant_name: tenant_name.to_string(),
        tenant_email: tenant_email.to_string(),
        unit: unit.to_string(),
        coi_name: coi_name.to_string(),
        expiry_date: expiry_date.to_string(),
        status,
        reminder_status,
        created_at,
    }
}

/// Illustrative records shown on first launch.
pub fn seed_records() -> Vec<CoiRecord> {
    vec![
        seed(
            "1",
            "Maplewood Shopping Center",
            "Johnson & Sons",
            "johnson@example.com",
            "101",
            "Tenant_CedarHeights_COI_2026",
            "2026-11-17",
            CoiStatus::Active,
            ReminderStatus::NotSent,
            seeded_at(2025, 1, 15),
        ),
        seed(
            "2",
            "Oak Tree Tower",
            "Smith Enterprises",
            "smith@example.com",
            "Suite 300",
            "GlobalMart_Insurance_COI_2025",
            "2025-11-20",
            CoiStatus::Expired,
            ReminderStatus::SentThirtyDays,
            seeded_at(2024, 12, 10),
        ),
        seed(
            "3",
            "Meadowbrook Plaza",
            "Global Solutions",
            "global@example.com",
            "B-12",
            "UrbanOutfitters_COI_2027",
            "2027-11-19",
            CoiStatus::Rejected,
            ReminderStatus::NotApplicable,
            seeded_at(2025, 1, 20),
        ),
        seed(
            "4",
            "Pine Hill Shopping Center",
            "Patel Industries",
            "patel@example.com",
            "402",
            "TechInnovators_COI_2028",
            "2028-11-23",
            CoiStatus::ExpiringSoon,
            ReminderStatus::NotSent,
            seeded_at(2025, 2, 1),
        ),
        seed(
            "5",
            "Maplewood Shopping Center",
            "Green Thumb Landscaping",
            "green@example.com",
            "Kiosk 3",
            "GreenEarth_COI_2025",
            "2025-11-22",
            CoiStatus::ExpiringSoon,
            ReminderStatus::NotSent,
            seeded_at(2025, 2, 5),
        ),
    ]
}

#[cfg(test)]
mod tests {
    use super::{seed_records, IdStrategy, RecordStore, DEFAULT_STORAGE_KEY};
    use crate::db::{KeyValueStorage, MemoryStorage};
    use crate::models::{CoiPatch, CoiRecord, CoiStatus, NewCoi, ReminderStatus};
    use std::sync::Arc;

    fn store_with(records: Vec<CoiRecord>) -> (RecordStore, Arc<MemoryStorage>) {
        let storage = Arc::new(MemoryStorage::new());
        let store = RecordStore::with_records(storage.clone(), DEFAULT_STORAGE_KEY, IdStrategy::Short, records);
        (store, storage)
    }

    fn new_coi(property: &str) -> NewCoi {
        NewCoi {
            property: property.to_string(),
            tenant_name: "Tenant 2".to_string(),
            tenant_email: "t2@example.com".to_string(),
            unit: "2".to_string(),
            coi_name: "COI 2".to_string(),
            expiry_date: "2025-02-01".to_string(),
            status: CoiStatus::Expired,
            reminder_status: ReminderStatus::NotSent,
        }
    }

    fn persisted(storage: &MemoryStorage) -> Vec<CoiRecord> {
        let raw = storage
            .get_item(DEFAULT_STORAGE_KEY)
            .expect("read")
            .expect("snapshot written");
        serde_json::from_str(&raw).expect("parse snapshot")
    }

    #[test]
    fn empty_storage_loads_seed_data() {
        let storage = Arc::new(MemoryStorage::new());
        let store = RecordStore::load(storage.clone(), DEFAULT_STORAGE_KEY, IdStrategy::Short);
        assert_eq!(store.len(), 5);
        assert_eq!(store.records()[0].tenant_name, "Johnson & Sons");
        assert_eq!(storage.writes(), 0);
    }

    #[test]
    fn unparsable_storage_loads_seed_data() {
        let storage = Arc::new(MemoryStorage::with_item(DEFAULT_STORAGE_KEY, "{oops"));
        let store = RecordStore::load(storage, DEFAULT_STORAGE_KEY, IdStrategy::Short);
        assert_eq!(store.records(), seed_records().as_slice());
    }

    #[test]
    fn create_prepends_and_persists() {
        let (mut store, storage) = store_with(seed_records());
        let created = store.create(new_coi("Prop 2")).expect("create");

        assert_eq!(store.len(), 6);
        assert_eq!(store.records()[0], created);
        assert_eq!(created.id.len(), 9);
        assert!(created.id.chars().all(|c| c.is_ascii_digit() || c.is_ascii_lowercase()));
        assert_eq!(storage.writes(), 1);
        assert_eq!(persisted(&storage), store.records());
    }

    #[test]
    fn uuid_strategy_generates_uuids() {
        let storage = Arc::new(MemoryStorage::new());
        let mut store = RecordStore::with_records(storage, DEFAULT_STORAGE_KEY, IdStrategy::Uuid, Vec::new());
        let created = store.create(new_coi("Prop")).expect("create");
        assert!(uuid::Uuid::parse_str(&created.id).is_ok());
    }

    #[test]
    fn update_merges_and_keeps_identity() {
        let (mut store, storage) = store_with(seed_records());
        let before = store.get("2").cloned().expect("record 2");

        let found = store
            .update("2", CoiPatch::status(CoiStatus::Rejected))
            .expect("update");
        assert!(found);

        let after = store.get("2").expect("record 2");
        assert_eq!(after.status, CoiStatus::Rejected);
        assert_eq!(after.id, before.id);
        assert_eq!(after.created_at, before.created_at);
        assert_eq!(after.tenant_name, before.tenant_name);
        assert_eq!(storage.writes(), 1);
    }

    #[test]
    fn update_of_unknown_id_is_a_silent_noop() {
        let (mut store, storage) = store_with(seed_records());
        let found = store
            .update("missing", CoiPatch::status(CoiStatus::Rejected))
            .expect("update");
        assert!(!found);
        assert_eq!(store.records(), seed_records().as_slice());
        assert_eq!(storage.writes(), 0);
    }

    #[test]
    fn deleting_missing_id_twice_is_idempotent() {
        let (mut store, _storage) = store_with(seed_records());
        assert!(!store.delete("nope").expect("first delete"));
        assert!(!store.delete("nope").expect("second delete"));
        assert_eq!(store.records(), seed_records().as_slice());

        assert!(store.delete("3").expect("delete"));
        assert!(store.get("3").is_none());
        assert_eq!(store.len(), 4);
    }

    #[test]
    fn length_tracks_creates_minus_deletes() {
        let (mut store, _storage) = store_with(Vec::new());
        let mut ids = Vec::new();
        for index in 0..6 {
            ids.push(store.create(new_coi(&format!("Prop {}", index))).expect("create").id);
        }
        let survivor = store.get(&ids[5]).cloned().expect("survivor");
        store.delete(&ids[0]).expect("delete");
        store.delete(&ids[1]).expect("delete");
        store
            .update(&ids[2], CoiPatch::reminder(ReminderStatus::NotApplicable))
            .expect("update");

        assert_eq!(store.len(), 4);
        assert_eq!(store.get(&ids[5]), Some(&survivor));
        let unique = store.records().iter().map(|r| r.id.as_str()).collect::<std::collections::HashSet<_>>();
        assert_eq!(unique.len(), 4);
    }

    #[test]
    fn bulk_set_reminder_updates_all_and_persists_once() {
        let (mut store, storage) = store_with(seed_records().into_iter().take(2).collect());
        let touched = store
            .bulk_set_reminder(&["1".to_string(), "2".to_string()], ReminderStatus::SentThirtyDays)
            .expect("bulk remind");

        assert_eq!(touched, 2);
        assert!(store
            .records()
            .iter()
            .all(|record| record.reminder_status == ReminderStatus::SentThirtyDays));
        assert_eq!(storage.writes(), 1);
    }

    #[test]
    fn bulk_delete_removes_matching_and_persists_once() {
        let (mut store, storage) = store_with(seed_records());
        let removed = store
            .bulk_delete(&["1".to_string(), "4".to_string(), "zzz".to_string()])
            .expect("bulk delete");
        assert_eq!(removed, 2);
        let ids = store.records().iter().map(|r| r.id.as_str()).collect::<Vec<_>>();
        assert_eq!(ids, vec!["2", "3", "5"]);
        assert_eq!(storage.writes(), 1);
    }

    #[test]
    fn persisted_snapshot_round_trips() {
        let (mut store, storage) = store_with(seed_records());
        store.create(new_coi("Round Trip")).expect("create");
        store
            .update("4", CoiPatch::reminder(ReminderStatus::SentThirtyDays))
            .expect("update");

        let reloaded = RecordStore::load(storage, DEFAULT_STORAGE_KEY, IdStrategy::Short);
        assert_eq!(reloaded.records(), store.records());
    }

    #[test]
    fn write_failures_surface_without_rollback() {
        let (mut store, storage) = store_with(seed_records());
        storage.set_fail_writes(true);
        assert!(store.delete("1").is_err());
        assert!(store.get("1").is_none());
    }
}
