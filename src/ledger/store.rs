use std::path::Path;
use std::sync::{Arc, Mutex};

use chrono::{DateTime, Utc};
use fjall::{Config, Keyspace, PartitionCreateOptions, PartitionHandle};
use serde::de::DeserializeOwned;
use tracing::{debug, info, warn};
use uuid::Uuid;

use super::error::{LedgerError, Result};
use super::partitions::{
    DANGER_TIME_PREFIX, RAIN_VERSION_PREFIX, WIND_TIME_PREFIX, WIND_VERSION_PREFIX,
    danger_slot_prefix, danger_time_key, danger_unique_key, encode_danger_key, encode_meta_key,
    encode_rain_key, encode_wind_key, prediction_slot_prefix, rain_index_key, rain_kind_prefix,
    rain_slot_prefix,
    rain_version_key, time_bound, wind_index_key, wind_series_prefix, wind_slot_prefix,
    wind_time_key, wind_version_key,
};
use super::records::{
    DangerInsert, DangerRecord, NewDanger, NewRain, NewWind, RainKind, RainRecord, WindKind,
    WindRecord,
};

const META_LAST_PRUNE: &str = "last_prune";

/// Fjall-backed metadata store for rain, wind and danger records
///
/// Every insert and delete writes the record and all of its index entries in
/// one atomic batch. The store is cheap to clone; clones share partitions.
#[derive(Clone)]
pub struct FjallLedger {
    keyspace: Keyspace,
    rain: PartitionHandle,
    wind: PartitionHandle,
    danger: PartitionHandle,
    index: PartitionHandle,
    metadata: PartitionHandle,
    /// Serialises conditional inserts so the danger uniqueness check and the
    /// write happen as one step
    write_lock: Arc<Mutex<()>>,
}

impl FjallLedger {
    /// Open or create a ledger at the given path
    pub fn open<P: AsRef<Path>>(path: P) -> Result<Self> {
        let path = path.as_ref();
        info!("Opening ledger at: {}", path.display());

        if let Some(parent) = path.parent() {
            std::fs::create_dir_all(parent)?;
        }

        let keyspace = Config::new(path).open()?;

        let rain = keyspace.open_partition("rain", PartitionCreateOptions::default())?;
        let wind = keyspace.open_partition("wind", PartitionCreateOptions::default())?;
        let danger = keyspace.open_partition("danger", PartitionCreateOptions::default())?;
        let index = keyspace.open_partition("index", PartitionCreateOptions::default())?;
        let metadata = keyspace.open_partition("metadata", PartitionCreateOptions::default())?;

        info!("Ledger opened successfully");
        Ok(Self {
            keyspace,
            rain,
            wind,
            danger,
            index,
            metadata,
            write_lock: Arc::new(Mutex::new(())),
        })
    }

    // ---------------------------------------------------------------------
    // Rain
    // ---------------------------------------------------------------------

    /// Insert a rain record and return it with its generated id
    ///
    /// A second radar sweep for an already stored slot is rejected.
    pub fn insert_rain(&self, new: NewRain) -> Result<RainRecord> {
        let _guard = self.write_lock.lock().map_err(|_| LedgerError::LockPoisoned)?;

        let record = new.into_record(Uuid::now_v7().to_string());
        if record.kind == RainKind::Radar
            && self.last_id(rain_slot_prefix(RainKind::Radar, &record.timestamp))?.is_some()
        {
            return Err(LedgerError::DuplicateRadar(record.timestamp));
        }
        let value = serde_json::to_vec(&record)?;

        let mut batch = self.keyspace.batch();
        batch.insert(&self.rain, encode_rain_key(&record.id), value);
        for key in rain_index_keys(&record) {
            batch.insert(&self.index, key, record.id.as_bytes());
        }
        batch.commit()?;

        debug!(id = %record.id, kind = record.kind.as_str(), timestamp = %record.timestamp, "Inserted rain record");
        Ok(record)
    }

    pub fn get_rain(&self, id: &str) -> Result<Option<RainRecord>> {
        self.load(&self.rain, &encode_rain_key(id))
    }

    /// Most recent radar sweep
    pub fn latest_radar(&self) -> Result<Option<RainRecord>> {
        match self.last_id(rain_kind_prefix(RainKind::Radar))? {
            Some(id) => self.get_rain(&id),
            None => Ok(None),
        }
    }

    /// Highest stored precipitation forecast version
    pub fn rain_prediction_version(&self) -> Result<Option<DateTime<Utc>>> {
        match self.last_id(RAIN_VERSION_PREFIX)? {
            Some(id) => Ok(self.get_rain(&id)?.and_then(|record| record.version)),
            None => Ok(None),
        }
    }

    /// Rain slice effective at `ts`: the radar sweep if one exists, else the
    /// slice of the current forecast run
    ///
    /// Slices of superseded runs are never returned, even when the current run
    /// has no slice at `ts`.
    pub fn rain_at(&self, ts: &DateTime<Utc>) -> Result<Option<RainRecord>> {
        if let Some(id) = self.last_id(rain_slot_prefix(RainKind::Radar, ts))? {
            if let Some(record) = self.get_rain(&id)? {
                return Ok(Some(record));
            }
        }

        match self.rain_prediction_version()? {
            Some(version) => self.prediction_at(ts, &version),
            None => Ok(None),
        }
    }

    /// Prediction slice of one forecast run at `ts`
    pub fn prediction_at(
        &self,
        ts: &DateTime<Utc>,
        version: &DateTime<Utc>,
    ) -> Result<Option<RainRecord>> {
        match self.last_id(prediction_slot_prefix(ts, version))? {
            Some(id) => self.get_rain(&id),
            None => Ok(None),
        }
    }

    /// Radar sweeps strictly older than `cutoff`
    pub fn radar_before(&self, cutoff: &DateTime<Utc>) -> Result<Vec<RainRecord>> {
        let prefix = String::from_utf8_lossy(&rain_kind_prefix(RainKind::Radar)).into_owned();
        let ids = self.ids_before(&prefix, cutoff)?;
        self.resolve(&self.rain, ids, encode_rain_key)
    }

    /// Prediction slices belonging to any version other than `current`
    pub fn predictions_superseded_by(&self, current: &DateTime<Utc>) -> Result<Vec<RainRecord>> {
        let ids = self.ids_with_prefix(RAIN_VERSION_PREFIX)?;
        let records: Vec<RainRecord> = self.resolve(&self.rain, ids, encode_rain_key)?;
        Ok(records
            .into_iter()
            .filter(|record| record.version.as_ref() != Some(current))
            .collect())
    }

    pub fn delete_rain(&self, record: &RainRecord) -> Result<()> {
        let mut batch = self.keyspace.batch();
        batch.remove(&self.rain, encode_rain_key(&record.id));
        for key in rain_index_keys(record) {
            batch.remove(&self.index, key);
        }
        batch.commit()?;
        debug!(id = %record.id, "Deleted rain record");
        Ok(())
    }

    // ---------------------------------------------------------------------
    // Wind
    // ---------------------------------------------------------------------

    pub fn insert_wind(&self, new: NewWind) -> Result<WindRecord> {
        let record = new.into_record(Uuid::now_v7().to_string());
        let value = serde_json::to_vec(&record)?;

        let mut batch = self.keyspace.batch();
        batch.insert(&self.wind, encode_wind_key(&record.id), value);
        for key in wind_index_keys(&record) {
            batch.insert(&self.index, key, record.id.as_bytes());
        }
        batch.commit()?;

        debug!(id = %record.id, kind = record.kind.as_str(), timestamp = %record.timestamp, "Inserted wind record");
        Ok(record)
    }

    pub fn get_wind(&self, id: &str) -> Result<Option<WindRecord>> {
        self.load(&self.wind, &encode_wind_key(id))
    }

    /// Highest stored wind forecast version
    pub fn wind_version(&self) -> Result<Option<DateTime<Utc>>> {
        match self.last_id(WIND_VERSION_PREFIX)? {
            Some(id) => Ok(self.get_wind(&id)?.map(|record| record.version)),
            None => Ok(None),
        }
    }

    /// All records of one kind at one version, in timestamp order
    pub fn wind_series(&self, kind: WindKind, version: &DateTime<Utc>) -> Result<Vec<WindRecord>> {
        let ids = self.ids_with_prefix(wind_series_prefix(kind, version))?;
        self.resolve(&self.wind, ids, encode_wind_key)
    }

    pub fn wind_at(
        &self,
        kind: WindKind,
        version: &DateTime<Utc>,
        ts: &DateTime<Utc>,
    ) -> Result<Option<WindRecord>> {
        match self.last_id(wind_slot_prefix(kind, version, ts))? {
            Some(id) => self.get_wind(&id),
            None => Ok(None),
        }
    }

    /// Wind records strictly older than `cutoff`, any kind or version
    pub fn wind_before(&self, cutoff: &DateTime<Utc>) -> Result<Vec<WindRecord>> {
        let ids = self.ids_before(WIND_TIME_PREFIX, cutoff)?;
        self.resolve(&self.wind, ids, encode_wind_key)
    }

    pub fn wind_superseded_by(&self, current: &DateTime<Utc>) -> Result<Vec<WindRecord>> {
        let ids = self.ids_with_prefix(WIND_VERSION_PREFIX)?;
        let records: Vec<WindRecord> = self.resolve(&self.wind, ids, encode_wind_key)?;
        Ok(records
            .into_iter()
            .filter(|record| record.version != *current)
            .collect())
    }

    pub fn delete_wind(&self, record: &WindRecord) -> Result<()> {
        let mut batch = self.keyspace.batch();
        batch.remove(&self.wind, encode_wind_key(&record.id));
        for key in wind_index_keys(record) {
            batch.remove(&self.index, key);
        }
        batch.commit()?;
        debug!(id = %record.id, "Deleted wind record");
        Ok(())
    }

    // ---------------------------------------------------------------------
    // Danger
    // ---------------------------------------------------------------------

    /// Insert a danger record unless one already exists for the same
    /// (timestamp, rain id, wind id) triple
    pub fn insert_danger(&self, new: NewDanger) -> Result<DangerInsert> {
        let _guard = self.write_lock.lock().map_err(|_| LedgerError::LockPoisoned)?;

        let unique = danger_unique_key(&new.timestamp, &new.rain.id, &new.wind.id);
        if let Some(existing) = self.index.get(&unique)? {
            let existing_id = String::from_utf8_lossy(&existing).into_owned();
            debug!(existing_id, "Danger record already present");
            return Ok(DangerInsert::Duplicate { existing_id });
        }

        let record = new.into_record(Uuid::now_v7().to_string());
        let value = serde_json::to_vec(&record)?;

        let mut batch = self.keyspace.batch();
        batch.insert(&self.danger, encode_danger_key(&record.id), value);
        batch.insert(
            &self.index,
            danger_time_key(&record.timestamp, &record.id),
            record.id.as_bytes(),
        );
        batch.insert(&self.index, unique, record.id.as_bytes());
        batch.commit()?;

        debug!(id = %record.id, timestamp = %record.timestamp, "Inserted danger record");
        Ok(DangerInsert::Inserted(record))
    }

    pub fn danger_exists(&self, ts: &DateTime<Utc>, rain_id: &str, wind_id: &str) -> Result<bool> {
        Ok(self
            .index
            .get(danger_unique_key(ts, rain_id, wind_id))?
            .is_some())
    }

    pub fn get_danger(&self, id: &str) -> Result<Option<DangerRecord>> {
        self.load(&self.danger, &encode_danger_key(id))
    }

    /// Most recently fused danger record at `ts`
    pub fn danger_at(&self, ts: &DateTime<Utc>) -> Result<Option<DangerRecord>> {
        match self.last_id(danger_slot_prefix(ts))? {
            Some(id) => self.get_danger(&id),
            None => Ok(None),
        }
    }

    pub fn danger_before(&self, cutoff: &DateTime<Utc>) -> Result<Vec<DangerRecord>> {
        let ids = self.ids_before(DANGER_TIME_PREFIX, cutoff)?;
        self.resolve(&self.danger, ids, encode_danger_key)
    }

    pub fn delete_danger(&self, record: &DangerRecord) -> Result<()> {
        let _guard = self.write_lock.lock().map_err(|_| LedgerError::LockPoisoned)?;

        let mut batch = self.keyspace.batch();
        batch.remove(&self.danger, encode_danger_key(&record.id));
        batch.remove(&self.index, danger_time_key(&record.timestamp, &record.id));
        batch.remove(
            &self.index,
            danger_unique_key(&record.timestamp, &record.rain_id, &record.wind_id),
        );
        batch.commit()?;
        debug!(id = %record.id, "Deleted danger record");
        Ok(())
    }

    // ---------------------------------------------------------------------
    // Metadata
    // ---------------------------------------------------------------------

    /// Time of the last completed retention pass
    pub fn last_prune(&self) -> Result<Option<DateTime<Utc>>> {
        let Some(value) = self.metadata.get(encode_meta_key(META_LAST_PRUNE))? else {
            return Ok(None);
        };
        let value = String::from_utf8_lossy(&value).into_owned();
        DateTime::parse_from_rfc3339(&value)
            .map(|ts| Some(ts.with_timezone(&Utc)))
            .map_err(|_| LedgerError::InvalidMetadata {
                key: META_LAST_PRUNE.to_string(),
                value,
            })
    }

    pub fn record_prune(&self, at: &DateTime<Utc>) -> Result<()> {
        self.metadata
            .insert(encode_meta_key(META_LAST_PRUNE), at.to_rfc3339())?;
        Ok(())
    }

    /// Persist all pending writes to disk
    pub fn persist(&self) -> Result<()> {
        self.keyspace.persist(fjall::PersistMode::SyncAll)?;
        Ok(())
    }

    /// Get record counts (for debugging/monitoring)
    pub fn stats(&self) -> Result<LedgerStats> {
        let mut stats = LedgerStats::default();

        for item in self.rain.iter() {
            item?;
            stats.rain_count += 1;
        }

        for item in self.wind.iter() {
            item?;
            stats.wind_count += 1;
        }

        for item in self.danger.iter() {
            item?;
            stats.danger_count += 1;
        }

        Ok(stats)
    }

    // ---------------------------------------------------------------------
    // Index helpers
    // ---------------------------------------------------------------------

    fn load<T: DeserializeOwned>(&self, partition: &PartitionHandle, key: &[u8]) -> Result<Option<T>> {
        match partition.get(key)? {
            Some(value) => Ok(Some(serde_json::from_slice(&value)?)),
            None => Ok(None),
        }
    }

    /// Id stored under the greatest index key with the given prefix
    fn last_id<K: AsRef<[u8]>>(&self, prefix: K) -> Result<Option<String>> {
        match self.index.prefix(prefix).next_back() {
            Some(item) => {
                let (_, value) = item?;
                Ok(Some(String::from_utf8_lossy(&value).into_owned()))
            }
            None => Ok(None),
        }
    }

    fn ids_with_prefix<K: AsRef<[u8]>>(&self, prefix: K) -> Result<Vec<String>> {
        let mut ids = Vec::new();
        for item in self.index.prefix(prefix) {
            let (_, value) = item?;
            ids.push(String::from_utf8_lossy(&value).into_owned());
        }
        Ok(ids)
    }

    fn ids_before(&self, prefix: &str, cutoff: &DateTime<Utc>) -> Result<Vec<String>> {
        let start = prefix.as_bytes().to_vec();
        let end = time_bound(prefix, cutoff);

        let mut ids = Vec::new();
        for item in self.index.range(start..end) {
            let (_, value) = item?;
            ids.push(String::from_utf8_lossy(&value).into_owned());
        }
        Ok(ids)
    }

    /// Load the records behind index ids, skipping dangling index entries
    fn resolve<T: DeserializeOwned>(
        &self,
        partition: &PartitionHandle,
        ids: Vec<String>,
        encode: fn(&str) -> Vec<u8>,
    ) -> Result<Vec<T>> {
        let mut records = Vec::with_capacity(ids.len());
        for id in ids {
            match self.load(partition, &encode(&id))? {
                Some(record) => records.push(record),
                None => warn!(id, "Index entry without record"),
            }
        }
        Ok(records)
    }
}

fn rain_index_keys(record: &RainRecord) -> Vec<Vec<u8>> {
    let mut keys = vec![rain_index_key(
        record.kind,
        &record.timestamp,
        record.version.as_ref(),
        &record.id,
    )];
    if let Some(version) = &record.version {
        keys.push(rain_version_key(version, &record.id));
    }
    keys
}

fn wind_index_keys(record: &WindRecord) -> Vec<Vec<u8>> {
    vec![
        wind_index_key(record.kind, &record.version, &record.timestamp, &record.id),
        wind_version_key(&record.version, &record.id),
        wind_time_key(&record.timestamp, &record.id),
    ]
}

#[derive(Debug, Clone, Default)]
pub struct LedgerStats {
    pub rain_count: usize,
    pub wind_count: usize,
    pub danger_count: usize,
}

#[cfg(test)]
mod tests {
    use super::*;
    use chrono::{Duration, TimeZone};
    use tempfile::TempDir;

    fn create_test_ledger() -> (FjallLedger, TempDir) {
        let temp_dir = TempDir::new().unwrap();
        let ledger = FjallLedger::open(temp_dir.path().join("test_ledger")).unwrap();
        (ledger, temp_dir)
    }

    fn ts(hour: u32, minute: u32) -> DateTime<Utc> {
        Utc.with_ymd_and_hms(2024, 5, 1, hour, minute, 0).unwrap()
    }

    #[test]
    fn test_open_ledger() {
        let temp_dir = TempDir::new().unwrap();
        assert!(FjallLedger::open(temp_dir.path().join("test_ledger")).is_ok());
    }

    #[test]
    fn test_insert_and_get_rain() {
        let (ledger, _temp) = create_test_ledger();

        let record = ledger.insert_rain(NewRain::radar(ts(10, 0))).unwrap();
        assert!(record.processed);
        assert!(record.version.is_none());

        let loaded = ledger.get_rain(&record.id).unwrap().unwrap();
        assert_eq!(loaded, record);
        assert!(ledger.get_rain("missing").unwrap().is_none());
    }

    #[test]
    fn test_latest_radar() {
        let (ledger, _temp) = create_test_ledger();
        assert!(ledger.latest_radar().unwrap().is_none());

        ledger.insert_rain(NewRain::radar(ts(10, 5))).unwrap();
        ledger.insert_rain(NewRain::radar(ts(10, 0))).unwrap();
        ledger
            .insert_rain(NewRain::prediction(ts(12, 0), ts(9, 0)))
            .unwrap();

        let latest = ledger.latest_radar().unwrap().unwrap();
        assert_eq!(latest.timestamp, ts(10, 5));
    }

    #[test]
    fn test_rain_prediction_version_is_maximum() {
        let (ledger, _temp) = create_test_ledger();
        assert!(ledger.rain_prediction_version().unwrap().is_none());

        ledger
            .insert_rain(NewRain::prediction(ts(12, 0), ts(9, 0)))
            .unwrap();
        ledger
            .insert_rain(NewRain::prediction(ts(12, 0), ts(8, 0)))
            .unwrap();

        assert_eq!(ledger.rain_prediction_version().unwrap(), Some(ts(9, 0)));
    }

    #[test]
    fn test_rain_at_prefers_radar_then_current_version() {
        let (ledger, _temp) = create_test_ledger();
        let slot = ts(12, 0);

        let old = ledger
            .insert_rain(NewRain::prediction(slot, ts(8, 0)))
            .unwrap();
        let current = ledger
            .insert_rain(NewRain::prediction(slot, ts(9, 0)))
            .unwrap();
        assert_ne!(old.id, current.id);
        assert_eq!(ledger.rain_at(&slot).unwrap().unwrap().id, current.id);

        let radar = ledger.insert_rain(NewRain::radar(slot)).unwrap();
        assert_eq!(ledger.rain_at(&slot).unwrap().unwrap().id, radar.id);

        assert!(ledger.rain_at(&ts(12, 5)).unwrap().is_none());
    }

    #[test]
    fn test_rain_at_ignores_superseded_runs() {
        let (ledger, _temp) = create_test_ledger();

        let stale = ledger
            .insert_rain(NewRain::prediction(ts(12, 30), ts(11, 0)))
            .unwrap();
        let current = ledger
            .insert_rain(NewRain::prediction(ts(12, 35), ts(12, 0)))
            .unwrap();
        assert_eq!(ledger.rain_prediction_version().unwrap(), Some(ts(12, 0)));

        // Current run has a gap at 12:30 that the older run covers
        assert!(ledger.rain_at(&ts(12, 30)).unwrap().is_none());
        assert_eq!(
            ledger.prediction_at(&ts(12, 30), &ts(11, 0)).unwrap().unwrap().id,
            stale.id
        );
        assert_eq!(ledger.rain_at(&ts(12, 35)).unwrap().unwrap().id, current.id);
    }

    #[test]
    fn test_duplicate_radar_rejected() {
        let (ledger, _temp) = create_test_ledger();
        let first = ledger.insert_rain(NewRain::radar(ts(10, 0))).unwrap();

        assert!(matches!(
            ledger.insert_rain(NewRain::radar(ts(10, 0))),
            Err(LedgerError::DuplicateRadar(at)) if at == ts(10, 0)
        ));
        assert_eq!(ledger.stats().unwrap().rain_count, 1);

        // Predictions for the same slot are unaffected
        ledger
            .insert_rain(NewRain::prediction(ts(10, 0), ts(9, 0)))
            .unwrap();

        ledger.delete_rain(&first).unwrap();
        assert!(ledger.insert_rain(NewRain::radar(ts(10, 0))).is_ok());
    }

    #[test]
    fn test_radar_before_and_delete() {
        let (ledger, _temp) = create_test_ledger();
        let old = ledger.insert_rain(NewRain::radar(ts(8, 0))).unwrap();
        let fresh = ledger.insert_rain(NewRain::radar(ts(10, 0))).unwrap();

        let stale = ledger.radar_before(&ts(10, 0)).unwrap();
        assert_eq!(stale.len(), 1);
        assert_eq!(stale[0].id, old.id);

        ledger.delete_rain(&old).unwrap();
        assert!(ledger.get_rain(&old.id).unwrap().is_none());
        assert!(ledger.radar_before(&ts(10, 0)).unwrap().is_empty());
        assert_eq!(ledger.latest_radar().unwrap().unwrap().id, fresh.id);
    }

    #[test]
    fn test_predictions_superseded_by() {
        let (ledger, _temp) = create_test_ledger();
        ledger
            .insert_rain(NewRain::prediction(ts(12, 0), ts(8, 0)))
            .unwrap();
        ledger
            .insert_rain(NewRain::prediction(ts(12, 5), ts(8, 0)))
            .unwrap();
        ledger
            .insert_rain(NewRain::prediction(ts(12, 0), ts(9, 0)))
            .unwrap();
        ledger.insert_rain(NewRain::radar(ts(7, 0))).unwrap();

        let superseded = ledger.predictions_superseded_by(&ts(9, 0)).unwrap();
        assert_eq!(superseded.len(), 2);
        assert!(superseded.iter().all(|r| r.version == Some(ts(8, 0))));
    }

    #[test]
    fn test_wind_series_and_version() {
        let (ledger, _temp) = create_test_ledger();
        let version = ts(6, 0);

        for hour in [12, 11, 13] {
            ledger
                .insert_wind(NewWind {
                    timestamp: ts(hour, 0),
                    kind: WindKind::Strength,
                    version,
                })
                .unwrap();
        }
        ledger
            .insert_wind(NewWind {
                timestamp: ts(11, 0),
                kind: WindKind::Direction,
                version,
            })
            .unwrap();

        assert_eq!(ledger.wind_version().unwrap(), Some(version));

        let series = ledger.wind_series(WindKind::Strength, &version).unwrap();
        let hours: Vec<_> = series.iter().map(|r| r.timestamp).collect();
        assert_eq!(hours, vec![ts(11, 0), ts(12, 0), ts(13, 0)]);

        let direction = ledger
            .wind_at(WindKind::Direction, &version, &ts(11, 0))
            .unwrap()
            .unwrap();
        assert_eq!(direction.kind, WindKind::Direction);
        assert!(ledger
            .wind_at(WindKind::Direction, &version, &ts(12, 0))
            .unwrap()
            .is_none());
    }

    #[test]
    fn test_wind_before_and_superseded() {
        let (ledger, _temp) = create_test_ledger();
        let old = ledger
            .insert_wind(NewWind {
                timestamp: ts(9, 0),
                kind: WindKind::Strength,
                version: ts(3, 0),
            })
            .unwrap();
        let current = ledger
            .insert_wind(NewWind {
                timestamp: ts(12, 0),
                kind: WindKind::Strength,
                version: ts(6, 0),
            })
            .unwrap();

        let before = ledger.wind_before(&ts(10, 0)).unwrap();
        assert_eq!(before.len(), 1);
        assert_eq!(before[0].id, old.id);

        let superseded = ledger.wind_superseded_by(&ts(6, 0)).unwrap();
        assert_eq!(superseded.len(), 1);
        assert_eq!(superseded[0].id, old.id);

        ledger.delete_wind(&old).unwrap();
        assert!(ledger.wind_before(&ts(10, 0)).unwrap().is_empty());
        assert_eq!(ledger.wind_version().unwrap(), Some(current.version));
    }

    #[test]
    fn test_danger_insert_is_unique_per_triple() {
        let (ledger, _temp) = create_test_ledger();
        let rain = ledger
            .insert_rain(NewRain::prediction(ts(12, 0), ts(9, 0)))
            .unwrap();
        let wind = ledger
            .insert_wind(NewWind {
                timestamp: ts(12, 0),
                kind: WindKind::Strength,
                version: ts(6, 0),
            })
            .unwrap();

        let new = NewDanger {
            timestamp: ts(12, 0),
            rain: rain.clone(),
            wind: wind.clone(),
        };

        let first = match ledger.insert_danger(new.clone()).unwrap() {
            DangerInsert::Inserted(record) => record,
            other => panic!("expected insert, got {other:?}"),
        };
        assert_eq!(first.rain_version, Some(ts(9, 0)));
        assert_eq!(first.wind_version, ts(6, 0));
        assert!(ledger.danger_exists(&ts(12, 0), &rain.id, &wind.id).unwrap());

        match ledger.insert_danger(new).unwrap() {
            DangerInsert::Duplicate { existing_id } => assert_eq!(existing_id, first.id),
            other => panic!("expected duplicate, got {other:?}"),
        }

        assert_eq!(ledger.stats().unwrap().danger_count, 1);
        assert_eq!(ledger.danger_at(&ts(12, 0)).unwrap().unwrap().id, first.id);
    }

    #[test]
    fn test_danger_delete_releases_triple() {
        let (ledger, _temp) = create_test_ledger();
        let rain = ledger.insert_rain(NewRain::radar(ts(12, 0))).unwrap();
        let wind = ledger
            .insert_wind(NewWind {
                timestamp: ts(12, 0),
                kind: WindKind::Strength,
                version: ts(6, 0),
            })
            .unwrap();
        let new = NewDanger {
            timestamp: ts(12, 5),
            rain,
            wind,
        };

        let DangerInsert::Inserted(record) = ledger.insert_danger(new.clone()).unwrap() else {
            panic!("expected insert");
        };
        assert_eq!(ledger.danger_before(&ts(13, 0)).unwrap().len(), 1);

        ledger.delete_danger(&record).unwrap();
        assert!(ledger.danger_before(&ts(13, 0)).unwrap().is_empty());
        assert!(matches!(
            ledger.insert_danger(new).unwrap(),
            DangerInsert::Inserted(_)
        ));
    }

    #[test]
    fn test_concurrent_danger_inserts_store_one_record() {
        let (ledger, _temp) = create_test_ledger();
        let rain = ledger.insert_rain(NewRain::radar(ts(12, 0))).unwrap();
        let wind = ledger
            .insert_wind(NewWind {
                timestamp: ts(12, 0),
                kind: WindKind::Strength,
                version: ts(6, 0),
            })
            .unwrap();
        let new = NewDanger {
            timestamp: ts(12, 0),
            rain,
            wind,
        };

        let handles: Vec<_> = (0..8)
            .map(|_| {
                let ledger = ledger.clone();
                let new = new.clone();
                std::thread::spawn(move || ledger.insert_danger(new).unwrap())
            })
            .collect();

        let inserted = handles
            .into_iter()
            .map(|h| h.join().unwrap())
            .filter(|outcome| matches!(outcome, DangerInsert::Inserted(_)))
            .count();

        assert_eq!(inserted, 1);
        assert_eq!(ledger.stats().unwrap().danger_count, 1);
    }

    #[test]
    fn test_last_prune_roundtrip() {
        let (ledger, _temp) = create_test_ledger();
        assert!(ledger.last_prune().unwrap().is_none());

        let at = ts(10, 0) + Duration::seconds(17);
        ledger.record_prune(&at).unwrap();
        assert_eq!(ledger.last_prune().unwrap(), Some(at));
    }

    #[test]
    fn test_persist() {
        let (ledger, _temp) = create_test_ledger();
        ledger.insert_rain(NewRain::radar(ts(10, 0))).unwrap();
        ledger.persist().unwrap();
    }
}
