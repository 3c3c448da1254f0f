//! The transactional ledger store.

use std::{
    collections::{BTreeMap, HashMap, HashSet},
    sync::{
        atomic::{AtomicU64, Ordering},
        RwLock, RwLockReadGuard, RwLockWriteGuard,
    },
};

use tracing::{debug, warn};
use uuid::Uuid;

use crate::domain::{DailySpendingEntry, PartitionKey, Period};

use super::{
    locks::PartitionLocks, MemoryBackend, SnapshotBackend, StoreError, TrackerSnapshot,
    CURRENT_SCHEMA_VERSION,
};

/// Authoritative in-memory snapshot backed by a [`SnapshotBackend`].
///
/// Every commit works on a copy of the snapshot: constraints are checked and
/// the copy is persisted before it replaces the visible state, so a failed
/// commit leaves nothing behind.
pub struct LedgerStore {
    state: RwLock<TrackerSnapshot>,
    locks: PartitionLocks,
    sequence: AtomicU64,
    backend: Box<dyn SnapshotBackend>,
}

impl LedgerStore {
    /// Loads the snapshot from `backend` and opens the store over it.
    pub fn open(backend: Box<dyn SnapshotBackend>) -> Result<Self, StoreError> {
        let snapshot = backend.load()?;
        if snapshot.schema_version > CURRENT_SCHEMA_VERSION {
            return Err(StoreError::UnsupportedSchema {
                found: snapshot.schema_version,
                supported: CURRENT_SCHEMA_VERSION,
            });
        }
        snapshot.check_constraints().map_err(|err| {
            StoreError::Serde(format!("{} is inconsistent: {err}", backend.location()))
        })?;
        debug!(
            periods = snapshot.periods.len(),
            spendings = snapshot.spendings.len(),
            "ledger store opened"
        );
        Ok(Self::from_parts(snapshot, backend))
    }

    /// Volatile store used by tests and throwaway sessions.
    pub fn in_memory() -> Self {
        Self::from_parts(TrackerSnapshot::default(), Box::new(MemoryBackend::new()))
    }

    fn from_parts(mut snapshot: TrackerSnapshot, backend: Box<dyn SnapshotBackend>) -> Self {
        let floor = snapshot.max_sequence().map_or(1, |max| max + 1);
        snapshot.next_sequence = snapshot.next_sequence.max(floor);
        snapshot.schema_version = CURRENT_SCHEMA_VERSION;
        Self {
            sequence: AtomicU64::new(snapshot.next_sequence),
            state: RwLock::new(snapshot),
            locks: PartitionLocks::new(),
            backend,
        }
    }

    pub fn backend(&self) -> &dyn SnapshotBackend {
        self.backend.as_ref()
    }

    pub fn locks(&self) -> &PartitionLocks {
        &self.locks
    }

    /// Runs `f` against the current committed snapshot without taking partition locks.
    pub fn read<R>(&self, f: impl FnOnce(&TrackerSnapshot) -> R) -> Result<R, StoreError> {
        let state = self.state_read()?;
        Ok(f(&state))
    }

    /// Clones the current committed snapshot.
    pub fn snapshot(&self) -> Result<TrackerSnapshot, StoreError> {
        self.read(|state| state.clone())
    }

    /// Snapshot read of a single partition; never waits for writers.
    pub fn partition(&self, key: &PartitionKey) -> Result<Vec<DailySpendingEntry>, StoreError> {
        self.read(|state| state.partition(key))
    }

    /// Applies `f` to a copy of the snapshot and commits it atomically.
    pub fn update<R, E, F>(&self, f: F) -> Result<R, E>
    where
        F: FnOnce(&mut TrackerSnapshot) -> Result<R, E>,
        E: From<StoreError>,
    {
        self.commit(f)
    }

    /// Like [`LedgerStore::update`], but holds the partition locks for `keys` first.
    pub fn update_locked<R, E, F>(&self, keys: &[PartitionKey], f: F) -> Result<R, E>
    where
        F: FnOnce(&mut TrackerSnapshot) -> Result<R, E>,
        E: From<StoreError>,
    {
        let _guard = self.locks.acquire(keys)?;
        self.commit(f)
    }

    /// Opens a transaction over the partitions in `keys`.
    ///
    /// The partitions stay locked until the closure returns and its changes are
    /// committed or discarded. Returning `Err` from the closure rolls back.
    pub fn transaction<R, E, F>(&self, keys: &[PartitionKey], f: F) -> Result<R, E>
    where
        F: FnOnce(&mut PartitionTx<'_>) -> Result<R, E>,
        E: From<StoreError>,
    {
        let _guard = self.locks.acquire(keys)?;
        let mut tx = PartitionTx::begin(self, keys)?;
        let value = match f(&mut tx) {
            Ok(value) => value,
            Err(err) => {
                debug!(partitions = keys.len(), "transaction rolled back by caller");
                return Err(err);
            }
        };
        let PartitionTx {
            staged,
            periods,
            dirty_periods,
            ..
        } = tx;
        self.commit(move |draft| {
            for (key, rows) in staged {
                draft.replace_partition(&key, rows);
            }
            for id in dirty_periods {
                if let (Some(updated), Some(slot)) = (periods.get(&id), draft.period_mut(id)) {
                    *slot = updated.clone();
                }
            }
            Ok::<_, StoreError>(())
        })
        .map_err(E::from)?;
        Ok(value)
    }

    fn commit<R, E, F>(&self, f: F) -> Result<R, E>
    where
        F: FnOnce(&mut TrackerSnapshot) -> Result<R, E>,
        E: From<StoreError>,
    {
        let mut state = self.state_write()?;
        let mut draft = state.clone();
        let value = f(&mut draft)?;
        draft.check_constraints()?;
        draft.next_sequence = draft
            .next_sequence
            .max(self.sequence.load(Ordering::SeqCst));
        if let Err(err) = self.backend.persist(&draft) {
            warn!(error = %err, "commit rolled back");
            return Err(StoreError::Aborted(format!("commit rolled back: {err}")).into());
        }
        *state = draft;
        debug!(spendings = state.spendings.len(), "commit applied");
        Ok(value)
    }

    fn next_sequence(&self) -> u64 {
        self.sequence.fetch_add(1, Ordering::SeqCst)
    }

    fn state_read(&self) -> Result<RwLockReadGuard<'_, TrackerSnapshot>, StoreError> {
        self.state
            .read()
            .map_err(|err| StoreError::Poisoned(err.to_string()))
    }

    fn state_write(&self) -> Result<RwLockWriteGuard<'_, TrackerSnapshot>, StoreError> {
        self.state
            .write()
            .map_err(|err| StoreError::Poisoned(err.to_string()))
    }
}

/// Staged view of locked partitions inside [`LedgerStore::transaction`].
pub struct PartitionTx<'a> {
    store: &'a LedgerStore,
    staged: BTreeMap<PartitionKey, Vec<DailySpendingEntry>>,
    periods: HashMap<Uuid, Period>,
    dirty_periods: HashSet<Uuid>,
}

impl<'a> PartitionTx<'a> {
    fn begin(store: &'a LedgerStore, keys: &[PartitionKey]) -> Result<Self, StoreError> {
        let state = store.state_read()?;
        let mut staged = BTreeMap::new();
        let mut periods = HashMap::new();
        for key in keys {
            staged.insert(key.clone(), state.partition(key));
            if let Some(period) = state.period(key.period_id) {
                periods.insert(period.id, period.clone());
            }
        }
        Ok(Self {
            store,
            staged,
            periods,
            dirty_periods: HashSet::new(),
        })
    }

    pub fn period(&self, id: Uuid) -> Option<&Period> {
        self.periods.get(&id)
    }

    /// Mutable access to a locked partition's period; changes commit with the rows.
    pub fn period_mut(&mut self, id: Uuid) -> Option<&mut Period> {
        let period = self.periods.get_mut(&id)?;
        self.dirty_periods.insert(id);
        Some(period)
    }

    pub fn rows(&self, key: &PartitionKey) -> Result<&[DailySpendingEntry], StoreError> {
        self.staged
            .get(key)
            .map(Vec::as_slice)
            .ok_or_else(|| StoreError::UnlockedPartition(key.clone()))
    }

    pub fn rows_mut(
        &mut self,
        key: &PartitionKey,
    ) -> Result<&mut Vec<DailySpendingEntry>, StoreError> {
        self.staged
            .get_mut(key)
            .ok_or_else(|| StoreError::UnlockedPartition(key.clone()))
    }

    /// Finds an entry in any staged partition.
    pub fn find(&self, id: Uuid) -> Option<&DailySpendingEntry> {
        self.staged.values().flatten().find(|entry| entry.id == id)
    }

    /// Stages a new entry, stamping it with the next insertion-order key.
    pub fn insert(&mut self, mut entry: DailySpendingEntry) -> Result<Uuid, StoreError> {
        let key = entry.partition_key();
        if !self.staged.contains_key(&key) {
            return Err(StoreError::UnlockedPartition(key));
        }
        entry.sequence = self.store.next_sequence();
        let id = entry.id;
        self.rows_mut(&key)?.push(entry);
        Ok(id)
    }

    /// Removes an entry from its staged partition.
    pub fn remove(
        &mut self,
        key: &PartitionKey,
        id: Uuid,
    ) -> Result<Option<DailySpendingEntry>, StoreError> {
        let rows = self.rows_mut(key)?;
        Ok(rows
            .iter()
            .position(|entry| entry.id == id)
            .map(|idx| rows.remove(idx)))
    }
}
