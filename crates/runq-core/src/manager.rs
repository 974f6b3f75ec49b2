use tokio::sync::Mutex;
use tracing::{debug, error, info, instrument};
use uuid::Uuid;

use runq_model::{ExitStatus, Item, ItemError, Place, Position, Select};
use runq_store::ListStore;

use crate::{QueueError, StoreKeys, index::IdentityIndex};

/// Mutable manager state guarded by the coordinating lock.
struct ManagerState {
    index: IdentityIndex,
    started: bool,
}

/// Orchestrates the persisted queue, the running slot and the history log.
///
/// Every public operation acquires the single coordinating lock for its full
/// duration, reads included: the store offers only single-command atomicity,
/// so compound operations (move, displaced insert, stop) are made to appear
/// atomic by serializing all access behind the lock. Internal helpers take
/// the already-locked [`ManagerState`] and never reacquire it, so reentrant
/// acquisition is structurally impossible.
///
/// There is no built-in timeout or retry: a blocked store call stalls the
/// whole manager, and retry policy belongs to the caller.
pub struct QueueManager<S> {
    store: S,
    keys: StoreKeys,
    state: Mutex<ManagerState>,
}

fn describe(select: &Select) -> String {
    match select {
        Select::Pos(pos) => format!("position {pos}"),
        Select::Uid(uid) => format!("uid '{uid}'"),
    }
}

/// Raw store index for a position: the store resolves negatives itself.
fn raw_index(pos: Position) -> i64 {
    match pos {
        Position::Front => 0,
        Position::Back => -1,
        Position::Index(i) => i,
    }
}

impl<S: ListStore> QueueManager<S> {
    pub fn new(store: S) -> Self {
        Self::with_keys(store, StoreKeys::default())
    }

    pub fn with_keys(store: S, keys: StoreKeys) -> Self {
        Self {
            store,
            keys,
            state: Mutex::new(ManagerState {
                index: IdentityIndex::default(),
                started: false,
            }),
        }
    }

    fn new_uid() -> String {
        Uuid::new_v4().to_string()
    }

    /// Assign a fresh UID, replacing any existing one. Usable independently
    /// of insertion; `add` generates a UID on its own when none is present.
    pub fn assign_new_uid(item: &mut Item) {
        item.set_uid(Self::new_uid());
    }

    /// Idempotent initialization: repair leftover store state and rebuild
    /// the identity index from the persisted queue and running slot.
    pub async fn start(&self) -> Result<(), QueueError> {
        let mut state = self.state.lock().await;
        if state.started {
            return Ok(());
        }
        self.reconcile().await?;
        self.rebuild_index(&mut state).await?;
        state.started = true;
        info!(queue = %self.keys.queue, "queue manager started");
        Ok(())
    }

    // ------------------------------------------------------------------
    // Queue queries

    pub async fn size(&self) -> Result<usize, QueueError> {
        let _state = self.state.lock().await;
        self.queue_len().await
    }

    /// Full front-to-back snapshot of the queue.
    pub async fn list(&self) -> Result<Vec<Item>, QueueError> {
        let _state = self.state.lock().await;
        self.queue_snapshot().await
    }

    /// Retrieve a single queued item without removing it.
    ///
    /// The running item is not addressable here: selecting its UID fails
    /// with a not-found error, as does an out-of-range index.
    pub async fn get(&self, select: Select) -> Result<Item, QueueError> {
        let state = self.state.lock().await;
        self.get_locked(&state, &select).await
    }

    // ------------------------------------------------------------------
    // Queue mutations

    /// Insert an item at the given placement, returning the stored item
    /// (with its UID assigned) and the new queue size.
    #[instrument(level = "debug", skip(self, item))]
    pub async fn add(&self, item: Item, place: Place) -> Result<(Item, usize), QueueError> {
        let mut state = self.state.lock().await;
        self.add_locked(&mut state, item, place).await
    }

    /// Remove and return one item plus the new queue size.
    #[instrument(level = "debug", skip(self))]
    pub async fn pop(&self, select: Select) -> Result<(Item, usize), QueueError> {
        let mut state = self.state.lock().await;
        self.pop_locked(&mut state, &select).await
    }

    /// Reposition an existing item without changing its identity.
    #[instrument(level = "debug", skip(self))]
    pub async fn move_item(
        &self,
        source: Select,
        destination: Place,
    ) -> Result<(Item, usize), QueueError> {
        let mut state = self.state.lock().await;
        self.move_locked(&mut state, &source, &destination).await
    }

    /// Pop from the back until the queue is empty. The running slot and the
    /// history are untouched.
    pub async fn clear(&self) -> Result<(), QueueError> {
        let mut state = self.state.lock().await;
        while self.queue_len().await? > 0 {
            self.pop_locked(&mut state, &Select::Pos(Position::Back)).await?;
        }
        Ok(())
    }

    // ------------------------------------------------------------------
    // Running slot and terminal transitions

    pub async fn is_running(&self) -> Result<bool, QueueError> {
        let _state = self.state.lock().await;
        Ok(self.running_item().await?.is_some())
    }

    pub async fn get_running(&self) -> Result<Option<Item>, QueueError> {
        let _state = self.state.lock().await;
        self.running_item().await
    }

    /// Pop the queue front into the running slot.
    ///
    /// Returns `None` when the slot is already occupied or the queue is
    /// empty. The UID stays in the identity index: the item is in flight
    /// and re-enqueueing it must keep being rejected.
    pub async fn start_next(&self) -> Result<Option<Item>, QueueError> {
        let _state = self.state.lock().await;
        if self.running_item().await?.is_some() {
            return Ok(None);
        }
        let Some(text) = self.store.lpop(&self.keys.queue).await? else {
            return Ok(None);
        };
        let item = Item::from_json(&text)?;
        self.store.set(&self.keys.running, &text).await?;
        debug!(uid = item.uid().unwrap_or(""), "item set as running");
        Ok(Some(item))
    }

    /// Terminal transition: record the running item in the history with the
    /// given status and free its UID for re-enqueueing.
    ///
    /// Returns the augmented item, or `None` when nothing is running.
    #[instrument(level = "debug", skip(self))]
    pub async fn complete(&self, status: ExitStatus) -> Result<Option<Item>, QueueError> {
        let mut state = self.state.lock().await;
        let Some(mut item) = self.running_item().await? else {
            return Ok(None);
        };
        item.set_exit_status(status);
        let uid = item.uid().ok_or(ItemError::MissingUid)?.to_string();

        self.store.delete(&self.keys.running).await?;
        state.index.remove(&uid)?;
        self.store.rpush(&self.keys.history, &item.to_json()).await?;
        debug!(uid, %status, "running item completed");
        Ok(Some(item))
    }

    /// Terminal transition for stop/abort/halt (only the status differs):
    /// the running item returns to the queue front with its UID retained in
    /// the index, and the augmented record is also appended to the history.
    ///
    /// Returns the augmented item, or `None` when nothing is running.
    #[instrument(level = "debug", skip(self))]
    pub async fn stop(&self, status: ExitStatus) -> Result<Option<Item>, QueueError> {
        let mut state = self.state.lock().await;
        let Some(mut item) = self.running_item().await? else {
            return Ok(None);
        };
        item.set_exit_status(status);
        let encoded = item.to_json();

        self.store.delete(&self.keys.running).await?;
        self.store.lpush(&self.keys.queue, &encoded).await?;
        state.index.update(item.clone())?;
        self.store.rpush(&self.keys.history, &encoded).await?;
        debug!(uid = item.uid().unwrap_or(""), %status, "running item re-queued");
        Ok(Some(item))
    }

    // ------------------------------------------------------------------
    // History

    pub async fn history_size(&self) -> Result<usize, QueueError> {
        let _state = self.state.lock().await;
        Ok(self.store.llen(&self.keys.history).await?)
    }

    /// Oldest-first snapshot of the completion history.
    pub async fn history_list(&self) -> Result<Vec<Item>, QueueError> {
        let _state = self.state.lock().await;
        self.store
            .lrange_all(&self.keys.history)
            .await?
            .iter()
            .map(|text| Item::from_json(text).map_err(QueueError::from))
            .collect()
    }

    pub async fn history_clear(&self) -> Result<(), QueueError> {
        let _state = self.state.lock().await;
        Ok(self.store.delete(&self.keys.history).await?)
    }

    /// Drop the queue, the running slot and the history, and clear the
    /// index. Maintenance and test hook.
    pub async fn delete_all(&self) -> Result<(), QueueError> {
        let mut state = self.state.lock().await;
        self.store.delete(&self.keys.queue).await?;
        self.store.delete(&self.keys.running).await?;
        self.store.delete(&self.keys.history).await?;
        state.index.clear();
        Ok(())
    }

    // ------------------------------------------------------------------
    // Internal helpers. All of these assume the state lock is held by the
    // caller for the whole enclosing operation.

    async fn queue_len(&self) -> Result<usize, QueueError> {
        Ok(self.store.llen(&self.keys.queue).await?)
    }

    async fn queue_snapshot(&self) -> Result<Vec<Item>, QueueError> {
        self.store
            .lrange_all(&self.keys.queue)
            .await?
            .iter()
            .map(|text| Item::from_json(text).map_err(QueueError::from))
            .collect()
    }

    /// Read the running slot; a missing key or an empty record means the
    /// slot is unoccupied.
    async fn running_item(&self) -> Result<Option<Item>, QueueError> {
        let Some(text) = self.store.get(&self.keys.running).await? else {
            return Ok(None);
        };
        let item = Item::from_json(&text)?;
        Ok((!item.is_empty()).then_some(item))
    }

    async fn running_uid(&self) -> Result<Option<String>, QueueError> {
        Ok(self
            .running_item()
            .await?
            .and_then(|item| item.uid().map(str::to_string)))
    }

    async fn item_at(&self, pos: Position) -> Result<Item, QueueError> {
        let Some(text) = self.store.lindex(&self.keys.queue, raw_index(pos)).await? else {
            return Err(QueueError::NotFound(format!("index '{pos}' is out of range")));
        };
        Ok(Item::from_json(&text)?)
    }

    /// Remove exactly one record matching the item's serialized value.
    async fn remove_exact(&self, item: &Item) -> Result<(), QueueError> {
        let removed = self.store.lrem_exact(&self.keys.queue, &item.to_json()).await?;
        if removed != 1 {
            return Err(QueueError::InconsistentRemoval(removed));
        }
        Ok(())
    }

    /// Position of a queued item by UID. A full queue scan; used only where
    /// positional addressing forces it.
    async fn index_of_uid(&self, uid: &str) -> Result<usize, QueueError> {
        for (n, item) in self.queue_snapshot().await?.iter().enumerate() {
            if item.uid() == Some(uid) {
                return Ok(n);
            }
        }
        Err(QueueError::NotFound(format!(
            "item with uid '{uid}' is not in the queue"
        )))
    }

    async fn get_locked(&self, state: &ManagerState, select: &Select) -> Result<Item, QueueError> {
        match select {
            Select::Uid(uid) => {
                let Some(item) = state.index.get(uid) else {
                    return Err(QueueError::NotFound(format!(
                        "item with uid '{uid}' is not in the queue"
                    )));
                };
                let item = item.clone();
                if self.running_uid().await?.as_deref() == Some(uid.as_str()) {
                    return Err(QueueError::NotFound(format!(
                        "item with uid '{uid}' is currently running"
                    )));
                }
                Ok(item)
            }
            Select::Pos(pos) => self.item_at(*pos).await,
        }
    }

    async fn pop_locked(
        &self,
        state: &mut ManagerState,
        select: &Select,
    ) -> Result<(Item, usize), QueueError> {
        let item = match select {
            Select::Uid(uid) => {
                let Some(item) = state.index.get(uid) else {
                    return Err(QueueError::NotFound(format!(
                        "item with uid '{uid}' is not in the queue"
                    )));
                };
                let item = item.clone();
                if self.running_uid().await?.as_deref() == Some(uid.as_str()) {
                    return Err(QueueError::NotFound(
                        "can not remove the currently running item".to_string(),
                    ));
                }
                self.remove_exact(&item).await?;
                item
            }
            Select::Pos(Position::Back) => {
                let Some(text) = self.store.rpop(&self.keys.queue).await? else {
                    return Err(QueueError::EmptyQueue);
                };
                Item::from_json(&text)?
            }
            Select::Pos(Position::Front) => {
                let Some(text) = self.store.lpop(&self.keys.queue).await? else {
                    return Err(QueueError::EmptyQueue);
                };
                Item::from_json(&text)?
            }
            Select::Pos(pos) => {
                let item = self.item_at(*pos).await?;
                self.remove_exact(&item).await?;
                item
            }
        };

        let uid = item.uid().ok_or(ItemError::MissingUid)?;
        state.index.remove(uid)?;
        let qsize = self.queue_len().await?;
        debug!(uid = item.uid().unwrap_or(""), qsize, "item popped from queue");
        Ok((item, qsize))
    }

    async fn add_locked(
        &self,
        state: &mut ManagerState,
        mut item: Item,
        place: Place,
    ) -> Result<(Item, usize), QueueError> {
        match item.uid().map(str::to_string) {
            None => item.set_uid(Self::new_uid()),
            Some(uid) => {
                if state.index.contains(&uid) {
                    return Err(QueueError::Duplicate(uid));
                }
            }
        }

        let qsize0 = self.queue_len().await?;
        let encoded = item.to_json();

        let qsize = match &place {
            Place::Before(uid) | Place::After(uid) => {
                let before = matches!(&place, Place::Before(_));
                let Some(pivot) = state.index.get(uid).map(Item::to_json) else {
                    return Err(QueueError::NotFound(format!(
                        "item with uid '{uid}' is not in the queue"
                    )));
                };
                if self.running_uid().await?.as_deref() == Some(uid.as_str()) {
                    if before {
                        return Err(QueueError::NotFound(
                            "can not insert an item before the currently running item".to_string(),
                        ));
                    }
                    // "After the running item" is the front of the queue.
                    self.store.lpush(&self.keys.queue, &encoded).await?
                } else {
                    match self
                        .store
                        .linsert(&self.keys.queue, &pivot, &encoded, before)
                        .await?
                    {
                        Some(len) => len,
                        None => return Err(QueueError::PivotVanished),
                    }
                }
            }
            Place::Pos(pos) => {
                let len = qsize0 as i64;
                match pos {
                    Position::Back => self.store.rpush(&self.keys.queue, &encoded).await?,
                    Position::Front => self.store.lpush(&self.keys.queue, &encoded).await?,
                    // Out-of-range indices clamp to the nearest end.
                    Position::Index(i) if *i >= len => {
                        self.store.rpush(&self.keys.queue, &encoded).await?
                    }
                    Position::Index(i) if *i == 0 || *i <= -len => {
                        self.store.lpush(&self.keys.queue, &encoded).await?
                    }
                    Position::Index(i) => {
                        let displaced = self.item_at(Position::Index(*i)).await?;
                        match self
                            .store
                            .linsert(&self.keys.queue, &displaced.to_json(), &encoded, true)
                            .await?
                        {
                            Some(len) => len,
                            None => return Err(QueueError::PivotVanished),
                        }
                    }
                }
            }
        };

        state.index.add(item.clone())?;
        debug!(uid = item.uid().unwrap_or(""), qsize, "item added to queue");
        Ok((item, qsize))
    }

    async fn move_locked(
        &self,
        state: &mut ManagerState,
        source: &Select,
        destination: &Place,
    ) -> Result<(Item, usize), QueueError> {
        let qsize = self.queue_len().await?;

        let source_item = match self.get_locked(state, source).await {
            Ok(item) => item,
            Err(err @ QueueError::Store(_)) => return Err(err),
            Err(err) => {
                return Err(QueueError::NotFound(format!(
                    "source item ({}): {err}",
                    describe(source)
                )));
            }
        };
        let source_uid = source_item.uid().ok_or(ItemError::MissingUid)?.to_string();

        let running_uid = self.running_uid().await?;

        // Resolve the destination to a UID plus a before/after relation.
        let (dest_item, dest_uid, before) = match destination {
            Place::Before(uid) | Place::After(uid) => {
                let before = matches!(destination, Place::Before(_));
                if running_uid.as_deref() == Some(uid.as_str()) {
                    if before {
                        return Err(QueueError::NotFound(
                            "can not move an item before the currently running item".to_string(),
                        ));
                    }
                    // Moving after the running item lands at the queue
                    // front; the insert step below handles it.
                    (None, uid.clone(), before)
                } else {
                    let Some(item) = state.index.get(uid) else {
                        return Err(QueueError::NotFound(format!(
                            "destination item (uid '{uid}') is not in the queue"
                        )));
                    };
                    (Some(item.clone()), uid.clone(), before)
                }
            }
            Place::Pos(pos) => {
                let item = match self.get_locked(state, &Select::Pos(*pos)).await {
                    Ok(item) => item,
                    Err(err @ QueueError::Store(_)) => return Err(err),
                    Err(err) => {
                        return Err(QueueError::NotFound(format!(
                            "destination item (position {pos}): {err}"
                        )));
                    }
                };
                // Moving toward the front inserts before the destination,
                // toward the back after it; anything else drifts by one
                // because removing the source shifts later indices.
                let before = match pos {
                    Position::Front => true,
                    Position::Back => false,
                    Position::Index(_) => {
                        let source_index = match source {
                            Select::Pos(p) => p.resolved(qsize),
                            Select::Uid(uid) => self.index_of_uid(uid).await? as i64,
                        };
                        source_index > pos.resolved(qsize)
                    }
                };
                let uid = item.uid().ok_or(ItemError::MissingUid)?.to_string();
                (Some(item), uid, before)
            }
        };

        // Source and destination naming the same item is a valid no-op.
        if source_uid == dest_uid {
            return Ok((dest_item.unwrap_or(source_item), qsize));
        }

        // Remember where the source sat: if the re-insert below fails the
        // popped item is replayed there instead of being lost.
        let recover_at = self.index_of_uid(&source_uid).await? as i64;
        let (popped, _) = self.pop_locked(state, &Select::Uid(source_uid)).await?;

        let place = if before {
            Place::Before(dest_uid)
        } else {
            Place::After(dest_uid)
        };
        match self.add_locked(state, popped.clone(), place).await {
            Ok(moved) => Ok(moved),
            Err(err) => {
                if let Err(replay_err) = self
                    .add_locked(state, popped, Place::Pos(Position::Index(recover_at)))
                    .await
                {
                    error!(%replay_err, "failed to replay popped item after aborted move");
                }
                Err(err)
            }
        }
    }

    // ------------------------------------------------------------------
    // Startup reconciliation

    /// Repair leftover store state: queue records without a UID (including
    /// records that do not parse as items at all) are deleted, and a corrupt
    /// running-slot record clears the slot. This is the only place that
    /// repairs state without raising.
    async fn reconcile(&self) -> Result<(), QueueError> {
        for text in self.store.lrange_all(&self.keys.queue).await? {
            let valid = Item::from_json(&text).is_ok_and(|item| item.has_uid());
            if !valid {
                let removed = self.store.lrem_exact(&self.keys.queue, &text).await?;
                debug!(removed, "dropped unusable stored queue records");
            }
        }

        if let Some(text) = self.store.get(&self.keys.running).await? {
            let valid = Item::from_json(&text)
                .map(|item| item.is_empty() || item.has_uid())
                .unwrap_or(false);
            if !valid {
                self.store.delete(&self.keys.running).await?;
                debug!("cleared corrupt running-slot record");
            }
        }
        Ok(())
    }

    /// Rebuild the identity index by scanning the queue then the running
    /// slot, failing fast on any duplicate UID.
    async fn rebuild_index(&self, state: &mut ManagerState) -> Result<(), QueueError> {
        state.index.clear();
        for item in self.queue_snapshot().await? {
            state.index.add(item)?;
        }
        if let Some(item) = self.running_item().await? {
            state.index.add(item)?;
        }
        debug!(items = state.index.len(), "identity index rebuilt");
        Ok(())
    }
}
