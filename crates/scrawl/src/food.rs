//! Food lifecycle: a capacity-bounded pool maintained by a periodic
//! spawner, consumption arbitration, and the pool-state relay.

use std::sync::{Arc, Mutex, MutexGuard, PoisonError};

use rand::Rng;
use scrawl_bus::EventBus;
use scrawl_store::{ChangeKind, StateStore};
use scrawl_types::{FoodItem, FoodKey, paths};
use serde_json::Value;
use tokio::task::JoinHandle;
use tokio::time::{self, MissedTickBehavior};
use tracing::{debug, trace, warn};

use crate::{ArenaConfig, ArenaError, ArenaEvent, FoodDot};

pub(crate) struct FoodManager<S: StateStore> {
    store: Arc<S>,
    config: ArenaConfig,
    bus: EventBus<ArenaEvent>,
    spawner: Mutex<Option<JoinHandle<()>>>,
}

impl<S: StateStore> FoodManager<S> {
    pub(crate) fn new(store: Arc<S>, config: ArenaConfig, bus: EventBus<ArenaEvent>) -> Self {
        Self {
            store,
            config,
            bus,
            spawner: Mutex::new(None),
        }
    }

    fn spawner_slot(&self) -> MutexGuard<'_, Option<JoinHandle<()>>> {
        self.spawner.lock().unwrap_or_else(PoisonError::into_inner)
    }

    /// Starts the periodic spawner, aborting any previous one first.
    ///
    /// Each tick reads the pool once and appends at most one item when
    /// below the cap. The check-then-append is not atomic against other
    /// writers; transient overshoot by the number of racing writers is
    /// tolerated, not prevented.
    pub(crate) fn start_spawner(&self) {
        let mut slot = self.spawner_slot();
        if let Some(previous) = slot.take() {
            previous.abort();
        }

        let store = Arc::clone(&self.store);
        let cap = self.config.max_food_dots;
        let width = self.config.spawn_width;
        let height = self.config.spawn_height;
        let period = self.config.food_spawn_interval;

        *slot = Some(tokio::spawn(async move {
            // First tick fires one full period from now, not immediately.
            let mut ticker = time::interval_at(time::Instant::now() + period, period);
            ticker.set_missed_tick_behavior(MissedTickBehavior::Skip);
            loop {
                ticker.tick().await;
                if let Err(e) = spawn_one(store.as_ref(), cap, width, height).await {
                    warn!(error = %e, "food spawn failed");
                }
            }
        }));
        debug!(
            period_ms = period.as_millis() as u64,
            cap, "food spawner started"
        );
    }

    /// Aborts the spawner task, if running.
    pub(crate) fn stop_spawner(&self) {
        if let Some(handle) = self.spawner_slot().take() {
            handle.abort();
            debug!("food spawner stopped");
        }
    }

    /// Consumes a food item by its store key. Deleting a key another
    /// consumer already ate is a silent no-op.
    pub(crate) async fn eat(&self, key: &FoodKey) -> Result<(), ArenaError> {
        self.store.remove(&paths::food(key)).await?;
        Ok(())
    }

    /// Consumes the item at `index` of a one-shot pool snapshot.
    ///
    /// Positional addressing against a live pool is inherently racy: the
    /// snapshot may be stale by the time the delete is issued, hitting a
    /// key that is already gone or a neighbor of the intended item. An
    /// empty pool or out-of-range index is a silent no-op.
    pub(crate) async fn eat_at(&self, index: usize) -> Result<(), ArenaError> {
        let Some(pool) = self.store.get(paths::FOOD).await? else {
            return Ok(());
        };
        let Some(children) = pool.as_object() else {
            return Ok(());
        };
        let Some(key) = children.keys().nth(index) else {
            trace!(index, len = children.len(), "food index out of range — ignoring");
            return Ok(());
        };
        self.eat(&FoodKey(key.clone())).await
    }

    /// Arms the pool relay: every object value of the food subtree is
    /// re-emitted as [`ArenaEvent::FoodStateUpdated`] carrying the keyed
    /// pool in store iteration order.
    pub(crate) fn spawn_relay(&self) -> Result<JoinHandle<()>, ArenaError> {
        let mut watcher = self.store.watch(paths::FOOD, ChangeKind::ValueChanged)?;
        let bus = self.bus.clone();
        Ok(tokio::spawn(async move {
            while let Some(change) = watcher.recv().await {
                let Some(children) = change.value.as_object() else {
                    continue;
                };
                let mut dots = Vec::with_capacity(children.len());
                for (key, value) in children {
                    match serde_json::from_value::<FoodItem>(value.clone()) {
                        Ok(item) => dots.push(FoodDot {
                            key: FoodKey(key.clone()),
                            item,
                        }),
                        Err(e) => warn!(%key, error = %e, "malformed food record — skipping"),
                    }
                }
                bus.emit(&ArenaEvent::FoodStateUpdated(dots));
            }
        }))
    }
}

/// One spawner tick: count the pool, append one item if below the cap.
async fn spawn_one<S: StateStore>(
    store: &S,
    cap: usize,
    width: f64,
    height: f64,
) -> Result<(), ArenaError> {
    let pool = store.get(paths::FOOD).await?;
    let count = pool
        .as_ref()
        .and_then(Value::as_object)
        .map_or(0, serde_json::Map::len);
    if count >= cap {
        return Ok(());
    }

    let item = {
        let mut rng = rand::rng();
        FoodItem {
            x: rng.random_range(0.0..width),
            y: rng.random_range(0.0..height),
        }
    };
    let key = store.push(paths::FOOD, serde_json::to_value(item)?).await?;
    trace!(%key, count = count + 1, "food spawned");
    Ok(())
}
