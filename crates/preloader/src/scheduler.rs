#![forbid(unsafe_code)]

use crate::behavior::{BehaviorAnalyzer, BehaviorLog};
use crate::clock::Clock;
use crate::domain::{PreloadItem, PreloadStats, QueueId};
use crate::error::Error;
use crate::hint::ResourceHinter;
use crate::routes::RouteTable;
use crate::storage::KeyValueStore;
use crate::stores::{PreloadQueue, ResourceRegistry};
use config::Config;
use futures::future::join_all;
use std::sync::{Arc, Mutex, MutexGuard, PoisonError};
use tokio::runtime::Handle;
use tokio::sync::{Notify, mpsc};
use tracing::{debug, trace, warn};

pub struct Services {
    pub hinter: Arc<dyn ResourceHinter>,
    pub analyzer: Box<dyn BehaviorAnalyzer>,
    pub store: Arc<dyn KeyValueStore>,
    pub clock: Box<dyn Clock>,
}

/// Outcome counters of one processing pass.
#[derive(Debug, Default, Clone, Copy, PartialEq, Eq)]
pub struct PassReport {
    pub batches: usize,
    pub preloaded: usize,
    pub skipped: usize,
    pub failed: usize,
}

#[derive(Debug)]
enum Dispatch {
    Preloaded,
    Skipped,
    Failed(Error),
}

#[derive(Debug, Default)]
struct QueueState {
    registry: ResourceRegistry,
    queue: PreloadQueue,
    processing: bool,
}

#[derive(Debug)]
struct BehaviorState {
    log: BehaviorLog,
    version: u64,
}

/// Writes behavior snapshots in version order so a slow write can never
/// replace a newer log with an older one.
struct Persister {
    store: Arc<dyn KeyValueStore>,
    key: String,
    written: tokio::sync::Mutex<u64>,
}

impl Persister {
    async fn write(&self, version: u64, entries: &[String]) -> Result<(), Error> {
        let mut written = self.written.lock().await;
        if version <= *written {
            return Ok(());
        }
        let json = serde_json::to_string(entries)?;
        self.store.set(&self.key, &json).await?;
        *written = version;
        Ok(())
    }

    async fn run(self: Arc<Self>, mut rx: mpsc::UnboundedReceiver<(u64, Vec<String>)>) {
        while let Some(mut latest) = rx.recv().await {
            while let Ok(newer) = rx.try_recv() {
                latest = newer;
            }
            let (version, entries) = latest;
            if let Err(err) = self.write(version, &entries).await {
                debug!(%err, "behavior log not persisted");
            }
        }
    }
}

struct Inner {
    settings: config::Scheduler,
    routes: RouteTable,
    hinter: Arc<dyn ResourceHinter>,
    analyzer: Box<dyn BehaviorAnalyzer>,
    clock: Box<dyn Clock>,
    runtime: Handle,
    state: Mutex<QueueState>,
    behavior: Mutex<BehaviorState>,
    persister: Arc<Persister>,
    persist_tx: mpsc::UnboundedSender<(u64, Vec<String>)>,
    idle: Notify,
}

/// Priority-ordered, deduplicated, batched background preloader.
///
/// Cloning yields another handle to the same scheduler. None of the public
/// operations block; dispatch happens on the tokio runtime that was current
/// when the scheduler was built.
#[derive(Clone)]
pub struct PreloadScheduler {
    inner: Arc<Inner>,
}

impl PreloadScheduler {
    /// Build a scheduler. Must be called from within a tokio runtime.
    pub fn new(config: &Config, services: Services) -> Result<Self, Error> {
        let runtime = Handle::try_current().map_err(|_| Error::NoRuntime)?;

        let persister = Arc::new(Persister {
            store: services.store,
            key: config.behavior.storage_key.clone(),
            written: tokio::sync::Mutex::new(0),
        });
        let (persist_tx, persist_rx) = mpsc::unbounded_channel();
        runtime.spawn(persister.clone().run(persist_rx));

        let inner = Inner {
            settings: config.scheduler.clone(),
            routes: RouteTable::new(config),
            hinter: services.hinter,
            analyzer: services.analyzer,
            clock: services.clock,
            runtime,
            state: Mutex::new(QueueState::default()),
            behavior: Mutex::new(BehaviorState {
                log: BehaviorLog::new(config.behavior.capacity),
                version: 0,
            }),
            persister,
            persist_tx,
            idle: Notify::new(),
        };
        Ok(Self {
            inner: Arc::new(inner),
        })
    }

    /// Queue an item unless its url was already preloaded or is pending.
    /// Starts a processing pass when none is running.
    pub fn enqueue(&self, item: PreloadItem) {
        self.enqueue_all([item]);
    }

    /// Queue several items at once. The whole group is visible to the pass
    /// it starts, so its priorities are honored even when the drain task
    /// runs on another worker.
    pub fn enqueue_all(&self, items: impl IntoIterator<Item = PreloadItem>) {
        let start = {
            let mut state = self.inner.lock_state();
            let mut added = 0;
            for item in items {
                if state.registry.has(item.url.as_str()) {
                    trace!(url = %item.url, "already preloaded");
                    continue;
                }
                let url = item.url.clone();
                if state.queue.push(item).is_none() {
                    trace!(%url, "already queued");
                    continue;
                }
                added += 1;
            }
            added > 0 && !std::mem::replace(&mut state.processing, true)
        };

        if start {
            self.spawn_drain();
        }
    }

    /// Start a pass over whatever is queued. Returns `false` when a pass is
    /// already running or the queue is empty.
    pub fn process(&self) -> bool {
        let start = {
            let mut state = self.inner.lock_state();
            !state.queue.is_empty() && !std::mem::replace(&mut state.processing, true)
        };
        if start {
            self.spawn_drain();
        }
        start
    }

    /// Run passes until nothing is left in the queue.
    pub async fn flush(&self) {
        loop {
            self.wait_idle().await;
            if self.inner.lock_state().queue.is_empty() {
                return;
            }
            self.process();
        }
    }

    /// Warm the resources every page needs. Meant to run once at startup.
    pub fn preload_critical(&self) {
        self.enqueue_all(self.inner.routes.critical().iter().cloned());
    }

    /// Warm the bundle of `route`. Unknown routes are ignored.
    pub fn preload_on_intent(&self, route: &str) {
        let Some(bundle) = self.inner.routes.route(route) else {
            debug!(route, "no bundle for route");
            return;
        };
        self.enqueue_all(bundle.iter().cloned());
    }

    /// Predict intents from a caller-maintained interaction list and warm
    /// their bundles. The stored behavior log is neither read nor changed.
    pub fn preload_on_behavior<S: AsRef<str>>(&self, interactions: &[S]) {
        let refs: Vec<&str> = interactions.iter().map(AsRef::as_ref).collect();
        let intents = self.inner.analyzer.predict(&refs);
        let items: Vec<PreloadItem> = intents
            .into_iter()
            .filter_map(|intent| {
                debug!(%intent, "intent predicted");
                self.inner.routes.route(intent.route())
            })
            .flatten()
            .cloned()
            .collect();
        self.enqueue_all(items);
    }

    /// Append `name` to the behavior log, persist it in the background and
    /// warm whatever the updated log predicts.
    pub fn record_interaction(&self, name: impl Into<String>) {
        let (version, snapshot) = {
            let mut behavior = self.inner.lock_behavior();
            behavior.log.record(name);
            behavior.version += 1;
            (behavior.version, behavior.log.to_vec())
        };
        if self
            .inner
            .persist_tx
            .send((version, snapshot.clone()))
            .is_err()
        {
            debug!("behavior persistence worker stopped");
        }
        self.preload_on_behavior(&snapshot);
    }

    /// Load the persisted behavior log, placing it before anything recorded
    /// in this session. Returns the resulting log length.
    pub async fn restore_behavior(&self) -> Result<usize, Error> {
        let persister = &self.inner.persister;
        let Some(json) = persister.store.get(&persister.key).await? else {
            return Ok(self.inner.lock_behavior().log.len());
        };
        let restored: Vec<String> = serde_json::from_str(&json)?;

        let (version, snapshot) = {
            let mut behavior = self.inner.lock_behavior();
            let current = behavior.log.to_vec();
            behavior.log.restore(restored.into_iter().chain(current));
            behavior.version += 1;
            (behavior.version, behavior.log.to_vec())
        };
        let len = snapshot.len();
        if self.inner.persist_tx.send((version, snapshot)).is_err() {
            debug!("behavior persistence worker stopped");
        }
        Ok(len)
    }

    /// Write the current behavior log to the store now.
    pub async fn sync_behavior(&self) -> Result<(), Error> {
        let (version, snapshot) = {
            let behavior = self.inner.lock_behavior();
            (behavior.version, behavior.log.to_vec())
        };
        self.inner.persister.write(version, &snapshot).await
    }

    pub fn behavior_log(&self) -> Vec<String> {
        self.inner.lock_behavior().log.to_vec()
    }

    pub fn is_preloaded(&self, url: &str) -> bool {
        self.inner.lock_state().registry.has(url)
    }

    pub fn is_processing(&self) -> bool {
        self.inner.lock_state().processing
    }

    pub fn stats(&self) -> PreloadStats {
        let state = self.inner.lock_state();
        PreloadStats::new(state.registry.len(), state.queue.len())
    }

    /// Forget every preloaded url and drop everything queued. Items of a
    /// batch already in flight settle without being recorded.
    pub fn clear_cache(&self) {
        let mut state = self.inner.lock_state();
        state.registry.clear();
        state.queue.clear();
    }

    fn spawn_drain(&self) {
        let inner = self.inner.clone();
        self.inner.runtime.spawn(inner.drain());
    }

    /// Resolves once no processing pass is running.
    pub async fn wait_idle(&self) {
        loop {
            let notified = self.inner.idle.notified();
            if !self.is_processing() {
                return;
            }
            notified.await;
        }
    }
}

impl Inner {
    fn lock_state(&self) -> MutexGuard<'_, QueueState> {
        self.state.lock().unwrap_or_else(PoisonError::into_inner)
    }

    fn lock_behavior(&self) -> MutexGuard<'_, BehaviorState> {
        self.behavior.lock().unwrap_or_else(PoisonError::into_inner)
    }

    async fn drain(self: Arc<Self>) {
        loop {
            let started = self.clock.now();
            let report = self.run_pass().await;
            let elapsed = self.clock.now().saturating_duration_since(started);
            debug!(?report, ?elapsed, "preload pass finished");

            let again = {
                let mut state = self.lock_state();
                let again = self.settings.auto_drain && !state.queue.is_empty();
                if !again {
                    state.processing = false;
                }
                again
            };
            if !again {
                break;
            }
        }
        self.idle.notify_waiters();
    }

    /// One pass over a snapshot of the queue: buckets high to low, each in
    /// batches that settle completely before the next batch starts.
    async fn run_pass(&self) -> PassReport {
        let buckets = self.lock_state().queue.buckets();
        let batch_size = self.settings.effective_batch_size();
        let mut report = PassReport::default();

        for bucket in buckets {
            trace!(priority = %bucket.priority, len = bucket.entries.len(), "bucket started");
            for batch in bucket.entries.chunks(batch_size) {
                let outcomes = join_all(batch.iter().map(|(id, item)| self.dispatch(*id, item))).await;

                {
                    let mut state = self.lock_state();
                    for ((id, item), outcome) in batch.iter().zip(outcomes) {
                        let still_queued = state.queue.remove(*id).is_some();
                        match outcome {
                            Dispatch::Preloaded if still_queued => {
                                state.registry.mark_done(item.url.clone());
                                report.preloaded += 1;
                            }
                            Dispatch::Preloaded | Dispatch::Skipped => report.skipped += 1,
                            Dispatch::Failed(err) => {
                                warn!(url = %item.url, kind = %item.kind, %err, "preload failed");
                                report.failed += 1;
                            }
                        }
                    }
                }
                report.batches += 1;

                if !self.settings.batch_pause.is_zero() {
                    self.clock.sleep(self.settings.batch_pause).await;
                }
            }
        }
        report
    }

    async fn dispatch(&self, id: QueueId, item: &PreloadItem) -> Dispatch {
        {
            let state = self.lock_state();
            if state.queue.get(id).is_none() || state.registry.has(item.url.as_str()) {
                return Dispatch::Skipped;
            }
        }

        let result = match self.settings.dispatch_timeout {
            Some(timeout) => tokio::time::timeout(timeout, self.hinter.schedule(item))
                .await
                .unwrap_or_else(|_| {
                    Err(Error::Timeout {
                        url: item.url.to_string(),
                        timeout,
                    })
                }),
            None => self.hinter.schedule(item).await,
        };
        match result {
            Ok(()) => Dispatch::Preloaded,
            Err(err) => Dispatch::Failed(err),
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::behavior::MarkerAnalyzer;
    use crate::clock::SystemClock;
    use crate::storage::{MemoryStore, NoopStore};
    use async_trait::async_trait;
    use config::{Priority, ResourceKind};
    use std::sync::atomic::{AtomicUsize, Ordering};
    use std::time::Duration;
    use tokio::sync::Semaphore;

    /// Holds every dispatch until a permit is released.
    struct GatedHinter {
        gate: Semaphore,
        calls: AtomicUsize,
    }

    #[async_trait]
    impl ResourceHinter for GatedHinter {
        async fn schedule(&self, _item: &PreloadItem) -> Result<(), Error> {
            self.calls.fetch_add(1, Ordering::SeqCst);
            let permit = self.gate.acquire().await.map_err(|err| Error::Hint {
                url: String::new(),
                reason: err.to_string(),
            })?;
            permit.forget();
            Ok(())
        }
    }

    fn services(hinter: Arc<dyn ResourceHinter>, store: Arc<dyn KeyValueStore>) -> Services {
        Services {
            hinter,
            analyzer: Box::new(MarkerAnalyzer),
            store,
            clock: Box::new(SystemClock),
        }
    }

    async fn wait_for_calls(hinter: &GatedHinter, calls: usize) {
        while hinter.calls.load(Ordering::SeqCst) < calls {
            tokio::task::yield_now().await;
        }
    }

    #[test]
    fn new_requires_a_runtime() {
        let hinter = Arc::new(crate::hint::NoopHinter);
        let result = PreloadScheduler::new(&Config::default(), services(hinter, Arc::new(NoopStore)));
        assert!(matches!(result, Err(Error::NoRuntime)));
    }

    #[tokio::test(start_paused = true)]
    async fn items_enqueued_mid_pass_wait_for_the_next_enqueue() {
        let hinter = Arc::new(GatedHinter {
            gate: Semaphore::new(0),
            calls: AtomicUsize::new(0),
        });
        let scheduler =
            PreloadScheduler::new(&Config::default(), services(hinter.clone(), Arc::new(NoopStore)))
                .unwrap();

        scheduler.enqueue(PreloadItem::script("/a.js", Priority::High));
        scheduler.enqueue(PreloadItem::script("/b.js", Priority::High));
        wait_for_calls(&hinter, 2).await;

        for url in ["/c.js", "/d.js", "/e.js"] {
            scheduler.enqueue(PreloadItem::script(url, Priority::Low));
        }
        hinter.gate.add_permits(2);
        scheduler.wait_idle().await;

        let stats = scheduler.stats();
        assert_eq!(stats.preloaded_count, 2);
        assert_eq!(stats.queue_length, 3);
        assert!((stats.hit_rate - 2.0 / 5.0).abs() < f64::EPSILON);
        assert_eq!(hinter.calls.load(Ordering::SeqCst), 2);
        assert!(!scheduler.is_processing());

        hinter.gate.add_permits(4);
        scheduler.enqueue(PreloadItem::style("/f.css", Priority::Low));
        scheduler.wait_idle().await;
        assert_eq!(scheduler.stats(), PreloadStats::new(6, 0));
    }

    #[tokio::test(start_paused = true)]
    async fn auto_drain_picks_up_late_items() {
        let mut config = Config::default();
        config.scheduler.auto_drain = true;
        let hinter = Arc::new(GatedHinter {
            gate: Semaphore::new(0),
            calls: AtomicUsize::new(0),
        });
        let scheduler =
            PreloadScheduler::new(&config, services(hinter.clone(), Arc::new(NoopStore))).unwrap();

        scheduler.enqueue(PreloadItem::script("/a.js", Priority::Medium));
        wait_for_calls(&hinter, 1).await;
        scheduler.enqueue(PreloadItem::script("/b.js", Priority::Medium));
        hinter.gate.add_permits(2);
        scheduler.wait_idle().await;

        assert_eq!(scheduler.stats(), PreloadStats::new(2, 0));
    }

    #[tokio::test(start_paused = true)]
    async fn clear_cache_during_flight_records_nothing() {
        let hinter = Arc::new(GatedHinter {
            gate: Semaphore::new(0),
            calls: AtomicUsize::new(0),
        });
        let scheduler =
            PreloadScheduler::new(&Config::default(), services(hinter.clone(), Arc::new(NoopStore)))
                .unwrap();

        for url in ["/a.js", "/b.js", "/c.js", "/d.js"] {
            scheduler.enqueue(PreloadItem::script(url, Priority::High));
        }
        wait_for_calls(&hinter, 3).await;
        scheduler.clear_cache();
        hinter.gate.add_permits(3);
        scheduler.wait_idle().await;

        assert_eq!(scheduler.stats(), PreloadStats::new(0, 0));
        assert_eq!(hinter.calls.load(Ordering::SeqCst), 3);
        assert!(!scheduler.is_preloaded("/a.js"));
    }

    #[tokio::test(start_paused = true)]
    async fn restore_prepends_persisted_log() {
        let store = Arc::new(MemoryStore::default());
        store
            .set("preload-behavior", r#"["old-1","old-2"]"#)
            .await
            .unwrap();
        let hinter = Arc::new(crate::hint::NoopHinter);
        let scheduler =
            PreloadScheduler::new(&Config::default(), services(hinter, store.clone())).unwrap();

        scheduler.record_interaction("new-1");
        assert_eq!(scheduler.restore_behavior().await.unwrap(), 3);
        assert_eq!(scheduler.behavior_log(), vec!["old-1", "old-2", "new-1"]);
    }

    #[tokio::test(start_paused = true)]
    async fn sync_behavior_persists_latest_log() {
        let store = Arc::new(MemoryStore::default());
        let hinter = Arc::new(crate::hint::NoopHinter);
        let scheduler =
            PreloadScheduler::new(&Config::default(), services(hinter, store.clone())).unwrap();

        scheduler.record_interaction("scroll");
        scheduler.record_interaction("place-card-hover");
        scheduler.sync_behavior().await.unwrap();
        tokio::task::yield_now().await;

        let json = store.get("preload-behavior").await.unwrap().unwrap();
        let persisted: Vec<String> = serde_json::from_str(&json).unwrap();
        assert_eq!(persisted, vec!["scroll", "place-card-hover"]);
        scheduler.wait_idle().await;
        assert!(scheduler.is_preloaded("/assets/places.js"));
    }

    /// Store whose every call fails.
    struct BrokenStore;

    #[async_trait]
    impl KeyValueStore for BrokenStore {
        async fn get(&self, _key: &str) -> Result<Option<String>, Error> {
            Err(Error::Io(std::io::Error::other("disk unavailable")))
        }

        async fn set(&self, _key: &str, _value: &str) -> Result<(), Error> {
            Err(Error::Io(std::io::Error::other("disk unavailable")))
        }
    }

    #[tokio::test(start_paused = true)]
    async fn storage_failures_leave_the_scheduler_working() {
        let hinter = Arc::new(crate::hint::NoopHinter);
        let scheduler =
            PreloadScheduler::new(&Config::default(), services(hinter, Arc::new(BrokenStore)))
                .unwrap();

        assert!(matches!(scheduler.restore_behavior().await, Err(Error::Io(_))));
        assert!(scheduler.behavior_log().is_empty());

        scheduler.record_interaction("search-input-focus");
        scheduler.wait_idle().await;
        assert_eq!(scheduler.behavior_log(), vec!["search-input-focus"]);
        assert!(scheduler.is_preloaded("/assets/places.js"));

        assert!(matches!(scheduler.sync_behavior().await, Err(Error::Io(_))));

        scheduler.record_interaction("planner-cta-hover");
        scheduler.wait_idle().await;
        assert_eq!(scheduler.behavior_log().len(), 2);
        assert!(scheduler.is_preloaded("/assets/planner.js"));
    }

    #[tokio::test(start_paused = true)]
    async fn flush_runs_passes_until_the_queue_is_empty() {
        let hinter = Arc::new(GatedHinter {
            gate: Semaphore::new(0),
            calls: AtomicUsize::new(0),
        });
        let scheduler =
            PreloadScheduler::new(&Config::default(), services(hinter.clone(), Arc::new(NoopStore)))
                .unwrap();

        scheduler.enqueue(PreloadItem::script("/a.js", Priority::High));
        wait_for_calls(&hinter, 1).await;
        scheduler.enqueue(PreloadItem::script("/b.js", Priority::High));
        scheduler.enqueue(PreloadItem::script("/c.js", Priority::Low));
        assert!(!scheduler.process());

        hinter.gate.add_permits(3);
        scheduler.flush().await;

        assert_eq!(scheduler.stats(), PreloadStats::new(3, 0));
        assert!(!scheduler.process());
    }

    #[tokio::test(start_paused = true)]
    async fn timeout_settles_hanging_dispatch() {
        struct HangingHinter;

        #[async_trait]
        impl ResourceHinter for HangingHinter {
            async fn schedule(&self, item: &PreloadItem) -> Result<(), Error> {
                if item.kind == ResourceKind::Font {
                    std::future::pending::<()>().await;
                }
                Ok(())
            }
        }

        let mut config = Config::default();
        config.scheduler.dispatch_timeout = Some(Duration::from_secs(5));
        let scheduler =
            PreloadScheduler::new(&config, services(Arc::new(HangingHinter), Arc::new(NoopStore)))
                .unwrap();

        scheduler.preload_critical();
        scheduler.wait_idle().await;

        assert!(!scheduler.is_preloaded("/fonts/inter-var.woff2"));
        assert!(scheduler.is_preloaded("/assets/app.css"));
        assert_eq!(scheduler.stats(), PreloadStats::new(3, 0));
    }
}
