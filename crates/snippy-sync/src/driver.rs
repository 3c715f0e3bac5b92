//! Event loop around the synchronizer
//!
//! The synchronizer is only ever touched from the task that owns the driver.
//! Each fetch runs as its own tokio task and reports back through the event
//! channel, so navigation can keep arriving while a fetch is outstanding.

use std::sync::Arc;

use snippy_client::ListFetcher;
use snippy_core::FilterAction;
use tokio::sync::{mpsc, watch};
use tracing::debug;

use crate::navigator::Navigator;
use crate::synchronizer::{FetchCompletion, FilterStateSynchronizer, PendingFetch, Transition};
use crate::view::Snapshot;

#[derive(Debug)]
pub enum DriverEvent {
    /// The address changed to this query string (typed URL, shared link)
    Navigated(String),
    Action(FilterAction),
    Retry,
    CredentialsReady,
    Completed(FetchCompletion),
}

/// Cloneable sender for UI-side events
#[derive(Debug, Clone)]
pub struct DriverHandle {
    tx: mpsc::UnboundedSender<DriverEvent>,
}

impl DriverHandle {
    pub fn navigated(&self, search: impl Into<String>) {
        self.send(DriverEvent::Navigated(search.into()));
    }

    pub fn action(&self, action: FilterAction) {
        self.send(DriverEvent::Action(action));
    }

    pub fn retry(&self) {
        self.send(DriverEvent::Retry);
    }

    pub fn credentials_ready(&self) {
        self.send(DriverEvent::CredentialsReady);
    }

    fn send(&self, event: DriverEvent) {
        if self.tx.send(event).is_err() {
            debug!("driver is gone, dropping event");
        }
    }
}

pub struct SyncDriver<N> {
    sync: FilterStateSynchronizer<N>,
    fetcher: Arc<dyn ListFetcher>,
    tx: mpsc::UnboundedSender<DriverEvent>,
    rx: mpsc::UnboundedReceiver<DriverEvent>,
    in_flight: usize,
    snapshots: watch::Sender<Snapshot>,
}

impl<N: Navigator> SyncDriver<N> {
    pub fn new(sync: FilterStateSynchronizer<N>, fetcher: Arc<dyn ListFetcher>) -> Self {
        let (tx, rx) = mpsc::unbounded_channel();
        let (snapshots, _) = watch::channel(sync.snapshot());
        Self {
            sync,
            fetcher,
            tx,
            rx,
            in_flight: 0,
            snapshots,
        }
    }

    pub fn handle(&self) -> DriverHandle {
        DriverHandle {
            tx: self.tx.clone(),
        }
    }

    /// Receive every published snapshot
    pub fn subscribe(&self) -> watch::Receiver<Snapshot> {
        self.snapshots.subscribe()
    }

    pub fn synchronizer(&self) -> &FilterStateSynchronizer<N> {
        &self.sync
    }

    pub fn synchronizer_mut(&mut self) -> &mut FilterStateSynchronizer<N> {
        &mut self.sync
    }

    /// Number of fetch tasks that have not reported back yet
    pub fn in_flight(&self) -> usize {
        self.in_flight
    }

    /// Sync to the navigator's current location
    pub fn start(&mut self) {
        let pending = self.sync.start();
        self.spawn(pending);
        self.publish();
    }

    /// Process events until no fetch is outstanding and the queue is empty
    pub async fn run_until_idle(&mut self) -> Snapshot {
        loop {
            let event = if self.in_flight == 0 {
                match self.rx.try_recv() {
                    Ok(event) => event,
                    Err(_) => break,
                }
            } else {
                match self.rx.recv().await {
                    Some(event) => event,
                    None => break,
                }
            };
            self.handle_event(event);
        }
        self.sync.snapshot()
    }

    fn handle_event(&mut self, event: DriverEvent) {
        let pending = match event {
            DriverEvent::Navigated(search) => self.sync.on_location_change(&search),
            DriverEvent::Action(action) => self.sync.dispatch(action),
            DriverEvent::Retry => self.sync.retry(),
            DriverEvent::CredentialsReady => self.sync.credentials_ready(),
            DriverEvent::Completed(completion) => {
                self.in_flight = self.in_flight.saturating_sub(1);
                match self.sync.on_fetch_complete(completion) {
                    Transition::Clamped(pending) => pending,
                    Transition::Settled => None,
                    // nothing changed, nothing to publish
                    Transition::Stale => return,
                }
            }
        };
        self.spawn(pending);
        self.publish();
    }

    fn spawn(&mut self, pending: Option<PendingFetch>) {
        let Some(pending) = pending else {
            return;
        };
        debug!(query = %pending.query(), "spawning fetch");

        self.in_flight += 1;
        let fetcher = Arc::clone(&self.fetcher);
        let tx = self.tx.clone();
        tokio::spawn(async move {
            let completion = pending.run(fetcher.as_ref()).await;
            // receiver only goes away with the driver
            let _ = tx.send(DriverEvent::Completed(completion));
        });
    }

    fn publish(&self) {
        self.snapshots.send_replace(self.sync.snapshot());
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::navigator::MemoryHistory;
    use crate::view::{ListView, Phase};
    use async_trait::async_trait;
    use snippy_client::{Credential, FetchError, StaticCredentials};
    use snippy_core::{FilterSet, PageResult, Snippet};

    /// Serves `total_pages` pages, one item per page titled by page number
    struct PagedFetcher {
        total_pages: u32,
    }

    #[async_trait]
    impl ListFetcher for PagedFetcher {
        async fn fetch(
            &self,
            filters: &FilterSet,
            credential: Option<&Credential>,
        ) -> Result<PageResult, FetchError> {
            if credential.is_none() {
                return Err(FetchError::Unauthenticated);
            }
            let mut page = PageResult::empty(filters);
            page.total_pages = self.total_pages;
            page.total_items = u64::from(self.total_pages);
            if filters.page <= self.total_pages {
                page.items.push(Snippet::new(format!("page {}", filters.page)));
            }
            Ok(page)
        }
    }

    fn driver(search: &str, total_pages: u32) -> SyncDriver<MemoryHistory> {
        let creds = Arc::new(StaticCredentials::new(Some(Credential::new("t"))));
        let sync = FilterStateSynchronizer::new(MemoryHistory::at("/snippets", search), creds);
        SyncDriver::new(sync, Arc::new(PagedFetcher { total_pages }))
    }

    #[tokio::test]
    async fn test_start_and_settle() {
        let mut driver = driver("page=2", 3);
        driver.start();
        assert_eq!(driver.in_flight(), 1);

        let snapshot = driver.run_until_idle().await;
        assert_eq!(snapshot.phase, Phase::Idle);
        let ListView::Loaded(page) = snapshot.view() else {
            panic!("expected a loaded page");
        };
        assert_eq!(page.items[0].title, "page 2");
        assert_eq!(driver.in_flight(), 0);
    }

    #[tokio::test]
    async fn test_clamp_runs_corrective_fetch() {
        let mut driver = driver("page=7", 3);
        driver.start();

        let snapshot = driver.run_until_idle().await;
        assert_eq!(snapshot.filters.page, 3);
        assert_eq!(snapshot.query, "page=3");
        assert_eq!(driver.synchronizer().navigator().replace_count(), 1);
        assert_eq!(driver.synchronizer().navigator().location().search, "page=3");
    }

    #[tokio::test]
    async fn test_actions_through_handle() {
        let mut driver = driver("", 5);
        let handle = driver.handle();
        let mut snapshots = driver.subscribe();
        driver.start();
        driver.run_until_idle().await;

        handle.action(FilterAction::NextPage);
        handle.action(FilterAction::NextPage);
        let snapshot = driver.run_until_idle().await;

        assert_eq!(snapshot.filters.page, 3);
        assert_eq!(driver.synchronizer().navigator().push_count(), 2);
        assert!(snapshots.has_changed().unwrap());
        assert_eq!(snapshots.borrow_and_update().query, "page=3");
    }

    #[tokio::test]
    async fn test_navigation_event() {
        let mut driver = driver("", 5);
        let handle = driver.handle();
        driver.start();
        driver.run_until_idle().await;

        handle.navigated("?page=4&tags=a&tags=a");
        let snapshot = driver.run_until_idle().await;
        assert_eq!(snapshot.filters.tags, vec!["a"]);
        assert_eq!(snapshot.filters.page, 4);
    }

    #[tokio::test]
    async fn test_navigation_keeps_history_in_step() {
        let mut driver = driver("", 5);
        let handle = driver.handle();
        driver.start();
        driver.run_until_idle().await;

        handle.navigated("page=2");
        let snapshot = driver.run_until_idle().await;
        assert_eq!(driver.synchronizer().navigator().location().search, snapshot.query);

        handle.action(FilterAction::NextPage);
        driver.run_until_idle().await;

        let mut history = driver.synchronizer().navigator().clone();
        assert_eq!(history.location().search, "page=3");
        assert_eq!(history.back().unwrap().search, "page=2");
        assert_eq!(history.back().unwrap().search, "");
    }

    #[tokio::test]
    async fn test_clamp_after_navigation_keeps_back_stop() {
        let mut driver = driver("tags=a", 3);
        let handle = driver.handle();
        driver.start();
        driver.run_until_idle().await;

        handle.navigated("page=9");
        let snapshot = driver.run_until_idle().await;
        assert_eq!(snapshot.query, "page=3");

        let mut history = driver.synchronizer().navigator().clone();
        assert_eq!(history.len(), 2);
        assert_eq!(history.location().search, "page=3");
        assert_eq!(history.back().unwrap().search, "tags=a");
    }
}
