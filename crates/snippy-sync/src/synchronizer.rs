//! Filter-state synchronizer
//!
//! State machine per navigation:
//!
//! ```text
//! Idle -> Decoding -> Fetching -> Idle
//!                         |
//!                         +-> Clamping -> (replace URL) -> Decoding -> ...
//! ```
//!
//! The URL is the source of truth. Deliberate filter edits push a history
//! entry; clamps replace the current one so an invalid page never becomes a
//! back-button stop.
//!
//! Responses are matched to the current state by filter identity (the encoded
//! query), so a response for filters the user has since navigated away from is
//! dropped even if it arrives last.

use std::sync::Arc;

use snippy_client::{Credential, CredentialProvider, FetchError, ListFetcher};
use snippy_core::{FilterAction, FilterSet, PageResult, query};
use tracing::{debug, info, trace, warn};

use crate::navigator::Navigator;
use crate::view::{FailureKind, Phase, Snapshot};

pub const DEFAULT_MAX_CLAMP_ATTEMPTS: u32 = 2;

/// A fetch the synchronizer wants run
#[derive(Debug, Clone)]
pub struct PendingFetch {
    filters: FilterSet,
    query: String,
    credential: Option<Credential>,
}

impl PendingFetch {
    pub fn filters(&self) -> &FilterSet {
        &self.filters
    }

    pub fn query(&self) -> &str {
        &self.query
    }

    /// Run the fetch and package the outcome for `on_fetch_complete`
    pub async fn run<F: ListFetcher + ?Sized>(self, fetcher: &F) -> FetchCompletion {
        let outcome = fetcher
            .fetch(&self.filters, self.credential.as_ref())
            .await;
        self.complete(outcome)
    }

    /// Package an outcome obtained some other way
    pub fn complete(self, outcome: Result<PageResult, FetchError>) -> FetchCompletion {
        FetchCompletion {
            filters: self.filters,
            query: self.query,
            outcome,
        }
    }
}

/// The resolved outcome of a `PendingFetch`
#[derive(Debug, Clone)]
pub struct FetchCompletion {
    pub filters: FilterSet,
    pub query: String,
    pub outcome: Result<PageResult, FetchError>,
}

/// What `on_fetch_complete` did with a completion
#[derive(Debug)]
pub enum Transition {
    /// Published; now idle
    Settled,
    /// Completion no longer matches the URL; dropped
    Stale,
    /// Page was out of range; the URL was replaced and this corrective fetch
    /// is due (None when deferred on credentials)
    Clamped(Option<PendingFetch>),
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
enum Origin {
    Navigation,
    Clamp,
}

pub struct FilterStateSynchronizer<N> {
    navigator: N,
    credentials: Arc<dyn CredentialProvider>,
    max_clamp_attempts: u32,

    phase: Phase,
    filters: FilterSet,
    query: String,
    /// Query the published result was fetched for
    settled_query: Option<String>,
    result: Option<PageResult>,
    failure: Option<FailureKind>,
    clamp_attempts: u32,
}

impl<N: Navigator> FilterStateSynchronizer<N> {
    pub fn new(navigator: N, credentials: Arc<dyn CredentialProvider>) -> Self {
        Self {
            navigator,
            credentials,
            max_clamp_attempts: DEFAULT_MAX_CLAMP_ATTEMPTS,
            phase: Phase::Idle,
            filters: FilterSet::default(),
            query: String::new(),
            settled_query: None,
            result: None,
            failure: None,
            clamp_attempts: 0,
        }
    }

    /// Bound consecutive clamps, in case `total_pages` keeps shrinking
    pub fn with_max_clamp_attempts(mut self, attempts: u32) -> Self {
        self.max_clamp_attempts = attempts;
        self
    }

    pub fn navigator(&self) -> &N {
        &self.navigator
    }

    pub fn navigator_mut(&mut self) -> &mut N {
        &mut self.navigator
    }

    pub fn phase(&self) -> Phase {
        self.phase
    }

    pub fn filters(&self) -> &FilterSet {
        &self.filters
    }

    pub fn result(&self) -> Option<&PageResult> {
        self.result.as_ref()
    }

    pub fn failure(&self) -> Option<FailureKind> {
        self.failure
    }

    pub fn snapshot(&self) -> Snapshot {
        Snapshot {
            phase: self.phase,
            filters: self.filters.clone(),
            query: self.query.clone(),
            result: self.result.clone(),
            failure: self.failure,
        }
    }

    /// Initial sync from whatever the navigator currently shows
    pub fn start(&mut self) -> Option<PendingFetch> {
        self.resync()
    }

    /// Re-read the navigator's location, e.g. after back/forward
    pub fn resync(&mut self) -> Option<PendingFetch> {
        let search = self.navigator.location().search;
        self.on_location_change(&search)
    }

    /// The URL changed (navigation, address edit, shared link)
    ///
    /// A query the navigator does not show yet is recorded as a new history
    /// entry first, so later pushes and clamps land on the right entry.
    pub fn on_location_change(&mut self, search: &str) -> Option<PendingFetch> {
        let search = search.strip_prefix('?').unwrap_or(search);
        let current = self.navigator.location();
        if current.search != search {
            debug!(from = %current.search, to = %search, "recording address change");
            self.navigator.push(&current.path, search);
        }
        self.sync_location(search, Origin::Navigation)
    }

    /// Apply a user filter edit: push the new URL and sync to it
    pub fn dispatch(&mut self, action: FilterAction) -> Option<PendingFetch> {
        let next = self.filters.apply(action);
        let search = query::encode(&next);
        if search == self.query {
            debug!(query = %search, "filter edit left the query unchanged");
            return None;
        }

        let path = self.navigator.location().path;
        self.navigator.push(&path, &search);
        self.sync_location(&search, Origin::Navigation)
    }

    /// Refetch the current filters (the view's retry affordance)
    pub fn retry(&mut self) -> Option<PendingFetch> {
        if self.phase != Phase::Idle {
            return None;
        }
        debug!(query = %self.query, "retrying");
        self.begin_fetch()
    }

    /// The credential provider finished loading
    pub fn credentials_ready(&mut self) -> Option<PendingFetch> {
        if self.phase != Phase::AwaitingCredential {
            return None;
        }
        self.begin_fetch()
    }

    pub fn on_fetch_complete(&mut self, completion: FetchCompletion) -> Transition {
        if self.phase != Phase::Fetching || completion.query != self.query {
            debug!(
                stale = %completion.query,
                current = %self.query,
                "discarding stale response"
            );
            return Transition::Stale;
        }

        match completion.outcome {
            Ok(page) => {
                let requested = self.filters.page;
                let target = if page.total_pages >= 1 && requested > page.total_pages {
                    Some(page.total_pages)
                } else if page.page != requested && !page.page_in_range() {
                    Some(page.page.clamp(1, page.total_pages.max(1)))
                } else {
                    None
                };

                match target {
                    Some(target) if target != requested => self.clamp(page, target),
                    Some(_) => {
                        warn!(
                            page = page.page,
                            total_pages = page.total_pages,
                            "server reported a page outside its range, keeping the requested page"
                        );
                        self.settle(
                            PageResult {
                                page: requested,
                                ..page
                            },
                            None,
                        )
                    }
                    None => self.settle(page, None),
                }
            }
            Err(FetchError::Unauthenticated) => {
                debug!("unauthenticated, showing an empty list");
                let empty = PageResult::empty(&self.filters);
                self.settle(empty, None)
            }
            Err(FetchError::Network(message)) => {
                warn!(error = %message, query = %self.query, "could not load snippets");
                let empty = PageResult::empty(&self.filters);
                self.settle(empty, Some(FailureKind::Network))
            }
        }
    }

    fn sync_location(&mut self, search: &str, origin: Origin) -> Option<PendingFetch> {
        let previous = self.phase;
        self.enter(Phase::Decoding);

        let filters = query::decode(search);
        let query = query::encode(&filters);

        if origin == Origin::Navigation {
            self.clamp_attempts = 0;
        }

        if query == self.query {
            match previous {
                Phase::Fetching => {
                    debug!(query = %query, "already fetching these filters");
                    self.enter(Phase::Fetching);
                    return None;
                }
                Phase::Idle if self.settled_query.as_deref() == Some(query.as_str()) => {
                    debug!(query = %query, "filters unchanged, nothing to fetch");
                    self.enter(Phase::Idle);
                    return None;
                }
                _ => {}
            }
        }

        self.filters = filters;
        self.query = query;
        self.begin_fetch()
    }

    fn begin_fetch(&mut self) -> Option<PendingFetch> {
        self.result = None;
        self.failure = None;
        self.settled_query = None;

        if self.credentials.is_loading() {
            debug!(query = %self.query, "waiting for credentials before fetching");
            self.enter(Phase::AwaitingCredential);
            return None;
        }

        self.enter(Phase::Fetching);
        Some(PendingFetch {
            filters: self.filters.clone(),
            query: self.query.clone(),
            credential: self.credentials.credential(),
        })
    }

    fn clamp(&mut self, page: PageResult, target: u32) -> Transition {
        if self.clamp_attempts >= self.max_clamp_attempts {
            warn!(
                attempts = self.clamp_attempts,
                page = self.filters.page,
                total_pages = page.total_pages,
                "page count keeps shrinking, giving up on clamping"
            );
            self.settle(page, None);
            return Transition::Settled;
        }
        self.clamp_attempts += 1;
        self.enter(Phase::Clamping);

        let clamped = self.filters.apply(FilterAction::SetPage(target));
        let search = query::encode(&clamped);
        info!(
            from = self.filters.page,
            to = target,
            "page out of range, clamping"
        );

        let path = self.navigator.location().path;
        self.navigator.replace(&path, &search);
        Transition::Clamped(self.sync_location(&search, Origin::Clamp))
    }

    fn settle(&mut self, page: PageResult, failure: Option<FailureKind>) -> Transition {
        info!(
            query = %self.query,
            items = page.items.len(),
            page = page.page,
            total_pages = page.total_pages,
            failed = failure.is_some(),
            "list settled"
        );
        self.settled_query = Some(self.query.clone());
        self.result = Some(page);
        self.failure = failure;
        self.enter(Phase::Idle);
        Transition::Settled
    }

    fn enter(&mut self, phase: Phase) {
        trace!(from = ?self.phase, to = ?phase, "phase");
        self.phase = phase;
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::navigator::{HistoryOp, Location, MemoryHistory};
    use crate::view::ListView;
    use snippy_client::{SharedCredentials, StaticCredentials};
    use snippy_core::{Language, Snippet};

    fn authed() -> Arc<dyn CredentialProvider> {
        Arc::new(StaticCredentials::new(Some(Credential::new("token"))))
    }

    fn sync_at(search: &str) -> FilterStateSynchronizer<MemoryHistory> {
        FilterStateSynchronizer::new(MemoryHistory::at("/snippets", search), authed())
    }

    fn page(filters: &FilterSet, total_pages: u32, titles: &[&str]) -> PageResult {
        PageResult {
            items: titles.iter().map(|t| Snippet::new(*t)).collect(),
            page: filters.page,
            per_page: filters.per_page,
            total_pages,
            total_items: titles.len() as u64,
            prev_page: None,
            next_page: None,
        }
    }

    fn answer(pending: PendingFetch, total_pages: u32, titles: &[&str]) -> FetchCompletion {
        let result = page(pending.filters(), total_pages, titles);
        pending.complete(Ok(result))
    }

    fn titles(sync: &FilterStateSynchronizer<MemoryHistory>) -> Vec<String> {
        sync.result()
            .map(|p| p.items.iter().map(|s| s.title.clone()).collect())
            .unwrap_or_default()
    }

    #[test]
    fn test_start_fetches_url_filters() {
        let mut sync = sync_at("?language=python&tags=ml&tags=ml&page=2");
        let pending = sync.start().unwrap();

        assert_eq!(sync.phase(), Phase::Fetching);
        assert_eq!(
            pending.filters(),
            &FilterSet::new()
                .with_page(2)
                .with_tag("ml")
                .with_language(Language::Python)
        );
        assert_eq!(pending.query(), "page=2&tags=ml&language=python");
    }

    #[test]
    fn test_settles_on_success() {
        let mut sync = sync_at("");
        let pending = sync.start().unwrap();
        let transition = sync.on_fetch_complete(answer(pending, 1, &["a", "b"]));

        assert!(matches!(transition, Transition::Settled));
        assert_eq!(sync.phase(), Phase::Idle);
        assert_eq!(titles(&sync), vec!["a", "b"]);
        assert!(matches!(sync.snapshot().view(), ListView::Loaded(_)));
    }

    #[test]
    fn test_same_query_is_not_refetched() {
        let mut sync = sync_at("page=2");
        let pending = sync.start().unwrap();

        // equivalent URL while fetching
        assert!(sync.on_location_change("?page=2&utm=x").is_none());

        sync.on_fetch_complete(answer(pending, 3, &["a"]));
        // and once settled
        assert!(sync.on_location_change("page=2").is_none());
        assert_eq!(sync.phase(), Phase::Idle);
        assert_eq!(titles(&sync), vec!["a"]);
    }

    #[test]
    fn test_clamp_convergence() {
        let mut sync = sync_at("page=7");
        let pending = sync.start().unwrap();

        let transition = sync.on_fetch_complete(answer(pending, 3, &[]));
        let Transition::Clamped(Some(corrective)) = transition else {
            panic!("expected a clamp, got {:?}", transition);
        };
        assert_eq!(corrective.filters().page, 3);
        assert_eq!(sync.navigator().replace_count(), 1);
        assert_eq!(sync.navigator().location().search, "page=3");

        let transition = sync.on_fetch_complete(answer(corrective, 3, &["x"]));
        assert!(matches!(transition, Transition::Settled));
        assert_eq!(sync.phase(), Phase::Idle);
        assert_eq!(sync.filters().page, 3);
        assert_eq!(sync.navigator().replace_count(), 1);
        assert_eq!(sync.navigator().push_count(), 0);
    }

    #[test]
    fn test_clamp_keeps_other_filters() {
        let mut sync = sync_at("page=5&tags=ml&language=python");
        let pending = sync.start().unwrap();
        sync.on_fetch_complete(answer(pending, 2, &[]));
        assert_eq!(
            sync.navigator().location().search,
            "page=2&tags=ml&language=python"
        );
    }

    #[test]
    fn test_clamp_attempts_are_bounded() {
        let mut sync = sync_at("page=9").with_max_clamp_attempts(2);
        let mut pending = sync.start().unwrap();

        // the collection keeps shrinking under us
        for total in [6, 4] {
            let requested = pending.filters().page;
            match sync.on_fetch_complete(answer(pending, total, &[])) {
                Transition::Clamped(Some(next)) => {
                    assert!(next.filters().page < requested);
                    pending = next;
                }
                other => panic!("expected a clamp, got {:?}", other),
            }
        }

        let transition = sync.on_fetch_complete(answer(pending, 1, &[]));
        assert!(matches!(transition, Transition::Settled));
        assert_eq!(sync.phase(), Phase::Idle);
        assert_eq!(sync.navigator().replace_count(), 2);
    }

    #[test]
    fn test_zero_total_pages_does_not_clamp() {
        let mut sync = sync_at("page=4");
        let pending = sync.start().unwrap();
        let transition = sync.on_fetch_complete(answer(pending, 0, &[]));

        assert!(matches!(transition, Transition::Settled));
        assert_eq!(sync.navigator().replace_count(), 0);
        assert_eq!(sync.snapshot().view(), ListView::Empty);
    }

    #[test]
    fn test_stale_response_is_suppressed() {
        let mut sync = sync_at("");
        let a = sync.start().unwrap();

        let b = sync.dispatch(FilterAction::AddTag("rust".into())).unwrap();
        assert_eq!(sync.navigator().location().search, "tags=rust");

        // A resolves after B was issued
        let transition = sync.on_fetch_complete(answer(a, 1, &["from a"]));
        assert!(matches!(transition, Transition::Stale));
        assert_eq!(sync.phase(), Phase::Fetching);
        assert!(sync.result().is_none());
        assert_eq!(sync.snapshot().view(), ListView::Loading);

        sync.on_fetch_complete(answer(b, 1, &["from b"]));
        assert_eq!(titles(&sync), vec!["from b"]);
    }

    #[test]
    fn test_late_duplicate_completion_is_stale() {
        let mut sync = sync_at("");
        let first = sync.start().unwrap();
        sync.on_fetch_complete(answer(first.clone(), 1, &["a"]));

        let transition = sync.on_fetch_complete(answer(first, 1, &["again"]));
        assert!(matches!(transition, Transition::Stale));
        assert_eq!(titles(&sync), vec!["a"]);
    }

    #[test]
    fn test_dispatch_pushes_and_clamp_replaces() {
        let mut sync = sync_at("");
        let pending = sync.start().unwrap();
        sync.on_fetch_complete(answer(pending, 2, &["a"]));

        let pending = sync.dispatch(FilterAction::SetPage(5)).unwrap();
        sync.on_fetch_complete(answer(pending, 2, &[]));

        assert_eq!(
            sync.navigator().ops(),
            &[
                HistoryOp::Push(Location::new("/snippets", "page=5")),
                HistoryOp::Replace(Location::new("/snippets", "page=2")),
            ]
        );
        // back goes to the pre-edit page, never to page=5
        let mut history = sync.navigator().clone();
        assert_eq!(history.back().unwrap().search, "");
    }

    #[test]
    fn test_noop_dispatch_pushes_nothing() {
        let mut sync = sync_at("tags=a");
        let pending = sync.start().unwrap();
        sync.on_fetch_complete(answer(pending, 1, &["a"]));

        assert!(sync.dispatch(FilterAction::AddTag("a".into())).is_none());
        assert_eq!(sync.navigator().push_count(), 0);
    }

    #[test]
    fn test_unauthenticated_settles_empty_without_failure() {
        let mut sync = sync_at("");
        let pending = sync.start().unwrap();
        sync.on_fetch_complete(pending.complete(Err(FetchError::Unauthenticated)));

        assert_eq!(sync.phase(), Phase::Idle);
        assert_eq!(sync.failure(), None);
        assert_eq!(sync.snapshot().view(), ListView::Empty);
    }

    #[test]
    fn test_network_error_flags_failure_and_retry() {
        let mut sync = sync_at("page=2");
        let pending = sync.start().unwrap();
        sync.on_fetch_complete(pending.complete(Err(FetchError::Network("boom".into()))));

        assert_eq!(sync.phase(), Phase::Idle);
        assert_eq!(sync.failure(), Some(FailureKind::Network));
        assert_eq!(
            sync.snapshot().view(),
            ListView::Failed(FailureKind::Network)
        );
        assert!(sync.result().unwrap().is_empty());

        let retry = sync.retry().unwrap();
        assert_eq!(retry.filters().page, 2);
        assert_eq!(sync.failure(), None);
        sync.on_fetch_complete(answer(retry, 2, &["ok"]));
        assert_eq!(titles(&sync), vec!["ok"]);
    }

    #[test]
    fn test_waits_for_credentials() {
        let creds = Arc::new(SharedCredentials::loading());
        let mut sync = FilterStateSynchronizer::new(
            MemoryHistory::at("/snippets", "tags=a"),
            creds.clone(),
        );

        assert!(sync.start().is_none());
        assert_eq!(sync.phase(), Phase::AwaitingCredential);

        creds.set(Some(Credential::new("late")));
        let pending = sync.credentials_ready().unwrap();
        assert_eq!(pending.query(), "tags=a");
        assert_eq!(sync.phase(), Phase::Fetching);
    }

    #[test]
    fn test_back_navigation_resyncs() {
        let mut sync = sync_at("");
        let pending = sync.start().unwrap();
        sync.on_fetch_complete(answer(pending, 3, &["p1"]));

        let pending = sync.dispatch(FilterAction::NextPage).unwrap();
        sync.on_fetch_complete(answer(pending, 3, &["p2"]));

        sync.navigator_mut().back();
        let pending = sync.resync().unwrap();
        assert_eq!(pending.filters().page, 1);
    }

    #[test]
    fn test_server_page_out_of_range_clamps() {
        let mut sync = sync_at("page=2");
        let pending = sync.start().unwrap();
        let mut result = page(pending.filters(), 3, &["a"]);
        result.page = 9;

        let transition = sync.on_fetch_complete(pending.complete(Ok(result)));
        let Transition::Clamped(Some(corrective)) = transition else {
            panic!("expected a clamp, got {:?}", transition);
        };
        assert_eq!(corrective.filters().page, 3);
        assert_eq!(sync.navigator().replace_count(), 1);
        assert_eq!(sync.navigator().location().search, "page=3");
    }

    #[test]
    fn test_server_page_out_of_range_matching_request_settles() {
        let mut sync = sync_at("");
        let pending = sync.start().unwrap();
        let mut result = page(pending.filters(), 3, &["a"]);
        result.page = 0;
        sync.on_fetch_complete(pending.complete(Ok(result)));

        assert_eq!(sync.phase(), Phase::Idle);
        assert_eq!(sync.result().unwrap().page, 1);
        assert_eq!(sync.navigator().replace_count(), 0);
    }

    #[test]
    fn test_address_change_is_recorded_in_history() {
        let mut sync = sync_at("tags=a");
        let pending = sync.start().unwrap();
        sync.on_fetch_complete(answer(pending, 3, &["a"]));

        let pending = sync.on_location_change("?page=9").unwrap();
        assert_eq!(sync.navigator().location().search, "page=9");
        assert_eq!(sync.navigator().push_count(), 1);

        sync.on_fetch_complete(answer(pending, 3, &[]));
        assert_eq!(sync.navigator().location().search, "page=3");
        assert_eq!(sync.snapshot().query, "page=3");

        // the clamp replaced the edited entry, not the one before it
        let mut history = sync.navigator().clone();
        assert_eq!(history.len(), 2);
        assert_eq!(history.back().unwrap().search, "tags=a");
    }

    #[test]
    fn test_resync_does_not_record_history() {
        let mut sync = sync_at("page=2");
        let pending = sync.start().unwrap();
        sync.on_fetch_complete(answer(pending, 3, &["a"]));

        assert!(sync.resync().is_none());
        assert_eq!(sync.navigator().push_count(), 0);
    }
}
