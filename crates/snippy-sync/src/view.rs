//! What the list view renders from

use serde::Serialize;
use snippy_core::{FilterSet, PageResult};

/// Synchronizer state
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize)]
#[serde(rename_all = "snake_case")]
pub enum Phase {
    /// Settled: filters match the URL, result matches the filters
    Idle,
    Decoding,
    Fetching,
    Clamping,
    /// A fetch is due but the credential provider is still loading
    AwaitingCredential,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize)]
#[serde(rename_all = "snake_case")]
pub enum FailureKind {
    Network,
}

/// Point-in-time copy of the synchronizer state
#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct Snapshot {
    pub phase: Phase,
    pub filters: FilterSet,
    pub query: String,
    /// None while a fetch is outstanding; previous results are never shown
    pub result: Option<PageResult>,
    pub failure: Option<FailureKind>,
}

/// How the list area should render
#[derive(Debug, Clone, Copy, PartialEq)]
pub enum ListView<'a> {
    Loading,
    /// "No snippets match"
    Empty,
    /// "Couldn't load, try again"
    Failed(FailureKind),
    Loaded(&'a PageResult),
}

impl Snapshot {
    pub fn view(&self) -> ListView<'_> {
        if let Some(kind) = self.failure {
            return ListView::Failed(kind);
        }
        match &self.result {
            None => ListView::Loading,
            Some(page) if page.is_empty() => ListView::Empty,
            Some(page) => ListView::Loaded(page),
        }
    }

    pub fn is_settled(&self) -> bool {
        self.phase == Phase::Idle
    }
}
