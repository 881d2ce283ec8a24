use std::collections::{BTreeMap, HashMap, VecDeque};
use std::sync::Arc;

use crate::domain::entities::dataset::PageSnapshot;
use crate::domain::request_key::RequestKey;
use crate::usecase::ports::repo::FetchError;

/// A fetch the view has handed out and is waiting on.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct FetchTicket {
    pub key: RequestKey,
    pub generation: u64,
}

/// What the table renders from.
#[derive(Debug, Clone, Default)]
pub struct ViewState {
    /// `None` until the first fetch lands. Stays on the previous page while
    /// a newer fetch is in flight.
    pub data: Option<Arc<PageSnapshot>>,
    pub is_validating: bool,
    pub last_error: Option<FetchError>,
}

#[derive(Debug, Clone, PartialEq, Eq)]
pub enum FetchOutcome {
    Applied,
    /// A newer generation was already applied.
    Stale,
    Failed(FetchError),
}

/// Pages kept for instant back-navigation.
pub const DEFAULT_CACHE_CAPACITY: usize = 32;

/// Stale-while-revalidate page cache keyed by request key.
///
/// Results are applied last-write-wins by completion, guarded by generation:
/// a result is dropped only when a newer generation has already been applied,
/// so a slow old request cannot flip the table back to old data.
///
/// The cache holds at most `capacity` pages, evicting the least recently
/// used key first.
#[derive(Debug)]
pub struct DatasetView {
    current_key: Option<RequestKey>,
    displayed: Option<Arc<PageSnapshot>>,
    cache: HashMap<RequestKey, Arc<PageSnapshot>>,
    recency: VecDeque<RequestKey>,
    capacity: usize,
    in_flight: BTreeMap<u64, RequestKey>,
    next_generation: u64,
    applied_generation: u64,
    last_error: Option<FetchError>,
}

impl Default for DatasetView {
    fn default() -> Self {
        Self::with_capacity(DEFAULT_CACHE_CAPACITY)
    }
}

impl DatasetView {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn with_capacity(capacity: usize) -> Self {
        Self {
            current_key: None,
            displayed: None,
            cache: HashMap::new(),
            recency: VecDeque::new(),
            capacity: capacity.max(1),
            in_flight: BTreeMap::new(),
            next_generation: 0,
            applied_generation: 0,
            last_error: None,
        }
    }

    /// Points the view at `key`. `None` defers fetching and keeps whatever is
    /// displayed. A cached page for the key is shown immediately and still
    /// revalidated.
    ///
    /// An in-flight fetch for the key is reused only while it is the newest
    /// one issued. Coming back to a key whose fetch was overtaken (page 1,
    /// page 2, back to page 1) issues a fresh ticket, since the old one would
    /// be dropped as stale once page 2 lands.
    pub fn subscribe(&mut self, key: Option<RequestKey>) -> Option<FetchTicket> {
        let key = key?;
        if let Some(cached) = self.cache.get(&key).cloned() {
            self.displayed = Some(cached);
            self.touch(&key);
        }
        self.current_key = Some(key.clone());
        let newest_in_flight = self.in_flight.iter().next_back();
        if matches!(newest_in_flight, Some((_, pending)) if *pending == key) {
            return None;
        }
        Some(self.issue(key))
    }

    pub fn state(&self) -> ViewState {
        let is_validating = match &self.current_key {
            Some(key) => self.in_flight.values().any(|pending| pending == key),
            None => false,
        };
        ViewState {
            data: self.displayed.clone(),
            is_validating,
            last_error: self.last_error.clone(),
        }
    }

    pub fn data(&self) -> Option<&PageSnapshot> {
        self.displayed.as_deref()
    }

    pub fn total_row_count(&self) -> Option<u64> {
        self.displayed.as_ref().map(|page| page.total_row_count)
    }

    pub fn complete(
        &mut self,
        ticket: FetchTicket,
        result: Result<PageSnapshot, FetchError>,
    ) -> FetchOutcome {
        self.in_flight.remove(&ticket.generation);
        let stale = ticket.generation < self.applied_generation;

        match result {
            Ok(snapshot) => {
                if stale {
                    tracing::debug!(
                        key = %ticket.key,
                        generation = ticket.generation,
                        applied = self.applied_generation,
                        "dropping out-of-order page"
                    );
                    return FetchOutcome::Stale;
                }
                let snapshot = Arc::new(snapshot);
                self.remember(ticket.key.clone(), snapshot.clone());
                self.displayed = Some(snapshot);
                self.applied_generation = ticket.generation;
                self.last_error = None;
                tracing::debug!(key = %ticket.key, generation = ticket.generation, "page applied");
                FetchOutcome::Applied
            }
            Err(err) => {
                if stale {
                    return FetchOutcome::Stale;
                }
                tracing::warn!(key = %ticket.key, error = %err, "page fetch failed");
                self.last_error = Some(err.clone());
                FetchOutcome::Failed(err)
            }
        }
    }

    /// Drops the cached page for `key`. If it is the current key a fresh
    /// fetch is returned; the old page stays visible until it lands.
    pub fn mutate(&mut self, key: &RequestKey) -> Option<FetchTicket> {
        self.cache.remove(key);
        self.recency.retain(|cached| cached != key);
        if self.current_key.as_ref() == Some(key) {
            return Some(self.issue(key.clone()));
        }
        None
    }

    /// Forgets every cached page, e.g. after a bulk action touched rows on
    /// pages other than the current one.
    pub fn invalidate_all(&mut self) -> Option<FetchTicket> {
        self.cache.clear();
        self.recency.clear();
        let key = self.current_key.clone()?;
        Some(self.issue(key))
    }

    /// User-triggered retry after a failure.
    pub fn retry(&mut self) -> Option<FetchTicket> {
        let key = self.current_key.clone()?;
        self.last_error = None;
        Some(self.issue(key))
    }

    fn touch(&mut self, key: &RequestKey) {
        if let Some(pos) = self.recency.iter().position(|cached| cached == key) {
            if let Some(hit) = self.recency.remove(pos) {
                self.recency.push_back(hit);
            }
        }
    }

    fn remember(&mut self, key: RequestKey, snapshot: Arc<PageSnapshot>) {
        if self.cache.insert(key.clone(), snapshot).is_some() {
            self.touch(&key);
        } else {
            self.recency.push_back(key);
        }
        while self.recency.len() > self.capacity {
            if let Some(evicted) = self.recency.pop_front() {
                self.cache.remove(&evicted);
                tracing::debug!(key = %evicted, "page evicted from cache");
            }
        }
    }

    fn issue(&mut self, key: RequestKey) -> FetchTicket {
        self.next_generation += 1;
        let generation = self.next_generation;
        self.in_flight.insert(generation, key.clone());
        tracing::debug!(key = %key, generation, "page fetch issued");
        FetchTicket { key, generation }
    }
}
