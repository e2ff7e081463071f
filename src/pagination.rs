//! Infinite-scroll listing feed.
//!
//! Pages are read through the shared [`TtlCache`] and appended to an
//! accumulated list. Every restart (refresh or filter change) opens a new
//! generation and aborts the pending prefetch. Results that come back for an
//! older generation are neither cached nor shown; they are reported as
//! [`MarketError::Superseded`].

use crate::cache::TtlCache;
use crate::config::PaginationSettings;
use crate::error::{MarketError, Result};
use crate::models::Listing;
use crate::store::{ListingFilters, ListingStore};
use parking_lot::Mutex;
use std::sync::Arc;
use tokio::task::JoinHandle;
use tracing::{debug, info, warn};

pub type PageCache = TtlCache<Vec<Listing>>;

#[derive(Debug, Clone)]
pub struct FeedOptions {
    pub page_size: usize,
    pub cache_ttl: chrono::Duration,
    /// Load the following page into the cache after each page
    pub prefetch: bool,
}

impl Default for FeedOptions {
    fn default() -> Self {
        Self::from(&PaginationSettings::default())
    }
}

impl From<&PaginationSettings> for FeedOptions {
    fn from(settings: &PaginationSettings) -> Self {
        Self {
            page_size: settings.page_size,
            cache_ttl: settings.cache_ttl(),
            prefetch: settings.prefetch,
        }
    }
}

/// Observable state of the feed
#[derive(Debug, Clone)]
pub struct FeedSnapshot {
    pub listings: Vec<Listing>,
    pub loading: bool,
    pub has_more: bool,
    pub total: u64,
    pub error: Option<String>,
    /// Pages loaded so far
    pub pages: usize,
}

/// Cache key prefix shared by every page of a filter set
pub fn cache_prefix(filters: &ListingFilters) -> String {
    format!("listings:{}:", filters.cache_fragment())
}

pub fn page_key(filters: &ListingFilters, page: usize) -> String {
    format!("{}page:{}", cache_prefix(filters), page)
}

struct FeedState {
    filters: ListingFilters,
    listings: Vec<Listing>,
    next_page: usize,
    has_more: bool,
    total: u64,
    error: Option<String>,
    /// Generation of the request currently running, if any
    in_flight: Option<u64>,
}

/// Current generation, shared with prefetch tasks
///
/// Cache writes happen while holding this lock, so once a restart has bumped
/// it no older request can store a page.
type GenerationFence = Arc<Mutex<u64>>;

/// Clears the in-flight marker when the request finishes, however it ends
struct InFlightGuard<'a> {
    state: &'a Mutex<FeedState>,
    generation: u64,
}

impl Drop for InFlightGuard<'_> {
    fn drop(&mut self) {
        let mut state = self.state.lock();
        if state.in_flight == Some(self.generation) {
            state.in_flight = None;
        }
    }
}

pub struct ListingFeed {
    store: Arc<dyn ListingStore>,
    cache: Arc<PageCache>,
    options: FeedOptions,
    /// Lock order: `state` before `generation`
    state: Mutex<FeedState>,
    generation: GenerationFence,
    prefetch_task: Mutex<Option<JoinHandle<()>>>,
}

impl ListingFeed {
    pub fn new(
        store: Arc<dyn ListingStore>,
        cache: Arc<PageCache>,
        filters: ListingFilters,
        options: FeedOptions,
    ) -> Self {
        Self {
            store,
            cache,
            options,
            state: Mutex::new(FeedState {
                filters,
                listings: Vec::new(),
                next_page: 0,
                has_more: true,
                total: 0,
                error: None,
                in_flight: None,
            }),
            generation: Arc::new(Mutex::new(0)),
            prefetch_task: Mutex::new(None),
        }
    }

    pub fn snapshot(&self) -> FeedSnapshot {
        let state = self.state.lock();
        FeedSnapshot {
            listings: state.listings.clone(),
            loading: state.in_flight.is_some(),
            has_more: state.has_more,
            total: state.total,
            error: state.error.clone(),
            pages: state.next_page,
        }
    }

    pub fn listings(&self) -> Vec<Listing> {
        self.state.lock().listings.clone()
    }

    pub fn loading(&self) -> bool {
        self.state.lock().in_flight.is_some()
    }

    pub fn has_more(&self) -> bool {
        self.state.lock().has_more
    }

    pub fn total(&self) -> u64 {
        self.state.lock().total
    }

    pub fn error(&self) -> Option<String> {
        self.state.lock().error.clone()
    }

    pub fn filters(&self) -> ListingFilters {
        self.state.lock().filters.clone()
    }

    /// First load: total count and page 0, reusing cached pages
    pub async fn start(&self) -> Result<()> {
        self.restart(false).await
    }

    /// Drop cached pages for the current filters and reload from page 0
    pub async fn refresh(&self) -> Result<()> {
        self.restart(true).await
    }

    /// Switch filters; pagination restarts only if they actually changed
    pub async fn set_filters(&self, filters: ListingFilters) -> Result<()> {
        {
            let mut state = self.state.lock();
            if state.filters == filters {
                return Ok(());
            }
            state.filters = filters;
        }
        self.restart(false).await
    }

    /// Append the next page
    ///
    /// Returns immediately when a load is already running or the end was
    /// reached. A pending prefetch is awaited first so the page it is
    /// loading is not requested twice.
    pub async fn load_more(&self) -> Result<()> {
        let (filters, page, generation) = {
            let mut state = self.state.lock();
            let generation = *self.generation.lock();
            if !state.has_more || state.in_flight == Some(generation) {
                return Ok(());
            }
            state.in_flight = Some(generation);
            (state.filters.clone(), state.next_page, generation)
        };
        let _guard = InFlightGuard {
            state: &self.state,
            generation,
        };

        self.settle().await;
        let result = self.fetch(&filters, page, generation).await;
        self.apply_page(generation, page, &filters, result)
    }

    /// Wait for the outstanding background prefetch, if any
    pub async fn settle(&self) {
        let task = self.prefetch_task.lock().take();
        if let Some(task) = task {
            let _ = task.await;
        }
    }

    async fn restart(&self, invalidate: bool) -> Result<()> {
        let (filters, generation) = {
            let mut state = self.state.lock();
            let generation = {
                let mut current = self.generation.lock();
                *current += 1;
                *current
            };
            state.listings.clear();
            state.next_page = 0;
            state.has_more = true;
            state.total = 0;
            state.error = None;
            state.in_flight = Some(generation);
            (state.filters.clone(), generation)
        };
        let _guard = InFlightGuard {
            state: &self.state,
            generation,
        };

        let pending = self.prefetch_task.lock().take();
        if let Some(task) = pending {
            task.abort();
        }
        if invalidate {
            self.cache.invalidate_pattern(&cache_prefix(&filters));
        }
        info!(
            "Loading listings from {} (generation {})",
            self.store.source_name(),
            generation
        );

        let (count, page) = tokio::join!(
            self.store.count(&filters),
            self.fetch(&filters, 0, generation)
        );

        let page_outcome = self.apply_page(generation, 0, &filters, page);
        let total_outcome = self.apply_total(generation, count);
        page_outcome.and(total_outcome)
    }

    async fn fetch(
        &self,
        filters: &ListingFilters,
        page: usize,
        generation: u64,
    ) -> Result<Vec<Listing>> {
        fetch_through_cache(
            &*self.store,
            &self.cache,
            &self.options,
            &self.generation,
            generation,
            filters,
            page,
        )
        .await
    }

    fn apply_page(
        &self,
        generation: u64,
        page: usize,
        filters: &ListingFilters,
        result: Result<Vec<Listing>>,
    ) -> Result<()> {
        let has_more = {
            let mut state = self.state.lock();
            if *self.generation.lock() != generation {
                debug!("Dropping page {} from generation {}", page, generation);
                return Err(MarketError::Superseded);
            }

            match result {
                Ok(rows) => {
                    state.has_more = rows.len() == self.options.page_size;
                    state.listings.extend(rows);
                    state.next_page = page + 1;
                    state.error = None;
                    state.has_more
                }
                Err(err) => {
                    warn!("Failed to load page {}: {}", page, err);
                    state.error = Some(err.to_string());
                    return Err(err);
                }
            }
        };

        if has_more && self.options.prefetch {
            self.spawn_prefetch(filters.clone(), page + 1, generation);
        }
        Ok(())
    }

    /// Only records the count error when the page load did not fail first
    fn apply_total(&self, generation: u64, result: Result<u64>) -> Result<()> {
        let mut state = self.state.lock();
        if *self.generation.lock() != generation {
            return Err(MarketError::Superseded);
        }
        match result {
            Ok(total) => {
                state.total = total;
                Ok(())
            }
            Err(err) => {
                warn!("Failed to count listings: {}", err);
                if state.error.is_none() {
                    state.error = Some(err.to_string());
                }
                Err(err)
            }
        }
    }

    fn spawn_prefetch(&self, filters: ListingFilters, page: usize, generation: u64) {
        let store = Arc::clone(&self.store);
        let cache = Arc::clone(&self.cache);
        let fence = Arc::clone(&self.generation);
        let options = self.options.clone();

        let task = tokio::spawn(async move {
            if cache.has(&page_key(&filters, page)) {
                return;
            }
            let fetched =
                fetch_through_cache(&*store, &cache, &options, &fence, generation, &filters, page)
                    .await;
            if let Err(err) = fetched {
                debug!("Prefetch of page {} failed: {}", page, err);
            }
        });

        let previous = self.prefetch_task.lock().replace(task);
        if let Some(previous) = previous {
            previous.abort();
        }
    }
}

/// Read a page from the cache, or from the store and cache it while
/// `generation` is still current
async fn fetch_through_cache(
    store: &dyn ListingStore,
    cache: &PageCache,
    options: &FeedOptions,
    fence: &Mutex<u64>,
    generation: u64,
    filters: &ListingFilters,
    page: usize,
) -> Result<Vec<Listing>> {
    let key = page_key(filters, page);
    if let Some(rows) = cache.get(&key) {
        debug!("Cache hit for {}", key);
        return Ok(rows);
    }

    let rows = store
        .fetch_page(filters, page * options.page_size, options.page_size)
        .await?;

    let current = fence.lock();
    if *current != generation {
        debug!("Not caching {} from generation {}", key, generation);
        return Err(MarketError::Superseded);
    }
    cache.set(key, rows.clone(), options.cache_ttl);
    Ok(rows)
}
