//! Page-by-page loading of a list endpoint
//!
//! `PagedCollection` holds the pages fetched for the current query key and
//! decides which page to request next. It never performs I/O itself: callers
//! take a `PageTicket` from `begin_next`, run the request (inline through a
//! `Fetcher`, or on a worker thread) and hand the outcome back to `complete`.
//! Tickets carry the key generation and page number, which is how responses
//! for a superseded filter or an unexpected page are recognized and dropped.

use std::sync::Arc;

use crate::client::{MistApi, PageQuery};
use crate::error::{MistError, Result};
use crate::model::{Collection, Item, Page, QueryKey};

/// Items per page requested by list views
pub const DEFAULT_PAGE_SIZE: u32 = 10;

/// Permission to fetch one page for one generation of a query key.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct PageTicket {
    pub key: QueryKey,
    pub page_number: u32,
    generation: u64,
}

/// What `complete` did with a response.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum Applied {
    /// The page was appended; carries the number of new items.
    Appended(usize),
    /// The request failed; the error is now the collection's error flag.
    Failed,
    /// The response belonged to a superseded key or out-of-order page.
    Discarded,
}

/// Pages loaded so far for one query key.
#[derive(Debug, Default)]
pub struct PagedCollection {
    key: QueryKey,
    generation: u64,
    pages: Vec<Page>,
    in_flight: Option<PageTicket>,
    error: Option<MistError>,
}

impl PagedCollection {
    pub fn new(key: QueryKey) -> Self {
        Self {
            key,
            ..Default::default()
        }
    }

    pub fn key(&self) -> &QueryKey {
        &self.key
    }

    /// Switch to a new filter term. Returns false if the term is unchanged.
    ///
    /// All pages are dropped and pagination restarts at page 1. A request
    /// still in flight for the old term is forgotten; its response will be
    /// discarded when it arrives.
    pub fn set_filter(&mut self, filter: impl Into<String>) -> bool {
        let filter = filter.into();
        if filter == self.key.filter {
            return false;
        }
        self.key.filter = filter;
        self.invalidate();
        true
    }

    /// Drop all pages of the current key, keeping the key itself.
    pub fn clear(&mut self) {
        self.invalidate();
    }

    fn invalidate(&mut self) {
        self.generation += 1;
        self.pages.clear();
        self.in_flight = None;
        self.error = None;
    }

    pub fn last_page(&self) -> Option<&Page> {
        self.pages.last()
    }

    /// True until the last loaded page says otherwise; an empty collection has
    /// its first page still to load.
    pub fn has_more(&self) -> bool {
        self.last_page().is_none_or(Page::has_more)
    }

    pub fn is_fetching(&self) -> bool {
        self.in_flight.is_some()
    }

    /// Waiting for the first page
    pub fn is_loading(&self) -> bool {
        self.is_fetching() && self.pages.is_empty()
    }

    /// Waiting for a page after the first
    pub fn is_fetching_next(&self) -> bool {
        self.is_fetching() && !self.pages.is_empty()
    }

    pub fn error(&self) -> Option<&MistError> {
        self.error.as_ref()
    }

    pub fn pages(&self) -> &[Page] {
        &self.pages
    }

    /// All items of all loaded pages, in page order. Ids are not de-duplicated.
    pub fn flatten(&self) -> impl Iterator<Item = &Item> {
        self.pages.iter().flat_map(|page| page.items.iter())
    }

    pub fn len(&self) -> usize {
        self.pages.iter().map(|page| page.items.len()).sum()
    }

    pub fn is_empty(&self) -> bool {
        self.len() == 0
    }

    /// Claim the next page to fetch, or `None` if a fetch is already in flight
    /// or the last page has been loaded.
    pub fn begin_next(&mut self) -> Option<PageTicket> {
        if self.in_flight.is_some() || !self.has_more() {
            return None;
        }
        let ticket = PageTicket {
            key: self.key.clone(),
            page_number: self.last_page().map_or(1, |page| page.page_number + 1),
            generation: self.generation,
        };
        self.in_flight = Some(ticket.clone());
        Some(ticket)
    }

    /// Apply the outcome of the request identified by `ticket`.
    pub fn complete(&mut self, ticket: &PageTicket, result: Result<Page>) -> Applied {
        if self.in_flight.as_ref() != Some(ticket) {
            log::warn!(
                "Discarding stale response for {} page {}",
                ticket.key,
                ticket.page_number
            );
            return Applied::Discarded;
        }
        self.in_flight = None;

        match result {
            Ok(page) if page.page_number != ticket.page_number => {
                log::warn!(
                    "Discarding page {} for {}: expected page {}",
                    page.page_number,
                    ticket.key,
                    ticket.page_number
                );
                Applied::Discarded
            }
            Ok(page) => {
                let count = page.items.len();
                log::debug!(
                    "Loaded {} page {}/{} ({} items)",
                    ticket.key,
                    page.page_number,
                    page.total_pages,
                    count
                );
                self.pages.push(page);
                self.error = None;
                Applied::Appended(count)
            }
            Err(err) => {
                log::warn!("Failed to load {} page {}: {}", ticket.key, ticket.page_number, err);
                self.error = Some(err);
                Applied::Failed
            }
        }
    }
}

/// Runs page requests for one collection against a `MistApi`.
pub struct Fetcher {
    api: Arc<dyn MistApi>,
    collection: Collection,
    page_size: u32,
}

impl Fetcher {
    pub fn new(api: Arc<dyn MistApi>, collection: Collection, page_size: u32) -> Self {
        Self {
            api,
            collection,
            page_size,
        }
    }

    /// Fetch one page of `key` from the list endpoint.
    pub fn fetch_page(&self, key: &QueryKey, page_number: u32) -> Result<Page> {
        let query = PageQuery {
            page: page_number,
            page_size: self.page_size,
            name: key.filter.clone(),
        };
        self.api.list_page(&self.collection, &query)
    }

    /// Fetch the next page of `pages` inline.
    ///
    /// Returns `Ok(None)` when there is nothing to load.
    pub fn load_next(&self, pages: &mut PagedCollection) -> Result<Option<usize>> {
        let Some(ticket) = pages.begin_next() else {
            return Ok(None);
        };
        match self.fetch_page(&ticket.key, ticket.page_number) {
            Ok(page) => match pages.complete(&ticket, Ok(page)) {
                Applied::Appended(count) => Ok(Some(count)),
                Applied::Failed | Applied::Discarded => Ok(None),
            },
            Err(err) => {
                pages.complete(&ticket, Err(err.clone()));
                Err(err)
            }
        }
    }
}
