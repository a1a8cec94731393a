use std::sync::Arc;

use arc_swap::ArcSwap;
use chrono::{DateTime, Utc};

use crate::api::{ApiError, AuctionApi, Listing};

/// Listings requested per API call while aggregating.
pub const FETCH_LIMIT: usize = 100;

#[derive(Debug, Clone, PartialEq)]
pub struct Aggregate {
    pub listings: Vec<Listing>,
    pub pages: usize,
}

/// Walks the paged listings endpoint until an empty page or the reported last page.
///
/// Pages are concatenated in the order the API returns them; the API sorts by
/// expiry ascending, so the aggregate keeps that order. Nothing is deduplicated.
/// Any failing page fails the whole aggregation.
#[tracing::instrument(skip(api))]
pub async fn fetch_all(api: &dyn AuctionApi, limit: usize) -> Result<Aggregate, ApiError> {
    let mut page = 1;
    let mut listings = Vec::new();

    loop {
        tracing::debug!(page, "Fetching page");

        let resp = api.listings_page(page, limit).await?;

        if resp.data.is_empty() {
            tracing::debug!(page, "No more data");
            break;
        }

        listings.extend(resp.data);
        tracing::debug!(page, total = listings.len(), "Loaded page");

        let page_count = resp.meta.as_ref().and_then(|m| m.page_count);
        if let Some(page_count) = page_count {
            if page >= page_count {
                tracing::debug!(page, page_count, "Reached last page");
                break;
            }
        }

        page += 1;
    }

    tracing::info!(total = listings.len(), pages = page, "Loaded active listings");

    Ok(Aggregate {
        listings,
        pages: page,
    })
}

#[derive(Debug, Clone, Default, PartialEq)]
pub enum CacheState {
    #[default]
    Pending,
    Ready {
        listings: Vec<Listing>,
        fetched_at: DateTime<Utc>,
    },
    Failed,
}

/// The client-held copy of every active listing.
///
/// The whole snapshot is swapped on every successful refresh and never patched.
/// Concurrent refreshes are not ordered: whichever stores last wins.
#[derive(Debug, Default)]
pub struct ListingCache {
    state: ArcSwap<CacheState>,
}

impl ListingCache {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn snapshot(&self) -> Arc<CacheState> {
        self.state.load_full()
    }

    pub fn replace(&self, listings: Vec<Listing>, fetched_at: DateTime<Utc>) {
        self.state.store(Arc::new(CacheState::Ready {
            listings,
            fetched_at,
        }));
    }

    /// Records a failed load. Data from an earlier load is kept.
    pub fn mark_failed(&self) {
        self.state.rcu(|current| match current.as_ref() {
            CacheState::Ready { .. } => Arc::clone(current),
            _ => Arc::new(CacheState::Failed),
        });
    }

    pub fn len(&self) -> usize {
        match self.state.load().as_ref() {
            CacheState::Ready { listings, .. } => listings.len(),
            _ => 0,
        }
    }

    pub fn is_empty(&self) -> bool {
        self.len() == 0
    }

    pub fn highest_bid(&self, id: &str) -> Option<u64> {
        match self.state.load().as_ref() {
            CacheState::Ready { listings, .. } => listings
                .iter()
                .find(|l| l.id == id)
                .map(Listing::highest_bid),
            _ => None,
        }
    }
}

/// Case-insensitive title match; an empty query keeps everything.
pub fn search<'l>(listings: &'l [Listing], query: &str) -> Vec<&'l Listing> {
    let query = query.trim().to_lowercase();
    listings
        .iter()
        .filter(|l| query.is_empty() || l.title.to_lowercase().contains(&query))
        .collect()
}
