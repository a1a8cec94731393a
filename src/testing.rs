use std::sync::Mutex;

use chrono::{DateTime, Duration, TimeZone, Utc};

use crate::api::data::{Bid, Count, PageMeta, PagedResponse, Party};
use crate::api::{ApiError, AuctionApi, Listing, ListingsResponse, NewListing, Profile, ProfileUpdate};
use crate::pagination::page_count;

/// Polls `check` until it holds, giving up after five seconds.
pub async fn eventually(mut check: impl FnMut() -> bool) -> bool {
    for _ in 0..500 {
        if check() {
            return true;
        }
        tokio::time::sleep(std::time::Duration::from_millis(10)).await;
    }
    check()
}

pub fn base_time() -> DateTime<Utc> {
    Utc.with_ymd_and_hms(2030, 1, 1, 0, 0, 0).unwrap()
}

pub fn listing(id: &str, hours: i64, bids: &[u64]) -> Listing {
    Listing {
        id: id.to_string(),
        title: format!("Listing {id}"),
        description: Some(format!("Description of {id}")),
        tags: vec![],
        media: vec![],
        created: Some(base_time()),
        updated: Some(base_time()),
        ends_at: base_time() + Duration::hours(hours),
        count: Count {
            bids: bids.len() as u64,
        },
        seller: Some(Party {
            name: Some("seller".to_string()),
            email: None,
        }),
        bids: Some(bids.iter().map(|amount| bid(*amount)).collect()),
    }
}

fn bid(amount: u64) -> Bid {
    Bid {
        id: None,
        amount,
        bidder: Some(Party {
            name: Some("bidder".to_string()),
            email: None,
        }),
        created: base_time(),
    }
}

fn status(status: u16, message: &str) -> ApiError {
    ApiError::Status {
        status,
        message: message.to_string(),
    }
}

#[derive(Default)]
pub struct FakeApi {
    listings: Mutex<Vec<Listing>>,
    without_meta: bool,
    fail_page: Option<usize>,
    fail_detail: bool,
    bid_error: Option<u16>,
    create_error: Option<u16>,
    profile: Option<Profile>,
    pages: Mutex<Vec<usize>>,
    bids: Mutex<Vec<(String, u64)>>,
    created: Mutex<Vec<NewListing>>,
    deleted: Mutex<Vec<String>>,
    profile_updates: Mutex<Vec<(String, ProfileUpdate)>>,
}

impl FakeApi {
    pub fn with_listings(listings: Vec<Listing>) -> Self {
        Self {
            listings: Mutex::new(listings),
            ..Self::default()
        }
    }

    pub fn without_meta(mut self) -> Self {
        self.without_meta = true;
        self
    }

    pub fn fail_page(mut self, page: usize) -> Self {
        self.fail_page = Some(page);
        self
    }

    pub fn fail_detail(mut self) -> Self {
        self.fail_detail = true;
        self
    }

    pub fn reject_bids(mut self, status: u16) -> Self {
        self.bid_error = Some(status);
        self
    }

    pub fn reject_create(mut self, status: u16) -> Self {
        self.create_error = Some(status);
        self
    }

    pub fn with_profile(mut self, profile: Profile) -> Self {
        self.profile = Some(profile);
        self
    }

    pub fn requested_pages(&self) -> Vec<usize> {
        self.pages.lock().unwrap().clone()
    }

    pub fn placed_bids(&self) -> Vec<(String, u64)> {
        self.bids.lock().unwrap().clone()
    }

    pub fn created(&self) -> Vec<NewListing> {
        self.created.lock().unwrap().clone()
    }

    pub fn deleted(&self) -> Vec<String> {
        self.deleted.lock().unwrap().clone()
    }

    pub fn profile_updates(&self) -> Vec<(String, ProfileUpdate)> {
        self.profile_updates.lock().unwrap().clone()
    }
}

#[async_trait::async_trait]
impl AuctionApi for FakeApi {
    async fn listings_page(&self, page: usize, limit: usize) -> Result<ListingsResponse, ApiError> {
        self.pages.lock().unwrap().push(page);

        if self.fail_page == Some(page) {
            return Err(status(500, "HTTP 500: Internal Server Error"));
        }

        let listings = self.listings.lock().unwrap();
        let start = (page - 1) * limit;
        let data = listings.iter().skip(start).take(limit).cloned().collect();

        let meta = (!self.without_meta).then(|| PageMeta {
            page_count: Some(page_count(listings.len(), limit)),
            current_page: Some(page),
            is_last_page: None,
            total_count: Some(listings.len()),
        });

        Ok(PagedResponse { data, meta })
    }

    async fn listing(&self, id: &str) -> Result<Listing, ApiError> {
        if self.fail_detail {
            return Err(status(500, "HTTP 500: Internal Server Error"));
        }

        self.listings
            .lock()
            .unwrap()
            .iter()
            .find(|l| l.id == id)
            .cloned()
            .ok_or_else(|| status(404, "No listing with such ID"))
    }

    async fn place_bid(&self, id: &str, amount: u64) -> Result<(), ApiError> {
        self.bids.lock().unwrap().push((id.to_string(), amount));

        if let Some(code) = self.bid_error {
            return Err(status(code, "Bid refused"));
        }

        let mut listings = self.listings.lock().unwrap();
        if let Some(listing) = listings.iter_mut().find(|l| l.id == id) {
            listing.bids.get_or_insert_with(Vec::new).push(bid(amount));
            listing.count.bids += 1;
        }

        Ok(())
    }

    async fn create_listing(&self, new: &NewListing) -> Result<(), ApiError> {
        self.created.lock().unwrap().push(new.clone());

        if let Some(code) = self.create_error {
            return Err(status(code, "Listing refused"));
        }

        let mut listings = self.listings.lock().unwrap();
        let id = format!("new-{}", listings.len());
        listings.push(Listing {
            id,
            title: new.title.clone(),
            description: Some(new.description.clone()),
            tags: new.tags.clone(),
            media: new.media.clone(),
            created: None,
            updated: None,
            ends_at: new.ends_at,
            count: Count::default(),
            seller: None,
            bids: Some(vec![]),
        });

        Ok(())
    }

    async fn delete_listing(&self, id: &str) -> Result<(), ApiError> {
        self.deleted.lock().unwrap().push(id.to_string());

        let mut listings = self.listings.lock().unwrap();
        let before = listings.len();
        listings.retain(|l| l.id != id);
        if listings.len() == before {
            return Err(status(404, "No listing with such ID"));
        }

        Ok(())
    }

    async fn profile(&self, name: &str) -> Result<Profile, ApiError> {
        self.profile
            .clone()
            .filter(|p| p.name == name)
            .ok_or_else(|| status(404, "No profile with this name"))
    }

    async fn update_profile(&self, name: &str, update: &ProfileUpdate) -> Result<(), ApiError> {
        self.profile_updates
            .lock()
            .unwrap()
            .push((name.to_string(), update.clone()));
        Ok(())
    }
}
