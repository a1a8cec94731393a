use chrono::{DateTime, Utc};

use crate::api::data::{Bid, Listing, Media, Profile};
use crate::pagination::{PaginationControls, ViewState};

pub const FALLBACK_IMAGE: &str = "images/default-fallback-image.png";
pub const FALLBACK_AVATAR: &str = "images/default-avatar.png";
pub const DEFAULT_ALT: &str = "Listing Image";
pub const EXPIRED: &str = "Expired";

pub const LOAD_FAILED: &str = "Failed to load listings. Please try again later.";
pub const NO_LISTINGS: &str = "No active listings found.";
pub const DETAIL_FAILED: &str = "Failed to load listing details.";

#[derive(Debug, Clone, Copy)]
pub struct RenderContext {
    pub now: DateTime<Utc>,
    pub authenticated: bool,
}

#[derive(Debug, Clone, PartialEq, serde::Serialize)]
pub struct ListingCard {
    pub id: String,
    pub title: String,
    pub image_url: String,
    pub image_alt: String,
    pub time_remaining: String,
    pub highest_bid: u64,
    pub bid_count: u64,
    pub action: &'static str,
}

#[derive(Debug, Clone, PartialEq, serde::Serialize)]
#[serde(tag = "state", rename_all = "lowercase")]
pub enum PageView {
    Listings {
        cards: Vec<ListingCard>,
        pagination: Option<PaginationControls>,
    },
    Empty {
        message: &'static str,
    },
    Error {
        message: &'static str,
    },
}

#[derive(Debug, Clone, PartialEq, serde::Serialize)]
pub struct BidEntry {
    pub bidder: String,
    pub amount: u64,
    pub created: DateTime<Utc>,
    pub highest: bool,
}

#[derive(Debug, Clone, PartialEq, serde::Serialize)]
pub struct ListingDetail {
    pub id: String,
    pub title: String,
    pub image_url: String,
    pub image_alt: String,
    pub time_remaining: String,
    pub description: String,
    pub highest_bid: u64,
    pub bid_count: u64,
    pub min_bid: u64,
    pub seller: String,
    pub can_bid: bool,
    pub bid_history: Option<Vec<BidEntry>>,
}

#[derive(Debug, Clone, PartialEq, serde::Serialize)]
pub struct ProfileView {
    pub name: String,
    pub email: String,
    pub bio: String,
    pub avatar_url: String,
    pub avatar_alt: String,
    pub banner_url: Option<String>,
    pub credits: Option<i64>,
    pub listing_count: usize,
}

/// The first media URL when it looks like something an image can load from.
pub fn image_url(media: &[Media]) -> &str {
    let url = match media.first().and_then(|m| m.url.as_deref()) {
        Some(url) => url.trim(),
        None => return FALLBACK_IMAGE,
    };

    if url.is_empty() {
        return FALLBACK_IMAGE;
    }

    if url.starts_with("http://") || url.starts_with("https://") || url.starts_with("data:") {
        return url;
    }

    // Relative paths
    if !url.contains(' ') && (url.contains('.') || url.contains('/')) {
        return url;
    }

    FALLBACK_IMAGE
}

pub fn image_alt(media: &[Media]) -> &str {
    media
        .first()
        .and_then(|m| m.alt.as_deref())
        .filter(|alt| !alt.is_empty())
        .unwrap_or(DEFAULT_ALT)
}

/// `"{d}d {h}h {m}m"` until `ends_at`, floored to whole minutes.
pub fn time_remaining(ends_at: DateTime<Utc>, now: DateTime<Utc>) -> String {
    let left = ends_at - now;
    if left <= chrono::Duration::zero() {
        return EXPIRED.to_string();
    }

    let days = left.num_days();
    let hours = left.num_hours() % 24;
    let minutes = left.num_minutes() % 60;

    format!("{}d {}h {}m", days, hours, minutes)
}

pub fn card(listing: &Listing, ctx: &RenderContext) -> ListingCard {
    ListingCard {
        id: listing.id.clone(),
        title: listing.title.clone(),
        image_url: image_url(&listing.media).to_string(),
        image_alt: image_alt(&listing.media).to_string(),
        time_remaining: time_remaining(listing.ends_at, ctx.now),
        highest_bid: listing.highest_bid(),
        bid_count: listing.count.bids,
        action: if ctx.authenticated {
            "Place Bid"
        } else {
            "View Details"
        },
    }
}

pub fn page(listings: &[Listing], state: &ViewState, ctx: &RenderContext) -> PageView {
    let visible = state.slice(listings);
    if visible.is_empty() {
        return PageView::Empty {
            message: NO_LISTINGS,
        };
    }

    PageView::Listings {
        cards: visible.iter().map(|l| card(l, ctx)).collect(),
        pagination: state.controls(listings.len()),
    }
}

pub fn bid_history(bids: &[Bid]) -> Vec<BidEntry> {
    let mut sorted: Vec<&Bid> = bids.iter().collect();
    sorted.sort_by(|a, b| b.amount.cmp(&a.amount));

    sorted
        .into_iter()
        .enumerate()
        .map(|(i, bid)| BidEntry {
            bidder: bid
                .bidder
                .as_ref()
                .and_then(|b| b.name.clone())
                .unwrap_or_else(|| "Anonymous".to_string()),
            amount: bid.amount,
            created: bid.created,
            highest: i == 0,
        })
        .collect()
}

pub fn detail(listing: &Listing, ctx: &RenderContext) -> ListingDetail {
    let highest_bid = listing.highest_bid();

    ListingDetail {
        id: listing.id.clone(),
        title: listing.title.clone(),
        image_url: image_url(&listing.media).to_string(),
        image_alt: image_alt(&listing.media).to_string(),
        time_remaining: time_remaining(listing.ends_at, ctx.now),
        description: listing
            .description
            .clone()
            .filter(|d| !d.is_empty())
            .unwrap_or_else(|| "No description.".to_string()),
        highest_bid,
        bid_count: listing.count.bids,
        min_bid: highest_bid + 1,
        seller: listing
            .seller
            .as_ref()
            .and_then(|s| s.name.clone())
            .unwrap_or_else(|| "Unknown".to_string()),
        can_bid: ctx.authenticated,
        bid_history: ctx
            .authenticated
            .then(|| bid_history(listing.bids.as_deref().unwrap_or_default())),
    }
}

pub fn profile(profile: &Profile) -> ProfileView {
    let avatar = profile.avatar.as_ref();

    ProfileView {
        name: profile.name.clone(),
        email: profile.email.clone().unwrap_or_default(),
        bio: profile
            .bio
            .clone()
            .filter(|b| !b.is_empty())
            .unwrap_or_else(|| "No bio available.".to_string()),
        avatar_url: avatar
            .and_then(|a| a.url.clone())
            .filter(|u| !u.is_empty())
            .unwrap_or_else(|| FALLBACK_AVATAR.to_string()),
        avatar_alt: avatar
            .and_then(|a| a.alt.clone())
            .filter(|a| !a.is_empty())
            .unwrap_or_else(|| "Profile Avatar".to_string()),
        banner_url: profile
            .banner
            .as_ref()
            .and_then(|b| b.url.clone())
            .filter(|u| !u.is_empty()),
        credits: profile.credits,
        listing_count: profile.listings.len(),
    }
}
