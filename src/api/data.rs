use chrono::{DateTime, Utc};

#[derive(Debug, Clone, PartialEq, serde::Deserialize)]
pub struct PagedResponse<D> {
    pub data: D,
    pub meta: Option<PageMeta>,
}

#[derive(Debug, Clone, PartialEq, serde::Deserialize)]
pub struct SingleResponse<D> {
    pub data: D,
}

#[derive(Debug, Clone, PartialEq, serde::Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct PageMeta {
    pub page_count: Option<usize>,
    pub current_page: Option<usize>,
    pub is_last_page: Option<bool>,
    pub total_count: Option<usize>,
}

pub type ListingsResponse = PagedResponse<Vec<Listing>>;

pub type ListingResponse = SingleResponse<Listing>;

#[derive(Debug, Clone, PartialEq, serde::Deserialize, serde::Serialize)]
#[serde(rename_all = "camelCase")]
pub struct Listing {
    pub id: String,
    pub title: String,
    #[serde(default)]
    pub description: Option<String>,
    #[serde(default)]
    pub tags: Vec<String>,
    #[serde(default)]
    pub media: Vec<Media>,
    pub created: Option<DateTime<Utc>>,
    pub updated: Option<DateTime<Utc>>,
    pub ends_at: DateTime<Utc>,
    #[serde(rename = "_count", default)]
    pub count: Count,
    #[serde(default)]
    pub seller: Option<Party>,
    #[serde(default)]
    pub bids: Option<Vec<Bid>>,
}

#[derive(Debug, Clone, PartialEq, serde::Deserialize, serde::Serialize)]
pub struct Media {
    #[serde(default)]
    pub url: Option<String>,
    #[serde(default)]
    pub alt: Option<String>,
}

#[derive(Debug, Clone, Default, PartialEq, serde::Deserialize, serde::Serialize)]
pub struct Count {
    #[serde(default)]
    pub bids: u64,
}

#[derive(Debug, Clone, PartialEq, serde::Deserialize, serde::Serialize)]
pub struct Party {
    #[serde(default)]
    pub name: Option<String>,
    #[serde(default)]
    pub email: Option<String>,
}

#[derive(Debug, Clone, PartialEq, serde::Deserialize, serde::Serialize)]
pub struct Bid {
    #[serde(default)]
    pub id: Option<String>,
    pub amount: u64,
    #[serde(default)]
    pub bidder: Option<Party>,
    pub created: DateTime<Utc>,
}

#[derive(Debug, Clone, PartialEq, serde::Serialize)]
pub struct NewBid {
    pub amount: u64,
}

#[derive(Debug, Clone, PartialEq, serde::Serialize)]
#[serde(rename_all = "camelCase")]
pub struct NewListing {
    pub title: String,
    pub description: String,
    pub tags: Vec<String>,
    pub media: Vec<Media>,
    pub ends_at: DateTime<Utc>,
}

#[derive(Debug, Clone, PartialEq, serde::Deserialize, serde::Serialize)]
pub struct Profile {
    pub name: String,
    #[serde(default)]
    pub email: Option<String>,
    #[serde(default)]
    pub bio: Option<String>,
    #[serde(default)]
    pub avatar: Option<Media>,
    #[serde(default)]
    pub banner: Option<Media>,
    #[serde(default)]
    pub credits: Option<i64>,
    #[serde(default)]
    pub listings: Vec<serde_json::Value>,
}

pub type ProfileResponse = SingleResponse<Profile>;

/// Partial profile update; absent fields are left untouched by the API.
#[derive(Debug, Clone, Default, PartialEq, serde::Deserialize, serde::Serialize)]
pub struct ProfileUpdate {
    #[serde(skip_serializing_if = "Option::is_none")]
    pub bio: Option<String>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub avatar: Option<Media>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub banner: Option<Media>,
}

#[derive(Debug, PartialEq, serde::Deserialize)]
pub struct ErrorResponse {
    #[serde(default)]
    pub errors: Vec<ErrorEntry>,
}

#[derive(Debug, PartialEq, serde::Deserialize)]
pub struct ErrorEntry {
    pub message: Option<String>,
}

impl ErrorResponse {
    pub fn first_message(&self) -> Option<&str> {
        self.errors.first().and_then(|e| e.message.as_deref())
    }
}

impl Listing {
    /// The highest amount across the embedded bids, 0 without any.
    pub fn highest_bid(&self) -> u64 {
        self.bids
            .as_deref()
            .map(highest_bid)
            .unwrap_or(0)
    }
}

pub fn highest_bid(bids: &[Bid]) -> u64 {
    bids.iter().map(|b| b.amount).max().unwrap_or(0)
}
