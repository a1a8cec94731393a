use std::sync::Arc;

use reqwest::{Method, StatusCode};
use serde::de::DeserializeOwned;

use crate::credentials::CredentialStore;

pub mod data;

pub use data::{Listing, ListingsResponse, NewListing, Profile, ProfileUpdate};

/// Header the auction API expects the application key in.
pub const API_KEY_HEADER: &str = "X-Noroff-API-Key";

#[derive(Debug, thiserror::Error)]
pub enum ApiError {
    #[error("Sending Request: {0}")]
    Transport(#[from] reqwest::Error),
    #[error("{message}")]
    Status { status: u16, message: String },
    #[error("Deserialize: {0}")]
    Decode(#[from] serde_json::Error),
    #[error("Empty response body")]
    MissingBody,
}

impl ApiError {
    pub fn status(&self) -> Option<u16> {
        match self {
            Self::Status { status, .. } => Some(*status),
            _ => None,
        }
    }
}

/// The operations the listing views need from the auction API.
#[async_trait::async_trait]
pub trait AuctionApi: Send + Sync {
    /// One page of active listings with bids, ordered by expiry ascending.
    async fn listings_page(&self, page: usize, limit: usize) -> Result<ListingsResponse, ApiError>;

    /// A single listing including seller and bids.
    async fn listing(&self, id: &str) -> Result<Listing, ApiError>;

    async fn place_bid(&self, id: &str, amount: u64) -> Result<(), ApiError>;

    async fn create_listing(&self, listing: &NewListing) -> Result<(), ApiError>;

    async fn delete_listing(&self, id: &str) -> Result<(), ApiError>;

    async fn profile(&self, name: &str) -> Result<Profile, ApiError>;

    async fn update_profile(&self, name: &str, update: &ProfileUpdate) -> Result<(), ApiError>;
}

pub struct Client {
    pub req_client: reqwest::Client,
    base_url: String,
    api_key: String,
    credentials: Arc<CredentialStore>,
}

impl Client {
    pub fn new(
        base_url: impl Into<String>,
        api_key: impl Into<String>,
        credentials: Arc<CredentialStore>,
    ) -> Self {
        let base_url: String = base_url.into();

        Self {
            req_client: reqwest::Client::new(),
            base_url: base_url.trim_end_matches('/').to_string(),
            api_key: api_key.into(),
            credentials,
        }
    }

    fn request(&self, method: Method, endpoint: &str) -> reqwest::RequestBuilder {
        let url = format!("{}/{}", self.base_url, endpoint.trim_start_matches('/'));

        let req = self
            .req_client
            .request(method, url)
            .header(API_KEY_HEADER, &self.api_key);

        match self.credentials.token() {
            Some(token) => req.bearer_auth(token),
            None => req,
        }
    }

    async fn execute<T: DeserializeOwned>(
        &self,
        req: reqwest::RequestBuilder,
    ) -> Result<Option<T>, ApiError> {
        let resp = req.send().await?;

        let status = resp.status();
        if status == StatusCode::NO_CONTENT {
            return Ok(None);
        }

        let body = resp.bytes().await?;

        if !status.is_success() {
            let message = error_message(status, &body);
            tracing::error!(status = status.as_u16(), "Error Response {:?}", message);
            return Err(ApiError::Status {
                status: status.as_u16(),
                message,
            });
        }

        if body.is_empty() {
            return Ok(None);
        }

        let data = serde_json::from_slice(&body).map_err(|e| {
            tracing::error!("Loading JSON {:?}", e);
            ApiError::Decode(e)
        })?;

        Ok(Some(data))
    }
}

/// The server's first error message, or `HTTP <status>: <reason>`.
fn error_message(status: StatusCode, body: &[u8]) -> String {
    serde_json::from_slice::<data::ErrorResponse>(body)
        .ok()
        .and_then(|e| e.first_message().map(str::to_owned))
        .unwrap_or_else(|| {
            format!(
                "HTTP {}: {}",
                status.as_u16(),
                status.canonical_reason().unwrap_or("Unknown")
            )
        })
}

#[async_trait::async_trait]
impl AuctionApi for Client {
    #[tracing::instrument(skip(self))]
    async fn listings_page(&self, page: usize, limit: usize) -> Result<ListingsResponse, ApiError> {
        let req = self.request(Method::GET, "/auction/listings").query(&[
            ("_bids", "true".to_string()),
            ("_active", "true".to_string()),
            ("limit", limit.to_string()),
            ("page", page.to_string()),
            ("sort", "endsAt".to_string()),
            ("sortOrder", "asc".to_string()),
        ]);

        self.execute(req).await?.ok_or(ApiError::MissingBody)
    }

    #[tracing::instrument(skip(self))]
    async fn listing(&self, id: &str) -> Result<Listing, ApiError> {
        let req = self
            .request(Method::GET, &format!("/auction/listings/{id}"))
            .query(&[("_seller", "true"), ("_bids", "true")]);

        let resp: data::ListingResponse = self.execute(req).await?.ok_or(ApiError::MissingBody)?;
        Ok(resp.data)
    }

    #[tracing::instrument(skip(self))]
    async fn place_bid(&self, id: &str, amount: u64) -> Result<(), ApiError> {
        let req = self
            .request(Method::POST, &format!("/auction/listings/{id}/bids"))
            .json(&data::NewBid { amount });

        self.execute::<serde_json::Value>(req).await?;
        Ok(())
    }

    #[tracing::instrument(skip(self, listing), fields(title = %listing.title))]
    async fn create_listing(&self, listing: &NewListing) -> Result<(), ApiError> {
        let req = self.request(Method::POST, "/auction/listings").json(listing);

        self.execute::<serde_json::Value>(req).await?;
        Ok(())
    }

    #[tracing::instrument(skip(self))]
    async fn delete_listing(&self, id: &str) -> Result<(), ApiError> {
        let req = self.request(Method::DELETE, &format!("/auction/listings/{id}"));

        self.execute::<serde_json::Value>(req).await?;
        Ok(())
    }

    #[tracing::instrument(skip(self))]
    async fn profile(&self, name: &str) -> Result<Profile, ApiError> {
        let req = self
            .request(Method::GET, &format!("/auction/profiles/{name}"))
            .query(&[("_listings", "true")]);

        let resp: data::ProfileResponse = self.execute(req).await?.ok_or(ApiError::MissingBody)?;
        Ok(resp.data)
    }

    #[tracing::instrument(skip(self))]
    async fn update_profile(&self, name: &str, update: &ProfileUpdate) -> Result<(), ApiError> {
        let req = self
            .request(Method::PUT, &format!("/auction/profiles/{name}"))
            .json(update);

        self.execute::<serde_json::Value>(req).await?;
        Ok(())
    }
}
