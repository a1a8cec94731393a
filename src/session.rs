use std::sync::{Arc, Mutex};
use std::time::Duration;

use chrono::{DateTime, NaiveDateTime, Utc};
use tracing::Instrument;

use crate::api::data::Media;
use crate::api::{AuctionApi, NewListing, ProfileUpdate};
use crate::bid;
use crate::credentials::CredentialStore;
use crate::listings::{self, CacheState, ListingCache};
use crate::metrics::Metrics;
use crate::pagination::ViewState;
use crate::view::{self, ListingDetail, PageView, ProfileView, RenderContext};

pub const LISTING_CREATED: &str = "Listing created successfully!";
pub const LISTING_REQUIRED: &str = "Title and end date/time are required.";
pub const LISTING_FAILED: &str = "Failed to create listing. Please check your input and try again.";
pub const LISTING_DELETED: &str = "Listing deleted.";
pub const NOT_SIGNED_IN: &str = "Not signed in.";

#[derive(Debug, Clone)]
pub struct Settings {
    pub fetch_limit: usize,
    pub page_size: usize,
    pub bid_refresh_delay: Duration,
    pub create_refresh_delay: Duration,
}

impl Default for Settings {
    fn default() -> Self {
        Self {
            fetch_limit: listings::FETCH_LIMIT,
            page_size: crate::pagination::DEFAULT_PAGE_SIZE,
            bid_refresh_delay: Duration::from_millis(1500),
            create_refresh_delay: Duration::from_millis(1200),
        }
    }
}

impl From<&crate::config::Config> for Settings {
    fn from(config: &crate::config::Config) -> Self {
        Self {
            fetch_limit: config.fetch_limit,
            page_size: config.page_size,
            bid_refresh_delay: config.bid_refresh_delay(),
            create_refresh_delay: config.create_refresh_delay(),
        }
    }
}

#[derive(Debug, Clone, PartialEq, serde::Serialize)]
#[serde(tag = "state", rename_all = "lowercase")]
pub enum DetailView {
    Ready(ListingDetail),
    Error { message: &'static str },
}

#[derive(Debug, Clone, PartialEq, Eq, serde::Serialize)]
#[serde(tag = "outcome", content = "message", rename_all = "lowercase")]
pub enum Outcome {
    Rejected(String),
    Failed(String),
    Done(String),
}

impl Outcome {
    pub fn message(&self) -> &str {
        match self {
            Self::Rejected(m) | Self::Failed(m) | Self::Done(m) => m,
        }
    }
}

#[derive(Debug, Clone)]
struct OpenDetail {
    id: String,
    highest_bid: u64,
}

#[derive(Debug, Clone, Default, PartialEq, serde::Deserialize)]
#[serde(default, rename_all = "camelCase")]
pub struct ListingForm {
    pub title: String,
    pub description: String,
    /// Comma separated.
    pub tags: String,
    pub media_url: String,
    pub media_alt: String,
    /// RFC 3339, or a `datetime-local` value read as UTC.
    pub ends_at: String,
}

impl ListingForm {
    pub fn into_listing(self) -> Result<NewListing, Outcome> {
        let title = self.title.trim().to_string();
        let ends_at = self.ends_at.trim();
        if title.is_empty() || ends_at.is_empty() {
            return Err(Outcome::Rejected(LISTING_REQUIRED.to_string()));
        }
        let ends_at =
            parse_ends_at(ends_at).ok_or_else(|| Outcome::Rejected(LISTING_FAILED.to_string()))?;

        let tags = self
            .tags
            .split(',')
            .map(str::trim)
            .filter(|t| !t.is_empty())
            .map(str::to_owned)
            .collect();

        let media_url = self.media_url.trim();
        let media = if media_url.is_empty() {
            Vec::new()
        } else {
            vec![Media {
                url: Some(media_url.to_string()),
                alt: Some(self.media_alt.trim().to_string()),
            }]
        };

        Ok(NewListing {
            title,
            description: self.description.trim().to_string(),
            tags,
            media,
            ends_at,
        })
    }
}

fn parse_ends_at(raw: &str) -> Option<DateTime<Utc>> {
    if let Ok(parsed) = DateTime::parse_from_rfc3339(raw) {
        return Some(parsed.with_timezone(&Utc));
    }

    ["%Y-%m-%dT%H:%M", "%Y-%m-%dT%H:%M:%S"]
        .iter()
        .find_map(|fmt| NaiveDateTime::parse_from_str(raw, fmt).ok())
        .map(|naive| naive.and_utc())
}

pub struct Session {
    api: Arc<dyn AuctionApi>,
    credentials: Arc<CredentialStore>,
    cache: ListingCache,
    view: Mutex<ViewState>,
    open_detail: Mutex<Option<OpenDetail>>,
    settings: Settings,
    metrics: Metrics,
}

impl Session {
    pub fn new(
        api: Arc<dyn AuctionApi>,
        credentials: Arc<CredentialStore>,
        settings: Settings,
        metrics: Metrics,
    ) -> Self {
        Self {
            api,
            credentials,
            cache: ListingCache::new(),
            view: Mutex::new(ViewState::new(settings.page_size)),
            open_detail: Mutex::new(None),
            settings,
            metrics,
        }
    }

    pub fn cache(&self) -> &ListingCache {
        &self.cache
    }

    pub fn credentials(&self) -> &CredentialStore {
        &self.credentials
    }

    pub fn view_state(&self) -> ViewState {
        *self.lock_view()
    }

    fn lock_view(&self) -> std::sync::MutexGuard<'_, ViewState> {
        self.view.lock().unwrap_or_else(|poisoned| poisoned.into_inner())
    }

    fn lock_detail(&self) -> std::sync::MutexGuard<'_, Option<OpenDetail>> {
        self.open_detail
            .lock()
            .unwrap_or_else(|poisoned| poisoned.into_inner())
    }

    fn context(&self) -> RenderContext {
        RenderContext {
            now: Utc::now(),
            authenticated: self.credentials.is_authenticated(),
        }
    }

    #[tracing::instrument(skip(self))]
    pub async fn refresh(&self) -> bool {
        match listings::fetch_all(self.api.as_ref(), self.settings.fetch_limit).await {
            Ok(aggregate) => {
                let fetched_at = Utc::now();

                self.metrics.cached_listings.set(aggregate.listings.len() as f64);
                self.metrics.pages_fetched.set(aggregate.pages as f64);
                self.metrics.last_refresh.set(fetched_at.timestamp() as f64);

                self.cache.replace(aggregate.listings, fetched_at);
                true
            }
            Err(e) => {
                tracing::error!("Loading active listings {:?}", e);
                self.metrics.refresh_failures.inc();
                self.cache.mark_failed();
                false
            }
        }
    }

    /// Refreshes after `delay` on a separate task. Nothing orders these against each other.
    fn refresh_later(self: &Arc<Self>, delay: Duration, reset_page: bool) {
        let session = Arc::clone(self);

        tokio::spawn(
            async move {
                tokio::time::sleep(delay).await;

                if session.refresh().await && reset_page {
                    session.lock_view().reset();
                }
            }
            .instrument(tracing::info_span!("Delayed refresh", ?delay)),
        );
    }

    pub fn page(&self, page: Option<usize>, query: Option<&str>) -> PageView {
        let snapshot = self.cache.snapshot();
        let all = match snapshot.as_ref() {
            CacheState::Ready { listings, .. } => listings,
            CacheState::Pending => {
                return PageView::Empty {
                    message: view::NO_LISTINGS,
                }
            }
            CacheState::Failed => {
                return PageView::Error {
                    message: view::LOAD_FAILED,
                }
            }
        };

        let filtered;
        let visible: &[_] = match query.map(str::trim).filter(|q| !q.is_empty()) {
            Some(q) => {
                filtered = listings::search(all, q).into_iter().cloned().collect::<Vec<_>>();
                &filtered[..]
            }
            None => &all[..],
        };

        let state = {
            let mut state = self.lock_view();
            if let Some(page) = page {
                tracing::debug!(page, "Navigating to page");
            }
            // A refresh may have shrunk the aggregate under the current page.
            let target = page.unwrap_or(state.current_page());
            state.go_to(target, visible.len());
            *state
        };

        view::page(visible, &state, &self.context())
    }

    #[tracing::instrument(skip(self))]
    pub async fn detail(&self, id: &str) -> DetailView {
        match self.api.listing(id).await {
            Ok(listing) => {
                let detail = view::detail(&listing, &self.context());

                *self.lock_detail() = Some(OpenDetail {
                    id: listing.id.clone(),
                    highest_bid: detail.highest_bid,
                });

                DetailView::Ready(detail)
            }
            Err(e) => {
                tracing::error!("Loading listing details {:?}", e);
                DetailView::Error {
                    message: view::DETAIL_FAILED,
                }
            }
        }
    }

    /// The highest bid the viewer has seen for `id`.
    fn known_highest(&self, id: &str) -> u64 {
        let from_detail = self
            .lock_detail()
            .as_ref()
            .filter(|d| d.id == id)
            .map(|d| d.highest_bid);

        from_detail
            .or_else(|| self.cache.highest_bid(id))
            .unwrap_or(0)
    }

    #[tracing::instrument(skip(self))]
    pub async fn place_bid(self: &Arc<Self>, id: &str, input: &str) -> Outcome {
        let highest = self.known_highest(id);

        let amount = match bid::validate(input, highest) {
            Ok(amount) => amount,
            Err(rejection) => {
                tracing::debug!(?rejection, "Rejected bid");
                self.metrics.count_bid("rejected");
                return Outcome::Rejected(rejection.to_string());
            }
        };

        match self.api.place_bid(id, amount).await {
            Ok(()) => {
                tracing::info!(amount, "Placed bid");
                self.metrics.count_bid("placed");

                *self.lock_detail() = None;
                self.refresh_later(self.settings.bid_refresh_delay, false);

                Outcome::Done(bid::BID_PLACED.to_string())
            }
            Err(e) => {
                tracing::error!("Placing bid {:?}", e);
                self.metrics.count_bid("failed");
                Outcome::Failed(bid::failure_message(&e))
            }
        }
    }

    #[tracing::instrument(skip(self, form))]
    pub async fn create_listing(self: &Arc<Self>, form: ListingForm) -> Outcome {
        if let Err(outcome) = self.signed_in_name() {
            return outcome;
        }

        let listing = match form.into_listing() {
            Ok(l) => l,
            Err(outcome) => return outcome,
        };

        match self.api.create_listing(&listing).await {
            Ok(()) => {
                tracing::info!(title = %listing.title, "Created listing");
                self.refresh_later(self.settings.create_refresh_delay, true);
                Outcome::Done(LISTING_CREATED.to_string())
            }
            Err(e) => {
                tracing::error!("Creating listing {:?}", e);
                Outcome::Failed(LISTING_FAILED.to_string())
            }
        }
    }

    #[tracing::instrument(skip(self))]
    pub async fn delete_listing(&self, id: &str) -> Outcome {
        match self.api.delete_listing(id).await {
            Ok(()) => {
                tracing::info!("Deleted listing");
                self.refresh().await;
                Outcome::Done(LISTING_DELETED.to_string())
            }
            Err(e) => {
                tracing::error!("Deleting listing {:?}", e);
                Outcome::Failed(format!("Failed to delete listing: {}", e))
            }
        }
    }

    #[tracing::instrument(skip(self))]
    pub async fn profile(&self) -> Result<ProfileView, Outcome> {
        let name = self.signed_in_name()?;

        match self.api.profile(&name).await {
            Ok(profile) => Ok(view::profile(&profile)),
            Err(e) => {
                tracing::error!("Fetching profile {:?}", e);
                Err(Outcome::Failed(
                    "Failed to load profile. Please try again later.".to_string(),
                ))
            }
        }
    }

    #[tracing::instrument(skip(self))]
    pub async fn update_profile(&self, update: ProfileUpdate) -> Outcome {
        let name = match self.signed_in_name() {
            Ok(n) => n,
            Err(outcome) => return outcome,
        };

        match self.api.update_profile(&name, &update).await {
            Ok(()) => Outcome::Done("Profile updated successfully!".to_string()),
            Err(e) => {
                tracing::error!("Updating profile {:?}", e);
                Outcome::Failed("Failed to update profile. Please try again.".to_string())
            }
        }
    }

    fn signed_in_name(&self) -> Result<String, Outcome> {
        if !self.credentials.is_authenticated() {
            return Err(Outcome::Rejected(NOT_SIGNED_IN.to_string()));
        }
        self.credentials
            .user_name()
            .ok_or_else(|| Outcome::Rejected(NOT_SIGNED_IN.to_string()))
    }
}
